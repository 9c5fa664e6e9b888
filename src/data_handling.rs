//! Data structures and helpers for working with labeled text corpora.
//!
//! This module defines `Corpus`, the in-memory view of one label-prefixed
//! file, and contains helpers for counting labels, selecting rows by label
//! and encoding labels into dense class codes for the estimator surface.
use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{bail, Result};

use crate::io::labeled_text::{read_labeled_file, ReadOptions};
use crate::labels::{ClassId, LabelCodec};

/// Parallel label and text arrays for one corpus file. Row `i` of both
/// vectors is line `i` of the file, so indices returned by selection helpers
/// can be fed straight back into estimator calls.
#[derive(Debug, Clone)]
pub struct Corpus {
    labels: Vec<String>,
    texts: Vec<String>,
}

impl Corpus {
    pub fn new(labels: Vec<String>, texts: Vec<String>) -> Result<Self> {
        if labels.len() != texts.len() {
            bail!(
                "Labels ({}) and texts ({}) must have the same length",
                labels.len(),
                texts.len()
            );
        }
        Ok(Corpus { labels, texts })
    }

    /// Load a label-prefixed file into memory.
    pub fn from_file<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<Self> {
        let (labels, texts) = read_labeled_file(path, options)?;
        Corpus::new(labels, texts)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in row order, without their prefix.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Texts in row order.
    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    /// Per-label row counts, most frequent first. Ties break on the label
    /// itself so the order is deterministic.
    pub fn label_counts(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for label in &self.labels {
            *counts.entry(label.as_str()).or_insert(0) += 1;
        }
        let mut counts: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(label, count)| (label.to_string(), count))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts
    }

    /// The `n` most frequent labels.
    pub fn top_labels(&self, n: usize) -> Vec<String> {
        self.label_counts()
            .into_iter()
            .take(n)
            .map(|(label, _)| label)
            .collect()
    }

    /// Row indices (ascending) and labels of every row whose label is in
    /// `wanted`.
    pub fn rows_with_labels(&self, wanted: &[String]) -> (Vec<usize>, Vec<String>) {
        let wanted: HashSet<&str> = wanted.iter().map(String::as_str).collect();
        let mut indices = Vec::new();
        let mut labels = Vec::new();
        for (i, label) in self.labels.iter().enumerate() {
            if wanted.contains(label.as_str()) {
                indices.push(i);
                labels.push(label.clone());
            }
        }
        (indices, labels)
    }

    /// Encode every row's label with the given codec.
    pub fn encoded_labels(&self, codec: &LabelCodec) -> Result<Vec<ClassId>> {
        let mut encoded = Vec::with_capacity(self.labels.len());
        for label in &self.labels {
            encoded.push(codec.encode(label)?);
        }
        Ok(encoded)
    }

    pub fn log_summary(&self, name: &str) {
        let counts = self.label_counts();
        log::info!(
            "{}: {} rows across {} labels",
            name,
            self.len(),
            counts.len()
        );
        for (label, count) in counts.iter().take(5) {
            log::debug!("{}: label '{}' has {} rows", name, label, count);
        }
    }
}
