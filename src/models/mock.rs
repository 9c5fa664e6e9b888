//! Deterministic in-crate backend.
//!
//! Scores labels with a smoothed per-label token likelihood learned from the
//! training file, then softmaxes the scores into probabilities. No native
//! dependency and no randomness, so adapter tests can assert exact parity
//! between calls made through the adapter and calls made directly here.
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use anyhow::{bail, Result};

use crate::config::TrainOptions;
use crate::io::labeled_text::{LabeledReader, ReadOptions};
use crate::models::backend_trait::SupervisedBackend;

#[derive(Debug, Default, Clone)]
struct LabelStats {
    rows: usize,
    token_counts: HashMap<String, usize>,
    total_tokens: usize,
}

/// Token-likelihood scorer standing in for the native backend.
#[derive(Debug, Clone)]
pub struct MockBackend {
    prefix: String,
    // BTreeMap keeps label iteration order stable across runs.
    stats: BTreeMap<String, LabelStats>,
    vocab: HashSet<String>,
    total_rows: usize,
}

impl MockBackend {
    pub fn new() -> Self {
        MockBackend {
            prefix: String::new(),
            stats: BTreeMap::new(),
            vocab: HashSet::new(),
            total_rows: 0,
        }
    }

    fn is_trained(&self) -> bool {
        self.total_rows > 0
    }

    /// Add-one smoothed log likelihood of `tokens` under `label`, plus the
    /// label's log prior.
    fn log_score(&self, stats: &LabelStats, tokens: &[&str]) -> f64 {
        let vocab_size = self.vocab.len().max(1);
        let mut score = (stats.rows as f64 / self.total_rows as f64).ln();
        for token in tokens {
            let count = stats.token_counts.get(*token).copied().unwrap_or(0);
            score += ((count as f64 + 1.0) / ((stats.total_tokens + vocab_size) as f64)).ln();
        }
        score
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        MockBackend::new()
    }
}

impl SupervisedBackend for MockBackend {
    fn train_file(&mut self, input: &Path, options: &TrainOptions) -> Result<()> {
        let read = ReadOptions {
            label_prefix: options.label_prefix.clone(),
        };
        let reader = LabeledReader::open(input, &read)?;

        let mut stats: BTreeMap<String, LabelStats> = BTreeMap::new();
        let mut vocab = HashSet::new();
        let mut total_rows = 0usize;
        for row in reader {
            let (label, text) = row?;
            let entry = stats.entry(label).or_default();
            entry.rows += 1;
            for token in text.split_whitespace() {
                *entry.token_counts.entry(token.to_string()).or_insert(0) += 1;
                entry.total_tokens += 1;
                vocab.insert(token.to_string());
            }
            total_rows += 1;
        }
        if total_rows == 0 {
            bail!("Training file is empty: {}", input.display());
        }

        log::debug!(
            "Mock backend trained on {} rows, {} labels, {} distinct tokens",
            total_rows,
            stats.len(),
            vocab.len()
        );
        self.prefix = options.label_prefix.clone();
        self.stats = stats;
        self.vocab = vocab;
        self.total_rows = total_rows;
        Ok(())
    }

    fn predict_line(&self, text: &str, k: i32) -> Result<Vec<(String, f32)>> {
        if !self.is_trained() {
            bail!("Mock backend has not been trained");
        }
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let scores: Vec<(&str, f64)> = self
            .stats
            .iter()
            .map(|(label, stats)| (label.as_str(), self.log_score(stats, &tokens)))
            .collect();

        // Softmax with the max shifted out for numerical stability.
        let max_score = scores
            .iter()
            .fold(f64::NEG_INFINITY, |acc, (_, s)| acc.max(*s));
        let exp_sum: f64 = scores.iter().map(|(_, s)| (s - max_score).exp()).sum();
        let mut out: Vec<(String, f32)> = scores
            .into_iter()
            .map(|(label, s)| {
                let prob = ((s - max_score).exp() / exp_sum) as f32;
                (format!("{}{}", self.prefix, label), prob)
            })
            .collect();

        out.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        if k >= 0 {
            out.truncate(k as usize);
        }
        Ok(out)
    }

    fn labels(&self) -> Result<Vec<String>> {
        if !self.is_trained() {
            bail!("Mock backend has not been trained");
        }
        Ok(self
            .stats
            .keys()
            .map(|label| format!("{}{}", self.prefix, label))
            .collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
