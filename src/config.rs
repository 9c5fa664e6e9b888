//! Configuration types for the classifier adapter.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Training arguments forwarded to the wrapped supervised backend.
///
/// Field names and defaults mirror fastText's supervised mode so a config
/// written for the native CLI reads the same here. Unknown combinations are
/// not validated up front; the backend rejects what it cannot honor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainOptions {
    /// Number of training epochs.
    pub epoch: u32,
    /// Learning rate.
    pub lr: f64,
    /// Size of word vectors.
    pub dim: u32,
    /// Max length of word n-grams.
    pub word_ngrams: u32,
    /// Minimal number of word occurrences.
    pub min_count: u32,
    /// Loss function: "softmax", "hs", "ns" or "ova".
    pub loss: String,
    /// Worker threads. `None` leaves the backend's own default in place.
    pub thread: Option<u32>,
    /// Backend verbosity level.
    pub verbose: u8,
    /// Token prefix marking labels in training files.
    pub label_prefix: String,
}

impl Default for TrainOptions {
    fn default() -> Self {
        TrainOptions {
            epoch: 5,
            lr: 0.1,
            dim: 100,
            word_ngrams: 1,
            min_count: 1,
            loss: "softmax".to_string(),
            thread: None,
            verbose: 0,
            label_prefix: "__label__".to_string(),
        }
    }
}

/// Which backend implementation the factory should build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Deterministic in-crate scorer, always available.
    Mock,
    /// Native fastText bindings.
    #[cfg(feature = "fasttext")]
    FastText,
}

impl Default for BackendKind {
    fn default() -> Self {
        BackendKind::Mock
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mock" => Ok(BackendKind::Mock),
            #[cfg(feature = "fasttext")]
            "fasttext" => Ok(BackendKind::FastText),
            _ => Err(format!(
                "Unknown backend: {}. To use fasttext, please compile with `--features fasttext`",
                s
            )),
        }
    }
}

/// Everything a `FastTextClassifier` needs to manage its corpora and its
/// backend. Serializable so runs can be driven from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Label-prefixed training file.
    pub train_file: PathBuf,
    /// Optional label-prefixed held-out file.
    pub heldout_file: Option<PathBuf>,
    /// Backend to build.
    pub backend: BackendKind,
    /// Arguments forwarded to the backend at fit time.
    pub train_options: TrainOptions,
    /// Keep re-materialized subset training files instead of deleting them
    /// after fit.
    pub keep_intermediate: bool,
    /// Directory for re-materialized training files. `None` uses the system
    /// temp directory.
    pub scratch_dir: Option<PathBuf>,
    /// Default `k` for `score` when the caller does not pass one.
    pub default_k: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            train_file: PathBuf::new(),
            heldout_file: None,
            backend: BackendKind::default(),
            train_options: TrainOptions::default(),
            keep_intermediate: false,
            scratch_dir: None,
            default_k: 1,
        }
    }
}
