use std::path::Path;

use anyhow::Result;

use crate::config::TrainOptions;

/// A small trait abstraction over the wrapped supervised text classifier.
/// Implementations translate between the crate's `TrainOptions` and the
/// native library's training and prediction entry points so the adapter can
/// stay backend-agnostic.
pub trait SupervisedBackend {
    /// Train a supervised model from a label-prefixed text file. Replaces
    /// any previously trained state.
    fn train_file(&mut self, input: &Path, options: &TrainOptions) -> Result<()>;

    /// Top-k `(label, probability)` pairs for one line of text, best first.
    /// Labels carry their prefix. `k = -1` requests every known label;
    /// backends may return fewer than `k` entries.
    fn predict_line(&self, text: &str, k: i32) -> Result<Vec<(String, f32)>>;

    /// Labels seen during training, with their prefix.
    fn labels(&self) -> Result<Vec<String>>;

    /// Optional human readable name for the backend
    fn name(&self) -> &str {
        "backend"
    }
}
