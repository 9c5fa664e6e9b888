//! fastText backend. Compiled only with the `fasttext` feature to keep the
//! native dependency out of default builds; without the feature a stub is
//! exported that fails on every operation.
use std::path::Path;

use anyhow::{anyhow, Result};

#[cfg(feature = "fasttext")]
use fasttext::{Args, FastText, LossName, ModelName};

use crate::config::TrainOptions;
use crate::models::backend_trait::SupervisedBackend;

/// Wrapper around the native fastText bindings.
#[cfg(feature = "fasttext")]
pub struct FasttextBackend {
    ft: Option<FastText>,
}

#[cfg(feature = "fasttext")]
impl FasttextBackend {
    pub fn new() -> Self {
        FasttextBackend { ft: None }
    }

    /// Load a previously trained model instead of training from scratch.
    pub fn from_model_file(path: &str) -> Result<Self> {
        let mut ft = FastText::new();
        ft.load_model(path)
            .map_err(|e| anyhow!("Failed to load fastText model from {}: {}", path, e))?;
        Ok(FasttextBackend { ft: Some(ft) })
    }

    fn model(&self) -> Result<&FastText> {
        self.ft
            .as_ref()
            .ok_or_else(|| anyhow!("fastText backend has not been trained"))
    }
}

#[cfg(feature = "fasttext")]
impl Default for FasttextBackend {
    fn default() -> Self {
        FasttextBackend::new()
    }
}

#[cfg(feature = "fasttext")]
fn loss_name(loss: &str) -> Result<LossName> {
    match loss.to_lowercase().as_str() {
        "softmax" => Ok(LossName::SOFTMAX),
        "hs" => Ok(LossName::HS),
        "ns" => Ok(LossName::NS),
        "ova" | "one-vs-all" => Ok(LossName::OVA),
        other => Err(anyhow!("Unknown fastText loss: {}", other)),
    }
}

#[cfg(feature = "fasttext")]
impl SupervisedBackend for FasttextBackend {
    fn train_file(&mut self, input: &Path, options: &TrainOptions) -> Result<()> {
        let input = input
            .to_str()
            .ok_or_else(|| anyhow!("Training file path is not valid UTF-8: {}", input.display()))?;

        let mut args = Args::new();
        args.set_input(input)
            .map_err(|e| anyhow!("Invalid training file path: {}", e))?;
        args.set_model(ModelName::SUP);
        args.set_loss(loss_name(&options.loss)?);
        args.set_lr(options.lr);
        args.set_epoch(options.epoch as i32);
        args.set_dim(options.dim as i32);
        args.set_word_ngrams(options.word_ngrams as i32);
        args.set_min_count(options.min_count as i32);
        args.set_label(&options.label_prefix)
            .map_err(|e| anyhow!("Invalid label prefix: {}", e))?;
        if let Some(thread) = options.thread {
            args.set_thread(thread as i32);
        }
        args.set_verbose(options.verbose as i32);

        let mut ft = FastText::new();
        ft.train(&args)
            .map_err(|e| anyhow!("fastText training failed: {}", e))?;
        log::info!(
            "Trained fastText model on {} (epoch={}, lr={}, dim={})",
            input,
            options.epoch,
            options.lr,
            options.dim
        );
        self.ft = Some(ft);
        Ok(())
    }

    fn predict_line(&self, text: &str, k: i32) -> Result<Vec<(String, f32)>> {
        let ft = self.model()?;
        // fastText expects newline-terminated input; without it the last
        // token can be dropped and predictions differ from the CLI.
        let mut query = String::with_capacity(text.len() + 1);
        query.push_str(text);
        if !query.ends_with('\n') {
            query.push('\n');
        }
        let predictions = ft
            .predict(&query, k, 0.0)
            .map_err(|e| anyhow!("fastText prediction failed: {}", e))?;
        let mut out: Vec<(String, f32)> = predictions
            .into_iter()
            .map(|p| (p.label, p.prob.clamp(0.0, 1.0)))
            .collect();
        out.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        Ok(out)
    }

    fn labels(&self) -> Result<Vec<String>> {
        let ft = self.model()?;
        let (labels, _counts) = ft
            .get_labels()
            .map_err(|e| anyhow!("Failed to read labels from fastText model: {}", e))?;
        Ok(labels)
    }

    fn name(&self) -> &str {
        "fasttext"
    }
}

/// Stub exported when the `fasttext` feature is disabled.
#[cfg(not(feature = "fasttext"))]
pub struct FasttextBackend;

#[cfg(not(feature = "fasttext"))]
impl FasttextBackend {
    pub fn new() -> Self {
        FasttextBackend
    }
}

#[cfg(not(feature = "fasttext"))]
impl Default for FasttextBackend {
    fn default() -> Self {
        FasttextBackend::new()
    }
}

#[cfg(not(feature = "fasttext"))]
impl SupervisedBackend for FasttextBackend {
    fn train_file(&mut self, _input: &Path, _options: &TrainOptions) -> Result<()> {
        Err(anyhow!(
            "fastText backend requires compiling with `--features fasttext`"
        ))
    }

    fn predict_line(&self, _text: &str, _k: i32) -> Result<Vec<(String, f32)>> {
        Err(anyhow!(
            "fastText backend requires compiling with `--features fasttext`"
        ))
    }

    fn labels(&self) -> Result<Vec<String>> {
        Err(anyhow!(
            "fastText backend requires compiling with `--features fasttext`"
        ))
    }

    fn name(&self) -> &str {
        "fasttext"
    }
}
