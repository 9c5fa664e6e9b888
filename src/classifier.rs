//! The classifier adapter and the estimator surface it exposes.
//!
//! `FastTextClassifier` owns a training corpus (and optionally a held-out
//! corpus), a label codec spanning both, and a boxed backend. Pipelines that
//! hunt for label noise drive it through the `Estimator` trait: fit on row
//! subsets, read back dense probability matrices, score with top-k
//! precision. Row subsets are trained by re-materializing the selected rows
//! into a temporary file in the backend's own on-disk format, since the
//! native library only trains from files.
use std::io::Write;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use ndarray::Array2;
use tempfile::NamedTempFile;

use crate::config::{ClassifierConfig, TrainOptions};
use crate::data_handling::Corpus;
use crate::io::labeled_text::{write_labeled_rows, ReadOptions};
use crate::labels::{ClassId, LabelCodec};
use crate::metrics::average_precision_at_k;
use crate::models::{build_backend, SupervisedBackend};

/// Which rows of the managed corpora a call addresses.
#[derive(Debug, Clone, Copy)]
pub enum RowSelection<'a> {
    /// Every row of the training corpus.
    Train,
    /// Training rows by index.
    TrainSubset(&'a [usize]),
    /// Every row of the held-out corpus.
    Heldout,
    /// Held-out rows by index.
    HeldoutSubset(&'a [usize]),
}

/// The uniform estimator surface driven by noise-detection pipelines.
pub trait Estimator {
    /// Train on the managed training corpus, optionally restricted to the
    /// given row indices. When `labels` is passed it is validated against
    /// the corpus; training labels always come from the file itself.
    fn fit(&mut self, rows: Option<&[usize]>, labels: Option<&[ClassId]>) -> Result<()>;

    /// Top-1 class code per selected row.
    fn predict(&self, rows: RowSelection<'_>) -> Result<Vec<ClassId>>;

    /// Dense `(n_selected, n_classes)` probability matrix. Classes the
    /// backend does not return for a row keep probability zero.
    fn predict_proba(&self, rows: RowSelection<'_>) -> Result<Array2<f32>>;

    /// Average precision at `k` over the selected rows, against `truth` or,
    /// when `truth` is `None`, against the rows' own file labels.
    fn score(
        &self,
        rows: RowSelection<'_>,
        truth: Option<&[ClassId]>,
        k: Option<usize>,
    ) -> Result<f32>;

    /// Number of classes in the codec.
    fn n_classes(&self) -> usize;

    /// Optional human readable name for the estimator
    fn name(&self) -> &str {
        "estimator"
    }
}

/// Adapter wrapping a supervised text-classification backend behind the
/// `Estimator` trait.
pub struct FastTextClassifier {
    config: ClassifierConfig,
    backend: Box<dyn SupervisedBackend>,
    codec: LabelCodec,
    train_corpus: Corpus,
    heldout_corpus: Option<Corpus>,
    fitted: bool,
}

impl FastTextClassifier {
    /// Load the configured corpora, build the label codec across both and
    /// construct the backend. Nothing is trained yet.
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        let read = ReadOptions {
            label_prefix: config.train_options.label_prefix.clone(),
        };
        let train_corpus = Corpus::from_file(&config.train_file, &read)?;
        if train_corpus.is_empty() {
            bail!("Training corpus is empty: {}", config.train_file.display());
        }
        let heldout_corpus = match &config.heldout_file {
            Some(path) => Some(Corpus::from_file(path, &read)?),
            None => None,
        };

        // The codec spans both corpora so held-out rows with labels unseen
        // in training still encode; their probability columns stay zero.
        let codec = match &heldout_corpus {
            Some(heldout) => {
                LabelCodec::from_labels(train_corpus.labels().iter().chain(heldout.labels()))?
            }
            None => LabelCodec::from_labels(train_corpus.labels())?,
        };

        train_corpus.log_summary("train corpus");
        if let Some(heldout) = &heldout_corpus {
            heldout.log_summary("held-out corpus");
        }
        log::info!("Label codec spans {} classes", codec.len());

        let backend = build_backend(&config.backend);
        Ok(FastTextClassifier {
            config,
            backend,
            codec,
            train_corpus,
            heldout_corpus,
            fitted: false,
        })
    }

    pub fn codec(&self) -> &LabelCodec {
        &self.codec
    }

    pub fn train_corpus(&self) -> &Corpus {
        &self.train_corpus
    }

    pub fn heldout_corpus(&self) -> Option<&Corpus> {
        self.heldout_corpus.as_ref()
    }

    pub fn train_options(&self) -> &TrainOptions {
        &self.config.train_options
    }

    /// Mutable training options, for tweaks between refits (fewer epochs
    /// during cross-validation is the usual one).
    pub fn train_options_mut(&mut self) -> &mut TrainOptions {
        &mut self.config.train_options
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    fn ensure_fitted(&self) -> Result<()> {
        if !self.fitted {
            bail!("Classifier has not been fitted; call fit() first");
        }
        Ok(())
    }

    fn heldout(&self) -> Result<&Corpus> {
        self.heldout_corpus
            .as_ref()
            .ok_or_else(|| anyhow!("No held-out file was configured"))
    }

    fn check_indices(corpus: &Corpus, idx: &[usize], which: &str) -> Result<()> {
        if idx.is_empty() {
            bail!("Row subset is empty");
        }
        if let Some(&bad) = idx.iter().find(|&&i| i >= corpus.len()) {
            bail!(
                "Row index {} is out of range for the {} corpus ({} rows)",
                bad,
                which,
                corpus.len()
            );
        }
        Ok(())
    }

    /// Resolve a selection to its corpus and optional index list, validating
    /// every index.
    fn selection<'a>(&self, rows: RowSelection<'a>) -> Result<(&Corpus, Option<&'a [usize]>)> {
        match rows {
            RowSelection::Train => Ok((&self.train_corpus, None)),
            RowSelection::TrainSubset(idx) => {
                Self::check_indices(&self.train_corpus, idx, "training")?;
                Ok((&self.train_corpus, Some(idx)))
            }
            RowSelection::Heldout => Ok((self.heldout()?, None)),
            RowSelection::HeldoutSubset(idx) => {
                let corpus = self.heldout()?;
                Self::check_indices(corpus, idx, "held-out")?;
                Ok((corpus, Some(idx)))
            }
        }
    }

    /// Check caller-provided labels against what the training file says for
    /// the selected rows. A disagreement means the caller's codes were built
    /// with a different codec, which would silently corrupt downstream
    /// probability matrices.
    fn check_label_agreement(&self, rows: Option<&[usize]>, given: &[ClassId]) -> Result<()> {
        let expected: Vec<ClassId> = match rows {
            Some(idx) => idx
                .iter()
                .map(|&i| self.codec.encode(&self.train_corpus.labels()[i]))
                .collect::<Result<_, _>>()?,
            None => self.train_corpus.encoded_labels(&self.codec)?,
        };
        if given.len() != expected.len() {
            bail!(
                "Provided labels ({}) do not match the selected rows ({})",
                given.len(),
                expected.len()
            );
        }
        for (pos, (&g, &e)) in given.iter().zip(expected.iter()).enumerate() {
            if g != e {
                bail!(
                    "Provided label {} at position {} disagrees with the training file (expected {})",
                    g,
                    pos,
                    e
                );
            }
        }
        Ok(())
    }

    /// Write the selected training rows, in the order given, to a fresh
    /// temporary file in the backend's training format.
    fn materialize_rows(&self, idx: &[usize]) -> Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("textsift-train-").suffix(".txt");
        let mut file = match &self.config.scratch_dir {
            Some(dir) => builder.tempfile_in(dir).with_context(|| {
                format!(
                    "Failed to create intermediate training file under {}",
                    dir.display()
                )
            })?,
            None => builder
                .tempfile()
                .context("Failed to create intermediate training file")?,
        };
        let rows = idx.iter().map(|&i| {
            (
                self.train_corpus.labels()[i].as_str(),
                self.train_corpus.texts()[i].as_str(),
            )
        });
        write_labeled_rows(&mut file, rows, &self.config.train_options.label_prefix)?;
        file.flush()
            .context("Failed to flush intermediate training file")?;
        log::debug!(
            "Materialized {} training rows into {}",
            idx.len(),
            file.path().display()
        );
        Ok(file)
    }

    fn encode_backend_label(&self, label: &str) -> Result<ClassId> {
        let prefix = self.config.train_options.label_prefix.as_str();
        let bare = label.strip_prefix(prefix).unwrap_or(label);
        self.codec
            .encode(bare)
            .with_context(|| format!("Backend returned a label missing from the codec: {}", label))
    }

    fn train_from_file(&mut self, path: &Path, n_rows: usize) -> Result<()> {
        log::info!(
            "Fitting {} backend on {} ({} rows)",
            self.backend.name(),
            path.display(),
            n_rows
        );
        self.backend.train_file(path, &self.config.train_options)
    }
}

impl Estimator for FastTextClassifier {
    fn fit(&mut self, rows: Option<&[usize]>, labels: Option<&[ClassId]>) -> Result<()> {
        match rows {
            None => {
                if let Some(given) = labels {
                    self.check_label_agreement(None, given)?;
                }
                let path = self.config.train_file.clone();
                let n_rows = self.train_corpus.len();
                self.train_from_file(&path, n_rows)?;
            }
            Some(idx) => {
                Self::check_indices(&self.train_corpus, idx, "training")?;
                if let Some(given) = labels {
                    self.check_label_agreement(Some(idx), given)?;
                }
                let file = self.materialize_rows(idx)?;
                self.train_from_file(file.path(), idx.len())?;
                if self.config.keep_intermediate {
                    let path = file
                        .into_temp_path()
                        .keep()
                        .map_err(|e| anyhow!("Failed to keep intermediate training file: {}", e))?;
                    log::info!("Kept intermediate training file at {}", path.display());
                }
                // Otherwise the temp file is deleted when `file` drops here.
            }
        }
        self.fitted = true;
        Ok(())
    }

    fn predict(&self, rows: RowSelection<'_>) -> Result<Vec<ClassId>> {
        self.ensure_fitted()?;
        let (corpus, idx) = self.selection(rows)?;
        let n = idx.map_or(corpus.len(), <[usize]>::len);
        let mut out = Vec::with_capacity(n);
        for pos in 0..n {
            let row = idx.map_or(pos, |s| s[pos]);
            let preds = self.backend.predict_line(&corpus.texts()[row], 1)?;
            let (label, _) = preds
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("Backend returned no prediction for row {}", row))?;
            out.push(self.encode_backend_label(&label)?);
        }
        Ok(out)
    }

    fn predict_proba(&self, rows: RowSelection<'_>) -> Result<Array2<f32>> {
        self.ensure_fitted()?;
        let (corpus, idx) = self.selection(rows)?;
        let n = idx.map_or(corpus.len(), <[usize]>::len);
        let n_classes = self.codec.len();
        let mut proba = Array2::<f32>::zeros((n, n_classes));
        for pos in 0..n {
            let row = idx.map_or(pos, |s| s[pos]);
            let preds = self.backend.predict_line(&corpus.texts()[row], n_classes as i32)?;
            for (label, p) in preds {
                let class = self.encode_backend_label(&label)?;
                proba[[pos, class]] = p.clamp(0.0, 1.0);
            }
        }
        Ok(proba)
    }

    fn score(
        &self,
        rows: RowSelection<'_>,
        truth: Option<&[ClassId]>,
        k: Option<usize>,
    ) -> Result<f32> {
        let proba = self.predict_proba(rows)?;
        let truth: Vec<ClassId> = match truth {
            Some(t) => t.to_vec(),
            None => {
                let (corpus, idx) = self.selection(rows)?;
                match idx {
                    Some(idx) => idx
                        .iter()
                        .map(|&i| self.codec.encode(&corpus.labels()[i]))
                        .collect::<Result<_, _>>()?,
                    None => corpus.encoded_labels(&self.codec)?,
                }
            }
        };
        let k = k.unwrap_or(self.config.default_k);
        average_precision_at_k(&proba, &truth, k)
    }

    fn n_classes(&self) -> usize {
        self.codec.len()
    }

    fn name(&self) -> &str {
        self.backend.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::labeled_text::write_labeled_file;
    use std::path::PathBuf;

    fn fixture_file(dir: &Path, name: &str, rows: &[(&str, &str)]) -> PathBuf {
        let path = dir.join(name);
        write_labeled_file(&path, rows.iter().copied(), "__label__").unwrap();
        path
    }

    #[test]
    fn construction_fails_on_empty_training_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "").unwrap();
        let config = ClassifierConfig {
            train_file: path,
            ..ClassifierConfig::default()
        };
        assert!(FastTextClassifier::new(config).is_err());
    }

    #[test]
    fn heldout_selection_without_heldout_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let train = fixture_file(dir.path(), "train.txt", &[("a", "x"), ("b", "y")]);
        let config = ClassifierConfig {
            train_file: train,
            ..ClassifierConfig::default()
        };
        let mut clf = FastTextClassifier::new(config).unwrap();
        clf.fit(None, None).unwrap();
        assert!(clf.predict(RowSelection::Heldout).is_err());
    }

    #[test]
    fn unfitted_classifier_refuses_to_predict() {
        let dir = tempfile::tempdir().unwrap();
        let train = fixture_file(dir.path(), "train.txt", &[("a", "x"), ("b", "y")]);
        let config = ClassifierConfig {
            train_file: train,
            ..ClassifierConfig::default()
        };
        let clf = FastTextClassifier::new(config).unwrap();
        assert!(clf.predict(RowSelection::Train).is_err());
        assert!(clf.predict_proba(RowSelection::Train).is_err());
        assert!(clf.score(RowSelection::Train, None, None).is_err());
    }
}
