//! Mapping between string labels and dense class codes.
//!
//! Backends speak prefixed string labels while the estimator surface speaks
//! dense integer codes that double as column indices into probability
//! matrices. `LabelCodec` is the single place that translation happens, so
//! every consumer agrees on the same ordering.

use std::collections::{BTreeSet, HashMap};

use crate::error::CodecError;

/// Dense class code. Also the column index of the class in any probability
/// matrix produced by this crate.
pub type ClassId = usize;

/// Bidirectional label map with a deterministic ordering: codes are assigned
/// by sorting the distinct labels, so two corpora with the same label set
/// always produce the same codec.
#[derive(Debug, Clone)]
pub struct LabelCodec {
    label_to_code: HashMap<String, ClassId>,
    code_to_label: Vec<String>,
}

impl LabelCodec {
    /// Build a codec from any iterator of labels. Duplicates are fine; the
    /// distinct set is sorted before codes are assigned.
    pub fn from_labels<I, S>(labels: I) -> Result<Self, CodecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = labels
            .into_iter()
            .map(|label| label.as_ref().to_string())
            .collect();
        if distinct.is_empty() {
            return Err(CodecError::EmptyLabelSet);
        }
        let code_to_label: Vec<String> = distinct.into_iter().collect();
        let label_to_code = code_to_label
            .iter()
            .enumerate()
            .map(|(code, label)| (label.clone(), code))
            .collect();
        Ok(LabelCodec {
            label_to_code,
            code_to_label,
        })
    }

    /// Dense code for a label.
    pub fn encode(&self, label: &str) -> Result<ClassId, CodecError> {
        self.label_to_code
            .get(label)
            .copied()
            .ok_or_else(|| CodecError::UnknownLabel(label.to_string()))
    }

    /// Label for a dense code.
    pub fn decode(&self, code: ClassId) -> Result<&str, CodecError> {
        self.code_to_label
            .get(code)
            .map(String::as_str)
            .ok_or(CodecError::InvalidCode {
                code,
                n_classes: self.code_to_label.len(),
            })
    }

    pub fn contains(&self, label: &str) -> bool {
        self.label_to_code.contains_key(label)
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.code_to_label.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code_to_label.is_empty()
    }

    /// All labels in code order.
    pub fn labels(&self) -> &[String] {
        &self.code_to_label
    }
}
