use std::error::Error;
use std::fmt;

/// Custom error type for label codec failures
#[derive(Debug, PartialEq, Eq)]
pub enum CodecError {
    /// A label was requested that never appeared in the corpus the codec
    /// was built from.
    UnknownLabel(String),
    /// A class code at or beyond the number of known classes.
    InvalidCode { code: usize, n_classes: usize },
    /// The codec was built from an empty label set.
    EmptyLabelSet,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::UnknownLabel(label) => {
                write!(f, "Label '{}' is not part of the codec", label)
            }
            CodecError::InvalidCode { code, n_classes } => {
                write!(
                    f,
                    "Class code {} is out of range for a codec with {} classes",
                    code, n_classes
                )
            }
            CodecError::EmptyLabelSet => {
                write!(f, "Cannot build a label codec from an empty label set")
            }
        }
    }
}

impl Error for CodecError {}
