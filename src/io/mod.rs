//! IO utilities for label-prefixed training and evaluation files.

pub mod labeled_text;

pub use labeled_text::{
    flatten_multilabel_line, parse_labeled_line, read_labeled_file, split_train_test,
    write_labeled_file, write_labeled_rows, LabeledReader, LabeledRow, ReadOptions,
    DEFAULT_LABEL_PREFIX,
};
