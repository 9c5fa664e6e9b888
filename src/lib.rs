//! textsift: a thin classifier adapter for hunting label noise in text datasets.
//!
//! This crate wraps a supervised text classifier (fastText, or a deterministic
//! in-crate stand-in) behind a uniform estimator interface: fit on row subsets
//! of a label-prefixed corpus, dense predicted-probability matrices with zero
//! imputation outside the backend's top-k, and top-k precision scoring. On top
//! of that sit a label codec, a stratified cross-validation driver producing
//! the out-of-fold probabilities confident-learning pipelines consume, and
//! reporting/plotting helpers used by the examples.
//!
//! The design favors small, testable modules with feature flags to avoid
//! requiring native dependencies (e.g., libfasttext) unless explicitly enabled.
pub mod classifier;
pub mod config;
pub mod cv;
pub mod data_handling;
pub mod error;
pub mod io;
pub mod labels;
pub mod metrics;
pub mod models;
pub mod report;
