//! Reporting and plotting helpers used by examples.
//!
//! This module wraps plotting helpers (Plotly) and a small maud-based HTML
//! builder used to produce dataset and classifier diagnostic reports. Plots
//! are intentionally small helper functions converting numerical data into
//! `plotly::Plot`.
pub mod plots;
pub mod report;

pub use plots::{plot_calibration_curve, plot_confidence_histogram, plot_label_frequency};
pub use report::{Report, ReportSection};
