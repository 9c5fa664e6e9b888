use itertools_num::linspace;
use ndarray::Array2;
use plotly::common::{DashType, Line, Mode};
use plotly::layout::{Axis, Layout};
use plotly::{Bar, Histogram, Plot, Scatter};

use crate::labels::ClassId;

/// Plot per-label row counts for a corpus
pub fn plot_label_frequency(counts: &[(String, usize)], title: &str) -> Result<Plot, String> {
    if counts.is_empty() {
        return Err("No label counts to plot".to_string());
    }

    let labels: Vec<String> = counts.iter().map(|(label, _)| label.clone()).collect();
    let values: Vec<usize> = counts.iter().map(|(_, count)| *count).collect();

    let trace = Bar::new(labels, values).name("Rows");

    let layout = Layout::new()
        .title(title)
        .x_axis(Axis::new().title("Label"))
        .y_axis(Axis::new().title("Rows"));

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(layout);

    Ok(plot)
}

/// Plot a histogram of top-1 confidence, split by whether the prediction
/// agrees with the given label. Rows whose given label disagrees with a
/// confident prediction are the label-noise suspects.
pub fn plot_confidence_histogram(
    proba: &Array2<f32>,
    pred: &[ClassId],
    truth: &[ClassId],
    title: &str,
) -> Result<Plot, String> {
    // Assert that the matrix, predictions and truth cover the same rows
    assert_eq!(
        proba.nrows(),
        pred.len(),
        "Probabilities and predictions must have the same length"
    );
    assert_eq!(
        pred.len(),
        truth.len(),
        "Predictions and truth must have the same length"
    );
    if proba.ncols() == 0 {
        return Err("Probability matrix has no classes".to_string());
    }

    let mut agree = Vec::new();
    let mut disagree = Vec::new();

    for (i, row) in proba.outer_iter().enumerate() {
        let confidence = row.fold(0.0f32, |acc, &v| acc.max(v));
        if pred[i] == truth[i] {
            agree.push(confidence);
        } else {
            disagree.push(confidence);
        }
    }

    let trace_agree = Histogram::new(agree).name("Agrees with given label");
    let trace_disagree = Histogram::new(disagree).name("Disagrees with given label");

    let layout = Layout::new()
        .title(title)
        .x_axis(Axis::new().title("Top-1 confidence"))
        .y_axis(Axis::new().title("Rows"));

    let mut plot = Plot::new();
    plot.add_trace(trace_agree);
    plot.add_trace(trace_disagree);
    plot.set_layout(layout);

    Ok(plot)
}

/// Plot the observed agreement rate per confidence bin against the perfectly
/// calibrated diagonal.
pub fn plot_calibration_curve(
    proba: &Array2<f32>,
    pred: &[ClassId],
    truth: &[ClassId],
    n_bins: usize,
    title: &str,
) -> Result<Plot, String> {
    assert_eq!(
        proba.nrows(),
        pred.len(),
        "Probabilities and predictions must have the same length"
    );
    assert_eq!(
        pred.len(),
        truth.len(),
        "Predictions and truth must have the same length"
    );
    if n_bins < 2 {
        return Err("Calibration needs at least 2 bins".to_string());
    }

    let edges: Vec<f32> = linspace(0.0f32, 1.0, n_bins + 1).collect();
    let mut hits = vec![0usize; n_bins];
    let mut totals = vec![0usize; n_bins];

    for (i, row) in proba.outer_iter().enumerate() {
        let confidence = row.fold(0.0f32, |acc, &v| acc.max(v));
        let bin = ((confidence * n_bins as f32) as usize).min(n_bins - 1);
        totals[bin] += 1;
        if pred[i] == truth[i] {
            hits[bin] += 1;
        }
    }

    let mut x = Vec::new();
    let mut y = Vec::new();
    for bin in 0..n_bins {
        if totals[bin] == 0 {
            continue;
        }
        x.push((edges[bin] + edges[bin + 1]) / 2.0);
        y.push(hits[bin] as f32 / totals[bin] as f32);
    }
    if x.is_empty() {
        return Err("No populated confidence bins".to_string());
    }

    let observed = Scatter::new(x, y)
        .mode(Mode::LinesMarkers)
        .name("Observed agreement");

    let reference_line = Scatter::new(vec![0.0, 1.0], vec![0.0, 1.0])
        .mode(Mode::Lines)
        .name("Perfect calibration")
        .line(Line::new().color("red").dash(DashType::Dash));

    let mut plot = Plot::new();
    plot.add_trace(observed);
    plot.add_trace(reference_line);
    plot.set_layout(
        Layout::new()
            .title(title)
            .x_axis(Axis::new().title("Top-1 confidence"))
            .y_axis(Axis::new().title("Agreement rate")),
    );

    Ok(plot)
}
