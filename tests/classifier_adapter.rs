//! Integration tests for the classifier adapter: subset fits, masked
//! predictions, dense probability matrices and top-k scoring.

use std::path::{Path, PathBuf};

use textsift::classifier::{Estimator, FastTextClassifier, RowSelection};
use textsift::config::{ClassifierConfig, TrainOptions};
use textsift::io::labeled_text::{read_labeled_file, write_labeled_file, ReadOptions};
use textsift::metrics::accuracy;
use textsift::models::{MockBackend, SupervisedBackend};

const CLASS_VOCAB: &[(&str, [&str; 5])] = &[
    ("alpha", ["red", "crimson", "scarlet", "ruby", "cherry"]),
    ("beta", ["blue", "azure", "navy", "cobalt", "sapphire"]),
    ("gamma", ["green", "jade", "emerald", "olive", "moss"]),
];

/// Rows interleaved by class: row `i` belongs to class `i % 3` and its text
/// is three tokens drawn from that class's private vocabulary.
fn corpus_rows(n_rows: usize) -> Vec<(String, String)> {
    (0..n_rows)
        .map(|i| {
            let (label, vocab) = CLASS_VOCAB[i % CLASS_VOCAB.len()];
            let step = i / CLASS_VOCAB.len();
            let text = format!(
                "{} {} {}",
                vocab[step % 5],
                vocab[(step + 1) % 5],
                vocab[(step + 2) % 5]
            );
            (label.to_string(), text)
        })
        .collect()
}

fn write_corpus(dir: &Path, name: &str, rows: &[(String, String)]) -> PathBuf {
    let path = dir.join(name);
    write_labeled_file(
        &path,
        rows.iter().map(|(l, t)| (l.as_str(), t.as_str())),
        "__label__",
    )
    .unwrap();
    path
}

/// 30 training rows and 9 held-out rows, fitted on the full training file.
fn fitted_adapter(dir: &Path) -> FastTextClassifier {
    let train = write_corpus(dir, "train.txt", &corpus_rows(30));
    let heldout = write_corpus(dir, "heldout.txt", &corpus_rows(9));
    let config = ClassifierConfig {
        train_file: train,
        heldout_file: Some(heldout),
        ..ClassifierConfig::default()
    };
    let mut clf = FastTextClassifier::new(config).unwrap();
    clf.fit(None, None).unwrap();
    clf
}

// ---------------------------------------------------------------------------
// Masked predictions
// ---------------------------------------------------------------------------

#[test]
fn predict_proba_masks_to_the_requested_rows() {
    let dir = tempfile::tempdir().unwrap();
    let clf = fitted_adapter(dir.path());

    let rows = [5usize, 10, 14];
    let proba = clf
        .predict_proba(RowSelection::TrainSubset(&rows))
        .unwrap();
    assert_eq!(proba.nrows(), 3);
    assert_eq!(proba.ncols(), clf.n_classes());
    for row in proba.outer_iter() {
        let total: f32 = row.sum();
        assert!((total - 1.0).abs() < 1e-4, "row should sum to 1, got {}", total);
    }
}

#[test]
fn predict_masks_to_the_requested_rows() {
    let dir = tempfile::tempdir().unwrap();
    let clf = fitted_adapter(dir.path());

    let rows = [5usize, 10, 14];
    let pred = clf.predict(RowSelection::TrainSubset(&rows)).unwrap();
    assert_eq!(pred.len(), 3);
    // Row i of the fixture belongs to class i % 3.
    for (pos, &row) in rows.iter().enumerate() {
        let label = CLASS_VOCAB[row % 3].0;
        assert_eq!(pred[pos], clf.codec().encode(label).unwrap());
    }
}

#[test]
fn out_of_range_row_indices_error() {
    let dir = tempfile::tempdir().unwrap();
    let clf = fitted_adapter(dir.path());

    assert!(clf
        .predict_proba(RowSelection::TrainSubset(&[999]))
        .is_err());
    assert!(clf
        .predict(RowSelection::HeldoutSubset(&[0, 42]))
        .is_err());
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

#[test]
fn score_over_masked_rows_is_a_probability() {
    let dir = tempfile::tempdir().unwrap();
    let clf = fitted_adapter(dir.path());

    let rows = [0usize, 2, 4, 6, 8];
    let score = clf
        .score(RowSelection::TrainSubset(&rows), None, Some(2))
        .unwrap();
    assert!((0.0..=1.0).contains(&score));
    // The fixture vocabularies are disjoint, so the backend is exact here.
    assert!(score >= 0.99);
}

#[test]
fn score_is_non_decreasing_in_k() {
    let dir = tempfile::tempdir().unwrap();
    let train = write_corpus(dir.path(), "train.txt", &corpus_rows(30));

    // Nine clean rows plus three whose text mixes another class's tokens,
    // so top-1 misses them but top-2 recovers them.
    let mut rows = corpus_rows(9);
    rows.push(("alpha".to_string(), "blue azure red".to_string()));
    rows.push(("alpha".to_string(), "navy cobalt crimson".to_string()));
    rows.push(("alpha".to_string(), "sapphire blue scarlet".to_string()));
    let heldout = write_corpus(dir.path(), "heldout.txt", &rows);

    let config = ClassifierConfig {
        train_file: train,
        heldout_file: Some(heldout),
        ..ClassifierConfig::default()
    };
    let mut clf = FastTextClassifier::new(config).unwrap();
    clf.fit(None, None).unwrap();

    let mut previous = 0.0f32;
    for k in 1..=clf.n_classes() {
        let score = clf.score(RowSelection::Heldout, None, Some(k)).unwrap();
        assert!(
            score >= previous - 1e-6,
            "score at k={} regressed: {} < {}",
            k,
            score,
            previous
        );
        previous = score;
    }
    // With the mixed rows, top-1 misses exactly 3 of 12.
    let at_one = clf.score(RowSelection::Heldout, None, Some(1)).unwrap();
    assert!((at_one - 0.75).abs() < 1e-6);
    let at_two = clf.score(RowSelection::Heldout, None, Some(2)).unwrap();
    assert!((at_two - 1.0).abs() < 1e-6);
}

#[test]
fn score_accepts_caller_truth_and_defaults_to_file_labels() {
    let dir = tempfile::tempdir().unwrap();
    let clf = fitted_adapter(dir.path());

    let from_file = clf.score(RowSelection::Heldout, None, Some(1)).unwrap();
    let truth = clf
        .heldout_corpus()
        .unwrap()
        .encoded_labels(clf.codec())
        .unwrap();
    let explicit = clf
        .score(RowSelection::Heldout, Some(&truth), Some(1))
        .unwrap();
    assert!((from_file - explicit).abs() < 1e-6);

    // Wrong truth length is rejected.
    assert!(clf
        .score(RowSelection::Heldout, Some(&truth[..3]), Some(1))
        .is_err());
}

// ---------------------------------------------------------------------------
// Parity with direct backend calls
// ---------------------------------------------------------------------------

#[test]
fn predictions_match_direct_backend_calls() {
    let dir = tempfile::tempdir().unwrap();
    let clf = fitted_adapter(dir.path());

    let mut direct = MockBackend::new();
    direct
        .train_file(
            dir.path().join("train.txt").as_path(),
            &TrainOptions::default(),
        )
        .unwrap();

    let us = clf.predict(RowSelection::Heldout).unwrap();
    let mut them = Vec::new();
    for text in clf.heldout_corpus().unwrap().texts() {
        let preds = direct.predict_line(text, 1).unwrap();
        let bare = preds[0].0.strip_prefix("__label__").unwrap();
        them.push(clf.codec().encode(bare).unwrap());
    }
    assert!((accuracy(&us, &them).unwrap() - 1.0).abs() < 1e-6);
}

#[test]
fn probability_maxima_match_direct_backend_calls() {
    let dir = tempfile::tempdir().unwrap();
    let clf = fitted_adapter(dir.path());

    let mut direct = MockBackend::new();
    direct
        .train_file(
            dir.path().join("train.txt").as_path(),
            &TrainOptions::default(),
        )
        .unwrap();

    let proba = clf.predict_proba(RowSelection::Heldout).unwrap();
    let mut squared_diff = 0.0f32;
    for (row, text) in proba
        .outer_iter()
        .zip(clf.heldout_corpus().unwrap().texts())
    {
        let ours = row.fold(0.0f32, |acc, &v| acc.max(v));
        let theirs = direct.predict_line(text, -1).unwrap()[0].1;
        squared_diff += (ours - theirs).powi(2);
    }
    assert!(squared_diff < 1e-4, "sum of squared diffs: {}", squared_diff);
}

// ---------------------------------------------------------------------------
// Probability matrix semantics
// ---------------------------------------------------------------------------

#[test]
fn classes_unseen_in_training_keep_zero_probability() {
    let dir = tempfile::tempdir().unwrap();
    let train = write_corpus(dir.path(), "train.txt", &corpus_rows(30));

    let mut rows = corpus_rows(6);
    rows.push(("zeta".to_string(), "quartz feldspar mica".to_string()));
    rows.push(("zeta".to_string(), "mica quartz granite".to_string()));
    let heldout = write_corpus(dir.path(), "heldout.txt", &rows);

    let config = ClassifierConfig {
        train_file: train,
        heldout_file: Some(heldout),
        ..ClassifierConfig::default()
    };
    let mut clf = FastTextClassifier::new(config).unwrap();
    clf.fit(None, None).unwrap();

    // The codec spans the held-out-only class, the trained backend does not.
    assert_eq!(clf.n_classes(), 4);
    let zeta = clf.codec().encode("zeta").unwrap();
    let proba = clf.predict_proba(RowSelection::Heldout).unwrap();
    assert_eq!(proba.ncols(), 4);
    for row in proba.outer_iter() {
        assert_eq!(row[zeta], 0.0);
        assert!((row.sum() - 1.0).abs() < 1e-4);
    }
}

#[test]
fn subset_fit_trains_only_on_the_selected_rows() {
    let dir = tempfile::tempdir().unwrap();
    let mut clf = fitted_adapter(dir.path());

    // Refit on alpha and beta rows only.
    let keep: Vec<usize> = (0..30).filter(|i| i % 3 != 2).collect();
    clf.fit(Some(&keep), None).unwrap();

    let gamma = clf.codec().encode("gamma").unwrap();
    let proba = clf.predict_proba(RowSelection::Train).unwrap();
    for row in proba.outer_iter() {
        assert_eq!(row[gamma], 0.0);
        assert!((row.sum() - 1.0).abs() < 1e-4);
    }
    // A gamma row now predicts whichever retained class wins.
    let pred = clf.predict(RowSelection::TrainSubset(&[2])).unwrap();
    assert_ne!(pred[0], gamma);
}

// ---------------------------------------------------------------------------
// Fit label validation
// ---------------------------------------------------------------------------

#[test]
fn fit_validates_caller_labels_against_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut clf = fitted_adapter(dir.path());

    // Rows 0, 1, 2 are alpha, beta, gamma: codes 0, 1, 2.
    assert!(clf.fit(Some(&[0, 1, 2]), Some(&[0, 1, 2])).is_ok());

    let err = clf.fit(Some(&[0, 1, 2]), Some(&[0, 1])).unwrap_err();
    assert!(err.to_string().contains("do not match"));

    let err = clf.fit(Some(&[0, 1, 2]), Some(&[0, 2, 1])).unwrap_err();
    assert!(err.to_string().contains("disagrees"));
}

#[test]
fn fit_rejects_out_of_range_rows() {
    let dir = tempfile::tempdir().unwrap();
    let mut clf = fitted_adapter(dir.path());
    assert!(clf.fit(Some(&[0, 999]), None).is_err());
    assert!(clf.fit(Some(&[]), None).is_err());
}

// ---------------------------------------------------------------------------
// Intermediate training files
// ---------------------------------------------------------------------------

#[test]
fn intermediate_file_is_removed_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = dir.path().join("scratch");
    std::fs::create_dir(&scratch).unwrap();

    let train = write_corpus(dir.path(), "train.txt", &corpus_rows(30));
    let config = ClassifierConfig {
        train_file: train,
        scratch_dir: Some(scratch.clone()),
        ..ClassifierConfig::default()
    };
    let mut clf = FastTextClassifier::new(config).unwrap();
    clf.fit(Some(&[0, 1, 2]), None).unwrap();

    assert_eq!(std::fs::read_dir(&scratch).unwrap().count(), 0);
}

#[test]
fn intermediate_file_is_kept_on_request_in_subset_order() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = dir.path().join("scratch");
    std::fs::create_dir(&scratch).unwrap();

    let train = write_corpus(dir.path(), "train.txt", &corpus_rows(30));
    let config = ClassifierConfig {
        train_file: train,
        keep_intermediate: true,
        scratch_dir: Some(scratch.clone()),
        ..ClassifierConfig::default()
    };
    let mut clf = FastTextClassifier::new(config).unwrap();
    clf.fit(Some(&[4, 0, 2]), None).unwrap();

    let kept: Vec<PathBuf> = std::fs::read_dir(&scratch)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(kept.len(), 1);

    // Rows appear in the order they were selected.
    let (labels, _) = read_labeled_file(&kept[0], &ReadOptions::default()).unwrap();
    assert_eq!(labels, vec!["beta", "alpha", "gamma"]);
}

// ---------------------------------------------------------------------------
// Options and odd rows
// ---------------------------------------------------------------------------

#[test]
fn train_options_are_adjustable_between_fits() {
    let dir = tempfile::tempdir().unwrap();
    let mut clf = fitted_adapter(dir.path());

    clf.train_options_mut().epoch = 1;
    assert_eq!(clf.train_options().epoch, 1);
    clf.fit(None, None).unwrap();
    assert!(clf.is_fitted());
    assert_eq!(clf.backend_name(), "mock");
}

#[test]
fn label_only_rows_predict_from_label_priors() {
    let dir = tempfile::tempdir().unwrap();
    let mut rows = corpus_rows(12);
    rows.push(("alpha".to_string(), String::new()));
    let empty_row = rows.len() - 1;
    let train = write_corpus(dir.path(), "train.txt", &rows);

    let config = ClassifierConfig {
        train_file: train,
        ..ClassifierConfig::default()
    };
    let mut clf = FastTextClassifier::new(config).unwrap();
    clf.fit(None, None).unwrap();

    let pred = clf
        .predict(RowSelection::TrainSubset(&[empty_row]))
        .unwrap();
    assert_eq!(pred.len(), 1);
    // Five alpha rows against four of each other class.
    assert_eq!(pred[0], clf.codec().encode("alpha").unwrap());
}
