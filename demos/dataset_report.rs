use anyhow::Result;
use maud::html;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use textsift::classifier::{Estimator, FastTextClassifier, RowSelection};
use textsift::config::ClassifierConfig;
use textsift::io::labeled_text::{split_train_test, write_labeled_file, LabeledRow};
use textsift::report::plots::{
    plot_calibration_curve, plot_confidence_histogram, plot_label_frequency,
};
use textsift::report::report::{Report, ReportSection};

const TOPICS: [(&str, [&str; 6]); 3] = [
    (
        "billing",
        ["invoice", "refund", "charge", "payment", "receipt", "overdue"],
    ),
    (
        "shipping",
        ["parcel", "courier", "tracking", "delivery", "customs", "warehouse"],
    ),
    (
        "account",
        ["password", "login", "profile", "username", "reset", "email"],
    ),
];

fn synthetic_rows(n_per_topic: usize, rng: &mut StdRng) -> Vec<LabeledRow> {
    let mut rows = Vec::new();
    for (topic, vocab) in TOPICS {
        for _ in 0..n_per_topic {
            let text: Vec<&str> = (0..3).map(|_| *vocab.choose(rng).unwrap()).collect();
            rows.push((topic.to_string(), text.join(" ")));
        }
    }
    rows.shuffle(rng);
    rows
}

fn main() -> Result<()> {
    env_logger::init();

    let mut rng = StdRng::seed_from_u64(3);
    let mut rows = synthetic_rows(40, &mut rng);

    // Relabel a few rows so the confidence histogram has a disagreeing
    // population; two of them land in the held-out range.
    for &i in &[5usize, 21, 47, 70, 100, 110] {
        let current = TOPICS
            .iter()
            .position(|(topic, _)| *topic == rows[i].0)
            .unwrap();
        rows[i].0 = TOPICS[(current + 1) % TOPICS.len()].0.to_string();
    }

    let (train_rows, heldout_rows) = split_train_test(rows, 24)?;
    let dir = tempfile::tempdir()?;
    let train_file = dir.path().join("train.txt");
    let heldout_file = dir.path().join("heldout.txt");
    write_labeled_file(&train_file, train_rows, "__label__")?;
    write_labeled_file(&heldout_file, heldout_rows, "__label__")?;

    let config = ClassifierConfig {
        train_file,
        heldout_file: Some(heldout_file),
        ..ClassifierConfig::default()
    };
    let mut clf = FastTextClassifier::new(config)?;
    clf.fit(None, None)?;

    let pred = clf.predict(RowSelection::Heldout)?;
    let proba = clf.predict_proba(RowSelection::Heldout)?;
    let truth = clf
        .heldout_corpus()
        .unwrap()
        .encoded_labels(clf.codec())?;

    // Create a new report
    let mut report = Report::new(
        "Corpus diagnostics",
        "0.1.0",
        None,
        "Synthetic support-ticket corpus",
    );

    // Section 1: Introduction
    let mut intro_section = ReportSection::new("Introduction");
    intro_section.add_content(html! {
        "This report summarizes a small synthetic corpus and how the trained "
        "classifier behaves on its held-out rows. A handful of rows were "
        "deliberately relabeled, so some disagreement is expected."
    });
    report.add_section(intro_section);

    // Section 2: Label frequency
    let counts = clf.train_corpus().label_counts();
    let mut label_section = ReportSection::new("Training labels");
    label_section.add_content(html! {
        "Row counts per label in the training file."
    });
    label_section.add_plot(plot_label_frequency(&counts, "Training label frequency").unwrap());
    report.add_section(label_section);

    // Section 3: Held-out confidence
    let mut confidence_section = ReportSection::new("Held-out confidence");
    confidence_section.add_content(html! {
        "Top-1 confidence split by agreement with the given label. Confident "
        "disagreements are the label-noise suspects."
    });
    confidence_section
        .add_plot(plot_confidence_histogram(&proba, &pred, &truth, "Held-out confidence").unwrap());
    confidence_section.add_content(html! {
        "Observed agreement per confidence bin against the diagonal."
    });
    confidence_section
        .add_plot(plot_calibration_curve(&proba, &pred, &truth, 10, "Held-out calibration").unwrap());
    report.add_section(confidence_section);

    report.save_to_file("dataset_report.html")?;

    println!("Report saved to dataset_report.html");
    println!(
        "Held-out precision@1: {:.3}",
        clf.score(RowSelection::Heldout, None, Some(1))?
    );

    Ok(())
}
