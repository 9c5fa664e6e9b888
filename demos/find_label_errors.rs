use anyhow::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use textsift::classifier::{Estimator, FastTextClassifier, RowSelection};
use textsift::config::ClassifierConfig;
use textsift::cv::cross_val_pred_proba;
use textsift::io::labeled_text::{split_train_test, write_labeled_file, LabeledRow};
use textsift::metrics::top_k_indices;

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

/// Generate `n_per_topic` rows per topic, each with three tokens drawn from
/// the topic's vocabulary, shuffled into one row list.
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

/// Relabel the given rows with the next topic in the list, keeping the text.
fn plant_errors(rows: &mut [LabeledRow], planted: &[usize]) {
    for &i in planted {
        let current = TOPICS
            .iter()
            .position(|(topic, _)| *topic == rows[i].0)
            .unwrap();
        let (wrong, _) = TOPICS[(current + 1) % TOPICS.len()];
        println!(
            "Planting error at row {}: '{}' relabeled as '{}'",
            i, rows[i].0, wrong
        );
        rows[i].0 = wrong.to_string();
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut rng = StdRng::seed_from_u64(7);
    let mut rows = synthetic_rows(40, &mut rng);

    // Corrupt a handful of training rows so there is something to find.
    let planted = vec![10usize, 33, 58, 84];
    plant_errors(&mut rows, &planted);

    // Hold out the last 20 rows for scoring; none of the planted errors are
    // in that range.
    let (train_rows, heldout_rows) = split_train_test(rows, 20)?;
    let dir = tempfile::tempdir()?;
    let train_file = dir.path().join("train.txt");
    let heldout_file = dir.path().join("heldout.txt");
    write_labeled_file(&train_file, train_rows, "__label__")?;
    write_labeled_file(&heldout_file, heldout_rows, "__label__")?;

    let mut config = ClassifierConfig {
        train_file,
        heldout_file: Some(heldout_file),
        ..ClassifierConfig::default()
    };
    config.train_options.epoch = 10;

    let mut clf = FastTextClassifier::new(config)?;
    clf.fit(None, None)?;
    println!(
        "Held-out precision@1 before cleaning: {:.3}",
        clf.score(RowSelection::Heldout, None, Some(1))?
    );

    // Out-of-fold probabilities: each row is predicted by a model that never
    // saw it, so a confidently planted error cannot vouch for itself.
    let rows: Vec<usize> = (0..clf.train_corpus().len()).collect();
    let labels = clf.train_corpus().encoded_labels(clf.codec())?;
    let psx = cross_val_pred_proba(&mut clf, &rows, &labels, 5, 42)?;

    // Rank rows by self-confidence, the out-of-fold probability of the label
    // the file assigns them. Planted errors sink to the bottom.
    let mut ranked: Vec<(usize, f32)> = labels
        .iter()
        .enumerate()
        .map(|(i, &given)| (i, psx[[i, given]]))
        .collect();
    ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());

    println!("\nLeast self-confident training rows:");
    for &(i, confidence) in ranked.iter().take(8) {
        let predicted = clf.codec().decode(top_k_indices(psx.row(i), 1)[0])?;
        println!(
            "  row {:>3}  given '{}'  predicted '{}'  self-confidence {:.3}  \"{}\"",
            i,
            clf.train_corpus().labels()[i],
            predicted,
            confidence,
            clf.train_corpus().texts()[i]
        );
    }

    // Flag every row whose out-of-fold prediction disagrees with its label,
    // then refit without them.
    let suspects: Vec<usize> = (0..labels.len())
        .filter(|&i| top_k_indices(psx.row(i), 1)[0] != labels[i])
        .collect();
    let found = suspects.iter().filter(|&&i| planted.contains(&i)).count();
    println!(
        "\nFlagged {} suspect rows ({} of {} planted errors among them)",
        suspects.len(),
        found,
        planted.len()
    );

    let keep: Vec<usize> = (0..labels.len()).filter(|i| !suspects.contains(i)).collect();
    clf.fit(Some(&keep), None)?;
    println!(
        "Held-out precision@1 after dropping suspects: {:.3}",
        clf.score(RowSelection::Heldout, None, Some(1))?
    );

    Ok(())
}
