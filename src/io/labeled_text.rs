//! Label-prefixed text file reader and writer.
//!
//! The on-disk format is one example per line: one leading label token such
//! as `__label__baking`, a space, then the raw text. This is the format the
//! fastText CLI trains from, so files written here feed the native backend
//! unchanged.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};

/// Label prefix used by the fastText CLI.
pub const DEFAULT_LABEL_PREFIX: &str = "__label__";

/// One parsed example. The label is stored without its prefix; the text may
/// be empty for label-only rows, which are kept so row indices stay aligned
/// with the file.
pub type LabeledRow = (String, String);

/// Configuration for reading label-prefixed text files.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Token prefix marking the label at the start of each line.
    pub label_prefix: String,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            label_prefix: DEFAULT_LABEL_PREFIX.to_string(),
        }
    }
}

/// Parse one line into `(label, text)`. The trailing newline is ignored;
/// blank lines, lines without the prefix and empty labels are errors.
pub fn parse_labeled_line(line: &str, prefix: &str) -> Result<LabeledRow> {
    let line = line.trim_end_matches(&['\r', '\n'][..]);
    if line.is_empty() {
        bail!("Blank line");
    }
    let rest = line
        .strip_prefix(prefix)
        .ok_or_else(|| anyhow!("Missing label prefix '{}'", prefix))?;
    let (label, text) = match rest.split_once(' ') {
        Some((label, text)) => (label, text),
        None => (rest, ""),
    };
    if label.is_empty() {
        bail!("Empty label");
    }
    if text.starts_with(prefix) {
        log::warn!(
            "Row carries more than one label token; only the first is used. \
             Flatten multi-label lines before training."
        );
    }
    Ok((label.to_string(), text.to_string()))
}

/// Streaming reader yielding one `LabeledRow` per line.
pub struct LabeledReader<R: BufRead> {
    reader: R,
    prefix: String,
    line_no: usize,
}

impl LabeledReader<BufReader<File>> {
    /// Open a label-prefixed text file for streaming reads.
    pub fn open<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<Self> {
        let file = File::open(&path).with_context(|| {
            format!("Failed to open labeled file: {}", path.as_ref().display())
        })?;
        Ok(LabeledReader {
            reader: BufReader::new(file),
            prefix: options.label_prefix.clone(),
            line_no: 0,
        })
    }
}

impl<R: BufRead> LabeledReader<R> {
    /// Wrap an already open reader. Used by tests to parse in-memory data.
    pub fn from_reader(reader: R, options: &ReadOptions) -> Self {
        LabeledReader {
            reader,
            prefix: options.label_prefix.clone(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for LabeledReader<R> {
    type Item = Result<LabeledRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => {
                self.line_no += 1;
                let row = parse_labeled_line(&line, &self.prefix)
                    .with_context(|| format!("Invalid row at line {}", self.line_no));
                Some(row)
            }
            Err(e) => Some(Err(anyhow::Error::new(e)
                .context(format!("Failed to read line {}", self.line_no + 1)))),
        }
    }
}

/// Read a whole file into parallel label and text vectors, labels stripped
/// of their prefix, row order preserved.
pub fn read_labeled_file<P: AsRef<Path>>(
    path: P,
    options: &ReadOptions,
) -> Result<(Vec<String>, Vec<String>)> {
    let reader = LabeledReader::open(&path, options)?;
    let mut labels = Vec::new();
    let mut texts = Vec::new();
    for row in reader {
        let (label, text) = row.with_context(|| {
            format!("Failed to read labeled file: {}", path.as_ref().display())
        })?;
        labels.push(label);
        texts.push(text);
    }
    Ok((labels, texts))
}

/// Write `(label, text)` rows to an open writer, one line per row, prefixing
/// each label. Label-only rows are written without a trailing space.
pub fn write_labeled_rows<W, I, L, T>(writer: &mut W, rows: I, prefix: &str) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = (L, T)>,
    L: AsRef<str>,
    T: AsRef<str>,
{
    for (label, text) in rows {
        let label = label.as_ref();
        let text = text.as_ref();
        if text.is_empty() {
            writeln!(writer, "{}{}", prefix, label).context("Failed to write labeled row")?;
        } else {
            writeln!(writer, "{}{} {}", prefix, label, text)
                .context("Failed to write labeled row")?;
        }
    }
    Ok(())
}

/// Write `(label, text)` rows to a new file in the on-disk format.
pub fn write_labeled_file<P, I, L, T>(path: P, rows: I, prefix: &str) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = (L, T)>,
    L: AsRef<str>,
    T: AsRef<str>,
{
    let file = File::create(&path).with_context(|| {
        format!("Failed to create labeled file: {}", path.as_ref().display())
    })?;
    let mut writer = BufWriter::new(file);
    write_labeled_rows(&mut writer, rows, prefix)?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush labeled file: {}", path.as_ref().display()))?;
    Ok(())
}

/// Split a raw line carrying several leading label tokens into one row per
/// label, all sharing the remaining text. Lines with no label token produce
/// no rows.
pub fn flatten_multilabel_line(line: &str, prefix: &str) -> Vec<LabeledRow> {
    let line = line.trim_end_matches(&['\r', '\n'][..]);
    let mut labels: Vec<&str> = Vec::new();
    let mut rest = line;
    while rest.starts_with(prefix) {
        match rest.split_once(' ') {
            Some((token, tail)) => {
                labels.push(token.trim_start_matches(prefix));
                rest = tail;
            }
            None => {
                labels.push(rest.trim_start_matches(prefix));
                rest = "";
                break;
            }
        }
    }
    labels
        .into_iter()
        .filter(|label| !label.is_empty())
        .map(|label| (label.to_string(), rest.to_string()))
        .collect()
}

/// Hold out the last `n_heldout` rows for evaluation and keep the rest for
/// training.
pub fn split_train_test(
    rows: Vec<LabeledRow>,
    n_heldout: usize,
) -> Result<(Vec<LabeledRow>, Vec<LabeledRow>)> {
    if n_heldout >= rows.len() {
        bail!(
            "Holding out {} rows leaves no training data ({} rows total)",
            n_heldout,
            rows.len()
        );
    }
    let mut train = rows;
    let heldout = train.split_off(train.len() - n_heldout);
    Ok((train, heldout))
}
