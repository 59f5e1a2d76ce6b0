use crate::config::{IngestConfig, MalformedPolicy};
use crate::core::ids::NodeId;
use crate::error::{Error, FormatError, FormatErrorKind, Result};
use crate::ingest::edges::{IngestStats, parse_node_id};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::num::NonZeroUsize;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    Class(i64),
    Name(String),
}

impl Label {
    /// Integer values become class ids, anything else is kept as text.
    pub fn parse(field: &str) -> Self {
        match field.parse::<i64>() {
            Ok(class) => Label::Class(class),
            Err(_) => Label::Name(field.to_string()),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Class(class) => write!(f, "{class}"),
            Label::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Label::Name(value.to_string())
    }
}

/// Node id to label, possibly covering only some of the graph's nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelLookup {
    map: HashMap<NodeId, Label>,
}

impl LabelLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: NodeId) -> Option<&Label> {
        self.map.get(&node)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Label)> {
        self.map.iter().map(|(id, label)| (*id, label))
    }

    /// Later pairs overwrite earlier ones for the same id.
    pub fn merge(&mut self, pairs: impl IntoIterator<Item = (NodeId, Label)>) {
        self.map.extend(pairs);
    }

    /// Labelled ids that fall outside a graph of `node_count` nodes.
    pub fn count_outside(&self, node_count: usize) -> usize {
        self.map
            .keys()
            .filter(|id| **id as usize >= node_count)
            .count()
    }
}

impl FromIterator<(NodeId, Label)> for LabelLookup {
    fn from_iter<I: IntoIterator<Item = (NodeId, Label)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

/// A contiguous run of label rows; undecodable rows are kept as errors.
pub struct RecordBatch {
    pub index: usize,
    pub rows: Vec<std::result::Result<(u64, csv::StringRecord), FormatError>>,
}

/// Pulls at most `chunk_size` rows per batch from a headerless CSV source.
///
/// Mirrors `LineChunks`: rows read before an I/O failure are yielded as a
/// final batch and the failure on the following call.
pub struct RecordChunks<R> {
    records: Option<csv::StringRecordsIntoIter<R>>,
    chunk_size: NonZeroUsize,
    next_index: usize,
    rows_seen: u64,
    pending_error: Option<std::io::Error>,
}

impl<R: Read> RecordChunks<R> {
    pub fn new(reader: R, chunk_size: NonZeroUsize) -> Self {
        let records = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader)
            .into_records();
        Self {
            records: Some(records),
            chunk_size,
            next_index: 0,
            rows_seen: 0,
            pending_error: None,
        }
    }
}

impl<R: Read> Iterator for RecordChunks<R> {
    type Item = std::io::Result<RecordBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.pending_error.take() {
            return Some(Err(err));
        }
        let records = self.records.as_mut()?;

        let mut rows = Vec::new();
        let mut exhausted = false;
        while rows.len() < self.chunk_size.get() {
            let Some(item) = records.next() else {
                exhausted = true;
                break;
            };
            self.rows_seen += 1;
            match item {
                Ok(record) => {
                    let line = record.position().map_or(self.rows_seen, |p| p.line());
                    rows.push(Ok((line, record)));
                }
                Err(err) => {
                    let line = err.position().map_or(self.rows_seen, |p| p.line());
                    let message = err.to_string();
                    match err.into_kind() {
                        csv::ErrorKind::Io(io) => {
                            exhausted = true;
                            self.pending_error = Some(io);
                            break;
                        }
                        _ => rows.push(Err(FormatError::new(
                            line,
                            FormatErrorKind::Undecodable { message },
                        ))),
                    }
                }
            }
        }
        if exhausted {
            self.records = None;
        }

        if rows.is_empty() {
            return self.pending_error.take().map(Err);
        }

        let batch = RecordBatch {
            index: self.next_index,
            rows,
        };
        self.next_index += 1;
        Some(Ok(batch))
    }
}

/// Parses one `id,label` row.
pub fn parse_label_row(
    record: &csv::StringRecord,
) -> std::result::Result<(NodeId, Label), FormatErrorKind> {
    if record.len() != 2 {
        return Err(FormatErrorKind::WrongTokenCount {
            found: record.len(),
        });
    }
    let id = parse_node_id(&record[0])?;
    if record[1].is_empty() {
        return Err(FormatErrorKind::MissingLabel);
    }
    Ok((id, Label::parse(&record[1])))
}

/// Output of a finished label pass.
#[derive(Debug)]
pub struct LabelIngest {
    pub labels: LabelLookup,
    pub stats: IngestStats,
}

fn load_chunks<R: Read>(
    chunks: RecordChunks<R>,
    source: &Path,
    config: &IngestConfig,
) -> Result<LabelIngest> {
    let mut labels = LabelLookup::new();
    let mut stats = IngestStats::default();

    for batch in chunks {
        let batch = batch.map_err(|e| Error::io(source, e))?;
        let size = batch.rows.len();

        // rows parse independently; merging stays in file order
        let parsed = batch
            .rows
            .into_par_iter()
            .map(|row| -> std::result::Result<(NodeId, Label), FormatError> {
                let (line, record) = row?;
                parse_label_row(&record).map_err(|kind| FormatError::new(line, kind))
            })
            .collect::<Vec<_>>();

        for row in parsed {
            match row {
                Ok((id, label)) => {
                    labels.merge([(id, label)]);
                    stats.parsed += 1;
                }
                Err(err) => match config.malformed {
                    MalformedPolicy::Abort => return Err(err.into()),
                    MalformedPolicy::Skip => {
                        warn!(%err, "skipping label row");
                        stats.skipped += 1;
                    }
                },
            }
        }
        stats.batches += 1;
        debug!(
            batch = batch.index,
            rows = size,
            entries = labels.len(),
            "label batch merged"
        );
    }

    info!(
        entries = labels.len(),
        skipped = stats.skipped,
        "label file finalized"
    );
    Ok(LabelIngest { labels, stats })
}

/// Streams a label file from any reader; I/O errors are reported against `<reader>`.
pub fn load_labels_from_reader<R: Read>(reader: R, config: &IngestConfig) -> Result<LabelIngest> {
    load_chunks(
        RecordChunks::new(reader, config.chunk_size),
        Path::new("<reader>"),
        config,
    )
}

pub fn load_labels(path: impl AsRef<Path>, config: &IngestConfig) -> Result<LabelIngest> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    load_chunks(
        RecordChunks::new(BufReader::new(file), config.chunk_size),
        path,
        config,
    )
}
