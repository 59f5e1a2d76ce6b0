use crate::config::{IngestConfig, MalformedPolicy};
use crate::core::coords::CoordinateLists;
use crate::core::graph::{Graph, build_sparse_graph};
use crate::core::ids::{Edge, HorizonTracker, NodeId};
use crate::core::memory::estimate_coordinate_memory;
use crate::error::{Error, FormatError, FormatErrorKind, Result};
use crate::ingest::chunks::{Batch, LineChunks, open_lines};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub parsed: u64,
    pub skipped: u64,
    pub batches: u64,
}

/// Parses one `"<source> <target>"` record.
pub fn parse_edge(line: &str) -> std::result::Result<Edge, FormatErrorKind> {
    let mut tokens = line.split_whitespace();
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(src), Some(dst), None) => Ok(Edge::new(parse_node_id(src)?, parse_node_id(dst)?)),
        _ => Err(FormatErrorKind::WrongTokenCount {
            found: line.split_whitespace().count(),
        }),
    }
}

pub(crate) fn parse_node_id(token: &str) -> std::result::Result<NodeId, FormatErrorKind> {
    token
        .parse::<NodeId>()
        .map_err(|_| FormatErrorKind::InvalidNodeId {
            token: token.to_string(),
        })
}

/// Output of a finished edge pass.
#[derive(Debug)]
pub struct EdgeIngest {
    pub graph: Graph,
    pub horizon: HorizonTracker,
    pub stats: IngestStats,
}

/// Horizon and coordinates filled batch by batch.
///
/// `finish` consumes the accumulator, so no batch can follow finalization.
pub struct EdgeAccumulator {
    horizon: HorizonTracker,
    coords: CoordinateLists,
    stats: IngestStats,
    policy: MalformedPolicy,
}

impl EdgeAccumulator {
    pub fn new(policy: MalformedPolicy) -> Self {
        Self {
            horizon: HorizonTracker::new(),
            coords: CoordinateLists::new(),
            stats: IngestStats::default(),
            policy,
        }
    }

    pub fn consume_batch(&mut self, batch: &Batch) -> Result<()> {
        for (line_no, line) in batch.numbered() {
            match parse_edge(line) {
                Ok(edge) => {
                    self.horizon.observe(edge);
                    self.coords.push(edge);
                    self.stats.parsed += 1;
                }
                Err(kind) => {
                    let err = FormatError::new(line_no, kind);
                    match self.policy {
                        MalformedPolicy::Abort => return Err(err.into()),
                        MalformedPolicy::Skip => {
                            warn!(%err, "skipping edge record");
                            self.stats.skipped += 1;
                        }
                    }
                }
            }
        }
        self.stats.batches += 1;
        debug!(
            batch = batch.index,
            lines = batch.len(),
            horizon = self.horizon.value(),
            "edge batch consumed"
        );
        Ok(())
    }

    pub fn horizon(&self) -> &HorizonTracker {
        &self.horizon
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    pub fn finish(self) -> Result<EdgeIngest> {
        let memory = estimate_coordinate_memory(self.coords.len());
        let graph = build_sparse_graph(self.coords, &self.horizon)?;
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            nnz = graph.nnz(),
            skipped = self.stats.skipped,
            coordinate_mb = memory.bytes / (1024 * 1024),
            "edge list finalized"
        );
        Ok(EdgeIngest {
            graph,
            horizon: self.horizon,
            stats: self.stats,
        })
    }
}

fn ingest_chunks<R: BufRead>(
    chunks: LineChunks<R>,
    source: &Path,
    config: &IngestConfig,
) -> Result<EdgeIngest> {
    let mut acc = EdgeAccumulator::new(config.malformed);
    for batch in chunks {
        let batch = batch.map_err(|e| Error::io(source, e))?;
        acc.consume_batch(&batch)?;
    }
    acc.finish()
}

/// Streams an edge list from any reader; I/O errors are reported against `<reader>`.
pub fn ingest_edges_from_reader<R: Read>(reader: R, config: &IngestConfig) -> Result<EdgeIngest> {
    let chunks = LineChunks::new(BufReader::new(reader), config.chunk_size);
    ingest_chunks(chunks, Path::new("<reader>"), config)
}

pub fn ingest_edges(path: impl AsRef<Path>, config: &IngestConfig) -> Result<EdgeIngest> {
    let path = path.as_ref();
    let chunks = open_lines(path, config.chunk_size)?;
    ingest_chunks(chunks, path, config)
}
