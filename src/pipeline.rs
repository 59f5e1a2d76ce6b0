//! Runs the edge and label pipelines side by side and joins their outputs.

use crate::config::IngestConfig;
use crate::core::graph::Graph;
use crate::core::ids::{HorizonTracker, NodeId};
use crate::error::Result;
use crate::ingest::edges::{IngestStats, ingest_edges};
use crate::ingest::labels::{Label, LabelLookup, load_labels};
use std::path::Path;
use tracing::info;

/// Finished graph and label lookup, handed to consumers read-only.
#[derive(Debug)]
pub struct Dataset {
    graph: Graph,
    horizon: HorizonTracker,
    labels: LabelLookup,
    edge_stats: IngestStats,
    label_stats: IngestStats,
}

impl Dataset {
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn horizon(&self) -> &HorizonTracker {
        &self.horizon
    }

    pub fn labels(&self) -> &LabelLookup {
        &self.labels
    }

    pub fn edge_stats(&self) -> IngestStats {
        self.edge_stats
    }

    pub fn label_stats(&self) -> IngestStats {
        self.label_stats
    }

    /// Label ids outside the graph stay available here even though no node carries them.
    pub fn label_of(&self, node: NodeId) -> Option<&Label> {
        self.labels.get(node)
    }

    pub fn labelled_nodes(&self) -> usize {
        self.labels.len() - self.labels.count_outside(self.graph.node_count())
    }
}

/// Loads both inputs concurrently. Neither output is returned unless both passes succeed.
pub fn load_dataset(
    edges_path: impl AsRef<Path>,
    labels_path: Option<&Path>,
    config: &IngestConfig,
) -> Result<Dataset> {
    let edges_path = edges_path.as_ref();
    let (edges, labels) = rayon::join(
        || ingest_edges(edges_path, config),
        || labels_path.map(|path| load_labels(path, config)).transpose(),
    );
    let edges = edges?;
    let (labels, label_stats) = match labels? {
        Some(ingest) => (ingest.labels, ingest.stats),
        None => (LabelLookup::new(), IngestStats::default()),
    };

    let outside = labels.count_outside(edges.graph.node_count());
    if outside > 0 {
        info!(outside, "labels reference ids beyond the graph");
    }

    Ok(Dataset {
        graph: edges.graph,
        horizon: edges.horizon,
        labels,
        edge_stats: edges.stats,
        label_stats,
    })
}
