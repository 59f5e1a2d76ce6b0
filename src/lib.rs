//! Streaming construction of a sparse adjacency matrix from an edge-list
//! file, plus a node label lookup from a companion CSV file.

pub mod config;
pub mod core;
pub mod error;
pub mod ingest;
pub mod pipeline;

pub use config::{IngestConfig, MalformedPolicy};
pub use error::{Error, Result};
pub use pipeline::{Dataset, load_dataset};
