//! Error types shared by the edge and label pipelines.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Source missing, unreadable, or failing mid-stream.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Format(#[from] FormatError),

    /// Accumulated coordinates disagree with the tracked horizon. Always a bug.
    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed record at line {line}: {kind}")]
pub struct FormatError {
    /// 1-based line (or row) number in the source.
    pub line: u64,
    pub kind: FormatErrorKind,
}

impl FormatError {
    pub fn new(line: u64, kind: FormatErrorKind) -> Self {
        Self { line, kind }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatErrorKind {
    #[error("expected 2 fields, found {found}")]
    WrongTokenCount { found: usize },

    #[error("`{token}` is not a valid node id")]
    InvalidNodeId { token: String },

    #[error("label field is empty")]
    MissingLabel,

    #[error("undecodable record: {message}")]
    Undecodable { message: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("row/column length mismatch: {rows} rows vs {cols} columns")]
    LengthMismatch { rows: usize, cols: usize },

    #[error("index {index} out of range for {node_count} nodes")]
    IndexOutOfRange { index: u32, node_count: usize },

    /// The index arrays for `node_count` nodes cannot be allocated.
    #[error("cannot allocate a graph of {node_count} nodes")]
    TooLarge { node_count: usize },
}
