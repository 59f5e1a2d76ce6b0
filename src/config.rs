use crate::error::{Error, Result};
use std::num::NonZeroUsize;

pub const DEFAULT_CHUNK_SIZE: NonZeroUsize = NonZeroUsize::new(10_000).unwrap();

/// What a pipeline does with a record it cannot parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedPolicy {
    /// Fail the whole pass on the first malformed record.
    #[default]
    Abort,
    /// Drop the record, count it in `IngestStats::skipped` and warn.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestConfig {
    pub chunk_size: NonZeroUsize,
    pub malformed: MalformedPolicy,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            malformed: MalformedPolicy::default(),
        }
    }
}

impl IngestConfig {
    pub fn new(chunk_size: usize) -> Result<Self> {
        let chunk_size = NonZeroUsize::new(chunk_size)
            .ok_or_else(|| Error::invalid_config("chunk_size must be a positive integer"))?;
        Ok(Self {
            chunk_size,
            ..Self::default()
        })
    }

    pub fn with_chunk_size(mut self, chunk_size: NonZeroUsize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_malformed(mut self, malformed: MalformedPolicy) -> Self {
        self.malformed = malformed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = IngestConfig::default();
        assert_eq!(10_000, cfg.chunk_size.get());
        assert_eq!(MalformedPolicy::Abort, cfg.malformed);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert!(matches!(
            IngestConfig::new(0),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_builder() {
        let cfg = IngestConfig::new(7)
            .unwrap()
            .with_malformed(MalformedPolicy::Skip);
        assert_eq!(7, cfg.chunk_size.get());
        assert_eq!(MalformedPolicy::Skip, cfg.malformed);
    }
}
