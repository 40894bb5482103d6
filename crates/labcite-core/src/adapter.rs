//! Adapter contract: one configuration entry expands into zero or more
//! source records.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::record::{Origin, Source};

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("entry is missing required key \"{0}\"")]
    MissingKey(&'static str),
    #[error("entry is not a valid source mapping: {0}")]
    InvalidEntry(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

/// A metadata source adapter.
///
/// Implementors own their transport (HTTP, caching, parsing); the pipeline
/// only sees the expanded source records. One entry may fan out to many
/// records — a single author id can yield every publication on record.
pub trait SourceAdapter {
    /// Adapter identifier; also the data-file name prefix this adapter owns.
    fn name(&self) -> &str;

    /// Origin tag applied to every record this adapter emits.
    fn origin(&self) -> Origin {
        Origin::AdapterSourced {
            adapter: self.name().to_string(),
        }
    }

    /// Expand one data-file entry into source records.
    ///
    /// Recoverable conditions must not error. An `Err` signals a hard
    /// per-entry failure: the loader records a run error and the entry
    /// contributes zero records, never a partial one.
    fn expand(&self, entry: &Map<String, Value>) -> Result<Vec<Source>, AdapterError>;
}

/// Pass-through adapter for the hand-authored source list: each entry is
/// already a complete source record.
#[derive(Debug, Default)]
pub struct SourcesAdapter;

impl SourceAdapter for SourcesAdapter {
    fn name(&self) -> &str {
        "sources"
    }

    fn origin(&self) -> Origin {
        Origin::UserAuthored
    }

    fn expand(&self, entry: &Map<String, Value>) -> Result<Vec<Source>, AdapterError> {
        Ok(vec![Source::from_entry(entry)?])
    }
}
