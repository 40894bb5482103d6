//! Aggregation, merge, and deduplication pipeline for bibliographic records.
//!
//! Raw source records come in from data files via adapters, get merged by
//! identifier, resolved into full citations, and stripped of preprint
//! duplicates. Every stage feeds failures into a [`RunReport`] instead of
//! aborting, so a single bad record never hides problems with the rest of
//! the batch.

pub mod adapter;
pub mod config_file;
pub mod dates;
pub mod dedupe;
pub mod loader;
pub mod merge;
pub mod output;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod resolve;

// Re-export for convenience
pub use adapter::{AdapterError, SourceAdapter, SourcesAdapter};
pub use dedupe::MIN_TITLE_OVERLAP;
pub use pipeline::{RunOutcome, RunStats};
pub use record::{Citation, Origin, Provenance, Record, Source};
pub use report::RunReport;
pub use resolve::{CitationResolver, ResolveError};
