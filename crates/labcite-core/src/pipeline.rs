//! End-to-end batch pipeline: load → merge → resolve → dedupe.

use std::path::Path;

use tracing::info;

use crate::adapter::SourceAdapter;
use crate::dedupe::remove_preprint_duplicates;
use crate::loader::load_records;
use crate::merge::merge_by_id;
use crate::record::Citation;
use crate::report::RunReport;
use crate::resolve::{CitationResolver, resolve_citations};

/// Counters for the run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Source records compiled across all adapters, before merging.
    pub sources: usize,
    /// Records surviving the identifier merge.
    pub merged: usize,
    /// Citations produced by the resolution stage.
    pub citations: usize,
    /// Preprints removed for having a published twin.
    pub preprints_removed: usize,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub citations: Vec<Citation>,
    pub stats: RunStats,
    pub report: RunReport,
}

/// Run the full pipeline over a data directory.
///
/// Never aborts early: every per-file and per-record failure lands in the
/// returned report and processing continues, so the whole batch is always
/// attempted.
pub fn run(
    data_dir: &Path,
    adapters: &[Box<dyn SourceAdapter>],
    resolver: &dyn CitationResolver,
    min_overlap: usize,
) -> RunOutcome {
    let mut report = RunReport::new();

    info!("compiling sources");
    let records = load_records(data_dir, adapters, &mut report);
    let sources = records.len();
    info!(sources, "total source(s) to cite");

    info!("merging sources by id");
    let merged = merge_by_id(records);
    let merged_count = merged.len();

    info!("generating citations");
    let citations = resolve_citations(merged, resolver, &mut report);
    let citation_count = citations.len();

    info!("removing preprint duplicates");
    let citations = remove_preprint_duplicates(citations, min_overlap);
    info!(count = citations.len(), "citation(s) after deduplication");

    RunOutcome {
        stats: RunStats {
            sources,
            merged: merged_count,
            citations: citation_count,
            preprints_removed: citation_count - citations.len(),
        },
        citations,
        report,
    }
}
