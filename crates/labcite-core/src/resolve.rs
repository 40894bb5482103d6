//! Citation resolution stage.
//!
//! Each merged record is resolved into a full citation via the external
//! resolution service, with the record's own fields overlaid on top (original
//! always wins). Resolution failures are classified by provenance: the user
//! explicitly asked for user-authored records, so those are kept and the
//! failure is an error; adapter discoveries often carry identifiers that do
//! not resolve, so those are dropped with a warning.

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::dates::normalize_date;
use crate::record::{Citation, Origin, Record, Source};
use crate::report::RunReport;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("unsupported identifier scheme in \"{0}\"")]
    UnsupportedScheme(String),
    #[error("identifier \"{0}\" did not resolve")]
    NotFound(String),
    #[error("resolution service failure: {0}")]
    Service(String),
}

/// External citation-resolution service.
pub trait CitationResolver {
    /// Resolve a non-blank identifier into citation metadata.
    fn resolve(&self, id: &str) -> Result<Source, ResolveError>;
}

/// Resolve merged records into citations, preserving their order.
///
/// Records flagged `remove: true` are dropped silently. Records without an
/// identifier become citations directly from their own fields. Each record
/// yields at most one citation.
pub fn resolve_citations(
    records: Vec<Record>,
    resolver: &dyn CitationResolver,
    report: &mut RunReport,
) -> Vec<Citation> {
    let total = records.len();
    let mut citations = Vec::with_capacity(total);

    for (index, record) in records.into_iter().enumerate() {
        debug!(
            entry = index + 1,
            total,
            label = record.source.label(),
            "processing source"
        );

        if record.source.remove == Some(true) {
            continue;
        }

        let mut citation = match record.source.identifier() {
            None => Source::default(),
            Some(id) => match resolver.resolve(id) {
                Ok(resolved) => resolved,
                Err(err) => match &record.provenance.origin {
                    Origin::UserAuthored => {
                        error!(id, error = %err, "could not resolve user-authored source");
                        report.error(format!("could not generate citation for source {id}"));
                        Source::default()
                    }
                    Origin::AdapterSourced { adapter } => {
                        warn!(id, adapter, error = %err, "could not resolve adapter-sourced record");
                        report.warn(format!(
                            "could not generate citation for source {id} (from {} with {adapter})",
                            record.provenance.file
                        ));
                        continue;
                    }
                },
            },
        };

        // Original fields win over whatever resolution produced.
        citation.merge_from(&record.source);

        if let Some(date) = citation.date.as_deref() {
            citation.date = Some(normalize_date(date));
        }

        citations.push(Citation::new(citation, record.provenance));
    }

    citations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Provenance;

    /// Resolver stub: succeeds with fixed metadata for ids it knows, errors
    /// for everything else.
    struct StubResolver {
        known: Vec<(String, Source)>,
    }

    impl StubResolver {
        fn empty() -> Self {
            Self { known: Vec::new() }
        }

        fn with(id: &str, source: Source) -> Self {
            Self {
                known: vec![(id.to_string(), source)],
            }
        }
    }

    impl CitationResolver for StubResolver {
        fn resolve(&self, id: &str) -> Result<Source, ResolveError> {
            self.known
                .iter()
                .find(|(known, _)| known == id)
                .map(|(_, source)| source.clone())
                .ok_or_else(|| ResolveError::NotFound(id.to_string()))
        }
    }

    fn user_record(source: Source) -> Record {
        Record {
            source,
            provenance: Provenance {
                origin: Origin::UserAuthored,
                file: "sources.yaml".into(),
            },
        }
    }

    fn adapter_record(source: Source) -> Record {
        Record {
            source,
            provenance: Provenance {
                origin: Origin::AdapterSourced {
                    adapter: "dblp".into(),
                },
                file: "dblp.yaml".into(),
            },
        }
    }

    #[test]
    fn blank_id_record_becomes_citation_directly() {
        let mut report = RunReport::new();
        let record = user_record(Source {
            title: Some("Hand-authored entry".into()),
            ..Default::default()
        });
        let citations = resolve_citations(vec![record], &StubResolver::empty(), &mut report);

        assert_eq!(citations.len(), 1);
        assert_eq!(
            citations[0].source.title.as_deref(),
            Some("Hand-authored entry")
        );
        assert!(!report.has_errors());
        assert!(report.warnings().is_empty());
    }

    #[test]
    fn remove_flag_drops_silently() {
        let mut report = RunReport::new();
        let record = user_record(Source {
            id: Some("doi:10.1/x".into()),
            remove: Some(true),
            ..Default::default()
        });
        let citations = resolve_citations(vec![record], &StubResolver::empty(), &mut report);

        assert!(citations.is_empty());
        assert!(report.warnings().is_empty());
        assert!(!report.has_errors());
    }

    #[test]
    fn original_fields_win_over_resolved() {
        let mut report = RunReport::new();
        let resolver = StubResolver::with(
            "doi:10.1/x",
            Source {
                title: Some("Resolved title".into()),
                publisher: Some("Resolved venue".into()),
                ..Default::default()
            },
        );
        let record = user_record(Source {
            id: Some("doi:10.1/x".into()),
            title: Some("My title".into()),
            ..Default::default()
        });
        let citations = resolve_citations(vec![record], &resolver, &mut report);

        assert_eq!(citations[0].source.title.as_deref(), Some("My title"));
        // Resolved fields the record doesn't set survive the overlay.
        assert_eq!(
            citations[0].source.publisher.as_deref(),
            Some("Resolved venue")
        );
    }

    #[test]
    fn dates_are_normalized_after_overlay() {
        let mut report = RunReport::new();
        let resolver = StubResolver::with(
            "doi:10.1/x",
            Source {
                date: Some("2021".into()),
                ..Default::default()
            },
        );
        let record = user_record(Source {
            id: Some("doi:10.1/x".into()),
            ..Default::default()
        });
        let citations = resolve_citations(vec![record], &resolver, &mut report);
        assert_eq!(citations[0].source.date.as_deref(), Some("2021-01-01"));
    }

    #[test]
    fn user_authored_failure_is_error_but_record_survives() {
        let mut report = RunReport::new();
        let record = user_record(Source {
            id: Some("doi:10.1/missing".into()),
            title: Some("Still wanted".into()),
            ..Default::default()
        });
        let citations = resolve_citations(vec![record], &StubResolver::empty(), &mut report);

        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].source.title.as_deref(), Some("Still wanted"));
        assert!(report.has_errors());
        assert_eq!(report.errors().len(), 1);
        assert!(report.warnings().is_empty());
    }

    #[test]
    fn adapter_sourced_failure_is_warning_and_record_is_dropped() {
        let mut report = RunReport::new();
        let record = adapter_record(Source {
            id: Some("doi:10.1/missing".into()),
            title: Some("Machine discovered".into()),
            ..Default::default()
        });
        let citations = resolve_citations(vec![record], &StubResolver::empty(), &mut report);

        assert!(citations.is_empty());
        assert!(!report.has_errors());
        assert_eq!(report.warnings().len(), 1);
        assert!(report.warnings()[0].contains("dblp.yaml"));
    }

    #[test]
    fn failure_policy_does_not_stop_later_records() {
        let mut report = RunReport::new();
        let records = vec![
            adapter_record(Source {
                id: Some("doi:10.1/missing".into()),
                ..Default::default()
            }),
            user_record(Source {
                title: Some("After the failure".into()),
                ..Default::default()
            }),
        ];
        let citations = resolve_citations(records, &StubResolver::empty(), &mut report);

        assert_eq!(citations.len(), 1);
        assert_eq!(
            citations[0].source.title.as_deref(),
            Some("After the failure")
        );
    }
}
