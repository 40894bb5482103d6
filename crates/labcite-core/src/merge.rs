//! Identifier-based record merging.

use std::collections::HashMap;

use tracing::debug;

use crate::record::Record;

/// Merge records sharing an equal, non-blank identifier into one.
///
/// Later records' fields win field-by-field (provenance included — both of
/// its components are always present, so it moves wholesale), and the merged
/// record keeps the position of the first record that introduced the id.
/// Records without an identifier pass through untouched and are never merged
/// with one another.
///
/// Indexed by id rather than the quadratic pairwise scan; the override
/// direction and slot placement are identical.
pub fn merge_by_id(records: Vec<Record>) -> Vec<Record> {
    let mut merged: Vec<Record> = Vec::with_capacity(records.len());
    let mut slots: HashMap<String, usize> = HashMap::new();

    for record in records {
        let Some(id) = record.source.identifier().map(str::to_string) else {
            merged.push(record);
            continue;
        };
        match slots.get(&id) {
            Some(&slot) => {
                debug!(id = %id, "found duplicate");
                let earlier = &mut merged[slot];
                earlier.source.merge_from(&record.source);
                earlier.provenance = record.provenance;
            }
            None => {
                slots.insert(id, merged.len());
                merged.push(record);
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Origin, Provenance, Source};

    fn record(id: &str, title: &str, plugin: &str) -> Record {
        Record {
            source: Source {
                id: (!id.is_empty()).then(|| id.to_string()),
                title: Some(title.to_string()),
                ..Default::default()
            },
            provenance: Provenance {
                origin: if plugin == "sources" {
                    Origin::UserAuthored
                } else {
                    Origin::AdapterSourced {
                        adapter: plugin.to_string(),
                    }
                },
                file: format!("{plugin}.yaml"),
            },
        }
    }

    #[test]
    fn later_fields_win() {
        let merged = merge_by_id(vec![record("x", "A", "dblp"), record("x", "B", "sources")]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source.title.as_deref(), Some("B"));
    }

    #[test]
    fn provenance_follows_the_later_record() {
        let merged = merge_by_id(vec![record("x", "A", "dblp"), record("x", "B", "sources")]);
        assert_eq!(merged[0].provenance.origin, Origin::UserAuthored);
        assert_eq!(merged[0].provenance.file, "sources.yaml");
    }

    #[test]
    fn earlier_fields_survive_when_absent_later() {
        let mut first = record("x", "A", "dblp");
        first.source.publisher = Some("Venue".into());
        let mut second = record("x", "B", "sources");
        second.source.publisher = None;
        let merged = merge_by_id(vec![first, second]);
        assert_eq!(merged[0].source.publisher.as_deref(), Some("Venue"));
    }

    #[test]
    fn merged_record_keeps_first_occurrence_slot() {
        let merged = merge_by_id(vec![
            record("x", "A", "dblp"),
            record("y", "Other", "dblp"),
            record("x", "B", "sources"),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].source.identifier(), Some("x"));
        assert_eq!(merged[0].source.title.as_deref(), Some("B"));
        assert_eq!(merged[1].source.identifier(), Some("y"));
    }

    #[test]
    fn blank_id_records_never_merge() {
        let merged = merge_by_id(vec![record("", "Same", "sources"), record("", "Same", "sources")]);
        assert_eq!(merged.len(), 2);

        let whitespace = Record {
            source: Source {
                id: Some("  ".into()),
                ..Default::default()
            },
            ..record("", "W", "sources")
        };
        let merged = merge_by_id(vec![whitespace.clone(), whitespace]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn merge_is_idempotent() {
        let once = merge_by_id(vec![
            record("x", "A", "dblp"),
            record("", "No id", "sources"),
            record("x", "B", "sources"),
            record("y", "C", "dblp"),
        ]);
        let twice = merge_by_id(once.clone());
        assert_eq!(once, twice);
    }
}
