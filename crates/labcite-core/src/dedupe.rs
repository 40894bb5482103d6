//! Preprint/published duplicate removal by consecutive-word title overlap.
//!
//! Preprints frequently get indexed separately from their later peer-reviewed
//! version. When a published citation shares a long enough run of title words
//! with a preprint, the preprint is removed and the published record stays.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::record::Citation;

/// Minimum consecutive-word title overlap for a preprint to count as a
/// duplicate of a published citation.
pub const MIN_TITLE_OVERLAP: usize = 6;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").unwrap());

/// Whether a citation looks like an arXiv/preprint deposit rather than a
/// peer-reviewed venue record.
pub fn is_preprint(citation: &Citation) -> bool {
    let id = citation
        .source
        .id
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    let publisher = citation
        .source
        .publisher
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    let link = citation
        .source
        .link
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();

    id.contains("arxiv") || publisher == "arxiv" || publisher == "corr" || link.contains("arxiv.org")
}

/// Lower-case a title and split it into word tokens, discarding punctuation
/// and whitespace. Empty titles produce an empty sequence.
pub fn title_words(title: &str) -> Vec<String> {
    let lower = title.to_lowercase();
    WORD_RE
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Longest run of identical consecutive words appearing in both sequences.
///
/// Checks every starting pair, so this is the longest *consecutive* run, not
/// the longest common subsequence. Symmetric; 0 if either sequence is empty.
/// Quadratic in the title lengths, which is fine at hundreds of records.
pub fn longest_overlap(a: &[String], b: &[String]) -> usize {
    let mut max_overlap = 0;
    for i in 0..a.len() {
        for j in 0..b.len() {
            let mut run = 0;
            while i + run < a.len() && j + run < b.len() && a[i + run] == b[j + run] {
                run += 1;
            }
            max_overlap = max_overlap.max(run);
        }
    }
    max_overlap
}

/// Remove preprints whose title shares at least `min_overlap` consecutive
/// words with any published citation.
///
/// The first matching published citation wins; removal keys on the preprint's
/// own identifier, so citations without one are never removed by this stage.
pub fn remove_preprint_duplicates(citations: Vec<Citation>, min_overlap: usize) -> Vec<Citation> {
    let (preprints, published): (Vec<&Citation>, Vec<&Citation>) =
        citations.iter().partition(|c| is_preprint(c));

    info!(
        preprints = preprints.len(),
        published = published.len(),
        "classified citations"
    );

    let published_words: Vec<Vec<String>> = published
        .iter()
        .map(|c| title_words(c.source.title.as_deref().unwrap_or_default()))
        .collect();

    let mut remove_ids: HashSet<String> = HashSet::new();
    for preprint in &preprints {
        let Some(id) = preprint.identifier() else {
            continue;
        };
        let words = title_words(preprint.source.title.as_deref().unwrap_or_default());
        for (candidate, candidate_words) in published.iter().zip(&published_words) {
            let overlap = longest_overlap(&words, candidate_words);
            if overlap >= min_overlap {
                debug!(
                    preprint = preprint.label(),
                    published = candidate.label(),
                    overlap,
                    "removing preprint duplicate"
                );
                remove_ids.insert(id.to_string());
                break;
            }
        }
    }

    let before = citations.len();
    let kept: Vec<Citation> = citations
        .into_iter()
        .filter(|c| c.identifier().is_none_or(|id| !remove_ids.contains(id)))
        .collect();

    let removed = before - kept.len();
    if removed > 0 {
        info!(removed, "removed preprint duplicate(s)");
    }
    kept
}
