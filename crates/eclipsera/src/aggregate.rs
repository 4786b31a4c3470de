//! Candidate deduplication and ranking.

use crate::types::{Candidate, SelectorHit};
use std::collections::HashSet;

/// Key two candidates are considered equal under.
fn normalized(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Drop candidates whose text repeats an earlier one.
///
/// Texts are compared trimmed and lowercased. Candidates with blank text are
/// removed; otherwise the first occurrence wins and order is preserved.
pub fn deduplicate(candidates: &[Candidate]) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    candidates
        .iter()
        .filter(|candidate| {
            let key = normalized(&candidate.text);
            !key.is_empty() && seen.insert(key)
        })
        .cloned()
        .collect()
}

/// The candidate with the most characters; the earliest one on ties.
pub fn select_best(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates.iter().fold(None, |best: Option<&Candidate>, candidate| match best {
        Some(current) if current.text.chars().count() >= candidate.text.chars().count() => Some(current),
        _ => Some(candidate),
    })
}

/// Which selectors produced text, and how much.
pub fn selectors_hit(candidates: &[Candidate]) -> Vec<SelectorHit> {
    candidates
        .iter()
        .map(|candidate| SelectorHit {
            tool: candidate.source.clone(),
            selector: candidate.selector.clone(),
            bytes_len: candidate.bytes_len,
        })
        .collect()
}
