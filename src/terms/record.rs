// Term record and ranking order shared by every backend

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A tracked search term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermRecord {
    /// Unique key, trimmed, case-sensitive
    pub term: String,
    /// Number of accepted records of this term (always >= 1)
    pub score: u64,
    /// Epoch milliseconds of the most recent accepted record
    pub last_accessed: i64,
    /// Epoch milliseconds of the first accepted record
    pub created_at: i64,
}

impl TermRecord {
    /// Record created by the first accepted use of `term`
    pub fn first_seen(term: impl Into<String>, now: i64) -> Self {
        TermRecord {
            term: term.into(),
            score: 1,
            last_accessed: now,
            created_at: now,
        }
    }

    /// Apply one more accepted use at `now`
    pub fn touch(&mut self, now: i64) {
        self.score += 1;
        // Late writers never move the access time backwards
        self.last_accessed = self.last_accessed.max(now);
    }
}

/// Ranking order: score desc, then last access desc, then term asc.
///
/// The term key only breaks exact ties; it matches SQLite's BINARY collation
/// so both backends agree byte for byte.
pub fn rank_order(a: &TermRecord, b: &TermRecord) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.last_accessed.cmp(&a.last_accessed))
        .then_with(|| a.term.as_bytes().cmp(b.term.as_bytes()))
}

/// Sort records in place by [`rank_order`]
pub fn sort_ranked(records: &mut [TermRecord]) {
    records.sort_by(rank_order);
}

/// Trim a raw term; `None` when nothing is left
pub fn normalize_term(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
