//! Lookup over the persisted tables: lemma search (exact and prefix), the
//! per-entry citation report, and reverse lookup from a normalized reference
//! back to the lemmas that cite it.

use crate::extract::lemma_key;
use crate::models::{CitationRecord, IndexRow, RefType};

use std::collections::HashMap;

#[cfg(test)]
#[path = "lookup_test.rs"]
mod lookup_test;

// ============================================================================
// Lemma Index
// ============================================================================

/// Lookup maps over the row table. Exact queries hit a HashMap; prefix
/// queries fall back to a linear scan in row order (tens of thousands of
/// rows, so a scan is fine).
pub struct LemmaIndex<'a> {
    rows: &'a [IndexRow],
    by_key: HashMap<&'a str, Vec<usize>>,
    by_id: HashMap<&'a str, usize>,
}

impl<'a> LemmaIndex<'a> {
    pub fn build(rows: &'a [IndexRow]) -> Self {
        let mut by_key: HashMap<&str, Vec<usize>> = HashMap::new();
        let mut by_id: HashMap<&str, usize> = HashMap::new();
        for (i, row) in rows.iter().enumerate() {
            by_key.entry(row.lemma_key.as_str()).or_default().push(i);
            by_id.entry(row.cnt_idx.as_str()).or_insert(i);
        }
        LemmaIndex { rows, by_key, by_id }
    }

    /// All rows whose canonical key equals the canonicalized query.
    pub fn lookup_exact(&self, query: &str) -> Vec<&'a IndexRow> {
        let key = lemma_key(query);
        match self.by_key.get(key.as_str()) {
            Some(indices) => indices.iter().map(|&i| &self.rows[i]).collect(),
            None => Vec::new(),
        }
    }

    /// All rows whose canonical key starts with the canonicalized query,
    /// in row order.
    pub fn lookup_prefix(&self, query: &str) -> Vec<&'a IndexRow> {
        let key = lemma_key(query);
        self.rows
            .iter()
            .filter(|r| r.lemma_key.starts_with(&key))
            .collect()
    }

    /// The row carrying the given entry id, if any.
    pub fn get(&self, cnt_idx: &str) -> Option<&'a IndexRow> {
        self.by_id.get(cnt_idx).map(|&i| &self.rows[i])
    }
}

// ============================================================================
// Entry Report
// ============================================================================

/// The citation records belonging to one entry, in `ref_no` order.
pub fn refs_for_entry<'a>(refs: &'a [CitationRecord], cnt_idx: &str) -> Vec<&'a CitationRecord> {
    let mut out: Vec<&CitationRecord> = refs.iter().filter(|r| r.cnt_idx == cnt_idx).collect();
    // Already in file order, but be safe:
    out.sort_by_key(|r| r.ref_no);
    out
}

/// Render a record back to display form: the core alone for SIGLA_ONLY, the
/// reopened `-` suffix for RANGE_START, with sigla prefix and marks restored
/// around the core otherwise.
pub fn format_ref(rec: &CitationRecord) -> String {
    if rec.ref_type == RefType::SiglaOnly {
        return rec.ref_norm.clone();
    }

    let mut s = if rec.ref_type == RefType::RangeStart {
        format!("{}-", rec.ref_norm)
    } else {
        rec.ref_norm.clone()
    };
    if !rec.sigla_prefix.is_empty() {
        s = format!("{} {}", rec.sigla_prefix, s);
    }
    if !rec.marks.is_empty() {
        s = format!("{} {}", s, rec.marks);
    }
    s
}

// ============================================================================
// Reverse Lookup
// ============================================================================

/// One reverse-lookup hit: the citing record plus its resolved row fields
/// (placeholders when the row table lacks the entry).
pub struct ReverseHit<'a> {
    pub lemma_key: String,
    pub lemma: String,
    pub record: &'a CitationRecord,
}

/// Find every record whose `ref_norm` equals `target`, resolved back to the
/// citing lemma and sorted by (lemma_key, cnt_idx, ref_no). By default only
/// REF and RANGE_START records are searched; `include_all` widens the search
/// to SIGLA_ONLY and OTHER.
pub fn reverse_lookup<'a>(
    index: &LemmaIndex<'_>,
    refs: &'a [CitationRecord],
    target: &str,
    include_all: bool,
) -> Vec<ReverseHit<'a>> {
    let mut hits: Vec<ReverseHit> = refs
        .iter()
        .filter(|r| {
            include_all || matches!(r.ref_type, RefType::Ref | RefType::RangeStart)
        })
        .filter(|r| r.ref_norm == target)
        .map(|r| match index.get(&r.cnt_idx) {
            Some(row) => ReverseHit {
                lemma_key: row.lemma_key.clone(),
                lemma: row.lemma.clone(),
                record: r,
            },
            None => ReverseHit {
                lemma_key: "<?>".to_string(),
                lemma: "<?>".to_string(),
                record: r,
            },
        })
        .collect();

    hits.sort_by(|a, b| {
        (&a.lemma_key, &a.record.cnt_idx, a.record.ref_no)
            .cmp(&(&b.lemma_key, &b.record.cnt_idx, b.record.ref_no))
    });
    hits
}
