//! Data models for the index pipeline.
//!
//! This module contains the data structures shared across the pipeline stages:
//! lexical tokens and groups, normalized citation records, extracted index
//! rows, reject reporting, and the JSON shapes used by the web export.

use serde::Serialize;

// ============================================================================
// Tokens and Groups
// ============================================================================

/// Lexical class of one reference token.
///
/// Classification happens in a fixed priority order (see
/// `RefParser::classify`); the variants here are mutually exclusive by
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Two page/line numbers joined by a comma, e.g. `121,98`.
    NumPair,
    /// A bare number, e.g. `121`.
    Num,
    /// The group separator `;`.
    Separator,
    /// One or more annotation glyphs: `^`, `°`, `*`.
    Mark,
    /// A single-letter manuscript sigla, optionally period-terminated: `v.`, `J`.
    Sigla,
    /// Anything else, including range tokens like `5-`.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
}

/// An ordered run of non-separator tokens between two separators (or stream
/// boundaries) within one entry. Empty groups are never constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// 1-based index of this group within its entry.
    pub group_no: u32,
    pub tokens: Vec<Token>,
}

// ============================================================================
// Citation Records
// ============================================================================

/// The closed set of normalized record types. Downstream consumers rely on
/// this enumeration being closed; adding a variant is a contract change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefType {
    Ref,
    RangeStart,
    SiglaOnly,
    Other,
}

impl RefType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefType::Ref => "REF",
            RefType::RangeStart => "RANGE_START",
            RefType::SiglaOnly => "SIGLA_ONLY",
            RefType::Other => "OTHER",
        }
    }

    /// Parse a persisted tag. Returns None for anything outside the closed
    /// set — callers treat that as a contract violation, not a soft default.
    pub fn from_tag(tag: &str) -> Option<RefType> {
        match tag {
            "REF" => Some(RefType::Ref),
            "RANGE_START" => Some(RefType::RangeStart),
            "SIGLA_ONLY" => Some(RefType::SiglaOnly),
            "OTHER" => Some(RefType::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for RefType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One normalized citation, the output unit of the core pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationRecord {
    /// Owning entry id, e.g. `CNT-IDX-0000123`.
    pub cnt_idx: String,
    /// 1-based sequence number within the entry, monotonic across groups.
    pub ref_no: u32,
    /// Canonical string form of the reference core.
    pub ref_norm: String,
    pub ref_type: RefType,
    /// Leading sigla tokens peeled off the group, space-joined ("" if none).
    pub sigla_prefix: String,
    /// Trailing mark tokens peeled off the group, space-joined ("" if none).
    pub marks: String,
    /// True only for SIGLA_ONLY records directly following a REF or
    /// RANGE_START record within the same entry.
    pub attach_prev: bool,
    pub source_column: String,
    pub line_no: u32,
    pub group_no: u32,
}

// ============================================================================
// Extracted Rows
// ============================================================================

/// One entry as extracted from a column file, before keying and numbering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub lemma: String,
    pub refs_raw: String,
    pub source_column: String,
    pub line_no: u32,
}

/// One fully identified entry: the row shape persisted in the row table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRow {
    pub cnt_idx: String,
    pub lemma_key: String,
    pub lemma: String,
    pub refs_raw: String,
    pub source_column: String,
    pub line_no: u32,
}

/// A line the extractor could not parse or stitch; kept for auditing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    pub source_column: String,
    pub line_no: u32,
    pub reason: String,
    pub line: String,
}

/// Accumulated extraction output across all column files.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub rows: Vec<RawRow>,
    pub rejects: Vec<RejectedLine>,
}

// ============================================================================
// Web Export Shapes
// ============================================================================

/// Row object written to `data_index.json`.
#[derive(Debug, Clone, Serialize)]
pub struct WebIndexRow {
    pub cnt_idx: String,
    pub lemma_key: String,
    pub lemma: String,
    pub refs_raw: String,
    pub src: String,
    pub line: u32,
}

impl From<&IndexRow> for WebIndexRow {
    fn from(row: &IndexRow) -> Self {
        WebIndexRow {
            cnt_idx: row.cnt_idx.clone(),
            lemma_key: row.lemma_key.clone(),
            lemma: row.lemma.clone(),
            refs_raw: row.refs_raw.clone(),
            src: row.source_column.clone(),
            line: row.line_no,
        }
    }
}

/// Citation object written to `data_refs.json`. `attach_prev` stays 0/1 for
/// the front end, matching the TSV encoding.
#[derive(Debug, Clone, Serialize)]
pub struct WebRefRow {
    pub cnt_idx: String,
    pub ref_no: u32,
    pub ref_norm: String,
    pub ref_type: RefType,
    pub sigla: String,
    pub marks: String,
    pub attach_prev: u8,
    pub src: String,
    pub line: u32,
    pub group_no: u32,
}

impl From<&CitationRecord> for WebRefRow {
    fn from(rec: &CitationRecord) -> Self {
        WebRefRow {
            cnt_idx: rec.cnt_idx.clone(),
            ref_no: rec.ref_no,
            ref_norm: rec.ref_norm.clone(),
            ref_type: rec.ref_type,
            sigla: rec.sigla_prefix.clone(),
            marks: rec.marks.clone(),
            attach_prev: rec.attach_prev as u8,
            src: rec.source_column.clone(),
            line: rec.line_no,
            group_no: rec.group_no,
        }
    }
}
