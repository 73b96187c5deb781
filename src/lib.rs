//! cnt-index — structured citation records from an OCR'd back-of-book index.
//!
//! Turns the scanned index of the *Commentarii notarum tironianarum* (lemma
//! plus a ragged string of page references, e.g. `bacue 121,98 v. 5-`) into
//! typed, queryable records. The crate is organized into:
//!
//! - `models`: tokens, groups, citation records, rows, and export shapes
//! - `refs`: the core pipeline — tokenize, group at semicolons, normalize
//! - `extract`: column-file scanning, line stitching, lemma keys, CNT-IDX ids
//! - `store`: TSV persistence and the JSON web export
//! - `lookup`: lemma search, entry reports, reverse citation lookup

pub mod extract;
pub mod lookup;
pub mod models;
pub mod refs;
pub mod store;

// ============================================================================
// Default File Layout
// ============================================================================

/// Directory of cleaned per-column OCR text files.
pub const SRC_DIR: &str = "ocr_clean";
/// The identified row table.
pub const ROWS_TSV: &str = "index_rows_id.tsv";
/// Lines the extractor could not place.
pub const REJECTS_TSV: &str = "parse_rejects.tsv";
/// The normalized citation table.
pub const REFS_TSV: &str = "index_refs_norm.tsv";
/// Output directory for the static browsing front end.
pub const WEB_DIR: &str = "docs";

// Re-export commonly used types
pub use models::{
    CitationRecord, Group, IndexRow, ParseOutcome, RawRow, RefType, RejectedLine, Token,
    TokenKind, WebIndexRow, WebRefRow,
};

pub use refs::{group_tokens, RefParser};

pub use extract::{lemma_key, to_index_rows, ColumnParser, EMPTY_KEY};

pub use store::{export_web, read_refs, read_rows, write_refs, write_rejects, write_rows};

pub use lookup::{format_ref, refs_for_entry, reverse_lookup, LemmaIndex, ReverseHit};
