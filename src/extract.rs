//! Extraction of lemma/reference rows from OCR'd column files.
//!
//! This module handles everything upstream of the reference pipeline:
//! - per-column line scanning with header/banner filtering
//! - stitching of entries broken across lines (and across column files)
//! - lemma key canonicalization for lookup
//! - sequential CNT-IDX id assignment

use crate::models::{IndexRow, ParseOutcome, RawRow, RejectedLine};

use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[cfg(test)]
#[path = "extract_test.rs"]
mod extract_test;

/// Sentinel key for lemmas that normalize to nothing; such rows are still
/// emitted so the damage stays auditable.
pub const EMPTY_KEY: &str = "__EMPTY__";

/// Banner lines (running titles, alphabet headings) that are never entries.
const BANNER_PREFIXES: &[&str] = &["INDEX", "ALPHABET", "ALPHABETIC", "TIRON", "TIRONIAN"];

// ============================================================================
// Column Parsing
// ============================================================================

/// Compiled line patterns for column-file scanning.
pub struct ColumnParser {
    /// Lemma (Latin letters incl. Æ/Œ, apostrophes, hyphens, periods,
    /// parentheses, spaces) followed by references starting with a digit.
    re_entry: Regex,
    /// Section header lines: a capital letter or Roman numeral plus period.
    re_header: Regex,
    /// A continuation line holding only references.
    re_refs_cont: Regex,
    /// A short bare-word fragment of a lemma broken across lines.
    re_lemma_tail: Regex,
}

impl ColumnParser {
    pub fn new() -> Self {
        ColumnParser {
            re_entry: Regex::new(r"^([A-Za-zÆŒæœ][A-Za-zÆŒæœ'’().\- ]*?)\s+(\d.*)$").unwrap(),
            re_header: Regex::new(r"^(?:[A-Z]\.|[IVXLCDM]+\.)$").unwrap(),
            re_refs_cont: Regex::new(r"^\d").unwrap(),
            re_lemma_tail: Regex::new(r"^[A-Za-zÆŒæœ]{2,12}$").unwrap(),
        }
    }

    /// Scan one column's text, appending rows and rejects to `out`.
    ///
    /// Stitching targets the last accepted row in `out`, wherever it came
    /// from — an entry broken at the bottom of one column continues at the
    /// top of the next, so callers feed columns in page order.
    pub fn parse_column(&self, source: &str, text: &str, out: &mut ParseOutcome) {
        for (i, raw) in text.lines().enumerate() {
            let line_no = i as u32 + 1;
            let s = raw.trim();
            if s.is_empty() {
                continue;
            }
            if self.re_header.is_match(s) {
                continue;
            }
            if is_banner(s) {
                continue;
            }

            // Clean mid-line column separators that survived OCR cleanup.
            let s = norm_space(&s.replace('|', " "));

            if let Some(caps) = self.re_entry.captures(&s) {
                out.rows.push(RawRow {
                    lemma: norm_space(&caps[1]),
                    refs_raw: norm_space(&caps[2]),
                    source_column: source.to_string(),
                    line_no,
                });
                continue;
            }

            // Stitch onto the previous entry where the line shape allows it.
            if let Some(last) = out.rows.last_mut() {
                if self.re_refs_cont.is_match(&s) {
                    last.refs_raw = norm_space(&format!("{} {}", last.refs_raw, s));
                    continue;
                }
                if self.re_lemma_tail.is_match(&s) {
                    last.lemma = norm_space(&format!("{}{}", last.lemma, s));
                    continue;
                }
            }

            out.rejects.push(RejectedLine {
                source_column: source.to_string(),
                line_no,
                reason: "NO_MATCH".to_string(),
                line: s,
            });
        }
    }

    /// Scan every `*.txt` column file directly under `dir`, in filename
    /// order. The file stem (e.g. `p001-c01`) becomes the source column id.
    pub fn scan_columns(&self, dir: &Path) -> Result<ParseOutcome, String> {
        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .filter(|p| p.extension().map_or(false, |ext| ext == "txt"))
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(format!("No column files found in {}/", dir.display()));
        }

        let mut out = ParseOutcome::default();
        for path in &files {
            let source = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let bytes = std::fs::read(path)
                .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
            // OCR output occasionally carries invalid byte sequences; replace
            // rather than abort the whole scan.
            let text = String::from_utf8_lossy(&bytes);
            self.parse_column(&source, &text, &mut out);
        }
        Ok(out)
    }
}

impl Default for ColumnParser {
    fn default() -> Self {
        Self::new()
    }
}

fn is_banner(line: &str) -> bool {
    let upper = line.to_uppercase();
    BANNER_PREFIXES.iter().any(|p| upper.starts_with(p))
}

fn norm_space(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// Lemma Keys
// ============================================================================

/// Canonicalize a lemma (or a user query) into its lookup key: lowercase,
/// ligatures folded, apostrophes deleted, every other non-alphanumeric run
/// collapsed to a single space.
pub fn lemma_key(lemma: &str) -> String {
    let s = lemma
        .trim()
        .to_lowercase()
        .replace('æ', "ae")
        .replace('œ', "oe")
        .replace('’', "")
        .replace('\'', "");
    let mapped: String = s
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();
    norm_space(&mapped)
}

// ============================================================================
// ID Assignment
// ============================================================================

/// Key and number extracted rows in extraction order: `CNT-IDX-%07d` ids
/// starting at 1, with the `__EMPTY__` sentinel for unusable lemmas.
pub fn to_index_rows(rows: Vec<RawRow>) -> Vec<IndexRow> {
    rows.into_iter()
        .enumerate()
        .map(|(i, r)| {
            let mut key = lemma_key(&r.lemma);
            if key.is_empty() {
                key = EMPTY_KEY.to_string();
            }
            IndexRow {
                cnt_idx: format!("CNT-IDX-{:07}", i + 1),
                lemma_key: key,
                lemma: r.lemma,
                refs_raw: r.refs_raw,
                source_column: r.source_column,
                line_no: r.line_no,
            }
        })
        .collect()
}
