//! The reference pipeline: tokenize a raw reference string, group tokens at
//! semicolons, and normalize each group into one typed citation record.
//!
//! The three stages run per entry and are pure: the only carried state is the
//! attach flag, threaded explicitly through the per-entry fold so a lone
//! sigla group can be tied back to the numeric reference it qualifies.

use crate::models::{CitationRecord, Group, IndexRow, RefType, Token, TokenKind};

use regex::Regex;

#[cfg(test)]
#[path = "refs_test.rs"]
mod refs_test;

// ============================================================================
// Parser
// ============================================================================

/// Compiled token patterns for the reference pipeline.
///
/// Built once and shared across entries (`Regex` is `Sync`), so the batch
/// driver can hand one parser to every worker.
pub struct RefParser {
    re_numpair: Regex,
    re_num: Regex,
    re_sigla: Regex,
    re_mark: Regex,
    re_range: Regex,
}

impl RefParser {
    pub fn new() -> Self {
        RefParser {
            re_numpair: Regex::new(r"^\d+,\d+$").unwrap(),
            re_num: Regex::new(r"^\d+$").unwrap(),
            re_sigla: Regex::new(r"^[A-Za-z]\.?$").unwrap(),
            re_mark: Regex::new(r"^[\^°*]+$").unwrap(),
            re_range: Regex::new(r"^(\d+)-$").unwrap(),
        }
    }

    /// Classify one token. The match order is fixed and significant:
    /// NUMPAIR before NUM before SEPARATOR before MARK before SIGLA, with
    /// OTHER as the catch-all. Reordering these arms changes the grammar.
    pub fn classify(&self, tok: &str) -> TokenKind {
        if self.re_numpair.is_match(tok) {
            TokenKind::NumPair
        } else if self.re_num.is_match(tok) {
            TokenKind::Num
        } else if tok == ";" {
            TokenKind::Separator
        } else if self.re_mark.is_match(tok) {
            TokenKind::Mark
        } else if self.re_sigla.is_match(tok) {
            TokenKind::Sigla
        } else {
            TokenKind::Other
        }
    }

    /// Split a raw reference string into classified tokens.
    ///
    /// Separator and mark glyphs are detached into standalone tokens first,
    /// pure punctuation noise is dropped, and a single trailing comma (an OCR
    /// artifact) is stripped from each piece before classification. Separator
    /// tokens are kept in the stream for the grouper. Never fails: anything
    /// unrecognized comes back as an OTHER token.
    pub fn tokenize(&self, raw: &str) -> Vec<Token> {
        let spaced = raw
            .replace(';', " ; ")
            .replace('^', " ^ ")
            .replace('°', " ° ")
            .replace('*', " * ");

        let mut tokens = Vec::new();
        for piece in spaced.split_whitespace() {
            if matches!(piece, "," | "." | ":") {
                continue;
            }
            let text = piece.strip_suffix(',').unwrap_or(piece);
            if text.is_empty() {
                continue;
            }
            tokens.push(Token {
                text: text.to_string(),
                kind: self.classify(text),
            });
        }
        tokens
    }
}

impl Default for RefParser {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Grouping
// ============================================================================

/// Partition one entry's token stream into groups at separator tokens.
///
/// Group indexes count only flushed (non-empty) groups, so leading, trailing,
/// and doubled separators never produce empty groups or index gaps.
pub fn group_tokens(tokens: &[Token]) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    let mut buf: Vec<Token> = Vec::new();

    let flush = |groups: &mut Vec<Group>, buf: &mut Vec<Token>| {
        if !buf.is_empty() {
            groups.push(Group {
                group_no: groups.len() as u32 + 1,
                tokens: std::mem::take(buf),
            });
        }
    };

    for tok in tokens {
        if tok.kind == TokenKind::Separator {
            flush(&mut groups, &mut buf);
        } else {
            buf.push(tok.clone());
        }
    }
    flush(&mut groups, &mut buf);

    groups
}

// ============================================================================
// Normalization
// ============================================================================

impl RefParser {
    /// Run the full pipeline for one entry: tokenize, group, normalize.
    pub fn normalize_entry(&self, row: &IndexRow) -> Vec<CitationRecord> {
        let tokens = self.tokenize(&row.refs_raw);
        let groups = group_tokens(&tokens);
        self.normalize_groups(row, &groups)
    }

    /// Normalize one entry's groups into citation records.
    ///
    /// `attachable` is the attach accumulator: it is true exactly while the
    /// previous record in this entry was REF or RANGE_START, and it never
    /// survives past the entry boundary.
    pub fn normalize_groups(&self, row: &IndexRow, groups: &[Group]) -> Vec<CitationRecord> {
        let mut records: Vec<CitationRecord> = Vec::with_capacity(groups.len());
        let mut attachable = false;

        for group in groups {
            let rec = self.normalize_group(row, group, attachable, records.len() as u32 + 1);
            attachable = matches!(rec.ref_type, RefType::Ref | RefType::RangeStart);
            records.push(rec);
        }
        records
    }

    /// Normalize a single non-empty group into exactly one record.
    ///
    /// Decision order: lone sigla, lone open range, then the peel-and-match
    /// path with OTHER as the total fallback. A group can never fail to
    /// produce a record.
    fn normalize_group(
        &self,
        row: &IndexRow,
        group: &Group,
        attachable: bool,
        ref_no: u32,
    ) -> CitationRecord {
        let toks = &group.tokens;

        let make = |ref_norm: String,
                    ref_type: RefType,
                    sigla_prefix: String,
                    marks: String,
                    attach_prev: bool| CitationRecord {
            cnt_idx: row.cnt_idx.clone(),
            ref_no,
            ref_norm,
            ref_type,
            sigla_prefix,
            marks,
            attach_prev,
            source_column: row.source_column.clone(),
            line_no: row.line_no,
            group_no: group.group_no,
        };

        // A lone sigla qualifies the previous reference when one exists
        // (e.g. "121 ; v." reads "121, in witness v").
        if let [tok] = toks.as_slice() {
            if tok.kind == TokenKind::Sigla {
                return make(
                    tok.text.clone(),
                    RefType::SiglaOnly,
                    String::new(),
                    String::new(),
                    attachable,
                );
            }
            // An open-ended range like "5-"; the whole group must be that
            // one token, otherwise it falls through to the OTHER path.
            if let Some(caps) = self.re_range.captures(&tok.text) {
                return make(
                    caps[1].to_string(),
                    RefType::RangeStart,
                    String::new(),
                    String::new(),
                    false,
                );
            }
        }

        // Peel trailing marks, then leading sigla. The peels walk index
        // bounds over the group slice; the token sequence itself stays
        // intact for the fallback below.
        let mut start = 0usize;
        let mut end = toks.len();
        while end > start && toks[end - 1].kind == TokenKind::Mark {
            end -= 1;
        }
        while start < end && toks[start].kind == TokenKind::Sigla {
            start += 1;
        }

        let sigla_prefix = join_tokens(&toks[..start]);
        let marks = join_tokens(&toks[end..]);
        let core = &toks[start..end];

        let (ref_norm, ref_type) = match core {
            [t] if t.kind == TokenKind::NumPair => (t.text.clone(), RefType::Ref),
            [a, b] if a.kind == TokenKind::Num && b.kind == TokenKind::Num => {
                (format!("{},{}", a.text, b.text), RefType::Ref)
            }
            [t] if t.kind == TokenKind::Num => (t.text.clone(), RefType::Ref),
            _ => {
                // Unrecognized residue: keep sigla, residue, and marks in
                // reading order so the group text stays reconstructible.
                (join_tokens(toks), RefType::Other)
            }
        };

        make(ref_norm, ref_type, sigla_prefix, marks, false)
    }

    /// Normalize every row, in parallel. Entries are independent, so the only
    /// ordering requirement is that the collected output preserves row order
    /// and per-entry `ref_no` order — the sequential merge below does both.
    pub fn normalize_rows(&self, rows: &[IndexRow]) -> Vec<CitationRecord> {
        use rayon::prelude::*;

        let per_entry: Vec<Vec<CitationRecord>> = rows
            .par_iter()
            .map(|row| self.normalize_entry(row))
            .collect();

        per_entry.into_iter().flatten().collect()
    }
}

fn join_tokens(toks: &[Token]) -> String {
    toks.iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
