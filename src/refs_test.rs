//! Tests for the reference pipeline: tokenization, grouping, normalization,
//! and the cross-group attach behavior.

use super::*;
use crate::models::{CitationRecord, IndexRow, RefType, TokenKind};

// ============================================================================
// Helpers
// ============================================================================

/// Build a minimal entry row carrying the given raw reference string.
fn sample_row(refs_raw: &str) -> IndexRow {
    IndexRow {
        cnt_idx: "CNT-IDX-0000001".to_string(),
        lemma_key: "bacue".to_string(),
        lemma: "bacue".to_string(),
        refs_raw: refs_raw.to_string(),
        source_column: "p001-c01".to_string(),
        line_no: 7,
    }
}

fn normalize(refs_raw: &str) -> Vec<CitationRecord> {
    RefParser::new().normalize_entry(&sample_row(refs_raw))
}

fn token_texts(raw: &str) -> Vec<String> {
    RefParser::new()
        .tokenize(raw)
        .into_iter()
        .map(|t| t.text)
        .collect()
}

fn token_kinds(raw: &str) -> Vec<TokenKind> {
    RefParser::new()
        .tokenize(raw)
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

// ============================================================================
// Classification Tests
// ============================================================================

#[test]
fn test_classify_numpair_before_num() {
    let p = RefParser::new();
    assert_eq!(p.classify("121,98"), TokenKind::NumPair);
    assert_eq!(p.classify("121"), TokenKind::Num);
    assert_eq!(p.classify("5"), TokenKind::Num);
}

#[test]
fn test_classify_separator_and_marks() {
    let p = RefParser::new();
    assert_eq!(p.classify(";"), TokenKind::Separator);
    assert_eq!(p.classify("^"), TokenKind::Mark);
    assert_eq!(p.classify("°"), TokenKind::Mark);
    assert_eq!(p.classify("*"), TokenKind::Mark);
    assert_eq!(p.classify("^^"), TokenKind::Mark);
}

#[test]
fn test_classify_sigla() {
    let p = RefParser::new();
    assert_eq!(p.classify("v."), TokenKind::Sigla);
    assert_eq!(p.classify("J"), TokenKind::Sigla);
    assert_eq!(p.classify("K."), TokenKind::Sigla);
}

#[test]
fn test_classify_other() {
    let p = RefParser::new();
    // Range tokens are not a lexical class of their own; the normalizer
    // recognizes them only as whole single-token groups.
    assert_eq!(p.classify("5-"), TokenKind::Other);
    assert_eq!(p.classify("ab"), TokenKind::Other);
    assert_eq!(p.classify("12a"), TokenKind::Other);
    assert_eq!(p.classify("v.."), TokenKind::Other);
}

// ============================================================================
// Tokenizer Tests
// ============================================================================

#[test]
fn test_tokenize_detaches_separators() {
    assert_eq!(token_texts("121;98"), vec!["121", ";", "98"]);
    assert_eq!(
        token_kinds("121;98"),
        vec![TokenKind::Num, TokenKind::Separator, TokenKind::Num]
    );
}

#[test]
fn test_tokenize_detaches_marks() {
    assert_eq!(token_texts("121^"), vec!["121", "^"]);
    assert_eq!(token_texts("5°"), vec!["5", "°"]);
    assert_eq!(token_texts("7*"), vec!["7", "*"]);
}

#[test]
fn test_tokenize_drops_punctuation_noise() {
    assert_eq!(token_texts("121 , 98 . : 5"), vec!["121", "98", "5"]);
}

#[test]
fn test_tokenize_strips_trailing_comma() {
    assert_eq!(token_texts("121, 98"), vec!["121", "98"]);
    assert_eq!(token_kinds("121, 98"), vec![TokenKind::Num, TokenKind::Num]);
    // The comma inside a pair is part of the token, not an artifact.
    assert_eq!(token_texts("121,98"), vec!["121,98"]);
}

#[test]
fn test_tokenize_collapses_whitespace() {
    assert_eq!(token_texts("  121   ;  v.  "), vec!["121", ";", "v."]);
}

#[test]
fn test_tokenize_empty_input() {
    assert!(token_texts("").is_empty());
    assert!(token_texts("   ").is_empty());
    assert!(token_texts(" , . : ").is_empty());
}

#[test]
fn test_tokenize_preserves_order() {
    assert_eq!(
        token_texts("v. 121,98 ^ ; 5-"),
        vec!["v.", "121,98", "^", ";", "5-"]
    );
}

// ============================================================================
// Grouper Tests
// ============================================================================

#[test]
fn test_group_basic_split() {
    let p = RefParser::new();
    let groups = group_tokens(&p.tokenize("121 ; 98"));
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].group_no, 1);
    assert_eq!(groups[1].group_no, 2);
    assert_eq!(groups[0].tokens[0].text, "121");
    assert_eq!(groups[1].tokens[0].text, "98");
}

#[test]
fn test_group_no_separator_is_one_group() {
    let p = RefParser::new();
    let groups = group_tokens(&p.tokenize("v. 5-"));
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].tokens.len(), 2);
}

#[test]
fn test_group_leading_trailing_separators() {
    let p = RefParser::new();
    let groups = group_tokens(&p.tokenize("; 121 ;"));
    assert_eq!(groups.len(), 1, "No empty groups from edge separators");
    assert_eq!(groups[0].group_no, 1);
}

#[test]
fn test_group_consecutive_separators() {
    let p = RefParser::new();
    let groups = group_tokens(&p.tokenize("121 ;; 98"));
    assert_eq!(groups.len(), 2, "Doubled separator yields no empty group");
    assert_eq!(groups[1].group_no, 2);
}

#[test]
fn test_group_separators_never_in_groups() {
    let p = RefParser::new();
    let groups = group_tokens(&p.tokenize("121 ; 98 ; v."));
    for g in &groups {
        assert!(
            g.tokens.iter().all(|t| t.kind != TokenKind::Separator),
            "Separator leaked into group {:?}",
            g
        );
    }
}

#[test]
fn test_group_empty_stream() {
    assert!(group_tokens(&[]).is_empty());
}

// ============================================================================
// Normalizer: Corpus Scenarios
// ============================================================================

#[test]
fn test_normalize_numpair() {
    let recs = normalize("121,98");
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].ref_type, RefType::Ref);
    assert_eq!(recs[0].ref_norm, "121,98");
    assert_eq!(recs[0].sigla_prefix, "");
    assert_eq!(recs[0].marks, "");
}

#[test]
fn test_normalize_sigla_then_range_falls_to_other() {
    // "v. 5-" is one group of two tokens: the sigla peels, but the residue
    // "5-" is not a bare NUM/NUMPAIR, so the whole group degrades to OTHER.
    let recs = normalize("v. 5-");
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].ref_type, RefType::Other);
    assert_eq!(recs[0].ref_norm, "v. 5-");
    assert_eq!(recs[0].sigla_prefix, "v.");
    assert_eq!(recs[0].marks, "");
}

#[test]
fn test_normalize_range_then_sigla_falls_to_other() {
    // Leading token is not a sigla, so nothing peels and the two-token
    // residue fails every REF rule.
    let recs = normalize("5- v.");
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].ref_type, RefType::Other);
    assert_eq!(recs[0].ref_norm, "5- v.");
    assert_eq!(recs[0].sigla_prefix, "");
}

#[test]
fn test_normalize_ref_then_attached_sigla() {
    let recs = normalize("121 ; v.");
    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0].ref_type, RefType::Ref);
    assert_eq!(recs[0].ref_norm, "121");
    assert_eq!(recs[1].ref_type, RefType::SiglaOnly);
    assert_eq!(recs[1].ref_norm, "v.");
    assert!(recs[1].attach_prev, "Sigla after REF should attach");
}

#[test]
fn test_normalize_trailing_mark_peeled() {
    let recs = normalize("121^");
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].ref_type, RefType::Ref);
    assert_eq!(recs[0].ref_norm, "121");
    assert_eq!(recs[0].marks, "^");
}

// ============================================================================
// Normalizer: Decision Tree
// ============================================================================

#[test]
fn test_normalize_lone_range_start() {
    let recs = normalize("5-");
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].ref_type, RefType::RangeStart);
    assert_eq!(recs[0].ref_norm, "5", "Trailing hyphen is stripped");
}

#[test]
fn test_normalize_range_start_sets_attach() {
    let recs = normalize("5- ; v.");
    assert_eq!(recs[1].ref_type, RefType::SiglaOnly);
    assert!(recs[1].attach_prev, "Sigla after RANGE_START should attach");
}

#[test]
fn test_normalize_two_nums_join() {
    let recs = normalize("121 98");
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].ref_type, RefType::Ref);
    assert_eq!(recs[0].ref_norm, "121,98", "Two bare numbers join in order");
}

#[test]
fn test_normalize_sigla_prefix_peeled() {
    let recs = normalize("J. 121");
    assert_eq!(recs[0].ref_type, RefType::Ref);
    assert_eq!(recs[0].ref_norm, "121");
    assert_eq!(recs[0].sigla_prefix, "J.");
}

#[test]
fn test_normalize_multiple_peels() {
    let recs = normalize("v. K. 121,98 ^ °");
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].ref_type, RefType::Ref);
    assert_eq!(recs[0].ref_norm, "121,98");
    assert_eq!(recs[0].sigla_prefix, "v. K.");
    assert_eq!(recs[0].marks, "^ °");
}

#[test]
fn test_normalize_pure_sigla_and_marks_group() {
    // Peeling consumes everything; the zero-token residue falls to OTHER
    // with the peeled fields still populated and ref_norm reconstructing
    // the group.
    let recs = normalize("v. K. ^");
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].ref_type, RefType::Other);
    assert_eq!(recs[0].ref_norm, "v. K. ^");
    assert_eq!(recs[0].sigla_prefix, "v. K.");
    assert_eq!(recs[0].marks, "^");
}

#[test]
fn test_normalize_other_keeps_peels() {
    let recs = normalize("J. 5- 7 ^");
    assert_eq!(recs[0].ref_type, RefType::Other);
    assert_eq!(recs[0].ref_norm, "J. 5- 7 ^");
    assert_eq!(recs[0].sigla_prefix, "J.");
    assert_eq!(recs[0].marks, "^");
}

#[test]
fn test_normalize_three_nums_is_other() {
    let recs = normalize("12 34 56");
    assert_eq!(recs[0].ref_type, RefType::Other);
    assert_eq!(recs[0].ref_norm, "12 34 56");
}

#[test]
fn test_normalize_trailing_sigla_not_peeled() {
    // Only leading sigla peel; a trailing one blocks the numeric match.
    let recs = normalize("77,14 K.");
    assert_eq!(recs[0].ref_type, RefType::Other);
    assert_eq!(recs[0].ref_norm, "77,14 K.");
    assert_eq!(recs[0].sigla_prefix, "");
}

// ============================================================================
// Attach State
// ============================================================================

#[test]
fn test_attach_resets_after_sigla() {
    let recs = normalize("121 ; v. ; v.");
    assert_eq!(recs.len(), 3);
    assert!(recs[1].attach_prev, "First sigla follows a REF");
    assert!(
        !recs[2].attach_prev,
        "Second sigla follows a SIGLA_ONLY, not a REF"
    );
}

#[test]
fn test_attach_false_at_entry_start() {
    let recs = normalize("v. ; 121");
    assert_eq!(recs[0].ref_type, RefType::SiglaOnly);
    assert!(!recs[0].attach_prev, "Nothing precedes the first group");
}

#[test]
fn test_attach_resets_after_other() {
    let recs = normalize("121 ; 5- v. ; J.");
    assert_eq!(recs[1].ref_type, RefType::Other);
    assert!(
        !recs[2].attach_prev,
        "Sigla after OTHER should not attach, got {:?}",
        recs[2]
    );
}

#[test]
fn test_attach_never_true_on_non_sigla() {
    for raw in ["121 ; 98", "121 ; 5-", "121 ; 5- v.", "5- ; 121,98"] {
        for rec in normalize(raw) {
            if rec.ref_type != RefType::SiglaOnly {
                assert!(!rec.attach_prev, "attach_prev set on {:?} from {:?}", rec, raw);
            }
        }
    }
}

#[test]
fn test_attach_does_not_leak_across_entries() {
    let parser = RefParser::new();
    let mut row_a = sample_row("121");
    row_a.cnt_idx = "CNT-IDX-0000001".to_string();
    let mut row_b = sample_row("v.");
    row_b.cnt_idx = "CNT-IDX-0000002".to_string();

    let recs = parser.normalize_rows(&[row_a, row_b]);
    assert_eq!(recs.len(), 2);
    assert_eq!(recs[1].ref_type, RefType::SiglaOnly);
    assert!(
        !recs[1].attach_prev,
        "Attach state leaked across entry boundary"
    );
}

// ============================================================================
// Numbering and Carry-Through
// ============================================================================

#[test]
fn test_ref_no_monotonic_across_groups() {
    let recs = normalize("121 ; 98 ; v.");
    let nos: Vec<u32> = recs.iter().map(|r| r.ref_no).collect();
    assert_eq!(nos, vec![1, 2, 3]);
}

#[test]
fn test_group_no_carried_through() {
    let recs = normalize("121 ; 98 ; v.");
    let groups: Vec<u32> = recs.iter().map(|r| r.group_no).collect();
    assert_eq!(groups, vec![1, 2, 3]);
}

#[test]
fn test_source_location_carried_through() {
    let recs = normalize("121,98");
    assert_eq!(recs[0].cnt_idx, "CNT-IDX-0000001");
    assert_eq!(recs[0].source_column, "p001-c01");
    assert_eq!(recs[0].line_no, 7);
}

#[test]
fn test_empty_refs_yield_no_records() {
    assert!(normalize("").is_empty());
    assert!(normalize(" ; ; ").is_empty());
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_totality_one_record_per_group() {
    let parser = RefParser::new();
    for raw in [
        "121,98",
        "v. 5-",
        "5- v.",
        "121 ; v.",
        "121^",
        "garbage !! ; 12 ; ° ; x7y",
        "1 ; 2 ; 3 ; 4 ; 5",
    ] {
        let groups = group_tokens(&parser.tokenize(raw));
        let recs = normalize(raw);
        assert_eq!(
            recs.len(),
            groups.len(),
            "Each non-empty group of {:?} must yield exactly one record",
            raw
        );
    }
}

#[test]
fn test_no_token_silently_disappears() {
    let parser = RefParser::new();
    for raw in ["v. 121,98 ^ ; 5- ; J. 7 °", "x y z ; 1 2", "° ; ^"] {
        let recs = normalize(raw);
        let all_fields: String = recs
            .iter()
            .map(|r| format!("{} {} {}", r.sigla_prefix, r.ref_norm, r.marks))
            .collect::<Vec<_>>()
            .join(" ");
        for tok in parser.tokenize(raw) {
            if tok.kind == TokenKind::Separator {
                continue;
            }
            assert!(
                all_fields.contains(&tok.text),
                "Token {:?} from {:?} missing from output {:?}",
                tok.text,
                raw,
                all_fields
            );
        }
    }
}

#[test]
fn test_normalization_is_pure() {
    let parser = RefParser::new();
    let row = sample_row("121 ; v. ; 5- ; junk !");
    let first = parser.normalize_entry(&row);
    let second = parser.normalize_entry(&row);
    assert_eq!(first, second, "Re-running normalization must be identical");
}

#[test]
fn test_normalize_rows_preserves_row_order() {
    let parser = RefParser::new();
    let rows: Vec<IndexRow> = (1..=20)
        .map(|i| {
            let mut r = sample_row("121 ; 98");
            r.cnt_idx = format!("CNT-IDX-{:07}", i);
            r
        })
        .collect();

    let recs = parser.normalize_rows(&rows);
    assert_eq!(recs.len(), 40);
    let ids: Vec<&str> = recs.iter().map(|r| r.cnt_idx.as_str()).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted, "Parallel batch must keep row order");
    for pair in recs.chunks(2) {
        assert_eq!(pair[0].ref_no, 1);
        assert_eq!(pair[1].ref_no, 2);
    }
}
