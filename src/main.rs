//! Command-line driver for the index pipeline and its lookup utilities.
//!
//! Subcommands mirror the pipeline stages plus the query tools:
//!
//! - `parse [ocr_dir]`: extract rows + rejects from column files
//! - `normalize`: run the reference pipeline over the row table
//! - `run [ocr_dir]`: parse then normalize
//! - `lookup <lemma…> [--prefix]`: search entries by lemma
//! - `refs <CNT-IDX-…>`: show one entry with its normalized citations
//! - `reverse <ref> [--all]`: find entries citing a normalized reference
//! - `web [out_dir]`: export JSON for the browsing front end
//!
//! Exit codes: 0 success, 1 no hits or runtime failure, 2 usage errors and
//! missing prerequisite files.

use std::env;
use std::path::Path;
use std::process;

use cnt_index::extract::{self, ColumnParser};
use cnt_index::lookup::{format_ref, refs_for_entry, reverse_lookup, LemmaIndex};
use cnt_index::refs::RefParser;
use cnt_index::store;
use cnt_index::{REFS_TSV, REJECTS_TSV, ROWS_TSV, SRC_DIR, WEB_DIR};

// ============================================================================
// Main
// ============================================================================

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let (cmd, rest) = match args.split_first() {
        Some((c, r)) => (c.as_str(), r),
        None => {
            print_usage();
            process::exit(2);
        }
    };

    let result = match cmd {
        "parse" => cmd_parse(rest),
        "normalize" => cmd_normalize(),
        "run" => cmd_run(rest),
        "lookup" => cmd_lookup(rest),
        "refs" => cmd_refs(rest),
        "reverse" => cmd_reverse(rest),
        "web" => cmd_web(rest),
        _ => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            process::exit(2);
        }
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!("Usage: cnt-index <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  parse [ocr_dir]            extract rows from column files (default: {}/)", SRC_DIR);
    eprintln!("  normalize                  normalize references from {}", ROWS_TSV);
    eprintln!("  run [ocr_dir]              parse then normalize");
    eprintln!("  lookup <lemma...> [--prefix]");
    eprintln!("  refs <CNT-IDX-NNNNNNN>");
    eprintln!("  reverse <ref_norm> [--all]");
    eprintln!("  web [out_dir]              export JSON (default: {}/)", WEB_DIR);
}

// ============================================================================
// Pipeline Commands
// ============================================================================

fn cmd_parse(args: &[String]) -> Result<i32, String> {
    let dir = args.first().map(String::as_str).unwrap_or(SRC_DIR);

    let parser = ColumnParser::new();
    let outcome = parser.scan_columns(Path::new(dir))?;
    let rows = extract::to_index_rows(outcome.rows);

    store::write_rows(Path::new(ROWS_TSV), &rows)?;
    println!("OK: wrote {} with {} rows", ROWS_TSV, rows.len());

    store::write_rejects(Path::new(REJECTS_TSV), &outcome.rejects)?;
    println!("OK: wrote {} with {} rejects", REJECTS_TSV, outcome.rejects.len());

    Ok(0)
}

fn cmd_normalize() -> Result<i32, String> {
    if !Path::new(ROWS_TSV).exists() {
        return Err(format!("Missing input: {} (run parse first)", ROWS_TSV));
    }
    let rows = store::read_rows(Path::new(ROWS_TSV))?;

    let parser = RefParser::new();
    let refs = parser.normalize_rows(&rows);

    store::write_refs(Path::new(REFS_TSV), &refs)?;
    println!("OK: wrote {} with {} normalized refs", REFS_TSV, refs.len());

    Ok(0)
}

fn cmd_run(args: &[String]) -> Result<i32, String> {
    cmd_parse(args)?;
    cmd_normalize()
}

// ============================================================================
// Lookup Commands
// ============================================================================

fn cmd_lookup(args: &[String]) -> Result<i32, String> {
    let prefix_mode = args.iter().any(|a| a == "--prefix");
    let query = args
        .iter()
        .filter(|a| *a != "--prefix")
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");

    if query.is_empty() {
        eprintln!("Usage: cnt-index lookup <lemma or prefix> [--prefix]");
        return Ok(2);
    }
    let key = extract::lemma_key(&query);
    if key.is_empty() {
        eprintln!("Empty query after normalization.");
        return Ok(2);
    }
    if !Path::new(ROWS_TSV).exists() {
        eprintln!("Missing {}. Run parse first.", ROWS_TSV);
        return Ok(2);
    }

    let rows = store::read_rows(Path::new(ROWS_TSV))?;
    let index = LemmaIndex::build(&rows);

    let hits = if prefix_mode {
        index.lookup_prefix(&query)
    } else {
        index.lookup_exact(&query)
    };

    for row in &hits {
        println!(
            "{}\t{}\t({}:{})",
            row.lemma, row.refs_raw, row.source_column, row.line_no
        );
    }

    if hits.is_empty() {
        let mode = if prefix_mode { "prefix" } else { "exact" };
        eprintln!("No {} matches for: {}  [key={}]", mode, query, key);
        return Ok(1);
    }
    Ok(0)
}

fn cmd_refs(args: &[String]) -> Result<i32, String> {
    let cnt_idx = match args.first() {
        Some(id) => id.trim(),
        None => {
            eprintln!("Usage: cnt-index refs CNT-IDX-0000123");
            return Ok(2);
        }
    };
    if !Path::new(ROWS_TSV).exists() || !Path::new(REFS_TSV).exists() {
        eprintln!(
            "Missing required TSVs. Need {} and {}",
            ROWS_TSV, REFS_TSV
        );
        return Ok(2);
    }

    let rows = store::read_rows(Path::new(ROWS_TSV))?;
    let refs = store::read_refs(Path::new(REFS_TSV))?;
    let index = LemmaIndex::build(&rows);

    let row = match index.get(cnt_idx) {
        Some(r) => r,
        None => {
            eprintln!("Not found: {}", cnt_idx);
            return Ok(1);
        }
    };
    let entry_refs = refs_for_entry(&refs, cnt_idx);

    println!("{}", cnt_idx);
    println!("lemma_key: {}", row.lemma_key);
    println!("lemma:     {}", row.lemma);
    println!("refs_raw:  {}", row.refs_raw);
    println!("source:    {}:{}", row.source_column, row.line_no);
    println!();
    println!("refs_norm:");
    for r in &entry_refs {
        println!(
            "  - {}    ({}:{} g{} r{})",
            format_ref(r),
            r.source_column,
            r.line_no,
            r.group_no,
            r.ref_no
        );
    }

    Ok(0)
}

fn cmd_reverse(args: &[String]) -> Result<i32, String> {
    let target = match args.first() {
        Some(t) => t.trim(),
        None => {
            eprintln!("Usage: cnt-index reverse 121,98 [--all]");
            return Ok(2);
        }
    };
    let include_all = args.iter().skip(1).any(|a| a == "--all");

    if !Path::new(ROWS_TSV).exists() || !Path::new(REFS_TSV).exists() {
        eprintln!(
            "Missing required TSVs. Need {} and {}",
            ROWS_TSV, REFS_TSV
        );
        return Ok(2);
    }

    let rows = store::read_rows(Path::new(ROWS_TSV))?;
    let refs = store::read_refs(Path::new(REFS_TSV))?;
    let index = LemmaIndex::build(&rows);

    let hits = reverse_lookup(&index, &refs, target, include_all);
    if hits.is_empty() {
        eprintln!("No hits for ref_norm={}", target);
        return Ok(1);
    }

    println!("ref_norm={}  hits={}", target, hits.len());
    for hit in &hits {
        let r = hit.record;
        let mut extra = String::new();
        if !r.sigla_prefix.is_empty() {
            extra.push_str(&format!(" sigla={}", r.sigla_prefix));
        }
        if !r.marks.is_empty() {
            extra.push_str(&format!(" marks={}", r.marks));
        }
        println!(
            "{}\t{}\t{}\t({}:{} g{} r{}){}",
            hit.lemma_key,
            hit.lemma,
            r.cnt_idx,
            r.source_column,
            r.line_no,
            r.group_no,
            r.ref_no,
            extra
        );
    }

    Ok(0)
}

// ============================================================================
// Export Command
// ============================================================================

fn cmd_web(args: &[String]) -> Result<i32, String> {
    let out_dir = args.first().map(String::as_str).unwrap_or(WEB_DIR);

    if !Path::new(ROWS_TSV).exists() || !Path::new(REFS_TSV).exists() {
        eprintln!(
            "Missing required TSVs. Need {} and {}",
            ROWS_TSV, REFS_TSV
        );
        return Ok(2);
    }

    let rows = store::read_rows(Path::new(ROWS_TSV))?;
    let refs = store::read_refs(Path::new(REFS_TSV))?;

    store::export_web(&rows, &refs, Path::new(out_dir))?;
    println!("OK: wrote {0}/data_index.json and {0}/data_refs.json", out_dir);

    Ok(0)
}
