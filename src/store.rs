//! Persistence for the tabular interchange format: TSV read/write for the
//! row and citation tables, the reject report, and the JSON web export.
//!
//! Readers validate the header line and fail fast on mismatch — these files
//! are this crate's own output, so a surprise shape means a stale or foreign
//! file, not something to repair silently.

use crate::models::{CitationRecord, IndexRow, RefType, RejectedLine, WebIndexRow, WebRefRow};

use std::fs;
use std::path::Path;

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

const ROWS_HEADER: &str = "cnt_idx\tlemma_key\tlemma\trefs_raw\tsource_column\tline_no";
const REFS_HEADER: &str =
    "cnt_idx\tref_no\tref_norm\tref_type\tsigla_prefix\tmarks\tattach_prev\tsource_column\tline_no\tgroup_no";
const REJECTS_HEADER: &str = "source_column\tline_no\treason\tline";

// ============================================================================
// Row Table
// ============================================================================

pub fn write_rows(path: &Path, rows: &[IndexRow]) -> Result<(), String> {
    let mut out = String::with_capacity(rows.len() * 64);
    out.push_str(ROWS_HEADER);
    out.push('\n');
    for r in rows {
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\t{}\n",
            r.cnt_idx, r.lemma_key, r.lemma, r.refs_raw, r.source_column, r.line_no
        ));
    }
    fs::write(path, out).map_err(|e| format!("Cannot write {}: {}", path.display(), e))
}

pub fn read_rows(path: &Path) -> Result<Vec<IndexRow>, String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
    let mut lines = content.lines();

    let header = lines.next().unwrap_or("");
    if header != ROWS_HEADER {
        return Err(format!("Unexpected header in {}: {}", path.display(), header));
    }

    let mut rows = Vec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 6 {
            continue;
        }
        rows.push(IndexRow {
            cnt_idx: parts[0].to_string(),
            lemma_key: parts[1].to_string(),
            lemma: parts[2].to_string(),
            refs_raw: parts[3].to_string(),
            source_column: parts[4].to_string(),
            line_no: parse_u32(parts[5], "line_no", path)?,
        });
    }
    Ok(rows)
}

// ============================================================================
// Citation Table
// ============================================================================

pub fn write_refs(path: &Path, refs: &[CitationRecord]) -> Result<(), String> {
    let mut out = String::with_capacity(refs.len() * 64);
    out.push_str(REFS_HEADER);
    out.push('\n');
    for r in refs {
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
            r.cnt_idx,
            r.ref_no,
            r.ref_norm,
            r.ref_type,
            r.sigla_prefix,
            r.marks,
            r.attach_prev as u8,
            r.source_column,
            r.line_no,
            r.group_no
        ));
    }
    fs::write(path, out).map_err(|e| format!("Cannot write {}: {}", path.display(), e))
}

pub fn read_refs(path: &Path) -> Result<Vec<CitationRecord>, String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
    let mut lines = content.lines();

    let header = lines.next().unwrap_or("");
    if header != REFS_HEADER {
        return Err(format!("Unexpected header in {}: {}", path.display(), header));
    }

    let mut refs = Vec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 10 {
            continue;
        }
        let ref_type = RefType::from_tag(parts[3])
            .ok_or_else(|| format!("Unknown ref_type in {}: {}", path.display(), parts[3]))?;
        let attach_prev = match parts[6] {
            "0" => false,
            "1" => true,
            other => {
                return Err(format!(
                    "Bad attach_prev in {}: {}",
                    path.display(),
                    other
                ))
            }
        };
        refs.push(CitationRecord {
            cnt_idx: parts[0].to_string(),
            ref_no: parse_u32(parts[1], "ref_no", path)?,
            ref_norm: parts[2].to_string(),
            ref_type,
            sigla_prefix: parts[4].to_string(),
            marks: parts[5].to_string(),
            attach_prev,
            source_column: parts[7].to_string(),
            line_no: parse_u32(parts[8], "line_no", path)?,
            group_no: parse_u32(parts[9], "group_no", path)?,
        });
    }
    Ok(refs)
}

// ============================================================================
// Reject Report
// ============================================================================

pub fn write_rejects(path: &Path, rejects: &[RejectedLine]) -> Result<(), String> {
    let mut out = String::with_capacity(rejects.len() * 48);
    out.push_str(REJECTS_HEADER);
    out.push('\n');
    for r in rejects {
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\n",
            r.source_column, r.line_no, r.reason, r.line
        ));
    }
    fs::write(path, out).map_err(|e| format!("Cannot write {}: {}", path.display(), e))
}

// ============================================================================
// Web Export
// ============================================================================

/// Write `data_index.json` and `data_refs.json` into `out_dir` (created if
/// missing) for the static browsing front end. Non-ASCII lemma text is
/// written verbatim.
pub fn export_web(
    rows: &[IndexRow],
    refs: &[CitationRecord],
    out_dir: &Path,
) -> Result<(), String> {
    fs::create_dir_all(out_dir)
        .map_err(|e| format!("Cannot create {}: {}", out_dir.display(), e))?;

    let web_rows: Vec<WebIndexRow> = rows.iter().map(WebIndexRow::from).collect();
    let web_refs: Vec<WebRefRow> = refs.iter().map(WebRefRow::from).collect();

    let rows_path = out_dir.join("data_index.json");
    let json = serde_json::to_string(&web_rows).map_err(|e| format!("JSON error: {}", e))?;
    fs::write(&rows_path, json)
        .map_err(|e| format!("Cannot write {}: {}", rows_path.display(), e))?;

    let refs_path = out_dir.join("data_refs.json");
    let json = serde_json::to_string(&web_refs).map_err(|e| format!("JSON error: {}", e))?;
    fs::write(&refs_path, json)
        .map_err(|e| format!("Cannot write {}: {}", refs_path.display(), e))?;

    Ok(())
}

fn parse_u32(field: &str, name: &str, path: &Path) -> Result<u32, String> {
    field
        .parse()
        .map_err(|_| format!("Bad {} in {}: {}", name, path.display(), field))
}
