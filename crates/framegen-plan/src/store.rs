//! Plan persistence: line-oriented records plus a flat tabular sibling.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use framegen_core::errors::{ErrorInfo, FramegenError};

use crate::case::DesignCase;

/// Fixed header of the tabular plan sibling.
pub const PLAN_CSV_HEADERS: [&str; 27] = [
    "case_id",
    "story_count",
    "bay_count_x",
    "bay_count_y",
    "bay_span_x_mm",
    "bay_span_y_mm",
    "g1_corner_column_mm",
    "g1_edge_column_mm",
    "g1_interior_column_mm",
    "g1_edge_beam_width_mm",
    "g1_edge_beam_depth_mm",
    "g1_interior_beam_width_mm",
    "g1_interior_beam_depth_mm",
    "g2_corner_column_mm",
    "g2_edge_column_mm",
    "g2_interior_column_mm",
    "g2_edge_beam_width_mm",
    "g2_edge_beam_depth_mm",
    "g2_interior_beam_width_mm",
    "g2_interior_beam_depth_mm",
    "g3_corner_column_mm",
    "g3_edge_column_mm",
    "g3_interior_column_mm",
    "g3_edge_beam_width_mm",
    "g3_edge_beam_depth_mm",
    "g3_interior_beam_width_mm",
    "g3_interior_beam_depth_mm",
];

/// Paths produced by one plan write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanPaths {
    /// Line-oriented record file.
    pub records: PathBuf,
    /// Flat tabular sibling.
    pub table: PathBuf,
}

fn resolve_paths(path: &Path) -> PlanPaths {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("csv") => PlanPaths {
            records: path.with_extension("jsonl"),
            table: path.to_path_buf(),
        },
        _ => PlanPaths {
            records: path.with_extension("jsonl"),
            table: path.with_extension("csv"),
        },
    }
}

fn write_error(code: &str, path: &Path, err: impl ToString) -> FramegenError {
    FramegenError::Plan(
        ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
    )
}

/// Writes the plan as one JSON record per line plus the tabular sibling.
///
/// Both writes are total: failure to create either destination fails the
/// whole call instead of leaving a partial pair behind.
pub fn write_plan(cases: &[DesignCase], path: &Path) -> Result<PlanPaths, FramegenError> {
    let paths = resolve_paths(path);
    if let Some(parent) = paths.records.parent() {
        fs::create_dir_all(parent).map_err(|err| write_error("plan-mkdir", parent, err))?;
    }

    let records = File::create(&paths.records)
        .map_err(|err| write_error("plan-create", &paths.records, err))?;
    let mut records = BufWriter::new(records);
    for case in cases {
        let line = serde_json::to_string(case)
            .map_err(|err| write_error("plan-encode", &paths.records, err))?;
        writeln!(records, "{line}").map_err(|err| write_error("plan-write", &paths.records, err))?;
    }
    records
        .flush()
        .map_err(|err| write_error("plan-write", &paths.records, err))?;

    let mut table = csv::Writer::from_path(&paths.table)
        .map_err(|err| write_error("plan-create", &paths.table, err))?;
    table
        .write_record(PLAN_CSV_HEADERS)
        .map_err(|err| write_error("plan-write", &paths.table, err))?;
    for case in cases {
        let mut row = vec![case.case_id.to_string()];
        row.extend(case.flattened_signature().iter().map(u32::to_string));
        table
            .write_record(&row)
            .map_err(|err| write_error("plan-write", &paths.table, err))?;
    }
    table
        .flush()
        .map_err(|err| write_error("plan-write", &paths.table, err))?;

    Ok(paths)
}

/// Streams design cases back from a line-oriented plan file.
///
/// Blank lines are skipped; a malformed record fails with a parse error
/// naming the offending line instead of being silently dropped.
pub fn read_plan(path: &Path) -> Result<Vec<DesignCase>, FramegenError> {
    let file = File::open(path).map_err(|err| {
        FramegenError::Plan(
            ErrorInfo::new("plan-open", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    let reader = BufReader::new(file);

    let mut cases = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|err| {
            FramegenError::Plan(
                ErrorInfo::new("plan-read", err.to_string())
                    .with_context("path", path.display().to_string())
                    .with_context("line", line_no.to_string()),
            )
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let case: DesignCase = serde_json::from_str(&line).map_err(|err| {
            FramegenError::Plan(
                ErrorInfo::new("plan-parse", err.to_string())
                    .with_context("path", path.display().to_string())
                    .with_context("line", line_no.to_string()),
            )
        })?;
        cases.push(case);
    }
    Ok(cases)
}

/// Validates plan-level invariants: ids exactly `0..N-1` in order and no two
/// cases sharing a flattened parameter signature.
pub fn validate_plan(cases: &[DesignCase]) -> Result<(), FramegenError> {
    let mut signatures = BTreeSet::new();
    for (idx, case) in cases.iter().enumerate() {
        if case.case_id != idx as u64 {
            return Err(FramegenError::Plan(
                ErrorInfo::new(
                    "plan-id-gap",
                    format!("expected case_id {idx}, found {}", case.case_id),
                )
                .with_context("position", idx.to_string()),
            ));
        }
        if !signatures.insert(case.flattened_signature()) {
            return Err(FramegenError::Plan(
                ErrorInfo::new(
                    "plan-duplicate",
                    format!("case {} duplicates an earlier parameter tuple", case.case_id),
                )
                .with_context("case_id", case.case_id.to_string()),
            ));
        }
    }
    Ok(())
}

/// Locates a plan file in `dir` by stem prefix, preferring the record format
/// over the tabular sibling. Returns the lexicographically first match.
pub fn find_plan_file(dir: &Path, prefix: &str) -> Option<PathBuf> {
    for ext in ["jsonl", "csv"] {
        let mut matches: Vec<PathBuf> = fs::read_dir(dir)
            .ok()?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|e| e.to_str()) == Some(ext)
                    && path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .is_some_and(|stem| stem.starts_with(prefix))
            })
            .collect();
        matches.sort();
        if let Some(found) = matches.into_iter().next() {
            return Some(found);
        }
    }
    None
}
