//! Missing-case reconciliation: clear stale state, replay, record.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use framegen_core::bucket::{bucket_dir, compute_bucket, DONE_MARKER_FILENAME, INPUT_BUCKET_PREFIX};
use framegen_core::errors::{ErrorInfo, FramegenError};
use framegen_plan::DesignCase;
use serde::{Deserialize, Serialize};

use crate::report::{extract_case_ids, find_missing_report};

/// File name of the JSON log written after every reconciliation pass.
pub const RERUN_LOG_FILENAME: &str = "missing_cases_rerun_log.json";

/// Outcome of one replayed case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RerunStatus {
    /// The case was replayed successfully.
    Success,
    /// The replay callback failed.
    Failed,
    /// The reported id is not in the plan.
    Skipped,
}

/// Per-case record kept in the summary and the JSON log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RerunRecord {
    /// Reported case id.
    pub case_id: u64,
    /// Replay outcome.
    pub status: RerunStatus,
    /// Failure or skip detail, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Aggregate result of a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RerunSummary {
    /// Number of ids the report yielded.
    pub total: usize,
    /// Successfully replayed cases.
    pub success: usize,
    /// Failed replays.
    pub failed: usize,
    /// Ids not present in the plan.
    pub skipped: usize,
    /// Ids whose replay failed, in report order.
    pub failed_ids: Vec<u64>,
    /// One record per reported id.
    pub records: Vec<RerunRecord>,
}

/// Output layout shared by the batch runner and the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchLayout {
    /// Root directory holding the bucketed case output.
    pub output_root: PathBuf,
    /// Cases per bucket.
    pub bucket_size: u64,
    /// Number of pre-declared buckets.
    pub bucket_count: u64,
}

impl BatchLayout {
    /// Layout rooted at `output_root` with the given shard parameters.
    pub fn new(output_root: impl Into<PathBuf>, bucket_size: u64, bucket_count: u64) -> Self {
        Self {
            output_root: output_root.into(),
            bucket_size,
            bucket_count,
        }
    }

    fn case_dir(&self, case_id: u64) -> Result<PathBuf, FramegenError> {
        let bucket = compute_bucket(case_id, self.bucket_size, self.bucket_count)?;
        let dir = bucket_dir(&self.output_root, INPUT_BUCKET_PREFIX, &bucket);
        Ok(dir.join(format!("case_{case_id}")))
    }

    /// Path of the sentinel file marking a fully processed case.
    pub fn done_marker_path(&self, case_id: u64) -> Result<PathBuf, FramegenError> {
        Ok(self.case_dir(case_id)?.join(DONE_MARKER_FILENAME))
    }

    /// Directory holding a case's extracted analysis data.
    pub fn analysis_dir(&self, case_id: u64) -> Result<PathBuf, FramegenError> {
        Ok(self.case_dir(case_id)?.join("analysis_data"))
    }
}

#[derive(Serialize)]
struct RerunLog<'a> {
    timestamp: String,
    results: &'a [RerunRecord],
}

fn write_rerun_log(output_root: &Path, records: &[RerunRecord]) -> Result<PathBuf, FramegenError> {
    let log_path = output_root.join(RERUN_LOG_FILENAME);
    let payload = RerunLog {
        timestamp: Utc::now().to_rfc3339(),
        results: records,
    };
    let body = serde_json::to_string_pretty(&payload).map_err(|err| {
        FramegenError::Serde(ErrorInfo::new("rerun-log-encode", err.to_string()))
    })?;
    fs::write(&log_path, body).map_err(|err| {
        FramegenError::Report(
            ErrorInfo::new("rerun-log-write", err.to_string())
                .with_context("path", log_path.display().to_string()),
        )
    })?;
    Ok(log_path)
}

fn clear_stale_state(layout: &BatchLayout, case_id: u64) -> Result<(), FramegenError> {
    let marker = layout.done_marker_path(case_id)?;
    if marker.is_file() {
        fs::remove_file(&marker).map_err(|err| {
            FramegenError::Report(
                ErrorInfo::new("rerun-clear", err.to_string())
                    .with_context("path", marker.display().to_string()),
            )
        })?;
    }
    let analysis = layout.analysis_dir(case_id)?;
    if analysis.is_dir() {
        // Partial extraction output must not survive into the replay.
        fs::remove_dir_all(&analysis).map_err(|err| {
            FramegenError::Report(
                ErrorInfo::new("rerun-clear", err.to_string())
                    .with_context("path", analysis.display().to_string()),
            )
        })?;
    }
    Ok(())
}

/// Replays every case a missing-case report names.
///
/// Returns `Ok(None)` when no report exists or the report yields no ids;
/// the steady state after a clean batch run is quiet. For each reported id
/// present in the plan, the done marker and any partial analysis directory
/// are removed before `rerun_fn(case, ordinal, total)` runs. A single
/// failure is recorded and never stops the loop. A timestamped JSON log is
/// written under the output root before returning.
pub fn rerun_missing_cases<F>(
    cases: &[DesignCase],
    layout: &BatchLayout,
    report_roots: &[PathBuf],
    mut rerun_fn: F,
) -> Result<Option<RerunSummary>, FramegenError>
where
    F: FnMut(&DesignCase, usize, usize) -> Result<(), FramegenError>,
{
    let Some(report) = find_missing_report(report_roots) else {
        return Ok(None);
    };
    let missing_ids = extract_case_ids(&report)?;
    if missing_ids.is_empty() {
        return Ok(None);
    }

    let lookup: BTreeMap<u64, &DesignCase> =
        cases.iter().map(|case| (case.case_id, case)).collect();
    let total = missing_ids.len();
    let mut records = Vec::with_capacity(total);
    let mut failed_ids = Vec::new();

    for (ordinal, case_id) in missing_ids.iter().copied().enumerate() {
        let Some(case) = lookup.get(&case_id) else {
            records.push(RerunRecord {
                case_id,
                status: RerunStatus::Skipped,
                message: Some("case_id not found in plan".to_string()),
            });
            continue;
        };

        let outcome = clear_stale_state(layout, case_id)
            .and_then(|()| rerun_fn(case, ordinal + 1, total));
        match outcome {
            Ok(()) => records.push(RerunRecord {
                case_id,
                status: RerunStatus::Success,
                message: None,
            }),
            Err(err) => {
                failed_ids.push(case_id);
                records.push(RerunRecord {
                    case_id,
                    status: RerunStatus::Failed,
                    message: Some(err.to_string()),
                });
            }
        }
    }

    write_rerun_log(&layout.output_root, &records)?;

    let success = records
        .iter()
        .filter(|r| r.status == RerunStatus::Success)
        .count();
    let skipped = records
        .iter()
        .filter(|r| r.status == RerunStatus::Skipped)
        .count();
    Ok(Some(RerunSummary {
        total,
        success,
        failed: failed_ids.len(),
        skipped,
        failed_ids,
        records,
    }))
}
