#![deny(missing_docs)]
#![doc = "Missing-case reconciliation for large batch runs: heterogeneous \
report parsing, stale-state cleanup and failure-isolated replay."]

pub mod report;
pub mod rerun;

pub use report::{extract_case_ids, find_missing_report, MISSING_REPORT_STEM};
pub use rerun::{
    rerun_missing_cases, BatchLayout, RerunRecord, RerunStatus, RerunSummary, RERUN_LOG_FILENAME,
};
