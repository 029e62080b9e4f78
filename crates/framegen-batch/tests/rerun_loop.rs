use std::fs;
use std::path::PathBuf;

use framegen_batch::{rerun_missing_cases, BatchLayout, RerunStatus, RERUN_LOG_FILENAME};
use framegen_core::errors::{ErrorInfo, FramegenError};
use framegen_plan::{
    BeamSizing, ColumnSizing, DesignCase, GroupMapping, GroupSizing, Topology,
};

fn fixture_case(case_id: u64) -> DesignCase {
    let topology = Topology {
        story_count: 4,
        bay_count_x: 2,
        bay_count_y: 2,
        bay_span_x_mm: 4200,
        bay_span_y_mm: 4200,
    };
    let sizing = GroupSizing {
        columns: ColumnSizing {
            corner_mm: 400,
            edge_mm: 450,
            interior_mm: 500,
        },
        beams: BeamSizing {
            edge_width_mm: 200,
            edge_depth_mm: 400,
            interior_width_mm: 250,
            interior_depth_mm: 500,
        },
    };
    DesignCase::new(case_id, topology, [sizing; 3], GroupMapping::split(4))
}

fn plan() -> Vec<DesignCase> {
    vec![fixture_case(3), fixture_case(17)]
}

#[test]
fn reported_ids_replay_against_the_plan() {
    let out = tempfile::tempdir().expect("tempdir");
    let reports = tempfile::tempdir().expect("tempdir");
    fs::write(
        reports.path().join("missing_cases_report.csv"),
        "case_id\n3\n17\n999\n",
    )
    .expect("write");

    let layout = BatchLayout::new(out.path(), 1000, 30);
    let mut seen: Vec<(u64, usize, usize)> = Vec::new();
    let summary = rerun_missing_cases(
        &plan(),
        &layout,
        &[reports.path().to_path_buf()],
        |case, ordinal, total| {
            seen.push((case.case_id, ordinal, total));
            Ok(())
        },
    )
    .expect("rerun")
    .expect("summary");

    assert_eq!(seen, [(3, 1, 3), (17, 2, 3)]);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.success, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.skipped, 1);
    let skipped: Vec<u64> = summary
        .records
        .iter()
        .filter(|r| r.status == RerunStatus::Skipped)
        .map(|r| r.case_id)
        .collect();
    assert_eq!(skipped, [999]);
}

#[test]
fn one_failure_never_stops_the_loop() {
    let out = tempfile::tempdir().expect("tempdir");
    let reports = tempfile::tempdir().expect("tempdir");
    fs::write(
        reports.path().join("missing_cases_report.csv"),
        "case_id\n3\n17\n",
    )
    .expect("write");

    let layout = BatchLayout::new(out.path(), 1000, 30);
    let summary = rerun_missing_cases(
        &plan(),
        &layout,
        &[reports.path().to_path_buf()],
        |case, _, _| {
            if case.case_id == 3 {
                Err(FramegenError::Graph(ErrorInfo::new(
                    "export-failed",
                    "disk full",
                )))
            } else {
                Ok(())
            }
        },
    )
    .expect("rerun")
    .expect("summary");

    assert_eq!(summary.failed_ids, [3]);
    assert_eq!(summary.success, 1);
    let failed = summary
        .records
        .iter()
        .find(|r| r.case_id == 3)
        .expect("record");
    assert_eq!(failed.status, RerunStatus::Failed);
    assert!(failed.message.as_deref().is_some_and(|m| m.contains("disk full")));
}

#[test]
fn stale_state_is_cleared_before_replay() {
    let out = tempfile::tempdir().expect("tempdir");
    let reports = tempfile::tempdir().expect("tempdir");
    fs::write(
        reports.path().join("missing_cases_report.csv"),
        "case_id\n3\n",
    )
    .expect("write");

    let layout = BatchLayout::new(out.path(), 1000, 30);
    let marker = layout.done_marker_path(3).expect("marker");
    let analysis = layout.analysis_dir(3).expect("analysis");
    fs::create_dir_all(&analysis).expect("mkdir");
    fs::write(analysis.join("partial.csv"), "stale").expect("stale file");
    fs::write(&marker, "").expect("marker file");

    rerun_missing_cases(&plan(), &layout, &[reports.path().to_path_buf()], |_, _, _| Ok(()))
        .expect("rerun")
        .expect("summary");

    assert!(!marker.exists());
    assert!(!analysis.exists());
}

#[test]
fn quiet_when_no_report_or_no_ids() {
    let out = tempfile::tempdir().expect("tempdir");
    let empty_roots: Vec<PathBuf> = vec![out.path().join("nowhere")];
    let layout = BatchLayout::new(out.path(), 1000, 30);

    let outcome = rerun_missing_cases(&plan(), &layout, &empty_roots, |_, _, _| Ok(()))
        .expect("rerun");
    assert!(outcome.is_none());

    let reports = tempfile::tempdir().expect("tempdir");
    fs::write(reports.path().join("missing_cases_report.csv"), "case_id\n").expect("write");
    let outcome = rerun_missing_cases(
        &plan(),
        &layout,
        &[reports.path().to_path_buf()],
        |_, _, _| Ok(()),
    )
    .expect("rerun");
    assert!(outcome.is_none());
    assert!(!out.path().join(RERUN_LOG_FILENAME).exists());
}

#[test]
fn every_pass_leaves_a_json_log() {
    let out = tempfile::tempdir().expect("tempdir");
    let reports = tempfile::tempdir().expect("tempdir");
    fs::write(
        reports.path().join("missing_cases_report.csv"),
        "case_id\n3\n999\n",
    )
    .expect("write");

    let layout = BatchLayout::new(out.path(), 1000, 30);
    rerun_missing_cases(&plan(), &layout, &[reports.path().to_path_buf()], |_, _, _| Ok(()))
        .expect("rerun")
        .expect("summary");

    let log: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(out.path().join(RERUN_LOG_FILENAME)).expect("log"),
    )
    .expect("json");
    assert!(log["timestamp"].is_string());
    let results = log["results"].as_array().expect("results");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["case_id"], 3);
    assert_eq!(results[0]["status"], "success");
    assert_eq!(results[1]["status"], "skipped");
}
