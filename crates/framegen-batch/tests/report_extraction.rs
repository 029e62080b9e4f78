use std::fs;
use std::io::Write;
use std::path::PathBuf;

use framegen_batch::{extract_case_ids, find_missing_report};
use zip::write::FileOptions;

#[test]
fn csv_with_case_column_parses_each_row() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("missing_cases_report.csv");
    fs::write(
        &path,
        "Case ID,status,attempts\n17,missing,2\ncase_3,failed,1\n17.0,missing,9\n",
    )
    .expect("write");

    let ids = extract_case_ids(&path).expect("extract");
    assert_eq!(ids, [3, 17]);
}

#[test]
fn csv_without_case_column_scans_for_tokens_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("missing_cases_report.csv");
    // The numeric column must not be swept up as ids.
    fs::write(&path, "note,count\nsee case_42 and case_7,300\nnothing,400\n").expect("write");

    let ids = extract_case_ids(&path).expect("extract");
    assert_eq!(ids, [7, 42]);
}

#[test]
fn markdown_collects_tokens_and_standalone_integers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("missing_cases_report.md");
    fs::write(&path, "# Missing\n- case_5\n- CASE_12\n- 19\n").expect("write");

    let ids = extract_case_ids(&path).expect("extract");
    assert_eq!(ids, [5, 12, 19]);
}

#[test]
fn xlsx_first_sheet_resolves_shared_strings() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("missing_cases_report.xlsx");
    write_fixture_xlsx(&path);

    let ids = extract_case_ids(&path).expect("extract");
    assert_eq!(ids, [3, 17]);
}

#[test]
fn legacy_xls_is_rejected_with_a_hint() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("missing_cases_report.xls");
    fs::write(&path, b"\xd0\xcf\x11\xe0").expect("write");

    let err = extract_case_ids(&path).expect_err("must fail");
    let info = err.info();
    assert_eq!(info.code, "report-xls-unsupported");
    assert!(info.hint.is_some());
}

#[test]
fn discovery_walks_roots_in_order_and_prefers_csv() {
    let first = tempfile::tempdir().expect("tempdir");
    let second = tempfile::tempdir().expect("tempdir");
    fs::write(second.path().join("missing_cases_report.md"), "case_1").expect("write");

    let roots = vec![first.path().to_path_buf(), second.path().to_path_buf()];
    let found = find_missing_report(&roots).expect("found");
    assert_eq!(found, second.path().join("missing_cases_report.md"));

    // A csv landing in the first root takes over.
    fs::write(first.path().join("missing_cases_report.csv"), "case_id\n").expect("write");
    fs::write(first.path().join("missing_cases_report.txt"), "case_2").expect("write");
    let found = find_missing_report(&roots).expect("found");
    assert_eq!(found, first.path().join("missing_cases_report.csv"));
}

#[test]
fn discovery_falls_back_to_stem_prefixed_names() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("missing_cases_report_v2.txt"), "case_9").expect("write");
    fs::write(dir.path().join("missing_cases_report_final.md"), "case_8").expect("write");

    let found = find_missing_report(&[dir.path().to_path_buf()]).expect("found");
    // Extension priority outranks name order: md before txt.
    assert_eq!(found, dir.path().join("missing_cases_report_final.md"));
}

#[test]
fn no_report_anywhere_yields_none() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing: Vec<PathBuf> = vec![dir.path().to_path_buf(), dir.path().join("absent")];
    assert!(find_missing_report(&missing).is_none());
}

fn write_fixture_xlsx(path: &std::path::Path) {
    let file = fs::File::create(path).expect("create");
    let mut archive = zip::ZipWriter::new(file);
    let options = FileOptions::default();

    archive
        .start_file("xl/sharedStrings.xml", options)
        .expect("entry");
    archive
        .write_all(
            br#"<?xml version="1.0"?><sst><si><t>case_id</t></si><si><t>status</t></si><si><t>missing</t></si></sst>"#,
        )
        .expect("write");

    archive
        .start_file("xl/worksheets/sheet1.xml", options)
        .expect("entry");
    archive
        .write_all(
            br#"<?xml version="1.0"?><worksheet><sheetData>
<row><c t="s"><v>0</v></c><c t="s"><v>1</v></c></row>
<row><c><v>17</v></c><c t="s"><v>2</v></c></row>
<row><c><v>3</v></c><c t="s"><v>2</v></c></row>
</sheetData></worksheet>"#,
        )
        .expect("write");
    archive.finish().expect("finish");
}
