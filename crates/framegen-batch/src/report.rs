//! Missing-case report discovery and id extraction.
//!
//! Reports arrive in whatever shape the review step produced: a tabular CSV,
//! a markdown or plain-text list, or a spreadsheet. Each shape gets its own
//! extraction strategy; all of them converge on a sorted, deduplicated id
//! list.

use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use framegen_core::errors::{ErrorInfo, FramegenError};
use quick_xml::events::Event;
use quick_xml::Reader as XmlReader;
use regex::Regex;

/// Report file stem searched for in every candidate root.
pub const MISSING_REPORT_STEM: &str = "missing_cases_report";

const EXTENSION_PRIORITY: [&str; 4] = ["csv", "md", "txt", "xlsx"];

fn report_error(code: &str, path: &Path, err: impl ToString) -> FramegenError {
    FramegenError::Report(
        ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
    )
}

fn case_pattern() -> Result<Regex, FramegenError> {
    Regex::new(r"(?i)case_(\d+)").map_err(|err| {
        FramegenError::Report(ErrorInfo::new("report-pattern", err.to_string()))
    })
}

fn extension_rank(path: &Path) -> usize {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| {
            EXTENSION_PRIORITY
                .iter()
                .position(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(EXTENSION_PRIORITY.len())
}

/// Searches candidate roots for a missing-case report.
///
/// Within each root, exact `missing_cases_report.{csv,md,txt,xlsx}` probes run
/// first in that priority order, then any file whose stem starts with the
/// report stem, resolved by the same extension priority with the file name as
/// tie-break. The first root with a hit wins.
pub fn find_missing_report(roots: &[PathBuf]) -> Option<PathBuf> {
    for root in roots {
        for ext in EXTENSION_PRIORITY {
            let exact = root.join(format!("{MISSING_REPORT_STEM}.{ext}"));
            if exact.is_file() {
                return Some(exact);
            }
        }

        let mut matches: Vec<PathBuf> = fs::read_dir(root)
            .into_iter()
            .flatten()
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .is_some_and(|stem| stem.starts_with(MISSING_REPORT_STEM))
            })
            .collect();
        matches.sort_by_key(|path| (extension_rank(path), path.file_name().map(|n| n.to_os_string())));
        if let Some(found) = matches.into_iter().next() {
            return Some(found);
        }
    }
    None
}

/// Extracts case ids from a report, dispatching on the file extension.
///
/// Every strategy returns a sorted, deduplicated list. Legacy `.xls`
/// workbooks are rejected with a report error asking for a re-export.
pub fn extract_case_ids(path: &Path) -> Result<Vec<u64>, FramegenError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("csv") => extract_from_csv(path),
        Some("xlsx") => extract_from_xlsx(path),
        Some("xls") => Err(FramegenError::Report(
            ErrorInfo::new(
                "report-xls-unsupported",
                "legacy .xls reports cannot be parsed",
            )
            .with_context("path", path.display().to_string())
            .with_hint("re-export the report as csv or markdown"),
        )),
        _ => extract_from_text(path),
    }
}

fn normalize_header(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .collect::<String>()
        .to_ascii_lowercase()
}

fn is_case_header(name: &str) -> bool {
    matches!(normalize_header(name).as_str(), "case" | "caseid")
}

fn parse_cell_id(pattern: &Regex, cell: &str) -> Option<u64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    if let Some(caps) = pattern.captures(cell) {
        return caps.get(1).and_then(|m| m.as_str().parse().ok());
    }
    if let Ok(id) = cell.parse::<u64>() {
        return Some(id);
    }
    // Spreadsheet exports often render ids as floats ("17.0").
    cell.parse::<f64>()
        .ok()
        .filter(|v| *v >= 0.0 && v.fract() == 0.0)
        .map(|v| v as u64)
}

fn collect_from_rows(rows: &[Vec<String>]) -> Result<BTreeSet<u64>, FramegenError> {
    let pattern = case_pattern()?;
    let mut ids = BTreeSet::new();

    let case_column = rows
        .first()
        .and_then(|header| header.iter().position(|cell| is_case_header(cell)));

    if let Some(column) = case_column {
        for row in rows.iter().skip(1) {
            if let Some(cell) = row.get(column) {
                if let Some(id) = parse_cell_id(&pattern, cell) {
                    ids.insert(id);
                }
            }
        }
    } else {
        // No recognizable id column: fall back to scanning every cell for
        // explicit case tokens only, so unrelated numeric columns are not
        // swept up.
        for row in rows {
            for cell in row {
                for caps in pattern.captures_iter(cell) {
                    if let Some(id) = caps.get(1).and_then(|m| m.as_str().parse().ok()) {
                        ids.insert(id);
                    }
                }
            }
        }
    }
    Ok(ids)
}

fn extract_from_csv(path: &Path) -> Result<Vec<u64>, FramegenError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|err| report_error("report-open", path, err))?;

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| report_error("report-parse", path, err))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(collect_from_rows(&rows)?.into_iter().collect())
}

fn extract_from_text(path: &Path) -> Result<Vec<u64>, FramegenError> {
    let text = fs::read_to_string(path).map_err(|err| report_error("report-open", path, err))?;
    let pattern = case_pattern()?;
    let mut ids = BTreeSet::new();
    for caps in pattern.captures_iter(&text) {
        if let Some(id) = caps.get(1).and_then(|m| m.as_str().parse().ok()) {
            ids.insert(id);
        }
    }
    let standalone = Regex::new(r"\b\d+\b").map_err(|err| {
        FramegenError::Report(ErrorInfo::new("report-pattern", err.to_string()))
    })?;
    for m in standalone.find_iter(&text) {
        if let Ok(id) = m.as_str().parse() {
            ids.insert(id);
        }
    }
    Ok(ids.into_iter().collect())
}

fn extract_from_xlsx(path: &Path) -> Result<Vec<u64>, FramegenError> {
    let file = fs::File::open(path).map_err(|err| report_error("report-open", path, err))?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|err| report_error("report-parse", path, err))?;

    let shared = match read_archive_entry(&mut archive, "xl/sharedStrings.xml", path) {
        Ok(xml) => parse_shared_strings(&xml, path)?,
        Err(_) => Vec::new(),
    };

    let sheet_name = first_sheet_name(&mut archive).ok_or_else(|| {
        report_error("report-parse", path, "workbook contains no worksheet")
    })?;
    let sheet_xml = read_archive_entry(&mut archive, &sheet_name, path)?;
    let rows = parse_sheet_rows(&sheet_xml, &shared, path)?;
    Ok(collect_from_rows(&rows)?.into_iter().collect())
}

fn first_sheet_name<R: Read + std::io::Seek>(archive: &mut zip::ZipArchive<R>) -> Option<String> {
    let mut sheets: Vec<String> = (0..archive.len())
        .filter_map(|idx| archive.by_index(idx).ok().map(|e| e.name().to_string()))
        .filter(|name| name.starts_with("xl/worksheets/") && name.ends_with(".xml"))
        .collect();
    sheets.sort();
    sheets.into_iter().next()
}

fn read_archive_entry<R: Read + std::io::Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
    path: &Path,
) -> Result<String, FramegenError> {
    let mut entry = archive
        .by_name(name)
        .map_err(|err| report_error("report-parse", path, err))?;
    let mut text = String::new();
    entry
        .read_to_string(&mut text)
        .map_err(|err| report_error("report-parse", path, err))?;
    Ok(text)
}

fn parse_shared_strings(xml: &str, path: &Path) -> Result<Vec<String>, FramegenError> {
    let mut reader = XmlReader::from_str(xml);
    reader.trim_text(true);
    let mut strings = Vec::new();
    let mut in_text = false;
    let mut current = String::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"si" => current.clear(),
            Ok(Event::Start(e)) if e.name().as_ref() == b"t" => in_text = true,
            Ok(Event::End(e)) if e.name().as_ref() == b"t" => in_text = false,
            Ok(Event::End(e)) if e.name().as_ref() == b"si" => strings.push(current.clone()),
            Ok(Event::Text(t)) if in_text => {
                let piece = t
                    .unescape()
                    .map_err(|err| report_error("report-parse", path, err))?;
                current.push_str(&piece);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(report_error("report-parse", path, err)),
        }
    }
    Ok(strings)
}

fn parse_sheet_rows(
    xml: &str,
    shared: &[String],
    path: &Path,
) -> Result<Vec<Vec<String>>, FramegenError> {
    let mut reader = XmlReader::from_str(xml);
    reader.trim_text(true);

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell_is_shared = false;
    let mut in_value = false;
    let mut value = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"row" => row = Vec::new(),
                b"c" => {
                    cell_is_shared = false;
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"t" && attr.value.as_ref() == b"s" {
                            cell_is_shared = true;
                        }
                    }
                }
                b"v" => {
                    in_value = true;
                    value.clear();
                }
                _ => {}
            },
            Ok(Event::Text(t)) if in_value => {
                let piece = t
                    .unescape()
                    .map_err(|err| report_error("report-parse", path, err))?;
                value.push_str(&piece);
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"v" => in_value = false,
                b"c" => {
                    let resolved = if cell_is_shared {
                        value
                            .trim()
                            .parse::<usize>()
                            .ok()
                            .and_then(|idx| shared.get(idx).cloned())
                            .unwrap_or_default()
                    } else {
                        value.clone()
                    };
                    row.push(resolved);
                    value.clear();
                }
                b"row" => rows.push(std::mem::take(&mut row)),
                _ => {}
            },
            Ok(Event::Empty(e)) if e.name().as_ref() == b"c" => row.push(String::new()),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(report_error("report-parse", path, err)),
        }
    }
    Ok(rows)
}
