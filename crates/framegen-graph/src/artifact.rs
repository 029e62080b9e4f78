//! Per-case artifact export: npz container plus CSV companions.
//!
//! The container is a plain zip archive holding little-endian npy v1.0
//! arrays and a `meta.json` entry, laid out the way numeric loaders expect
//! an npz file.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use framegen_core::bucket::{bucket_dir, compute_bucket, GRAPH_ARTIFACT_EXT, INPUT_BUCKET_PREFIX};
use framegen_core::errors::{ErrorInfo, FramegenError};
use framegen_core::SiteSettings;
use serde_json::json;
use zip::write::FileOptions;

use crate::builder::{CaseGraph, EDGE_FEATURE_FIELDS, NODE_FEATURE_FIELDS};

/// Result of one artifact export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    /// Final artifact path.
    pub path: PathBuf,
    /// True when an existing artifact was found and left untouched.
    pub already_existed: bool,
}

fn graph_error(code: &str, path: &Path, err: impl ToString) -> FramegenError {
    FramegenError::Graph(
        ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
    )
}

/// Returns the bucketed artifact path for a case id.
pub fn artifact_path(
    root: &Path,
    case_id: u64,
    bucket_size: u64,
    bucket_count: u64,
) -> Result<PathBuf, FramegenError> {
    let bucket = compute_bucket(case_id, bucket_size, bucket_count)?;
    let dir = bucket_dir(root, INPUT_BUCKET_PREFIX, &bucket);
    Ok(dir.join(format!("case_{case_id}{GRAPH_ARTIFACT_EXT}")))
}

/// Removes a case's artifact and its CSV companions if present.
///
/// Returns whether anything was deleted. Used before re-exporting a case so
/// a fresh artifact is never mistaken for the stale one.
pub fn remove_case_artifact(
    root: &Path,
    case_id: u64,
    bucket_size: u64,
    bucket_count: u64,
) -> Result<bool, FramegenError> {
    let path = artifact_path(root, case_id, bucket_size, bucket_count)?;
    let mut removed = false;
    for target in [
        path.clone(),
        companion_path(&path, "nodes"),
        companion_path(&path, "edges"),
    ] {
        if target.is_file() {
            fs::remove_file(&target).map_err(|err| graph_error("artifact-remove", &target, err))?;
            removed = true;
        }
    }
    Ok(removed)
}

fn companion_path(artifact: &Path, suffix: &str) -> PathBuf {
    let stem = artifact
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("case");
    artifact.with_file_name(format!("{stem}_{suffix}.csv"))
}

/// Exports one case graph into its bucket directory.
///
/// The bucket directory is created if absent. An existing artifact is
/// returned as-is without rewriting, which makes repeated batch runs
/// idempotent and safe to run concurrently across distinct cases.
pub fn export_case_graph(
    graph: &CaseGraph,
    settings: &SiteSettings,
    root: &Path,
    bucket_size: u64,
    bucket_count: u64,
) -> Result<ExportOutcome, FramegenError> {
    let bucket = compute_bucket(graph.case_id, bucket_size, bucket_count)?;
    let dir = bucket_dir(root, INPUT_BUCKET_PREFIX, &bucket);
    fs::create_dir_all(&dir).map_err(|err| graph_error("artifact-mkdir", &dir, err))?;

    let path = dir.join(format!("case_{}{GRAPH_ARTIFACT_EXT}", graph.case_id));
    if path.exists() {
        return Ok(ExportOutcome {
            path,
            already_existed: true,
        });
    }

    let node_rows: Vec<&[f32]> = graph.node_features.iter().map(|row| &row[..]).collect();
    let edge_rows: Vec<&[f32]> = graph.edge_features.iter().map(|row| &row[..]).collect();
    let node_features = encode_npy_f32(&node_rows, NODE_FEATURE_FIELDS.len());
    let edge_features = encode_npy_f32(&edge_rows, EDGE_FEATURE_FIELDS.len());
    let edge_index = encode_npy_edge_index(&graph.edge_index);
    let meta = meta_json(graph, settings, &bucket.label());

    let file = File::create(&path).map_err(|err| graph_error("artifact-create", &path, err))?;
    let mut archive = zip::ZipWriter::new(file);
    let options = FileOptions::default();
    let entries: [(&str, &[u8]); 6] = [
        ("node_features.npy", &node_features),
        ("edge_index.npy", &edge_index),
        ("edge_features.npy", &edge_features),
        // Aliases for loaders that expect torch-geometric key names.
        ("x.npy", &node_features),
        ("edge_attr.npy", &edge_features),
        ("meta.json", meta.as_bytes()),
    ];
    for (name, bytes) in entries {
        archive
            .start_file(name, options)
            .map_err(|err| graph_error("artifact-write", &path, err))?;
        archive
            .write_all(bytes)
            .map_err(|err| graph_error("artifact-write", &path, err))?;
    }
    archive
        .finish()
        .map_err(|err| graph_error("artifact-write", &path, err))?;

    write_node_csv(graph, &companion_path(&path, "nodes"))?;
    write_edge_csv(graph, &companion_path(&path, "edges"))?;

    Ok(ExportOutcome {
        path,
        already_existed: false,
    })
}

/// Encodes a 2-D f32 matrix as a little-endian npy v1.0 blob.
fn encode_npy_f32(rows: &[&[f32]], columns: usize) -> Vec<u8> {
    let mut body = Vec::with_capacity(rows.len() * columns * 4);
    for row in rows {
        for value in *row {
            body.extend_from_slice(&value.to_le_bytes());
        }
    }
    let mut out = npy_header("<f4", &[rows.len(), columns]);
    out.extend_from_slice(&body);
    out
}

/// Encodes edge endpoint pairs as a `[2, E]` i64 npy blob.
fn encode_npy_edge_index(pairs: &[(usize, usize)]) -> Vec<u8> {
    let mut body = Vec::with_capacity(pairs.len() * 16);
    for (start, _) in pairs {
        body.extend_from_slice(&(*start as i64).to_le_bytes());
    }
    for (_, end) in pairs {
        body.extend_from_slice(&(*end as i64).to_le_bytes());
    }
    let mut out = npy_header("<i8", &[2, pairs.len()]);
    out.extend_from_slice(&body);
    out
}

/// Builds the npy v1.0 preamble: magic, version, and the space-padded header
/// dict aligned so the array data starts on a 64-byte boundary.
fn npy_header(descr: &str, shape: &[usize]) -> Vec<u8> {
    let shape_text = match shape {
        [only] => format!("({only},)"),
        _ => {
            let dims: Vec<String> = shape.iter().map(usize::to_string).collect();
            format!("({})", dims.join(", "))
        }
    };
    let mut dict = format!(
        "{{'descr': '{descr}', 'fortran_order': False, 'shape': {shape_text}, }}"
    );
    let unpadded = 10 + dict.len() + 1;
    let padding = (64 - unpadded % 64) % 64;
    dict.extend(std::iter::repeat(' ').take(padding));
    dict.push('\n');

    let mut out = Vec::with_capacity(10 + dict.len());
    out.extend_from_slice(b"\x93NUMPY");
    out.push(1);
    out.push(0);
    out.extend_from_slice(&(dict.len() as u16).to_le_bytes());
    out.extend_from_slice(dict.as_bytes());
    out
}

fn meta_json(graph: &CaseGraph, settings: &SiteSettings, bucket_label: &str) -> String {
    let node_name_to_index: serde_json::Map<String, serde_json::Value> = graph
        .node_names
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.clone(), json!(idx)))
        .collect();
    let edge_meta: Vec<serde_json::Value> = graph
        .edges
        .iter()
        .map(|edge| {
            json!({
                "name": edge.name,
                "section": edge.section,
                "points": [edge.start_node, edge.end_node],
                "length": edge.length_m,
                "type": edge.kind_code,
            })
        })
        .collect();
    let skipped: Vec<serde_json::Value> = graph
        .skipped
        .iter()
        .map(|member| json!({ "name": member.name, "reason": member.reason }))
        .collect();

    json!({
        "case_id": graph.case_id,
        "bucket": bucket_label,
        "materials": {
            "concrete_material_name": settings.materials.name,
            "E": settings.materials.e_modulus_mpa,
            "fc_MPa": settings.materials.fc_mpa,
        },
        "seismic": {
            "pga_g": settings.seismic.pga_g,
            "pga_ms2": settings.seismic.pga_ms2(),
            "alpha_max_g": settings.seismic.pga_g,
            "tg_s": settings.seismic.characteristic_period_s,
            "xi": settings.seismic.damping_ratio,
        },
        "node_name_to_index": node_name_to_index,
        "edge_names": graph.edges.iter().map(|e| &e.name).collect::<Vec<_>>(),
        "edge_sections": graph.edges.iter().map(|e| &e.section).collect::<Vec<_>>(),
        "feature_fields": {
            "node": NODE_FEATURE_FIELDS,
            "edge": EDGE_FEATURE_FIELDS,
        },
        "units": {
            "length": "m",
            "PGA_ms2": "m/s^2",
            "alpha_max_g": "g",
            "fc": "MPa",
        },
        "edge_meta": edge_meta,
        "skipped_members": skipped,
        "source": "design-derived",
    })
    .to_string()
}

fn format_sig(value: f32) -> String {
    FloatSig(value as f64).to_string()
}

// Six significant digits, trailing zeros trimmed the way `%g` prints.
struct FloatSig(f64);

impl std::fmt::Display for FloatSig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = format!("{:.5e}", self.0);
        // Round-trip through scientific notation, then render compactly.
        let value: f64 = text.parse().map_err(|_| std::fmt::Error)?;
        if value == 0.0 {
            return write!(f, "0");
        }
        let magnitude = value.abs().log10().floor() as i32;
        if (-5..15).contains(&magnitude) {
            let decimals = (5 - magnitude).max(0) as usize;
            let fixed = format!("{value:.decimals$}");
            let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
            write!(f, "{trimmed}")
        } else {
            write!(f, "{value:e}")
        }
    }
}

fn write_node_csv(graph: &CaseGraph, path: &Path) -> Result<(), FramegenError> {
    let mut writer =
        csv::Writer::from_path(path).map_err(|err| graph_error("artifact-create", path, err))?;
    let mut header = vec!["node_id".to_string(), "name".to_string()];
    header.extend(NODE_FEATURE_FIELDS.iter().map(|s| s.to_string()));
    writer
        .write_record(&header)
        .map_err(|err| graph_error("artifact-write", path, err))?;
    for (idx, (name, features)) in graph
        .node_names
        .iter()
        .zip(graph.node_features.iter())
        .enumerate()
    {
        let mut row = vec![idx.to_string(), name.clone()];
        row.extend(features.iter().map(|&v| format_sig(v)));
        writer
            .write_record(&row)
            .map_err(|err| graph_error("artifact-write", path, err))?;
    }
    writer
        .flush()
        .map_err(|err| graph_error("artifact-write", path, err))?;
    Ok(())
}

fn write_edge_csv(graph: &CaseGraph, path: &Path) -> Result<(), FramegenError> {
    let mut writer =
        csv::Writer::from_path(path).map_err(|err| graph_error("artifact-create", path, err))?;
    let mut header = vec![
        "edge_id".to_string(),
        "name".to_string(),
        "type".to_string(),
        "section".to_string(),
        "start_node".to_string(),
        "end_node".to_string(),
    ];
    header.extend(EDGE_FEATURE_FIELDS.iter().map(|s| s.to_string()));
    writer
        .write_record(&header)
        .map_err(|err| graph_error("artifact-write", path, err))?;
    for (idx, ((edge, features), (start, end))) in graph
        .edges
        .iter()
        .zip(graph.edge_features.iter())
        .zip(graph.edge_index.iter())
        .enumerate()
    {
        let mut row = vec![
            idx.to_string(),
            edge.name.clone(),
            edge.kind_code.to_string(),
            edge.section.clone(),
            start.to_string(),
            end.to_string(),
        ];
        row.extend(features.iter().map(|&v| format_sig(v)));
        writer
            .write_record(&row)
            .map_err(|err| graph_error("artifact-write", path, err))?;
    }
    writer
        .flush()
        .map_err(|err| graph_error("artifact-write", path, err))?;
    Ok(())
}
