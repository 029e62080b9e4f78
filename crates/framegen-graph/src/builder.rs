//! Case graph assembly: node dedup, indexing and feature matrices.

use std::collections::BTreeMap;

use framegen_core::SiteSettings;
use framegen_plan::DesignCase;

use crate::geometry::{expand_members, Member, NodeKey};

/// Number of per-node feature values.
pub const NODE_FEATURE_COUNT: usize = 8;
/// Number of per-edge feature values.
pub const EDGE_FEATURE_COUNT: usize = 9;

/// Node feature field legend, in column order.
pub const NODE_FEATURE_FIELDS: [&str; NODE_FEATURE_COUNT] =
    ["F", "X", "Y", "Z", "PGA_ms2", "alpha_max_g", "Tg_s", "xi"];
/// Edge feature field legend, in column order.
pub const EDGE_FEATURE_FIELDS: [&str; EDGE_FEATURE_COUNT] =
    ["T", "b_m", "h_m", "A_m2", "L_m", "E", "Ix_m4", "Iy_m4", "fc_MPa"];

/// Identity record kept per resolved edge.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    /// Member name.
    pub name: String,
    /// Section property name.
    pub section: String,
    /// Feature kind code: beam 0, column 1.
    pub kind_code: u32,
    /// Start node name.
    pub start_node: String,
    /// End node name.
    pub end_node: String,
    /// Member length in metres.
    pub length_m: f64,
}

/// Member dropped during resolution, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedMember {
    /// Member name.
    pub name: String,
    /// Why it was dropped.
    pub reason: String,
}

/// Fully assembled graph for one case.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseGraph {
    /// Case id the graph was built for.
    pub case_id: u64,
    /// Node names, sorted by quantized key.
    pub node_names: Vec<String>,
    /// Node coordinates in metres, aligned with `node_names`.
    pub node_coords: Vec<[f64; 3]>,
    /// Node feature rows, aligned with `node_names`.
    pub node_features: Vec<[f32; NODE_FEATURE_COUNT]>,
    /// Edge endpoint index pairs into the node arrays.
    pub edge_index: Vec<(usize, usize)>,
    /// Edge feature rows, aligned with `edge_index`.
    pub edge_features: Vec<[f32; EDGE_FEATURE_COUNT]>,
    /// Per-edge identity records, aligned with `edge_index`.
    pub edges: Vec<EdgeRecord>,
    /// Members dropped during resolution.
    pub skipped: Vec<SkippedMember>,
}

impl CaseGraph {
    /// Number of distinct nodes.
    pub fn node_count(&self) -> usize {
        self.node_names.len()
    }

    /// Number of resolved edges.
    pub fn edge_count(&self) -> usize {
        self.edge_index.len()
    }
}

fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(p, q)| (p - q) * (p - q))
        .sum::<f64>()
        .sqrt()
}

fn story_index(z: f64, story_height_m: f64) -> f64 {
    if story_height_m <= 0.0 {
        0.0
    } else {
        (z / story_height_m).round()
    }
}

/// Builds the complete graph for a case.
///
/// Node identity is the millimetre-quantized coordinate key; the first member
/// endpoint seen for a key fixes the node coordinate, and output nodes are
/// sorted by key. A member whose endpoint fails to resolve to a collected
/// node is skipped and recorded instead of failing the whole case.
pub fn build_case_graph(case: &DesignCase, settings: &SiteSettings) -> CaseGraph {
    let members = expand_members(case, settings.story_height_m);

    let mut node_map: BTreeMap<NodeKey, [f64; 3]> = BTreeMap::new();
    for member in &members {
        node_map.entry(NodeKey::from_coord(member.start)).or_insert(member.start);
        node_map.entry(NodeKey::from_coord(member.end)).or_insert(member.end);
    }

    let mut node_names = Vec::with_capacity(node_map.len());
    let mut node_coords = Vec::with_capacity(node_map.len());
    let mut index_of: BTreeMap<NodeKey, usize> = BTreeMap::new();
    for (idx, (key, coord)) in node_map.iter().enumerate() {
        node_names.push(key.name());
        node_coords.push(*coord);
        index_of.insert(*key, idx);
    }

    let pga_ms2 = settings.seismic.pga_ms2() as f32;
    let alpha_max_g = settings.seismic.pga_g as f32;
    let tg = settings.seismic.characteristic_period_s as f32;
    let damping = settings.seismic.damping_ratio as f32;

    let node_features = node_coords
        .iter()
        .map(|&[x, y, z]| {
            [
                story_index(z, settings.story_height_m) as f32,
                x as f32,
                y as f32,
                z as f32,
                pga_ms2,
                alpha_max_g,
                tg,
                damping,
            ]
        })
        .collect();

    let mut edge_index = Vec::with_capacity(members.len());
    let mut edge_features = Vec::with_capacity(members.len());
    let mut edges = Vec::with_capacity(members.len());
    let mut skipped = Vec::new();

    for member in &members {
        match resolve_edge(member, &index_of, settings) {
            Ok((pair, features, record)) => {
                edge_index.push(pair);
                edge_features.push(features);
                edges.push(record);
            }
            Err(reason) => skipped.push(SkippedMember {
                name: member.name.clone(),
                reason,
            }),
        }
    }

    CaseGraph {
        case_id: case.case_id,
        node_names,
        node_coords,
        node_features,
        edge_index,
        edge_features,
        edges,
        skipped,
    }
}

type ResolvedEdge = ((usize, usize), [f32; EDGE_FEATURE_COUNT], EdgeRecord);

fn resolve_edge(
    member: &Member,
    index_of: &BTreeMap<NodeKey, usize>,
    settings: &SiteSettings,
) -> Result<ResolvedEdge, String> {
    let start_key = NodeKey::from_coord(member.start);
    let end_key = NodeKey::from_coord(member.end);
    let start_idx = *index_of
        .get(&start_key)
        .ok_or_else(|| format!("unresolved start node {}", start_key.name()))?;
    let end_idx = *index_of
        .get(&end_key)
        .ok_or_else(|| format!("unresolved end node {}", end_key.name()))?;

    let width = member.width_m;
    let depth = member.depth_m;
    let area = if width > 0.0 && depth > 0.0 {
        width * depth
    } else {
        0.0
    };
    let length = distance(member.start, member.end);
    // Rectangle about the two principal axes, m^4.
    let i22 = width * depth.powi(3) / 12.0;
    let i33 = depth * width.powi(3) / 12.0;

    let features = [
        member.kind.code(),
        width as f32,
        depth as f32,
        area as f32,
        length as f32,
        settings.materials.e_modulus_mpa as f32,
        i22 as f32,
        i33 as f32,
        settings.materials.fc_mpa as f32,
    ];
    let record = EdgeRecord {
        name: member.name.clone(),
        section: member.section.clone(),
        kind_code: member.kind.code() as u32,
        start_node: start_key.name(),
        end_node: end_key.name(),
        length_m: length,
    };
    Ok(((start_idx, end_idx), features, record))
}
