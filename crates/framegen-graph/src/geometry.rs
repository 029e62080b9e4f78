//! Deterministic member expansion from a design case.
//!
//! Geometry is derived entirely from the topology, the group sizing and the
//! uniform story height; no analysis engine is involved. Coordinates are in
//! metres throughout.

use framegen_plan::{DesignCase, GroupId};

/// Millimetre-quantized node identity key.
///
/// Two member endpoints resolve to the same node exactly when their
/// coordinates round to the same integer millimetre triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeKey {
    /// X in millimetres.
    pub x_mm: i64,
    /// Y in millimetres.
    pub y_mm: i64,
    /// Z in millimetres.
    pub z_mm: i64,
}

impl NodeKey {
    /// Quantizes a metre-space coordinate to its node key.
    pub fn from_coord(coord: [f64; 3]) -> Self {
        Self {
            x_mm: (coord[0] * 1000.0).round() as i64,
            y_mm: (coord[1] * 1000.0).round() as i64,
            z_mm: (coord[2] * 1000.0).round() as i64,
        }
    }

    /// Stable node name derived from the key.
    pub fn name(&self) -> String {
        format!("P_X{}_Y{}_Z{}", self.x_mm, self.y_mm, self.z_mm)
    }
}

/// Member classification carried into the edge features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Horizontal member.
    Beam,
    /// Vertical member.
    Column,
}

impl MemberKind {
    /// Numeric code used in the feature matrix: beam 0, column 1.
    pub fn code(self) -> f32 {
        match self {
            MemberKind::Beam => 0.0,
            MemberKind::Column => 1.0,
        }
    }
}

/// Position of a member within the plan grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanPosition {
    /// Both grid indices on the plan boundary (columns only).
    Corner,
    /// On the plan boundary.
    Edge,
    /// Inside the plan.
    Interior,
}

impl PlanPosition {
    fn column_label(self) -> &'static str {
        match self {
            PlanPosition::Corner => "CORNER",
            PlanPosition::Edge => "EDGE",
            PlanPosition::Interior => "INTERIOR",
        }
    }

    fn beam_label(self) -> &'static str {
        match self {
            PlanPosition::Edge => "EDGE",
            _ => "INT",
        }
    }
}

/// Classifies a column by its grid indices against the plan boundary.
pub fn column_position(i: u32, j: u32, max_i: u32, max_j: u32) -> PlanPosition {
    let on_x = i == 0 || i == max_i;
    let on_y = j == 0 || j == max_j;
    match (on_x, on_y) {
        (true, true) => PlanPosition::Corner,
        (true, false) | (false, true) => PlanPosition::Edge,
        (false, false) => PlanPosition::Interior,
    }
}

/// Classifies a beam: edge when the transverse grid index is on the boundary.
pub fn beam_position(transverse: u32, max_transverse: u32) -> PlanPosition {
    if transverse == 0 || transverse == max_transverse {
        PlanPosition::Edge
    } else {
        PlanPosition::Interior
    }
}

/// One expanded frame member with resolved section dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    /// Stable member name (`COL_X{i}_Y{j}_S{s}`, `BEAM_X_X{i}to{i+1}_Y{j}_S{s}`,
    /// `BEAM_Y_X{i}_Y{j}to{j+1}_S{s}`).
    pub name: String,
    /// Section property name.
    pub section: String,
    /// Beam or column.
    pub kind: MemberKind,
    /// First endpoint, metres.
    pub start: [f64; 3],
    /// Second endpoint, metres.
    pub end: [f64; 3],
    /// Section width, metres.
    pub width_m: f64,
    /// Section depth, metres.
    pub depth_m: f64,
}

fn column_section(group: GroupId, position: PlanPosition, width_mm: u32) -> String {
    format!(
        "C_G{}_{}_{}",
        group.number(),
        position.column_label(),
        width_mm
    )
}

fn beam_section(group: GroupId, position: PlanPosition, width_mm: u32, depth_mm: u32) -> String {
    format!(
        "B_G{}_{}_{}x{}",
        group.number(),
        position.beam_label(),
        width_mm,
        depth_mm
    )
}

/// Expands every column and beam of a case into explicit members.
///
/// Columns: one per grid point per story, endpoints at story bottom and top.
/// Beams: one per adjacent grid pair per story in each plan direction, with
/// the member axis dropped so the beam top sits flush with the story top.
pub fn expand_members(case: &DesignCase, story_height_m: f64) -> Vec<Member> {
    let topo = &case.topology;
    let max_i = topo.bay_count_x;
    let max_j = topo.bay_count_y;
    let span_x = topo.bay_span_x_mm as f64 / 1000.0;
    let span_y = topo.bay_span_y_mm as f64 / 1000.0;

    let mut members = Vec::new();

    for story in 1..=topo.story_count {
        let group = case
            .group_mapping
            .group_of(story)
            .unwrap_or(GroupId::Top);
        let sizing = &case.sizing[group.index()];
        let z_bottom = (story - 1) as f64 * story_height_m;
        let z_top = story as f64 * story_height_m;

        for i in 0..=max_i {
            for j in 0..=max_j {
                let position = column_position(i, j, max_i, max_j);
                let width_mm = match position {
                    PlanPosition::Corner => sizing.columns.corner_mm,
                    PlanPosition::Edge => sizing.columns.edge_mm,
                    PlanPosition::Interior => sizing.columns.interior_mm,
                };
                let x = i as f64 * span_x;
                let y = j as f64 * span_y;
                members.push(Member {
                    name: format!("COL_X{i}_Y{j}_S{story}"),
                    section: column_section(group, position, width_mm),
                    kind: MemberKind::Column,
                    start: [x, y, z_bottom],
                    end: [x, y, z_top],
                    width_m: width_mm as f64 / 1000.0,
                    depth_m: width_mm as f64 / 1000.0,
                });
            }
        }

        for j in 0..=max_j {
            for i in 0..max_i {
                let position = beam_position(j, max_j);
                let (width_mm, depth_mm) = beam_dims(sizing, position);
                let z = z_top - depth_mm as f64 / 2000.0;
                let y = j as f64 * span_y;
                members.push(Member {
                    name: format!("BEAM_X_X{i}to{}_Y{j}_S{story}", i + 1),
                    section: beam_section(group, position, width_mm, depth_mm),
                    kind: MemberKind::Beam,
                    start: [i as f64 * span_x, y, z],
                    end: [(i + 1) as f64 * span_x, y, z],
                    width_m: width_mm as f64 / 1000.0,
                    depth_m: depth_mm as f64 / 1000.0,
                });
            }
        }

        for i in 0..=max_i {
            for j in 0..max_j {
                let position = beam_position(i, max_i);
                let (width_mm, depth_mm) = beam_dims(sizing, position);
                let z = z_top - depth_mm as f64 / 2000.0;
                let x = i as f64 * span_x;
                members.push(Member {
                    name: format!("BEAM_Y_X{i}_Y{j}to{}_S{story}", j + 1),
                    section: beam_section(group, position, width_mm, depth_mm),
                    kind: MemberKind::Beam,
                    start: [x, j as f64 * span_y, z],
                    end: [x, (j + 1) as f64 * span_y, z],
                    width_m: width_mm as f64 / 1000.0,
                    depth_m: depth_mm as f64 / 1000.0,
                });
            }
        }
    }

    members
}

fn beam_dims(sizing: &framegen_plan::GroupSizing, position: PlanPosition) -> (u32, u32) {
    match position {
        PlanPosition::Edge => (sizing.beams.edge_width_mm, sizing.beams.edge_depth_mm),
        _ => (
            sizing.beams.interior_width_mm,
            sizing.beams.interior_depth_mm,
        ),
    }
}
