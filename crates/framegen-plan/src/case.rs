//! Typed design-case model: topology, vertical grouping and member sizing.

use serde::{Deserialize, Serialize};

/// Number of vertical groups every case is partitioned into.
pub const GROUP_COUNT: usize = 3;

/// Plan grid and vertical extent of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    /// Number of stories.
    pub story_count: u32,
    /// Number of bays in the x direction.
    pub bay_count_x: u32,
    /// Number of bays in the y direction.
    pub bay_count_y: u32,
    /// Bay span in the x direction, millimetres.
    pub bay_span_x_mm: u32,
    /// Bay span in the y direction, millimetres.
    pub bay_span_y_mm: u32,
}

/// Ordered vertical group identifiers, bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GroupId {
    /// Ground-contact band (story 1 only).
    Bottom,
    /// Middle band.
    Middle,
    /// Top band.
    Top,
}

impl GroupId {
    /// All groups in structural order.
    pub const ALL: [GroupId; GROUP_COUNT] = [GroupId::Bottom, GroupId::Middle, GroupId::Top];

    /// Zero-based index into per-group arrays.
    pub fn index(self) -> usize {
        match self {
            GroupId::Bottom => 0,
            GroupId::Middle => 1,
            GroupId::Top => 2,
        }
    }

    /// One-based group number used in section names (`G1`..`G3`).
    pub fn number(self) -> u32 {
        self.index() as u32 + 1
    }

    /// Human readable band label.
    pub fn label(self) -> &'static str {
        match self {
            GroupId::Bottom => "bottom",
            GroupId::Middle => "middle",
            GroupId::Top => "top",
        }
    }
}

/// Contiguous inclusive band of story numbers; `last < first` means empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryBand {
    /// First story number in the band (1-based).
    pub first: u32,
    /// Last story number in the band (inclusive).
    pub last: u32,
}

impl StoryBand {
    /// Number of stories in the band.
    pub fn count(&self) -> u32 {
        if self.last < self.first {
            0
        } else {
            self.last - self.first + 1
        }
    }

    /// Whether the band contains the given story number.
    pub fn contains(&self, story: u32) -> bool {
        story >= self.first && story <= self.last
    }
}

/// Partition of story numbers into the three vertical groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMapping {
    bands: [StoryBand; GROUP_COUNT],
}

impl GroupMapping {
    /// Splits `story_count` stories into bottom/middle/top bands.
    ///
    /// Bottom takes story 1 only; the remaining stories split between middle
    /// and top with the larger remainder going to the middle band
    /// (9 remaining stories -> middle 5, top 4).
    pub fn split(story_count: u32) -> Self {
        let bottom = story_count.min(1);
        let remaining = story_count.saturating_sub(bottom);
        let middle = remaining / 2 + remaining % 2;
        let top = remaining - middle;

        let mut bands = [StoryBand { first: 1, last: 0 }; GROUP_COUNT];
        let mut next = 1u32;
        for (band, count) in bands.iter_mut().zip([bottom, middle, top]) {
            // Empty bands keep `last < first`.
            let last = if count == 0 { next - 1 } else { next + count - 1 };
            *band = StoryBand { first: next, last };
            next += count;
        }
        Self { bands }
    }

    /// Returns the band of stories assigned to a group.
    pub fn band(&self, group: GroupId) -> StoryBand {
        self.bands[group.index()]
    }

    /// Returns the group a story number belongs to, if any.
    pub fn group_of(&self, story: u32) -> Option<GroupId> {
        GroupId::ALL
            .into_iter()
            .find(|group| self.bands[group.index()].contains(story))
    }

    /// Number of stories carried by a group's columns: every story from the
    /// group's lowest story through the roof.
    pub fn stories_carried(&self, group: GroupId, story_count: u32) -> u32 {
        let band = self.band(group);
        if band.count() == 0 {
            0
        } else {
            story_count.saturating_sub(band.first) + 1
        }
    }
}

/// Square column widths per plan position, millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSizing {
    /// Corner column width.
    pub corner_mm: u32,
    /// Edge column width.
    pub edge_mm: u32,
    /// Interior column width.
    pub interior_mm: u32,
}

/// Beam cross sections per plan position, millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeamSizing {
    /// Edge beam width.
    pub edge_width_mm: u32,
    /// Edge beam depth.
    pub edge_depth_mm: u32,
    /// Interior beam width.
    pub interior_width_mm: u32,
    /// Interior beam depth.
    pub interior_depth_mm: u32,
}

/// One vertical group's full sizing set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSizing {
    /// Column widths for the group.
    pub columns: ColumnSizing,
    /// Beam sections for the group.
    pub beams: BeamSizing,
}

impl GroupSizing {
    /// Clamps every dimension to be no larger than the group below.
    fn carried_below(self, lower: &GroupSizing) -> GroupSizing {
        GroupSizing {
            columns: ColumnSizing {
                corner_mm: self.columns.corner_mm.min(lower.columns.corner_mm),
                edge_mm: self.columns.edge_mm.min(lower.columns.edge_mm),
                interior_mm: self.columns.interior_mm.min(lower.columns.interior_mm),
            },
            beams: BeamSizing {
                edge_width_mm: self.beams.edge_width_mm.min(lower.beams.edge_width_mm),
                edge_depth_mm: self.beams.edge_depth_mm.min(lower.beams.edge_depth_mm),
                interior_width_mm: self
                    .beams
                    .interior_width_mm
                    .min(lower.beams.interior_width_mm),
                interior_depth_mm: self
                    .beams
                    .interior_depth_mm
                    .min(lower.beams.interior_depth_mm),
            },
        }
    }
}

/// One fully specified, immutable design case.
///
/// The cross-group invariant (no dimension grows from a lower group to an
/// upper group) is enforced at construction by carrying the minimum forward,
/// so every `DesignCase` in circulation satisfies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignCase {
    /// Unique id within a plan; plans carry exactly `0..N-1`.
    pub case_id: u64,
    /// Plan grid and vertical extent.
    pub topology: Topology,
    /// Per-group sizing, bottom to top.
    pub sizing: [GroupSizing; GROUP_COUNT],
    /// Story-to-group partition.
    pub group_mapping: GroupMapping,
}

/// Number of values in a flattened parameter signature.
pub const SIGNATURE_LEN: usize = 5 + 7 * GROUP_COUNT;

impl DesignCase {
    /// Builds a case, enforcing cross-group monotonicity on the sizing.
    pub fn new(
        case_id: u64,
        topology: Topology,
        sizing: [GroupSizing; GROUP_COUNT],
        group_mapping: GroupMapping,
    ) -> Self {
        let bottom = sizing[0];
        let middle = sizing[1].carried_below(&bottom);
        let top = sizing[2].carried_below(&middle);
        Self {
            case_id,
            topology,
            sizing: [bottom, middle, top],
            group_mapping,
        }
    }

    /// Flattened parameter tuple in fixed column order; two cases with equal
    /// signatures describe the same structure regardless of `case_id`.
    pub fn flattened_signature(&self) -> [u32; SIGNATURE_LEN] {
        let mut out = [0u32; SIGNATURE_LEN];
        out[0] = self.topology.story_count;
        out[1] = self.topology.bay_count_x;
        out[2] = self.topology.bay_count_y;
        out[3] = self.topology.bay_span_x_mm;
        out[4] = self.topology.bay_span_y_mm;
        for (idx, group) in self.sizing.iter().enumerate() {
            let base = 5 + idx * 7;
            out[base] = group.columns.corner_mm;
            out[base + 1] = group.columns.edge_mm;
            out[base + 2] = group.columns.interior_mm;
            out[base + 3] = group.beams.edge_width_mm;
            out[base + 4] = group.beams.edge_depth_mm;
            out[base + 5] = group.beams.interior_width_mm;
            out[base + 6] = group.beams.interior_depth_mm;
        }
        out
    }

    /// Sizing set governing the given story number.
    ///
    /// Stories outside every band resolve to the top group, which only
    /// happens for malformed mappings read from legacy plans.
    pub fn sizing_for_story(&self, story: u32) -> &GroupSizing {
        let group = self.group_mapping.group_of(story).unwrap_or(GroupId::Top);
        &self.sizing[group.index()]
    }
}
