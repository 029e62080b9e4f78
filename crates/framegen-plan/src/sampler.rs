//! Constrained rejection sampler producing unique design cases.

use std::collections::BTreeSet;

use framegen_core::errors::{ErrorInfo, FramegenError};
use framegen_core::rng::RngHandle;
use framegen_core::SiteSettings;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::case::{
    BeamSizing, ColumnSizing, DesignCase, GroupId, GroupMapping, GroupSizing, Topology,
    GROUP_COUNT,
};

/// Uniform `(min, max, step)` grid for one integer parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridRange {
    /// Smallest admissible value.
    pub min: u32,
    /// Largest admissible value.
    pub max: u32,
    /// Grid increment.
    pub step: u32,
}

impl GridRange {
    /// Draws one value uniformly from the grid.
    fn sample(&self, rng: &mut RngHandle) -> u32 {
        let count = (self.max - self.min) / self.step + 1;
        self.min + self.step * rng.inner_mut().gen_range(0..count)
    }

    /// Rounds to the nearest grid value and clamps into the range.
    fn snap(&self, value: f64) -> u32 {
        let steps = ((value - self.min as f64) / self.step as f64).round();
        let snapped = self.min as i64 + steps as i64 * self.step as i64;
        snapped.clamp(self.min as i64, self.max as i64) as u32
    }

    fn contains_f(&self, value: f64) -> bool {
        value >= self.min as f64 && value <= self.max as f64
    }
}

/// Declared parameter space for the sampler.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignSpace {
    /// Story count grid.
    pub stories: GridRange,
    /// Bay count grid, x direction.
    pub bays_x: GridRange,
    /// Bay count grid, y direction.
    pub bays_y: GridRange,
    /// Bay span grid (mm), x direction.
    pub span_x_mm: GridRange,
    /// Bay span grid (mm), y direction.
    pub span_y_mm: GridRange,
    /// Allowed square column widths (mm).
    pub column_mm: GridRange,
    /// Local allowed beam depths (mm).
    pub beam_depth_mm: GridRange,
    /// Local allowed beam widths (mm).
    pub beam_width_mm: GridRange,
    /// Global beam depth clamp (mm), wider than the local range.
    pub beam_depth_global_mm: (u32, u32),
    /// Global beam width clamp (mm), wider than the local range.
    pub beam_width_global_mm: (u32, u32),
    /// Load combination factor applied to the axial estimate.
    pub load_factor: f64,
    /// Bounded-retry cap for Gaussian resampling.
    pub retry_cap: usize,
}

impl Default for DesignSpace {
    fn default() -> Self {
        Self {
            stories: GridRange {
                min: 4,
                max: 8,
                step: 1,
            },
            bays_x: GridRange {
                min: 5,
                max: 10,
                step: 1,
            },
            bays_y: GridRange {
                min: 3,
                max: 5,
                step: 1,
            },
            span_x_mm: GridRange {
                min: 3600,
                max: 7500,
                step: 300,
            },
            span_y_mm: GridRange {
                min: 3600,
                max: 7500,
                step: 300,
            },
            column_mm: GridRange {
                min: 400,
                max: 800,
                step: 50,
            },
            beam_depth_mm: GridRange {
                min: 400,
                max: 800,
                step: 50,
            },
            beam_width_mm: GridRange {
                min: 150,
                max: 400,
                step: 50,
            },
            beam_depth_global_mm: (300, 900),
            beam_width_global_mm: (120, 450),
            load_factor: 1.25,
            retry_cap: 5000,
        }
    }
}

/// Sampling run parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerConfig {
    /// Number of unique cases requested.
    pub target: usize,
    /// Master seed for the run.
    pub seed: u64,
    /// Optional override for the attempt budget.
    pub max_attempts: Option<usize>,
}

impl SamplerConfig {
    /// Creates a config with the default attempt budget.
    pub fn new(target: usize, seed: u64) -> Self {
        Self {
            target,
            seed,
            max_attempts: None,
        }
    }

    /// Effective attempt budget: `max(20 * target, target + 10)` unless
    /// overridden.
    pub fn effective_max_attempts(&self) -> usize {
        self.max_attempts
            .unwrap_or_else(|| (self.target * 20).max(self.target + 10))
    }
}

/// Result of one sampling run.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledPlan {
    /// Accepted cases with `case_id = 0..len-1` in acceptance order.
    pub cases: Vec<DesignCase>,
    /// Total structural samples drawn, including rejected duplicates.
    pub attempts: usize,
    /// True when the attempt budget ran out before reaching the target.
    /// A soft failure: the smaller set is still valid.
    pub exhausted: bool,
}

/// Samples `config.target` unique design cases from `space`.
///
/// Deduplication compares each case's full flattened parameter tuple against
/// every previously accepted case in this run; duplicates are discarded and
/// do not consume a `case_id`. Exhausting the attempt budget returns the
/// partial set with `exhausted = true` rather than an error.
pub fn sample_plan(
    space: &DesignSpace,
    settings: &SiteSettings,
    config: &SamplerConfig,
) -> Result<SampledPlan, FramegenError> {
    let mut rng = RngHandle::from_seed(config.seed);
    let budget = config.effective_max_attempts();
    let mut seen: BTreeSet<Vec<u32>> = BTreeSet::new();
    let mut cases = Vec::with_capacity(config.target);
    let mut attempts = 0usize;

    while cases.len() < config.target && attempts < budget {
        attempts += 1;
        let topology = sample_topology(space, &mut rng);
        let mapping = GroupMapping::split(topology.story_count);
        let sizing = sample_sizing(space, settings, &topology, &mapping, &mut rng)?;
        let case = DesignCase::new(cases.len() as u64, topology, sizing, mapping);
        if !seen.insert(case.flattened_signature().to_vec()) {
            continue;
        }
        cases.push(case);
    }

    let exhausted = cases.len() < config.target;
    Ok(SampledPlan {
        cases,
        attempts,
        exhausted,
    })
}

fn sample_topology(space: &DesignSpace, rng: &mut RngHandle) -> Topology {
    Topology {
        story_count: space.stories.sample(rng),
        bay_count_x: space.bays_x.sample(rng),
        bay_count_y: space.bays_y.sample(rng),
        bay_span_x_mm: space.span_x_mm.sample(rng),
        bay_span_y_mm: space.span_y_mm.sample(rng),
    }
}

fn sample_sizing(
    space: &DesignSpace,
    settings: &SiteSettings,
    topology: &Topology,
    mapping: &GroupMapping,
    rng: &mut RngHandle,
) -> Result<[GroupSizing; GROUP_COUNT], FramegenError> {
    let mut sizing = [GroupSizing {
        columns: ColumnSizing {
            corner_mm: 0,
            edge_mm: 0,
            interior_mm: 0,
        },
        beams: BeamSizing {
            edge_width_mm: 0,
            edge_depth_mm: 0,
            interior_width_mm: 0,
            interior_depth_mm: 0,
        },
    }; GROUP_COUNT];

    for group in GroupId::ALL {
        let columns = size_columns(space, settings, topology, mapping, group);
        let beams = size_beams(space, topology, rng)?;
        sizing[group.index()] = GroupSizing { columns, beams };
    }
    // Cross-group monotonicity is applied by DesignCase::new, which carries
    // the minimum forward from the group below at construction.
    Ok(sizing)
}

/// Baseline square column width from the group's axial load estimate.
///
/// The interior-column tributary footprint is one bay in each direction;
/// the load is the uniform dead+live surface load times the number of
/// stories the group carries (its lowest story through the roof).
fn size_columns(
    space: &DesignSpace,
    settings: &SiteSettings,
    topology: &Topology,
    mapping: &GroupMapping,
    group: GroupId,
) -> ColumnSizing {
    let tributary_m2 =
        (topology.bay_span_x_mm as f64 / 1000.0) * (topology.bay_span_y_mm as f64 / 1000.0);
    let surface_kn_m2 = settings.loads.dead_kn_m2 + settings.loads.live_kn_m2;
    let carried = mapping.stories_carried(group, topology.story_count) as f64;
    let axial_n = surface_kn_m2 * tributary_m2 * carried * 1000.0;

    let width = (space.load_factor * axial_n / (0.75 * settings.materials.fc_mpa)).sqrt();
    let baseline = space.column_mm.snap(width);

    let mut variants = [
        space.column_mm.snap(baseline as f64 * 0.9),
        baseline,
        space.column_mm.snap(baseline as f64 * 1.1),
    ];
    // Rounding can reorder the variants; corner <= edge <= interior must hold.
    variants.sort_unstable();
    ColumnSizing {
        corner_mm: variants[0],
        edge_mm: variants[1],
        interior_mm: variants[2],
    }
}

fn size_beams(
    space: &DesignSpace,
    topology: &Topology,
    rng: &mut RngHandle,
) -> Result<BeamSizing, FramegenError> {
    // Sizing is per group, not per direction; the governing span is the
    // larger total plan dimension, so depth/48 tracks bay-span/12 for
    // typical bay counts and stays inside the local depth grid.
    let total_x = (topology.bay_count_x * topology.bay_span_x_mm) as f64;
    let total_y = (topology.bay_count_y * topology.bay_span_y_mm) as f64;
    let span = total_x.max(total_y);

    let interior_depth = draw_section(
        rng,
        span / 48.0,
        span / 240.0,
        &space.beam_depth_mm,
        space.beam_depth_global_mm,
        space.retry_cap,
    )?;
    let interior_width = draw_beam_width(space, interior_depth, rng)?;

    // Edge members never exceed the interior section of the same group.
    let edge_depth = draw_section(
        rng,
        span / 48.0,
        span / 240.0,
        &space.beam_depth_mm,
        space.beam_depth_global_mm,
        space.retry_cap,
    )?
    .min(interior_depth);
    let edge_width = draw_beam_width(space, edge_depth, rng)?.min(interior_width);

    Ok(BeamSizing {
        edge_width_mm: edge_width,
        edge_depth_mm: edge_depth,
        interior_width_mm: interior_width,
        interior_depth_mm: interior_depth,
    })
}

fn draw_beam_width(
    space: &DesignSpace,
    depth_mm: u32,
    rng: &mut RngHandle,
) -> Result<u32, FramegenError> {
    let mean = 5.0 * depth_mm as f64 / 12.0;
    let width = draw_section(
        rng,
        mean,
        depth_mm as f64 / 12.0,
        &space.beam_width_mm,
        space.beam_width_global_mm,
        space.retry_cap,
    )?;
    Ok(width.min(depth_mm))
}

/// Draws one dimension from a Gaussian with bounded retries.
///
/// Resamples until the draw lands inside the local grid range; once the
/// retry cap is spent the last draw is clamped instead. The global clamp is
/// applied last, after snapping to the grid.
fn draw_section(
    rng: &mut RngHandle,
    mean: f64,
    sigma: f64,
    local: &GridRange,
    global: (u32, u32),
    retry_cap: usize,
) -> Result<u32, FramegenError> {
    let dist = Normal::new(mean, sigma).map_err(|err| {
        FramegenError::Sampler(
            ErrorInfo::new("gaussian-params", err.to_string())
                .with_context("mean", mean.to_string())
                .with_context("sigma", sigma.to_string()),
        )
    })?;

    let mut value = dist.sample(rng.inner_mut());
    for _ in 0..retry_cap {
        if local.contains_f(value) {
            return Ok(local.snap(value));
        }
        value = dist.sample(rng.inner_mut());
    }
    // Retries spent: fall back to clamping the last draw. Rounded to the
    // grid step first, then held inside the wider global range.
    let steps = (value / local.step as f64).round() as i64;
    let rounded = (steps * local.step as i64).max(0) as u32;
    Ok(rounded.clamp(global.0, global.1))
}
