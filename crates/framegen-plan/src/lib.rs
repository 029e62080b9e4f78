#![deny(missing_docs)]
#![doc = "Design-case model, constrained rejection sampler and plan store \
for the framegen dataset pipeline."]

pub mod case;
pub mod sampler;
pub mod store;

pub use case::{
    BeamSizing, ColumnSizing, DesignCase, GroupId, GroupMapping, GroupSizing, StoryBand, Topology,
    GROUP_COUNT, SIGNATURE_LEN,
};
pub use sampler::{sample_plan, DesignSpace, GridRange, SampledPlan, SamplerConfig};
pub use store::{
    find_plan_file, read_plan, validate_plan, write_plan, PlanPaths, PLAN_CSV_HEADERS,
};
