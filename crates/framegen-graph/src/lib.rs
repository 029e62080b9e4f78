#![deny(missing_docs)]
#![doc = "Engine-free graph construction and artifact export for design \
cases: geometry expansion, node dedup, feature matrices and bucketed npz \
containers."]

pub mod artifact;
pub mod builder;
pub mod geometry;

pub use artifact::{artifact_path, export_case_graph, remove_case_artifact, ExportOutcome};
pub use builder::{
    build_case_graph, CaseGraph, EdgeRecord, SkippedMember, EDGE_FEATURE_COUNT,
    EDGE_FEATURE_FIELDS, NODE_FEATURE_COUNT, NODE_FEATURE_FIELDS,
};
pub use geometry::{
    beam_position, column_position, expand_members, Member, MemberKind, NodeKey, PlanPosition,
};
