#![deny(missing_docs)]
#![doc = "Core types for the framegen parametric frame dataset pipeline: \
structured errors, deterministic RNG, site configuration, and shard \
(bucket) allocation."]

pub mod bucket;
pub mod config;
pub mod errors;
pub mod rng;

pub use bucket::{
    bucket_dir, bucket_ranges, compute_bucket, ensure_bucket_dirs, Bucket, DEFAULT_BUCKET_COUNT,
    DEFAULT_BUCKET_SIZE, DONE_MARKER_FILENAME, GRAPH_ARTIFACT_EXT, INPUT_BUCKET_PREFIX,
};
pub use config::{LoadSettings, MaterialSettings, SeismicSettings, SiteSettings};
pub use errors::{ErrorInfo, FramegenError};
pub use rng::{derive_substream_seed, RngHandle};
