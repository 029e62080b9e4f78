//! Shard ("bucket") allocation for large case populations.
//!
//! A bucket is the half-open id interval `[start, start + size)` mapped to a
//! single output directory. Buckets are derived purely from
//! `(case_id, bucket_size, bucket_count)` and never stored; identical inputs
//! always yield identical output.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, FramegenError};

/// Default number of cases per bucket.
pub const DEFAULT_BUCKET_SIZE: u64 = 1000;
/// Default number of pre-declared buckets.
pub const DEFAULT_BUCKET_COUNT: u64 = 30;
/// Directory-name prefix for graph-input shards.
pub const INPUT_BUCKET_PREFIX: &str = "input";
/// Sentinel file marking a fully processed case.
pub const DONE_MARKER_FILENAME: &str = "_DONE.flag";
/// File extension of the per-case graph artifact.
pub const GRAPH_ARTIFACT_EXT: &str = ".npz";

/// Inclusive id range backing one shard directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    /// First case id in the bucket.
    pub start: u64,
    /// Last case id in the bucket (inclusive).
    pub end: u64,
}

impl Bucket {
    /// Display label used in shard directory names, e.g. `"2000-2999"`.
    pub fn label(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

/// Computes the bucket containing `case_id`.
///
/// Fails with a configuration error when the id lies beyond the pre-declared
/// shard space (`case_id / bucket_size >= bucket_count`). Negative ids are
/// unrepresentable by type.
pub fn compute_bucket(
    case_id: u64,
    bucket_size: u64,
    bucket_count: u64,
) -> Result<Bucket, FramegenError> {
    if bucket_size == 0 {
        return Err(FramegenError::Bucket(ErrorInfo::new(
            "bucket-size-zero",
            "bucket_size must be positive",
        )));
    }
    let index = case_id / bucket_size;
    if index >= bucket_count {
        return Err(FramegenError::Bucket(
            ErrorInfo::new(
                "bucket-out-of-range",
                format!(
                    "case_id {case_id} is outside the configured bucket range \
                     ({bucket_count} buckets of size {bucket_size})"
                ),
            )
            .with_context("case_id", case_id.to_string())
            .with_context("bucket_size", bucket_size.to_string())
            .with_context("bucket_count", bucket_count.to_string()),
        ));
    }
    let start = index * bucket_size;
    Ok(Bucket {
        start,
        end: start + bucket_size - 1,
    })
}

/// Enumerates `(start, end)` pairs for every configured bucket.
pub fn bucket_ranges(bucket_size: u64, bucket_count: u64) -> impl Iterator<Item = (u64, u64)> {
    (0..bucket_count).map(move |idx| {
        let start = idx * bucket_size;
        (start, start + bucket_size - 1)
    })
}

/// Returns the shard directory path for a bucket under the given root.
pub fn bucket_dir(root: &Path, prefix: &str, bucket: &Bucket) -> PathBuf {
    root.join(format!("{prefix}{}", bucket.label()))
}

/// Pre-creates every shard directory under `root`.
///
/// Creation is idempotent: directories that already exist are left untouched,
/// so concurrent callers never race each other into failure.
pub fn ensure_bucket_dirs(
    root: &Path,
    prefix: &str,
    bucket_size: u64,
    bucket_count: u64,
) -> Result<Vec<PathBuf>, FramegenError> {
    let mut created = Vec::with_capacity(bucket_count as usize);
    for (start, end) in bucket_ranges(bucket_size, bucket_count) {
        let dir = bucket_dir(root, prefix, &Bucket { start, end });
        fs::create_dir_all(&dir).map_err(|err| {
            FramegenError::Bucket(
                ErrorInfo::new("bucket-mkdir", err.to_string())
                    .with_context("path", dir.display().to_string()),
            )
        })?;
        created.push(dir);
    }
    Ok(created)
}
