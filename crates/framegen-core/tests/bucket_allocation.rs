use framegen_core::{
    bucket_ranges, compute_bucket, ensure_bucket_dirs, FramegenError, INPUT_BUCKET_PREFIX,
};

#[test]
fn bucket_for_mid_range_id() {
    let bucket = compute_bucket(2499, 1000, 30).expect("bucket");
    assert_eq!(bucket.start, 2000);
    assert_eq!(bucket.end, 2999);
    assert_eq!(bucket.label(), "2000-2999");
}

#[test]
fn bucket_for_first_id() {
    let bucket = compute_bucket(0, 1000, 30).expect("bucket");
    assert_eq!((bucket.start, bucket.end), (0, 999));
}

#[test]
fn id_beyond_declared_space_is_a_hard_error() {
    let err = compute_bucket(30000, 1000, 30).expect_err("out of range");
    match err {
        FramegenError::Bucket(info) => assert_eq!(info.code, "bucket-out-of-range"),
        other => panic!("unexpected error family: {other:?}"),
    }
}

#[test]
fn identical_inputs_yield_identical_buckets() {
    let a = compute_bucket(12_345, 1000, 30).expect("bucket");
    let b = compute_bucket(12_345, 1000, 30).expect("bucket");
    assert_eq!(a, b);
}

#[test]
fn ranges_cover_the_whole_space_without_overlap() {
    let ranges: Vec<(u64, u64)> = bucket_ranges(1000, 30).collect();
    assert_eq!(ranges.len(), 30);
    assert_eq!(ranges[0], (0, 999));
    assert_eq!(ranges[29], (29_000, 29_999));
    for pair in ranges.windows(2) {
        assert_eq!(pair[0].1 + 1, pair[1].0);
    }
}

#[test]
fn bucket_dirs_are_created_idempotently() {
    let root = tempfile::tempdir().expect("tempdir");
    let first = ensure_bucket_dirs(root.path(), INPUT_BUCKET_PREFIX, 10, 3).expect("create");
    assert_eq!(first.len(), 3);
    assert!(first.iter().all(|dir| dir.is_dir()));
    // A second pass over existing directories must not fail.
    let second = ensure_bucket_dirs(root.path(), INPUT_BUCKET_PREFIX, 10, 3).expect("recreate");
    assert_eq!(first, second);
}
