use std::fs::File;
use std::io::Read;

use framegen_core::SiteSettings;
use framegen_graph::{artifact_path, build_case_graph, export_case_graph, remove_case_artifact};
use framegen_plan::{
    BeamSizing, ColumnSizing, DesignCase, GroupMapping, GroupSizing, Topology,
};

fn fixture_case(case_id: u64) -> DesignCase {
    let topology = Topology {
        story_count: 2,
        bay_count_x: 1,
        bay_count_y: 1,
        bay_span_x_mm: 4000,
        bay_span_y_mm: 4000,
    };
    let sizing = GroupSizing {
        columns: ColumnSizing {
            corner_mm: 400,
            edge_mm: 450,
            interior_mm: 500,
        },
        beams: BeamSizing {
            edge_width_mm: 200,
            edge_depth_mm: 400,
            interior_width_mm: 250,
            interior_depth_mm: 500,
        },
    };
    DesignCase::new(case_id, topology, [sizing; 3], GroupMapping::split(2))
}

#[test]
fn export_lands_in_the_case_bucket() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = SiteSettings::default();
    let graph = build_case_graph(&fixture_case(2499), &settings);

    let outcome = export_case_graph(&graph, &settings, dir.path(), 1000, 30).expect("export");
    assert!(!outcome.already_existed);
    assert_eq!(
        outcome.path,
        dir.path().join("input2000-2999").join("case_2499.npz")
    );
    assert!(outcome.path.is_file());
    assert_eq!(
        outcome.path,
        artifact_path(dir.path(), 2499, 1000, 30).expect("path")
    );
}

#[test]
fn existing_artifact_is_never_rewritten() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = SiteSettings::default();
    let graph = build_case_graph(&fixture_case(7), &settings);

    let first = export_case_graph(&graph, &settings, dir.path(), 1000, 30).expect("export");
    let stamp = std::fs::metadata(&first.path).expect("meta").modified().expect("mtime");

    let second = export_case_graph(&graph, &settings, dir.path(), 1000, 30).expect("export");
    assert!(second.already_existed);
    assert_eq!(second.path, first.path);
    let stamp_after = std::fs::metadata(&second.path)
        .expect("meta")
        .modified()
        .expect("mtime");
    assert_eq!(stamp, stamp_after);
}

#[test]
fn probing_the_artifact_path_is_equivalent_to_exporting() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = SiteSettings::default();

    // A file already sitting at the computed path short-circuits the export,
    // so callers may probe the path first and skip graph construction
    // entirely on resumed runs.
    let path = artifact_path(dir.path(), 7, 1000, 30).expect("path");
    std::fs::create_dir_all(path.parent().expect("bucket dir")).expect("mkdir");
    std::fs::write(&path, b"sentinel").expect("pre-existing artifact");

    let graph = build_case_graph(&fixture_case(7), &settings);
    let outcome = export_case_graph(&graph, &settings, dir.path(), 1000, 30).expect("export");
    assert!(outcome.already_existed);
    assert_eq!(outcome.path, path);
    assert_eq!(std::fs::read(&path).expect("read"), b"sentinel");
}

#[test]
fn container_holds_arrays_aliases_and_meta() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = SiteSettings::default();
    let graph = build_case_graph(&fixture_case(7), &settings);
    let outcome = export_case_graph(&graph, &settings, dir.path(), 1000, 30).expect("export");

    let file = File::open(&outcome.path).expect("open");
    let mut archive = zip::ZipArchive::new(file).expect("zip");
    let mut names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).expect("entry").name().to_string())
        .collect();
    names.sort();
    assert_eq!(
        names,
        [
            "edge_attr.npy",
            "edge_features.npy",
            "edge_index.npy",
            "meta.json",
            "node_features.npy",
            "x.npy",
        ]
    );

    let mut node_entry = archive.by_name("node_features.npy").expect("entry");
    let mut bytes = Vec::new();
    node_entry.read_to_end(&mut bytes).expect("read");
    drop(node_entry);
    assert_eq!(&bytes[..6], b"\x93NUMPY");
    assert_eq!((bytes[6], bytes[7]), (1, 0));
    let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    assert_eq!((10 + header_len) % 64, 0);
    let header = std::str::from_utf8(&bytes[10..10 + header_len]).expect("utf8 header");
    assert!(header.contains("'descr': '<f4'"));
    assert!(header.contains("'fortran_order': False"));
    assert!(header.contains(&format!("({}, 8)", graph.node_count())));
    // f32 payload matches the declared shape exactly.
    assert_eq!(bytes.len() - 10 - header_len, graph.node_count() * 8 * 4);

    let mut index_entry = archive.by_name("edge_index.npy").expect("entry");
    let mut bytes = Vec::new();
    index_entry.read_to_end(&mut bytes).expect("read");
    drop(index_entry);
    let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    let header = std::str::from_utf8(&bytes[10..10 + header_len]).expect("utf8 header");
    assert!(header.contains("'descr': '<i8'"));
    assert!(header.contains(&format!("(2, {})", graph.edge_count())));

    let mut meta_entry = archive.by_name("meta.json").expect("entry");
    let mut meta_text = String::new();
    meta_entry.read_to_string(&mut meta_text).expect("read");
    let meta: serde_json::Value = serde_json::from_str(&meta_text).expect("json");
    assert_eq!(meta["case_id"], 7);
    assert_eq!(meta["bucket"], "0-999");
    assert_eq!(meta["feature_fields"]["node"][0], "F");
    assert_eq!(
        meta["node_name_to_index"].as_object().expect("map").len(),
        graph.node_count()
    );
    assert_eq!(
        meta["edge_names"].as_array().expect("names").len(),
        graph.edge_count()
    );
}

#[test]
fn csv_companions_align_with_the_graph() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = SiteSettings::default();
    let graph = build_case_graph(&fixture_case(7), &settings);
    let outcome = export_case_graph(&graph, &settings, dir.path(), 1000, 30).expect("export");

    let nodes_csv = outcome.path.with_file_name("case_7_nodes.csv");
    let edges_csv = outcome.path.with_file_name("case_7_edges.csv");
    let mut nodes = csv::Reader::from_path(&nodes_csv).expect("nodes csv");
    assert_eq!(
        nodes.headers().expect("headers").iter().take(2).collect::<Vec<_>>(),
        ["node_id", "name"]
    );
    assert_eq!(nodes.records().count(), graph.node_count());
    let mut edges = csv::Reader::from_path(&edges_csv).expect("edges csv");
    assert_eq!(edges.records().count(), graph.edge_count());
}

#[test]
fn removal_clears_artifact_and_companions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = SiteSettings::default();
    let graph = build_case_graph(&fixture_case(7), &settings);
    let outcome = export_case_graph(&graph, &settings, dir.path(), 1000, 30).expect("export");

    assert!(remove_case_artifact(dir.path(), 7, 1000, 30).expect("remove"));
    assert!(!outcome.path.exists());
    assert!(!outcome.path.with_file_name("case_7_nodes.csv").exists());
    // Second removal is a no-op.
    assert!(!remove_case_artifact(dir.path(), 7, 1000, 30).expect("remove"));
}
