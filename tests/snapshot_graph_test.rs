use impactmap::config::{CoreServiceConfig, CoreServiceMatcher, GraphConfig};
use impactmap::core::ImpactError;
use impactmap::graph::GraphBuilder;
use impactmap::io::{RepoSnapshot, SOURCE_EXTENSIONS};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn builder() -> GraphBuilder {
    GraphBuilder::new(
        GraphConfig::default(),
        CoreServiceMatcher::from_config(&CoreServiceConfig::default()).unwrap(),
    )
}

#[test]
fn loads_only_source_files_from_disk() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/app.js", "const util = require('./util');");
    write(dir.path(), "src/util.js", "module.exports = {};");
    write(dir.path(), "README.md", "# readme");
    write(dir.path(), "node_modules/express/index.js", "module.exports = {};");

    let snapshot = RepoSnapshot::load(dir.path(), SOURCE_EXTENSIONS).unwrap();
    assert!(snapshot.contains("src/app.js"));
    assert!(snapshot.contains("src/util.js"));
    assert!(!snapshot.contains("README.md"));
    assert!(!snapshot.contains("node_modules/express/index.js"));
}

#[test]
fn disk_snapshot_builds_a_connected_graph() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "shared/logger.js", "module.exports = console;");
    write(
        dir.path(),
        "orders/service.js",
        "const logger = require('../shared/logger');\nimport { pay } from '../payments/pay';",
    );
    write(dir.path(), "payments/pay.js", "export const pay = () => {};");

    let snapshot = RepoSnapshot::load(dir.path(), SOURCE_EXTENSIONS).unwrap();
    let graph = builder().build(&snapshot).unwrap();

    assert_eq!(graph.module_count(), 3);
    let imports: Vec<_> = graph.imports_of("orders/service.js").collect();
    assert_eq!(imports, vec!["payments/pay.js", "shared/logger.js"]);
    let importers: Vec<_> = graph.importers_of("shared/logger.js").collect();
    assert_eq!(importers, vec!["orders/service.js"]);
}

#[test]
fn undecodable_source_is_a_graph_build_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("bad.js"), [0xff, 0xfe, 0x00, 0x9c]).unwrap();

    let err = RepoSnapshot::load(dir.path(), SOURCE_EXTENSIONS).unwrap_err();
    assert!(matches!(err, ImpactError::GraphBuild { .. }));
}

#[test]
fn import_cycles_survive_the_build() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.js", "const b = require('./b');");
    write(dir.path(), "b.js", "const a = require('./a');");

    let snapshot = RepoSnapshot::load(dir.path(), SOURCE_EXTENSIONS).unwrap();
    let graph = builder().build(&snapshot).unwrap();
    assert_eq!(graph.edge_count(), 2);
}
