//! Parallel construction of the dependency graph from a repository snapshot

use crate::config::{CoreServiceMatcher, GraphConfig};
use crate::core::{ImpactError, Result};
use crate::graph::imports::{extract_import_specifiers, is_relative, resolve_relative};
use crate::graph::DependencyGraph;
use crate::io::RepoSnapshot;
use rayon::prelude::*;
use std::collections::BTreeSet;

/// Builds a [`DependencyGraph`] from a snapshot
///
/// Per-file import extraction runs across a bounded rayon pool; node and
/// edge assembly is serialized afterwards so the accumulation needs no
/// locking. The graph is rebuilt fresh per analysis and never persisted.
pub struct GraphBuilder {
    config: GraphConfig,
    core_matcher: CoreServiceMatcher,
}

impl GraphBuilder {
    pub fn new(config: GraphConfig, core_matcher: CoreServiceMatcher) -> Self {
        Self {
            config,
            core_matcher,
        }
    }

    pub fn build(&self, snapshot: &RepoSnapshot) -> Result<DependencyGraph> {
        let extracted = self.extract_parallel(snapshot)?;

        let paths: BTreeSet<String> =
            snapshot.files().iter().map(|f| f.path.clone()).collect();
        let mut graph = DependencyGraph::new();

        // Every source file is a node, even when isolated
        for path in &paths {
            graph.add_node(path.clone(), self.core_matcher.is_core(path));
        }

        let mut unresolved = 0;
        for (importer, specifiers) in extracted {
            for spec in specifiers {
                match resolve_relative(&importer, &spec, &paths, &self.config.extensions) {
                    Some(target) => {
                        graph.add_edge(&importer, &target);
                    }
                    None => {
                        if is_relative(&spec) {
                            log::debug!("Unresolved relative import {spec} in {importer}");
                        }
                        unresolved += 1;
                    }
                }
            }
        }
        graph.record_unresolved(unresolved);

        log::debug!(
            "Built dependency graph: {} modules, {} edges, {} unresolved imports",
            graph.module_count(),
            graph.edge_count(),
            graph.unresolved_imports()
        );
        Ok(graph)
    }

    /// Extract import specifiers per file on a pool bounded by the configured
    /// thread count; no file's extraction depends on another's.
    fn extract_parallel(&self, snapshot: &RepoSnapshot) -> Result<Vec<(String, Vec<String>)>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .map_err(|e| ImpactError::Configuration(format!("worker pool: {e}")))?;

        Ok(pool.install(|| {
            snapshot
                .files()
                .par_iter()
                .map(|file| (file.path.clone(), extract_import_specifiers(&file.content)))
                .collect()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreServiceConfig;

    fn builder_with_core(patterns: &[&str]) -> GraphBuilder {
        let core = CoreServiceConfig {
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        };
        GraphBuilder::new(
            GraphConfig::default(),
            CoreServiceMatcher::from_config(&core).unwrap(),
        )
    }

    #[test]
    fn builds_edges_from_relative_imports() {
        let snapshot = RepoSnapshot::from_files(vec![
            (
                "orders/handler.js".to_string(),
                "const pay = require('../payments/charge');".to_string(),
            ),
            ("payments/charge.js".to_string(), String::new()),
        ]);
        let graph = builder_with_core(&[]).build(&snapshot).unwrap();
        let imports: Vec<_> = graph.imports_of("orders/handler.js").collect();
        assert_eq!(imports, vec!["payments/charge.js"]);
    }

    #[test]
    fn package_imports_are_counted_not_added() {
        let snapshot = RepoSnapshot::from_files(vec![(
            "app.js".to_string(),
            "const express = require('express');".to_string(),
        )]);
        let graph = builder_with_core(&[]).build(&snapshot).unwrap();
        assert_eq!(graph.module_count(), 1);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.unresolved_imports(), 1);
    }

    #[test]
    fn isolated_file_still_becomes_a_node() {
        let snapshot =
            RepoSnapshot::from_files(vec![("lonely.js".to_string(), "let x = 1;".to_string())]);
        let graph = builder_with_core(&[]).build(&snapshot).unwrap();
        assert!(graph.contains("lonely.js"));
    }

    #[test]
    fn core_flag_comes_from_matcher() {
        let snapshot = RepoSnapshot::from_files(vec![
            ("payment-service/app.js".to_string(), String::new()),
            ("docs-site/app.js".to_string(), String::new()),
        ]);
        let graph = builder_with_core(&["payment-service/**"]).build(&snapshot).unwrap();
        assert!(graph.node("payment-service/app.js").unwrap().is_core_service);
        assert!(!graph.node("docs-site/app.js").unwrap().is_core_service);
    }
}
