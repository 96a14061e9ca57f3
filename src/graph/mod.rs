//! Module dependency graph built from import relationships

pub mod builder;
pub mod imports;
pub mod propagate;

pub use builder::GraphBuilder;
pub use propagate::propagate;

use crate::core::{GraphSummary, ModuleNode};
use std::collections::{BTreeMap, BTreeSet};

/// Directed graph of intra-repository module dependencies
///
/// Edges point importer → imported; parallel edges collapse and self-edges
/// are rejected. Cycles are legal and never break traversal. Adjacency is
/// kept in ordered maps so iteration is deterministic.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: BTreeMap<String, ModuleNode>,
    forward: BTreeMap<String, BTreeSet<String>>,
    reverse: BTreeMap<String, BTreeSet<String>>,
    unresolved_imports: usize,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module node; idempotent, keeps an existing core flag
    pub fn add_node(&mut self, id: impl Into<String>, is_core_service: bool) {
        let id = id.into();
        self.nodes.entry(id.clone()).or_insert(ModuleNode {
            id,
            is_core_service,
        });
    }

    /// Add an importer → imported edge; both endpoints must already exist
    ///
    /// Returns false for self-edges and duplicate edges.
    pub fn add_edge(&mut self, importer: &str, imported: &str) -> bool {
        if importer == imported {
            return false;
        }
        if !self.nodes.contains_key(importer) || !self.nodes.contains_key(imported) {
            return false;
        }
        let inserted = self
            .forward
            .entry(importer.to_string())
            .or_default()
            .insert(imported.to_string());
        if inserted {
            self.reverse
                .entry(imported.to_string())
                .or_default()
                .insert(importer.to_string());
        }
        inserted
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&ModuleNode> {
        self.nodes.get(id)
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleNode> {
        self.nodes.values()
    }

    /// Modules that import `id`, in id order
    pub fn importers_of(&self, id: &str) -> impl Iterator<Item = &str> {
        self.reverse
            .get(id)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Modules that `id` imports, in id order
    pub fn imports_of(&self, id: &str) -> impl Iterator<Item = &str> {
        self.forward
            .get(id)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    pub fn module_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.forward.values().map(BTreeSet::len).sum()
    }

    /// Package or otherwise unresolvable imports skipped during the build
    pub fn unresolved_imports(&self) -> usize {
        self.unresolved_imports
    }

    pub(crate) fn record_unresolved(&mut self, count: usize) {
        self.unresolved_imports += count;
    }

    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            module_count: self.module_count(),
            edge_count: self.edge_count(),
            unresolved_imports: self.unresolved_imports,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_self_edges() {
        let mut graph = DependencyGraph::new();
        graph.add_node("a.js", false);
        assert!(!graph.add_edge("a.js", "a.js"));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn collapses_parallel_edges() {
        let mut graph = DependencyGraph::new();
        graph.add_node("a.js", false);
        graph.add_node("b.js", false);
        assert!(graph.add_edge("a.js", "b.js"));
        assert!(!graph.add_edge("a.js", "b.js"));
        assert_eq!(graph.edge_count(), 1);
        let importers: Vec<_> = graph.importers_of("b.js").collect();
        assert_eq!(importers, vec!["a.js"]);
    }

    #[test]
    fn keeps_existing_core_flag() {
        let mut graph = DependencyGraph::new();
        graph.add_node("a.js", true);
        graph.add_node("a.js", false);
        assert!(graph.node("a.js").unwrap().is_core_service);
    }
}
