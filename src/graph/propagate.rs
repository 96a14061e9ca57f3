//! Impact propagation: reverse-edge BFS from the changed-file set

use crate::core::{ChangeSet, ImpactEntry};
use crate::graph::DependencyGraph;
use std::collections::BTreeMap;

/// Compute the transitive impact of a change set over reverse dependency
/// edges (from an imported module to its importers).
///
/// Changed files present in the graph seed the traversal at depth 0; files
/// absent from the graph (docs, config) are skipped here and surfaced by the
/// sanity checker. Each reachable module keeps its minimum depth and one
/// witnessing path, ties broken by the lexicographically smallest path.
/// Output is sorted by (depth, module id) and re-running on the same inputs
/// yields an identical sequence.
pub fn propagate(changes: &ChangeSet, graph: &DependencyGraph) -> Vec<ImpactEntry> {
    let mut best: BTreeMap<String, (usize, Vec<String>)> = BTreeMap::new();

    // Seeds in id order; a seed's witnessing path is just itself
    let mut frontier: Vec<(String, Vec<String>)> = changes
        .paths()
        .filter(|path| graph.contains(path))
        .map(|path| (path.to_string(), vec![path.to_string()]))
        .collect();
    for (id, via) in &frontier {
        best.insert(id.clone(), (0, via.clone()));
    }

    // Level-by-level expansion. The frontier stays sorted by witnessing
    // path, so the first discovery of a node is also its lexicographically
    // smallest minimum-depth path; revisits never re-queue.
    let mut depth = 0;
    while !frontier.is_empty() {
        depth += 1;
        let mut next = Vec::new();
        for (id, via) in &frontier {
            for importer in graph.importers_of(id) {
                if best.contains_key(importer) {
                    continue;
                }
                let mut path = via.clone();
                path.push(importer.to_string());
                best.insert(importer.to_string(), (depth, path.clone()));
                next.push((importer.to_string(), path));
            }
        }
        next.sort_by(|a, b| a.1.cmp(&b.1));
        frontier = next;
    }

    let mut entries: Vec<ImpactEntry> = best
        .into_iter()
        .filter_map(|(id, (depth, via_path))| {
            graph.node(&id).map(|module| ImpactEntry {
                module: module.clone(),
                depth,
                via_path,
            })
        })
        .collect();
    entries.sort_by(|a, b| (a.depth, &a.module.id).cmp(&(b.depth, &b.module.id)));
    entries
}
