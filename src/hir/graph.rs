//! Import graph over the packages of one load.
//!
//! Only packages that still need checking become nodes; imports of
//! anything else are left to the import resolver.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use crate::project::RawPackage;

#[derive(Debug)]
struct GraphNode {
    raw: RawPackage,
    /// Nodes this one imports that are not checked yet.
    forward: FxHashSet<String>,
    /// Nodes importing this one.
    back: FxHashSet<String>,
}

/// Dependency order for checking, consumed pass by pass.
#[derive(Debug, Default)]
pub struct ImportGraph {
    nodes: BTreeMap<String, GraphNode>,
}

impl ImportGraph {
    /// Wire an edge from every package to each other package whose identity
    /// an import path names, directly or through a vendor directory.
    pub fn build(packages: IndexMap<String, RawPackage>) -> Self {
        let identities: Vec<String> = packages.keys().cloned().collect();
        let mut nodes: BTreeMap<String, GraphNode> = packages
            .into_iter()
            .map(|(identity, raw)| {
                let node = GraphNode {
                    raw,
                    forward: FxHashSet::default(),
                    back: FxHashSet::default(),
                };
                (identity, node)
            })
            .collect();

        let mut edges = Vec::new();
        for (from, node) in &nodes {
            for path in node.raw.imports() {
                let vendored = format!("/vendor/{path}");
                edges.extend(
                    identities
                        .iter()
                        .filter(|to| *to != from && (**to == path || to.ends_with(&vendored)))
                        .map(|to| (from.clone(), to.clone())),
                );
            }
        }
        for (from, to) in edges {
            if let Some(node) = nodes.get_mut(&from) {
                node.forward.insert(to.clone());
            }
            if let Some(node) = nodes.get_mut(&to) {
                node.back.insert(from);
            }
        }
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Remove and return every node without pending imports, sorted by
    /// identity. Empty when the rest of the graph is cyclic.
    pub fn take_leaves(&mut self) -> Vec<RawPackage> {
        let leaves: Vec<String> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.forward.is_empty())
            .map(|(identity, _)| identity.clone())
            .collect();
        leaves
            .into_iter()
            .filter_map(|identity| self.take(&identity))
            .collect()
    }

    /// Remove and return every remaining node, sorted by identity.
    pub fn take_all(&mut self) -> Vec<RawPackage> {
        let nodes = std::mem::take(&mut self.nodes);
        nodes.into_values().map(|node| node.raw).collect()
    }

    fn take(&mut self, identity: &str) -> Option<RawPackage> {
        let node = self.nodes.remove(identity)?;
        for importer in &node.back {
            if let Some(waiting) = self.nodes.get_mut(importer) {
                waiting.forward.remove(identity);
            }
        }
        Some(node.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{LoadConfig, parse_dir};
    use std::fs;
    use std::path::Path;

    fn raw(root: &Path, rel: &str, src: &str) -> (String, RawPackage) {
        let dir = root.join(rel);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("x.go"), src).unwrap();
        let config = LoadConfig::new().with_root(root);
        let pkg = parse_dir(&config, &dir, rel).unwrap().remove(0);
        (pkg.identity.clone(), pkg)
    }

    fn ids(batch: &[RawPackage]) -> Vec<&str> {
        batch.iter().map(|p| p.identity.as_str()).collect()
    }

    #[test]
    fn test_leaves_come_in_dependency_order() {
        let tmp = tempfile::tempdir().unwrap();
        let mut graph = ImportGraph::build(IndexMap::from_iter([
            raw(tmp.path(), "top", "package top\n\nimport \"mid\"\n\nvar X = mid.Y\n"),
            raw(tmp.path(), "mid", "package mid\n\nimport \"low\"\n\nvar Y = low.Z\n"),
            raw(tmp.path(), "low", "package low\n\nvar Z = 1\n"),
            raw(tmp.path(), "alone", "package alone\n"),
        ]));

        assert_eq!(ids(&graph.take_leaves()), vec!["alone", "low"]);
        assert_eq!(ids(&graph.take_leaves()), vec!["mid"]);
        assert_eq!(ids(&graph.take_leaves()), vec!["top"]);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_vendored_identity_is_an_edge() {
        let tmp = tempfile::tempdir().unwrap();
        let mut graph = ImportGraph::build(IndexMap::from_iter([
            raw(tmp.path(), "app", "package app\n\nimport \"dep\"\n\nvar X = dep.Y\n"),
            raw(tmp.path(), "app/vendor/dep", "package dep\n\nvar Y = 1\n"),
        ]));

        assert_eq!(ids(&graph.take_leaves()), vec!["app/vendor/dep"]);
        assert_eq!(ids(&graph.take_leaves()), vec!["app"]);
    }

    #[test]
    fn test_cycle_has_no_leaves() {
        let tmp = tempfile::tempdir().unwrap();
        let mut graph = ImportGraph::build(IndexMap::from_iter([
            raw(tmp.path(), "a", "package a\n\nimport \"b\"\n\nvar X = b.Y\n"),
            raw(tmp.path(), "b", "package b\n\nimport \"a\"\n\nvar Y = a.X\n"),
            raw(tmp.path(), "c", "package c\n\nimport \"a\"\n\nvar Z = a.X\n"),
        ]));

        assert!(graph.take_leaves().is_empty());
        assert_eq!(graph.len(), 3);
        assert_eq!(ids(&graph.take_all()), vec!["a", "b", "c"]);
        assert!(graph.is_empty());
    }
}
