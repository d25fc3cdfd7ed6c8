//! Tech tree materialization
//!
//! Once a civilization's traversal is done, its produces-edges are unfolded
//! into a nested tree starting at the civilization's first roster building.
//! The production graph can contain cycles (a research unlocking a building
//! that unlocks the same research line), so the tree is cut at a fixed depth.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Maximum nesting of a materialized tree
pub const MAX_TECH_TREE_DEPTH: usize = 10;

/// Base id -> subtree of everything it produces
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TechTree(pub BTreeMap<String, TechTree>);

impl TechTree {
    /// Unfold the produces graph from `root`
    ///
    /// Re-entering the root below the top level is cut short. That guard
    /// only covers a civilization whose starting unit can be re-produced;
    /// termination in general rests on `max_depth`.
    pub fn build(
        root: &str,
        produces: &BTreeMap<String, BTreeSet<String>>,
        max_depth: usize,
    ) -> Self {
        let mut tree = BTreeMap::new();
        if max_depth > 0 {
            tree.insert(root.to_string(), grow(root, root, produces, 1, max_depth));
        }
        TechTree(tree)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Deepest nesting level, 0 for an empty tree
    pub fn depth(&self) -> usize {
        self.0
            .values()
            .map(|child| 1 + child.depth())
            .max()
            .unwrap_or(0)
    }

    /// Whether `id` appears anywhere in the tree
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id) || self.0.values().any(|child| child.contains(id))
    }

    pub fn get(&self, id: &str) -> Option<&TechTree> {
        self.0.get(id)
    }
}

fn grow(
    node: &str,
    root: &str,
    produces: &BTreeMap<String, BTreeSet<String>>,
    depth: usize,
    max_depth: usize,
) -> TechTree {
    if depth >= max_depth {
        return TechTree::default();
    }

    let children = produces
        .get(node)
        .into_iter()
        .flatten()
        .filter(|child| child.as_str() != root)
        .map(|child| {
            (
                child.clone(),
                grow(child, root, produces, depth + 1, max_depth),
            )
        })
        .collect();

    TechTree(children)
}
