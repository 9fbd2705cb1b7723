//! The resolved dependency graph

use super::{Coordinate, ModuleId, Phase, Scope, Version};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Why a version was selected for a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Selection {
    /// Only one request, taken as-is
    Requested,
    /// Pinned by a BOM/platform import
    Pinned { bom: Coordinate },
    /// Highest of several requested versions
    Highest { candidates: Vec<Version> },
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Requested => write!(f, "requested"),
            Selection::Pinned { bom } => write!(f, "pinned by {}", bom),
            Selection::Highest { candidates } => {
                let list: Vec<String> = candidates.iter().map(|v| v.to_string()).collect();
                write!(f, "highest of {}", list.join(", "))
            }
        }
    }
}

/// A module in the resolved graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedNode {
    /// The single chosen version
    pub version: Version,
    /// Why this version was chosen
    pub selection: Selection,
    /// Scopes through which the module is reachable
    pub scopes: BTreeSet<Scope>,
    /// True if declared directly in the manifest
    pub direct: bool,
    /// Modules this one depends on (after selection)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub dependencies: Vec<ModuleId>,
}

impl ResolvedNode {
    /// Returns true if the node is visible in the phase through any of its scopes
    pub fn is_visible_in(&self, phase: Phase) -> bool {
        self.scopes.iter().any(|s| s.is_visible_in(phase))
    }
}

/// Deduplicated mapping from module id to one resolved version.
/// An id can only ever appear once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedGraph {
    nodes: BTreeMap<ModuleId, ResolvedNode>,
}

impl ResolvedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the node for an id
    pub fn insert(&mut self, id: ModuleId, node: ResolvedNode) {
        self.nodes.insert(id, node);
    }

    pub fn get(&self, id: &ModuleId) -> Option<&ResolvedNode> {
        self.nodes.get(id)
    }

    /// Returns the resolved version of a module
    pub fn version_of(&self, id: &ModuleId) -> Option<&Version> {
        self.nodes.get(id).map(|n| &n.version)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates nodes in id order
    pub fn iter(&self) -> impl Iterator<Item = (&ModuleId, &ResolvedNode)> {
        self.nodes.iter()
    }

    /// All resolved coordinates in id order
    pub fn coordinates(&self) -> Vec<Coordinate> {
        self.nodes
            .iter()
            .map(|(id, node)| Coordinate::new(id.clone(), node.version.clone()))
            .collect()
    }

    /// Coordinates visible in a phase, in id order
    pub fn artifacts_for(&self, phase: Phase) -> Vec<Coordinate> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.is_visible_in(phase))
            .map(|(id, node)| Coordinate::new(id.clone(), node.version.clone()))
            .collect()
    }

    /// Number of direct dependencies
    pub fn direct_count(&self) -> usize {
        self.nodes.values().filter(|n| n.direct).count()
    }
}
