//! Build plan types

use super::{Coordinate, Goal, ModuleId, Phase};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Matches the module a phase requires
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleMatcher {
    /// An exact `group:artifact`
    Module(ModuleId),
    /// Any artifact in one of the groups
    AnyInGroups(Vec<String>),
}

impl ModuleMatcher {
    /// Parses `group:artifact`, or `group:*` for any artifact in the group
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.trim().strip_suffix(":*") {
            Some(group) if !group.is_empty() && !group.contains(':') => {
                Ok(ModuleMatcher::AnyInGroups(vec![group.to_string()]))
            }
            _ => s.parse().map(ModuleMatcher::Module),
        }
    }

    pub fn matches(&self, id: &ModuleId) -> bool {
        match self {
            ModuleMatcher::Module(wanted) => wanted == id,
            ModuleMatcher::AnyInGroups(groups) => groups.iter().any(|g| *g == id.group),
        }
    }
}

impl fmt::Display for ModuleMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleMatcher::Module(id) => write!(f, "{}", id),
            ModuleMatcher::AnyInGroups(groups) => {
                let list: Vec<String> = groups.iter().map(|g| format!("{}:*", g)).collect();
                write!(f, "{}", list.join(" | "))
            }
        }
    }
}

/// A module that must be visible to a phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseRequirement {
    pub phase: Phase,
    pub module: ModuleMatcher,
    /// Where the requirement came from (e.g., "test engine JUnit Platform")
    pub reason: String,
}

impl PhaseRequirement {
    pub fn new(phase: Phase, module: ModuleMatcher, reason: impl Into<String>) -> Self {
        Self {
            phase,
            module,
            reason: reason.into(),
        }
    }

    /// Returns true if any of the artifacts satisfies the requirement
    pub fn is_satisfied_by(&self, artifacts: &[Coordinate]) -> bool {
        artifacts.iter().any(|c| self.module.matches(&c.id))
    }
}

/// One phase of the build plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedPhase {
    pub phase: Phase,
    /// Artifacts visible to this phase, in id order
    pub artifacts: Vec<Coordinate>,
    /// Modules this phase needs to see
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub requires: Vec<PhaseRequirement>,
}

impl PlannedPhase {
    /// Returns true if the module is on this phase's artifact set
    pub fn contains(&self, id: &ModuleId) -> bool {
        self.artifacts.iter().any(|c| &c.id == id)
    }
}

/// Ordered list of phases for one build invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPlan {
    pub goal: Goal,
    pub phases: Vec<PlannedPhase>,
}

impl BuildPlan {
    pub fn phase(&self, phase: Phase) -> Option<&PlannedPhase> {
        self.phases.iter().find(|p| p.phase == phase)
    }
}
