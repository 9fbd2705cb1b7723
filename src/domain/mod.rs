//! Core domain models for buildplan
//!
//! This module contains the fundamental types used throughout the application:
//! - Module identifiers and coordinates
//! - Maven-style versions and version constraints
//! - Scopes, phases and goals
//! - Manifest declarations
//! - The resolved graph and the build plan
//! - Phase and test outcomes, and the build report

mod constraint;
mod graph;
mod manifest;
mod module_id;
mod outcome;
mod plan;
mod report;
mod scope;
mod version;

pub use constraint::{Bound, VersionConstraint, VersionRange};
pub use graph::{ResolvedGraph, ResolvedNode, Selection};
pub use manifest::{
    DependencyDeclaration, ImportKind, Manifest, PlatformImport, PluginDeclaration, Repository,
    TestEngine, DEPENDENCY_MANAGEMENT_PLUGIN, SPRING_BOOT_PLUGIN,
};
pub use module_id::{Coordinate, ModuleId};
pub use outcome::{PhaseOutcome, PhaseStatus, TestCase, TestOutcome, TestResult};
pub use plan::{BuildPlan, ModuleMatcher, PhaseRequirement, PlannedPhase};
pub use report::BuildReport;
pub use scope::{EdgeKind, Goal, Phase, Scope};
pub use version::Version;
