//! Build report types
//!
//! Collects everything one invocation produced: the resolved graph, the plan
//! and the outcome of every phase.

use super::{BuildPlan, PhaseOutcome, PhaseStatus, ResolvedGraph};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Report of one build invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    /// Manifest the build was read from
    pub manifest: PathBuf,
    /// Resolved dependency graph
    pub graph: ResolvedGraph,
    /// Plan that was executed (None for `resolve`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<BuildPlan>,
    /// Phase outcomes in execution order
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub phases: Vec<PhaseOutcome>,
    /// Warnings collected along the way
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BuildReport {
    /// Creates a report with no phases
    pub fn new(manifest: impl Into<PathBuf>, graph: ResolvedGraph) -> Self {
        let now = Utc::now();
        Self {
            manifest: manifest.into(),
            graph,
            plan: None,
            phases: Vec::new(),
            warnings: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    /// Sets the plan (builder pattern)
    pub fn with_plan(mut self, plan: BuildPlan) -> Self {
        self.plan = Some(plan);
        self
    }

    /// Sets the start time (builder pattern)
    pub fn started(mut self, at: DateTime<Utc>) -> Self {
        self.started_at = at;
        self
    }

    /// Records the phase outcomes and marks the report finished
    pub fn finish(&mut self, phases: Vec<PhaseOutcome>) {
        self.phases = phases;
        self.finished_at = Utc::now();
    }

    /// Returns true if every executed phase succeeded
    pub fn is_success(&self) -> bool {
        self.phases.iter().all(|p| p.status.is_success())
    }

    pub fn failed_phases(&self) -> usize {
        self.phases
            .iter()
            .filter(|p| matches!(p.status, PhaseStatus::Failed { .. }))
            .count()
    }

    pub fn blocked_phases(&self) -> usize {
        self.phases
            .iter()
            .filter(|p| matches!(p.status, PhaseStatus::Blocked { .. }))
            .count()
    }

    /// Total number of tests that ran or were skipped
    pub fn total_tests(&self) -> usize {
        self.phases.iter().map(|p| p.tests.len()).sum()
    }

    pub fn failed_tests(&self) -> usize {
        self.phases.iter().map(|p| p.failed_count()).sum()
    }

    /// Wall-clock duration in milliseconds
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
