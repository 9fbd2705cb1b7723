//! Build planning
//!
//! Orders the phases a goal needs and gives each one the artifacts its
//! scopes make visible, plus the modules it must be able to see.

use crate::domain::{
    BuildPlan, Goal, Manifest, ModuleMatcher, ModuleId, Phase, PhaseRequirement, PlannedPhase,
    ResolvedGraph, TestEngine,
};
use tracing::debug;

/// Builds a fresh plan per invocation
#[derive(Debug, Clone, Default)]
pub struct Planner {
    requirements: Vec<PhaseRequirement>,
}

impl Planner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Planner with the requirements the manifest's test engine implies
    pub fn for_manifest(manifest: &Manifest) -> Self {
        let requirements = manifest
            .test_engine
            .map(engine_requirements)
            .unwrap_or_default();
        Self { requirements }
    }

    /// Add requirements (e.g. from `[[requires]]`)
    pub fn with_requirements(mut self, requirements: Vec<PhaseRequirement>) -> Self {
        self.requirements.extend(requirements);
        self
    }

    pub fn plan(&self, graph: &ResolvedGraph, goal: Goal) -> BuildPlan {
        let phases = goal
            .phases()
            .iter()
            .map(|&phase| {
                let artifacts = graph.artifacts_for(phase);
                let requires: Vec<PhaseRequirement> = self
                    .requirements
                    .iter()
                    .filter(|r| r.phase == phase)
                    .cloned()
                    .collect();
                debug!(phase = %phase, artifacts = artifacts.len(), requires = requires.len(), "planned phase");
                PlannedPhase {
                    phase,
                    artifacts,
                    requires,
                }
            })
            .collect();

        BuildPlan { goal, phases }
    }
}

/// The test engine's own artifacts must be on the test runtime path
pub fn engine_requirements(engine: TestEngine) -> Vec<PhaseRequirement> {
    let module = match engine {
        TestEngine::JUnitPlatform => ModuleMatcher::AnyInGroups(vec![
            "org.junit.jupiter".to_string(),
            "org.junit.platform".to_string(),
        ]),
        TestEngine::JUnit4 => ModuleMatcher::Module(ModuleId::new("junit", "junit")),
        TestEngine::TestNg => ModuleMatcher::Module(ModuleId::new("org.testng", "testng")),
    };
    vec![PhaseRequirement::new(
        Phase::Test,
        module,
        format!("required by test engine {}", engine.display_name()),
    )]
}
