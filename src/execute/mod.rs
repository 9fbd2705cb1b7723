//! Build plan execution
//!
//! Phases run in plan order. A phase whose required module is not visible
//! fails on its own; phases that depend on it are reported as blocked while
//! independent phases still run. The test phase discovers and runs tests,
//! running every test even after a failure.

mod discovery;
mod runner;

pub use discovery::{discover_tests, tests_in_file};
pub use runner::{CommandTestRunner, TestRunner, CLASSPATH_ENV};

use crate::domain::{
    BuildPlan, Phase, PhaseOutcome, PhaseStatus, PlannedPhase, TestEngine, TestResult,
};
use crate::error::PhaseError;
use crate::progress::Progress;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs build plans for one project
pub struct Executor<'a> {
    project_dir: PathBuf,
    source_dirs: Vec<PathBuf>,
    engine: TestEngine,
    runner: &'a dyn TestRunner,
}

impl<'a> Executor<'a> {
    pub fn new(project_dir: impl Into<PathBuf>, runner: &'a dyn TestRunner) -> Self {
        Self {
            project_dir: project_dir.into(),
            source_dirs: vec![PathBuf::from("src/test/java"), PathBuf::from("src/test/kotlin")],
            engine: TestEngine::JUnitPlatform,
            runner,
        }
    }

    /// Test source roots, relative to the project directory
    pub fn with_source_dirs(mut self, source_dirs: Vec<PathBuf>) -> Self {
        self.source_dirs = source_dirs;
        self
    }

    /// Engine whose annotations mark tests (JUnit Platform when unset)
    pub fn with_engine(mut self, engine: Option<TestEngine>) -> Self {
        if let Some(engine) = engine {
            self.engine = engine;
        }
        self
    }

    /// Run every phase of the plan
    pub fn execute(&self, plan: &BuildPlan, progress: &mut Progress) -> Vec<PhaseOutcome> {
        let mut statuses: BTreeMap<Phase, bool> = BTreeMap::new();
        let mut outcomes = Vec::with_capacity(plan.phases.len());

        for planned in &plan.phases {
            let phase = planned.phase;
            let blocker = phase
                .depends_on()
                .iter()
                .find(|dep| statuses.get(*dep) == Some(&false))
                .copied();

            let outcome = match blocker {
                Some(by) => {
                    warn!(phase = %phase, blocked_by = %by, "phase blocked");
                    PhaseOutcome::new(phase, PhaseStatus::Blocked { by }, planned.artifacts.len())
                }
                None => self.run_phase(planned, progress),
            };

            statuses.insert(phase, outcome.status.is_success());
            outcomes.push(outcome);
        }

        outcomes
    }

    fn run_phase(&self, planned: &PlannedPhase, progress: &mut Progress) -> PhaseOutcome {
        let phase = planned.phase;
        let artifact_count = planned.artifacts.len();

        if let Err(e) = check_requirements(planned) {
            warn!(phase = %phase, error = %e, "phase failed");
            return PhaseOutcome::new(phase, failed(e), artifact_count);
        }

        if phase != Phase::Test {
            debug!(phase = %phase, artifacts = artifact_count, "phase validated");
            return PhaseOutcome::new(phase, PhaseStatus::Succeeded, artifact_count);
        }

        match self.run_tests(planned, progress) {
            Ok(results) => {
                let failed_count = results.iter().filter(|r| r.outcome.is_failed()).count();
                let status = if failed_count == 0 {
                    PhaseStatus::Succeeded
                } else {
                    failed(PhaseError::TestFailures {
                        failed: failed_count,
                        total: results.len(),
                    })
                };
                PhaseOutcome::new(phase, status, artifact_count).with_tests(results)
            }
            Err(e) => PhaseOutcome::new(phase, failed(e), artifact_count),
        }
    }

    fn run_tests(
        &self,
        planned: &PlannedPhase,
        progress: &mut Progress,
    ) -> Result<Vec<TestResult>, PhaseError> {
        let tests = discover_tests(
            &self.project_dir,
            &self.source_dirs,
            self.engine.test_annotations(),
        )?;
        info!(tests = tests.len(), engine = self.engine.display_name(), "discovered tests");

        progress.start(tests.len() as u64, "Running tests");
        let mut results = Vec::with_capacity(tests.len());
        for test in tests {
            progress.set_message(&test.id());
            let started = Instant::now();
            let outcome = self.runner.run(&test, &planned.artifacts);
            let duration_ms = started.elapsed().as_millis() as u64;
            if outcome.is_failed() {
                warn!(test = %test, %outcome, "test failed");
            } else {
                debug!(test = %test, %outcome, duration_ms, "test finished");
            }
            results.push(TestResult {
                test,
                outcome,
                duration_ms,
            });
            progress.inc();
        }
        progress.finish_and_clear();

        Ok(results)
    }
}

fn failed(error: PhaseError) -> PhaseStatus {
    PhaseStatus::Failed {
        error: error.to_string(),
    }
}

/// Every requirement must be met by the phase's visible artifacts
///
/// All unmet requirements are reported together.
pub fn check_requirements(planned: &PlannedPhase) -> Result<(), PhaseError> {
    let unmet: Vec<_> = planned
        .requires
        .iter()
        .filter(|r| !r.is_satisfied_by(&planned.artifacts))
        .collect();
    if unmet.is_empty() {
        return Ok(());
    }

    let mut reasons: Vec<&str> = Vec::new();
    for requirement in &unmet {
        if !reasons.contains(&requirement.reason.as_str()) {
            reasons.push(&requirement.reason);
        }
    }
    Err(PhaseError::ScopeViolation {
        phase: planned.phase,
        module: unmet
            .iter()
            .map(|r| r.module.to_string())
            .collect::<Vec<_>>()
            .join(", "),
        reason: reasons.join("; "),
    })
}
