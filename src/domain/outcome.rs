//! Phase and test outcome types

use super::Phase;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A discovered test method
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TestCase {
    /// Fully qualified class name
    pub class: String,
    /// Method name
    pub method: String,
    /// Source file the test was found in
    pub file: PathBuf,
}

impl TestCase {
    pub fn new(class: impl Into<String>, method: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            class: class.into(),
            method: method.into(),
            file: file.into(),
        }
    }

    /// `Class#method` identifier used in reports and the test command
    pub fn id(&self) -> String {
        format!("{}#{}", self.class, self.method)
    }
}

impl fmt::Display for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Outcome of a single test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TestOutcome {
    Passed,
    Failed { message: String },
    Skipped { reason: String },
}

impl TestOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        TestOutcome::Failed {
            message: message.into(),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        TestOutcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TestOutcome::Failed { .. })
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestOutcome::Passed => write!(f, "passed"),
            TestOutcome::Failed { message } => write!(f, "failed: {}", message),
            TestOutcome::Skipped { reason } => write!(f, "skipped ({})", reason),
        }
    }
}

/// Result of running one test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub test: TestCase,
    #[serde(flatten)]
    pub outcome: TestOutcome,
    pub duration_ms: u64,
}

/// Final status of a phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PhaseStatus {
    Succeeded,
    Failed { error: String },
    /// Not run because a phase it depends on did not succeed
    Blocked { by: Phase },
}

impl PhaseStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, PhaseStatus::Succeeded)
    }
}

impl fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseStatus::Succeeded => write!(f, "succeeded"),
            PhaseStatus::Failed { error } => write!(f, "failed: {}", error),
            PhaseStatus::Blocked { by } => write!(f, "blocked by {}", by),
        }
    }
}

/// Outcome of one executed (or blocked) phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseOutcome {
    pub phase: Phase,
    #[serde(flatten)]
    pub status: PhaseStatus,
    /// Number of artifacts visible to the phase
    pub artifact_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tests: Vec<TestResult>,
}

impl PhaseOutcome {
    pub fn new(phase: Phase, status: PhaseStatus, artifact_count: usize) -> Self {
        Self {
            phase,
            status,
            artifact_count,
            tests: Vec::new(),
        }
    }

    /// Attaches test results (builder pattern)
    pub fn with_tests(mut self, tests: Vec<TestResult>) -> Self {
        self.tests = tests;
        self
    }

    pub fn passed_count(&self) -> usize {
        self.tests
            .iter()
            .filter(|t| t.outcome == TestOutcome::Passed)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.tests.iter().filter(|t| t.outcome.is_failed()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.tests
            .iter()
            .filter(|t| matches!(t.outcome, TestOutcome::Skipped { .. }))
            .count()
    }
}
