//! JSON output formatter for machine processing

use crate::domain::{BuildPlan, BuildReport, PhaseOutcome, ResolvedGraph};
use crate::output::{OutputFormatter, Verbosity};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Quiet drops the graph and plan
    verbosity: Verbosity,
}

impl JsonFormatter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

/// JSON representation of the full report
#[derive(Serialize)]
struct JsonOutput<'a> {
    success: bool,
    manifest: &'a Path,
    summary: JsonSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    graph: Option<&'a ResolvedGraph>,
    #[serde(skip_serializing_if = "Option::is_none")]
    plan: Option<&'a BuildPlan>,
    #[serde(skip_serializing_if = "is_empty")]
    phases: &'a [PhaseOutcome],
    #[serde(skip_serializing_if = "is_empty")]
    warnings: &'a [String],
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct JsonSummary {
    modules: usize,
    direct: usize,
    phases: usize,
    failed_phases: usize,
    blocked_phases: usize,
    tests: usize,
    failed_tests: usize,
    duration_ms: i64,
}

impl JsonSummary {
    fn from_report(report: &BuildReport) -> Self {
        Self {
            modules: report.graph.len(),
            direct: report.graph.direct_count(),
            phases: report.phases.len(),
            failed_phases: report.failed_phases(),
            blocked_phases: report.blocked_phases(),
            tests: report.total_tests(),
            failed_tests: report.failed_tests(),
            duration_ms: report.duration_ms(),
        }
    }
}

fn is_empty<T>(items: &&[T]) -> bool {
    items.is_empty()
}

fn write_json<T: Serialize>(value: &T, writer: &mut dyn Write) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    writeln!(writer, "{}", json)
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &BuildReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let detailed = self.verbosity != Verbosity::Quiet;
        let output = JsonOutput {
            success: report.is_success(),
            manifest: &report.manifest,
            summary: JsonSummary::from_report(report),
            graph: detailed.then_some(&report.graph),
            plan: report.plan.as_ref().filter(|_| detailed),
            phases: &report.phases,
            warnings: &report.warnings,
            started_at: report.started_at,
            finished_at: report.finished_at,
        };
        write_json(&output, writer)
    }

    fn format_graph(&self, graph: &ResolvedGraph, writer: &mut dyn Write) -> std::io::Result<()> {
        write_json(graph, writer)
    }

    fn format_plan(&self, plan: &BuildPlan, writer: &mut dyn Write) -> std::io::Result<()> {
        write_json(plan, writer)
    }

    fn format_phase(&self, phase: &PhaseOutcome, writer: &mut dyn Write) -> std::io::Result<()> {
        write_json(phase, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Phase, PhaseStatus, ResolvedNode, Scope, Selection, TestCase, TestOutcome, TestResult,
        Version,
    };
    use std::collections::BTreeSet;

    fn report() -> BuildReport {
        let mut graph = ResolvedGraph::new();
        graph.insert(
            "com.example:lib-a".parse().unwrap(),
            ResolvedNode {
                version: Version::parse("2.0").unwrap(),
                selection: Selection::Pinned {
                    bom: "com.example:platform:1.0".parse().unwrap(),
                },
                scopes: BTreeSet::from([Scope::Implementation]),
                direct: true,
                dependencies: Vec::new(),
            },
        );
        let mut report = BuildReport::new("build.gradle.kts", graph);
        report.finish(vec![
            PhaseOutcome::new(Phase::Compile, PhaseStatus::Succeeded, 1),
            PhaseOutcome::new(
                Phase::Test,
                PhaseStatus::Failed {
                    error: "1 of 1 tests failed".to_string(),
                },
                1,
            )
            .with_tests(vec![TestResult {
                test: TestCase::new("com.example.AppTest", "fails", "AppTest.java"),
                outcome: TestOutcome::failed("exit status 1"),
                duration_ms: 3,
            }]),
        ]);
        report
    }

    fn render(verbosity: Verbosity) -> serde_json::Value {
        let mut buf = Vec::new();
        JsonFormatter::new(verbosity).format(&report(), &mut buf).unwrap();
        serde_json::from_slice(&buf).unwrap()
    }

    #[test]
    fn test_json_report() {
        let value = render(Verbosity::Normal);
        assert_eq!(value["success"], false);
        assert_eq!(value["manifest"], "build.gradle.kts");
        assert_eq!(value["summary"]["modules"], 1);
        assert_eq!(value["summary"]["failed_phases"], 1);
        assert_eq!(value["summary"]["failed_tests"], 1);
        assert_eq!(value["graph"]["nodes"]["com.example:lib-a"]["version"], "2.0");
        assert_eq!(
            value["graph"]["nodes"]["com.example:lib-a"]["selection"]["reason"],
            "pinned"
        );
        assert_eq!(value["phases"][1]["status"], "failed");
        assert_eq!(value["phases"][1]["tests"][0]["outcome"], "failed");
        assert!(value.get("plan").is_none());
        assert!(value.get("warnings").is_none());
    }

    #[test]
    fn test_json_quiet_omits_graph() {
        let value = render(Verbosity::Quiet);
        assert!(value.get("graph").is_none());
        assert_eq!(value["summary"]["modules"], 1);
    }
}
