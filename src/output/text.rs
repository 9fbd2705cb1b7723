//! Text output formatter for human-readable display
//!
//! This module provides:
//! - The resolved graph, direct modules first, with selection reasons
//! - The plan with per-phase artifact counts and requirements
//! - Phase results with test outcomes
//! - Summary line

use crate::domain::{
    BuildPlan, BuildReport, PhaseOutcome, PhaseStatus, ResolvedGraph, ResolvedNode, Selection,
    TestOutcome, TestResult,
};
use crate::output::{OutputFormatter, Verbosity};
use colored::Colorize;
use std::io::Write;

/// Text formatter for human-readable output
pub struct TextFormatter {
    verbosity: Verbosity,
    color: bool,
}

impl TextFormatter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            color: true,
        }
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, color: bool) -> Self {
        Self { verbosity, color }
    }

    fn heading(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    fn status_mark(&self, status: &PhaseStatus) -> String {
        match (status, self.color) {
            (PhaseStatus::Succeeded, true) => "✓".green().to_string(),
            (PhaseStatus::Failed { .. }, true) => "✗".red().bold().to_string(),
            (PhaseStatus::Blocked { .. }, true) => "⊘".yellow().to_string(),
            (PhaseStatus::Succeeded, false) => "ok".to_string(),
            (PhaseStatus::Failed { .. }, false) => "FAILED".to_string(),
            (PhaseStatus::Blocked { .. }, false) => "BLOCKED".to_string(),
        }
    }

    fn test_mark(&self, outcome: &TestOutcome) -> String {
        match (outcome, self.color) {
            (TestOutcome::Passed, true) => "✓".green().to_string(),
            (TestOutcome::Failed { .. }, true) => "✗".red().to_string(),
            (TestOutcome::Skipped { .. }, true) => "-".dimmed().to_string(),
            (TestOutcome::Passed, false) => "ok".to_string(),
            (TestOutcome::Failed { .. }, false) => "FAILED".to_string(),
            (TestOutcome::Skipped { .. }, false) => "skipped".to_string(),
        }
    }

    /// Selection reason, colored by kind
    fn selection_label(&self, selection: &Selection) -> String {
        let label = selection.to_string();
        if !self.color {
            return label;
        }
        match selection {
            Selection::Pinned { .. } => label.cyan().to_string(),
            Selection::Highest { .. } => label.yellow().to_string(),
            Selection::Requested => label.dimmed().to_string(),
        }
    }

    fn format_node(
        &self,
        id: &str,
        node: &ResolvedNode,
        max_id_len: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let scopes: Vec<String> = node.scopes.iter().map(|s| s.to_string()).collect();
        let version = if self.color {
            node.version.to_string().bright_white().bold().to_string()
        } else {
            node.version.to_string()
        };
        writeln!(
            writer,
            "  {:width$} {} {} {}",
            id,
            version,
            self.dim(&format!("[{}]", scopes.join(", "))),
            self.selection_label(&node.selection),
            width = max_id_len
        )
    }

    fn format_test(&self, result: &TestResult, writer: &mut dyn Write) -> std::io::Result<()> {
        let detail = match &result.outcome {
            TestOutcome::Passed => String::new(),
            TestOutcome::Failed { message } => format!(" {}", message),
            TestOutcome::Skipped { reason } => format!(" {}", self.dim(&format!("({})", reason))),
        };
        writeln!(
            writer,
            "      {} {}{}",
            self.test_mark(&result.outcome),
            result.test.id(),
            detail
        )
    }

    fn format_summary(&self, report: &BuildReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let mut parts = vec![format!(
            "{} modules ({} direct)",
            report.graph.len(),
            report.graph.direct_count()
        )];
        if !report.phases.is_empty() {
            parts.push(format!(
                "{} phases, {} failed, {} blocked",
                report.phases.len(),
                report.failed_phases(),
                report.blocked_phases()
            ));
        }
        if report.total_tests() > 0 {
            parts.push(format!(
                "{} tests, {} failed",
                report.total_tests(),
                report.failed_tests()
            ));
        }

        let label = if report.is_success() {
            if self.color {
                "Success".green().bold().to_string()
            } else {
                "Success".to_string()
            }
        } else if self.color {
            "Failed".red().bold().to_string()
        } else {
            "Failed".to_string()
        };

        let seconds = report.duration_ms() as f64 / 1000.0;
        writeln!(
            writer,
            "{}: {} {}",
            label,
            parts.join("; "),
            self.dim(&format!("({:.1}s)", seconds))
        )
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, report: &BuildReport, writer: &mut dyn Write) -> std::io::Result<()> {
        if self.verbosity != Verbosity::Quiet {
            writeln!(
                writer,
                "{} {}",
                self.heading("Build script:"),
                report.manifest.display()
            )?;
            writeln!(writer)?;
            self.format_graph(&report.graph, writer)?;

            if let Some(plan) = &report.plan {
                if report.phases.is_empty() {
                    writeln!(writer)?;
                    self.format_plan(plan, writer)?;
                }
            }

            if !report.phases.is_empty() {
                writeln!(writer)?;
                writeln!(writer, "{}", self.heading("Phases:"))?;
                for phase in &report.phases {
                    self.format_phase(phase, writer)?;
                }
            }

            if !report.warnings.is_empty() {
                writeln!(writer)?;
                for warning in &report.warnings {
                    let label = if self.color {
                        "warning:".yellow().to_string()
                    } else {
                        "warning:".to_string()
                    };
                    writeln!(writer, "{} {}", label, warning)?;
                }
            }
            writeln!(writer)?;
        }

        self.format_summary(report, writer)
    }

    fn format_graph(&self, graph: &ResolvedGraph, writer: &mut dyn Write) -> std::io::Result<()> {
        if graph.is_empty() {
            return writeln!(writer, "{}", self.dim("No dependencies."));
        }

        let verbose = self.verbosity == Verbosity::Verbose;
        let shown: Vec<_> = graph
            .iter()
            .filter(|(_, node)| verbose || node.direct)
            .map(|(id, node)| (id.to_string(), node))
            .collect();
        let max_id_len = shown.iter().map(|(id, _)| id.len()).max().unwrap_or(0);

        writeln!(writer, "{}", self.heading("Dependencies:"))?;
        for (id, node) in shown.iter().filter(|(_, node)| node.direct) {
            self.format_node(id, node, max_id_len, writer)?;
        }

        let transitive = graph.len() - graph.direct_count();
        if verbose {
            if transitive > 0 {
                writeln!(writer, "  {}", self.dim("transitive:"))?;
            }
            for (id, node) in shown.iter().filter(|(_, node)| !node.direct) {
                self.format_node(id, node, max_id_len, writer)?;
            }
        } else if transitive > 0 {
            writeln!(
                writer,
                "  {}",
                self.dim(&format!("... and {} transitive (use -v to show)", transitive))
            )?;
        }
        Ok(())
    }

    fn format_plan(&self, plan: &BuildPlan, writer: &mut dyn Write) -> std::io::Result<()> {
        writeln!(
            writer,
            "{}",
            self.heading(&format!("Plan for '{}':", plan.goal))
        )?;
        let width = plan
            .phases
            .iter()
            .map(|p| p.phase.name().len())
            .max()
            .unwrap_or(0);

        for planned in &plan.phases {
            let count = planned.artifacts.len();
            let noun = if count == 1 { "artifact" } else { "artifacts" };
            writeln!(
                writer,
                "  {:width$} {}",
                planned.phase.name(),
                self.dim(&format!("{} {}", count, noun)),
                width = width
            )?;
            if self.verbosity == Verbosity::Verbose {
                for artifact in &planned.artifacts {
                    writeln!(writer, "      {}", artifact)?;
                }
            }
            for requirement in &planned.requires {
                writeln!(
                    writer,
                    "      requires {} {}",
                    requirement.module,
                    self.dim(&format!("({})", requirement.reason))
                )?;
            }
        }
        Ok(())
    }

    fn format_phase(&self, phase: &PhaseOutcome, writer: &mut dyn Write) -> std::io::Result<()> {
        let detail = match &phase.status {
            PhaseStatus::Succeeded => String::new(),
            other => format!(" {}", other),
        };
        writeln!(
            writer,
            "  {} {}{}",
            self.status_mark(&phase.status),
            phase.phase,
            detail
        )?;

        let verbose = self.verbosity == Verbosity::Verbose;
        for result in &phase.tests {
            if verbose || result.outcome != TestOutcome::Passed {
                self.format_test(result, writer)?;
            }
        }
        if !phase.tests.is_empty() && !verbose && phase.passed_count() > 0 {
            writeln!(
                writer,
                "      {}",
                self.dim(&format!("{} passed", phase.passed_count()))
            )?;
        }
        Ok(())
    }
}
