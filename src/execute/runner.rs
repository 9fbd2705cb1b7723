//! Running a single test
//!
//! The shipped runner executes a configured command per test. Placeholders:
//! - `{class}`: fully qualified class name
//! - `{method}`: method name
//! - `{test}`: `class#method`
//!
//! Substituted values are quoted for the shell when they contain anything
//! beyond a plain identifier, so Kotlin backtick names arrive as one word.
//!
//! The coordinates visible to the test phase are exported in
//! `BUILDPLAN_CLASSPATH`, separated by `;`.

use crate::domain::{Coordinate, TestCase, TestOutcome};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, trace};

pub const CLASSPATH_ENV: &str = "BUILDPLAN_CLASSPATH";

/// Trait for running one test
pub trait TestRunner {
    fn run(&self, test: &TestCase, classpath: &[Coordinate]) -> TestOutcome;
}

/// Runs a shell command per test
#[derive(Debug, Clone)]
pub struct CommandTestRunner {
    template: Option<String>,
    working_dir: PathBuf,
}

impl CommandTestRunner {
    /// Create a runner; without a template every test is skipped
    pub fn new(template: Option<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            template,
            working_dir: working_dir.into(),
        }
    }

    /// The command line for a test
    pub fn command_line(template: &str, test: &TestCase) -> String {
        template
            .replace("{class}", &shell_quote(&test.class))
            .replace("{method}", &shell_quote(&test.method))
            .replace("{test}", &shell_quote(&test.id()))
    }

    fn shell(command_line: &str, working_dir: &Path) -> Command {
        let mut command = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.args(["/C", command_line]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command_line]);
            c
        };
        command.current_dir(working_dir);
        command
    }
}

/// Quote `value` as a single shell word; plain identifiers pass unchanged
fn shell_quote(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '#' | ':' | '/'));
    if plain {
        value.to_string()
    } else if cfg!(windows) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        format!("'{}'", value.replace('\'', "'\\''"))
    }
}

/// Last non-empty line of the output, for the failure message
fn last_line(output: &[u8]) -> Option<String> {
    String::from_utf8_lossy(output)
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

impl TestRunner for CommandTestRunner {
    fn run(&self, test: &TestCase, classpath: &[Coordinate]) -> TestOutcome {
        let Some(template) = &self.template else {
            return TestOutcome::skipped("no test command configured");
        };

        let command_line = Self::command_line(template, test);
        let classpath = classpath
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(";");
        trace!(test = %test.id(), command = command_line, "running test");

        let output = Self::shell(&command_line, &self.working_dir)
            .env(CLASSPATH_ENV, classpath)
            .env("BUILDPLAN_TEST_CLASS", &test.class)
            .env("BUILDPLAN_TEST_METHOD", &test.method)
            .output();

        match output {
            Ok(output) if output.status.success() => TestOutcome::Passed,
            Ok(output) => {
                let status = match output.status.code() {
                    Some(code) => format!("exit status {}", code),
                    None => "terminated by signal".to_string(),
                };
                let detail = last_line(&output.stderr).or_else(|| last_line(&output.stdout));
                debug!(test = %test.id(), status, "test failed");
                match detail {
                    Some(detail) => TestOutcome::failed(format!("{}: {}", status, detail)),
                    None => TestOutcome::failed(status),
                }
            }
            Err(e) => TestOutcome::failed(format!("failed to run '{}': {}", command_line, e)),
        }
    }
}
