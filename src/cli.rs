//! CLI argument parsing module for buildplan

use crate::domain::Goal;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Resolve and run a Gradle-style JVM build plan
#[derive(Parser, Debug, Clone)]
#[command(
    name = "buildplan",
    version,
    about = "Resolve dependencies and run the build plan of a Gradle project"
)]
pub struct CliArgs {
    /// Project directory
    #[arg(long, global = true, default_value = ".")]
    pub path: PathBuf,

    /// Build script to read instead of detecting one in the project directory
    #[arg(long, global = true)]
    pub manifest: Option<PathBuf>,

    /// Config file (default: buildplan.toml in the project directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Resolve from the [catalog] in buildplan.toml only, without network access
    #[arg(long, global = true)]
    pub offline: bool,

    /// Resolve declared dependencies only
    #[arg(long, global = true)]
    pub no_transitive: bool,

    /// Fail if the resolution differs from buildplan.lock
    #[arg(long, global = true)]
    pub locked: bool,

    /// Output the report in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Enable quiet mode - minimal output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Resolve, compile, test and package
    Build,
    /// Resolve, compile and run the tests
    Test,
    /// Resolve and compile
    Compile,
    /// Show the plan for a goal without running it
    Plan {
        /// compile, test or build
        goal: Goal,
    },
    /// Resolve the dependency graph only
    Resolve {
        /// Write buildplan.lock from the resolution
        #[arg(long)]
        write_lock: bool,
    },
}

impl Command {
    /// Goal whose plan the command needs; None for `resolve`
    pub fn goal(&self) -> Option<Goal> {
        match self {
            Command::Build => Some(Goal::Build),
            Command::Test => Some(Goal::Test),
            Command::Compile => Some(Goal::Compile),
            Command::Plan { goal } => Some(*goal),
            Command::Resolve { .. } => None,
        }
    }

    /// True if the planned phases should run
    pub fn executes(&self) -> bool {
        matches!(self, Command::Build | Command::Test | Command::Compile)
    }

    pub fn write_lock(&self) -> bool {
        matches!(self, Command::Resolve { write_lock: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = CliArgs::parse_from(["buildplan", "build"]);
        assert_eq!(args.path, PathBuf::from("."));
        assert!(args.manifest.is_none());
        assert!(args.config.is_none());
        assert!(!args.offline);
        assert!(!args.no_transitive);
        assert!(!args.locked);
        assert!(!args.json);
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert_eq!(args.command, Command::Build);
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let args = CliArgs::parse_from(["buildplan", "test", "--path", "/some/path", "--offline"]);
        assert_eq!(args.path, PathBuf::from("/some/path"));
        assert!(args.offline);
        assert_eq!(args.command.goal(), Some(Goal::Test));
    }

    #[test]
    fn test_verbose_count() {
        let args = CliArgs::parse_from(["buildplan", "-vv", "compile"]);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(CliArgs::try_parse_from(["buildplan", "-q", "-v", "build"]).is_err());
    }

    #[test]
    fn test_plan_goal() {
        let args = CliArgs::parse_from(["buildplan", "plan", "compile"]);
        assert_eq!(args.command, Command::Plan { goal: Goal::Compile });
        assert!(!args.command.executes());
        assert!(CliArgs::try_parse_from(["buildplan", "plan", "deploy"]).is_err());
    }

    #[test]
    fn test_resolve_write_lock() {
        let args = CliArgs::parse_from(["buildplan", "resolve", "--write-lock"]);
        assert!(args.command.write_lock());
        assert_eq!(args.command.goal(), None);

        let args = CliArgs::parse_from(["buildplan", "resolve"]);
        assert!(!args.command.write_lock());
    }

    #[test]
    fn test_subcommand_required() {
        assert!(CliArgs::try_parse_from(["buildplan"]).is_err());
    }

    #[test]
    fn test_combined_flags() {
        let args = CliArgs::parse_from([
            "buildplan",
            "--manifest",
            "app/build.gradle",
            "--config",
            "ci.toml",
            "--no-transitive",
            "--locked",
            "--json",
            "build",
        ]);
        assert_eq!(args.manifest, Some(PathBuf::from("app/build.gradle")));
        assert_eq!(args.config, Some(PathBuf::from("ci.toml")));
        assert!(args.no_transitive);
        assert!(args.locked);
        assert!(args.json);
        assert!(args.command.executes());
    }
}
