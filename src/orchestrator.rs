//! Build orchestrator coordinating the whole workflow
//!
//! This module provides:
//! - Workflow coordination: detect → parse → resolve → lock → plan → execute
//! - Metadata source assembly from the catalog and repositories
//! - Lockfile verification and writing
//!
//! Any error before execution aborts the run. Phase failures end up in the
//! report instead.

use crate::cli::CliArgs;
use crate::config::Config;
use crate::domain::{BuildReport, Manifest, Repository, ResolvedGraph};
use crate::error::{AppError, ConfigError, IoError, ResolveError};
use crate::execute::{CommandTestRunner, Executor};
use crate::manifest::{detect_manifest, parse_manifest, ManifestInfo};
use crate::plan::Planner;
use crate::progress::Progress;
use crate::registry::{CatalogSource, HttpClient, MavenRepository, MetadataSource, SourceChain};
use crate::resolve::{Lockfile, ResolutionConfig, Resolver, LOCKFILE_NAME};
use chrono::Utc;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Orchestrator for one CLI invocation
pub struct Orchestrator {
    args: CliArgs,
    config: Config,
}

impl Orchestrator {
    /// Create an orchestrator, loading `buildplan.toml` (or `--config`)
    pub fn new(args: CliArgs) -> Result<Self, AppError> {
        if !args.path.is_dir() {
            return Err(IoError::directory_not_found(&args.path).into());
        }
        let config = Config::discover(&args.path, args.config.as_deref())?;
        Self::with_config(args, config)
    }

    /// Create an orchestrator with an already loaded config (for testing)
    pub fn with_config(args: CliArgs, config: Config) -> Result<Self, AppError> {
        if args.locked && args.command.write_lock() {
            return Err(ConfigError::ConflictingOptions {
                message: "--locked cannot be combined with resolve --write-lock".to_string(),
            }
            .into());
        }
        Ok(Self { args, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the workflow with progress shown unless quiet or JSON output
    pub async fn run(&self) -> Result<BuildReport, AppError> {
        self.run_with_progress(!self.args.quiet && !self.args.json)
            .await
    }

    pub async fn run_with_progress(&self, show_progress: bool) -> Result<BuildReport, AppError> {
        let started_at = Utc::now();
        let mut progress = Progress::new(show_progress);
        let mut warnings = Vec::new();

        // Step 1: Read the build script
        let info = self.manifest_info()?;
        let manifest = parse_manifest(&info)?;
        info!(
            manifest = %info.path.display(),
            dialect = %info.dialect,
            dependencies = manifest.dependencies.len(),
            platforms = manifest.platforms.len(),
            "parsed build script"
        );

        // Step 2: Resolve
        let source = self.metadata_source(&manifest, &mut warnings)?;
        let resolution = self.resolution_config(&manifest);
        progress.spinner("Resolving dependencies...");
        let mut resolver = Resolver::new(&source, resolution);
        let resolved = resolver.resolve(&manifest).await;
        progress.finish_and_clear();
        let graph = resolved?;
        info!(
            modules = graph.len(),
            direct = graph.direct_count(),
            "resolved dependency graph"
        );

        // Step 3: Lockfile
        self.apply_lockfile(&graph)?;

        let mut report = BuildReport::new(&info.path, graph).started(started_at);
        report.warnings = warnings;

        let Some(goal) = self.args.command.goal() else {
            report.finish(Vec::new());
            return Ok(report);
        };

        // Step 4: Plan
        let planner = Planner::for_manifest(&manifest).with_requirements(self.config.requirements()?);
        let plan = planner.plan(&report.graph, goal);
        debug!(goal = %goal, phases = plan.phases.len(), "built plan");

        if !self.args.command.executes() {
            report = report.with_plan(plan);
            report.finish(Vec::new());
            return Ok(report);
        }

        // Step 5: Execute
        let runner = CommandTestRunner::new(self.config.test.command.clone(), &self.args.path);
        let executor = Executor::new(&self.args.path, &runner)
            .with_source_dirs(self.config.test.source_dirs.clone())
            .with_engine(manifest.test_engine);
        let phases = executor.execute(&plan, &mut progress);

        report = report.with_plan(plan);
        report.finish(phases);
        Ok(report)
    }

    /// The explicit `--manifest`, or the build script found in the project
    fn manifest_info(&self) -> Result<ManifestInfo, AppError> {
        let info = match &self.args.manifest {
            Some(path) => ManifestInfo::from_path(path)?,
            None => detect_manifest(&self.args.path)?,
        };
        Ok(info)
    }

    /// Catalog first, then the repositories unless offline
    fn metadata_source(
        &self,
        manifest: &Manifest,
        warnings: &mut Vec<String>,
    ) -> Result<SourceChain, AppError> {
        let mut sources: Vec<Box<dyn MetadataSource>> = Vec::new();

        if !self.config.catalog.is_empty() {
            sources.push(Box::new(CatalogSource::from_config(&self.config.catalog)?));
        }

        if self.args.offline {
            if sources.is_empty() {
                let message = "resolving offline without a [catalog]; only declared versions are available";
                warn!("{}", message);
                warnings.push(message.to_string());
            }
        } else {
            let client = HttpClient::new()?;
            for repository in self.repositories(manifest)? {
                match MavenRepository::from_repository(&repository, &client) {
                    Some(source) => sources.push(Box::new(source)),
                    None => {
                        let message = format!("repository {:?} is not available", repository);
                        warn!("{}", message);
                        warnings.push(message);
                    }
                }
            }
        }

        let chain = SourceChain::new(sources);
        debug!(sources = ?chain.names(), "metadata sources");
        Ok(chain)
    }

    /// Config override, else the manifest's, else Maven Central
    fn repositories(&self, manifest: &Manifest) -> Result<Vec<Repository>, ConfigError> {
        if let Some(repositories) = self.config.repositories()? {
            return Ok(repositories);
        }
        if manifest.repositories.is_empty() {
            return Ok(vec![Repository::MavenCentral]);
        }
        Ok(manifest.repositories.clone())
    }

    fn resolution_config(&self, manifest: &Manifest) -> ResolutionConfig {
        ResolutionConfig::from_manifest(manifest)
            .with_transitive(self.config.resolution.transitive && !self.args.no_transitive)
            .with_max_depth(self.config.resolution.max_depth)
    }

    pub fn lockfile_path(&self) -> PathBuf {
        self.args.path.join(LOCKFILE_NAME)
    }

    fn apply_lockfile(&self, graph: &ResolvedGraph) -> Result<(), ResolveError> {
        let path = self.lockfile_path();

        if self.args.locked {
            let lockfile = Lockfile::load(&path)?.ok_or_else(|| ResolveError::Lockfile {
                path: path.clone(),
                message: "not found; run `buildplan resolve --write-lock` first".to_string(),
            })?;
            lockfile.verify(graph)?;
            debug!(lockfile = %path.display(), "resolution matches lockfile");
        }

        if self.args.command.write_lock() {
            Lockfile::from_graph(graph).write(&path)?;
            info!(lockfile = %path.display(), modules = graph.len(), "wrote lockfile");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Goal, Phase, PhaseStatus};
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    const BUILD: &str = r#"plugins {
    java
}

dependencies {
    implementation(platform("com.example:platform:1.0"))
    implementation("com.example:lib-a:1.0")
    testImplementation("org.junit.jupiter:junit-jupiter:5.10.0")
}
"#;

    const CONFIG: &str = r#"[catalog.boms."com.example:platform:1.0"]
"com.example:lib-a" = "2.0"
"#;

    fn project(build: &str, config: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("build.gradle.kts"), build).unwrap();
        fs::write(dir.path().join("buildplan.toml"), config).unwrap();
        dir
    }

    fn args(dir: &TempDir, extra: &[&str]) -> CliArgs {
        let path = dir.path().to_str().unwrap();
        let mut argv = vec!["buildplan", "--path", path, "--offline"];
        argv.extend(extra);
        CliArgs::parse_from(argv)
    }

    #[tokio::test]
    async fn test_resolve_offline_applies_bom_pin() {
        let dir = project(BUILD, CONFIG);
        let orchestrator = Orchestrator::new(args(&dir, &["resolve"])).unwrap();
        let report = orchestrator.run_with_progress(false).await.unwrap();

        let lib_a = "com.example:lib-a".parse().unwrap();
        assert_eq!(report.graph.version_of(&lib_a).unwrap().to_string(), "2.0");
        assert!(report.plan.is_none());
        assert!(report.phases.is_empty());
    }

    #[tokio::test]
    async fn test_plan_does_not_execute() {
        let dir = project(BUILD, CONFIG);
        let orchestrator = Orchestrator::new(args(&dir, &["plan", "test"])).unwrap();
        let report = orchestrator.run_with_progress(false).await.unwrap();

        let plan = report.plan.unwrap();
        assert_eq!(plan.goal, Goal::Test);
        assert_eq!(plan.phases.last().map(|p| p.phase), Some(Phase::Test));
        assert!(report.phases.is_empty());
    }

    #[tokio::test]
    async fn test_compile_runs_phases() {
        let dir = project(BUILD, CONFIG);
        let orchestrator = Orchestrator::new(args(&dir, &["compile"])).unwrap();
        let report = orchestrator.run_with_progress(false).await.unwrap();

        assert_eq!(report.phases.len(), 2);
        assert!(report.is_success());
    }

    #[tokio::test]
    async fn test_missing_requirement_fails_test_phase_only() {
        let config = format!(
            "{}\n[[requires]]\nphase = \"test\"\nmodule = \"com.example:lib-b\"\n",
            CONFIG
        );
        let dir = project(BUILD, &config);
        let orchestrator = Orchestrator::new(args(&dir, &["build"])).unwrap();
        let report = orchestrator.run_with_progress(false).await.unwrap();

        let status = |phase: Phase| {
            report
                .phases
                .iter()
                .find(|p| p.phase == phase)
                .map(|p| p.status.clone())
                .unwrap()
        };
        assert!(matches!(status(Phase::Test), PhaseStatus::Failed { .. }));
        assert_eq!(status(Phase::Package), PhaseStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_write_then_verify_lockfile() {
        let dir = project(BUILD, CONFIG);
        Orchestrator::new(args(&dir, &["resolve", "--write-lock"]))
            .unwrap()
            .run_with_progress(false)
            .await
            .unwrap();
        assert!(dir.path().join(LOCKFILE_NAME).is_file());

        let report = Orchestrator::new(args(&dir, &["--locked", "compile"]))
            .unwrap()
            .run_with_progress(false)
            .await;
        assert!(report.is_ok());
    }

    #[tokio::test]
    async fn test_locked_without_lockfile() {
        let dir = project(BUILD, CONFIG);
        let result = Orchestrator::new(args(&dir, &["--locked", "resolve"]))
            .unwrap()
            .run_with_progress(false)
            .await;
        assert!(matches!(
            result,
            Err(AppError::Resolve(ResolveError::Lockfile { .. }))
        ));
    }

    #[test]
    fn test_locked_conflicts_with_write_lock() {
        let dir = project(BUILD, CONFIG);
        let result = Orchestrator::new(args(&dir, &["--locked", "resolve", "--write-lock"]));
        assert!(matches!(
            result,
            Err(AppError::Config(ConfigError::ConflictingOptions { .. }))
        ));
    }

    #[test]
    fn test_missing_directory() {
        let args = CliArgs::parse_from(["buildplan", "--path", "/nonexistent/buildplan/project", "build"]);
        assert!(matches!(
            Orchestrator::new(args),
            Err(AppError::Io(IoError::DirectoryNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_offline_without_catalog_warns() {
        let dir = project("dependencies {\n    implementation(\"com.example:lib-a:1.0\")\n}\n", "");
        let report = Orchestrator::new(args(&dir, &["resolve"]))
            .unwrap()
            .run_with_progress(false)
            .await
            .unwrap();
        assert_eq!(report.graph.len(), 1);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_config_repositories_override_manifest() {
        let dir = project(BUILD, "[resolution]\nrepositories = [\"google\"]\n");
        let orchestrator = Orchestrator::new(args(&dir, &["resolve"])).unwrap();
        let manifest = Manifest {
            repositories: vec![Repository::MavenCentral],
            ..Manifest::default()
        };
        assert_eq!(
            orchestrator.repositories(&manifest).unwrap(),
            vec![Repository::Google]
        );
        assert_eq!(
            orchestrator.repositories(&Manifest::default()).unwrap(),
            vec![Repository::Google]
        );
    }

    #[test]
    fn test_no_transitive_flag() {
        let dir = project(BUILD, CONFIG);
        let orchestrator = Orchestrator::new(args(&dir, &["--no-transitive", "resolve"])).unwrap();
        assert!(!orchestrator.resolution_config(&Manifest::default()).transitive);
    }
}
