//! `buildplan.toml` reader
//!
//! The file is optional. Sections:
//! - `[resolution]`: transitive flag, depth limit, repository override
//! - `[test]`: the command that runs a single test
//! - `[[requires]]`: extra phase requirements
//! - `[catalog]`: offline metadata (BOM pins, module dependencies, version lists)

use crate::domain::{ModuleId, ModuleMatcher, Phase, PhaseRequirement, Repository, VersionConstraint};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config file name looked up in the project directory
pub const CONFIG_FILENAME: &str = "buildplan.toml";

/// Default limit on how deep transitive edges are followed
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Parsed `buildplan.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub resolution: ResolutionSettings,
    pub test: TestSettings,
    pub requires: Vec<RequirementConfig>,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolutionSettings {
    pub transitive: bool,
    pub max_depth: usize,
    /// Replaces the manifest's `repositories {}` when non-empty
    pub repositories: Vec<String>,
}

impl Default for ResolutionSettings {
    fn default() -> Self {
        Self {
            transitive: true,
            max_depth: DEFAULT_MAX_DEPTH,
            repositories: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestSettings {
    /// Command template, e.g. `java -cp build/classes org.junit.platform.console.ConsoleLauncher --select-method {test}`
    pub command: Option<String>,
    /// Source roots searched for tests, relative to the project directory
    pub source_dirs: Vec<PathBuf>,
}

impl Default for TestSettings {
    fn default() -> Self {
        Self {
            command: None,
            source_dirs: vec![PathBuf::from("src/test/java"), PathBuf::from("src/test/kotlin")],
        }
    }
}

/// One `[[requires]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequirementConfig {
    pub phase: Phase,
    /// `group:artifact`, or `group:*` for any module in the group
    pub module: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Offline metadata catalog
///
/// ```toml
/// [catalog.boms."com.example:platform:1.0"]
/// "com.example:lib-a" = "2.0"
///
/// [catalog.imports]
/// "com.example:platform:1.0" = ["com.example:base-bom:3.1"]
///
/// [catalog.modules."com.example:lib-a:2.0"]
/// dependencies = ["com.example:lib-core:2.0"]
/// runtime = ["com.example:lib-driver"]
///
/// [catalog.versions]
/// "com.example:lib-core" = ["1.0", "2.0", "2.1-rc1"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// BOM coordinate to its managed `id = version` entries
    pub boms: BTreeMap<String, BTreeMap<String, String>>,
    /// BOM coordinate to the BOMs it imports, in order
    pub imports: BTreeMap<String, Vec<String>>,
    /// Module coordinate to its dependency edges
    pub modules: BTreeMap<String, CatalogModule>,
    /// Module id to its published versions
    pub versions: BTreeMap<String, Vec<String>>,
}

impl CatalogConfig {
    pub fn is_empty(&self) -> bool {
        self.boms.is_empty()
            && self.imports.is_empty()
            && self.modules.is_empty()
            && self.versions.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogModule {
    /// Compile edges, `group:artifact[:constraint]`
    pub dependencies: Vec<String>,
    /// Runtime edges, `group:artifact[:constraint]`
    pub runtime: Vec<String>,
}

impl Config {
    /// Load a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(path, &content)
    }

    /// Parse config content; `path` is only used for error reporting
    pub fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|e| ConfigError::Invalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load the explicit config, or `buildplan.toml` in `dir` if present
    pub fn discover(dir: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let path = dir.join(CONFIG_FILENAME);
        if path.is_file() {
            debug!(path = %path.display(), "loading config");
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.resolution.max_depth == 0 {
            return Err(ConfigError::InvalidValue {
                key: "resolution.max_depth".to_string(),
                value: "0".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        self.repositories()?;
        self.requirements()?;
        Ok(())
    }

    /// Repository override, `None` when the manifest's list applies
    pub fn repositories(&self) -> Result<Option<Vec<Repository>>, ConfigError> {
        if self.resolution.repositories.is_empty() {
            return Ok(None);
        }
        self.resolution
            .repositories
            .iter()
            .map(|r| parse_repository(r))
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    /// The configured `[[requires]]` entries as phase requirements
    pub fn requirements(&self) -> Result<Vec<PhaseRequirement>, ConfigError> {
        self.requires
            .iter()
            .map(|r| {
                let module =
                    ModuleMatcher::parse(&r.module).map_err(|message| ConfigError::InvalidValue {
                        key: "requires.module".to_string(),
                        value: r.module.clone(),
                        message,
                    })?;
                let reason = r
                    .reason
                    .clone()
                    .unwrap_or_else(|| format!("required by {}", CONFIG_FILENAME));
                Ok(PhaseRequirement::new(r.phase, module, reason))
            })
            .collect()
    }
}

/// Parse a repository name (`mavenCentral`, `google`, `mavenLocal`) or URL
pub fn parse_repository(value: &str) -> Result<Repository, ConfigError> {
    match value.trim() {
        "mavenCentral" => Ok(Repository::MavenCentral),
        "google" => Ok(Repository::Google),
        "mavenLocal" => Ok(Repository::MavenLocal),
        url if url.starts_with("http://")
            || url.starts_with("https://")
            || url.starts_with("file://") =>
        {
            Ok(Repository::Maven {
                url: url.trim_end_matches('/').to_string(),
            })
        }
        other => Err(ConfigError::InvalidValue {
            key: "resolution.repositories".to_string(),
            value: other.to_string(),
            message: "expected mavenCentral, google, mavenLocal or a URL".to_string(),
        }),
    }
}

/// Split `group:artifact[:constraint]` into an id and a constraint
///
/// A missing constraint is `Managed`.
pub fn parse_requested(value: &str) -> Result<(ModuleId, VersionConstraint), String> {
    let mut parts = value.trim().splitn(3, ':');
    let group = parts.next().unwrap_or_default();
    let artifact = parts.next().unwrap_or_default();
    if group.is_empty() || artifact.is_empty() {
        return Err(format!("invalid module '{}', expected 'group:artifact[:version]'", value));
    }

    let constraint = match parts.next() {
        Some(raw) => VersionConstraint::parse(raw)
            .ok_or_else(|| format!("invalid version constraint '{}' in '{}'", raw, value))?,
        None => VersionConstraint::Managed,
    };
    Ok((ModuleId::new(group, artifact), constraint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn parse(content: &str) -> Result<Config, ConfigError> {
        Config::parse(Path::new("buildplan.toml"), content)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.resolution.transitive);
        assert_eq!(config.resolution.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.test.command.is_none());
        assert_eq!(config.test.source_dirs.len(), 2);
        assert!(config.catalog.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let config = parse(
            r#"
[resolution]
transitive = false
max_depth = 4
repositories = ["mavenLocal", "https://repo.example.com/maven/"]

[test]
command = "run-test {test}"

[[requires]]
phase = "compile"
module = "org.projectlombok:lombok"
reason = "sources use lombok"

[catalog.boms."com.example:bom:1.0"]
"com.example:lib-a" = "2.0"

[catalog.imports]
"com.example:bom:1.0" = ["com.example:base:1.0"]

[catalog.modules."com.example:lib-a:2.0"]
dependencies = ["com.example:core:1.0"]
runtime = ["com.example:driver"]

[catalog.versions]
"com.example:core" = ["1.0", "1.1"]
"#,
        )
        .unwrap();

        assert!(!config.resolution.transitive);
        assert_eq!(config.resolution.max_depth, 4);
        assert_eq!(config.test.command.as_deref(), Some("run-test {test}"));
        assert_eq!(config.requires.len(), 1);
        assert_eq!(config.requires[0].phase, Phase::Compile);
        assert_eq!(config.catalog.boms.len(), 1);
        assert_eq!(config.catalog.modules["com.example:lib-a:2.0"].runtime.len(), 1);

        let repos = config.repositories().unwrap().unwrap();
        assert_eq!(repos[0], Repository::MavenLocal);
        assert_eq!(
            repos[1],
            Repository::Maven {
                url: "https://repo.example.com/maven".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = parse("[resolution]\nfoo = 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().contains("buildplan.toml"));
    }

    #[test]
    fn test_zero_depth_rejected() {
        let err = parse("[resolution]\nmax_depth = 0\n").unwrap_err();
        assert!(err.to_string().contains("resolution.max_depth"));
    }

    #[test]
    fn test_invalid_repository_rejected() {
        let err = parse("[resolution]\nrepositories = [\"jcenter\"]\n").unwrap_err();
        assert!(err.to_string().contains("jcenter"));
    }

    #[test]
    fn test_invalid_requirement_rejected() {
        let err = parse("[[requires]]\nphase = \"test\"\nmodule = \"junit\"\n").unwrap_err();
        assert!(err.to_string().contains("requires.module"));
    }

    #[test]
    fn test_requirements_default_reason() {
        let config = parse("[[requires]]\nphase = \"test\"\nmodule = \"org.mockito:*\"\n").unwrap();
        let reqs = config.requirements().unwrap();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].phase, Phase::Test);
        assert!(reqs[0].reason.contains("buildplan.toml"));
    }

    #[test]
    fn test_discover_missing_file_gives_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::discover(dir.path(), None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_discover_reads_project_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "[test]\ncommand = \"true\"\n").unwrap();
        let config = Config::discover(dir.path(), None).unwrap();
        assert_eq!(config.test.command.as_deref(), Some("true"));
    }

    #[test]
    fn test_discover_explicit_missing_is_error() {
        let dir = TempDir::new().unwrap();
        let err = Config::discover(dir.path(), Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn test_parse_requested() {
        let (id, constraint) = parse_requested("com.example:lib:[1.0,2.0)").unwrap();
        assert_eq!(id, ModuleId::new("com.example", "lib"));
        assert!(matches!(constraint, VersionConstraint::Range { .. }));

        let (_, constraint) = parse_requested("com.example:lib").unwrap();
        assert!(constraint.is_managed());

        assert!(parse_requested("com.example").is_err());
        assert!(parse_requested("com.example:lib:[1.0").is_err());
    }
}
