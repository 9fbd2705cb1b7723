//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ManifestError: Issues with reading or parsing the build manifest
//! - ResolveError: Irreconcilable pins, missing versions, lockfile drift
//! - RegistryError: Issues with fetching POMs, BOMs and version lists
//! - ConfigError: Issues with CLI options or the config file
//! - IoError: Missing project directory
//! - PhaseError: A single phase failed (does not abort the build)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::{Coordinate, ModuleId, Phase, Version};

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Manifest file related errors
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Dependency resolution errors
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Metadata repository related errors
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// IO related errors
    #[error(transparent)]
    Io(#[from] IoError),
}

/// Errors related to manifest file operations
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest file not found
    #[error("manifest file not found: {path}")]
    NotFound { path: PathBuf },

    /// Failed to read manifest file
    #[error("failed to read manifest file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed manifest content
    #[error("parse error in {path} at line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Unsupported manifest format
    #[error("unsupported manifest format: {path}")]
    UnsupportedFormat { path: PathBuf },
}

/// One side of a BOM pin conflict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictingPin {
    pub bom: Coordinate,
    pub version: Version,
}

fn format_pins(pins: &[ConflictingPin]) -> String {
    pins.iter()
        .map(|p| format!("{} (from {})", p.version, p.bom))
        .collect::<Vec<_>>()
        .join(" vs ")
}

/// Errors that abort dependency resolution
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Two top-level BOMs of equal strength pin different versions
    #[error("conflicting BOM pins for {module}: {}", format_pins(.pins))]
    Conflict {
        module: ModuleId,
        pins: Vec<ConflictingPin>,
    },

    /// A versionless dependency that no BOM pins
    #[error("no version for {module}: it is declared without a version and no imported BOM manages it")]
    MissingVersion { module: ModuleId },

    /// No available version satisfies a dynamic constraint
    #[error("no version of {module} satisfies '{constraint}'")]
    UnresolvableConstraint { module: ModuleId, constraint: String },

    /// Metadata could not be fetched
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Transitive selection kept changing
    #[error("dependency resolution did not converge after {iterations} iterations")]
    NotConverged { iterations: usize },

    /// Fresh resolution differs from the lockfile
    #[error("lockfile is out of date: {module} is locked at {locked} but resolves to {resolved}")]
    LockMismatch {
        module: String,
        locked: String,
        resolved: String,
    },

    /// Lockfile could not be read or written
    #[error("invalid lockfile {path}: {message}")]
    Lockfile { path: PathBuf, message: String },
}

/// Errors related to metadata repository communication
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Module or resource not found in the repository
    #[error("'{resource}' not found in {repository}")]
    NotFound {
        resource: String,
        repository: String,
    },

    /// Network request failed
    #[error("failed to fetch '{resource}' from {repository}: {message}")]
    NetworkError {
        resource: String,
        repository: String,
        message: String,
    },

    /// Rate limit exceeded
    #[error("rate limit exceeded for {repository}")]
    RateLimitExceeded { repository: String },

    /// Response body could not be understood
    #[error("invalid response from {repository} for '{resource}': {message}")]
    InvalidResponse {
        resource: String,
        repository: String,
        message: String,
    },

    /// Timeout
    #[error("timeout while fetching '{resource}' from {repository}")]
    Timeout {
        resource: String,
        repository: String,
    },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML or has unknown keys
    #[error("invalid config file {path}: {message}")]
    Invalid { path: PathBuf, message: String },

    /// Invalid value for a known key
    #[error("invalid value '{value}' for {key}: {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },

    /// Conflicting options
    #[error("conflicting options: {message}")]
    ConflictingOptions { message: String },
}

/// Errors related to IO operations
#[derive(Error, Debug)]
pub enum IoError {
    /// Directory not found
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },
}

/// Errors that fail a single phase
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhaseError {
    /// A required module is not visible to the phase
    #[error("{module} is not visible in phase '{phase}' ({reason})")]
    ScopeViolation {
        phase: Phase,
        module: String,
        reason: String,
    },

    /// One or more tests failed
    #[error("{failed} of {total} tests failed")]
    TestFailures { failed: usize, total: usize },

    /// Tests could not be discovered
    #[error("test discovery failed: {message}")]
    Discovery { message: String },
}

impl ManifestError {
    /// Creates a new NotFound error
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        ManifestError::NotFound { path: path.into() }
    }

    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new Parse error
    pub fn parse(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        ManifestError::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Line of a parse error
    pub fn line(&self) -> Option<usize> {
        match self {
            ManifestError::Parse { line, .. } => Some(*line),
            _ => None,
        }
    }
}

impl RegistryError {
    /// Creates a new NotFound error
    pub fn not_found(resource: impl Into<String>, repository: impl Into<String>) -> Self {
        RegistryError::NotFound {
            resource: resource.into(),
            repository: repository.into(),
        }
    }

    /// Creates a new NetworkError
    pub fn network_error(
        resource: impl Into<String>,
        repository: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::NetworkError {
            resource: resource.into(),
            repository: repository.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidResponse error
    pub fn invalid_response(
        resource: impl Into<String>,
        repository: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::InvalidResponse {
            resource: resource.into(),
            repository: repository.into(),
            message: message.into(),
        }
    }

    /// Creates a new RateLimitExceeded error
    pub fn rate_limit_exceeded(repository: impl Into<String>) -> Self {
        RegistryError::RateLimitExceeded {
            repository: repository.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(resource: impl Into<String>, repository: impl Into<String>) -> Self {
        RegistryError::Timeout {
            resource: resource.into(),
            repository: repository.into(),
        }
    }

    /// Returns true if another repository may still have the resource
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound { .. })
    }
}

impl IoError {
    /// Creates a new DirectoryNotFound error
    pub fn directory_not_found(path: impl Into<PathBuf>) -> Self {
        IoError::DirectoryNotFound { path: path.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_error_not_found() {
        let err = ManifestError::not_found("/path/to/build.gradle.kts");
        let msg = format!("{}", err);
        assert!(msg.contains("manifest file not found"));
        assert!(msg.contains("build.gradle.kts"));
    }

    #[test]
    fn test_manifest_error_parse() {
        let err = ManifestError::parse("build.gradle.kts", 14, "unknown configuration 'compile'");
        let msg = format!("{}", err);
        assert!(msg.contains("line 14"));
        assert!(msg.contains("unknown configuration 'compile'"));
        assert_eq!(err.line(), Some(14));
    }

    #[test]
    fn test_resolve_error_conflict() {
        let err = ResolveError::Conflict {
            module: ModuleId::new("com.example", "lib-a"),
            pins: vec![
                ConflictingPin {
                    bom: "com.example:bom-one:1.0".parse().unwrap(),
                    version: Version::parse("1.0").unwrap(),
                },
                ConflictingPin {
                    bom: "com.example:bom-two:1.0".parse().unwrap(),
                    version: Version::parse("2.0").unwrap(),
                },
            ],
        };
        let msg = format!("{}", err);
        assert!(msg.contains("conflicting BOM pins for com.example:lib-a"));
        assert!(msg.contains("1.0 (from com.example:bom-one:1.0)"));
        assert!(msg.contains("2.0 (from com.example:bom-two:1.0)"));
    }

    #[test]
    fn test_resolve_error_missing_version() {
        let err = ResolveError::MissingVersion {
            module: ModuleId::new("org.springframework.boot", "spring-boot-starter-web"),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("no version for org.springframework.boot:spring-boot-starter-web"));
    }

    #[test]
    fn test_resolve_error_lock_mismatch() {
        let err = ResolveError::LockMismatch {
            module: "com.example:lib-a".to_string(),
            locked: "1.0".to_string(),
            resolved: "2.0".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("lockfile is out of date"));
        assert!(msg.contains("locked at 1.0"));
    }

    #[test]
    fn test_registry_error_not_found() {
        let err = RegistryError::not_found("org.example:missing:1.0", "Maven Central");
        let msg = format!("{}", err);
        assert!(msg.contains("'org.example:missing:1.0' not found"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_registry_error_network() {
        let err = RegistryError::network_error("pom", "Maven Central", "connection refused");
        let msg = format!("{}", err);
        assert!(msg.contains("failed to fetch"));
        assert!(msg.contains("connection refused"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_registry_error_rate_limit() {
        let err = RegistryError::rate_limit_exceeded("Maven Central");
        let msg = format!("{}", err);
        assert!(msg.contains("rate limit exceeded"));
    }

    #[test]
    fn test_registry_error_timeout() {
        let err = RegistryError::timeout("maven-metadata.xml", "Maven Central");
        let msg = format!("{}", err);
        assert!(msg.contains("timeout"));
        assert!(msg.contains("maven-metadata.xml"));
    }

    #[test]
    fn test_phase_error_scope_violation() {
        let err = PhaseError::ScopeViolation {
            phase: Phase::Test,
            module: "org.junit.jupiter:*".to_string(),
            reason: "required by test engine JUnit Platform".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("not visible in phase 'test'"));
    }

    #[test]
    fn test_phase_error_test_failures() {
        let err = PhaseError::TestFailures { failed: 2, total: 5 };
        assert_eq!(format!("{}", err), "2 of 5 tests failed");
    }

    #[test]
    fn test_config_error_conflicting_options() {
        let err = ConfigError::ConflictingOptions {
            message: "--quiet and --verbose cannot be used together".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("conflicting options"));
    }

    #[test]
    fn test_io_error_directory_not_found() {
        let err = IoError::directory_not_found("/path/to/missing");
        let msg = format!("{}", err);
        assert!(msg.contains("directory not found"));
    }

    #[test]
    fn test_app_error_from_manifest_error() {
        let app_err: AppError = ManifestError::not_found("/path").into();
        let msg = format!("{}", app_err);
        assert!(msg.contains("manifest file not found"));
    }

    #[test]
    fn test_app_error_from_resolve_error() {
        let app_err: AppError = ResolveError::NotConverged { iterations: 64 }.into();
        let msg = format!("{}", app_err);
        assert!(msg.contains("did not converge after 64"));
    }

    #[test]
    fn test_resolve_error_from_registry_error() {
        let err: ResolveError = RegistryError::rate_limit_exceeded("Maven Central").into();
        assert!(matches!(err, ResolveError::Registry(_)));
    }

    #[test]
    fn test_error_debug_trait() {
        let err = ManifestError::not_found("/test");
        let debug = format!("{:?}", err);
        assert!(debug.contains("NotFound"));
    }
}
