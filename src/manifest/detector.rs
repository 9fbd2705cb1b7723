//! Build script detection
//!
//! Looks for `build.gradle.kts` first and falls back to `build.gradle`.

use crate::error::ManifestError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Build script dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// build.gradle.kts
    Kotlin,
    /// build.gradle
    Groovy,
}

impl Dialect {
    /// Returns the manifest filename for this dialect
    pub fn manifest_filename(&self) -> &'static str {
        match self {
            Dialect::Kotlin => "build.gradle.kts",
            Dialect::Groovy => "build.gradle",
        }
    }

    /// Returns the display name for this dialect
    pub fn display_name(&self) -> &'static str {
        match self {
            Dialect::Kotlin => "Gradle Kotlin DSL",
            Dialect::Groovy => "Gradle Groovy DSL",
        }
    }

    /// Returns all dialects in detection order
    pub fn all() -> &'static [Dialect] {
        &[Dialect::Kotlin, Dialect::Groovy]
    }

    /// Determines the dialect from a manifest path
    pub fn from_path(path: &Path) -> Option<Dialect> {
        let name = path.file_name()?.to_str()?;
        if name.ends_with(".gradle.kts") {
            Some(Dialect::Kotlin)
        } else if name.ends_with(".gradle") {
            Some(Dialect::Groovy)
        } else {
            None
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Information about a detected manifest file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestInfo {
    /// Path to the manifest file
    pub path: PathBuf,
    /// Dialect of the manifest
    pub dialect: Dialect,
}

impl ManifestInfo {
    /// Create a new ManifestInfo
    pub fn new(path: impl Into<PathBuf>, dialect: Dialect) -> Self {
        Self {
            path: path.into(),
            dialect,
        }
    }

    /// Describes an explicitly given manifest path
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, ManifestError> {
        let path = path.into();
        let dialect = Dialect::from_path(&path)
            .ok_or_else(|| ManifestError::UnsupportedFormat { path: path.clone() })?;
        Ok(Self::new(path, dialect))
    }
}

/// Detect the build script in the given directory
pub fn detect_manifest(dir: &Path) -> Result<ManifestInfo, ManifestError> {
    Dialect::all()
        .iter()
        .map(|dialect| ManifestInfo::new(dir.join(dialect.manifest_filename()), *dialect))
        .find(|info| info.path.is_file())
        .ok_or_else(|| ManifestError::not_found(dir.join(Dialect::Kotlin.manifest_filename())))
}
