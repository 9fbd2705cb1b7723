//! Module identifiers and coordinates

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Version;

/// A module identifier in `group:artifact` form
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleId {
    /// Group (e.g., `org.projectlombok`)
    pub group: String,
    /// Artifact (e.g., `lombok`)
    pub artifact: String,
}

impl ModuleId {
    /// Creates a new ModuleId
    pub fn new(group: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)
    }
}

impl FromStr for ModuleId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        match parts.as_slice() {
            [group, artifact] if !group.is_empty() && !artifact.is_empty() => {
                Ok(ModuleId::new(*group, *artifact))
            }
            _ => Err(format!("invalid module id '{}', expected 'group:artifact'", s)),
        }
    }
}

impl TryFrom<String> for ModuleId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModuleId> for String {
    fn from(id: ModuleId) -> Self {
        id.to_string()
    }
}

/// A fully versioned coordinate `group:artifact:version`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Coordinate {
    pub id: ModuleId,
    pub version: Version,
}

impl Coordinate {
    pub fn new(id: ModuleId, version: Version) -> Self {
        Self { id, version }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.version)
    }
}

impl FromStr for Coordinate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        match parts.as_slice() {
            [group, artifact, version]
                if !group.is_empty() && !artifact.is_empty() && !version.is_empty() =>
            {
                let version = Version::parse(version)
                    .ok_or_else(|| format!("invalid version in coordinate '{}'", s))?;
                Ok(Coordinate::new(ModuleId::new(*group, *artifact), version))
            }
            _ => Err(format!(
                "invalid coordinate '{}', expected 'group:artifact:version'",
                s
            )),
        }
    }
}

impl TryFrom<String> for Coordinate {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Coordinate> for String {
    fn from(coordinate: Coordinate) -> Self {
        coordinate.to_string()
    }
}
