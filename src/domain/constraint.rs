//! Version constraints as written in Gradle dependency notation
//!
//! Handles:
//! - Fixed versions: `1.2.3`, `1.2.3-SNAPSHOT`, `5.0.0.RELEASE`
//! - Prefix versions: `1.2.+`, `+`
//! - Dynamic versions: `latest.release`, `latest.integration`
//! - Maven-style ranges: `[1.0,2.0]`, `[1.0,)`, `(,2.0]`, `[1.0,2.0)`, `[1.0]`
//! - Versionless (managed) declarations whose version comes from a BOM

use super::Version;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

// Standard version: 1.2.3 or 1.2.3-SNAPSHOT or 1.2.3.RELEASE
static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)*(?:[.-][A-Za-z0-9]+)*$").unwrap());

// Prefix version: 1.2.+ or 1.+
static PREFIX_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)*)\.\+$").unwrap());

// Maven-style range, lower and upper bounds may each be empty
static MAVEN_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([\[\(])\s*([0-9][0-9A-Za-z.\-]*)?\s*,\s*([0-9][0-9A-Za-z.\-]*)?\s*([\]\)])$")
        .unwrap()
});

// Single-version range: [1.0]
static MAVEN_EXACT_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[\s*([0-9][0-9A-Za-z.\-]*)\s*\]$").unwrap());

/// One end of a version range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bound {
    pub version: Version,
    pub inclusive: bool,
}

/// A Maven-style version range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRange {
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
}

impl VersionRange {
    /// Returns true if the version falls inside the range
    pub fn contains(&self, version: &Version) -> bool {
        let above_lower = match &self.lower {
            Some(b) if b.inclusive => version >= &b.version,
            Some(b) => version > &b.version,
            None => true,
        };
        let below_upper = match &self.upper {
            Some(b) if b.inclusive => version <= &b.version,
            Some(b) => version < &b.version,
            None => true,
        };
        above_lower && below_upper
    }

    fn mentions_prerelease(&self) -> bool {
        self.lower
            .iter()
            .chain(self.upper.iter())
            .any(|b| b.version.is_prerelease())
    }
}

/// A version constraint attached to a dependency declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VersionConstraint {
    /// A concrete version, e.g. `1.18.38`
    Exact { version: Version },
    /// A Maven range, e.g. `[1.0,2.0)`
    Range { raw: String, range: VersionRange },
    /// A prefix, e.g. `5.3.+`; an empty prefix matches everything (`+`)
    Prefix { prefix: String },
    /// `latest.release` or `latest.integration`
    Latest { integration: bool },
    /// No version; must be supplied by a BOM/platform pin
    Managed,
}

impl VersionConstraint {
    /// Parse a version constraint string. Returns None if it is not a
    /// recognizable constraint. An empty string is `Managed`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Some(VersionConstraint::Managed);
        }

        if trimmed == "+" {
            return Some(VersionConstraint::Prefix {
                prefix: String::new(),
            });
        }

        match trimmed {
            "latest.release" => return Some(VersionConstraint::Latest { integration: false }),
            "latest.integration" => {
                return Some(VersionConstraint::Latest { integration: true })
            }
            _ => {}
        }

        if let Some(caps) = MAVEN_EXACT_RANGE_RE.captures(trimmed) {
            let version = Version::parse(caps.get(1)?.as_str())?;
            let bound = Bound {
                version,
                inclusive: true,
            };
            return Some(VersionConstraint::Range {
                raw: trimmed.to_string(),
                range: VersionRange {
                    lower: Some(bound.clone()),
                    upper: Some(bound),
                },
            });
        }

        if let Some(caps) = MAVEN_RANGE_RE.captures(trimmed) {
            let lower_inclusive = caps.get(1).map(|m| m.as_str()) == Some("[");
            let upper_inclusive = caps.get(4).map(|m| m.as_str()) == Some("]");
            let lower = caps
                .get(2)
                .and_then(|m| Version::parse(m.as_str()))
                .map(|version| Bound {
                    version,
                    inclusive: lower_inclusive,
                });
            let upper = caps
                .get(3)
                .and_then(|m| Version::parse(m.as_str()))
                .map(|version| Bound {
                    version,
                    inclusive: upper_inclusive,
                });
            if lower.is_none() && upper.is_none() {
                return None;
            }
            return Some(VersionConstraint::Range {
                raw: trimmed.to_string(),
                range: VersionRange { lower, upper },
            });
        }

        if let Some(caps) = PREFIX_VERSION_RE.captures(trimmed) {
            return Some(VersionConstraint::Prefix {
                prefix: caps.get(1)?.as_str().to_string(),
            });
        }

        if VERSION_RE.is_match(trimmed) {
            return Some(VersionConstraint::Exact {
                version: Version::parse(trimmed)?,
            });
        }

        None
    }

    /// Creates an exact constraint
    pub fn exact(version: Version) -> Self {
        VersionConstraint::Exact { version }
    }

    /// Returns the requested version if this constraint names exactly one
    pub fn exact_version(&self) -> Option<&Version> {
        match self {
            VersionConstraint::Exact { version } => Some(version),
            _ => None,
        }
    }

    /// Returns true if the version must come from a BOM
    pub fn is_managed(&self) -> bool {
        matches!(self, VersionConstraint::Managed)
    }

    /// Returns true if the constraint needs a version listing to pick a version
    pub fn is_dynamic(&self) -> bool {
        matches!(
            self,
            VersionConstraint::Range { .. }
                | VersionConstraint::Prefix { .. }
                | VersionConstraint::Latest { .. }
        )
    }

    /// Returns true if the version satisfies the constraint.
    /// `Managed` accepts any version.
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            VersionConstraint::Exact { version: wanted } => version == wanted,
            VersionConstraint::Range { range, .. } => range.contains(version),
            VersionConstraint::Prefix { prefix } => {
                prefix.is_empty()
                    || version.as_str() == prefix
                    || version
                        .as_str()
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('.'))
            }
            VersionConstraint::Latest { integration } => *integration || !version.is_prerelease(),
            VersionConstraint::Managed => true,
        }
    }

    /// Picks the highest available version satisfying this constraint.
    /// Pre-releases are only eligible when the constraint itself names one
    /// or asks for `latest.integration`.
    pub fn select<'a>(&self, available: &'a [Version]) -> Option<&'a Version> {
        let allow_prerelease = match self {
            VersionConstraint::Exact { version } => version.is_prerelease(),
            VersionConstraint::Range { range, .. } => range.mentions_prerelease(),
            VersionConstraint::Latest { integration } => *integration,
            VersionConstraint::Prefix { .. } | VersionConstraint::Managed => false,
        };
        available
            .iter()
            .filter(|v| allow_prerelease || !v.is_prerelease())
            .filter(|v| self.matches(v))
            .max()
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionConstraint::Exact { version } => write!(f, "{}", version),
            VersionConstraint::Range { raw, .. } => write!(f, "{}", raw),
            VersionConstraint::Prefix { prefix } if prefix.is_empty() => write!(f, "+"),
            VersionConstraint::Prefix { prefix } => write!(f, "{}.+", prefix),
            VersionConstraint::Latest { integration: false } => write!(f, "latest.release"),
            VersionConstraint::Latest { integration: true } => write!(f, "latest.integration"),
            VersionConstraint::Managed => write!(f, "(managed)"),
        }
    }
}
