//! POM and maven-metadata.xml reading
//!
//! Only the parts the resolver needs are read: coordinates, parent, properties,
//! managed dependencies and dependencies. Sections whose `<dependencies>` do not
//! belong to the project itself (build plugins, profiles, reporting) are removed
//! before extraction.

use crate::domain::{Coordinate, ModuleId};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

static PARENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<parent>(.*?)</parent>").unwrap());

static PROPERTIES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<properties>(.*?)</properties>").unwrap());

static PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<([A-Za-z_][\w.\-]*)>\s*([^<]*?)\s*</([A-Za-z_][\w.\-]*)>").unwrap()
});

static DEPENDENCY_MANAGEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<dependencyManagement>(.*?)</dependencyManagement>").unwrap()
});

static DEPENDENCIES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<dependencies>(.*?)</dependencies>").unwrap());

static DEPENDENCY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<dependency>(.*?)</dependency>").unwrap());

static EXCLUSIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<exclusions>.*?</exclusions>").unwrap());

// Sections with dependencies that are not the project's own
static FOREIGN_SECTIONS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<build>.*?</build>|<profiles>.*?</profiles>|<reporting>.*?</reporting>")
        .unwrap()
});

static METADATA_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<version>\s*([^<]+?)\s*</version>").unwrap());

static METADATA_VERSIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<versions>(.*?)</versions>").unwrap());

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

/// Returns the trimmed text of the first `<tag>` in `xml`
fn element(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = xml.find(&open)? + open.len();
    let end = xml[start..].find(&close)? + start;
    let text = xml[start..end].trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// A `<dependency>` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PomDependency {
    pub group: String,
    pub artifact: String,
    pub version: Option<String>,
    pub scope: Option<String>,
    pub kind: Option<String>,
    pub optional: bool,
}

impl PomDependency {
    fn parse(body: &str) -> Option<Self> {
        let body = EXCLUSIONS.replace_all(body, "");
        Some(Self {
            group: element(&body, "groupId")?,
            artifact: element(&body, "artifactId")?,
            version: element(&body, "version"),
            scope: element(&body, "scope"),
            kind: element(&body, "type"),
            optional: element(&body, "optional").as_deref() == Some("true"),
        })
    }

    /// `<scope>import</scope>` entries in dependencyManagement are BOM imports
    pub fn is_import(&self) -> bool {
        self.scope.as_deref() == Some("import")
    }
}

fn dependency_list(section: &str) -> Vec<PomDependency> {
    DEPENDENCIES
        .captures(section)
        .map(|caps| {
            DEPENDENCY
                .captures_iter(&caps[1])
                .filter_map(|d| PomDependency::parse(&d[1]))
                .collect()
        })
        .unwrap_or_default()
}

/// A parsed POM
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pom {
    pub group: Option<String>,
    pub artifact: Option<String>,
    pub version: Option<String>,
    pub parent: Option<Coordinate>,
    pub properties: BTreeMap<String, String>,
    /// `<dependencyManagement>` entries, own entries first
    pub managed: Vec<PomDependency>,
    pub dependencies: Vec<PomDependency>,
}

impl Pom {
    /// Parse POM XML
    pub fn parse(xml: &str) -> Result<Self, String> {
        if !xml.contains("<project") {
            return Err("not a POM: missing <project> element".to_string());
        }
        let xml = COMMENT.replace_all(xml, "");
        let xml = FOREIGN_SECTIONS.replace_all(&xml, "");

        let parent = match PARENT.captures(&xml) {
            Some(caps) => {
                let body = &caps[1];
                let (Some(group), Some(artifact), Some(version)) = (
                    element(body, "groupId"),
                    element(body, "artifactId"),
                    element(body, "version"),
                ) else {
                    return Err("incomplete <parent> element".to_string());
                };
                Some(
                    format!("{}:{}:{}", group, artifact, version)
                        .parse::<Coordinate>()
                        .map_err(|e| format!("invalid parent: {}", e))?,
                )
            }
            None => None,
        };

        let mut properties = BTreeMap::new();
        if let Some(caps) = PROPERTIES.captures(&xml) {
            for prop in PROPERTY.captures_iter(&caps[1]) {
                if prop[1] == prop[3] {
                    properties.insert(prop[1].to_string(), prop[2].to_string());
                }
            }
        }

        let managed = DEPENDENCY_MANAGEMENT
            .captures(&xml)
            .map(|caps| dependency_list(&caps[1]))
            .unwrap_or_default();

        // What is left once the nested sections are gone holds the
        // project's own coordinates and dependencies
        let rest = PARENT.replace_all(&xml, "");
        let rest = PROPERTIES.replace_all(&rest, "");
        let rest = DEPENDENCY_MANAGEMENT.replace_all(&rest, "");
        let dependencies = dependency_list(&rest);
        let rest = DEPENDENCIES.replace_all(&rest, "");

        Ok(Self {
            group: element(&rest, "groupId"),
            artifact: element(&rest, "artifactId"),
            version: element(&rest, "version"),
            parent,
            properties,
            managed,
            dependencies,
        })
    }

    /// Merge in what a parent POM passes down: coordinates, properties
    /// and managed dependencies. Own values take precedence.
    pub fn inherit(&mut self, parent: &Pom) {
        if self.group.is_none() {
            self.group = parent.group.clone();
        }
        if self.version.is_none() {
            self.version = parent.version.clone();
        }
        for (key, value) in &parent.properties {
            self.properties
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        self.managed.extend(parent.managed.iter().cloned());
    }

    fn property(&self, key: &str) -> Option<String> {
        match key {
            "project.version" | "pom.version" | "version" => self.version.clone(),
            "project.groupId" | "pom.groupId" | "groupId" => self.group.clone(),
            "project.artifactId" | "pom.artifactId" => self.artifact.clone(),
            "project.parent.version" | "parent.version" => {
                self.parent.as_ref().map(|p| p.version.to_string())
            }
            "project.parent.groupId" | "parent.groupId" => {
                self.parent.as_ref().map(|p| p.id.group.clone())
            }
            _ => self.properties.get(key).cloned(),
        }
    }

    /// Replace `${...}` placeholders; unknown ones are left in place
    pub fn interpolate(&self, value: &str) -> String {
        let mut current = value.to_string();
        // Properties may refer to other properties
        for _ in 0..8 {
            if !current.contains("${") {
                break;
            }
            let next = PLACEHOLDER
                .replace_all(&current, |caps: &regex::Captures| {
                    self.property(&caps[1]).unwrap_or_else(|| caps[0].to_string())
                })
                .into_owned();
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    /// Version a dependency's own dependencyManagement assigns to a module
    pub fn managed_version(&self, id: &ModuleId) -> Option<String> {
        self.managed
            .iter()
            .filter(|d| !d.is_import())
            .find(|d| self.interpolate(&d.group) == id.group && self.interpolate(&d.artifact) == id.artifact)
            .and_then(|d| d.version.as_deref())
            .map(|v| self.interpolate(v))
    }
}

/// Versions listed in a maven-metadata.xml document
pub fn parse_metadata_versions(xml: &str) -> Vec<String> {
    METADATA_VERSIONS
        .captures(xml)
        .map(|caps| {
            METADATA_VERSION
                .captures_iter(&caps[1])
                .map(|v| v[1].to_string())
                .collect()
        })
        .unwrap_or_default()
}
