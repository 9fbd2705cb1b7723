//! Declarations read from a build manifest

use super::{Coordinate, ModuleId, Scope, VersionConstraint};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Plugin that implies the Spring Boot BOM when dependency management is on
pub const SPRING_BOOT_PLUGIN: &str = "org.springframework.boot";

/// Plugin that enables BOM-based dependency management
pub const DEPENDENCY_MANAGEMENT_PLUGIN: &str = "io.spring.dependency-management";

/// A dependency as declared in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDeclaration {
    /// Module identifier
    pub id: ModuleId,
    /// Version constraint
    pub constraint: VersionConstraint,
    /// Configuration the dependency is declared in
    pub scope: Scope,
    /// Line number (1-based) in the manifest
    pub line: usize,
    /// Variable the version came from, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable_name: Option<String>,
}

impl DependencyDeclaration {
    /// Creates a new declaration
    pub fn new(id: ModuleId, constraint: VersionConstraint, scope: Scope) -> Self {
        Self {
            id,
            constraint,
            scope,
            line: 0,
            variable_name: None,
        }
    }

    /// Sets the source line (builder pattern)
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    /// Sets the variable name for this declaration (builder pattern)
    pub fn with_variable(mut self, var_name: impl Into<String>) -> Self {
        self.variable_name = Some(var_name.into());
        self
    }
}

impl fmt::Display for DependencyDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}:{})", self.scope, self.id, self.constraint)
    }
}

/// How a BOM was imported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    /// `platform(...)`
    Platform,
    /// `enforcedPlatform(...)`
    EnforcedPlatform,
    /// `dependencyManagement { imports { mavenBom(...) } }`
    MavenBom,
    /// Implied by a plugin (e.g., the Spring Boot BOM)
    Plugin,
}

/// A BOM/platform import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformImport {
    /// BOM coordinate
    pub coordinate: Coordinate,
    /// How it was imported
    pub kind: ImportKind,
    /// Configuration it was declared in (None for block/plugin imports)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    /// Line number (1-based), 0 when implied
    pub line: usize,
}

impl PlatformImport {
    pub fn new(coordinate: Coordinate, kind: ImportKind) -> Self {
        Self {
            coordinate,
            kind,
            scope: None,
            line: 0,
        }
    }

    pub fn in_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }
}

/// A plugin from the `plugins {}` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDeclaration {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub line: usize,
}

impl PluginDeclaration {
    /// Core plugins (`java`, `java-library`, ...) ship with the build tool
    /// and carry no version
    pub fn is_core(id: &str) -> bool {
        !id.contains('.')
    }
}

/// Test framework selected in the test task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestEngine {
    /// `useJUnitPlatform()`
    JUnitPlatform,
    /// `useJUnit()`
    JUnit4,
    /// `useTestNG()`
    TestNg,
}

impl TestEngine {
    /// Annotations that mark a test method for this engine
    pub fn test_annotations(&self) -> &'static [&'static str] {
        match self {
            TestEngine::JUnitPlatform => {
                &["Test", "ParameterizedTest", "RepeatedTest", "TestFactory"]
            }
            TestEngine::JUnit4 | TestEngine::TestNg => &["Test"],
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TestEngine::JUnitPlatform => "JUnit Platform",
            TestEngine::JUnit4 => "JUnit 4",
            TestEngine::TestNg => "TestNG",
        }
    }
}

/// A repository from the `repositories {}` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Repository {
    MavenCentral,
    Google,
    MavenLocal,
    Maven { url: String },
}

impl Repository {
    /// Base URL for remote repositories; None for the local repository
    pub fn url(&self) -> Option<&str> {
        match self {
            Repository::MavenCentral => Some("https://repo.maven.apache.org/maven2"),
            Repository::Google => Some("https://dl.google.com/dl/android/maven2"),
            Repository::MavenLocal => None,
            Repository::Maven { url } => Some(url.as_str()),
        }
    }
}

/// A parsed build manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub plugins: Vec<PluginDeclaration>,
    pub repositories: Vec<Repository>,
    pub dependencies: Vec<DependencyDeclaration>,
    pub platforms: Vec<PlatformImport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_engine: Option<TestEngine>,
}

impl Manifest {
    /// Returns the declared plugin with the given id
    pub fn plugin(&self, id: &str) -> Option<&PluginDeclaration> {
        self.plugins.iter().find(|p| p.id == id)
    }

    /// Returns true if the dependency-management plugin is applied
    pub fn has_dependency_management(&self) -> bool {
        self.plugin(DEPENDENCY_MANAGEMENT_PLUGIN).is_some()
    }

    /// Returns true if any BOM source is present
    pub fn has_bom_source(&self) -> bool {
        !self.platforms.is_empty() || self.has_dependency_management()
    }

    /// Declarations in a given scope
    pub fn dependencies_in(&self, scope: Scope) -> impl Iterator<Item = &DependencyDeclaration> {
        self.dependencies.iter().filter(move |d| d.scope == scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Version;

    fn lombok() -> DependencyDeclaration {
        DependencyDeclaration::new(
            ModuleId::new("org.projectlombok", "lombok"),
            VersionConstraint::exact(Version::parse("1.18.38").unwrap()),
            Scope::CompileOnly,
        )
    }

    #[test]
    fn test_declaration_display() {
        assert_eq!(
            lombok().to_string(),
            "compileOnly(org.projectlombok:lombok:1.18.38)"
        );
    }

    #[test]
    fn test_declaration_builders() {
        let decl = lombok().at_line(12).with_variable("lombokVersion");
        assert_eq!(decl.line, 12);
        assert_eq!(decl.variable_name.as_deref(), Some("lombokVersion"));
    }

    #[test]
    fn test_core_plugins() {
        assert!(PluginDeclaration::is_core("java"));
        assert!(PluginDeclaration::is_core("java-library"));
        assert!(!PluginDeclaration::is_core("org.springframework.boot"));
    }

    #[test]
    fn test_has_bom_source() {
        let mut manifest = Manifest::default();
        assert!(!manifest.has_bom_source());

        manifest.plugins.push(PluginDeclaration {
            id: DEPENDENCY_MANAGEMENT_PLUGIN.to_string(),
            version: Some("1.1.6".to_string()),
            line: 3,
        });
        assert!(manifest.has_bom_source());
    }

    #[test]
    fn test_dependencies_in() {
        let manifest = Manifest {
            dependencies: vec![lombok()],
            ..Default::default()
        };
        assert_eq!(manifest.dependencies_in(Scope::CompileOnly).count(), 1);
        assert_eq!(manifest.dependencies_in(Scope::Implementation).count(), 0);
    }

    #[test]
    fn test_repository_urls() {
        assert_eq!(
            Repository::MavenCentral.url(),
            Some("https://repo.maven.apache.org/maven2")
        );
        assert_eq!(Repository::MavenLocal.url(), None);
    }

    #[test]
    fn test_engine_annotations() {
        assert!(TestEngine::JUnitPlatform
            .test_annotations()
            .contains(&"ParameterizedTest"));
        assert_eq!(TestEngine::JUnit4.test_annotations(), &["Test"]);
    }
}
