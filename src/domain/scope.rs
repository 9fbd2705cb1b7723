//! Dependency scopes, build phases and goals
//!
//! A scope is a Gradle configuration (`implementation`, `compileOnly`, ...).
//! Each build phase sees the artifacts of a fixed set of scopes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Gradle configuration a dependency is declared in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Scope {
    /// Visible to compilation only (e.g., Lombok annotations)
    CompileOnly,
    /// Annotation processor path (source generation)
    AnnotationProcessor,
    /// Exported compile + runtime dependency (java-library)
    Api,
    /// Compile + runtime dependency
    Implementation,
    /// Runtime only
    RuntimeOnly,
    /// Test compilation only
    TestCompileOnly,
    /// Annotation processor path for test sources
    TestAnnotationProcessor,
    /// Test compile + test runtime
    TestImplementation,
    /// Test runtime only
    TestRuntimeOnly,
}

/// Kind of edge between a module and one of its own dependencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Maven `compile` scope
    Compile,
    /// Maven `runtime` scope
    Runtime,
}

impl Scope {
    /// Returns the Gradle configuration name
    pub fn configuration_name(&self) -> &'static str {
        match self {
            Scope::CompileOnly => "compileOnly",
            Scope::AnnotationProcessor => "annotationProcessor",
            Scope::Api => "api",
            Scope::Implementation => "implementation",
            Scope::RuntimeOnly => "runtimeOnly",
            Scope::TestCompileOnly => "testCompileOnly",
            Scope::TestAnnotationProcessor => "testAnnotationProcessor",
            Scope::TestImplementation => "testImplementation",
            Scope::TestRuntimeOnly => "testRuntimeOnly",
        }
    }

    /// Maps a Gradle configuration name to a scope
    pub fn from_configuration(name: &str) -> Option<Scope> {
        Scope::all()
            .iter()
            .copied()
            .find(|scope| scope.configuration_name() == name)
    }

    /// Returns all scopes
    pub fn all() -> &'static [Scope] {
        &[
            Scope::CompileOnly,
            Scope::AnnotationProcessor,
            Scope::Api,
            Scope::Implementation,
            Scope::RuntimeOnly,
            Scope::TestCompileOnly,
            Scope::TestAnnotationProcessor,
            Scope::TestImplementation,
            Scope::TestRuntimeOnly,
        ]
    }

    /// Returns true for scopes that only exist for tests
    pub fn is_test_only(&self) -> bool {
        matches!(
            self,
            Scope::TestCompileOnly
                | Scope::TestAnnotationProcessor
                | Scope::TestImplementation
                | Scope::TestRuntimeOnly
        )
    }

    /// Returns true if artifacts of this scope are visible in the phase
    pub fn is_visible_in(&self, phase: Phase) -> bool {
        phase.visible_scopes().contains(self)
    }

    /// Scope of a transitive dependency reached from this scope through an
    /// edge of the given kind. None means the edge is not followed.
    pub fn transitive(&self, edge: EdgeKind) -> Option<Scope> {
        match (self, edge) {
            (Scope::Api | Scope::Implementation, EdgeKind::Compile) => Some(*self),
            (Scope::Api | Scope::Implementation, EdgeKind::Runtime) => Some(Scope::RuntimeOnly),
            (Scope::RuntimeOnly, _) => Some(Scope::RuntimeOnly),
            (Scope::CompileOnly, EdgeKind::Compile) => Some(Scope::CompileOnly),
            (Scope::CompileOnly, EdgeKind::Runtime) => None,
            (Scope::AnnotationProcessor, _) => Some(Scope::AnnotationProcessor),
            (Scope::TestImplementation, EdgeKind::Compile) => Some(Scope::TestImplementation),
            (Scope::TestImplementation, EdgeKind::Runtime) => Some(Scope::TestRuntimeOnly),
            (Scope::TestCompileOnly, EdgeKind::Compile) => Some(Scope::TestCompileOnly),
            (Scope::TestCompileOnly, EdgeKind::Runtime) => None,
            (Scope::TestRuntimeOnly, _) => Some(Scope::TestRuntimeOnly),
            (Scope::TestAnnotationProcessor, _) => Some(Scope::TestAnnotationProcessor),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.configuration_name())
    }
}

/// A build phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    GenerateSources,
    Compile,
    GenerateTestSources,
    TestCompile,
    Test,
    Package,
}

impl Phase {
    /// Scopes whose artifacts this phase can see
    pub fn visible_scopes(&self) -> &'static [Scope] {
        match self {
            Phase::GenerateSources => &[Scope::AnnotationProcessor],
            Phase::Compile => &[Scope::CompileOnly, Scope::Api, Scope::Implementation],
            Phase::GenerateTestSources => &[Scope::TestAnnotationProcessor],
            Phase::TestCompile => &[
                Scope::Api,
                Scope::Implementation,
                Scope::TestCompileOnly,
                Scope::TestImplementation,
            ],
            Phase::Test => &[
                Scope::Api,
                Scope::Implementation,
                Scope::RuntimeOnly,
                Scope::TestImplementation,
                Scope::TestRuntimeOnly,
            ],
            Phase::Package => &[Scope::Api, Scope::Implementation, Scope::RuntimeOnly],
        }
    }

    /// Phases that must succeed before this one can run
    pub fn depends_on(&self) -> &'static [Phase] {
        match self {
            Phase::GenerateSources => &[],
            Phase::Compile => &[Phase::GenerateSources],
            Phase::GenerateTestSources => &[Phase::Compile],
            Phase::TestCompile => &[Phase::Compile, Phase::GenerateTestSources],
            Phase::Test => &[Phase::TestCompile],
            Phase::Package => &[Phase::Compile],
        }
    }

    /// Returns the phase name
    pub fn name(&self) -> &'static str {
        match self {
            Phase::GenerateSources => "generate-sources",
            Phase::Compile => "compile",
            Phase::GenerateTestSources => "generate-test-sources",
            Phase::TestCompile => "test-compile",
            Phase::Test => "test",
            Phase::Package => "package",
        }
    }

    /// Returns all phases in execution order
    pub fn all() -> &'static [Phase] {
        &[
            Phase::GenerateSources,
            Phase::Compile,
            Phase::GenerateTestSources,
            Phase::TestCompile,
            Phase::Test,
            Phase::Package,
        ]
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::all()
            .iter()
            .copied()
            .find(|phase| phase.name() == s)
            .ok_or_else(|| format!("unknown phase '{}'", s))
    }
}

/// A requested build goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Compile,
    Test,
    Build,
}

impl Goal {
    /// Phases the goal runs, in order
    pub fn phases(&self) -> &'static [Phase] {
        match self {
            Goal::Compile => &[Phase::GenerateSources, Phase::Compile],
            Goal::Test => &[
                Phase::GenerateSources,
                Phase::Compile,
                Phase::GenerateTestSources,
                Phase::TestCompile,
                Phase::Test,
            ],
            Goal::Build => Phase::all(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Goal::Compile => "compile",
            Goal::Test => "test",
            Goal::Build => "build",
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Goal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Goal::Compile, Goal::Test, Goal::Build]
            .into_iter()
            .find(|goal| goal.name() == s)
            .ok_or_else(|| format!("unknown goal '{}', expected compile, test or build", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_configuration() {
        assert_eq!(
            Scope::from_configuration("compileOnly"),
            Some(Scope::CompileOnly)
        );
        assert_eq!(
            Scope::from_configuration("testImplementation"),
            Some(Scope::TestImplementation)
        );
        assert_eq!(Scope::from_configuration("compile"), None);
    }

    #[test]
    fn test_configuration_name_roundtrip() {
        for scope in Scope::all() {
            assert_eq!(
                Scope::from_configuration(scope.configuration_name()),
                Some(*scope)
            );
        }
    }

    #[test]
    fn test_test_only_scopes_invisible_to_compile() {
        for scope in Scope::all().iter().filter(|s| s.is_test_only()) {
            assert!(!scope.is_visible_in(Phase::Compile), "{} leaked", scope);
            assert!(!scope.is_visible_in(Phase::Package), "{} leaked", scope);
        }
    }

    #[test]
    fn test_annotation_processor_only_in_generate_sources() {
        for phase in Phase::all() {
            assert_eq!(
                Scope::AnnotationProcessor.is_visible_in(*phase),
                *phase == Phase::GenerateSources
            );
        }
    }

    #[test]
    fn test_compile_only_not_in_runtime() {
        assert!(Scope::CompileOnly.is_visible_in(Phase::Compile));
        assert!(!Scope::CompileOnly.is_visible_in(Phase::Test));
        assert!(!Scope::CompileOnly.is_visible_in(Phase::Package));
    }

    #[test]
    fn test_transitive_scopes() {
        assert_eq!(
            Scope::Implementation.transitive(EdgeKind::Runtime),
            Some(Scope::RuntimeOnly)
        );
        assert_eq!(
            Scope::TestImplementation.transitive(EdgeKind::Runtime),
            Some(Scope::TestRuntimeOnly)
        );
        assert_eq!(Scope::CompileOnly.transitive(EdgeKind::Runtime), None);
        assert_eq!(
            Scope::AnnotationProcessor.transitive(EdgeKind::Runtime),
            Some(Scope::AnnotationProcessor)
        );
    }

    #[test]
    fn test_phase_dependencies_precede() {
        for phase in Phase::all() {
            for dep in phase.depends_on() {
                assert!(dep < phase, "{} must precede {}", dep, phase);
            }
        }
    }

    #[test]
    fn test_goal_phases() {
        assert_eq!(Goal::Compile.phases().len(), 2);
        assert_eq!(Goal::Test.phases().last(), Some(&Phase::Test));
        assert_eq!(Goal::Build.phases().last(), Some(&Phase::Package));
    }

    #[test]
    fn test_phase_from_str() {
        assert_eq!("test-compile".parse::<Phase>(), Ok(Phase::TestCompile));
        assert!("deploy".parse::<Phase>().is_err());
    }

    #[test]
    fn test_goal_from_str() {
        assert_eq!("build".parse::<Goal>(), Ok(Goal::Build));
        assert!("deploy".parse::<Goal>().unwrap_err().contains("deploy"));
    }

    #[test]
    fn test_serde_scope() {
        let json = serde_json::to_string(&Scope::TestRuntimeOnly).unwrap();
        assert_eq!(json, "\"testRuntimeOnly\"");
    }
}
