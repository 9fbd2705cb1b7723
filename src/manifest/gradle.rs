//! Gradle manifest parser for Java projects
//!
//! Handles:
//! - build.gradle (Groovy DSL)
//! - build.gradle.kts (Kotlin DSL)
//! - Variable definitions (def, val, ext block, extra properties)
//! - Map notation dependencies: group: 'x', name: 'y', version: 'z'
//! - Named argument dependencies: group = "x", name = "y", version = "z"
//! - String notation dependencies: 'group:name:version' and 'group:name'
//! - platform() / enforcedPlatform() and mavenBom imports
//! - Variable references in versions
//! - The test task's framework directive

use crate::domain::{
    Coordinate, DependencyDeclaration, ImportKind, Manifest, ModuleId, PlatformImport,
    PluginDeclaration, Repository, Scope, TestEngine, VersionConstraint,
};
use crate::error::ManifestError;
use crate::manifest::scan::{scan, Token};
use crate::manifest::{Dialect, ManifestParser};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, trace, warn};

/// Parser for build.gradle and build.gradle.kts files
pub struct GradleParser {
    dialect: Dialect,
}

// Regex patterns for Gradle DSL

// Variable definition: def v = '1.0', val v = "1.0", val v: String = "1.0"
static VAR_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:def|val|var)\s+(\w+)(?:\s*:\s*\w+)?\s*=\s*["']([^"']*)["']$"#).unwrap()
});

// Extra property: ext.v = '1.0'
static EXT_DOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:project\s*\.\s*)?ext\s*\.\s*(\w+)\s*=\s*["']([^"']*)["']$"#).unwrap()
});

// Extra property: extra["v"] = "1.0" or ext['v'] = '1.0'
static EXT_INDEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:project\s*\.\s*)?(?:ext|extra)\s*\[\s*["'](\w+)["']\s*\]\s*=\s*["']([^"']*)["']$"#)
        .unwrap()
});

// Kotlin delegated extra property: val v by extra("1.0")
static VAL_BY_EXTRA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^val\s+(\w+)(?:\s*:\s*\w+)?\s+by\s+extra\s*\(\s*["']([^"']*)["']\s*\)$"#).unwrap()
});

// ext block variable: v = '1.0' or set("v", "1.0")
static EXT_BLOCK_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^(\w+)\s*=\s*["']([^"']*)["']$"#).unwrap());
static EXT_BLOCK_SET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^set\s*\(\s*["'](\w+)["']\s*,\s*["']([^"']*)["']\s*\)$"#).unwrap()
});

// group = "com" / version '1.0'
static PROJECT_PROPERTY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^(group|version)\s*=?\s*["']([^"']*)["']$"#).unwrap());

// apply plugin: 'x' / apply(plugin = "x")
static APPLY_PLUGIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^apply\s*\(?\s*plugin\s*[:=]\s*["']([^"']*)["']\s*\)?$"#).unwrap()
});

// id("x") version "y" / id 'x' version 'y' / ... apply false
static PLUGIN_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^id\s*\(?\s*["']([^"']*)["']\s*\)?(?:\s*version\s*\(?\s*["']([^"']*)["']\s*\)?)?(\s+apply\s*\(?\s*false\s*\)?)?$"#,
    )
    .unwrap()
});

// kotlin("jvm") version "2.0.0"
static PLUGIN_KOTLIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^kotlin\s*\(\s*["']([^"']+)["']\s*\)(?:\s*version\s*\(?\s*["']([^"']*)["']\s*\)?)?(\s+apply\s*\(?\s*false\s*\)?)?$"#,
    )
    .unwrap()
});

// java / `java-library` / application
static PLUGIN_CORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^`?([A-Za-z][A-Za-z0-9_-]*)`?$").unwrap());

static REPO_SIMPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(mavenCentral|google|mavenLocal|gradlePluginPortal)\s*\(\s*\)$").unwrap()
});

// maven("url") / maven(url = "url") / maven(url = uri("url"))
static REPO_MAVEN_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^maven\s*\(\s*(?:url\s*[:=]\s*)?(?:uri\s*\(\s*)?["']([^"']+)["']"#).unwrap()
});

// url = uri("x") / url "x" / setUrl("x")
static MAVEN_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:url|setUrl)\s*(?:=\s*|\(\s*|\s+)(?:uri\s*\(\s*)?["']([^"']+)["']"#).unwrap()
});

// configuration name followed by its arguments
static DEP_STATEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z_]\w*)\s*(.*)$").unwrap());

static PLATFORM_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(platform|enforcedPlatform)\s*(?:\(\s*(.+?)\s*\)|\s(.+))$").unwrap()
});

static STRING_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^["']([^"']*)["']$"#).unwrap());

// key: 'value', key = "value" or key: variableName
static MAP_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\w+)\s*[:=]\s*(?:["']([^"']*)["']|([A-Za-z_][\w.]*))"#).unwrap()
});

static MAP_NOTATION_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^group\s*[:=]").unwrap());

// $name or ${name}
static INTERPOLATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{(\w+)\}|\$(\w+)").unwrap());

// test / tasks.test / tasks.named<Test>("test") / tasks.withType<Test> / tasks.withType(Test)
static TEST_TASK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?:tasks\s*\.\s*)?(?:test|(?:named|getByName)\s*(?:<\s*Test\s*>)?\s*\(\s*["']test["']\s*\)|withType\s*(?:<\s*Test\s*>(?:\s*\(\s*\))?|\(\s*Test(?:::class(?:\.java)?)?\s*\)))$"#,
    )
    .unwrap()
});

static ENGINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(useJUnitPlatform|useJUnitJupiter|useJUnit|useTestNG)\s*(?:\(.*\))?$").unwrap()
});

static MAVEN_BOM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^mavenBom\s*\(?\s*["']([^"']*)["']\s*\)?$"#).unwrap()
});

/// Block context of a statement
#[derive(Debug, Clone, PartialEq, Eq)]
enum Block {
    Plugins,
    Repositories,
    Maven { url: Option<String> },
    Dependencies,
    Ext,
    DependencyManagement,
    BomImports,
    Tasks,
    TestTask,
    /// Contents are not interpreted
    Other,
}

impl GradleParser {
    /// Creates a parser for the given dialect
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// Extract variable definitions from scanned tokens
    fn extract_variables(&self, tokens: &[Token]) -> HashMap<String, String> {
        let mut variables = HashMap::new();
        let mut headers: Vec<&str> = Vec::new();

        for token in tokens {
            match token {
                Token::Open { header, .. } => headers.push(header.as_str()),
                Token::Close { .. } => {
                    headers.pop();
                }
                Token::Statement { text, .. } => {
                    let in_ext_block = matches!(headers.last(), Some(&"ext") | Some(&"extra"));
                    let caps = if in_ext_block {
                        EXT_BLOCK_VAR
                            .captures(text)
                            .or_else(|| EXT_BLOCK_SET.captures(text))
                    } else {
                        VAR_DEF
                            .captures(text)
                            .or_else(|| EXT_DOT.captures(text))
                            .or_else(|| EXT_INDEX.captures(text))
                            .or_else(|| VAL_BY_EXTRA.captures(text))
                    };

                    if let Some(caps) = caps {
                        let name = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                        let value = caps.get(2).map(|m| m.as_str()).unwrap_or("");
                        if !name.is_empty() {
                            let value = interpolate_lenient(value, &variables);
                            trace!(variable = name, value = value.as_str(), "variable defined");
                            variables.insert(name.to_string(), value);
                        }
                    }
                }
            }
        }

        variables
    }

    /// Classify a block from its header and the enclosing block
    fn classify(parent: Option<&Block>, header: &str) -> Block {
        match parent {
            None => match header {
                "plugins" => Block::Plugins,
                "repositories" => Block::Repositories,
                "dependencies" => Block::Dependencies,
                "ext" | "extra" => Block::Ext,
                "dependencyManagement" => Block::DependencyManagement,
                "tasks" => Block::Tasks,
                _ if TEST_TASK_HEADER.is_match(header) => Block::TestTask,
                _ => Block::Other,
            },
            Some(Block::Repositories) if header == "maven" => Block::Maven { url: None },
            Some(Block::DependencyManagement) if header == "imports" => Block::BomImports,
            Some(Block::Tasks) if TEST_TASK_HEADER.is_match(header) => Block::TestTask,
            _ => Block::Other,
        }
    }
}

impl ManifestParser for GradleParser {
    fn parse(&self, path: &Path, content: &str) -> Result<Manifest, ManifestError> {
        let tokens =
            scan(content).map_err(|e| ManifestError::parse(path, e.line, e.message))?;
        let variables = self.extract_variables(&tokens);
        debug!(
            path = %path.display(),
            dialect = %self.dialect,
            variables = variables.len(),
            "parsing manifest"
        );

        let mut interpreter = Interpreter {
            path,
            variables,
            manifest: Manifest::default(),
            blocks: Vec::new(),
        };
        for token in &tokens {
            interpreter.token(token)?;
        }
        interpreter.finish()
    }

    fn dialect(&self) -> Dialect {
        self.dialect
    }
}

/// Walks the scanned tokens and fills in the manifest
struct Interpreter<'a> {
    path: &'a Path,
    variables: HashMap<String, String>,
    manifest: Manifest,
    blocks: Vec<Block>,
}

impl Interpreter<'_> {
    fn error(&self, line: usize, message: impl Into<String>) -> ManifestError {
        ManifestError::parse(self.path, line, message)
    }

    fn token(&mut self, token: &Token) -> Result<(), ManifestError> {
        match token {
            Token::Open { header, line } => {
                match self.blocks.last().cloned() {
                    // implementation("g:a:v") { exclude(...) }
                    Some(Block::Dependencies) if header != "constraints" => {
                        self.dependency(header, *line)?;
                    }
                    Some(Block::TestTask) => self.test_directive(header),
                    _ => {}
                }
                let block = GradleParser::classify(self.blocks.last(), header);
                trace!(header = header.as_str(), ?block, line, "open block");
                self.blocks.push(block);
            }
            Token::Close { .. } => {
                if let Some(Block::Maven { url: Some(url) }) = self.blocks.pop() {
                    self.manifest.repositories.push(Repository::Maven { url });
                }
            }
            Token::Statement { text, line } => self.statement(text, *line)?,
        }
        Ok(())
    }

    fn statement(&mut self, text: &str, line: usize) -> Result<(), ManifestError> {
        match self.blocks.last().cloned() {
            None => self.top_level(text, line),
            Some(Block::Plugins) => self.plugin(text, line),
            Some(Block::Repositories) => {
                self.repository(text);
                Ok(())
            }
            Some(Block::Maven { .. }) => {
                if let Some(caps) = MAVEN_URL.captures(text) {
                    let url = self.interpolate(&caps[1], line)?.0;
                    if let Some(Block::Maven { url: slot }) = self.blocks.last_mut() {
                        *slot = Some(url);
                    }
                }
                Ok(())
            }
            Some(Block::Dependencies) => self.dependency(text, line),
            Some(Block::BomImports) => self.maven_bom(text, line),
            Some(Block::TestTask) => {
                self.test_directive(text);
                Ok(())
            }
            Some(
                Block::Ext | Block::DependencyManagement | Block::Tasks | Block::Other,
            ) => Ok(()),
        }
    }

    fn top_level(&mut self, text: &str, line: usize) -> Result<(), ManifestError> {
        if let Some(caps) = PROJECT_PROPERTY.captures(text) {
            let value = self.interpolate(&caps[2], line)?.0;
            match &caps[1] {
                "group" => self.manifest.group = Some(value),
                _ => self.manifest.version = Some(value),
            }
        } else if let Some(caps) = APPLY_PLUGIN.captures(text) {
            let id = caps[1].to_string();
            if id.is_empty() {
                return Err(self.error(line, "plugin declaration without an id"));
            }
            // Version comes from the buildscript classpath
            self.manifest.plugins.push(PluginDeclaration {
                id,
                version: None,
                line,
            });
        } else {
            trace!(line, statement = text, "ignored top-level statement");
        }
        Ok(())
    }

    fn plugin(&mut self, text: &str, line: usize) -> Result<(), ManifestError> {
        if text.starts_with("alias") {
            return Err(self.error(line, "version catalog plugin aliases are not supported"));
        }

        let (id, version, applied) = if let Some(caps) = PLUGIN_ID.captures(text) {
            (
                caps[1].to_string(),
                caps.get(2).map(|m| m.as_str().to_string()),
                caps.get(3).is_none(),
            )
        } else if let Some(caps) = PLUGIN_KOTLIN.captures(text) {
            (
                format!("org.jetbrains.kotlin.{}", &caps[1]),
                caps.get(2).map(|m| m.as_str().to_string()),
                caps.get(3).is_none(),
            )
        } else if let Some(caps) = PLUGIN_CORE.captures(text) {
            (caps[1].to_string(), None, true)
        } else {
            return Err(self.error(line, format!("unrecognized plugin declaration '{}'", text)));
        };

        if id.is_empty() {
            return Err(self.error(line, "plugin declaration without an id"));
        }

        let version = match version {
            Some(v) => Some(self.interpolate(&v, line)?.0).filter(|v| !v.is_empty()),
            None => None,
        };
        if version.is_none() && !PluginDeclaration::is_core(&id) {
            return Err(self.error(line, format!("plugin '{}' has no version", id)));
        }

        if !applied {
            debug!(plugin = id.as_str(), "plugin declared with apply false");
            return Ok(());
        }
        self.manifest.plugins.push(PluginDeclaration { id, version, line });
        Ok(())
    }

    fn repository(&mut self, text: &str) {
        let repository = if let Some(caps) = REPO_SIMPLE.captures(text) {
            match &caps[1] {
                "mavenCentral" => Repository::MavenCentral,
                "google" => Repository::Google,
                "mavenLocal" => Repository::MavenLocal,
                _ => Repository::Maven {
                    url: "https://plugins.gradle.org/m2".to_string(),
                },
            }
        } else if let Some(caps) = REPO_MAVEN_CALL.captures(text) {
            Repository::Maven {
                url: interpolate_lenient(&caps[1], &self.variables),
            }
        } else {
            debug!(statement = text, "ignored repository declaration");
            return;
        };
        self.manifest.repositories.push(repository);
    }

    fn test_directive(&mut self, text: &str) {
        if let Some(caps) = ENGINE.captures(text) {
            let engine = match &caps[1] {
                "useJUnit" => TestEngine::JUnit4,
                "useTestNG" => TestEngine::TestNg,
                _ => TestEngine::JUnitPlatform,
            };
            self.manifest.test_engine = Some(engine);
        }
    }

    fn maven_bom(&mut self, text: &str, line: usize) -> Result<(), ManifestError> {
        if let Some(caps) = MAVEN_BOM.captures(text) {
            let coordinate = self.bom_coordinate(&caps[1], line)?;
            self.manifest
                .platforms
                .push(PlatformImport::new(coordinate, ImportKind::MavenBom).at_line(line));
        } else if text.starts_with("mavenBom") {
            debug!(line, statement = text, "mavenBom argument is not a literal, skipped");
        }
        Ok(())
    }

    fn dependency(&mut self, text: &str, line: usize) -> Result<(), ManifestError> {
        let Some(caps) = DEP_STATEMENT.captures(text) else {
            return Err(self.error(line, format!("unrecognized dependency declaration '{}'", text)));
        };
        let configuration = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let rest = strip_outer_parens(caps.get(2).map(|m| m.as_str()).unwrap_or(""));

        let scope = Scope::from_configuration(configuration).ok_or_else(|| {
            self.error(line, format!("unknown configuration '{}'", configuration))
        })?;

        if rest.is_empty() {
            return Err(self.error(line, format!("'{}' declares no dependency", configuration)));
        }
        if rest.starts_with("project") {
            warn!(line, dependency = rest, "project dependencies are not supported, skipped");
            return Ok(());
        }
        if rest.starts_with("files") || rest.starts_with("fileTree") {
            warn!(line, dependency = rest, "file dependencies are not supported, skipped");
            return Ok(());
        }
        if rest.starts_with("libs.") {
            return Err(self.error(line, "version catalog references are not supported"));
        }

        if let Some(caps) = PLATFORM_CALL.captures(rest) {
            let kind = match &caps[1] {
                "enforcedPlatform" => ImportKind::EnforcedPlatform,
                _ => ImportKind::Platform,
            };
            let arg = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or("");
            let Some(literal) = STRING_LITERAL.captures(arg.trim()) else {
                return Err(self.error(line, format!("unrecognized platform notation '{}'", arg)));
            };
            let coordinate = self.bom_coordinate(&literal[1], line)?;
            self.manifest.platforms.push(
                PlatformImport::new(coordinate, kind)
                    .in_scope(scope)
                    .at_line(line),
            );
            return Ok(());
        }

        let declaration = if let Some(literal) = STRING_LITERAL.captures(rest) {
            self.string_notation(&literal[1], scope, line)?
        } else if MAP_NOTATION_START.is_match(rest) {
            self.map_notation(rest, scope, line)?
        } else {
            return Err(self.error(line, format!("unrecognized dependency notation '{}'", rest)));
        };

        trace!(line, dependency = %declaration, "dependency");
        self.manifest.dependencies.push(declaration);
        Ok(())
    }

    /// Parse 'group:name[:version]'
    fn string_notation(
        &self,
        raw: &str,
        scope: Scope,
        line: usize,
    ) -> Result<DependencyDeclaration, ManifestError> {
        let (notation, variable) = self.interpolate(raw, line)?;
        let parts: Vec<&str> = notation.split(':').collect();
        let (group, artifact, version) = match parts.as_slice() {
            [group, artifact] => (*group, *artifact, ""),
            [group, artifact, version] => (*group, *artifact, *version),
            _ => {
                return Err(self.error(
                    line,
                    format!("invalid coordinate '{}': expected group:artifact[:version]", notation),
                ))
            }
        };
        self.declaration(group, artifact, version, scope, line, variable)
    }

    /// Parse group: 'x', name: 'y', version: 'z' (or the `=` form)
    fn map_notation(
        &self,
        args: &str,
        scope: Scope,
        line: usize,
    ) -> Result<DependencyDeclaration, ManifestError> {
        let mut entries: HashMap<&str, (String, Option<String>)> = HashMap::new();

        for caps in MAP_ENTRY.captures_iter(args) {
            let key = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let value = if let Some(quoted) = caps.get(2) {
                self.interpolate(quoted.as_str(), line)?
            } else {
                let name = caps.get(3).map(|m| m.as_str()).unwrap_or("");
                let value = self
                    .variables
                    .get(name)
                    .ok_or_else(|| self.error(line, format!("undefined variable '{}'", name)))?;
                (value.clone(), Some(name.to_string()))
            };
            entries.insert(key, value);
        }

        let group = entries.get("group").map(|(v, _)| v.as_str()).unwrap_or("");
        let artifact = entries.get("name").map(|(v, _)| v.as_str()).unwrap_or("");
        let (version, variable) = entries
            .get("version")
            .map(|(v, var)| (v.as_str(), var.clone()))
            .unwrap_or(("", None));
        self.declaration(group, artifact, version, scope, line, variable)
    }

    fn declaration(
        &self,
        group: &str,
        artifact: &str,
        version: &str,
        scope: Scope,
        line: usize,
        variable: Option<String>,
    ) -> Result<DependencyDeclaration, ManifestError> {
        let (group, artifact) = (group.trim(), artifact.trim());
        if group.is_empty() || artifact.is_empty() {
            return Err(self.error(
                line,
                format!("invalid coordinate '{}:{}': empty group or artifact", group, artifact),
            ));
        }

        let constraint = VersionConstraint::parse(version).ok_or_else(|| {
            self.error(
                line,
                format!("invalid version constraint '{}' for {}:{}", version, group, artifact),
            )
        })?;

        let declaration =
            DependencyDeclaration::new(ModuleId::new(group, artifact), constraint, scope)
                .at_line(line);
        Ok(match variable {
            Some(name) => declaration.with_variable(name),
            None => declaration,
        })
    }

    /// Parse a BOM coordinate; BOM imports need a concrete version
    fn bom_coordinate(&self, raw: &str, line: usize) -> Result<Coordinate, ManifestError> {
        let (notation, _) = self.interpolate(raw, line)?;
        notation
            .parse::<Coordinate>()
            .map_err(|e| self.error(line, format!("invalid BOM coordinate '{}': {}", notation, e)))
    }

    /// Replace `$name` and `${name}` with variable values. Returns the
    /// resulting text and the first variable used.
    fn interpolate(&self, raw: &str, line: usize) -> Result<(String, Option<String>), ManifestError> {
        let mut result = String::with_capacity(raw.len());
        let mut first_variable = None;
        let mut last = 0;

        for caps in INTERPOLATION.captures_iter(raw) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1).or_else(|| caps.get(2))) else {
                continue;
            };
            let value = self.variables.get(name.as_str()).ok_or_else(|| {
                self.error(line, format!("undefined variable '{}'", name.as_str()))
            })?;
            result.push_str(&raw[last..whole.start()]);
            result.push_str(value);
            last = whole.end();
            first_variable.get_or_insert_with(|| name.as_str().to_string());
        }
        result.push_str(&raw[last..]);

        Ok((result, first_variable))
    }

    fn finish(self) -> Result<Manifest, ManifestError> {
        let manifest = self.manifest;
        if !manifest.has_bom_source() {
            if let Some(decl) = manifest
                .dependencies
                .iter()
                .find(|d| d.constraint.is_managed())
            {
                return Err(ManifestError::parse(
                    self.path,
                    decl.line,
                    format!(
                        "'{}' has no version and no BOM or platform is imported",
                        decl.id
                    ),
                ));
            }
        }
        debug!(
            plugins = manifest.plugins.len(),
            dependencies = manifest.dependencies.len(),
            platforms = manifest.platforms.len(),
            "manifest parsed"
        );
        Ok(manifest)
    }
}

/// Interpolate known variables, leaving unknown references untouched
fn interpolate_lenient(raw: &str, variables: &HashMap<String, String>) -> String {
    INTERPOLATION
        .replace_all(raw, |caps: &regex::Captures| {
            let name = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()).unwrap_or("");
            variables
                .get(name)
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Strip one pair of parentheses wrapping the whole argument list
fn strip_outer_parens(s: &str) -> &str {
    let s = s.trim();
    if !(s.starts_with('(') && s.ends_with(')')) {
        return s;
    }

    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => {
                depth = depth.saturating_sub(1);
                if depth == 0 && i != s.len() - 1 {
                    return s;
                }
            }
            _ => {}
        }
    }
    s[1..s.len() - 1].trim()
}
