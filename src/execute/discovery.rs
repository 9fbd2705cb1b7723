//! Test discovery under the test source roots
//!
//! A test is a method carrying one of the engine's test annotations, in a
//! `.java` or `.kt` file that declares a class named after the file.

use crate::domain::TestCase;
use crate::error::PhaseError;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, trace};
use walkdir::WalkDir;

static PACKAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*package\s+([\w.]+)").unwrap());

/// One leading annotation, with optional arguments
static LEADING_ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@([\w.]+)(\([^)]*\))?\s*").unwrap());

static KOTLIN_FUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bfun\s+(?:`([^`]+)`|(\w+))\s*\(").unwrap());

static JAVA_METHOD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\w+)\s*\(").unwrap());

const SOURCE_EXTENSIONS: &[&str] = &["java", "kt"];

/// Find tests in `source_dirs` (relative to `project_dir`), sorted by file
/// path then position in the file
pub fn discover_tests(
    project_dir: &Path,
    source_dirs: &[PathBuf],
    annotations: &[&str],
) -> Result<Vec<TestCase>, PhaseError> {
    let mut tests = Vec::new();

    for dir in source_dirs {
        let root = project_dir.join(dir);
        if !root.is_dir() {
            trace!(dir = %root.display(), "test source root absent");
            continue;
        }

        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry.map_err(|e| PhaseError::Discovery {
                message: e.to_string(),
            })?;
            let path = entry.path();
            let is_source = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| SOURCE_EXTENSIONS.contains(&e));
            if !entry.file_type().is_file() || !is_source {
                continue;
            }

            let content = std::fs::read_to_string(path).map_err(|e| PhaseError::Discovery {
                message: format!("failed to read {}: {}", path.display(), e),
            })?;
            let found = tests_in_file(path, &content, annotations);
            debug!(file = %path.display(), tests = found.len(), "scanned test source");
            tests.extend(found);
        }
    }

    Ok(tests)
}

/// Tests declared in one source file
pub fn tests_in_file(path: &Path, content: &str, annotations: &[&str]) -> Vec<TestCase> {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return Vec::new();
    };
    let declares_class = Regex::new(&format!(r"\bclass\s+{}\b", regex::escape(stem)))
        .map(|re| re.is_match(content))
        .unwrap_or(false);
    if !declares_class {
        trace!(file = %path.display(), "no class named after the file");
        return Vec::new();
    }

    let class = match PACKAGE.captures(content) {
        Some(caps) => format!("{}.{}", &caps[1], stem),
        None => stem.to_string(),
    };
    let kotlin = path.extension().and_then(|e| e.to_str()) == Some("kt");

    let mut tests = Vec::new();
    let mut pending = false;
    let mut in_block_comment = false;

    for line in content.lines() {
        let mut rest = line.trim();
        if in_block_comment {
            match rest.find("*/") {
                Some(end) => {
                    in_block_comment = false;
                    rest = rest[end + 2..].trim();
                }
                None => continue,
            }
        }
        if rest.starts_with("//") {
            continue;
        }
        if rest.starts_with("/*") {
            if !rest.contains("*/") {
                in_block_comment = true;
            }
            continue;
        }

        // Strip leading annotations, noting test markers among them
        while let Some(caps) = LEADING_ANNOTATION.captures(rest) {
            let name = caps[1].rsplit('.').next().unwrap_or_default();
            if annotations.contains(&name) {
                pending = true;
            }
            rest = rest[caps[0].len()..].trim_start();
        }

        if !pending || rest.is_empty() {
            continue;
        }

        let method = if kotlin {
            KOTLIN_FUN
                .captures(rest)
                .and_then(|c| c.get(1).or_else(|| c.get(2)))
                .map(|m| m.as_str().to_string())
        } else {
            JAVA_METHOD.captures(rest).map(|c| c[1].to_string())
        };

        if let Some(method) = method {
            tests.push(TestCase::new(class.clone(), method, path));
            pending = false;
        }
    }

    tests
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const JUNIT5: &[&str] = &["Test", "ParameterizedTest", "RepeatedTest", "TestFactory"];

    const JAVA_TEST: &str = r#"package com.example.demo;

import org.junit.jupiter.api.Test;
import org.junit.jupiter.params.ParameterizedTest;
import org.junit.jupiter.params.provider.ValueSource;
import org.springframework.boot.test.context.SpringBootTest;

@SpringBootTest
class DemoApplicationTests {

    @Test
    void contextLoads() {
    }

    // @Test
    // void commentedOut() {}

    /*
    @Test
    void blockCommented() {}
    */

    @ParameterizedTest
    @ValueSource(ints = {1, 2, 3})
    public void isPositive(int value) {
        assertTrue(value > 0);
    }

    @Test void sameLine() {}

    private int helper() {
        return 1;
    }
}
"#;

    #[test]
    fn test_java_tests() {
        let tests = tests_in_file(
            Path::new("src/test/java/com/example/demo/DemoApplicationTests.java"),
            JAVA_TEST,
            JUNIT5,
        );
        let ids: Vec<String> = tests.iter().map(|t| t.id()).collect();
        assert_eq!(
            ids,
            vec![
                "com.example.demo.DemoApplicationTests#contextLoads",
                "com.example.demo.DemoApplicationTests#isPositive",
                "com.example.demo.DemoApplicationTests#sameLine",
            ]
        );
    }

    #[test]
    fn test_kotlin_tests() {
        let content = r#"package com.example

import org.junit.jupiter.api.Test

class CalculatorTest {
    @Test
    fun `adds two numbers`() {
        assert(1 + 1 == 2)
    }

    @org.junit.jupiter.api.RepeatedTest(3)
    fun repeated() {}

    fun notATest() {}
}
"#;
        let tests = tests_in_file(Path::new("CalculatorTest.kt"), content, JUNIT5);
        let methods: Vec<&str> = tests.iter().map(|t| t.method.as_str()).collect();
        assert_eq!(methods, vec!["adds two numbers", "repeated"]);
        assert_eq!(tests[0].class, "com.example.CalculatorTest");
    }

    #[test]
    fn test_file_not_named_after_class() {
        let content = "class Other {\n  @Test\n  void a() {}\n}\n";
        assert!(tests_in_file(Path::new("Helpers.java"), content, JUNIT5).is_empty());
    }

    #[test]
    fn test_default_package() {
        let content = "class PlainTest {\n  @Test\n  void a() {}\n}\n";
        let tests = tests_in_file(Path::new("PlainTest.java"), content, JUNIT5);
        assert_eq!(tests[0].id(), "PlainTest#a");
    }

    #[test]
    fn test_junit4_annotations_only() {
        let content = "class LegacyTest {\n  @Test(expected = Exception.class)\n  public void a() {}\n  @ParameterizedTest\n  void b() {}\n}\n";
        let tests = tests_in_file(Path::new("LegacyTest.java"), content, &["Test"]);
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].method, "a");
    }

    #[test]
    fn test_discover_walks_source_roots() {
        let dir = TempDir::new().unwrap();
        let java = dir.path().join("src/test/java/com/example");
        fs::create_dir_all(&java).unwrap();
        fs::write(java.join("BTest.java"), "package com.example;\nclass BTest {\n  @Test\n  void b() {}\n}\n").unwrap();
        fs::write(java.join("ATest.java"), "package com.example;\nclass ATest {\n  @Test\n  void a() {}\n}\n").unwrap();
        fs::write(java.join("notes.txt"), "@Test void x() {}").unwrap();

        let tests = discover_tests(
            dir.path(),
            &[PathBuf::from("src/test/java"), PathBuf::from("src/test/kotlin")],
            JUNIT5,
        )
        .unwrap();
        let ids: Vec<String> = tests.iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec!["com.example.ATest#a", "com.example.BTest#b"]);
    }

    #[test]
    fn test_discover_without_sources() {
        let dir = TempDir::new().unwrap();
        let tests = discover_tests(dir.path(), &[PathBuf::from("src/test/java")], JUNIT5).unwrap();
        assert!(tests.is_empty());
    }
}
