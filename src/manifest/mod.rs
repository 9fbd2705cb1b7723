//! Manifest file detection and parsing
//!
//! This module provides functionality to:
//! - Detect the build script in a directory
//! - Parse plugins, repositories, dependencies and BOM imports from it

mod detector;
mod gradle;
mod scan;

pub use detector::{detect_manifest, Dialect, ManifestInfo};
pub use gradle::GradleParser;

use crate::domain::Manifest;
use crate::error::ManifestError;
use std::path::Path;

/// Trait for parsing manifest files
pub trait ManifestParser {
    /// Parse a manifest; `path` is only used for error reporting
    fn parse(&self, path: &Path, content: &str) -> Result<Manifest, ManifestError>;

    /// Returns the dialect this parser handles
    fn dialect(&self) -> Dialect;
}

/// Get a manifest parser for the specified dialect
pub fn get_parser(dialect: Dialect) -> Box<dyn ManifestParser> {
    Box::new(GradleParser::new(dialect))
}

/// Parse a manifest file
pub fn parse_manifest(info: &ManifestInfo) -> Result<Manifest, ManifestError> {
    let content = std::fs::read_to_string(&info.path)
        .map_err(|e| ManifestError::read_error(&info.path, e))?;

    let parser = get_parser(info.dialect);
    parser.parse(&info.path, &content)
}
