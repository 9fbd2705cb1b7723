//! Metadata sources for dependency resolution
//!
//! This module provides:
//! - HTTP client shared foundation with retry logic
//! - Maven repository access (remote over HTTP, local on disk)
//! - POM and maven-metadata.xml reading
//! - An in-memory catalog configured in buildplan.toml
//! - A chain that asks several sources in order

mod catalog;
mod client;
mod maven;
mod pom;

pub use catalog::CatalogSource;
pub use client::HttpClient;
pub use maven::MavenRepository;
pub use pom::{parse_metadata_versions, Pom, PomDependency};

use crate::domain::{Coordinate, EdgeKind, ModuleId, Version, VersionConstraint};
use crate::error::RegistryError;
use async_trait::async_trait;
use tracing::{debug, warn};

/// A version pinned by a BOM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedVersion {
    pub id: ModuleId,
    pub version: Version,
}

/// Contents of a BOM
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BomDescriptor {
    /// Versions the BOM pins itself, in declaration order
    pub managed: Vec<ManagedVersion>,
    /// BOMs it imports, in declaration order
    pub imports: Vec<Coordinate>,
}

/// A dependency edge read from module metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDependency {
    pub id: ModuleId,
    pub constraint: VersionConstraint,
    pub edge: EdgeKind,
}

/// Trait for metadata sources
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Get the source name
    fn name(&self) -> &str;

    /// Fetch the managed versions and imports of a BOM
    async fn fetch_bom(&self, bom: &Coordinate) -> Result<BomDescriptor, RegistryError>;

    /// Fetch the compile and runtime dependencies of a module version
    async fn fetch_dependencies(
        &self,
        module: &Coordinate,
    ) -> Result<Vec<ModuleDependency>, RegistryError>;

    /// Fetch all published versions of a module
    async fn fetch_versions(&self, id: &ModuleId) -> Result<Vec<Version>, RegistryError>;
}

/// Asks each source in order; the first one that has the resource answers
pub struct SourceChain {
    sources: Vec<Box<dyn MetadataSource>>,
}

impl SourceChain {
    pub fn new(sources: Vec<Box<dyn MetadataSource>>) -> Self {
        Self { sources }
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Names of the chained sources, in order
    pub fn names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }

    fn exhausted(&self, resource: String, error: Option<RegistryError>) -> RegistryError {
        error.unwrap_or_else(|| {
            let repository = if self.sources.is_empty() {
                "no repositories".to_string()
            } else {
                self.names().join(", ")
            };
            RegistryError::not_found(resource, repository)
        })
    }
}

/// Keeps going on errors, remembering the first one that is not a miss
fn note_failure(source: &str, resource: &str, error: RegistryError, first: &mut Option<RegistryError>) {
    if error.is_not_found() {
        debug!(source, resource, "not found");
    } else {
        warn!(source, resource, %error, "metadata fetch failed");
        first.get_or_insert(error);
    }
}

#[async_trait]
impl MetadataSource for SourceChain {
    fn name(&self) -> &str {
        "repositories"
    }

    async fn fetch_bom(&self, bom: &Coordinate) -> Result<BomDescriptor, RegistryError> {
        let mut failure = None;
        for source in &self.sources {
            match source.fetch_bom(bom).await {
                Ok(descriptor) => return Ok(descriptor),
                Err(e) => note_failure(source.name(), &bom.to_string(), e, &mut failure),
            }
        }
        Err(self.exhausted(bom.to_string(), failure))
    }

    async fn fetch_dependencies(
        &self,
        module: &Coordinate,
    ) -> Result<Vec<ModuleDependency>, RegistryError> {
        let mut failure = None;
        for source in &self.sources {
            match source.fetch_dependencies(module).await {
                Ok(dependencies) => return Ok(dependencies),
                Err(e) => note_failure(source.name(), &module.to_string(), e, &mut failure),
            }
        }
        Err(self.exhausted(module.to_string(), failure))
    }

    async fn fetch_versions(&self, id: &ModuleId) -> Result<Vec<Version>, RegistryError> {
        let mut failure = None;
        for source in &self.sources {
            match source.fetch_versions(id).await {
                Ok(versions) if !versions.is_empty() => return Ok(versions),
                Ok(_) => debug!(source = source.name(), module = %id, "no versions listed"),
                Err(e) => note_failure(source.name(), &id.to_string(), e, &mut failure),
            }
        }
        Err(self.exhausted(id.to_string(), failure))
    }
}
