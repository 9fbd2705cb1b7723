//! In-memory metadata source built from the `[catalog]` config section
//!
//! Lets a project resolve without network access, and gives tests a
//! deterministic source.

use super::{BomDescriptor, ManagedVersion, MetadataSource, ModuleDependency};
use crate::config::{parse_requested, CatalogConfig};
use crate::domain::{Coordinate, EdgeKind, ModuleId, Version};
use crate::error::{ConfigError, RegistryError};
use async_trait::async_trait;
use std::collections::BTreeMap;

const CATALOG_NAME: &str = "catalog";

/// Metadata source backed by `buildplan.toml`
#[derive(Debug, Clone, Default)]
pub struct CatalogSource {
    boms: BTreeMap<Coordinate, BomDescriptor>,
    modules: BTreeMap<Coordinate, Vec<ModuleDependency>>,
    versions: BTreeMap<ModuleId, Vec<Version>>,
}

fn invalid(key: &str, value: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: format!("catalog.{}", key),
        value: value.to_string(),
        message: message.into(),
    }
}

fn coordinate(key: &str, value: &str) -> Result<Coordinate, ConfigError> {
    value.parse().map_err(|e: String| invalid(key, value, e))
}

fn version(key: &str, value: &str) -> Result<Version, ConfigError> {
    Version::parse(value).ok_or_else(|| invalid(key, value, "not a valid version"))
}

fn edges(raw: &[String], edge: EdgeKind) -> Result<Vec<ModuleDependency>, ConfigError> {
    raw.iter()
        .map(|entry| {
            let (id, constraint) =
                parse_requested(entry).map_err(|e| invalid("modules", entry, e))?;
            Ok(ModuleDependency {
                id,
                constraint,
                edge,
            })
        })
        .collect()
}

impl CatalogSource {
    /// Build the catalog, validating every coordinate and version in it
    pub fn from_config(config: &CatalogConfig) -> Result<Self, ConfigError> {
        let mut catalog = CatalogSource::default();

        for (bom, entries) in &config.boms {
            let coord = coordinate("boms", bom)?;
            let mut managed = Vec::new();
            for (id, v) in entries {
                managed.push(ManagedVersion {
                    id: id.parse().map_err(|e: String| invalid("boms", id, e))?,
                    version: version("boms", v)?,
                });
            }
            catalog.boms.entry(coord).or_default().managed = managed;
        }

        for (bom, imports) in &config.imports {
            let coord = coordinate("imports", bom)?;
            let imports = imports
                .iter()
                .map(|i| coordinate("imports", i))
                .collect::<Result<Vec<_>, _>>()?;
            catalog.boms.entry(coord).or_default().imports = imports;
        }

        for (module, entry) in &config.modules {
            let coord = coordinate("modules", module)?;
            let mut deps = edges(&entry.dependencies, EdgeKind::Compile)?;
            deps.extend(edges(&entry.runtime, EdgeKind::Runtime)?);
            catalog.modules.insert(coord, deps);
        }

        for (id, list) in &config.versions {
            let module: ModuleId = id.parse().map_err(|e: String| invalid("versions", id, e))?;
            let mut versions = list
                .iter()
                .map(|v| version("versions", v))
                .collect::<Result<Vec<_>, _>>()?;
            versions.sort();
            catalog.versions.insert(module, versions);
        }

        Ok(catalog)
    }
}

#[async_trait]
impl MetadataSource for CatalogSource {
    fn name(&self) -> &str {
        CATALOG_NAME
    }

    async fn fetch_bom(&self, bom: &Coordinate) -> Result<BomDescriptor, RegistryError> {
        self.boms
            .get(bom)
            .cloned()
            .ok_or_else(|| RegistryError::not_found(bom.to_string(), CATALOG_NAME))
    }

    /// A module listed in `versions` but not in `modules` has no edges
    async fn fetch_dependencies(
        &self,
        module: &Coordinate,
    ) -> Result<Vec<ModuleDependency>, RegistryError> {
        if let Some(deps) = self.modules.get(module) {
            return Ok(deps.clone());
        }
        let listed = self
            .versions
            .get(&module.id)
            .is_some_and(|versions| versions.contains(&module.version));
        if listed {
            Ok(Vec::new())
        } else {
            Err(RegistryError::not_found(module.to_string(), CATALOG_NAME))
        }
    }

    async fn fetch_versions(&self, id: &ModuleId) -> Result<Vec<Version>, RegistryError> {
        if let Some(versions) = self.versions.get(id) {
            return Ok(versions.clone());
        }
        // Fall back to the versions the module table knows about
        let known: Vec<Version> = self
            .modules
            .keys()
            .filter(|c| &c.id == id)
            .map(|c| c.version.clone())
            .collect();
        if known.is_empty() {
            Err(RegistryError::not_found(id.to_string(), CATALOG_NAME))
        } else {
            Ok(known)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogModule;
    use crate::domain::VersionConstraint;

    fn coord(s: &str) -> Coordinate {
        s.parse().unwrap()
    }

    fn sample() -> CatalogConfig {
        let mut config = CatalogConfig::default();
        config.boms.insert(
            "com.example:bom:1.0".to_string(),
            BTreeMap::from([("com.example:lib-a".to_string(), "2.0".to_string())]),
        );
        config.imports.insert(
            "com.example:bom:1.0".to_string(),
            vec!["com.example:base-bom:3.0".to_string()],
        );
        config.modules.insert(
            "com.example:lib-a:2.0".to_string(),
            CatalogModule {
                dependencies: vec!["com.example:core:1.0".to_string()],
                runtime: vec!["com.example:driver".to_string()],
            },
        );
        config.versions.insert(
            "com.example:core".to_string(),
            vec!["1.1".to_string(), "1.0".to_string()],
        );
        config
    }

    #[tokio::test]
    async fn test_fetch_bom() {
        let catalog = CatalogSource::from_config(&sample()).unwrap();
        let bom = catalog.fetch_bom(&coord("com.example:bom:1.0")).await.unwrap();
        assert_eq!(bom.managed.len(), 1);
        assert_eq!(bom.managed[0].version, Version::parse("2.0").unwrap());
        assert_eq!(bom.imports, vec![coord("com.example:base-bom:3.0")]);
    }

    #[tokio::test]
    async fn test_fetch_bom_import_only() {
        let mut config = CatalogConfig::default();
        config.imports.insert(
            "com.example:umbrella:1.0".to_string(),
            vec!["com.example:bom:1.0".to_string()],
        );
        let catalog = CatalogSource::from_config(&config).unwrap();
        let bom = catalog.fetch_bom(&coord("com.example:umbrella:1.0")).await.unwrap();
        assert!(bom.managed.is_empty());
        assert_eq!(bom.imports.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_dependencies() {
        let catalog = CatalogSource::from_config(&sample()).unwrap();
        let deps = catalog
            .fetch_dependencies(&coord("com.example:lib-a:2.0"))
            .await
            .unwrap();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].edge, EdgeKind::Compile);
        assert_eq!(deps[1].edge, EdgeKind::Runtime);
        assert_eq!(deps[1].constraint, VersionConstraint::Managed);
    }

    #[tokio::test]
    async fn test_listed_module_without_edges() {
        let catalog = CatalogSource::from_config(&sample()).unwrap();
        let deps = catalog
            .fetch_dependencies(&coord("com.example:core:1.1"))
            .await
            .unwrap();
        assert!(deps.is_empty());

        let err = catalog
            .fetch_dependencies(&coord("com.example:core:9.9"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_fetch_versions_sorted() {
        let catalog = CatalogSource::from_config(&sample()).unwrap();
        let versions = catalog
            .fetch_versions(&ModuleId::new("com.example", "core"))
            .await
            .unwrap();
        assert_eq!(versions[0], Version::parse("1.0").unwrap());
        assert_eq!(versions[1], Version::parse("1.1").unwrap());
    }

    #[tokio::test]
    async fn test_fetch_versions_from_module_table() {
        let catalog = CatalogSource::from_config(&sample()).unwrap();
        let versions = catalog
            .fetch_versions(&ModuleId::new("com.example", "lib-a"))
            .await
            .unwrap();
        assert_eq!(versions, vec![Version::parse("2.0").unwrap()]);
    }

    #[test]
    fn test_invalid_bom_coordinate() {
        let mut config = CatalogConfig::default();
        config.boms.insert("com.example:bom".to_string(), BTreeMap::new());
        let err = CatalogSource::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("catalog.boms"));
    }

    #[test]
    fn test_invalid_dependency_entry() {
        let mut config = CatalogConfig::default();
        config.modules.insert(
            "com.example:lib:1.0".to_string(),
            CatalogModule {
                dependencies: vec!["broken".to_string()],
                runtime: Vec::new(),
            },
        );
        let err = CatalogSource::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }
}
