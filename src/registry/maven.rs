//! Maven repository adapter
//!
//! Reads POMs and `maven-metadata.xml` from a Maven-layout repository,
//! either remote over HTTP or on disk (`mavenLocal()` and `file://` URLs).
//!
//! Layout: `{base}/{group as path}/{artifact}/{version}/{artifact}-{version}.pom`

use super::pom::{parse_metadata_versions, Pom};
use super::{BomDescriptor, HttpClient, ManagedVersion, MetadataSource, ModuleDependency};
use crate::domain::{Coordinate, EdgeKind, ModuleId, Repository, Version, VersionConstraint};
use crate::error::RegistryError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Maximum length of a parent POM chain
const MAX_PARENT_DEPTH: usize = 16;

enum Transport {
    Http { client: HttpClient, base_url: String },
    Local { root: PathBuf },
}

/// A Maven-layout repository
pub struct MavenRepository {
    name: String,
    transport: Transport,
}

impl MavenRepository {
    /// Create an adapter for a remote repository
    pub fn remote(name: impl Into<String>, base_url: &str, client: HttpClient) -> Self {
        Self {
            name: name.into(),
            transport: Transport::Http {
                client,
                base_url: base_url.trim_end_matches('/').to_string(),
            },
        }
    }

    /// Create an adapter for a repository on disk
    pub fn local(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            transport: Transport::Local { root: root.into() },
        }
    }

    /// `~/.m2/repository`
    pub fn default_local_root() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".m2").join("repository"))
    }

    /// Create the adapter for a declared repository
    ///
    /// Returns None for `mavenLocal()` when no home directory is known.
    pub fn from_repository(repository: &Repository, client: &HttpClient) -> Option<Self> {
        match repository {
            Repository::MavenCentral => Some(Self::remote(
                "Maven Central",
                repository.url()?,
                client.clone(),
            )),
            Repository::Google => Some(Self::remote("Google", repository.url()?, client.clone())),
            Repository::MavenLocal => Some(Self::local("Maven Local", Self::default_local_root()?)),
            Repository::Maven { url } => match url.strip_prefix("file://") {
                Some(path) => Some(Self::local(url.clone(), path)),
                None => Some(Self::remote(url.clone(), url, client.clone())),
            },
        }
    }

    fn module_path(id: &ModuleId) -> String {
        format!("{}/{}", id.group.replace('.', "/"), id.artifact)
    }

    fn pom_path(coordinate: &Coordinate) -> String {
        format!(
            "{}/{}/{}-{}.pom",
            Self::module_path(&coordinate.id),
            coordinate.version,
            coordinate.id.artifact,
            coordinate.version
        )
    }

    /// Read a file relative to the repository root
    async fn read(&self, relative: &str, resource: &str) -> Result<String, RegistryError> {
        match &self.transport {
            Transport::Http { client, base_url } => {
                let url = format!("{}/{}", base_url, relative);
                client.get_text(&url, resource, &self.name).await
            }
            Transport::Local { root } => {
                let path = root.join(relative);
                trace!(path = %path.display(), "reading");
                tokio::fs::read_to_string(&path).await.map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        RegistryError::not_found(resource, &self.name)
                    } else {
                        RegistryError::network_error(resource, &self.name, e.to_string())
                    }
                })
            }
        }
    }

    async fn fetch_pom(&self, coordinate: &Coordinate) -> Result<Pom, RegistryError> {
        let resource = coordinate.to_string();
        let xml = self.read(&Self::pom_path(coordinate), &resource).await?;
        Pom::parse(&xml).map_err(|e| RegistryError::invalid_response(&resource, &self.name, e))
    }

    /// The POM with its parent chain applied
    async fn effective_pom(&self, coordinate: &Coordinate) -> Result<Pom, RegistryError> {
        let mut pom = self.fetch_pom(coordinate).await?;
        let mut next = pom.parent.clone();
        let mut depth = 0;

        while let Some(parent) = next {
            depth += 1;
            if depth > MAX_PARENT_DEPTH {
                return Err(RegistryError::invalid_response(
                    coordinate.to_string(),
                    &self.name,
                    format!("parent chain longer than {}", MAX_PARENT_DEPTH),
                ));
            }
            debug!(module = %coordinate, parent = %parent, "applying parent POM");
            let parent_pom = self.fetch_pom(&parent).await?;
            pom.inherit(&parent_pom);
            next = parent_pom.parent.clone();
        }

        Ok(pom)
    }

    /// Versions from directory names when no local metadata file exists
    async fn list_version_dirs(&self, root: &Path, id: &ModuleId) -> Vec<String> {
        let dir = root.join(Self::module_path(id));
        let mut versions = Vec::new();
        let Ok(mut entries) = tokio::fs::read_dir(&dir).await else {
            return versions;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().to_string();
            let pom = entry.path().join(format!("{}-{}.pom", id.artifact, name));
            if tokio::fs::metadata(&pom).await.is_ok() {
                versions.push(name);
            }
        }
        versions
    }
}

fn edge_kind(scope: Option<&str>) -> Option<EdgeKind> {
    match scope.unwrap_or("compile") {
        "compile" => Some(EdgeKind::Compile),
        "runtime" => Some(EdgeKind::Runtime),
        // test, provided, system
        _ => None,
    }
}

#[async_trait]
impl MetadataSource for MavenRepository {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_bom(&self, bom: &Coordinate) -> Result<BomDescriptor, RegistryError> {
        let pom = self.effective_pom(bom).await?;
        let mut descriptor = BomDescriptor::default();

        for entry in &pom.managed {
            let group = pom.interpolate(&entry.group);
            let artifact = pom.interpolate(&entry.artifact);
            let Some(raw) = entry.version.as_deref().map(|v| pom.interpolate(v)) else {
                continue;
            };

            if entry.is_import() {
                match format!("{}:{}:{}", group, artifact, raw).parse::<Coordinate>() {
                    Ok(import) => descriptor.imports.push(import),
                    Err(e) => warn!(bom = %bom, error = %e, "skipping BOM import"),
                }
                continue;
            }

            match Version::parse(&raw) {
                Some(version) if !raw.contains("${") => descriptor.managed.push(ManagedVersion {
                    id: ModuleId::new(group, artifact),
                    version,
                }),
                _ => debug!(bom = %bom, group, artifact, version = raw, "unresolved managed version"),
            }
        }

        debug!(
            bom = %bom,
            managed = descriptor.managed.len(),
            imports = descriptor.imports.len(),
            "read BOM"
        );
        Ok(descriptor)
    }

    async fn fetch_dependencies(
        &self,
        module: &Coordinate,
    ) -> Result<Vec<ModuleDependency>, RegistryError> {
        let pom = self.effective_pom(module).await?;
        let mut dependencies = Vec::new();

        for dep in &pom.dependencies {
            if dep.optional {
                continue;
            }
            let scope = dep.scope.as_deref().map(|s| pom.interpolate(s));
            let Some(edge) = edge_kind(scope.as_deref()) else {
                continue;
            };

            let id = ModuleId::new(pom.interpolate(&dep.group), pom.interpolate(&dep.artifact));
            let raw = dep
                .version
                .as_deref()
                .map(|v| pom.interpolate(v))
                .or_else(|| pom.managed_version(&id))
                .unwrap_or_default();

            if raw.contains("${") {
                warn!(module = %module, dependency = %id, version = raw, "unresolved property, skipping");
                continue;
            }
            let Some(constraint) = VersionConstraint::parse(&raw) else {
                warn!(module = %module, dependency = %id, version = raw, "invalid version, skipping");
                continue;
            };

            dependencies.push(ModuleDependency {
                id,
                constraint,
                edge,
            });
        }

        Ok(dependencies)
    }

    async fn fetch_versions(&self, id: &ModuleId) -> Result<Vec<Version>, RegistryError> {
        let resource = id.to_string();
        let raw = match &self.transport {
            Transport::Http { .. } => {
                let path = format!("{}/maven-metadata.xml", Self::module_path(id));
                parse_metadata_versions(&self.read(&path, &resource).await?)
            }
            Transport::Local { root } => {
                let path = format!("{}/maven-metadata-local.xml", Self::module_path(id));
                match self.read(&path, &resource).await {
                    Ok(xml) => parse_metadata_versions(&xml),
                    Err(e) if e.is_not_found() => self.list_version_dirs(root, id).await,
                    Err(e) => return Err(e),
                }
            }
        };

        let mut versions: Vec<Version> = raw.iter().filter_map(|v| Version::parse(v)).collect();
        if versions.is_empty() {
            return Err(RegistryError::not_found(resource, &self.name));
        }
        versions.sort();
        Ok(versions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn coord(s: &str) -> Coordinate {
        s.parse().unwrap()
    }

    fn write_pom(root: &Path, coordinate: &str, xml: &str) {
        let c = coord(coordinate);
        let path = root.join(MavenRepository::pom_path(&c));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, xml).unwrap();
    }

    #[test]
    fn test_pom_path() {
        let path = MavenRepository::pom_path(&coord("org.junit:junit-bom:5.10.0"));
        assert_eq!(path, "org/junit/junit-bom/5.10.0/junit-bom-5.10.0.pom");
    }

    #[test]
    fn test_from_repository() {
        let client = HttpClient::new().unwrap();
        let central = MavenRepository::from_repository(&Repository::MavenCentral, &client).unwrap();
        assert_eq!(central.name(), "Maven Central");

        let file = MavenRepository::from_repository(
            &Repository::Maven {
                url: "file:///tmp/repo".to_string(),
            },
            &client,
        )
        .unwrap();
        assert!(matches!(file.transport, Transport::Local { .. }));
    }

    #[tokio::test]
    async fn test_local_bom() {
        let dir = TempDir::new().unwrap();
        write_pom(
            dir.path(),
            "com.example:bom:1.0",
            r#"<project>
  <groupId>com.example</groupId><artifactId>bom</artifactId><version>1.0</version>
  <properties><lib.version>2.0</lib.version></properties>
  <dependencyManagement><dependencies>
    <dependency><groupId>com.example</groupId><artifactId>lib-a</artifactId><version>${lib.version}</version></dependency>
    <dependency><groupId>com.example</groupId><artifactId>lib-b</artifactId><version>${missing}</version></dependency>
    <dependency><groupId>com.example</groupId><artifactId>base-bom</artifactId><version>3.0</version><type>pom</type><scope>import</scope></dependency>
  </dependencies></dependencyManagement>
</project>"#,
        );

        let repo = MavenRepository::local("test", dir.path());
        let bom = repo.fetch_bom(&coord("com.example:bom:1.0")).await.unwrap();
        assert_eq!(bom.managed.len(), 1);
        assert_eq!(bom.managed[0].id, ModuleId::new("com.example", "lib-a"));
        assert_eq!(bom.managed[0].version, Version::parse("2.0").unwrap());
        assert_eq!(bom.imports, vec![coord("com.example:base-bom:3.0")]);
    }

    #[tokio::test]
    async fn test_local_dependencies_with_parent() {
        let dir = TempDir::new().unwrap();
        write_pom(
            dir.path(),
            "com.example:parent:1.0",
            r#"<project>
  <groupId>com.example</groupId><artifactId>parent</artifactId><version>1.0</version>
  <dependencyManagement><dependencies>
    <dependency><groupId>com.example</groupId><artifactId>driver</artifactId><version>4.2</version></dependency>
  </dependencies></dependencyManagement>
</project>"#,
        );
        write_pom(
            dir.path(),
            "com.example:lib-a:1.0",
            r#"<project>
  <parent><groupId>com.example</groupId><artifactId>parent</artifactId><version>1.0</version></parent>
  <artifactId>lib-a</artifactId>
  <dependencies>
    <dependency><groupId>com.example</groupId><artifactId>core</artifactId><version>${project.version}</version></dependency>
    <dependency><groupId>com.example</groupId><artifactId>driver</artifactId><scope>runtime</scope></dependency>
    <dependency><groupId>com.example</groupId><artifactId>extra</artifactId><version>1.0</version><optional>true</optional></dependency>
    <dependency><groupId>junit</groupId><artifactId>junit</artifactId><version>4.13.2</version><scope>test</scope></dependency>
    <dependency><groupId>javax.servlet</groupId><artifactId>servlet-api</artifactId><version>2.5</version><scope>provided</scope></dependency>
  </dependencies>
</project>"#,
        );

        let repo = MavenRepository::local("test", dir.path());
        let deps = repo
            .fetch_dependencies(&coord("com.example:lib-a:1.0"))
            .await
            .unwrap();

        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].id, ModuleId::new("com.example", "core"));
        assert_eq!(
            deps[0].constraint,
            VersionConstraint::exact(Version::parse("1.0").unwrap())
        );
        assert_eq!(deps[0].edge, EdgeKind::Compile);
        assert_eq!(deps[1].id, ModuleId::new("com.example", "driver"));
        assert_eq!(deps[1].edge, EdgeKind::Runtime);
        assert_eq!(
            deps[1].constraint,
            VersionConstraint::exact(Version::parse("4.2").unwrap())
        );
    }

    #[tokio::test]
    async fn test_local_missing_pom() {
        let dir = TempDir::new().unwrap();
        let repo = MavenRepository::local("test", dir.path());
        let err = repo
            .fetch_dependencies(&coord("com.example:nothing:1.0"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_local_versions_from_directories() {
        let dir = TempDir::new().unwrap();
        write_pom(dir.path(), "com.example:lib:1.0", "<project></project>");
        write_pom(dir.path(), "com.example:lib:1.10", "<project></project>");
        write_pom(dir.path(), "com.example:lib:1.9", "<project></project>");

        let repo = MavenRepository::local("test", dir.path());
        let versions = repo
            .fetch_versions(&ModuleId::new("com.example", "lib"))
            .await
            .unwrap();
        let names: Vec<&str> = versions.iter().map(|v| v.as_str()).collect();
        assert_eq!(names, vec!["1.0", "1.9", "1.10"]);
    }

    #[tokio::test]
    async fn test_local_versions_from_metadata() {
        let dir = TempDir::new().unwrap();
        let module_dir = dir.path().join("com/example/lib");
        fs::create_dir_all(&module_dir).unwrap();
        fs::write(
            module_dir.join("maven-metadata-local.xml"),
            "<metadata><versioning><versions><version>2.0</version><version>2.1</version></versions></versioning></metadata>",
        )
        .unwrap();

        let repo = MavenRepository::local("test", dir.path());
        let versions = repo
            .fetch_versions(&ModuleId::new("com.example", "lib"))
            .await
            .unwrap();
        assert_eq!(versions.len(), 2);
    }

    #[test]
    fn test_edge_kind() {
        assert_eq!(edge_kind(None), Some(EdgeKind::Compile));
        assert_eq!(edge_kind(Some("runtime")), Some(EdgeKind::Runtime));
        assert_eq!(edge_kind(Some("test")), None);
        assert_eq!(edge_kind(Some("provided")), None);
        assert_eq!(edge_kind(Some("system")), None);
    }
}
