//! Dependency resolution
//!
//! Turns the manifest's declarations into a [`ResolvedGraph`]:
//! 1. BOM/platform imports are expanded into a pin table
//! 2. Every module is requested by the manifest or by a selected module
//! 3. Each module gets one version: its pin, else the highest request
//! 4. Steps 2-3 repeat until the selection stops changing

mod lockfile;
mod pins;
mod selection;

pub use lockfile::{Lockfile, LOCKFILE_NAME};
pub use pins::{Pin, PinTable};

use crate::config::DEFAULT_MAX_DEPTH;
use crate::domain::{
    Coordinate, ImportKind, Manifest, ModuleId, PlatformImport, ResolvedGraph, ResolvedNode,
    Scope, Selection, Version, VersionConstraint, DEPENDENCY_MANAGEMENT_PLUGIN,
    SPRING_BOOT_PLUGIN,
};
use crate::error::ResolveError;
use crate::registry::{MetadataSource, ModuleDependency};
use selection::Request;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::{debug, warn};

/// BOM the Spring Boot plugin implies
const SPRING_BOOT_BOM: (&str, &str) = ("org.springframework.boot", "spring-boot-dependencies");

/// Fixpoint rounds allowed beyond the depth limit
const EXTRA_ITERATIONS: usize = 16;

/// Everything the resolver needs besides the manifest's declarations
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionConfig {
    /// Imports in declaration order, plugin-implied ones first
    pub platforms: Vec<PlatformImport>,
    /// Follow the dependencies of resolved modules
    pub transitive: bool,
    /// Deepest transitive level followed
    pub max_depth: usize,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            platforms: Vec::new(),
            transitive: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ResolutionConfig {
    /// The manifest's imports plus the BOM its plugins imply
    pub fn from_manifest(manifest: &Manifest) -> Self {
        let mut platforms = Vec::new();
        if let Some(bom) = implied_boot_bom(manifest) {
            debug!(bom = %bom.coordinate, "Spring Boot BOM implied by plugins");
            platforms.push(bom);
        }
        platforms.extend(manifest.platforms.iter().cloned());

        Self {
            platforms,
            ..Self::default()
        }
    }

    pub fn with_transitive(mut self, transitive: bool) -> Self {
        self.transitive = transitive;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn iteration_limit(&self) -> usize {
        if self.transitive {
            self.max_depth + EXTRA_ITERATIONS
        } else {
            2
        }
    }
}

/// `spring-boot-dependencies` at the Boot plugin's version, when the
/// dependency-management plugin is applied too
fn implied_boot_bom(manifest: &Manifest) -> Option<PlatformImport> {
    manifest.plugin(DEPENDENCY_MANAGEMENT_PLUGIN)?;
    let version = manifest.plugin(SPRING_BOOT_PLUGIN)?.version.as_deref()?;
    let version = Version::parse(version)?;
    let (group, artifact) = SPRING_BOOT_BOM;
    Some(PlatformImport::new(
        Coordinate::new(ModuleId::new(group, artifact), version),
        ImportKind::Plugin,
    ))
}

/// Outcome of one selection round
#[derive(Default)]
struct Round {
    requests: BTreeMap<ModuleId, Vec<Request>>,
    /// Edges actually followed, per requesting module
    edges: BTreeMap<ModuleId, Vec<ModuleId>>,
}

/// Resolves manifests against a metadata source
///
/// Fetched metadata is kept for the lifetime of the resolver.
pub struct Resolver<'a> {
    source: &'a dyn MetadataSource,
    config: ResolutionConfig,
    dependencies: BTreeMap<Coordinate, Vec<ModuleDependency>>,
    versions: BTreeMap<ModuleId, Vec<Version>>,
}

impl<'a> Resolver<'a> {
    pub fn new(source: &'a dyn MetadataSource, config: ResolutionConfig) -> Self {
        Self {
            source,
            config,
            dependencies: BTreeMap::new(),
            versions: BTreeMap::new(),
        }
    }

    /// Resolve the manifest's dependencies into a graph
    pub async fn resolve(&mut self, manifest: &Manifest) -> Result<ResolvedGraph, ResolveError> {
        let pins = PinTable::build(&self.config.platforms, self.source).await?;
        debug!(pins = pins.len(), imports = self.config.platforms.len(), "pin table built");

        let limit = self.config.iteration_limit();
        let mut selected: BTreeMap<ModuleId, (Version, Selection)> = BTreeMap::new();

        for iteration in 1..=limit {
            let round = self.collect_requests(manifest, &selected).await?;
            let mut next = BTreeMap::new();
            for (id, requests) in &round.requests {
                let pin = if requests.iter().all(|r| r.scope.is_test_only()) {
                    pins.get_for_tests(id)
                } else {
                    pins.get(id)
                };
                if let Some(choice) = selection::select(id, requests, pin)? {
                    next.insert(id.clone(), choice);
                }
            }

            if next == selected {
                debug!(iterations = iteration, modules = next.len(), "selection converged");
                let graph = build_graph(&round, next);
                debug!(modules = graph.len(), direct = graph.direct_count(), "dependency graph built");
                return Ok(graph);
            }
            selected = next;
        }

        Err(ResolveError::NotConverged { iterations: limit })
    }

    /// Walk from the manifest's declarations through the currently selected
    /// versions and gather every request
    async fn collect_requests(
        &mut self,
        manifest: &Manifest,
        selected: &BTreeMap<ModuleId, (Version, Selection)>,
    ) -> Result<Round, ResolveError> {
        let mut round = Round::default();
        let mut queue: VecDeque<(ModuleId, Scope, usize)> = VecDeque::new();
        let mut visited: BTreeSet<(ModuleId, Scope)> = BTreeSet::new();

        for decl in &manifest.dependencies {
            let candidate = self.candidate(&decl.id, &decl.constraint).await?;
            round.requests.entry(decl.id.clone()).or_default().push(Request {
                constraint: decl.constraint.clone(),
                scope: decl.scope,
                from: None,
                candidate,
            });
            if visited.insert((decl.id.clone(), decl.scope)) {
                queue.push_back((decl.id.clone(), decl.scope, 0));
            }
        }

        if !self.config.transitive {
            return Ok(round);
        }

        while let Some((id, scope, depth)) = queue.pop_front() {
            let Some((version, _)) = selected.get(&id) else {
                // Selected next round, expanded after that
                continue;
            };
            if depth >= self.config.max_depth {
                debug!(module = %id, depth, "depth limit reached, not expanding");
                continue;
            }

            let coordinate = Coordinate::new(id.clone(), version.clone());
            for dep in self.dependencies_of(&coordinate).await? {
                let Some(child_scope) = scope.transitive(dep.edge) else {
                    continue;
                };
                let candidate = self.candidate(&dep.id, &dep.constraint).await?;
                round.requests.entry(dep.id.clone()).or_default().push(Request {
                    constraint: dep.constraint.clone(),
                    scope: child_scope,
                    from: Some(id.clone()),
                    candidate,
                });

                let edges = round.edges.entry(id.clone()).or_default();
                if !edges.contains(&dep.id) {
                    edges.push(dep.id.clone());
                }
                if visited.insert((dep.id.clone(), child_scope)) {
                    queue.push_back((dep.id, child_scope, depth + 1));
                }
            }
        }

        Ok(round)
    }

    /// Version a constraint settles on by itself; None for `Managed`
    async fn candidate(
        &mut self,
        id: &ModuleId,
        constraint: &VersionConstraint,
    ) -> Result<Option<Version>, ResolveError> {
        match constraint {
            VersionConstraint::Managed => Ok(None),
            VersionConstraint::Exact { version } => Ok(Some(version.clone())),
            _ => {
                let available = self.versions_of(id).await?;
                constraint
                    .select(available)
                    .cloned()
                    .map(Some)
                    .ok_or_else(|| ResolveError::UnresolvableConstraint {
                        module: id.clone(),
                        constraint: constraint.to_string(),
                    })
            }
        }
    }

    async fn versions_of(&mut self, id: &ModuleId) -> Result<&[Version], ResolveError> {
        if !self.versions.contains_key(id) {
            let versions = self.source.fetch_versions(id).await?;
            debug!(module = %id, count = versions.len(), "fetched versions");
            self.versions.insert(id.clone(), versions);
        }
        Ok(self.versions.get(id).map(Vec::as_slice).unwrap_or_default())
    }

    async fn dependencies_of(
        &mut self,
        coordinate: &Coordinate,
    ) -> Result<Vec<ModuleDependency>, ResolveError> {
        if let Some(deps) = self.dependencies.get(coordinate) {
            return Ok(deps.clone());
        }
        let deps = match self.source.fetch_dependencies(coordinate).await {
            Ok(deps) => deps,
            Err(e) if e.is_not_found() => {
                warn!(module = %coordinate, "no metadata found, assuming no dependencies");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        debug!(module = %coordinate, count = deps.len(), "fetched dependencies");
        self.dependencies.insert(coordinate.clone(), deps.clone());
        Ok(deps)
    }
}

fn build_graph(round: &Round, selected: BTreeMap<ModuleId, (Version, Selection)>) -> ResolvedGraph {
    for id in round.requests.keys().filter(|id| !selected.contains_key(*id)) {
        warn!(module = %id, "transitive dependency without a version and no BOM pin, skipped");
    }

    let ids: BTreeSet<ModuleId> = selected.keys().cloned().collect();
    let mut graph = ResolvedGraph::new();
    for (id, (version, selection)) in selected {
        let requests = round.requests.get(&id).map(Vec::as_slice).unwrap_or_default();
        selection::check_constraints(&id, &version, requests);

        let dependencies = round
            .edges
            .get(&id)
            .map(|edges| edges.iter().filter(|e| ids.contains(*e)).cloned().collect())
            .unwrap_or_default();

        graph.insert(
            id,
            ResolvedNode {
                version,
                selection,
                scopes: requests.iter().map(|r| r.scope).collect(),
                direct: requests.iter().any(Request::is_direct),
                dependencies,
            },
        );
    }
    graph
}
