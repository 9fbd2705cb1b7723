//! BOM pin table
//!
//! Every platform import is expanded, following the BOMs it imports, into one
//! table of `module -> pinned version`. When two BOMs pin the same module:
//! - the stronger import wins (enforced > explicit > plugin-implied)
//! - at equal strength the shallower entry wins (a BOM's own entry beats one
//!   it imports)
//! - at equal depth below the top level the first declared wins
//! - two top-level entries of equal strength that disagree are a conflict
//!
//! Imports declared in a `test*` configuration only pin modules that are
//! requested through test configurations alone. They are kept in a separate
//! lane, which takes precedence over the main lane for those modules.

use crate::domain::{Coordinate, ImportKind, ModuleId, PlatformImport, Version};
use crate::error::{ConflictingPin, ResolveError};
use crate::registry::MetadataSource;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::{debug, trace};

/// A version fixed by a BOM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin {
    pub version: Version,
    /// BOM that carries the managed entry
    pub bom: Coordinate,
    /// Top-level import the entry was reached from
    pub import: Coordinate,
    pub strength: u8,
    /// 0 for the imported BOM's own entries
    pub depth: usize,
}

/// Rank of an import kind when pins disagree
pub fn strength(kind: ImportKind) -> u8 {
    match kind {
        ImportKind::EnforcedPlatform => 2,
        ImportKind::Platform | ImportKind::MavenBom => 1,
        ImportKind::Plugin => 0,
    }
}

/// Pins merged from one group of imports
#[derive(Debug, Clone, Default)]
struct Lane {
    pins: BTreeMap<ModuleId, Pin>,
    conflicts: BTreeMap<ModuleId, Vec<ConflictingPin>>,
}

impl Lane {
    /// Merge one candidate pin
    fn offer(&mut self, id: ModuleId, candidate: Pin) {
        let Some(current) = self.pins.get(&id) else {
            self.pins.insert(id, candidate);
            return;
        };

        let replace = match candidate.strength.cmp(&current.strength) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal if candidate.depth < current.depth => true,
            std::cmp::Ordering::Equal => {
                if candidate.depth == 0
                    && current.depth == 0
                    && candidate.import != current.import
                    && candidate.version != current.version
                {
                    let pins = self.conflicts.entry(id.clone()).or_default();
                    if pins.is_empty() {
                        pins.push(ConflictingPin {
                            bom: current.bom.clone(),
                            version: current.version.clone(),
                        });
                    }
                    pins.push(ConflictingPin {
                        bom: candidate.bom.clone(),
                        version: candidate.version.clone(),
                    });
                }
                false
            }
        };

        if replace {
            trace!(module = %id, bom = %candidate.bom, version = %candidate.version, "pin overridden");
            // A stronger or shallower pin settles any earlier disagreement
            self.conflicts.remove(&id);
            self.pins.insert(id, candidate);
        }
    }

    /// Fails on the first unresolved conflict, in module order
    fn check(&self) -> Result<(), ResolveError> {
        match self.conflicts.iter().next() {
            Some((module, pins)) => Err(ResolveError::Conflict {
                module: module.clone(),
                pins: pins.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Module to pin, merged across all imports
#[derive(Debug, Clone, Default)]
pub struct PinTable {
    main: Lane,
    test: Lane,
}

impl PinTable {
    /// Pin for a module requested through at least one non-test configuration
    pub fn get(&self, id: &ModuleId) -> Option<&Pin> {
        self.main.pins.get(id)
    }

    /// Pin for a module requested only through test configurations
    pub fn get_for_tests(&self, id: &ModuleId) -> Option<&Pin> {
        self.test.pins.get(id).or_else(|| self.main.pins.get(id))
    }

    pub fn len(&self) -> usize {
        self.main.pins.len() + self.test.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.main.pins.is_empty() && self.test.pins.is_empty()
    }

    /// Expand the imports through `source`
    pub async fn build(
        imports: &[PlatformImport],
        source: &dyn MetadataSource,
    ) -> Result<Self, ResolveError> {
        let mut table = PinTable::default();

        for import in imports {
            let strength = strength(import.kind);
            let test_only = import.scope.is_some_and(|scope| scope.is_test_only());
            let lane = if test_only { &mut table.test } else { &mut table.main };
            let mut visited = BTreeSet::new();
            let mut queue = VecDeque::from([(import.coordinate.clone(), 0usize)]);

            // Breadth-first, so every entry is seen at its smallest depth
            while let Some((bom, depth)) = queue.pop_front() {
                if !visited.insert(bom.clone()) {
                    trace!(bom = %bom, "already expanded");
                    continue;
                }
                let descriptor = source.fetch_bom(&bom).await?;
                debug!(bom = %bom, depth, test_only, managed = descriptor.managed.len(), "expanding BOM");

                for managed in descriptor.managed {
                    lane.offer(
                        managed.id,
                        Pin {
                            version: managed.version,
                            bom: bom.clone(),
                            import: import.coordinate.clone(),
                            strength,
                            depth,
                        },
                    );
                }
                for nested in descriptor.imports {
                    queue.push_back((nested, depth + 1));
                }
            }
        }

        table.main.check()?;
        table.test.check()?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;
    use crate::domain::Scope;
    use crate::registry::CatalogSource;

    fn coord(s: &str) -> Coordinate {
        s.parse().unwrap()
    }

    fn lib_a() -> ModuleId {
        ModuleId::new("com.example", "lib-a")
    }

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn source(boms: &[(&str, &[(&str, &str)], &[&str])]) -> CatalogSource {
        let mut config = CatalogConfig::default();
        for (bom, managed, imports) in boms {
            config.boms.insert(
                bom.to_string(),
                managed
                    .iter()
                    .map(|(id, v)| (id.to_string(), v.to_string()))
                    .collect(),
            );
            if !imports.is_empty() {
                config.imports.insert(
                    bom.to_string(),
                    imports.iter().map(|i| i.to_string()).collect(),
                );
            }
        }
        CatalogSource::from_config(&config).unwrap()
    }

    fn platform(s: &str) -> PlatformImport {
        PlatformImport::new(coord(s), ImportKind::Platform)
    }

    #[tokio::test]
    async fn test_single_bom() {
        let src = source(&[("com.example:bom:1.0", &[("com.example:lib-a", "2.0")], &[])]);
        let table = PinTable::build(&[platform("com.example:bom:1.0")], &src)
            .await
            .unwrap();
        assert_eq!(table.len(), 1);
        let pin = table.get(&lib_a()).unwrap();
        assert_eq!(pin.version, v("2.0"));
        assert_eq!(pin.bom, coord("com.example:bom:1.0"));
    }

    #[tokio::test]
    async fn test_top_level_conflict() {
        let src = source(&[
            ("com.example:bom-x:1.0", &[("com.example:lib-a", "1.0")], &[]),
            ("com.example:bom-y:1.0", &[("com.example:lib-a", "2.0")], &[]),
        ]);
        let err = PinTable::build(
            &[platform("com.example:bom-x:1.0"), platform("com.example:bom-y:1.0")],
            &src,
        )
        .await
        .unwrap_err();

        match &err {
            ResolveError::Conflict { module, pins } => {
                assert_eq!(module, &lib_a());
                assert_eq!(pins.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        let msg = err.to_string();
        assert!(msg.contains("com.example:bom-x:1.0"));
        assert!(msg.contains("com.example:bom-y:1.0"));
    }

    #[tokio::test]
    async fn test_top_level_agreement_is_not_conflict() {
        let src = source(&[
            ("com.example:bom-x:1.0", &[("com.example:lib-a", "2.0")], &[]),
            ("com.example:bom-y:1.0", &[("com.example:lib-a", "2.0")], &[]),
        ]);
        let table = PinTable::build(
            &[platform("com.example:bom-x:1.0"), platform("com.example:bom-y:1.0")],
            &src,
        )
        .await
        .unwrap();
        assert_eq!(table.get(&lib_a()).unwrap().bom, coord("com.example:bom-x:1.0"));
    }

    #[tokio::test]
    async fn test_enforced_beats_platform() {
        let src = source(&[
            ("com.example:bom-x:1.0", &[("com.example:lib-a", "1.0")], &[]),
            ("com.example:bom-y:1.0", &[("com.example:lib-a", "2.0")], &[]),
        ]);
        let imports = [
            PlatformImport::new(coord("com.example:bom-x:1.0"), ImportKind::EnforcedPlatform),
            platform("com.example:bom-y:1.0"),
        ];
        let table = PinTable::build(&imports, &src).await.unwrap();
        assert_eq!(table.get(&lib_a()).unwrap().version, v("1.0"));
    }

    #[tokio::test]
    async fn test_enforced_settles_conflict() {
        let src = source(&[
            ("com.example:bom-x:1.0", &[("com.example:lib-a", "1.0")], &[]),
            ("com.example:bom-y:1.0", &[("com.example:lib-a", "2.0")], &[]),
            ("com.example:bom-z:1.0", &[("com.example:lib-a", "3.0")], &[]),
        ]);
        let imports = [
            platform("com.example:bom-x:1.0"),
            platform("com.example:bom-y:1.0"),
            PlatformImport::new(coord("com.example:bom-z:1.0"), ImportKind::EnforcedPlatform),
        ];
        let table = PinTable::build(&imports, &src).await.unwrap();
        assert_eq!(table.get(&lib_a()).unwrap().version, v("3.0"));
    }

    #[tokio::test]
    async fn test_own_entry_beats_imported() {
        // bom-x imports base which pins 1.0; bom-y pins 2.0 itself
        let src = source(&[
            ("com.example:bom-x:1.0", &[], &["com.example:base:1.0"]),
            ("com.example:base:1.0", &[("com.example:lib-a", "1.0")], &[]),
            ("com.example:bom-y:1.0", &[("com.example:lib-a", "2.0")], &[]),
        ]);
        let table = PinTable::build(
            &[platform("com.example:bom-x:1.0"), platform("com.example:bom-y:1.0")],
            &src,
        )
        .await
        .unwrap();
        let pin = table.get(&lib_a()).unwrap();
        assert_eq!(pin.version, v("2.0"));
        assert_eq!(pin.depth, 0);
    }

    #[tokio::test]
    async fn test_nested_first_declared_wins() {
        let src = source(&[
            (
                "com.example:bom:1.0",
                &[],
                &["com.example:first:1.0", "com.example:second:1.0"],
            ),
            ("com.example:first:1.0", &[("com.example:lib-a", "1.5")], &[]),
            ("com.example:second:1.0", &[("com.example:lib-a", "9.0")], &[]),
        ]);
        let table = PinTable::build(&[platform("com.example:bom:1.0")], &src)
            .await
            .unwrap();
        let pin = table.get(&lib_a()).unwrap();
        assert_eq!(pin.version, v("1.5"));
        assert_eq!(pin.bom, coord("com.example:first:1.0"));
        assert_eq!(pin.depth, 1);
    }

    #[tokio::test]
    async fn test_import_cycle_terminates() {
        let src = source(&[
            ("com.example:a:1.0", &[("com.example:lib-a", "1.0")], &["com.example:b:1.0"]),
            ("com.example:b:1.0", &[], &["com.example:a:1.0"]),
        ]);
        let table = PinTable::build(&[platform("com.example:a:1.0")], &src)
            .await
            .unwrap();
        assert_eq!(table.len(), 1);
    }

    #[tokio::test]
    async fn test_explicit_beats_plugin_implied() {
        let src = source(&[
            ("com.example:boot:1.0", &[("com.example:lib-a", "1.0")], &[]),
            ("com.example:bom:1.0", &[("com.example:lib-a", "2.0")], &[]),
        ]);
        let imports = [
            PlatformImport::new(coord("com.example:boot:1.0"), ImportKind::Plugin),
            platform("com.example:bom:1.0"),
        ];
        let table = PinTable::build(&imports, &src).await.unwrap();
        assert_eq!(table.get(&lib_a()).unwrap().version, v("2.0"));
    }

    #[tokio::test]
    async fn test_test_import_pins_only_test_modules() {
        let src = source(&[("org.junit:junit-bom:5.10.0", &[("com.example:lib-a", "9.9")], &[])]);
        let imports = [platform("org.junit:junit-bom:5.10.0").in_scope(Scope::TestImplementation)];
        let table = PinTable::build(&imports, &src).await.unwrap();

        assert!(table.get(&lib_a()).is_none());
        assert_eq!(table.get_for_tests(&lib_a()).unwrap().version, v("9.9"));
    }

    #[tokio::test]
    async fn test_test_import_overrides_main_for_tests() {
        let src = source(&[
            ("com.example:bom:1.0", &[("com.example:lib-a", "2.0")], &[]),
            ("com.example:test-bom:1.0", &[("com.example:lib-a", "3.0")], &[]),
        ]);
        let imports = [
            platform("com.example:bom:1.0").in_scope(Scope::Implementation),
            platform("com.example:test-bom:1.0").in_scope(Scope::TestImplementation),
        ];
        // Separate lanes, so no conflict
        let table = PinTable::build(&imports, &src).await.unwrap();
        assert_eq!(table.get(&lib_a()).unwrap().version, v("2.0"));
        assert_eq!(table.get_for_tests(&lib_a()).unwrap().version, v("3.0"));
        assert_eq!(
            table.get_for_tests(&ModuleId::new("com.example", "other")),
            None
        );
    }

    #[tokio::test]
    async fn test_main_pin_visible_to_tests() {
        let src = source(&[("com.example:bom:1.0", &[("com.example:lib-a", "2.0")], &[])]);
        let table = PinTable::build(&[platform("com.example:bom:1.0")], &src)
            .await
            .unwrap();
        assert_eq!(table.get_for_tests(&lib_a()).unwrap().version, v("2.0"));
    }

    #[tokio::test]
    async fn test_missing_bom_is_error() {
        let src = source(&[]);
        let err = PinTable::build(&[platform("com.example:nowhere:1.0")], &src)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Registry(_)));
    }
}
