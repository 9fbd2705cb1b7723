//! `buildplan.lock` reading, writing and verification

use crate::domain::ResolvedGraph;
use crate::error::ResolveError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

pub const LOCKFILE_NAME: &str = "buildplan.lock";

const LOCKFILE_FORMAT: u32 = 1;

const HEADER: &str = "# Generated by buildplan. Do not edit by hand.\n\n";

/// Resolved `module = version` pairs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lockfile {
    pub format: u32,
    pub modules: BTreeMap<String, String>,
}

impl Lockfile {
    pub fn from_graph(graph: &ResolvedGraph) -> Self {
        Self {
            format: LOCKFILE_FORMAT,
            modules: graph
                .iter()
                .map(|(id, node)| (id.to_string(), node.version.to_string()))
                .collect(),
        }
    }

    /// Read a lockfile; None when the file does not exist
    pub fn load(path: &Path) -> Result<Option<Self>, ResolveError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(lockfile_error(path, e.to_string())),
        };

        let lockfile: Lockfile =
            toml::from_str(&content).map_err(|e| lockfile_error(path, e.to_string()))?;
        if lockfile.format != LOCKFILE_FORMAT {
            return Err(lockfile_error(
                path,
                format!("unsupported format {}", lockfile.format),
            ));
        }
        Ok(Some(lockfile))
    }

    pub fn write(&self, path: &Path) -> Result<(), ResolveError> {
        let body = toml::to_string(self).map_err(|e| lockfile_error(path, e.to_string()))?;
        std::fs::write(path, format!("{}{}", HEADER, body))
            .map_err(|e| lockfile_error(path, e.to_string()))?;
        debug!(path = %path.display(), modules = self.modules.len(), "wrote lockfile");
        Ok(())
    }

    /// Fails on the first module, in id order, whose version differs
    pub fn verify(&self, graph: &ResolvedGraph) -> Result<(), ResolveError> {
        let fresh = Lockfile::from_graph(graph);
        let mut ids: Vec<&String> = self.modules.keys().chain(fresh.modules.keys()).collect();
        ids.sort();
        ids.dedup();

        for id in ids {
            let locked = self.modules.get(id);
            let resolved = fresh.modules.get(id);
            if locked != resolved {
                return Err(ResolveError::LockMismatch {
                    module: id.clone(),
                    locked: locked.cloned().unwrap_or_else(|| "(absent)".to_string()),
                    resolved: resolved.cloned().unwrap_or_else(|| "(absent)".to_string()),
                });
            }
        }
        Ok(())
    }
}

fn lockfile_error(path: &Path, message: String) -> ResolveError {
    ResolveError::Lockfile {
        path: path.to_path_buf(),
        message,
    }
}
