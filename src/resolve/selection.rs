//! Version selection for a single module

use super::pins::Pin;
use crate::domain::{ModuleId, Scope, Selection, Version, VersionConstraint};
use crate::error::ResolveError;
use tracing::{debug, warn};

/// One request for a module, direct or transitive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub constraint: VersionConstraint,
    pub scope: Scope,
    /// Module that asked for it; None for manifest declarations
    pub from: Option<ModuleId>,
    /// Version the constraint settled on; None for `Managed`
    pub candidate: Option<Version>,
}

impl Request {
    pub fn is_direct(&self) -> bool {
        self.from.is_none()
    }
}

/// Pick the version of `id`
///
/// Returns None for a module only requested transitively without a version
/// and not pinned by any BOM.
pub fn select(
    id: &ModuleId,
    requests: &[Request],
    pin: Option<&Pin>,
) -> Result<Option<(Version, Selection)>, ResolveError> {
    if let Some(pin) = pin {
        for request in requests {
            if let Some(candidate) = &request.candidate {
                if *candidate != pin.version {
                    debug!(module = %id, requested = %candidate, pinned = %pin.version, bom = %pin.bom, "BOM pin overrides request");
                }
            }
        }
        return Ok(Some((
            pin.version.clone(),
            Selection::Pinned {
                bom: pin.bom.clone(),
            },
        )));
    }

    let mut candidates: Vec<Version> = requests.iter().filter_map(|r| r.candidate.clone()).collect();
    candidates.sort();
    candidates.dedup();

    let Some(chosen) = candidates.last().cloned() else {
        if requests.iter().any(Request::is_direct) {
            return Err(ResolveError::MissingVersion { module: id.clone() });
        }
        return Ok(None);
    };

    let selection = if candidates.len() == 1 {
        Selection::Requested
    } else {
        Selection::Highest { candidates }
    };
    Ok(Some((chosen, selection)))
}

/// Log requests whose range the chosen version falls outside of
pub fn check_constraints(id: &ModuleId, chosen: &Version, requests: &[Request]) {
    for request in requests {
        if request.constraint.is_dynamic() && !request.constraint.matches(chosen) {
            let from = request
                .from
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| "manifest".to_string());
            warn!(module = %id, selected = %chosen, constraint = %request.constraint, from, "selected version is outside a requested range");
        }
    }
}
