// Copyright 2026 The gitsite Authors

//! Finding where a destination path attaches to the existing branch.

use gitsite::DeployPath;

/// The result of [`probe`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Probe {
    /// The deepest ancestor of the probed path (or the path itself) that
    /// exists. The root when nothing exists.
    pub existing: DeployPath,
    /// The paths below `existing` that do not exist yet, outermost first.
    /// Each is the previous one (or `existing`) plus one segment; the last
    /// is the probed path itself.
    pub missing: Vec<DeployPath>,
}

impl Probe {
    /// Returns whether the probed path exists as-is.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Walks up from `path` until `exists` reports a path that is present.
///
/// The root is never queried and always counts as existing, so at most
/// `path.depth()` queries are made. An error from `exists` stops the walk.
pub fn probe<E>(
    path: &DeployPath,
    mut exists: impl FnMut(&DeployPath) -> Result<bool, E>,
) -> Result<Probe, E> {
    let mut current = path.clone();
    let mut pending = Vec::new();
    while !current.is_root() && !exists(&current)? {
        let Some(parent) = current.parent() else { break };
        pending.push(std::mem::replace(&mut current, parent));
    }
    pending.reverse();
    Ok(Probe { existing: current, missing: pending })
}
