// Copyright (c) Contributors to the Pytomata project.
// SPDX-License-Identifier: MIT

//! The association registry: which project directories belong to which
//! environment.
//!
//! A project path is attached to at most one environment at a time. The
//! check and the update happen inside a single state transaction, so a batch
//! of paths is either attached completely or not at all.

use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use indexmap::IndexSet;

use crate::environment::Association;
use crate::error::AttachConflict;
use crate::state::{State, StateHandle};
use crate::Error;

#[cfg(test)]
#[path = "./registry_test.rs"]
mod registry_test;

/// Outcome of an attach, per path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachReport {
    /// Paths that were not attached to anything before.
    pub attached: Vec<PathBuf>,
    /// Paths moved over from another environment.
    pub rebound: Vec<AttachConflict>,
    /// Paths that were already attached to this environment.
    pub unchanged: Vec<PathBuf>,
}

/// Project associations kept in the persisted state.
#[derive(Debug, Clone)]
pub struct AssociationRegistry {
    state: StateHandle,
}

impl AssociationRegistry {
    pub fn new(state: StateHandle) -> Self {
        Self { state }
    }

    /// Attach every path in `paths` to `env_name`.
    ///
    /// With `warn_on_conflict`, any path already attached to a different
    /// environment fails the whole batch with [`Error::Conflict`]. Without
    /// it, such paths are moved to `env_name`.
    pub fn attach<I, P>(
        &self,
        env_name: &str,
        paths: I,
        warn_on_conflict: bool,
    ) -> crate::Result<AttachReport>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut canonical = IndexSet::new();
        for path in paths {
            canonical.insert(canonicalize_project(path.as_ref())?);
        }

        let report = self
            .state
            .transact(|state| state.attach(env_name, &canonical, warn_on_conflict))?;
        tracing::info!(
            environment = env_name,
            attached = report.attached.len(),
            rebound = report.rebound.len(),
            unchanged = report.unchanged.len(),
            "attached projects"
        );
        Ok(report)
    }

    /// Remove every association of `env_name`, returning the released paths.
    pub fn detach(&self, env_name: &str) -> crate::Result<Vec<PathBuf>> {
        let released = self.state.transact(|state| state.detach(env_name))?;
        tracing::info!(environment = env_name, released = released.len(), "detached projects");
        Ok(released)
    }

    /// Name of the environment governing `path`, if any.
    ///
    /// `path` and then each of its ancestors is checked, so the deepest
    /// attached directory wins.
    pub fn resolve(&self, path: &Path) -> crate::Result<Option<String>> {
        let lookup = lookup_path(path)?;
        let state = self.state.snapshot()?;
        Ok(state
            .resolve(&lookup)
            .map(|assoc| assoc.environment.clone()))
    }

    /// Projects attached to `env_name`, in the order they were attached.
    pub fn list_for(&self, env_name: &str) -> crate::Result<Vec<PathBuf>> {
        let state = self.state.snapshot()?;
        if state.environment(env_name).is_none() {
            return Err(Error::NotFound(env_name.to_string()));
        }
        Ok(state.projects_of(env_name))
    }
}

impl State {
    pub(crate) fn attach(
        &mut self,
        env_name: &str,
        paths: &IndexSet<PathBuf>,
        warn_on_conflict: bool,
    ) -> crate::Result<AttachReport> {
        if self.environment(env_name).is_none() {
            return Err(Error::NotFound(env_name.to_string()));
        }

        if warn_on_conflict {
            let conflicts: Vec<_> = paths
                .iter()
                .filter_map(|path| self.association_at(path))
                .filter(|assoc| assoc.environment != env_name)
                .map(|assoc| AttachConflict {
                    path: assoc.path.clone(),
                    attached_to: assoc.environment.clone(),
                })
                .collect();
            if !conflicts.is_empty() {
                return Err(Error::Conflict {
                    environment: env_name.to_string(),
                    conflicts,
                });
            }
        }

        let now = Utc::now();
        let mut report = AttachReport::default();
        for path in paths {
            let existing = self.associations.iter().position(|assoc| &assoc.path == path);
            match existing {
                Some(index) if self.associations[index].environment == env_name => {
                    report.unchanged.push(path.clone());
                    continue;
                }
                Some(index) => {
                    let previous = self.associations.remove(index);
                    tracing::debug!(?path, from = %previous.environment, to = env_name, "rebinding project");
                    report.rebound.push(AttachConflict {
                        path: path.clone(),
                        attached_to: previous.environment,
                    });
                }
                None => report.attached.push(path.clone()),
            }
            self.associations.push(Association {
                environment: env_name.to_string(),
                path: path.clone(),
                attached: now,
            });
        }

        Ok(report)
    }

    pub(crate) fn detach(&mut self, env_name: &str) -> crate::Result<Vec<PathBuf>> {
        if self.environment(env_name).is_none() {
            return Err(Error::NotFound(env_name.to_string()));
        }

        let mut released = Vec::new();
        self.associations.retain(|assoc| {
            if assoc.environment == env_name {
                released.push(assoc.path.clone());
                false
            } else {
                true
            }
        });
        Ok(released)
    }

    /// The association of the deepest attached ancestor of `path`.
    pub(crate) fn resolve(&self, path: &Path) -> Option<&Association> {
        path.ancestors()
            .find_map(|ancestor| self.association_at(ancestor))
    }
}

/// Canonical form of a project directory that is about to be attached.
pub fn canonicalize_project(path: &Path) -> crate::Result<PathBuf> {
    let canonical = dunce::canonicalize(path).map_err(|error| Error::InvalidProjectPath {
        path: path.to_path_buf(),
        error: Some(error),
    })?;
    if !canonical.is_dir() {
        return Err(Error::InvalidProjectPath {
            path: path.to_path_buf(),
            error: None,
        });
    }
    Ok(canonical)
}

/// Absolute form of `path` suitable for matching against attached paths.
///
/// The deepest existing prefix is canonicalized by the OS, so `..` after a
/// symlink means the same directory it would for a shell. Only the
/// components that do not exist yet are folded lexically.
pub(crate) fn lookup_path(path: &Path) -> crate::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let components: Vec<Component<'_>> = absolute.components().collect();
    for existing in (1..=components.len()).rev() {
        let prefix: PathBuf = components[..existing].iter().collect();
        if let Ok(canonical) = dunce::canonicalize(&prefix) {
            return Ok(fold_components(canonical, &components[existing..]));
        }
    }
    Ok(normalize_lexically(&absolute))
}

/// Append `tail` to `base`, dropping `.` and folding `..`.
fn fold_components(mut base: PathBuf, tail: &[Component<'_>]) -> PathBuf {
    for component in tail {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                base.pop();
            }
            other => base.push(other.as_os_str()),
        }
    }
    base
}

/// Drop `.` and fold `..` components without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let components: Vec<Component<'_>> = path.components().collect();
    fold_components(PathBuf::new(), &components)
}
