// Copyright (c) Contributors to the Pytomata project.
// SPDX-License-Identifier: MIT

//! Creating, upgrading and removing environments.
//!
//! The store only ever records what the toolchain has successfully
//! provisioned: a failed `make` leaves no record behind, and a failed
//! `upgrade` keeps the previous version authoritative.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::environment::{validate_name, Environment};
use crate::registry::AssociationRegistry;
use crate::state::{State, StateHandle};
use crate::store::EnvironmentStore;
use crate::toolchain::Toolchain;
use crate::Error;

#[cfg(test)]
#[path = "./lifecycle_test.rs"]
mod lifecycle_test;

/// What `remove` took away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removed {
    pub environment: Environment,
    /// Projects that were attached until the removal.
    pub released: Vec<PathBuf>,
}

/// Drives the toolchain and keeps the store and registry in step with it.
#[derive(Debug, Clone)]
pub struct LifecycleManager {
    state: StateHandle,
    store: EnvironmentStore,
    registry: AssociationRegistry,
    toolchain: Arc<dyn Toolchain>,
    default_version: String,
}

impl LifecycleManager {
    pub fn new(
        store: EnvironmentStore,
        registry: AssociationRegistry,
        state: StateHandle,
        toolchain: Arc<dyn Toolchain>,
        default_version: impl Into<String>,
    ) -> Self {
        Self {
            state,
            store,
            registry,
            toolchain,
            default_version: default_version.into(),
        }
    }

    pub fn default_version(&self) -> &str {
        &self.default_version
    }

    /// Provision and record a new environment.
    ///
    /// A root left behind by a failed provision is deleted before the
    /// state lock is released, and only if this call created it.
    pub fn make(&self, name: &str, version: Option<&str>) -> crate::Result<Environment> {
        validate_name(name)?;
        let version = version.unwrap_or(self.default_version.as_str());
        let root = self.store.root_for(name);

        let mut created_root = false;
        let mut recorded = false;
        let result = self.state.transact(|state| {
            if state.environment(name).is_some() {
                return Err(Error::DuplicateName(name.to_string()));
            }

            created_root = !root.exists();
            if !created_root {
                if let Some(owner) = root_owner(state, &root) {
                    return Err(Error::DuplicateRoot {
                        root: root.clone(),
                        owner: owner.name.clone(),
                    });
                }
            }

            tracing::info!(name, version, ?root, "provisioning environment");
            let provisioned = self
                .toolchain
                .provision(&root, version)
                .map_err(|err| Error::Provisioning {
                    name: name.to_string(),
                    reason: err.to_string(),
                })
                .and_then(|()| state.insert_environment(name, root.clone(), version));
            match provisioned {
                Ok(env) => {
                    recorded = true;
                    Ok(env)
                }
                Err(err) => {
                    if created_root {
                        self.discard_root(&root);
                    }
                    Err(err)
                }
            }
        });

        if result.is_err() && recorded && created_root {
            // The record never reached disk; the root is ours unless
            // someone recorded it since.
            let cleanup = self.state.transact(|state| {
                if root_owner(state, &root).is_none() {
                    self.discard_root(&root);
                }
                Ok(())
            });
            if let Err(err) = cleanup {
                tracing::warn!(?root, ?err, "could not clean up after failed state write");
            }
        }
        result
    }

    /// Re-provision an existing environment with another interpreter.
    pub fn upgrade(&self, name: &str, version: Option<&str>) -> crate::Result<Environment> {
        let version = version.unwrap_or(self.default_version.as_str());

        self.state.transact(|state| {
            let env = state
                .environment(name)
                .cloned()
                .ok_or_else(|| Error::NotFound(name.to_string()))?;

            tracing::info!(name, from = %env.version, to = version, "upgrading environment");
            self.toolchain
                .upgrade(&env.root, version)
                .map_err(|err| Error::Provisioning {
                    name: name.to_string(),
                    reason: err.to_string(),
                })?;

            state.set_version(name, version)
        })
    }

    /// Release all projects, delete the root, then forget the environment.
    ///
    /// If the root cannot be deleted the record is kept so that the
    /// removal can be retried.
    pub fn remove(&self, name: &str) -> crate::Result<Removed> {
        let environment = self.store.get(name)?;
        let released = self.registry.detach(name)?;

        if let Err(error) = self.toolchain.destroy(&environment.root) {
            tracing::warn!(name, root = ?environment.root, ?error, "failed to delete environment root");
            return Err(Error::PartialRemoval {
                name: name.to_string(),
                root: environment.root,
                error,
            });
        }

        self.store.delete(name)?;
        tracing::info!(name, "removed environment");
        Ok(Removed {
            environment,
            released,
        })
    }

    fn discard_root(&self, root: &Path) {
        if let Err(err) = self.toolchain.destroy(root) {
            tracing::warn!(?root, ?err, "failed to clean up after provisioning");
        }
    }
}

/// The recorded environment whose root is the same directory as `root`.
fn root_owner<'a>(state: &'a State, root: &Path) -> Option<&'a Environment> {
    let canonical = dunce::canonicalize(root).ok()?;
    state.environments().iter().find(|env| {
        env.root == root
            || dunce::canonicalize(&env.root).is_ok_and(|owned| owned == canonical)
    })
}
