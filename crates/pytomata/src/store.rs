// Copyright (c) Contributors to the Pytomata project.
// SPDX-License-Identifier: MIT

//! The environment store: the authoritative set of environment records.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

use crate::environment::{validate_name, Environment, ListFilter};
use crate::state::{State, StateHandle};
use crate::Error;

#[cfg(test)]
#[path = "./store_test.rs"]
mod store_test;

/// An environment together with the projects attached to it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub environment: Environment,
    pub projects: Vec<PathBuf>,
}

/// Environment records kept in the persisted state.
#[derive(Debug, Clone)]
pub struct EnvironmentStore {
    state: StateHandle,
    envs_dir: PathBuf,
}

impl EnvironmentStore {
    /// Create a store whose roots are allocated under `envs_dir`.
    pub fn new<P: Into<PathBuf>>(state: StateHandle, envs_dir: P) -> Self {
        Self {
            state,
            envs_dir: envs_dir.into(),
        }
    }

    /// The root directory allocated to an environment called `name`.
    pub fn root_for(&self, name: &str) -> PathBuf {
        self.envs_dir.join(name)
    }

    pub fn envs_dir(&self) -> &Path {
        &self.envs_dir
    }

    /// Record a new environment.
    ///
    /// Only the record is written; materializing the root is up to the
    /// lifecycle manager.
    pub fn create(&self, name: &str, version: &str) -> crate::Result<Environment> {
        validate_name(name)?;
        let root = self.root_for(name);
        self.state
            .transact(|state| state.insert_environment(name, root, version))
    }

    pub fn get(&self, name: &str) -> crate::Result<Environment> {
        self.state
            .snapshot()?
            .environment(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Environments accepted by `filter`, in creation order.
    pub fn list(&self, filter: ListFilter) -> crate::Result<Vec<Environment>> {
        Ok(self
            .state
            .snapshot()?
            .catalog(filter)
            .into_iter()
            .map(|entry| entry.environment)
            .collect())
    }

    /// Like [`Self::list`], with each environment's attached projects.
    pub fn catalog(&self, filter: ListFilter) -> crate::Result<Vec<CatalogEntry>> {
        Ok(self.state.snapshot()?.catalog(filter))
    }

    /// Replace the interpreter version of an existing environment.
    pub fn update_version(&self, name: &str, version: &str) -> crate::Result<Environment> {
        self.state
            .transact(|state| state.set_version(name, version))
    }

    /// Drop the record of `name`, which must have no attached projects.
    pub fn delete(&self, name: &str) -> crate::Result<Environment> {
        self.state.transact(|state| state.remove_environment(name))
    }
}

impl State {
    pub(crate) fn insert_environment(
        &mut self,
        name: &str,
        root: PathBuf,
        version: &str,
    ) -> crate::Result<Environment> {
        if self.environment(name).is_some() {
            return Err(Error::DuplicateName(name.to_string()));
        }
        if let Some(owner) = self.environments.iter().find(|env| env.root == root) {
            return Err(Error::DuplicateRoot {
                root,
                owner: owner.name.clone(),
            });
        }

        let env = Environment {
            name: name.to_string(),
            root,
            version: version.to_string(),
            created: Utc::now(),
            upgraded: None,
        };
        self.environments.push(env.clone());
        Ok(env)
    }

    pub(crate) fn set_version(&mut self, name: &str, version: &str) -> crate::Result<Environment> {
        let env = self
            .environments
            .iter_mut()
            .find(|env| env.name == name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        env.version = version.to_string();
        env.upgraded = Some(Utc::now());
        Ok(env.clone())
    }

    pub(crate) fn remove_environment(&mut self, name: &str) -> crate::Result<Environment> {
        let index = self
            .environments
            .iter()
            .position(|env| env.name == name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;

        let count = self.attachment_count(name);
        if count > 0 {
            return Err(Error::HasAssociations {
                name: name.to_string(),
                count,
            });
        }

        Ok(self.environments.remove(index))
    }

    pub(crate) fn attachment_count(&self, name: &str) -> usize {
        self.associations
            .iter()
            .filter(|assoc| assoc.environment == name)
            .count()
    }

    pub(crate) fn catalog(&self, filter: ListFilter) -> Vec<CatalogEntry> {
        self.environments
            .iter()
            .map(|env| CatalogEntry {
                environment: env.clone(),
                projects: self.projects_of(&env.name),
            })
            .filter(|entry| filter.accepts(entry.projects.len()))
            .collect()
    }
}
