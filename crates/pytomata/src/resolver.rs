// Copyright (c) Contributors to the Pytomata project.
// SPDX-License-Identifier: MIT

//! Finding the environment that applies to a name or a location.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::environment::Environment;
use crate::registry::AssociationRegistry;
use crate::store::EnvironmentStore;
use crate::toolchain::Toolchain;
use crate::Error;

#[cfg(test)]
#[path = "./resolver_test.rs"]
mod resolver_test;

/// Where `find` points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub environment: Environment,
    /// The executables directory, or a single executable when a module
    /// was selected.
    pub path: PathBuf,
}

/// Everything a shell needs to switch into an environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub environment: Environment,
    pub bin_dir: PathBuf,
    pub activate_script: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Resolver {
    store: EnvironmentStore,
    registry: AssociationRegistry,
    toolchain: Arc<dyn Toolchain>,
}

impl Resolver {
    pub fn new(
        store: EnvironmentStore,
        registry: AssociationRegistry,
        toolchain: Arc<dyn Toolchain>,
    ) -> Self {
        Self {
            store,
            registry,
            toolchain,
        }
    }

    /// Locate the executables of the environment named or governing
    /// `identifier`.
    ///
    /// A known environment name always wins; anything else is treated as a
    /// path and resolved through its attached ancestors.
    pub fn find(&self, identifier: &str, module: Option<&str>) -> crate::Result<Location> {
        let environment = self.lookup(identifier)?;
        let bin_dir = self.toolchain.bin_dir(&environment.root);

        let path = match module {
            None => bin_dir,
            Some(module) => {
                let executable = executable_in(&bin_dir, module);
                if !executable.is_file() {
                    return Err(Error::ModuleNotFound {
                        environment: environment.name,
                        module: module.to_string(),
                    });
                }
                executable
            }
        };

        Ok(Location { environment, path })
    }

    /// Activate `name`, or whichever environment governs the current
    /// directory.
    pub fn workon(&self, name: Option<&str>) -> crate::Result<Activation> {
        let cwd = std::env::current_dir()?;
        self.workon_from(name, &cwd)
    }

    /// Like [`Self::workon`], resolving from `cwd` when no name is given.
    pub fn workon_from(&self, name: Option<&str>, cwd: &Path) -> crate::Result<Activation> {
        let environment = match name {
            Some(name) => self.lookup(name)?,
            None => self.governing(cwd)?,
        };
        tracing::debug!(name = %environment.name, "activating environment");

        Ok(Activation {
            bin_dir: self.toolchain.bin_dir(&environment.root),
            activate_script: self.toolchain.activate_script(&environment.root),
            environment,
        })
    }

    fn lookup(&self, identifier: &str) -> crate::Result<Environment> {
        match self.store.get(identifier) {
            Err(Error::NotFound(_)) => self.governing(Path::new(identifier)),
            result => result,
        }
    }

    fn governing(&self, path: &Path) -> crate::Result<Environment> {
        let name = self
            .registry
            .resolve(path)?
            .ok_or_else(|| Error::NoEnvironment(path.to_path_buf()))?;
        tracing::debug!(?path, %name, "resolved environment from path");
        self.store.get(&name)
    }
}

fn executable_in(bin_dir: &Path, module: &str) -> PathBuf {
    let executable = bin_dir.join(module);
    if cfg!(windows) {
        with_exe_extension(executable)
    } else {
        executable
    }
}

/// `path` with `.exe` appended, unless it already ends in it.
///
/// Versioned names like `pip3.11` keep their dots.
fn with_exe_extension(path: PathBuf) -> PathBuf {
    let is_exe = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("exe"));
    if is_exe {
        return path;
    }
    let mut name = path.into_os_string();
    name.push(".exe");
    PathBuf::from(name)
}
