// Copyright (c) Contributors to the Pytomata project.
// SPDX-License-Identifier: MIT

//! Persisted state shared by the store and the registry.
//!
//! All environment and association records live in a single YAML document.
//! Components never touch that document directly; they go through a
//! [`StateHandle`], which hands out consistent snapshots for reads and runs
//! mutations as all-or-nothing transactions under an exclusive lock.

use std::fmt::Debug;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::environment::{Association, Environment};
use crate::lock::{LockMode, LockPolicy, StateLock};
use crate::{STATE_FILENAME, STATE_LOCK_FILENAME};

#[cfg(test)]
#[path = "./state_test.rs"]
mod state_test;

/// State file API version.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum StateApiVersion {
    #[default]
    #[serde(rename = "pytomata/v0")]
    V0,
}

/// Helper for two-stage deserialization to determine API version first.
#[derive(Deserialize)]
struct ApiVersionMapping {
    #[serde(default)]
    api: ApiVersion,
}

/// Accepts any string so that unknown versions get a readable error.
#[derive(Deserialize, Default)]
#[serde(transparent)]
struct ApiVersion(Option<String>);

/// Every environment and association record.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct State {
    #[serde(default)]
    pub api: StateApiVersion,

    /// Environment records in creation order.
    #[serde(default)]
    pub(crate) environments: Vec<Environment>,

    /// Association records in insertion order.
    #[serde(default)]
    pub(crate) associations: Vec<Association>,
}

impl State {
    /// Parse state from YAML read out of `path`.
    pub fn from_yaml(yaml: &str, path: &Path) -> crate::Result<Self> {
        let invalid = |error| crate::Error::InvalidState {
            path: path.to_path_buf(),
            error,
        };

        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        // Stage 1: Parse to get API version
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).map_err(invalid)?;
        let with_version: ApiVersionMapping =
            serde_yaml::from_value(value.clone()).map_err(invalid)?;

        // Stage 2: Deserialize based on version
        match with_version.api.0.as_deref() {
            None | Some("pytomata/v0") => serde_yaml::from_value(value).map_err(invalid),
            Some(other) => Err(invalid(serde::de::Error::custom(format!(
                "unsupported api version '{other}', expected 'pytomata/v0'"
            )))),
        }
    }

    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Environment records in creation order.
    pub fn environments(&self) -> &[Environment] {
        &self.environments
    }

    /// Association records in insertion order.
    pub fn associations(&self) -> &[Association] {
        &self.associations
    }

    pub fn environment(&self, name: &str) -> Option<&Environment> {
        self.environments.iter().find(|env| env.name == name)
    }

    /// Project paths attached to `name`, in insertion order.
    pub fn projects_of(&self, name: &str) -> Vec<PathBuf> {
        self.associations
            .iter()
            .filter(|assoc| assoc.environment == name)
            .map(|assoc| assoc.path.clone())
            .collect()
    }

    /// The association covering exactly `path`, if any.
    pub fn association_at(&self, path: &Path) -> Option<&Association> {
        self.associations.iter().find(|assoc| assoc.path == path)
    }
}

/// Storage for [`State`] that supports snapshots and exclusive updates.
pub trait StateBackend: Debug + Send + Sync {
    /// Read a consistent copy of the current state.
    fn snapshot(&self) -> crate::Result<State>;

    /// Take exclusive ownership of the state until the transaction drops.
    fn begin(&self) -> crate::Result<Box<dyn Transaction + '_>>;
}

/// Exclusive access to the state, released on drop.
pub trait Transaction {
    /// The state as it was when the transaction began.
    fn current(&self) -> &State;

    /// Replace the persisted state with `state`.
    fn commit(self: Box<Self>, state: State) -> crate::Result<()>;
}

/// Cheaply clonable handle passed into every component.
#[derive(Debug, Clone)]
pub struct StateHandle {
    backend: Arc<dyn StateBackend>,
}

impl StateHandle {
    pub fn new<B: StateBackend + 'static>(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// State persisted under `home`, guarded by a lock file.
    pub fn open<P: Into<PathBuf>>(home: P, policy: LockPolicy) -> Self {
        Self::new(FileBackend::new(home, policy))
    }

    /// Volatile state, mostly useful in tests.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::default())
    }

    pub fn snapshot(&self) -> crate::Result<State> {
        self.backend.snapshot()
    }

    /// Run `mutate` against a copy of the state and persist the copy only
    /// if it succeeds.
    ///
    /// The exclusive lock is held for the whole closure and released on
    /// every exit path. An error leaves the persisted state untouched.
    pub fn transact<T, F>(&self, mutate: F) -> crate::Result<T>
    where
        F: FnOnce(&mut State) -> crate::Result<T>,
    {
        let txn = self.backend.begin()?;
        let mut next = txn.current().clone();
        let output = mutate(&mut next)?;
        if &next != txn.current() {
            txn.commit(next)?;
        }
        Ok(output)
    }
}

/// State stored as YAML under a home directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    state_path: PathBuf,
    lock_path: PathBuf,
    policy: LockPolicy,
}

impl FileBackend {
    pub fn new<P: Into<PathBuf>>(home: P, policy: LockPolicy) -> Self {
        let home = home.into();
        Self {
            state_path: home.join(STATE_FILENAME),
            lock_path: home.join(STATE_LOCK_FILENAME),
            policy,
        }
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    fn read(&self) -> crate::Result<State> {
        match std::fs::read_to_string(&self.state_path) {
            Ok(yaml) => State::from_yaml(&yaml, &self.state_path),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(State::default()),
            Err(error) => Err(crate::Error::ReadFailed {
                path: self.state_path.clone(),
                error,
            }),
        }
    }

    fn write(&self, state: &State) -> crate::Result<()> {
        let write_failed = |error| crate::Error::WriteFailed {
            path: self.state_path.clone(),
            error,
        };
        let yaml = state.to_yaml().map_err(|error| crate::Error::InvalidState {
            path: self.state_path.clone(),
            error,
        })?;

        // Write next to the target and rename over it so readers only
        // ever see a complete document.
        let dir = self
            .state_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_failed)?;
        tmp.write_all(yaml.as_bytes()).map_err(write_failed)?;
        tmp.as_file().sync_all().map_err(write_failed)?;
        tmp.persist(&self.state_path)
            .map_err(|err| write_failed(err.error))?;

        tracing::debug!(path = ?self.state_path, "wrote state");
        Ok(())
    }
}

impl StateBackend for FileBackend {
    fn snapshot(&self) -> crate::Result<State> {
        let _lock = StateLock::acquire(&self.lock_path, LockMode::Shared, &self.policy)?;
        self.read()
    }

    fn begin(&self) -> crate::Result<Box<dyn Transaction + '_>> {
        let lock = StateLock::acquire(&self.lock_path, LockMode::Exclusive, &self.policy)?;
        let state = self.read()?;
        Ok(Box::new(FileTransaction {
            backend: self,
            state,
            _lock: lock,
        }))
    }
}

struct FileTransaction<'a> {
    backend: &'a FileBackend,
    state: State,
    _lock: StateLock,
}

impl Transaction for FileTransaction<'_> {
    fn current(&self) -> &State {
        &self.state
    }

    fn commit(self: Box<Self>, state: State) -> crate::Result<()> {
        self.backend.write(&state)
    }
}

/// State kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn with_state(state: State) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panic in another holder cannot leave a half-written state
        // because commits replace the value wholesale.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StateBackend for MemoryBackend {
    fn snapshot(&self) -> crate::Result<State> {
        Ok(self.lock().clone())
    }

    fn begin(&self) -> crate::Result<Box<dyn Transaction + '_>> {
        Ok(Box::new(MemoryTransaction { guard: self.lock() }))
    }
}

struct MemoryTransaction<'a> {
    guard: MutexGuard<'a, State>,
}

impl Transaction for MemoryTransaction<'_> {
    fn current(&self) -> &State {
        &self.guard
    }

    fn commit(mut self: Box<Self>, state: State) -> crate::Result<()> {
        *self.guard = state;
        Ok(())
    }
}
