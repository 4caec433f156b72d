// Copyright (c) Contributors to the Pytomata project.
// SPDX-License-Identifier: MIT

//! pytomata - Automated virtual environment management
//!
//! This crate provides the core library for managing isolated Python virtual
//! environments and binding them to project directories, so that the right
//! environment can be found from anywhere inside a project.
//!
//! # Overview
//!
//! - [`EnvironmentStore`] keeps one record per environment (name, root,
//!   interpreter version).
//! - [`AssociationRegistry`] binds project directories to environments, at
//!   most one environment per directory.
//! - [`LifecycleManager`] provisions and removes environments through a
//!   [`Toolchain`], keeping the store and registry consistent with disk.
//! - [`Resolver`] answers "which environment applies here?".
//!
//! All of them share a [`StateHandle`]; mutations are all-or-nothing and
//! serialized across processes by a lock file.
//!
//! # Example
//!
//! ```yaml
//! # <home>/state.yaml
//! api: pytomata/v0
//! environments:
//!   - name: my_project
//!     root: /home/me/.local/share/pytomata/envs/my_project
//!     version: "3.11"
//!     created: 2026-01-01T12:00:00Z
//! associations:
//!   - environment: my_project
//!     path: /home/me/personal/my_project
//!     attached: 2026-01-01T12:01:00Z
//! ```

pub mod config;
pub mod environment;
pub mod error;
pub mod lifecycle;
pub mod lock;
pub mod registry;
pub mod resolver;
pub mod session;
pub mod state;
pub mod store;
pub mod toolchain;

#[cfg(test)]
pub(crate) mod fixtures;

pub use config::Config;
pub use environment::{validate_name, Association, Environment, ListFilter};
pub use error::{AttachConflict, Error, Result};
pub use lifecycle::{LifecycleManager, Removed};
pub use lock::{LockMode, LockPolicy, StateLock};
pub use registry::{AssociationRegistry, AttachReport};
pub use resolver::{Activation, Location, Resolver};
pub use session::Session;
pub use state::{FileBackend, MemoryBackend, State, StateBackend, StateHandle, Transaction};
pub use store::{CatalogEntry, EnvironmentStore};
pub use toolchain::{Toolchain, ToolchainError, VenvToolchain};

/// Well-known filename for the persisted state.
pub const STATE_FILENAME: &str = "state.yaml";

/// Well-known filename for the state lock.
pub const STATE_LOCK_FILENAME: &str = "state.lock";

/// Well-known filename for the optional configuration.
pub const CONFIG_FILENAME: &str = "config.yaml";

/// Directory under the home where environment roots live.
pub const ENVS_DIRNAME: &str = "envs";
