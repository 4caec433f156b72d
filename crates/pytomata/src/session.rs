// Copyright (c) Contributors to the Pytomata project.
// SPDX-License-Identifier: MIT

//! Wiring of all components over one state handle.

use std::sync::Arc;

use crate::config::Config;
use crate::lifecycle::LifecycleManager;
use crate::registry::AssociationRegistry;
use crate::resolver::Resolver;
use crate::state::StateHandle;
use crate::store::EnvironmentStore;
use crate::toolchain::{Toolchain, VenvToolchain};

/// The store, registry, lifecycle manager and resolver sharing one state.
#[derive(Debug, Clone)]
pub struct Session {
    pub store: EnvironmentStore,
    pub registry: AssociationRegistry,
    pub lifecycle: LifecycleManager,
    pub resolver: Resolver,
}

impl Session {
    /// Open the on-disk state described by `config`, provisioning with
    /// the interpreter's `venv` module.
    pub fn open(config: &Config) -> Self {
        let state = StateHandle::open(&config.home, config.lock);
        let toolchain = Arc::new(VenvToolchain::new(config.python.clone()));
        Self::with_parts(config, state, toolchain)
    }

    /// Assemble a session from an explicit state handle and toolchain.
    pub fn with_parts(config: &Config, state: StateHandle, toolchain: Arc<dyn Toolchain>) -> Self {
        let store = EnvironmentStore::new(state.clone(), config.envs_dir());
        let registry = AssociationRegistry::new(state.clone());
        let lifecycle = LifecycleManager::new(
            store.clone(),
            registry.clone(),
            state,
            Arc::clone(&toolchain),
            config.default_version.clone(),
        );
        let resolver = Resolver::new(store.clone(), registry.clone(), toolchain);
        Self {
            store,
            registry,
            lifecycle,
            resolver,
        }
    }
}
