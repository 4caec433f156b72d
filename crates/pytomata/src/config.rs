// Copyright (c) Contributors to the Pytomata project.
// SPDX-License-Identifier: MIT

//! Runtime configuration.
//!
//! Values are resolved from built-in defaults, then an optional
//! `config.yaml` inside the home directory, then `PYTOMATA_*` environment
//! variables, with an explicit home (eg: from `--home`) taking precedence
//! over everything else.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::lock::LockPolicy;
use crate::{CONFIG_FILENAME, ENVS_DIRNAME};

#[cfg(test)]
#[path = "./config_test.rs"]
mod config_test;

/// Interpreter version used when `make` is not given one.
pub const DEFAULT_VERSION: &str = "3";

/// Environment variable naming the home directory.
pub const HOME_VAR: &str = "PYTOMATA_HOME";

/// Environment variable overriding the default interpreter version.
pub const DEFAULT_VERSION_VAR: &str = "PYTOMATA_DEFAULT_VERSION";

/// Environment variable naming the interpreter program to run.
pub const PYTHON_VAR: &str = "PYTOMATA_PYTHON";

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the state file, the lock file and all roots.
    pub home: PathBuf,

    /// Version tag used by `make` when none is given.
    pub default_version: String,

    /// Interpreter program to run instead of `python<version>`.
    pub python: Option<String>,

    pub lock: LockPolicy,
}

/// On-disk shape of `config.yaml`; every field is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_timeout_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_poll_ms: Option<u64>,
}

impl Config {
    /// Defaults rooted at `home`, ignoring files and the environment.
    pub fn with_home<P: Into<PathBuf>>(home: P) -> Self {
        Self {
            home: home.into(),
            default_version: DEFAULT_VERSION.to_string(),
            python: None,
            lock: LockPolicy::default(),
        }
    }

    /// Load configuration from the process environment.
    pub fn load(home: Option<PathBuf>) -> crate::Result<Self> {
        Self::load_with(home, |key| std::env::var(key).ok())
    }

    /// Load configuration reading variables through `var`.
    pub fn load_with<F>(home: Option<PathBuf>, var: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| var(key).filter(|value| !value.is_empty());

        let home = match home.or_else(|| var(HOME_VAR).map(PathBuf::from)) {
            Some(home) => home,
            None => default_home()?,
        };
        let mut config = Self::with_home(home);

        let file = ConfigFile::load(&config.home.join(CONFIG_FILENAME))?;
        config.apply(file);

        if let Some(version) = var(DEFAULT_VERSION_VAR) {
            config.default_version = version;
        }
        if let Some(python) = var(PYTHON_VAR) {
            config.python = Some(python);
        }

        tracing::debug!(home = ?config.home, version = %config.default_version, "loaded config");
        Ok(config)
    }

    fn apply(&mut self, file: ConfigFile) {
        if let Some(version) = file.default_version {
            self.default_version = version;
        }
        if file.python.is_some() {
            self.python = file.python;
        }
        if let Some(ms) = file.lock_timeout_ms {
            self.lock.timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = file.lock_poll_ms {
            self.lock.poll = Duration::from_millis(ms.max(1));
        }
    }

    /// Directory under which environment roots are allocated.
    pub fn envs_dir(&self) -> PathBuf {
        self.home.join(ENVS_DIRNAME)
    }
}

impl ConfigFile {
    /// Read `path`, treating a missing file as empty.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let yaml = match std::fs::read_to_string(path) {
            Ok(yaml) => yaml,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(error) => {
                return Err(crate::Error::ReadFailed {
                    path: path.to_path_buf(),
                    error,
                });
            }
        };
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&yaml).map_err(|error| crate::Error::InvalidConfigFile {
            path: path.to_path_buf(),
            error,
        })
    }
}

/// Platform data directory for pytomata, eg: `~/.local/share/pytomata`.
pub fn default_home() -> crate::Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("pytomata"))
        .ok_or_else(|| {
            crate::Error::InvalidConfig("cannot determine a data directory for this user".into())
        })
}
