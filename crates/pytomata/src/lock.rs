// Copyright (c) Contributors to the Pytomata project.
// SPDX-License-Identifier: MIT

//! Advisory file locks guarding the persisted state.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs4::FileExt;

#[cfg(test)]
#[path = "./lock_test.rs"]
mod lock_test;

/// Default upper bound on waiting for a contended lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Default delay between acquisition attempts.
pub const DEFAULT_LOCK_POLL: Duration = Duration::from_millis(50);

/// Bounded wait used when the lock is contended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    pub timeout: Duration,
    pub poll: Duration,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_LOCK_TIMEOUT,
            poll: DEFAULT_LOCK_POLL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Any number of readers.
    Shared,
    /// A single writer, excluding readers.
    Exclusive,
}

/// A held lock on a lock file, released when dropped.
#[derive(Debug)]
pub struct StateLock {
    file: File,
    path: PathBuf,
    mode: LockMode,
}

impl StateLock {
    /// Acquire `path` in the given mode, retrying until the policy timeout.
    pub fn acquire(path: &Path, mode: LockMode, policy: &LockPolicy) -> crate::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| crate::Error::WriteFailed {
                path: parent.to_path_buf(),
                error,
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)
            .map_err(|error| crate::Error::ReadFailed {
                path: path.to_path_buf(),
                error,
            })?;

        let started = Instant::now();
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let result = match mode {
                LockMode::Shared => FileExt::try_lock_shared(&file),
                LockMode::Exclusive => FileExt::try_lock_exclusive(&file),
            };
            match result {
                Ok(()) => break,
                Err(err) if is_contended(&err) => {
                    let waited = started.elapsed();
                    if waited >= policy.timeout {
                        tracing::debug!(?path, attempts, "gave up waiting for state lock");
                        return Err(crate::Error::LockTimeout {
                            path: path.to_path_buf(),
                            waited,
                            holder: read_holder(&file),
                        });
                    }
                    std::thread::sleep(policy.poll.min(policy.timeout - waited));
                }
                Err(error) => {
                    return Err(crate::Error::ReadFailed {
                        path: path.to_path_buf(),
                        error,
                    });
                }
            }
        }
        tracing::debug!(?path, ?mode, attempts, "acquired state lock");

        let mut lock = Self {
            file,
            path: path.to_path_buf(),
            mode,
        };
        if mode == LockMode::Exclusive {
            // Holder details only help diagnostics; failing to record them
            // must not fail the operation.
            if let Err(err) = lock.record_holder() {
                tracing::debug!(?err, "could not record state lock holder");
            }
        }
        Ok(lock)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }

    fn record_holder(&mut self) -> std::io::Result<()> {
        let host = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown".to_string());
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        write!(self.file, "pid {} on {}", std::process::id(), host)?;
        self.file.flush()
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if self.mode == LockMode::Exclusive {
            let _ = self.file.set_len(0);
        }
        if let Err(err) = FileExt::unlock(&self.file) {
            tracing::warn!(path = ?self.path, ?err, "failed to release state lock");
        }
    }
}

fn is_contended(err: &std::io::Error) -> bool {
    if err.kind() == ErrorKind::WouldBlock {
        return true;
    }
    // ERROR_SHARING_VIOLATION and ERROR_LOCK_VIOLATION
    cfg!(windows) && matches!(err.raw_os_error(), Some(32 | 33))
}

fn read_holder(mut file: &File) -> Option<String> {
    let mut holder = String::new();
    file.seek(SeekFrom::Start(0)).ok()?;
    file.read_to_string(&mut holder).ok()?;
    let holder = holder.trim();
    (!holder.is_empty()).then(|| holder.to_string())
}
