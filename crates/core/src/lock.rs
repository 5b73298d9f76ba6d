// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-instance lock on a stable file.
//!
//! The lock is an advisory `flock` held through an open file handle, so the
//! operating system drops it when the holder exits, even abnormally. A
//! crashed run can never leave a stale lock behind. The lock belongs to the
//! open file description, so a process handed a [`share`](SingleInstanceLock::share)d
//! handle keeps it alive after the original holder is gone.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("failed to open lock resource {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to lock {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to share lock on {path}: {source}")]
    Share {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result of a non-blocking acquisition attempt
#[derive(Debug)]
pub enum Acquire {
    Acquired(SingleInstanceLock),
    /// Another live process holds the lock
    AlreadyHeld,
}

/// Exclusive lock, released on [`release`](Self::release) or drop
#[derive(Debug)]
pub struct SingleInstanceLock {
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    file: File,
    path: PathBuf,
}

impl SingleInstanceLock {
    /// Try to take the lock without blocking.
    ///
    /// A missing resource file is created so explicit lock paths work.
    pub fn try_acquire(path: &Path) -> Result<Acquire, LockError> {
        let file = open_resource(path).map_err(|source| LockError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "lock acquired");
                Ok(Acquire::Acquired(Self {
                    file,
                    path: path.to_path_buf(),
                }))
            }
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                tracing::debug!(path = %path.display(), "lock held by another process");
                Ok(Acquire::AlreadyHeld)
            }
            Err(source) => Err(LockError::Lock {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Another handle on the locked file; the lock holds while any handle is open
    pub fn share(&self) -> Result<File, LockError> {
        self.file.try_clone().map_err(|source| LockError::Share {
            path: self.path.clone(),
            source,
        })
    }

    /// Release explicitly, including for every shared handle; a plain drop
    /// only releases once no shared handle remains
    pub fn release(self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to unlock");
        }
    }
}

fn open_resource(path: &Path) -> io::Result<File> {
    match File::open(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            OpenOptions::new().write(true).create(true).truncate(false).open(path)
        }
        result => result,
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
