// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-run log file, its "current" link and the retention sweep

use crate::encoding::{EncodeErrors, Encoding};
use crate::format::{Formatter, TemplateError, LOG_FILE_TEMPLATE, LOG_LINK_TEMPLATE};
use crate::log::{FileSink, Logger};
use crate::run_info::RunInfo;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogFileError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("cannot expand ~ in {0}: no home directory")]
    NoHome(String),

    #[error("invalid log path {path}: {source}")]
    Resolve {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to link {link} to {target}: {source}")]
    Link {
        link: PathBuf,
        target: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The open log file of the current run
#[derive(Debug)]
pub struct LogFile {
    file: File,
    path: PathBuf,
    link: Option<PathBuf>,
}

impl LogFile {
    /// Render the path templates, create the file and point the link at it.
    ///
    /// The link is only created when the formatter holds a link template.
    pub fn create(formatter: &Formatter, info: &RunInfo) -> Result<Self, LogFileError> {
        let path = resolve_path(&formatter.render_run(LOG_FILE_TEMPLATE, info)?)?;
        let file = open_append(&path)?;

        let link = if formatter.has_template(LOG_LINK_TEMPLATE) {
            let link = resolve_path(&formatter.render_run(LOG_LINK_TEMPLATE, info)?)?;
            replace_link(&path, &link).map_err(|source| LogFileError::Link {
                link: link.clone(),
                target: path.clone(),
                source,
            })?;
            Some(link)
        } else {
            None
        };

        tracing::debug!(path = %path.display(), link = ?link, "log file created");
        Ok(Self { file, path, link })
    }

    /// Reopen a log file created by another process of the same run
    pub fn reopen(path: &Path, link: Option<&Path>) -> Result<Self, LogFileError> {
        Ok(Self {
            file: open_append(path)?,
            path: path.to_path_buf(),
            link: link.map(Path::to_path_buf),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn link(&self) -> Option<&Path> {
        self.link.as_deref()
    }

    /// A logger sink appending to this file
    pub fn sink(&self, encoding: Encoding, errors: EncodeErrors) -> Result<FileSink, LogFileError> {
        let file = self.file.try_clone().map_err(|source| LogFileError::Open {
            path: self.path.clone(),
            source,
        })?;
        Ok(FileSink::new(file, &self.path, encoding, errors))
    }

    /// Remove stale siblings of this file, see [`sweep`]
    pub fn sweep(&self, keep: Duration, log: &Logger) -> Vec<PathBuf> {
        sweep(&self.path, self.link.as_deref(), keep, log)
    }
}

/// Expand a leading `~` and make `rendered` absolute
pub fn resolve_path(rendered: &str) -> Result<PathBuf, LogFileError> {
    let expanded = match rendered.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => {
            let home =
                dirs::home_dir().ok_or_else(|| LogFileError::NoHome(rendered.to_string()))?;
            home.join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(rendered),
    };
    std::path::absolute(&expanded).map_err(|source| LogFileError::Resolve {
        path: rendered.to_string(),
        source,
    })
}

fn open_append(path: &Path) -> Result<File, LogFileError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| LogFileError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LogFileError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Point `link` at `target` by renaming a fresh symlink over it.
///
/// Readers see either the old or the new target, never a missing link.
fn replace_link(target: &Path, link: &Path) -> io::Result<()> {
    let parent = link.parent().unwrap_or_else(|| Path::new("/"));
    fs::create_dir_all(parent)?;

    // Relative when both live in the same directory, so the tree can be moved
    let pointee = match target.file_name() {
        Some(name) if target.parent() == Some(parent) => PathBuf::from(name),
        _ => target.to_path_buf(),
    };

    let link_name = link
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let staging = parent.join(format!(".{link_name}.{}.tmp", std::process::id()));
    match fs::remove_file(&staging) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
        _ => {}
    }

    std::os::unix::fs::symlink(&pointee, &staging)?;
    fs::rename(&staging, link).inspect_err(|_| {
        let _ = fs::remove_file(&staging);
    })
}

/// Delete files next to `active` last modified more than `keep` ago.
///
/// The active file, its link and subdirectories are never touched. Announces
/// the sweep once under `sisyphus.info`, then logs each removal. A failed
/// removal is logged and the sweep continues. Returns the removed paths.
pub fn sweep(active: &Path, link: Option<&Path>, keep: Duration, log: &Logger) -> Vec<PathBuf> {
    let mut removed = Vec::new();
    let Some(dir) = active.parent() else {
        return removed;
    };
    let cutoff = SystemTime::now()
        .checked_sub(keep)
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "cannot list log directory");
            return removed;
        }
    };

    let info = log.tag("sisyphus").tag("info");
    let mut announced = false;
    for entry in entries.flatten() {
        let path = entry.path();
        if path == active || link == Some(path.as_path()) {
            continue;
        }
        let Ok(metadata) = fs::symlink_metadata(&path) else {
            continue;
        };
        if metadata.is_dir() {
            continue;
        }
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        if modified >= cutoff {
            continue;
        }

        if !announced {
            info.log(format!(
                "Removing logfiles older than {}",
                humantime::format_duration(keep)
            ));
            announced = true;
        }
        info.log(format!("Removing logfile {}", path.display()));
        match fs::remove_file(&path) {
            Ok(()) => removed.push(path),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove old log file");
                log.tag("sisyphus")
                    .tag("warn")
                    .log(format!("Failed to remove logfile {}: {e}", path.display()));
            }
        }
    }
    removed
}

#[cfg(test)]
#[path = "logfile_tests.rs"]
mod tests;
