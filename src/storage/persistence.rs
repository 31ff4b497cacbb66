//! JSON file persistence for the library catalog

use crate::core::{Book, HistoryRecord, LibraryError, Result, User};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

// ============================================================================
// Library Snapshot
// ============================================================================

/// Full catalog state as stored on disk.
///
/// Missing top-level lists are read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySnapshot {
    #[serde(rename = "listBooks", default)]
    pub books: Vec<Book>,
    #[serde(rename = "listUsers", default)]
    pub users: Vec<User>,
    #[serde(rename = "listHistoryRecords", default)]
    pub history: Vec<HistoryRecord>,
}

impl LibrarySnapshot {
    pub fn is_empty(&self) -> bool {
        self.books.is_empty() && self.users.is_empty() && self.history.is_empty()
    }
}

// ============================================================================
// Load outcome
// ============================================================================

/// Why a load fell back to an empty catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadWarning {
    #[error("could not read '{}': {message}", .path.display())]
    Unreadable { path: PathBuf, message: String },

    #[error("'{}' is empty", .path.display())]
    Empty { path: PathBuf },

    #[error("'{}' is not a valid library file: {message}", .path.display())]
    Malformed { path: PathBuf, message: String },
}

/// Result of [`LibraryStore::load`]. Loading never fails; problems with an
/// existing file are reported through `warning` alongside an empty snapshot.
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub snapshot: LibrarySnapshot,
    pub warning: Option<LoadWarning>,
}

impl LoadOutcome {
    fn loaded(snapshot: LibrarySnapshot) -> Self {
        Self { snapshot, warning: None }
    }

    fn degraded(warning: LoadWarning) -> Self {
        warn!("starting with an empty catalog: {}", warning);
        Self {
            snapshot: LibrarySnapshot::default(),
            warning: Some(warning),
        }
    }
}

// ============================================================================
// Library Store
// ============================================================================

/// Reads and writes a [`LibrarySnapshot`] as one pretty-printed JSON document.
pub struct LibraryStore {
    path: PathBuf,
}

impl LibraryStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Overwrite the file with `snapshot`.
    ///
    /// The document is written to a temporary file in the same directory and
    /// renamed over the target, so a failed save leaves the previous file intact.
    pub fn save(&self, snapshot: &LibrarySnapshot) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| self.error("create directory for", e))?;

        let mut temp = NamedTempFile::new_in(dir).map_err(|e| self.error("create temp file for", e))?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, snapshot)
                .map_err(|e| self.error("serialize", e))?;
            writer.write_all(b"\n").map_err(|e| self.error("write", e))?;
            writer.flush().map_err(|e| self.error("flush", e))?;
        }
        temp.as_file().sync_all().map_err(|e| self.error("sync", e))?;
        temp.persist(&self.path).map_err(|e| self.error("replace", e.error))?;

        info!(
            "saved library to '{}': books={} users={} history={}",
            self.path.display(),
            snapshot.books.len(),
            snapshot.users.len(),
            snapshot.history.len()
        );
        Ok(())
    }

    /// Read the file back.
    ///
    /// A missing file is a fresh catalog. An unreadable, empty or malformed
    /// file also yields an empty catalog, together with a warning. A bare JSON
    /// array of books (the older single-list layout) loads as books only.
    pub fn load(&self) -> LoadOutcome {
        if !self.path.exists() {
            info!("no library file at '{}', starting fresh", self.path.display());
            return LoadOutcome::loaded(LibrarySnapshot::default());
        }

        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                return LoadOutcome::degraded(LoadWarning::Unreadable {
                    path: self.path.clone(),
                    message: e.to_string(),
                });
            }
        };

        if contents.trim().is_empty() {
            return LoadOutcome::degraded(LoadWarning::Empty {
                path: self.path.clone(),
            });
        }

        match parse_snapshot(&contents) {
            Ok(snapshot) => {
                info!(
                    "loaded library from '{}': books={} users={} history={}",
                    self.path.display(),
                    snapshot.books.len(),
                    snapshot.users.len(),
                    snapshot.history.len()
                );
                LoadOutcome::loaded(snapshot)
            }
            Err(e) => LoadOutcome::degraded(LoadWarning::Malformed {
                path: self.path.clone(),
                message: e.to_string(),
            }),
        }
    }

    /// Where [`LibraryStore::backup`] moves the file: the same path with `.bak` appended.
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".bak");
        PathBuf::from(name)
    }

    /// Rename the current file to [`LibraryStore::backup_path`], replacing any
    /// earlier backup.
    pub fn backup(&self) -> Result<PathBuf> {
        let backup = self.backup_path();
        fs::rename(&self.path, &backup).map_err(|e| self.error("back up", e))?;
        warn!("moved '{}' to '{}'", self.path.display(), backup.display());
        Ok(backup)
    }

    fn error(&self, action: &str, err: impl std::fmt::Display) -> LibraryError {
        LibraryError::Persistence(format!("Failed to {} '{}': {}", action, self.path.display(), err))
    }
}

fn parse_snapshot(contents: &str) -> serde_json::Result<LibrarySnapshot> {
    let value: serde_json::Value = serde_json::from_str(contents)?;
    if value.is_array() {
        let books: Vec<Book> = serde_json::from_value(value)?;
        info!("read legacy book list ({} books)", books.len());
        return Ok(LibrarySnapshot {
            books,
            ..LibrarySnapshot::default()
        });
    }
    serde_json::from_value(value)
}
