//! Physical storage for depot items.
//!
//! Every item path is relative to a single root directory that is handed
//! in once at construction:
//! ```text
//! {root}/
//! ├── docs/
//! │   └── a.txt
//! └── notes.md
//! ```
//! Nothing here ever overwrites an existing object.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::types::ItemKind;
use crate::{DepotError, Result};

/// Filesystem side of the item store.
#[derive(Debug, Clone)]
pub struct ItemStorage {
    root: PathBuf,
}

impl ItemStorage {
    /// Create a new ItemStorage rooted at `root`.
    ///
    /// The root directory will be created if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Get the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a stored relative path.
    pub fn resolve(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Check if anything exists at `rel`.
    pub fn exists(&self, rel: &str) -> bool {
        self.resolve(rel).exists()
    }

    /// Kind of the object at `rel`, or `None` if nothing is there.
    pub fn kind_of(&self, rel: &str) -> Option<ItemKind> {
        fs::metadata(self.resolve(rel))
            .ok()
            .map(|m| ItemKind::from_is_directory(m.is_dir()))
    }

    /// Create a directory, creating missing ancestors first.
    ///
    /// Fails with [`DepotError::Conflict`] if the directory itself already exists.
    pub fn create_dir(&self, rel: &str) -> Result<()> {
        let path = self.resolve(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir(&path).map_err(|e| already_exists_as_conflict(e, rel))
    }

    /// Write a new file.
    ///
    /// Fails with [`DepotError::Conflict`] if anything already exists at `rel`.
    /// A partially written file is removed again.
    pub fn write_new(&self, rel: &str, content: &[u8]) -> Result<()> {
        let path = self.resolve(rel);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| already_exists_as_conflict(e, rel))?;

        if let Err(e) = file.write_all(content).and_then(|_| file.sync_all()) {
            drop(file);
            let _ = fs::remove_file(&path);
            return Err(e.into());
        }
        Ok(())
    }

    /// Read the content of a file.
    pub fn read(&self, rel: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.resolve(rel))?)
    }

    /// Move an object from `from` to `to`.
    ///
    /// Fails with [`DepotError::NotFound`] if the source is missing and with
    /// [`DepotError::Conflict`] if the destination is taken.
    pub fn rename(&self, from: &str, to: &str) -> Result<()> {
        let src = self.resolve(from);
        let dst = self.resolve(to);

        if !src.exists() {
            return Err(DepotError::NotFound(format!("path {from}")));
        }
        if dst.exists() {
            return Err(DepotError::Conflict(format!("path {to} already exists")));
        }
        fs::rename(&src, &dst)?;
        Ok(())
    }

    /// Delete a file.
    ///
    /// Returns `false` if it didn't exist.
    pub fn remove_file(&self, rel: &str) -> Result<bool> {
        match fs::remove_file(self.resolve(rel)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a directory and everything below it.
    ///
    /// Returns `false` if it didn't exist.
    pub fn remove_dir_all(&self, rel: &str) -> Result<bool> {
        match fs::remove_dir_all(self.resolve(rel)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete whatever was created at `rel` by a failed operation.
    pub(crate) fn discard(&self, rel: &str, kind: ItemKind) {
        let result = match kind {
            ItemKind::File => self.remove_file(rel),
            ItemKind::Directory => self.remove_dir_all(rel),
        };
        if let Err(e) = result {
            tracing::error!(path = rel, error = %e, "Failed to discard physical object");
        }
    }
}

fn already_exists_as_conflict(e: io::Error, rel: &str) -> DepotError {
    if e.kind() == io::ErrorKind::AlreadyExists {
        DepotError::Conflict(format!("path {rel} already exists"))
    } else {
        DepotError::Io(e)
    }
}
