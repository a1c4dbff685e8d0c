//! Item types for depot.


use crate::{DepotError, Result};

/// Kind of an item. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// A regular file with content.
    File,
    /// A directory that may contain other items.
    Directory,
}

impl ItemKind {
    /// Convert the stored flag into a kind.
    pub fn from_is_directory(is_directory: bool) -> Self {
        if is_directory {
            ItemKind::Directory
        } else {
            ItemKind::File
        }
    }

    /// Whether this is a directory.
    pub fn is_directory(&self) -> bool {
        matches!(self, ItemKind::Directory)
    }

    /// Lowercase name used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::File => "file",
            ItemKind::Directory => "directory",
        }
    }
}

/// Raw `items` row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct ItemRow {
    pub id: i64,
    pub name: String,
    pub is_directory: bool,
    pub file_path: String,
    pub parent_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

/// A file or directory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Unique item ID, assigned by the store.
    pub id: i64,
    /// Display name, unique among siblings.
    pub name: String,
    /// File or directory.
    pub kind: ItemKind,
    /// Location relative to the storage root.
    pub file_path: String,
    /// Parent directory ID (None for root items).
    pub parent_id: Option<i64>,
    /// When the item was created (SQLite `datetime('now')` format, UTC).
    pub created_at: String,
    /// When the item was last renamed.
    pub updated_at: String,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            kind: ItemKind::from_is_directory(row.is_directory),
            file_path: row.file_path,
            parent_id: row.parent_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl Item {
    /// Whether this item is a directory.
    pub fn is_directory(&self) -> bool {
        self.kind.is_directory()
    }

    /// Ensure this item is a file.
    ///
    /// Operations that only make sense for content (download) go through
    /// here, so a directory is rejected in one place.
    pub fn require_file(&self) -> Result<&Self> {
        match self.kind {
            ItemKind::File => Ok(self),
            ItemKind::Directory => Err(DepotError::NotFound(format!("file {}", self.id))),
        }
    }

    /// Ensure this item is a directory (e.g. before using it as a parent).
    pub fn require_directory(&self) -> Result<&Self> {
        match self.kind {
            ItemKind::Directory => Ok(self),
            ItemKind::File => Err(DepotError::InvalidInput(format!(
                "item {} is a file, not a directory",
                self.id
            ))),
        }
    }
}

/// How a record disagrees with the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftKind {
    /// Nothing exists at the recorded path.
    Missing,
    /// Something exists, but it is a file where a directory was recorded or vice versa.
    KindMismatch,
}

impl DriftKind {
    /// Snake-case label used in responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            DriftKind::Missing => "missing",
            DriftKind::KindMismatch => "kind_mismatch",
        }
    }
}

/// A record whose physical object does not match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftEntry {
    /// The drifted item.
    pub item: Item,
    /// What is wrong with it.
    pub kind: DriftKind,
}
