//! Response DTOs for Web API.

use serde::Serialize;

use crate::datetime::to_rfc3339;
use crate::item::{DriftEntry, Item};

/// Item in listings. IDs are rendered as strings.
#[derive(Debug, Serialize)]
pub struct ItemResponse {
    /// Item ID.
    pub id: String,
    /// Name.
    pub name: String,
    /// Whether this is a directory.
    pub is_directory: bool,
    /// Path relative to the storage root.
    pub file_path: String,
    /// Parent folder ID (null at the root).
    pub parent_id: Option<String>,
    /// Created at (RFC 3339).
    pub created_at: String,
    /// Updated at (RFC 3339).
    pub updated_at: String,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        Self {
            id: item.id.to_string(),
            is_directory: item.is_directory(),
            name: item.name,
            file_path: item.file_path,
            parent_id: item.parent_id.map(|id| id.to_string()),
            created_at: to_rfc3339(&item.created_at),
            updated_at: to_rfc3339(&item.updated_at),
        }
    }
}

/// Upload response.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// ID of the stored file.
    pub id: String,
}

/// A record that disagrees with the filesystem.
#[derive(Debug, Serialize)]
pub struct DriftResponse {
    /// The drifted item.
    pub item: ItemResponse,
    /// `missing` or `kind_mismatch`.
    pub drift: &'static str,
}

impl From<DriftEntry> for DriftResponse {
    fn from(entry: DriftEntry) -> Self {
        Self {
            drift: entry.kind.as_str(),
            item: entry.item.into(),
        }
    }
}
