//! Request DTOs for Web API.

use serde::Deserialize;
use validator::Validate;

use crate::item::parse_parent_id;
use crate::Result;

/// An item ID as sent by clients, either `"12"` or `12`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdParam {
    /// Numeric form.
    Number(i64),
    /// String form; empty means none.
    Text(String),
}

/// Create folder request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFolderRequest {
    /// Folder name.
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,
    /// Parent folder (root if absent or empty).
    #[serde(default)]
    pub parent_id: Option<IdParam>,
}

impl CreateFolderRequest {
    /// Resolve the parent folder ID.
    pub fn parent_id(&self) -> Result<Option<i64>> {
        match &self.parent_id {
            None => Ok(None),
            Some(IdParam::Number(id)) => Ok(Some(*id)),
            Some(IdParam::Text(s)) => parse_parent_id(Some(s)),
        }
    }
}

/// Rename request.
#[derive(Debug, Deserialize, Validate)]
pub struct RenameRequest {
    /// New name.
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,
}

/// Query parameters for item deletion.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    /// Delete a directory together with everything below it.
    #[serde(default)]
    pub recursive: bool,
}
