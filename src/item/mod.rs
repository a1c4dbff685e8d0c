//! Hierarchical item management for depot.
//!
//! This module keeps the database record of every file and directory in
//! step with its physical counterpart under the storage root:
//! - Item metadata and the file/directory kind
//! - Physical storage rooted at an injected base directory
//! - Repository operations, including subtree rename with path cascade
//! - Service layer enforcing sibling-name uniqueness

mod locks;
mod path;
mod repository;
mod service;
mod storage;
mod types;

pub use locks::{ItemLocks, LockKey, TreeGuard};
pub use path::{child_path, parent_path, rebase_path};
pub use repository::{ItemRepository, ItemStore};
pub use service::{parse_item_id, parse_parent_id, ItemService};
pub use storage::ItemStorage;
pub use types::{DriftEntry, DriftKind, Item, ItemKind};

use crate::{DepotError, Result};

/// Maximum length for an item name (in characters).
pub const MAX_NAME_LENGTH: usize = 255;

/// Characters that may not appear in an item name.
pub const FORBIDDEN_NAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '<', '>', '|', '"'];

/// Validate an item name.
///
/// A valid name is a single path component: it never contains a separator
/// and is never `.` or `..`, so joined paths stay under the storage root.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(DepotError::InvalidInput("name must not be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(DepotError::InvalidInput(format!(
            "name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    if name == "." || name == ".." {
        return Err(DepotError::InvalidInput(format!("'{name}' is not a valid name")));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_NAME_CHARS.contains(c)) {
        return Err(DepotError::InvalidInput(format!(
            "name must not contain '{c}'"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(DepotError::InvalidInput(
            "name must not contain control characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name_valid() {
        assert!(validate_name("docs").is_ok());
        assert!(validate_name("a.txt").is_ok());
        assert!(validate_name("..hidden").is_ok());
        assert!(validate_name("日本語ファイル.txt").is_ok());
        assert!(validate_name(&"x".repeat(MAX_NAME_LENGTH)).is_ok());
    }

    #[test]
    fn test_validate_name_empty() {
        assert!(matches!(validate_name(""), Err(DepotError::InvalidInput(_))));
        assert!(matches!(validate_name("   "), Err(DepotError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_name_too_long() {
        let name = "x".repeat(MAX_NAME_LENGTH + 1);
        assert!(matches!(validate_name(&name), Err(DepotError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_name_dot_components() {
        assert!(validate_name(".").is_err());
        assert!(validate_name("..").is_err());
    }

    #[test]
    fn test_validate_name_forbidden_chars() {
        for c in FORBIDDEN_NAME_CHARS {
            let name = format!("a{c}b");
            assert!(validate_name(&name).is_err(), "accepted {name:?}");
        }
    }

    #[test]
    fn test_validate_name_control_chars() {
        assert!(validate_name("a\nb").is_err());
        assert!(validate_name("a\x00b").is_err());
    }
}
