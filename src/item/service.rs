//! Item service for depot.
//!
//! Sits between the HTTP handlers and an [`ItemStore`]. It enforces
//! sibling-name uniqueness before the store is asked to do anything and
//! never touches the database or filesystem itself.

use tracing::debug;

use super::repository::ItemStore;
use super::types::{DriftEntry, Item};
use super::validate_name;
use crate::{DepotError, Result};

/// Parse a parent ID received from a client.
///
/// A missing or empty value means the root.
pub fn parse_parent_id(raw: Option<&str>) -> Result<Option<i64>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_item_id(s).map(Some),
    }
}

/// Parse an item ID received from a client.
pub fn parse_item_id(raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| DepotError::InvalidInput(format!("invalid item id: {raw:?}")))
}

/// File manager service.
#[derive(Debug)]
pub struct ItemService<S> {
    store: S,
    max_upload_size: usize,
}

impl<S: ItemStore> ItemService<S> {
    /// Create a new service. Uploads larger than `max_upload_size` bytes are rejected.
    pub fn new(store: S, max_upload_size: usize) -> Self {
        Self {
            store,
            max_upload_size,
        }
    }

    /// Get the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Maximum upload size in bytes.
    pub fn max_upload_size(&self) -> usize {
        self.max_upload_size
    }

    async fn ensure_unique(&self, name: &str, parent_id: Option<i64>) -> Result<()> {
        if self.store.name_exists(name, parent_id).await? {
            debug!(name, parent_id = ?parent_id, "Rejected duplicate name");
            return Err(DepotError::Conflict(format!(
                "an item named {name} already exists"
            )));
        }
        Ok(())
    }

    /// List the children of a folder (the root for `None`).
    pub async fn list(&self, parent_id: Option<i64>) -> Result<Vec<Item>> {
        self.store.list_children(parent_id).await
    }

    /// Get a single item.
    pub async fn get(&self, id: i64) -> Result<Item> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| DepotError::NotFound(format!("item {id}")))
    }

    /// Create a folder.
    pub async fn create_folder(&self, name: &str, parent_id: Option<i64>) -> Result<Item> {
        validate_name(name)?;
        self.ensure_unique(name, parent_id).await?;
        self.store.create_folder(name, parent_id).await
    }

    /// Store an uploaded file.
    pub async fn upload(&self, content: &[u8], name: &str, parent_id: Option<i64>) -> Result<Item> {
        validate_name(name)?;
        if content.len() > self.max_upload_size {
            return Err(DepotError::InvalidInput(format!(
                "file is {} bytes, the limit is {}",
                content.len(),
                self.max_upload_size
            )));
        }
        self.ensure_unique(name, parent_id).await?;
        self.store.save_file(content, name, parent_id).await
    }

    /// Rename an item within its current folder.
    pub async fn rename(&self, id: i64, new_name: &str) -> Result<Item> {
        validate_name(new_name)?;
        let item = self.get(id).await?;

        if item.name != new_name {
            self.ensure_unique(new_name, item.parent_id).await?;
        }
        self.store.rename(id, new_name).await
    }

    /// Content and name of a file.
    pub async fn download(&self, id: i64) -> Result<(Vec<u8>, String)> {
        self.store.download_file(id).await
    }

    /// Delete an item.
    pub async fn delete(&self, id: i64, recursive: bool) -> Result<()> {
        self.store.delete_item(id, recursive).await
    }

    /// Report records that disagree with the filesystem.
    pub async fn verify(&self) -> Result<Vec<DriftEntry>> {
        self.store.verify().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemKind;
    use std::sync::Mutex;

    /// Store that records which mutating calls reach it.
    #[derive(Default)]
    struct RecordingStore {
        items: Mutex<Vec<Item>>,
        calls: Mutex<Vec<String>>,
    }

    impl RecordingStore {
        fn with_items(items: Vec<Item>) -> Self {
            Self {
                items: Mutex::new(items),
                calls: Mutex::default(),
            }
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn next_item(&self, name: &str, kind: ItemKind, parent_id: Option<i64>) -> Item {
            let mut items = self.items.lock().unwrap();
            let item = Item {
                id: items.len() as i64 + 1,
                name: name.to_string(),
                kind,
                file_path: name.to_string(),
                parent_id,
                created_at: "2024-01-15 10:30:00".to_string(),
                updated_at: "2024-01-15 10:30:00".to_string(),
            };
            items.push(item.clone());
            item
        }
    }

    impl ItemStore for RecordingStore {
        async fn list_children(&self, parent_id: Option<i64>) -> Result<Vec<Item>> {
            let items = self.items.lock().unwrap();
            Ok(items
                .iter()
                .filter(|i| i.parent_id == parent_id)
                .cloned()
                .collect())
        }

        async fn get(&self, id: i64) -> Result<Option<Item>> {
            let items = self.items.lock().unwrap();
            Ok(items.iter().find(|i| i.id == id).cloned())
        }

        async fn resolve_path(&self, id: i64) -> Result<String> {
            self.get(id)
                .await?
                .map(|i| i.file_path)
                .ok_or_else(|| DepotError::NotFound(format!("item {id}")))
        }

        async fn name_exists(&self, name: &str, parent_id: Option<i64>) -> Result<bool> {
            let items = self.items.lock().unwrap();
            Ok(items
                .iter()
                .any(|i| i.name == name && i.parent_id == parent_id))
        }

        async fn create_folder(&self, name: &str, parent_id: Option<i64>) -> Result<Item> {
            self.record(format!("create_folder {name}"));
            Ok(self.next_item(name, ItemKind::Directory, parent_id))
        }

        async fn save_file(
            &self,
            _content: &[u8],
            name: &str,
            parent_id: Option<i64>,
        ) -> Result<Item> {
            self.record(format!("save_file {name}"));
            Ok(self.next_item(name, ItemKind::File, parent_id))
        }

        async fn rename(&self, id: i64, new_name: &str) -> Result<Item> {
            self.record(format!("rename {id} {new_name}"));
            let mut items = self.items.lock().unwrap();
            let item = items
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or_else(|| DepotError::NotFound(format!("item {id}")))?;
            item.name = new_name.to_string();
            Ok(item.clone())
        }

        async fn delete_item(&self, id: i64, recursive: bool) -> Result<()> {
            self.record(format!("delete_item {id} {recursive}"));
            Ok(())
        }

        async fn download_file(&self, id: i64) -> Result<(Vec<u8>, String)> {
            self.record(format!("download_file {id}"));
            Ok((b"data".to_vec(), "a.txt".to_string()))
        }

        async fn verify(&self) -> Result<Vec<DriftEntry>> {
            Ok(Vec::new())
        }
    }

    fn service_with(names: &[(&str, Option<i64>)]) -> ItemService<RecordingStore> {
        let store = RecordingStore::default();
        for (name, parent) in names {
            store.next_item(name, ItemKind::Directory, *parent);
        }
        ItemService::new(store, 16)
    }

    #[test]
    fn test_parse_parent_id() {
        assert_eq!(parse_parent_id(None).unwrap(), None);
        assert_eq!(parse_parent_id(Some("")).unwrap(), None);
        assert_eq!(parse_parent_id(Some("  ")).unwrap(), None);
        assert_eq!(parse_parent_id(Some("12")).unwrap(), Some(12));
        assert!(matches!(
            parse_parent_id(Some("abc")),
            Err(DepotError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_parse_item_id() {
        assert_eq!(parse_item_id("7").unwrap(), 7);
        assert!(matches!(parse_item_id("7x"), Err(DepotError::InvalidInput(_))));
        assert!(matches!(parse_item_id(""), Err(DepotError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_create_folder_calls_store() {
        let service = service_with(&[]);

        let item = service.create_folder("docs", None).await.unwrap();

        assert_eq!(item.name, "docs");
        assert_eq!(service.store().calls(), vec!["create_folder docs"]);
    }

    #[tokio::test]
    async fn test_create_duplicate_never_reaches_store() {
        let service = service_with(&[("docs", None)]);

        let result = service.create_folder("docs", None).await;

        assert!(matches!(result, Err(DepotError::Conflict(_))));
        assert!(service.store().calls().is_empty());
    }

    #[tokio::test]
    async fn test_same_name_in_other_folder_is_allowed() {
        let service = service_with(&[("docs", None)]);

        service.create_folder("docs", Some(1)).await.unwrap();

        assert_eq!(service.store().calls(), vec!["create_folder docs"]);
    }

    #[tokio::test]
    async fn test_upload_duplicate_never_reaches_store() {
        let service = service_with(&[("a.txt", Some(1))]);

        let result = service.upload(b"x", "a.txt", Some(1)).await;

        assert!(matches!(result, Err(DepotError::Conflict(_))));
        assert!(service.store().calls().is_empty());
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_name_and_large_content() {
        let service = service_with(&[]);

        let result = service.upload(b"x", "", None).await;
        assert!(matches!(result, Err(DepotError::InvalidInput(_))));

        let result = service.upload(&[0u8; 17], "big.bin", None).await;
        assert!(matches!(result, Err(DepotError::InvalidInput(_))));

        assert!(service.store().calls().is_empty());
        service.upload(&[0u8; 16], "ok.bin", None).await.unwrap();
    }

    #[tokio::test]
    async fn test_rename_duplicate_checks_item_scope() {
        // 1: docs (root), 2: a (in docs), 3: b (in docs), 4: c (root)
        let service = service_with(&[("docs", None), ("a", Some(1)), ("b", Some(1)), ("c", None)]);

        let result = service.rename(2, "b").await;
        assert!(matches!(result, Err(DepotError::Conflict(_))));
        assert!(service.store().calls().is_empty());

        // "c" only exists at the root
        service.rename(2, "c").await.unwrap();
        assert_eq!(service.store().calls(), vec!["rename 2 c"]);
    }

    #[tokio::test]
    async fn test_rename_to_current_name_skips_check() {
        let service = service_with(&[("docs", None)]);

        service.rename(1, "docs").await.unwrap();

        assert_eq!(service.store().calls(), vec!["rename 1 docs"]);
    }

    #[tokio::test]
    async fn test_rename_unknown_item() {
        let service = service_with(&[]);
        let result = service.rename(9, "x").await;
        assert!(matches!(result, Err(DepotError::NotFound(_))));
        assert!(service.store().calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_and_download_pass_through() {
        let store = RecordingStore::with_items(Vec::new());
        let service = ItemService::new(store, 16);

        service.delete(3, true).await.unwrap();
        let (data, name) = service.download(4).await.unwrap();

        assert_eq!(data, b"data");
        assert_eq!(name, "a.txt");
        assert_eq!(
            service.store().calls(),
            vec!["delete_item 3 true", "download_file 4"]
        );
    }
}
