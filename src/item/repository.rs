//! Item repository for depot.
//!
//! Bridges `items` rows and their physical objects. Physical state is
//! written first and metadata committed after it; every multi-step
//! operation stops at the first error.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::locks::{ItemLocks, LockKey};
use super::path::{child_path, descendant_like_pattern, rebase_path, sibling_path};
use super::storage::ItemStorage;
use super::types::{DriftEntry, DriftKind, Item, ItemKind, ItemRow};
use super::validate_name;
use crate::db::Database;
use crate::{DepotError, Result};

const ITEM_COLUMNS: &str = "id, name, is_directory, file_path, parent_id, created_at, updated_at";

/// Operations over the item tree.
///
/// [`ItemRepository`] is the real implementation; the trait exists so the
/// service layer can be exercised against other stores.
pub trait ItemStore: Send + Sync {
    /// Items whose parent is `parent_id` (root items for `None`).
    fn list_children(&self, parent_id: Option<i64>)
        -> impl Future<Output = Result<Vec<Item>>> + Send;

    /// Look up a single item.
    fn get(&self, id: i64) -> impl Future<Output = Result<Option<Item>>> + Send;

    /// Stored (root-relative) path of an item.
    fn resolve_path(&self, id: i64) -> impl Future<Output = Result<String>> + Send;

    /// Whether a sibling named `name` exists under `parent_id`.
    fn name_exists(
        &self,
        name: &str,
        parent_id: Option<i64>,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Create a directory and its record.
    fn create_folder(
        &self,
        name: &str,
        parent_id: Option<i64>,
    ) -> impl Future<Output = Result<Item>> + Send;

    /// Store a new file and its record.
    fn save_file(
        &self,
        content: &[u8],
        name: &str,
        parent_id: Option<i64>,
    ) -> impl Future<Output = Result<Item>> + Send;

    /// Rename an item in place, cascading paths below a directory.
    fn rename(&self, id: i64, new_name: &str) -> impl Future<Output = Result<Item>> + Send;

    /// Delete an item. Non-empty directories need `recursive`.
    fn delete_item(&self, id: i64, recursive: bool) -> impl Future<Output = Result<()>> + Send;

    /// Content and name of a file.
    fn download_file(&self, id: i64) -> impl Future<Output = Result<(Vec<u8>, String)>> + Send;

    /// Records whose physical object is missing or of the wrong kind.
    fn verify(&self) -> impl Future<Output = Result<Vec<DriftEntry>>> + Send;
}

/// SQLite + filesystem item store.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    db: Database,
    storage: ItemStorage,
    locks: Arc<ItemLocks>,
}

impl ItemRepository {
    /// Create a new ItemRepository over the given database and storage root.
    pub fn new(db: Database, storage: ItemStorage) -> Self {
        Self {
            db,
            storage,
            locks: Arc::new(ItemLocks::new()),
        }
    }

    /// Path new children of `parent_id` are created under.
    async fn parent_dir_path(&self, parent_id: Option<i64>) -> Result<Option<String>> {
        let Some(parent_id) = parent_id else {
            return Ok(None);
        };
        let parent = self
            .get(parent_id)
            .await?
            .ok_or_else(|| DepotError::NotFound(format!("parent folder {parent_id}")))?;
        parent.require_directory()?;
        Ok(Some(parent.file_path))
    }

    async fn insert(
        &self,
        name: &str,
        kind: ItemKind,
        file_path: &str,
        parent_id: Option<i64>,
    ) -> Result<Item> {
        let sql = format!(
            "INSERT INTO items (name, is_directory, file_path, parent_id)
             VALUES (?, ?, ?, ?) RETURNING {ITEM_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(name)
            .bind(kind.is_directory())
            .bind(file_path)
            .bind(parent_id)
            .fetch_one(self.db.pool())
            .await
            .map_err(|e| DepotError::from_write(e, name))?;
        Ok(row.into())
    }

    /// Create the physical object with `make`, then insert its record.
    ///
    /// The physical object is discarded again if the insert fails.
    async fn create_with<F>(
        &self,
        name: &str,
        kind: ItemKind,
        parent_id: Option<i64>,
        make: F,
    ) -> Result<Item>
    where
        F: FnOnce(&ItemStorage, &str) -> Result<()>,
    {
        validate_name(name)?;
        let _tree = self.locks.tree_shared().await;
        let _guard = self.locks.acquire(LockKey::parent(parent_id)).await;

        let parent_path = self.parent_dir_path(parent_id).await?;
        let path = child_path(parent_path.as_deref(), name);

        make(&self.storage, &path)?;

        match self.insert(name, kind, &path, parent_id).await {
            Ok(item) => {
                info!(id = item.id, path = %item.file_path, "Created {}", kind.as_str());
                Ok(item)
            }
            Err(e) => {
                self.storage.discard(&path, kind);
                Err(e)
            }
        }
    }

    async fn touch(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE items SET updated_at = datetime('now') WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    async fn require(&self, id: i64) -> Result<Item> {
        self.get(id)
            .await?
            .ok_or_else(|| DepotError::NotFound(format!("item {id}")))
    }

    /// Fail with `NotFound` if the record has no matching physical object.
    fn check_physical(&self, item: &Item) -> Result<()> {
        match self.storage.kind_of(&item.file_path) {
            Some(kind) if kind == item.kind => Ok(()),
            found => {
                warn!(
                    id = item.id,
                    path = %item.file_path,
                    found = ?found,
                    "Record does not match filesystem"
                );
                Err(DepotError::NotFound(format!(
                    "{} at {}",
                    item.kind.as_str(),
                    item.file_path
                )))
            }
        }
    }

    async fn rename_item(&self, item: Item, new_name: &str) -> Result<()> {
        let old_path = item.file_path.as_str();
        let new_path = sibling_path(old_path, new_name);

        if self.storage.exists(&new_path) {
            return Err(DepotError::Conflict(format!("path {new_path} already exists")));
        }

        let mut tx = self.db.begin().await?;

        if item.is_directory() {
            let rows: Vec<(i64, String)> = sqlx::query_as(
                "SELECT id, file_path FROM items WHERE file_path LIKE ? ESCAPE '\\' ORDER BY file_path",
            )
            .bind(descendant_like_pattern(old_path))
            .fetch_all(&mut *tx)
            .await?;

            let mut moved = 0usize;
            for (child_id, child_path) in rows {
                // LIKE is case-insensitive and ignores component boundaries
                let Some(updated) = rebase_path(&child_path, old_path, &new_path) else {
                    continue;
                };
                sqlx::query("UPDATE items SET file_path = ? WHERE id = ?")
                    .bind(&updated)
                    .bind(child_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| DepotError::from_path_write(e, &updated))?;
                moved += 1;
            }
            debug!(id = item.id, descendants = moved, "Cascaded descendant paths");
        }

        let result = sqlx::query(
            "UPDATE items SET name = ?, file_path = ?, updated_at = datetime('now')
             WHERE id = ? AND file_path = ?",
        )
        .bind(new_name)
        .bind(&new_path)
        .bind(item.id)
        .bind(old_path)
        .execute(&mut *tx)
        .await
        .map_err(|e| DepotError::from_write(e, new_name))?;

        if result.rows_affected() == 0 {
            return Err(DepotError::Conflict(format!(
                "item {} was moved concurrently",
                item.id
            )));
        }

        // Dropping the transaction on error rolls every row change back
        self.storage.rename(old_path, &new_path)?;

        if let Err(e) = tx.commit().await {
            if let Err(undo) = self.storage.rename(&new_path, old_path) {
                tracing::error!(
                    id = item.id,
                    from = %new_path,
                    to = %old_path,
                    error = %undo,
                    "Failed to undo physical rename after commit failure"
                );
            }
            return Err(e.into());
        }

        info!(id = item.id, from = %old_path, to = %new_path, "Renamed {}", item.kind.as_str());
        Ok(())
    }

    async fn delete_directory(&self, item: &Item, recursive: bool) -> Result<()> {
        let children: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE parent_id = ?")
            .bind(item.id)
            .fetch_one(self.db.pool())
            .await?;

        if children > 0 && !recursive {
            return Err(DepotError::NotEmpty(format!(
                "{} has {children} item(s)",
                item.file_path
            )));
        }

        let mut tx = self.db.begin().await?;

        // Descendant rows go with it through ON DELETE CASCADE
        sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(item.id)
            .execute(&mut *tx)
            .await?;

        if !self.storage.remove_dir_all(&item.file_path)? {
            warn!(id = item.id, path = %item.file_path, "Directory was already missing on disk");
        }

        tx.commit().await?;
        info!(id = item.id, path = %item.file_path, recursive, "Deleted directory");
        Ok(())
    }

    async fn delete_file(&self, item: &Item) -> Result<()> {
        if !self.storage.remove_file(&item.file_path)? {
            warn!(id = item.id, path = %item.file_path, "File was already missing on disk");
        }

        sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(item.id)
            .execute(self.db.pool())
            .await?;

        info!(id = item.id, path = %item.file_path, "Deleted file");
        Ok(())
    }
}

impl ItemStore for ItemRepository {
    async fn list_children(&self, parent_id: Option<i64>) -> Result<Vec<Item>> {
        if let Some(id) = parent_id {
            self.require(id).await?;
        }

        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE parent_id IS ?
             ORDER BY is_directory DESC, name, id"
        );
        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(parent_id)
            .fetch_all(self.db.pool())
            .await?;

        debug!(parent_id = ?parent_id, count = rows.len(), "Listed children");
        Ok(rows.into_iter().map(Item::from).collect())
    }

    async fn get(&self, id: i64) -> Result<Option<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?");
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.map(Item::from))
    }

    async fn resolve_path(&self, id: i64) -> Result<String> {
        Ok(self.require(id).await?.file_path)
    }

    async fn name_exists(&self, name: &str, parent_id: Option<i64>) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM items WHERE name = ? AND parent_id IS ?)",
        )
        .bind(name)
        .bind(parent_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(exists)
    }

    async fn create_folder(&self, name: &str, parent_id: Option<i64>) -> Result<Item> {
        self.create_with(name, ItemKind::Directory, parent_id, |storage, path| {
            storage.create_dir(path)
        })
        .await
    }

    async fn save_file(&self, content: &[u8], name: &str, parent_id: Option<i64>) -> Result<Item> {
        self.create_with(name, ItemKind::File, parent_id, |storage, path| {
            storage.write_new(path, content)
        })
        .await
    }

    async fn rename(&self, id: i64, new_name: &str) -> Result<Item> {
        validate_name(new_name)?;
        let kind = self.require(id).await?.kind;
        let _tree = self.locks.tree_for(kind).await;
        let _guard = self.locks.acquire(LockKey::Item(id)).await;

        let item = self.require(id).await?;
        self.check_physical(&item)?;

        if item.name == new_name {
            self.touch(id).await?;
        } else {
            self.rename_item(item, new_name).await?;
        }

        self.require(id).await
    }

    async fn delete_item(&self, id: i64, recursive: bool) -> Result<()> {
        let kind = self.require(id).await?.kind;
        let _tree = self.locks.tree_for(kind).await;
        let _guard = self.locks.acquire(LockKey::Item(id)).await;
        let item = self.require(id).await?;

        match item.kind {
            ItemKind::File => self.delete_file(&item).await,
            ItemKind::Directory => self.delete_directory(&item, recursive).await,
        }
    }

    async fn download_file(&self, id: i64) -> Result<(Vec<u8>, String)> {
        let item = self
            .get(id)
            .await?
            .ok_or_else(|| DepotError::NotFound(format!("file {id}")))?;
        item.require_file()?;

        let content = self.storage.read(&item.file_path)?;
        Ok((content, item.name))
    }

    async fn verify(&self) -> Result<Vec<DriftEntry>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY file_path");
        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .fetch_all(self.db.pool())
            .await?;

        let mut drift = Vec::new();
        for item in rows.into_iter().map(Item::from) {
            let kind = match self.storage.kind_of(&item.file_path) {
                None => DriftKind::Missing,
                Some(found) if found != item.kind => DriftKind::KindMismatch,
                Some(_) => continue,
            };
            warn!(id = item.id, path = %item.file_path, drift = kind.as_str(), "Drift detected");
            drift.push(DriftEntry { item, kind });
        }
        Ok(drift)
    }
}
