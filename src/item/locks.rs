//! Per-item mutual exclusion.
//!
//! Mutating operations hold the lock of the item they touch (or of the
//! parent they create into) for their whole duration, so two renames of
//! the same item, or a rename racing a delete, are serialized.
//!
//! Operations that move or remove a whole subtree additionally take the
//! tree lock exclusively; everything else takes it shared. The tree lock
//! is always acquired before any item lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::{
    Mutex as AsyncMutex, OwnedMutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use super::types::ItemKind;

/// Held tree lock, either mode.
#[derive(Debug)]
pub enum TreeGuard<'a> {
    Shared(#[allow(dead_code)] RwLockReadGuard<'a, ()>),
    Exclusive(#[allow(dead_code)] RwLockWriteGuard<'a, ()>),
}

/// What a lock protects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockKey {
    /// The root scope (items without a parent).
    Root,
    /// A single item by ID.
    Item(i64),
}

impl LockKey {
    /// Key for the scope a new child of `parent_id` is created in.
    pub fn parent(parent_id: Option<i64>) -> Self {
        parent_id.map_or(LockKey::Root, LockKey::Item)
    }
}

/// Registry of async locks keyed by [`LockKey`].
///
/// Entries are held weakly; a lock disappears once no guard or waiter
/// refers to it.
#[derive(Debug, Default)]
pub struct ItemLocks {
    tree: RwLock<()>,
    locks: Mutex<HashMap<LockKey, Weak<AsyncMutex<()>>>>,
}

impl ItemLocks {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared access to the tree.
    pub async fn tree_shared(&self) -> RwLockReadGuard<'_, ()> {
        self.tree.read().await
    }

    /// Exclusive access to the tree.
    pub async fn tree_exclusive(&self) -> RwLockWriteGuard<'_, ()> {
        self.tree.write().await
    }

    /// Tree access for an operation on an item of `kind`.
    ///
    /// Directories affect whole subtrees and get exclusive access.
    pub async fn tree_for(&self, kind: ItemKind) -> TreeGuard<'_> {
        match kind {
            ItemKind::Directory => TreeGuard::Exclusive(self.tree_exclusive().await),
            ItemKind::File => TreeGuard::Shared(self.tree_shared().await),
        }
    }

    /// Wait for exclusive access to `key`.
    ///
    /// The returned guard releases the lock when dropped.
    pub async fn acquire(&self, key: LockKey) -> OwnedMutexGuard<()> {
        let lock = self.lock_for(key);
        lock.lock_owned().await
    }

    fn lock_for(&self, key: LockKey) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(existing) = locks.get(&key).and_then(Weak::upgrade) {
            return existing;
        }

        locks.retain(|_, weak| weak.strong_count() > 0);
        let lock = Arc::new(AsyncMutex::new(()));
        locks.insert(key, Arc::downgrade(&lock));
        lock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parent_key() {
        assert_eq!(LockKey::parent(None), LockKey::Root);
        assert_eq!(LockKey::parent(Some(4)), LockKey::Item(4));
    }

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = Arc::new(ItemLocks::new());
        let guard = locks.acquire(LockKey::Item(1)).await;

        let locks2 = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = locks2.acquire(LockKey::Item(1)).await;
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = ItemLocks::new();
        let _a = locks.acquire(LockKey::Item(1)).await;

        let b = tokio::time::timeout(Duration::from_secs(1), locks.acquire(LockKey::Item(2))).await;
        assert!(b.is_ok());

        let root =
            tokio::time::timeout(Duration::from_secs(1), locks.acquire(LockKey::Root)).await;
        assert!(root.is_ok());
    }

    #[tokio::test]
    async fn test_tree_exclusive_waits_for_shared() {
        let locks = Arc::new(ItemLocks::new());
        let shared = locks.tree_shared().await;
        let second = tokio::time::timeout(Duration::from_secs(1), locks.tree_shared())
            .await
            .unwrap();

        let locks2 = locks.clone();
        let writer = tokio::spawn(async move {
            let _w = locks2.tree_exclusive().await;
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!writer.is_finished());

        drop(shared);
        drop(second);
        tokio::time::timeout(Duration::from_secs(1), writer)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_tree_for_kind() {
        let locks = ItemLocks::new();
        assert!(matches!(
            locks.tree_for(ItemKind::File).await,
            TreeGuard::Shared(_)
        ));
        assert!(matches!(
            locks.tree_for(ItemKind::Directory).await,
            TreeGuard::Exclusive(_)
        ));
    }

    fn live(locks: &ItemLocks) -> usize {
        let map = locks.locks.lock().unwrap();
        map.values().filter(|w| w.strong_count() > 0).count()
    }

    #[tokio::test]
    async fn test_released_locks_are_dropped() {
        let locks = ItemLocks::new();
        {
            let _g = locks.acquire(LockKey::Item(9)).await;
            assert_eq!(live(&locks), 1);
        }
        assert_eq!(live(&locks), 0);
    }
}
