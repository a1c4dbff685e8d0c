//! API handlers for Web UI.

pub mod item;

pub use item::*;

use crate::item::{ItemRepository, ItemService};

/// Shared application state.
pub struct AppState {
    /// File manager service.
    pub service: ItemService<ItemRepository>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(service: ItemService<ItemRepository>) -> Self {
        Self { service }
    }
}
