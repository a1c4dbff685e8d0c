//! depot - a hierarchical file manager service.
//!
//! Files and folders are kept as a tree of items: metadata rows in SQLite,
//! content on the filesystem under a single storage root, both exposed over
//! a small HTTP API.

pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod item;
pub mod logging;
pub mod web;

pub use config::Config;
pub use db::Database;
pub use error::{DepotError, Result};
pub use item::{
    DriftEntry, DriftKind, Item, ItemKind, ItemRepository, ItemService, ItemStorage, ItemStore,
};
pub use web::WebServer;
