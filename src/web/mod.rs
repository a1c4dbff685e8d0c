//! Web API module for depot.
//!
//! This module exposes the item tree over HTTP: folder listing, upload,
//! folder creation, rename, download, delete and a drift report.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::{create_health_router, create_router};
pub use server::WebServer;
