//! Shop API Library
//!
//! Account registration, password login and bearer token authentication for
//! a small storefront, plus its product catalog and order endpoints.

pub mod api;
pub mod auth;
pub mod core;
pub mod db;

// Re-export commonly used types
pub use api::{ApiServer, AppState};
pub use crate::core::{Config, ShopError};
pub use db::DatabaseManager;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
