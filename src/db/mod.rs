//! Database module
//!
//! This module provides:
//! - Database connection pool management
//! - Schema bootstrap
//! - Repository implementations and the user record store seam
//! - Data models

pub mod manager;
pub mod models;
pub mod repository;
pub mod schema;

pub use manager::DatabaseManager;
pub use models::{NewUserRecord, Order, OrderItem, Product, UserRecord};
pub use repository::{OrderRepository, ProductRepository, UserRecordStore, UserRepository};
