pub mod orders;
pub mod products;
pub mod system;

pub use orders::*;
pub use products::*;
pub use system::*;

use crate::auth::{PasswordHasher, TokenService};
use crate::core::config::SecurityConfig;
use crate::core::error::Result;
use crate::db::manager::DatabaseManager;
use crate::db::repository::{OrderRepository, ProductRepository, UserRecordStore, UserRepository};
use std::sync::Arc;

/// Shared application state for handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseManager>,
    pub users: Arc<dyn UserRecordStore>,
    pub product_repo: Arc<ProductRepository>,
    pub order_repo: Arc<OrderRepository>,
    pub passwords: Arc<PasswordHasher>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    /// Wire repositories and the auth services over one database
    pub fn new(db: Arc<DatabaseManager>, security: &SecurityConfig) -> Result<Self> {
        Ok(Self {
            users: Arc::new(UserRepository::new(db.clone())),
            product_repo: Arc::new(ProductRepository::new(db.clone())),
            order_repo: Arc::new(OrderRepository::new(db.clone())),
            passwords: Arc::new(PasswordHasher::new(security)?),
            tokens: Arc::new(TokenService::new(security)),
            db,
        })
    }
}
