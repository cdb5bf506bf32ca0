//! Repository pattern implementation for data access layer
//!
//! This module provides the store abstractions the auth core and handlers
//! consume, plus their SQLite implementations.

use crate::core::error::{Result, ShopError};
use crate::db::manager::DatabaseManager;
use crate::db::models::{NewUserRecord, Order, OrderItem, Product, UserRecord};
use async_trait::async_trait;
use rusqlite::{OptionalExtension, Row};
use std::sync::Arc;
use uuid::Uuid;

/// Point lookups and inserts over user records.
///
/// `insert` must reject a duplicate email with `ShopError::Conflict`; the
/// check belongs to the store so concurrent registrations cannot both win.
#[async_trait]
pub trait UserRecordStore: Send + Sync {
    /// Find a user by exact (case-sensitive) email
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    /// Find a user by its identifier
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>>;

    /// Store a new user and return its identifier
    async fn insert(&self, record: NewUserRecord) -> Result<String>;
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

const USER_COLUMNS: &str = "id, email, username, password_hash, is_admin, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        password_hash: row.get(3)?,
        is_admin: row.get::<_, Option<bool>>(4)?.unwrap_or(false),
        created_at: row.get(5)?,
    })
}

/// Repository for User entities
pub struct UserRepository {
    db: Arc<DatabaseManager>,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Count total users
    #[cfg(test)]
    pub async fn count(&self) -> Result<i64> {
        self.db.execute(|conn| {
            conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
                .map_err(ShopError::DatabaseError)
        }).await
    }
}

#[async_trait]
impl UserRecordStore for UserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let email = email.to_string();
        self.db.execute(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS),
                [&email],
                user_from_row,
            ).optional()
            .map_err(ShopError::DatabaseError)
        }).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>> {
        let id = id.to_string();
        self.db.execute(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                [&id],
                user_from_row,
            ).optional()
            .map_err(ShopError::DatabaseError)
        }).await
    }

    async fn insert(&self, record: NewUserRecord) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let user_id = id.clone();
        self.db.execute(move |conn| {
            conn.execute(
                "INSERT INTO users (id, email, username, password_hash, is_admin, created_at) \
                 VALUES (?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    &user_id,
                    &record.email,
                    &record.username,
                    &record.password_hash,
                    record.is_admin,
                    now_rfc3339(),
                ],
            ).map_err(|e| {
                if is_unique_violation(&e) {
                    ShopError::Conflict("Email already registered".to_string())
                } else {
                    ShopError::DatabaseError(e)
                }
            })?;
            Ok(())
        }).await?;
        Ok(id)
    }
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        stock: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
        created_at: row.get(5)?,
    })
}

/// Repository for Product entities
pub struct ProductRepository {
    db: Arc<DatabaseManager>,
}

impl ProductRepository {
    /// Create a new ProductRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Find all products, oldest first
    pub async fn find_all(&self) -> Result<Vec<Product>> {
        self.db.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, description, price, stock, created_at \
                 FROM products ORDER BY created_at ASC"
            ).map_err(ShopError::DatabaseError)?;

            let products = stmt.query_map([], product_from_row)
                .map_err(ShopError::DatabaseError)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(ShopError::DatabaseError)?;

            Ok(products)
        }).await
    }

    /// Find a product by its identifier
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Product>> {
        let id = id.to_string();
        self.db.execute(move |conn| {
            conn.query_row(
                "SELECT id, name, description, price, stock, created_at FROM products WHERE id = ?",
                [&id],
                product_from_row,
            ).optional()
            .map_err(ShopError::DatabaseError)
        }).await
    }

    /// Create a new product
    pub async fn create(&self, product: &Product) -> Result<()> {
        let product = product.clone();
        self.db.execute(move |conn| {
            conn.execute(
                "INSERT INTO products (id, name, description, price, stock, created_at) \
                 VALUES (?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    &product.id,
                    &product.name,
                    &product.description,
                    product.price,
                    product.stock,
                    &product.created_at,
                ],
            ).map_err(ShopError::DatabaseError)?;
            Ok(())
        }).await
    }
}

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<Order> {
    let items_json: String = row.get(2)?;
    let items: Vec<OrderItem> = serde_json::from_str(&items_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Order {
        id: row.get(0)?,
        user_id: row.get(1)?,
        items,
        total: row.get(3)?,
        status: row
            .get::<_, Option<String>>(4)?
            .unwrap_or_else(|| Order::STATUS_PENDING.to_string()),
        created_at: row.get(5)?,
    })
}

/// Repository for Order entities
pub struct OrderRepository {
    db: Arc<DatabaseManager>,
}

impl OrderRepository {
    /// Create a new OrderRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Find all orders placed by a user, newest first
    pub async fn find_by_user(&self, user_id: &str) -> Result<Vec<Order>> {
        let user_id = user_id.to_string();
        self.db.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, items, total, status, created_at \
                 FROM orders WHERE user_id = ? ORDER BY created_at DESC"
            ).map_err(ShopError::DatabaseError)?;

            let orders = stmt.query_map([&user_id], order_from_row)
                .map_err(ShopError::DatabaseError)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(ShopError::DatabaseError)?;

            Ok(orders)
        }).await
    }

    /// Find one order, but only if it belongs to `user_id`
    pub async fn find_for_user(&self, id: &str, user_id: &str) -> Result<Option<Order>> {
        let id = id.to_string();
        let user_id = user_id.to_string();
        self.db.execute(move |conn| {
            conn.query_row(
                "SELECT id, user_id, items, total, status, created_at \
                 FROM orders WHERE id = ? AND user_id = ?",
                [&id, &user_id],
                order_from_row,
            ).optional()
            .map_err(ShopError::DatabaseError)
        }).await
    }

    /// Create a new order
    pub async fn create(&self, order: &Order) -> Result<()> {
        let order = order.clone();
        let items_json = serde_json::to_string(&order.items)
            .map_err(|e| ShopError::InternalError(format!("Failed to encode order items: {}", e)))?;

        self.db.execute(move |conn| {
            conn.execute(
                "INSERT INTO orders (id, user_id, items, total, status, created_at) \
                 VALUES (?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    &order.id,
                    &order.user_id,
                    &items_json,
                    order.total,
                    &order.status,
                    &order.created_at,
                ],
            ).map_err(ShopError::DatabaseError)?;
            Ok(())
        }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, is_admin: bool) -> NewUserRecord {
        NewUserRecord {
            email: email.to_string(),
            username: "someone".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            is_admin,
        }
    }

    fn setup() -> Arc<DatabaseManager> {
        Arc::new(DatabaseManager::new_in_memory().unwrap())
    }

    #[tokio::test]
    async fn test_user_insert_and_lookup() {
        let repo = UserRepository::new(setup());

        let id = repo.insert(new_user("a@x.com", false)).await.unwrap();

        let by_id = repo.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@x.com");
        assert!(!by_id.is_admin);

        let by_email = repo.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, id);

        assert!(repo.find_by_email("A@x.com").await.unwrap().is_none());
        assert!(repo.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let repo = UserRepository::new(setup());

        repo.insert(new_user("a@x.com", false)).await.unwrap();
        let err = repo.insert(new_user("a@x.com", true)).await.unwrap_err();

        assert!(matches!(err, ShopError::Conflict(_)));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_null_admin_flag_decodes_as_false() {
        let db = setup();
        db.execute(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, username, password_hash, is_admin, created_at) \
                 VALUES ('legacy', 'old@x.com', 'old', 'h', NULL, 'now')",
                [],
            ).map_err(ShopError::DatabaseError)?;
            Ok(())
        }).await.unwrap();

        let repo = UserRepository::new(db);
        let user = repo.find_by_id("legacy").await.unwrap().unwrap();
        assert!(!user.is_admin);
    }

    #[tokio::test]
    async fn test_product_create_and_find() {
        let repo = ProductRepository::new(setup());
        let product = Product {
            id: "p1".to_string(),
            name: "Mug".to_string(),
            description: None,
            price: 4.5,
            stock: 10,
            created_at: now_rfc3339(),
        };

        repo.create(&product).await.unwrap();

        let found = repo.find_by_id("p1").await.unwrap().unwrap();
        assert_eq!(found.name, "Mug");
        assert_eq!(found.stock, 10);
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
        assert!(repo.find_by_id("p2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_orders_are_scoped_to_owner() {
        let repo = OrderRepository::new(setup());
        let items = vec![OrderItem {
            product_id: "p1".to_string(),
            name: "Mug".to_string(),
            quantity: 2,
            price: 4.5,
        }];
        let order = Order {
            id: "o1".to_string(),
            user_id: "alice".to_string(),
            total: Order::compute_total(&items),
            items,
            status: Order::STATUS_PENDING.to_string(),
            created_at: now_rfc3339(),
        };

        repo.create(&order).await.unwrap();

        let mine = repo.find_by_user("alice").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].items, order.items);
        assert_eq!(mine[0].total, 9.0);

        assert!(repo.find_by_user("bob").await.unwrap().is_empty());
        assert!(repo.find_for_user("o1", "bob").await.unwrap().is_none());
        assert!(repo.find_for_user("o1", "alice").await.unwrap().is_some());
    }
}
