//! Database schema
//!
//! Tables are created idempotently on startup. There is no versioned
//! migration history.

use crate::core::error::{Result, ShopError};
use rusqlite::Connection;
use tracing::info;

const SCHEMA: &str = r#"
-- Users table (authentication)
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL,
    username TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    is_admin INTEGER DEFAULT 0,
    created_at TEXT NOT NULL
);

-- Email uniqueness is enforced here, not by a lookup before insert
CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users(email);

-- Product catalog
CREATE TABLE IF NOT EXISTS products (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    price REAL NOT NULL,
    stock INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

-- Orders; items are an embedded JSON document
CREATE TABLE IF NOT EXISTS orders (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    items TEXT NOT NULL,
    total REAL NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_orders_user_id ON orders(user_id);
"#;

/// Create all tables and indexes that do not exist yet
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA).map_err(ShopError::DatabaseError)?;
    info!("Database schema is ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('users', 'products', 'orders')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 3);
    }

    #[test]
    fn test_email_unique_index() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();

        let insert = "INSERT INTO users (id, email, username, password_hash, created_at) VALUES (?, ?, 'u', 'h', 'now')";
        conn.execute(insert, ["1", "a@x.com"]).unwrap();
        assert!(conn.execute(insert, ["2", "a@x.com"]).is_err());
        // Case-sensitive as stored
        conn.execute(insert, ["3", "A@x.com"]).unwrap();
    }
}
