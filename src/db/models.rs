//! Database models
//!
//! Typed records decoded at the store boundary

use serde::{Deserialize, Serialize};

/// User record in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    /// Absent in older rows; decoded as `false`
    #[serde(default)]
    pub is_admin: bool,
    pub created_at: String,
}

/// A user record that has not been stored yet.
///
/// The store assigns the identifier and creation time on insert.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// Product record in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub stock: i64,
    pub created_at: String,
}

/// Line item embedded in an order document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub price: f64,
}

/// Order record; `items` is stored as a JSON document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub total: f64,
    pub status: String,
    pub created_at: String,
}

impl Order {
    /// Default status of a freshly placed order
    pub const STATUS_PENDING: &'static str = "pending";

    /// Sum of `price * quantity` over all items
    pub fn compute_total(items: &[OrderItem]) -> f64 {
        items
            .iter()
            .map(|item| item.price * item.quantity as f64)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_total() {
        let items = vec![
            OrderItem {
                product_id: "p1".into(),
                name: "Mug".into(),
                quantity: 2,
                price: 4.5,
            },
            OrderItem {
                product_id: "p2".into(),
                name: "Tea".into(),
                quantity: 1,
                price: 3.0,
            },
        ];
        assert_eq!(Order::compute_total(&items), 12.0);
        assert_eq!(Order::compute_total(&[]), 0.0);
    }

    #[test]
    fn test_user_record_admin_flag_defaults_to_false() {
        let record: UserRecord = serde_json::from_value(serde_json::json!({
            "id": "u1",
            "email": "a@x.com",
            "username": "a",
            "password_hash": "$argon2id$...",
            "created_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert!(!record.is_admin);
    }
}
