use crate::core::error::{Result, ShopError};
use crate::db::models::{Order, OrderItem};
use serde::{Deserialize, Serialize};

/// Request body for placing an order
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItem>,
}

impl CreateOrderRequest {
    pub fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(ShopError::validation("items", "an order needs at least one item"));
        }

        for (i, item) in self.items.iter().enumerate() {
            if item.product_id.trim().is_empty() {
                return Err(ShopError::validation(format!("items[{}].product_id", i), "cannot be empty"));
            }
            if item.name.trim().is_empty() {
                return Err(ShopError::validation(format!("items[{}].name", i), "cannot be empty"));
            }
            if item.quantity < 1 {
                return Err(ShopError::validation(format!("items[{}].quantity", i), "must be at least 1"));
            }
            if !item.price.is_finite() || item.price < 0.0 {
                return Err(ShopError::validation(
                    format!("items[{}].price", i),
                    "must be a non-negative number",
                ));
            }
        }

        if !Order::compute_total(&self.items).is_finite() {
            return Err(ShopError::validation("items", "order total is out of range"));
        }

        Ok(())
    }
}

/// Order as returned by the API
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub total: f64,
    pub status: String,
    pub created_at: String,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            items: order.items,
            total: order.total,
            status: order.status,
            created_at: order.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i64, price: f64) -> OrderItem {
        OrderItem {
            product_id: "p1".to_string(),
            name: "Mug".to_string(),
            quantity,
            price,
        }
    }

    #[test]
    fn test_validation() {
        assert!(CreateOrderRequest { items: vec![item(1, 4.5)] }.validate().is_ok());
        assert!(CreateOrderRequest { items: vec![] }.validate().is_err());

        let err = CreateOrderRequest { items: vec![item(1, 4.5), item(0, 4.5)] }
            .validate()
            .unwrap_err();
        assert!(matches!(err, ShopError::ValidationError { ref field, .. } if field == "items[1].quantity"));

        assert!(CreateOrderRequest { items: vec![item(1, -0.5)] }.validate().is_err());
    }

    #[test]
    fn test_overflowing_total_rejected() {
        let huge = CreateOrderRequest { items: vec![item(i64::MAX, 1e300)] };
        let err = huge.validate().unwrap_err();
        assert!(matches!(err, ShopError::ValidationError { ref field, .. } if field == "items"));

        // Each item is finite on its own; only the sum overflows
        let summed = CreateOrderRequest { items: vec![item(1, f64::MAX), item(1, f64::MAX)] };
        assert!(summed.validate().is_err());
    }
}
