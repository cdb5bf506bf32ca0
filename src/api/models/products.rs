use crate::core::error::{Result, ShopError};
use serde::{Deserialize, Serialize};

/// Request body for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub stock: i64,
}

impl CreateProductRequest {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ShopError::validation("name", "cannot be empty"));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ShopError::validation("price", "must be a non-negative number"));
        }
        if self.stock < 0 {
            return Err(ShopError::validation("stock", "cannot be negative"));
        }
        Ok(())
    }
}

/// Product as returned by the API
#[derive(Debug, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub stock: i64,
}

impl From<crate::db::models::Product> for ProductResponse {
    fn from(product: crate::db::models::Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, price: f64, stock: i64) -> CreateProductRequest {
        CreateProductRequest {
            name: name.to_string(),
            description: None,
            price,
            stock,
        }
    }

    #[test]
    fn test_validation() {
        assert!(request("Mug", 4.5, 0).validate().is_ok());
        assert!(request("Free sample", 0.0, 3).validate().is_ok());
        assert!(request(" ", 4.5, 0).validate().is_err());
        assert!(request("Mug", -1.0, 0).validate().is_err());
        assert!(request("Mug", f64::NAN, 0).validate().is_err());
        assert!(request("Mug", 4.5, -2).validate().is_err());
    }

    #[test]
    fn test_stock_defaults_to_zero() {
        let req: CreateProductRequest =
            serde_json::from_str(r#"{"name": "Mug", "price": 4.5}"#).unwrap();
        assert_eq!(req.stock, 0);
        assert!(req.description.is_none());
    }
}
