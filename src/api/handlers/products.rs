use crate::api::handlers::AppState;
use crate::api::models::{CreateProductRequest, ProductResponse};
use crate::auth::AdminUser;
use crate::core::error::{Result, ShopError};
use crate::db::models::Product;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

/// Handler for GET /products - List the catalog
pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<ProductResponse>>> {
    let products = state.product_repo.find_all().await?;
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

/// Handler for GET /products/:id
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>> {
    let product = state
        .product_repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ShopError::NotFound("Product".to_string()))?;

    Ok(Json(ProductResponse::from(product)))
}

/// Handler for POST /products - Admin only
pub async fn create_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(req): Json<CreateProductRequest>,
) -> Result<impl IntoResponse> {
    req.validate()?;

    let product = Product {
        id: Uuid::new_v4().to_string(),
        name: req.name.trim().to_string(),
        description: req.description,
        price: req.price,
        stock: req.stock,
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    state.product_repo.create(&product).await?;

    tracing::info!(product_id = %product.id, admin_id = %admin.id, "Product created");

    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}
