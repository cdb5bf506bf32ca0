use crate::api::handlers::AppState;
use crate::api::models::{CreateOrderRequest, OrderResponse};
use crate::auth::AuthUser;
use crate::core::error::{Result, ShopError};
use crate::db::models::Order;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

/// Handler for GET /orders - Orders of the caller
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<OrderResponse>>> {
    let orders = state.order_repo.find_by_user(&user.id).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// Handler for GET /orders/:id
///
/// Orders of other users answer 404 so their ids cannot be probed.
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>> {
    let order = state
        .order_repo
        .find_for_user(&id, &user.id)
        .await?
        .ok_or_else(|| ShopError::NotFound("Order".to_string()))?;

    Ok(Json(OrderResponse::from(order)))
}

/// Handler for POST /orders - Place an order for the caller
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse> {
    req.validate()?;

    let order = Order {
        id: Uuid::new_v4().to_string(),
        user_id: user.id.clone(),
        total: Order::compute_total(&req.items),
        items: req.items,
        status: Order::STATUS_PENDING.to_string(),
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    state.order_repo.create(&order).await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %user.id,
        items = order.items.len(),
        total = order.total,
        "Order placed"
    );

    Ok((StatusCode::CREATED, Json(OrderResponse::from(order))))
}
