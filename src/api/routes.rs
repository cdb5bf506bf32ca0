//! API routes

use crate::api::handlers::{
    create_order, create_product, get_order, get_product, health_check, list_orders,
    list_products, root, AppState,
};
use crate::auth::handlers::{get_me, login, register};
use crate::auth::middleware::authenticate;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

/// Build all API routes.
///
/// Routes in the protected group run behind the bearer token middleware; a
/// path may be split across both groups by method, as `/products` is.
pub fn build_api_routes(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product));

    let protected = Router::new()
        .route("/auth/me", get(get_me))
        .route("/products", post(create_product))
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/:id", get(get_order))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .merge(public)
        .merge(protected)
        .with_state(state)
}
