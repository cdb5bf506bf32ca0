use crate::api::handlers::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

/// Handler for GET /
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Shop API is running" }))
}

/// Handler for GET /health
///
/// Reports 503 when the database cannot answer a trivial query.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let db_ok = state
        .db
        .execute(|conn| Ok(conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?))
        .await
        .is_ok();

    if !db_ok {
        tracing::error!("Health check failed: database unreachable");
    }

    let status = if db_ok { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status,
        Json(json!({
            "status": if db_ok { "ok" } else { "degraded" },
            "database": if db_ok { "ok" } else { "unreachable" },
            "version": crate::VERSION,
            "timestamp": chrono::Utc::now().timestamp(),
        })),
    )
}
