//! Authentication API handlers

use crate::api::handlers::AppState;
use crate::auth::middleware::AuthUser;
use crate::auth::models::{LoginForm, RegisterRequest, TokenResponse, UserResponse};
use crate::core::error::{Result, ShopError};
use crate::db::models::NewUserRecord;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Form, Json,
};
use serde_json::{Map, Value};

/// Unknown email and wrong password share this rejection
fn invalid_credentials() -> ShopError {
    ShopError::AuthenticationError("Invalid credentials".to_string())
}

/// Handler for POST /auth/register - User registration
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    tracing::info!(email = %req.email, "User registration attempt");

    req.validate()?;

    let password_hash = state.passwords.hash_async(req.password).await?;

    let record = NewUserRecord {
        email: req.email,
        username: req.username,
        password_hash,
        is_admin: false,
    };
    let email = record.email.clone();
    let username = record.username.clone();

    // The unique index decides duplicates; no lookup beforehand
    let id = match state.users.insert(record).await {
        Ok(id) => id,
        Err(ShopError::Conflict(msg)) => {
            tracing::warn!(email = %email, "Registration refused: email already registered");
            return Err(ShopError::Conflict(msg));
        }
        Err(e) => return Err(e),
    };

    tracing::info!(user_id = %id, email = %email, "User registered successfully");

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id,
            email,
            username,
            is_admin: false,
        }),
    ))
}

/// Handler for POST /auth/login - User login
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>> {
    tracing::info!(email = %form.username, "Login attempt");

    let user = match state.users.find_by_email(&form.username).await? {
        Some(user) => user,
        None => {
            // Same hashing cost as a wrong password
            state.passwords.verify_decoy_async(form.password).await?;
            tracing::warn!(email = %form.username, reason = "unknown_email", "Login failed");
            return Err(invalid_credentials());
        }
    };

    let is_valid = state
        .passwords
        .verify_async(user.password_hash.clone(), form.password)
        .await?;
    if !is_valid {
        tracing::warn!(user_id = %user.id, reason = "wrong_password", "Login failed");
        return Err(invalid_credentials());
    }

    let mut extra = Map::new();
    extra.insert("email".to_string(), Value::String(user.email.clone()));

    let token = state
        .tokens
        .issue(&user.id, extra, chrono::Utc::now())
        .map_err(|e| ShopError::InternalError(format!("Failed to sign token: {}", e)))?;

    tracing::info!(
        user_id = %user.id,
        expires_in_minutes = state.tokens.ttl().num_minutes(),
        "Login successful"
    );

    Ok(Json(TokenResponse::bearer(token)))
}

/// Handler for GET /auth/me - Get current user info
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserResponse>> {
    let record = state
        .users
        .find_by_id(&user.id)
        .await?
        .ok_or_else(|| ShopError::NotFound("User".to_string()))?;

    Ok(Json(UserResponse::from(record)))
}
