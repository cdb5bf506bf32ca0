//! Admin access policy
//!
//! Admin status is read from the user record on every admin request; tokens
//! never carry it. Demoting an account therefore takes effect immediately,
//! while the rest of the identity may stay stale until the token expires.

use crate::api::handlers::AppState;
use crate::auth::middleware::AuthUser;
use crate::core::error::{Result, ShopError};
use crate::db::repository::UserRecordStore;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

const ADMIN_REQUIRED: &str = "Admin access required";

/// Pass `user` through only if its backing record exists and is an admin
pub async fn require_admin(user: AuthUser, users: &dyn UserRecordStore) -> Result<AuthUser> {
    match users.find_by_id(&user.id).await? {
        Some(record) if record.is_admin => Ok(user),
        Some(_) => {
            tracing::warn!(user_id = %user.id, "Admin route refused for non-admin user");
            Err(ShopError::PermissionDenied(ADMIN_REQUIRED.to_string()))
        }
        None => {
            tracing::warn!(user_id = %user.id, "Admin route refused for unknown user");
            Err(ShopError::PermissionDenied(ADMIN_REQUIRED.to_string()))
        }
    }
}

/// Extractor for handlers that require an administrator
#[derive(Clone, Debug)]
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ShopError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        require_admin(user, state.users.as_ref()).await.map(AdminUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::Claims;
    use crate::db::{DatabaseManager, NewUserRecord, UserRepository};
    use serde_json::Map;
    use std::sync::Arc;

    fn identity(id: &str) -> AuthUser {
        AuthUser::from(Claims {
            sub: id.to_string(),
            iat: 0,
            exp: i64::MAX,
            extra: Map::new(),
        })
    }

    async fn store_with(is_admin: bool) -> (UserRepository, String) {
        let repo = UserRepository::new(Arc::new(DatabaseManager::new_in_memory().unwrap()));
        let id = repo
            .insert(NewUserRecord {
                email: "a@x.com".to_string(),
                username: "a".to_string(),
                password_hash: "h".to_string(),
                is_admin,
            })
            .await
            .unwrap();
        (repo, id)
    }

    #[tokio::test]
    async fn test_admin_passes() {
        let (repo, id) = store_with(true).await;
        let user = require_admin(identity(&id), &repo).await.unwrap();
        assert_eq!(user.id, id);
    }

    #[tokio::test]
    async fn test_non_admin_rejected_with_forbidden() {
        let (repo, id) = store_with(false).await;
        let err = require_admin(identity(&id), &repo).await.unwrap_err();
        assert!(matches!(err, ShopError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_unknown_subject_rejected_with_forbidden() {
        let (repo, _) = store_with(true).await;
        let err = require_admin(identity("deleted-user"), &repo).await.unwrap_err();
        assert!(matches!(err, ShopError::PermissionDenied(_)));
    }
}
