//! Startup creation of the configured administrator account

use crate::auth::password::PasswordHasher;
use crate::core::config::AdminConfig;
use crate::core::error::{Result, ShopError};
use crate::db::models::NewUserRecord;
use crate::db::repository::UserRecordStore;
use tracing::info;

/// Create the configured admin if no account uses its email yet.
///
/// An existing account with that email is left untouched, admin or not.
pub async fn ensure_admin_user(
    config: &AdminConfig,
    users: &dyn UserRecordStore,
    passwords: &PasswordHasher,
) -> Result<()> {
    let (email, password) = match (&config.email, &config.password) {
        (Some(email), Some(password)) => (email, password),
        _ => return Ok(()),
    };

    if users.find_by_email(email).await?.is_some() {
        info!(email = %email, "Admin account already present");
        return Ok(());
    }

    let password_hash = passwords.hash_async(password.clone()).await?;
    let record = NewUserRecord {
        email: email.clone(),
        username: config.username.clone().unwrap_or_else(|| "admin".to_string()),
        password_hash,
        is_admin: true,
    };

    match users.insert(record).await {
        Ok(id) => {
            info!(user_id = %id, email = %email, "Admin account created");
            Ok(())
        }
        // Another instance created it between the lookup and the insert
        Err(ShopError::Conflict(_)) => Ok(()),
        Err(e) => Err(e),
    }
}
