//! Authentication request/response models

use crate::core::error::{Result, ShopError};
use crate::db::models::UserRecord;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

const MAX_USERNAME_LEN: usize = 64;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").unwrap();
}

/// Register request
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

impl RegisterRequest {
    /// Check field formats. Password strength is left to the client.
    pub fn validate(&self) -> Result<()> {
        if !EMAIL_RE.is_match(&self.email) {
            return Err(ShopError::validation("email", "must be a valid email address"));
        }

        let username = self.username.trim();
        if username.is_empty() {
            return Err(ShopError::validation("username", "cannot be empty"));
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(ShopError::validation(
                "username",
                format!("must be at most {} characters", MAX_USERNAME_LEN),
            ));
        }

        Ok(())
    }
}

/// Login form (`application/x-www-form-urlencoded`).
///
/// Follows the OAuth2 password-grant field names: `username` carries the
/// account email.
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// User info (without password)
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub is_admin: bool,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            is_admin: user.is_admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, username: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            username: username.to_string(),
            password: String::new(),
        }
    }

    #[test]
    fn test_valid_registration() {
        assert!(request("a@x.com", "a").validate().is_ok());
        assert!(request("first.last+tag@shop.example.org", "someone").validate().is_ok());
    }

    #[test]
    fn test_invalid_email() {
        for email in ["", "ax.com", "a@x", "a @x.com", "a@@x.com", "a@x."] {
            let err = request(email, "a").validate().unwrap_err();
            assert!(
                matches!(err, ShopError::ValidationError { ref field, .. } if field == "email"),
                "accepted {:?}",
                email
            );
        }
    }

    #[test]
    fn test_invalid_username() {
        let err = request("a@x.com", "   ").validate().unwrap_err();
        assert!(matches!(err, ShopError::ValidationError { ref field, .. } if field == "username"));

        let err = request("a@x.com", &"u".repeat(65)).validate().unwrap_err();
        assert!(matches!(err, ShopError::ValidationError { ref field, .. } if field == "username"));
    }

    #[test]
    fn test_login_form_debug_hides_password() {
        let form = LoginForm {
            username: "a@x.com".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{:?}", form).contains("hunter2"));
    }
}
