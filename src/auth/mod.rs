//! Authentication module
//!
//! This module provides authentication functionality including:
//! - Password hashing and verification
//! - Access token issuance and validation
//! - Bearer token middleware resolving requests to an identity
//! - Admin access policy
//! - User registration, login and profile handlers

pub mod bootstrap;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod policy;

pub use bootstrap::ensure_admin_user;
pub use handlers::{get_me, login, register};
pub use jwt::{Claims, TokenError, TokenService};
pub use middleware::{authenticate, resolve_identity, AuthUser};
pub use password::PasswordHasher;
pub use policy::{require_admin, AdminUser};
