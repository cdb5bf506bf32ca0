//! Password hashing and verification using Argon2id

use crate::core::config::SecurityConfig;
use crate::core::error::{Result, ShopError};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Stand-in password hashed once at construction for the decoy digest
const DECOY_PASSWORD: &str = "decoy-password-never-assigned";

/// Salted Argon2id hashing with a bound on concurrent work.
///
/// Digests are PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`), so
/// verification reads its parameters from the digest rather than from this
/// hasher's configuration.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    permits: Arc<Semaphore>,
    /// Digest with the configured cost that no account owns
    decoy_digest: Arc<str>,
}

impl PasswordHasher {
    /// Build a hasher from the configured cost parameters
    pub fn new(config: &SecurityConfig) -> Result<Self> {
        let params = Params::new(
            config.hash_memory_kib,
            config.hash_iterations,
            config.hash_parallelism,
            None,
        )
        .map_err(|e| ShopError::ConfigError(format!("Invalid Argon2 parameters: {}", e)))?;

        let mut hasher = Self {
            params,
            permits: Arc::new(Semaphore::new(config.max_concurrent_hashes)),
            decoy_digest: Arc::from(""),
        };
        hasher.decoy_digest = Arc::from(hasher.hash(DECOY_PASSWORD)?);

        Ok(hasher)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ShopError::InternalError(format!("Failed to hash password: {}", e)))
    }

    /// Verify a password against a stored digest
    ///
    /// A mismatch, a malformed digest and an unsupported parameter set all
    /// yield `false`. The final comparison is constant-time.
    pub fn verify(&self, digest: &str, password: &str) -> bool {
        let parsed = match PasswordHash::new(digest) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password digest is malformed");
                return false;
            }
        };

        self.argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// `hash` on the blocking pool, at most `max_concurrent_hashes` at a time
    ///
    /// The permit moves into the blocking task, so a cancelled caller keeps
    /// its slot until the hash actually finishes.
    pub async fn hash_async(&self, password: String) -> Result<String> {
        let permit = self.acquire_permit().await?;

        let hasher = self.clone();
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            hasher.hash(&password)
        })
        .await
        .map_err(|e| ShopError::TaskError(format!("Hashing task panicked: {}", e)))?
    }

    /// `verify` on the blocking pool, at most `max_concurrent_hashes` at a time
    pub async fn verify_async(&self, digest: String, password: String) -> Result<bool> {
        let permit = self.acquire_permit().await?;

        let hasher = self.clone();
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            hasher.verify(&digest, &password)
        })
        .await
        .map_err(|e| ShopError::TaskError(format!("Hashing task panicked: {}", e)))
    }

    /// Run one full verification against a digest no account owns.
    ///
    /// Used when a login names an unknown account so that it costs as much
    /// as a wrong password.
    pub async fn verify_decoy_async(&self, password: String) -> Result<()> {
        self.verify_async(self.decoy_digest.to_string(), password)
            .await
            .map(|_| ())
    }

    async fn acquire_permit(&self) -> Result<OwnedSemaphorePermit> {
        self.permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| ShopError::TaskError(format!("Hashing pool closed: {}", e)))
    }

    /// Take every hashing slot until the returned permit is dropped
    #[cfg(test)]
    pub(crate) async fn occupy_all_slots(&self) -> OwnedSemaphorePermit {
        let slots = self.permits.available_permits() as u32;
        self.permits.clone().acquire_many_owned(slots).await.unwrap()
    }
}
