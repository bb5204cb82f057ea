use crate::config::PasswordConfig;
use crate::error::ApiError;
use anyhow::{anyhow, Result};
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::rngs::OsRng;

/// Argon2id hashing and verification for doctor passwords.
///
/// Hashes are stored as PHC strings, so verification reads the cost
/// parameters back from the stored hash and keeps working after the
/// configured costs change.
pub struct PasswordAuth {
    argon2: Argon2<'static>,
    // Verified against when the email is unknown so both failure paths cost the same.
    dummy_hash: String,
}

impl PasswordAuth {
    pub fn new(config: &PasswordConfig) -> Result<Self> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| anyhow!("Invalid Argon2 parameters: {}", e))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let salt = SaltString::generate(&mut OsRng);
        let dummy_hash = argon2
            .hash_password(b"clinic-dummy-credential", &salt)
            .map_err(|e| anyhow!("Password hashing failed: {}", e))?
            .to_string();

        Ok(Self { argon2, dummy_hash })
    }

    /// Hash a password with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, ApiError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Constant-time check of `password` against a stored PHC hash.
    pub fn verify(&self, password: &str, stored_hash: &str) -> bool {
        let parsed = match PasswordHash::new(stored_hash) {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!(error = %e, "stored password hash is malformed");
                return false;
            }
        };

        self.argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    }

    /// Verify against a credential that may not exist. A missing credential
    /// still pays for one verification and always fails.
    pub fn verify_optional(&self, password: &str, stored_hash: Option<&str>) -> bool {
        match stored_hash {
            Some(hash) => self.verify(password, hash),
            None => {
                let _ = self.verify(password, &self.dummy_hash);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> PasswordConfig {
        PasswordConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let auth = PasswordAuth::new(&fast_config()).unwrap();
        let hash = auth.hash("secret").expect("hashing failed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(auth.verify("secret", &hash));
        assert!(!auth.verify("wrong", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let auth = PasswordAuth::new(&fast_config()).unwrap();
        let first = auth.hash("secret").unwrap();
        let second = auth.hash("secret").unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_survives_cost_change() {
        let old = PasswordAuth::new(&fast_config()).unwrap();
        let hash = old.hash("secret").unwrap();

        let new = PasswordAuth::new(&PasswordConfig {
            memory_kib: 2048,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();

        assert!(new.verify("secret", &hash));
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        let auth = PasswordAuth::new(&fast_config()).unwrap();
        assert!(!auth.verify("secret", "not-a-phc-string"));
    }

    #[test]
    fn test_missing_credential_never_matches() {
        let auth = PasswordAuth::new(&fast_config()).unwrap();
        assert!(!auth.verify_optional("clinic-dummy-credential", None));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let result = PasswordAuth::new(&PasswordConfig {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(result.is_err());
    }
}
