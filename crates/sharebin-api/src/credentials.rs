use anyhow::anyhow;
use argon2::{
    Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use tracing::warn;

/// Turns passwords into stored hashes and checks candidates against them.
pub trait CredentialVerifier: Send + Sync {
    fn hash(&self, password: &str) -> anyhow::Result<String>;

    /// `false` for a mismatch and for a stored value that is not a valid hash.
    fn verify(&self, password: &str, stored_hash: &str) -> bool;
}

/// Argon2id with a fresh random salt per password.
pub struct Argon2Credentials {
    argon2: Argon2<'static>,
}

impl Argon2Credentials {
    pub fn new(params: Params) -> Self {
        Self {
            argon2: Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params),
        }
    }
}

impl Default for Argon2Credentials {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

impl CredentialVerifier for Argon2Credentials {
    fn hash(&self, password: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("password hashing failed: {}", e))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, stored_hash: &str) -> bool {
        let parsed = match PasswordHash::new(stored_hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Stored password is not a valid hash: {}", e);
                return false;
            }
        };
        // Cost parameters come from the stored hash, not from `self`.
        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> Argon2Credentials {
        Argon2Credentials::new(Params::new(1024, 1, 1, None).unwrap())
    }

    #[test]
    fn hash_then_verify() {
        let creds = cheap();
        let hash = creds.hash("secret").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(creds.verify("secret", &hash));
        assert!(!creds.verify("Secret", &hash));
    }

    #[test]
    fn salts_differ_per_hash() {
        let creds = cheap();
        assert_ne!(creds.hash("same").unwrap(), creds.hash("same").unwrap());
    }

    #[test]
    fn plaintext_stored_value_never_verifies() {
        assert!(!cheap().verify("secret", "secret"));
    }
}
