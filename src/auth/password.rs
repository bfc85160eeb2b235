//! Argon2id password hashing.

use anyhow::anyhow;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// Salt size for Argon2 (128 bits)
const SALT_SIZE: usize = 16;

#[derive(Clone)]
pub struct Hasher {
    params: Params,
}

impl Hasher {
    /// `memory_kib` and `iterations` only affect new hashes; stored hashes carry their own cost.
    pub fn with_cost(memory_kib: u32, iterations: u32) -> anyhow::Result<Hasher> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| anyhow!("invalid Argon2 parameters: {e}"))?;
        Ok(Hasher { params })
    }

    /// Produces a PHC string (`$argon2id$v=19$...`) with a fresh random salt.
    pub fn hash(&self, password: &str) -> anyhow::Result<String> {
        let salt: [u8; SALT_SIZE] = rand::random();
        let salt = SaltString::encode_b64(&salt).map_err(|e| anyhow!("could not encode salt: {e}"))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("password hashing failed: {e}"))?;

        Ok(hash.to_string())
    }

    /// False for a wrong password and for anything that isn't a PHC string.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
    }
}
