use crate::config::PasswordHashConfig;
use crate::error::SeedError;
use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::Rng;

fn hasher(cfg: &PasswordHashConfig) -> Result<Argon2<'static>, SeedError> {
    let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
        .map_err(|e| SeedError::PasswordHash(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// PHC-format Argon2id hash. The salt comes from `rng` so seeded runs are reproducible.
pub fn hash_password<R: Rng + ?Sized>(
    password: &str,
    cfg: &PasswordHashConfig,
    rng: &mut R,
) -> Result<String, SeedError> {
    let salt_bytes: [u8; 16] = rng.gen();
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| SeedError::PasswordHash(e.to_string()))?;
    let hash = hasher(cfg)?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| SeedError::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

#[cfg(test)]
pub fn verify_password(password: &str, phc: &str) -> bool {
    use argon2::password_hash::{PasswordHash, PasswordVerifier};
    let Ok(parsed) = PasswordHash::new(phc) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn cheap() -> PasswordHashConfig {
        PasswordHashConfig {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn hash_verifies_and_rejects_wrong_password() {
        let mut rng = StdRng::seed_from_u64(10);
        let phc = hash_password("123456", &cheap(), &mut rng).expect("hash");
        assert!(phc.starts_with("$argon2id$"));
        assert!(verify_password("123456", &phc));
        assert!(!verify_password("654321", &phc));
        assert!(!verify_password("123456", "not-a-hash"));
    }

    #[test]
    fn invalid_params_are_reported() {
        let mut rng = StdRng::seed_from_u64(10);
        let bad = PasswordHashConfig {
            memory_kib: 0,
            iterations: 0,
            parallelism: 0,
        };
        assert!(matches!(
            hash_password("x", &bad, &mut rng),
            Err(SeedError::PasswordHash(_))
        ));
    }
}
