use crate::config::{AppConfig, Argon2Config};
use crate::errors::BancarizateError;
use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::Rng;
use rand::seq::SliceRandom;

/// Argon2id hash using the configured cost
pub fn hash_password(password: &str) -> Result<String, BancarizateError> {
    hash_password_with(password, &AppConfig::get().argon2)
}

pub fn hash_password_with(password: &str, cost: &Argon2Config) -> Result<String, BancarizateError> {
    let params = Params::new(cost.memory_cost, cost.time_cost, cost.parallelism, None)
        .map_err(|e| BancarizateError::validation(format!("Invalid Argon2 parameters: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| BancarizateError::validation(format!("Password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

/// Cost parameters are read back from the PHC string
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed_hash) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok(),
        Err(_) => false,
    }
}

const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
const DIGITS: &[u8] = b"23456789";

/// Random password that satisfies the password policy.
///
/// Ambiguous glyphs (0/O, 1/l/I) are left out since these are handed out on paper.
pub fn generate_password(len: usize) -> String {
    let len = len.max(8);
    let mut rng = rand::rng();
    let mut chars: Vec<u8> = vec![
        UPPER[rng.random_range(0..UPPER.len())],
        LOWER[rng.random_range(0..LOWER.len())],
        DIGITS[rng.random_range(0..DIGITS.len())],
    ];
    let pool: Vec<u8> = [UPPER, LOWER, DIGITS].concat();
    while chars.len() < len {
        chars.push(pool[rng.random_range(0..pool.len())]);
    }
    chars.shuffle(&mut rng);
    String::from_utf8(chars).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validate::validate_password;

    fn cheap() -> Argon2Config {
        Argon2Config {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password_with("Bancariza7e", &cheap()).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Bancariza7e", &hash));
        assert!(!verify_password("bancariza7e", &hash));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify_password("whatever", "not-a-phc-string"));
    }

    #[test]
    fn test_generated_password_meets_policy() {
        for _ in 0..50 {
            let pwd = generate_password(12);
            assert_eq!(pwd.len(), 12);
            assert!(validate_password(&pwd).is_valid, "{pwd}");
        }
    }
}
