use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use secrecy::{ExposeSecret, Secret};

/// Hash with Argon2id and a fresh random salt (PHC string format).
pub fn hash_password(password: &Secret<String>) -> Result<String, anyhow::Error> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{PasswordHash, PasswordVerifier};

    fn verify(password: &str, hash: &str) -> bool {
        let parsed = PasswordHash::new(hash).unwrap();
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    #[test]
    fn test_hash_and_verify() {
        let password = Secret::new("correct horse battery".to_string());
        let hash = hash_password(&password).expect("Failed to hash password");

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify("correct horse battery", &hash));
        assert!(!verify("wrong", &hash));
    }

    #[test]
    fn test_salts_differ() {
        let password = Secret::new("same-password".to_string());
        let first = hash_password(&password).unwrap();
        let second = hash_password(&password).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_request_password_is_redacted() {
        let request: crate::dtos::access::CreateUserRequest = serde_json::from_value(serde_json::json!({
            "email": "clerk@shop.test",
            "password": "s3cret-passphrase",
            "user_type_id": 2
        }))
        .unwrap();

        assert_eq!(request.password.expose_secret(), "s3cret-passphrase");
        assert!(!format!("{:?}", request).contains("s3cret-passphrase"));
    }
}
