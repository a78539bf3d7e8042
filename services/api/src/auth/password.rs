//! Credential validation and bcrypt hashing.
//!
//! Hashing is CPU bound, so both hash and verify run on the blocking pool.

use anyhow::Context;
use regex::Regex;
use std::sync::LazyLock;

pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Emails are compared case-insensitively and without surrounding blanks.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Checks the registration rules. The error is safe to show to the user.
pub fn validate_credentials(email: &str, password: &str) -> Result<(), &'static str> {
    if email.is_empty() || password.is_empty() {
        return Err("Email and password are required.");
    }
    if !EMAIL_PATTERN.is_match(email) {
        return Err("Invalid email format.");
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err("Password must be at least 8 characters long.");
    }
    Ok(())
}

pub async fn hash_password(password: String, cost: u32) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .context("Password hashing task failed")?
        .context("Failed to hash password")
}

pub async fn verify_password(password: String, hash: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .context("Password verification task failed")?
        .context("Failed to verify password")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ana@Example.COM "), "ana@example.com");
    }

    #[test]
    fn test_validate_credentials() {
        assert_eq!(validate_credentials("ana@example.com", "longenough"), Ok(()));
        assert_eq!(
            validate_credentials("", "longenough"),
            Err("Email and password are required.")
        );
        assert_eq!(
            validate_credentials("ana@example.com", ""),
            Err("Email and password are required.")
        );
        assert_eq!(
            validate_credentials("ana@example", "longenough"),
            Err("Invalid email format.")
        );
        assert_eq!(
            validate_credentials("ana maria@example.com", "longenough"),
            Err("Invalid email format.")
        );
        assert_eq!(
            validate_credentials("ana@example.com", "short"),
            Err("Password must be at least 8 characters long.")
        );
    }

    #[test]
    fn test_password_length_counts_characters() {
        assert!(validate_credentials("ana@example.com", "ñandúñañ").is_ok());
    }

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("correct horse".to_string(), 4).await.unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_password("correct horse".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong horse".to_string(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_against_corrupt_hash_fails() {
        assert!(verify_password("anything".to_string(), "not-a-hash".to_string()).await.is_err());
    }
}
