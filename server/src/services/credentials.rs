//! Credential accounts: signup and email/password login.
//!
//! Passwords are hashed with Argon2id and a random salt; the hash never
//! leaves this module in any serialized form. Login failures are collapsed
//! into one error so callers cannot tell an unknown email from a wrong
//! password.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::session::SessionUser;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const DEFAULT_ROLE: &str = "USER";

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("name, email and password are required")]
    MissingFields,
    #[error("invalid email address")]
    InvalidEmail,
    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    WeakPassword,
    #[error("email is already registered")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Body of a signup request. Every field is optional on the wire so a
/// missing field reports the same error as a blank one.
#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Body of a login request.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A validated signup, ready to insert.
#[derive(Debug, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// A stored user as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: String,
}

/// Trim and lowercase `email`, accepting only `local@domain.tld` shapes
/// with no whitespace and exactly one `@`.
#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    if normalized.chars().any(char::is_whitespace) {
        return None;
    }
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.contains('@') {
        return None;
    }
    let dotted = domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len());
    dotted.then_some(normalized)
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Check a signup body in order: required fields, email shape, password length.
///
/// # Errors
///
/// Returns the first rule the request breaks.
pub fn validate_signup(req: &SignupRequest) -> Result<NewUser, CredentialError> {
    let (Some(name), Some(email), Some(password)) =
        (present(req.name.as_deref()), present(req.email.as_deref()), req.password.as_deref().filter(|p| !p.is_empty()))
    else {
        return Err(CredentialError::MissingFields);
    };
    let email = normalize_email(email).ok_or(CredentialError::InvalidEmail)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CredentialError::WeakPassword);
    }
    Ok(NewUser { name: name.trim().to_owned(), email, password: password.to_owned() })
}

/// Hash a password with a fresh random salt.
///
/// # Errors
///
/// Returns [`CredentialError::Hash`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CredentialError::Hash(e.to_string()))
}

/// Whether `password` matches the stored `hash`. Malformed hashes never match.
#[must_use]
pub fn verify_password(hash: &str, password: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        tracing::warn!("stored password hash is malformed");
        return false;
    };
    Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
}

/// Register a new credential user with the default role.
///
/// # Errors
///
/// Returns a validation error, [`CredentialError::EmailTaken`] for a
/// duplicate email, or a database/hash error.
pub async fn signup(pool: &PgPool, req: &SignupRequest) -> Result<UserRecord, CredentialError> {
    let new_user = validate_signup(req)?;

    let existing = sqlx::query("SELECT 1 FROM users WHERE email = $1")
        .bind(&new_user.email)
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        return Err(CredentialError::EmailTaken);
    }

    let password_hash = hash_password(&new_user.password)?;
    let row = sqlx::query(
        r"INSERT INTO users (name, email, password_hash, role)
          VALUES ($1, $2, $3, $4)
          ON CONFLICT (email) DO NOTHING
          RETURNING id, name, email, role, to_char(created_at, 'YYYY-MM-DD') AS created_at",
    )
    .bind(&new_user.name)
    .bind(&new_user.email)
    .bind(&password_hash)
    .bind(DEFAULT_ROLE)
    .fetch_optional(pool)
    .await?
    .ok_or(CredentialError::EmailTaken)?;

    Ok(UserRecord {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        role: row.get("role"),
        created_at: row.get("created_at"),
    })
}

/// Check an email/password pair and return the matching user.
///
/// # Errors
///
/// Returns [`CredentialError::InvalidCredentials`] for missing fields, an
/// unknown email, or a wrong password; a database error otherwise.
pub async fn login(pool: &PgPool, req: &LoginRequest) -> Result<SessionUser, CredentialError> {
    let (Some(email), Some(password)) = (present(req.email.as_deref()), req.password.as_deref().filter(|p| !p.is_empty()))
    else {
        return Err(CredentialError::InvalidCredentials);
    };
    let email = email.trim().to_ascii_lowercase();

    let row = sqlx::query("SELECT id, name, email, role, password_hash FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(pool)
        .await?
        .ok_or(CredentialError::InvalidCredentials)?;

    let hash: String = row.get("password_hash");
    if !verify_password(&hash, password) {
        return Err(CredentialError::InvalidCredentials);
    }

    Ok(SessionUser { id: row.get("id"), name: row.get("name"), email: row.get("email"), role: row.get("role") })
}

#[cfg(test)]
#[path = "credentials_test.rs"]
mod tests;
