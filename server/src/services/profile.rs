//! Profile reads and self-service account changes.

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::credentials::{MIN_PASSWORD_LEN, hash_password, verify_password};
use super::session;

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("name is required")]
    BlankName,
    #[error("current password is required")]
    MissingCurrentPassword,
    #[error("new password must be at least {MIN_PASSWORD_LEN} characters")]
    WeakPassword,
    #[error("new passwords do not match")]
    PasswordMismatch,
    #[error("current password is incorrect")]
    WrongPassword,
    #[error("user not found")]
    NotFound,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub member_since: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

/// Validated password change.
#[derive(Debug, PartialEq, Eq)]
pub struct PasswordChange<'a> {
    pub current: &'a str,
    pub new: &'a str,
}

/// Trimmed display name, or an error when blank.
///
/// # Errors
///
/// Returns [`ProfileError::BlankName`] for a missing or blank name.
pub fn validate_name(req: &UpdateProfileRequest) -> Result<String, ProfileError> {
    req.name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_owned)
        .ok_or(ProfileError::BlankName)
}

/// Check a password change in order: current present, new long enough, confirmation matches.
///
/// # Errors
///
/// Returns the first rule the request breaks.
pub fn validate_password_change(req: &ChangePasswordRequest) -> Result<PasswordChange<'_>, ProfileError> {
    let current = req
        .current_password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or(ProfileError::MissingCurrentPassword)?;
    let new = req.new_password.as_deref().unwrap_or_default();
    if new.chars().count() < MIN_PASSWORD_LEN {
        return Err(ProfileError::WeakPassword);
    }
    if req.confirm_password.as_deref() != Some(new) {
        return Err(ProfileError::PasswordMismatch);
    }
    Ok(PasswordChange { current, new })
}

/// Load the profile of `user_id`.
///
/// # Errors
///
/// Returns [`ProfileError::NotFound`] if the user no longer exists.
pub async fn get_profile(pool: &PgPool, user_id: Uuid) -> Result<Profile, ProfileError> {
    let row = sqlx::query(
        r"SELECT id, name, email, role,
                 to_char(created_at, 'YYYY-MM-DD') AS member_since
          FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(ProfileError::NotFound)?;

    Ok(Profile {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        role: row.get("role"),
        member_since: row.get("member_since"),
    })
}

/// Rename `user_id` and return the updated profile.
///
/// # Errors
///
/// Returns a validation error, [`ProfileError::NotFound`], or a database error.
pub async fn update_name(pool: &PgPool, user_id: Uuid, req: &UpdateProfileRequest) -> Result<Profile, ProfileError> {
    let name = validate_name(req)?;
    let updated = sqlx::query("UPDATE users SET name = $1, updated_at = now() WHERE id = $2")
        .bind(&name)
        .bind(user_id)
        .execute(pool)
        .await?;
    if updated.rows_affected() == 0 {
        return Err(ProfileError::NotFound);
    }
    get_profile(pool, user_id).await
}

/// Replace the password of `user_id` and revoke every session except `keep_token`.
///
/// # Errors
///
/// Returns a validation error, [`ProfileError::WrongPassword`] when the
/// current password does not match, or a database/hash error.
pub async fn change_password(
    pool: &PgPool,
    user_id: Uuid,
    keep_token: &str,
    req: &ChangePasswordRequest,
) -> Result<(), ProfileError> {
    let change = validate_password_change(req)?;

    let stored: String = sqlx::query("SELECT password_hash FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(ProfileError::NotFound)?
        .get("password_hash");
    if !verify_password(&stored, change.current) {
        return Err(ProfileError::WrongPassword);
    }

    let hash = hash_password(change.new).map_err(|e| ProfileError::Hash(e.to_string()))?;
    sqlx::query("UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2")
        .bind(&hash)
        .bind(user_id)
        .execute(pool)
        .await?;

    let revoked = session::delete_other_sessions(pool, user_id, keep_token).await?;
    tracing::info!(%user_id, revoked, "password changed");
    Ok(())
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;
