//! User profile routes for the signed-in user.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use super::auth::AuthUser;
use super::{error_response, internal_error};
use crate::services::profile::{self, ChangePasswordRequest, ProfileError, UpdateProfileRequest};
use crate::state::AppState;

pub(crate) fn profile_error_status(err: &ProfileError) -> StatusCode {
    match err {
        ProfileError::BlankName
        | ProfileError::MissingCurrentPassword
        | ProfileError::WeakPassword
        | ProfileError::PasswordMismatch => StatusCode::BAD_REQUEST,
        ProfileError::WrongPassword => StatusCode::UNAUTHORIZED,
        ProfileError::NotFound => StatusCode::NOT_FOUND,
        ProfileError::Hash(_) | ProfileError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn profile_error_to_response(err: ProfileError) -> Response {
    let status = profile_error_status(&err);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        return internal_error("profile request failed", &err);
    }
    error_response(status, err.to_string())
}

/// `GET /api/users/me`: profile of the signed-in user.
pub async fn get_me(State(state): State<AppState>, auth: AuthUser) -> Response {
    match profile::get_profile(&state.pool, auth.user.id).await {
        Ok(p) => Json(p).into_response(),
        Err(e) => profile_error_to_response(e),
    }
}

/// `PATCH /api/users/me`: change the display name.
pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Response {
    match profile::update_name(&state.pool, auth.user.id, &req).await {
        Ok(p) => Json(p).into_response(),
        Err(e) => profile_error_to_response(e),
    }
}

/// `POST /api/users/me/password`: replace the password and sign out other sessions.
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Response {
    match profile::change_password(&state.pool, auth.user.id, &auth.token, &req).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => profile_error_to_response(e),
    }
}

#[cfg(test)]
#[path = "users_test.rs"]
mod tests;
