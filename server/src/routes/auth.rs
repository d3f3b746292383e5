//! Auth routes: credential signup/login and session management.

use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use time::Duration;

use super::{error_response, internal_error};
use crate::services::credentials::{self, CredentialError, LoginRequest, SignupRequest, UserRecord};
use crate::services::session;
use crate::state::AppState;

pub(crate) const COOKIE_NAME: &str = "session_token";

/// Session cookie carrying `token` for `ttl_days`.
pub(crate) fn session_cookie(token: String, secure: bool, ttl_days: i32) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::days(i64::from(ttl_days)))
        .build()
}

/// Expired session cookie that makes the browser drop it.
pub(crate) fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::ZERO)
        .build()
}

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated user extracted from the session cookie.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub user: session::SessionUser,
    pub token: String,
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(COOKIE_NAME).map(Cookie::value).unwrap_or_default();
        if token.is_empty() {
            return Err(error_response(StatusCode::UNAUTHORIZED, "not signed in"));
        }

        let app_state = AppState::from_ref(state);
        let user = session::validate_session(&app_state.pool, token)
            .await
            .map_err(|e| internal_error("session lookup failed", &e))?
            .ok_or_else(|| error_response(StatusCode::UNAUTHORIZED, "session expired"))?;

        Ok(Self { user, token: token.to_owned() })
    }
}

// =============================================================================
// ERROR MAPPING
// =============================================================================

pub(crate) fn credential_error_status(err: &CredentialError) -> StatusCode {
    match err {
        CredentialError::MissingFields | CredentialError::InvalidEmail | CredentialError::WeakPassword => {
            StatusCode::BAD_REQUEST
        }
        CredentialError::EmailTaken => StatusCode::CONFLICT,
        CredentialError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        CredentialError::Hash(_) | CredentialError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn credential_error_to_response(err: CredentialError) -> Response {
    let status = credential_error_status(&err);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        return internal_error("credential request failed", &err);
    }
    error_response(status, err.to_string())
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: String,
    pub user: UserRecord,
}

/// `POST /api/auth/signup`: register a credential user.
pub async fn signup(State(state): State<AppState>, Json(req): Json<SignupRequest>) -> Response {
    match credentials::signup(&state.pool, &req).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "user registered");
            let body = SignupResponse { message: "signup complete".into(), user };
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Err(e) => credential_error_to_response(e),
    }
}

/// `POST /api/auth/login`: check credentials, start a session, set the cookie.
pub async fn login(State(state): State<AppState>, jar: CookieJar, Json(req): Json<LoginRequest>) -> Response {
    let user = match credentials::login(&state.pool, &req).await {
        Ok(user) => user,
        Err(e) => {
            if matches!(e, CredentialError::InvalidCredentials) {
                tracing::info!("login rejected");
            }
            return credential_error_to_response(e);
        }
    };

    let token = match session::create_session(&state.pool, user.id, state.session_ttl_days).await {
        Ok(t) => t,
        Err(e) => return internal_error("session creation failed", &e),
    };

    tracing::info!(user_id = %user.id, "login succeeded");
    let jar = jar.add(session_cookie(token, state.cookie_secure, state.session_ttl_days));
    (jar, Json(user)).into_response()
}

/// `GET /api/auth/me`: return current user.
pub async fn me(auth: AuthUser) -> Json<session::SessionUser> {
    Json(auth.user)
}

/// `POST /api/auth/logout`: delete session, clear cookie.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    if let Err(e) = session::delete_session(&state.pool, &auth.token).await {
        tracing::warn!(error = %e, "session delete failed during logout");
    }

    let jar = CookieJar::new().add(clear_session_cookie(state.cookie_secure));
    (jar, StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
