//! Login Routes

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::session::{credentials_match, expired_cookie, session_cookie, Session, SessionToken};
use crate::SharedState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub email: String,
    pub expires_at: String,
}

/// Start a session for the configured account
pub async fn login(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request: LoginRequest =
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let auth = &state.config.auth;

    if !credentials_match(auth, &request.email, &request.password) {
        metrics::counter!("login_attempts_total", "outcome" => "rejected").increment(1);
        warn!("Rejected login for {}", request.email);
        return Err(ApiError::InvalidCredentials);
    }

    let (token, session) = state.sessions.create(&request.email);
    metrics::counter!("login_attempts_total", "outcome" => "accepted").increment(1);
    info!("Session started for {}", session.email);

    let max_age = state.sessions.ttl().num_seconds().max(0) as u64;
    let cookie = session_cookie(&auth.cookie_name, &token, max_age);
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            email: session.email,
            expires_at: session.expires_at.to_rfc3339(),
        }),
    ))
}

/// End the caller's session
pub async fn logout(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Extension(SessionToken(token)): Extension<SessionToken>,
) -> impl IntoResponse {
    state.sessions.revoke(&token);
    info!("Session ended for {}", session.email);
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, expired_cookie(&state.config.auth.cookie_name))],
    )
}
