//! Authentication API Endpoints
//! Mission: Login, logout and session administration over HTTP

use crate::auth::{
    identity::IdentityProvider,
    middleware::CurrentSession,
    models::{LoginRequest, LoginResponse, SessionResponse},
    token_service::TokenService,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenService>,
    pub identities: Arc<dyn IdentityProvider>,
}

impl AuthState {
    pub fn new(tokens: Arc<TokenService>, identities: Arc<dyn IdentityProvider>) -> Self {
        Self { tokens, identities }
    }
}

/// Login endpoint - POST /api/auth/login
///
/// Starts a new session, which ends any session the principal had elsewhere.
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthApiError> {
    info!(username = %payload.username, "Login attempt");

    let principal = state
        .identities
        .authenticate(&payload.username, &payload.password)
        .map_err(|e| {
            error!(error = %e, "Identity lookup failed during login");
            AuthApiError::InternalError
        })?
        .ok_or_else(|| {
            warn!(username = %payload.username, "Failed login attempt");
            AuthApiError::InvalidCredentials
        })?;

    let issued = state.tokens.issue(&principal).map_err(|e| {
        error!(error = %e, "Failed to issue session");
        AuthApiError::InternalError
    })?;

    info!(
        username = %payload.username,
        principal = %principal.id,
        role = principal.role.as_str(),
        "Login successful"
    );

    Ok(Json(LoginResponse {
        token: issued.token,
        expires_at: issued.claims.exp,
        role: issued.claims.role,
        active: issued.claims.active,
        user_id: issued.claims.sub,
    }))
}

/// Logout endpoint - POST /api/auth/logout
pub async fn logout(
    State(state): State<AuthState>,
    CurrentSession(claims): CurrentSession,
) -> StatusCode {
    state.tokens.revoke(&claims.sub);
    StatusCode::NO_CONTENT
}

/// Get current session - GET /api/auth/me
pub async fn get_current_session(CurrentSession(claims): CurrentSession) -> Json<SessionResponse> {
    Json(SessionResponse::from_claims(&claims))
}

/// List live sessions - GET /api/admin/sessions (Admin only)
pub async fn list_sessions(State(state): State<AuthState>) -> Json<Vec<SessionResponse>> {
    let snapshot = state.tokens.registry().snapshot();
    let mut sessions: Vec<SessionResponse> = snapshot
        .sessions
        .values()
        .map(SessionResponse::from_claims)
        .collect();
    sessions.sort_by(|a, b| a.user_id.cmp(&b.user_id));
    Json(sessions)
}

/// Force-end a principal's session - DELETE /api/admin/sessions/:id (Admin only)
pub async fn revoke_session(
    State(state): State<AuthState>,
    CurrentSession(admin): CurrentSession,
    Path(user_id): Path<String>,
) -> Result<StatusCode, AuthApiError> {
    let known = state.identities.find_by_id(&user_id).map_err(|e| {
        error!(error = %e, "Identity lookup failed during revoke");
        AuthApiError::InternalError
    })?;
    if known.is_none() {
        return Err(AuthApiError::UserNotFound);
    }

    let ended = state.tokens.revoke(&user_id);
    info!(
        admin = %admin.sub,
        principal = %user_id,
        ended,
        "Session revoked by admin"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Auth API errors
#[derive(Debug, PartialEq, Eq)]
pub enum AuthApiError {
    InvalidCredentials,
    UserNotFound,
    InternalError,
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AuthApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Invalid username or password",
            ),
            AuthApiError::UserNotFound => (StatusCode::NOT_FOUND, "not_found", "User not found"),
            AuthApiError::InternalError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "Internal server error",
            ),
        };

        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_api_error_responses() {
        let invalid_creds = AuthApiError::InvalidCredentials.into_response();
        assert_eq!(invalid_creds.status(), StatusCode::UNAUTHORIZED);

        let not_found = AuthApiError::UserNotFound.into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let internal = AuthApiError::InternalError.into_response();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
