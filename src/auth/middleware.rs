//! Access Gate
//! Mission: Protect routes with server-validated sessions
//!
//! Signature and registry checks always run before any role or active-flag
//! decision, so a forged token never reaches the authorization step.

use crate::auth::{
    errors::SessionError,
    models::{Claims, Role},
    token_service::TokenService,
};
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Requirement {
    Active,
    Admin,
}

/// Reject unless the request carries a current session of an active principal.
pub async fn require_active(
    State(tokens): State<Arc<TokenService>>,
    req: Request,
    next: Next,
) -> Response {
    gate(&tokens, req, next, Requirement::Active).await
}

/// Same as [`require_active`], and the principal must be an admin.
pub async fn require_admin(
    State(tokens): State<Arc<TokenService>>,
    req: Request,
    next: Next,
) -> Response {
    gate(&tokens, req, next, Requirement::Admin).await
}

async fn gate(
    tokens: &TokenService,
    mut req: Request,
    next: Next,
    requirement: Requirement,
) -> Response {
    let session = match bearer_token(req.headers()).and_then(|t| tokens.validate(&t)) {
        Ok(session) => session,
        Err(e) => {
            debug!(path = %req.uri().path(), error = %e, "Request rejected");
            return e.into_response();
        }
    };

    let claims = session.claims;

    // A renewal already replaced the registry entry, so the client needs the
    // new token even when the request itself is refused below.
    let mut response = match authorize(&claims, requirement) {
        Ok(()) => {
            req.extensions_mut().insert(claims.clone());
            let mut response = next.run(req).await;
            // Lets outer layers (request logging) see who was served.
            response.extensions_mut().insert(claims.clone());
            response
        }
        Err(e) => {
            debug!(
                path = %req.uri().path(),
                principal = %claims.sub,
                error = %e,
                "Request rejected"
            );
            e.into_response()
        }
    };

    // The handler may have ended the session (logout); don't hand out a token
    // for it.
    let renewed = session.renewed.filter(|_| {
        tokens
            .registry()
            .get(&claims.sub)
            .is_some_and(|current| current.same_session(&claims))
    });

    if let Some(renewed) = renewed {
        match Authorization::bearer(&renewed) {
            Ok(header) => response.headers_mut().typed_insert(header),
            Err(_) => {
                return SessionError::Internal("renewed token is not a valid header".to_string())
                    .into_response()
            }
        }
    }

    response
}

fn bearer_token(headers: &HeaderMap) -> Result<String, SessionError> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or(SessionError::NoToken)
}

fn authorize(claims: &Claims, requirement: Requirement) -> Result<(), SessionError> {
    if !claims.active {
        return Err(SessionError::Unauthorized);
    }
    if requirement == Requirement::Admin && claims.role != Role::Admin {
        return Err(SessionError::Unauthorized);
    }
    Ok(())
}

/// Extract claims from request (use after a gate)
pub fn extract_claims(req: &Request) -> Option<&Claims> {
    req.extensions().get::<Claims>()
}

/// Handler argument carrying the claims validated by the gate.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = SessionError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(CurrentSession)
            .ok_or(SessionError::NoToken)
    }
}
