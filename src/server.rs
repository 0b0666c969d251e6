//! HTTP wiring for the session endpoints.

use crate::auth::{
    api::{self as auth_api, AuthState},
    persistence, require_active, require_admin, SessionRegistry,
};
use crate::middleware::request_logging;
use anyhow::{Context, Result};
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
    Router,
};
use std::future::Future;
use std::path::Path;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

pub fn router(state: AuthState) -> Router {
    let tokens = state.tokens.clone();

    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/login", post(auth_api::login));

    let session_routes = Router::new()
        .route("/api/auth/logout", post(auth_api::logout))
        .route("/api/auth/me", get(auth_api::get_current_session))
        .route_layer(from_fn_with_state(tokens.clone(), require_active));

    let admin_routes = Router::new()
        .route("/api/admin/sessions", get(auth_api::list_sessions))
        .route("/api/admin/sessions/:id", delete(auth_api::revoke_session))
        .route_layer(from_fn_with_state(tokens, require_admin));

    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .merge(admin_routes)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(request_logging))
                .layer(CorsLayer::permissive()),
        )
}

async fn health_check() -> &'static str {
    "ok"
}

/// Serve `app` until `shutdown` resolves, then write the session snapshot.
///
/// The snapshot is written whether the server stopped cleanly or on an error;
/// the serve error is returned afterwards.
pub async fn serve_until<F>(
    listener: TcpListener,
    app: Router,
    registry: &SessionRegistry,
    snapshot_path: &Path,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await;

    info!("Shutting down, saving sessions");
    if let Err(e) = persistence::save_snapshot(registry, snapshot_path) {
        error!(error = %format!("{e:#}"), "Failed to save session snapshot");
    }

    served.context("Server error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::{Claims, Role};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_sessions_saved_after_shutdown() {
        let dir = tempdir().unwrap();
        let snapshot = dir.path().join("sessions.json");

        let registry = SessionRegistry::new();
        registry.set(
            "p-1",
            Claims {
                sub: "p-1".to_string(),
                role: Role::User,
                active: true,
                iat: 1_700_000_000,
                exp: 1_700_000_900,
                iss: "session-gate".to_string(),
                jti: "j-1".to_string(),
            },
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let app = Router::new().route("/health", get(health_check));
        serve_until(listener, app, &registry, &snapshot, async {})
            .await
            .unwrap();

        let restored = SessionRegistry::new();
        assert_eq!(persistence::load_snapshot(&restored, &snapshot), 1);
        assert_eq!(restored.snapshot(), registry.snapshot());
    }
}
