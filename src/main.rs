//! Session Gate - session/authentication service
//!
//! Usage:
//!   session-gate --bind 0.0.0.0:3000 --expire-secs 900
//!
//! Environment:
//!   JWT_SECRET - HS256 signing secret (required outside development)
//!   SESSION_EXPIRE_SECS - Session lifetime before renewal (default: 900)
//!   SESSION_ISSUER - Issuer claim (default: session-gate)
//!   SESSION_SNAPSHOT_PATH - Where sessions are kept across restarts
//!   AUTH_DB_PATH - SQLite identity database
//!   ADMIN_PASSWORD - Password of the seeded admin account
//!   BIND_ADDR - Listen address (default: 0.0.0.0:3000)

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use session_gate::{
    auth::{
        clock::SystemClock, persistence, AuthState, IdentityProvider, SessionRegistry,
        TokenService, UserStore,
    },
    config::{SessionConfig, DEFAULT_EXPIRE_SECS, DEFAULT_ISSUER},
    server,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEV_SECRET: &str = "dev-secret-change-in-production-minimum-32-characters";

#[derive(Parser, Debug)]
#[command(name = "session-gate")]
#[command(about = "Session gate - single-session bearer token authentication")]
struct Args {
    /// Listen address
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    bind: String,

    /// HS256 signing secret
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Session lifetime in seconds before a transparent renewal
    #[arg(long, env = "SESSION_EXPIRE_SECS", default_value_t = DEFAULT_EXPIRE_SECS)]
    expire_secs: i64,

    /// Issuer claim stamped on every token
    #[arg(long, env = "SESSION_ISSUER", default_value = DEFAULT_ISSUER)]
    issuer: String,

    /// Session snapshot file
    #[arg(long, env = "SESSION_SNAPSHOT_PATH", default_value = "sessions.json")]
    snapshot_path: PathBuf,

    /// SQLite identity database
    #[arg(long, env = "AUTH_DB_PATH", default_value = "session_gate_auth.db")]
    auth_db_path: String,

    /// Password for the admin account seeded into an empty database
    #[arg(long, env = "ADMIN_PASSWORD", default_value = "admin123", hide_env_values = true)]
    admin_password: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    let args = Args::parse();

    let secret = args.jwt_secret.clone().unwrap_or_else(|| {
        warn!("JWT_SECRET not set, using the development secret");
        DEV_SECRET.to_string()
    });
    let config = SessionConfig::new(secret, args.expire_secs, args.issuer.clone())
        .context("Invalid session configuration")?;

    let registry = Arc::new(SessionRegistry::new());
    persistence::load_snapshot(&registry, &args.snapshot_path);

    let tokens = Arc::new(TokenService::new(
        &config,
        registry.clone(),
        Arc::new(SystemClock),
    ));
    let user_store = Arc::new(UserStore::new(&args.auth_db_path, &args.admin_password)?);
    let identities: Arc<dyn IdentityProvider> = user_store;
    let state = AuthState::new(tokens, identities);

    info!(
        auth_db = %args.auth_db_path,
        expire_secs = args.expire_secs,
        issuer = %args.issuer,
        sessions = registry.len(),
        "Session gate initialized"
    );

    let app = server::router(state);
    let listener = TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    info!("API server listening on {}", args.bind);

    server::serve_until(
        listener,
        app,
        &registry,
        &args.snapshot_path,
        shutdown_signal(),
    )
    .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        // Without a signal handler, keep serving until killed.
        std::future::pending::<()>().await;
    }
}

/// Initialize tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "session_gate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // 1) Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // 2) Also try the crate's own .env when launched from elsewhere
    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}
