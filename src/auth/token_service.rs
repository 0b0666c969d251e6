//! Token Service
//! Mission: Turn signed tokens into server-supervised sessions
//!
//! A token is only valid while the registry holds exactly the claims it
//! carries. Issuing supersedes the previous session of the principal, revoking
//! deletes it, and an expired-but-current token is renewed in place.

use crate::auth::{
    clock::{Clock, SystemClock},
    errors::SessionError,
    jwt::ClaimsCodec,
    models::{Claims, Principal},
    registry::{ReplaceOutcome, SessionRegistry},
};
use crate::config::SessionConfig;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A freshly signed token together with the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Result of a successful validation.
#[derive(Debug, Clone)]
pub struct ValidatedSession {
    pub claims: Claims,
    /// Set when the presented token had expired and the session was renewed.
    /// The caller must hand this token back to the client.
    pub renewed: Option<String>,
}

pub struct TokenService {
    codec: ClaimsCodec,
    registry: Arc<SessionRegistry>,
    clock: Arc<dyn Clock>,
    expire_delay: Duration,
    issuer: String,
}

impl TokenService {
    pub fn new(
        config: &SessionConfig,
        registry: Arc<SessionRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            codec: ClaimsCodec::new(config.secret()),
            registry,
            clock,
            expire_delay: config.expire_delay(),
            issuer: config.issuer().to_string(),
        }
    }

    /// Service with its own empty registry and the wall clock.
    pub fn with_defaults(config: &SessionConfig) -> Self {
        Self::new(config, Arc::new(SessionRegistry::new()), Arc::new(SystemClock))
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Start a new session for `principal`, ending any session it already had.
    pub fn issue(&self, principal: &Principal) -> Result<IssuedToken, SessionError> {
        let now = self.clock.now();
        let claims = Claims {
            sub: principal.id.clone(),
            role: principal.role,
            active: principal.active,
            iat: now.timestamp(),
            exp: self.expiry_from(now)?,
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = self.codec.encode(&claims)?;
        self.registry.set(&claims.sub, claims.clone());

        info!(
            principal = %claims.sub,
            role = claims.role.as_str(),
            expires_at = claims.exp,
            "Session issued"
        );

        Ok(IssuedToken { token, claims })
    }

    /// Check `token` against the registry, renewing it if it has expired.
    pub fn validate(&self, token: &str) -> Result<ValidatedSession, SessionError> {
        let decoded = self.codec.decode(token)?;

        let Some(current) = self.registry.get(&decoded.sub) else {
            debug!(principal = %decoded.sub, "No session for token subject");
            return Err(SessionError::BadToken);
        };

        if !current.same_session(&decoded) {
            warn!(principal = %decoded.sub, "Rejected superseded session token");
            return Err(SessionError::BadToken);
        }

        if decoded.is_expired_at(self.clock.now().timestamp()) {
            let renewed = self.refresh(&decoded)?;
            return Ok(ValidatedSession {
                claims: renewed.claims,
                renewed: Some(renewed.token),
            });
        }

        Ok(ValidatedSession {
            claims: decoded,
            renewed: None,
        })
    }

    /// Extend the validity window of the session described by `current`.
    ///
    /// Role and active flag are carried over as-is. If another request renewed
    /// the same session first, its token is returned instead; if the session
    /// was revoked or replaced meanwhile, the refresh fails.
    pub fn refresh(&self, current: &Claims) -> Result<IssuedToken, SessionError> {
        let now = self.clock.now();
        let renewed = Claims {
            iat: now.timestamp(),
            exp: self.expiry_from(now)?,
            ..current.clone()
        };

        let token = self.codec.encode(&renewed)?;

        match self.registry.replace_if(&current.sub, current, renewed.clone()) {
            ReplaceOutcome::Replaced => {
                debug!(
                    principal = %renewed.sub,
                    expires_at = renewed.exp,
                    "Session refreshed"
                );
                Ok(IssuedToken {
                    token,
                    claims: renewed,
                })
            }
            ReplaceOutcome::Conflict(Some(winner)) if current.renewed_by(&winner) => {
                debug!(principal = %winner.sub, "Concurrent refresh already landed");
                let token = self.codec.encode(&winner)?;
                Ok(IssuedToken {
                    token,
                    claims: winner,
                })
            }
            ReplaceOutcome::Conflict(_) => {
                warn!(principal = %current.sub, "Session ended during refresh");
                Err(SessionError::BadToken)
            }
        }
    }

    fn expiry_from(&self, now: DateTime<Utc>) -> Result<i64, SessionError> {
        now.checked_add_signed(self.expire_delay)
            .map(|exp| exp.timestamp())
            .ok_or_else(|| SessionError::Internal("Invalid timestamp".to_string()))
    }

    /// End the session of `principal_id`. Returns whether one existed.
    pub fn revoke(&self, principal_id: &str) -> bool {
        let existed = self.registry.delete(principal_id);
        if existed {
            info!(principal = %principal_id, "Session revoked");
        }
        existed
    }
}
