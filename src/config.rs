//! Session configuration, validated once at startup.

use anyhow::{bail, Result};
use chrono::Duration;

pub const DEFAULT_ISSUER: &str = "session-gate";
pub const DEFAULT_EXPIRE_SECS: i64 = 15 * 60;
/// One year. Longer delays push `exp` toward the end of the representable range.
pub const MAX_EXPIRE_SECS: i64 = 365 * 24 * 60 * 60;

/// Signing key and lifetime settings injected into the token service.
#[derive(Clone)]
pub struct SessionConfig {
    secret: Vec<u8>,
    expire_delay: Duration,
    issuer: String,
}

impl SessionConfig {
    pub fn new(
        secret: impl Into<Vec<u8>>,
        expire_secs: i64,
        issuer: impl Into<String>,
    ) -> Result<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            bail!("session signing secret must not be empty");
        }
        // Claims carry whole seconds; a zero delay would break exp > iat.
        if expire_secs < 1 {
            bail!("session expire delay must be at least one second, got {expire_secs}");
        }
        if expire_secs > MAX_EXPIRE_SECS {
            bail!("session expire delay must be at most {MAX_EXPIRE_SECS}s, got {expire_secs}");
        }
        let Some(expire_delay) = Duration::try_seconds(expire_secs) else {
            bail!("session expire delay out of range: {expire_secs}");
        };

        let issuer = issuer.into();
        if issuer.trim().is_empty() {
            bail!("session issuer must not be empty");
        }

        Ok(Self {
            secret,
            expire_delay,
            issuer,
        })
    }

    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    pub fn expire_delay(&self) -> Duration {
        self.expire_delay
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"<redacted>")
            .field("expire_delay", &self.expire_delay)
            .field("issuer", &self.issuer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = SessionConfig::new("secret", 60, DEFAULT_ISSUER).unwrap();
        assert_eq!(config.expire_delay(), Duration::seconds(60));
        assert_eq!(config.issuer(), "session-gate");
        assert_eq!(config.secret(), b"secret");
    }

    #[test]
    fn test_rejects_empty_secret_and_zero_delay() {
        assert!(SessionConfig::new("", 60, DEFAULT_ISSUER).is_err());
        assert!(SessionConfig::new("secret", 0, DEFAULT_ISSUER).is_err());
        assert!(SessionConfig::new("secret", 60, " ").is_err());
    }

    #[test]
    fn test_rejects_oversized_delay() {
        assert!(SessionConfig::new("secret", MAX_EXPIRE_SECS, DEFAULT_ISSUER).is_ok());
        assert!(SessionConfig::new("secret", MAX_EXPIRE_SECS + 1, DEFAULT_ISSUER).is_err());
        assert!(SessionConfig::new("secret", 10_000_000_000_000, DEFAULT_ISSUER).is_err());
        assert!(SessionConfig::new("secret", i64::MAX, DEFAULT_ISSUER).is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = SessionConfig::new("hunter2", 60, DEFAULT_ISSUER).unwrap();
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
