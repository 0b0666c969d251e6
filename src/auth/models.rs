//! Session Models
//! Mission: Define the claims, roles and request/response shapes of a session

use serde::{Deserialize, Serialize};

/// Principal roles for RBAC
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    #[serde(rename = "admin")]
    Admin, // Full access, including admin-only routes
    #[serde(rename = "user")]
    User,
    #[serde(rename = "observer")]
    Observer, // Read-only
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Observer => "observer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            "observer" => Some(Role::Observer),
            _ => None,
        }
    }
}

/// User account held by the identity store
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String, // bcrypt hash
    pub role: Role,
    pub active: bool,
    pub created_at: String,
}

impl User {
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id.clone(),
            role: self.role,
            active: self.active,
        }
    }
}

/// Identity of a principal as reported by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub role: Role,
    pub active: bool,
}

/// Signed session claims.
///
/// `iat`/`exp` are unix seconds. `jti` identifies the session: it is minted on
/// issue and survives refreshes, so two logins in the same second still yield
/// distinct claims.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String, // principal id
    pub role: Role,
    pub active: bool,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub jti: String,
}

impl Claims {
    /// Whether `other` describes the same, current session.
    ///
    /// The issuer is not part of the comparison: it is constant per deployment
    /// and carries no session state.
    pub fn same_session(&self, other: &Claims) -> bool {
        self.sub == other.sub
            && self.role == other.role
            && self.active == other.active
            && self.iat == other.iat
            && self.exp == other.exp
            && self.jti == other.jti
    }

    /// Whether `other` is a later renewal of this session.
    pub fn renewed_by(&self, other: &Claims) -> bool {
        self.sub == other.sub
            && self.role == other.role
            && self.active == other.active
            && self.jti == other.jti
            && other.exp > self.exp
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.exp
    }
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: i64,
    pub role: Role,
    pub active: bool,
    pub user_id: String,
}

/// Current session, as seen by `/api/auth/me`
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user_id: String,
    pub role: Role,
    pub active: bool,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl SessionResponse {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub.clone(),
            role: claims.role,
            active: claims.active,
            issued_at: claims.iat,
            expires_at: claims.exp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims() -> Claims {
        Claims {
            sub: "u-1".to_string(),
            role: Role::User,
            active: true,
            iat: 1_700_000_000,
            exp: 1_700_003_600,
            iss: "session-gate".to_string(),
            jti: "j-1".to_string(),
        }
    }

    #[test]
    fn test_role_serialization() {
        let admin = Role::Admin;
        let json = serde_json::to_string(&admin).unwrap();
        assert_eq!(json, r#""admin""#);

        let observer: Role = serde_json::from_str(r#""observer""#).unwrap();
        assert_eq!(observer, Role::Observer);
    }

    #[test]
    fn test_role_string_conversion() {
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Observer.as_str(), "observer");

        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("USER"), Some(Role::User));
        assert_eq!(Role::parse("root"), None);
    }

    #[test]
    fn test_user_principal() {
        let user = User {
            id: "u-1".to_string(),
            username: "alice".to_string(),
            password_hash: "$2b$04$hash".to_string(),
            role: Role::User,
            active: true,
            created_at: "2025-01-01T00:00:00Z".to_string(),
        };

        assert_eq!(
            user.principal(),
            Principal {
                id: "u-1".to_string(),
                role: Role::User,
                active: true,
            }
        );
    }

    #[test]
    fn test_same_session_ignores_issuer() {
        let a = claims();
        let mut b = claims();
        b.iss = "staging".to_string();
        assert!(a.same_session(&b));
    }

    #[test]
    fn test_same_session_checks_every_session_field() {
        let base = claims();
        let variants: Vec<Box<dyn Fn(&mut Claims)>> = vec![
            Box::new(|c: &mut Claims| c.sub = "u-2".to_string()),
            Box::new(|c: &mut Claims| c.role = Role::Admin),
            Box::new(|c: &mut Claims| c.active = false),
            Box::new(|c: &mut Claims| c.iat += 1),
            Box::new(|c: &mut Claims| c.exp += 1),
            Box::new(|c: &mut Claims| c.jti = "j-2".to_string()),
        ];
        for mutate in variants {
            let mut other = base.clone();
            mutate(&mut other);
            assert!(!base.same_session(&other), "{other:?}");
        }
    }

    #[test]
    fn test_renewed_by() {
        let old = claims();
        let mut renewed = claims();
        renewed.iat += 7200;
        renewed.exp += 7200;
        assert!(old.renewed_by(&renewed));
        assert!(!renewed.renewed_by(&old));

        renewed.jti = "other".to_string();
        assert!(!old.renewed_by(&renewed));
    }

    #[test]
    fn test_expiry_is_strict() {
        let c = claims();
        assert!(!c.is_expired_at(c.exp));
        assert!(c.is_expired_at(c.exp + 1));
    }
}
