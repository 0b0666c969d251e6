//! Claims Codec
//! Mission: Sign claims into compact HS256 tokens and verify them back

use crate::auth::{errors::CodecError, models::Claims};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use tracing::debug;

/// HS256 codec bound to one process-wide secret.
///
/// Decoding checks structure and signature only. Expiry is a session-level
/// decision taken by the token service, so an expired token still decodes.
#[derive(Clone)]
pub struct ClaimsCodec {
    header: Header,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl ClaimsCodec {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Self {
            header: Header::new(Algorithm::HS256),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Sign `claims`. Identical claims and key always produce the same token.
    pub fn encode(&self, claims: &Claims) -> Result<String, CodecError> {
        encode(&self.header, claims, &self.encoding_key)
            .map_err(|e| CodecError::Encoding(e.to_string()))
    }

    pub fn decode(&self, token: &str) -> Result<Claims, CodecError> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => {
                debug!(error = %e, "Rejected token at decode");
                match e.kind() {
                    ErrorKind::InvalidSignature => Err(CodecError::InvalidSignature),
                    _ => Err(CodecError::Malformed(e.to_string())),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Role;

    fn sample_claims() -> Claims {
        Claims {
            sub: "42".to_string(),
            role: Role::User,
            active: true,
            iat: 1_700_000_000,
            exp: 1_700_000_900,
            iss: "session-gate".to_string(),
            jti: "7c1a1d64-0000-4000-8000-000000000001".to_string(),
        }
    }

    fn payload_segment(token: &str) -> &str {
        token.split('.').nth(1).unwrap()
    }

    fn swap_payload(token: &str, payload: &str) -> String {
        let parts: Vec<&str> = token.split('.').collect();
        format!("{}.{}.{}", parts[0], payload, parts[2])
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let codec = ClaimsCodec::new(b"test-secret-key-12345");
        let claims = sample_claims();

        let token = codec.encode(&claims).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert_eq!(codec.decode(&token).unwrap(), claims);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let codec = ClaimsCodec::new(b"test-secret-key-12345");
        let claims = sample_claims();
        assert_eq!(codec.encode(&claims).unwrap(), codec.encode(&claims).unwrap());
    }

    #[test]
    fn test_expired_token_still_decodes() {
        let codec = ClaimsCodec::new(b"test-secret-key-12345");
        let mut claims = sample_claims();
        claims.iat = 1_000;
        claims.exp = 2_000;

        let token = codec.encode(&claims).unwrap();
        assert_eq!(codec.decode(&token).unwrap().exp, 2_000);
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = ClaimsCodec::new(b"test-secret-key-12345");
        for token in ["", "invalid", "invalid.token.here", "a.b"] {
            assert!(
                matches!(codec.decode(token), Err(CodecError::Malformed(_))),
                "{token}"
            );
        }
    }

    #[test]
    fn test_different_secrets_reject() {
        let codec1 = ClaimsCodec::new(b"secret1");
        let codec2 = ClaimsCodec::new(b"secret2");

        let token = codec1.encode(&sample_claims()).unwrap();
        assert_eq!(codec2.decode(&token), Err(CodecError::InvalidSignature));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let codec = ClaimsCodec::new(b"test-secret-key-12345");
        let user_token = codec.encode(&sample_claims()).unwrap();

        let mut admin = sample_claims();
        admin.role = Role::Admin;
        let admin_token = codec.encode(&admin).unwrap();

        // Admin payload grafted onto the user token's signature.
        let forged = swap_payload(&user_token, payload_segment(&admin_token));
        assert_eq!(codec.decode(&forged), Err(CodecError::InvalidSignature));
    }
}
