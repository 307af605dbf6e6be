use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AuthError;

/// Claims carried by an access token: the origin address observed at mint
/// time and the session identifier. The shape is closed: a token with any
/// other claim, or a missing one, fails decoding outright.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessClaims {
    pub ip: String,
    pub jti: Uuid,
}

/// Claims carried by a refresh token: the session identifier, nothing else.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshClaims {
    pub jti: Uuid,
}

/// A signed access/refresh pair as it crosses the wire. Field names match
/// the JSON payload of the issue and refresh endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    #[serde(rename = "AccessToken")]
    pub access_token: String,
    #[serde(rename = "RefreshToken")]
    pub refresh_token: String,
}

/// Signs and verifies token pairs. Stateless; knows nothing about session
/// lifecycle. Liveness is enforced by registry membership, not by expiry
/// claims, so revocation takes effect immediately — tokens here carry no
/// `exp` and verification does not look for one.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Build a codec around a symmetric signing key. The key is an explicit
    /// value injected here, never ambient state, so tests can run distinct
    /// codecs with distinct keys.
    pub fn new(secret: &str) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::Configuration(
                "jwt signing secret is empty".to_string(),
            ));
        }
        // HS512 only. Tokens signed with any other algorithm, including
        // other members of the HMAC family, do not verify.
        let mut validation = Validation::new(Algorithm::HS512);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    pub fn sign_access(&self, ip: &str, jti: Uuid) -> Result<String, AuthError> {
        let claims = AccessClaims {
            ip: ip.to_string(),
            jti,
        };
        encode(&Header::new(Algorithm::HS512), &claims, &self.encoding)
            .map_err(|e| AuthError::Configuration(format!("signing access token: {e}")))
    }

    pub fn sign_refresh(&self, jti: Uuid) -> Result<String, AuthError> {
        let claims = RefreshClaims { jti };
        encode(&Header::new(Algorithm::HS512), &claims, &self.encoding)
            .map_err(|e| AuthError::Configuration(format!("signing refresh token: {e}")))
    }

    /// Sign both halves of a pair bound to one session identifier.
    pub fn sign_pair(&self, ip: &str, jti: Uuid) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.sign_access(ip, jti)?,
            refresh_token: self.sign_refresh(jti)?,
        })
    }

    /// Decode and verify an access token. Any failure — bad signature,
    /// wrong algorithm, extra or missing claims, structural garbage —
    /// collapses to `InvalidToken`; the reason is not surfaced to callers.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        decode::<AccessClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }

    /// Decode and verify a refresh token with the same strictness.
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        decode::<RefreshClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}
