//! Signed bearer tokens (HS256, JWT compact form).
//!
//! `header.payload.signature`, each part base64url without padding. Only
//! HS256 is issued or accepted.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use super::AuthError;
use crate::models::TokenPurpose;

type HmacSha256 = Hmac<Sha256>;

/// Session lifetime: 7 days.
pub const SESSION_TTL_SECS: i64 = 7 * 24 * 3600;
/// Password reset lifetime: 1 hour.
pub const RESET_TTL_SECS: i64 = 3600;

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User id.
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
    pub purpose: TokenPurpose,
}

impl TokenClaims {
    pub fn new(sub: String, email: String, purpose: TokenPurpose, now: i64) -> Self {
        let ttl = match purpose {
            TokenPurpose::Session => SESSION_TTL_SECS,
            TokenPurpose::PasswordReset => RESET_TTL_SECS,
        };
        Self {
            sub,
            email,
            iat: now,
            exp: now + ttl,
            purpose,
        }
    }
}

/// Signs and verifies tokens with a shared secret.
pub struct TokenSigner {
    secret: Zeroizing<Vec<u8>>,
}

impl TokenSigner {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            secret: Zeroizing::new(secret.to_vec()),
        }
    }

    pub fn sign(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        let header = Header {
            alg: "HS256".into(),
            typ: "JWT".into(),
        };
        let header = serde_json::to_vec(&header)
            .map_err(|e| AuthError::Internal(format!("token header: {e}")))?;
        let payload = serde_json::to_vec(claims)
            .map_err(|e| AuthError::Internal(format!("token payload: {e}")))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload)
        );
        let signature = self.mac(signing_input.as_bytes())?.finalize().into_bytes();

        Ok(format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature)))
    }

    /// Check signature and expiry at `now` (unix seconds). Purpose is the
    /// caller's concern.
    pub fn verify(&self, token: &str, now: i64) -> Result<TokenClaims, AuthError> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::InvalidToken);
        };

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| AuthError::InvalidToken)?;
        let signing_input = &token[..header_b64.len() + 1 + payload_b64.len()];
        self.mac(signing_input.as_bytes())?
            .verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken)?;

        let header: Header = decode_part(header_b64)?;
        if header.alg != "HS256" {
            return Err(AuthError::InvalidToken);
        }

        let claims: TokenClaims = decode_part(payload_b64)?;
        if claims.exp <= now {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }

    fn mac(&self, input: &[u8]) -> Result<HmacSha256, AuthError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AuthError::Internal(format!("hmac key: {e}")))?;
        mac.update(input);
        Ok(mac)
    }
}

fn decode_part<T: for<'de> Deserialize<'de>>(part: &str) -> Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(part)
        .map_err(|_| AuthError::InvalidToken)?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::InvalidToken)
}
