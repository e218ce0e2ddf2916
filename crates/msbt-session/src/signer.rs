//! Session token signing and verification
//!
//! Tokens use the JWT compact form with HMAC-SHA256 (`alg: HS256`). The
//! payload carries the `SessionToken` claims plus `iat` and `exp`.

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use msbt_core::SessionToken;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Default token lifetime (8 hours)
pub const DEFAULT_TTL_SECS: i64 = 8 * 60 * 60;

const ALGORITHM: &str = "HS256";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Invalid signing key: {0}")]
    InvalidKey(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<SessionError> for msbt_core::Error {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidKey(msg) => msbt_core::Error::Config(msg),
            other => msbt_core::Error::Unauthorized(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    session: SessionToken,
    iat: i64,
    exp: i64,
}

/// Signs and verifies session tokens with a shared secret
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl_secs: i64,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }

    pub fn with_ttl_secs(mut self, ttl_secs: i64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    fn mac(&self) -> Result<HmacSha256, SessionError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|e| SessionError::InvalidKey(e.to_string()))
    }

    /// Sign a session valid for the configured lifetime from now
    pub fn sign(&self, session: &SessionToken) -> Result<String, SessionError> {
        self.sign_at(session, chrono::Utc::now().timestamp())
    }

    /// Sign a session issued at `issued_at` (unix seconds)
    pub fn sign_at(&self, session: &SessionToken, issued_at: i64) -> Result<String, SessionError> {
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: Some("JWT".to_string()),
        };
        let claims = Claims {
            session: session.clone(),
            iat: issued_at,
            exp: issued_at + self.ttl_secs,
        };

        let signing_input = format!(
            "{}.{}",
            BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?)
        );

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = BASE64_URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}", signing_input, signature))
    }

    /// Verify a token against the current time
    pub fn verify(&self, token: &str) -> Result<SessionToken, SessionError> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    /// Verify a token as of `now` (unix seconds)
    pub fn verify_at(&self, token: &str, now: i64) -> Result<SessionToken, SessionError> {
        let mut parts = token.trim().split('.');
        let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(SessionError::Malformed("expected three segments".to_string()));
        };

        let header: Header = serde_json::from_slice(&decode_segment(header_b64, "header")?)?;
        if header.alg != ALGORITHM {
            return Err(SessionError::UnsupportedAlgorithm(header.alg));
        }

        let signature = decode_segment(signature_b64, "signature")?;
        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| SessionError::InvalidSignature)?;

        let claims: Claims = serde_json::from_slice(&decode_segment(claims_b64, "claims")?)?;
        if now >= claims.exp {
            debug!("Session token expired at {}", claims.exp);
            return Err(SessionError::Expired);
        }

        Ok(claims.session)
    }
}

fn decode_segment(segment: &str, label: &str) -> Result<Vec<u8>, SessionError> {
    BASE64_URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| SessionError::Malformed(format!("{} is not base64url: {}", label, e)))
}
