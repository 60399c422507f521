use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::config::{AdminSecrets, MIN_SECRET_LENGTH};
use crate::crypto::{constant_time_eq, generate_nonce, hmac_sha256};
use crate::{SecretString, SiteError};

/// First segment of every token this codec issues.
pub const TOKEN_VERSION: &str = "v1";

/// How far in the future `iat` may be before a token is rejected.
pub const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Signed body of a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub iat: i64,
    pub exp: i64,
    pub nonce: String,
}

// Decoding accepts missing claims so they can be rejected explicitly.
#[derive(Deserialize)]
struct ClaimedPayload {
    iat: Option<i64>,
    exp: Option<i64>,
    nonce: Option<String>,
}

/// Issues and checks `v1.<payload>.<signature>` session tokens.
///
/// The payload is base64url (no padding) JSON `{iat, exp, nonce}`; the
/// signature is base64url HMAC-SHA256 over the payload segment exactly as it
/// appears in the token.
///
/// ```rust
/// use chrono::Duration;
/// use makerspace_admin::{SecretString, SessionTokenCodec};
///
/// let codec = SessionTokenCodec::new(
///     SecretString::new("a-signing-secret-of-32-characters"),
///     Duration::hours(12),
/// )
/// .unwrap();
///
/// let token = codec.create_token().unwrap();
/// assert!(codec.verify_token(&token));
/// ```
#[derive(Clone)]
pub struct SessionTokenCodec {
    secret: SecretString,
    lifetime: Duration,
    clock: Arc<dyn Clock>,
}

impl SessionTokenCodec {
    /// # Errors
    ///
    /// `SiteError::NotConfigured` if the secret is shorter than
    /// [`MIN_SECRET_LENGTH`] characters.
    pub fn new(secret: SecretString, lifetime: Duration) -> Result<Self, SiteError> {
        if secret.char_len() < MIN_SECRET_LENGTH {
            return Err(SiteError::NotConfigured(format!(
                "Session secret (at least {MIN_SECRET_LENGTH} characters)"
            )));
        }

        Ok(Self {
            secret,
            lifetime,
            clock: Arc::new(SystemClock),
        })
    }

    /// Builds a codec from the secrets currently in effect.
    pub fn from_secrets(secrets: &AdminSecrets, lifetime: Duration) -> Result<Self, SiteError> {
        let secret = secrets
            .session_secret
            .clone()
            .ok_or_else(|| SiteError::NotConfigured("Session secret".to_owned()))?;
        Self::new(secret, lifetime)
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(name = "create_session_token", skip_all, err))]
    pub fn create_token(&self) -> Result<String, SiteError> {
        let iat = self.clock.now().timestamp();
        let payload = TokenPayload {
            iat,
            exp: iat + self.lifetime.num_seconds(),
            nonce: generate_nonce(),
        };
        self.encode(&payload)
    }

    /// Signs an arbitrary payload. Tests use it to forge expired or
    /// future-dated tokens with a valid signature.
    pub fn encode(&self, payload: &TokenPayload) -> Result<String, SiteError> {
        let json = serde_json::to_vec(payload)
            .map_err(|e| SiteError::Internal(format!("token payload serialization: {e}")))?;
        let payload_b64 = URL_SAFE_NO_PAD.encode(json);
        let signature = hmac_sha256(self.secret.expose_secret().as_bytes(), payload_b64.as_bytes())?;

        Ok(format!(
            "{TOKEN_VERSION}.{payload_b64}.{}",
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// True only for a well-formed, correctly signed, unexpired token whose
    /// `iat` is not more than a minute ahead of this clock.
    pub fn verify_token(&self, token: &str) -> bool {
        match self.decode(token) {
            Ok(_) => true,
            Err(reason) => {
                log::debug!(
                    target: "makerspace_admin::session",
                    "msg=\"session token rejected\", reason=\"{reason}\""
                );
                false
            }
        }
    }

    /// Verifies `token` and returns its payload.
    pub fn decode(&self, token: &str) -> Result<TokenPayload, &'static str> {
        let parts: Vec<&str> = token.split('.').collect();
        let [version, payload_b64, signature_b64] = parts.as_slice() else {
            return Err("malformed");
        };

        if *version != TOKEN_VERSION {
            return Err("version mismatch");
        }

        let supplied = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| "signature encoding")?;
        let expected = hmac_sha256(self.secret.expose_secret().as_bytes(), payload_b64.as_bytes())
            .map_err(|_| "signature primitive")?;

        if !constant_time_eq(&expected, &supplied) {
            log::warn!(
                target: "makerspace_admin::session",
                "msg=\"session token tampered\", token_prefix=\"{}...\"",
                token.chars().take(8).collect::<String>()
            );
            return Err("bad signature");
        }

        let json = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| "payload encoding")?;
        let claimed: ClaimedPayload = serde_json::from_slice(&json).map_err(|_| "payload json")?;

        let now = self.clock.now().timestamp();

        let exp = claimed.exp.ok_or("missing exp")?;
        if exp <= now {
            return Err("expired");
        }

        let iat = claimed.iat.ok_or("missing iat")?;
        if iat > now + MAX_CLOCK_SKEW_SECS {
            return Err("issued in the future");
        }

        Ok(TokenPayload {
            iat,
            exp,
            nonce: claimed.nonce.unwrap_or_default(),
        })
    }
}

impl std::fmt::Debug for SessionTokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokenCodec")
            .field("secret", &"[REDACTED]")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}
