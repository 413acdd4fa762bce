use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::{Map, Value};

/// Claims read from the payload segment of a bearer token.
///
/// The signature is never checked. These values identify the user for display
/// and for naming the collection; the server stays the only authority.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Claims {
    pub sub: Option<String>,
    pub email: Option<String>,
    /// Expiry as seconds since the Unix epoch.
    pub exp: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("token must have three dot-separated segments")]
    Segments,
    #[error("payload is not base64url: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload is not a JSON object")]
    NotAnObject,
}

/// Parse the claims out of a `header.payload.signature` token.
pub fn try_decode_claims(token: &str) -> Result<Claims, DecodeError> {
    let mut segments = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(DecodeError::Segments);
    };

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    let value: Value = serde_json::from_slice(&bytes)?;
    let object = value.as_object().ok_or(DecodeError::NotAnObject)?;

    Ok(Claims {
        sub: text_claim(object, "sub"),
        email: text_claim(object, "email"),
        exp: object
            .get("exp")
            .and_then(Value::as_f64)
            .map(|exp| exp.floor() as i64),
    })
}

/// Best-effort variant of [`try_decode_claims`]: malformed tokens yield `None`.
pub fn decode_claims(token: &str) -> Option<Claims> {
    try_decode_claims(token).ok()
}

fn text_claim(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

/// The client's belief about who is logged in.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: Option<String>,
    pub token: String,
    pub expires_at: Option<i64>,
}

impl Session {
    /// Builds a session from a bearer token, or `None` when the token has no
    /// usable subject claim.
    pub fn from_token(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let claims = decode_claims(&token)?;
        let user_id = claims.sub?;
        Some(Self {
            user_id,
            email: claims.email,
            token,
            expires_at: claims.exp,
        })
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("token", &format_args!("<{} chars>", self.token.len()))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
