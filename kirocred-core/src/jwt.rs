//! Unsigned JWT payload decoding.
//!
//! Only the claims segment is decoded; signatures are never checked. The
//! result is used for display-level hints such as the account email and must
//! not be trusted for authorization decisions.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::Value;

/// Decodes the payload of a token-shaped string.
///
/// Implementations return `None` for anything they cannot decode; callers
/// treat that as "no claims available".
pub trait PayloadDecoder: Send + Sync {
    /// Decode the claims object carried by `token`.
    fn decode_payload(&self, token: &str) -> Option<Value>;
}

/// Decodes the middle segment of a compact JWS (`header.payload.signature`)
/// without verifying the signature.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnverifiedJwt;

impl PayloadDecoder for UnverifiedJwt {
    fn decode_payload(&self, token: &str) -> Option<Value> {
        let mut segments = token.split('.');
        let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);
        if segments.next().is_some() {
            return None;
        }

        let decoded = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
        let claims: Value = serde_json::from_slice(&decoded).ok()?;
        claims.is_object().then_some(claims)
    }
}

/// Pick an email address out of decoded claims.
///
/// Prefers `email`, then `preferred_username` or `sub` when they look like
/// an address.
pub fn email_from_claims(claims: &Value) -> Option<String> {
    let claim = |name: &str| {
        claims
            .get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    claim("email")
        .or_else(|| claim("preferred_username").filter(|s| s.contains('@')))
        .or_else(|| claim("sub").filter(|s| s.contains('@')))
        .map(String::from)
}

/// Best-effort email extraction from an access token.
pub fn extract_email(decoder: &dyn PayloadDecoder, token: &str) -> Option<String> {
    decoder
        .decode_payload(token)
        .as_ref()
        .and_then(email_from_claims)
}

#[cfg(test)]
pub(crate) fn encode_test_token(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}
