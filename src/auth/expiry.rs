//! Access token expiry evaluation.
//!
//! Reads the `exp` claim of a JWT without verifying the signature and without
//! touching the network. Anything that does not decode is treated as "not
//! expiring soon": the server rejects it and the 401 path takes over. The
//! same goes for an `exp` so far out of range that it cannot be compared.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use std::time::Duration;

/// JWT claims for extracting expiration time.
#[derive(Deserialize)]
struct JwtClaims {
    exp: i64,
}

/// Extract the `exp` claim (Unix seconds) from a JWT.
pub fn token_expiration(token: &str) -> Option<i64> {
    let mut parts = token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    // Some issuers pad their segments.
    let payload = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: JwtClaims = serde_json::from_slice(&payload).ok()?;
    Some(claims.exp)
}

/// Check whether `token` expires within `lead_time` of now.
pub fn is_expiring_soon(token: &str, lead_time: Duration) -> bool {
    is_expiring_soon_at(token, lead_time, chrono::Utc::now().timestamp())
}

/// Check whether `token` expires within `lead_time` of `now` (Unix seconds).
pub fn is_expiring_soon_at(token: &str, lead_time: Duration, now: i64) -> bool {
    let lead_secs = i64::try_from(lead_time.as_secs()).unwrap_or(i64::MAX);
    token_expiration(token)
        .and_then(|exp| exp.checked_sub(now))
        .is_some_and(|left| left < lead_secs)
}
