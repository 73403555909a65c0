// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook signature verification.
//!
//! The provider signs `"{timestamp}.{raw body}"` with HMAC-SHA256 under a
//! shared secret and sends `t=<unix>,v1=<hex>` in the signature header.
//! Verification requires the byte-exact payload; any parsing happens only
//! after the signature checks out. Timestamps outside the tolerance
//! window are rejected to blunt replay.

use banter_core::BanterError;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted clock skew between the signed timestamp and now.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Verify a signature header against the raw payload bytes.
pub fn verify(secret: &str, header: &str, payload: &[u8]) -> Result<(), BanterError> {
    verify_at(secret, header, payload, Utc::now())
}

/// Verification with an explicit "now", for deterministic tests.
pub fn verify_at(
    secret: &str,
    header: &str,
    payload: &[u8],
    now: DateTime<Utc>,
) -> Result<(), BanterError> {
    let (timestamp, signature_hex) = parse_header(header)?;

    let skew = (now.timestamp() - timestamp).abs();
    if skew > SIGNATURE_TOLERANCE_SECS {
        return Err(BanterError::Signature(format!(
            "timestamp outside tolerance ({skew}s skew)"
        )));
    }

    let signature = hex::decode(signature_hex)
        .map_err(|_| BanterError::Signature("v1 value is not valid hex".to_string()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| BanterError::Internal(format!("invalid webhook secret: {e}")))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    // Constant-time comparison via the Mac verifier.
    mac.verify_slice(&signature)
        .map_err(|_| BanterError::Signature("signature mismatch".to_string()))
}

/// Compute the signature header for a payload. Used by tests and local
/// delivery tooling.
pub fn sign(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("t={timestamp},v1={signature}")
}

/// Split a `t=...,v1=...` header into its timestamp and signature parts.
fn parse_header(header: &str) -> Result<(i64, &str), BanterError> {
    let mut timestamp = None;
    let mut signature = None;

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = Some(value.parse::<i64>().map_err(|_| {
                    BanterError::Signature("t value is not a unix timestamp".to_string())
                })?);
            }
            Some(("v1", value)) => signature = Some(value),
            _ => {} // unknown scheme elements are ignored
        }
    }

    match (timestamp, signature) {
        (Some(t), Some(v1)) => Ok((t, v1)),
        _ => Err(BanterError::Signature(
            "header missing t= or v1= element".to_string(),
        )),
    }
}
