//! `X-Signature-256` checks for requests posted by the chat relay.
//!
//! The header carries `sha256=<hex>` where the digest is an HMAC-SHA256 of the
//! raw request body keyed with `notify.command_secret`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

const SCHEME: &str = "sha256=";

fn keyed(secret: &str, payload: &[u8]) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::CommandVerification(format!("Unusable command secret: {e}")))?;
    mac.update(payload);
    Ok(mac)
}

fn decode_header(header: &str) -> Result<Vec<u8>> {
    let digest = header.trim().strip_prefix(SCHEME).ok_or_else(|| {
        AppError::CommandVerification(format!("Signature must start with {SCHEME}"))
    })?;
    hex::decode(digest)
        .map_err(|e| AppError::CommandVerification(format!("Signature is not hex: {e}")))
}

/// Check `header` against the body. Comparison is constant time.
pub fn verify_signature(secret: &str, payload: &[u8], header: &str) -> Result<()> {
    let expected = decode_header(header)?;
    keyed(secret, payload)?
        .verify_slice(&expected)
        .map_err(|_| AppError::CommandVerification("Signature does not match body".to_string()))
}

/// Header value a relay must send for `payload`.
pub fn sign(secret: &str, payload: &[u8]) -> Result<String> {
    let digest = keyed(secret, payload)?.finalize().into_bytes();
    Ok(format!("{SCHEME}{}", hex::encode(digest)))
}
