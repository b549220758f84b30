// ABOUTME: Token codec for opaque credentials: secure random generation and hashing
// ABOUTME: Raw values are returned to callers once; only SHA-256 digests are persisted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kudos Platform

use anyhow::{anyhow, Result};
use base64::{engine::general_purpose, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Random bytes in a public client identifier
pub const CLIENT_ID_BYTES: usize = 16;

/// Random bytes in a client secret
pub const CLIENT_SECRET_BYTES: usize = 32;

/// Random bytes in an authorization code
pub const AUTH_CODE_BYTES: usize = 32;

/// Random bytes in an access or refresh token
pub const TOKEN_BYTES: usize = 32;

/// Generate a URL-safe random string of `length` bytes of entropy.
///
/// # Errors
/// Returns an error if the system RNG fails; the server cannot operate
/// securely without working RNG.
pub fn generate_urlsafe_secret(length: usize) -> Result<String> {
    let rng = SystemRandom::new();
    let mut bytes = vec![0u8; length];

    rng.fill(&mut bytes).map_err(|e| {
        tracing::error!("system RNG failed, cannot generate secure random bytes: {e}");
        anyhow!("system RNG failure")
    })?;

    Ok(general_purpose::URL_SAFE_NO_PAD.encode(&bytes))
}

/// Irreversible hash of a raw token or code for storage.
///
/// SHA-256 hex digest; the raw value cannot be re-derived from the stored
/// form.
#[must_use]
pub fn hash_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Compute the S256 PKCE challenge for a verifier (RFC 7636 Section 4.2):
/// URL-safe base64 of the SHA-256 digest, without padding
#[must_use]
pub fn pkce_s256_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    general_purpose::URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Constant-time string equality to prevent timing attacks on secret and
/// challenge comparisons
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
