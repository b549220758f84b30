// ABOUTME: JWKS (JSON Web Key Set) management for asymmetric ID token signing
// ABOUTME: Provides RS256 key generation, PEM import/export, and public key distribution
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kudos Platform

//! RSA key management for ID token signing.
//!
//! - RSA key pair generation for RS256 JWT signing
//! - JWKS JSON format for public key distribution
//! - PEM import for key material provisioned outside the process
//!
//! Private keys never leave the server; verifiers fetch public keys from
//! the JWKS document.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey};
use rsa::{
    pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey},
    RsaPrivateKey, RsaPublicKey,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;

/// RSA key size in bits for RS256 (2048 bits minimum, 4096 bits recommended)
const RSA_KEY_SIZE: usize = 4096;

/// JWK (JSON Web Key) representation for the JWKS document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonWebKey {
    /// Key type (always "RSA" for RS256)
    pub kty: String,
    /// Public key use (always "sig" for signature)
    #[serde(rename = "use")]
    pub key_use: String,
    /// Key ID for rotation tracking
    pub kid: String,
    /// Algorithm (RS256)
    pub alg: String,
    /// RSA modulus (base64url encoded)
    pub n: String,
    /// RSA exponent (base64url encoded)
    pub e: String,
}

/// JWKS (JSON Web Key Set) container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonWebKeySet {
    /// Array of public keys
    pub keys: Vec<JsonWebKey>,
}

/// RSA key pair with metadata
#[derive(Clone)]
pub struct RsaKeyPair {
    /// Unique key identifier
    pub kid: String,
    /// Private key for signing
    pub private_key: RsaPrivateKey,
    /// Public key for verification
    pub public_key: RsaPublicKey,
    /// Key creation timestamp
    pub created_at: DateTime<Utc>,
    /// Whether this is the currently active signing key
    pub is_active: bool,
}

impl RsaKeyPair {
    /// Generate a new RSA key pair with the production key size.
    ///
    /// # Errors
    /// Returns an error if key generation fails.
    pub fn generate(kid: &str) -> Result<Self> {
        Self::generate_with_key_size(kid, RSA_KEY_SIZE)
    }

    /// Generate an RSA key pair with a configurable key size.
    ///
    /// Use 2048 bits for faster test execution, 4096 bits for production
    /// security.
    ///
    /// # Errors
    /// Returns an error if key generation fails.
    pub fn generate_with_key_size(kid: &str, key_size_bits: usize) -> Result<Self> {
        use rand::rngs::OsRng;

        let mut rng = OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, key_size_bits)
            .map_err(|e| anyhow!("failed to generate RSA private key: {e}"))?;

        let public_key = RsaPublicKey::from(&private_key);

        Ok(Self {
            kid: kid.to_owned(),
            private_key,
            public_key,
            created_at: Utc::now(),
            is_active: true,
        })
    }

    /// Import a private key from PKCS#8 PEM.
    ///
    /// # Errors
    /// Returns an error if PEM parsing fails.
    pub fn import_private_key_pem(kid: &str, pem: &str) -> Result<Self> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| anyhow!("failed to parse private key PEM: {e}"))?;

        let public_key = RsaPublicKey::from(&private_key);

        Ok(Self {
            kid: kid.to_owned(),
            private_key,
            public_key,
            created_at: Utc::now(),
            is_active: false,
        })
    }

    /// Export the private key as PKCS#8 PEM.
    ///
    /// # Errors
    /// Returns an error if PEM encoding fails.
    pub fn export_private_key_pem(&self) -> Result<String> {
        self.private_key
            .to_pkcs8_pem(rsa::pkcs8::LineEnding::LF)
            .map(|pem| pem.to_string())
            .map_err(|e| anyhow!("failed to export private key as PEM: {e}"))
    }

    /// Export the public key as SPKI PEM.
    ///
    /// # Errors
    /// Returns an error if PEM encoding fails.
    pub fn export_public_key_pem(&self) -> Result<String> {
        self.public_key
            .to_public_key_pem(rsa::pkcs8::LineEnding::LF)
            .map_err(|e| anyhow!("failed to export public key as PEM: {e}"))
    }

    /// Convert the public key to JWK format.
    ///
    /// # Errors
    /// Returns an error if key serialization fails.
    pub fn to_jwk(&self) -> Result<JsonWebKey> {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        use rsa::traits::PublicKeyParts;

        let n_bytes = self.public_key.n().to_bytes_be();
        let e_bytes = self.public_key.e().to_bytes_be();

        Ok(JsonWebKey {
            kty: "RSA".to_owned(),
            key_use: "sig".to_owned(),
            kid: self.kid.clone(),
            alg: "RS256".to_owned(),
            n: URL_SAFE_NO_PAD.encode(&n_bytes),
            e: URL_SAFE_NO_PAD.encode(&e_bytes),
        })
    }

    /// Get the encoding key for JWT signing.
    ///
    /// # Errors
    /// Returns an error if PEM export or encoding key creation fails.
    pub fn encoding_key(&self) -> Result<EncodingKey> {
        let pem = self.export_private_key_pem()?;
        EncodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| anyhow!("failed to create encoding key: {e}"))
    }

    /// Get the decoding key for JWT verification.
    ///
    /// # Errors
    /// Returns an error if PEM export or decoding key creation fails.
    pub fn decoding_key(&self) -> Result<DecodingKey> {
        let pem = self.export_public_key_pem()?;
        DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| anyhow!("failed to create decoding key: {e}"))
    }
}

/// JWKS manager for signing-key lifecycle management
pub struct JwksManager {
    /// All keys (active and historical)
    keys: HashMap<String, RsaKeyPair>,
    /// Currently active key ID for signing
    active_key_id: Option<String>,
}

impl JwksManager {
    /// Create a new, empty JWKS manager
    #[must_use]
    pub fn new() -> Self {
        Self {
            keys: HashMap::new(),
            active_key_id: None,
        }
    }

    /// Generate and register a new RSA key pair with the production key
    /// size, making it the active signing key.
    ///
    /// # Errors
    /// Returns an error if key generation fails.
    pub fn generate_rsa_key_pair(&mut self, kid: &str) -> Result<()> {
        self.generate_rsa_key_pair_with_size(kid, RSA_KEY_SIZE)
    }

    /// Generate and register an RSA key pair with a configurable key size.
    ///
    /// # Errors
    /// Returns an error if key generation fails.
    pub fn generate_rsa_key_pair_with_size(
        &mut self,
        kid: &str,
        key_size_bits: usize,
    ) -> Result<()> {
        let key_pair = RsaKeyPair::generate_with_key_size(kid, key_size_bits)?;
        self.install_active_key(key_pair);
        Ok(())
    }

    /// Register an existing key pair from PEM, optionally making it active.
    ///
    /// # Errors
    /// Returns an error if key import fails.
    pub fn register_keypair_from_pem(
        &mut self,
        kid: &str,
        private_key_pem: &str,
        is_active: bool,
    ) -> Result<()> {
        let mut key_pair = RsaKeyPair::import_private_key_pem(kid, private_key_pem)?;
        key_pair.is_active = is_active;

        if is_active {
            self.install_active_key(key_pair);
        } else {
            self.keys.insert(kid.to_owned(), key_pair);
        }
        Ok(())
    }

    fn install_active_key(&mut self, key_pair: RsaKeyPair) {
        if let Some(prev_active_kid) = &self.active_key_id {
            if let Some(prev_key) = self.keys.get_mut(prev_active_kid) {
                prev_key.is_active = false;
            }
        }

        self.active_key_id = Some(key_pair.kid.clone());
        self.keys.insert(key_pair.kid.clone(), key_pair);
    }

    /// Get the active signing key.
    ///
    /// # Errors
    /// Returns an error if no active key exists.
    pub fn get_active_key(&self) -> Result<&RsaKeyPair> {
        let kid = self
            .active_key_id
            .as_ref()
            .ok_or_else(|| anyhow!("no active signing key"))?;

        self.keys
            .get(kid)
            .ok_or_else(|| anyhow!("active key not found: {kid}"))
    }

    /// Get a key by ID
    #[must_use]
    pub fn get_key(&self, kid: &str) -> Option<&RsaKeyPair> {
        self.keys.get(kid)
    }

    /// Get the JWKS document for public key distribution.
    ///
    /// # Errors
    /// Returns an error if JWK conversion fails.
    pub fn get_jwks(&self) -> Result<JsonWebKeySet> {
        let mut keys = Vec::new();
        for key_pair in self.keys.values() {
            keys.push(key_pair.to_jwk()?);
        }
        Ok(JsonWebKeySet { keys })
    }

    /// Get the JWKS document as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if JWK serialization fails.
    pub fn get_jwks_json(&self) -> Result<String> {
        let jwks = self.get_jwks()?;
        serde_json::to_string_pretty(&jwks).map_err(|e| anyhow!("failed to serialize JWKS: {e}"))
    }

    /// Sign a claims payload as an RS256 JWT with the active key.
    ///
    /// # Errors
    /// Returns an error if no active key exists or signing fails.
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String> {
        use jsonwebtoken::{encode, Header};

        let active_key = self.get_active_key()?;

        let mut header = Header::new(jsonwebtoken::Algorithm::RS256);
        header.kid = Some(active_key.kid.clone());

        let encoding_key = active_key.encoding_key()?;

        encode(&header, claims, &encoding_key)
            .map_err(|e| anyhow!("failed to encode RS256 JWT: {e}"))
    }

    /// Verify an RS256 JWT against the key named in its header and extract
    /// the claims.
    ///
    /// # Errors
    /// Returns an error if the token is malformed, signed by an unknown
    /// key, or fails validation.
    pub fn verify<T: DeserializeOwned>(
        &self,
        token: &str,
        expected_issuer: &str,
        expected_audience: &str,
    ) -> Result<T> {
        use jsonwebtoken::{decode, decode_header, Validation};

        let header =
            decode_header(token).map_err(|e| anyhow!("failed to decode JWT header: {e}"))?;

        let kid = header.kid.ok_or_else(|| anyhow!("JWT header missing kid"))?;

        let key_pair = self
            .get_key(&kid)
            .ok_or_else(|| anyhow!("unknown key ID: {kid}"))?;

        let decoding_key = key_pair.decoding_key()?;

        let mut validation = Validation::new(jsonwebtoken::Algorithm::RS256);
        validation.set_issuer(&[expected_issuer]);
        validation.set_audience(&[expected_audience]);

        let token_data = decode::<T>(token, &decoding_key, &validation)
            .map_err(|e| anyhow!("failed to verify RS256 JWT: {e}"))?;

        Ok(token_data.claims)
    }
}

impl Default for JwksManager {
    fn default() -> Self {
        Self::new()
    }
}
