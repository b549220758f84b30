// ABOUTME: Persistence models for clients, codes, tokens, consents, and statistics
// ABOUTME: Used by the AuthStorage trait for authorization server storage operations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kudos Platform

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// OAuth 2.0 client type (RFC 6749 Section 2.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientType {
    /// Browser or native application that cannot keep a secret; PKCE is
    /// mandatory for these
    Public,
    /// Server-side application holding a `client_secret`
    Confidential,
}

/// Registered OAuth 2.0 client application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthClient {
    /// Public client identifier, used in authorization URLs
    pub client_id: String,
    /// Client secret; present only for confidential clients
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// Whether the client can hold a secret
    pub client_type: ClientType,
    /// Human-readable client name
    pub name: String,
    /// Registered redirect URIs for the authorization code flow
    pub redirect_uris: Vec<String>,
    /// Scopes the client may request
    pub allowed_scopes: Vec<String>,
    /// Grant types the client may use
    pub allowed_grant_types: Vec<String>,
    /// User who registered the client
    pub owner_user_id: Uuid,
    /// Deactivated clients resolve as "not found" everywhere
    pub is_active: bool,
    /// When this client was registered
    pub created_at: DateTime<Utc>,
}

/// Single-use proof of an approved authorization request.
///
/// Codes are stored only as a SHA-256 hash of the raw value, with the same
/// discipline as access and refresh tokens. Rows are never deleted; `used_at`
/// transitions from `None` exactly once.
#[derive(Debug, Clone)]
pub struct AuthorizationCode {
    /// SHA-256 hex digest of the raw code
    pub code_hash: String,
    /// Client the code was issued to
    pub client_id: String,
    /// User who approved the authorization request
    pub user_id: Uuid,
    /// Redirect URI that must match exactly at exchange time
    pub redirect_uri: String,
    /// Scopes approved for this authorization
    pub scope: Vec<String>,
    /// PKCE code challenge (RFC 7636)
    pub code_challenge: Option<String>,
    /// PKCE challenge method (`S256` or `plain`)
    pub code_challenge_method: Option<String>,
    /// When the code was issued
    pub created_at: DateTime<Utc>,
    /// Issuance time plus the configured code TTL
    pub expires_at: DateTime<Utc>,
    /// Set exactly once when the code is exchanged
    pub used_at: Option<DateTime<Utc>>,
}

/// Bearer credential for resource access.
///
/// The raw token is returned to the caller once and never persisted; only
/// the hash is stored.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// Stable identifier of this token row
    pub id: Uuid,
    /// SHA-256 hex digest of the raw token
    pub token_hash: String,
    /// Client the token was issued to
    pub client_id: String,
    /// User the token acts on behalf of
    pub user_id: Uuid,
    /// Granted scopes
    pub scope: Vec<String>,
    /// When the token was issued
    pub created_at: DateTime<Utc>,
    /// Issuance time plus the configured access token TTL
    pub expires_at: DateTime<Utc>,
    /// Set when the token is revoked
    pub revoked_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Whether the token can still be presented at `now`
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

/// Long-lived credential used to mint new access tokens.
///
/// Rotation: every use revokes the presented token and records its
/// replacement in `replaced_by`, so a revoked token with `replaced_by` set
/// is a distinguishable replay signal.
#[derive(Debug, Clone)]
pub struct RefreshToken {
    /// Stable identifier of this token row; `replaced_by` points at it
    pub id: Uuid,
    /// SHA-256 hex digest of the raw token
    pub token_hash: String,
    /// Client the token was issued to
    pub client_id: String,
    /// User the token acts on behalf of
    pub user_id: Uuid,
    /// Granted scopes, carried through rotation
    pub scope: Vec<String>,
    /// When the token was issued
    pub created_at: DateTime<Utc>,
    /// Issuance time plus the configured refresh token TTL
    pub expires_at: DateTime<Utc>,
    /// Set when the token is revoked or rotated
    pub revoked_at: Option<DateTime<Utc>>,
    /// Identifier of the token minted when this one was rotated
    pub replaced_by: Option<Uuid>,
}

/// Record that a user approved a client for a scope set.
///
/// Unique per `(user_id, client_id)` while not revoked; upserted on new
/// consent.
#[derive(Debug, Clone)]
pub struct UserConsent {
    /// User who granted the consent
    pub user_id: Uuid,
    /// Client the consent applies to
    pub client_id: String,
    /// Approved scope set
    pub scope: Vec<String>,
    /// When the consent was last granted or refreshed
    pub granted_at: DateTime<Utc>,
    /// Set when the user withdraws the consent
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Kind of per-client usage event counted in [`ClientStatistics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    /// An authorization request produced a code
    Authorization,
    /// A token grant succeeded
    Token,
}

impl StatKind {
    /// Stable string form used in storage keys and logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Authorization => "authorization",
            Self::Token => "token",
        }
    }
}

/// Per-client, per-day usage counter. Purely observational; counter
/// failures never fail a grant.
#[derive(Debug, Clone)]
pub struct ClientStatistics {
    /// Client the counter belongs to
    pub client_id: String,
    /// Day the events were counted on (UTC)
    pub date: NaiveDate,
    /// Kind of event counted
    pub kind: StatKind,
    /// Number of events observed
    pub count: u64,
}
