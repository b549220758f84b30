// ABOUTME: OAuth 2.0 wire types for authorization, token, revocation, and userinfo operations
// ABOUTME: Serde request/response structures with explicit field optionality
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kudos Platform

use crate::errors::OAuth2Error;
use crate::models::ClientType;
use serde::{Deserialize, Serialize};

/// OAuth 2.0 authorization request (`GET /authorize` query parameters)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizeRequest {
    /// Response type; only `code` is supported
    pub response_type: String,
    /// Client identifier
    pub client_id: String,
    /// Redirect URI for the response
    pub redirect_uri: String,
    /// Requested scopes, space-delimited
    pub scope: Option<String>,
    /// Client state echoed back for CSRF protection
    pub state: Option<String>,
    /// PKCE code challenge (RFC 7636)
    pub code_challenge: Option<String>,
    /// PKCE code challenge method (`S256` or `plain`)
    pub code_challenge_method: Option<String>,
}

/// OAuth 2.0 authorization response: the code to embed in the redirect
#[derive(Debug, Serialize)]
pub struct AuthorizeResponse {
    /// Single-use authorization code
    pub code: String,
    /// State parameter from the request, echoed unchanged
    pub state: Option<String>,
}

/// OAuth 2.0 token request (`POST /token` form body)
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    /// Grant type (`authorization_code` or `refresh_token`)
    pub grant_type: String,
    /// Authorization code (code grant only)
    pub code: Option<String>,
    /// Redirect URI; must equal the one the code was issued for
    pub redirect_uri: Option<String>,
    /// Client identifier
    pub client_id: String,
    /// Client secret; required for confidential clients, absent for public
    /// clients
    pub client_secret: Option<String>,
    /// Refresh token (refresh grant only)
    pub refresh_token: Option<String>,
    /// PKCE code verifier (code grant with a stored challenge)
    pub code_verifier: Option<String>,
}

/// OAuth 2.0 token response
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// Opaque bearer access token; returned once, stored only as a hash
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    /// Rotating refresh token
    pub refresh_token: String,
    /// Granted scopes, space-delimited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Signed ID token, present when the `openid` scope was granted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

/// Token revocation request (`POST /revoke`, RFC 7009)
#[derive(Debug, Deserialize)]
pub struct RevokeRequest {
    /// Raw token to revoke
    pub token: String,
    /// Caller's hint: `access_token` or `refresh_token`
    pub token_type_hint: Option<String>,
}

/// Client registration request
#[derive(Debug, Deserialize)]
pub struct ClientRegistrationRequest {
    /// Human-readable client name
    pub client_name: String,
    /// Whether the client can hold a secret
    pub client_type: ClientType,
    /// Redirect URIs for the authorization code flow
    pub redirect_uris: Vec<String>,
    /// Requested allowed scopes, space-delimited; defaults to
    /// `openid profile email`
    pub scope: Option<String>,
}

/// Scope-gated identity claims for ID tokens and the userinfo operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Subject: the authorizing user's identifier
    pub sub: String,
    /// Display name (`profile` scope)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Login name (`profile` scope)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    /// Avatar reference (`profile` scope)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Email address (`email` scope)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Whether the identity provider verified the address (`email` scope)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
}

/// Signed ID token payload
#[derive(Debug, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// Issuer identifier of this authorization server
    pub iss: String,
    /// Client the token is intended for
    pub aud: String,
    /// Issued-at, seconds since the epoch
    pub iat: i64,
    /// Expiry, seconds since the epoch; `iat` plus the ID token TTL
    pub exp: i64,
    /// Scope-gated identity claims, including `sub`
    #[serde(flatten)]
    pub claims: IdentityClaims,
}

/// OAuth 2.0 error response body
#[derive(Debug, Serialize)]
pub struct OAuth2ErrorResponse {
    /// Machine-readable error code
    pub error: String,
    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl From<&OAuth2Error> for OAuth2ErrorResponse {
    fn from(error: &OAuth2Error) -> Self {
        Self {
            error: error.error_code().to_owned(),
            // Transient failures surface only their generic code, never
            // internal details
            error_description: if error.is_transient() {
                None
            } else {
                Some(error.to_string())
            },
        }
    }
}

/// Parse a space-delimited scope string into a deduplicated set,
/// preserving request order
#[must_use]
pub fn parse_scope(raw: Option<&str>) -> Vec<String> {
    let mut scopes: Vec<String> = Vec::new();
    for token in raw.unwrap_or_default().split_whitespace() {
        if !scopes.iter().any(|s| s == token) {
            scopes.push(token.to_owned());
        }
    }
    scopes
}

/// Join a scope set back into the space-delimited wire form; `None` when
/// empty
#[must_use]
pub fn join_scope(scope: &[String]) -> Option<String> {
    if scope.is_empty() {
        None
    } else {
        Some(scope.join(" "))
    }
}
