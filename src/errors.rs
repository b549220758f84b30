// ABOUTME: Unified error handling for the authorization server core
// ABOUTME: Maps every protocol rejection to an RFC 6749 wire code and HTTP status
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kudos Platform

use thiserror::Error;

/// Transient failure in the persistent store or an external collaborator.
///
/// Kept distinct from [`OAuth2Error`] protocol rejections so that callers can
/// tell "your request was rejected" apart from "try again".
#[derive(Debug, Error)]
pub enum StorageError {
    /// A query against the backing store failed
    #[error("storage query failed: {context}")]
    Query {
        /// Description of the failed operation
        context: String,
    },
    /// The backing store could not be reached
    #[error("storage connection failed: {context}")]
    Connection {
        /// Description of the connectivity failure
        context: String,
    },
}

impl StorageError {
    /// Create a query error from any displayable cause
    pub fn query(context: impl std::fmt::Display) -> Self {
        Self::Query {
            context: context.to_string(),
        }
    }
}

/// Protocol-level rejection of an authorization, token, revocation, or
/// userinfo operation.
///
/// Every variant knows its machine-readable wire code and HTTP status, so an
/// HTTP layer can map failures exhaustively and tests can assert on the kind
/// directly. Validation failures are terminal for the request; there is no
/// retry logic in the core.
#[derive(Debug, Error)]
pub enum OAuth2Error {
    /// `response_type` was anything other than `code`
    #[error("only the 'code' response_type is supported")]
    UnsupportedResponseType,

    /// The client is unknown or deactivated
    #[error("client authentication failed")]
    InvalidClient,

    /// The redirect URI is not in the client's registered set
    #[error("redirect_uri is not registered for this client")]
    InvalidRedirectUri,

    /// A requested scope is outside the client's allowed set
    #[error("scope '{0}' is not allowed for this client")]
    InvalidScope(String),

    /// A public client omitted the PKCE code challenge
    #[error("code_challenge is required for public clients")]
    CodeChallengeRequired,

    /// The PKCE challenge method is neither `S256` nor `plain`
    #[error("code_challenge_method must be 'S256' or 'plain'")]
    InvalidCodeChallengeMethod,

    /// The authorization code is unknown, already used, or scoped to a
    /// different client
    #[error("invalid authorization code")]
    InvalidAuthorizationCode,

    /// The authorization code's expiry has passed
    #[error("authorization code expired")]
    AuthorizationCodeExpired,

    /// The redirect URI presented at exchange does not equal the one the
    /// code was issued for
    #[error("redirect_uri does not match the authorization request")]
    RedirectUriMismatch,

    /// Missing or wrong `client_secret` for a confidential client
    #[error("invalid client credentials")]
    InvalidClientCredentials,

    /// The PKCE verifier is missing, malformed, or does not match the
    /// stored challenge
    #[error("invalid code verifier")]
    InvalidCodeVerifier,

    /// The refresh token is unknown, revoked, rotated, or scoped to a
    /// different client
    #[error("invalid refresh token")]
    InvalidRefreshToken,

    /// The refresh token's expiry has passed
    #[error("refresh token expired")]
    RefreshTokenExpired,

    /// The bearer access token is unknown, revoked, or expired
    #[error("invalid access token")]
    InvalidAccessToken,

    /// `grant_type` was not one of the supported grants
    #[error("grant type is not supported")]
    UnsupportedGrantType,

    /// A required request parameter was absent
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// The persistent store or an external collaborator failed
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Internal failure (RNG, signing) that prevents secure operation
    #[error("internal error: {0}")]
    Internal(String),
}

impl OAuth2Error {
    /// The short machine-readable error code surfaced to callers.
    ///
    /// The `invalid_grant` family (expired/used/mismatched codes and refresh
    /// tokens, verifier mismatch) collapses to a single wire code per
    /// RFC 6749 Section 5.2; the variants stay distinct for logging and
    /// tests.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedResponseType => "unsupported_response_type",
            Self::InvalidClient | Self::InvalidClientCredentials => "invalid_client",
            Self::InvalidRedirectUri => "invalid_redirect_uri",
            Self::InvalidScope(_) => "invalid_scope",
            Self::CodeChallengeRequired => "code_challenge_required",
            Self::InvalidCodeChallengeMethod | Self::MissingParameter(_) => "invalid_request",
            Self::InvalidAuthorizationCode
            | Self::AuthorizationCodeExpired
            | Self::RedirectUriMismatch
            | Self::InvalidCodeVerifier
            | Self::InvalidRefreshToken
            | Self::RefreshTokenExpired => "invalid_grant",
            Self::InvalidAccessToken => "invalid_token",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::Storage(_) | Self::Internal(_) => "server_error",
        }
    }

    /// The HTTP status an HTTP layer should return for this rejection
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::UnsupportedResponseType
            | Self::InvalidRedirectUri
            | Self::InvalidScope(_)
            | Self::CodeChallengeRequired
            | Self::InvalidCodeChallengeMethod
            | Self::InvalidAuthorizationCode
            | Self::AuthorizationCodeExpired
            | Self::RedirectUriMismatch
            | Self::InvalidCodeVerifier
            | Self::InvalidRefreshToken
            | Self::RefreshTokenExpired
            | Self::UnsupportedGrantType
            | Self::MissingParameter(_) => 400,

            Self::InvalidClient | Self::InvalidClientCredentials | Self::InvalidAccessToken => 401,

            Self::Storage(_) | Self::Internal(_) => 500,
        }
    }

    /// Whether this failure is transient (storage/internal) rather than a
    /// protocol rejection of the request itself
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Internal(_))
    }
}
