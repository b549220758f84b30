// ABOUTME: Identity claims assembly gated by scope, and RS256 ID token minting
// ABOUTME: Claims come from the identity store; tokens are signed with the active JWKS key
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kudos Platform

use super::models::{IdTokenClaims, IdentityClaims};
use crate::config::AuthServerConfig;
use crate::crypto::jwks::JwksManager;
use crate::errors::OAuth2Error;
use crate::identity::IdentityProvider;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Builds scope-gated identity claims and mints signed ID tokens
#[derive(Clone)]
pub struct IdentityClaimsAssembler {
    identity: Arc<dyn IdentityProvider>,
    jwks: Arc<JwksManager>,
    config: Arc<AuthServerConfig>,
}

impl IdentityClaimsAssembler {
    /// Create an assembler over the given identity store and signing keys
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        jwks: Arc<JwksManager>,
        config: Arc<AuthServerConfig>,
    ) -> Self {
        Self {
            identity,
            jwks,
            config,
        }
    }

    /// Assemble identity claims for a user, gated by scope.
    ///
    /// `sub` is always present. `profile` adds display name, username, and
    /// avatar; `email` adds the address and its verification flag. A user
    /// unknown to the identity store still yields the bare `sub` claim.
    ///
    /// # Errors
    /// Returns `Storage` if the identity store fails.
    pub async fn build_claims(
        &self,
        user_id: Uuid,
        scope: &[String],
    ) -> Result<IdentityClaims, OAuth2Error> {
        let mut claims = IdentityClaims {
            sub: user_id.to_string(),
            ..IdentityClaims::default()
        };

        let wants_profile = scope.iter().any(|s| s == "profile");
        let wants_email = scope.iter().any(|s| s == "email");
        if !wants_profile && !wants_email {
            return Ok(claims);
        }

        if let Some(identity) = self.identity.get_identity(user_id).await? {
            if wants_profile {
                claims.name = Some(identity.display_name);
                claims.preferred_username = Some(identity.username);
                claims.picture = identity.avatar_url;
            }
            if wants_email {
                claims.email = Some(identity.email);
                claims.email_verified = Some(identity.email_verified);
            }
        } else {
            tracing::warn!(user_id = %user_id, "identity store has no record for claims assembly");
        }

        Ok(claims)
    }

    /// Mint a signed ID token for a user/client pair.
    ///
    /// The payload carries `{iss, sub, aud, iat, exp}` plus the scope-gated
    /// claims; the validity window equals the access token's.
    ///
    /// # Errors
    /// Returns `Storage` if the identity store fails or `Internal` if
    /// signing fails.
    pub async fn mint_id_token(
        &self,
        user_id: Uuid,
        client_id: &str,
        scope: &[String],
    ) -> Result<String, OAuth2Error> {
        let claims = self.build_claims(user_id, scope).await?;

        let iat = Utc::now().timestamp();
        let payload = IdTokenClaims {
            iss: self.config.issuer.clone(),
            aud: client_id.to_owned(),
            iat,
            exp: iat + self.config.id_token_ttl.num_seconds(),
            claims,
        };

        self.jwks.sign(&payload).map_err(|e| {
            tracing::error!(client_id = %client_id, "failed to sign ID token: {e:#}");
            OAuth2Error::Internal("ID token signing failed".to_owned())
        })
    }
}
