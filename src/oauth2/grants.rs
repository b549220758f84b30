// ABOUTME: Token grant handling: authorization code exchange and refresh token rotation
// ABOUTME: Single-use and rotation guarantees come from conditional updates in the store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kudos Platform

use super::claims::IdentityClaimsAssembler;
use super::models::{join_scope, TokenRequest, TokenResponse};
use super::registry::ClientRegistry;
use super::revocation::RevocationManager;
use crate::config::AuthServerConfig;
use crate::crypto::tokens::{
    constant_time_eq, generate_urlsafe_secret, hash_token, pkce_s256_challenge, TOKEN_BYTES,
};
use crate::errors::OAuth2Error;
use crate::models::{
    AccessToken, AuthorizationCode, ClientType, OAuthClient, RefreshToken, StatKind,
};
use crate::storage::AuthStorage;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Freshly minted token pair; raw values leave the process exactly once
struct IssuedTokens {
    access_token: String,
    refresh_token: String,
    refresh_token_id: Uuid,
    expires_in: i64,
}

/// Handles `POST /token` for both supported grant types
#[derive(Clone)]
pub struct TokenGrantHandler {
    storage: Arc<dyn AuthStorage>,
    registry: ClientRegistry,
    claims: IdentityClaimsAssembler,
    revocation: RevocationManager,
    config: Arc<AuthServerConfig>,
}

impl TokenGrantHandler {
    /// Create a grant handler over the given collaborators
    #[must_use]
    pub fn new(
        storage: Arc<dyn AuthStorage>,
        registry: ClientRegistry,
        claims: IdentityClaimsAssembler,
        revocation: RevocationManager,
        config: Arc<AuthServerConfig>,
    ) -> Self {
        Self {
            storage,
            registry,
            claims,
            revocation,
            config,
        }
    }

    /// Dispatch a token request by grant type.
    ///
    /// # Errors
    /// Returns the grant-specific [`OAuth2Error`] kind on any validation
    /// failure; failures are terminal for the request.
    pub async fn token(&self, request: TokenRequest) -> Result<TokenResponse, OAuth2Error> {
        match request.grant_type.as_str() {
            "authorization_code" => self.handle_authorization_code_grant(request).await,
            "refresh_token" => self.handle_refresh_token_grant(request).await,
            _ => Err(OAuth2Error::UnsupportedGrantType),
        }
    }

    /// Exchange a single-use authorization code for a token pair
    async fn handle_authorization_code_grant(
        &self,
        request: TokenRequest,
    ) -> Result<TokenResponse, OAuth2Error> {
        let code = request.code.ok_or(OAuth2Error::MissingParameter("code"))?;
        let redirect_uri = request
            .redirect_uri
            .ok_or(OAuth2Error::MissingParameter("redirect_uri"))?;

        let code_hash = hash_token(&code);
        let auth_code = self
            .storage
            .get_auth_code(&code_hash, &request.client_id)
            .await?
            .filter(|stored| stored.used_at.is_none())
            .ok_or(OAuth2Error::InvalidAuthorizationCode)?;

        let now = Utc::now();
        if auth_code.expires_at <= now {
            return Err(OAuth2Error::AuthorizationCodeExpired);
        }

        if auth_code.redirect_uri != redirect_uri {
            return Err(OAuth2Error::RedirectUriMismatch);
        }

        let client = self
            .registry
            .get_client(&request.client_id)
            .await?
            .ok_or(OAuth2Error::InvalidClient)?;

        Self::verify_client_secret(&client, request.client_secret.as_deref())?;
        Self::verify_code_challenge(&auth_code, request.code_verifier.as_deref())?;

        // Conditional update guarded on `used_at IS NULL`: of two racing
        // exchanges of the same code, exactly one reaches this point and
        // wins; the loser observes "already used".
        if !self.storage.mark_auth_code_used(&code_hash, now).await? {
            tracing::warn!(
                client_id = %request.client_id,
                "authorization code consumed by a concurrent exchange"
            );
            return Err(OAuth2Error::InvalidAuthorizationCode);
        }

        let issued = self
            .issue_token_pair(&client.client_id, auth_code.user_id, &auth_code.scope)
            .await?;

        let id_token = self
            .maybe_mint_id_token(&auth_code.scope, auth_code.user_id, &client.client_id)
            .await?;

        self.revocation
            .record_event(&client.client_id, StatKind::Token)
            .await;

        tracing::info!(
            client_id = %client.client_id,
            user_id = %auth_code.user_id,
            "authorization code exchanged for tokens"
        );

        Ok(TokenResponse {
            access_token: issued.access_token,
            token_type: "Bearer".to_owned(),
            expires_in: issued.expires_in,
            refresh_token: issued.refresh_token,
            scope: join_scope(&auth_code.scope),
            id_token,
        })
    }

    /// Rotate a refresh token into a new token pair
    async fn handle_refresh_token_grant(
        &self,
        request: TokenRequest,
    ) -> Result<TokenResponse, OAuth2Error> {
        let presented = request
            .refresh_token
            .ok_or(OAuth2Error::MissingParameter("refresh_token"))?;

        let token_hash = hash_token(&presented);
        let stored = self
            .storage
            .get_refresh_token(&token_hash, &request.client_id)
            .await?
            .ok_or(OAuth2Error::InvalidRefreshToken)?;

        if stored.revoked_at.is_some() {
            // A revoked token with a rotation successor means the token was
            // already exchanged once: a reuse/replay signal rather than
            // ordinary revocation.
            if stored.replaced_by.is_some() {
                tracing::warn!(
                    client_id = %request.client_id,
                    user_id = %stored.user_id,
                    "rotated refresh token presented again; possible replay"
                );
            }
            return Err(OAuth2Error::InvalidRefreshToken);
        }

        let now = Utc::now();
        if stored.expires_at <= now {
            return Err(OAuth2Error::RefreshTokenExpired);
        }

        let client = self
            .registry
            .get_client(&request.client_id)
            .await?
            .ok_or(OAuth2Error::InvalidClient)?;

        Self::verify_client_secret(&client, request.client_secret.as_deref())?;

        // Rotation, not plain reuse: the conditional revoke is the atomic
        // step that lets only one of two concurrent presentations proceed.
        if !self.storage.revoke_refresh_token(&token_hash, now).await? {
            tracing::warn!(
                client_id = %request.client_id,
                "refresh token rotated by a concurrent request"
            );
            return Err(OAuth2Error::InvalidRefreshToken);
        }

        let issued = self
            .issue_token_pair(&client.client_id, stored.user_id, &stored.scope)
            .await?;

        // Revoke-then-replace-pointer ordering: the successor link is what
        // distinguishes a replayed rotation from an outright revocation.
        self.storage
            .set_refresh_token_replaced_by(&token_hash, issued.refresh_token_id)
            .await?;

        let id_token = self
            .maybe_mint_id_token(&stored.scope, stored.user_id, &client.client_id)
            .await?;

        self.revocation
            .record_event(&client.client_id, StatKind::Token)
            .await;

        tracing::info!(
            client_id = %client.client_id,
            user_id = %stored.user_id,
            "refresh token rotated"
        );

        Ok(TokenResponse {
            access_token: issued.access_token,
            token_type: "Bearer".to_owned(),
            expires_in: issued.expires_in,
            refresh_token: issued.refresh_token,
            scope: join_scope(&stored.scope),
            id_token,
        })
    }

    /// Confidential clients must present their exact stored secret;
    /// public clients have none and skip the check
    fn verify_client_secret(
        client: &OAuthClient,
        presented: Option<&str>,
    ) -> Result<(), OAuth2Error> {
        match client.client_type {
            ClientType::Public => Ok(()),
            ClientType::Confidential => {
                let stored = client
                    .client_secret
                    .as_deref()
                    .ok_or(OAuth2Error::InvalidClientCredentials)?;
                let presented = presented.ok_or(OAuth2Error::InvalidClientCredentials)?;

                if constant_time_eq(stored, presented) {
                    Ok(())
                } else {
                    tracing::warn!(
                        client_id = %client.client_id,
                        "client secret validation failed"
                    );
                    Err(OAuth2Error::InvalidClientCredentials)
                }
            }
        }
    }

    /// Verify the PKCE verifier against the challenge stored on the code
    /// (RFC 7636)
    fn verify_code_challenge(
        auth_code: &AuthorizationCode,
        code_verifier: Option<&str>,
    ) -> Result<(), OAuth2Error> {
        let Some(stored_challenge) = auth_code.code_challenge.as_deref() else {
            // A verifier without a stored challenge is a protocol error
            if code_verifier.is_some() {
                return Err(OAuth2Error::InvalidCodeVerifier);
            }
            return Ok(());
        };

        let verifier = code_verifier.ok_or(OAuth2Error::InvalidCodeVerifier)?;

        // Verifier format per RFC 7636 Section 4.1: 43-128 unreserved chars
        if verifier.len() < 43 || verifier.len() > 128 {
            return Err(OAuth2Error::InvalidCodeVerifier);
        }
        if !verifier
            .chars()
            .all(|c| matches!(c, 'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '.' | '_' | '~'))
        {
            return Err(OAuth2Error::InvalidCodeVerifier);
        }

        let method = auth_code.code_challenge_method.as_deref().unwrap_or("S256");
        let computed = match method {
            "S256" => pkce_s256_challenge(verifier),
            "plain" => verifier.to_owned(),
            _ => return Err(OAuth2Error::InvalidCodeVerifier),
        };

        if constant_time_eq(&computed, stored_challenge) {
            Ok(())
        } else {
            tracing::warn!(
                client_id = %auth_code.client_id,
                "PKCE verification failed: code_verifier does not match code_challenge"
            );
            Err(OAuth2Error::InvalidCodeVerifier)
        }
    }

    /// Mint and persist an access/refresh token pair; only hashes reach
    /// the store
    async fn issue_token_pair(
        &self,
        client_id: &str,
        user_id: Uuid,
        scope: &[String],
    ) -> Result<IssuedTokens, OAuth2Error> {
        let raw_access = generate_urlsafe_secret(TOKEN_BYTES)
            .map_err(|e| OAuth2Error::Internal(e.to_string()))?;
        let raw_refresh = generate_urlsafe_secret(TOKEN_BYTES)
            .map_err(|e| OAuth2Error::Internal(e.to_string()))?;

        let now = Utc::now();

        let access = AccessToken {
            id: Uuid::new_v4(),
            token_hash: hash_token(&raw_access),
            client_id: client_id.to_owned(),
            user_id,
            scope: scope.to_vec(),
            created_at: now,
            expires_at: now + self.config.access_token_ttl,
            revoked_at: None,
        };
        self.storage.store_access_token(&access).await?;

        let refresh = RefreshToken {
            id: Uuid::new_v4(),
            token_hash: hash_token(&raw_refresh),
            client_id: client_id.to_owned(),
            user_id,
            scope: scope.to_vec(),
            created_at: now,
            expires_at: now + self.config.refresh_token_ttl,
            revoked_at: None,
            replaced_by: None,
        };
        self.storage.store_refresh_token(&refresh).await?;

        Ok(IssuedTokens {
            access_token: raw_access,
            refresh_token: raw_refresh,
            refresh_token_id: refresh.id,
            expires_in: self.config.access_token_ttl.num_seconds(),
        })
    }

    /// Mint an ID token when the grant carries the `openid` scope
    async fn maybe_mint_id_token(
        &self,
        scope: &[String],
        user_id: Uuid,
        client_id: &str,
    ) -> Result<Option<String>, OAuth2Error> {
        if scope.iter().any(|s| s == "openid") {
            Ok(Some(
                self.claims.mint_id_token(user_id, client_id, scope).await?,
            ))
        } else {
            Ok(None)
        }
    }
}
