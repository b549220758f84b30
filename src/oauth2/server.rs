// ABOUTME: Authorization server facade wiring registry, validator, codes, grants, and consent
// ABOUTME: Exposes the four logical operations an HTTP layer maps to the standard endpoints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kudos Platform

use super::claims::IdentityClaimsAssembler;
use super::codes::{AuthorizationCodeManager, IssueCodeParams};
use super::consent::ConsentManager;
use super::grants::TokenGrantHandler;
use super::models::{
    AuthorizeRequest, AuthorizeResponse, ClientRegistrationRequest, IdentityClaims, RevokeRequest,
    TokenRequest, TokenResponse,
};
use super::registry::ClientRegistry;
use super::revocation::RevocationManager;
use super::validation::AuthorizationRequestValidator;
use crate::config::AuthServerConfig;
use crate::crypto::jwks::{JsonWebKeySet, JwksManager};
use crate::crypto::tokens::hash_token;
use crate::errors::OAuth2Error;
use crate::identity::IdentityProvider;
use crate::models::{OAuthClient, StatKind};
use crate::storage::AuthStorage;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// OAuth 2.0 authorization server.
///
/// Constructed explicitly with its collaborators (store, identity provider,
/// signing keys, configuration) and passed to request handlers; there is no
/// process-wide singleton, so tests can run against isolated store
/// instances.
pub struct AuthorizationServer {
    registry: ClientRegistry,
    validator: AuthorizationRequestValidator,
    codes: AuthorizationCodeManager,
    grants: TokenGrantHandler,
    consent: ConsentManager,
    claims: IdentityClaimsAssembler,
    revocation: RevocationManager,
    jwks: Arc<JwksManager>,
    storage: Arc<dyn AuthStorage>,
}

impl AuthorizationServer {
    /// Wire up an authorization server from its collaborators
    #[must_use]
    pub fn new(
        storage: Arc<dyn AuthStorage>,
        identity: Arc<dyn IdentityProvider>,
        jwks: Arc<JwksManager>,
        config: Arc<AuthServerConfig>,
    ) -> Self {
        let registry = ClientRegistry::new(storage.clone());
        let validator = AuthorizationRequestValidator::new(registry.clone());
        let codes = AuthorizationCodeManager::new(storage.clone(), config.clone());
        let claims = IdentityClaimsAssembler::new(identity, jwks.clone(), config.clone());
        let revocation = RevocationManager::new(storage.clone());
        let grants = TokenGrantHandler::new(
            storage.clone(),
            registry.clone(),
            claims.clone(),
            revocation.clone(),
            config,
        );

        Self {
            registry,
            validator,
            codes,
            grants,
            consent: ConsentManager::new(storage.clone()),
            claims,
            revocation,
            jwks,
            storage,
        }
    }

    /// Handle an authorization request for an authenticated, approving
    /// user (`GET /authorize`).
    ///
    /// The embedding endpoint authenticates the user and decides approval
    /// (directly or via [`Self::has_consented`]) before calling this; on
    /// success the returned code and echoed state go into the redirect.
    ///
    /// # Errors
    /// Returns the first failing validation's [`OAuth2Error`] kind.
    pub async fn authorize(
        &self,
        request: AuthorizeRequest,
        user_id: Uuid,
    ) -> Result<AuthorizeResponse, OAuth2Error> {
        let validated = self.validator.validate(&request).await?;

        let code = self
            .codes
            .issue(IssueCodeParams {
                client_id: &validated.client.client_id,
                user_id,
                redirect_uri: &request.redirect_uri,
                scope: &validated.scope,
                code_challenge: request.code_challenge.as_deref(),
                code_challenge_method: request.code_challenge_method.as_deref(),
            })
            .await?;

        self.revocation
            .record_event(&validated.client.client_id, StatKind::Authorization)
            .await;

        Ok(AuthorizeResponse {
            code,
            state: request.state,
        })
    }

    /// Handle a token request (`POST /token`).
    ///
    /// # Errors
    /// Returns the grant-specific [`OAuth2Error`] kind on any failure.
    pub async fn token(&self, request: TokenRequest) -> Result<TokenResponse, OAuth2Error> {
        self.grants.token(request).await
    }

    /// Handle a revocation request (`POST /revoke`).
    ///
    /// Succeeds regardless of whether the token existed (RFC 7009).
    ///
    /// # Errors
    /// Returns `Storage` only if the store fails.
    pub async fn revoke(&self, request: RevokeRequest) -> Result<(), OAuth2Error> {
        self.revocation
            .revoke(&request.token, request.token_type_hint.as_deref())
            .await
            .map_err(Into::into)
    }

    /// Handle a userinfo request (`GET /userinfo`) for a bearer access
    /// token.
    ///
    /// # Errors
    /// Returns `InvalidAccessToken` for unknown, revoked, or expired
    /// tokens.
    pub async fn userinfo(&self, bearer_token: &str) -> Result<IdentityClaims, OAuth2Error> {
        let token = self
            .storage
            .get_access_token(&hash_token(bearer_token))
            .await?
            .ok_or(OAuth2Error::InvalidAccessToken)?;

        if !token.is_live(Utc::now()) {
            return Err(OAuth2Error::InvalidAccessToken);
        }

        self.claims.build_claims(token.user_id, &token.scope).await
    }

    /// Register a new client on behalf of `owner_user_id`.
    ///
    /// # Errors
    /// Returns an error for invalid redirect URIs or store failures.
    pub async fn register_client(
        &self,
        owner_user_id: Uuid,
        request: ClientRegistrationRequest,
    ) -> Result<OAuthClient, OAuth2Error> {
        self.registry.create_client(owner_user_id, request).await
    }

    /// Whether a prior non-revoked consent covers `requested_scopes`; used
    /// by the embedding authorization endpoint to skip the consent prompt.
    ///
    /// # Errors
    /// Returns `Storage` if the store fails.
    pub async fn has_consented(
        &self,
        user_id: Uuid,
        client_id: &str,
        requested_scopes: &[String],
    ) -> Result<bool, OAuth2Error> {
        self.consent
            .has_consented(user_id, client_id, requested_scopes)
            .await
            .map_err(Into::into)
    }

    /// Record a user's approval of a client for a scope set.
    ///
    /// # Errors
    /// Returns `Storage` if the store fails.
    pub async fn save_consent(
        &self,
        user_id: Uuid,
        client_id: &str,
        scope: &[String],
    ) -> Result<(), OAuth2Error> {
        self.consent
            .save(user_id, client_id, scope)
            .await
            .map_err(Into::into)
    }

    /// The JWKS document verifiers use to check ID token signatures
    /// (`GET /.well-known/jwks.json`).
    ///
    /// # Errors
    /// Returns `Internal` if key serialization fails.
    pub fn jwks_document(&self) -> Result<JsonWebKeySet, OAuth2Error> {
        self.jwks
            .get_jwks()
            .map_err(|e| OAuth2Error::Internal(e.to_string()))
    }
}
