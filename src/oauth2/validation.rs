// ABOUTME: Authorization request validation against protocol rules and the client registry
// ABOUTME: Ordered checks where the first failure wins; pure, no side effects
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kudos Platform

use super::models::{parse_scope, AuthorizeRequest};
use super::registry::ClientRegistry;
use crate::errors::OAuth2Error;
use crate::models::{ClientType, OAuthClient};

/// Outcome of a successful authorization request validation
#[derive(Debug)]
pub struct ValidatedAuthorization {
    /// The resolved, active client
    pub client: OAuthClient,
    /// The requested scope set, parsed and deduplicated
    pub scope: Vec<String>,
}

/// Validates incoming authorization requests.
///
/// Checks run in a fixed order and the first failure wins, so every
/// rejection maps to exactly one error kind:
/// 1. `response_type` must be `code`
/// 2. the client must resolve (active) via the registry
/// 3. the redirect URI must pass the registry's matcher
/// 4. every requested scope must be allowed for the client
/// 5. public clients must supply a PKCE `code_challenge`
///
/// A supplied `code_challenge_method` outside `S256`/`plain` is rejected
/// after the ordered checks, before any code is issued.
#[derive(Clone)]
pub struct AuthorizationRequestValidator {
    registry: ClientRegistry,
}

impl AuthorizationRequestValidator {
    /// Create a validator over the given registry
    #[must_use]
    pub fn new(registry: ClientRegistry) -> Self {
        Self { registry }
    }

    /// Validate an authorization request. No side effects.
    ///
    /// # Errors
    /// Returns the first failing check's [`OAuth2Error`] kind, or
    /// `Storage` if the client lookup fails.
    pub async fn validate(
        &self,
        request: &AuthorizeRequest,
    ) -> Result<ValidatedAuthorization, OAuth2Error> {
        if request.response_type != "code" {
            return Err(OAuth2Error::UnsupportedResponseType);
        }

        let client = self
            .registry
            .get_client(&request.client_id)
            .await?
            .ok_or(OAuth2Error::InvalidClient)?;

        if !ClientRegistry::is_valid_redirect_uri(&client.redirect_uris, &request.redirect_uri) {
            return Err(OAuth2Error::InvalidRedirectUri);
        }

        let scope = parse_scope(request.scope.as_deref());
        for requested in &scope {
            if !client.allowed_scopes.contains(requested) {
                return Err(OAuth2Error::InvalidScope(requested.clone()));
            }
        }

        if client.client_type == ClientType::Public && request.code_challenge.is_none() {
            return Err(OAuth2Error::CodeChallengeRequired);
        }

        if request.code_challenge.is_some() {
            let method = request.code_challenge_method.as_deref().unwrap_or("S256");
            if !matches!(method, "S256" | "plain") {
                return Err(OAuth2Error::InvalidCodeChallengeMethod);
            }
        }

        Ok(ValidatedAuthorization { client, scope })
    }
}
