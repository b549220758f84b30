// ABOUTME: Authorization code issuance: random single-use codes persisted as hashes
// ABOUTME: Reached only after request validation succeeded and the user approved
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kudos Platform

use crate::config::AuthServerConfig;
use crate::crypto::tokens::{generate_urlsafe_secret, hash_token, AUTH_CODE_BYTES};
use crate::errors::OAuth2Error;
use crate::models::AuthorizationCode;
use crate::storage::AuthStorage;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Parameters for authorization code issuance
pub struct IssueCodeParams<'a> {
    /// Client the code is issued to
    pub client_id: &'a str,
    /// User who approved the authorization request
    pub user_id: Uuid,
    /// Redirect URI the code is bound to
    pub redirect_uri: &'a str,
    /// Approved scope set
    pub scope: &'a [String],
    /// PKCE code challenge, when the request carried one
    pub code_challenge: Option<&'a str>,
    /// PKCE challenge method
    pub code_challenge_method: Option<&'a str>,
}

/// Issues single-use authorization codes
#[derive(Clone)]
pub struct AuthorizationCodeManager {
    storage: Arc<dyn AuthStorage>,
    config: Arc<AuthServerConfig>,
}

impl AuthorizationCodeManager {
    /// Create a code manager over the given store
    #[must_use]
    pub fn new(storage: Arc<dyn AuthStorage>, config: Arc<AuthServerConfig>) -> Self {
        Self { storage, config }
    }

    /// Generate an authorization code and persist its record.
    ///
    /// Returns the raw code for the redirect; only the hash is stored.
    ///
    /// # Errors
    /// Returns an error if the RNG or the store fails.
    pub async fn issue(&self, params: IssueCodeParams<'_>) -> Result<String, OAuth2Error> {
        let code = generate_urlsafe_secret(AUTH_CODE_BYTES)
            .map_err(|e| OAuth2Error::Internal(e.to_string()))?;

        let now = Utc::now();
        let record = AuthorizationCode {
            code_hash: hash_token(&code),
            client_id: params.client_id.to_owned(),
            user_id: params.user_id,
            redirect_uri: params.redirect_uri.to_owned(),
            scope: params.scope.to_vec(),
            code_challenge: params.code_challenge.map(str::to_owned),
            code_challenge_method: params.code_challenge_method.map(str::to_owned),
            created_at: now,
            expires_at: now + self.config.authorization_code_ttl,
            used_at: None,
        };

        self.storage.store_auth_code(&record).await?;

        tracing::debug!(
            client_id = %params.client_id,
            user_id = %params.user_id,
            "issued authorization code"
        );

        Ok(code)
    }
}
