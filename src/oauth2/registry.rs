// ABOUTME: Client registry: lookup of active clients, redirect URI matching, registration
// ABOUTME: Redirect matching is exact except for a scheme+host+port loosening on loopback hosts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kudos Platform

use super::models::{parse_scope, ClientRegistrationRequest};
use crate::crypto::tokens::{generate_urlsafe_secret, CLIENT_ID_BYTES, CLIENT_SECRET_BYTES};
use crate::errors::{OAuth2Error, StorageError};
use crate::models::{ClientType, OAuthClient};
use crate::storage::AuthStorage;
use chrono::Utc;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

/// Scopes every new client may request unless narrowed at registration
const DEFAULT_ALLOWED_SCOPES: [&str; 3] = ["openid", "profile", "email"];

/// Registry of registered OAuth clients
#[derive(Clone)]
pub struct ClientRegistry {
    storage: Arc<dyn AuthStorage>,
}

impl ClientRegistry {
    /// Create a registry over the given store
    #[must_use]
    pub fn new(storage: Arc<dyn AuthStorage>) -> Self {
        Self { storage }
    }

    /// Look up an active client by public identifier.
    ///
    /// Inactive and missing clients both resolve to `None` so that callers
    /// cannot distinguish (and leak) deactivated registrations.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub async fn get_client(&self, client_id: &str) -> Result<Option<OAuthClient>, StorageError> {
        Ok(self
            .storage
            .get_client(client_id)
            .await?
            .filter(|client| client.is_active))
    }

    /// Whether `candidate` is acceptable against the registered set.
    ///
    /// Requires an exact string match, except when both the registered and
    /// candidate URIs are on a loopback host (`localhost` or `127.0.0.1`):
    /// then only scheme, host, and port must match and path/query are
    /// ignored. The loosening exists solely for local development clients
    /// and never applies to other hosts.
    #[must_use]
    pub fn is_valid_redirect_uri(registered: &[String], candidate: &str) -> bool {
        if registered.iter().any(|uri| uri == candidate) {
            return true;
        }

        let Ok(candidate_url) = Url::parse(candidate) else {
            return false;
        };
        if !is_loopback(&candidate_url) {
            return false;
        }

        registered.iter().any(|uri| {
            Url::parse(uri).is_ok_and(|registered_url| {
                is_loopback(&registered_url)
                    && registered_url.scheme() == candidate_url.scheme()
                    && registered_url.host_str() == candidate_url.host_str()
                    && registered_url.port_or_known_default()
                        == candidate_url.port_or_known_default()
            })
        })
    }

    /// Register a new client.
    ///
    /// Generates the public `client_id` and, for confidential clients, a
    /// `client_secret`; public clients never receive one. The secret is
    /// returned exactly once in the stored client record.
    ///
    /// # Errors
    /// Returns an error if the redirect URIs are invalid, the RNG fails,
    /// or the store fails.
    pub async fn create_client(
        &self,
        owner_user_id: Uuid,
        request: ClientRegistrationRequest,
    ) -> Result<OAuthClient, OAuth2Error> {
        Self::validate_redirect_uris(&request.redirect_uris)?;

        let client_id = generate_urlsafe_secret(CLIENT_ID_BYTES)
            .map_err(|e| OAuth2Error::Internal(e.to_string()))?;

        let client_secret = match request.client_type {
            ClientType::Confidential => Some(
                generate_urlsafe_secret(CLIENT_SECRET_BYTES)
                    .map_err(|e| OAuth2Error::Internal(e.to_string()))?,
            ),
            ClientType::Public => None,
        };

        let allowed_scopes = match request.scope.as_deref() {
            Some(raw) => parse_scope(Some(raw)),
            None => DEFAULT_ALLOWED_SCOPES
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
        };

        let client = OAuthClient {
            client_id,
            client_secret,
            client_type: request.client_type,
            name: request.client_name,
            redirect_uris: request.redirect_uris,
            allowed_scopes,
            allowed_grant_types: vec!["authorization_code".to_owned()],
            owner_user_id,
            is_active: true,
            created_at: Utc::now(),
        };

        self.storage.store_client(&client).await?;

        tracing::info!(
            client_id = %client.client_id,
            client_type = ?client.client_type,
            "registered OAuth client"
        );

        Ok(client)
    }

    /// Registered redirect URIs must be absolute http(s) URIs without
    /// fragments or wildcards; `https` is required except on loopback
    /// hosts (RFC 6749 Section 3.1.2.2, RFC 8252)
    fn validate_redirect_uris(uris: &[String]) -> Result<(), OAuth2Error> {
        if uris.is_empty() {
            return Err(OAuth2Error::InvalidRedirectUri);
        }

        for uri in uris {
            if uri.trim().is_empty() || uri.contains('#') || uri.contains('*') {
                tracing::warn!("rejected redirect_uri at registration: {uri}");
                return Err(OAuth2Error::InvalidRedirectUri);
            }

            let Ok(parsed) = Url::parse(uri) else {
                tracing::warn!("rejected malformed redirect_uri at registration: {uri}");
                return Err(OAuth2Error::InvalidRedirectUri);
            };

            let acceptable = match parsed.scheme() {
                "https" => true,
                "http" => is_loopback(&parsed),
                _ => false,
            };
            if !acceptable {
                tracing::warn!("rejected non-HTTPS redirect_uri for non-loopback host: {uri}");
                return Err(OAuth2Error::InvalidRedirectUri);
            }
        }

        Ok(())
    }
}

fn is_loopback(url: &Url) -> bool {
    matches!(url.host_str(), Some("localhost" | "127.0.0.1"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_is_required_for_public_hosts() {
        let registered = vec!["https://app.example.com/callback".to_owned()];

        assert!(ClientRegistry::is_valid_redirect_uri(
            &registered,
            "https://app.example.com/callback"
        ));
        assert!(!ClientRegistry::is_valid_redirect_uri(
            &registered,
            "https://app.example.com/callback/extra"
        ));
        assert!(!ClientRegistry::is_valid_redirect_uri(
            &registered,
            "https://app.example.com/other"
        ));
    }

    #[test]
    fn loopback_uris_match_on_scheme_host_port_only() {
        let registered = vec!["http://localhost:3000/cb".to_owned()];

        assert!(ClientRegistry::is_valid_redirect_uri(
            &registered,
            "http://localhost:3000/cb?session=abc"
        ));
        assert!(ClientRegistry::is_valid_redirect_uri(
            &registered,
            "http://localhost:3000/elsewhere"
        ));
        assert!(!ClientRegistry::is_valid_redirect_uri(
            &registered,
            "http://localhost:4000/cb"
        ));
        assert!(!ClientRegistry::is_valid_redirect_uri(
            &registered,
            "https://localhost:3000/cb"
        ));
    }

    #[test]
    fn loosening_never_applies_to_public_hosts() {
        let registered = vec!["https://app.example.com/cb".to_owned()];

        // Same scheme+host+port, different path: still rejected
        assert!(!ClientRegistry::is_valid_redirect_uri(
            &registered,
            "https://app.example.com/cb/child"
        ));
    }

    #[test]
    fn loopback_host_must_still_match() {
        let registered = vec!["http://localhost:3000/cb".to_owned()];

        assert!(!ClientRegistry::is_valid_redirect_uri(
            &registered,
            "http://127.0.0.1:3000/cb"
        ));
    }
}
