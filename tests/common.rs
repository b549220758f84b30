// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides server wiring, client registration, and authorization helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kudos Platform
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

//! Shared test utilities for `kudos_auth_server`
//!
//! Common setup functions to reduce duplication across integration tests.

use kudos_auth_server::{
    config::AuthServerConfig,
    crypto::jwks::JwksManager,
    identity::{StaticIdentityProvider, UserIdentity},
    models::{ClientType, OAuthClient},
    oauth2::models::{AuthorizeRequest, ClientRegistrationRequest, TokenRequest},
    oauth2::server::AuthorizationServer,
    storage::memory::MemoryStorage,
};
use std::sync::{Arc, Once, OnceLock};
use uuid::Uuid;

/// PKCE verifier from RFC 7636 Appendix B; its S256 challenge is
/// `E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM`
pub const TEST_VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

static TEST_JWKS: OnceLock<Arc<JwksManager>> = OnceLock::new();

/// Shared 2048-bit test signing key; generated once per test binary
pub fn test_jwks() -> Arc<JwksManager> {
    TEST_JWKS
        .get_or_init(|| {
            let mut jwks = JwksManager::new();
            jwks.generate_rsa_key_pair_with_size("test_key", 2048)
                .expect("test RSA key generation failed");
            Arc::new(jwks)
        })
        .clone()
}

/// A fully wired authorization server over isolated in-memory stores
pub struct TestHarness {
    pub server: AuthorizationServer,
    pub storage: Arc<MemoryStorage>,
    pub identity: Arc<StaticIdentityProvider>,
    pub jwks: Arc<JwksManager>,
    pub config: Arc<AuthServerConfig>,
}

/// Standard test server setup with fresh stores and the shared signing key
pub fn create_test_server() -> TestHarness {
    init_test_logging();

    let storage = Arc::new(MemoryStorage::new());
    let identity = Arc::new(StaticIdentityProvider::new());
    let jwks = test_jwks();
    let config = Arc::new(AuthServerConfig::default());

    let server = AuthorizationServer::new(
        storage.clone(),
        identity.clone(),
        jwks.clone(),
        config.clone(),
    );

    TestHarness {
        server,
        storage,
        identity,
        jwks,
        config,
    }
}

/// Register a public client allowed the given scopes
pub async fn register_public_client(
    harness: &TestHarness,
    redirect_uris: &[&str],
    scope: &str,
) -> OAuthClient {
    harness
        .server
        .register_client(
            Uuid::new_v4(),
            ClientRegistrationRequest {
                client_name: "Test Public App".to_owned(),
                client_type: ClientType::Public,
                redirect_uris: redirect_uris.iter().map(|s| (*s).to_owned()).collect(),
                scope: Some(scope.to_owned()),
            },
        )
        .await
        .expect("public client registration failed")
}

/// Register a confidential client allowed the given scopes
pub async fn register_confidential_client(
    harness: &TestHarness,
    redirect_uris: &[&str],
    scope: &str,
) -> OAuthClient {
    harness
        .server
        .register_client(
            Uuid::new_v4(),
            ClientRegistrationRequest {
                client_name: "Test Backend App".to_owned(),
                client_type: ClientType::Confidential,
                redirect_uris: redirect_uris.iter().map(|s| (*s).to_owned()).collect(),
                scope: Some(scope.to_owned()),
            },
        )
        .await
        .expect("confidential client registration failed")
}

/// Seed the identity store with a known user and return their id
pub async fn seed_identity(harness: &TestHarness) -> Uuid {
    let user_id = Uuid::new_v4();
    harness
        .identity
        .insert(UserIdentity {
            user_id,
            username: "ada".to_owned(),
            display_name: "Ada Lovelace".to_owned(),
            avatar_url: Some("https://cdn.kudos.example/avatars/ada.png".to_owned()),
            email: "ada@example.com".to_owned(),
            email_verified: true,
        })
        .await;
    user_id
}

/// Build an authorization request with the S256 challenge for
/// [`TEST_VERIFIER`]
pub fn authorize_request_with_pkce(
    client_id: &str,
    redirect_uri: &str,
    scope: &str,
) -> AuthorizeRequest {
    AuthorizeRequest {
        response_type: "code".to_owned(),
        client_id: client_id.to_owned(),
        redirect_uri: redirect_uri.to_owned(),
        scope: Some(scope.to_owned()),
        state: Some("test_state".to_owned()),
        code_challenge: Some(kudos_auth_server::crypto::tokens::pkce_s256_challenge(
            TEST_VERIFIER,
        )),
        code_challenge_method: Some("S256".to_owned()),
    }
}

/// Build an authorization request without PKCE parameters
pub fn authorize_request_plain(
    client_id: &str,
    redirect_uri: &str,
    scope: &str,
) -> AuthorizeRequest {
    AuthorizeRequest {
        response_type: "code".to_owned(),
        client_id: client_id.to_owned(),
        redirect_uri: redirect_uri.to_owned(),
        scope: Some(scope.to_owned()),
        state: None,
        code_challenge: None,
        code_challenge_method: None,
    }
}

/// Build a code-grant token request
pub fn code_token_request(
    client: &OAuthClient,
    code: &str,
    redirect_uri: &str,
    code_verifier: Option<&str>,
) -> TokenRequest {
    TokenRequest {
        grant_type: "authorization_code".to_owned(),
        code: Some(code.to_owned()),
        redirect_uri: Some(redirect_uri.to_owned()),
        client_id: client.client_id.clone(),
        client_secret: client.client_secret.clone(),
        refresh_token: None,
        code_verifier: code_verifier.map(str::to_owned),
    }
}

/// Build a refresh-grant token request
pub fn refresh_token_request(client: &OAuthClient, refresh_token: &str) -> TokenRequest {
    TokenRequest {
        grant_type: "refresh_token".to_owned(),
        code: None,
        redirect_uri: None,
        client_id: client.client_id.clone(),
        client_secret: client.client_secret.clone(),
        refresh_token: Some(refresh_token.to_owned()),
        code_verifier: None,
    }
}

/// Run the full authorization step for a public client and return the code
pub async fn obtain_code(
    harness: &TestHarness,
    client: &OAuthClient,
    user_id: Uuid,
    redirect_uri: &str,
    scope: &str,
) -> String {
    harness
        .server
        .authorize(
            authorize_request_with_pkce(&client.client_id, redirect_uri, scope),
            user_id,
        )
        .await
        .expect("authorization failed")
        .code
}
