// ABOUTME: Integration tests for authorization request validation ordering and error kinds
// ABOUTME: Covers response_type, client resolution, redirect matching, scope, and PKCE rules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kudos Platform

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{
    authorize_request_plain, authorize_request_with_pkce, create_test_server,
    register_confidential_client, register_public_client,
};
use kudos_auth_server::errors::OAuth2Error;
use kudos_auth_server::oauth2::models::AuthorizeRequest;
use kudos_auth_server::storage::AuthStorage;
use uuid::Uuid;

const REDIRECT: &str = "https://app.example.com/callback";

#[tokio::test]
async fn valid_request_for_registered_client_succeeds() {
    let harness = create_test_server();
    let client = register_public_client(&harness, &[REDIRECT], "openid profile email").await;

    let response = harness
        .server
        .authorize(
            authorize_request_with_pkce(&client.client_id, REDIRECT, "openid profile"),
            Uuid::new_v4(),
        )
        .await
        .expect("valid request should be accepted");

    assert!(!response.code.is_empty());
    assert_eq!(response.state, Some("test_state".to_owned()));
}

#[tokio::test]
async fn non_code_response_type_is_rejected_first() {
    let harness = create_test_server();
    let client = register_public_client(&harness, &[REDIRECT], "openid").await;

    let mut request = authorize_request_with_pkce(&client.client_id, REDIRECT, "openid");
    request.response_type = "token".to_owned();

    let err = harness
        .server
        .authorize(request, Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(matches!(err, OAuth2Error::UnsupportedResponseType));
    assert_eq!(err.error_code(), "unsupported_response_type");
}

#[tokio::test]
async fn unknown_client_is_rejected() {
    let harness = create_test_server();

    let err = harness
        .server
        .authorize(
            authorize_request_with_pkce("no_such_client", REDIRECT, "openid"),
            Uuid::new_v4(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, OAuth2Error::InvalidClient));
}

#[tokio::test]
async fn deactivated_client_resolves_as_not_found() {
    let harness = create_test_server();
    let mut client = register_public_client(&harness, &[REDIRECT], "openid").await;

    client.is_active = false;
    harness.storage.store_client(&client).await.unwrap();

    let err = harness
        .server
        .authorize(
            authorize_request_with_pkce(&client.client_id, REDIRECT, "openid"),
            Uuid::new_v4(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, OAuth2Error::InvalidClient));
}

#[tokio::test]
async fn unregistered_redirect_uri_is_rejected() {
    let harness = create_test_server();
    let client = register_public_client(&harness, &[REDIRECT], "openid").await;

    let err = harness
        .server
        .authorize(
            authorize_request_with_pkce(
                &client.client_id,
                "https://evil.example.com/callback",
                "openid",
            ),
            Uuid::new_v4(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, OAuth2Error::InvalidRedirectUri));
}

#[tokio::test]
async fn localhost_redirect_matches_ignoring_path_and_query() {
    let harness = create_test_server();
    let client =
        register_public_client(&harness, &["http://localhost:3000/cb"], "openid profile").await;

    let response = harness
        .server
        .authorize(
            authorize_request_with_pkce(
                &client.client_id,
                "http://localhost:3000/cb?session=xyz",
                "openid",
            ),
            Uuid::new_v4(),
        )
        .await
        .expect("localhost redirect with extra query should match");

    assert!(!response.code.is_empty());
}

#[tokio::test]
async fn localhost_loosening_does_not_cross_ports() {
    let harness = create_test_server();
    let client = register_public_client(&harness, &["http://localhost:3000/cb"], "openid").await;

    let err = harness
        .server
        .authorize(
            authorize_request_with_pkce(&client.client_id, "http://localhost:4000/cb", "openid"),
            Uuid::new_v4(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, OAuth2Error::InvalidRedirectUri));
}

#[tokio::test]
async fn disallowed_scope_is_rejected() {
    let harness = create_test_server();
    let client = register_public_client(&harness, &[REDIRECT], "openid profile").await;

    let err = harness
        .server
        .authorize(
            authorize_request_with_pkce(&client.client_id, REDIRECT, "openid wallet:read"),
            Uuid::new_v4(),
        )
        .await
        .unwrap_err();

    match err {
        OAuth2Error::InvalidScope(scope) => assert_eq!(scope, "wallet:read"),
        other => panic!("expected InvalidScope, got {other:?}"),
    }
}

#[tokio::test]
async fn public_client_without_code_challenge_is_rejected() {
    let harness = create_test_server();
    let client = register_public_client(&harness, &[REDIRECT], "openid").await;

    let err = harness
        .server
        .authorize(
            authorize_request_plain(&client.client_id, REDIRECT, "openid"),
            Uuid::new_v4(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, OAuth2Error::CodeChallengeRequired));
    assert_eq!(err.error_code(), "code_challenge_required");
}

#[tokio::test]
async fn confidential_client_may_omit_code_challenge() {
    let harness = create_test_server();
    let client = register_confidential_client(&harness, &[REDIRECT], "openid").await;

    let response = harness
        .server
        .authorize(
            authorize_request_plain(&client.client_id, REDIRECT, "openid"),
            Uuid::new_v4(),
        )
        .await
        .expect("confidential client without PKCE should be accepted");

    assert!(!response.code.is_empty());
}

#[tokio::test]
async fn unknown_code_challenge_method_is_rejected() {
    let harness = create_test_server();
    let client = register_public_client(&harness, &[REDIRECT], "openid").await;

    let mut request = authorize_request_with_pkce(&client.client_id, REDIRECT, "openid");
    request.code_challenge_method = Some("S512".to_owned());

    let err = harness
        .server
        .authorize(request, Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(matches!(err, OAuth2Error::InvalidCodeChallengeMethod));
}

#[test]
fn authorize_request_parses_from_query_string() {
    let query = "response_type=code&client_id=abc123\
                 &redirect_uri=https%3A%2F%2Fapp.example.com%2Fcallback\
                 &scope=openid%20profile&state=s1\
                 &code_challenge=E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM\
                 &code_challenge_method=S256";

    let request: AuthorizeRequest = serde_urlencoded::from_str(query).unwrap();

    assert_eq!(request.response_type, "code");
    assert_eq!(request.client_id, "abc123");
    assert_eq!(request.redirect_uri, "https://app.example.com/callback");
    assert_eq!(request.scope.as_deref(), Some("openid profile"));
    assert_eq!(request.state.as_deref(), Some("s1"));
    assert_eq!(request.code_challenge_method.as_deref(), Some("S256"));
}

#[test]
fn authorize_request_parses_without_optional_parameters() {
    let query = "response_type=code&client_id=abc123\
                 &redirect_uri=https%3A%2F%2Fapp.example.com%2Fcallback";

    let request: AuthorizeRequest = serde_urlencoded::from_str(query).unwrap();

    assert!(request.scope.is_none());
    assert!(request.state.is_none());
    assert!(request.code_challenge.is_none());
}

#[tokio::test]
async fn validation_order_reports_client_before_redirect() {
    let harness = create_test_server();

    // Both the client and the redirect URI are wrong; the client check
    // comes first in the validation order
    let err = harness
        .server
        .authorize(
            authorize_request_with_pkce("no_such_client", "https://elsewhere.example/cb", "openid"),
            Uuid::new_v4(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, OAuth2Error::InvalidClient));
}
