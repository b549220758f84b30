// ABOUTME: Integration tests for identity claims assembly, ID token signing, and userinfo
// ABOUTME: Verifies RS256 signatures against the server's JWKS and scope gating of claims
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kudos Platform

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::Utc;
use common::{
    code_token_request, create_test_server, obtain_code, register_public_client, seed_identity,
    TestHarness, TEST_VERIFIER,
};
use kudos_auth_server::errors::OAuth2Error;
use kudos_auth_server::oauth2::models::{IdTokenClaims, TokenResponse};
use uuid::Uuid;

const REDIRECT: &str = "https://app.example.com/callback";

async fn exchange_for_scope(harness: &TestHarness, scope: &str) -> (Uuid, String, TokenResponse) {
    let client = register_public_client(harness, &[REDIRECT], "openid profile email").await;
    let user_id = seed_identity(harness).await;
    let code = obtain_code(harness, &client, user_id, REDIRECT, scope).await;

    let response = harness
        .server
        .token(code_token_request(&client, &code, REDIRECT, Some(TEST_VERIFIER)))
        .await
        .expect("exchange failed");

    (user_id, client.client_id, response)
}

#[tokio::test]
async fn id_token_is_signed_and_carries_payload_shape() {
    let harness = create_test_server();
    let (user_id, client_id, response) = exchange_for_scope(&harness, "openid").await;

    let id_token = response.id_token.expect("openid scope must yield id_token");

    let config = harness.config.clone();
    let claims: IdTokenClaims = harness
        .jwks
        .verify(&id_token, &config.issuer, &client_id)
        .expect("id_token must verify against the server's JWKS");

    assert_eq!(claims.iss, config.issuer);
    assert_eq!(claims.aud, client_id);
    assert_eq!(claims.claims.sub, user_id.to_string());
    assert_eq!(claims.exp - claims.iat, 3600);
    assert!(claims.iat <= Utc::now().timestamp());
}

#[tokio::test]
async fn openid_only_scope_yields_bare_sub() {
    let harness = create_test_server();
    let (_, client_id, response) = exchange_for_scope(&harness, "openid").await;

    let claims: IdTokenClaims = harness
        .jwks
        .verify(
            &response.id_token.unwrap(),
            &harness.config.issuer,
            &client_id,
        )
        .unwrap();

    assert!(claims.claims.name.is_none());
    assert!(claims.claims.preferred_username.is_none());
    assert!(claims.claims.email.is_none());
}

#[tokio::test]
async fn profile_scope_adds_profile_claims() {
    let harness = create_test_server();
    let (_, client_id, response) = exchange_for_scope(&harness, "openid profile").await;

    let claims: IdTokenClaims = harness
        .jwks
        .verify(
            &response.id_token.unwrap(),
            &harness.config.issuer,
            &client_id,
        )
        .unwrap();

    assert_eq!(claims.claims.name.as_deref(), Some("Ada Lovelace"));
    assert_eq!(claims.claims.preferred_username.as_deref(), Some("ada"));
    assert!(claims.claims.picture.is_some());
    assert!(claims.claims.email.is_none());
}

#[tokio::test]
async fn email_scope_adds_email_claims() {
    let harness = create_test_server();
    let (_, client_id, response) = exchange_for_scope(&harness, "openid email").await;

    let claims: IdTokenClaims = harness
        .jwks
        .verify(
            &response.id_token.unwrap(),
            &harness.config.issuer,
            &client_id,
        )
        .unwrap();

    assert_eq!(claims.claims.email.as_deref(), Some("ada@example.com"));
    assert_eq!(claims.claims.email_verified, Some(true));
    assert!(claims.claims.name.is_none());
}

#[tokio::test]
async fn grant_without_openid_scope_has_no_id_token() {
    let harness = create_test_server();
    let (_, _, response) = exchange_for_scope(&harness, "profile").await;

    assert!(response.id_token.is_none());
}

#[tokio::test]
async fn id_token_signed_by_foreign_key_does_not_verify() {
    let harness = create_test_server();
    let (_, client_id, response) = exchange_for_scope(&harness, "openid").await;

    let mut foreign = kudos_auth_server::crypto::jwks::JwksManager::new();
    foreign
        .generate_rsa_key_pair_with_size("test_key", 2048)
        .unwrap();

    assert!(foreign
        .verify::<IdTokenClaims>(
            &response.id_token.unwrap(),
            &harness.config.issuer,
            &client_id,
        )
        .is_err());
}

#[tokio::test]
async fn jwks_document_exposes_the_signing_key() {
    let harness = create_test_server();

    let jwks = harness.server.jwks_document().unwrap();
    assert!(!jwks.keys.is_empty());

    let key = &jwks.keys[0];
    assert_eq!(key.kty, "RSA");
    assert_eq!(key.alg, "RS256");
    assert_eq!(key.key_use, "sig");
    assert!(!key.n.is_empty());
}

#[tokio::test]
async fn userinfo_returns_claims_scoped_to_the_token() {
    let harness = create_test_server();
    let (user_id, _, response) = exchange_for_scope(&harness, "openid profile").await;

    let claims = harness
        .server
        .userinfo(&response.access_token)
        .await
        .expect("valid bearer token should yield claims");

    assert_eq!(claims.sub, user_id.to_string());
    assert_eq!(claims.name.as_deref(), Some("Ada Lovelace"));
    // The token does not carry the email scope
    assert!(claims.email.is_none());
}

#[tokio::test]
async fn userinfo_rejects_unknown_token() {
    let harness = create_test_server();

    let err = harness.server.userinfo("not-a-real-token").await.unwrap_err();

    assert!(matches!(err, OAuth2Error::InvalidAccessToken));
    assert_eq!(err.http_status(), 401);
}

#[tokio::test]
async fn userinfo_rejects_revoked_token() {
    let harness = create_test_server();
    let (_, _, response) = exchange_for_scope(&harness, "openid").await;

    harness
        .server
        .revoke(kudos_auth_server::oauth2::models::RevokeRequest {
            token: response.access_token.clone(),
            token_type_hint: Some("access_token".to_owned()),
        })
        .await
        .unwrap();

    let err = harness
        .server
        .userinfo(&response.access_token)
        .await
        .unwrap_err();

    assert!(matches!(err, OAuth2Error::InvalidAccessToken));
}
