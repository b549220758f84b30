// ABOUTME: Storage abstraction for the authorization server's persistent state
// ABOUTME: Defines the AuthStorage trait including the atomic conditional updates grants rely on
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kudos Platform

//! Persistent-store boundary.
//!
//! The relational store behind the client/token/consent tables is an
//! external collaborator; this trait specifies it at its interface
//! boundary. Two methods carry the atomicity the grant flows depend on:
//!
//! - [`AuthStorage::mark_auth_code_used`] combines "find unused code" and
//!   "mark used" into one conditional update so that exactly one of two
//!   racing exchanges of the same code succeeds.
//! - [`AuthStorage::revoke_refresh_token`] applies the same discipline to
//!   refresh token rotation.
//!
//! Records only ever transition `unused -> used` or `live -> revoked`; no
//! field is ever un-set.

use crate::errors::StorageError;
use crate::models::{
    AccessToken, AuthorizationCode, OAuthClient, RefreshToken, StatKind, UserConsent,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

pub mod memory;

/// Storage operations required by the authorization server core.
///
/// All lookups key tokens and codes by their irreversible hash; raw values
/// never reach the store.
#[async_trait]
pub trait AuthStorage: Send + Sync {
    // ================================
    // Clients
    // ================================

    /// Persist a newly registered client
    async fn store_client(&self, client: &OAuthClient) -> Result<(), StorageError>;

    /// Fetch a client row by public identifier, regardless of `is_active`.
    /// Callers that must not see deactivated clients filter on `is_active`.
    async fn get_client(&self, client_id: &str) -> Result<Option<OAuthClient>, StorageError>;

    // ================================
    // Authorization codes
    // ================================

    /// Persist an issued authorization code (hash only)
    async fn store_auth_code(&self, code: &AuthorizationCode) -> Result<(), StorageError>;

    /// Fetch an authorization code by hash, scoped to the issuing client
    async fn get_auth_code(
        &self,
        code_hash: &str,
        client_id: &str,
    ) -> Result<Option<AuthorizationCode>, StorageError>;

    /// Atomically transition a code from unused to used.
    ///
    /// Returns `true` only if this call performed the transition; a code
    /// already used (including by a concurrent caller) yields `false`.
    async fn mark_auth_code_used(
        &self,
        code_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError>;

    // ================================
    // Access tokens
    // ================================

    /// Persist an issued access token (hash only)
    async fn store_access_token(&self, token: &AccessToken) -> Result<(), StorageError>;

    /// Fetch an access token by hash
    async fn get_access_token(&self, token_hash: &str)
        -> Result<Option<AccessToken>, StorageError>;

    /// Set `revoked_at` on a live access token.
    ///
    /// Returns `true` only if this call performed the transition; unknown
    /// or already-revoked tokens yield `false` without error.
    async fn revoke_access_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError>;

    // ================================
    // Refresh tokens
    // ================================

    /// Persist an issued refresh token (hash only)
    async fn store_refresh_token(&self, token: &RefreshToken) -> Result<(), StorageError>;

    /// Fetch a refresh token by hash, scoped to the issuing client
    async fn get_refresh_token(
        &self,
        token_hash: &str,
        client_id: &str,
    ) -> Result<Option<RefreshToken>, StorageError>;

    /// Set `revoked_at` on a live refresh token.
    ///
    /// Returns `true` only if this call performed the transition, which is
    /// what makes rotation single-winner under concurrent presentation of
    /// the same token.
    async fn revoke_refresh_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError>;

    /// Record the rotation successor of a revoked refresh token
    async fn set_refresh_token_replaced_by(
        &self,
        token_hash: &str,
        replaced_by: Uuid,
    ) -> Result<(), StorageError>;

    // ================================
    // User consent
    // ================================

    /// Insert or overwrite the consent row for `(user_id, client_id)`
    async fn upsert_consent(&self, consent: &UserConsent) -> Result<(), StorageError>;

    /// Fetch the consent row for `(user_id, client_id)`, revoked or not
    async fn get_consent(
        &self,
        user_id: Uuid,
        client_id: &str,
    ) -> Result<Option<UserConsent>, StorageError>;

    // ================================
    // Client statistics
    // ================================

    /// Increment the per-day counter for `(client_id, date, kind)`,
    /// creating the day's row on first use
    async fn increment_statistic(
        &self,
        client_id: &str,
        date: NaiveDate,
        kind: StatKind,
    ) -> Result<(), StorageError>;

    /// Read the per-day counter for `(client_id, date, kind)`; zero when
    /// no events were recorded
    async fn get_statistic(
        &self,
        client_id: &str,
        date: NaiveDate,
        kind: StatKind,
    ) -> Result<u64, StorageError>;
}
