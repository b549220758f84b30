// ABOUTME: In-memory AuthStorage implementation backed by a single RwLock
// ABOUTME: Used by tests and embedders that do not need durable storage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kudos Platform

use super::AuthStorage;
use crate::errors::StorageError;
use crate::models::{
    AccessToken, AuthorizationCode, ClientStatistics, OAuthClient, RefreshToken, StatKind,
    UserConsent,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Map-backed storage. Every conditional update runs under one write lock,
/// which provides the check-and-set atomicity the trait requires.
#[derive(Default)]
pub struct MemoryStorage {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    clients: HashMap<String, OAuthClient>,
    auth_codes: HashMap<String, AuthorizationCode>,
    access_tokens: HashMap<String, AccessToken>,
    refresh_tokens: HashMap<String, RefreshToken>,
    consents: HashMap<(Uuid, String), UserConsent>,
    statistics: HashMap<(String, NaiveDate, StatKind), ClientStatistics>,
}

impl MemoryStorage {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthStorage for MemoryStorage {
    async fn store_client(&self, client: &OAuthClient) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        inner
            .clients
            .insert(client.client_id.clone(), client.clone());
        Ok(())
    }

    async fn get_client(&self, client_id: &str) -> Result<Option<OAuthClient>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner.clients.get(client_id).cloned())
    }

    async fn store_auth_code(&self, code: &AuthorizationCode) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        inner.auth_codes.insert(code.code_hash.clone(), code.clone());
        Ok(())
    }

    async fn get_auth_code(
        &self,
        code_hash: &str,
        client_id: &str,
    ) -> Result<Option<AuthorizationCode>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner
            .auth_codes
            .get(code_hash)
            .filter(|code| code.client_id == client_id)
            .cloned())
    }

    async fn mark_auth_code_used(
        &self,
        code_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let mut inner = self.inner.write().await;
        match inner.auth_codes.get_mut(code_hash) {
            Some(code) if code.used_at.is_none() => {
                code.used_at = Some(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn store_access_token(&self, token: &AccessToken) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        inner
            .access_tokens
            .insert(token.token_hash.clone(), token.clone());
        Ok(())
    }

    async fn get_access_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<AccessToken>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner.access_tokens.get(token_hash).cloned())
    }

    async fn revoke_access_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let mut inner = self.inner.write().await;
        match inner.access_tokens.get_mut(token_hash) {
            Some(token) if token.revoked_at.is_none() => {
                token.revoked_at = Some(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn store_refresh_token(&self, token: &RefreshToken) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        inner
            .refresh_tokens
            .insert(token.token_hash.clone(), token.clone());
        Ok(())
    }

    async fn get_refresh_token(
        &self,
        token_hash: &str,
        client_id: &str,
    ) -> Result<Option<RefreshToken>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner
            .refresh_tokens
            .get(token_hash)
            .filter(|token| token.client_id == client_id)
            .cloned())
    }

    async fn revoke_refresh_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let mut inner = self.inner.write().await;
        match inner.refresh_tokens.get_mut(token_hash) {
            Some(token) if token.revoked_at.is_none() => {
                token.revoked_at = Some(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_refresh_token_replaced_by(
        &self,
        token_hash: &str,
        replaced_by: Uuid,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        if let Some(token) = inner.refresh_tokens.get_mut(token_hash) {
            token.replaced_by = Some(replaced_by);
        }
        Ok(())
    }

    async fn upsert_consent(&self, consent: &UserConsent) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        inner.consents.insert(
            (consent.user_id, consent.client_id.clone()),
            consent.clone(),
        );
        Ok(())
    }

    async fn get_consent(
        &self,
        user_id: Uuid,
        client_id: &str,
    ) -> Result<Option<UserConsent>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner
            .consents
            .get(&(user_id, client_id.to_owned()))
            .cloned())
    }

    async fn increment_statistic(
        &self,
        client_id: &str,
        date: NaiveDate,
        kind: StatKind,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        let row = inner
            .statistics
            .entry((client_id.to_owned(), date, kind))
            .or_insert_with(|| ClientStatistics {
                client_id: client_id.to_owned(),
                date,
                kind,
                count: 0,
            });
        row.count += 1;
        Ok(())
    }

    async fn get_statistic(
        &self,
        client_id: &str,
        date: NaiveDate,
        kind: StatKind,
    ) -> Result<u64, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner
            .statistics
            .get(&(client_id.to_owned(), date, kind))
            .map_or(0, |row| row.count))
    }
}
