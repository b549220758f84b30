// ABOUTME: Token revocation (RFC 7009 semantics) and per-client usage statistics
// ABOUTME: Revocation is idempotent; statistics are observational and never fail a flow
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kudos Platform

use crate::crypto::tokens::hash_token;
use crate::errors::StorageError;
use crate::models::StatKind;
use crate::storage::AuthStorage;
use chrono::Utc;
use std::sync::Arc;

/// Revokes tokens on request and records per-client usage counters
#[derive(Clone)]
pub struct RevocationManager {
    storage: Arc<dyn AuthStorage>,
}

impl RevocationManager {
    /// Create a revocation manager over the given store
    #[must_use]
    pub fn new(storage: Arc<dyn AuthStorage>) -> Self {
        Self { storage }
    }

    /// Revoke a raw token, trying the hinted type first and the other
    /// second (RFC 7009 Section 2.1).
    ///
    /// Revoking an unknown or already-revoked token is a no-op; the caller
    /// always observes success.
    ///
    /// # Errors
    /// Returns an error only if the store fails.
    pub async fn revoke(
        &self,
        raw_token: &str,
        token_type_hint: Option<&str>,
    ) -> Result<(), StorageError> {
        let token_hash = hash_token(raw_token);
        let now = Utc::now();

        let revoked = if matches!(token_type_hint, Some("refresh_token")) {
            self.storage.revoke_refresh_token(&token_hash, now).await?
                || self.storage.revoke_access_token(&token_hash, now).await?
        } else {
            self.storage.revoke_access_token(&token_hash, now).await?
                || self.storage.revoke_refresh_token(&token_hash, now).await?
        };

        if revoked {
            tracing::info!("token revoked");
        } else {
            tracing::debug!("revocation no-op for unknown or already-revoked token");
        }

        Ok(())
    }

    /// Increment the per-day counter for a client event.
    ///
    /// Counters are purely observational: failures are logged and
    /// swallowed so they can never fail an authorization or grant.
    pub async fn record_event(&self, client_id: &str, kind: StatKind) {
        if let Err(e) = self
            .storage
            .increment_statistic(client_id, Utc::now().date_naive(), kind)
            .await
        {
            tracing::debug!(
                client_id = %client_id,
                kind = kind.as_str(),
                "failed to record client statistics event: {e}"
            );
        }
    }
}
