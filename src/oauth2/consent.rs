// ABOUTME: User consent recording and checks for client/scope combinations
// ABOUTME: Consent is upserted per (user, client) and superset-checked to skip re-prompting
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kudos Platform

use crate::errors::StorageError;
use crate::models::UserConsent;
use crate::storage::AuthStorage;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Records and checks prior user consent.
///
/// The embedding authorization endpoint uses [`ConsentManager::has_consented`]
/// to decide whether the consent prompt can be skipped, and
/// [`ConsentManager::save`] after the user approves.
#[derive(Clone)]
pub struct ConsentManager {
    storage: Arc<dyn AuthStorage>,
}

impl ConsentManager {
    /// Create a consent manager over the given store
    #[must_use]
    pub fn new(storage: Arc<dyn AuthStorage>) -> Self {
        Self { storage }
    }

    /// Whether a non-revoked consent exists whose scope set is a superset
    /// of `requested_scopes`.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub async fn has_consented(
        &self,
        user_id: Uuid,
        client_id: &str,
        requested_scopes: &[String],
    ) -> Result<bool, StorageError> {
        Ok(self
            .storage
            .get_consent(user_id, client_id)
            .await?
            .filter(|consent| consent.revoked_at.is_none())
            .is_some_and(|consent| {
                requested_scopes
                    .iter()
                    .all(|scope| consent.scope.contains(scope))
            }))
    }

    /// Record consent, overwriting any prior scope set and grant time for
    /// the `(user, client)` pair.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub async fn save(
        &self,
        user_id: Uuid,
        client_id: &str,
        scope: &[String],
    ) -> Result<(), StorageError> {
        let consent = UserConsent {
            user_id,
            client_id: client_id.to_owned(),
            scope: scope.to_vec(),
            granted_at: Utc::now(),
            revoked_at: None,
        };

        self.storage.upsert_consent(&consent).await?;

        tracing::debug!(
            user_id = %user_id,
            client_id = %client_id,
            "recorded user consent"
        );

        Ok(())
    }
}
