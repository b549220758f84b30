// ABOUTME: Identity-store boundary supplying user profile data for claims assembly
// ABOUTME: Trait plus a map-backed provider for tests and single-process deployments
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kudos Platform

use crate::errors::StorageError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Profile record from the end-user identity store
#[derive(Debug, Clone)]
pub struct UserIdentity {
    /// Stable user identifier; becomes the `sub` claim
    pub user_id: Uuid,
    /// Login name; surfaced as `preferred_username` under the `profile`
    /// scope
    pub username: String,
    /// Display name; surfaced as `name` under the `profile` scope
    pub display_name: String,
    /// Avatar reference; surfaced as `picture` under the `profile` scope
    pub avatar_url: Option<String>,
    /// Email address; surfaced under the `email` scope
    pub email: String,
    /// Whether the identity provider verified the address
    pub email_verified: bool,
}

/// Boundary to the end-user identity/profile store.
///
/// The identity store is an external collaborator; the core only reads
/// from it while assembling scope-gated claims.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Fetch the profile record for a user, `None` when unknown
    async fn get_identity(&self, user_id: Uuid) -> Result<Option<UserIdentity>, StorageError>;
}

/// Map-backed identity provider for tests and single-process deployments
#[derive(Default)]
pub struct StaticIdentityProvider {
    users: RwLock<HashMap<Uuid, UserIdentity>>,
}

impl StaticIdentityProvider {
    /// Create an empty provider
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace an identity record
    pub async fn insert(&self, identity: UserIdentity) {
        let mut users = self.users.write().await;
        users.insert(identity.user_id, identity);
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn get_identity(&self, user_id: Uuid) -> Result<Option<UserIdentity>, StorageError> {
        let users = self.users.read().await;
        Ok(users.get(&user_id).cloned())
    }
}
