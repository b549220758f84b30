// ABOUTME: Environment-driven configuration for the authorization server core
// ABOUTME: Issuer identity and lifetime settings for codes, tokens, and ID tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kudos Platform

use anyhow::{Context, Result};
use chrono::Duration;
use std::env;

/// Default authorization code lifetime in seconds (10 minutes)
const DEFAULT_AUTH_CODE_TTL_SECS: i64 = 600;

/// Default access token lifetime in seconds (1 hour)
const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 3600;

/// Default refresh token lifetime in seconds (30 days)
const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 30 * 24 * 3600;

/// Authorization server configuration.
///
/// Constructed explicitly and passed to [`crate::oauth2::server::AuthorizationServer`];
/// there is no process-wide configuration singleton.
#[derive(Debug, Clone)]
pub struct AuthServerConfig {
    /// Issuer identifier placed in the `iss` claim of ID tokens
    pub issuer: String,
    /// Lifetime of authorization codes
    pub authorization_code_ttl: Duration,
    /// Lifetime of access tokens
    pub access_token_ttl: Duration,
    /// Lifetime of refresh tokens
    pub refresh_token_ttl: Duration,
    /// Lifetime of ID tokens; matches the access token window
    pub id_token_ttl: Duration,
}

impl Default for AuthServerConfig {
    fn default() -> Self {
        Self {
            issuer: "https://auth.kudos.example".to_owned(),
            authorization_code_ttl: Duration::seconds(DEFAULT_AUTH_CODE_TTL_SECS),
            access_token_ttl: Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECS),
            refresh_token_ttl: Duration::seconds(DEFAULT_REFRESH_TOKEN_TTL_SECS),
            id_token_ttl: Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECS),
        }
    }
}

impl AuthServerConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    ///
    /// # Errors
    /// Returns an error if a set variable cannot be parsed as an integer
    /// number of seconds.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            issuer: env::var("AUTH_ISSUER").unwrap_or(defaults.issuer),
            authorization_code_ttl: env_seconds_or(
                "AUTH_CODE_TTL_SECONDS",
                defaults.authorization_code_ttl,
            )?,
            access_token_ttl: env_seconds_or("ACCESS_TOKEN_TTL_SECONDS", defaults.access_token_ttl)?,
            refresh_token_ttl: env_seconds_or(
                "REFRESH_TOKEN_TTL_SECONDS",
                defaults.refresh_token_ttl,
            )?,
            id_token_ttl: env_seconds_or("ID_TOKEN_TTL_SECONDS", defaults.id_token_ttl)?,
        })
    }
}

/// Read a duration in seconds from the environment, keeping `default` when
/// the variable is unset
fn env_seconds_or(key: &str, default: Duration) -> Result<Duration> {
    match env::var(key) {
        Ok(raw) => {
            let secs: i64 = raw
                .parse()
                .with_context(|| format!("{key} must be an integer number of seconds"))?;
            Ok(Duration::seconds(secs))
        }
        Err(_) => Ok(default),
    }
}
