// ABOUTME: Library entry point for the Kudos embedded OAuth 2.0 authorization server
// ABOUTME: Authorization code + refresh token grants with PKCE, rotation, and ID tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kudos Platform

#![deny(unsafe_code)]

//! # Kudos Auth Server
//!
//! The OAuth 2.0 authorization server core embedded in the Kudos engagement
//! platform. It validates authorization requests, issues single-use
//! authorization codes, exchanges codes and refresh tokens for access
//! credentials, rotates refresh tokens with replay detection, mints signed
//! identity claims, and tracks user consent.
//!
//! ## Features
//!
//! - **Authorization code grant** with mandatory PKCE for public clients
//! - **Refresh token rotation**: every use revokes the presented token and
//!   links its successor, making replays detectable
//! - **Hashed credentials**: codes and tokens are stored only as SHA-256
//!   digests; raw values leave the process exactly once
//! - **Signed ID tokens**: RS256 with JWKS public-key distribution
//! - **Consent tracking** with superset checks to skip re-prompting
//!
//! ## Architecture
//!
//! All state lives behind the [`storage::AuthStorage`] trait; the HTTP
//! layer, the relational store, and the identity store are external
//! collaborators. Services are wired explicitly through
//! [`oauth2::server::AuthorizationServer`] so tests run against isolated
//! store instances.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use kudos_auth_server::config::AuthServerConfig;
//! use kudos_auth_server::crypto::jwks::JwksManager;
//! use kudos_auth_server::identity::StaticIdentityProvider;
//! use kudos_auth_server::oauth2::server::AuthorizationServer;
//! use kudos_auth_server::storage::memory::MemoryStorage;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut jwks = JwksManager::new();
//! jwks.generate_rsa_key_pair("key_2025_01")?;
//!
//! let server = AuthorizationServer::new(
//!     Arc::new(MemoryStorage::new()),
//!     Arc::new(StaticIdentityProvider::new()),
//!     Arc::new(jwks),
//!     Arc::new(AuthServerConfig::from_env()?),
//! );
//! # let _ = server;
//! # Ok(())
//! # }
//! ```

/// Environment-driven configuration for issuer identity and lifetimes
pub mod config;

/// Cryptographic utilities: token codec and RS256 signing keys
pub mod crypto;

/// Unified error handling with wire codes and HTTP statuses
pub mod errors;

/// Identity-store boundary for scope-gated claims
pub mod identity;

/// Structured logging setup on top of tracing-subscriber
pub mod logging;

/// Persistence models for clients, codes, tokens, consents, and statistics
pub mod models;

/// OAuth 2.0 authorization server core
pub mod oauth2;

/// Storage abstraction with atomic conditional updates
pub mod storage;
