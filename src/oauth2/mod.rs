// ABOUTME: OAuth 2.0 authorization server core: validation, codes, grants, consent, claims
// ABOUTME: Implements the authorization code and refresh token flows with PKCE and rotation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kudos Platform

/// Authorization code issuance
pub mod codes;
/// Identity claims assembly and ID token minting
pub mod claims;
/// User consent recording and superset checks
pub mod consent;
/// Token grant handling for code exchange and refresh rotation
pub mod grants;
/// Request and response wire types
pub mod models;
/// Client lookup, redirect URI matching, and registration
pub mod registry;
/// Token revocation and per-client usage statistics
pub mod revocation;
/// Service facade wiring the components together
pub mod server;
/// Authorization request validation
pub mod validation;

pub use codes::AuthorizationCodeManager;
pub use claims::IdentityClaimsAssembler;
pub use consent::ConsentManager;
pub use grants::TokenGrantHandler;
pub use registry::ClientRegistry;
pub use revocation::RevocationManager;
pub use server::AuthorizationServer;
pub use validation::AuthorizationRequestValidator;
