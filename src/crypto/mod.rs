// ABOUTME: Cryptographic utilities for the authorization server
// ABOUTME: Opaque token generation/hashing and RSA key management for ID token signing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kudos Platform

/// RSA key pairs and JWKS document generation for RS256 ID token signing
pub mod jwks;

/// Random opaque token generation and irreversible hashing
pub mod tokens;
