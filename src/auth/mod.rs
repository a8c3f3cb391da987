// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! This module provides platform-scoped JWT authentication for the
//! device API.
//!
//! ## Auth Flow
//!
//! 1. Client sends `POST /auth/login` with email, password, and platform
//! 2. The resolver checks (email, platform) against the store and the
//!    password against its Argon2id hash
//! 3. On success the server mints an HS256 access/refresh pair whose
//!    claims carry the user's platform
//! 4. Subsequent requests send `Authorization: Bearer <access token>`;
//!    the extractor verifies the signature and re-checks the subject
//!    against the store (exists, active, same platform)
//!
//! ## Security
//!
//! - All non-health endpoints require authentication
//! - Login failures collapse into one generic 401 response
//! - Tokens without a platform claim are rejected
//! - Clock skew tolerance is 60 seconds

pub mod claims;
pub mod error;
pub mod extractor;
pub mod password;
pub mod resolver;
pub mod tokens;

pub use claims::{Principal, TokenKind, VerifiedClaims};
pub use error::AuthError;
pub use extractor::{principal_for_claims, Auth, Staff};
pub use resolver::{resolve, ResolveError};
pub use tokens::{TokenPair, TokenService};
