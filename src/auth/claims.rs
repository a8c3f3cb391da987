// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and the authenticated principal.

use serde::{Deserialize, Serialize};

use crate::storage::User;

/// Which kind of token a claim set belongs to.
///
/// Access tokens authorize API calls; refresh tokens are only accepted
/// by the refresh endpoint. The kind is embedded in the token itself so
/// one can never stand in for the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims as they appear on the wire, signed HS256.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Platform the token was minted for. Tokens without this claim are
    /// rejected at verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_id: Option<String>,

    /// Token kind ("access" or "refresh")
    pub token_type: TokenKind,
}

/// Claims that survived signature, lifetime, kind, and platform checks.
#[derive(Debug, Clone)]
pub struct VerifiedClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Platform the token was minted for
    pub platform_id: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Token kind
    pub kind: TokenKind,
}

/// Authenticated caller information derived from a verified token plus
/// the current user record.
///
/// This is the primary type used throughout the application to represent
/// the caller making a request. Its platform always reflects the stored
/// record, re-checked against the token on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    /// Canonical user ID (token `sub` claim)
    pub user_id: String,

    /// Normalized email of the account
    pub email: String,

    /// Platform the caller is scoped to
    pub platform_id: String,

    /// Whether the caller may use the admin endpoints
    pub is_staff: bool,

    /// Whether the caller is a superuser
    pub is_superuser: bool,

    /// Token expiration (Unix timestamp, used for logging, not serialized)
    #[serde(skip)]
    pub expires_at: i64,
}

impl Principal {
    /// Build a principal from a stored user and a token expiry.
    pub fn from_user(user: &User, expires_at: i64) -> Self {
        Self {
            user_id: user.id.clone(),
            email: user.email.clone(),
            platform_id: user.platform_id.clone(),
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            expires_at,
        }
    }
}
