// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login credential resolution.
//!
//! Resolution distinguishes failure causes internally (for logging), but
//! the HTTP layer collapses everything except store failures into one
//! generic 401. Platform membership is part of the credential: the same
//! email with the same password on another platform is a different
//! account.

use crate::storage::{PlatformRepository, Store, StoreError, User, UserRepository};

use super::password::{verify_dummy, verify_password};

/// Why a login attempt failed. Never surfaced to clients verbatim.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("platform does not exist")]
    UnknownPlatform,

    #[error("credentials did not match")]
    InvalidCredentials,

    #[error("account is inactive")]
    InactiveAccount,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Resolve a login attempt to a user record.
///
/// Checks run in order: platform exists, identity exists, password
/// matches, account active. When the identity is missing, a dummy
/// verification burns the same hashing cost a real check would.
pub fn resolve(
    store: &Store,
    email: &str,
    platform_name: &str,
    password: &str,
) -> Result<User, ResolveError> {
    let platform = match PlatformRepository::new(store).find_by_name(platform_name)? {
        Some(platform) => platform,
        None => {
            tracing::debug!(platform = %platform_name, "login against unknown platform");
            return Err(ResolveError::UnknownPlatform);
        }
    };

    let user = match UserRepository::new(store).find_by_identity(email, &platform.id)? {
        Some(user) => user,
        None => {
            let _ = verify_dummy(password);
            tracing::debug!(platform = %platform.name, "login for unknown identity");
            return Err(ResolveError::InvalidCredentials);
        }
    };

    if !verify_password(password, &user.password_hash) {
        tracing::debug!(user_id = %user.id, "login with wrong password");
        return Err(ResolveError::InvalidCredentials);
    }

    if !user.is_active {
        tracing::debug!(user_id = %user.id, "login for inactive account");
        return Err(ResolveError::InactiveAccount);
    }

    Ok(user)
}
