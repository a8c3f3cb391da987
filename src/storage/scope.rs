// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tenant scoping for all record lookups.
//!
//! Every record access is checked against the caller's (user, platform)
//! scope. A record outside the caller's scope resolves to `NotFound`, the
//! same error a genuinely missing record produces, so responses never
//! reveal whether a guessed ID exists in another tenant.

use super::{StoreError, StoreResult};

/// Trait for records that belong to a (user, platform) scope.
pub trait PlatformScoped {
    /// Get the owning user's ID.
    fn owner_user_id(&self) -> &str;

    /// Get the owning platform's ID.
    fn platform_id(&self) -> &str;
}

/// Extension trait resolving an optional lookup against a caller scope.
pub trait ScopedLookup<T> {
    /// Return the record if it exists and matches the caller's scope.
    ///
    /// # Errors
    /// Returns `StoreError::NotFound` if the record is missing or belongs
    /// to another user or platform. The two cases are indistinguishable.
    fn scoped_to(self, owner_user_id: &str, platform_id: &str, resource: &str) -> StoreResult<T>;
}

impl<T: PlatformScoped> ScopedLookup<T> for Option<T> {
    fn scoped_to(self, owner_user_id: &str, platform_id: &str, resource: &str) -> StoreResult<T> {
        match self {
            Some(record)
                if record.owner_user_id() == owner_user_id
                    && record.platform_id() == platform_id =>
            {
                Ok(record)
            }
            _ => Err(StoreError::NotFound(format!("{resource} not found"))),
        }
    }
}
