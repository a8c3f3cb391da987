// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! First-run provisioning.
//!
//! A fresh database has no platforms and no users, so nobody can log in
//! and nobody can reach the staff endpoints that would let them fix
//! that. [`bootstrap_superuser`] breaks the deadlock by creating a
//! staff account on its own platform. [`seed_demo_data`] fills the
//! store with a small fixture set for local development.
//!
//! Both steps are idempotent and safe to run on every startup.

use std::net::{IpAddr, Ipv4Addr};

use crate::auth::password::hash_password;
use crate::storage::{
    DeviceRepository, NewDevice, NewUser, PlatformRepository, Store, StoreError, User,
    UserRepository,
};

/// Platform the bootstrap superuser is homed on.
pub const DEFAULT_ADMIN_PLATFORM: &str = "Admin";

const DEMO_PLATFORMS: [&str; 3] = ["Android", "iOS", "Web"];
const DEMO_EMAIL: &str = "user@example.com";
const DEMO_PASSWORD: &str = "password123";

/// Errors raised during startup provisioning.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to hash password: {0}")]
    Hash(argon2::password_hash::Error),
}

/// Ensure a staff superuser exists for the configured credentials.
///
/// The account lives on the [`DEFAULT_ADMIN_PLATFORM`] platform, which
/// is created on demand. If an account already exists for the identity
/// it is returned as is; in particular the password is NOT reset, so a
/// rotated `BOOTSTRAP_ADMIN_PASSWORD` has no effect on an existing
/// account.
pub fn bootstrap_superuser(store: &Store, email: &str, password: &str) -> Result<User, BootstrapError> {
    let platform = PlatformRepository::new(store).get_or_create(DEFAULT_ADMIN_PLATFORM)?;

    let users = UserRepository::new(store);
    if let Some(existing) = users.find_by_identity(email, &platform.id)? {
        tracing::debug!(user_id = %existing.id, "bootstrap superuser already present");
        return Ok(existing);
    }

    let password_hash = hash_password(password).map_err(BootstrapError::Hash)?;
    let user = users.create(NewUser {
        email: email.to_string(),
        platform_id: platform.id,
        password_hash,
        is_staff: true,
        is_superuser: true,
    })?;

    tracing::info!(user_id = %user.id, "bootstrap superuser created");
    Ok(user)
}

/// Seed demo platforms, one demo identity per platform, and a couple of
/// devices each.
///
/// The same email is reused across platforms deliberately: the fixture
/// demonstrates that (email, platform) pairs are independent accounts.
pub fn seed_demo_data(store: &Store) -> Result<(), BootstrapError> {
    let platforms = PlatformRepository::new(store);
    let users = UserRepository::new(store);
    let devices = DeviceRepository::new(store);

    for name in DEMO_PLATFORMS {
        let platform = platforms.get_or_create(name)?;
        if users.find_by_identity(DEMO_EMAIL, &platform.id)?.is_some() {
            continue;
        }

        let password_hash = hash_password(DEMO_PASSWORD).map_err(BootstrapError::Hash)?;
        let user = users.create(NewUser {
            email: DEMO_EMAIL.to_string(),
            platform_id: platform.id.clone(),
            password_hash,
            is_staff: false,
            is_superuser: false,
        })?;

        devices.create(
            &user.id,
            NewDevice {
                name: format!("{name} Device 1"),
                ip_address: IpAddr::from(Ipv4Addr::new(192, 168, 1, 101)),
                is_active: true,
            },
        )?;
        devices.create(
            &user.id,
            NewDevice {
                name: format!("{name} Device 2"),
                ip_address: IpAddr::from(Ipv4Addr::new(10, 0, 0, 5)),
                is_active: false,
            },
        )?;

        tracing::info!(platform = name, user_id = %user.id, "seeded demo identity");
    }

    Ok(())
}
