// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the identity store.
//!
//! Each repository provides CRUD operations for a specific record type,
//! using the shared redb database for all persistence.

pub mod devices;
pub mod platforms;
pub mod users;

pub use devices::{Device, DeviceChanges, DeviceRepository, NewDevice};
pub use platforms::{Platform, PlatformRepository};
pub use users::{derive_identity_key, normalize_email, NewUser, User, UserRepository};
