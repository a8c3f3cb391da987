// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Identity Storage Module
//!
//! This module provides persistent storage using an embedded **redb**
//! database. All records live in a single database file under the
//! configured data directory.
//!
//! ## Consistency Model
//!
//! - Every multi-record change (uniqueness check plus insert, cascading
//!   delete, platform move) runs inside one redb write transaction
//! - redb serializes write transactions, so check-and-insert is atomic
//! - Uniqueness indexes (`platform_names`, `user_identities`) are written
//!   in the same transaction as the records they guard
//!
//! ## Storage Layout
//!
//! ```text
//! {DATA_DIR}/identity.redb
//!   platforms        # platform_id → Platform
//!   platform_names   # name → platform_id
//!   users            # user_id → User
//!   user_identities  # sha256(email|platform_id) → user_id
//!   devices          # device_id → Device
//!   device_index     # user_id|platform_id|!created_at|device_id → device_id
//! ```

pub mod repository;
pub mod scope;
pub mod store;

pub use repository::{
    derive_identity_key, normalize_email, Device, DeviceChanges, DeviceRepository, NewDevice,
    NewUser, Platform, PlatformRepository, User, UserRepository,
};
pub use scope::{PlatformScoped, ScopedLookup};
pub use store::{Store, StoreError, StoreResult};
