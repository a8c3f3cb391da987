// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded identity database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `platforms`: platform_id → serialized Platform
//! - `platform_names`: platform name → platform_id (uniqueness index)
//! - `users`: user_id → serialized User
//! - `user_identities`: identity_key → user_id (compound-uniqueness index)
//! - `devices`: device_id → serialized Device
//! - `device_index`: composite key (user_id|platform_id|!created_at|device_id) → device_id

use std::path::Path;

use redb::{Database, ReadableDatabase, TableDefinition};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: platform_id → serialized Platform (JSON bytes).
pub(crate) const PLATFORMS: TableDefinition<&str, &[u8]> = TableDefinition::new("platforms");

/// Index: platform name → platform_id. Enforces globally unique names.
pub(crate) const PLATFORM_NAMES: TableDefinition<&str, &str> =
    TableDefinition::new("platform_names");

/// Primary table: user_id → serialized User (JSON bytes).
pub(crate) const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Index: identity_key → user_id. Enforces one account per (email, platform).
pub(crate) const USER_IDENTITIES: TableDefinition<&str, &str> =
    TableDefinition::new("user_identities");

/// Primary table: device_id → serialized Device (JSON bytes).
pub(crate) const DEVICES: TableDefinition<&str, &[u8]> = TableDefinition::new("devices");

/// Index: composite key → device_id.
/// Key format: `user_id|platform_id|!created_at_be|device_id` for
/// newest-first range scans already narrowed to one tenant scope.
pub(crate) const DEVICE_INDEX: TableDefinition<&[u8], &str> = TableDefinition::new("device_index");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("{0}")]
    Invalid(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Store
// =============================================================================

/// Embedded ACID identity store.
///
/// The store only owns the database handle; record operations live in the
/// repository types under [`super::repository`]. redb serializes write
/// transactions internally, so the store is shared without extra locking.
pub struct Store {
    db: Database,
}

impl Store {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(PLATFORMS)?;
            let _ = write_txn.open_table(PLATFORM_NAMES)?;
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USER_IDENTITIES)?;
            let _ = write_txn.open_table(DEVICES)?;
            let _ = write_txn.open_table(DEVICE_INDEX)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Verify the database is readable. Used by the readiness probe.
    pub fn ping(&self) -> StoreResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(PLATFORMS)?;
        Ok(())
    }

    pub(crate) fn db(&self) -> &Database {
        &self.db
    }
}

// =============================================================================
// Tests
// =============================================================================
