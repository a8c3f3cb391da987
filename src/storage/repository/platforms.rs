// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Platform repository: tenant records with globally unique names.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::storage::store::{PLATFORMS, PLATFORM_NAMES, USERS};
use crate::storage::{Store, StoreError, StoreResult};

use super::users::{purge_user_records, User};

/// Maximum accepted length for a platform name.
const MAX_NAME_LEN: usize = 100;

/// A registered tenant boundary.
///
/// Every user and device belongs to exactly one platform. Names are
/// globally unique and matched exactly (after trimming) at login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Platform {
    /// Unique platform ID (UUID v4).
    pub id: String,
    /// Globally unique platform name, e.g. "Android".
    pub name: String,
    /// When the platform was registered.
    pub created_at: DateTime<Utc>,
}

/// Repository for platform records.
pub struct PlatformRepository<'a> {
    store: &'a Store,
}

impl<'a> PlatformRepository<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Register a new platform with a unique name.
    ///
    /// The name uniqueness check and the insert run in one write
    /// transaction, so concurrent creates of the same name cannot both
    /// succeed.
    pub fn create(&self, name: &str) -> StoreResult<Platform> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Invalid(
                "platform name must not be empty".to_string(),
            ));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(StoreError::Invalid(format!(
                "platform name must not exceed {MAX_NAME_LEN} characters"
            )));
        }

        let platform = Platform {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_vec(&platform)?;

        let write_txn = self.store.db().begin_write()?;
        {
            let mut names_table = write_txn.open_table(PLATFORM_NAMES)?;
            if names_table.get(name)?.is_some() {
                return Err(StoreError::AlreadyExists(format!(
                    "platform {name} already exists"
                )));
            }
            names_table.insert(name, platform.id.as_str())?;

            let mut platforms_table = write_txn.open_table(PLATFORMS)?;
            platforms_table.insert(platform.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;

        Ok(platform)
    }

    /// Look up a platform by ID.
    pub fn get(&self, platform_id: &str) -> StoreResult<Platform> {
        let read_txn = self.store.db().begin_read()?;
        let table = read_txn.open_table(PLATFORMS)?;
        match table.get(platform_id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(StoreError::NotFound("platform not found".to_string())),
        }
    }

    /// Look up a platform by its exact name (trimmed).
    pub fn find_by_name(&self, name: &str) -> StoreResult<Option<Platform>> {
        let name = name.trim();
        let read_txn = self.store.db().begin_read()?;
        let names_table = read_txn.open_table(PLATFORM_NAMES)?;
        let platform_id = match names_table.get(name)? {
            Some(value) => value.value().to_string(),
            None => return Ok(None),
        };

        let platforms_table = read_txn.open_table(PLATFORMS)?;
        match platforms_table.get(platform_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Return the platform with the given name, creating it if absent.
    pub fn get_or_create(&self, name: &str) -> StoreResult<Platform> {
        if let Some(platform) = self.find_by_name(name)? {
            return Ok(platform);
        }
        self.create(name)
    }

    /// List all platforms, sorted by name.
    pub fn list(&self) -> StoreResult<Vec<Platform>> {
        let read_txn = self.store.db().begin_read()?;
        let table = read_txn.open_table(PLATFORMS)?;

        let mut platforms = Vec::new();
        for entry in table.range::<&str>(..)? {
            let (_, value) = entry?;
            let platform: Platform = serde_json::from_slice(value.value())?;
            platforms.push(platform);
        }
        platforms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(platforms)
    }

    /// Delete a platform and cascade to its users and their devices.
    ///
    /// The whole cascade runs in one write transaction. Either the
    /// platform, all member users, and all their devices disappear
    /// together, or nothing changes.
    pub fn delete(&self, platform_id: &str) -> StoreResult<()> {
        let write_txn = self.store.db().begin_write()?;
        {
            let platform: Platform = {
                let table = write_txn.open_table(PLATFORMS)?;
                let bytes = table
                    .get(platform_id)?
                    .ok_or_else(|| StoreError::NotFound("platform not found".to_string()))?
                    .value()
                    .to_vec();
                serde_json::from_slice(&bytes)?
            };

            let members: Vec<User> = {
                let table = write_txn.open_table(USERS)?;
                let mut members = Vec::new();
                for entry in table.range::<&str>(..)? {
                    let (_, value) = entry?;
                    let user: User = serde_json::from_slice(value.value())?;
                    if user.platform_id == platform_id {
                        members.push(user);
                    }
                }
                members
            };

            for user in &members {
                purge_user_records(&write_txn, user)?;
            }

            let mut platforms_table = write_txn.open_table(PLATFORMS)?;
            platforms_table.remove(platform_id)?;

            let mut names_table = write_txn.open_table(PLATFORM_NAMES)?;
            names_table.remove(platform.name.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}
