// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Device repository: per-user device records, scoped to one tenant.
//!
//! Listing never scans foreign records. The `device_index` table is keyed
//! by `user_id|platform_id|!created_at|device_id`, so a range scan over
//! one caller's prefix yields exactly that caller's devices, newest first.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::store::{DEVICES, DEVICE_INDEX, USERS};
use crate::storage::{PlatformScoped, ScopedLookup, Store, StoreError, StoreResult};

use super::users::User;

/// Maximum accepted length for a device name.
const MAX_NAME_LEN: usize = 200;

/// A device registered by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Unique device ID (UUID v4).
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Owning platform, denormalized from the owner at write time.
    pub platform_id: String,
    /// Human-readable device name.
    pub name: String,
    /// Last known IP address of the device.
    pub ip_address: IpAddr,
    /// Whether the device is currently active.
    pub is_active: bool,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last modified.
    pub updated_at: DateTime<Utc>,
}

impl PlatformScoped for Device {
    fn owner_user_id(&self) -> &str {
        &self.user_id
    }

    fn platform_id(&self) -> &str {
        &self.platform_id
    }
}

/// Fields required to register a device.
#[derive(Debug, Clone)]
pub struct NewDevice {
    pub name: String,
    pub ip_address: IpAddr,
    pub is_active: bool,
}

/// Partial update to a device. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct DeviceChanges {
    pub name: Option<String>,
    pub ip_address: Option<IpAddr>,
    pub is_active: Option<bool>,
}

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Build a composite key for the device_index table.
///
/// Format: `user_id | platform_id | inverted_timestamp_be_bytes | device_id`
///
/// The inverted timestamp ensures newest-first ordering when scanning
/// forward. IDs are UUIDs, so the separator byte cannot collide.
pub(crate) fn make_index_key(
    user_id: &str,
    platform_id: &str,
    created_at_micros: i64,
    device_id: &str,
) -> Vec<u8> {
    let mut key =
        Vec::with_capacity(user_id.len() + platform_id.len() + device_id.len() + 8 + 3);
    key.extend_from_slice(user_id.as_bytes());
    key.push(b'|');
    key.extend_from_slice(platform_id.as_bytes());
    key.push(b'|');
    // Invert timestamp for descending order (newest first)
    key.extend_from_slice(&(!created_at_micros as u64).to_be_bytes());
    key.push(b'|');
    key.extend_from_slice(device_id.as_bytes());
    key
}

/// Build a prefix for range scanning one (user, platform) scope.
pub(crate) fn make_scope_prefix(user_id: &str, platform_id: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(user_id.len() + platform_id.len() + 2);
    prefix.extend_from_slice(user_id.as_bytes());
    prefix.push(b'|');
    prefix.extend_from_slice(platform_id.as_bytes());
    prefix.push(b'|');
    prefix
}

/// Build a prefix for range scanning all devices of a user, regardless of
/// platform. Used by the cascading deletes and the platform move.
pub(crate) fn make_owner_prefix(user_id: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(user_id.len() + 1);
    prefix.extend_from_slice(user_id.as_bytes());
    prefix.push(b'|');
    prefix
}

/// Build the upper bound for a range scan (prefix with 0xFF bytes appended).
pub(crate) fn prefix_end(prefix: &[u8]) -> Vec<u8> {
    let mut end = Vec::with_capacity(prefix.len() + 20);
    end.extend_from_slice(prefix);
    // Append enough 0xFF bytes to be past any valid key with this prefix
    end.extend_from_slice(&[0xFF; 20]);
    end
}

// =============================================================================
// DeviceRepository
// =============================================================================

/// Repository for device records.
pub struct DeviceRepository<'a> {
    store: &'a Store,
}

impl<'a> DeviceRepository<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Register a device for a user.
    ///
    /// The device inherits the owner's platform at write time; callers
    /// never choose it. Record and index entry land in one transaction.
    pub fn create(&self, owner_user_id: &str, new_device: NewDevice) -> StoreResult<Device> {
        let name = new_device.name.trim();
        validate_name(name)?;

        let write_txn = self.store.db().begin_write()?;
        let device = {
            let owner: User = {
                let table = write_txn.open_table(USERS)?;
                let bytes = table
                    .get(owner_user_id)?
                    .ok_or_else(|| StoreError::NotFound("user not found".to_string()))?
                    .value()
                    .to_vec();
                serde_json::from_slice(&bytes)?
            };

            let now = Utc::now();
            let device = Device {
                id: Uuid::new_v4().to_string(),
                user_id: owner.id.clone(),
                platform_id: owner.platform_id.clone(),
                name: name.to_string(),
                ip_address: new_device.ip_address,
                is_active: new_device.is_active,
                created_at: now,
                updated_at: now,
            };
            let json = serde_json::to_vec(&device)?;

            {
                let mut devices_table = write_txn.open_table(DEVICES)?;
                devices_table.insert(device.id.as_str(), json.as_slice())?;
            }
            {
                let mut index_table = write_txn.open_table(DEVICE_INDEX)?;
                let key = make_index_key(
                    &device.user_id,
                    &device.platform_id,
                    device.created_at.timestamp_micros(),
                    &device.id,
                );
                index_table.insert(key.as_slice(), device.id.as_str())?;
            }
            device
        };
        write_txn.commit()?;

        Ok(device)
    }

    /// Look up a device within the caller's scope.
    ///
    /// A device owned by another user or platform resolves to `NotFound`,
    /// exactly like a missing one.
    pub fn get_scoped(
        &self,
        device_id: &str,
        owner_user_id: &str,
        platform_id: &str,
    ) -> StoreResult<Device> {
        let read_txn = self.store.db().begin_read()?;
        let table = read_txn.open_table(DEVICES)?;
        let raw = table.get(device_id)?.map(|v| v.value().to_vec());
        let device = raw
            .map(|bytes| serde_json::from_slice::<Device>(&bytes))
            .transpose()?;
        device.scoped_to(owner_user_id, platform_id, "device")
    }

    /// List the caller's devices, newest first.
    ///
    /// The scan is bounded to the caller's index prefix, so records from
    /// other scopes are never read, let alone filtered out.
    pub fn list_scoped(&self, owner_user_id: &str, platform_id: &str) -> StoreResult<Vec<Device>> {
        let read_txn = self.store.db().begin_read()?;
        let index_table = read_txn.open_table(DEVICE_INDEX)?;
        let devices_table = read_txn.open_table(DEVICES)?;

        let prefix = make_scope_prefix(owner_user_id, platform_id);
        let end = prefix_end(&prefix);

        let mut devices = Vec::new();
        for entry in index_table.range(prefix.as_slice()..end.as_slice())? {
            let (_, value) = entry?;
            if let Some(raw) = devices_table.get(value.value())? {
                let device: Device = serde_json::from_slice(raw.value())?;
                devices.push(device);
            }
        }
        Ok(devices)
    }

    /// Apply changes to a device within the caller's scope.
    ///
    /// Full replacements pass every field as `Some`; partial updates pass
    /// only the fields to change.
    pub fn update_scoped(
        &self,
        device_id: &str,
        owner_user_id: &str,
        platform_id: &str,
        changes: DeviceChanges,
    ) -> StoreResult<Device> {
        if let Some(name) = &changes.name {
            validate_name(name.trim())?;
        }

        let write_txn = self.store.db().begin_write()?;
        let updated = {
            let mut table = write_txn.open_table(DEVICES)?;

            let raw = table.get(device_id)?.map(|v| v.value().to_vec());
            let existing = raw
                .map(|bytes| serde_json::from_slice::<Device>(&bytes))
                .transpose()?;
            let mut device = existing.scoped_to(owner_user_id, platform_id, "device")?;

            if let Some(name) = changes.name {
                device.name = name.trim().to_string();
            }
            if let Some(ip_address) = changes.ip_address {
                device.ip_address = ip_address;
            }
            if let Some(is_active) = changes.is_active {
                device.is_active = is_active;
            }
            device.updated_at = Utc::now();

            let json = serde_json::to_vec(&device)?;
            table.insert(device_id, json.as_slice())?;
            device
        };
        write_txn.commit()?;

        Ok(updated)
    }

    /// Delete a device within the caller's scope.
    pub fn delete_scoped(
        &self,
        device_id: &str,
        owner_user_id: &str,
        platform_id: &str,
    ) -> StoreResult<()> {
        let write_txn = self.store.db().begin_write()?;
        {
            let device = {
                let table = write_txn.open_table(DEVICES)?;
                let raw = table.get(device_id)?.map(|v| v.value().to_vec());
                let existing = raw
                    .map(|bytes| serde_json::from_slice::<Device>(&bytes))
                    .transpose()?;
                existing.scoped_to(owner_user_id, platform_id, "device")?
            };

            {
                let mut devices_table = write_txn.open_table(DEVICES)?;
                devices_table.remove(device_id)?;
            }
            {
                let mut index_table = write_txn.open_table(DEVICE_INDEX)?;
                let key = make_index_key(
                    &device.user_id,
                    &device.platform_id,
                    device.created_at.timestamp_micros(),
                    &device.id,
                );
                index_table.remove(key.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }
}

fn validate_name(name: &str) -> StoreResult<()> {
    if name.is_empty() {
        return Err(StoreError::Invalid(
            "device name must not be empty".to_string(),
        ));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(StoreError::Invalid(format!(
            "device name must not exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}
