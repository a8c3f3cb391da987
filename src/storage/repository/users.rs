// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User repository: accounts addressed by the pair (email, platform).
//!
//! The same email may exist once per platform. Uniqueness is enforced
//! through the `user_identities` index, keyed by a digest of the
//! normalized email and the platform ID.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable, WriteTransaction};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::storage::store::{DEVICES, DEVICE_INDEX, PLATFORMS, USERS, USER_IDENTITIES};
use crate::storage::{Store, StoreError, StoreResult};

use super::devices::{make_index_key, make_owner_prefix, prefix_end, Device};

/// Maximum accepted length for an email address.
const MAX_EMAIL_LEN: usize = 254;

/// Normalize an email address: trim whitespace and lowercase the domain
/// part after the final `@`. The local part keeps its case.
pub fn normalize_email(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => trimmed.to_string(),
    }
}

/// Derive the identity key for an (email, platform) pair.
///
/// The key is the lowercase hex SHA-256 of `normalized_email|platform_id`.
/// Two users with the same email on different platforms get distinct keys.
pub fn derive_identity_key(email: &str, platform_id: &str) -> String {
    let normalized = normalize_email(email);
    let digest = Sha256::digest(format!("{normalized}|{platform_id}").as_bytes());
    format!("{digest:x}")
}

/// A user account, scoped to exactly one platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID (UUID v4).
    pub id: String,
    /// Normalized email address.
    pub email: String,
    /// Platform this account belongs to.
    pub platform_id: String,
    /// Digest of (email, platform), mirrors the `user_identities` index.
    pub identity_key: String,
    /// Argon2id hash of the password (PHC string).
    pub password_hash: String,
    /// Inactive accounts cannot log in or use previously issued tokens.
    pub is_active: bool,
    /// Staff accounts may use the admin endpoints.
    pub is_staff: bool,
    /// Superusers are staff with full privileges.
    pub is_superuser: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub platform_id: String,
    /// Already-hashed password (PHC string).
    pub password_hash: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Repository for user records.
pub struct UserRepository<'a> {
    store: &'a Store,
}

impl<'a> UserRepository<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Create a user, enforcing one account per (email, platform).
    ///
    /// The identity check and both inserts run in one write transaction,
    /// so two concurrent signups for the same pair cannot both succeed.
    pub fn create(&self, new_user: NewUser) -> StoreResult<User> {
        let email = normalize_email(&new_user.email);
        if email.is_empty() {
            return Err(StoreError::Invalid("email must not be empty".to_string()));
        }
        if !email.contains('@') || email.len() > MAX_EMAIL_LEN {
            return Err(StoreError::Invalid(
                "email must be a valid address".to_string(),
            ));
        }

        let identity_key = derive_identity_key(&email, &new_user.platform_id);
        let user = User {
            id: Uuid::new_v4().to_string(),
            email,
            platform_id: new_user.platform_id,
            identity_key,
            password_hash: new_user.password_hash,
            is_active: true,
            is_staff: new_user.is_staff,
            is_superuser: new_user.is_superuser,
            created_at: Utc::now(),
        };
        let json = serde_json::to_vec(&user)?;

        let write_txn = self.store.db().begin_write()?;
        {
            let platforms_table = write_txn.open_table(PLATFORMS)?;
            if platforms_table.get(user.platform_id.as_str())?.is_none() {
                return Err(StoreError::NotFound("platform not found".to_string()));
            }

            let mut identities_table = write_txn.open_table(USER_IDENTITIES)?;
            if identities_table.get(user.identity_key.as_str())?.is_some() {
                return Err(StoreError::AlreadyExists(
                    "user already exists for this email and platform".to_string(),
                ));
            }
            identities_table.insert(user.identity_key.as_str(), user.id.as_str())?;

            let mut users_table = write_txn.open_table(USERS)?;
            users_table.insert(user.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;

        Ok(user)
    }

    /// Look up a user by ID.
    pub fn get(&self, user_id: &str) -> StoreResult<User> {
        let read_txn = self.store.db().begin_read()?;
        let table = read_txn.open_table(USERS)?;
        match table.get(user_id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(StoreError::NotFound("user not found".to_string())),
        }
    }

    /// Look up a user by (email, platform). The email is normalized first.
    pub fn find_by_identity(&self, email: &str, platform_id: &str) -> StoreResult<Option<User>> {
        let identity_key = derive_identity_key(email, platform_id);

        let read_txn = self.store.db().begin_read()?;
        let identities_table = read_txn.open_table(USER_IDENTITIES)?;
        let user_id = match identities_table.get(identity_key.as_str())? {
            Some(value) => value.value().to_string(),
            None => return Ok(None),
        };

        let users_table = read_txn.open_table(USERS)?;
        match users_table.get(user_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Activate or deactivate an account.
    pub fn set_active(&self, user_id: &str, is_active: bool) -> StoreResult<()> {
        let write_txn = self.store.db().begin_write()?;
        {
            let mut table = write_txn.open_table(USERS)?;

            // Read existing value and deserialize before mutating
            let existing_bytes = {
                let existing = table
                    .get(user_id)?
                    .ok_or_else(|| StoreError::NotFound("user not found".to_string()))?;
                existing.value().to_vec()
            };

            let mut user: User = serde_json::from_slice(&existing_bytes)?;
            user.is_active = is_active;

            let json = serde_json::to_vec(&user)?;
            table.insert(user_id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Replace the stored password hash. The hash is an opaque PHC string
    /// produced by the auth layer; the repository never sees the cleartext.
    pub fn set_password(&self, user_id: &str, password_hash: &str) -> StoreResult<()> {
        let write_txn = self.store.db().begin_write()?;
        {
            let mut table = write_txn.open_table(USERS)?;

            let existing_bytes = {
                let existing = table
                    .get(user_id)?
                    .ok_or_else(|| StoreError::NotFound("user not found".to_string()))?;
                existing.value().to_vec()
            };

            let mut user: User = serde_json::from_slice(&existing_bytes)?;
            user.password_hash = password_hash.to_string();

            let json = serde_json::to_vec(&user)?;
            table.insert(user_id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Move a user to another platform.
    ///
    /// Rewrites the identity index, the user record, and every device the
    /// user owns (denormalized platform_id plus index keys) in one write
    /// transaction. Fails if the target platform does not exist or the
    /// user's email is already taken there.
    pub fn set_platform(&self, user_id: &str, new_platform_id: &str) -> StoreResult<User> {
        let write_txn = self.store.db().begin_write()?;
        let updated = {
            let mut user: User = {
                let table = write_txn.open_table(USERS)?;
                let bytes = table
                    .get(user_id)?
                    .ok_or_else(|| StoreError::NotFound("user not found".to_string()))?
                    .value()
                    .to_vec();
                serde_json::from_slice(&bytes)?
            };

            {
                let platforms_table = write_txn.open_table(PLATFORMS)?;
                if platforms_table.get(new_platform_id)?.is_none() {
                    return Err(StoreError::NotFound("platform not found".to_string()));
                }
            }

            let new_key = derive_identity_key(&user.email, new_platform_id);
            {
                let mut identities_table = write_txn.open_table(USER_IDENTITIES)?;
                if identities_table.get(new_key.as_str())?.is_some() {
                    return Err(StoreError::AlreadyExists(
                        "user already exists for this email and platform".to_string(),
                    ));
                }
                identities_table.remove(user.identity_key.as_str())?;
                identities_table.insert(new_key.as_str(), user_id)?;
            }

            user.platform_id = new_platform_id.to_string();
            user.identity_key = new_key;
            {
                let mut users_table = write_txn.open_table(USERS)?;
                let json = serde_json::to_vec(&user)?;
                users_table.insert(user_id, json.as_slice())?;
            }

            // Re-home the user's devices so the denormalized platform_id
            // and the index keys stay consistent with the user record.
            let moves: Vec<(Vec<u8>, String)> = {
                let index_table = write_txn.open_table(DEVICE_INDEX)?;
                let prefix = make_owner_prefix(user_id);
                let end = prefix_end(&prefix);
                let mut moves = Vec::new();
                for entry in index_table.range(prefix.as_slice()..end.as_slice())? {
                    let (key, value) = entry?;
                    moves.push((key.value().to_vec(), value.value().to_string()));
                }
                moves
            };

            {
                let mut devices_table = write_txn.open_table(DEVICES)?;
                let mut index_table = write_txn.open_table(DEVICE_INDEX)?;
                for (old_key, device_id) in &moves {
                    let mut device: Device = {
                        let bytes = devices_table
                            .get(device_id.as_str())?
                            .ok_or_else(|| {
                                StoreError::NotFound("device not found".to_string())
                            })?
                            .value()
                            .to_vec();
                        serde_json::from_slice(&bytes)?
                    };
                    device.platform_id = new_platform_id.to_string();
                    let json = serde_json::to_vec(&device)?;
                    devices_table.insert(device_id.as_str(), json.as_slice())?;

                    index_table.remove(old_key.as_slice())?;
                    let new_index = make_index_key(
                        user_id,
                        new_platform_id,
                        device.created_at.timestamp_micros(),
                        device_id,
                    );
                    index_table.insert(new_index.as_slice(), device_id.as_str())?;
                }
            }

            user
        };
        write_txn.commit()?;
        Ok(updated)
    }

    /// Delete a user and cascade to their devices.
    pub fn delete(&self, user_id: &str) -> StoreResult<()> {
        let write_txn = self.store.db().begin_write()?;
        {
            let user: User = {
                let table = write_txn.open_table(USERS)?;
                let bytes = table
                    .get(user_id)?
                    .ok_or_else(|| StoreError::NotFound("user not found".to_string()))?
                    .value()
                    .to_vec();
                serde_json::from_slice(&bytes)?
            };
            purge_user_records(&write_txn, &user)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

/// Remove a user, their identity entry, and all their devices inside an
/// already-open write transaction. Used by the cascading deletes.
pub(crate) fn purge_user_records(write_txn: &WriteTransaction, user: &User) -> StoreResult<()> {
    let doomed: Vec<(Vec<u8>, String)> = {
        let index_table = write_txn.open_table(DEVICE_INDEX)?;
        let prefix = make_owner_prefix(&user.id);
        let end = prefix_end(&prefix);
        let mut doomed = Vec::new();
        for entry in index_table.range(prefix.as_slice()..end.as_slice())? {
            let (key, value) = entry?;
            doomed.push((key.value().to_vec(), value.value().to_string()));
        }
        doomed
    };

    {
        let mut devices_table = write_txn.open_table(DEVICES)?;
        let mut index_table = write_txn.open_table(DEVICE_INDEX)?;
        for (index_key, device_id) in &doomed {
            devices_table.remove(device_id.as_str())?;
            index_table.remove(index_key.as_slice())?;
        }
    }

    {
        let mut identities_table = write_txn.open_table(USER_IDENTITIES)?;
        identities_table.remove(user.identity_key.as_str())?;
    }

    {
        let mut users_table = write_txn.open_table(USERS)?;
        users_table.remove(user.id.as_str())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::repository::devices::{DeviceRepository, NewDevice};
    use crate::storage::repository::platforms::PlatformRepository;

    fn temp_store() -> (Store, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&dir.path().join("test.redb")).unwrap();
        (store, dir)
    }

    fn new_user(email: &str, platform_id: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            platform_id: platform_id.to_string(),
            password_hash: "hash".to_string(),
            is_staff: false,
            is_superuser: false,
        }
    }

    #[test]
    fn normalize_email_lowercases_domain_only() {
        assert_eq!(normalize_email("  User@Example.COM  "), "User@example.com");
        assert_eq!(normalize_email("a@b@EXample.com"), "a@b@example.com");
        assert_eq!(normalize_email(" plain "), "plain");
    }

    #[test]
    fn identity_key_is_deterministic_and_platform_scoped() {
        let a = derive_identity_key("user@example.com", "plat_1");
        let b = derive_identity_key("user@example.com", "plat_1");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let other_platform = derive_identity_key("user@example.com", "plat_2");
        assert_ne!(a, other_platform);

        // Domain case folds, local part case does not
        assert_eq!(a, derive_identity_key("user@EXAMPLE.com", "plat_1"));
        assert_ne!(a, derive_identity_key("User@example.com", "plat_1"));
    }

    #[test]
    fn create_and_get_user() {
        let (store, _dir) = temp_store();
        let platform = PlatformRepository::new(&store).create("Android").unwrap();
        let repo = UserRepository::new(&store);

        let created = repo
            .create(new_user("  Alice@Example.COM ", &platform.id))
            .unwrap();
        assert_eq!(created.email, "Alice@example.com");
        assert!(created.is_active);

        let fetched = repo.get(&created.id).unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.platform_id, platform.id);
    }

    #[test]
    fn same_email_on_two_platforms_creates_distinct_users() {
        let (store, _dir) = temp_store();
        let platforms = PlatformRepository::new(&store);
        let android = platforms.create("Android").unwrap();
        let ios = platforms.create("iOS").unwrap();

        let repo = UserRepository::new(&store);
        let on_android = repo.create(new_user("user@example.com", &android.id)).unwrap();
        let on_ios = repo.create(new_user("user@example.com", &ios.id)).unwrap();

        assert_ne!(on_android.id, on_ios.id);
        assert_ne!(on_android.identity_key, on_ios.identity_key);
    }

    #[test]
    fn duplicate_email_on_same_platform_fails() {
        let (store, _dir) = temp_store();
        let platform = PlatformRepository::new(&store).create("Android").unwrap();
        let repo = UserRepository::new(&store);

        repo.create(new_user("user@example.com", &platform.id)).unwrap();

        // Same identity even with a differently-cased domain
        let result = repo.create(new_user("user@EXAMPLE.com", &platform.id));
        assert!(matches!(result, Err(StoreError::AlreadyExists(_))));
    }

    #[test]
    fn create_requires_existing_platform() {
        let (store, _dir) = temp_store();
        let repo = UserRepository::new(&store);

        let result = repo.create(new_user("user@example.com", "missing-platform"));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn invalid_email_rejected() {
        let (store, _dir) = temp_store();
        let platform = PlatformRepository::new(&store).create("Android").unwrap();
        let repo = UserRepository::new(&store);

        assert!(matches!(
            repo.create(new_user("   ", &platform.id)),
            Err(StoreError::Invalid(_))
        ));
        assert!(matches!(
            repo.create(new_user("not-an-email", &platform.id)),
            Err(StoreError::Invalid(_))
        ));
    }

    #[test]
    fn find_by_identity_normalizes_email() {
        let (store, _dir) = temp_store();
        let platform = PlatformRepository::new(&store).create("Android").unwrap();
        let repo = UserRepository::new(&store);

        let created = repo.create(new_user("user@example.com", &platform.id)).unwrap();

        let found = repo
            .find_by_identity("  user@EXAMPLE.COM ", &platform.id)
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);

        assert!(repo
            .find_by_identity("user@example.com", "other-platform")
            .unwrap()
            .is_none());
    }

    #[test]
    fn set_active_flips_flag() {
        let (store, _dir) = temp_store();
        let platform = PlatformRepository::new(&store).create("Android").unwrap();
        let repo = UserRepository::new(&store);

        let user = repo.create(new_user("user@example.com", &platform.id)).unwrap();
        repo.set_active(&user.id, false).unwrap();
        assert!(!repo.get(&user.id).unwrap().is_active);

        repo.set_active(&user.id, true).unwrap();
        assert!(repo.get(&user.id).unwrap().is_active);
    }

    #[test]
    fn set_password_swaps_the_stored_hash() {
        let (store, _dir) = temp_store();
        let platform = PlatformRepository::new(&store).create("Android").unwrap();
        let repo = UserRepository::new(&store);

        let user = repo.create(new_user("user@example.com", &platform.id)).unwrap();
        assert_eq!(repo.get(&user.id).unwrap().password_hash, "hash");

        repo.set_password(&user.id, "new-hash").unwrap();
        assert_eq!(repo.get(&user.id).unwrap().password_hash, "new-hash");

        assert!(matches!(
            repo.set_password("missing-user", "hash"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn set_platform_moves_user_and_devices() {
        let (store, _dir) = temp_store();
        let platforms = PlatformRepository::new(&store);
        let android = platforms.create("Android").unwrap();
        let web = platforms.create("Web").unwrap();

        let users = UserRepository::new(&store);
        let user = users.create(new_user("user@example.com", &android.id)).unwrap();

        let devices = DeviceRepository::new(&store);
        let device = devices
            .create(
                &user.id,
                NewDevice {
                    name: "Pixel".to_string(),
                    ip_address: "192.168.1.10".parse().unwrap(),
                    is_active: true,
                },
            )
            .unwrap();
        assert_eq!(device.platform_id, android.id);

        let moved = users.set_platform(&user.id, &web.id).unwrap();
        assert_eq!(moved.platform_id, web.id);

        // Devices follow the user to the new platform
        let on_web = devices.list_scoped(&user.id, &web.id).unwrap();
        assert_eq!(on_web.len(), 1);
        assert_eq!(on_web[0].platform_id, web.id);
        assert!(devices.list_scoped(&user.id, &android.id).unwrap().is_empty());

        // The old identity slot is freed
        assert!(users
            .find_by_identity("user@example.com", &android.id)
            .unwrap()
            .is_none());
        users.create(new_user("user@example.com", &android.id)).unwrap();
    }

    #[test]
    fn set_platform_rejects_occupied_identity() {
        let (store, _dir) = temp_store();
        let platforms = PlatformRepository::new(&store);
        let android = platforms.create("Android").unwrap();
        let ios = platforms.create("iOS").unwrap();

        let users = UserRepository::new(&store);
        let mover = users.create(new_user("user@example.com", &android.id)).unwrap();
        users.create(new_user("user@example.com", &ios.id)).unwrap();

        let result = users.set_platform(&mover.id, &ios.id);
        assert!(matches!(result, Err(StoreError::AlreadyExists(_))));

        // The failed move leaves the original identity intact
        let still_there = users
            .find_by_identity("user@example.com", &android.id)
            .unwrap()
            .unwrap();
        assert_eq!(still_there.id, mover.id);
    }

    #[test]
    fn delete_user_cascades_devices() {
        let (store, _dir) = temp_store();
        let platform = PlatformRepository::new(&store).create("Android").unwrap();
        let users = UserRepository::new(&store);
        let devices = DeviceRepository::new(&store);

        let user = users.create(new_user("user@example.com", &platform.id)).unwrap();
        let device = devices
            .create(
                &user.id,
                NewDevice {
                    name: "Pixel".to_string(),
                    ip_address: "192.168.1.10".parse().unwrap(),
                    is_active: true,
                },
            )
            .unwrap();

        users.delete(&user.id).unwrap();

        assert!(matches!(users.get(&user.id), Err(StoreError::NotFound(_))));
        assert!(matches!(
            devices.get_scoped(&device.id, &user.id, &platform.id),
            Err(StoreError::NotFound(_))
        ));
        assert!(devices.list_scoped(&user.id, &platform.id).unwrap().is_empty());
    }
}
