// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password hashing with Argon2id.
//!
//! Hashes are stored as PHC strings, so parameters and salts travel with
//! the hash and verification stays valid across parameter upgrades.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// A well-formed Argon2id hash that matches no password.
///
/// Verified when login hits a nonexistent account, so the request costs
/// the same hashing work as one against a real account. Parameters match
/// [`Argon2::default`].
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$AAAAAAAAAAAAAAAAAAAAAA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Hash a password with a freshly generated salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash string.
///
/// An unparseable stored hash verifies as false rather than erroring, so
/// a corrupt record behaves like a wrong password.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Burn one verification's worth of hashing work against [`DUMMY_HASH`].
pub fn verify_dummy(password: &str) -> bool {
    verify_password(password, DUMMY_HASH)
}
