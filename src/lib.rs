// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Platform Device Server - Multi-Tenant Device Registry
//!
//! This crate provides a small identity and device-registry service where
//! accounts are scoped to platforms: the same email on two platforms is
//! two independent accounts, each with its own password and devices.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Credential checks and JWT access/refresh tokens
//! - `bootstrap` - First-run superuser and demo-data provisioning
//! - `storage` - Embedded identity store (redb)

pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
