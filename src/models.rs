// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API. All types derive `Serialize`, `Deserialize`, and `ToSchema`
//! for automatic JSON handling and OpenAPI documentation.
//!
//! ## Scoping
//!
//! Device payloads never carry owner or platform fields. Ownership comes
//! from the verified access token, and unknown JSON fields are ignored,
//! so a client cannot plant a record in another tenant by naming it.
//!
//! ## Model Categories
//!
//! - **Auth**: Login and token refresh payloads
//! - **Devices**: Device CRUD payloads
//! - **Admin**: Platform management payloads

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::Device;

// =============================================================================
// Auth Models
// =============================================================================

/// Login request: credentials plus the platform being signed into.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Email address of the account.
    pub email: String,
    /// Plaintext password, verified against the stored Argon2id hash.
    pub password: String,
    /// Platform name, e.g. "Android". Part of the credential: the same
    /// email on another platform is a different account.
    pub platform: String,
}

/// Successful login response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Short-lived access token (HS256 JWT).
    pub access: String,
    /// Long-lived refresh token (HS256 JWT).
    pub refresh: String,
    /// ID of the authenticated user.
    pub user_id: String,
    /// Normalized email of the authenticated user.
    pub email: String,
    /// Platform name the tokens are scoped to.
    pub platform: String,
}

/// Request to exchange a refresh token for a new access token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefreshRequest {
    /// A refresh token from a previous login.
    pub refresh: String,
}

/// Response carrying a freshly minted access token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    /// Short-lived access token (HS256 JWT).
    pub access: String,
}

/// The authenticated caller, as reported by `GET /users/me`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    /// Canonical user ID.
    pub user_id: String,
    /// Normalized email address.
    pub email: String,
    /// ID of the platform the account belongs to.
    pub platform_id: String,
    /// Name of the platform the account belongs to.
    pub platform: String,
    /// Whether the account may use the admin endpoints.
    pub is_staff: bool,
    /// Whether the account is a superuser.
    pub is_superuser: bool,
}

// =============================================================================
// Device Models
// =============================================================================

/// A device record, as returned by the API.
///
/// Owner and platform are implied by the access token used to fetch it
/// and are not repeated in the payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeviceResponse {
    /// Unique device ID.
    pub id: String,
    /// Human-readable device name.
    pub name: String,
    /// Last known IP address (v4 or v6).
    #[schema(value_type = String)]
    pub ip_address: IpAddr,
    /// Whether the device is currently active.
    pub is_active: bool,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last modified.
    pub updated_at: DateTime<Utc>,
}

impl From<Device> for DeviceResponse {
    fn from(device: Device) -> Self {
        Self {
            id: device.id,
            name: device.name,
            ip_address: device.ip_address,
            is_active: device.is_active,
            created_at: device.created_at,
            updated_at: device.updated_at,
        }
    }
}

/// Request to register a device.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateDeviceRequest {
    /// Human-readable device name.
    pub name: String,
    /// IP address of the device (v4 or v6).
    #[schema(value_type = String)]
    pub ip_address: IpAddr,
    /// Whether the device starts active. Defaults to true.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Full update of a device (`PUT`).
///
/// Name and address are required; omitting `is_active` leaves it as is.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateDeviceRequest {
    /// New device name.
    pub name: String,
    /// New IP address (v4 or v6).
    #[schema(value_type = String)]
    pub ip_address: IpAddr,
    /// New active flag, if it should change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Partial update of a device (`PATCH`). Omitted fields are unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PatchDeviceRequest {
    /// New device name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New IP address (v4 or v6).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub ip_address: Option<IpAddr>,
    /// New active flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

// =============================================================================
// Admin Models
// =============================================================================

/// Request to register a platform.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatePlatformRequest {
    /// Globally unique platform name.
    pub name: String,
}

fn default_true() -> bool {
    true
}
