// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Device CRUD endpoints.
//!
//! Every handler operates inside the caller's (user, platform) scope,
//! taken from the verified access token. A device belonging to someone
//! else is answered exactly like a device that does not exist.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::auth::Auth;
use crate::error::ApiError;
use crate::models::{
    CreateDeviceRequest, DeviceResponse, PatchDeviceRequest, UpdateDeviceRequest,
};
use crate::state::AppState;
use crate::storage::{DeviceChanges, DeviceRepository, NewDevice};

/// List the caller's devices, newest first.
#[utoipa::path(
    get,
    path = "/devices",
    tag = "Devices",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Devices owned by the caller", body = [DeviceResponse]),
        (status = 401, description = "Missing or invalid access token")
    )
)]
pub async fn list_devices(
    State(state): State<AppState>,
    Auth(principal): Auth,
) -> Result<Json<Vec<DeviceResponse>>, ApiError> {
    let devices = DeviceRepository::new(&state.store)
        .list_scoped(&principal.user_id, &principal.platform_id)?;
    Ok(Json(devices.into_iter().map(DeviceResponse::from).collect()))
}

/// Register a device under the caller's identity.
///
/// Owner and platform come from the token, never from the payload.
#[utoipa::path(
    post,
    path = "/devices",
    tag = "Devices",
    security(("bearer_auth" = [])),
    request_body = CreateDeviceRequest,
    responses(
        (status = 201, description = "Device registered", body = DeviceResponse),
        (status = 400, description = "Invalid device name or address"),
        (status = 401, description = "Missing or invalid access token")
    )
)]
pub async fn create_device(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Json(request): Json<CreateDeviceRequest>,
) -> Result<(StatusCode, Json<DeviceResponse>), ApiError> {
    let device = DeviceRepository::new(&state.store).create(
        &principal.user_id,
        NewDevice {
            name: request.name,
            ip_address: request.ip_address,
            is_active: request.is_active,
        },
    )?;

    tracing::info!(device_id = %device.id, user_id = %principal.user_id, "device registered");
    Ok((StatusCode::CREATED, Json(device.into())))
}

/// Fetch one of the caller's devices by ID.
#[utoipa::path(
    get,
    path = "/devices/{device_id}",
    tag = "Devices",
    security(("bearer_auth" = [])),
    params(("device_id" = String, Path, description = "Device ID")),
    responses(
        (status = 200, description = "The device", body = DeviceResponse),
        (status = 401, description = "Missing or invalid access token"),
        (status = 404, description = "No such device in the caller's scope")
    )
)]
pub async fn get_device(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(device_id): Path<String>,
) -> Result<Json<DeviceResponse>, ApiError> {
    let device = DeviceRepository::new(&state.store).get_scoped(
        &device_id,
        &principal.user_id,
        &principal.platform_id,
    )?;
    Ok(Json(device.into()))
}

/// Replace a device's name and address.
///
/// `is_active` may be included to change it; when omitted the stored
/// flag is kept.
#[utoipa::path(
    put,
    path = "/devices/{device_id}",
    tag = "Devices",
    security(("bearer_auth" = [])),
    params(("device_id" = String, Path, description = "Device ID")),
    request_body = UpdateDeviceRequest,
    responses(
        (status = 200, description = "Updated device", body = DeviceResponse),
        (status = 400, description = "Invalid device name or address"),
        (status = 401, description = "Missing or invalid access token"),
        (status = 404, description = "No such device in the caller's scope")
    )
)]
pub async fn update_device(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(device_id): Path<String>,
    Json(request): Json<UpdateDeviceRequest>,
) -> Result<Json<DeviceResponse>, ApiError> {
    let device = DeviceRepository::new(&state.store).update_scoped(
        &device_id,
        &principal.user_id,
        &principal.platform_id,
        DeviceChanges {
            name: Some(request.name),
            ip_address: Some(request.ip_address),
            is_active: request.is_active,
        },
    )?;
    Ok(Json(device.into()))
}

/// Update selected fields of a device.
#[utoipa::path(
    patch,
    path = "/devices/{device_id}",
    tag = "Devices",
    security(("bearer_auth" = [])),
    params(("device_id" = String, Path, description = "Device ID")),
    request_body = PatchDeviceRequest,
    responses(
        (status = 200, description = "Updated device", body = DeviceResponse),
        (status = 400, description = "Invalid device name or address"),
        (status = 401, description = "Missing or invalid access token"),
        (status = 404, description = "No such device in the caller's scope")
    )
)]
pub async fn patch_device(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(device_id): Path<String>,
    Json(request): Json<PatchDeviceRequest>,
) -> Result<Json<DeviceResponse>, ApiError> {
    let device = DeviceRepository::new(&state.store).update_scoped(
        &device_id,
        &principal.user_id,
        &principal.platform_id,
        DeviceChanges {
            name: request.name,
            ip_address: request.ip_address,
            is_active: request.is_active,
        },
    )?;
    Ok(Json(device.into()))
}

/// Delete one of the caller's devices.
#[utoipa::path(
    delete,
    path = "/devices/{device_id}",
    tag = "Devices",
    security(("bearer_auth" = [])),
    params(("device_id" = String, Path, description = "Device ID")),
    responses(
        (status = 204, description = "Device deleted"),
        (status = 401, description = "Missing or invalid access token"),
        (status = 404, description = "No such device in the caller's scope")
    )
)]
pub async fn delete_device(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(device_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    DeviceRepository::new(&state.store).delete_scoped(
        &device_id,
        &principal.user_id,
        &principal.platform_id,
    )?;

    tracing::info!(device_id = %device_id, user_id = %principal.user_id, "device deleted");
    Ok(StatusCode::NO_CONTENT)
}
