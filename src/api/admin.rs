// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Staff-only endpoints for platform management.
//!
//! Platforms are the tenancy boundary of the whole system, so creating
//! and listing them is restricted to staff accounts. Regular accounts
//! get a 403 from the [`Staff`] extractor before any handler runs.

use axum::{extract::State, http::StatusCode, Json};

use crate::auth::Staff;
use crate::error::ApiError;
use crate::models::CreatePlatformRequest;
use crate::state::AppState;
use crate::storage::{Platform, PlatformRepository};

/// List every registered platform, sorted by name.
#[utoipa::path(
    get,
    path = "/admin/platforms",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All registered platforms", body = [Platform]),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Caller is not staff")
    )
)]
pub async fn list_platforms(
    State(state): State<AppState>,
    Staff(_staff): Staff,
) -> Result<Json<Vec<Platform>>, ApiError> {
    let platforms = PlatformRepository::new(&state.store).list()?;
    Ok(Json(platforms))
}

/// Register a new platform.
///
/// Platform names are unique. Registering an existing name is a 409,
/// not an upsert.
#[utoipa::path(
    post,
    path = "/admin/platforms",
    tag = "Admin",
    security(("bearer_auth" = [])),
    request_body = CreatePlatformRequest,
    responses(
        (status = 201, description = "Platform registered", body = Platform),
        (status = 400, description = "Invalid platform name"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Caller is not staff"),
        (status = 409, description = "A platform with this name already exists")
    )
)]
pub async fn create_platform(
    State(state): State<AppState>,
    Staff(principal): Staff,
    Json(request): Json<CreatePlatformRequest>,
) -> Result<(StatusCode, Json<Platform>), ApiError> {
    let platform = PlatformRepository::new(&state.store).create(&request.name)?;

    tracing::info!(
        platform_id = %platform.id,
        name = %platform.name,
        created_by = %principal.user_id,
        "platform registered"
    );
    Ok((StatusCode::CREATED, Json(platform)))
}
