// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authenticated user endpoints.

use axum::{extract::State, Json};

use crate::auth::Auth;
use crate::error::ApiError;
use crate::models::MeResponse;
use crate::state::AppState;
use crate::storage::PlatformRepository;

/// Return the caller's identity as seen by the server.
///
/// The platform name is resolved from the store so the response always
/// reflects the current platform record, not what the token was minted
/// with.
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The caller's identity", body = MeResponse),
        (status = 401, description = "Missing or invalid access token")
    )
)]
pub async fn me(
    State(state): State<AppState>,
    Auth(principal): Auth,
) -> Result<Json<MeResponse>, ApiError> {
    let platform = PlatformRepository::new(&state.store).get(&principal.platform_id)?;

    Ok(Json(MeResponse {
        user_id: principal.user_id,
        email: principal.email,
        platform_id: principal.platform_id,
        platform: platform.name,
        is_staff: principal.is_staff,
        is_superuser: principal.is_superuser,
    }))
}
