// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login and token refresh endpoints.

use axum::{extract::State, Json};

use crate::auth::{principal_for_claims, resolve, AuthError, ResolveError, TokenKind};
use crate::models::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse};
use crate::state::AppState;

/// Authenticate against a (email, platform) identity and mint tokens.
///
/// Every credential failure (unknown platform, unknown identity, wrong
/// password, inactive account) produces the same 401 body, so the
/// response cannot be used to probe which accounts exist.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token pair for the authenticated user", body = LoginResponse),
        (status = 401, description = "No active account matched the credentials"),
        (status = 503, description = "Identity store unavailable")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    let user = resolve(
        &state.store,
        &request.email,
        &request.platform,
        &request.password,
    )
    .map_err(|e| match e {
        ResolveError::Store(err) => {
            tracing::error!(error = %err, "store failure during login");
            AuthError::StoreUnavailable
        }
        reason => {
            tracing::debug!(reason = %reason, "login rejected");
            AuthError::InvalidCredentials
        }
    })?;

    let pair = state.tokens.mint_pair(&user)?;
    tracing::info!(user_id = %user.id, platform_id = %user.platform_id, "login succeeded");

    Ok(Json(LoginResponse {
        access: pair.access,
        refresh: pair.refresh,
        user_id: user.id,
        email: user.email,
        platform: request.platform.trim().to_string(),
    }))
}

/// Exchange a refresh token for a fresh access token.
///
/// The subject is re-checked against the store: a deleted, deactivated,
/// or re-platformed user cannot refresh, even with a valid token.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "Auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Fresh access token", body = RefreshResponse),
        (status = 401, description = "Refresh token invalid, expired, or of the wrong kind")
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, AuthError> {
    let claims = state.tokens.verify(&request.refresh, TokenKind::Refresh)?;
    let principal = principal_for_claims(&state, &claims)?;

    let access = state
        .tokens
        .mint_access(&principal.user_id, &principal.platform_id)?;
    Ok(Json(RefreshResponse { access }))
}
