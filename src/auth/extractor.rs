// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated callers.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(principal): Auth) -> impl IntoResponse {
//!     // principal.user_id / principal.platform_id scope every lookup
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::state::AppState;
use crate::storage::{StoreError, UserRepository};

use super::claims::{Principal, TokenKind, VerifiedClaims};
use super::error::AuthError;

/// Extractor for authenticated callers.
///
/// Validates the bearer token from the Authorization header, then
/// re-checks the subject against the store: the account must still
/// exist, still be active, and still belong to the platform named in
/// the token. A user moved to another platform after the token was
/// minted is rejected even though the signature remains valid.
pub struct Auth(pub Principal);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?;

        // Only access tokens authorize API calls
        let claims = state.tokens.verify(token, TokenKind::Access)?;
        let principal = principal_for_claims(state, &claims)?;

        Ok(Auth(principal))
    }
}

/// Resolve verified claims to a principal against the current store state.
pub fn principal_for_claims(
    state: &AppState,
    claims: &VerifiedClaims,
) -> Result<Principal, AuthError> {
    let users = UserRepository::new(&state.store);
    let user = match users.get(&claims.sub) {
        Ok(user) => user,
        Err(StoreError::NotFound(_)) => return Err(AuthError::UnknownUser),
        Err(e) => {
            tracing::error!(error = %e, "user lookup failed during token auth");
            return Err(AuthError::StoreUnavailable);
        }
    };

    if !user.is_active {
        return Err(AuthError::InactiveUser);
    }

    if user.platform_id != claims.platform_id {
        tracing::warn!(
            user_id = %user.id,
            "token platform no longer matches stored platform"
        );
        return Err(AuthError::PlatformMismatch);
    }

    Ok(Principal::from_user(&user, claims.exp))
}

/// Extractor that requires a staff account.
pub struct Staff(pub Principal);

impl FromRequestParts<AppState> for Staff {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Auth(principal) = Auth::from_request_parts(parts, state).await?;

        if !principal.is_staff {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(Staff(principal))
    }
}
