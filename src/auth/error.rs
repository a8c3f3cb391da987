// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication error type.
///
/// Credential failures at login are always reported as
/// `InvalidCredentials`, whatever actually went wrong, so the response
/// cannot be used to probe which emails or platforms exist.
#[derive(Debug)]
pub enum AuthError {
    /// No authorization header present
    MissingAuthHeader,
    /// Invalid authorization header format
    InvalidAuthHeader,
    /// Token is malformed
    MalformedToken,
    /// Token signature is invalid
    InvalidSignature,
    /// Token has expired
    TokenExpired,
    /// Token is not yet valid
    TokenNotYetValid,
    /// Token carries no platform claim
    MissingPlatformClaim,
    /// Access token presented where a refresh token is required, or vice versa
    WrongTokenKind,
    /// Token platform no longer matches the user's stored platform
    PlatformMismatch,
    /// Generic login failure (unknown platform, unknown user, bad password,
    /// or inactive account)
    InvalidCredentials,
    /// Token subject no longer exists
    UnknownUser,
    /// Account has been deactivated
    InactiveUser,
    /// Insufficient permissions
    InsufficientPermissions,
    /// Identity store could not be reached
    StoreUnavailable,
    /// Internal error
    InternalError(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
            AuthError::MissingPlatformClaim => "missing_platform_claim",
            AuthError::WrongTokenKind => "wrong_token_kind",
            AuthError::PlatformMismatch => "platform_mismatch",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::UnknownUser => "user_not_found",
            AuthError::InactiveUser => "user_inactive",
            AuthError::InsufficientPermissions => "insufficient_permissions",
            AuthError::StoreUnavailable => "store_unavailable",
            AuthError::InternalError(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::MalformedToken
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::TokenNotYetValid
            | AuthError::MissingPlatformClaim
            | AuthError::WrongTokenKind
            | AuthError::PlatformMismatch
            | AuthError::InvalidCredentials
            | AuthError::UnknownUser
            | AuthError::InactiveUser => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AuthError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeader => write!(f, "Authorization header is required"),
            AuthError::InvalidAuthHeader => {
                write!(f, "Invalid authorization header format (expected 'Bearer <token>')")
            }
            AuthError::MalformedToken => write!(f, "Token is malformed"),
            AuthError::InvalidSignature => write!(f, "Token signature is invalid"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::TokenNotYetValid => write!(f, "Token is not yet valid"),
            AuthError::MissingPlatformClaim => write!(f, "Token contains no platform claim"),
            AuthError::WrongTokenKind => write!(f, "Token has wrong type"),
            AuthError::PlatformMismatch => {
                write!(f, "User does not belong to the token platform")
            }
            AuthError::InvalidCredentials => {
                write!(f, "No active account found with the given credentials")
            }
            AuthError::UnknownUser => write!(f, "User not found"),
            AuthError::InactiveUser => write!(f, "User is inactive"),
            AuthError::InsufficientPermissions => {
                write!(f, "Insufficient permissions for this operation")
            }
            AuthError::StoreUnavailable => write!(f, "Identity store is unavailable"),
            AuthError::InternalError(msg) => write!(f, "Internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
