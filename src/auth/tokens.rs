// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token minting and verification.
//!
//! Tokens are signed HS256 with the configured secret. Every minted
//! token carries the user's platform, the issue/expiry timestamps, and
//! the token kind, so verification can reject a refresh token used as an
//! access token and vice versa.

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::storage::User;

use super::claims::{TokenClaims, TokenKind, VerifiedClaims};
use super::error::AuthError;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Default access token lifetime: 15 minutes.
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 900;

/// Default refresh token lifetime: 7 days.
pub const DEFAULT_REFRESH_TTL_SECS: i64 = 604_800;

/// An access/refresh token pair minted at login.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Mints and verifies platform-scoped tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenService {
    /// Create a service with the default token lifetimes.
    pub fn new(secret: &[u8]) -> Self {
        Self::with_lifetimes(secret, DEFAULT_ACCESS_TTL_SECS, DEFAULT_REFRESH_TTL_SECS)
    }

    /// Create a service with explicit token lifetimes (seconds).
    pub fn with_lifetimes(secret: &[u8], access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret)),
            decoding: Arc::new(DecodingKey::from_secret(secret)),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    /// Mint an access/refresh pair for a user.
    pub fn mint_pair(&self, user: &User) -> Result<TokenPair, AuthError> {
        let access = self.mint(
            TokenKind::Access,
            &user.id,
            &user.platform_id,
            self.access_ttl_secs,
        )?;
        let refresh = self.mint(
            TokenKind::Refresh,
            &user.id,
            &user.platform_id,
            self.refresh_ttl_secs,
        )?;
        Ok(TokenPair { access, refresh })
    }

    /// Mint a fresh access token. Used by the refresh endpoint.
    pub fn mint_access(&self, user_id: &str, platform_id: &str) -> Result<String, AuthError> {
        self.mint(TokenKind::Access, user_id, platform_id, self.access_ttl_secs)
    }

    fn mint(
        &self,
        kind: TokenKind,
        user_id: &str,
        platform_id: &str,
        ttl_secs: i64,
    ) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + ttl_secs,
            platform_id: Some(platform_id.to_string()),
            token_type: kind,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::InternalError(e.to_string()))
    }

    /// Verify a token's signature, lifetime, kind, and platform claim.
    ///
    /// Verification is pure: it never touches the store and yields the
    /// same result however often it runs on the same token.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<VerifiedClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;

        let token_data =
            decode::<TokenClaims>(token, &self.decoding, &validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AuthError::InvalidSignature
                    }
                    jsonwebtoken::errors::ErrorKind::ImmatureSignature => {
                        AuthError::TokenNotYetValid
                    }
                    _ => AuthError::MalformedToken,
                }
            })?;

        let claims = token_data.claims;
        if claims.token_type != expected {
            return Err(AuthError::WrongTokenKind);
        }
        let platform_id = claims.platform_id.ok_or(AuthError::MissingPlatformClaim)?;

        Ok(VerifiedClaims {
            sub: claims.sub,
            platform_id,
            exp: claims.exp,
            kind: claims.token_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const SECRET: &[u8] = b"test-signing-secret";

    fn sample_user() -> User {
        User {
            id: "user_123".to_string(),
            email: "user@example.com".to_string(),
            platform_id: "plat_1".to_string(),
            identity_key: "key".to_string(),
            password_hash: "hash".to_string(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn minted_pair_verifies_with_expected_claims() {
        let service = TokenService::new(SECRET);
        let pair = service.mint_pair(&sample_user()).unwrap();

        let access = service.verify(&pair.access, TokenKind::Access).unwrap();
        assert_eq!(access.sub, "user_123");
        assert_eq!(access.platform_id, "plat_1");
        assert_eq!(access.kind, TokenKind::Access);

        let refresh = service.verify(&pair.refresh, TokenKind::Refresh).unwrap();
        assert_eq!(refresh.sub, "user_123");
        assert_eq!(refresh.kind, TokenKind::Refresh);
        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn refresh_token_is_rejected_as_access_token() {
        let service = TokenService::new(SECRET);
        let pair = service.mint_pair(&sample_user()).unwrap();

        let result = service.verify(&pair.refresh, TokenKind::Access);
        assert!(matches!(result, Err(AuthError::WrongTokenKind)));

        let result = service.verify(&pair.access, TokenKind::Refresh);
        assert!(matches!(result, Err(AuthError::WrongTokenKind)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let service = TokenService::new(SECRET);
        // Negative lifetime puts the expiry beyond the leeway window
        let token = service
            .mint(TokenKind::Access, "user_123", "plat_1", -120)
            .unwrap();

        let result = service.verify(&token, TokenKind::Access);
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[test]
    fn expiry_within_leeway_is_tolerated() {
        let service = TokenService::new(SECRET);
        let token = service
            .mint(TokenKind::Access, "user_123", "plat_1", -30)
            .unwrap();

        assert!(service.verify(&token, TokenKind::Access).is_ok());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let service = TokenService::new(SECRET);
        let other = TokenService::new(b"another-secret");
        let pair = service.mint_pair(&sample_user()).unwrap();

        let result = other.verify(&pair.access, TokenKind::Access);
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn token_without_platform_claim_is_rejected() {
        #[derive(serde::Serialize)]
        struct BareClaims {
            sub: String,
            iat: i64,
            exp: i64,
            token_type: TokenKind,
        }

        let now = Utc::now().timestamp();
        let token = encode(
            &Header::default(),
            &BareClaims {
                sub: "user_123".to_string(),
                iat: now,
                exp: now + 900,
                token_type: TokenKind::Access,
            },
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        let service = TokenService::new(SECRET);
        let result = service.verify(&token, TokenKind::Access);
        assert!(matches!(result, Err(AuthError::MissingPlatformClaim)));
    }

    #[test]
    fn garbage_token_is_malformed() {
        let service = TokenService::new(SECRET);
        let result = service.verify("definitely.not.a-jwt", TokenKind::Access);
        assert!(matches!(result, Err(AuthError::MalformedToken)));
    }

    #[test]
    fn hand_assembled_token_is_rejected() {
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;
        use base64::Engine;

        let now = Utc::now().timestamp();
        let payload = URL_SAFE_NO_PAD.encode(format!(
            r#"{{"sub":"user_123","iat":{now},"exp":{},"platform_id":"plat_1","token_type":"access"}}"#,
            now + 900
        ));

        let service = TokenService::new(SECRET);

        // Well-formed claims with a forged signature
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let forged = format!("{header}.{payload}.{}", URL_SAFE_NO_PAD.encode("forged"));
        assert!(matches!(
            service.verify(&forged, TokenKind::Access),
            Err(AuthError::InvalidSignature)
        ));

        // alg=none downgrade attempt
        let none_header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let unsigned = format!("{none_header}.{payload}.");
        assert!(matches!(
            service.verify(&unsigned, TokenKind::Access),
            Err(AuthError::MalformedToken)
        ));
    }

    #[test]
    fn verification_is_repeatable() {
        let service = TokenService::new(SECRET);
        let pair = service.mint_pair(&sample_user()).unwrap();

        for _ in 0..3 {
            let claims = service.verify(&pair.access, TokenKind::Access).unwrap();
            assert_eq!(claims.sub, "user_123");
        }
    }
}
