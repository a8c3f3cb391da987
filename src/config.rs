// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values, and the
//! [`Config`] snapshot loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `127.0.0.1` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory holding the identity database | `./data` |
//! | `TOKEN_SIGNING_KEY` | HS256 secret for access/refresh tokens | Required |
//! | `ACCESS_TOKEN_TTL_SECS` | Access token lifetime in seconds | `900` |
//! | `REFRESH_TOKEN_TTL_SECS` | Refresh token lifetime in seconds | `604800` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |
//! | `BOOTSTRAP_ADMIN_EMAIL` | Email for the superuser bootstrap step | Optional |
//! | `BOOTSTRAP_ADMIN_PASSWORD` | Password for the superuser bootstrap step | Optional |
//! | `SEED_DEMO_DATA` | Seed demo platforms/users/devices (`1` or `true`) | Off |

use std::path::PathBuf;

/// Environment variable name for the data directory path.
///
/// The identity database file (`identity.redb`) lives inside this directory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Environment variable name for the server bind address.
pub const HOST_ENV: &str = "HOST";

/// Environment variable name for the server bind port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the token signing secret.
///
/// Access and refresh tokens are signed HS256 with this secret. The server
/// refuses to start without it.
pub const TOKEN_SIGNING_KEY_ENV: &str = "TOKEN_SIGNING_KEY";

/// Environment variable name for the access token lifetime (seconds).
pub const ACCESS_TOKEN_TTL_ENV: &str = "ACCESS_TOKEN_TTL_SECS";

/// Environment variable name for the refresh token lifetime (seconds).
pub const REFRESH_TOKEN_TTL_ENV: &str = "REFRESH_TOKEN_TTL_SECS";

/// Environment variable name for the log output format (`json` or `pretty`).
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Environment variable name for the bootstrap superuser email.
pub const BOOTSTRAP_ADMIN_EMAIL_ENV: &str = "BOOTSTRAP_ADMIN_EMAIL";

/// Environment variable name for the bootstrap superuser password.
pub const BOOTSTRAP_ADMIN_PASSWORD_ENV: &str = "BOOTSTRAP_ADMIN_PASSWORD";

/// Environment variable name for the demo-data seeding switch.
pub const SEED_DEMO_DATA_ENV: &str = "SEED_DEMO_DATA";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_ACCESS_TTL_SECS: i64 = 900;
const DEFAULT_REFRESH_TTL_SECS: i64 = 604_800;

/// Configuration errors raised while reading the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("environment variable {0} has an invalid value")]
    InvalidVar(&'static str),
}

/// Snapshot of the runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address for the HTTP listener.
    pub host: String,
    /// Bind port for the HTTP listener.
    pub port: u16,
    /// Directory holding the identity database file.
    pub data_dir: PathBuf,
    /// HS256 secret used to sign and verify tokens.
    pub token_signing_key: String,
    /// Access token lifetime in seconds.
    pub access_ttl_secs: i64,
    /// Refresh token lifetime in seconds.
    pub refresh_ttl_secs: i64,
    /// Superuser bootstrap credentials, if both variables are set.
    pub bootstrap_admin: Option<(String, String)>,
    /// Whether to seed demo platforms, users, and devices at startup.
    pub seed_demo_data: bool,
}

impl Config {
    /// Load the configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var(HOST_ENV).unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = match std::env::var(PORT_ENV) {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidVar(PORT_ENV))?,
            Err(_) => DEFAULT_PORT,
        };

        let data_dir = std::env::var(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));

        let token_signing_key = std::env::var(TOKEN_SIGNING_KEY_ENV)
            .map_err(|_| ConfigError::MissingVar(TOKEN_SIGNING_KEY_ENV))?;
        if token_signing_key.is_empty() {
            return Err(ConfigError::InvalidVar(TOKEN_SIGNING_KEY_ENV));
        }

        let access_ttl_secs = parse_ttl(ACCESS_TOKEN_TTL_ENV, DEFAULT_ACCESS_TTL_SECS)?;
        let refresh_ttl_secs = parse_ttl(REFRESH_TOKEN_TTL_ENV, DEFAULT_REFRESH_TTL_SECS)?;

        let bootstrap_admin = match (
            std::env::var(BOOTSTRAP_ADMIN_EMAIL_ENV),
            std::env::var(BOOTSTRAP_ADMIN_PASSWORD_ENV),
        ) {
            (Ok(email), Ok(password)) => Some((email, password)),
            _ => None,
        };

        let seed_demo_data = std::env::var(SEED_DEMO_DATA_ENV)
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            host,
            port,
            data_dir,
            token_signing_key,
            access_ttl_secs,
            refresh_ttl_secs,
            bootstrap_admin,
            seed_demo_data,
        })
    }
}

fn parse_ttl(var: &'static str, default: i64) -> Result<i64, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => {
            let secs: i64 = raw.parse().map_err(|_| ConfigError::InvalidVar(var))?;
            if secs <= 0 {
                return Err(ConfigError::InvalidVar(var));
            }
            Ok(secs)
        }
        Err(_) => Ok(default),
    }
}
