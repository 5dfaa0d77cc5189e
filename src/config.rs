// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values, and the
//! [`AppConfig`] loaded from them at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Root directory for recipes, users and audit logs | `./data` |
//! | `JWT_SECRET` | HS256 signing secret for issued tokens | Required |
//! | `JWT_ISSUER` | `iss` claim of issued tokens | `recipes-identity` |
//! | `JWT_EXPIRES_IN_SECS` | Lifetime of issued tokens | `3600` |
//! | `CLIENT_ORIGIN` | Origin allowed by CORS | Required |
//! | `MAGIC_SECRET_KEY` | Passwordless provider admin key | Required |
//! | `MAGIC_API_BASE_URL` | Passwordless provider API | `https://api.magic.link` |
//! | `THROTTLE_TTL` | Throttle window in seconds | `15` |
//! | `THROTTLE_LIMIT` | Requests allowed per window | `4` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `LOG_PATH` | Optional file receiving JSON logs | unset |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files enabling HTTPS | unset |
//! | `SEED_ADMIN_EMAIL` | Email that is ensured to be an active admin | unset |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;

use url::Url;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the data directory path.
///
/// Recipes are stored as JSON documents below it, users in `users.redb`,
/// and audit events under `audit/`.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_ISSUER_ENV: &str = "JWT_ISSUER";
pub const JWT_EXPIRES_IN_ENV: &str = "JWT_EXPIRES_IN_SECS";
pub const CLIENT_ORIGIN_ENV: &str = "CLIENT_ORIGIN";
pub const MAGIC_SECRET_KEY_ENV: &str = "MAGIC_SECRET_KEY";
pub const MAGIC_API_BASE_URL_ENV: &str = "MAGIC_API_BASE_URL";
pub const THROTTLE_TTL_ENV: &str = "THROTTLE_TTL";
pub const THROTTLE_LIMIT_ENV: &str = "THROTTLE_LIMIT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const LOG_PATH_ENV: &str = "LOG_PATH";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const SEED_ADMIN_EMAIL_ENV: &str = "SEED_ADMIN_EMAIL";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_JWT_ISSUER: &str = "recipes-identity";
pub const DEFAULT_JWT_EXPIRES_IN_SECS: u64 = 3600;
pub const DEFAULT_MAGIC_API_BASE_URL: &str = "https://api.magic.link";
pub const DEFAULT_THROTTLE_TTL_SECS: u64 = 15;
pub const DEFAULT_THROTTLE_LIMIT: u32 = 4;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub expires_in_secs: u64,
}

#[derive(Debug, Clone)]
pub struct MagicSettings {
    pub secret_key: String,
    pub api_base_url: Url,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleSettings {
    pub ttl_secs: u64,
    pub limit: u32,
}

#[derive(Debug, Clone)]
pub struct TlsSettings {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// Complete server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub jwt: JwtSettings,
    pub client_origin: String,
    pub magic: MagicSettings,
    pub throttle: ThrottleSettings,
    pub log_format: LogFormat,
    pub log_path: Option<PathBuf>,
    pub tls: Option<TlsSettings>,
    pub seed_admin_email: Option<String>,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let magic_base = get(MAGIC_API_BASE_URL_ENV)
            .unwrap_or_else(|| DEFAULT_MAGIC_API_BASE_URL.to_string());
        let api_base_url = Url::parse(&magic_base).map_err(|e| ConfigError::Invalid {
            var: MAGIC_API_BASE_URL_ENV,
            value: magic_base.clone(),
            reason: e.to_string(),
        })?;

        let client_origin = required(CLIENT_ORIGIN_ENV)?;
        Url::parse(&client_origin).map_err(|e| ConfigError::Invalid {
            var: CLIENT_ORIGIN_ENV,
            value: client_origin.clone(),
            reason: e.to_string(),
        })?;

        let throttle = ThrottleSettings {
            ttl_secs: parse_or(&get, THROTTLE_TTL_ENV, DEFAULT_THROTTLE_TTL_SECS)?,
            limit: parse_or(&get, THROTTLE_LIMIT_ENV, DEFAULT_THROTTLE_LIMIT)?,
        };
        if throttle.ttl_secs == 0 || throttle.limit == 0 {
            return Err(ConfigError::Invalid {
                var: THROTTLE_LIMIT_ENV,
                value: format!("{}/{}s", throttle.limit, throttle.ttl_secs),
                reason: "throttle limit and window must be positive".to_string(),
            });
        }

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsSettings {
                cert_path: cert.into(),
                key_path: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(TLS_KEY_PATH_ENV)),
            (None, Some(_)) => return Err(ConfigError::Missing(TLS_CERT_PATH_ENV)),
        };

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(&get, PORT_ENV, DEFAULT_PORT)?,
            data_dir: get(DATA_DIR_ENV)
                .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())
                .into(),
            jwt: JwtSettings {
                secret: required(JWT_SECRET_ENV)?,
                issuer: get(JWT_ISSUER_ENV).unwrap_or_else(|| DEFAULT_JWT_ISSUER.to_string()),
                expires_in_secs: parse_or(&get, JWT_EXPIRES_IN_ENV, DEFAULT_JWT_EXPIRES_IN_SECS)?,
            },
            client_origin,
            magic: MagicSettings {
                secret_key: required(MAGIC_SECRET_KEY_ENV)?,
                api_base_url,
            },
            throttle,
            log_format,
            log_path: get(LOG_PATH_ENV).map(PathBuf::from),
            tls,
            seed_admin_email: get(SEED_ADMIN_EMAIL_ENV),
        })
    }

    /// `host:port` string used for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, G>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: raw,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (JWT_SECRET_ENV, "secret"),
            (CLIENT_ORIGIN_ENV, "http://localhost:8081"),
            (MAGIC_SECRET_KEY_ENV, "sk_test_123"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn defaults_applied_when_optional_vars_unset() {
        let config = load(&base_env()).unwrap();
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.jwt.issuer, DEFAULT_JWT_ISSUER);
        assert_eq!(config.jwt.expires_in_secs, DEFAULT_JWT_EXPIRES_IN_SECS);
        assert_eq!(
            config.throttle,
            ThrottleSettings {
                ttl_secs: 15,
                limit: 4
            }
        );
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.magic.api_base_url.as_str(), "https://api.magic.link/");
        assert!(config.tls.is_none());
        assert!(config.log_path.is_none());
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn missing_required_var_is_reported() {
        let mut env = base_env();
        env.remove(JWT_SECRET_ENV);
        assert_eq!(load(&env).unwrap_err(), ConfigError::Missing(JWT_SECRET_ENV));
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let mut env = base_env();
        env.insert(MAGIC_SECRET_KEY_ENV, "  ");
        assert_eq!(
            load(&env).unwrap_err(),
            ConfigError::Missing(MAGIC_SECRET_KEY_ENV)
        );
    }

    #[test]
    fn invalid_port_is_rejected() {
        let mut env = base_env();
        env.insert(PORT_ENV, "not-a-port");
        assert!(matches!(
            load(&env),
            Err(ConfigError::Invalid { var: PORT_ENV, .. })
        ));
    }

    #[test]
    fn zero_throttle_limit_is_rejected() {
        let mut env = base_env();
        env.insert(THROTTLE_LIMIT_ENV, "0");
        assert!(matches!(load(&env), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn tls_requires_both_paths() {
        let mut env = base_env();
        env.insert(TLS_CERT_PATH_ENV, "/certs/server.pem");
        assert_eq!(load(&env).unwrap_err(), ConfigError::Missing(TLS_KEY_PATH_ENV));

        env.insert(TLS_KEY_PATH_ENV, "/certs/server.key");
        let tls = load(&env).unwrap().tls.unwrap();
        assert_eq!(tls.cert_path, PathBuf::from("/certs/server.pem"));
        assert_eq!(tls.key_path, PathBuf::from("/certs/server.key"));
    }

    #[test]
    fn json_log_format_is_case_insensitive() {
        let mut env = base_env();
        env.insert(LOG_FORMAT_ENV, "JSON");
        assert_eq!(load(&env).unwrap().log_format, LogFormat::Json);
    }
}
