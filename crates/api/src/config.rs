//! Process configuration, read once from the environment at startup.

use std::env;

use anyhow::{anyhow, Context};
use chrono::Duration;

use dailyspend_auth::{Hs256Tokens, PasswordHasher};
use dailyspend_observability::LogFormat;

pub const DEFAULT_JWT_SECRET: &str = "dev_secret_change_me";
const DEFAULT_PORT: u16 = 4000;

/// Username/password of the account promoted to admin at startup.
#[derive(Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl core::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct ApiConfig {
    pub bind_addr: String,
    pub jwt_secret: String,
    /// True when `JWT_SECRET` was missing and the dev default is in use.
    pub insecure_jwt_secret: bool,
    pub token_ttl: Duration,
    pub password_hash_rounds: u32,
    /// Postgres when set, in-memory otherwise.
    pub database_url: Option<String>,
    pub admin: Option<AdminCredentials>,
    pub log_format: LogFormat,
    pub cors_permissive: bool,
}

impl core::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("insecure_jwt_secret", &self.insecure_jwt_secret)
            .field("token_ttl", &self.token_ttl)
            .field("password_hash_rounds", &self.password_hash_rounds)
            .field("database", &self.database_url.as_ref().map(|_| "postgres"))
            .field("admin", &self.admin)
            .field("log_format", &self.log_format)
            .field("cors_permissive", &self.cors_permissive)
            .finish_non_exhaustive()
    }
}

impl ApiConfig {
    /// Defaults for everything except the signing secret.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{DEFAULT_PORT}"),
            jwt_secret: jwt_secret.into(),
            insecure_jwt_secret: false,
            token_ttl: Duration::days(Hs256Tokens::DEFAULT_TTL_DAYS),
            password_hash_rounds: PasswordHasher::DEFAULT_ROUNDS,
            database_url: None,
            admin: None,
            log_format: LogFormat::Json,
            cors_permissive: true,
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let (jwt_secret, insecure_jwt_secret) = match get("JWT_SECRET") {
            Some(secret) => (secret, false),
            None => (DEFAULT_JWT_SECRET.to_string(), true),
        };
        let mut config = Self::new(jwt_secret);
        config.insecure_jwt_secret = insecure_jwt_secret;

        if let Some(addr) = get("BIND_ADDR") {
            config.bind_addr = addr;
        } else if let Some(port) = get("PORT") {
            let port: u16 = port.parse().with_context(|| format!("PORT must be a port number, got '{port}'"))?;
            config.bind_addr = format!("0.0.0.0:{port}");
        }

        if let Some(days) = get("TOKEN_TTL_DAYS") {
            let days: i64 = days
                .parse()
                .with_context(|| format!("TOKEN_TTL_DAYS must be an integer, got '{days}'"))?;
            if days <= 0 {
                return Err(anyhow!("TOKEN_TTL_DAYS must be positive"));
            }
            config.token_ttl = Duration::days(days);
        }

        if let Some(rounds) = get("PASSWORD_HASH_ROUNDS") {
            let rounds: u32 = rounds
                .parse()
                .with_context(|| format!("PASSWORD_HASH_ROUNDS must be an integer, got '{rounds}'"))?;
            if rounds == 0 {
                return Err(anyhow!("PASSWORD_HASH_ROUNDS must be at least 1"));
            }
            config.password_hash_rounds = rounds;
        }

        config.database_url = get("DATABASE_URL");

        config.admin = match (get("ADMIN_USERNAME"), lookup("ADMIN_PASSWORD").filter(|p| !p.is_empty())) {
            (Some(username), Some(password)) => Some(AdminCredentials { username, password }),
            (None, None) => None,
            _ => return Err(anyhow!("ADMIN_USERNAME and ADMIN_PASSWORD must be set together")),
        };

        if let Some(format) = get("LOG_FORMAT") {
            config.log_format = format.parse::<LogFormat>().map_err(|e: String| anyhow!(e))?;
        }

        if let Some(flag) = get("CORS_PERMISSIVE") {
            config.cors_permissive = parse_bool(&flag)
                .ok_or_else(|| anyhow!("CORS_PERMISSIVE must be true or false, got '{flag}'"))?;
        }

        Ok(config)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
