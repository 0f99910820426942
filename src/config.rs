use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use dotenvy::dotenv;

use crate::view::reconcile::RemovalPolicy;

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub jwt_secret: String,
    pub access_token_ttl: usize,

    // Attendance service
    pub attendance_api_url: String,
    pub remote_timeout: Duration,
    pub removal_policy: RemovalPolicy,
    pub session_idle_ttl: Duration,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| lookup(key).ok_or_else(|| anyhow!("{key} must be set"));

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parsed(&lookup, "ACCESS_TOKEN_TTL", 900)?, // 15 min

            attendance_api_url: lookup("ATTENDANCE_API_URL")
                .unwrap_or_else(|| "http://localhost:5000".to_string()),
            remote_timeout: Duration::from_secs(parsed(&lookup, "REMOTE_TIMEOUT_SECS", 30)?),
            removal_policy: match lookup("REMOVAL_POLICY") {
                Some(value) => RemovalPolicy::parse(&value)
                    .ok_or_else(|| anyhow!("REMOVAL_POLICY must be 'confirmed' or 'optimistic', got '{value}'"))?,
                None => RemovalPolicy::default(),
            },
            session_idle_ttl: Duration::from_secs(parsed(&lookup, "SESSION_IDLE_TTL", 3600)?),

            rate_login_per_min: parsed(&lookup, "RATE_LOGIN_PER_MIN", 60)?,
            rate_protected_per_min: parsed(&lookup, "RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api".to_string()),
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
        })
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value '{value}'")),
        None => Ok(default),
    }
}
