use anyhow::{bail, Context};
use serde::Deserialize;

pub const DEFAULT_TTL_MINUTES: i64 = 60;
/// One year.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "ledger".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "ledger-users".into()),
            ttl_minutes: parse_ttl_minutes(std::env::var("JWT_TTL_MINUTES").ok().as_deref())?,
        };
        Ok(Self { database_url, jwt })
    }
}

/// `JWT_TTL_MINUTES`: unset means the default, anything else must be a whole
/// number of minutes in `1..=MAX_TTL_MINUTES`.
fn parse_ttl_minutes(raw: Option<&str>) -> anyhow::Result<i64> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(DEFAULT_TTL_MINUTES);
    };
    let minutes: i64 = raw
        .parse()
        .with_context(|| format!("JWT_TTL_MINUTES is not a number: {raw}"))?;
    if !(1..=MAX_TTL_MINUTES).contains(&minutes) {
        bail!("JWT_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}, got {minutes}");
    }
    Ok(minutes)
}
