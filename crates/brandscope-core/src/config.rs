use std::env::VarError;
use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

use crate::app_config::{AppConfig, ClientConfig, Environment};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Load server configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_app_config(|key| std::env::var(key))
}

/// Load client configuration from environment variables.
///
/// Every client setting has a default, so this only fails on unparseable values.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if a numeric setting cannot be parsed.
pub fn load_client_config() -> Result<ClientConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_client_config(|key| std::env::var(key))
}

/// Reads `var` through `lookup` and parses it, falling back to `default`.
fn parse_or<T, F>(lookup: &F, var: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Result<String, VarError>,
{
    let raw = lookup(var).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Build server configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let anthropic_api_key = lookup("ANTHROPIC_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar("ANTHROPIC_API_KEY".to_string()))?;

    let env = parse_environment(&or_default("BRANDSCOPE_ENV", "development"))?;
    let bind_addr: SocketAddr = parse_or(&lookup, "BRANDSCOPE_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("BRANDSCOPE_LOG_LEVEL", "info");
    let model = or_default("BRANDSCOPE_MODEL", "claude-sonnet-4-20250514");
    let max_tokens: u32 = parse_or(&lookup, "BRANDSCOPE_MAX_TOKENS", "8192")?;
    let upstream_url = or_default("BRANDSCOPE_UPSTREAM_URL", "https://api.anthropic.com");
    let upstream_timeout_secs: u64 = parse_or(&lookup, "BRANDSCOPE_UPSTREAM_TIMEOUT_SECS", "300")?;
    let token_budget: usize = parse_or(&lookup, "BRANDSCOPE_TOKEN_BUDGET", "150000")?;
    let max_platforms: usize = parse_or(&lookup, "BRANDSCOPE_MAX_PLATFORMS", "12")?;
    let max_body_bytes: usize = parse_or(&lookup, "BRANDSCOPE_MAX_BODY_BYTES", "20971520")?;

    if max_platforms == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "BRANDSCOPE_MAX_PLATFORMS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        anthropic_api_key,
        model,
        max_tokens,
        upstream_url,
        upstream_timeout_secs,
        token_budget,
        max_platforms,
        max_body_bytes,
    })
}

fn build_client_config<F>(lookup: F) -> Result<ClientConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let server_url = lookup("BRANDSCOPE_SERVER_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:3000".to_string())
        .trim_end_matches('/')
        .to_string();
    let report_sink_url = lookup("BRANDSCOPE_REPORT_SINK_URL")
        .ok()
        .filter(|u| !u.trim().is_empty());
    let request_timeout_secs: u64 =
        parse_or(&lookup, "BRANDSCOPE_CLIENT_TIMEOUT_SECS", "330")?;
    let token_budget: usize = parse_or(&lookup, "BRANDSCOPE_TOKEN_BUDGET", "150000")?;

    Ok(ClientConfig {
        server_url,
        report_sink_url,
        request_timeout_secs,
        token_budget,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "BRANDSCOPE_ENV".to_string(),
            reason: format!("expected development, test, or production, got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
