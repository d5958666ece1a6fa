//! Process configuration parsed from environment variables.
//!
//! Only malformed values are errors. A missing flow credential or a missing
//! auth provider is a valid deployment state reported at request time.

use std::path::PathBuf;

use crate::auth::gotrue::GoTrueConfig;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_FLOW_API_URL: &str = "https://9363e1f2-6063-4866-88a4-fd87f601a4c4.astra.datastax.com/api/v1/run/74f55130-bb9c-47b5-b3d7-af3ca14158cc";
pub const DEFAULT_DIST_DIR: &str = "dist";
pub const DEFAULT_DEV_PROXY_PREFIX: &str = "/langflow";

const FLOW_TOKEN_VARS: &[&str] = &["FLOW_API_TOKEN", "ASTRA_DB_APPLICATION_TOKEN", "VITE_ASTRA_DB_APPLICATION_TOKEN"];
const SUPABASE_URL_VARS: &[&str] = &["SUPABASE_URL", "VITE_SUPABASE_URL"];
const SUPABASE_KEY_VARS: &[&str] = &["SUPABASE_ANON_KEY", "VITE_SUPABASE_ANON_KEY"];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Development-only reverse proxy: `{prefix}/rest` is forwarded to `{target}/rest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevProxyConfig {
    pub prefix: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub flow_api_url: String,
    pub flow_api_token: Option<String>,
    pub gotrue: Option<GoTrueConfig>,
    pub dist_dir: PathBuf,
    pub dev_proxy: Option<DevProxyConfig>,
}

impl AppConfig {
    /// Build typed config from the process environment.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `FLOW_API_URL`: remote flow run endpoint
    /// - `FLOW_API_TOKEN` (or `ASTRA_DB_APPLICATION_TOKEN`, `VITE_ASTRA_DB_APPLICATION_TOKEN`)
    /// - `SUPABASE_URL` + `SUPABASE_ANON_KEY` (or their `VITE_` variants)
    /// - `DIST_DIR`: default `dist`
    /// - `DEV_PROXY_TARGET`, `DEV_PROXY_PREFIX` (default `/langflow`)
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` or `DEV_PROXY_PREFIX` is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] but reading through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` or `DEV_PROXY_PREFIX` is malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
        let first = |keys: &[&str]| keys.iter().find_map(|key| get(*key));

        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { var: "PORT", value: raw })?,
            None => DEFAULT_PORT,
        };

        let flow_api_url = get("FLOW_API_URL").unwrap_or_else(|| DEFAULT_FLOW_API_URL.to_owned());
        let flow_api_token = first(FLOW_TOKEN_VARS);

        let gotrue = match (first(SUPABASE_URL_VARS), first(SUPABASE_KEY_VARS)) {
            (Some(url), Some(anon_key)) => Some(GoTrueConfig { url: url.trim_end_matches('/').to_owned(), anon_key }),
            _ => None,
        };

        let dist_dir = get("DIST_DIR").map_or_else(|| PathBuf::from(DEFAULT_DIST_DIR), PathBuf::from);

        let dev_proxy = match get("DEV_PROXY_TARGET") {
            Some(target) => {
                let prefix = normalize_prefix(get("DEV_PROXY_PREFIX").as_deref().unwrap_or(DEFAULT_DEV_PROXY_PREFIX))?;
                Some(DevProxyConfig { prefix, target: target.trim_end_matches('/').to_owned() })
            }
            None => None,
        };

        Ok(Self { port, flow_api_url, flow_api_token, gotrue, dist_dir, dev_proxy })
    }
}

/// Ensure a leading `/`, drop trailing ones, reject the bare root.
fn normalize_prefix(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim_matches('/');
    if trimmed.is_empty() || trimmed.contains("//") {
        return Err(ConfigError::Invalid { var: "DEV_PROXY_PREFIX", value: raw.to_owned() });
    }
    Ok(format!("/{trimmed}"))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
