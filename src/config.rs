use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::query::QueryCacheConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct CookieConfig {
    pub name: String,
    pub max_age_days: i64,
    pub secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    pub retries: u32,
    pub stale_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub api_base_url: String,
    pub host: String,
    pub port: u16,
    pub public_url: Option<String>,
    /// Explicit token file for the terminal client; see [`AppConfig::token_file`].
    pub token_file: Option<PathBuf>,
    pub api_timeout_secs: Option<u64>,
    pub cookie: CookieConfig,
    pub query: QueryConfig,
}

pub const TOKEN_KEY: &str = "token";
pub const TOKEN_MAX_AGE_DAYS: i64 = 7;

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let public_url = std::env::var("PUBLIC_URL").ok().filter(|v| !v.is_empty());
        let secure = public_url
            .as_deref()
            .map(|u| u.starts_with("https://"))
            .unwrap_or(false);

        let token_file = std::env::var("TOKEN_FILE")
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            api_base_url: std::env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:4000/api".into()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("APP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(3000),
            public_url,
            token_file,
            api_timeout_secs: std::env::var("API_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok()),
            cookie: CookieConfig {
                name: TOKEN_KEY.into(),
                max_age_days: TOKEN_MAX_AGE_DAYS,
                secure,
            },
            query: QueryConfig {
                retries: std::env::var("QUERY_RETRIES")
                    .ok()
                    .and_then(|v| v.parse::<u32>().ok())
                    .unwrap_or(0),
                stale_secs: std::env::var("QUERY_STALE_SECS")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok()),
            },
        })
    }

    /// Token file for the terminal client. Falls back to the platform config
    /// dir, so only client commands need one to exist.
    pub fn token_file(&self) -> anyhow::Result<PathBuf> {
        match &self.token_file {
            Some(path) => Ok(path.clone()),
            None => default_token_file(),
        }
    }

    pub fn api_timeout(&self) -> Option<Duration> {
        self.api_timeout_secs.map(Duration::from_secs)
    }

    pub fn query_cache(&self) -> QueryCacheConfig {
        QueryCacheConfig {
            retries: self.query.retries,
            stale_time: self.query.stale_secs.map(Duration::from_secs),
            ..QueryCacheConfig::default()
        }
    }

    /// Defaults used by tests and by code that has no environment to read.
    pub fn for_api(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            host: "127.0.0.1".into(),
            port: 0,
            public_url: None,
            token_file: Some(PathBuf::from(TOKEN_KEY)),
            api_timeout_secs: None,
            cookie: CookieConfig {
                name: TOKEN_KEY.into(),
                max_age_days: TOKEN_MAX_AGE_DAYS,
                secure: false,
            },
            query: QueryConfig {
                retries: 0,
                stale_secs: None,
            },
        }
    }
}

fn default_token_file() -> anyhow::Result<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("no config directory; set TOKEN_FILE"))?;
    Ok(base.join("fintrack").join(TOKEN_KEY))
}
