use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

const DEFAULT_CATALOG_API_URL: &str =
    "https://search-edge.services.ajio.com/rilfnlwebservices/v4/rilfnl/products/category/83";

/// Reads `.env` (if present) into the process environment, then builds the
/// config from it.
///
/// # Errors
///
/// Returns `ConfigError` when `DATABASE_URL` is unset or a value fails to parse.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Like [`load_app_config`] but reads only the live process environment.
///
/// # Errors
///
/// Returns `ConfigError` when `DATABASE_URL` is unset or a value fails to parse.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Typed reads over an env-var lookup, so tests can feed a plain map.
struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    fn require(&self, var: &str) -> Result<String, ConfigError> {
        (self.lookup)(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    }

    fn text(&self, var: &str, default: &str) -> String {
        (self.lookup)(var).unwrap_or_else(|_| default.to_string())
    }

    /// Unset and whitespace-only values both read as `None`.
    fn optional(&self, var: &str) -> Option<String> {
        let value = (self.lookup)(var).ok()?;
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    fn parse<T>(&self, var: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.text(var, default)
            .parse::<T>()
            .map_err(|e| invalid(var, e.to_string()))
    }
}

fn invalid(var: &str, reason: String) -> ConfigError {
    ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    }
}

fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let env = EnvReader { lookup };

    let cache_max_entries: usize = env.parse("ARGUS_CACHE_MAX_ENTRIES", "1024")?;
    if cache_max_entries == 0 {
        return Err(invalid(
            "ARGUS_CACHE_MAX_ENTRIES",
            "must be at least 1".to_string(),
        ));
    }

    Ok(AppConfig {
        database_url: env.require("DATABASE_URL")?,
        env: env.parse::<Environment>("ARGUS_ENV", "development")?,
        bind_addr: env.parse::<SocketAddr>("ARGUS_BIND_ADDR", "0.0.0.0:8080")?,
        log_level: env.text("ARGUS_LOG_LEVEL", "info"),
        pages_path: PathBuf::from(env.text("ARGUS_PAGES_PATH", "./config/pages.yaml")),
        db_max_connections: env.parse("ARGUS_DB_MAX_CONNECTIONS", "10")?,
        db_min_connections: env.parse("ARGUS_DB_MIN_CONNECTIONS", "1")?,
        db_acquire_timeout_secs: env.parse("ARGUS_DB_ACQUIRE_TIMEOUT_SECS", "10")?,
        vision_api_key: env.optional("ARGUS_VISION_API_KEY"),
        vision_api_url: env.text("ARGUS_VISION_API_URL", "https://api.anthropic.com"),
        vision_model: env.text("ARGUS_VISION_MODEL", "claude-sonnet-4-20250514"),
        catalog_api_url: env.text("ARGUS_CATALOG_API_URL", DEFAULT_CATALOG_API_URL),
        cms_base_url: env.optional("ARGUS_CMS_BASE_URL"),
        http_user_agent: env.text("ARGUS_HTTP_USER_AGENT", "argus/0.1 (banner-anomaly-scan)"),
        vision_timeout_secs: env.parse("ARGUS_VISION_TIMEOUT_SECS", "60")?,
        catalog_timeout_secs: env.parse("ARGUS_CATALOG_TIMEOUT_SECS", "30")?,
        cms_timeout_secs: env.parse("ARGUS_CMS_TIMEOUT_SECS", "30")?,
        adapter_max_retries: env.parse("ARGUS_ADAPTER_MAX_RETRIES", "2")?,
        adapter_retry_backoff_ms: env.parse("ARGUS_ADAPTER_RETRY_BACKOFF_MS", "500")?,
        cache_ttl_secs: env.parse("ARGUS_CACHE_TTL_SECS", "3600")?,
        cache_max_entries,
        scan_cron: env.text("ARGUS_SCAN_CRON", "0 0 */4 * * *"),
        scan_max_concurrent_components: env.parse("ARGUS_SCAN_MAX_CONCURRENT_COMPONENTS", "1")?,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
