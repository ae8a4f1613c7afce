use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }

    /// Development relaxes startup checks such as the API key requirement.
    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Environment::Development,
            Environment::Test,
            Environment::Production,
        ]
        .into_iter()
        .find(|env| env.as_str() == s)
        .ok_or_else(|| format!("unknown environment '{s}'"))
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub pages_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub vision_api_key: Option<String>,
    pub vision_api_url: String,
    pub vision_model: String,
    pub catalog_api_url: String,
    pub cms_base_url: Option<String>,
    pub http_user_agent: String,
    pub vision_timeout_secs: u64,
    pub catalog_timeout_secs: u64,
    pub cms_timeout_secs: u64,
    pub adapter_max_retries: u32,
    pub adapter_retry_backoff_ms: u64,
    pub cache_ttl_secs: u64,
    pub cache_max_entries: usize,
    pub scan_cron: String,
    pub scan_max_concurrent_components: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("pages_path", &self.pages_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "vision_api_key",
                &self.vision_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("vision_api_url", &self.vision_api_url)
            .field("vision_model", &self.vision_model)
            .field("catalog_api_url", &self.catalog_api_url)
            .field("cms_base_url", &self.cms_base_url)
            .field("http_user_agent", &self.http_user_agent)
            .field("vision_timeout_secs", &self.vision_timeout_secs)
            .field("catalog_timeout_secs", &self.catalog_timeout_secs)
            .field("cms_timeout_secs", &self.cms_timeout_secs)
            .field("adapter_max_retries", &self.adapter_max_retries)
            .field("adapter_retry_backoff_ms", &self.adapter_retry_backoff_ms)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("cache_max_entries", &self.cache_max_entries)
            .field("scan_cron", &self.scan_cron)
            .field(
                "scan_max_concurrent_components",
                &self.scan_max_concurrent_components,
            )
            .finish()
    }
}
