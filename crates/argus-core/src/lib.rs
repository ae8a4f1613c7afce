pub mod app_config;
pub mod config;
pub mod pages;
pub mod report;
pub mod resolver;
pub mod rules;
pub mod signal;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use pages::{load_pages, PageSeed, PagesFile};
pub use report::{ComponentOutcome, ComponentResult, DetectionResult, ScanStatus, ScanTotals};
pub use resolver::{resolve, ResolveError, ScanComponent};
pub use rules::{detect, MAX_ANOMALIES};
pub use signal::{AnomalyRecord, BannerSignal, CatalogItem, DataOrigin, DiscountRange, Fetched};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read pages file at {path}: {source}")]
    PagesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse pages file: {0}")]
    PagesFileParse(#[from] serde_yaml::Error),

    #[error("pages validation failed: {0}")]
    Validation(String),
}
