use argus_clients::AdapterError;
use argus_db::DbError;
use thiserror::Error;

/// Failure evaluating one banner against its catalog.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("invalid detection input: {0}")]
    InvalidInput(String),

    #[error("banner signal lookup failed: {0}")]
    Signal(#[source] AdapterError),

    #[error("catalog lookup failed: {0}")]
    Catalog(#[source] AdapterError),
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("a scan is already running")]
    AlreadyRunning,

    #[error("no active page named '{0}'")]
    PageNotFound(String),

    #[error("scan persistence failed: {0}")]
    Persistence(#[from] DbError),
}
