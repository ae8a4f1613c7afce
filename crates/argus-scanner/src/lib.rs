pub mod cached;
pub mod detector;
pub mod error;
pub mod scanner;
pub mod sources;
pub mod store;

pub use cached::{CachedCatalogSource, CachedSignalSource};
pub use detector::Detector;
pub use error::{DetectError, ScanError};
pub use scanner::{ScanSummary, Scanner};
pub use sources::{CatalogSource, PageSource, SignalSource};
pub use store::{PgScanStore, ScanStore};
