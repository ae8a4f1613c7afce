pub mod cache;
pub mod catalog;
pub mod cms;
pub mod error;
pub mod fallback;
pub mod http;
mod retry;
pub mod vision;

pub use cache::TtlCache;
pub use catalog::CatalogClient;
pub use cms::CmsClient;
pub use error::AdapterError;
pub use fallback::{fallback_items, fallback_page_document, fallback_signal};
pub use http::HttpSettings;
pub use vision::VisionClient;
