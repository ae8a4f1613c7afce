//! Collaborator seams for detection and scanning.
//!
//! The HTTP adapters implement these by delegating to their never-failing
//! `fetch_*` methods. Returning `Result` keeps the seam honest for sources
//! that can fail outright, and lets the orchestrator be exercised with
//! in-memory doubles.

use argus_clients::{AdapterError, CatalogClient, CmsClient, VisionClient};
use argus_core::{BannerSignal, CatalogItem, Fetched};
use async_trait::async_trait;

#[async_trait]
pub trait SignalSource: Send + Sync {
    async fn fetch_signal(&self, banner_url: &str) -> Result<Fetched<BannerSignal>, AdapterError>;
}

#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_items(&self, catalog_id: &str)
        -> Result<Fetched<Vec<CatalogItem>>, AdapterError>;
}

#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_document(
        &self,
        cms_source_id: &str,
    ) -> Result<Fetched<serde_json::Value>, AdapterError>;
}

#[async_trait]
impl SignalSource for VisionClient {
    async fn fetch_signal(&self, banner_url: &str) -> Result<Fetched<BannerSignal>, AdapterError> {
        Ok(VisionClient::fetch_signal(self, banner_url).await)
    }
}

#[async_trait]
impl CatalogSource for CatalogClient {
    async fn fetch_items(
        &self,
        catalog_id: &str,
    ) -> Result<Fetched<Vec<CatalogItem>>, AdapterError> {
        Ok(CatalogClient::fetch_items(self, catalog_id).await)
    }
}

#[async_trait]
impl PageSource for CmsClient {
    async fn fetch_document(
        &self,
        cms_source_id: &str,
    ) -> Result<Fetched<serde_json::Value>, AdapterError> {
        CmsClient::fetch_document(self, cms_source_id).await
    }
}
