use std::sync::Arc;

use argus_core::DetectionResult;

use crate::error::DetectError;
use crate::sources::{CatalogSource, SignalSource};

/// Detection entry point: fetches a banner's signal and catalog, then runs
/// the rule engine.
#[derive(Clone)]
pub struct Detector {
    signals: Arc<dyn SignalSource>,
    catalog: Arc<dyn CatalogSource>,
}

impl Detector {
    pub fn new(signals: Arc<dyn SignalSource>, catalog: Arc<dyn CatalogSource>) -> Self {
        Self { signals, catalog }
    }

    /// Evaluates `banner_url` against the items of `catalog_id`.
    ///
    /// Both lookups run concurrently.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::InvalidInput`] for a blank URL or catalog id,
    /// and [`DetectError::Signal`] / [`DetectError::Catalog`] when a source
    /// fails outright.
    pub async fn detect(
        &self,
        banner_url: &str,
        catalog_id: &str,
    ) -> Result<DetectionResult, DetectError> {
        let banner_url = banner_url.trim();
        let catalog_id = catalog_id.trim();
        if banner_url.is_empty() {
            return Err(DetectError::InvalidInput("banner URL is blank".to_string()));
        }
        if catalog_id.is_empty() {
            return Err(DetectError::InvalidInput("catalog id is blank".to_string()));
        }

        let (signal, items) = tokio::join!(
            self.signals.fetch_signal(banner_url),
            self.catalog.fetch_items(catalog_id),
        );
        let signal = signal.map_err(DetectError::Signal)?;
        let items = items.map_err(DetectError::Catalog)?;

        let anomalies = argus_core::detect(&items.value, &signal.value);
        tracing::debug!(
            banner_url,
            catalog_id,
            items = items.value.len(),
            anomalies = anomalies.len(),
            signal_origin = %signal.origin,
            catalog_origin = %items.origin,
            "banner evaluated"
        );

        Ok(DetectionResult::new(
            banner_url,
            catalog_id,
            signal.value,
            anomalies,
            signal.origin,
            items.origin,
        ))
    }
}
