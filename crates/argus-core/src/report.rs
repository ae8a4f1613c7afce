//! Records persisted inside a scan report.
//!
//! Field names are part of the stored history: rename nothing, only add
//! fields with a serde default.

use serde::{Deserialize, Serialize};

use crate::resolver::ScanComponent;
use crate::signal::{AnomalyRecord, BannerSignal, DataOrigin};

const SUCCESS: &str = "success";

fn live_origin() -> DataOrigin {
    DataOrigin::Live
}

fn success_status() -> String {
    SUCCESS.to_string()
}

/// Result of evaluating one banner against its catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    #[serde(rename = "bannerURL")]
    pub banner_url: String,
    #[serde(alias = "curatedId")]
    pub catalog_id: String,
    #[serde(alias = "bannerInfo")]
    pub banner_signal: BannerSignal,
    #[serde(default)]
    pub anomalies: Vec<AnomalyRecord>,
    #[serde(default)]
    pub total_anomalies: usize,
    #[serde(default = "success_status")]
    pub status: String,
    #[serde(default = "live_origin")]
    pub signal_origin: DataOrigin,
    #[serde(default = "live_origin")]
    pub catalog_origin: DataOrigin,
}

impl DetectionResult {
    #[must_use]
    pub fn new(
        banner_url: &str,
        catalog_id: &str,
        banner_signal: BannerSignal,
        anomalies: Vec<AnomalyRecord>,
        signal_origin: DataOrigin,
        catalog_origin: DataOrigin,
    ) -> Self {
        Self {
            banner_url: banner_url.to_string(),
            catalog_id: catalog_id.to_string(),
            banner_signal,
            total_anomalies: anomalies.len(),
            anomalies,
            status: success_status(),
            signal_origin,
            catalog_origin,
        }
    }

    /// `true` when either input came from an adapter fallback.
    #[must_use]
    pub fn used_fallback(&self) -> bool {
        self.signal_origin == DataOrigin::Fallback || self.catalog_origin == DataOrigin::Fallback
    }
}

/// One entry of a report's `componentResults`.
///
/// Exactly one of `anomaly_result` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentResult {
    #[serde(flatten)]
    pub component: ScanComponent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly_result: Option<DetectionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Borrowed view of a [`ComponentResult`]'s outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComponentOutcome<'a> {
    Detected(&'a DetectionResult),
    Failed(&'a str),
}

impl ComponentResult {
    #[must_use]
    pub fn detected(component: ScanComponent, result: DetectionResult) -> Self {
        Self {
            component,
            anomaly_result: Some(result),
            error: None,
        }
    }

    #[must_use]
    pub fn failed(component: ScanComponent, error: impl Into<String>) -> Self {
        Self {
            component,
            anomaly_result: None,
            error: Some(error.into()),
        }
    }

    #[must_use]
    pub fn outcome(&self) -> ComponentOutcome<'_> {
        match (&self.anomaly_result, &self.error) {
            (Some(result), None) => ComponentOutcome::Detected(result),
            (_, Some(error)) => ComponentOutcome::Failed(error),
            (None, None) => ComponentOutcome::Failed("component result has no outcome"),
        }
    }

    /// Anomaly count contributed to page totals (0 for failed entries).
    #[must_use]
    pub fn anomaly_count(&self) -> usize {
        match self.outcome() {
            ComponentOutcome::Detected(result) => result.total_anomalies,
            ComponentOutcome::Failed(_) => 0,
        }
    }
}

/// Status of a persisted scan report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Completed,
    Error,
}

impl ScanStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScanStatus::Completed => "completed",
            ScanStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(ScanStatus::Completed),
            "error" => Ok(ScanStatus::Error),
            other => Err(format!("unknown scan status '{other}'")),
        }
    }
}

/// Aggregate counts for one page scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanTotals {
    /// Every resolved component, failed ones included.
    pub total_components: usize,
    pub components_with_anomalies: usize,
    pub total_anomalies: usize,
}

impl ScanTotals {
    /// Sum the results. Failed entries count toward `total_components` only.
    #[must_use]
    pub fn from_results(results: &[ComponentResult]) -> Self {
        results.iter().fold(
            Self {
                total_components: results.len(),
                ..Self::default()
            },
            |mut totals, result| {
                let count = result.anomaly_count();
                totals.total_anomalies += count;
                if count > 0 {
                    totals.components_with_anomalies += 1;
                }
                totals
            },
        )
    }

    #[must_use]
    pub fn failed_components(results: &[ComponentResult]) -> usize {
        results
            .iter()
            .filter(|r| matches!(r.outcome(), ComponentOutcome::Failed(_)))
            .count()
    }
}
