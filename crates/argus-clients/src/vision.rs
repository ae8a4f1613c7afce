//! Vision adapter: turns a banner image URL into a [`BannerSignal`].
//!
//! The image is sent to a messages-style multimodal endpoint with a prompt
//! asking for a JSON object of brands and a discount range. The model's
//! answer is free text, so the JSON object is cut out of it between the
//! first `{` and the last `}`.

use argus_core::{AppConfig, BannerSignal, DiscountRange, Fetched};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::AdapterError;
use crate::fallback::fallback_signal;
use crate::http::HttpSettings;
use crate::retry::retry_with_backoff;

const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1000;

const ANALYSIS_PROMPT: &str = "\
Look at this promotional banner and report what it claims.

Return only a JSON object shaped like this:
{
  \"brands\": [\"Brand A\", \"Brand B\"],
  \"discount\": {
    \"text\": \"the discount wording exactly as printed\",
    \"range\": { \"lower\": 0, \"upper\": 0 }
  }
}

Brands: every brand name or logo visible on the banner, spelled as shown.
Discount range, in percent:
- \"Up to X%\" or \"X% off\": lower 0, upper X
- \"X% to Y%\" or \"X-Y% off\": lower X, upper Y
- \"Min. X%\" or \"Flat X%\" minimum wording: lower X, upper 100
- several offers: use the widest range
If the banner states no discount, omit \"range\".";

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExtractedClaims {
    /// Missing and `null` both mean no brands were read.
    #[serde(default)]
    brands: Option<Vec<String>>,
    #[serde(default)]
    discount: Option<ExtractedDiscount>,
}

#[derive(Debug, Deserialize)]
struct ExtractedDiscount {
    #[serde(default)]
    range: Option<ExtractedRange>,
}

#[derive(Debug, Deserialize)]
struct ExtractedRange {
    #[serde(default)]
    lower: Option<f64>,
    #[serde(default)]
    upper: Option<f64>,
}

pub struct VisionClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    max_retries: u32,
    retry_backoff_ms: u64,
}

impl VisionClient {
    /// # Errors
    ///
    /// Returns [`AdapterError::Http`] if the HTTP client cannot be built.
    pub fn new(
        api_key: Option<String>,
        base_url: &str,
        model: &str,
        settings: &HttpSettings,
    ) -> Result<Self, AdapterError> {
        Ok(Self {
            client: settings.build_client()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            max_retries: settings.max_retries,
            retry_backoff_ms: settings.retry_backoff_ms,
        })
    }

    /// # Errors
    ///
    /// Returns [`AdapterError::Http`] if the HTTP client cannot be built.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, AdapterError> {
        let settings = HttpSettings::new(
            config.vision_timeout_secs,
            &config.http_user_agent,
            config.adapter_max_retries,
            config.adapter_retry_backoff_ms,
        );
        Self::new(
            config.vision_api_key.clone(),
            &config.vision_api_url,
            &config.vision_model,
            &settings,
        )
    }

    /// Extracts the signal for `banner_url`, never failing.
    ///
    /// Any error yields the fixed fallback signal tagged
    /// [`argus_core::DataOrigin::Fallback`].
    pub async fn fetch_signal(&self, banner_url: &str) -> Fetched<BannerSignal> {
        match self.try_fetch_signal(banner_url).await {
            Ok(signal) => {
                if signal.is_degenerate() {
                    tracing::warn!(
                        banner_url,
                        ?signal,
                        "vision signal has no usable brands or range; rules will not apply"
                    );
                }
                Fetched::live(signal)
            }
            Err(e) => {
                tracing::warn!(banner_url, error = %e, "vision lookup failed, using fallback signal");
                Fetched::fallback(fallback_signal())
            }
        }
    }

    /// # Errors
    ///
    /// - [`AdapterError::NotConfigured`] when no API key is set.
    /// - [`AdapterError::Http`] / [`AdapterError::UnexpectedStatus`] on
    ///   transport failure, after retries.
    /// - [`AdapterError::Deserialize`] / [`AdapterError::MissingContent`]
    ///   when the answer holds no parsable claims object.
    pub async fn try_fetch_signal(&self, banner_url: &str) -> Result<BannerSignal, AdapterError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AdapterError::NotConfigured("vision API key"))?;
        let url = format!("{}/v1/messages", self.base_url);
        let body = self.request_body(banner_url);

        let response = retry_with_backoff(self.max_retries, self.retry_backoff_ms, || {
            let url = url.clone();
            let body = &body;
            async move {
                let response = self
                    .client
                    .post(&url)
                    .header("x-api-key", api_key)
                    .header("anthropic-version", API_VERSION)
                    .json(body)
                    .send()
                    .await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(AdapterError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }
                let text = response.text().await?;
                serde_json::from_str::<MessagesResponse>(&text).map_err(|e| {
                    AdapterError::Deserialize {
                        context: format!("vision response for {banner_url}"),
                        source: e,
                    }
                })
            }
        })
        .await?;

        let text = response
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| AdapterError::MissingContent {
                context: format!("vision response for {banner_url}"),
            })?;

        parse_signal_text(&text, banner_url)
    }

    fn request_body(&self, banner_url: &str) -> serde_json::Value {
        json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": ANALYSIS_PROMPT },
                    { "type": "image", "source": { "type": "url", "url": banner_url } }
                ]
            }]
        })
    }
}

/// Cuts the claims object out of the model's text answer.
fn parse_signal_text(text: &str, banner_url: &str) -> Result<BannerSignal, AdapterError> {
    let start = text.find('{');
    let end = text.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => {
            return Err(AdapterError::MissingContent {
                context: format!("vision answer for {banner_url}"),
            })
        }
    };

    let claims: ExtractedClaims =
        serde_json::from_str(json).map_err(|e| AdapterError::Deserialize {
            context: format!("vision claims for {banner_url}"),
            source: e,
        })?;

    let range = claims
        .discount
        .and_then(|d| d.range)
        .and_then(|r| match (r.lower, r.upper) {
            (Some(lower), Some(upper)) => Some(DiscountRange::new(lower, upper)),
            _ => None,
        });

    let brands = claims
        .brands
        .unwrap_or_default()
        .into_iter()
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .collect();

    Ok(BannerSignal::new(brands, range))
}
