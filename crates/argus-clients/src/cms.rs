//! CMS adapter: fetches the raw layout document of a page.
//!
//! Transport failures fall back to a fixed document. A body that arrives but
//! is not JSON, or a source id that cannot be turned into a URL, is returned
//! as an error so the scan can record it.

use argus_core::{AppConfig, Fetched};
use reqwest::{Client, Url};

use crate::error::AdapterError;
use crate::fallback::fallback_page_document;
use crate::http::HttpSettings;
use crate::retry::retry_with_backoff;

pub struct CmsClient {
    client: Client,
    base_url: Option<String>,
    max_retries: u32,
    retry_backoff_ms: u64,
}

impl CmsClient {
    /// # Errors
    ///
    /// Returns [`AdapterError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: Option<&str>, settings: &HttpSettings) -> Result<Self, AdapterError> {
        Ok(Self {
            client: settings.build_client()?,
            base_url: base_url.map(|b| b.trim_end_matches('/').to_string()),
            max_retries: settings.max_retries,
            retry_backoff_ms: settings.retry_backoff_ms,
        })
    }

    /// # Errors
    ///
    /// Returns [`AdapterError::Http`] if the HTTP client cannot be built.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, AdapterError> {
        let settings = HttpSettings::new(
            config.cms_timeout_secs,
            &config.http_user_agent,
            config.adapter_max_retries,
            config.adapter_retry_backoff_ms,
        );
        Self::new(config.cms_base_url.as_deref(), &settings)
    }

    /// Fetches the page document, substituting the fallback document on
    /// transport failure.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidUrl`] for an unusable source id and
    /// [`AdapterError::Deserialize`] for a non-JSON body.
    pub async fn fetch_document(
        &self,
        cms_source_id: &str,
    ) -> Result<Fetched<serde_json::Value>, AdapterError> {
        match self.try_fetch_document(cms_source_id).await {
            Ok(document) => Ok(Fetched::live(document)),
            Err(e @ (AdapterError::Http(_) | AdapterError::UnexpectedStatus { .. })) => {
                tracing::warn!(
                    cms_source_id,
                    error = %e,
                    "CMS fetch failed, using fallback page document"
                );
                Ok(Fetched::fallback(fallback_page_document()))
            }
            Err(e) => Err(e),
        }
    }

    /// # Errors
    ///
    /// - [`AdapterError::InvalidUrl`] if no URL can be built for the source.
    /// - [`AdapterError::Http`] / [`AdapterError::UnexpectedStatus`] on
    ///   transport failure, after retries.
    /// - [`AdapterError::Deserialize`] if the body is not JSON.
    pub async fn try_fetch_document(
        &self,
        cms_source_id: &str,
    ) -> Result<serde_json::Value, AdapterError> {
        let url = self.source_url(cms_source_id)?;

        retry_with_backoff(self.max_retries, self.retry_backoff_ms, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .get(&url)
                    .header(reqwest::header::ACCEPT, "application/json")
                    .send()
                    .await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(AdapterError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }
                let body = response.text().await?;
                serde_json::from_str::<serde_json::Value>(&body).map_err(|e| {
                    AdapterError::Deserialize {
                        context: format!("CMS document {url}"),
                        source: e,
                    }
                })
            }
        })
        .await
    }

    /// A source id is either an absolute `http(s)` URL or a page id
    /// resolved as `{base}/pages/{id}`.
    fn source_url(&self, cms_source_id: &str) -> Result<String, AdapterError> {
        let source = cms_source_id.trim();
        if source.starts_with("http://") || source.starts_with("https://") {
            let url = Url::parse(source).map_err(|e| AdapterError::InvalidUrl {
                url: source.to_string(),
                reason: e.to_string(),
            })?;
            return Ok(url.to_string());
        }

        let Some(base) = &self.base_url else {
            return Err(AdapterError::InvalidUrl {
                url: source.to_string(),
                reason: "not an absolute URL and no CMS base URL is configured".to_string(),
            });
        };

        let mut url = Url::parse(base).map_err(|e| AdapterError::InvalidUrl {
            url: base.clone(),
            reason: e.to_string(),
        })?;
        url.path_segments_mut()
            .map_err(|()| AdapterError::InvalidUrl {
                url: base.clone(),
                reason: "base URL cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .push("pages")
            .push(source);
        Ok(url.to_string())
    }
}
