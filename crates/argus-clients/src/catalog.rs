//! Catalog adapter: lists the products behind a banner's catalog id.

use argus_core::{AppConfig, CatalogItem, Fetched};
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::AdapterError;
use crate::fallback::fallback_items;
use crate::http::HttpSettings;
use crate::retry::retry_with_backoff;

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    products: Vec<CatalogProduct>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogProduct {
    #[serde(default)]
    code: Option<String>,
    /// Sometimes a number, sometimes a numeric string.
    #[serde(default)]
    discount_percent: Option<serde_json::Value>,
    #[serde(default)]
    fnl_color_variant_data: Option<VariantData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantData {
    #[serde(default)]
    brand_name: Option<String>,
}

impl CatalogProduct {
    fn into_item(self) -> Option<CatalogItem> {
        let code = self.code.filter(|c| !c.trim().is_empty())?;
        let discount_percent = self.discount_percent.as_ref().and_then(|v| match v {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
            _ => None,
        });
        let brand_name = self
            .fnl_color_variant_data
            .and_then(|d| d.brand_name)
            .filter(|b| !b.trim().is_empty());
        Some(CatalogItem {
            code,
            brand_name,
            discount_percent,
        })
    }
}

pub struct CatalogClient {
    client: Client,
    base_url: String,
    max_retries: u32,
    retry_backoff_ms: u64,
}

impl CatalogClient {
    /// # Errors
    ///
    /// Returns [`AdapterError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, settings: &HttpSettings) -> Result<Self, AdapterError> {
        Ok(Self {
            client: settings.build_client()?,
            base_url: base_url.to_string(),
            max_retries: settings.max_retries,
            retry_backoff_ms: settings.retry_backoff_ms,
        })
    }

    /// # Errors
    ///
    /// Returns [`AdapterError::Http`] if the HTTP client cannot be built.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, AdapterError> {
        let settings = HttpSettings::new(
            config.catalog_timeout_secs,
            &config.http_user_agent,
            config.adapter_max_retries,
            config.adapter_retry_backoff_ms,
        );
        Self::new(&config.catalog_api_url, &settings)
    }

    /// Lists the items for `catalog_id`, never failing.
    pub async fn fetch_items(&self, catalog_id: &str) -> Fetched<Vec<CatalogItem>> {
        match self.try_fetch_items(catalog_id).await {
            Ok(items) => Fetched::live(items),
            Err(e) => {
                tracing::warn!(catalog_id, error = %e, "catalog lookup failed, using fallback items");
                Fetched::fallback(fallback_items())
            }
        }
    }

    /// Products without a code are dropped; order is the catalog's order.
    ///
    /// # Errors
    ///
    /// - [`AdapterError::InvalidUrl`] if the base URL does not parse.
    /// - [`AdapterError::Http`] / [`AdapterError::UnexpectedStatus`] on
    ///   transport failure, after retries.
    /// - [`AdapterError::Deserialize`] if the body is not a product listing.
    pub async fn try_fetch_items(&self, catalog_id: &str) -> Result<Vec<CatalogItem>, AdapterError> {
        let url = self.items_url(catalog_id)?;

        let response = retry_with_backoff(self.max_retries, self.retry_backoff_ms, || {
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
                serde_json::from_str::<CatalogResponse>(&body).map_err(|e| {
                    AdapterError::Deserialize {
                        context: format!("catalog listing for {catalog_id}"),
                        source: e,
                    }
                })
            }
        })
        .await?;

        let items: Vec<CatalogItem> = response
            .products
            .into_iter()
            .filter_map(CatalogProduct::into_item)
            .collect();
        tracing::debug!(catalog_id, count = items.len(), "fetched catalog items");
        Ok(items)
    }

    fn items_url(&self, catalog_id: &str) -> Result<String, AdapterError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| AdapterError::InvalidUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut().append_pair("curatedid", catalog_id);
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn client(base: &str) -> CatalogClient {
        CatalogClient::new(base, &HttpSettings::new(5, "argus-test/0.1", 0, 0)).expect("client")
    }

    #[test]
    fn items_url_appends_curated_id() {
        let url = client("https://search.example.com/products/category/83")
            .items_url("84")
            .expect("url");
        assert_eq!(url, "https://search.example.com/products/category/83?curatedid=84");
    }

    #[test]
    fn items_url_keeps_existing_query() {
        let url = client("https://search.example.com/products?format=json")
            .items_url("7")
            .expect("url");
        assert_eq!(url, "https://search.example.com/products?format=json&curatedid=7");
    }

    #[test]
    fn items_url_rejects_relative_base() {
        assert!(matches!(
            client("not a url").items_url("7"),
            Err(AdapterError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn product_mapping_handles_missing_and_string_fields() {
        let response: CatalogResponse = serde_json::from_value(json!({
            "products": [
                { "code": "A", "discountPercent": 35, "fnlColorVariantData": { "brandName": "Adidas" } },
                { "code": "B", "discountPercent": "40%" },
                { "code": "", "discountPercent": 10 },
                { "code": "C", "fnlColorVariantData": { "brandName": " " } }
            ]
        }))
        .expect("decode");

        let items: Vec<CatalogItem> = response
            .products
            .into_iter()
            .filter_map(CatalogProduct::into_item)
            .collect();

        assert_eq!(
            items,
            vec![
                CatalogItem::new("A", Some("Adidas"), Some(35.0)),
                CatalogItem::new("B", None, Some(40.0)),
                CatalogItem::new("C", None, None),
            ]
        );
    }
}
