//! Flattens a CMS page document into the banner components worth scanning.
//!
//! The primary layout is nested: page -> slots -> component -> banners ->
//! hotspots. Each banner with at least one hotspot becomes one
//! [`ScanComponent`], keyed by its image URL and the first hotspot's target.
//! The older flat `components` layout is still accepted.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

const DEFAULT_COMPONENT_TYPE: &str = "banner";

/// One banner + catalog pair to evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanComponent {
    #[serde(rename = "bannerURL")]
    pub banner_url: String,
    #[serde(rename = "catalogId", alias = "curatedId")]
    pub catalog_id: String,
    #[serde(rename = "componentType", default = "default_component_type")]
    pub component_type: String,
}

impl ScanComponent {
    #[must_use]
    pub fn new(banner_url: &str, catalog_id: &str, component_type: &str) -> Self {
        Self {
            banner_url: banner_url.to_string(),
            catalog_id: catalog_id.to_string(),
            component_type: component_type.to_string(),
        }
    }
}

fn default_component_type() -> String {
    DEFAULT_COMPONENT_TYPE.to_string()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("malformed source document: {0}")]
    MalformedSourceDocument(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NestedPage {
    #[serde(deserialize_with = "null_as_empty")]
    slots: Vec<Slot>,
}

#[derive(Debug, Deserialize)]
struct Slot {
    #[serde(default)]
    component: Option<Component>,
}

#[derive(Debug, Deserialize)]
struct Component {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    banners: Vec<Banner>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Banner {
    #[serde(default, alias = "imageURL")]
    image_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    hotspots: Vec<Hotspot>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Hotspot {
    #[serde(default, deserialize_with = "string_or_number")]
    target_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FlatPage {
    #[serde(deserialize_with = "null_as_empty")]
    components: Vec<FlatComponent>,
}

#[derive(Debug, Deserialize)]
struct FlatComponent {
    #[serde(default, rename = "bannerURL")]
    banner_url: Option<String>,
    #[serde(default, rename = "curatedId", deserialize_with = "string_or_number")]
    curated_id: Option<String>,
    #[serde(default, rename = "catalogId", deserialize_with = "string_or_number")]
    catalog_id: Option<String>,
    #[serde(default, rename = "type")]
    component_type: Option<String>,
}

/// A `null` list reads the same as an absent one.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts `"83"`, `83` or `null`.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Uint(u64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Uint(n) => n.to_string(),
    }))
}

/// Resolve a raw CMS page document into scannable components.
///
/// Banners without hotspots, or with a blank URL or catalog id, are skipped.
///
/// # Errors
///
/// Returns [`ResolveError::MalformedSourceDocument`] when the document is
/// neither the nested `slots` layout nor the flat `components` layout, or
/// when a declared field has the wrong JSON type.
pub fn resolve(document: &serde_json::Value) -> Result<Vec<ScanComponent>, ResolveError> {
    let Some(root) = document.as_object() else {
        return Err(ResolveError::MalformedSourceDocument(
            "page document is not a JSON object".to_string(),
        ));
    };

    if root.contains_key("slots") {
        let page = NestedPage::deserialize(document)
            .map_err(|e| ResolveError::MalformedSourceDocument(e.to_string()))?;
        return Ok(resolve_nested(page));
    }

    if root.contains_key("components") {
        let page = FlatPage::deserialize(document)
            .map_err(|e| ResolveError::MalformedSourceDocument(e.to_string()))?;
        return Ok(resolve_flat(page));
    }

    Err(ResolveError::MalformedSourceDocument(
        "expected a `slots` or `components` array".to_string(),
    ))
}

fn resolve_nested(page: NestedPage) -> Vec<ScanComponent> {
    let mut components = Vec::new();

    for component in page.slots.into_iter().filter_map(|slot| slot.component) {
        let component_type = non_blank(component.name)
            .unwrap_or_else(default_component_type);

        for banner in component.banners {
            let Some(banner_url) = non_blank(banner.image_url) else {
                continue;
            };
            let Some(first) = banner.hotspots.into_iter().next() else {
                continue;
            };
            let Some(catalog_id) = non_blank(first.target_id) else {
                continue;
            };

            components.push(ScanComponent {
                banner_url,
                catalog_id,
                component_type: component_type.clone(),
            });
        }
    }

    components
}

fn resolve_flat(page: FlatPage) -> Vec<ScanComponent> {
    page.components
        .into_iter()
        .filter_map(|c| {
            Some(ScanComponent {
                banner_url: non_blank(c.banner_url)?,
                catalog_id: non_blank(c.curated_id).or_else(|| non_blank(c.catalog_id))?,
                component_type: non_blank(c.component_type)
                    .unwrap_or_else(default_component_type),
            })
        })
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
