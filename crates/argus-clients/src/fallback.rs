//! Deterministic baselines returned when an adapter cannot reach its
//! collaborator.

use argus_core::{BannerSignal, CatalogItem, DiscountRange};
use serde_json::json;

pub const FALLBACK_BRANDS: [&str; 4] = ["Nike", "Adidas", "Puma", "Reebok"];
pub const FALLBACK_DISCOUNT_LOWER: f64 = 20.0;
pub const FALLBACK_DISCOUNT_UPPER: f64 = 50.0;

const FALLBACK_BANNER_BASE: &str = "https://assets.ajio.com/medias/sys_master/root/20240101";

#[must_use]
pub fn fallback_signal() -> BannerSignal {
    BannerSignal::new(
        FALLBACK_BRANDS.iter().map(|b| (*b).to_string()).collect(),
        Some(DiscountRange::new(
            FALLBACK_DISCOUNT_LOWER,
            FALLBACK_DISCOUNT_UPPER,
        )),
    )
}

/// Five sample products. Against [`fallback_signal`], PROD001 breaks both
/// rules, PROD002 only the discount rule and PROD004 only the brand rule;
/// the other two are clean.
#[must_use]
pub fn fallback_items() -> Vec<CatalogItem> {
    vec![
        CatalogItem::new("PROD001", Some("Zara"), Some(60.0)),
        CatalogItem::new("PROD002", Some("Nike"), Some(15.0)),
        CatalogItem::new("PROD003", Some("Adidas"), Some(35.0)),
        CatalogItem::new("PROD004", Some("Calvin Klein"), Some(30.0)),
        CatalogItem::new("PROD005", Some("Puma"), Some(45.0)),
    ]
}

/// A flat page document with three banners on catalog ids 83, 84 and 85.
#[must_use]
pub fn fallback_page_document() -> serde_json::Value {
    let components: Vec<serde_json::Value> = [83, 84, 85]
        .iter()
        .enumerate()
        .map(|(i, id)| {
            json!({
                "bannerURL": format!("{FALLBACK_BANNER_BASE}/banner{}.jpg", i + 1),
                "curatedId": id.to_string(),
                "type": "banner",
            })
        })
        .collect();
    json!({ "components": components })
}
