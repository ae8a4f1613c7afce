//! Anomaly rules: reconcile catalog items against a banner's claims.
//!
//! Two independent rules run per item:
//!
//! - **discount range**: the item's discount must lie inside the banner's
//!   range, bounds inclusive;
//! - **brand match**: the item's brand must contain, or be contained by, at
//!   least one banner brand, ignoring case.
//!
//! Everything here is pure. Output order follows catalog order and is cut at
//! [`MAX_ANOMALIES`] records, first come first kept.

use crate::signal::{AnomalyRecord, BannerSignal, CatalogItem, DiscountRange};

/// Upper bound on records returned by [`detect`].
pub const MAX_ANOMALIES: usize = 50;

const UNKNOWN_BRAND: &str = "Unknown";

/// Evaluate every item against `signal` and return the anomalies found.
///
/// At most [`MAX_ANOMALIES`] records are returned, in catalog order.
#[must_use]
pub fn detect(items: &[CatalogItem], signal: &BannerSignal) -> Vec<AnomalyRecord> {
    items
        .iter()
        .filter_map(|item| evaluate_item(item, signal))
        .take(MAX_ANOMALIES)
        .collect()
}

/// Evaluate one item. Returns `None` when no rule fails.
#[must_use]
pub fn evaluate_item(item: &CatalogItem, signal: &BannerSignal) -> Option<AnomalyRecord> {
    let mut reasons = Vec::new();

    if let (Some(discount), Some(range)) = (item.discount_percent, signal.effective_range()) {
        if let Some(reason) = discount_reason(discount, range) {
            reasons.push(reason);
        }
    }

    if let Some(brand) = item.brand() {
        if let Some(reason) = brand_reason(brand, signal) {
            reasons.push(reason);
        }
    }

    if reasons.is_empty() {
        return None;
    }

    Some(AnomalyRecord {
        item_code: item.code.clone(),
        brand_name: item.brand().unwrap_or(UNKNOWN_BRAND).to_string(),
        discount_percent: item.discount_percent,
        reasons,
    })
}

fn discount_reason(discount: f64, range: DiscountRange) -> Option<String> {
    if discount < range.lower {
        Some(format!(
            "Discount {}% is below minimum {}% claimed by banner",
            fmt_percent(discount),
            fmt_percent(range.lower)
        ))
    } else if discount > range.upper {
        Some(format!(
            "Discount {}% is above maximum {}% claimed by banner",
            fmt_percent(discount),
            fmt_percent(range.upper)
        ))
    } else {
        None
    }
}

fn brand_reason(item_brand: &str, signal: &BannerSignal) -> Option<String> {
    let mut claimed = signal.comparable_brands().peekable();
    // No claimed brands: nothing to contradict.
    claimed.peek()?;

    let item_lower = item_brand.to_lowercase();
    let matches = claimed.any(|claimed| {
        let claimed_lower = claimed.to_lowercase();
        item_lower.contains(&claimed_lower) || claimed_lower.contains(&item_lower)
    });

    if matches {
        return None;
    }

    Some(format!(
        "Brand '{item_brand}' does not match banner brands: [{}]",
        signal.brands.join(", ")
    ))
}

/// Formats a percentage with at least one decimal place (`60` -> `60.0`).
fn fmt_percent(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
#[path = "rules_test.rs"]
mod tests;
