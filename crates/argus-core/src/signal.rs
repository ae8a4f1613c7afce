use serde::{Deserialize, Serialize};

/// Discount range claimed by a banner, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscountRange {
    pub lower: f64,
    pub upper: f64,
}

impl DiscountRange {
    #[must_use]
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// `true` when both bounds are finite and `lower <= upper`.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.lower.is_finite() && self.upper.is_finite() && self.lower <= self.upper
    }
}

/// Brand and discount claims extracted from one promotional banner image.
///
/// Signals are accepted as extracted. An inverted or non-finite range, or a
/// brand list with only blank entries, is tolerated here; the rule engine
/// simply does not apply the corresponding rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerSignal {
    pub brands: Vec<String>,
    #[serde(default)]
    pub discount_range: Option<DiscountRange>,
}

impl BannerSignal {
    #[must_use]
    pub fn new(brands: Vec<String>, discount_range: Option<DiscountRange>) -> Self {
        Self {
            brands,
            discount_range,
        }
    }

    /// The discount range the discount rule should compare against, if any.
    #[must_use]
    pub fn effective_range(&self) -> Option<DiscountRange> {
        self.discount_range.filter(DiscountRange::is_well_formed)
    }

    /// Non-blank brand names, in declaration order.
    pub fn comparable_brands(&self) -> impl Iterator<Item = &str> {
        self.brands
            .iter()
            .map(String::as_str)
            .filter(|b| !b.trim().is_empty())
    }

    /// `true` when the signal would make the rule engine skip both rules.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.effective_range().is_none() && self.comparable_brands().next().is_none()
    }
}

/// One product record returned by the catalog for a catalog id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub code: String,
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub discount_percent: Option<f64>,
}

impl CatalogItem {
    #[must_use]
    pub fn new(code: &str, brand_name: Option<&str>, discount_percent: Option<f64>) -> Self {
        Self {
            code: code.to_string(),
            brand_name: brand_name.map(str::to_string),
            discount_percent,
        }
    }

    /// The item's brand when present and non-blank.
    #[must_use]
    pub fn brand(&self) -> Option<&str> {
        self.brand_name
            .as_deref()
            .filter(|b| !b.trim().is_empty())
    }
}

/// A catalog item whose real attributes contradict its banner's claims.
///
/// `reasons` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyRecord {
    pub item_code: String,
    pub brand_name: String,
    pub discount_percent: Option<f64>,
    pub reasons: Vec<String>,
}

/// Where an adapter's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataOrigin {
    Live,
    Fallback,
}

impl DataOrigin {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DataOrigin::Live => "live",
            DataOrigin::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for DataOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value produced by an external adapter, tagged with its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub value: T,
    pub origin: DataOrigin,
}

impl<T> Fetched<T> {
    pub fn live(value: T) -> Self {
        Self {
            value,
            origin: DataOrigin::Live,
        }
    }

    pub fn fallback(value: T) -> Self {
        Self {
            value,
            origin: DataOrigin::Fallback,
        }
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.origin == DataOrigin::Fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_range_has_no_effective_range() {
        let signal = BannerSignal::new(vec![], Some(DiscountRange::new(60.0, 20.0)));
        assert!(signal.effective_range().is_none());
    }

    #[test]
    fn nan_bound_has_no_effective_range() {
        let signal = BannerSignal::new(vec![], Some(DiscountRange::new(f64::NAN, 20.0)));
        assert!(signal.effective_range().is_none());
    }

    #[test]
    fn equal_bounds_are_well_formed() {
        assert!(DiscountRange::new(30.0, 30.0).is_well_formed());
    }

    #[test]
    fn comparable_brands_skips_blank_entries() {
        let signal = BannerSignal::new(
            vec!["Nike".to_string(), "  ".to_string(), "Puma".to_string()],
            None,
        );
        let brands: Vec<&str> = signal.comparable_brands().collect();
        assert_eq!(brands, vec!["Nike", "Puma"]);
    }

    #[test]
    fn degenerate_signal_detected() {
        let signal = BannerSignal::new(vec![String::new()], None);
        assert!(signal.is_degenerate());
    }

    #[test]
    fn banner_signal_serializes_camel_case() {
        let signal = BannerSignal::new(
            vec!["Nike".to_string()],
            Some(DiscountRange::new(20.0, 50.0)),
        );
        let json = serde_json::to_value(&signal).expect("serialize");
        assert_eq!(json["discountRange"]["lower"], 20.0);
        assert_eq!(json["brands"][0], "Nike");
    }

    #[test]
    fn data_origin_display_matches_serde() {
        assert_eq!(DataOrigin::Fallback.to_string(), "fallback");
        assert_eq!(
            serde_json::to_value(DataOrigin::Live).expect("serialize"),
            serde_json::json!("live")
        );
    }
}
