use serde::{Deserialize, Serialize};

/// A product row mapped onto the canonical schema, independent of how the
/// source spreadsheet spelled its headers.
///
/// Every field is optional here: normalization never fails, it only leaves a
/// field absent. Whether the record is acceptable is decided by validation,
/// which turns it into a [`ValidProduct`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Storefront product identifier (e.g. an ASIN), unique across the store.
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    /// Pipe-delimited hierarchy, e.g. `"Electronics|Audio|Headphones"`.
    pub category: Option<String>,
    /// Boundary note: persisted as `NUMERIC(14,2)`.
    pub discounted_price: Option<f64>,
    /// Boundary note: persisted as `NUMERIC(14,2)`.
    pub actual_price: Option<f64>,
    /// Percentage in `0..=100`, persisted as `NUMERIC(5,2)`.
    pub discount_percentage: Option<f64>,
    /// Star rating in `0..=5`, persisted as `NUMERIC(3,1)`.
    pub rating: Option<f64>,
    pub rating_count: Option<i64>,
    pub about_product: Option<String>,
    pub user_name: Option<String>,
    pub review_title: Option<String>,
    pub review_content: Option<String>,
}

/// A [`ProductRecord`] that passed validation: both identifying fields are
/// present and non-empty and every numeric field is within range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidProduct {
    pub product_id: String,
    pub product_name: String,
    pub category: Option<String>,
    pub discounted_price: Option<f64>,
    pub actual_price: Option<f64>,
    pub discount_percentage: Option<f64>,
    pub rating: Option<f64>,
    pub rating_count: Option<i64>,
    pub about_product: Option<String>,
    pub user_name: Option<String>,
    pub review_title: Option<String>,
    pub review_content: Option<String>,
}
