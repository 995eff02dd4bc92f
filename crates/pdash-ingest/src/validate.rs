use pdash_core::{ProductRecord, ValidProduct};

/// A record that failed validation, with every rule it broke.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidProduct {
    pub product_id: Option<String>,
    pub violations: Vec<String>,
}

/// Checks a normalized record against the storage rules and, if it passes,
/// promotes it to a [`ValidProduct`].
///
/// All violations are collected rather than stopping at the first one.
///
/// # Errors
///
/// Returns [`InvalidProduct`] listing each violated rule.
pub fn validate_record(record: ProductRecord) -> Result<ValidProduct, InvalidProduct> {
    let product_id = record.product_id.filter(|s| !s.trim().is_empty());
    let product_name = record.product_name.filter(|s| !s.trim().is_empty());

    let mut violations = Vec::new();
    if product_id.is_none() {
        violations.push("product_id is required".to_string());
    }
    if product_name.is_none() {
        violations.push("product_name is required".to_string());
    }
    check_non_negative(&mut violations, "discounted_price", record.discounted_price);
    check_non_negative(&mut violations, "actual_price", record.actual_price);
    check_between(
        &mut violations,
        "discount_percentage",
        record.discount_percentage,
        0.0,
        100.0,
    );
    check_between(&mut violations, "rating", record.rating, 0.0, 5.0);
    if record.rating_count.is_some_and(|count| count < 0) {
        violations.push("rating_count must be greater than or equal to 0".to_string());
    }

    match (product_id, product_name) {
        (Some(product_id), Some(product_name)) if violations.is_empty() => Ok(ValidProduct {
            product_id,
            product_name,
            category: record.category,
            discounted_price: record.discounted_price,
            actual_price: record.actual_price,
            discount_percentage: record.discount_percentage,
            rating: record.rating,
            rating_count: record.rating_count,
            about_product: record.about_product,
            user_name: record.user_name,
            review_title: record.review_title,
            review_content: record.review_content,
        }),
        (product_id, _) => Err(InvalidProduct {
            product_id,
            violations,
        }),
    }
}

fn check_non_negative(violations: &mut Vec<String>, field: &str, value: Option<f64>) {
    match value {
        Some(v) if !v.is_finite() => violations.push(format!("{field} must be a finite number")),
        Some(v) if v < 0.0 => {
            violations.push(format!("{field} must be greater than or equal to 0"));
        }
        _ => {}
    }
}

fn check_between(violations: &mut Vec<String>, field: &str, value: Option<f64>, min: f64, max: f64) {
    if let Some(v) = value {
        if !(min..=max).contains(&v) {
            violations.push(format!("{field} must be between {min} and {max}"));
        }
    }
}
