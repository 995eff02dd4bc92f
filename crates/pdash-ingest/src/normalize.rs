//! Mapping of raw spreadsheet rows onto [`ProductRecord`].
//!
//! Exported sheets spell their headers in snake case, title case, or camel
//! case depending on the tool that produced them. Each field lists the
//! spellings it accepts, in priority order.

use pdash_core::{Cell, ProductRecord, RawRow};

pub(crate) const PRODUCT_ID_KEYS: &[&str] = &["product_id", "Product ID", "productId"];
const PRODUCT_NAME_KEYS: &[&str] = &["product_name", "Product Name", "productName"];
const CATEGORY_KEYS: &[&str] = &["category", "Category"];
const DISCOUNTED_PRICE_KEYS: &[&str] = &["discounted_price", "Discounted Price", "discountedPrice"];
const ACTUAL_PRICE_KEYS: &[&str] = &["actual_price", "Actual Price", "actualPrice"];
const DISCOUNT_PERCENTAGE_KEYS: &[&str] = &[
    "discount_percentage",
    "Discount Percentage",
    "discountPercentage",
];
const RATING_KEYS: &[&str] = &["rating", "Rating"];
const RATING_COUNT_KEYS: &[&str] = &["rating_count", "Rating Count", "ratingCount"];
const ABOUT_PRODUCT_KEYS: &[&str] = &["about_product", "About Product", "aboutProduct"];
const USER_NAME_KEYS: &[&str] = &["user_name", "User Name", "userName"];
const REVIEW_TITLE_KEYS: &[&str] = &["review_title", "Review Title", "reviewTitle"];
const REVIEW_CONTENT_KEYS: &[&str] = &["review_content", "Review Content", "reviewContent"];

/// Returns `true` if any header is an accepted spelling of `product_id`.
pub(crate) fn has_product_id_column(headers: &[String]) -> bool {
    headers
        .iter()
        .any(|header| PRODUCT_ID_KEYS.contains(&header.as_str()))
}

/// Returns the first non-empty cell among `candidates`, in candidate order.
#[must_use]
pub fn resolve<'a>(row: &'a RawRow, candidates: &[&str]) -> Option<&'a Cell> {
    candidates
        .iter()
        .filter_map(|key| row.get(*key))
        .find(|cell| !cell.is_empty())
}

/// Maps a raw row onto the canonical schema. Never fails; fields that cannot
/// be resolved or coerced are left absent.
#[must_use]
pub fn normalize_row(row: &RawRow) -> ProductRecord {
    ProductRecord {
        product_id: required_text(row, PRODUCT_ID_KEYS),
        product_name: required_text(row, PRODUCT_NAME_KEYS),
        category: optional_text(row, CATEGORY_KEYS),
        discounted_price: number(row, DISCOUNTED_PRICE_KEYS),
        actual_price: number(row, ACTUAL_PRICE_KEYS),
        discount_percentage: number(row, DISCOUNT_PERCENTAGE_KEYS),
        rating: number(row, RATING_KEYS),
        rating_count: number(row, RATING_COUNT_KEYS).and_then(round_to_i64),
        about_product: optional_text(row, ABOUT_PRODUCT_KEYS),
        user_name: optional_text(row, USER_NAME_KEYS),
        review_title: optional_text(row, REVIEW_TITLE_KEYS),
        review_content: optional_text(row, REVIEW_CONTENT_KEYS),
    }
}

/// Coerces a cell to a finite number.
///
/// Numeric cells pass through. Text is cleaned by dropping everything except
/// digits, `.` and `-` (so currency symbols, thousands separators and `%`
/// disappear). Whitespace after the first digit ends the number so that
/// trailing prose such as `"4.5 out of 5"` is not glued onto it, unless it
/// separates a three-digit thousands group (`"1 234"`, `"1\u{a0}299"`).
/// The longest leading decimal of what remains is the result: `"1.2.3"` reads
/// as `1.2`.
#[must_use]
pub fn coerce_number(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) => Some(*n).filter(|n| n.is_finite()),
        Cell::Text(text) => parse_noisy_number(text),
        Cell::Empty | Cell::Bool(_) => None,
    }
}

fn required_text(row: &RawRow, candidates: &[&str]) -> Option<String> {
    optional_text(row, candidates).filter(|text| !text.is_empty())
}

fn optional_text(row: &RawRow, candidates: &[&str]) -> Option<String> {
    resolve(row, candidates)
        .and_then(Cell::as_text)
        .map(|text| text.trim().to_string())
}

fn number(row: &RawRow, candidates: &[&str]) -> Option<f64> {
    resolve(row, candidates).and_then(coerce_number)
}

fn parse_noisy_number(raw: &str) -> Option<f64> {
    let chars: Vec<char> = raw.chars().collect();
    let mut kept = String::with_capacity(raw.len());
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_digit() || c == '.' || c == '-' {
            kept.push(c);
        } else if c.is_whitespace()
            && kept.bytes().any(|b| b.is_ascii_digit())
            && !is_thousands_group(&chars[i..], &kept)
        {
            break;
        }
    }
    leading_decimal(&kept)
}

/// True when `rest` starts with whitespace followed by exactly three digits
/// and the integer part read so far has no decimal point, as in `"1 234"`.
fn is_thousands_group(rest: &[char], kept: &str) -> bool {
    if kept.contains('.') {
        return false;
    }
    let after_space = rest.iter().skip_while(|c| c.is_whitespace());
    let digits = after_space.take_while(|c| c.is_ascii_digit()).count();
    digits == 3
}

/// Parses the longest prefix of `s` shaped like `-?digits(.digits)?`.
fn leading_decimal(s: &str) -> Option<f64> {
    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    let (int_part, after_int) = rest.split_at(int_len);
    let frac_part = after_int.strip_prefix('.').map_or("", |frac| {
        let frac_len = frac.bytes().take_while(u8::is_ascii_digit).count();
        &frac[..frac_len]
    });

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let literal = format!(
        "{}{}.{}",
        if negative { "-" } else { "" },
        if int_part.is_empty() { "0" } else { int_part },
        if frac_part.is_empty() { "0" } else { frac_part },
    );
    literal.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn round_to_i64(value: f64) -> Option<i64> {
    let rounded = value.round();
    (rounded >= i64::MIN as f64 && rounded < i64::MAX as f64).then_some(rounded as i64)
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
