//! Database operations for the `products` table.

use std::collections::{hash_map::Entry, HashMap};

use chrono::{DateTime, Utc};
use pdash_core::ValidProduct;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A full row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub product_id: String,
    pub product_name: String,
    pub category: Option<String>,
    pub discounted_price: Option<Decimal>,
    pub actual_price: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
    pub rating: Option<Decimal>,
    pub rating_count: Option<i64>,
    pub about_product: Option<String>,
    pub user_name: Option<String>,
    pub review_title: Option<String>,
    pub review_content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing projection of a product: the long free-text columns are left out.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductListItemRow {
    pub id: i64,
    pub product_id: String,
    pub product_name: String,
    pub category: Option<String>,
    pub discounted_price: Option<Decimal>,
    pub actual_price: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
    pub rating: Option<Decimal>,
    pub rating_count: Option<i64>,
    pub review_title: Option<String>,
}

/// Input filters for product listing. Text filters are case-insensitive
/// substring matches.
#[derive(Debug, Clone, Default)]
pub struct ProductListFilters<'a> {
    pub search: Option<&'a str>,
    pub category: Option<&'a str>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub limit: i64,
    pub offset: i64,
}

/// One page of products plus the total number of matching rows.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub items: Vec<ProductListItemRow>,
    pub total: i64,
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Inserts or updates a batch of products in a single statement.
///
/// Conflicts on `product_id` overwrite every mutable column and refresh
/// `updated_at`; `created_at` keeps its original value. The statement is
/// atomic: either every product in the batch is written or none is.
///
/// Postgres rejects an `ON CONFLICT DO UPDATE` that touches the same row twice,
/// so repeated `product_id`s inside the batch are collapsed to their last
/// occurrence first. The returned count is the number of input products, so
/// each one is reported as written exactly once.
///
/// Numeric columns are bound as `f64` and cast to their fixed-scale `NUMERIC`
/// types by the database engine.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn upsert_products(pool: &PgPool, products: &[ValidProduct]) -> Result<u64, DbError> {
    if products.is_empty() {
        return Ok(0);
    }

    let rows = collapse_duplicate_ids(products);

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO products \
             (product_id, product_name, category, discounted_price, actual_price, \
              discount_percentage, rating, rating_count, about_product, user_name, \
              review_title, review_content) ",
    );
    builder.push_values(rows, |mut row, product| {
        row.push_bind(product.product_id.clone())
            .push_bind(product.product_name.clone())
            .push_bind(product.category.clone())
            .push_bind(product.discounted_price)
            .push_unseparated("::numeric(14,2)")
            .push_bind(product.actual_price)
            .push_unseparated("::numeric(14,2)")
            .push_bind(product.discount_percentage)
            .push_unseparated("::numeric(5,2)")
            .push_bind(product.rating)
            .push_unseparated("::numeric(3,1)")
            .push_bind(product.rating_count)
            .push_bind(product.about_product.clone())
            .push_bind(product.user_name.clone())
            .push_bind(product.review_title.clone())
            .push_bind(product.review_content.clone());
    });
    builder.push(
        " ON CONFLICT (product_id) DO UPDATE SET \
             product_name        = EXCLUDED.product_name, \
             category            = EXCLUDED.category, \
             discounted_price    = EXCLUDED.discounted_price, \
             actual_price        = EXCLUDED.actual_price, \
             discount_percentage = EXCLUDED.discount_percentage, \
             rating              = EXCLUDED.rating, \
             rating_count        = EXCLUDED.rating_count, \
             about_product       = EXCLUDED.about_product, \
             user_name           = EXCLUDED.user_name, \
             review_title        = EXCLUDED.review_title, \
             review_content      = EXCLUDED.review_content, \
             updated_at          = NOW()",
    );

    builder.build().execute(pool).await?;

    Ok(u64::try_from(products.len()).unwrap_or(u64::MAX))
}

/// Keeps one entry per `product_id`: the last one seen, placed where the id
/// first appeared.
fn collapse_duplicate_ids(products: &[ValidProduct]) -> Vec<&ValidProduct> {
    let mut positions: HashMap<&str, usize> = HashMap::with_capacity(products.len());
    let mut rows: Vec<&ValidProduct> = Vec::with_capacity(products.len());

    for product in products {
        match positions.entry(product.product_id.as_str()) {
            Entry::Occupied(slot) => rows[*slot.get()] = product,
            Entry::Vacant(slot) => {
                slot.insert(rows.len());
                rows.push(product);
            }
        }
    }

    rows
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Returns one page of products, newest first, with the total match count.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn list_products(
    pool: &PgPool,
    filters: ProductListFilters<'_>,
) -> Result<ProductPage, DbError> {
    let search = filters.search.map(contains_pattern);
    let category = filters.category.map(contains_pattern);

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM products \
         WHERE ($1::TEXT IS NULL OR product_name ILIKE $1) \
           AND ($2::TEXT IS NULL OR category ILIKE $2) \
           AND ($3::FLOAT8 IS NULL OR rating >= $3) \
           AND ($4::FLOAT8 IS NULL OR rating <= $4)",
    )
    .bind(search.as_deref())
    .bind(category.as_deref())
    .bind(filters.min_rating)
    .bind(filters.max_rating)
    .fetch_one(pool)
    .await?;

    let items = sqlx::query_as::<_, ProductListItemRow>(
        "SELECT id, product_id, product_name, category, discounted_price, actual_price, \
                discount_percentage, rating, rating_count, review_title \
         FROM products \
         WHERE ($1::TEXT IS NULL OR product_name ILIKE $1) \
           AND ($2::TEXT IS NULL OR category ILIKE $2) \
           AND ($3::FLOAT8 IS NULL OR rating >= $3) \
           AND ($4::FLOAT8 IS NULL OR rating <= $4) \
         ORDER BY id DESC \
         LIMIT $5 OFFSET $6",
    )
    .bind(search.as_deref())
    .bind(category.as_deref())
    .bind(filters.min_rating)
    .bind(filters.max_rating)
    .bind(filters.limit)
    .bind(filters.offset)
    .fetch_all(pool)
    .await?;

    Ok(ProductPage { items, total })
}

/// Returns a product by its surrogate `id`, or `None` if it does not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product_by_id(pool: &PgPool, id: i64) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT id, product_id, product_name, category, discounted_price, actual_price, \
                discount_percentage, rating, rating_count, about_product, user_name, \
                review_title, review_content, created_at, updated_at \
         FROM products \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the distinct top-level categories (text before the first `|`),
/// sorted alphabetically.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_main_categories(pool: &PgPool) -> Result<Vec<String>, DbError> {
    let rows = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT main_category FROM ( \
             SELECT NULLIF(btrim(split_part(category, '|', 1)), '') AS main_category \
             FROM products \
         ) c \
         WHERE main_category IS NOT NULL \
         ORDER BY main_category",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Wraps user input in `%…%` for `ILIKE`, escaping the pattern metacharacters
/// so they match literally.
fn contains_pattern(raw: &str) -> String {
    let mut pattern = String::with_capacity(raw.len() + 2);
    pattern.push('%');
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_product(product_id: &str, product_name: &str) -> ValidProduct {
        ValidProduct {
            product_id: product_id.to_string(),
            product_name: product_name.to_string(),
            category: None,
            discounted_price: None,
            actual_price: None,
            discount_percentage: None,
            rating: None,
            rating_count: None,
            about_product: None,
            user_name: None,
            review_title: None,
            review_content: None,
        }
    }

    #[test]
    fn collapse_keeps_unique_ids_in_order() {
        let products = vec![make_product("A", "a"), make_product("B", "b")];
        let rows = collapse_duplicate_ids(&products);
        let ids: Vec<&str> = rows.iter().map(|p| p.product_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn collapse_last_duplicate_wins_at_first_position() {
        let products = vec![
            make_product("A", "first"),
            make_product("B", "b"),
            make_product("A", "second"),
        ];
        let rows = collapse_duplicate_ids(&products);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].product_id, "A");
        assert_eq!(rows[0].product_name, "second");
        assert_eq!(rows[1].product_id, "B");
    }

    #[test]
    fn contains_pattern_wraps_plain_text() {
        assert_eq!(contains_pattern("cable"), "%cable%");
    }

    #[test]
    fn contains_pattern_escapes_metacharacters() {
        assert_eq!(contains_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }
}
