//! Fixed aggregate queries backing the analytics dashboard.
//!
//! "Main category" everywhere below means the trimmed text before the first
//! `|` of the pipe-delimited `category` column.

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

const MAIN_CATEGORY: &str = "NULLIF(btrim(split_part(category, '|', 1)), '')";

/// Catalog-wide headline numbers.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnalyticsSummaryRow {
    pub total_products: i64,
    pub avg_rating: Option<Decimal>,
    pub avg_discount: Option<Decimal>,
    pub total_reviews: Option<i64>,
    pub total_categories: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryCountRow {
    pub main_category: String,
    pub count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TopReviewedRow {
    pub product_name: String,
    pub rating_count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DiscountBucketRow {
    /// Bucket label such as `"10-20%"`, or `"80%+"` for the last bucket.
    pub discount_range: String,
    pub count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRatingRow {
    pub main_category: String,
    pub avg_rating: Decimal,
    pub count: i64,
}

/// Returns totals and averages across the whole `products` table.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn summary(pool: &PgPool) -> Result<AnalyticsSummaryRow, DbError> {
    let sql = format!(
        "SELECT \
             COUNT(*) AS total_products, \
             ROUND(AVG(rating), 2) AS avg_rating, \
             ROUND(AVG(discount_percentage), 2) AS avg_discount, \
             SUM(rating_count)::BIGINT AS total_reviews, \
             COUNT(DISTINCT {MAIN_CATEGORY}) AS total_categories \
         FROM products"
    );
    let row = sqlx::query_as::<_, AnalyticsSummaryRow>(&sql)
        .fetch_one(pool)
        .await?;

    Ok(row)
}

/// Returns the 20 main categories with the most products.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn products_per_category(pool: &PgPool) -> Result<Vec<CategoryCountRow>, DbError> {
    let sql = format!(
        "SELECT main_category, COUNT(*) AS count FROM ( \
             SELECT {MAIN_CATEGORY} AS main_category FROM products \
         ) c \
         WHERE main_category IS NOT NULL \
         GROUP BY main_category \
         ORDER BY count DESC, main_category \
         LIMIT 20"
    );
    let rows = sqlx::query_as::<_, CategoryCountRow>(&sql)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Returns the 10 products with the highest review counts.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn top_reviewed(pool: &PgPool) -> Result<Vec<TopReviewedRow>, DbError> {
    let rows = sqlx::query_as::<_, TopReviewedRow>(
        "SELECT product_name, rating_count \
         FROM products \
         WHERE rating_count IS NOT NULL \
         ORDER BY rating_count DESC, id \
         LIMIT 10",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Buckets discount percentages into 10-point ranges, with everything from
/// 80% upwards in a single `"80%+"` bucket. Empty buckets are omitted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn discount_distribution(pool: &PgPool) -> Result<Vec<DiscountBucketRow>, DbError> {
    let rows = sqlx::query_as::<_, DiscountBucketRow>(
        "SELECT discount_range, COUNT(*) AS count FROM ( \
             SELECT \
                 LEAST(FLOOR(discount_percentage / 10), 8)::INT AS bucket, \
                 CASE \
                     WHEN discount_percentage >= 80 THEN '80%+' \
                     ELSE (FLOOR(discount_percentage / 10) * 10)::INT || '-' \
                          || ((FLOOR(discount_percentage / 10) + 1) * 10)::INT || '%' \
                 END AS discount_range \
             FROM products \
             WHERE discount_percentage IS NOT NULL \
         ) b \
         GROUP BY bucket, discount_range \
         ORDER BY bucket",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the 15 best-rated main categories, considering only categories
/// with more than two rated products.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn category_avg_rating(pool: &PgPool) -> Result<Vec<CategoryRatingRow>, DbError> {
    let sql = format!(
        "SELECT main_category, ROUND(AVG(rating), 2) AS avg_rating, COUNT(*) AS count FROM ( \
             SELECT {MAIN_CATEGORY} AS main_category, rating FROM products \
             WHERE rating IS NOT NULL \
         ) c \
         WHERE main_category IS NOT NULL \
         GROUP BY main_category \
         HAVING COUNT(*) > 2 \
         ORDER BY avg_rating DESC, main_category \
         LIMIT 15"
    );
    let rows = sqlx::query_as::<_, CategoryRatingRow>(&sql)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}
