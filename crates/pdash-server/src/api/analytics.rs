use axum::{extract::State, Extension, Json};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

type AnalyticsResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Serialize)]
pub(super) struct SummaryData {
    total_products: i64,
    avg_rating: Option<Decimal>,
    avg_discount: Option<Decimal>,
    total_reviews: i64,
    total_categories: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct CategoryCount {
    category: String,
    count: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct TopReviewed {
    product_name: String,
    rating_count: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct DiscountBucket {
    range: String,
    count: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct CategoryRating {
    category: String,
    avg_rating: Decimal,
    count: i64,
}

fn respond<T: Serialize>(req_id: RequestId, data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn summary(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> AnalyticsResult<SummaryData> {
    let row = pdash_db::summary(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(respond(
        req_id,
        SummaryData {
            total_products: row.total_products,
            avg_rating: row.avg_rating,
            avg_discount: row.avg_discount,
            total_reviews: row.total_reviews.unwrap_or(0),
            total_categories: row.total_categories,
        },
    ))
}

pub(super) async fn products_per_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> AnalyticsResult<Vec<CategoryCount>> {
    let rows = pdash_db::products_per_category(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| CategoryCount {
            category: row.main_category,
            count: row.count,
        })
        .collect();
    Ok(respond(req_id, data))
}

pub(super) async fn top_reviewed(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> AnalyticsResult<Vec<TopReviewed>> {
    let rows = pdash_db::top_reviewed(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| TopReviewed {
            product_name: row.product_name,
            rating_count: row.rating_count,
        })
        .collect();
    Ok(respond(req_id, data))
}

pub(super) async fn discount_distribution(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> AnalyticsResult<Vec<DiscountBucket>> {
    let rows = pdash_db::discount_distribution(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| DiscountBucket {
            range: row.discount_range,
            count: row.count,
        })
        .collect();
    Ok(respond(req_id, data))
}

pub(super) async fn category_avg_rating(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> AnalyticsResult<Vec<CategoryRating>> {
    let rows = pdash_db::category_avg_rating(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| CategoryRating {
            category: row.main_category,
            avg_rating: row.avg_rating,
            count: row.count,
        })
        .collect();
    Ok(respond(req_id, data))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::get_json;
    use axum::http::StatusCode;
    use pdash_core::ValidProduct;

    fn product(product_id: &str, category: &str, discount: f64, rating_count: i64) -> ValidProduct {
        ValidProduct {
            product_id: product_id.to_string(),
            product_name: format!("Product {product_id}"),
            category: Some(category.to_string()),
            discounted_price: None,
            actual_price: None,
            discount_percentage: Some(discount),
            rating: Some(4.0),
            rating_count: Some(rating_count),
            about_product: None,
            user_name: None,
            review_title: None,
            review_content: None,
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn empty_catalog_summary_is_zeroed(pool: sqlx::PgPool) {
        let (status, json) = get_json(pool, "/api/v1/analytics/summary").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["total_products"], 0);
        assert_eq!(json["data"]["total_reviews"], 0);
        assert!(json["data"]["avg_rating"].is_null());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn analytics_routes_reflect_seeded_rows(pool: sqlx::PgPool) {
        pdash_db::upsert_products(
            &pool,
            &[
                product("A", "Electronics|Cables", 5.0, 300),
                product("B", "Electronics|Power", 85.0, 100),
                product("C", "Electronics|Audio", 15.0, 200),
                product("D", "Toys|Blocks", 12.0, 50),
            ],
        )
        .await
        .expect("seed");

        let (_, json) = get_json(pool.clone(), "/api/v1/analytics/summary").await;
        assert_eq!(json["data"]["total_products"], 4);
        assert_eq!(json["data"]["total_reviews"], 650);
        assert_eq!(json["data"]["total_categories"], 2);

        let (_, json) = get_json(pool.clone(), "/api/v1/analytics/products-per-category").await;
        assert_eq!(
            json["data"][0],
            serde_json::json!({ "category": "Electronics", "count": 3 })
        );

        let (_, json) = get_json(pool.clone(), "/api/v1/analytics/top-reviewed").await;
        assert_eq!(json["data"][0]["product_name"], "Product A");
        assert_eq!(json["data"].as_array().map(Vec::len), Some(4));

        let (_, json) = get_json(pool.clone(), "/api/v1/analytics/discount-distribution").await;
        assert_eq!(
            json["data"],
            serde_json::json!([
                { "range": "0-10%", "count": 1 },
                { "range": "10-20%", "count": 2 },
                { "range": "80%+", "count": 1 },
            ])
        );

        let (_, json) = get_json(pool, "/api/v1/analytics/category-avg-rating").await;
        let rows = json["data"].as_array().expect("rows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["category"], "Electronics");
        assert_eq!(rows[0]["count"], 3);
    }
}
