use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use pdash_db::{ProductListItemRow, ProductRow};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Serialize)]
pub(super) struct ProductListItem {
    id: i64,
    product_id: String,
    product_name: String,
    category: Option<String>,
    discounted_price: Option<Decimal>,
    actual_price: Option<Decimal>,
    discount_percentage: Option<Decimal>,
    rating: Option<Decimal>,
    rating_count: Option<i64>,
    review_title: Option<String>,
}

impl From<ProductListItemRow> for ProductListItem {
    fn from(row: ProductListItemRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            category: row.category,
            discounted_price: row.discounted_price,
            actual_price: row.actual_price,
            discount_percentage: row.discount_percentage,
            rating: row.rating,
            rating_count: row.rating_count,
            review_title: row.review_title,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ProductDetail {
    id: i64,
    product_id: String,
    product_name: String,
    category: Option<String>,
    discounted_price: Option<Decimal>,
    actual_price: Option<Decimal>,
    discount_percentage: Option<Decimal>,
    rating: Option<Decimal>,
    rating_count: Option<i64>,
    about_product: Option<String>,
    user_name: Option<String>,
    review_title: Option<String>,
    review_content: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for ProductDetail {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            category: row.category,
            discounted_price: row.discounted_price,
            actual_price: row.actual_price,
            discount_percentage: row.discount_percentage,
            rating: row.rating,
            rating_count: row.rating_count,
            about_product: row.about_product,
            user_name: row.user_name,
            review_title: row.review_title,
            review_content: row.review_content,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(super) struct Pagination {
    page: i64,
    limit: i64,
    total: i64,
    total_pages: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductPage {
    items: Vec<ProductListItem>,
    pagination: Pagination,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProductQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub category: Option<String>,
    #[serde(alias = "minRating")]
    pub min_rating: Option<f64>,
    #[serde(alias = "maxRating")]
    pub max_rating: Option<f64>,
}

fn normalize_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

fn normalize_page_size(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

fn pagination(page: i64, limit: i64, total: i64) -> Pagination {
    Pagination {
        page,
        limit,
        total,
        total_pages: (total + limit - 1) / limit,
    }
}

/// Blank filter text means "no filter".
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ApiResponse<ProductPage>>, ApiError> {
    let page = normalize_page(query.page);
    let limit = normalize_page_size(query.limit);

    let result = pdash_db::list_products(
        &state.pool,
        pdash_db::ProductListFilters {
            search: non_blank(query.search.as_deref()),
            category: non_blank(query.category.as_deref()),
            min_rating: query.min_rating,
            max_rating: query.max_rating,
            limit,
            offset: (page - 1).saturating_mul(limit),
        },
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ProductPage {
            items: result.items.into_iter().map(ProductListItem::from).collect(),
            pagination: pagination(page, limit, result.total),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProductDetail>>, ApiError> {
    let not_found = || ApiError::new(&req_id.0, "not_found", format!("product '{id}' not found"));

    let Ok(numeric_id) = id.parse::<i64>() else {
        return Err(not_found());
    };

    let row = pdash_db::get_product_by_id(&state.pool, numeric_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(not_found)?;

    Ok(Json(ApiResponse {
        data: ProductDetail::from(row),
        meta: ResponseMeta::new(req_id.0.clone()),
    }))
}

pub(super) async fn list_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let categories = pdash_db::list_main_categories(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: categories,
        meta: ResponseMeta::new(req_id.0),
    }))
}
