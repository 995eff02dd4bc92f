//! Spreadsheet ingestion endpoints.
//!
//! - `POST /api/v1/products/upload`  multipart upload, field `file`
//! - `POST /api/v1/products/import`  `{ "path": "..." }` on the server's disk

use std::path::Path;

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Extension, Json,
};
use pdash_core::IngestReport;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_ingest_error, ApiError, ApiResponse, AppState, ResponseMeta};

const ALLOWED_EXTENSIONS: &[&str] = &["xlsx", "xls", "csv"];

#[derive(Debug, Deserialize)]
pub(super) struct ImportRequest {
    pub path: Option<String>,
}

/// Lower-cased text after the last `.` of a file name, or the whole name if
/// it has no dot.
fn extension_of(file_name: &str) -> String {
    file_name
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

fn check_extension(request_id: &str, file_name: &str) -> Result<(), ApiError> {
    if ALLOWED_EXTENSIONS.contains(&extension_of(file_name).as_str()) {
        Ok(())
    } else {
        Err(ApiError::new(
            request_id,
            "invalid_file_type",
            "Only xlsx, xls, csv files are supported",
        ))
    }
}

fn map_multipart_error(request_id: &str, error: &MultipartError) -> ApiError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::new(request_id, "payload_too_large", "uploaded file is too large");
    }
    ApiError::new(request_id, "bad_request", error.body_text())
}

/// Finds the `file` field and returns its name and contents.
async fn read_file_field(
    request_id: &str,
    multipart: &mut Multipart,
) -> Result<Option<(String, Bytes)>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| map_multipart_error(request_id, &e))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        check_extension(request_id, &file_name)?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| map_multipart_error(request_id, &e))?;
        return Ok(Some((file_name, bytes)));
    }
    Ok(None)
}

pub(super) async fn upload_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<IngestReport>>, ApiError> {
    let Some((file_name, bytes)) = read_file_field(&req_id.0, &mut multipart).await? else {
        return Err(ApiError::new(&req_id.0, "file_required", "No file uploaded"));
    };

    tracing::info!(file_name = %file_name, size = bytes.len(), "ingesting uploaded file");
    let report = pdash_ingest::ingest_from_buffer(&state.pool, &bytes, state.ingest)
        .await
        .map_err(|e| map_ingest_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: report,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn import_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ImportRequest>,
) -> Result<Json<ApiResponse<IngestReport>>, ApiError> {
    let Some(path) = body.path.as_deref().map(str::trim).filter(|p| !p.is_empty()) else {
        return Err(ApiError::new(&req_id.0, "validation_error", "path is required"));
    };

    tracing::info!(path, "ingesting file from path");
    let report = pdash_ingest::ingest_from_path(&state.pool, Path::new(path), state.ingest)
        .await
        .map_err(|e| map_ingest_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: report,
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{app, app_with_upload_limit, send};
    use super::*;
    use axum::body::Body;
    use axum::http::Request;

    const BOUNDARY: &str = "pdash-test-boundary";

    fn multipart_request(field: &str, file_name: &str, contents: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             {contents}\r\n\
             --{BOUNDARY}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri("/api/v1/products/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request")
    }

    fn import_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/products/import")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(check_extension("r", "products.XLSX").is_ok());
        assert!(check_extension("r", "amazon.sales.csv").is_ok());
        assert!(check_extension("r", "legacy.xls").is_ok());
    }

    #[test]
    fn extension_check_rejects_other_types() {
        let err = check_extension("r", "products.pdf").expect_err("rejected");
        assert_eq!(err.error.code, "invalid_file_type");
        assert!(check_extension("r", "xlsx").is_ok());
        assert!(check_extension("r", "").is_err());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn upload_csv_returns_report(pool: sqlx::PgPool) {
        let csv = "product_id,product_name,rating\nB001,Cable,4.2\n,Nameless,3\n";
        let request = multipart_request("file", "p.csv", csv);

        let (status, json) = send(app(pool.clone()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["inserted"], 1);
        assert_eq!(json["data"]["skipped"], 1);
        assert_eq!(
            json["data"]["errors"][0]["reason"],
            serde_json::json!(["product_id is required"])
        );
        let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(stored, 1);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn upload_header_only_reports_no_data_rows(pool: sqlx::PgPool) {
        let request = multipart_request("file", "empty.csv", "product_id,product_name\n");

        let (status, json) = send(app(pool), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["message"], "NO_DATA_ROWS");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn upload_rejects_disallowed_extension(pool: sqlx::PgPool) {
        let request = multipart_request("file", "notes.txt", "hello");

        let (status, json) = send(app(pool), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "invalid_file_type");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn upload_without_file_field_is_rejected(pool: sqlx::PgPool) {
        let request = multipart_request("attachment", "p.csv", "product_id\nB001\n");

        let (status, json) = send(app(pool), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "file_required");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn upload_of_corrupt_workbook_is_invalid_file(pool: sqlx::PgPool) {
        let request = multipart_request("file", "broken.xlsx", "PK\u{3}\u{4}garbage");

        let (status, json) = send(app(pool), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "invalid_file");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn upload_over_body_limit_is_payload_too_large(pool: sqlx::PgPool) {
        let mut csv = String::from("product_id,product_name\n");
        for i in 0..200 {
            csv.push_str(&format!("B{i:04},Product number {i}\n"));
        }
        let request = multipart_request("file", "big.csv", &csv);

        let (status, json) = send(app_with_upload_limit(pool.clone(), 512), request).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json["error"]["code"], "payload_too_large");
        let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(stored, 0);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn import_requires_path(pool: sqlx::PgPool) {
        let (status, json) = send(app(pool), import_request(serde_json::json!({}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "validation_error");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn import_missing_file_is_invalid_file(pool: sqlx::PgPool) {
        let body = serde_json::json!({ "path": "/nonexistent/pdash/products.xlsx" });

        let (status, json) = send(app(pool), import_request(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "invalid_file");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn import_reads_file_from_disk(pool: sqlx::PgPool) {
        let file_name = format!("pdash-import-{}.csv", uuid::Uuid::new_v4());
        let path = std::env::temp_dir().join(file_name);
        std::fs::write(&path, "product_id,product_name\nB001,Cable\nB002,Charger\n")
            .expect("write fixture");
        let body = serde_json::json!({ "path": path.display().to_string() });

        let (status, json) = send(app(pool), import_request(body)).await;
        std::fs::remove_file(&path).ok();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["inserted"], 2);
    }
}
