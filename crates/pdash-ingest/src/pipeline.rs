//! End-to-end ingestion: file bytes → rows → normalized, validated products →
//! chunked upsert → [`IngestReport`].

use std::path::Path;

use pdash_core::{AppConfig, IngestReport, RawRow, ValidProduct, DEFAULT_INGEST_BATCH_SIZE};

use crate::error::IngestError;
use crate::normalize::{has_product_id_column, normalize_row};
use crate::sheet::{read_first_sheet, SheetGrid};
use crate::upsert::{upsert_in_batches, ProductStore};
use crate::validate::{validate_record, InvalidProduct};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    pub batch_size: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_INGEST_BATCH_SIZE,
        }
    }
}

impl IngestOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            batch_size: config.ingest_batch_size,
        }
    }
}

/// Rows split into products ready to write and a report already holding the
/// validation failures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedRows {
    pub valid: Vec<ValidProduct>,
    pub report: IngestReport,
}

/// Ingests the first sheet of an in-memory file.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be parsed as a workbook or CSV.
/// Row and chunk failures are reported in the returned [`IngestReport`].
pub async fn ingest_from_buffer<S: ProductStore>(
    store: &S,
    bytes: &[u8],
    options: IngestOptions,
) -> Result<IngestReport, IngestError> {
    let rows = extract_rows(bytes)?;
    Ok(ingest_rows(store, rows, options).await)
}

/// Reads a file from disk and ingests it like [`ingest_from_buffer`].
///
/// # Errors
///
/// Returns [`IngestError::Io`] if the file cannot be read, otherwise as
/// [`ingest_from_buffer`].
pub async fn ingest_from_path<S: ProductStore>(
    store: &S,
    path: &Path,
    options: IngestOptions,
) -> Result<IngestReport, IngestError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| IngestError::Io {
            path: path.display().to_string(),
            source,
        })?;
    ingest_from_buffer(store, &bytes, options).await
}

/// Extracts header-keyed rows from the first sheet of `bytes`.
///
/// Exports often put a title line above the real header. When the first row
/// has no `product_id` column but data rows exist, the row below it is used as
/// the header instead. Only one row is skipped.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be parsed.
pub fn extract_rows(bytes: &[u8]) -> Result<Vec<RawRow>, IngestError> {
    let grid = read_first_sheet(bytes)?;
    Ok(rows_with_header_fallback(&grid))
}

fn rows_with_header_fallback(grid: &SheetGrid) -> Vec<RawRow> {
    let first = grid.records(0);
    if first.rows.is_empty() || has_product_id_column(&first.headers) {
        return first.rows;
    }

    tracing::debug!(
        headers = ?first.headers,
        "no product_id column in first row; using second row as header"
    );
    grid.records(1).rows
}

/// Normalizes and validates every row, in row order.
#[must_use]
pub fn prepare_rows(rows: &[RawRow]) -> PreparedRows {
    let mut prepared = PreparedRows::default();

    for row in rows {
        match validate_record(normalize_row(row)) {
            Ok(product) => prepared.valid.push(product),
            Err(InvalidProduct {
                product_id,
                violations,
            }) => {
                tracing::debug!(?product_id, ?violations, "row failed validation");
                prepared.report.record_invalid(product_id, violations);
            }
        }
    }

    prepared
}

/// Runs already-extracted rows through validation and the chunked upsert.
///
/// An empty `rows` yields the no-data report without touching the store.
pub async fn ingest_rows<S: ProductStore>(
    store: &S,
    rows: Vec<RawRow>,
    options: IngestOptions,
) -> IngestReport {
    if rows.is_empty() {
        tracing::info!("sheet has no data rows");
        return IngestReport::no_data_rows();
    }

    let total_rows = rows.len();
    let PreparedRows { valid, mut report } = prepare_rows(&rows);
    drop(rows);

    let outcome = upsert_in_batches(store, &valid, options.batch_size).await;
    report.inserted = outcome.written;
    report.skipped += outcome.failed;
    report.errors.extend(outcome.issues);

    tracing::info!(
        total_rows,
        inserted = report.inserted,
        skipped = report.skipped,
        errors = report.errors.len(),
        "ingestion complete"
    );
    report
}
