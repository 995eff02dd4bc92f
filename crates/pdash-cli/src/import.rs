//! `import` command handlers.

use std::path::Path;

use anyhow::Context;
use pdash_core::{IngestReport, RawRow, MAX_INGEST_BATCH_SIZE};
use pdash_ingest::{extract_rows, ingest_from_path, prepare_rows, IngestOptions};

/// Clap value parser for `--batch-size`.
pub(crate) fn parse_batch_size(raw: &str) -> Result<usize, String> {
    let size: usize = raw
        .parse()
        .map_err(|_| format!("'{raw}' is not a positive integer"))?;
    if (1..=MAX_INGEST_BATCH_SIZE).contains(&size) {
        Ok(size)
    } else {
        Err(format!("must be between 1 and {MAX_INGEST_BATCH_SIZE}"))
    }
}

/// Ingests the file at `path` and prints the report as JSON.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed. Row and batch
/// failures are part of the printed report.
pub(crate) async fn run_import(
    pool: &sqlx::PgPool,
    path: &Path,
    batch_size: usize,
) -> anyhow::Result<()> {
    let report = ingest_from_path(pool, path, IngestOptions { batch_size })
        .await
        .with_context(|| format!("import of {} failed", path.display()))?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Extracts, normalizes and validates without touching the database.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub(crate) async fn run_dry_run(path: &Path) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let rows = extract_rows(&bytes).with_context(|| format!("failed to parse {}", path.display()))?;

    println!("{}", serde_json::to_string_pretty(&dry_run_preview(&rows))?);
    Ok(())
}

/// What an import of `rows` would do. An empty sheet carries the same
/// `NO_DATA_ROWS` message a real import reports.
pub(crate) fn dry_run_preview(rows: &[RawRow]) -> serde_json::Value {
    let (would_write, report) = if rows.is_empty() {
        (0, IngestReport::no_data_rows())
    } else {
        let prepared = prepare_rows(rows);
        (prepared.valid.len(), prepared.report)
    };

    let mut preview = serde_json::json!({
        "dry_run": true,
        "rows": rows.len(),
        "would_write": would_write,
        "skipped": report.skipped,
        "errors": report.errors,
    });
    if let Some(message) = report.message {
        preview["message"] = serde_json::json!(message);
    }
    preview
}
