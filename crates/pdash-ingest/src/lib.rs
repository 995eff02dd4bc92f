//! Spreadsheet ingestion: extract rows, normalize them onto the canonical
//! product schema, validate, and upsert in bounded batches.

pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod sheet;
pub mod upsert;
pub mod validate;

#[cfg(test)]
mod test_support;

pub use error::IngestError;
pub use normalize::{coerce_number, normalize_row, resolve};
pub use pipeline::{
    extract_rows, ingest_from_buffer, ingest_from_path, ingest_rows, prepare_rows, IngestOptions,
    PreparedRows,
};
pub use sheet::{read_first_sheet, SheetGrid, SheetRecords};
pub use upsert::{upsert_in_batches, BatchOutcome, ProductStore};
pub use validate::{validate_record, InvalidProduct};
