use thiserror::Error;

/// File-level failures. Anything that goes wrong with an individual row or
/// chunk is reported inside the [`pdash_core::IngestReport`] instead.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unreadable workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("workbook contains no sheets")]
    NoSheets,
}
