use serde::Serialize;

/// Outcome of one ingestion call.
///
/// `inserted` counts records written by an insert-or-update; `skipped` counts
/// records rejected by validation plus records in chunks whose write failed.
/// `errors` lists validation issues in row order followed by persistence
/// issues in chunk order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    pub inserted: u64,
    pub skipped: u64,
    pub errors: Vec<IngestIssue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<ReportMessage>,
}

impl IngestReport {
    /// Report for a sheet that produced no data rows. Not an error.
    #[must_use]
    pub fn no_data_rows() -> Self {
        Self {
            message: Some(ReportMessage::NoDataRows),
            ..Self::default()
        }
    }

    /// Records one row rejected by validation.
    pub fn record_invalid(&mut self, product_id: Option<String>, violations: Vec<String>) {
        self.skipped += 1;
        self.errors.push(IngestIssue {
            product_id,
            batch_start: None,
            reason: IssueReason::Violations(violations),
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportMessage {
    NoDataRows,
}

/// One entry in [`IngestReport::errors`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestIssue {
    /// Offending record's id, when it could be resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    /// Offset of the first record of a failed chunk within the valid records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_start: Option<usize>,
    pub reason: IssueReason,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IssueReason {
    /// Every constraint the record violated.
    Violations(Vec<String>),
    /// Store error for a whole chunk.
    Persistence(String),
}
