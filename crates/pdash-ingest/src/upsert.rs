//! Chunked writes of validated products.

use std::fmt::Display;
use std::future::Future;

use pdash_core::{IngestIssue, IssueReason, ValidProduct, MAX_INGEST_BATCH_SIZE};
use sqlx::PgPool;

/// Destination for validated products.
///
/// One call writes one chunk atomically: either every product in `batch` is
/// inserted or updated, or the call fails and none is.
pub trait ProductStore: Sync {
    type Error: Display + Send;

    fn upsert_batch(
        &self,
        batch: &[ValidProduct],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

impl ProductStore for PgPool {
    type Error = pdash_db::DbError;

    fn upsert_batch(
        &self,
        batch: &[ValidProduct],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        async move {
            pdash_db::upsert_products(self, batch).await?;
            Ok(())
        }
    }
}

/// Tally of a chunked write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    /// Products in chunks that were written.
    pub written: u64,
    /// Products in chunks whose write failed.
    pub failed: u64,
    /// One issue per failed chunk, in chunk order.
    pub issues: Vec<IngestIssue>,
}

/// Writes `products` in consecutive chunks of `batch_size` (clamped to
/// `1..=MAX_INGEST_BATCH_SIZE`).
///
/// Chunks are independent: a failed chunk is recorded and the remaining
/// chunks are still attempted. Every product is counted exactly once, as
/// either written or failed.
pub async fn upsert_in_batches<S: ProductStore>(
    store: &S,
    products: &[ValidProduct],
    batch_size: usize,
) -> BatchOutcome {
    let batch_size = batch_size.clamp(1, MAX_INGEST_BATCH_SIZE);
    let mut outcome = BatchOutcome::default();

    for (index, chunk) in products.chunks(batch_size).enumerate() {
        let batch_start = index * batch_size;
        let len = chunk.len() as u64;

        match store.upsert_batch(chunk).await {
            Ok(()) => outcome.written += len,
            Err(error) => {
                tracing::warn!(batch_start, batch_len = len, error = %error, "batch upsert failed");
                outcome.failed += len;
                outcome.issues.push(IngestIssue {
                    product_id: None,
                    batch_start: Some(batch_start),
                    reason: IssueReason::Persistence(error.to_string()),
                });
            }
        }
    }

    outcome
}
