use async_trait::async_trait;
use chrono::NaiveDate;

use veps_types::FracturedEvent;

use crate::error::ArchiveResult;

/// Append-only, date-partitioned archive of fracture records.
///
/// All implementations must satisfy these invariants:
/// - Records land in the hour bucket matching their `timestamp`
///   (`YYYY/MM/DD/fractures-HH.jsonl`), one JSON object per line.
/// - Appends never rewrite earlier lines; the archive is an at-least-once
///   log and replays produce duplicate `fracture_id`s by design.
/// - Reads over a date return every record of that day's hour buckets;
///   an unreadable bucket is skipped, not fatal.
#[async_trait]
pub trait FractureArchive: Send + Sync {
    /// Append a single fracture record to its hour bucket.
    async fn append(&self, fracture: &FracturedEvent) -> ArchiveResult<()>;

    /// Append a batch, grouping by hour bucket first so each object is
    /// opened once. Default implementation appends one at a time.
    async fn append_batch(&self, fractures: Vec<FracturedEvent>) -> ArchiveResult<()> {
        for fracture in &fractures {
            self.append(fracture).await?;
        }
        Ok(())
    }

    /// Read every fracture recorded under the given calendar day.
    async fn read_date(&self, date: NaiveDate) -> ArchiveResult<Vec<FracturedEvent>>;
}
