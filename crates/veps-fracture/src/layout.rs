use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};

use veps_types::FracturedEvent;

/// Content type of every archive object.
pub const CONTENT_TYPE: &str = "application/x-ndjson";

/// Object path for the hour bucket a timestamp falls into.
///
/// Format: `YYYY/MM/DD/fractures-HH.jsonl`. Multiple writes to the same
/// hour extend the same object.
pub fn bucket_path(timestamp: DateTime<Utc>) -> String {
    format!(
        "{:04}/{:02}/{:02}/fractures-{:02}.jsonl",
        timestamp.year(),
        timestamp.month(),
        timestamp.day(),
        timestamp.hour(),
    )
}

/// Prefix selecting every hour bucket of a calendar day.
pub fn date_prefix(date: NaiveDate) -> String {
    format!("{:04}/{:02}/{:02}/", date.year(), date.month(), date.day())
}

/// The hour bucket a fracture belongs to: keyed on the **event's**
/// timestamp, so an audit of a stale event lands next to the events it
/// was submitted with, not next to the capture time.
pub fn fracture_bucket(fracture: &FracturedEvent) -> String {
    bucket_path(fracture.event.timestamp)
}

/// Group fractures by their hour bucket, preserving order within each
/// bucket. Batch writers use this to open each object once.
pub fn group_by_bucket(fractures: Vec<FracturedEvent>) -> BTreeMap<String, Vec<FracturedEvent>> {
    let mut buckets: BTreeMap<String, Vec<FracturedEvent>> = BTreeMap::new();
    for fracture in fractures {
        buckets
            .entry(fracture_bucket(&fracture))
            .or_default()
            .push(fracture);
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn bucket_path_is_zero_padded() {
        let timestamp = Utc.with_ymd_and_hms(2026, 3, 7, 9, 15, 0).unwrap();
        assert_eq!(bucket_path(timestamp), "2026/03/07/fractures-09.jsonl");
    }

    #[test]
    fn same_hour_shares_a_bucket() {
        let a = Utc.with_ymd_and_hms(2026, 3, 7, 9, 0, 1).unwrap();
        let b = Utc.with_ymd_and_hms(2026, 3, 7, 9, 59, 59).unwrap();
        assert_eq!(bucket_path(a), bucket_path(b));

        let c = Utc.with_ymd_and_hms(2026, 3, 7, 10, 0, 0).unwrap();
        assert_ne!(bucket_path(a), bucket_path(c));
    }

    #[test]
    fn date_prefix_covers_buckets() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        let prefix = date_prefix(date);
        assert_eq!(prefix, "2026/03/07/");
        let timestamp = Utc.with_ymd_and_hms(2026, 3, 7, 23, 0, 0).unwrap();
        assert!(bucket_path(timestamp).starts_with(&prefix));
    }
}
