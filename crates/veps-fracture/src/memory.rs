use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::NaiveDate;

use veps_types::{EventId, FracturedEvent};

use crate::archive::FractureArchive;
use crate::error::ArchiveResult;
use crate::layout::{date_prefix, fracture_bucket};

/// In-memory archive keyed by hour-bucket path.
///
/// Intended for tests and single-process deployments.
pub struct InMemoryArchive {
    buckets: RwLock<BTreeMap<String, Vec<FracturedEvent>>>,
}

impl InMemoryArchive {
    /// Create a new empty archive.
    pub fn new() -> Self {
        Self {
            buckets: RwLock::new(BTreeMap::new()),
        }
    }

    /// Total number of records across all buckets.
    pub fn len(&self) -> usize {
        self.buckets
            .read()
            .expect("lock poisoned")
            .values()
            .map(Vec::len)
            .sum()
    }

    /// Returns `true` if nothing has been archived.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bucket paths that currently hold records, in path order.
    pub fn bucket_paths(&self) -> Vec<String> {
        self.buckets
            .read()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    /// Find archived fractures for a given event id (test helper for the
    /// durability contract).
    pub fn find_by_event(&self, event_id: &EventId) -> Vec<FracturedEvent> {
        self.buckets
            .read()
            .expect("lock poisoned")
            .values()
            .flatten()
            .filter(|fracture| &fracture.event.id == event_id)
            .cloned()
            .collect()
    }
}

impl Default for InMemoryArchive {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FractureArchive for InMemoryArchive {
    async fn append(&self, fracture: &FracturedEvent) -> ArchiveResult<()> {
        let path = fracture_bucket(fracture);
        let mut buckets = self.buckets.write().expect("lock poisoned");
        buckets.entry(path).or_default().push(fracture.clone());
        Ok(())
    }

    async fn read_date(&self, date: NaiveDate) -> ArchiveResult<Vec<FracturedEvent>> {
        let prefix = date_prefix(date);
        let buckets = self.buckets.read().expect("lock poisoned");
        Ok(buckets
            .iter()
            .filter(|(path, _)| path.starts_with(&prefix))
            .flat_map(|(_, records)| records.iter().cloned())
            .collect())
    }
}

impl std::fmt::Debug for InMemoryArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryArchive")
            .field("record_count", &self.len())
            .finish()
    }
}
