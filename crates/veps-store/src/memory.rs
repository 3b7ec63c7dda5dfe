use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use veps_types::{Event, EventId, VectorClock};

use crate::error::StoreResult;
use crate::filter::EventFilter;
use crate::traits::{CausalityStatus, ContextStore};

/// In-memory, HashMap-based context store.
///
/// Intended for tests and single-process deployments. Events are held
/// behind an `RwLock`; nothing is awaited while the lock is held.
pub struct InMemoryContextStore {
    events: RwLock<HashMap<EventId, Event>>,
}

impl InMemoryContextStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            events: RwLock::new(HashMap::new()),
        }
    }

    /// Number of events currently stored.
    pub fn len(&self) -> usize {
        self.events.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.events.read().expect("lock poisoned").is_empty()
    }

    /// Remove all events.
    pub fn clear(&self) {
        self.events.write().expect("lock poisoned").clear();
    }
}

impl Default for InMemoryContextStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContextStore for InMemoryContextStore {
    async fn upsert(&self, event: &Event) -> StoreResult<()> {
        let mut stored = event.clone();
        // The context writer stamps processing time unless the caller
        // already carries one.
        if stored.metadata.processed_at.is_none() {
            stored.metadata.processed_at = Some(Utc::now());
        }
        let mut map = self.events.write().expect("lock poisoned");
        map.insert(stored.id, stored);
        Ok(())
    }

    async fn get_by_id(&self, id: &EventId) -> StoreResult<Option<Event>> {
        let map = self.events.read().expect("lock poisoned");
        Ok(map.get(id).cloned())
    }

    async fn check_causality(&self, clock: &VectorClock) -> StoreResult<CausalityStatus> {
        let map = self.events.read().expect("lock poisoned");
        let mut missing = Vec::new();

        for (node_id, counter) in clock.iter() {
            // A dependency on `node_id` is backed when that node has
            // persisted at least one event whose own clock entry is <=
            // the referenced counter.
            let backed = map.values().any(|event| {
                event.metadata.boundary_node == node_id
                    && event
                        .vector_clock
                        .get(node_id)
                        .is_some_and(|own| own <= counter)
            });
            if !backed {
                missing.push(node_id.to_string());
            }
        }

        if missing.is_empty() {
            Ok(CausalityStatus::satisfied())
        } else {
            Ok(CausalityStatus::missing(missing))
        }
    }

    async fn health(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn query(&self, filter: &EventFilter) -> StoreResult<Vec<Event>> {
        let map = self.events.read().expect("lock poisoned");
        let mut matched: Vec<Event> = map
            .values()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect();
        matched.sort_by_key(|event| event.timestamp);
        if let Some(limit) = filter.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }
}

impl std::fmt::Debug for InMemoryContextStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryContextStore")
            .field("event_count", &self.len())
            .finish()
    }
}
