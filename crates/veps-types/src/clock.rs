use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Vector clock for causal ordering across distributed producers.
///
/// Maps a node identifier to a monotonic logical counter. Each pipeline
/// instance owns exactly one key (its node id) in every clock it stamps;
/// counters from other nodes arrive by merging.
///
/// Counters are signed 64-bit integers. JSON round-tripping across
/// ecosystems may surface them as floats, so [`VectorClock::from_json`]
/// accepts any numeric form and coerces to integer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorClock(BTreeMap<String, i64>);

impl VectorClock {
    /// Create an empty clock.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Create a clock seeded with a single entry.
    pub fn seeded(node_id: impl Into<String>, counter: i64) -> Self {
        let mut map = BTreeMap::new();
        map.insert(node_id.into(), counter);
        Self(map)
    }

    /// The counter for `node_id`, if present.
    pub fn get(&self, node_id: &str) -> Option<i64> {
        self.0.get(node_id).copied()
    }

    /// Set the counter for `node_id` explicitly.
    pub fn set(&mut self, node_id: impl Into<String>, counter: i64) {
        self.0.insert(node_id.into(), counter);
    }

    /// Advance the counter for `node_id` by one (absent entries start at 0).
    pub fn increment(&mut self, node_id: &str) {
        *self.0.entry(node_id.to_string()).or_insert(0) += 1;
    }

    /// Merge another clock into this one, taking the max of each entry.
    /// Keys absent on this side are copied in.
    pub fn merge(&mut self, other: &VectorClock) {
        for (node_id, &counter) in &other.0 {
            let entry = self.0.entry(node_id.clone()).or_insert(counter);
            if *entry < counter {
                *entry = counter;
            }
        }
    }

    /// Returns `true` if this clock causally precedes `other`.
    ///
    /// Every entry of `self` must be `<=` the matching entry in `other`,
    /// with at least one strictly less. An entry on `self` with no
    /// counterpart in `other` violates the relation; an empty clock
    /// precedes nothing.
    pub fn happens_before(&self, other: &VectorClock) -> bool {
        let mut any_entry = false;
        let mut strictly_less = false;

        for (node_id, &counter) in &self.0 {
            match other.0.get(node_id) {
                None => return false,
                Some(&theirs) if counter > theirs => return false,
                Some(&theirs) => {
                    if counter < theirs {
                        strictly_less = true;
                    }
                    any_entry = true;
                }
            }
        }

        any_entry && strictly_less
    }

    /// Returns `true` if neither clock happens-before the other.
    pub fn concurrent(&self, other: &VectorClock) -> bool {
        !self.happens_before(other) && !other.happens_before(self)
    }

    /// Number of node entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the clock has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(node_id, counter)` entries in node-id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(node, &counter)| (node.as_str(), counter))
    }

    /// Parse a clock from a JSON value, coercing numeric entries to i64.
    ///
    /// Non-object values yield `None`. Non-numeric entries are dropped;
    /// floats are truncated toward zero.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let object = value.as_object()?;
        let mut clock = Self::new();
        for (node_id, entry) in object {
            if let Some(counter) = coerce_counter(entry) {
                clock.set(node_id.clone(), counter);
            }
        }
        Some(clock)
    }
}

fn coerce_counter(value: &serde_json::Value) -> Option<i64> {
    if let Some(i) = value.as_i64() {
        return Some(i);
    }
    if let Some(u) = value.as_u64() {
        return Some(u as i64);
    }
    value.as_f64().map(|f| f as i64)
}

impl fmt::Display for VectorClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (index, (node, counter)) in self.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{node}:{counter}")?;
        }
        write!(f, "}}")
    }
}

impl FromIterator<(String, i64)> for VectorClock {
    fn from_iter<I: IntoIterator<Item = (String, i64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn clock(entries: &[(&str, i64)]) -> VectorClock {
        entries
            .iter()
            .map(|(node, counter)| (node.to_string(), *counter))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Algebra
    // -----------------------------------------------------------------------

    #[test]
    fn increment_is_monotonic() {
        let mut vc = VectorClock::new();
        vc.increment("a");
        assert_eq!(vc.get("a"), Some(1));
        vc.increment("a");
        assert_eq!(vc.get("a"), Some(2));
    }

    #[test]
    fn merge_takes_max_and_copies_new_keys() {
        let mut a = clock(&[("n1", 5), ("n2", 1)]);
        let b = clock(&[("n1", 3), ("n2", 7), ("n3", 2)]);
        a.merge(&b);
        assert_eq!(a.get("n1"), Some(5));
        assert_eq!(a.get("n2"), Some(7));
        assert_eq!(a.get("n3"), Some(2));
    }

    #[test]
    fn merge_is_idempotent() {
        let mut a = clock(&[("n1", 5), ("n2", 3)]);
        let b = clock(&[("n1", 2), ("n3", 9)]);
        a.merge(&b);
        let once = a.clone();
        a.merge(&b);
        assert_eq!(a, once);
    }

    #[test]
    fn merge_is_commutative() {
        let a = clock(&[("n1", 5), ("n2", 1)]);
        let b = clock(&[("n1", 3), ("n3", 4)]);

        let mut ab = a.clone();
        ab.merge(&b);
        let mut ba = b.clone();
        ba.merge(&a);
        assert_eq!(ab, ba);
    }

    #[test]
    fn happens_before_strict() {
        let a = clock(&[("n1", 1), ("n2", 2)]);
        let b = clock(&[("n1", 2), ("n2", 2)]);
        assert!(a.happens_before(&b));
        assert!(!b.happens_before(&a));
    }

    #[test]
    fn equal_clocks_do_not_happen_before() {
        let a = clock(&[("n1", 1)]);
        assert!(!a.happens_before(&a.clone()));
    }

    #[test]
    fn missing_counterpart_violates_relation() {
        // `a` has an entry for n2 that `b` lacks.
        let a = clock(&[("n1", 1), ("n2", 1)]);
        let b = clock(&[("n1", 5)]);
        assert!(!a.happens_before(&b));
    }

    #[test]
    fn empty_clock_precedes_nothing() {
        let empty = VectorClock::new();
        let b = clock(&[("n1", 5)]);
        assert!(!empty.happens_before(&b));
    }

    #[test]
    fn concurrent_clocks() {
        let a = clock(&[("n1", 2), ("n2", 1)]);
        let b = clock(&[("n1", 1), ("n2", 2)]);
        assert!(a.concurrent(&b));
        assert!(b.concurrent(&a));

        let c = clock(&[("n1", 3), ("n2", 3)]);
        assert!(!a.concurrent(&c));
    }

    // -----------------------------------------------------------------------
    // Parsing / serde
    // -----------------------------------------------------------------------

    #[test]
    fn from_json_coerces_numeric_forms() {
        let value = json!({"n1": 3, "n2": 4.0, "n3": 9_000_000_000_i64, "bad": "x"});
        let vc = VectorClock::from_json(&value).unwrap();
        assert_eq!(vc.get("n1"), Some(3));
        assert_eq!(vc.get("n2"), Some(4));
        assert_eq!(vc.get("n3"), Some(9_000_000_000));
        // Non-numeric entries are dropped.
        assert_eq!(vc.get("bad"), None);
    }

    #[test]
    fn from_json_rejects_non_object() {
        assert!(VectorClock::from_json(&json!([1, 2])).is_none());
        assert!(VectorClock::from_json(&json!("clock")).is_none());
    }

    #[test]
    fn serde_roundtrip() {
        let vc = clock(&[("n1", 42), ("n2", 7)]);
        let encoded = serde_json::to_string(&vc).unwrap();
        assert_eq!(encoded, r#"{"n1":42,"n2":7}"#);
        let decoded: VectorClock = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, vc);
    }

    #[test]
    fn display_format() {
        let vc = clock(&[("a", 1), ("b", 2)]);
        assert_eq!(format!("{vc}"), "{a:1, b:2}");
    }
}
