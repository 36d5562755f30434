//! Session-scoped hierarchy cache
//!
//! Three maps, all keyed by task id:
//! - `childrenOf`: parent -> ordered children plus the time they were fetched
//! - `lastVisited`: parent -> most recent navigation position under it
//! - `parentOf`: task -> parent
//!
//! The children map is bounded. Inserting past capacity evicts the entry
//! with the oldest fetch time and, with it, every `parentOf` mapping that
//! was learned from that entry. Staleness never evicts; it only makes the
//! resolver re-fetch.
//!
//! Maps are `BTreeMap`s so eviction ties and the persisted layout are
//! deterministic.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::session::{SessionBackend, SessionError};
use crate::domain::{LastVisited, Sibling, TaskId};

/// Default number of children entries kept
pub const DEFAULT_CAPACITY: usize = 20;

/// Default time a children entry is served without re-fetching
pub const DEFAULT_TTL_MS: u64 = 60_000;

/// A cached children enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildrenEntry {
    pub siblings: Vec<Sibling>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub fetched_at: DateTime<Utc>,
}

impl ChildrenEntry {
    /// Returns true while `now - fetched_at < ttl`
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.fetched_at < ttl
    }
}

/// The navigation cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavCache {
    children_of: BTreeMap<TaskId, ChildrenEntry>,
    last_visited: BTreeMap<TaskId, LastVisited>,
    parent_of: BTreeMap<TaskId, TaskId>,

    #[serde(skip, default = "default_capacity")]
    capacity: usize,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for NavCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl NavCache {
    /// Creates an empty cache holding at most `capacity` children entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            children_of: BTreeMap::new(),
            last_visited: BTreeMap::new(),
            parent_of: BTreeMap::new(),
            capacity,
        }
    }

    /// Loads the cache from a session backend
    ///
    /// Never fails: a missing, unreadable or malformed record (including one
    /// that lacks any of the three maps) yields an empty cache.
    pub fn load(backend: &dyn SessionBackend, capacity: usize) -> Self {
        let payload = match backend.read() {
            Ok(Some(payload)) => payload,
            Ok(None) => return Self::with_capacity(capacity),
            Err(e) => {
                tracing::debug!(error = %e, "session cache unreadable, starting empty");
                return Self::with_capacity(capacity);
            }
        };

        match serde_json::from_str::<NavCache>(&payload) {
            Ok(mut cache) => {
                cache.capacity = capacity;
                while cache.children_of.len() > cache.capacity {
                    cache.evict_if_over_capacity();
                }
                tracing::debug!(
                    children = cache.children_of.len(),
                    parents = cache.parent_of.len(),
                    "session cache loaded"
                );
                cache
            }
            Err(e) => {
                tracing::debug!(error = %e, "session cache malformed, starting empty");
                Self::with_capacity(capacity)
            }
        }
    }

    /// Writes the cache to a session backend
    pub fn persist(&self, backend: &dyn SessionBackend) -> Result<(), SessionError> {
        let payload = serde_json::to_string(self)?;
        backend.write(&payload)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get_children(&self, parent: &TaskId) -> Option<&ChildrenEntry> {
        self.children_of.get(parent)
    }

    /// Records `parent`'s children fetched at `fetched_at`
    ///
    /// Every sibling's parent becomes known as a side effect. Runs eviction
    /// afterwards.
    pub fn set_children(&mut self, parent: &TaskId, siblings: Vec<Sibling>, fetched_at: DateTime<Utc>) {
        for sibling in &siblings {
            self.parent_of.insert(sibling.id.clone(), parent.clone());
        }
        self.children_of
            .insert(parent.clone(), ChildrenEntry { siblings, fetched_at });
        self.evict_if_over_capacity();
    }

    /// Drops `parent`'s children entry without touching `parentOf`
    pub fn remove_children(&mut self, parent: &TaskId) -> Option<ChildrenEntry> {
        self.children_of.remove(parent)
    }

    pub fn get_parent(&self, task: &TaskId) -> Option<&TaskId> {
        self.parent_of.get(task)
    }

    pub fn set_parent(&mut self, task: &TaskId, parent: &TaskId) {
        self.parent_of.insert(task.clone(), parent.clone());
    }

    pub fn get_last_visited(&self, parent: &TaskId) -> Option<&LastVisited> {
        self.last_visited.get(parent)
    }

    pub fn set_last_visited(&mut self, parent: &TaskId, visit: LastVisited) {
        self.last_visited.insert(parent.clone(), visit);
    }

    /// Evicts the oldest children entry if over capacity
    ///
    /// Ties on `fetched_at` go to the smallest parent id. Returns the evicted
    /// parent id.
    pub fn evict_if_over_capacity(&mut self) -> Option<TaskId> {
        if self.children_of.len() <= self.capacity {
            return None;
        }

        let oldest = self
            .children_of
            .iter()
            .min_by_key(|(_, entry)| entry.fetched_at)
            .map(|(parent, _)| parent.clone())?;

        let evicted = self.children_of.remove(&oldest)?;
        for sibling in &evicted.siblings {
            if self.parent_of.get(&sibling.id) == Some(&oldest) {
                self.parent_of.remove(&sibling.id);
            }
        }

        tracing::debug!(parent = %oldest, "evicted children entry");
        Some(oldest)
    }

    /// Number of children entries held
    pub fn children_len(&self) -> usize {
        self.children_of.len()
    }

    /// Number of known parent links
    pub fn parent_len(&self) -> usize {
        self.parent_of.len()
    }

    /// Number of remembered positions
    pub fn last_visited_len(&self) -> usize {
        self.last_visited.len()
    }

    /// Iterates children entries in parent id order
    pub fn children_entries(&self) -> impl Iterator<Item = (&TaskId, &ChildrenEntry)> {
        self.children_of.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.children_of.is_empty() && self.last_visited.is_empty() && self.parent_of.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::session::MemorySession;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn id(s: &str) -> TaskId {
        s.parse().unwrap()
    }

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    fn siblings(ids: &[&str]) -> Vec<Sibling> {
        ids.iter().map(|s| Sibling::new(id(s), format!("Task {}", s))).collect()
    }

    #[test]
    fn set_children_backfills_parents() {
        let mut cache = NavCache::default();
        cache.set_children(&id("p"), siblings(&["a", "b"]), at(0));

        assert_eq!(cache.get_parent(&id("a")), Some(&id("p")));
        assert_eq!(cache.get_parent(&id("b")), Some(&id("p")));
        assert_eq!(cache.get_children(&id("p")).unwrap().siblings.len(), 2);
    }

    #[test]
    fn freshness_boundary() {
        let entry = ChildrenEntry {
            siblings: vec![],
            fetched_at: at(1_000),
        };
        let ttl = Duration::milliseconds(DEFAULT_TTL_MS as i64);

        assert!(entry.is_fresh(at(1_000 + 59_999), ttl));
        assert!(!entry.is_fresh(at(1_000 + 60_000), ttl));
    }

    #[test]
    fn eviction_removes_oldest_and_its_parent_links() {
        let mut cache = NavCache::with_capacity(2);
        cache.set_children(&id("p2"), siblings(&["b1"]), at(200));
        cache.set_children(&id("p1"), siblings(&["a1", "a2"]), at(100));
        cache.set_children(&id("p3"), siblings(&["c1"]), at(300));

        assert_eq!(cache.children_len(), 2);
        assert!(cache.get_children(&id("p1")).is_none());
        assert!(cache.get_parent(&id("a1")).is_none());
        assert!(cache.get_parent(&id("a2")).is_none());
        assert_eq!(cache.get_parent(&id("b1")), Some(&id("p2")));
        assert_eq!(cache.get_parent(&id("c1")), Some(&id("p3")));
    }

    #[test]
    fn eviction_keeps_links_repointed_elsewhere() {
        let mut cache = NavCache::with_capacity(1);
        cache.set_children(&id("old"), siblings(&["x"]), at(0));
        // x was reparented and learned directly
        cache.set_parent(&id("x"), &id("new"));
        cache.set_children(&id("other"), siblings(&["y"]), at(10));

        assert!(cache.get_children(&id("old")).is_none());
        assert_eq!(cache.get_parent(&id("x")), Some(&id("new")));
    }

    #[test]
    fn eviction_tie_goes_to_smallest_key() {
        let mut cache = NavCache::with_capacity(2);
        cache.set_children(&id("b"), siblings(&["b1"]), at(5));
        cache.set_children(&id("a"), siblings(&["a1"]), at(5));
        cache.set_children(&id("c"), siblings(&["c1"]), at(9));

        assert!(cache.get_children(&id("a")).is_none());
        assert!(cache.get_children(&id("b")).is_some());
    }

    #[test]
    fn replacing_an_entry_does_not_evict() {
        let mut cache = NavCache::with_capacity(1);
        cache.set_children(&id("p"), siblings(&["a"]), at(0));
        cache.set_children(&id("p"), siblings(&["a", "b"]), at(10));

        assert_eq!(cache.children_len(), 1);
        assert_eq!(cache.get_children(&id("p")).unwrap().fetched_at, at(10));
    }

    #[test]
    fn persisted_layout_uses_camel_case_maps() {
        let mut cache = NavCache::default();
        cache.set_children(&id("p"), siblings(&["a"]), at(42));
        cache.set_last_visited(&id("p"), LastVisited::new(id("a"), 0));

        let json: serde_json::Value = serde_json::to_value(&cache).unwrap();
        assert_eq!(json["childrenOf"]["p"]["fetchedAt"], 42);
        assert_eq!(json["childrenOf"]["p"]["siblings"][0]["id"], "a");
        assert_eq!(json["lastVisited"]["p"]["idx"], 0);
        assert_eq!(json["parentOf"]["a"], "p");
    }

    #[test]
    fn persist_and_load_round_trip() {
        let session = MemorySession::default();
        let mut cache = NavCache::default();
        cache.set_children(&id("p"), siblings(&["a", "b", "c"]), at(1_000));
        cache.set_parent(&id("p"), &id("root"));
        cache.set_last_visited(&id("p"), LastVisited::new(id("b"), 1));

        cache.persist(&session).unwrap();
        let loaded = NavCache::load(&session, DEFAULT_CAPACITY);

        assert_eq!(loaded, cache);
    }

    #[test]
    fn load_missing_record_is_empty() {
        let session = MemorySession::default();
        assert!(NavCache::load(&session, 5).is_empty());
    }

    #[test]
    fn load_malformed_record_is_empty() {
        let session = MemorySession::with_payload("{not json");
        assert!(NavCache::load(&session, 5).is_empty());
    }

    #[test]
    fn load_record_missing_a_map_is_empty() {
        let session = MemorySession::with_payload(
            r#"{"childrenOf": {}, "lastVisited": {"p": {"id": "a", "idx": 0}}}"#,
        );
        let cache = NavCache::load(&session, 5);
        assert!(cache.is_empty());
    }

    #[test]
    fn load_trims_to_capacity() {
        let session = MemorySession::default();
        let mut cache = NavCache::with_capacity(10);
        for i in 0..5 {
            cache.set_children(&id(&format!("p{}", i)), siblings(&[&format!("c{}", i)]), at(i));
        }
        cache.persist(&session).unwrap();

        let loaded = NavCache::load(&session, 3);
        assert_eq!(loaded.children_len(), 3);
        assert!(loaded.get_children(&id("p0")).is_none());
        assert!(loaded.get_children(&id("p1")).is_none());
        assert!(loaded.get_children(&id("p4")).is_some());
    }

    #[test]
    fn persist_failure_is_reported() {
        let session = MemorySession::failing();
        let cache = NavCache::default();
        assert!(cache.persist(&session).is_err());
    }

    proptest! {
        #[test]
        fn capacity_plus_one_evicts_exactly_the_oldest(
            times in proptest::collection::btree_set(0i64..1_000_000, 2..30)
        ) {
            let times: Vec<i64> = times.into_iter().collect();
            let capacity = times.len() - 1;
            let mut cache = NavCache::with_capacity(capacity);

            // Insert in reverse so insertion order differs from time order
            for (n, t) in times.iter().enumerate().rev() {
                let parent = id(&format!("p{}", n));
                let child = id(&format!("c{}", n));
                cache.set_children(&parent, vec![Sibling::new(child, "")], at(*t));
            }

            prop_assert_eq!(cache.children_len(), capacity);
            // times are sorted ascending, so p0 holds the smallest fetched_at
            prop_assert!(cache.get_children(&id("p0")).is_none());
            prop_assert!(cache.get_parent(&id("c0")).is_none());
            for n in 1..times.len() {
                let parent = id(&format!("p{}", n));
                prop_assert!(cache.get_children(&parent).is_some());
                prop_assert_eq!(cache.get_parent(&id(&format!("c{}", n))), Some(&parent));
            }
        }
    }
}
