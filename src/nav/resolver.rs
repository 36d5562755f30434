//! Parent/sibling resolution over the cache
//!
//! The resolver answers "what is this task's parent, what are its siblings,
//! and where does it sit among them?" from the [`NavCache`] when it can, and
//! from the [`HierarchyClient`] when it must:
//!
//! - parent links never expire; they are dropped only with the children
//!   entry they were learned from
//! - children lists are served while fresh and replaced outright once stale
//! - a remembered index is trusted only after checking the sibling at that
//!   index is still the same task
//! - a task missing from its believed siblings triggers reconciliation: the
//!   parent is re-fetched, the affected children lists are invalidated and
//!   the siblings re-fetched, and the index is found by a plain scan

use chrono::Duration;

use crate::domain::{position_of, Resolution, Sibling, TaskId};
use crate::hierarchy::{HierarchyClient, HierarchyError};
use crate::storage::NavCache;

use super::clock::{Clock, SystemClock};

pub struct Resolver<H, C = SystemClock> {
    client: H,
    clock: C,
    ttl: Duration,
}

impl<H: HierarchyClient> Resolver<H> {
    pub fn new(client: H, ttl: Duration) -> Self {
        Self::with_clock(client, SystemClock, ttl)
    }
}

impl<H: HierarchyClient, C: Clock> Resolver<H, C> {
    pub fn with_clock(client: H, clock: C, ttl: Duration) -> Self {
        Self { client, clock, ttl }
    }

    pub fn client(&self) -> &H {
        &self.client
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Parent of `task`, or `None` for a root task
    pub fn resolve_parent(
        &self,
        cache: &mut NavCache,
        task: &TaskId,
    ) -> Result<Option<TaskId>, HierarchyError> {
        if let Some(parent) = cache.get_parent(task) {
            return Ok(Some(parent.clone()));
        }
        self.fetch_parent(cache, task)
    }

    /// Fetches the parent link, bypassing the cached one
    fn fetch_parent(
        &self,
        cache: &mut NavCache,
        task: &TaskId,
    ) -> Result<Option<TaskId>, HierarchyError> {
        tracing::debug!(%task, "fetching parent");
        let fetched = self.client.get_task(task)?;

        let Some(parent) = fetched.parent else {
            return Ok(None);
        };
        cache.set_parent(task, &parent);
        Ok(Some(parent))
    }

    /// Children of `parent`, from cache while fresh
    pub fn resolve_children(
        &self,
        cache: &mut NavCache,
        parent: &TaskId,
    ) -> Result<Vec<Sibling>, HierarchyError> {
        let now = self.clock.now();
        if let Some(entry) = cache.get_children(parent) {
            if entry.is_fresh(now, self.ttl) {
                return Ok(entry.siblings.clone());
            }
        }

        tracing::debug!(%parent, "fetching children");
        let siblings = self.client.get_children(parent)?;
        cache.set_children(parent, siblings.clone(), self.clock.now());
        Ok(siblings)
    }

    /// Index of `task` among `siblings`
    ///
    /// Tries the remembered position under `parent` first, then scans.
    pub fn find_index(
        cache: &NavCache,
        siblings: &[Sibling],
        task: &TaskId,
        parent: &TaskId,
    ) -> Option<usize> {
        if let Some(last) = cache.get_last_visited(parent) {
            if &last.id == task && last.still_matches(siblings) {
                return Some(last.idx);
            }
        }
        position_of(siblings, task)
    }

    /// Parent, siblings and index of `task`
    ///
    /// `Ok(None)` means the task has no parent. A returned resolution with
    /// `idx == None` means the task could not be located even after
    /// reconciliation (deleted, or beyond the first page of siblings).
    pub fn resolve_parent_and_siblings(
        &self,
        cache: &mut NavCache,
        task: &TaskId,
    ) -> Result<Option<Resolution>, HierarchyError> {
        let Some(parent_id) = self.resolve_parent(cache, task)? else {
            return Ok(None);
        };

        let siblings = self.resolve_children(cache, &parent_id)?;
        if let Some(idx) = Self::find_index(cache, &siblings, task, &parent_id) {
            return Ok(Some(Resolution {
                parent_id,
                siblings,
                idx: Some(idx),
            }));
        }

        self.reconcile(cache, task, &parent_id)
    }

    fn reconcile(
        &self,
        cache: &mut NavCache,
        task: &TaskId,
        believed_parent: &TaskId,
    ) -> Result<Option<Resolution>, HierarchyError> {
        tracing::info!(%task, parent = %believed_parent, "task missing from siblings, reconciling");

        let Some(parent_id) = self.fetch_parent(cache, task)? else {
            return Ok(None);
        };

        if &parent_id != believed_parent {
            tracing::info!(%task, from = %believed_parent, to = %parent_id, "task was reparented");
            cache.remove_children(believed_parent);
        }
        cache.remove_children(&parent_id);

        let siblings = self.resolve_children(cache, &parent_id)?;
        let idx = position_of(&siblings, task);
        if idx.is_none() {
            tracing::debug!(%task, parent = %parent_id, count = siblings.len(), "task not among fresh siblings");
        }

        Ok(Some(Resolution {
            parent_id,
            siblings,
            idx,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LastVisited, PAGE_SIZE};
    use crate::hierarchy::memory::{id, MemoryHierarchy};
    use crate::nav::clock::ManualClock;

    const TTL_MS: i64 = 60_000;

    fn resolver(hierarchy: MemoryHierarchy) -> Resolver<MemoryHierarchy, ManualClock> {
        Resolver::with_clock(hierarchy, ManualClock::at(0), Duration::milliseconds(TTL_MS))
    }

    #[test]
    fn resolves_first_child_without_hint() {
        let r = resolver(MemoryHierarchy::with_family("p", &["a", "b", "c"]));
        let mut cache = NavCache::default();

        let res = r.resolve_parent_and_siblings(&mut cache, &id("a")).unwrap().unwrap();
        assert_eq!(res.parent_id, id("p"));
        assert_eq!(res.idx, Some(0));
        assert_eq!(res.siblings.len(), 3);
    }

    #[test]
    fn root_task_has_no_resolution() {
        let r = resolver(MemoryHierarchy::with_family("p", &["a"]));
        let mut cache = NavCache::default();

        assert!(r.resolve_parent_and_siblings(&mut cache, &id("p")).unwrap().is_none());
        assert!(cache.get_parent(&id("p")).is_none());
    }

    #[test]
    fn parent_is_cached_after_fetch() {
        let r = resolver(MemoryHierarchy::with_family("p", &["a"]));
        let mut cache = NavCache::default();

        assert_eq!(r.resolve_parent(&mut cache, &id("a")).unwrap(), Some(id("p")));
        assert_eq!(r.resolve_parent(&mut cache, &id("a")).unwrap(), Some(id("p")));
        assert_eq!(r.client().task_calls(), 1);
    }

    #[test]
    fn siblings_learned_from_children_skip_parent_fetch() {
        let r = resolver(MemoryHierarchy::with_family("p", &["a", "b", "c"]));
        let mut cache = NavCache::default();

        r.resolve_parent_and_siblings(&mut cache, &id("a")).unwrap();
        let res = r.resolve_parent_and_siblings(&mut cache, &id("c")).unwrap().unwrap();

        assert_eq!(res.idx, Some(2));
        assert_eq!(r.client().task_calls(), 1);
        assert_eq!(r.client().children_calls(), 1);
    }

    #[test]
    fn children_reused_until_ttl() {
        let r = resolver(MemoryHierarchy::with_family("p", &["a", "b", "c"]));
        let mut cache = NavCache::default();

        r.resolve_children(&mut cache, &id("p")).unwrap();
        r.clock().set(TTL_MS - 1);
        r.resolve_children(&mut cache, &id("p")).unwrap();
        assert_eq!(r.client().children_calls(), 1);

        r.clock().set(TTL_MS);
        r.resolve_children(&mut cache, &id("p")).unwrap();
        assert_eq!(r.client().children_calls(), 2);
    }

    #[test]
    fn stale_entry_is_replaced_not_merged() {
        let hierarchy = MemoryHierarchy::with_family("p", &["a", "b"]);
        let r = resolver(hierarchy);
        let mut cache = NavCache::default();

        r.resolve_children(&mut cache, &id("p")).unwrap();
        r.client().remove("b");
        r.client().add("z", Some("p"));
        r.clock().advance(TTL_MS);

        let siblings = r.resolve_children(&mut cache, &id("p")).unwrap();
        let ids: Vec<TaskId> = siblings.into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![id("a"), id("z")]);
        assert_eq!(cache.get_children(&id("p")).unwrap().siblings.len(), 2);
    }

    #[test]
    fn stale_timestamp_refreshed_at_ttl_even_if_unchanged() {
        // P has [A, B, C] fetched at t=0; resolving C at t=61000 re-fetches
        let r = resolver(MemoryHierarchy::with_family("p", &["a", "b", "c"]));
        let mut cache = NavCache::default();

        r.resolve_parent_and_siblings(&mut cache, &id("a")).unwrap();
        r.clock().set(61_000);
        let res = r.resolve_parent_and_siblings(&mut cache, &id("c")).unwrap().unwrap();

        assert_eq!(res.idx, Some(2));
        assert_eq!(r.client().children_calls(), 2);
        assert_eq!(
            cache.get_children(&id("p")).unwrap().fetched_at.timestamp_millis(),
            61_000
        );
    }

    #[test]
    fn fast_path_hit() {
        let list: Vec<Sibling> = ["a", "b", "c"].iter().map(|s| Sibling::new(id(s), "")).collect();
        let mut cache = NavCache::default();
        cache.set_last_visited(&id("p"), LastVisited::new(id("c"), 2));

        assert_eq!(
            Resolver::<MemoryHierarchy, ManualClock>::find_index(&cache, &list, &id("c"), &id("p")),
            Some(2)
        );
    }

    #[test]
    fn fast_path_rejected_when_sibling_moved() {
        let list: Vec<Sibling> = ["x", "a", "b", "q"].iter().map(|s| Sibling::new(id(s), "")).collect();
        let mut cache = NavCache::default();
        // hint says x was at 2, but index 2 now holds b
        cache.set_last_visited(&id("p"), LastVisited::new(id("x"), 2));

        let idx =
            Resolver::<MemoryHierarchy, ManualClock>::find_index(&cache, &list, &id("x"), &id("p"));
        assert_eq!(idx, Some(0));
        assert_ne!(idx, Some(2));
    }

    #[test]
    fn fast_path_ignored_for_other_task() {
        let list: Vec<Sibling> = ["a", "b", "c"].iter().map(|s| Sibling::new(id(s), "")).collect();
        let mut cache = NavCache::default();
        cache.set_last_visited(&id("p"), LastVisited::new(id("c"), 2));

        assert_eq!(
            Resolver::<MemoryHierarchy, ManualClock>::find_index(&cache, &list, &id("a"), &id("p")),
            Some(0)
        );
        assert_eq!(
            Resolver::<MemoryHierarchy, ManualClock>::find_index(&cache, &list, &id("z"), &id("p")),
            None
        );
    }

    #[test]
    fn reparented_task_is_reconciled() {
        let hierarchy = MemoryHierarchy::with_family("A", &["t", "u"]);
        hierarchy.add("B", None);
        hierarchy.add("b1", Some("B"));
        let r = resolver(hierarchy);
        let mut cache = NavCache::default();

        r.resolve_parent_and_siblings(&mut cache, &id("t")).unwrap();
        r.resolve_children(&mut cache, &id("B")).unwrap();
        assert_eq!(cache.get_parent(&id("t")), Some(&id("A")));

        // t moves under B; A's cached children go stale and get re-fetched without t
        r.client().reparent("t", "B");
        r.clock().advance(TTL_MS);

        let res = r.resolve_parent_and_siblings(&mut cache, &id("t")).unwrap().unwrap();
        assert_eq!(res.parent_id, id("B"));
        assert_eq!(res.idx, Some(1));
        assert_eq!(cache.get_parent(&id("t")), Some(&id("B")));
        assert!(cache.get_children(&id("A")).is_none());
        assert_eq!(cache.get_children(&id("B")).unwrap().siblings.len(), 2);
    }

    #[test]
    fn reconciliation_refetches_even_fresh_children() {
        let hierarchy = MemoryHierarchy::with_family("A", &["t"]);
        hierarchy.add("B", None);
        let r = resolver(hierarchy);
        let mut cache = NavCache::default();

        // B's children cached fresh (empty), then t moves there
        r.resolve_children(&mut cache, &id("B")).unwrap();
        r.resolve_parent(&mut cache, &id("t")).unwrap();
        cache.set_parent(&id("t"), &id("B"));
        r.client().reparent("t", "B");

        let calls_before = r.client().children_calls();
        let res = r.resolve_parent_and_siblings(&mut cache, &id("t")).unwrap().unwrap();

        assert_eq!(res.idx, Some(0));
        assert_eq!(r.client().children_calls(), calls_before + 1);
    }

    #[test]
    fn reconciliation_ignores_stale_hint() {
        let hierarchy = MemoryHierarchy::with_family("p", &["a", "b"]);
        let r = resolver(hierarchy);
        let mut cache = NavCache::default();
        r.resolve_children(&mut cache, &id("p")).unwrap();

        // Cached list still [a, b]; c added, hint claims c sits at index 1
        r.client().add("c", Some("p"));
        cache.set_parent(&id("c"), &id("p"));
        cache.set_last_visited(&id("p"), LastVisited::new(id("c"), 1));

        let res = r.resolve_parent_and_siblings(&mut cache, &id("c")).unwrap().unwrap();
        assert_eq!(res.idx, Some(2));
    }

    #[test]
    fn deleted_task_surfaces_not_found() {
        let hierarchy = MemoryHierarchy::with_family("p", &["a", "b"]);
        let r = resolver(hierarchy);
        let mut cache = NavCache::default();
        r.resolve_parent_and_siblings(&mut cache, &id("b")).unwrap();

        r.client().remove("b");
        r.clock().advance(TTL_MS);

        assert!(matches!(
            r.resolve_parent_and_siblings(&mut cache, &id("b")),
            Err(HierarchyError::NotFound(_))
        ));
    }

    #[test]
    fn task_beyond_first_page_stays_unlocated() {
        let hierarchy = MemoryHierarchy::default();
        hierarchy.add("p", None);
        for n in 0..(PAGE_SIZE + 1) {
            hierarchy.add(&format!("c{}", n), Some("p"));
        }
        let r = resolver(hierarchy);
        let mut cache = NavCache::default();

        let last = id(&format!("c{}", PAGE_SIZE));
        let res = r.resolve_parent_and_siblings(&mut cache, &last).unwrap().unwrap();
        assert_eq!(res.idx, None);
        assert!(res.at_page_limit());
    }

    #[test]
    fn reconciliation_to_root_yields_none() {
        let hierarchy = MemoryHierarchy::with_family("p", &["a"]);
        hierarchy.add("x", None);
        let r = resolver(hierarchy);
        let mut cache = NavCache::default();

        // Believed parent p, but x is a root task
        cache.set_parent(&id("x"), &id("p"));
        assert!(r.resolve_parent_and_siblings(&mut cache, &id("x")).unwrap().is_none());
    }

    #[test]
    fn transport_failure_propagates() {
        let r = resolver(MemoryHierarchy::with_family("p", &["a"]));
        r.client().set_offline(true);
        let mut cache = NavCache::default();

        assert!(matches!(
            r.resolve_parent_and_siblings(&mut cache, &id("a")),
            Err(HierarchyError::Transport(_))
        ));
        assert!(cache.is_empty());
    }
}
