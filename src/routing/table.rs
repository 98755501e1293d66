//! Ordered, indexed route storage.
//!
//! # Responsibilities
//! - Own every route and its position
//! - Assign ids and indexes on insertion
//! - Renumber the tail on deletion
//! - Hand out immutable snapshots to readers
//!
//! # Design Decisions
//! - Readers load an `Arc` snapshot from an `ArcSwap` and never block
//! - Writers serialize on a mutex, build the next snapshot, publish it whole
//! - Indexes are always `0..len`, so position in the snapshot == index

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwap;
use thiserror::Error;
use uuid::Uuid;

use crate::routing::route::{NewRoute, Route, RouteId};

/// Immutable view of the table, ordered by index.
pub type Snapshot = Arc<Vec<Route>>;

/// Errors returned by route table operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteTableError {
    #[error("route {0} not found")]
    NotFound(RouteId),
}

/// Concurrently accessed, ordered collection of routes.
#[derive(Debug)]
pub struct RouteTable {
    routes: ArcSwap<Vec<Route>>,
    /// Serializes writers; readers never take it.
    write: Mutex<()>,
}

impl RouteTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            routes: ArcSwap::from_pointee(Vec::new()),
            write: Mutex::new(()),
        }
    }

    /// Append a route at index `len` with a fresh id.
    pub fn add(&self, route: NewRoute) -> Route {
        let _guard = self.lock_writer();
        let current = self.routes.load_full();

        let created = route.into_route(Uuid::new_v4(), current.len());

        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(created.clone());

        self.routes.store(Arc::new(next));
        created
    }

    /// Place a route at `min(index, len)`, shifting later routes up by one.
    pub fn insert(&self, index: usize, route: NewRoute) -> Route {
        let _guard = self.lock_writer();
        let current = self.routes.load_full();

        let position = index.min(current.len());
        let created = route.into_route(Uuid::new_v4(), position);

        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current[..position].iter().cloned());
        next.push(created.clone());
        next.extend(current[position..].iter().cloned().map(|mut r| {
            r.index += 1;
            r
        }));

        self.routes.store(Arc::new(next));
        created
    }

    /// Remove a route by id and close the gap it leaves.
    ///
    /// Every route after the removed one moves down by exactly one index;
    /// routes before it are untouched.
    pub fn delete(&self, id: RouteId) -> Result<Route, RouteTableError> {
        let _guard = self.lock_writer();
        let current = self.routes.load_full();

        let position = current
            .iter()
            .position(|r| r.id == id)
            .ok_or(RouteTableError::NotFound(id))?;

        let mut next = Vec::with_capacity(current.len() - 1);
        next.extend(current[..position].iter().cloned());
        next.extend(current[position + 1..].iter().cloned().map(|mut r| {
            r.index -= 1;
            r
        }));

        self.routes.store(Arc::new(next));
        Ok(current[position].clone())
    }

    /// All routes ordered by index. Later mutations do not affect the result.
    pub fn list(&self) -> Snapshot {
        self.routes.load_full()
    }

    /// Look up a single route by id.
    pub fn get(&self, id: RouteId) -> Result<Route, RouteTableError> {
        self.routes
            .load()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(RouteTableError::NotFound(id))
    }

    pub fn len(&self) -> usize {
        self.routes.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        // The mutex guards no data, so a poisoned lock is still usable.
        self.write.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    fn route(pattern: &str) -> NewRoute {
        NewRoute::new("GET", pattern, "/bin/sh -c", format!("echo {}", pattern)).unwrap()
    }

    /// Table seeded with the four directory-listing routes.
    fn fixture() -> (RouteTable, Vec<Route>) {
        let table = RouteTable::new();
        let created = ["/listRootDir", "/listVarDir", "/listEtcDir", "/listDir/{dirname}"]
            .into_iter()
            .map(|p| table.add(route(p)))
            .collect();
        (table, created)
    }

    fn assert_contiguous(snapshot: &[Route]) {
        for (position, r) in snapshot.iter().enumerate() {
            assert_eq!(r.index, position, "index gap or duplicate at {}", position);
        }
    }

    fn patterns_and_indexes(table: &RouteTable) -> Vec<(String, usize)> {
        table
            .list()
            .iter()
            .map(|r| (r.url_pattern.clone(), r.index))
            .collect()
    }

    #[test]
    fn test_add_appends_with_fresh_ids() {
        let (table, created) = fixture();

        let indexes: Vec<_> = created.iter().map(|r| r.index).collect();
        assert_eq!(indexes, vec![0, 1, 2, 3]);

        let ids: HashSet<_> = created.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), 4);
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_delete_first_route() {
        let (table, created) = fixture();

        let removed = table.delete(created[0].id).unwrap();
        assert_eq!(removed.url_pattern, "/listRootDir");

        assert_eq!(
            patterns_and_indexes(&table),
            vec![
                ("/listVarDir".to_string(), 0),
                ("/listEtcDir".to_string(), 1),
                ("/listDir/{dirname}".to_string(), 2),
            ]
        );

        let ids: Vec<_> = table.list().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![created[1].id, created[2].id, created[3].id]);
    }

    #[test]
    fn test_delete_last_route() {
        let (table, created) = fixture();

        table.delete(created[3].id).unwrap();

        let snapshot = table.list();
        assert_eq!(snapshot.as_slice(), &created[..3]);
    }

    #[test]
    fn test_delete_middle_route() {
        let (table, created) = fixture();

        table.delete(created[1].id).unwrap();

        assert_eq!(
            patterns_and_indexes(&table),
            vec![
                ("/listRootDir".to_string(), 0),
                ("/listEtcDir".to_string(), 1),
                ("/listDir/{dirname}".to_string(), 2),
            ]
        );
        // Routes before the deleted one are untouched
        assert_eq!(table.get(created[0].id).unwrap(), created[0]);
    }

    #[test]
    fn test_delete_unknown_id_leaves_table_unchanged() {
        let (table, _) = fixture();
        let before = table.list();

        let missing = Uuid::new_v4();
        assert_eq!(table.delete(missing), Err(RouteTableError::NotFound(missing)));

        assert_eq!(table.list(), before);
    }

    #[test]
    fn test_delete_twice_is_not_found() {
        let (table, created) = fixture();
        table.delete(created[2].id).unwrap();
        assert_eq!(
            table.delete(created[2].id),
            Err(RouteTableError::NotFound(created[2].id))
        );
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_get() {
        let (table, created) = fixture();
        table.delete(created[0].id).unwrap();

        let fetched = table.get(created[3].id).unwrap();
        assert_eq!(fetched.url_pattern, "/listDir/{dirname}");
        assert_eq!(fetched.index, 2);

        assert_eq!(
            table.get(created[0].id),
            Err(RouteTableError::NotFound(created[0].id))
        );
    }

    #[test]
    fn test_insert_shifts_tail() {
        let (table, created) = fixture();

        let inserted = table.insert(1, route("/inserted"));
        assert_eq!(inserted.index, 1);

        let snapshot = table.list();
        assert_contiguous(&snapshot);
        let ids: Vec<_> = snapshot.iter().map(|r| r.id).collect();
        assert_eq!(
            ids,
            vec![created[0].id, inserted.id, created[1].id, created[2].id, created[3].id]
        );
    }

    #[test]
    fn test_insert_past_end_appends() {
        let (table, _) = fixture();
        let inserted = table.insert(99, route("/tail"));
        assert_eq!(inserted.index, 4);
        assert_eq!(table.list().last().unwrap().id, inserted.id);
    }

    #[test]
    fn test_list_is_idempotent_and_isolated() {
        let (table, created) = fixture();

        let first = table.list();
        let second = table.list();
        assert_eq!(first, second);

        table.delete(created[0].id).unwrap();
        // Earlier snapshot still shows the old table
        assert_eq!(first.len(), 4);
        assert_eq!(first[0].id, created[0].id);
        assert_eq!(table.list().len(), 3);
    }

    #[test]
    fn test_random_operations_keep_invariants() {
        let mut rng = fastrand::Rng::with_seed(0x5eed);
        let table = RouteTable::new();
        let mut issued = HashSet::new();

        for step in 0..500 {
            let before = table.list();
            match rng.u8(..3) {
                0 => {
                    let created = table.add(route(&format!("/r{}", step)));
                    assert_eq!(created.index, before.len());
                    assert!(issued.insert(created.id), "id reused");
                }
                1 => {
                    let created = table.insert(rng.usize(..=before.len() + 2), route("/i"));
                    assert!(issued.insert(created.id), "id reused");
                }
                _ if !before.is_empty() => {
                    let victim = before[rng.usize(..before.len())].id;
                    table.delete(victim).unwrap();

                    // Survivors keep their relative order and content
                    let survivors: Vec<_> =
                        before.iter().filter(|r| r.id != victim).map(|r| r.id).collect();
                    let after: Vec<_> = table.list().iter().map(|r| r.id).collect();
                    assert_eq!(after, survivors);
                }
                _ => {}
            }

            let after = table.list();
            assert_contiguous(&after);
            for r in after.iter() {
                assert_eq!(table.get(r.id).unwrap().url_pattern, r.url_pattern);
            }
        }
    }

    #[test]
    fn test_concurrent_readers_see_contiguous_snapshots() {
        let table = Arc::new(RouteTable::new());
        for i in 0..32 {
            table.add(route(&format!("/seed{}", i)));
        }

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let table = table.clone();
                thread::spawn(move || {
                    for _ in 0..2_000 {
                        assert_contiguous(&table.list());
                    }
                })
            })
            .collect();

        let writer = {
            let table = table.clone();
            thread::spawn(move || {
                for i in 0..500 {
                    let created = table.add(route(&format!("/w{}", i)));
                    let head = table.list()[0].id;
                    table.delete(head).unwrap();
                    table.insert(i % 7, route("/mid"));
                    table.delete(created.id).unwrap();
                }
            })
        };

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }

        assert_contiguous(&table.list());
        assert_eq!(table.len(), 32);
    }
}
