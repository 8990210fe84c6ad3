//! Handle registry
//!
//! Gives ephemeral server-side objects stable opaque identities across
//! stateless calls. Each object kind has its own [`HandleTable`]: a sharded
//! concurrent map plus an atomic counter, so allocating a handle never takes a
//! lock and lookups on unrelated handles never contend on a global one.
//!
//! Handles start at 1 and are never reissued. Removing a handle does not
//! touch the object behind it; closing native resources is the caller's job
//! and must happen before removal.

mod entry;

pub use entry::{ConnectionEntry, StatementEntry, StatementMode};

use crate::cursor::ResultCursor;
use crate::error::{BridgeError, BridgeResult};
use dashmap::DashMap;
use sqlbridge_client::protocol::Handle;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Namespace a handle belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Connection,
    Statement,
    ResultSet,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectKind::Connection => f.write_str("connection"),
            ObjectKind::Statement => f.write_str("statement"),
            ObjectKind::ResultSet => f.write_str("result set"),
        }
    }
}

/// Handle-to-object map for one object kind
pub struct HandleTable<T> {
    kind: ObjectKind,
    entries: DashMap<Handle, Arc<T>>,
    next_handle: AtomicU64,
}

impl<T> HandleTable<T> {
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            entries: DashMap::new(),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Register an object and return its new handle
    pub fn put(&self, object: T) -> Handle {
        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(handle, Arc::new(object));
        handle
    }

    pub fn get(&self, handle: Handle) -> BridgeResult<Arc<T>> {
        self.entries
            .get(&handle)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| BridgeError::invalid_handle(self.kind, handle))
    }

    pub fn remove(&self, handle: Handle) -> BridgeResult<Arc<T>> {
        self.entries
            .remove(&handle)
            .map(|(_, object)| object)
            .ok_or_else(|| BridgeError::invalid_handle(self.kind, handle))
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.entries.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the live handles, in no particular order
    pub fn handles(&self) -> Vec<Handle> {
        self.entries.iter().map(|entry| *entry.key()).collect()
    }

    /// Remove every entry and return the objects
    pub fn drain(&self) -> Vec<(Handle, Arc<T>)> {
        let handles = self.handles();
        handles
            .into_iter()
            .filter_map(|h| self.entries.remove(&h))
            .collect()
    }
}

/// Process-wide owner of every connection, statement and result cursor
pub struct ObjectRegistry {
    connections: HandleTable<ConnectionEntry>,
    statements: HandleTable<StatementEntry>,
    result_sets: HandleTable<ResultCursor>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self {
            connections: HandleTable::new(ObjectKind::Connection),
            statements: HandleTable::new(ObjectKind::Statement),
            result_sets: HandleTable::new(ObjectKind::ResultSet),
        }
    }

    pub fn connections(&self) -> &HandleTable<ConnectionEntry> {
        &self.connections
    }

    pub fn statements(&self) -> &HandleTable<StatementEntry> {
        &self.statements
    }

    pub fn result_sets(&self) -> &HandleTable<ResultCursor> {
        &self.result_sets
    }

    pub fn contains(&self, kind: ObjectKind, handle: Handle) -> bool {
        match kind {
            ObjectKind::Connection => self.connections.contains(handle),
            ObjectKind::Statement => self.statements.contains(handle),
            ObjectKind::ResultSet => self.result_sets.contains(handle),
        }
    }

    pub fn remove(&self, kind: ObjectKind, handle: Handle) -> BridgeResult<()> {
        match kind {
            ObjectKind::Connection => self.connections.remove(handle).map(|_| ()),
            ObjectKind::Statement => self.statements.remove(handle).map(|_| ()),
            ObjectKind::ResultSet => self.result_sets.remove(handle).map(|_| ()),
        }
    }

    /// Forget every handle. Native objects are left untouched.
    pub fn clear(&self) {
        self.result_sets.drain();
        self.statements.drain();
        self.connections.drain();
    }

    /// Live object counts as (connections, statements, result sets)
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.connections.len(),
            self.statements.len(),
            self.result_sets.len(),
        )
    }
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_start_at_one_and_increase() {
        let table = HandleTable::new(ObjectKind::Statement);
        assert_eq!(table.put("a"), 1);
        assert_eq!(table.put("b"), 2);
        assert_eq!(*table.get(2).unwrap(), "b");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_removed_handle_is_not_found() {
        let table = HandleTable::new(ObjectKind::ResultSet);
        let h = table.put(10);
        assert_eq!(*table.remove(h).unwrap(), 10);

        let err = table.get(h).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::InvalidHandle {
                kind: ObjectKind::ResultSet,
                handle
            } if handle == h
        ));
        assert!(table.remove(h).is_err());
    }

    #[test]
    fn test_handles_are_not_reissued() {
        let table = HandleTable::new(ObjectKind::Connection);
        let first = table.put(());
        table.remove(first).unwrap();
        let second = table.put(());
        assert_ne!(first, second);
        assert!(table.get(first).is_err());
    }

    #[test]
    fn test_kinds_are_separate_namespaces() {
        let registry = ObjectRegistry::new();
        assert!(!registry.contains(ObjectKind::Statement, 1));
        assert!(registry.remove(ObjectKind::Connection, 1).is_err());
        assert_eq!(registry.counts(), (0, 0, 0));
    }

    #[test]
    fn test_drain_empties_table() {
        let table = HandleTable::new(ObjectKind::Statement);
        table.put(1);
        table.put(2);
        let drained = table.drain();
        assert_eq!(drained.len(), 2);
        assert!(table.is_empty());
    }
}
