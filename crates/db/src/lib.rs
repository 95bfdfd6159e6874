//! In-memory entity store.
//!
//! A [`Store`] keeps one entity type in insertion order and hands out fresh
//! identifiers and timestamps. It performs no uniqueness or foreign-key
//! checks; callers are expected to do that before mutating. Nothing here is
//! global: every store is an ordinary value owned by whoever constructed it.

use std::fmt;

use time::OffsetDateTime;
use uuid::Uuid;

/// An entity that can live in a [`Store`].
pub trait Record: Clone + Send + Sync + 'static {
    /// Caller-supplied data for a new record.
    type Draft;
    /// Partial update merged over an existing record.
    type Patch;

    /// Build the stored record. `at` is used for both creation and update stamps.
    fn create(id: String, at: OffsetDateTime, draft: Self::Draft) -> Self;

    fn id(&self) -> &str;

    /// Merge `patch` over `self` and refresh the update stamp to `at`.
    fn apply(&mut self, patch: Self::Patch, at: OffsetDateTime);
}

type IdGenerator = Box<dyn Fn() -> String + Send + Sync>;

/// UUID v7 identifiers: time-ordered, unique, opaque.
pub fn generate_id() -> String {
    Uuid::now_v7().to_string()
}

pub struct Store<T: Record> {
    records: Vec<T>,
    next_id: IdGenerator,
}

impl<T: Record> Store<T> {
    pub fn new() -> Self {
        Self::with_id_generator(generate_id)
    }

    /// Use a custom identifier source. It must never repeat a value.
    pub fn with_id_generator(next_id: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Self {
            records: Vec::new(),
            next_id: Box::new(next_id),
        }
    }

    /// Assign an identifier and timestamps, append, and return the stored record.
    pub fn insert(&mut self, draft: T::Draft) -> T {
        let record = T::create((self.next_id)(), OffsetDateTime::now_utc(), draft);
        tracing::debug!(target: "libris-db", id = record.id(), "record inserted");
        self.records.push(record.clone());
        record
    }

    pub fn find_by_id(&self, id: &str) -> Option<&T> {
        self.records.iter().find(|record| record.id() == id)
    }

    /// First record matching `predicate`, in insertion order.
    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<&T> {
        self.records.iter().find(|record| predicate(record))
    }

    /// Every record in insertion order.
    pub fn find_all(&self) -> &[T] {
        &self.records
    }

    /// Records matching `predicate`, in insertion order.
    pub fn filter(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.records
            .iter()
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }

    /// Merge `patch` into the record with `id`. `None` when no such record exists.
    pub fn update(&mut self, id: &str, patch: T::Patch) -> Option<T> {
        let record = self.records.iter_mut().find(|record| record.id() == id)?;
        record.apply(patch, OffsetDateTime::now_utc());
        tracing::debug!(target: "libris-db", id, "record updated");
        Some(record.clone())
    }

    /// Remove the record with `id`, returning whether one was removed.
    pub fn delete(&mut self, id: &str) -> bool {
        match self.records.iter().position(|record| record.id() == id) {
            Some(index) => {
                self.records.remove(index);
                tracing::debug!(target: "libris-db", id, "record deleted");
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T: Record> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record + fmt::Debug> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("records", &self.records)
            .finish_non_exhaustive()
    }
}
