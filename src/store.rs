//! In-memory document store.
//!
//! Collections are concurrent maps keyed by document id. Reads scan the
//! collection with a caller-supplied predicate and return documents in
//! insertion order. Every operation returns [`StoreResult`] so callers see
//! a uniform, fallible querying interface.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;

use crate::models::{Article, Lesson, Playlist, Quiz, User};

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document already exists: {collection}/{id}")]
    AlreadyExists {
        collection: &'static str,
        id: String,
    },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A stored document.
pub trait Document: Clone + Send + Sync + 'static {
    /// Unique identifier within the owning collection.
    fn id(&self) -> &str;
}

struct Stored<T> {
    seq: u64,
    doc: T,
}

/// A single named collection of documents.
///
/// Cloning is cheap and clones share the underlying data. Predicates and
/// update closures run under a map shard lock and must not reenter the
/// same collection.
pub struct Collection<T: Document> {
    name: &'static str,
    entries: Arc<DashMap<String, Stored<T>>>,
    seq: Arc<AtomicU64>,
}

impl<T: Document> Collection<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Arc::new(DashMap::new()),
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Insert a new document, failing if the id is already taken.
    pub fn insert(&self, doc: T) -> StoreResult<T> {
        match self.entries.entry(doc.id().to_string()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists {
                collection: self.name,
                id: doc.id().to_string(),
            }),
            Entry::Vacant(slot) => {
                let seq = self.seq.fetch_add(1, Ordering::SeqCst);
                slot.insert(Stored {
                    seq,
                    doc: doc.clone(),
                });
                Ok(doc)
            }
        }
    }

    pub fn get(&self, id: &str) -> StoreResult<Option<T>> {
        Ok(self.entries.get(id).map(|entry| entry.value().doc.clone()))
    }

    /// Apply `f` to the document under the map lock and return the updated
    /// copy, or `None` if no document has this id.
    pub fn update(&self, id: &str, f: impl FnOnce(&mut T)) -> StoreResult<Option<T>> {
        Ok(self.entries.get_mut(id).map(|mut entry| {
            f(&mut entry.value_mut().doc);
            entry.value().doc.clone()
        }))
    }

    /// Remove a document, returning it if it existed.
    pub fn remove(&self, id: &str) -> StoreResult<Option<T>> {
        Ok(self.entries.remove(id).map(|(_, stored)| stored.doc))
    }

    /// All documents matching `pred`, in insertion order.
    pub fn find(&self, mut pred: impl FnMut(&T) -> bool) -> StoreResult<Vec<T>> {
        let mut hits: Vec<(u64, T)> = self
            .entries
            .iter()
            .filter(|entry| pred(&entry.value().doc))
            .map(|entry| (entry.value().seq, entry.value().doc.clone()))
            .collect();
        hits.sort_by_key(|(seq, _)| *seq);
        Ok(hits.into_iter().map(|(_, doc)| doc).collect())
    }

    pub fn count(&self, mut pred: impl FnMut(&T) -> bool) -> StoreResult<u64> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| pred(&entry.value().doc))
            .count() as u64)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Document> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            entries: self.entries.clone(),
            seq: self.seq.clone(),
        }
    }
}

/// The application's collections. Cheap to clone; clones share data.
#[derive(Clone)]
pub struct Database {
    pub users: Collection<User>,
    pub lessons: Collection<Lesson>,
    pub playlists: Collection<Playlist>,
    pub quizzes: Collection<Quiz>,
    pub articles: Collection<Article>,
}

impl Database {
    pub fn new() -> Self {
        Self {
            users: Collection::new("users"),
            lessons: Collection::new("lessons"),
            playlists: Collection::new("playlists"),
            quizzes: Collection::new("quizzes"),
            articles: Collection::new("articles"),
        }
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}
