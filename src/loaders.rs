//! The concrete loader set behind the GraphQL field resolvers.
//!
//! One [`Loaders`] value is built per inbound request and injected into
//! the request context, so every resolver in that request shares the same
//! batch windows and caches.

use std::collections::{HashMap, HashSet};

use crate::dataloaders::{BatchLoader, DataLoader, LoadError};
use crate::models::{Article, Authored, Lesson, Playlist, Quiz};
use crate::store::{Collection, Database, Document};
use async_trait::async_trait;

/// Groups a collection's documents by creator id.
///
/// Keys with no documents resolve to an empty list, never an error.
pub struct CreatedBy<T: Authored> {
    collection: Collection<T>,
}

impl<T: Authored> CreatedBy<T> {
    pub fn new(collection: Collection<T>) -> Self {
        Self { collection }
    }
}

#[async_trait]
impl<T: Authored> BatchLoader<String, Vec<T>> for CreatedBy<T> {
    async fn load_batch(&self, keys: &[String]) -> Result<Vec<Vec<T>>, LoadError> {
        let wanted: HashSet<&str> = keys.iter().map(String::as_str).collect();
        let matches = self
            .collection
            .find(|doc| wanted.contains(doc.creator()))
            .map_err(|err| LoadError::BatchQueryFailure(err.to_string()))?;

        let mut grouped: HashMap<String, Vec<T>> = HashMap::new();
        for doc in matches {
            grouped
                .entry(doc.creator().to_string())
                .or_default()
                .push(doc);
        }
        Ok(keys
            .iter()
            .map(|key| grouped.remove(key).unwrap_or_default())
            .collect())
    }
}

/// Fetches a collection's documents by id.
///
/// Keys with no document resolve to `None`, never an error.
pub struct ById<T: Document> {
    collection: Collection<T>,
}

impl<T: Document> ById<T> {
    pub fn new(collection: Collection<T>) -> Self {
        Self { collection }
    }
}

#[async_trait]
impl<T: Document> BatchLoader<String, Option<T>> for ById<T> {
    async fn load_batch(&self, keys: &[String]) -> Result<Vec<Option<T>>, LoadError> {
        let wanted: HashSet<&str> = keys.iter().map(String::as_str).collect();
        let matches = self
            .collection
            .find(|doc| wanted.contains(doc.id()))
            .map_err(|err| LoadError::BatchQueryFailure(err.to_string()))?;

        let mut by_id: HashMap<String, T> = matches
            .into_iter()
            .map(|doc| (doc.id().to_string(), doc))
            .collect();
        Ok(keys.iter().map(|key| by_id.remove(key)).collect())
    }
}

/// The loader set for one request.
pub struct Loaders {
    pub playlists_by_creator: DataLoader<String, Vec<Playlist>, CreatedBy<Playlist>>,
    pub lessons_by_creator: DataLoader<String, Vec<Lesson>, CreatedBy<Lesson>>,
    pub quizzes_by_creator: DataLoader<String, Vec<Quiz>, CreatedBy<Quiz>>,
    pub articles_by_creator: DataLoader<String, Vec<Article>, CreatedBy<Article>>,
    pub lessons_by_id: DataLoader<String, Option<Lesson>, ById<Lesson>>,
}

impl Loaders {
    pub fn new(db: &Database) -> Self {
        Self {
            playlists_by_creator: DataLoader::new(
                "playlists_by_creator",
                CreatedBy::new(db.playlists.clone()),
            ),
            lessons_by_creator: DataLoader::new(
                "lessons_by_creator",
                CreatedBy::new(db.lessons.clone()),
            ),
            quizzes_by_creator: DataLoader::new(
                "quizzes_by_creator",
                CreatedBy::new(db.quizzes.clone()),
            ),
            articles_by_creator: DataLoader::new(
                "articles_by_creator",
                CreatedBy::new(db.articles.clone()),
            ),
            lessons_by_id: DataLoader::new("lessons_by_id", ById::new(db.lessons.clone())),
        }
    }
}
