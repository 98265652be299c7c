//! Persisted tracker dataset
//!
//! The dataset is an ordered list of categories in one pretty-printed JSON
//! file, loaded at startup and written back after any cycle that produced
//! changes or any user edit. Load failures never take the tracker down:
//! a missing or corrupt file falls back to the default dataset. An older
//! flat array of books migrates into a single category.

use std::path::PathBuf;

use tokio::fs;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::domain::item::{default_dataset, BookCategory, TrackedBook};
use crate::error::CoreError;

pub struct TrackerStore {
    path: PathBuf,
    dataset: RwLock<Vec<BookCategory>>,
}

impl TrackerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            dataset: RwLock::new(default_dataset()),
        }
    }

    /// Loads the dataset from disk into memory. Always succeeds; every
    /// failure mode degrades to the default dataset with a log entry.
    pub async fn load(&self) {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no tracker file yet, using default dataset");
                *self.dataset.write().await = default_dataset();
                return;
            }
            Err(err) => {
                error!(path = %self.path.display(), %err, "failed to read tracker file");
                *self.dataset.write().await = default_dataset();
                return;
            }
        };

        let loaded = match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(value) => Self::interpret(value),
            Err(err) => {
                error!(path = %self.path.display(), %err, "tracker file is not valid JSON");
                default_dataset()
            }
        };
        info!(categories = loaded.len(), "tracker dataset loaded");
        *self.dataset.write().await = loaded;
    }

    /// Accepts the current category-list format, migrates the legacy flat
    /// book array, and falls back to the default for anything else.
    fn interpret(value: serde_json::Value) -> Vec<BookCategory> {
        if !value.is_array() {
            error!("tracker dataset is not an array, using default");
            return default_dataset();
        }
        if let Ok(categories) = serde_json::from_value::<Vec<BookCategory>>(value.clone()) {
            return categories;
        }
        match serde_json::from_value::<Vec<TrackedBook>>(value) {
            Ok(books) => {
                warn!(count = books.len(), "migrating flat book list into one category");
                let mut category = BookCategory::new("Imported Trackers");
                category.books = books;
                vec![category]
            }
            Err(err) => {
                error!(%err, "tracker dataset has an unknown shape, using default");
                default_dataset()
            }
        }
    }

    /// Writes the in-memory dataset back to disk.
    pub async fn save(&self) -> Result<(), CoreError> {
        let dataset = self.dataset.read().await;
        let json = serde_json::to_string_pretty(&*dataset)
            .map_err(|err| CoreError::Persistence(err.to_string()))?;
        fs::write(&self.path, json)
            .await
            .map_err(|err| CoreError::Persistence(err.to_string()))?;
        info!(categories = dataset.len(), path = %self.path.display(), "tracker dataset saved");
        Ok(())
    }

    pub async fn snapshot(&self) -> Vec<BookCategory> {
        self.dataset.read().await.clone()
    }

    /// Replaces the whole dataset (user edits arrive this way).
    pub async fn replace(&self, categories: Vec<BookCategory>) {
        *self.dataset.write().await = categories;
    }

    /// Links of every tracked book, in persisted dataset order.
    pub async fn tracked_links(&self) -> Vec<String> {
        self.dataset
            .read()
            .await
            .iter()
            .flat_map(|category| &category.books)
            .filter_map(|book| book.book.link.clone())
            .collect()
    }

    /// Applies `apply` to the book with the given link, if it still
    /// exists. Returns the updated book. The write lock is held only for
    /// the duration of the closure, never across a fetch.
    pub async fn update_book<F>(&self, link: &str, apply: F) -> Option<TrackedBook>
    where
        F: FnOnce(&mut TrackedBook),
    {
        let mut dataset = self.dataset.write().await;
        for category in dataset.iter_mut() {
            if let Some(book) = category
                .books
                .iter_mut()
                .find(|book| book.book.link.as_deref() == Some(link))
            {
                apply(book);
                return Some(book.clone());
            }
        }
        None
    }
}
