//! Article record store.
//!
//! Every article that survives post-processing is written here before any
//! publishing is attempted. The store is synchronous; the SQLite
//! implementation serialises access behind a mutex.

mod sqlite;
mod types;

pub use sqlite::SqliteArticleStore;
pub use types::*;

/// Trait for article persistence.
pub trait ArticleStore: Send + Sync {
    /// Persist a new article and return the stored record.
    fn store(&self, article: &NewArticle) -> Result<StoredArticle, StoreError>;

    /// Get an article by id.
    fn get(&self, id: i64) -> Result<StoredArticle, StoreError>;

    /// List articles, newest first.
    fn list(&self, query: &ArticleQuery) -> Result<Vec<StoredArticle>, StoreError>;

    /// Count articles matching the query filter (limit/offset ignored).
    fn count(&self, query: &ArticleQuery) -> Result<u64, StoreError>;
}
