//! SQLite-backed article store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{ArticleQuery, ArticleStore, NewArticle, StoreError, StoredArticle};

/// SQLite-backed article store.
pub struct SqliteArticleStore {
    conn: Mutex<Connection>,
}

impl SqliteArticleStore {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Database(e.to_string()))?;
        }
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                topic TEXT NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                word_count INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_articles_topic ON articles(topic);
            CREATE INDEX IF NOT EXISTS idx_articles_created ON articles(created_at);
            "#,
        )?;
        Ok(())
    }

    // A panic while holding the lock cannot leave a half-written row behind,
    // so a poisoned mutex is still usable.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn row_to_article(row: &rusqlite::Row) -> rusqlite::Result<StoredArticle> {
        let created_at_str: String = row.get(5)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());
        let word_count: i64 = row.get(4)?;

        Ok(StoredArticle {
            id: row.get(0)?,
            topic: row.get(1)?,
            title: row.get(2)?,
            content: row.get(3)?,
            word_count: word_count.max(0) as usize,
            created_at,
        })
    }
}

fn topic_pattern(query: &ArticleQuery) -> Option<String> {
    query
        .topic
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| format!("%{}%", t.to_lowercase()))
}

impl ArticleStore for SqliteArticleStore {
    fn store(&self, article: &NewArticle) -> Result<StoredArticle, StoreError> {
        let conn = self.conn();
        let created_at = Utc::now();

        conn.execute(
            "INSERT INTO articles (topic, title, content, word_count, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![
                &article.topic,
                &article.title,
                &article.content,
                article.word_count as i64,
                created_at.to_rfc3339(),
            ],
        )?;

        Ok(StoredArticle {
            id: conn.last_insert_rowid(),
            topic: article.topic.clone(),
            title: article.title.clone(),
            content: article.content.clone(),
            word_count: article.word_count,
            created_at,
        })
    }

    fn get(&self, id: i64) -> Result<StoredArticle, StoreError> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, topic, title, content, word_count, created_at FROM articles WHERE id = ?",
            params![id],
            Self::row_to_article,
        )
        .optional()?
        .ok_or(StoreError::NotFound(id))
    }

    fn list(&self, query: &ArticleQuery) -> Result<Vec<StoredArticle>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, topic, title, content, word_count, created_at FROM articles
             WHERE (?1 IS NULL OR LOWER(topic) LIKE ?1)
             ORDER BY id DESC
             LIMIT ?2 OFFSET ?3",
        )?;

        let rows = stmt.query_map(
            params![topic_pattern(query), query.limit, query.offset],
            Self::row_to_article,
        )?;

        let mut articles = Vec::new();
        for row in rows {
            articles.push(row?);
        }
        Ok(articles)
    }

    fn count(&self, query: &ArticleQuery) -> Result<u64, StoreError> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM articles WHERE (?1 IS NULL OR LOWER(topic) LIKE ?1)",
            params![topic_pattern(query)],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn article(topic: &str) -> NewArticle {
        NewArticle {
            topic: topic.to_string(),
            title: format!("All about {topic}"),
            content: "<p>Body text here</p>".to_string(),
            word_count: 3,
        }
    }

    #[test]
    fn test_store_and_get() {
        let store = SqliteArticleStore::in_memory().unwrap();

        let stored = store.store(&article("Solar Energy")).unwrap();
        assert!(stored.id > 0);

        let fetched = store.get(stored.id).unwrap();
        assert_eq!(fetched.topic, "Solar Energy");
        assert_eq!(fetched.title, "All about Solar Energy");
        assert_eq!(fetched.content, "<p>Body text here</p>");
        assert_eq!(fetched.word_count, 3);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let store = SqliteArticleStore::in_memory().unwrap();
        assert!(matches!(store.get(42), Err(StoreError::NotFound(42))));
    }

    #[test]
    fn test_list_newest_first_with_paging() {
        let store = SqliteArticleStore::in_memory().unwrap();
        for topic in ["A", "B", "C"] {
            store.store(&article(topic)).unwrap();
        }

        let all = store.list(&ArticleQuery::default()).unwrap();
        let topics: Vec<_> = all.iter().map(|a| a.topic.as_str()).collect();
        assert_eq!(topics, vec!["C", "B", "A"]);

        let page = store
            .list(&ArticleQuery {
                limit: 1,
                offset: 1,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].topic, "B");
    }

    #[test]
    fn test_topic_filter_and_count() {
        let store = SqliteArticleStore::in_memory().unwrap();
        store.store(&article("Solar Energy")).unwrap();
        store.store(&article("Solar Panels")).unwrap();
        store.store(&article("EV Batteries")).unwrap();

        let query = ArticleQuery {
            topic: Some("solar".to_string()),
            ..Default::default()
        };
        assert_eq!(store.list(&query).unwrap().len(), 2);
        assert_eq!(store.count(&query).unwrap(), 2);
        assert_eq!(store.count(&ArticleQuery::default()).unwrap(), 3);
    }

    #[test]
    fn test_file_database_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("articles.db");

        let id = {
            let store = SqliteArticleStore::new(&path).unwrap();
            store.store(&article("Tides")).unwrap().id
        };

        let reopened = SqliteArticleStore::new(&path).unwrap();
        assert_eq!(reopened.get(id).unwrap().topic, "Tides");
    }
}
