//! Mock article store for testing.

use chrono::Utc;
use std::collections::HashSet;
use std::sync::Mutex;

use crate::store::{ArticleQuery, ArticleStore, NewArticle, StoreError, StoredArticle};

#[derive(Debug, Default)]
struct State {
    articles: Vec<StoredArticle>,
    failing_topics: HashSet<String>,
    fail_all: bool,
    attempts: Vec<String>,
}

/// In-memory implementation of the ArticleStore trait.
///
/// Records every store attempt (including failed ones) and can be told to
/// fail for specific topics.
#[derive(Debug, Default)]
pub struct MockArticleStore {
    state: Mutex<State>,
}

impl MockArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Fail every store call for the topic.
    pub fn set_fail_for(&self, topic: &str) {
        self.state().failing_topics.insert(topic.to_string());
    }

    /// Fail every store call.
    pub fn set_fail_all(&self, fail: bool) {
        self.state().fail_all = fail;
    }

    /// Topics of all store calls, successful or not.
    pub fn store_attempts(&self) -> Vec<String> {
        self.state().attempts.clone()
    }

    /// Articles successfully stored.
    pub fn stored_articles(&self) -> Vec<StoredArticle> {
        self.state().articles.clone()
    }

    pub fn stored_count(&self) -> usize {
        self.state().articles.len()
    }
}

impl ArticleStore for MockArticleStore {
    fn store(&self, article: &NewArticle) -> Result<StoredArticle, StoreError> {
        let mut state = self.state();
        state.attempts.push(article.topic.clone());

        if state.fail_all || state.failing_topics.contains(&article.topic) {
            return Err(StoreError::Database("mock store failure".to_string()));
        }

        let stored = StoredArticle {
            id: state.articles.len() as i64 + 1,
            topic: article.topic.clone(),
            title: article.title.clone(),
            content: article.content.clone(),
            word_count: article.word_count,
            created_at: Utc::now(),
        };
        state.articles.push(stored.clone());
        Ok(stored)
    }

    fn get(&self, id: i64) -> Result<StoredArticle, StoreError> {
        self.state()
            .articles
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn list(&self, query: &ArticleQuery) -> Result<Vec<StoredArticle>, StoreError> {
        Ok(self
            .state()
            .articles
            .iter()
            .rev()
            .filter(|a| matches_topic(a, query))
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .cloned()
            .collect())
    }

    fn count(&self, query: &ArticleQuery) -> Result<u64, StoreError> {
        Ok(self
            .state()
            .articles
            .iter()
            .filter(|a| matches_topic(a, query))
            .count() as u64)
    }
}

fn matches_topic(article: &StoredArticle, query: &ArticleQuery) -> bool {
    query.topic.as_deref().map_or(true, |t| {
        article.topic.to_lowercase().contains(&t.to_lowercase())
    })
}
