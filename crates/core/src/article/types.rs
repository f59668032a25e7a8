use serde::{Deserialize, Serialize};

/// Errors turning generated text into an article.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("generated text has no title")]
    NoTitle,

    #[error("generated text has an empty body")]
    EmptyBody,
}

/// A processed article ready to be stored and published.
///
/// Both fields are non-empty; [`Article::new`] enforces this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    /// HTML body
    pub body: String,
}

impl Article {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Result<Self, ProcessingError> {
        let title = title.into().trim().to_string();
        let body = body.into().trim().to_string();
        if title.is_empty() {
            return Err(ProcessingError::NoTitle);
        }
        if body.is_empty() {
            return Err(ProcessingError::EmptyBody);
        }
        Ok(Self { title, body })
    }

    /// Number of words in the body, ignoring markup.
    pub fn word_count(&self) -> usize {
        word_count(&self.body)
    }
}

/// Count whitespace-separated words outside of HTML tags.
pub(crate) fn word_count(html: &str) -> usize {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_rejects_blank_parts() {
        assert!(matches!(
            Article::new("  ", "<p>body</p>"),
            Err(ProcessingError::NoTitle)
        ));
        assert!(matches!(
            Article::new("Title", "\n"),
            Err(ProcessingError::EmptyBody)
        ));
    }

    #[test]
    fn test_word_count_ignores_tags() {
        let article = Article::new(
            "Solar",
            "<h2>Why solar</h2><p>Panels convert <strong>sunlight</strong> to power.</p>",
        )
        .unwrap();
        assert_eq!(article.word_count(), 7);
    }
}
