//! Prompt building for article generation.

mod builder;

pub use builder::{ArticlePromptBuilder, PromptBuilder, PromptConfig};
