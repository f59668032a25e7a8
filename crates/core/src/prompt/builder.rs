use serde::{Deserialize, Serialize};

use crate::generation::GenerationRequest;
use crate::topic::Topic;

/// Builds the generation request for one topic.
///
/// Implementations must be fast and must not fail for a valid topic.
pub trait PromptBuilder: Send + Sync {
    fn build(&self, topic: &Topic) -> GenerationRequest;
}

/// Prompt template settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Approximate article length in words.
    #[serde(default = "default_word_count")]
    pub word_count: u32,
    /// Writing tone.
    #[serde(default = "default_tone")]
    pub tone: String,
    /// Intended readership.
    #[serde(default = "default_audience")]
    pub audience: String,
}

fn default_word_count() -> u32 {
    1200
}

fn default_tone() -> String {
    "informative".to_string()
}

fn default_audience() -> String {
    "general readers".to_string()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            word_count: default_word_count(),
            tone: default_tone(),
            audience: default_audience(),
        }
    }
}

const SYSTEM_PROMPT: &str = "You are an experienced blog writer and SEO editor. \
You write original, well-structured articles that are accurate and easy to read.";

/// Default builder producing a long-form blog article prompt.
#[derive(Debug, Clone, Default)]
pub struct ArticlePromptBuilder {
    config: PromptConfig,
}

impl ArticlePromptBuilder {
    pub fn new(config: PromptConfig) -> Self {
        Self { config }
    }
}

impl PromptBuilder for ArticlePromptBuilder {
    fn build(&self, topic: &Topic) -> GenerationRequest {
        let prompt = format!(
            "Write a blog article of about {words} words on the topic \"{topic}\".\n\
             Tone: {tone}. Audience: {audience}.\n\n\
             Format requirements:\n\
             - Start with a single line containing the title as a Markdown level-1 heading (# Title).\n\
             - Organise the body with ## section headings.\n\
             - Use short paragraphs and bullet lists where they help readability.\n\
             - End with a brief conclusion.\n\
             - Do not include any commentary before or after the article.",
            words = self.config.word_count,
            topic = topic,
            tone = self.config.tone,
            audience = self.config.audience,
        );

        GenerationRequest::new(prompt).with_system(SYSTEM_PROMPT)
    }
}
