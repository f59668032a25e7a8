pub mod article;
pub mod config;
pub mod generation;
pub mod metrics;
pub mod pipeline;
pub mod prompt;
pub mod publisher;
pub mod store;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod topic;

pub use article::{Article, HtmlPostProcessor, PostProcessor, ProcessingError};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    PublisherBackend, PublisherConfig, SanitizedConfig, ServerConfig, UploadsConfig,
};
pub use generation::{
    create_generator, GeminiClient, GeneratedText, GenerationConfig, GenerationError,
    GenerationProvider, GenerationRequest, GenerationUsage, Generator, OllamaClient,
    OpenAiClient,
};
pub use pipeline::{
    BatchPipeline, BatchProgress, BatchReport, ConcurrencyLimit, FailureKind, Outcome,
    OutcomeCollector, OutcomeStatus, PipelineConfig, PipelineError, PoolStatus, RetryConfig,
    RunOptions, TopicError,
};
pub use prompt::{ArticlePromptBuilder, PromptBuilder, PromptConfig};
pub use publisher::{
    PostDraft, PostStatus, PublishError, Publisher, WordPressConfig, WordPressPublisher,
};
pub use store::{
    ArticleQuery, ArticleStore, NewArticle, SqliteArticleStore, StoreError, StoredArticle,
};
pub use topic::{
    limit_topics, normalize_topics, InlineTopics, TableFormat, TablePreview, Topic, TopicFile,
    TopicSource, TopicSourceError, TopicTable,
};
