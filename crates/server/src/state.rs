use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use contentforge_core::{
    create_generator, ArticlePromptBuilder, ArticleStore, BatchPipeline, Config, Generator,
    PublisherBackend, SanitizedConfig, WordPressPublisher,
};

/// Shared application state
pub struct AppState {
    config: Config,
    store: Arc<dyn ArticleStore>,
    pipeline: Arc<BatchPipeline>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn ArticleStore>, pipeline: Arc<BatchPipeline>) -> Self {
        Self {
            config,
            store,
            pipeline,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &dyn ArticleStore {
        self.store.as_ref()
    }

    pub fn pipeline(&self) -> &BatchPipeline {
        self.pipeline.as_ref()
    }

    /// Directory uploaded topic files are kept in.
    pub fn upload_dir(&self) -> &Path {
        &self.config.uploads.dir
    }
}

/// Build the batch pipeline and its collaborators from configuration.
pub fn build_pipeline(config: &Config, store: Arc<dyn ArticleStore>) -> Result<BatchPipeline> {
    let generator: Arc<dyn Generator> = Arc::from(
        create_generator(&config.generation).context("Failed to create generation client")?,
    );
    info!(
        provider = generator.provider(),
        model = generator.model(),
        "Generation client initialized"
    );

    let mut pipeline = BatchPipeline::new(config.pipeline.clone(), generator, store)
        .with_prompt_builder(Arc::new(ArticlePromptBuilder::new(config.prompt.clone())));

    match &config.publisher {
        Some(publisher_config) => match publisher_config.backend {
            PublisherBackend::Wordpress => {
                let wp_config = publisher_config
                    .wordpress
                    .clone()
                    .context("WordPress backend selected but [publisher.wordpress] is missing")?;
                info!(url = %wp_config.url, status = wp_config.post_status.as_str(), "WordPress publisher initialized");
                let publisher = WordPressPublisher::new(wp_config)
                    .context("Failed to create WordPress publisher")?;
                pipeline = pipeline.with_publisher(Arc::new(publisher));
            }
        },
        None => info!("No publisher configured, articles will only be stored"),
    }

    info!(
        concurrency_limit = config.pipeline.concurrency_limit,
        call_timeout_secs = config.pipeline.call_timeout_secs,
        "Batch pipeline initialized"
    );
    Ok(pipeline)
}
