//! Per-topic worker: prompt, generate, post-process, store, publish.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::article::{Article, PostProcessor};
use crate::generation::Generator;
use crate::metrics;
use crate::prompt::PromptBuilder;
use crate::publisher::{PostDraft, Publisher};
use crate::store::{ArticleStore, NewArticle, StoredArticle};
use crate::topic::Topic;

use super::config::RetryConfig;
use super::driver::panic_message;
use super::error::TopicError;
use super::types::{Outcome, OutcomeStatus};

/// One topic to process.
#[derive(Debug, Clone)]
pub(crate) struct TopicJob {
    pub run_id: Uuid,
    pub index: usize,
    pub topic: Topic,
    pub publish: bool,
    pub deadline: Option<Instant>,
}

/// Collaborators shared by every worker of a pipeline.
#[derive(Clone)]
pub(crate) struct TopicWorker {
    pub prompt_builder: Arc<dyn PromptBuilder>,
    pub generator: Arc<dyn Generator>,
    pub post_processor: Arc<dyn PostProcessor>,
    pub store: Arc<dyn ArticleStore>,
    pub publisher: Option<Arc<dyn Publisher>>,
    pub call_timeout: Duration,
    pub retry: RetryConfig,
}

struct PublishResult {
    published: bool,
    error: Option<String>,
}

impl TopicWorker {
    /// Process one topic. Every failure ends up on the returned outcome.
    pub async fn process(&self, job: &TopicJob) -> Outcome {
        let started = Instant::now();
        let mut attempts = 0;

        let result = self.produce(job, &mut attempts).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let (article, stored) = match result {
            Ok(produced) => produced,
            Err(error) => {
                warn!(
                    run_id = %job.run_id,
                    index = job.index,
                    topic = %job.topic,
                    error = %error,
                    "Topic failed"
                );
                metrics::TOPICS_TOTAL.with_label_values(&["failure"]).inc();
                metrics::TOPIC_FAILURES
                    .with_label_values(&[error.kind().as_str()])
                    .inc();
                return Outcome::failed(job.index, job.topic.as_str(), &error, attempts, duration_ms);
            }
        };

        let publish = if job.publish {
            self.publish_contained(job, &article).await
        } else {
            PublishResult {
                published: false,
                error: None,
            }
        };

        metrics::TOPICS_TOTAL.with_label_values(&["success"]).inc();
        info!(
            run_id = %job.run_id,
            index = job.index,
            topic = %job.topic,
            article_id = stored.id,
            published = publish.published,
            "Topic processed"
        );

        Outcome {
            index: job.index,
            topic: job.topic.to_string(),
            status: OutcomeStatus::Success,
            title: Some(article.title.clone()),
            word_count: Some(stored.word_count),
            article_id: Some(stored.id),
            stored: true,
            published: publish.published,
            publish_error: publish.error,
            error: None,
            failure_kind: None,
            attempts,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Generate, post-process and store. Storage success makes the topic a success.
    async fn produce(
        &self,
        job: &TopicJob,
        attempts: &mut u32,
    ) -> Result<(Article, StoredArticle), TopicError> {
        if self.budget(job.deadline).is_none() {
            return Err(TopicError::Deadline);
        }

        let text = self.generate(job, attempts).await?;

        let article = self
            .post_processor
            .process(&text)
            .map_err(|e| TopicError::Processing(e.to_string()))?;

        let stored = self
            .store
            .store(&NewArticle {
                topic: job.topic.to_string(),
                title: article.title.clone(),
                content: article.body.clone(),
                word_count: article.word_count(),
            })
            .map_err(|e| TopicError::Storage(e.to_string()))?;

        debug!(index = job.index, article_id = stored.id, "Article stored");
        Ok((article, stored))
    }

    /// Time left for the next external call, `None` once the run deadline passed.
    fn budget(&self, deadline: Option<Instant>) -> Option<Duration> {
        match deadline {
            None => Some(self.call_timeout),
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    None
                } else {
                    Some(remaining.min(self.call_timeout))
                }
            }
        }
    }

    async fn generate(&self, job: &TopicJob, attempts: &mut u32) -> Result<String, TopicError> {
        let request = self.prompt_builder.build(&job.topic);
        let provider = self.generator.provider().to_string();
        let max_attempts = self.retry.max_attempts.max(1);
        let mut last_error = TopicError::GenerationEmpty;

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                let delay = self.retry.delay_for(attempt - 1);
                if job.deadline.is_some_and(|deadline| {
                    Instant::now()
                        .checked_add(delay)
                        .is_none_or(|resume| resume >= deadline)
                }) {
                    break;
                }
                metrics::GENERATION_RETRIES.inc();
                debug!(index = job.index, attempt, delay_ms = delay.as_millis() as u64, "Retrying generation");
                tokio::time::sleep(delay).await;
            }

            let Some(budget) = self.budget(job.deadline) else {
                if attempt == 1 {
                    return Err(TopicError::Deadline);
                }
                break;
            };

            *attempts = attempt;
            let call_started = std::time::Instant::now();
            let result = timeout(budget, self.generator.generate(request.clone())).await;
            let elapsed = call_started.elapsed().as_secs_f64();

            let status = match result {
                Ok(Ok(generated)) => {
                    let usage = &generated.usage;
                    metrics::LLM_TOKENS
                        .with_label_values(&[provider.as_str(), "input"])
                        .inc_by(usage.input_tokens as u64);
                    metrics::LLM_TOKENS
                        .with_label_values(&[provider.as_str(), "output"])
                        .inc_by(usage.output_tokens as u64);

                    if generated.is_empty() {
                        last_error = TopicError::GenerationEmpty;
                        "empty"
                    } else {
                        record_generation(&provider, "success", elapsed);
                        return Ok(generated.text);
                    }
                }
                Ok(Err(e)) => {
                    last_error = TopicError::Generation(e.to_string());
                    "error"
                }
                Err(_) => {
                    last_error = TopicError::Timeout(budget);
                    "timeout"
                }
            };

            record_generation(&provider, status, elapsed);
            warn!(
                index = job.index,
                topic = %job.topic,
                attempt,
                max_attempts,
                error = %last_error,
                "Generation attempt failed"
            );
        }

        Err(last_error)
    }

    /// Runs the publish step on its own task. The article is already stored,
    /// so a panicking publisher only becomes a publish error.
    async fn publish_contained(&self, job: &TopicJob, article: &Article) -> PublishResult {
        let worker = self.clone();
        let task_job = job.clone();
        let article = article.clone();
        let handle = tokio::spawn(async move { worker.publish(&task_job, &article).await });

        match handle.await {
            Ok(result) => result,
            Err(join_error) => {
                let reason = if join_error.is_panic() {
                    format!("publisher panicked: {}", panic_message(join_error.into_panic()))
                } else {
                    "publish task was cancelled".to_string()
                };
                warn!(index = job.index, topic = %job.topic, error = %reason, "Publishing aborted");
                metrics::PUBLISH_TOTAL.with_label_values(&["error"]).inc();
                PublishResult {
                    published: false,
                    error: Some(reason),
                }
            }
        }
    }

    async fn publish(&self, job: &TopicJob, article: &Article) -> PublishResult {
        // Checked by the driver before any worker starts.
        let Some(publisher) = self.publisher.as_ref() else {
            return PublishResult {
                published: false,
                error: Some("no publisher configured".to_string()),
            };
        };
        let service = publisher.name().to_string();
        let mut first_error = None;

        let mut featured_media = None;
        if let Some(image) = publisher.featured_image() {
            match self.budget(job.deadline) {
                None => first_error = Some("run deadline exceeded before image upload".to_string()),
                Some(budget) => {
                    match timeout(budget, publisher.upload_image(image, &article.title)).await {
                        Ok(Ok(media_id)) => {
                            record_external(&service, "upload_image", "success");
                            featured_media = media_id;
                        }
                        Ok(Err(e)) => {
                            record_external(&service, "upload_image", "error");
                            warn!(index = job.index, error = %e, "Featured image upload failed");
                            first_error = Some(format!("featured image upload failed: {}", e));
                        }
                        Err(_) => {
                            record_external(&service, "upload_image", "timeout");
                            first_error =
                                Some(format!("featured image upload timed out after {:?}", budget));
                        }
                    }
                }
            }
        }

        let Some(budget) = self.budget(job.deadline) else {
            metrics::PUBLISH_TOTAL.with_label_values(&["error"]).inc();
            return PublishResult {
                published: false,
                error: first_error
                    .or_else(|| Some("run deadline exceeded before publishing".to_string())),
            };
        };

        let draft = PostDraft {
            title: article.title.clone(),
            content: article.body.clone(),
            status: publisher.post_status(),
            featured_media,
        };

        let (published, error) = match timeout(budget, publisher.create_post(&draft)).await {
            Ok(Ok(true)) => {
                record_external(&service, "create_post", "success");
                metrics::PUBLISH_TOTAL.with_label_values(&["published"]).inc();
                (true, None)
            }
            Ok(Ok(false)) => {
                record_external(&service, "create_post", "rejected");
                metrics::PUBLISH_TOTAL.with_label_values(&["rejected"]).inc();
                (false, Some("post creation rejected by CMS".to_string()))
            }
            Ok(Err(e)) => {
                record_external(&service, "create_post", "error");
                metrics::PUBLISH_TOTAL.with_label_values(&["error"]).inc();
                (false, Some(format!("post creation failed: {}", e)))
            }
            Err(_) => {
                record_external(&service, "create_post", "timeout");
                metrics::PUBLISH_TOTAL.with_label_values(&["error"]).inc();
                (false, Some(format!("post creation timed out after {:?}", budget)))
            }
        };

        if let Some(error) = &error {
            warn!(index = job.index, topic = %job.topic, error = %error, "Publishing failed");
        }

        PublishResult {
            published,
            error: error.or(first_error),
        }
    }
}

fn record_generation(provider: &str, status: &str, elapsed_secs: f64) {
    metrics::GENERATION_DURATION
        .with_label_values(&[status])
        .observe(elapsed_secs);
    record_external(provider, "generate", status);
}

fn record_external(service: &str, operation: &str, status: &str) {
    metrics::EXTERNAL_SERVICE_REQUESTS
        .with_label_values(&[service, operation, status])
        .inc();
}
