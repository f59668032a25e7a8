//! Batch pipeline driver.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::time::Instant;
use tracing::{error, info};
use uuid::Uuid;

use crate::article::{HtmlPostProcessor, PostProcessor};
use crate::generation::Generator;
use crate::metrics;
use crate::prompt::{ArticlePromptBuilder, PromptBuilder};
use crate::publisher::Publisher;
use crate::store::ArticleStore;
use crate::topic::Topic;

use super::collector::OutcomeCollector;
use super::config::PipelineConfig;
use super::error::{PipelineError, TopicError};
use super::types::{BatchProgress, BatchReport, ConcurrencyLimit, Outcome, PoolStatus, RunOptions};
use super::worker::{TopicJob, TopicWorker};

/// Tracks statistics for the worker pool across runs.
#[derive(Default)]
struct PoolStats {
    active: AtomicUsize,
    queued: AtomicUsize,
    peak_active: AtomicUsize,
    total_processed: AtomicU64,
    total_failed: AtomicU64,
    total_runs: AtomicU64,
}

impl PoolStats {
    fn to_status(&self, max_concurrent: usize) -> PoolStatus {
        PoolStatus {
            active: self.active.load(Ordering::Relaxed),
            queued: self.queued.load(Ordering::Relaxed),
            peak_active: self.peak_active.load(Ordering::Relaxed),
            max_concurrent,
            total_processed: self.total_processed.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
            total_runs: self.total_runs.load(Ordering::Relaxed),
        }
    }

    fn record(&self, outcome: &Outcome) {
        self.total_processed.fetch_add(1, Ordering::Relaxed);
        if !outcome.is_success() {
            self.total_failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Active-worker count of one run.
#[derive(Default)]
struct RunGauge {
    active: AtomicUsize,
    peak: AtomicUsize,
}

/// Marks a worker as active until dropped, including on panic.
struct ActiveSlot {
    pool: Arc<PoolStats>,
    run: Arc<RunGauge>,
}

impl ActiveSlot {
    fn enter(pool: &Arc<PoolStats>, run: &Arc<RunGauge>) -> Self {
        let now = pool.active.fetch_add(1, Ordering::SeqCst) + 1;
        pool.peak_active.fetch_max(now, Ordering::SeqCst);
        let now = run.active.fetch_add(1, Ordering::SeqCst) + 1;
        run.peak.fetch_max(now, Ordering::SeqCst);
        Self {
            pool: Arc::clone(pool),
            run: Arc::clone(run),
        }
    }
}

impl Drop for ActiveSlot {
    fn drop(&mut self) {
        self.pool.active.fetch_sub(1, Ordering::SeqCst);
        self.run.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Runs batches of topics through the article pipeline under a concurrency
/// ceiling.
///
/// Each topic gets exactly one [`Outcome`]. A failing topic never affects the
/// others, and a panicking worker is reported as an `internal` failure.
pub struct BatchPipeline {
    config: PipelineConfig,
    worker: TopicWorker,
    stats: Arc<PoolStats>,
}

impl BatchPipeline {
    /// Creates a pipeline with the default prompt builder and post-processor.
    pub fn new(
        config: PipelineConfig,
        generator: Arc<dyn Generator>,
        store: Arc<dyn ArticleStore>,
    ) -> Self {
        let worker = TopicWorker {
            prompt_builder: Arc::new(ArticlePromptBuilder::default()),
            generator,
            post_processor: Arc::new(HtmlPostProcessor::new()),
            store,
            publisher: None,
            call_timeout: config.call_timeout(),
            retry: config.retry.clone(),
        };

        Self {
            config,
            worker,
            stats: Arc::new(PoolStats::default()),
        }
    }

    pub fn with_prompt_builder(mut self, prompt_builder: Arc<dyn PromptBuilder>) -> Self {
        self.worker.prompt_builder = prompt_builder;
        self
    }

    pub fn with_post_processor(mut self, post_processor: Arc<dyn PostProcessor>) -> Self {
        self.worker.post_processor = post_processor;
        self
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.worker.publisher = Some(publisher);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn has_publisher(&self) -> bool {
        self.worker.publisher.is_some()
    }

    /// Current pool statistics.
    pub fn status(&self) -> PoolStatus {
        self.stats.to_status(self.config.concurrency_limit)
    }

    /// Process every topic and return the report once all workers finished.
    pub async fn run(
        &self,
        topics: Vec<Topic>,
        options: RunOptions,
    ) -> Result<BatchReport, PipelineError> {
        self.run_with_progress(topics, options, None).await
    }

    /// Like [`run`](Self::run), also streaming progress updates.
    pub async fn run_with_progress(
        &self,
        topics: Vec<Topic>,
        options: RunOptions,
        progress_tx: Option<mpsc::Sender<BatchProgress>>,
    ) -> Result<BatchReport, PipelineError> {
        let limit = match options.concurrency {
            Some(limit) => limit,
            None => ConcurrencyLimit::try_from(self.config.concurrency_limit)?,
        };

        if options.publish && self.worker.publisher.is_none() {
            return Err(PipelineError::Configuration(
                "publishing requested but no publisher is configured".to_string(),
            ));
        }

        let run_id = Uuid::new_v4();
        if topics.is_empty() {
            info!(run_id = %run_id, "No topics to process");
            return Ok(BatchReport::empty(run_id));
        }

        let total = topics.len();
        let started = Instant::now();
        // A deadline beyond what `Instant` can represent means no deadline.
        let deadline = self
            .config
            .run_timeout()
            .and_then(|t| started.checked_add(t));

        metrics::BATCHES_TOTAL.inc();
        self.stats.total_runs.fetch_add(1, Ordering::Relaxed);
        info!(
            run_id = %run_id,
            total,
            concurrency = limit.get(),
            publish = options.publish,
            "Starting batch"
        );

        if let Some(ref tx) = progress_tx {
            let _ = tx
                .send(BatchProgress::Started {
                    run_id,
                    total,
                    concurrency: limit.get(),
                })
                .await;
        }

        let semaphore = Arc::new(Semaphore::new(limit.get()));
        let collector = Arc::new(OutcomeCollector::with_capacity(total));
        let gauge = Arc::new(RunGauge::default());
        let mut handles = Vec::with_capacity(total);

        for (index, topic) in topics.into_iter().enumerate() {
            let job = TopicJob {
                run_id,
                index,
                topic,
                publish: options.publish,
                deadline,
            };
            let label = job.topic.to_string();

            let worker = self.worker.clone();
            let semaphore = Arc::clone(&semaphore);
            let collector = Arc::clone(&collector);
            let stats = Arc::clone(&self.stats);
            let gauge = Arc::clone(&gauge);
            let progress_tx = progress_tx.clone();

            stats.queued.fetch_add(1, Ordering::Relaxed);

            let handle = tokio::spawn(async move {
                let permit = semaphore.acquire_owned().await;
                stats.queued.fetch_sub(1, Ordering::Relaxed);

                let permit = match permit {
                    Ok(permit) => permit,
                    Err(_) => {
                        let outcome = Outcome::failed(
                            job.index,
                            job.topic.as_str(),
                            &TopicError::Internal("admission semaphore closed".to_string()),
                            0,
                            0,
                        );
                        stats.record(&outcome);
                        collector.append(outcome);
                        return;
                    }
                };
                let slot = ActiveSlot::enter(&stats, &gauge);

                // Best effort: a slow consumer must not hold up an admitted worker.
                if let Some(ref tx) = progress_tx {
                    let _ = tx.try_send(BatchProgress::TopicStarted {
                        run_id: job.run_id,
                        index: job.index,
                        topic: job.topic.to_string(),
                    });
                }

                let outcome = worker.process(&job).await;
                stats.record(&outcome);
                collector.append(outcome.clone());

                drop(slot);
                drop(permit);

                if let Some(ref tx) = progress_tx {
                    let _ = tx
                        .send(BatchProgress::TopicFinished {
                            run_id: job.run_id,
                            outcome,
                        })
                        .await;
                }
            });

            handles.push((index, label, handle));
        }

        for (index, topic, handle) in handles {
            let Err(join_error) = handle.await else {
                continue;
            };

            let reason = if join_error.is_panic() {
                format!("worker panicked: {}", panic_message(join_error.into_panic()))
            } else {
                "worker was cancelled".to_string()
            };
            error!(run_id = %run_id, index, topic = %topic, reason = %reason, "Worker aborted");

            let outcome = Outcome::failed(index, &topic, &TopicError::Internal(reason), 0, 0);
            metrics::TOPICS_TOTAL.with_label_values(&["failure"]).inc();
            metrics::TOPIC_FAILURES.with_label_values(&["internal"]).inc();
            self.stats.record(&outcome);

            if let Some(ref tx) = progress_tx {
                let _ = tx
                    .send(BatchProgress::TopicFinished {
                        run_id,
                        outcome: outcome.clone(),
                    })
                    .await;
            }
            collector.append(outcome);
        }

        let outcomes = collector.drain();
        debug_assert_eq!(outcomes.len(), total);

        let report = BatchReport::from_outcomes(
            run_id,
            outcomes,
            gauge.peak.load(Ordering::SeqCst),
            started.elapsed().as_millis() as u64,
        );

        info!(
            run_id = %run_id,
            total = report.total,
            succeeded = report.succeeded,
            failed = report.failed,
            published = report.published,
            duration_ms = report.duration_ms,
            "Batch finished"
        );

        if let Some(ref tx) = progress_tx {
            let _ = tx
                .send(BatchProgress::Finished {
                    run_id,
                    succeeded: report.succeeded,
                    failed: report.failed,
                    duration_ms: report.duration_ms,
                })
                .await;
        }

        Ok(report)
    }
}

pub(super) fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteArticleStore;
    use crate::testing::MockGenerator;

    fn pipeline(config: PipelineConfig) -> (BatchPipeline, Arc<MockGenerator>) {
        let generator = Arc::new(MockGenerator::new());
        let store = Arc::new(SqliteArticleStore::in_memory().unwrap());
        (
            BatchPipeline::new(config, generator.clone(), store),
            generator,
        )
    }

    #[tokio::test]
    async fn test_initial_status() {
        let (pipeline, _) = pipeline(PipelineConfig::default().with_concurrency_limit(4));
        let status = pipeline.status();
        assert_eq!(status.active, 0);
        assert_eq!(status.queued, 0);
        assert_eq!(status.max_concurrent, 4);
        assert_eq!(status.total_runs, 0);
    }

    #[tokio::test]
    async fn test_publish_without_publisher_is_configuration_error() {
        let (pipeline, generator) = pipeline(PipelineConfig::default());
        let topics = vec![Topic::new("Solar Energy").unwrap()];

        let result = pipeline
            .run(topics, RunOptions::default().with_publish(true))
            .await;

        assert!(matches!(result, Err(PipelineError::Configuration(_))));
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_status_counts_processed_topics() {
        let (pipeline, generator) = pipeline(PipelineConfig::default());
        generator.set_empty_response("Broken");
        let topics = vec![Topic::new("Works").unwrap(), Topic::new("Broken").unwrap()];

        let report = pipeline.run(topics, RunOptions::default()).await.unwrap();
        assert_eq!(report.succeeded, 1);

        let status = pipeline.status();
        assert_eq!(status.total_processed, 2);
        assert_eq!(status.total_failed, 1);
        assert_eq!(status.total_runs, 1);
        assert_eq!(status.active, 0);
        assert!(status.peak_active >= 1);
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new("bang".to_string())), "bang");
        assert_eq!(panic_message(Box::new(7u8)), "unknown panic");
    }
}
