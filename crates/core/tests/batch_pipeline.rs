//! Batch pipeline integration tests.
//!
//! These tests drive the pipeline with mock collaborators and verify:
//! - Exactly one outcome per topic and the concurrency ceiling
//! - Per-topic failure isolation (generation, processing, storage)
//! - Publishing as a secondary result that never fails a stored topic
//! - Timeouts, retries, run deadline and panicking workers

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use contentforge_core::{
    pipeline::{
        BatchPipeline, BatchProgress, ConcurrencyLimit, FailureKind, OutcomeStatus,
        PipelineConfig, PipelineError, RetryConfig, RunOptions,
    },
    testing::{fixtures, MockArticleStore, MockGenerator, MockPublisher},
    InlineTopics, PostStatus, TopicSource,
};

/// Pipeline wired to mocks.
struct TestHarness {
    pipeline: BatchPipeline,
    generator: Arc<MockGenerator>,
    store: Arc<MockArticleStore>,
    publisher: Arc<MockPublisher>,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    fn with_config(config: PipelineConfig) -> Self {
        Self::build(config, MockPublisher::new())
    }

    fn build(config: PipelineConfig, publisher: MockPublisher) -> Self {
        let generator = Arc::new(MockGenerator::new());
        let store = Arc::new(MockArticleStore::new());
        let publisher = Arc::new(publisher);

        let pipeline = BatchPipeline::new(config, generator.clone(), store.clone())
            .with_publisher(publisher.clone());

        Self {
            pipeline,
            generator,
            store,
            publisher,
        }
    }
}

fn limit(value: i64) -> ConcurrencyLimit {
    ConcurrencyLimit::new(value).unwrap()
}

#[tokio::test]
async fn test_one_outcome_per_topic_within_limit() {
    for (l, n) in [(1, 4), (2, 7), (3, 3), (4, 10), (8, 2)] {
        let harness = TestHarness::new();
        harness.generator.set_default_delay(Duration::from_millis(15));

        let names: Vec<String> = (0..n).map(|i| format!("Topic {}", i)).collect();
        let topics = InlineTopics::new(names.clone()).load().unwrap();

        let report = harness
            .pipeline
            .run(topics, RunOptions::default().with_concurrency(limit(l)))
            .await
            .unwrap();

        assert_eq!(report.total, n, "L={} N={}", l, n);
        assert_eq!(report.outcomes.len(), n);
        assert_eq!(report.succeeded, n);
        assert!(harness.generator.max_concurrent() <= l as usize);
        assert!(report.peak_concurrency <= l as usize);
        assert!(report.peak_concurrency >= 1);

        let topics: Vec<_> = report.outcomes.iter().map(|o| o.topic.clone()).collect();
        assert_eq!(topics, names, "outcomes are ordered by input index");
    }
}

#[tokio::test]
async fn test_empty_topic_list_returns_empty_report() {
    let harness = TestHarness::new();

    let report = harness
        .pipeline
        .run(Vec::new(), RunOptions::default())
        .await
        .unwrap();

    assert_eq!(report.total, 0);
    assert!(report.outcomes.is_empty());
    assert_eq!(harness.generator.call_count(), 0);
}

#[tokio::test]
async fn test_invalid_concurrency_limit_is_configuration_error() {
    assert!(matches!(
        ConcurrencyLimit::new(0),
        Err(PipelineError::Configuration(_))
    ));
    assert!(matches!(
        ConcurrencyLimit::new(-1),
        Err(PipelineError::Configuration(_))
    ));

    let harness = TestHarness::with_config(PipelineConfig::default().with_concurrency_limit(0));
    let result = harness
        .pipeline
        .run(fixtures::topics(&["Solar Energy"]), RunOptions::default())
        .await;

    assert!(matches!(result, Err(PipelineError::Configuration(_))));
    assert_eq!(harness.generator.call_count(), 0);
    assert!(harness.store.store_attempts().is_empty());
}

#[tokio::test]
async fn test_oversized_concurrency_limit_is_configuration_error() {
    assert!(matches!(
        ConcurrencyLimit::new(i64::MAX),
        Err(PipelineError::Configuration(_))
    ));

    let harness =
        TestHarness::with_config(PipelineConfig::default().with_concurrency_limit(usize::MAX));
    let result = harness
        .pipeline
        .run(fixtures::topics(&["Solar Energy"]), RunOptions::default())
        .await;

    assert!(matches!(result, Err(PipelineError::Configuration(_))));
    assert_eq!(harness.generator.call_count(), 0);
}

#[tokio::test]
async fn test_empty_generation_fails_topic_without_storing() {
    let harness = TestHarness::new();
    harness.generator.set_empty_response("Blank Topic");

    let report = harness
        .pipeline
        .run(
            fixtures::topics(&["Good Topic", "Blank Topic"]),
            RunOptions::default(),
        )
        .await
        .unwrap();

    let blank = &report.outcomes[1];
    assert_eq!(blank.status, OutcomeStatus::Failure);
    assert_eq!(blank.failure_kind, Some(FailureKind::Generation));
    assert!(blank.error.as_deref().unwrap().contains("generation"));
    assert!(!blank.stored);

    assert_eq!(report.outcomes[0].status, OutcomeStatus::Success);
    assert_eq!(harness.store.store_attempts(), vec!["Good Topic".to_string()]);
}

#[tokio::test]
async fn test_generation_error_is_recorded() {
    let harness = TestHarness::new();
    harness.generator.set_error("Quota", "quota exceeded");

    let report = harness
        .pipeline
        .run(fixtures::topics(&["Quota"]), RunOptions::default())
        .await
        .unwrap();

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.failure_kind, Some(FailureKind::Generation));
    let error = outcome.error.as_deref().unwrap();
    assert!(error.contains("generation"));
    assert!(error.contains("quota exceeded"));
    assert_eq!(outcome.attempts, 1);
}

#[tokio::test]
async fn test_processing_failure_skips_store() {
    let harness = TestHarness::new();
    harness.generator.set_response("Title Only", "# Just a heading");

    let report = harness
        .pipeline
        .run(fixtures::topics(&["Title Only"]), RunOptions::default())
        .await
        .unwrap();

    assert_eq!(report.outcomes[0].failure_kind, Some(FailureKind::Processing));
    assert!(harness.store.store_attempts().is_empty());
}

#[tokio::test]
async fn test_store_failure_skips_publishing() {
    let harness = TestHarness::new();
    harness.store.set_fail_for("Unstorable");

    let report = harness
        .pipeline
        .run(
            fixtures::topics(&["Unstorable", "Fine"]),
            RunOptions::default().with_publish(true),
        )
        .await
        .unwrap();

    let failed = &report.outcomes[0];
    assert_eq!(failed.status, OutcomeStatus::Failure);
    assert_eq!(failed.failure_kind, Some(FailureKind::Storage));
    assert!(!failed.published);

    let titles: Vec<_> = harness
        .publisher
        .recorded_posts()
        .into_iter()
        .map(|p| p.title)
        .collect();
    assert_eq!(titles, vec![fixtures::default_title("Fine")]);
    assert!(report.outcomes[1].published);
}

#[tokio::test]
async fn test_rejected_post_keeps_topic_successful() {
    let harness = TestHarness::new();
    harness
        .publisher
        .set_reject_title(&fixtures::default_title("Rejected"));

    let report = harness
        .pipeline
        .run(
            fixtures::topics(&["Accepted", "Rejected", "Also Accepted"]),
            RunOptions::default().with_publish(true),
        )
        .await
        .unwrap();

    let rejected = &report.outcomes[1];
    assert_eq!(rejected.status, OutcomeStatus::Success);
    assert!(rejected.stored);
    assert!(!rejected.published);
    assert!(rejected.publish_error.is_some());

    assert!(report.outcomes[0].published);
    assert!(report.outcomes[2].published);
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.published, 2);
}

#[tokio::test]
async fn test_publish_error_keeps_topic_successful() {
    let harness = TestHarness::new();
    harness
        .publisher
        .set_fail_title(&fixtures::default_title("Offline"));

    let report = harness
        .pipeline
        .run(
            fixtures::topics(&["Offline"]),
            RunOptions::default().with_publish(true),
        )
        .await
        .unwrap();

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.status, OutcomeStatus::Success);
    assert!(!outcome.published);
    assert!(outcome
        .publish_error
        .as_deref()
        .unwrap()
        .contains("connection refused"));
}

#[tokio::test]
async fn test_panicking_publisher_keeps_stored_topic_successful() {
    let harness = TestHarness::new();
    harness
        .publisher
        .set_panic_title(&fixtures::default_title("Fragile CMS"));

    let report = harness
        .pipeline
        .run(
            fixtures::topics(&["Fragile CMS", "Steady"]),
            RunOptions::default().with_publish(true),
        )
        .await
        .unwrap();

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.status, OutcomeStatus::Success);
    assert!(outcome.stored);
    assert!(outcome.article_id.is_some());
    assert!(!outcome.published);
    assert!(outcome
        .publish_error
        .as_deref()
        .unwrap()
        .contains("publisher panicked"));
    assert!(outcome.failure_kind.is_none());

    assert_eq!(harness.store.stored_articles().len(), 2);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.published, 1);
    assert_eq!(harness.pipeline.status().active, 0);
}

#[tokio::test]
async fn test_no_publishing_unless_requested() {
    let harness = TestHarness::new();

    let report = harness
        .pipeline
        .run(fixtures::topics(&["A", "B"]), RunOptions::default())
        .await
        .unwrap();

    assert_eq!(report.published, 0);
    assert!(harness.publisher.recorded_posts().is_empty());
    assert_eq!(harness.store.stored_count(), 2);
}

#[tokio::test]
async fn test_featured_image_is_attached() {
    let publisher = MockPublisher::new()
        .with_featured_image("/images/cover.png")
        .with_post_status(PostStatus::Draft);
    let harness = TestHarness::build(PipelineConfig::default(), publisher);

    let report = harness
        .pipeline
        .run(
            fixtures::topics(&["Solar Energy"]),
            RunOptions::default().with_publish(true),
        )
        .await
        .unwrap();

    assert!(report.outcomes[0].published);

    let uploads = harness.publisher.recorded_uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].title, fixtures::default_title("Solar Energy"));

    let posts = harness.publisher.recorded_posts();
    assert_eq!(posts[0].featured_media, Some(101));
    assert_eq!(posts[0].status, PostStatus::Draft);
}

#[tokio::test]
async fn test_failed_image_upload_still_creates_post() {
    let publisher = MockPublisher::new().with_featured_image("/images/cover.png");
    let harness = TestHarness::build(PipelineConfig::default(), publisher);
    harness.publisher.set_upload_error(true);

    let report = harness
        .pipeline
        .run(
            fixtures::topics(&["Solar Energy"]),
            RunOptions::default().with_publish(true),
        )
        .await
        .unwrap();

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.status, OutcomeStatus::Success);
    assert!(outcome.published);
    assert!(outcome
        .publish_error
        .as_deref()
        .unwrap()
        .contains("featured image"));
    assert_eq!(harness.publisher.recorded_posts()[0].featured_media, None);
}

#[tokio::test]
async fn test_blank_entries_are_dropped_by_topic_source() {
    let harness = TestHarness::new();
    let topics = InlineTopics::new(["Solar Energy", "", "EV Batteries"])
        .load()
        .unwrap();
    assert_eq!(topics.len(), 2);

    let report = harness
        .pipeline
        .run(topics, RunOptions::default())
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.outcomes[0].topic, "Solar Energy");
    assert_eq!(report.outcomes[1].topic, "EV Batteries");
}

#[tokio::test]
async fn test_mixed_delays_respect_limit_of_two() {
    let harness = TestHarness::new();
    let delays = [100, 50, 10, 200, 5];
    let names: Vec<String> = (0..delays.len()).map(|i| format!("Topic {}", i)).collect();
    for (name, delay) in names.iter().zip(delays) {
        harness
            .generator
            .set_delay(name, Duration::from_millis(delay));
    }

    let report = harness
        .pipeline
        .run(
            fixtures::topics(&names.iter().map(String::as_str).collect::<Vec<_>>()),
            RunOptions::default().with_concurrency(limit(2)),
        )
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 5);
    assert_eq!(report.succeeded, 5);
    assert!(harness.generator.max_concurrent() <= 2);
    assert_eq!(report.peak_concurrency, 2);
    let indexes: Vec<_> = report.outcomes.iter().map(|o| o.index).collect();
    assert_eq!(indexes, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn test_panicking_worker_becomes_internal_failure() {
    let harness = TestHarness::new();
    harness.generator.set_panic("Explodes");

    let report = harness
        .pipeline
        .run(
            fixtures::topics(&["Before", "Explodes", "After"]),
            RunOptions::default().with_concurrency(limit(1)),
        )
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 3);
    let exploded = &report.outcomes[1];
    assert_eq!(exploded.topic, "Explodes");
    assert_eq!(exploded.failure_kind, Some(FailureKind::Internal));
    assert!(exploded.error.as_deref().unwrap().contains("panicked"));

    // The slot was released: the next topic still ran.
    assert_eq!(report.outcomes[2].status, OutcomeStatus::Success);
    assert_eq!(harness.pipeline.status().active, 0);
}

#[tokio::test]
async fn test_generation_timeout() {
    let harness = TestHarness::with_config(PipelineConfig::default().with_call_timeout(1));
    harness
        .generator
        .set_delay("Slow", Duration::from_millis(2500));

    let report = harness
        .pipeline
        .run(fixtures::topics(&["Slow", "Fast"]), RunOptions::default())
        .await
        .unwrap();

    let slow = &report.outcomes[0];
    assert_eq!(slow.failure_kind, Some(FailureKind::Timeout));
    assert!(slow.error.as_deref().unwrap().contains("generation"));
    assert_eq!(report.outcomes[1].status, OutcomeStatus::Success);
}

#[tokio::test]
async fn test_retry_recovers_flaky_generation() {
    let retry = RetryConfig {
        max_attempts: 3,
        initial_delay_ms: 10,
        max_delay_ms: 50,
        backoff_multiplier: 2.0,
    };
    let harness = TestHarness::with_config(PipelineConfig::default().with_retry(retry));
    harness.generator.set_failures_before_success("Flaky", 2);

    let report = harness
        .pipeline
        .run(fixtures::topics(&["Flaky"]), RunOptions::default())
        .await
        .unwrap();

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.status, OutcomeStatus::Success);
    assert_eq!(outcome.attempts, 3);
    assert_eq!(harness.generator.calls_for("Flaky"), 3);
}

#[tokio::test]
async fn test_no_retry_by_default() {
    let harness = TestHarness::new();
    harness.generator.set_failures_before_success("Flaky", 1);

    let report = harness
        .pipeline
        .run(fixtures::topics(&["Flaky"]), RunOptions::default())
        .await
        .unwrap();

    assert_eq!(report.outcomes[0].status, OutcomeStatus::Failure);
    assert_eq!(report.outcomes[0].attempts, 1);
    assert_eq!(harness.generator.calls_for("Flaky"), 1);
}

#[tokio::test]
async fn test_run_deadline_fails_unstarted_topics() {
    let harness = TestHarness::with_config(PipelineConfig::default().with_run_timeout(1));
    harness
        .generator
        .set_delay("First", Duration::from_millis(1500));

    let report = harness
        .pipeline
        .run(
            fixtures::topics(&["First", "Second"]),
            RunOptions::default().with_concurrency(limit(1)),
        )
        .await
        .unwrap();

    assert_eq!(report.outcomes[0].failure_kind, Some(FailureKind::Timeout));
    assert_eq!(report.outcomes[1].failure_kind, Some(FailureKind::Deadline));
    assert_eq!(report.outcomes[1].attempts, 0);
    assert_eq!(harness.generator.calls_for("Second"), 0);
}

#[tokio::test]
async fn test_unrepresentable_run_deadline_means_no_deadline() {
    let harness = TestHarness::with_config(PipelineConfig::default().with_run_timeout(u64::MAX));

    let report = harness
        .pipeline
        .run(fixtures::topics(&["Solar Energy"]), RunOptions::default())
        .await
        .unwrap();

    assert_eq!(report.outcomes[0].status, OutcomeStatus::Success);
}

#[tokio::test]
async fn test_retry_past_deadline_is_skipped() {
    let retry = RetryConfig {
        max_attempts: 3,
        initial_delay_ms: u64::MAX,
        max_delay_ms: u64::MAX,
        backoff_multiplier: 2.0,
    };
    let harness = TestHarness::with_config(
        PipelineConfig::default()
            .with_run_timeout(60)
            .with_retry(retry),
    );
    harness.generator.set_failures_before_success("Flaky", 1);

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        harness
            .pipeline
            .run(fixtures::topics(&["Flaky"]), RunOptions::default()),
    )
    .await
    .expect("retry delay should not be slept")
    .unwrap();

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.status, OutcomeStatus::Failure);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(harness.generator.calls_for("Flaky"), 1);
}

#[tokio::test]
async fn test_progress_events() {
    let harness = TestHarness::new();
    harness.generator.set_empty_response("Broken");
    let (tx, mut rx) = mpsc::channel(64);

    let report = harness
        .pipeline
        .run_with_progress(
            fixtures::topics(&["A", "Broken", "C"]),
            RunOptions::default(),
            Some(tx),
        )
        .await
        .unwrap();

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert!(matches!(
        events.first(),
        Some(BatchProgress::Started { total: 3, .. })
    ));
    assert!(matches!(
        events.last(),
        Some(BatchProgress::Finished {
            succeeded: 2,
            failed: 1,
            ..
        })
    ));

    let finished = events
        .iter()
        .filter(|e| matches!(e, BatchProgress::TopicFinished { .. }))
        .count();
    let started = events
        .iter()
        .filter(|e| matches!(e, BatchProgress::TopicStarted { .. }))
        .count();
    assert_eq!(finished, 3);
    assert_eq!(started, 3);
    assert!(events.iter().all(|e| match e {
        BatchProgress::Started { run_id, .. }
        | BatchProgress::TopicStarted { run_id, .. }
        | BatchProgress::TopicFinished { run_id, .. }
        | BatchProgress::Finished { run_id, .. } => *run_id == report.run_id,
    }));
}

#[tokio::test]
async fn test_outcomes_carry_article_details() {
    let harness = TestHarness::new();

    let report = harness
        .pipeline
        .run(fixtures::topics(&["Solar Energy"]), RunOptions::default())
        .await
        .unwrap();

    let outcome = &report.outcomes[0];
    assert_eq!(
        outcome.title.as_deref(),
        Some(fixtures::default_title("Solar Energy").as_str())
    );
    assert!(outcome.word_count.unwrap() > 0);
    assert_eq!(outcome.article_id, Some(1));
    assert!(outcome.stored);
    assert!(outcome.error.is_none());

    let stored = harness.store.stored_articles();
    assert_eq!(stored[0].topic, "Solar Energy");
    assert!(stored[0].content.contains("<h2>Why it matters</h2>"));
}

#[tokio::test]
async fn test_topic_finished_is_sent_after_slot_release() {
    let harness = TestHarness::new();
    let pipeline = Arc::new(harness.pipeline);
    let (tx, mut rx) = mpsc::channel(1);

    let runner = {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move {
            pipeline
                .run_with_progress(
                    fixtures::topics(&["Solo"]),
                    RunOptions::default().with_concurrency(limit(1)),
                    Some(tx),
                )
                .await
        })
    };

    let mut finished = 0;
    while let Some(event) = rx.recv().await {
        if let BatchProgress::TopicFinished { outcome, .. } = event {
            // Slow consumer: the worker has already given its slot back.
            assert_eq!(pipeline.status().active, 0);
            assert_eq!(outcome.status, OutcomeStatus::Success);
            finished += 1;
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    let report = runner.await.unwrap().unwrap();
    assert_eq!(finished, 1);
    assert_eq!(report.succeeded, 1);
}
