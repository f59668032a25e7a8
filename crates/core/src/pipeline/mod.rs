//! Bounded-concurrency batch pipeline.
//!
//! Turns a list of topics into stored (and optionally published) articles:
//!
//! - **Driver** ([`BatchPipeline`]): admits at most `concurrency_limit`
//!   workers at a time through a semaphore and joins them all
//! - **Worker**: prompt, generate, post-process, store, publish for one topic;
//!   every failure is turned into fields of that topic's [`Outcome`]
//! - **Collector** ([`OutcomeCollector`]): gathers outcomes from all workers
//!
//! # Example
//!
//! ```ignore
//! use contentforge_core::pipeline::{BatchPipeline, PipelineConfig, RunOptions};
//!
//! let pipeline = BatchPipeline::new(PipelineConfig::default(), generator, store)
//!     .with_publisher(publisher);
//!
//! let report = pipeline.run(topics, RunOptions::default().with_publish(true)).await?;
//! println!("{} of {} succeeded", report.succeeded, report.total);
//! ```

mod collector;
mod config;
mod driver;
mod error;
mod types;
mod worker;

pub use collector::OutcomeCollector;
pub use config::{PipelineConfig, RetryConfig};
pub use driver::BatchPipeline;
pub use error::{PipelineError, TopicError};
pub use types::{
    BatchProgress, BatchReport, ConcurrencyLimit, FailureKind, Outcome, OutcomeStatus,
    PoolStatus, RunOptions,
};
