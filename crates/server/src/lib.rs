//! HTTP server and command line front end for ContentForge.
//!
//! The binary wires configuration, the article store, the generation client
//! and the optional CMS publisher into a [`BatchPipeline`](contentforge_core::BatchPipeline),
//! then either serves the REST API or runs a single headless batch.

pub mod api;
pub mod cli;
pub mod metrics;
pub mod state;

pub use api::create_router;
pub use state::{build_pipeline, AppState};
