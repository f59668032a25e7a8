//! Article model and post-processing of raw generated text.

mod processor;
mod types;

pub use processor::{HtmlPostProcessor, PostProcessor};
pub use types::{Article, ProcessingError};
