//! Topic sources.
//!
//! A topic is the keyword or subject that drives the generation of one
//! article. Sources produce an ordered list of topics and always drop blank
//! entries before anything is dispatched to the pipeline.

mod source;
mod table;
mod types;

pub use source::{limit_topics, normalize_topics, InlineTopics, TopicFile, TopicSource};
pub use table::{TableFormat, TablePreview, TopicTable};
pub use types::{Topic, TopicSourceError};
