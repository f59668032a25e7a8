//! Mock generator for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::generation::{
    GeneratedText, GenerationError, GenerationRequest, GenerationUsage, Generator,
};

/// Scripted behaviour for one topic.
#[derive(Debug, Clone)]
enum Script {
    Text(String),
    Error(String),
    Panic,
    /// Fail this many calls, then fall back to the default response.
    FailTimes(usize),
}

#[derive(Debug, Default)]
struct State {
    scripts: HashMap<String, Script>,
    delays: HashMap<String, Duration>,
    default_delay: Option<Duration>,
    prompts: Vec<String>,
    calls: HashMap<String, usize>,
}

/// Mock implementation of the Generator trait.
///
/// Responses are scripted per topic. The topic is read from the first
/// double-quoted string of the prompt, which is where
/// [`ArticlePromptBuilder`](crate::prompt::ArticlePromptBuilder) puts it.
/// Unscripted topics get a small Markdown article titled
/// `"Article about {topic}"`.
///
/// The mock also tracks how many calls are in flight at once and keeps the
/// high-water mark, so tests can assert the concurrency ceiling.
///
/// # Example
///
/// ```rust,ignore
/// use contentforge_core::testing::MockGenerator;
///
/// let generator = MockGenerator::new();
/// generator.set_empty_response("Broken Topic");
/// generator.set_delay("Slow Topic", Duration::from_millis(200));
///
/// // ... run a batch ...
///
/// assert!(generator.max_concurrent() <= 2);
/// ```
#[derive(Debug, Default)]
pub struct MockGenerator {
    state: Mutex<State>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    total_calls: AtomicUsize,
}

struct InFlight {
    counter: Arc<AtomicUsize>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Topic embedded in a prompt.
fn topic_of(prompt: &str) -> String {
    prompt.split('"').nth(1).unwrap_or(prompt).to_string()
}

/// Default article text for a topic.
pub fn default_article(topic: &str) -> String {
    format!(
        "# Article about {topic}\n\n\
         This article explains {topic} in plain words.\n\n\
         ## Why it matters\n\n\
         - It is useful\n\
         - It is timely"
    )
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Return this text for the topic.
    pub fn set_response(&self, topic: &str, text: impl Into<String>) {
        self.state()
            .scripts
            .insert(topic.to_string(), Script::Text(text.into()));
    }

    /// Return whitespace-only text for the topic.
    pub fn set_empty_response(&self, topic: &str) {
        self.set_response(topic, "   \n");
    }

    /// Fail every call for the topic with an API error.
    pub fn set_error(&self, topic: &str, message: impl Into<String>) {
        self.state()
            .scripts
            .insert(topic.to_string(), Script::Error(message.into()));
    }

    /// Fail the first `times` calls for the topic, then succeed.
    pub fn set_failures_before_success(&self, topic: &str, times: usize) {
        self.state()
            .scripts
            .insert(topic.to_string(), Script::FailTimes(times));
    }

    /// Panic when generating for the topic.
    pub fn set_panic(&self, topic: &str) {
        self.state()
            .scripts
            .insert(topic.to_string(), Script::Panic);
    }

    /// Sleep before answering for the topic.
    pub fn set_delay(&self, topic: &str, delay: Duration) {
        self.state().delays.insert(topic.to_string(), delay);
    }

    /// Sleep before answering for every topic without its own delay.
    pub fn set_default_delay(&self, delay: Duration) {
        self.state().default_delay = Some(delay);
    }

    /// Total calls made.
    pub fn call_count(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    /// Calls made for one topic.
    pub fn calls_for(&self, topic: &str) -> usize {
        self.state().calls.get(topic).copied().unwrap_or(0)
    }

    /// Prompts received, in call order.
    pub fn recorded_prompts(&self) -> Vec<String> {
        self.state().prompts.clone()
    }

    /// Highest number of concurrent calls observed.
    pub fn max_concurrent(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Generator for MockGenerator {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GeneratedText, GenerationError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight {
            counter: Arc::clone(&self.in_flight),
        };
        self.total_calls.fetch_add(1, Ordering::SeqCst);

        let topic = topic_of(&request.prompt);
        let (script, delay, call_number) = {
            let mut state = self.state();
            state.prompts.push(request.prompt.clone());
            let calls = state.calls.entry(topic.clone()).or_insert(0);
            *calls += 1;
            let call_number = *calls;
            let delay = state.delays.get(&topic).copied().or(state.default_delay);
            (state.scripts.get(&topic).cloned(), delay, call_number)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let text = match script {
            None => default_article(&topic),
            Some(Script::Text(text)) => text,
            Some(Script::Error(message)) => {
                return Err(GenerationError::Api {
                    status: 500,
                    message,
                })
            }
            Some(Script::Panic) => panic!("mock generator panic for {}", topic),
            Some(Script::FailTimes(times)) if call_number <= times => {
                return Err(GenerationError::Http("connection reset".to_string()))
            }
            Some(Script::FailTimes(_)) => default_article(&topic),
        };

        Ok(GeneratedText {
            usage: GenerationUsage {
                input_tokens: request.prompt.split_whitespace().count() as u32,
                output_tokens: text.split_whitespace().count() as u32,
            },
            text,
            model: "mock-model".to_string(),
        })
    }
}
