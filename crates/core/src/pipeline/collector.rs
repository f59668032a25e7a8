//! Concurrency-safe outcome accumulator.

use std::sync::Mutex;

use super::types::Outcome;

/// Collects outcomes from concurrently running workers.
#[derive(Debug, Default)]
pub struct OutcomeCollector {
    outcomes: Mutex<Vec<Outcome>>,
}

impl OutcomeCollector {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            outcomes: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    pub fn append(&self, outcome: Outcome) {
        self.outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(outcome);
    }

    pub fn len(&self) -> usize {
        self.outcomes.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take every collected outcome. Call once all workers have finished.
    pub fn drain(&self) -> Vec<Outcome> {
        std::mem::take(&mut *self.outcomes.lock().unwrap_or_else(|e| e.into_inner()))
    }
}
