//! Mock query engine for testing.
//!
//! Scripted outcome queue plus call recording, so retry and fallback
//! logic can be exercised without any bus traffic.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::engine::{DiagQuery, QuerySpec};
use crate::error::{QueryError, QueryResult};

/// One scripted attempt outcome.
enum MockOutcome {
    Responses(BTreeMap<u32, Vec<u8>>),
    Failure(String),
}

/// Mock engine with scripted outcomes (FIFO order).
///
/// An exhausted (or empty) script yields empty response maps, the same
/// shape as a quiet bus.
pub struct MockQuery {
    script: Mutex<Vec<MockOutcome>>,
    /// Specs of every `run` invocation, for test assertions.
    recorded: Mutex<Vec<QuerySpec>>,
}

impl MockQuery {
    /// Create a mock with an empty script.
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Vec::new()),
            recorded: Mutex::new(Vec::new()),
        }
    }

    /// Queue a full responder map for the next attempt.
    pub fn queue_responses(&self, responses: BTreeMap<u32, Vec<u8>>) {
        self.script.lock().unwrap().push(MockOutcome::Responses(responses));
    }

    /// Queue a single-responder answer for the next attempt.
    pub fn queue_response(&self, addr: u32, payload: &[u8]) {
        self.queue_responses(BTreeMap::from([(addr, payload.to_vec())]));
    }

    /// Queue an empty map (nobody answered) for the next attempt.
    pub fn queue_silence(&self) {
        self.queue_responses(BTreeMap::new());
    }

    /// Queue a transport failure for the next attempt.
    pub fn queue_failure(&self, reason: &str) {
        self.script
            .lock()
            .unwrap()
            .push(MockOutcome::Failure(reason.to_string()));
    }

    /// Number of `run` invocations so far.
    pub fn calls(&self) -> usize {
        self.recorded.lock().unwrap().len()
    }

    /// Copies of every spec passed to `run`.
    pub fn recorded_specs(&self) -> Vec<QuerySpec> {
        self.recorded.lock().unwrap().clone()
    }
}

impl Default for MockQuery {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DiagQuery for MockQuery {
    async fn run(
        &self,
        _bus: u8,
        spec: &QuerySpec,
        _timeout: Duration,
    ) -> QueryResult<BTreeMap<u32, Vec<u8>>> {
        self.recorded.lock().unwrap().push(spec.clone());

        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            return Ok(BTreeMap::new());
        }
        match script.remove(0) {
            MockOutcome::Responses(map) => Ok(map),
            MockOutcome::Failure(reason) => Err(QueryError::Transport(reason)),
        }
    }
}
