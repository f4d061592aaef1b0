use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use relay_core::{PipelineInput, RelayError, Upstream};
use serde_json::Value;

type Script = Mutex<VecDeque<Result<Value, RelayError>>>;

/// A scripted upstream for tests. Each method replays its queue in order and
/// fails with `RelayError::Http` once the queue is empty.
#[derive(Default)]
pub struct MockUpstream {
    runs: Script,
    submits: Script,
    polls: Script,
    texts: HashMap<String, String>,
    run_calls: AtomicUsize,
    submit_calls: AtomicUsize,
    poll_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

/// Number of times each upstream method was invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MockCalls {
    pub run: usize,
    pub submit: usize,
    pub poll: usize,
    pub fetch: usize,
}

impl MockCalls {
    pub fn total(&self) -> usize {
        self.run + self.submit + self.poll + self.fetch
    }
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_run(self, result: Result<Value, RelayError>) -> Self {
        push(&self.runs, result);
        self
    }

    pub fn with_submit(self, result: Result<Value, RelayError>) -> Self {
        push(&self.submits, result);
        self
    }

    pub fn with_polls(self, results: impl IntoIterator<Item = Result<Value, RelayError>>) -> Self {
        for result in results {
            push(&self.polls, result);
        }
        self
    }

    /// Serves `body` for GETs of `url`; any other URL answers 404.
    pub fn with_text(mut self, url: &str, body: &str) -> Self {
        self.texts.insert(url.to_string(), body.to_string());
        self
    }

    pub fn calls(&self) -> MockCalls {
        MockCalls {
            run: self.run_calls.load(Ordering::SeqCst),
            submit: self.submit_calls.load(Ordering::SeqCst),
            poll: self.poll_calls.load(Ordering::SeqCst),
            fetch: self.fetch_calls.load(Ordering::SeqCst),
        }
    }
}

fn push(script: &Script, result: Result<Value, RelayError>) {
    if let Ok(mut queue) = script.lock() {
        queue.push_back(result);
    }
}

fn next(script: &Script, counter: &AtomicUsize, method: &str) -> Result<Value, RelayError> {
    let i = counter.fetch_add(1, Ordering::SeqCst);
    script
        .lock()
        .ok()
        .and_then(|mut queue| queue.pop_front())
        .unwrap_or_else(|| {
            Err(RelayError::Http(format!(
                "MockUpstream: no more {} results (called {} times)",
                method,
                i + 1
            )))
        })
}

#[async_trait]
impl Upstream for MockUpstream {
    async fn run_pipeline(&self, _input: &PipelineInput) -> Result<Value, RelayError> {
        next(&self.runs, &self.run_calls, "run")
    }

    async fn submit(&self, _input: &PipelineInput) -> Result<Value, RelayError> {
        next(&self.submits, &self.submit_calls, "submit")
    }

    async fn poll_status(&self, _url: &str) -> Result<Value, RelayError> {
        next(&self.polls, &self.poll_calls, "poll")
    }

    async fn fetch_text(&self, url: &str) -> Result<String, RelayError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.texts.get(url).cloned().ok_or_else(|| RelayError::Status {
            code: 404,
            body: format!("no text for {url}"),
        })
    }
}
