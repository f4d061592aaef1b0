//! Core types and traits shared by the relay crates.

pub mod answers;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Error
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Upstream returned {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Failed to parse upstream response: {0}")]
    Parse(String),

    #[error("Pipeline not initialized")]
    NotInitialized,

    #[error("Pipeline run timed out after {0}s")]
    Timeout(u64),

    #[error("Pipeline run ended with status {0}")]
    JobFailed(String),
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::Parse(err.to_string())
    }
}

impl RelayError {
    /// True when the upstream answered with a non-2xx status code.
    pub fn is_status(&self) -> bool {
        matches!(self, RelayError::Status { .. })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Request body sent to the pipeline, `{"Input 1": <query>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineInput {
    #[serde(rename = "Input 1")]
    pub text: String,
}

impl PipelineInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A pipeline resource loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineHandle {
    pub id: String,
    pub name: String,
    pub methods: Vec<String>,
}

/// Capabilities exposed by every loaded pipeline handle.
pub const HANDLE_METHODS: [&str; 3] = ["poll", "run", "run_async"];

impl PipelineHandle {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            methods: HANDLE_METHODS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// Status of an asynchronous upstream job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    InProgress,
    Success,
    Other(String),
}

impl From<&str> for JobStatus {
    fn from(s: &str) -> Self {
        match s {
            "IN_PROGRESS" => JobStatus::InProgress,
            "SUCCESS" => JobStatus::Success,
            other => JobStatus::Other(other.to_string()),
        }
    }
}

impl JobStatus {
    /// Reads the `status` field of an upstream body. Absent or non-string is `None`.
    pub fn of(body: &Value) -> Option<Self> {
        body.get("status").and_then(Value::as_str).map(JobStatus::from)
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::InProgress)
    }
}

/// What the direct run endpoint handed back on submit.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Job accepted; poll `url` for the result.
    Pending { url: String },
    /// Result returned in the submit response itself.
    Immediate(Value),
}

impl Submission {
    pub fn from_body(body: Value) -> Self {
        let pending_url = match JobStatus::of(&body) {
            Some(JobStatus::InProgress) => body.get("url").and_then(Value::as_str).map(String::from),
            _ => None,
        };
        match pending_url {
            Some(url) => Submission::Pending { url },
            None => Submission::Immediate(body),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Upstream Trait
// ─────────────────────────────────────────────────────────────────────────────

/// The vendor API as seen by the relay.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// SDK-style run: submits and blocks until the job settles, returning the final body.
    async fn run_pipeline(&self, input: &PipelineInput) -> Result<Value, RelayError>;

    /// Direct run: a single POST, returning the raw JSON body.
    async fn submit(&self, input: &PipelineInput) -> Result<Value, RelayError>;

    /// One GET of a job status URL.
    async fn poll_status(&self, url: &str) -> Result<Value, RelayError>;

    /// Fetches a text payload referenced by a URL segment.
    async fn fetch_text(&self, url: &str) -> Result<String, RelayError>;
}

/// Truncates `s` to at most `max` chars for log previews.
pub fn preview(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
