//! Fixed-budget polling of an asynchronous pipeline job.

use relay_config::PollPolicy;
use relay_core::{answers, preview, JobStatus, Upstream};
use tracing::{error, info, warn};

use crate::extract::{extract, SegmentMode};

/// How a polling run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Job succeeded and an answer was extracted.
    Answer(String),
    /// Job succeeded but the body held no recognizable answer.
    Unextractable,
    /// Job reached a terminal status other than `SUCCESS`.
    Failed(String),
    /// Budget exhausted while the job was still running.
    TimedOut,
}

impl PollOutcome {
    pub fn into_answer(self) -> String {
        match self {
            PollOutcome::Answer(text) => text,
            PollOutcome::Unextractable => answers::UNEXTRACTABLE.to_string(),
            PollOutcome::Failed(_) => answers::GENERIC_FAILURE.to_string(),
            PollOutcome::TimedOut => answers::TIMED_OUT.to_string(),
        }
    }
}

/// Polls `status_url` until the job settles or `policy.max_attempts` is spent.
///
/// The delay is taken before every attempt. A failed attempt (transport error,
/// non-2xx, unparseable body) is logged and counts against the budget.
pub async fn poll(upstream: &dyn Upstream, status_url: &str, policy: PollPolicy) -> PollOutcome {
    info!("Processing asynchronously. Polling URL: {}", status_url);

    for attempt in 1..=policy.max_attempts {
        info!("Polling attempt {}/{}", attempt, policy.max_attempts);
        tokio::time::sleep(policy.interval).await;

        let body = match upstream.poll_status(status_url).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Polling error: {}", e);
                continue;
            }
        };

        match JobStatus::of(&body) {
            Some(JobStatus::Success) => {
                info!("Processing completed");
                return match extract(&body, upstream, SegmentMode::UrlOrText).await {
                    Some(text) => {
                        info!("Found text response: {}", preview(&text, 100));
                        PollOutcome::Answer(text)
                    }
                    None => {
                        warn!("Could not extract text from completed job");
                        PollOutcome::Unextractable
                    }
                };
            }
            Some(JobStatus::Other(status)) => {
                error!("Processing failed with status: {}", status);
                return PollOutcome::Failed(status);
            }
            Some(JobStatus::InProgress) | None => {}
        }
    }

    warn!("Polling gave up after {} attempts", policy.max_attempts);
    PollOutcome::TimedOut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockUpstream;
    use relay_core::RelayError;
    use serde_json::{json, Value};
    use std::time::{Duration, Instant};

    fn policy(interval_ms: u64) -> PollPolicy {
        PollPolicy {
            max_attempts: 10,
            interval: Duration::from_millis(interval_ms),
        }
    }

    fn in_progress() -> Result<Value, RelayError> {
        Ok(json!({ "status": "IN_PROGRESS" }))
    }

    fn success(text: &str) -> Result<Value, RelayError> {
        Ok(json!({
            "status": "SUCCESS",
            "data": [{ "segments": [{ "response": text }] }],
        }))
    }

    #[tokio::test]
    async fn test_success_on_last_attempt() {
        let script = std::iter::repeat_with(in_progress)
            .take(9)
            .chain(std::iter::once(success("done at ten")));
        let upstream = MockUpstream::new().with_polls(script);

        let outcome = poll(&upstream, "http://x/status", policy(1)).await;
        assert_eq!(outcome, PollOutcome::Answer("done at ten".into()));
        assert_eq!(upstream.calls().poll, 10);
    }

    #[tokio::test]
    async fn test_budget_exhausted() {
        let upstream = MockUpstream::new().with_polls(std::iter::repeat_with(in_progress).take(10));

        let started = Instant::now();
        let outcome = poll(&upstream, "http://x/status", policy(5)).await;

        assert_eq!(outcome, PollOutcome::TimedOut);
        assert_eq!(outcome.into_answer(), answers::TIMED_OUT);
        assert_eq!(upstream.calls().poll, 10);
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_terminal_status_stops_immediately() {
        let upstream = MockUpstream::new().with_polls([
            Ok(json!({ "status": "ERROR" })),
            success("never reached"),
        ]);

        let outcome = poll(&upstream, "http://x/status", policy(1)).await;
        assert_eq!(outcome, PollOutcome::Failed("ERROR".into()));
        assert_eq!(outcome.into_answer(), answers::GENERIC_FAILURE);
        assert_eq!(upstream.calls().poll, 1);
    }

    #[tokio::test]
    async fn test_failed_attempts_are_skipped() {
        let upstream = MockUpstream::new().with_polls([
            Err(RelayError::Status { code: 502, body: String::new() }),
            Ok(json!({ "progress": "40%" })),
            Err(RelayError::Parse("not json".into())),
            success("recovered"),
        ]);

        let outcome = poll(&upstream, "http://x/status", policy(1)).await;
        assert_eq!(outcome, PollOutcome::Answer("recovered".into()));
        assert_eq!(upstream.calls().poll, 4);
    }

    #[tokio::test]
    async fn test_success_without_answer() {
        let upstream = MockUpstream::new().with_polls([Ok(json!({ "status": "SUCCESS", "data": [] }))]);

        let outcome = poll(&upstream, "http://x/status", policy(1)).await;
        assert_eq!(outcome, PollOutcome::Unextractable);
        assert_eq!(outcome.into_answer(), answers::UNEXTRACTABLE);
    }

    #[tokio::test]
    async fn test_url_segment_in_polled_body() {
        let upstream = MockUpstream::new()
            .with_text("http://x/out.txt", "fetched answer")
            .with_polls([Ok(json!({
                "status": "SUCCESS",
                "data": [{ "segments": [{ "response": "http://x/out.txt", "is_url": true }] }],
            }))]);

        let outcome = poll(&upstream, "http://x/status", policy(1)).await;
        assert_eq!(outcome, PollOutcome::Answer("fetched answer".into()));
        assert_eq!(upstream.calls().fetch, 1);
    }
}
