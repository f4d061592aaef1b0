//! The query relay: SDK-style run first, direct HTTP run as the fallback.

use std::sync::Arc;

use relay_config::PollPolicy;
use relay_core::{answers, preview, PipelineHandle, PipelineInput, RelayError, Submission, Upstream};
use serde::Serialize;
use tracing::{error, info};

use crate::extract::{extract, extract_or_dump, SegmentMode};
use crate::poll::poll;

/// Health report for `GET /api/ping`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub status: &'static str,
    pub pipeline_initialized: bool,
    pub pipeline_name: String,
    pub methods: Vec<String>,
}

pub struct Relay {
    upstream: Arc<dyn Upstream>,
    pipeline: Option<PipelineHandle>,
    poll_policy: PollPolicy,
    segment_mode: SegmentMode,
}

impl Relay {
    /// `pipeline` is `None` when loading failed at startup; it is never retried.
    pub fn new(upstream: Arc<dyn Upstream>, pipeline: Option<PipelineHandle>, poll_policy: PollPolicy) -> Self {
        Self {
            upstream,
            pipeline,
            poll_policy,
            segment_mode: SegmentMode::default(),
        }
    }

    /// Sets how nested segments are read from SDK-style results.
    pub fn with_segment_mode(mut self, mode: SegmentMode) -> Self {
        self.segment_mode = mode;
        self
    }

    pub fn pipeline(&self) -> Option<&PipelineHandle> {
        self.pipeline.as_ref()
    }

    pub fn ping(&self) -> StatusReport {
        StatusReport {
            status: "ok",
            pipeline_initialized: self.pipeline.is_some(),
            pipeline_name: self
                .pipeline
                .as_ref()
                .map(|p| p.name.clone())
                .unwrap_or_else(|| "Not initialized".into()),
            methods: self
                .pipeline
                .as_ref()
                .map(|p| p.methods.clone())
                .unwrap_or_default(),
        }
    }

    /// Answers `query`. The only error is `RelayError::NotInitialized`; every
    /// upstream failure is turned into one of the fixed answers.
    pub async fn handle(&self, query: &str) -> Result<String, RelayError> {
        let Some(pipeline) = &self.pipeline else {
            error!("Pipeline not initialized");
            return Err(RelayError::NotInitialized);
        };

        if query.eq_ignore_ascii_case("test") {
            info!("Test query detected, returning hardcoded response");
            return Ok(answers::TEST_RESPONSE.to_string());
        }

        let input = PipelineInput::new(query);
        info!("Running pipeline {} for query: {}", pipeline.id, preview(query, 100));

        match self.upstream.run_pipeline(&input).await {
            Ok(result) => {
                info!("Pipeline execution completed: {}", preview(&result.to_string(), 500));
                let answer = extract_or_dump(&result, self.upstream.as_ref(), self.segment_mode).await;
                info!("Final text response: {}", preview(&answer, 100));
                Ok(answer)
            }
            Err(e) => {
                error!("Error during pipeline execution: {}", e);
                info!("Falling back to direct API approach after SDK error");
                Ok(self.run_direct(&input).await)
            }
        }
    }

    async fn run_direct(&self, input: &PipelineInput) -> String {
        let body = match self.upstream.submit(input).await {
            Ok(body) => body,
            Err(e) if e.is_status() => {
                error!("Direct API error: {}", e);
                return answers::API_ERROR.to_string();
            }
            Err(e) => {
                error!("Error in direct API approach: {}", e);
                return answers::GENERIC_FAILURE.to_string();
            }
        };

        match Submission::from_body(body) {
            Submission::Pending { url } => poll(self.upstream.as_ref(), &url, self.poll_policy)
                .await
                .into_answer(),
            Submission::Immediate(body) => {
                info!("Got immediate response");
                extract(&body, self.upstream.as_ref(), SegmentMode::UrlOrText)
                    .await
                    .unwrap_or_else(|| answers::UNEXPECTED_FORMAT.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockUpstream;
    use serde_json::json;
    use std::time::Duration;

    fn relay(upstream: MockUpstream) -> (Arc<MockUpstream>, Relay) {
        let upstream = Arc::new(upstream);
        let policy = PollPolicy {
            max_attempts: 3,
            interval: Duration::from_millis(1),
        };
        let relay = Relay::new(
            upstream.clone(),
            Some(PipelineHandle::new("p1", "Study Buddy")),
            policy,
        );
        (upstream, relay)
    }

    fn sdk_error() -> Result<serde_json::Value, RelayError> {
        Err(RelayError::Http("connection reset".into()))
    }

    #[tokio::test]
    async fn test_sentinel_skips_upstream() {
        let (upstream, relay) = relay(MockUpstream::new());
        for query in ["test", "TEST", "Test"] {
            assert_eq!(relay.handle(query).await.unwrap(), answers::TEST_RESPONSE);
        }
        assert_eq!(upstream.calls().total(), 0);
    }

    #[tokio::test]
    async fn test_uninitialized_pipeline() {
        let upstream = Arc::new(MockUpstream::new());
        let relay = Relay::new(upstream.clone(), None, PollPolicy::default());

        assert!(matches!(relay.handle("hello").await, Err(RelayError::NotInitialized)));
        assert!(matches!(relay.handle("test").await, Err(RelayError::NotInitialized)));
        assert_eq!(upstream.calls().total(), 0);
    }

    #[tokio::test]
    async fn test_sdk_result_with_url_segment() {
        let (upstream, relay) = relay(
            MockUpstream::new()
                .with_text("http://x/y", "Hello")
                .with_run(Ok(json!({ "data": [{ "segments": [{ "response": "http://x/y", "is_url": true }] }] }))),
        );

        assert_eq!(relay.handle("hi").await.unwrap(), "Hello");
        assert_eq!(upstream.calls().submit, 0);
    }

    #[tokio::test]
    async fn test_sdk_result_dumped_when_unrecognized() {
        let (_, relay) = relay(MockUpstream::new().with_run(Ok(json!({ "score": 1 }))));
        assert_eq!(relay.handle("hi").await.unwrap(), r#"{"score":1}"#);
    }

    #[tokio::test]
    async fn test_legacy_mode_skips_text_segment() {
        let (_, relay) = relay(MockUpstream::new().with_run(Ok(json!({
            "output": "flat",
            "data": [{ "segments": [{ "response": "nested" }] }],
        }))));
        let relay = relay.with_segment_mode(SegmentMode::UrlOnly);
        assert_eq!(relay.handle("hi").await.unwrap(), "flat");
    }

    #[tokio::test]
    async fn test_falls_back_to_direct_and_polls() {
        let (upstream, relay) = relay(
            MockUpstream::new()
                .with_run(sdk_error())
                .with_submit(Ok(json!({ "status": "IN_PROGRESS", "url": "http://x/status" })))
                .with_polls([
                    Ok(json!({ "status": "IN_PROGRESS" })),
                    Ok(json!({ "status": "SUCCESS", "data": [{ "segments": [{ "response": "polled" }] }] })),
                ]),
        );

        assert_eq!(relay.handle("hi").await.unwrap(), "polled");
        let calls = upstream.calls();
        assert_eq!((calls.run, calls.submit, calls.poll), (1, 1, 2));
    }

    #[tokio::test]
    async fn test_direct_timeout() {
        let (upstream, relay) = relay(
            MockUpstream::new()
                .with_run(sdk_error())
                .with_submit(Ok(json!({ "status": "IN_PROGRESS", "url": "http://x/status" })))
                .with_polls(std::iter::repeat_with(|| Ok(json!({ "status": "IN_PROGRESS" }))).take(3)),
        );

        assert_eq!(relay.handle("hi").await.unwrap(), answers::TIMED_OUT);
        assert_eq!(upstream.calls().poll, 3);
    }

    #[tokio::test]
    async fn test_direct_api_error() {
        let (_, relay) = relay(
            MockUpstream::new()
                .with_run(sdk_error())
                .with_submit(Err(RelayError::Status { code: 401, body: "denied".into() })),
        );
        assert_eq!(relay.handle("hi").await.unwrap(), answers::API_ERROR);
    }

    #[tokio::test]
    async fn test_direct_transport_error() {
        let (_, relay) = relay(MockUpstream::new().with_run(sdk_error()));
        assert_eq!(relay.handle("hi").await.unwrap(), answers::GENERIC_FAILURE);
    }

    #[tokio::test]
    async fn test_direct_immediate_result() {
        let (upstream, relay) = relay(
            MockUpstream::new()
                .with_run(sdk_error())
                .with_submit(Ok(json!({ "status": "SUCCESS", "generated_text": "right away" }))),
        );
        assert_eq!(relay.handle("hi").await.unwrap(), "right away");
        assert_eq!(upstream.calls().poll, 0);
    }

    #[tokio::test]
    async fn test_direct_immediate_unexpected_format() {
        let (_, relay) = relay(
            MockUpstream::new()
                .with_run(sdk_error())
                .with_submit(Ok(json!({ "status": "IN_PROGRESS" }))),
        );
        assert_eq!(relay.handle("hi").await.unwrap(), answers::UNEXPECTED_FORMAT);
    }

    #[test]
    fn test_ping_reports_pipeline() {
        let (_, relay) = relay(MockUpstream::new());
        let report = relay.ping();
        assert!(report.pipeline_initialized);
        assert_eq!(report.pipeline_name, "Study Buddy");
        assert_eq!(report.methods, vec!["poll", "run", "run_async"]);
    }

    #[test]
    fn test_ping_uninitialized() {
        let relay = Relay::new(Arc::new(MockUpstream::new()), None, PollPolicy::default());
        let report = relay.ping();
        assert_eq!(report.status, "ok");
        assert!(!report.pipeline_initialized);
        assert_eq!(report.pipeline_name, "Not initialized");
        assert!(report.methods.is_empty());
        assert!(relay.pipeline().is_none());
    }
}
