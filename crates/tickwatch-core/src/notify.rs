//! Push transport for finished message chunks.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::http_client::{BearerToken, HttpClient, HttpRequest};
use crate::retry::RetryConfig;

const LINE_PUSH_ENDPOINT: &str = "https://api.line.me/v2/bot/message/push";
const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("push rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("push transport failed: {message}")]
    Transport { message: String, retryable: bool },
    #[error("failed to encode push payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl NotifyError {
    /// Whether another attempt might succeed under `policy`.
    pub fn retryable(&self, policy: &RetryConfig) -> bool {
        match self {
            Self::Rejected { status, .. } => policy.should_retry_status(*status),
            Self::Transport { retryable, .. } => *retryable,
            Self::Serialization(_) => false,
        }
    }
}

pub type NotifyFuture<'a> = Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + 'a>>;

/// Delivers one text message to a fixed destination.
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    fn send<'a>(&'a self, text: &'a str) -> NotifyFuture<'a>;
}

#[derive(Debug, Serialize)]
struct PushPayload<'a> {
    to: &'a str,
    messages: [TextMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

/// LINE Messaging API push to one user or group.
pub struct LineNotifier {
    http_client: Arc<dyn HttpClient>,
    token: BearerToken,
    target_id: String,
    retry: RetryConfig,
    endpoint: String,
    timeout_ms: u64,
}

impl LineNotifier {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        channel_token: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            token: BearerToken::new(channel_token),
            target_id: target_id.into(),
            retry: RetryConfig::doubling(3),
            endpoint: LINE_PUSH_ENDPOINT.to_owned(),
            timeout_ms: 10_000,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    fn build_request(&self, text: &str) -> Result<HttpRequest, NotifyError> {
        let payload = PushPayload {
            to: &self.target_id,
            messages: [TextMessage { kind: "text", text }],
        };
        Ok(HttpRequest::post(&self.endpoint)
            .with_bearer(&self.token)
            .with_timeout(Duration::from_millis(self.timeout_ms))
            .with_json(&payload)?)
    }

    async fn push_once(&self, request: HttpRequest) -> Result<(), NotifyError> {
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| NotifyError::Transport {
                message: e.to_string(),
                retryable: e.retryable(),
            })?;

        if response.is_success() {
            return Ok(());
        }
        Err(NotifyError::Rejected {
            status: response.status,
            body: response.body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        })
    }

    #[instrument(skip(self, text), fields(chars = text.chars().count()), level = "debug")]
    async fn push(&self, text: &str) -> Result<(), NotifyError> {
        let request = self.build_request(text)?;
        let result = self
            .retry
            .run(
                |attempt| {
                    let request = request.clone();
                    async move {
                        debug!(attempt, "pushing message");
                        self.push_once(request).await
                    }
                },
                |err: &NotifyError| err.retryable(&self.retry),
            )
            .await;

        if let Err(err) = &result {
            warn!(error = %err, "push failed");
        }
        result
    }
}

impl Notifier for LineNotifier {
    fn name(&self) -> &'static str {
        "line"
    }

    fn send<'a>(&'a self, text: &'a str) -> NotifyFuture<'a> {
        Box::pin(self.push(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters;
    use crate::http_client::{HttpError, HttpResponse};
    use std::time::Duration;

    fn notifier(client: Arc<adapters::recording::RecordingHttpClient>) -> LineNotifier {
        LineNotifier::new(client, "token-abc", "U123")
            .with_retry(RetryConfig::constant(Duration::ZERO, 3))
    }

    #[tokio::test]
    async fn push_posts_line_payload_with_bearer_token() {
        let client = Arc::new(adapters::recording::RecordingHttpClient::always(Ok(
            HttpResponse::ok("{}"),
        )));
        notifier(client.clone())
            .send("hello")
            .await
            .expect("push succeeds");

        let requests = client.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url(), LINE_PUSH_ENDPOINT);
        assert_eq!(
            requests[0].headers.get("authorization").map(String::as_str),
            Some("Bearer token-abc")
        );
        let body: serde_json::Value =
            serde_json::from_str(requests[0].body.as_deref().expect("body present"))
                .expect("valid json");
        assert_eq!(
            body,
            serde_json::json!({"to": "U123", "messages": [{"type": "text", "text": "hello"}]})
        );
    }

    #[tokio::test]
    async fn endpoint_and_timeout_overrides_reach_the_request() {
        let client = Arc::new(adapters::recording::RecordingHttpClient::always(Ok(
            HttpResponse::ok("{}"),
        )));
        notifier(client.clone())
            .with_endpoint("http://127.0.0.1:8080/push")
            .with_timeout_ms(2_500)
            .send("hello")
            .await
            .expect("push succeeds");

        let requests = client.recorded_requests();
        assert_eq!(requests[0].url(), "http://127.0.0.1:8080/push");
        assert_eq!(requests[0].timeout, Duration::from_millis(2_500));
    }

    #[tokio::test]
    async fn server_errors_are_retried_then_reported() {
        let client = Arc::new(adapters::recording::RecordingHttpClient::always(Ok(
            HttpResponse::new(503, "busy"),
        )));
        let error = notifier(client.clone())
            .send("hello")
            .await
            .expect_err("push fails");

        assert!(matches!(error, NotifyError::Rejected { status: 503, .. }));
        assert_eq!(client.recorded_requests().len(), 3);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let client = Arc::new(adapters::recording::RecordingHttpClient::always(Ok(
            HttpResponse::new(401, r#"{"message":"Authentication failed"}"#),
        )));
        let error = notifier(client.clone())
            .send("hello")
            .await
            .expect_err("push fails");

        assert!(matches!(error, NotifyError::Rejected { status: 401, .. }));
        assert_eq!(client.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn transient_transport_failure_recovers() {
        let client = Arc::new(adapters::recording::RecordingHttpClient::scripted(vec![
            Err(HttpError::Connect(String::from("connection reset"))),
            Ok(HttpResponse::ok("{}")),
        ]));
        notifier(client.clone())
            .send("hello")
            .await
            .expect("second attempt succeeds");

        assert_eq!(client.recorded_requests().len(), 2);
    }
}
