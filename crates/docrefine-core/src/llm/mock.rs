//! Configurable mock provider shared by unit tests.

use super::provider::{LlmProvider, LlmRequest, LlmResponse};
use crate::error::PipelineError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

type ResponseFn = Box<dyn Fn(u32, &LlmRequest) -> Result<LlmResponse, PipelineError> + Send + Sync>;

/// Each call to `generate()` invokes the response factory with the current
/// call index, so callers can return different results per attempt.
pub(crate) struct MockProvider {
    response_fn: ResponseFn,
    call_count: Arc<AtomicU32>,
    delay: Option<Duration>,
    timeout: Duration,
    /// (in_flight, max_concurrent)
    in_flight: Option<(Arc<AtomicU32>, Arc<AtomicU32>)>,
}

pub(crate) fn response(text: &str) -> LlmResponse {
    LlmResponse {
        text: text.to_string(),
        model: "mock-v1".to_string(),
        tokens_used: Some(42),
        latency_ms: 10,
    }
}

impl MockProvider {
    pub(crate) fn new(
        f: impl Fn(u32, &LlmRequest) -> Result<LlmResponse, PipelineError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            response_fn: Box::new(f),
            call_count: Arc::new(AtomicU32::new(0)),
            delay: None,
            timeout: Duration::from_secs(60),
            in_flight: None,
        }
    }

    pub(crate) fn success(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_, _| Ok(response(&text)))
    }

    pub(crate) fn failing(status_code: Option<u16>, message: &str) -> Self {
        let message = message.to_string();
        Self::new(move |_, _| {
            Err(PipelineError::Llm {
                message: message.clone(),
                status_code,
            })
        })
    }

    /// First call returns an error, subsequent calls succeed.
    pub(crate) fn fail_then_succeed(status_code: Option<u16>, error_msg: &str, text: &str) -> Self {
        let error_msg = error_msg.to_string();
        let text = text.to_string();
        Self::new(move |idx, _| {
            if idx == 0 {
                Err(PipelineError::Llm {
                    message: error_msg.clone(),
                    status_code,
                })
            } else {
                Ok(response(&text))
            }
        })
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn with_concurrency_tracking(
        mut self,
        in_flight: Arc<AtomicU32>,
        max_concurrent: Arc<AtomicU32>,
    ) -> Self {
        self.in_flight = Some((in_flight, max_concurrent));
        self
    }

    /// Shared handle to the call counter (clone before moving the provider).
    pub(crate) fn call_count_handle(&self) -> Arc<AtomicU32> {
        self.call_count.clone()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, PipelineError> {
        let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Some((ref in_flight, ref max_concurrent)) = self.in_flight {
            let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            max_concurrent.fetch_max(current, Ordering::SeqCst);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let result = (self.response_fn)(idx, request);
        if let Some((ref in_flight, _)) = self.in_flight {
            in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        result
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
