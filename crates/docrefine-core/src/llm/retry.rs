//! Retry utilities for transient LLM failures.
//!
//! Provides classification of retryable errors and exponential backoff
//! with optional random jitter.

use super::provider::{LlmProvider, LlmRequest, LlmResponse};
use crate::config::{LimitsConfig, PipelineConfig};
use crate::error::PipelineError;
use rand::Rng;
use std::time::Duration;

/// Timeout and retry settings for one provider call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Per-attempt timeout in milliseconds; `None` uses the provider's timeout
    pub timeout_ms: Option<u64>,
    /// Retries after the first attempt (0 disables retries)
    pub attempts: u32,
    /// Base backoff delay in milliseconds
    pub base_delay_ms: u64,
    /// Upper bound of random jitter per backoff
    pub jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default(), &LimitsConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(pipeline: &PipelineConfig, limits: &LimitsConfig) -> Self {
        Self {
            timeout_ms: limits.llm_timeout_ms,
            attempts: pipeline.retry_attempts,
            base_delay_ms: pipeline.retry_delay_ms,
            jitter_ms: pipeline.retry_jitter_ms,
        }
    }
}

/// Call the provider under the policy's timeout, retrying transient failures.
///
/// `target` names the document in timeout errors and log lines. Returns the
/// last error once attempts are exhausted or a non-retryable error occurs.
pub async fn generate_with_retry(
    provider: &dyn LlmProvider,
    request: &LlmRequest,
    policy: &RetryPolicy,
    target: &str,
) -> Result<LlmResponse, PipelineError> {
    let timeout = policy
        .timeout_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| provider.timeout());
    let mut attempt = 0;
    loop {
        let result = match tokio::time::timeout(timeout, provider.generate(request)).await {
            Ok(result) => result,
            Err(_) => Err(PipelineError::Timeout {
                stage: "llm".to_string(),
                target: target.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        };

        match result {
            Ok(response) => return Ok(response),
            Err(e) if attempt < policy.attempts && is_retryable(&e) => {
                let delay = backoff_with_jitter(attempt, policy.base_delay_ms, policy.jitter_ms);
                attempt += 1;
                tracing::warn!(
                    "Retry {attempt}/{} for {target} via {} after {delay:?}: {e}",
                    policy.attempts,
                    provider.name()
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Determine whether a pipeline error is worth retrying.
///
/// Retryable errors: timeouts, rate limits (429), server errors (5xx).
/// Non-retryable: auth failures, bad requests, missing models, file I/O.
pub fn is_retryable(error: &PipelineError) -> bool {
    match error {
        PipelineError::Timeout { .. } => true,
        PipelineError::Llm {
            status_code,
            message,
        } => {
            // Classify by HTTP status code when available (structured)
            if let Some(code) = status_code {
                return *code == 429 || (500..=599).contains(code);
            }
            // Fallback for non-HTTP errors (e.g., connection refused, DNS failure)
            message.contains("timed out") || message.contains("connect")
        }
        _ => false,
    }
}

/// Calculate exponential backoff duration for a given attempt.
///
/// Uses `base_delay * 2^attempt` with a cap at 30 seconds.
pub fn backoff_duration(attempt: u32, base_delay_ms: u64) -> Duration {
    let delay = base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay.min(30_000))
}

/// Exponential backoff plus uniform random jitter in `[0, jitter_ms]`.
pub fn backoff_with_jitter(attempt: u32, base_delay_ms: u64, jitter_ms: u64) -> Duration {
    let base = backoff_duration(attempt, base_delay_ms);
    if jitter_ms == 0 {
        return base;
    }
    let jitter = rand::thread_rng().gen_range(0..=jitter_ms);
    base + Duration::from_millis(jitter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockProvider;
    use std::path::PathBuf;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_timeout_is_retryable() {
        let err = PipelineError::Timeout {
            stage: "llm".to_string(),
            target: "intro.txt".to_string(),
            timeout_ms: 60000,
        };
        assert!(is_retryable(&err));
    }

    #[test]
    fn test_rate_limit_is_retryable() {
        let err = PipelineError::Llm {
            message: "HTTP 429: rate limit exceeded".to_string(),
            status_code: Some(429),
        };
        assert!(is_retryable(&err));
    }

    #[test]
    fn test_server_error_is_retryable() {
        let err = PipelineError::Llm {
            message: "HTTP 503: service unavailable".to_string(),
            status_code: Some(503),
        };
        assert!(is_retryable(&err));
    }

    #[test]
    fn test_auth_error_not_retryable() {
        let err = PipelineError::Llm {
            message: "HTTP 401: unauthorized".to_string(),
            status_code: Some(401),
        };
        assert!(!is_retryable(&err));
    }

    #[test]
    fn test_read_error_not_retryable() {
        let err = PipelineError::Read {
            path: PathBuf::from("intro.txt"),
            message: "not found".to_string(),
        };
        assert!(!is_retryable(&err));
    }

    #[test]
    fn test_message_with_500_in_body_not_retryable_without_status() {
        let err = PipelineError::Llm {
            message: "Processed 500 tokens successfully".to_string(),
            status_code: None,
        };
        assert!(!is_retryable(&err));
    }

    #[test]
    fn test_connection_error_retryable_without_status() {
        let err = PipelineError::Llm {
            message: "connection refused".to_string(),
            status_code: None,
        };
        assert!(is_retryable(&err));
    }

    #[test]
    fn test_backoff_exponential() {
        assert_eq!(backoff_duration(0, 1000), Duration::from_millis(1000));
        assert_eq!(backoff_duration(1, 1000), Duration::from_millis(2000));
        assert_eq!(backoff_duration(2, 1000), Duration::from_millis(4000));
        assert_eq!(backoff_duration(3, 1000), Duration::from_millis(8000));
    }

    #[test]
    fn test_backoff_capped_at_30s() {
        assert_eq!(backoff_duration(10, 1000), Duration::from_millis(30_000));
    }

    #[test]
    fn test_jitter_stays_within_bound() {
        for _ in 0..50 {
            let d = backoff_with_jitter(1, 100, 40);
            assert!(d >= Duration::from_millis(200));
            assert!(d <= Duration::from_millis(240));
        }
        assert_eq!(backoff_with_jitter(0, 100, 0), Duration::from_millis(100));
    }

    fn quick_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            timeout_ms: Some(1_000),
            attempts,
            base_delay_ms: 5,
            jitter_ms: 5,
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_rate_limit() {
        let provider = MockProvider::fail_then_succeed(Some(429), "rate limited", "# Done");
        let calls = provider.call_count_handle();
        let request = LlmRequest::refine_document("doc");

        let resp = generate_with_retry(&provider, &request, &quick_policy(2), "a.txt")
            .await
            .unwrap();
        assert_eq!(resp.text, "# Done");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_attempts_makes_single_call() {
        let provider = MockProvider::failing(Some(503), "unavailable");
        let calls = provider.call_count_handle();
        let request = LlmRequest::refine_document("doc");

        let err = generate_with_retry(&provider, &request, &quick_policy(0), "a.txt")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unavailable"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_retryable_error_stops_immediately() {
        let provider = MockProvider::failing(Some(401), "unauthorized");
        let calls = provider.call_count_handle();
        let request = LlmRequest::refine_document("doc");

        let result = generate_with_retry(&provider, &request, &quick_policy(3), "a.txt").await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let provider = MockProvider::success("late").with_delay(Duration::from_millis(500));
        let request = LlmRequest::refine_document("doc");
        let policy = RetryPolicy {
            timeout_ms: Some(50),
            ..quick_policy(0)
        };

        let err = generate_with_retry(&provider, &request, &policy, "slow.txt")
            .await
            .unwrap_err();
        match err {
            PipelineError::Timeout {
                target, timeout_ms, ..
            } => {
                assert_eq!(target, "slow.txt");
                assert_eq!(timeout_ms, 50);
            }
            other => panic!("expected timeout, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_unset_timeout_falls_back_to_provider() {
        let provider = MockProvider::success("late")
            .with_delay(Duration::from_millis(500))
            .with_timeout(Duration::from_millis(40));
        let request = LlmRequest::refine_document("doc");
        let policy = RetryPolicy {
            timeout_ms: None,
            ..quick_policy(0)
        };

        let err = generate_with_retry(&provider, &request, &policy, "slow.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Timeout { timeout_ms: 40, .. }));

        // an explicit limit wins over the provider's own
        let provider = MockProvider::success("done")
            .with_delay(Duration::from_millis(80))
            .with_timeout(Duration::from_millis(40));
        let resp = generate_with_retry(&provider, &request, &quick_policy(0), "slow.txt")
            .await
            .unwrap();
        assert_eq!(resp.text, "done");
    }

    #[test]
    fn test_default_policy_defers_to_provider_timeout() {
        assert_eq!(RetryPolicy::default().timeout_ms, None);
    }
}
