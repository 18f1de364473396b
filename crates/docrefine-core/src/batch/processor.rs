//! Bounded-concurrency batch refinement.
//!
//! The coordinator assigns a backend to every item in submission order,
//! spawns one task per item onto a `JoinSet`, and gates the tasks with a
//! semaphore. Results come back in completion order. A failure in one item
//! never affects its siblings: every item yields exactly one result.

use super::backend::Backend;
use super::discovery::WorkItem;
use super::naming;
use super::result::{truncate_error, ProcessingResult};
use super::rotation::BackendRotation;
use crate::error::PipelineError;
use crate::io::DocumentStore;
use crate::llm::retry::{self, RetryPolicy};
use crate::llm::LlmRequest;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Log lines carry at most this many characters of an error.
const LOG_ERROR_CHARS: usize = 200;

/// Configuration for one batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Maximum items in flight at once
    pub max_parallel: usize,
    /// Directory receiving refined documents
    pub output_dir: PathBuf,
    /// Prefix of refined document names
    pub output_marker: String,
    /// Timeout and retry behavior of provider calls
    pub retry: RetryPolicy,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_parallel: 5,
            output_dir: PathBuf::from("Barba_Docs_Refined"),
            output_marker: "refined_".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Progress snapshot delivered after each completed item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
    /// Wall time since the run started
    pub elapsed: Duration,
    /// Linear estimate of the remaining time
    pub eta: Duration,
}

impl BatchProgress {
    pub fn new(completed: usize, total: usize, elapsed: Duration) -> Self {
        let remaining = total.saturating_sub(completed);
        let eta = if completed == 0 {
            Duration::ZERO
        } else {
            elapsed.mul_f64(remaining as f64 / completed as f64)
        };
        Self {
            completed,
            total,
            elapsed,
            eta,
        }
    }
}

/// Runs a batch of work items across a backend rotation.
pub struct BatchProcessor {
    rotation: BackendRotation,
    store: Arc<dyn DocumentStore>,
    options: BatchOptions,
}

impl BatchProcessor {
    pub fn new(
        rotation: BackendRotation,
        store: Arc<dyn DocumentStore>,
        options: BatchOptions,
    ) -> Self {
        Self {
            rotation,
            store,
            options,
        }
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    pub fn rotation(&self) -> &BackendRotation {
        &self.rotation
    }

    /// Process every item, returning one result per item in completion order.
    ///
    /// `on_progress` runs on the calling task after each completion.
    pub async fn run<F>(
        &mut self,
        items: Vec<WorkItem>,
        mut on_progress: F,
    ) -> Vec<ProcessingResult>
    where
        F: FnMut(&ProcessingResult, &BatchProgress),
    {
        let total = items.len();
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.options.max_parallel.max(1)));
        let options = Arc::new(self.options.clone());
        let mut tasks = JoinSet::new();
        let mut in_flight: HashMap<tokio::task::Id, (String, String)> =
            HashMap::with_capacity(total);

        for item in items {
            let backend = self.rotation.next().clone();
            let label = (item.file_name.clone(), backend.short_name().to_string());
            let semaphore = semaphore.clone();
            let store = self.store.clone();
            let options = options.clone();

            let handle = tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return ProcessingResult::failure(
                            &item.file_name,
                            backend.short_name(),
                            "Concurrency limiter closed".to_string(),
                            Duration::ZERO,
                        );
                    }
                };
                process_item(&item, &backend, store.as_ref(), &options).await
            });
            in_flight.insert(handle.id(), label);
        }

        let mut results = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next_with_id().await {
            let result = match joined {
                Ok((id, result)) => {
                    in_flight.remove(&id);
                    result
                }
                Err(e) => {
                    let (file_name, backend) = in_flight.remove(&e.id()).unwrap_or_default();
                    tracing::error!("Task for {file_name} ({backend}) did not complete: {e}");
                    ProcessingResult::failure(
                        &file_name,
                        &backend,
                        format!("Task failed: {e}"),
                        Duration::ZERO,
                    )
                }
            };
            results.push(result);

            let progress = BatchProgress::new(results.len(), total, start.elapsed());
            if let Some(last) = results.last() {
                on_progress(last, &progress);
            }
        }

        results
    }
}

/// Read, refine, write. The permit is held by the caller for the duration,
/// including the post-call delay.
async fn process_item(
    item: &WorkItem,
    backend: &Backend,
    store: &dyn DocumentStore,
    options: &BatchOptions,
) -> ProcessingResult {
    let start = Instant::now();
    tracing::info!("Processing {} with {}", item.file_name, backend.short_name());

    match refine_item(item, backend, store, options).await {
        Ok((output_file, content_length, tokens_used)) => {
            let elapsed = start.elapsed();
            tracing::info!(
                "Success: {} -> {output_file} ({:.1}s)",
                item.file_name,
                elapsed.as_secs_f64()
            );

            let delay = backend.config.delay();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            ProcessingResult::success(
                &item.file_name,
                backend.short_name(),
                output_file,
                elapsed,
                content_length,
            )
            .with_tokens_used(tokens_used)
        }
        Err(e) => {
            let elapsed = start.elapsed();
            let message = e.to_string();
            tracing::error!(
                "Failed: {} with {}: {}",
                item.file_name,
                backend.short_name(),
                truncate_error(&message, LOG_ERROR_CHARS)
            );
            ProcessingResult::failure(&item.file_name, backend.short_name(), message, elapsed)
        }
    }
}

/// Returns the output file name, the generated character count and the
/// provider's token usage.
async fn refine_item(
    item: &WorkItem,
    backend: &Backend,
    store: &dyn DocumentStore,
    options: &BatchOptions,
) -> Result<(String, usize, Option<u32>), PipelineError> {
    let document = store.read_to_string(&item.path).await?;
    let request = LlmRequest::refine_document(&document);
    let response = retry::generate_with_retry(
        backend.provider.as_ref(),
        &request,
        &options.retry,
        &item.file_name,
    )
    .await?;
    tracing::debug!(
        "{} answered for {} in {}ms (tokens: {:?})",
        response.model,
        item.file_name,
        response.latency_ms,
        response.tokens_used
    );

    let output_file = naming::output_file_name(
        &options.output_marker,
        backend.short_name(),
        &item.file_name,
        &naming::timestamp(),
    );
    store
        .write(&options.output_dir.join(&output_file), &response.text)
        .await?;

    Ok((output_file, response.text.chars().count(), response.tokens_used))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::backend::{BackendConfig, ProviderKind};
    use crate::io::MemoryStore;
    use crate::llm::mock::MockProvider;
    use std::path::Path;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn backend(short: &str, provider: MockProvider, delay_ms: u64) -> Backend {
        Backend::new(
            BackendConfig::new(short, short, ProviderKind::Ollama, delay_ms),
            Box::new(provider),
        )
    }

    fn seeded_store(names: &[&str]) -> (Arc<MemoryStore>, Vec<WorkItem>) {
        let store = Arc::new(MemoryStore::new());
        let items = names
            .iter()
            .map(|name| {
                let path = PathBuf::from("in").join(name);
                store.insert(path.clone(), format!("raw {name}"));
                WorkItem::new(path, 10)
            })
            .collect();
        (store, items)
    }

    fn options(max_parallel: usize) -> BatchOptions {
        BatchOptions {
            max_parallel,
            output_dir: PathBuf::from("out"),
            output_marker: "refined_".to_string(),
            retry: RetryPolicy {
                timeout_ms: Some(2_000),
                attempts: 0,
                base_delay_ms: 5,
                jitter_ms: 0,
            },
        }
    }

    fn processor(
        backends: Vec<Backend>,
        store: Arc<MemoryStore>,
        options: BatchOptions,
    ) -> BatchProcessor {
        BatchProcessor::new(BackendRotation::new(backends).unwrap(), store, options)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_one_result_per_item() {
        let (store, items) = seeded_store(&["a.txt", "b.txt", "c.txt", "d.txt", "e.txt"]);
        let mut proc = processor(
            vec![backend("b0", MockProvider::success("# Clean"), 0)],
            store.clone(),
            options(2),
        );

        let results = proc.run(items, |_, _| {}).await;
        assert_eq!(results.len(), 5);
        assert!(results.iter().all(|r| r.success));
        assert!(results.iter().all(|r| r.tokens_used == Some(42)));
        assert_eq!(store.paths_in(Path::new("out")).len(), 5);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_peak_concurrency_bounded() {
        let in_flight = Arc::new(AtomicU32::new(0));
        let max_seen = Arc::new(AtomicU32::new(0));
        let provider = MockProvider::success("ok")
            .with_delay(Duration::from_millis(40))
            .with_concurrency_tracking(in_flight.clone(), max_seen.clone());

        let names: Vec<String> = (0..12).map(|i| format!("doc{i}.txt")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let (store, items) = seeded_store(&refs);
        let mut proc = processor(vec![backend("b0", provider, 0)], store, options(3));

        let results = proc.run(items, |_, _| {}).await;
        assert_eq!(results.len(), 12);
        let peak = max_seen.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak concurrency {peak} exceeded limit");
        assert!(peak >= 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_round_robin_assignment_in_submission_order() {
        let (store, items) = seeded_store(&["a.txt", "b.txt", "c.txt"]);
        let mut proc = processor(
            vec![
                backend("b0", MockProvider::success("zero"), 0),
                backend("b1", MockProvider::success("one"), 0),
            ],
            store.clone(),
            options(1),
        );

        let mut results = proc.run(items, |_, _| {}).await;
        results.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        let assigned: Vec<&str> = results.iter().map(|r| r.backend.as_str()).collect();
        assert_eq!(assigned, ["b0", "b1", "b0"]);

        let b_output = results[1].output_file.clone().unwrap();
        assert!(b_output.starts_with("refined_b1_b_"));
        assert_eq!(
            store.get(&Path::new("out").join(&b_output)).as_deref(),
            Some("one")
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_read_failure_isolated() {
        let (store, mut items) = seeded_store(&["a.txt", "c.txt"]);
        items.insert(1, WorkItem::new(PathBuf::from("in/missing.txt"), 0));
        let mut proc = processor(
            vec![backend("b0", MockProvider::success("ok"), 0)],
            store,
            options(2),
        );

        let results = proc.run(items, |_, _| {}).await;
        assert_eq!(results.len(), 3);
        let failures: Vec<&ProcessingResult> = results.iter().filter(|r| !r.success).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].file_name, "missing.txt");
        assert!(failures[0].error.as_deref().unwrap().contains("missing.txt"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_provider_failure_recorded_with_backend() {
        let (store, items) = seeded_store(&["a.txt", "b.txt"]);
        let mut proc = processor(
            vec![
                backend("good", MockProvider::success("ok"), 0),
                backend("bad", MockProvider::failing(Some(400), "bad request"), 0),
            ],
            store,
            options(2),
        );

        let results = proc.run(items, |_, _| {}).await;
        let failed = results.iter().find(|r| !r.success).unwrap();
        assert_eq!(failed.backend, "bad");
        assert_eq!(failed.file_name, "b.txt");
        assert_eq!(failed.content_length, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_delay_applies_only_after_success() {
        let (store, items) = seeded_store(&["a.txt"]);
        let mut proc = processor(
            vec![backend("slow", MockProvider::failing(Some(400), "nope"), 300)],
            store,
            options(1),
        );
        let start = Instant::now();
        proc.run(items, |_, _| {}).await;
        assert!(start.elapsed() < Duration::from_millis(250));

        let (store, items) = seeded_store(&["a.txt"]);
        let mut proc = processor(
            vec![backend("slow", MockProvider::success("ok"), 300)],
            store,
            options(1),
        );
        let start = Instant::now();
        let results = proc.run(items, |_, _| {}).await;
        assert!(start.elapsed() >= Duration::from_millis(300));
        // Item time excludes the politeness delay
        assert!(results[0].processing_time() < Duration::from_millis(250));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_retry_policy_applied_per_item() {
        let (store, items) = seeded_store(&["a.txt"]);
        let provider = MockProvider::fail_then_succeed(Some(503), "overloaded", "# Ok");
        let calls = provider.call_count_handle();
        let mut opts = options(1);
        opts.retry.attempts = 2;
        let mut proc = processor(vec![backend("b0", provider, 0)], store, opts);

        let results = proc.run(items, |_, _| {}).await;
        assert!(results[0].success);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_panicking_task_becomes_failure() {
        let (store, items) = seeded_store(&["a.txt", "b.txt"]);
        let provider = MockProvider::new(|_, request| {
            if request.prompt.ends_with("raw b.txt") {
                panic!("provider blew up");
            }
            Ok(crate::llm::mock::response("ok"))
        });
        let mut proc = processor(vec![backend("b0", provider, 0)], store, options(2));

        let results = proc.run(items, |_, _| {}).await;
        assert_eq!(results.len(), 2);
        let failed = results.iter().find(|r| !r.success).unwrap();
        assert_eq!(failed.file_name, "b.txt");
        assert_eq!(failed.backend, "b0");
    }

    #[tokio::test]
    async fn test_progress_reports_each_completion() {
        let (store, items) = seeded_store(&["a.txt", "b.txt", "c.txt"]);
        let mut proc = processor(
            vec![backend("b0", MockProvider::success("ok"), 0)],
            store,
            options(3),
        );

        let mut seen = Vec::new();
        proc.run(items, |result, progress| {
            seen.push((result.file_name.clone(), progress.completed, progress.total));
        })
        .await;

        let counts: Vec<usize> = seen.iter().map(|(_, c, _)| *c).collect();
        assert_eq!(counts, [1, 2, 3]);
        assert!(seen.iter().all(|(_, _, t)| *t == 3));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let store = Arc::new(MemoryStore::new());
        let mut proc = processor(
            vec![backend("b0", MockProvider::success("ok"), 0)],
            store,
            options(2),
        );
        let results = proc.run(Vec::new(), |_, _| {}).await;
        assert!(results.is_empty());
    }

    #[test]
    fn test_progress_eta_is_linear() {
        let p = BatchProgress::new(2, 6, Duration::from_secs(10));
        assert_eq!(p.eta, Duration::from_secs(20));
        let done = BatchProgress::new(6, 6, Duration::from_secs(30));
        assert_eq!(done.eta, Duration::ZERO);
        assert_eq!(BatchProgress::new(0, 6, Duration::ZERO).eta, Duration::ZERO);
    }
}
