//! Integration tests for the two dispatchers, using instrumented mock
//! backends to verify the concurrency contracts:
//!
//! - the shared pool overlaps calls against one client instance,
//! - isolated clients never see overlapping calls and process their
//!   model's tasks in order,
//! - workers for different isolated models run concurrently,
//! - failures (per call or at client init) become error results without
//!   touching sibling tasks.

use async_trait::async_trait;
use qabench_core::{
    BackendError, BackendKind, Evaluation, Example, IsolatedClient, IsolatedClientFactory,
    ModelSpec, SharedClient, TaskKey,
};
use qabench_runner::{dispatch, ExecutionPlan, ResultSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn examples(count: usize) -> Vec<Example> {
    (0..count)
        .map(|i| Example {
            id: format!("q{}", i),
            question: format!("Question {}?", i),
            context: "Some context.".to_string(),
            gold_answer: "answer".to_string(),
        })
        .collect()
}

fn model(name: &str, isolated: bool) -> ModelSpec {
    ModelSpec::new(name, format!("org/{}", name), BackendKind::OpenRouter, isolated)
}

/// Shared client that tracks its concurrent-call high-water mark.
struct CountingSharedClient {
    in_flight: AtomicUsize,
    high_water: AtomicUsize,
    delay: Duration,
}

impl CountingSharedClient {
    fn new(delay: Duration) -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
            delay,
        }
    }
}

#[async_trait]
impl SharedClient for CountingSharedClient {
    async fn evaluate(
        &self,
        _model_id: &str,
        question: &str,
        _context: &str,
    ) -> Result<Evaluation, BackendError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        Ok(Evaluation {
            answer: format!("answer to {}", question),
            sub_calls: 1,
            usage: None,
        })
    }
}

/// Shared client that always fails.
struct FailingSharedClient;

#[async_trait]
impl SharedClient for FailingSharedClient {
    async fn evaluate(
        &self,
        _model_id: &str,
        _question: &str,
        _context: &str,
    ) -> Result<Evaluation, BackendError> {
        Err(BackendError::Api {
            status: 500,
            message: "backend down".to_string(),
        })
    }
}

/// Isolated client that asserts it is never re-entered and records the
/// order it saw its model's tasks in.
struct ExclusiveClient {
    model: String,
    busy: AtomicBool,
    in_flight: Arc<AtomicUsize>,
    high_water: Arc<AtomicUsize>,
    call_log: Arc<Mutex<Vec<(String, String)>>>,
    delay: Duration,
}

#[async_trait]
impl IsolatedClient for ExclusiveClient {
    async fn evaluate(&mut self, question: &str, _context: &str) -> Result<Evaluation, BackendError> {
        let was_busy = self.busy.swap(true, Ordering::SeqCst);
        assert!(!was_busy, "overlapping call on isolated client {}", self.model);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.call_log
            .lock()
            .unwrap()
            .push((self.model.clone(), question.to_string()));

        self.busy.store(false, Ordering::SeqCst);
        Ok(Evaluation {
            answer: "isolated answer".to_string(),
            sub_calls: 2,
            usage: None,
        })
    }
}

/// Factory producing [`ExclusiveClient`]s, optionally failing for one model.
struct TestFactory {
    in_flight: Arc<AtomicUsize>,
    high_water: Arc<AtomicUsize>,
    call_log: Arc<Mutex<Vec<(String, String)>>>,
    fail_for: Option<String>,
    delay: Duration,
}

impl TestFactory {
    fn new(delay: Duration) -> Self {
        Self {
            in_flight: Arc::new(AtomicUsize::new(0)),
            high_water: Arc::new(AtomicUsize::new(0)),
            call_log: Arc::new(Mutex::new(Vec::new())),
            fail_for: None,
            delay,
        }
    }

    fn failing_for(mut self, model_name: &str) -> Self {
        self.fail_for = Some(model_name.to_string());
        self
    }
}

impl IsolatedClientFactory for TestFactory {
    fn build(&self, spec: &ModelSpec) -> Result<Box<dyn IsolatedClient>, BackendError> {
        if self.fail_for.as_deref() == Some(spec.name.as_str()) {
            return Err(BackendError::Api {
                status: 500,
                message: "init exploded".to_string(),
            });
        }
        Ok(Box::new(ExclusiveClient {
            model: spec.name.clone(),
            busy: AtomicBool::new(false),
            in_flight: Arc::clone(&self.in_flight),
            high_water: Arc::clone(&self.high_water),
            call_log: Arc::clone(&self.call_log),
            delay: self.delay,
        }))
    }
}

#[tokio::test]
async fn test_shared_pool_overlaps_calls() {
    let client = Arc::new(CountingSharedClient::new(Duration::from_millis(30)));
    let plan = ExecutionPlan::new(
        vec![model("a", false), model("b", false)],
        examples(3),
    )
    .unwrap();
    let results = ResultSet::new();

    dispatch::run_shared(
        client.clone(),
        &plan,
        &results,
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(results.len(), 6);
    // With 6 tasks and a pool of 6, calls must have been in flight together
    assert!(
        client.high_water.load(Ordering::SeqCst) > 1,
        "expected overlapping in-flight calls on the shared client"
    );
}

#[tokio::test]
async fn test_shared_pool_converts_failures_to_results() {
    let plan = ExecutionPlan::new(vec![model("a", false)], examples(3)).unwrap();
    let results = Arc::new(ResultSet::new());

    dispatch::run_shared(
        Arc::new(FailingSharedClient),
        &plan,
        &results,
        &CancellationToken::new(),
    )
    .await;

    let resolved = results.finalize(&plan, false);
    assert_eq!(resolved.len(), 3);
    for result in resolved.values() {
        assert!(result.is_error());
        assert!(result.answer.starts_with("Error: "));
        assert_eq!(result.sub_calls, 0);
    }
}

#[tokio::test]
async fn test_shared_pool_skips_tasks_after_cancellation() {
    let plan = ExecutionPlan::new(vec![model("a", false)], examples(4)).unwrap();
    let results = ResultSet::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    dispatch::run_shared(
        Arc::new(CountingSharedClient::new(Duration::ZERO)),
        &plan,
        &results,
        &cancel,
    )
    .await;

    assert!(results.is_empty());
    let resolved = results.finalize(&plan, cancel.is_cancelled());
    assert_eq!(resolved.len(), 4);
    for result in resolved.values() {
        assert_eq!(result.error.as_deref(), Some("cancelled before completion"));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_isolated_serial_within_model() {
    let factory = Arc::new(TestFactory::new(Duration::from_millis(5)));
    let call_log = Arc::clone(&factory.call_log);
    let plan = ExecutionPlan::new(vec![model("iso", true)], examples(5)).unwrap();
    let results = Arc::new(ResultSet::new());

    dispatch::run_isolated(factory, &plan, &results, &CancellationToken::new()).await;

    assert_eq!(results.len(), 5);
    // The worker processed its tasks strictly in example order; any
    // overlap would have tripped the busy assertion inside the client.
    let questions: Vec<String> = call_log
        .lock()
        .unwrap()
        .iter()
        .map(|(_, q)| q.clone())
        .collect();
    let expected: Vec<String> = (0..5).map(|i| format!("Question {}?", i)).collect();
    assert_eq!(questions, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_isolated_workers_parallel_across_models() {
    let factory = Arc::new(TestFactory::new(Duration::from_millis(30)));
    let high_water = Arc::clone(&factory.high_water);
    let plan = ExecutionPlan::new(
        vec![model("iso-a", true), model("iso-b", true)],
        examples(3),
    )
    .unwrap();
    let results = Arc::new(ResultSet::new());

    dispatch::run_isolated(factory, &plan, &results, &CancellationToken::new()).await;

    assert_eq!(results.len(), 6);
    assert!(
        high_water.load(Ordering::SeqCst) > 1,
        "expected workers for different models to overlap"
    );
}

#[tokio::test]
async fn test_isolated_init_failure_stays_local() {
    let factory = Arc::new(TestFactory::new(Duration::ZERO).failing_for("iso-bad"));
    let plan = ExecutionPlan::new(
        vec![model("iso-bad", true), model("iso-good", true)],
        examples(3),
    )
    .unwrap();
    let results = Arc::new(ResultSet::new());

    dispatch::run_isolated(factory, &plan, &results, &CancellationToken::new()).await;

    let resolved = results.finalize(&plan, false);
    assert_eq!(resolved.len(), 6);

    // Every task of the failing model carries the same init error
    for i in 0..3 {
        let result = &resolved[&TaskKey::new(format!("q{}", i), "iso-bad")];
        assert!(result.is_error());
        assert!(result.error.as_deref().unwrap().contains("worker init failed"));
        assert!(result.error.as_deref().unwrap().contains("init exploded"));
    }

    // The sibling worker is unaffected
    for i in 0..3 {
        let result = &resolved[&TaskKey::new(format!("q{}", i), "iso-good")];
        assert!(!result.is_error());
        assert_eq!(result.answer, "isolated answer");
    }
}

#[tokio::test]
async fn test_isolated_cancellation_marks_remaining() {
    let factory = Arc::new(TestFactory::new(Duration::ZERO));
    let plan = ExecutionPlan::new(vec![model("iso", true)], examples(3)).unwrap();
    let results = Arc::new(ResultSet::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    dispatch::run_isolated(factory, &plan, &results, &cancel).await;

    let resolved = results.finalize(&plan, cancel.is_cancelled());
    assert_eq!(resolved.len(), 3);
    for result in resolved.values() {
        assert_eq!(result.error.as_deref(), Some("cancelled before completion"));
    }
}
