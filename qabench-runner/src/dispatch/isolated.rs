//! Isolated-pool dispatcher: one dedicated worker per isolated model.

use crate::collect::ResultSet;
use crate::plan::ExecutionPlan;
use qabench_core::{Example, IsolatedClientFactory, ModelSpec, TaskKey, TaskResult};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Run every isolated model's tasks through its own single-writer worker.
///
/// Each worker builds its client exactly once and processes that model's
/// examples serially; workers for different models run concurrently. A
/// client build failure turns all of that worker's tasks into error results
/// carrying the init error; sibling workers are unaffected. The dispatcher
/// waits for every worker to drain before returning, even when tasks
/// errored.
pub async fn run_isolated(
    factory: Arc<dyn IsolatedClientFactory>,
    plan: &ExecutionPlan,
    results: &Arc<ResultSet>,
    cancel: &CancellationToken,
) {
    if plan.examples().is_empty() {
        return;
    }

    let mut workers = Vec::new();
    for model in plan.isolated_models() {
        log::info!(
            "isolated worker for '{}': {} tasks",
            model.name,
            plan.examples().len()
        );
        workers.push(tokio::spawn(run_worker(
            model.clone(),
            Arc::clone(plan.examples()),
            Arc::clone(&factory),
            Arc::clone(results),
            cancel.clone(),
        )));
    }

    for worker in workers {
        if let Err(e) = worker.await {
            // The collector fails closed on whatever this worker left behind
            log::error!("isolated worker aborted: {}", e);
        }
    }
}

async fn run_worker(
    model: ModelSpec,
    examples: Arc<Vec<Example>>,
    factory: Arc<dyn IsolatedClientFactory>,
    results: Arc<ResultSet>,
    cancel: CancellationToken,
) {
    let mut client = match factory.build(&model) {
        Ok(client) => client,
        Err(e) => {
            log::error!("client init for '{}' failed: {}", model.name, e);
            for example in examples.iter() {
                results.insert(
                    TaskKey::new(&example.id, &model.name),
                    TaskResult::failed(format!("worker init failed: {}", e)),
                );
            }
            return;
        }
    };

    for example in examples.iter() {
        if cancel.is_cancelled() {
            log::info!("worker '{}' stopping: run cancelled", model.name);
            return;
        }

        let start = Instant::now();
        let result = match client.evaluate(&example.question, &example.context).await {
            Ok(evaluation) => TaskResult::completed(
                evaluation.answer,
                start.elapsed(),
                evaluation.sub_calls,
                evaluation.usage,
            ),
            Err(e) => {
                log::warn!("task {}/{} failed: {}", example.id, model.name, e);
                TaskResult::failed(e.to_string())
            }
        };
        results.insert(TaskKey::new(&example.id, &model.name), result);
    }
}
