//! Shared-pool dispatcher for concurrency-safe backends.

use crate::collect::ResultSet;
use crate::plan::ExecutionPlan;
use futures_util::stream::{self, StreamExt};
use qabench_core::{Example, ModelSpec, SharedClient, TaskKey, TaskResult};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Ceiling on concurrent in-flight calls through the shared client.
///
/// Bounds outstanding connections; the actual pool size is
/// `min(task count, SHARED_POOL_CAP)`.
pub const SHARED_POOL_CAP: usize = 20;

/// Run every (example, shared-safe model) task through one bounded pool.
///
/// All workers invoke the same client instance, which must tolerate
/// concurrent calls. Results land in `results` in completion order, which
/// is not guaranteed. Cancellation skips tasks that have not started;
/// in-flight calls are allowed to finish.
pub async fn run_shared(
    client: Arc<dyn SharedClient>,
    plan: &ExecutionPlan,
    results: &ResultSet,
    cancel: &CancellationToken,
) {
    let tasks: Vec<(&Example, &ModelSpec)> = plan
        .examples()
        .iter()
        .flat_map(|example| plan.shared_models().map(move |model| (example, model)))
        .collect();

    if tasks.is_empty() {
        return;
    }

    let pool_size = tasks.len().min(SHARED_POOL_CAP);
    log::info!(
        "shared pool: {} tasks across {} workers",
        tasks.len(),
        pool_size
    );

    let mut completions = stream::iter(tasks)
        .map(|(example, model)| {
            let client = Arc::clone(&client);
            async move {
                if cancel.is_cancelled() {
                    return None;
                }
                let key = TaskKey::new(&example.id, &model.name);
                Some((key, evaluate_one(client.as_ref(), model, example).await))
            }
        })
        .buffer_unordered(pool_size);

    while let Some(completion) = completions.next().await {
        if let Some((key, result)) = completion {
            results.insert(key, result);
        }
    }
}

/// Execute one backend call, converting failure into an error result.
async fn evaluate_one(
    client: &dyn SharedClient,
    model: &ModelSpec,
    example: &Example,
) -> TaskResult {
    let start = Instant::now();
    match client
        .evaluate(&model.model_id, &example.question, &example.context)
        .await
    {
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
    }
}
