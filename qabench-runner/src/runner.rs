//! Benchmark runner: orchestrates one run end to end.

use crate::artifact;
use crate::collect::ResultSet;
use crate::dataset::DatasetError;
use crate::dispatch;
use crate::plan::ExecutionPlan;
use crate::registry::TaskRegistry;
use crate::report::{assemble_reports, ExampleReport, RunSummary};
use chrono::Local;
use qabench_core::{
    BenchmarkConfig, ConfigError, IsolatedClientFactory, SharedClient, TaskResult,
};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Seed for deterministic example shuffling.
pub const SHUFFLE_SEED: u64 = 42;

/// Errors that abort a benchmark run.
///
/// Everything here is detected before or between dispatches; individual
/// task failures never surface as a `RunError`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunError {
    /// Task name not present in the registry
    #[error("unknown task '{name}' (available: {available})")]
    UnknownTask { name: String, available: String },

    /// Invalid model configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Dataset could not be loaded
    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// Result artifact could not be written
    #[error("failed to write results: {0}")]
    Io(#[from] std::io::Error),
}

/// Progress events emitted while a task's benchmark executes.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum RunProgress {
    /// Examples loaded, dispatch starting.
    Started {
        /// Dataset name
        task: String,
        /// Size of the task set (`examples × models`)
        total: usize,
    },
    /// One (example, model) task resolved.
    TaskCompleted {
        /// Tasks resolved so far
        completed: usize,
        /// Size of the task set
        total: usize,
        /// Whether this task produced an error result
        errored: bool,
    },
}

/// Everything a completed task benchmark produced.
#[derive(Debug)]
pub struct TaskRun {
    /// Dataset name
    pub task_name: String,
    /// Path of the persisted JSONL artifact
    pub output_file: PathBuf,
    /// Per-example reports, in example order
    pub reports: Vec<ExampleReport>,
    /// Aggregated metrics
    pub summary: RunSummary,
}

/// Runs benchmark tasks against a fixed model configuration.
///
/// Shared-safe models go through one bounded pool over a single client;
/// isolated models each get a dedicated worker with a client of their own.
/// Both dispatchers run concurrently and feed one [`ResultSet`], which is
/// validated for completeness before metrics are reduced.
///
/// # Example
///
/// ```no_run
/// use qabench_core::{BenchmarkConfig, ChatClient, ClientConfig, RecursiveClientFactory};
/// use qabench_runner::BenchmarkRunner;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client_config = ClientConfig::default();
/// let runner = BenchmarkRunner::new(
///     BenchmarkConfig::default(),
///     Arc::new(ChatClient::from_env(client_config.clone())?),
///     Arc::new(RecursiveClientFactory::from_env(client_config)?),
/// );
///
/// let run = runner.run_task("hotpotqa").await?;
/// println!("saved {} reports to {:?}", run.reports.len(), run.output_file);
/// # Ok(())
/// # }
/// ```
pub struct BenchmarkRunner {
    config: BenchmarkConfig,
    registry: TaskRegistry,
    run_id: String,
    shared_client: Arc<dyn SharedClient>,
    isolated_factory: Arc<dyn IsolatedClientFactory>,
    cancel: CancellationToken,
}

impl BenchmarkRunner {
    /// Create a runner with the default task registry.
    ///
    /// The run id is derived from the start time and stamps every artifact
    /// this runner writes.
    pub fn new(
        config: BenchmarkConfig,
        shared_client: Arc<dyn SharedClient>,
        isolated_factory: Arc<dyn IsolatedClientFactory>,
    ) -> Self {
        Self {
            config,
            registry: TaskRegistry::with_defaults(),
            run_id: artifact::run_id(Local::now()),
            shared_client,
            isolated_factory,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an external cancellation token (e.g. wired to Ctrl-C).
    ///
    /// On cancellation, in-flight calls finish, queued work is skipped, and
    /// every unresolved task is recorded as a cancelled error result.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// This run's identifier (embedded in artifact file names).
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// The task registry, for registering custom datasets.
    pub fn registry_mut(&mut self) -> &mut TaskRegistry {
        &mut self.registry
    }

    /// Run one benchmark task.
    pub async fn run_task(&self, task_name: &str) -> Result<TaskRun, RunError> {
        self.run_task_with_progress(task_name, |_| {}).await
    }

    /// Run one benchmark task, reporting progress as tasks resolve.
    pub async fn run_task_with_progress<F>(
        &self,
        task_name: &str,
        on_progress: F,
    ) -> Result<TaskRun, RunError>
    where
        F: Fn(RunProgress) + Send + Sync + 'static,
    {
        let provider = match self.registry.get(task_name) {
            Some(provider) => provider?,
            None => {
                return Err(RunError::UnknownTask {
                    name: task_name.to_string(),
                    available: self.registry.list().join(", "),
                })
            }
        };

        let seed = self.config.shuffle.then_some(SHUFFLE_SEED);
        let examples = provider.load(self.config.max_samples, seed).await?;
        log::info!(
            "task '{}': {} examples x {} models",
            provider.name(),
            examples.len(),
            self.config.models.len()
        );

        let plan = ExecutionPlan::new(self.config.models.clone(), examples)?;
        let total = plan.task_count();
        on_progress(RunProgress::Started {
            task: provider.name().to_string(),
            total,
        });

        let on_progress = Arc::new(on_progress);
        let observer = Arc::clone(&on_progress);
        let results = Arc::new(ResultSet::with_observer(Box::new(
            move |completed, result: &TaskResult| {
                observer(RunProgress::TaskCompleted {
                    completed,
                    total,
                    errored: result.is_error(),
                });
            },
        )));

        // Both dispatchers run concurrently against the same result set;
        // this join is the only barrier before reduction.
        tokio::join!(
            dispatch::run_shared(
                Arc::clone(&self.shared_client),
                &plan,
                results.as_ref(),
                &self.cancel,
            ),
            dispatch::run_isolated(
                Arc::clone(&self.isolated_factory),
                &plan,
                &results,
                &self.cancel,
            ),
        );

        let resolved = results.finalize(&plan, self.cancel.is_cancelled());
        let reports = assemble_reports(&plan, resolved);

        std::fs::create_dir_all(&self.config.output_dir)?;
        let output_file =
            artifact::results_path(&self.config.output_dir, provider.name(), &self.run_id);
        artifact::write_results(&output_file, &reports)?;
        log::info!("saved {} results to {:?}", reports.len(), output_file);

        let summary = RunSummary::from_reports(&reports, plan.models());

        Ok(TaskRun {
            task_name: provider.name().to_string(),
            output_file,
            reports,
            summary,
        })
    }

    /// Run several tasks in sequence.
    pub async fn run(&self, task_names: &[String]) -> Result<Vec<TaskRun>, RunError> {
        let mut runs = Vec::with_capacity(task_names.len());
        for name in task_names {
            runs.push(self.run_task(name).await?);
        }
        Ok(runs)
    }
}
