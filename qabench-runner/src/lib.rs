//! # QABench Runner
//!
//! Benchmark execution engine for comparing LLM configurations on shared
//! question-answering datasets.
//!
//! A run takes a fixed set of models and a dataset, fans the full
//! `examples × models` task set out across two concurrency strategies,
//! collects every result under a composite `(example id, model name)` key,
//! and reduces the complete set into a comparable accuracy/cost/latency
//! summary.
//!
//! ## Architecture
//!
//! ```text
//! qabench-core (models, backends, scoring, pricing)
//!     ↓
//! qabench-runner (plan, dispatchers, collector, reducer)  ← this crate
//!     ↓
//! qabench CLI (src/bin/main.rs)
//! ```
//!
//! ## Execution model
//!
//! - Shared-safe models run through **one bounded worker pool** sharing a
//!   single client instance ([`dispatch::run_shared`]).
//! - Isolated models each get a **dedicated single-writer worker** owning
//!   its own client; serial within a model, parallel across models
//!   ([`dispatch::run_isolated`]).
//! - Both dispatchers feed one [`ResultSet`], which fails closed: after
//!   they drain, every task key is present (real result or synthesized
//!   error) before metrics are reduced.
//!
//! Task failures are data. A backend error becomes an error result for
//! that one cell; only configuration errors detected before dispatch abort
//! a run.
//!
//! ## Quick start
//!
//! ```no_run
//! use qabench_core::{BenchmarkConfig, ChatClient, ClientConfig, RecursiveClientFactory};
//! use qabench_runner::{render, BenchmarkRunner};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client_config = ClientConfig::default();
//! let runner = BenchmarkRunner::new(
//!     BenchmarkConfig::default(),
//!     Arc::new(ChatClient::from_env(client_config.clone())?),
//!     Arc::new(RecursiveClientFactory::from_env(client_config)?),
//! );
//!
//! let run = runner.run_task("hotpotqa").await?;
//! render::print_console_summary(&run.summary);
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod collect;
pub mod dataset;
pub mod dispatch;
pub mod plan;
pub mod registry;
pub mod render;
pub mod report;
pub mod runner;

// Re-export public API
pub use collect::ResultSet;
pub use dataset::{DatasetError, DatasetProvider, HotpotQA, JsonlDataset};
pub use dispatch::SHARED_POOL_CAP;
pub use plan::ExecutionPlan;
pub use registry::TaskRegistry;
pub use report::{ExampleReport, HeadToHead, ModelAggregate, ModelCell, RunSummary};
pub use runner::{BenchmarkRunner, RunError, RunProgress, TaskRun, SHUFFLE_SEED};
