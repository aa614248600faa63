//! # QABench Core
//!
//! Core types for the qabench multi-model QA benchmark suite:
//!
//! - **Models**: [`ModelSpec`] configurations and the [`BenchmarkConfig`] run setup
//! - **Backends**: [`SharedClient`] / [`IsolatedClient`] traits with the
//!   [`ChatClient`] and [`RecursiveClient`] implementations
//! - **Tasks**: [`Example`], [`TaskKey`], and [`TaskResult`], the unit of
//!   work and its outcome
//! - **Scoring**: exact-match and token-overlap F1 over normalized answers
//! - **Pricing**: per-million-token cost tables with a conservative fallback
//!
//! The execution engine that fans tasks out across backends lives in
//! `qabench-runner`; this crate holds everything both the engine and its
//! consumers share.
//!
//! ## Backend safety classes
//!
//! A [`SharedClient`] is stateless per call and serves many concurrent
//! workers from one instance. An [`IsolatedClient`] keeps mutable per-call
//! state (the recursive client's running notes and usage accumulator), so
//! `evaluate` takes `&mut self` and each instance is owned by a single
//! worker that processes its model's tasks serially.

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod pricing;
pub mod score;
pub mod session;
pub mod task;

// Re-export public API
pub use backend::{Evaluation, IsolatedClient, IsolatedClientFactory, ModelUsage, SharedClient, UsageSummary};
pub use client::{credentials_from_env, ChatClient};
pub use config::{BenchmarkConfig, ClientConfig};
pub use error::{BackendError, ConfigError};
pub use model::{BackendKind, ModelSpec};
pub use pricing::{calculate_cost, cost_of_usage, pricing_for, DEFAULT_PRICING};
pub use score::{exact_match_score, f1_score, normalize_answer};
pub use session::{RecursiveClient, RecursiveClientFactory};
pub use task::{Example, TaskKey, TaskResult};
