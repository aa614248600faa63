//! Backend client traits and call-level types.
//!
//! Two client shapes exist, matching the two dispatch strategies:
//!
//! - [`SharedClient`]: safe for concurrent invocation from many workers
//!   (stateless per call). One instance serves the whole shared pool.
//! - [`IsolatedClient`]: requires exclusive, serialized access per instance.
//!   `evaluate` takes `&mut self`, so overlapping calls against one client
//!   are a compile error rather than a runtime hazard. Each isolated model's
//!   worker builds its own instance through [`IsolatedClientFactory`].

use crate::error::BackendError;
use crate::model::ModelSpec;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Token usage attributed to one model id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelUsage {
    /// Number of API calls made
    pub calls: u64,
    /// Prompt tokens consumed
    pub input_tokens: u64,
    /// Completion tokens produced
    pub output_tokens: u64,
}

/// Usage aggregated over every model id a backend touched for one task.
///
/// A direct client records a single entry; a recursive client that fans out
/// sub-calls accumulates per-model totals across them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSummary {
    /// Usage keyed by backend model id
    pub models: BTreeMap<String, ModelUsage>,
}

impl UsageSummary {
    /// Record one call's token counts against a model id.
    pub fn record(&mut self, model_id: &str, input_tokens: u64, output_tokens: u64) {
        let entry = self.models.entry(model_id.to_string()).or_default();
        entry.calls += 1;
        entry.input_tokens += input_tokens;
        entry.output_tokens += output_tokens;
    }

    /// Total calls across all model ids.
    pub fn total_calls(&self) -> u64 {
        self.models.values().map(|u| u.calls).sum()
    }

    /// Whether anything has been recorded.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// What a backend returns for one successful evaluation.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// The model's answer text
    pub answer: String,
    /// Number of LLM calls made to produce the answer
    pub sub_calls: u64,
    /// Token usage, when the API reported it
    pub usage: Option<UsageSummary>,
}

/// A model client safe to invoke concurrently from multiple workers.
///
/// Implementations must keep no mutable per-call state; the shared pool
/// invokes one instance from up to its full worker count at once.
#[async_trait]
pub trait SharedClient: Send + Sync {
    /// Evaluate one question against its context with the given model.
    async fn evaluate(
        &self,
        model_id: &str,
        question: &str,
        context: &str,
    ) -> Result<Evaluation, BackendError>;
}

/// A model client whose correctness requires exclusive, serialized access.
///
/// The `&mut self` receiver is the contract: a worker owns its client and
/// processes that model's tasks one at a time.
#[async_trait]
pub trait IsolatedClient: Send {
    /// Evaluate one question against its context.
    ///
    /// The model identity is fixed at construction time, so it does not
    /// appear in the call signature.
    async fn evaluate(&mut self, question: &str, context: &str) -> Result<Evaluation, BackendError>;
}

/// Builds a fresh isolated client for one model's dedicated worker.
///
/// `build` is called exactly once per worker and must be side-effect-free
/// beyond producing the client handle. A build failure turns every task
/// assigned to that worker into an error result; sibling workers are
/// unaffected.
pub trait IsolatedClientFactory: Send + Sync {
    /// Construct a client for the given model.
    fn build(&self, spec: &ModelSpec) -> Result<Box<dyn IsolatedClient>, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_record_accumulates() {
        let mut usage = UsageSummary::default();
        usage.record("openai/gpt-4o-mini", 100, 20);
        usage.record("openai/gpt-4o-mini", 50, 10);
        usage.record("openai/gpt-5.1", 30, 5);

        let mini = &usage.models["openai/gpt-4o-mini"];
        assert_eq!(mini.calls, 2);
        assert_eq!(mini.input_tokens, 150);
        assert_eq!(mini.output_tokens, 30);

        assert_eq!(usage.total_calls(), 3);
    }

    #[test]
    fn test_usage_empty() {
        let usage = UsageSummary::default();
        assert!(usage.is_empty());
        assert_eq!(usage.total_calls(), 0);
    }

    #[test]
    fn test_usage_serde_roundtrip() {
        let mut usage = UsageSummary::default();
        usage.record("m", 10, 2);

        let json = serde_json::to_string(&usage).unwrap();
        let parsed: UsageSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, usage);
    }
}
