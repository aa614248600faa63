//! Execution plan: the fixed task set for one benchmark run.

use qabench_core::{ConfigError, Example, ModelSpec, TaskKey};
use std::collections::HashSet;
use std::sync::Arc;

/// The validated, immutable plan for a run: which models evaluate which
/// examples.
///
/// Models keep their configuration order (the first one is the
/// head-to-head baseline by convention) and are partitioned on demand into
/// shared-safe and isolated classes. The task set is the full cross
/// product; a run with zero examples (or only one model class) simply
/// produces the corresponding empty subset.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    models: Vec<ModelSpec>,
    examples: Arc<Vec<Example>>,
}

impl ExecutionPlan {
    /// Build a plan, validating the model list.
    ///
    /// Fails before any dispatch if the model list is empty or two models
    /// share a display name (the result join key).
    pub fn new(models: Vec<ModelSpec>, examples: Vec<Example>) -> Result<Self, ConfigError> {
        if models.is_empty() {
            return Err(ConfigError::NoModels);
        }
        let mut seen = HashSet::new();
        for model in &models {
            if !seen.insert(model.name.as_str()) {
                return Err(ConfigError::DuplicateModelName(model.name.clone()));
            }
        }
        Ok(Self {
            models,
            examples: Arc::new(examples),
        })
    }

    /// All models in configuration order.
    pub fn models(&self) -> &[ModelSpec] {
        &self.models
    }

    /// Models safe for the shared worker pool.
    pub fn shared_models(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.iter().filter(|m| !m.isolated)
    }

    /// Models that need a dedicated single-writer worker.
    pub fn isolated_models(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.iter().filter(|m| m.isolated)
    }

    /// The examples, shared with worker tasks.
    pub fn examples(&self) -> &Arc<Vec<Example>> {
        &self.examples
    }

    /// Size of the full task set: `|examples| × |models|`.
    pub fn task_count(&self) -> usize {
        self.examples.len() * self.models.len()
    }

    /// Every task key in the plan.
    pub fn task_keys(&self) -> impl Iterator<Item = TaskKey> + '_ {
        self.examples.iter().flat_map(move |example| {
            self.models
                .iter()
                .map(move |model| TaskKey::new(&example.id, &model.name))
        })
    }
}
