//! Per-example reports and the run-level metrics reduction.

use crate::plan::ExecutionPlan;
use qabench_core::{
    cost_of_usage, exact_match_score, f1_score, ModelSpec, TaskKey, TaskResult,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One model's scored result for one example.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCell {
    /// The task's result
    #[serde(flatten)]
    pub result: TaskResult,
    /// Whether the answer exactly matches the gold answer
    pub exact_match: bool,
    /// Token-overlap F1 against the gold answer
    pub f1: f64,
}

/// All models' results for one example; one persisted record per example.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExampleReport {
    /// Example id
    pub id: String,
    /// The question asked
    pub question: String,
    /// Expected answer
    pub gold_answer: String,
    /// Scored cell per model name
    pub models: BTreeMap<String, ModelCell>,
}

/// Build one report per example from a complete result map.
///
/// Every cell is scored, error answers included: a failed task scores
/// against its `Error: ...` text so failures stay visible in the report
/// rather than being dropped. A missing key (which `finalize` should have
/// prevented) is backfilled as an error cell here as well.
pub fn assemble_reports(
    plan: &ExecutionPlan,
    mut results: HashMap<TaskKey, TaskResult>,
) -> Vec<ExampleReport> {
    plan.examples()
        .iter()
        .map(|example| {
            let mut models = BTreeMap::new();
            for model in plan.models() {
                let key = TaskKey::new(&example.id, &model.name);
                let result = results.remove(&key).unwrap_or_else(|| {
                    log::warn!("missing result for task {}", key);
                    TaskResult::failed("no result collected")
                });
                let exact_match = exact_match_score(&result.answer, &example.gold_answer);
                let f1 = f1_score(&result.answer, &example.gold_answer);
                models.insert(model.name.clone(), ModelCell { result, exact_match, f1 });
            }
            ExampleReport {
                id: example.id.clone(),
                question: example.question.clone(),
                gold_answer: example.gold_answer.clone(),
                models,
            }
        })
        .collect()
}

/// Aggregate metrics for one model across a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelAggregate {
    /// Model display name
    pub model: String,
    /// Whether the model ran through the isolated pool
    pub isolated: bool,
    /// Examples answered exactly right
    pub exact_matches: usize,
    /// Exact matches / total examples
    pub exact_match_rate: f64,
    /// Arithmetic mean F1 over all examples (unweighted)
    pub mean_f1: f64,
    /// Mean backend-call latency in seconds
    pub mean_latency_secs: f64,
    /// Mean LLM calls per example
    pub mean_sub_calls: f64,
    /// Mean cost per example in USD, from the pricing table
    pub mean_cost_usd: f64,
    /// Examples where the task failed
    pub errors: usize,
}

/// Win/loss/tie record of one model against the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadToHead {
    /// Model display name
    pub model: String,
    /// Examples where this model's F1 strictly exceeds the baseline's
    pub wins: usize,
    /// Examples where it is strictly below
    pub losses: usize,
    /// Examples where the F1 scores are equal
    pub ties: usize,
    /// Wins / total examples
    pub win_rate: f64,
}

/// Run-level summary: per-model aggregates plus head-to-head comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of examples in the run
    pub total_examples: usize,
    /// Name of the baseline model.
    ///
    /// The baseline is the *first configured model*, by convention. It is
    /// positional, not computed, so reordering the model list changes what
    /// every head-to-head row is measured against.
    pub baseline: String,
    /// Per-model aggregates in configuration order
    pub aggregates: Vec<ModelAggregate>,
    /// Head-to-head records for every non-baseline model
    pub head_to_head: Vec<HeadToHead>,
}

impl RunSummary {
    /// Reduce a set of example reports to run-level metrics.
    ///
    /// Pure function over its inputs: reducing the same reports twice
    /// yields identical summaries. Means are simple arithmetic means over
    /// the example count; error cells contribute their zero scores and
    /// zero latency rather than being excluded.
    pub fn from_reports(reports: &[ExampleReport], models: &[ModelSpec]) -> Self {
        let total = reports.len();
        let denom = total.max(1) as f64;

        let aggregates: Vec<ModelAggregate> = models
            .iter()
            .map(|model| {
                let cells: Vec<&ModelCell> = reports
                    .iter()
                    .filter_map(|r| r.models.get(&model.name))
                    .collect();

                let exact_matches = cells.iter().filter(|c| c.exact_match).count();
                let errors = cells.iter().filter(|c| c.result.is_error()).count();
                let f1_sum: f64 = cells.iter().map(|c| c.f1).sum();
                let latency_sum: f64 =
                    cells.iter().map(|c| c.result.latency.as_secs_f64()).sum();
                let calls_sum: f64 = cells.iter().map(|c| c.result.sub_calls as f64).sum();
                let cost_sum: f64 = cells
                    .iter()
                    .filter_map(|c| c.result.usage.as_ref())
                    .map(cost_of_usage)
                    .sum();

                ModelAggregate {
                    model: model.name.clone(),
                    isolated: model.isolated,
                    exact_matches,
                    exact_match_rate: exact_matches as f64 / denom,
                    mean_f1: f1_sum / denom,
                    mean_latency_secs: latency_sum / denom,
                    mean_sub_calls: calls_sum / denom,
                    mean_cost_usd: cost_sum / denom,
                    errors,
                }
            })
            .collect();

        let baseline = models
            .first()
            .map(|m| m.name.clone())
            .unwrap_or_default();

        let head_to_head = models
            .iter()
            .skip(1)
            .map(|model| {
                let mut wins = 0;
                let mut losses = 0;
                let mut ties = 0;
                for report in reports {
                    let own = report.models.get(&model.name).map(|c| c.f1).unwrap_or(0.0);
                    let base = report.models.get(&baseline).map(|c| c.f1).unwrap_or(0.0);
                    if own > base {
                        wins += 1;
                    } else if own < base {
                        losses += 1;
                    } else {
                        ties += 1;
                    }
                }
                HeadToHead {
                    model: model.name.clone(),
                    wins,
                    losses,
                    ties,
                    win_rate: wins as f64 / denom,
                }
            })
            .collect();

        RunSummary {
            total_examples: total,
            baseline,
            aggregates,
            head_to_head,
        }
    }
}
