//! Task identity and result types.
//!
//! A task is one (example, model) evaluation unit; its result carries the
//! answer plus timing and usage data. Failures are data here, not events:
//! a failed backend call becomes a [`TaskResult`] with `error` set.

use crate::backend::UsageSummary;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A single benchmark example.
///
/// Produced once per run by a dataset provider and treated as read-only
/// afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Example {
    /// Unique identifier within a dataset
    pub id: String,
    /// The question to answer
    pub question: String,
    /// The text corpus to reason over
    pub context: String,
    /// Expected answer
    pub gold_answer: String,
}

/// Composite identity of one evaluation task: (example id, model name).
///
/// Exactly one task exists per (example, model) pair, and exactly one
/// [`TaskResult`] is ever recorded per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskKey {
    /// The example's dataset id
    pub example_id: String,
    /// The model's display name
    pub model: String,
}

impl TaskKey {
    /// Create a key from an example id and model name.
    pub fn new(example_id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            example_id: example_id.into(),
            model: model.into(),
        }
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.example_id, self.model)
    }
}

/// Outcome of one evaluation task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    /// The model's answer. For failed tasks this is `Error: <message>` so
    /// failures stay visible in rendered reports.
    pub answer: String,

    /// Wall-clock duration of the backend call, serialized as seconds
    #[serde(with = "duration_secs")]
    pub latency: Duration,

    /// Number of LLM calls the backend made to produce the answer
    #[serde(rename = "sub_call_count")]
    pub sub_calls: u64,

    /// Token usage, when the backend reported it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageSummary>,

    /// Error message if the call failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskResult {
    /// Create a result for a completed backend call.
    pub fn completed(
        answer: String,
        latency: Duration,
        sub_calls: u64,
        usage: Option<UsageSummary>,
    ) -> Self {
        Self {
            answer,
            latency,
            sub_calls,
            usage,
            error: None,
        }
    }

    /// Create a result for a failed backend call.
    ///
    /// The answer is the error text prefixed with `Error:`, latency is zero
    /// and the call count is zero.
    pub fn failed(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            answer: format!("Error: {}", message),
            latency: Duration::ZERO,
            sub_calls: 0,
            usage: None,
            error: Some(message),
        }
    }

    /// Whether this result records a failure.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Serde adapter for `Duration` as fractional seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs))
    }
}
