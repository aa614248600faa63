//! Result collection: the write-once map both dispatchers feed.

use crate::plan::ExecutionPlan;
use qabench_core::{TaskKey, TaskResult};
use std::collections::HashMap;
use std::sync::Mutex;

/// Callback invoked after each accepted insert with the number of results
/// collected so far and the result itself.
pub type InsertObserver = Box<dyn Fn(usize, &TaskResult) + Send + Sync>;

/// Concurrent, insert-only mapping from task key to result.
///
/// Both dispatchers write into one `ResultSet`; each key is produced by
/// exactly one worker, so the map only has to guard the insert itself.
/// Writing the same key twice is a logic error: the duplicate is rejected
/// with a warning and the first write wins.
pub struct ResultSet {
    entries: Mutex<HashMap<TaskKey, TaskResult>>,
    observer: Option<InsertObserver>,
}

impl ResultSet {
    /// Create an empty result set.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            observer: None,
        }
    }

    /// Create a result set that reports each accepted insert.
    ///
    /// Used for progress display; the observer runs outside the map lock.
    pub fn with_observer(observer: InsertObserver) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            observer: Some(observer),
        }
    }

    /// Record a task's result.
    ///
    /// Returns `false` (and logs a warning) if the key already has a
    /// result; the existing entry is kept.
    pub fn insert(&self, key: TaskKey, result: TaskResult) -> bool {
        let (accepted, completed) = {
            let mut entries = lock_entries(&self.entries);
            if entries.contains_key(&key) {
                log::warn!("duplicate result for task {} rejected", key);
                (false, entries.len())
            } else {
                entries.insert(key, result.clone());
                (true, entries.len())
            }
        };
        if accepted {
            if let Some(observer) = &self.observer {
                observer(completed, &result);
            }
        }
        accepted
    }

    /// Number of results collected so far.
    pub fn len(&self) -> usize {
        lock_entries(&self.entries).len()
    }

    /// Whether nothing has been collected yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain the collected results, failing closed on gaps.
    ///
    /// Every key in the plan that has no entry gets a synthesized error
    /// result; a run never silently drops a (example, model) cell. The
    /// message distinguishes cancellation from a result that was simply
    /// never produced (e.g. a panicked worker).
    pub fn finalize(&self, plan: &ExecutionPlan, cancelled: bool) -> HashMap<TaskKey, TaskResult> {
        let mut entries = std::mem::take(&mut *lock_entries(&self.entries));

        let reason = if cancelled {
            "cancelled before completion"
        } else {
            "no result collected"
        };
        for key in plan.task_keys() {
            if !entries.contains_key(&key) {
                log::warn!("missing result for task {}: {}", key, reason);
                entries.insert(key, TaskResult::failed(reason));
            }
        }
        entries
    }
}

impl Default for ResultSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Lock the entry map, recovering from a poisoned lock.
///
/// A worker that panics while holding the lock poisons it; the map itself
/// is still valid (inserts are atomic), so collection continues.
fn lock_entries<'a>(
    entries: &'a Mutex<HashMap<TaskKey, TaskResult>>,
) -> std::sync::MutexGuard<'a, HashMap<TaskKey, TaskResult>> {
    match entries.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("result set lock poisoned - recovering");
            poisoned.into_inner()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qabench_core::{BackendKind, Example, ModelSpec};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn plan(example_ids: &[&str], model_names: &[&str]) -> ExecutionPlan {
        let examples = example_ids
            .iter()
            .map(|id| Example {
                id: id.to_string(),
                question: "Q?".to_string(),
                context: String::new(),
                gold_answer: "A".to_string(),
            })
            .collect();
        let models = model_names
            .iter()
            .map(|name| ModelSpec::new(*name, "org/m", BackendKind::OpenRouter, false))
            .collect();
        ExecutionPlan::new(models, examples).unwrap()
    }

    fn ok_result(answer: &str) -> TaskResult {
        TaskResult::completed(answer.to_string(), Duration::from_millis(10), 1, None)
    }

    #[test]
    fn test_insert_and_len() {
        let results = ResultSet::new();
        assert!(results.is_empty());

        assert!(results.insert(TaskKey::new("q1", "m"), ok_result("a")));
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_duplicate_insert_rejected_first_wins() {
        let results = ResultSet::new();
        let key = TaskKey::new("q1", "m");

        assert!(results.insert(key.clone(), ok_result("first")));
        assert!(!results.insert(key.clone(), ok_result("second")));

        let resolved = results.finalize(&plan(&["q1"], &["m"]), false);
        assert_eq!(resolved[&key].answer, "first");
        assert_eq!(resolved.len(), 1);
    }

    #[test]
    fn test_finalize_backfills_gaps() {
        let plan = plan(&["q1", "q2"], &["m"]);
        let results = ResultSet::new();
        results.insert(TaskKey::new("q1", "m"), ok_result("a"));

        let resolved = results.finalize(&plan, false);
        assert_eq!(resolved.len(), 2);

        let gap = &resolved[&TaskKey::new("q2", "m")];
        assert!(gap.is_error());
        assert_eq!(gap.error.as_deref(), Some("no result collected"));
    }

    #[test]
    fn test_finalize_marks_cancelled() {
        let plan = plan(&["q1"], &["m"]);
        let results = ResultSet::new();

        let resolved = results.finalize(&plan, true);
        let cell = &resolved[&TaskKey::new("q1", "m")];
        assert_eq!(cell.error.as_deref(), Some("cancelled before completion"));
    }

    #[test]
    fn test_observer_sees_accepted_inserts_only() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let results = ResultSet::with_observer(Box::new(move |completed, _| {
            count_clone.store(completed, Ordering::SeqCst);
        }));

        let key = TaskKey::new("q1", "m");
        results.insert(key.clone(), ok_result("a"));
        results.insert(key, ok_result("dup"));
        results.insert(TaskKey::new("q2", "m"), ok_result("b"));

        // Duplicate did not bump the completed count
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
