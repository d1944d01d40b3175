//! Parallel Gather
//!
//! Fan out independent tasks, keep whatever succeeds, and turn the completion
//! ratio into a confidence score. One failing sub-task never fails the batch;
//! it shows up as a lowered confidence and a `"{source}: {error}"` warning.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

/// A sub-task that did not complete
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    /// Which task failed (symbol, source name, timeframe, ...)
    pub source: String,

    /// Error message
    pub error: String,
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.error)
    }
}

/// `confidence = base + success_ratio * bonus`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfidencePolicy {
    pub base: f64,
    pub bonus: f64,
}

impl ConfidencePolicy {
    pub const fn new(base: f64, bonus: f64) -> Self {
        Self { base, bonus }
    }

    pub fn score(&self, success_ratio: f64) -> f64 {
        success_ratio.mul_add(self.bonus, self.base)
    }
}

/// Outcome of a gather
#[derive(Debug)]
pub struct Gathered<K, T> {
    /// Completed tasks, in submission order
    pub successes: Vec<(K, T)>,

    /// Failed tasks, in submission order
    pub failures: Vec<TaskFailure>,

    /// Number of tasks submitted
    pub attempted: usize,
}

impl<K, T> Gathered<K, T> {
    /// Successes over attempted (0.0 when nothing was attempted)
    #[allow(clippy::cast_precision_loss)]
    pub fn success_ratio(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.successes.len() as f64 / self.attempted as f64
        }
    }

    pub fn confidence(&self, policy: ConfidencePolicy) -> f64 {
        policy.score(self.success_ratio())
    }

    pub fn warnings(&self) -> Vec<String> {
        self.failures.iter().map(ToString::to_string).collect()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Run every task concurrently and collect the results
///
/// All tasks run to completion; there is no short-circuit on failure.
pub async fn gather<K, T, E, F, I>(tasks: I) -> Gathered<K, T>
where
    I: IntoIterator<Item = (K, F)>,
    K: fmt::Display,
    E: fmt::Display,
    F: Future<Output = std::result::Result<T, E>>,
{
    let (keys, futures): (Vec<K>, Vec<F>) = tasks.into_iter().unzip();
    let attempted = keys.len();
    let results = join_all(futures).await;

    let mut successes = Vec::with_capacity(attempted);
    let mut failures = Vec::new();

    for (key, result) in keys.into_iter().zip(results) {
        match result {
            Ok(value) => successes.push((key, value)),
            Err(err) => {
                let failure = TaskFailure {
                    source: key.to_string(),
                    error: err.to_string(),
                };
                tracing::warn!(source = %failure.source, error = %failure.error, "Sub-task failed");
                failures.push(failure);
            }
        }
    }

    Gathered {
        successes,
        failures,
        attempted,
    }
}
