//! Convergence and termination checks.
//!
//! [`Termination`] is consulted strictly between generations; an evaluation
//! in flight is never interrupted.

use super::config::SearchConfig;
use std::fmt;
use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Why a search run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(rename_all = "snake_case"))]
pub enum StopReason {
    /// `max_generations` generations were executed.
    MaxGenerations,
    /// Best fitness gained no more than `epsilon` over `patience` generations.
    Plateau,
    /// The wall-clock budget was exhausted.
    TimeBudget,
    /// The fitness-evaluation budget was exhausted.
    EvaluationBudget,
    /// The caller raised the cancellation flag.
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::MaxGenerations => "maximum generations reached",
            StopReason::Plateau => "fitness plateau",
            StopReason::TimeBudget => "time budget exhausted",
            StopReason::EvaluationBudget => "evaluation budget exhausted",
            StopReason::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Stop conditions of one run, with its start time.
#[derive(Debug, Clone)]
pub struct Termination {
    max_generations: usize,
    patience: usize,
    epsilon: f64,
    time_limit: Option<Duration>,
    max_evaluations: Option<usize>,
    started: Instant,
}

impl Termination {
    /// Captures the stop conditions of `config`; the clock starts now.
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            max_generations: config.max_generations,
            patience: config.patience,
            epsilon: config.epsilon,
            time_limit: config.time_limit_ms.map(Duration::from_millis),
            max_evaluations: config.max_evaluations,
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Decides whether to stop before running generation `generation + 1`.
    ///
    /// `best_so_far[g]` is the best fitness seen up to and including
    /// generation `g`; `evaluations` counts fitness evaluations so far.
    pub fn check(&self, best_so_far: &[f64], generation: usize, evaluations: usize) -> Option<StopReason> {
        if generation >= self.max_generations {
            return Some(StopReason::MaxGenerations);
        }
        if self.max_evaluations.is_some_and(|max| evaluations >= max) {
            return Some(StopReason::EvaluationBudget);
        }
        if self.time_limit.is_some_and(|limit| self.elapsed() >= limit) {
            return Some(StopReason::TimeBudget);
        }
        if self.plateaued(best_so_far) {
            return Some(StopReason::Plateau);
        }
        None
    }

    fn plateaued(&self, best_so_far: &[f64]) -> bool {
        if self.patience == 0 || best_so_far.len() <= self.patience {
            return false;
        }
        let now = best_so_far[best_so_far.len() - 1];
        let then = best_so_far[best_so_far.len() - 1 - self.patience];
        // Equal values (including two sentinels) count as zero gain.
        let gain = if now == then { 0.0 } else { now - then };
        gain <= self.epsilon
    }
}
