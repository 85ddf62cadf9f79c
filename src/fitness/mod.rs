//! Fitness evaluation.
//!
//! The engine sees fitness only through [`FitnessFunction`]: a scalar where
//! greater is better. [`FitnessEvaluator`] is the cross-validated,
//! cached implementation used for hyperparameter search; plain closures
//! also implement the trait, which is convenient for synthetic objectives.

mod cache;
mod evaluator;

pub use cache::{CvOutcome, EvaluationCache};
pub use evaluator::FitnessEvaluator;

use crate::ga::GenerationStats;
use crate::space::Configuration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fitness assigned to configurations whose evaluation failed.
pub const WORST_FITNESS: f64 = f64::NEG_INFINITY;

/// Scores a configuration. Greater is better.
///
/// Implementations must not panic on bad configurations; return
/// [`WORST_FITNESS`] instead so the run can continue.
pub trait FitnessFunction: Sync {
    fn evaluate(&self, config: &Configuration) -> f64;

    /// Called after each generation has been evaluated.
    ///
    /// The default implementation is a no-op.
    fn on_generation(&self, _stats: &GenerationStats) {}
}

impl<F> FitnessFunction for F
where
    F: Fn(&Configuration) -> f64 + Sync,
{
    fn evaluate(&self, config: &Configuration) -> f64 {
        self(config)
    }
}

/// Whether the estimator's score grows or shrinks with quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum ScoreDirection {
    /// Higher scores are better (accuracy, R², …).
    #[default]
    Maximize,
    /// Lower scores are better (error metrics); the mean is negated.
    Minimize,
}

impl ScoreDirection {
    /// Maps a raw mean score onto the greater-is-better fitness scale.
    pub fn normalize(self, score: f64) -> f64 {
        match self {
            ScoreDirection::Maximize => score,
            ScoreDirection::Minimize => -score,
        }
    }
}
