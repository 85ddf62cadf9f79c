//! Per-run memo of cross-validation outcomes.

use super::{ScoreDirection, WORST_FITNESS};
use crate::error::EstimatorError;
use crate::space::Configuration;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Cross-validation outcome of one configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CvOutcome {
    /// The evaluated configuration.
    pub configuration: Configuration,

    /// Normalized greater-is-better fitness ([`WORST_FITNESS`] on failure).
    pub fitness: f64,

    /// Raw per-fold scores as returned by the estimator.
    pub fold_scores: Vec<f64>,

    /// Why the evaluation failed, if it did.
    pub error: Option<EstimatorError>,
}

impl CvOutcome {
    /// Aggregates fold scores by their arithmetic mean.
    ///
    /// An empty fold list or a non-finite mean is recorded as a failure.
    pub fn from_scores(configuration: Configuration, fold_scores: Vec<f64>, direction: ScoreDirection) -> Self {
        if fold_scores.is_empty() {
            return Self::failed(
                configuration,
                EstimatorError::Score("cross-validator produced no splits".into()),
            );
        }
        let mean = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
        if !mean.is_finite() {
            let mut outcome = Self::failed(
                configuration,
                EstimatorError::Score(format!("non-finite mean score {mean}")),
            );
            outcome.fold_scores = fold_scores;
            return outcome;
        }
        Self {
            configuration,
            fitness: direction.normalize(mean),
            fold_scores,
            error: None,
        }
    }

    /// A failed evaluation carrying the sentinel worst fitness.
    pub fn failed(configuration: Configuration, error: EstimatorError) -> Self {
        Self {
            configuration,
            fitness: WORST_FITNESS,
            fold_scores: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Mean of the raw fold scores.
    pub fn mean_score(&self) -> Option<f64> {
        if self.fold_scores.is_empty() {
            return None;
        }
        Some(self.fold_scores.iter().sum::<f64>() / self.fold_scores.len() as f64)
    }

    /// Population standard deviation of the raw fold scores.
    pub fn std_score(&self) -> Option<f64> {
        let mean = self.mean_score()?;
        let var = self
            .fold_scores
            .iter()
            .map(|s| (s - mean).powi(2))
            .sum::<f64>()
            / self.fold_scores.len() as f64;
        Some(var.sqrt())
    }
}

/// Fingerprint → outcome map shared by all evaluations of one run.
///
/// Entries are never evicted. Two threads evaluating the same fingerprint
/// may both compute it; the later insert wins, which is harmless because
/// outcomes for one fingerprint are identical.
#[derive(Debug, Default)]
pub struct EvaluationCache {
    entries: Mutex<HashMap<String, CvOutcome>>,
}

impl EvaluationCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CvOutcome>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached fitness for `fingerprint`.
    pub fn fitness(&self, fingerprint: &str) -> Option<f64> {
        self.lock().get(fingerprint).map(|o| o.fitness)
    }

    pub fn get(&self, fingerprint: &str) -> Option<CvOutcome> {
        self.lock().get(fingerprint).cloned()
    }

    pub fn insert(&self, fingerprint: String, outcome: CvOutcome) {
        self.lock().insert(fingerprint, outcome);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// All outcomes, best fitness first.
    pub fn snapshot(&self) -> Vec<CvOutcome> {
        let mut outcomes: Vec<CvOutcome> = self.lock().values().cloned().collect();
        outcomes.sort_by(|a, b| {
            b.fitness
                .total_cmp(&a.fitness)
                .then_with(|| a.configuration.fingerprint().cmp(&b.configuration.fingerprint()))
        });
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(k: i64) -> Configuration {
        let mut c = Configuration::new();
        c.insert("k", k);
        c
    }

    #[test]
    fn test_mean_aggregation() {
        let o = CvOutcome::from_scores(config(1), vec![0.5, 0.7, 0.9], ScoreDirection::Maximize);
        assert!((o.fitness - 0.7).abs() < 1e-12);
        assert!(!o.is_failed());
        assert!((o.std_score().unwrap() - (0.08f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_minimize_flips_sign() {
        let o = CvOutcome::from_scores(config(1), vec![2.0, 4.0], ScoreDirection::Minimize);
        assert!((o.fitness + 3.0).abs() < 1e-12);
        assert_eq!(o.mean_score(), Some(3.0));
    }

    #[test]
    fn test_empty_and_nan_scores_fail() {
        let empty = CvOutcome::from_scores(config(1), vec![], ScoreDirection::Maximize);
        assert!(empty.is_failed());
        assert_eq!(empty.fitness, WORST_FITNESS);

        let nan = CvOutcome::from_scores(config(1), vec![0.5, f64::NAN], ScoreDirection::Maximize);
        assert!(nan.is_failed());
        assert_eq!(nan.fitness, WORST_FITNESS);
        assert_eq!(nan.fold_scores.len(), 2);
    }

    #[test]
    fn test_snapshot_sorted_best_first() {
        let cache = EvaluationCache::new();
        for (k, score) in [(1, 0.2), (2, 0.9), (3, 0.5)] {
            let c = config(k);
            cache.insert(
                c.fingerprint(),
                CvOutcome::from_scores(c, vec![score], ScoreDirection::Maximize),
            );
        }
        cache.insert(
            config(4).fingerprint(),
            CvOutcome::failed(config(4), EstimatorError::Fit("boom".into())),
        );

        let fitness: Vec<f64> = cache.snapshot().iter().map(|o| o.fitness).collect();
        assert_eq!(fitness, vec![0.9, 0.5, 0.2, WORST_FITNESS]);
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.fitness("k=2"), Some(0.9));
        assert_eq!(cache.fitness("k=9"), None);
    }
}
