//! Cross-validated, cached fitness evaluation.

use super::cache::{CvOutcome, EvaluationCache};
use super::{FitnessFunction, ScoreDirection};
use crate::error::EstimatorError;
use crate::estimator::{CrossValidator, Estimator, Split};
use crate::space::Configuration;
use log::{trace, warn};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// Scores configurations by cross-validating a template estimator.
///
/// For each configuration not yet in the cache, the template is cloned,
/// configured with [`Estimator::set_params`], then fitted and scored on
/// every split of the cross-validator. The fold scores are averaged and
/// normalized by the [`ScoreDirection`].
///
/// Estimator errors, empty split lists, non-finite means and timeouts all
/// yield [`WORST_FITNESS`](super::WORST_FITNESS); they are logged and cached,
/// never propagated.
pub struct FitnessEvaluator<E, C> {
    template: E,
    cv: C,
    direction: ScoreDirection,
    timeout: Option<Duration>,
    cache: EvaluationCache,
    estimator_calls: AtomicUsize,
    failures: AtomicUsize,
}

impl<E, C> FitnessEvaluator<E, C>
where
    E: Estimator,
    C: CrossValidator<E::Input, E::Target>,
{
    /// Creates an evaluator with an empty cache.
    pub fn new(template: E, cv: C) -> Self {
        Self {
            template,
            cv,
            direction: ScoreDirection::default(),
            timeout: None,
            cache: EvaluationCache::new(),
            estimator_calls: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
        }
    }

    /// Sets the score direction.
    pub fn with_direction(mut self, direction: ScoreDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Bounds the wall-clock time of a single cross-validation run.
    ///
    /// A run exceeding the limit scores [`WORST_FITNESS`](super::WORST_FITNESS).
    /// Its worker thread is detached and left to finish in the background.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn direction(&self) -> ScoreDirection {
        self.direction
    }

    /// Number of distinct configurations evaluated so far.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Number of cross-validation runs actually executed (cache misses).
    pub fn estimator_calls(&self) -> usize {
        self.estimator_calls.load(Ordering::Relaxed)
    }

    /// Number of cross-validation runs that ended in the sentinel fitness.
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }

    /// Cached outcome for `config`, if it has been evaluated.
    pub fn outcome(&self, config: &Configuration) -> Option<CvOutcome> {
        self.cache.get(&config.fingerprint())
    }

    /// Every outcome of the run, best first.
    pub fn results(&self) -> Vec<CvOutcome> {
        self.cache.snapshot()
    }

    pub fn template(&self) -> &E {
        &self.template
    }
}

impl<E, C> FitnessEvaluator<E, C>
where
    E: Estimator + Clone + Send + 'static,
    E::Input: Send + 'static,
    E::Target: Send + 'static,
    C: CrossValidator<E::Input, E::Target>,
{
    fn cross_validate(&self, config: &Configuration) -> Result<Vec<f64>, EstimatorError> {
        let splits = self.cv.splits();
        let Some(limit) = self.timeout else {
            return run_folds(self.template.clone(), config, &splits);
        };

        let estimator = self.template.clone();
        let config = config.clone();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            // The receiver is gone if we already timed out.
            let _ = tx.send(run_folds(estimator, &config, &splits));
        });
        match rx.recv_timeout(limit) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(EstimatorError::Timeout(limit.as_millis())),
            Err(RecvTimeoutError::Disconnected) => {
                Err(EstimatorError::Fit("evaluation worker panicked".into()))
            }
        }
    }
}

impl<E, C> FitnessFunction for FitnessEvaluator<E, C>
where
    E: Estimator + Clone + Send + Sync + 'static,
    E::Input: Send + 'static,
    E::Target: Send + 'static,
    C: CrossValidator<E::Input, E::Target>,
{
    fn evaluate(&self, config: &Configuration) -> f64 {
        let key = config.fingerprint();
        if let Some(fitness) = self.cache.fitness(&key) {
            trace!("cache hit for {key}");
            return fitness;
        }

        self.estimator_calls.fetch_add(1, Ordering::Relaxed);
        let outcome = match self.cross_validate(config) {
            Ok(scores) => CvOutcome::from_scores(config.clone(), scores, self.direction),
            Err(e) => CvOutcome::failed(config.clone(), e),
        };
        if let Some(err) = &outcome.error {
            self.failures.fetch_add(1, Ordering::Relaxed);
            warn!("configuration {key} failed ({err}); assigning worst fitness");
        }

        let fitness = outcome.fitness;
        self.cache.insert(key, outcome);
        fitness
    }
}

/// Configures `estimator`, then fits and scores a fresh clone on each split.
pub(crate) fn run_folds<E>(
    mut estimator: E,
    config: &Configuration,
    splits: &[Split<E::Input, E::Target>],
) -> Result<Vec<f64>, EstimatorError>
where
    E: Estimator + Clone,
{
    estimator.set_params(config)?;
    splits
        .iter()
        .map(|split| {
            let mut fold = estimator.clone();
            fold.fit(&split.train_x, &split.train_y)?;
            fold.score(&split.valid_x, &split.valid_y)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::FixedFolds;
    use crate::fitness::WORST_FITNESS;
    use std::sync::Arc;

    /// Predicts a constant `bias`; scores negative absolute error.
    #[derive(Clone)]
    struct ConstantModel {
        bias: f64,
        fits: Arc<AtomicUsize>,
        delay: Duration,
    }

    impl ConstantModel {
        fn new() -> Self {
            Self {
                bias: 0.0,
                fits: Arc::new(AtomicUsize::new(0)),
                delay: Duration::ZERO,
            }
        }
    }

    impl Estimator for ConstantModel {
        type Input = Vec<f64>;
        type Target = Vec<f64>;

        fn set_params(&mut self, config: &Configuration) -> Result<(), EstimatorError> {
            self.bias = config
                .get("bias")
                .and_then(|v| v.as_float())
                .ok_or_else(|| EstimatorError::InvalidParams("bias missing".into()))?;
            Ok(())
        }

        fn fit(&mut self, _x: &Vec<f64>, _y: &Vec<f64>) -> Result<(), EstimatorError> {
            self.fits.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.delay);
            if self.bias < 0.0 {
                return Err(EstimatorError::Fit("negative bias".into()));
            }
            Ok(())
        }

        fn score(&self, _x: &Vec<f64>, y: &Vec<f64>) -> Result<f64, EstimatorError> {
            Ok(-y.iter().map(|t| (t - self.bias).abs()).sum::<f64>() / y.len() as f64)
        }
    }

    fn folds() -> FixedFolds<Vec<f64>, Vec<f64>> {
        FixedFolds::new(vec![
            Split::new(vec![0.0], vec![1.0], vec![0.0], vec![1.0]),
            Split::new(vec![0.0], vec![1.0], vec![0.0], vec![3.0]),
        ])
    }

    fn bias(b: f64) -> Configuration {
        let mut c = Configuration::new();
        c.insert("bias", b);
        c
    }

    #[test]
    fn test_mean_of_folds() {
        let evaluator = FitnessEvaluator::new(ConstantModel::new(), folds());
        // Fold errors are 1 and 1 at bias 2.
        assert!((evaluator.evaluate(&bias(2.0)) + 1.0).abs() < 1e-12);
        let outcome = evaluator.outcome(&bias(2.0)).unwrap();
        assert_eq!(outcome.fold_scores, vec![-1.0, -1.0]);
    }

    #[test]
    fn test_cache_prevents_refit() {
        let model = ConstantModel::new();
        let fits = model.fits.clone();
        let evaluator = FitnessEvaluator::new(model, folds());

        let first = evaluator.evaluate(&bias(1.0));
        let second = evaluator.evaluate(&bias(1.0));

        assert_eq!(first, second);
        assert_eq!(fits.load(Ordering::SeqCst), 2, "one fit per fold, once");
        assert_eq!(evaluator.estimator_calls(), 1);
        assert_eq!(evaluator.cache_len(), 1);
    }

    #[test]
    fn test_fit_failure_gives_sentinel() {
        let evaluator = FitnessEvaluator::new(ConstantModel::new(), folds());
        assert_eq!(evaluator.evaluate(&bias(-1.0)), WORST_FITNESS);
        assert_eq!(evaluator.failures(), 1);
        let outcome = evaluator.outcome(&bias(-1.0)).unwrap();
        assert!(matches!(outcome.error, Some(EstimatorError::Fit(_))));
    }

    #[test]
    fn test_set_params_failure_gives_sentinel() {
        let evaluator = FitnessEvaluator::new(ConstantModel::new(), folds());
        let mut config = Configuration::new();
        config.insert("other", 1);
        assert_eq!(evaluator.evaluate(&config), WORST_FITNESS);
        assert_eq!(evaluator.failures(), 1);
    }

    #[test]
    fn test_minimize_direction() {
        let evaluator =
            FitnessEvaluator::new(ConstantModel::new(), folds()).with_direction(ScoreDirection::Minimize);
        assert!((evaluator.evaluate(&bias(2.0)) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_splits_is_failure() {
        let evaluator = FitnessEvaluator::new(ConstantModel::new(), FixedFolds::new(vec![]));
        assert_eq!(evaluator.evaluate(&bias(1.0)), WORST_FITNESS);
        assert_eq!(evaluator.failures(), 1);
    }

    #[test]
    fn test_timeout_gives_sentinel() {
        let mut model = ConstantModel::new();
        model.delay = Duration::from_millis(200);
        let evaluator = FitnessEvaluator::new(model, folds()).with_timeout(Duration::from_millis(10));
        assert_eq!(evaluator.evaluate(&bias(1.0)), WORST_FITNESS);
        let outcome = evaluator.outcome(&bias(1.0)).unwrap();
        assert!(matches!(outcome.error, Some(EstimatorError::Timeout(10))));
    }

    #[test]
    fn test_timeout_not_hit() {
        let evaluator =
            FitnessEvaluator::new(ConstantModel::new(), folds()).with_timeout(Duration::from_secs(5));
        assert!((evaluator.evaluate(&bias(2.0)) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_results_best_first() {
        let evaluator = FitnessEvaluator::new(ConstantModel::new(), folds());
        for b in [0.0, 2.0, 5.0, -1.0] {
            evaluator.evaluate(&bias(b));
        }
        let results = evaluator.results();
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].configuration, bias(2.0));
        assert!(results[3].is_failed());
    }
}
