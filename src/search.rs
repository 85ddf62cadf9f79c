//! Evolutionary replacement for an exhaustive grid-search wrapper.
//!
//! [`EvolutionarySearch`] ties a template [`Estimator`], a
//! [`ParameterSpace`] and a [`CrossValidator`] to the GA engine. Each call to
//! [`fit`](EvolutionarySearch::fit) runs one search with a fresh evaluation
//! cache; [`refit`](EvolutionarySearch::refit) trains the template with the
//! winning configuration on the full data set.

use crate::error::Result;
use crate::estimator::{CrossValidator, Estimator};
use crate::fitness::{CvOutcome, FitnessEvaluator, ScoreDirection};
use crate::ga::{GaRunner, SearchConfig, SearchResult};
use crate::space::{Configuration, ParameterSpace};
use log::info;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "serde")]
use crate::ga::SearchSpec;

/// Outcome of [`EvolutionarySearch::fit`].
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Engine result: best configuration, stop reason, history.
    pub result: SearchResult,

    /// One entry per distinct configuration evaluated, best first.
    pub cv_results: Vec<CvOutcome>,

    /// Cross-validation runs actually executed (cache misses).
    pub estimator_calls: usize,

    /// Cross-validation runs that failed.
    pub failures: usize,
}

impl SearchOutcome {
    pub fn best_params(&self) -> &Configuration {
        &self.result.best_configuration
    }

    /// Best fitness on the greater-is-better scale.
    pub fn best_fitness(&self) -> f64 {
        self.result.best_fitness
    }

    /// CV outcome of the best configuration.
    pub fn best_outcome(&self) -> Option<&CvOutcome> {
        self.cv_results
            .iter()
            .find(|o| o.configuration == self.result.best_configuration)
    }

    /// Mean raw CV score of the best configuration, before direction
    /// normalization. `None` if every evaluation failed.
    pub fn best_score(&self) -> Option<f64> {
        self.best_outcome().and_then(CvOutcome::mean_score)
    }
}

/// Hyperparameter search driven by a genetic algorithm.
///
/// # Examples
///
/// ```
/// use evogrid::error::EstimatorError;
/// use evogrid::estimator::{Estimator, FixedFolds, Split};
/// use evogrid::ga::SearchConfig;
/// use evogrid::search::EvolutionarySearch;
/// use evogrid::space::{Configuration, Domain, ParameterSpace};
///
/// /// Scores best when `k` is 4.
/// #[derive(Clone, Default)]
/// struct Toy { k: i64 }
///
/// impl Estimator for Toy {
///     type Input = ();
///     type Target = ();
///     fn set_params(&mut self, c: &Configuration) -> Result<(), EstimatorError> {
///         self.k = c.get("k").and_then(|v| v.as_int()).unwrap_or(0);
///         Ok(())
///     }
///     fn fit(&mut self, _: &(), _: &()) -> Result<(), EstimatorError> { Ok(()) }
///     fn score(&self, _: &(), _: &()) -> Result<f64, EstimatorError> {
///         Ok(-((self.k - 4) as f64).abs())
///     }
/// }
///
/// let space = ParameterSpace::from_domains([("k", Domain::int_range(0, 9))]).unwrap();
/// let folds = FixedFolds::new(vec![Split::new((), (), (), ())]);
/// let search = EvolutionarySearch::new(Toy::default(), space, folds)
///     .with_config(SearchConfig::default().with_max_generations(20).with_seed(7));
///
/// let outcome = search.fit().unwrap();
/// assert_eq!(outcome.best_params().get("k").and_then(|v| v.as_int()), Some(4));
/// ```
pub struct EvolutionarySearch<E, C> {
    estimator: E,
    space: ParameterSpace,
    cv: C,
    config: SearchConfig,
    direction: ScoreDirection,
    timeout: Option<Duration>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<E, C> EvolutionarySearch<E, C>
where
    E: Estimator + Clone + Send + Sync + 'static,
    E::Input: Send + 'static,
    E::Target: Send + 'static,
    C: CrossValidator<E::Input, E::Target> + Clone,
{
    /// Creates a search with [`SearchConfig::default`] and a maximized score.
    pub fn new(estimator: E, space: ParameterSpace, cv: C) -> Self {
        Self {
            estimator,
            space,
            cv,
            config: SearchConfig::default(),
            direction: ScoreDirection::default(),
            timeout: None,
            cancel: None,
        }
    }

    /// Builds a search from a deserialized [`SearchSpec`].
    #[cfg(feature = "serde")]
    pub fn from_spec(estimator: E, spec: SearchSpec, cv: C) -> Self {
        Self::new(estimator, spec.space, cv)
            .with_config(spec.search)
            .with_direction(spec.scoring)
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_direction(mut self, direction: ScoreDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Bounds the wall-clock time of each cross-validation run.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Stops the search before the next generation once `flag` is set.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    /// Runs one search with a fresh evaluation cache.
    pub fn fit(&self) -> Result<SearchOutcome> {
        let mut evaluator =
            FitnessEvaluator::new(self.estimator.clone(), self.cv.clone()).with_direction(self.direction);
        if let Some(timeout) = self.timeout {
            evaluator = evaluator.with_timeout(timeout);
        }

        let result = GaRunner::run_with_cancel(&self.space, &evaluator, &self.config, self.cancel.clone())?;

        let estimator_calls = evaluator.estimator_calls();
        let failures = evaluator.failures();
        match self.space.grid_size() {
            Some(grid) => info!(
                "{estimator_calls} distinct configurations cross-validated ({failures} failed); exhaustive grid has {grid}"
            ),
            None => info!("{estimator_calls} distinct configurations cross-validated ({failures} failed)"),
        }

        Ok(SearchOutcome {
            result,
            cv_results: evaluator.results(),
            estimator_calls,
            failures,
        })
    }

    /// Configures a clone of the template with the best parameters of
    /// `outcome` and fits it on `(x, y)`.
    pub fn refit(&self, outcome: &SearchOutcome, x: &E::Input, y: &E::Target) -> Result<E> {
        let mut estimator = self.estimator.clone();
        estimator.set_params(outcome.best_params())?;
        estimator.fit(x, y)?;
        Ok(estimator)
    }

    /// Runs [`fit`](Self::fit) then [`refit`](Self::refit).
    pub fn fit_refit(&self, x: &E::Input, y: &E::Target) -> Result<(SearchOutcome, E)> {
        let outcome = self.fit()?;
        let estimator = self.refit(&outcome, x, y)?;
        Ok((outcome, estimator))
    }
}
