//! Search configuration.
//!
//! [`SearchConfig`] holds all parameters that control the evolutionary loop.

use super::operators::Crossover;
use super::selection::Selection;
use crate::error::{Result, SearchError};
use crate::space::ParameterSpace;

#[cfg(feature = "serde")]
use crate::fitness::ScoreDirection;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for the evolutionary search.
///
/// Controls population size, operators and their rates, elitism,
/// termination conditions, parallelism and seeding.
///
/// # Defaults
///
/// ```
/// use evogrid::ga::SearchConfig;
///
/// let config = SearchConfig::default();
/// assert_eq!(config.population_size, 20);
/// assert_eq!(config.max_generations, 10);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use evogrid::ga::{Crossover, SearchConfig, Selection};
///
/// let config = SearchConfig::default()
///     .with_population_size(50)
///     .with_selection(Selection::Tournament(4))
///     .with_crossover(Crossover::Uniform)
///     .with_elite_count(2)
///     .with_mutation_rate(0.2)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct SearchConfig {
    /// Number of individuals in the population. Constant across generations.
    pub population_size: usize,

    /// Generations to run after the initial population is evaluated.
    ///
    /// 0 evaluates the initial population only.
    pub max_generations: usize,

    /// Per-slot probability of mutating an offspring gene (0.0–1.0).
    pub mutation_rate: f64,

    /// Probability of recombining a parent pair (0.0–1.0).
    ///
    /// When crossover is not applied, the parents are cloned.
    pub crossover_rate: f64,

    /// Individuals carried unchanged into the next generation.
    pub n_elite: usize,

    /// Parents selected per generation. `None` selects `population_size`.
    pub n_select: Option<usize>,

    /// Parent selection strategy.
    pub selection: Selection,

    /// Recombination operator.
    pub crossover: Crossover,

    /// Generations without more than `epsilon` improvement before stopping.
    ///
    /// Set to 0 to disable plateau-based termination.
    pub patience: usize,

    /// Minimum best-fitness gain over `patience` generations that counts as
    /// progress.
    pub epsilon: f64,

    /// Optional wall-clock budget in milliseconds.
    ///
    /// Checked between generations, so the run may exceed it by up to one
    /// generation's worth of evaluations.
    pub time_limit_ms: Option<u64>,

    /// Optional budget on fitness evaluations requested by the engine.
    ///
    /// Checked between generations, like the time limit.
    pub max_evaluations: Option<usize>,

    /// Whether to evaluate a generation in parallel using rayon.
    ///
    /// Has no effect without the `parallel` feature.
    pub parallel: bool,

    /// Random seed for reproducibility.
    ///
    /// `None` draws a random seed, reported in the result.
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            population_size: 20,
            max_generations: 10,
            mutation_rate: 0.1,
            crossover_rate: 0.5,
            n_elite: 1,
            n_select: None,
            selection: Selection::default(),
            crossover: Crossover::default(),
            patience: 0,
            epsilon: 0.0,
            time_limit_ms: None,
            max_evaluations: None,
            parallel: true,
            seed: None,
        }
    }
}

impl SearchConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the maximum number of generations.
    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    /// Sets the per-slot mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the number of elites.
    pub fn with_elite_count(mut self, n: usize) -> Self {
        self.n_elite = n;
        self
    }

    /// Sets the number of parents selected per generation.
    pub fn with_selection_count(mut self, n: usize) -> Self {
        self.n_select = Some(n);
        self
    }

    /// Sets the selection strategy.
    pub fn with_selection(mut self, sel: Selection) -> Self {
        self.selection = sel;
        self
    }

    /// Convenience builder for setting tournament size.
    ///
    /// Equivalent to `.with_selection(Selection::Tournament(k))`.
    pub fn with_tournament_size(self, k: usize) -> Self {
        self.with_selection(Selection::Tournament(k))
    }

    /// Sets the crossover operator.
    pub fn with_crossover(mut self, crossover: Crossover) -> Self {
        self.crossover = crossover;
        self
    }

    /// Sets plateau termination: stop when the best fitness gains no more
    /// than `epsilon` over `patience` generations.
    pub fn with_patience(mut self, patience: usize, epsilon: f64) -> Self {
        self.patience = patience;
        self.epsilon = epsilon.max(0.0);
        self
    }

    /// Sets the wall-clock time limit in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Sets the fitness-evaluation budget.
    pub fn with_max_evaluations(mut self, n: usize) -> Self {
        self.max_evaluations = Some(n);
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Parents selected per generation.
    pub fn selection_count(&self) -> usize {
        self.n_select.unwrap_or(self.population_size)
    }

    /// Preset for quick exploration of small spaces.
    ///
    /// - Population: 10, Generations: 5, Patience: 3
    pub fn fast() -> Self {
        Self {
            population_size: 10,
            max_generations: 5,
            patience: 3,
            ..Self::default()
        }
    }

    /// Preset balancing evaluation cost and coverage.
    ///
    /// - Population: 20, Generations: 15, Patience: 5, Elites: 2
    pub fn balanced() -> Self {
        Self {
            population_size: 20,
            max_generations: 15,
            n_elite: 2,
            patience: 5,
            ..Self::default()
        }
    }

    /// Preset for large spaces where evaluation budget is available.
    ///
    /// - Population: 50, Generations: 40, Patience: 10, Elites: 3
    /// - Epsilon: 1e-4, Mutation rate: 0.2
    pub fn thorough() -> Self {
        Self {
            population_size: 50,
            max_generations: 40,
            n_elite: 3,
            patience: 10,
            epsilon: 1e-4,
            mutation_rate: 0.2,
            ..Self::default()
        }
    }

    /// Selects a preset from the size of the equivalent exhaustive grid.
    ///
    /// - grid `< 1_000` points → [`fast()`](Self::fast)
    /// - grid `< 100_000` points → [`balanced()`](Self::balanced)
    /// - larger grids, or spaces with real ranges → [`thorough()`](Self::thorough)
    pub fn auto_select(space: &ParameterSpace) -> Self {
        match space.grid_size() {
            Some(n) if n < 1_000 => Self::fast(),
            Some(n) if n < 100_000 => Self::balanced(),
            _ => Self::thorough(),
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(SearchError::InvalidConfig(msg.into()));
        if self.population_size < 2 {
            return invalid("population_size must be at least 2");
        }
        if self.n_elite >= self.population_size {
            return invalid("n_elite must be smaller than population_size");
        }
        if self.n_select == Some(0) {
            return invalid("n_select must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return invalid("mutation_rate must be in [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return invalid("crossover_rate must be in [0, 1]");
        }
        if self.selection == Selection::Tournament(0) {
            return invalid("tournament size must be at least 1");
        }
        if self.epsilon.is_nan() || self.epsilon < 0.0 {
            return invalid("epsilon must be non-negative");
        }
        if self.time_limit_ms == Some(0) {
            return invalid("time_limit_ms must be positive or None");
        }
        if self.max_evaluations == Some(0) {
            return invalid("max_evaluations must be positive or None");
        }
        Ok(())
    }
}

/// One-document configuration: the parameter space plus search settings.
///
/// ```
/// # #[cfg(feature = "serde")] {
/// use evogrid::ga::SearchSpec;
///
/// let spec: SearchSpec = serde_json::from_str(r#"{
///     "space": {
///         "n_estimators": {"int_range": [10, 100]},
///         "max_depth": {"categorical": [3, 5, 7, null]}
///     },
///     "search": {"population_size": 10, "max_generations": 5, "seed": 42}
/// }"#).unwrap();
/// assert_eq!(spec.search.population_size, 10);
/// # }
/// ```
#[cfg(feature = "serde")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpec {
    pub space: ParameterSpace,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub scoring: ScoreDirection,
}
