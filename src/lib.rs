//! Genetic-algorithm hyperparameter search.
//!
//! A drop-in alternative to exhaustive grid search: instead of
//! cross-validating every point of a parameter grid, a genetic algorithm
//! evolves a population of configurations and cross-validates only the
//! ones it visits, each at most once per run.
//!
//! - **Parameter space** ([`space`]): categorical, integer and real
//!   (optionally log-scaled) domains, sampling, domain-respecting mutation,
//!   and the configuration ⇄ genome codec.
//! - **Fitness** ([`fitness`]): cross-validated, cached scoring of a
//!   configuration; failures get a sentinel worst fitness instead of
//!   aborting the run.
//! - **Genetic Algorithm** ([`ga`]): selection, crossover, mutation,
//!   elitism and the termination controller.
//! - **Estimator adapter** ([`estimator`]): the `set_params` / `fit` /
//!   `score` capability set and the cross-validation split supplier.
//! - **Search** ([`search`]): [`EvolutionarySearch`] wires all of the
//!   above together and refits the winner.
//!
//! # Example
//!
//! ```
//! use evogrid::ga::{GaRunner, SearchConfig};
//! use evogrid::space::{Configuration, Domain, ParamValue, ParameterSpace};
//!
//! let space = ParameterSpace::from_domains([
//!     ("n_estimators", Domain::int_range(10, 100)),
//!     ("max_depth", Domain::categorical([Some(3), Some(5), Some(7), None])),
//! ])
//! .unwrap();
//!
//! // Synthetic objective peaking at n_estimators = 60, max_depth = 5.
//! let objective = |c: &Configuration| {
//!     let n = c.get("n_estimators").and_then(ParamValue::as_int).unwrap_or(0);
//!     let depth_penalty = match c.get("max_depth").and_then(ParamValue::as_int) {
//!         Some(5) => 0.0,
//!         _ => 10.0,
//!     };
//!     -((n - 60).abs() as f64) - depth_penalty
//! };
//!
//! let config = SearchConfig::default()
//!     .with_population_size(10)
//!     .with_max_generations(5)
//!     .with_seed(42);
//! let result = GaRunner::run(&space, &objective, &config).unwrap();
//!
//! assert!(space.contains(&result.best_configuration));
//! assert_eq!(result.history.len(), 6);
//! ```
//!
//! # Logging
//!
//! Progress is reported through the [`log`] facade; install any logger
//! (e.g. `env_logger`) to see it.

pub mod error;
pub mod estimator;
pub mod fitness;
pub mod ga;
pub mod random;
pub mod search;
pub mod space;

pub use error::{EstimatorError, Result, SearchError};
pub use search::{EvolutionarySearch, SearchOutcome};
