//! Genetic algorithm over parameter-space genomes.
//!
//! The engine evolves positional genomes (one [`Gene`](crate::space::Gene)
//! per parameter) and only ever sees fitness through
//! [`FitnessFunction`](crate::fitness::FitnessFunction), so it knows nothing
//! about estimators or cross-validation.
//!
//! # Key Types
//!
//! - [`SearchConfig`]: Algorithm parameters (population size, rates, presets)
//! - [`GaRunner`]: Executes the evolutionary loop
//! - [`SearchResult`]: Best configuration, stop reason, per-generation statistics
//! - [`Termination`]: Generation, plateau, time and evaluation budgets
//!
//! # Loop
//!
//! 1. Sample and evaluate the initial population (generation 0)
//! 2. Check termination; stop or continue
//! 3. Select parents, apply crossover and per-slot mutation
//! 4. Keep the `n_elite` best individuals, fill the rest with offspring
//! 5. Evaluate new individuals and go back to 2
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*
//! - De Jong (2006), *Evolutionary Computation: A Unified Approach*

mod config;
mod operators;
mod runner;
mod selection;
mod termination;
mod types;

pub use config::SearchConfig;
#[cfg(feature = "serde")]
pub use config::SearchSpec;
pub use operators::{mutate_genome, Crossover};
pub use runner::{GaRunner, SearchResult};
pub use selection::Selection;
pub use termination::{StopReason, Termination};
pub use types::{GenerationStats, Individual};
