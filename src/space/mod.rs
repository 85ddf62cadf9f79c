//! Parameter space descriptor.
//!
//! Declares the tunable hyperparameters and their domains, and provides the
//! domain-aware operations the evolutionary engine relies on:
//!
//! - [`ParameterSpace::sample`]: one random valid value per parameter
//! - [`ParameterSpace::mutate`]: a neighbouring valid gene for one slot
//! - [`ParameterSpace::encode`] / [`ParameterSpace::decode`]: exact,
//!   mutually inverse configuration ⇄ genome mapping
//!
//! # Domains
//!
//! | Kind | Genome slot | Mutation |
//! |------|-------------|----------|
//! | [`Domain::Categorical`] | option index | uniform among other options |
//! | [`Domain::IntRange`] | raw value | bounded integer step, clipped |
//! | [`Domain::FloatRange`] | raw value | bounded perturbation (log space if `log`), clipped |

mod codec;
mod configuration;
mod domain;
mod parameter_space;
mod value;

pub use codec::{Gene, Genome};
pub use configuration::Configuration;
pub use domain::{Domain, Parameter};
pub use parameter_space::{ParameterSpace, DEFAULT_MUTATION_SCALE};
pub use value::ParamValue;
