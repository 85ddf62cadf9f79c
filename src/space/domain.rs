//! Parameter domains: sampling, membership and domain-respecting mutation.

use super::codec::Gene;
use super::value::ParamValue;
use crate::error::{Result, SearchError};
use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The set of values a hyperparameter may take.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(from = "DomainSpec", into = "DomainSpec")
)]
pub enum Domain {
    /// A finite list of distinct options.
    Categorical(Vec<ParamValue>),

    /// Integers in `[low, high]`.
    IntRange { low: i64, high: i64 },

    /// Reals in `[low, high]`, sampled log-uniformly when `log` is set.
    FloatRange { low: f64, high: f64, log: bool },
}

impl Domain {
    /// Categorical domain from anything convertible to [`ParamValue`].
    pub fn categorical<I, V>(options: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        Domain::Categorical(options.into_iter().map(Into::into).collect())
    }

    pub fn int_range(low: i64, high: i64) -> Self {
        Domain::IntRange { low, high }
    }

    pub fn float_range(low: f64, high: f64) -> Self {
        Domain::FloatRange {
            low,
            high,
            log: false,
        }
    }

    /// Real range sampled and perturbed in log space. Requires `low > 0`.
    pub fn log_float_range(low: f64, high: f64) -> Self {
        Domain::FloatRange {
            low,
            high,
            log: true,
        }
    }

    /// Checks the domain invariants, naming `parameter` on failure.
    pub fn validate(&self, parameter: &str) -> Result<()> {
        match self {
            Domain::Categorical(options) => {
                if options.is_empty() {
                    return Err(SearchError::domain(parameter, "empty option list"));
                }
                for (i, option) in options.iter().enumerate() {
                    if matches!(option, ParamValue::Float(v) if v.is_nan()) {
                        return Err(SearchError::domain(parameter, "NaN is not a valid option"));
                    }
                    if options[..i].contains(option) {
                        return Err(SearchError::domain(
                            parameter,
                            format!("duplicate option {option}"),
                        ));
                    }
                }
            }
            Domain::IntRange { low, high } => {
                if low > high {
                    return Err(SearchError::domain(
                        parameter,
                        format!("low ({low}) > high ({high})"),
                    ));
                }
            }
            Domain::FloatRange { low, high, log } => {
                if !low.is_finite() || !high.is_finite() {
                    return Err(SearchError::domain(parameter, "bounds must be finite"));
                }
                if low > high {
                    return Err(SearchError::domain(
                        parameter,
                        format!("low ({low}) > high ({high})"),
                    ));
                }
                if !(high - low).is_finite() {
                    return Err(SearchError::domain(
                        parameter,
                        format!("range width {low}..{high} overflows f64"),
                    ));
                }
                if *log && *low <= 0.0 {
                    return Err(SearchError::domain(
                        parameter,
                        "log-scaled range requires low > 0",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Returns `true` if `value` lies inside the domain.
    pub fn contains(&self, value: &ParamValue) -> bool {
        match (self, value) {
            (Domain::Categorical(options), v) => options.contains(v),
            (Domain::IntRange { low, high }, ParamValue::Int(v)) => low <= v && v <= high,
            (Domain::FloatRange { low, high, .. }, ParamValue::Float(v)) => {
                *low <= *v && *v <= *high
            }
            _ => false,
        }
    }

    /// Number of distinct values, or `None` for real ranges.
    pub fn cardinality(&self) -> Option<u128> {
        match self {
            Domain::Categorical(options) => Some(options.len() as u128),
            Domain::IntRange { low, high } => Some((*high as i128 - *low as i128 + 1) as u128),
            Domain::FloatRange { .. } => None,
        }
    }

    /// Draws a uniformly random gene (log-uniform for log-scaled ranges).
    pub fn sample_gene<R: Rng>(&self, rng: &mut R) -> Gene {
        match self {
            Domain::Categorical(options) => Gene::Index(rng.random_range(0..options.len())),
            Domain::IntRange { low, high } => Gene::Int(rng.random_range(*low..=*high)),
            Domain::FloatRange { low, high, log } => {
                let v = if *log {
                    rng.random_range(low.ln()..=high.ln()).exp()
                } else {
                    let u: f64 = rng.random();
                    low + u * high - u * low
                };
                Gene::Float(v.clamp(*low, *high))
            }
        }
    }

    /// Produces a neighbouring gene inside the domain.
    ///
    /// - Categorical: uniform pick among the other options.
    /// - Integer: step of `±[1, r]`, `r = max(1, round(scale · width))`,
    ///   clipped to the range.
    /// - Real: uniform perturbation within `±scale · width` (log space for
    ///   log-scaled ranges), clipped to the range.
    ///
    /// Single-valued domains and mismatched gene kinds return `gene`
    /// unchanged.
    pub fn mutate_gene<R: Rng>(&self, gene: &Gene, scale: f64, rng: &mut R) -> Gene {
        match (self, gene) {
            (Domain::Categorical(options), Gene::Index(current)) => {
                let n = options.len();
                if n < 2 || *current >= n {
                    return gene.clone();
                }
                // Draw from n-1 slots and skip over the current index.
                let pick = rng.random_range(0..n - 1);
                Gene::Index(if pick >= *current { pick + 1 } else { pick })
            }
            (Domain::IntRange { low, high }, Gene::Int(v)) => {
                let width = *high as i128 - *low as i128;
                if width == 0 {
                    return gene.clone();
                }
                let radius = ((scale * width as f64).round() as i128).clamp(1, width);
                let step = rng.random_range(1..=radius);
                let next = if rng.random_bool(0.5) {
                    *v as i128 + step
                } else {
                    *v as i128 - step
                };
                Gene::Int(next.clamp(*low as i128, *high as i128) as i64)
            }
            (Domain::FloatRange { low, high, log }, Gene::Float(v)) => {
                if low == high {
                    return gene.clone();
                }
                let next = if *log {
                    let radius = scale * (high.ln() - low.ln());
                    (v.max(*low).ln() + rng.random_range(-radius..=radius)).exp()
                } else {
                    // Each term stays finite even when `high - low` would not.
                    let t = scale * (2.0 * rng.random::<f64>() - 1.0);
                    v + t * high - t * low
                };
                Gene::Float(next.clamp(*low, *high))
            }
            _ => gene.clone(),
        }
    }
}

/// A named hyperparameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub domain: Domain,
}

// ---------------------------------------------------------------------------
// Serialized form
// ---------------------------------------------------------------------------

/// Wire form: `{"categorical": [..]}`, `{"int_range": [lo, hi]}`,
/// `{"float_range": [lo, hi]}` or `{"float_range": {"low", "high", "log"}}`.
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DomainSpec {
    Categorical(Vec<ParamValue>),
    IntRange(i64, i64),
    FloatRange(FloatSpec),
}

#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum FloatSpec {
    Bounds(f64, f64),
    Full {
        low: f64,
        high: f64,
        #[serde(default)]
        log: bool,
    },
}

#[cfg(feature = "serde")]
impl From<DomainSpec> for Domain {
    fn from(spec: DomainSpec) -> Self {
        match spec {
            DomainSpec::Categorical(options) => Domain::Categorical(options),
            DomainSpec::IntRange(low, high) => Domain::IntRange { low, high },
            DomainSpec::FloatRange(FloatSpec::Bounds(low, high)) => Domain::float_range(low, high),
            DomainSpec::FloatRange(FloatSpec::Full { low, high, log }) => {
                Domain::FloatRange { low, high, log }
            }
        }
    }
}

#[cfg(feature = "serde")]
impl From<Domain> for DomainSpec {
    fn from(domain: Domain) -> Self {
        match domain {
            Domain::Categorical(options) => DomainSpec::Categorical(options),
            Domain::IntRange { low, high } => DomainSpec::IntRange(low, high),
            Domain::FloatRange { low, high, log } => {
                DomainSpec::FloatRange(FloatSpec::Full { low, high, log })
            }
        }
    }
}
