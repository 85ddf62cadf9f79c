//! The ordered parameter space.

use super::codec::Gene;
use super::configuration::Configuration;
use super::domain::{Domain, Parameter};
use super::value::ParamValue;
use crate::error::{Result, SearchError};
use rand::Rng;
use std::collections::HashMap;

/// Default relative perturbation radius for numeric mutation.
pub const DEFAULT_MUTATION_SCALE: f64 = 0.1;

/// Ordered set of uniquely named hyperparameters.
///
/// Parameter order defines the genome layout: slot `i` of every genome
/// corresponds to the `i`-th parameter added.
///
/// # Examples
///
/// ```
/// use evogrid::space::{Domain, ParameterSpace};
///
/// let space = ParameterSpace::from_domains([
///     ("n_estimators", Domain::int_range(10, 100)),
///     ("max_depth", Domain::categorical([Some(3), Some(5), Some(7), None])),
/// ])
/// .unwrap();
/// assert_eq!(space.names().collect::<Vec<_>>(), ["n_estimators", "max_depth"]);
/// ```
#[derive(Debug, Clone)]
pub struct ParameterSpace {
    params: Vec<Parameter>,
    index: HashMap<String, usize>,
    mutation_scale: f64,
}

impl Default for ParameterSpace {
    fn default() -> Self {
        Self {
            params: Vec::new(),
            index: HashMap::new(),
            mutation_scale: DEFAULT_MUTATION_SCALE,
        }
    }
}

impl PartialEq for ParameterSpace {
    fn eq(&self, other: &Self) -> bool {
        self.params == other.params && self.mutation_scale == other.mutation_scale
    }
}

impl ParameterSpace {
    /// Creates an empty space.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a space from an ordered `(name, domain)` sequence.
    pub fn from_domains<I, S>(domains: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Domain)>,
        S: Into<String>,
    {
        let mut space = Self::new();
        for (name, domain) in domains {
            space.add(name, domain)?;
        }
        Ok(space)
    }

    /// Appends a parameter after validating its domain.
    pub fn add(&mut self, name: impl Into<String>, domain: Domain) -> Result<()> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(SearchError::domain(name, "duplicate parameter name"));
        }
        domain.validate(&name)?;
        self.index.insert(name.clone(), self.params.len());
        self.params.push(Parameter { name, domain });
        Ok(())
    }

    /// Sets the relative perturbation radius used by [`mutate`](Self::mutate).
    ///
    /// Clamped to `[0, 1]`; `NaN` falls back to [`DEFAULT_MUTATION_SCALE`].
    pub fn with_mutation_scale(mut self, scale: f64) -> Self {
        self.mutation_scale = if scale.is_nan() {
            DEFAULT_MUTATION_SCALE
        } else {
            scale.clamp(0.0, 1.0)
        };
        self
    }

    pub fn mutation_scale(&self) -> f64 {
        self.mutation_scale
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameter names in genome order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    /// Parameters in genome order.
    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.index.get(name).map(|&i| &self.params[i])
    }

    /// Genome slot of `name`.
    pub fn slot(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Number of points an exhaustive grid over this space would visit.
    ///
    /// `None` when a real range is present or the product overflows.
    pub fn grid_size(&self) -> Option<u128> {
        self.params
            .iter()
            .try_fold(1u128, |acc, p| acc.checked_mul(p.domain.cardinality()?))
    }

    /// Draws one random valid value per parameter.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Configuration {
        self.params
            .iter()
            .map(|p| {
                let gene = p.domain.sample_gene(rng);
                let value = p
                    .domain
                    .decode_gene(&gene)
                    .unwrap_or(ParamValue::None);
                (p.name.clone(), value)
            })
            .collect()
    }

    /// Mutates the gene in `slot` to a neighbouring in-domain gene.
    ///
    /// # Panics
    /// Panics if `slot` is out of bounds.
    pub fn mutate<R: Rng>(&self, slot: usize, gene: &Gene, rng: &mut R) -> Gene {
        self.params[slot]
            .domain
            .mutate_gene(gene, self.mutation_scale, rng)
    }

    /// Value-level form of [`mutate`](Self::mutate).
    pub fn mutate_value<R: Rng>(&self, name: &str, value: &ParamValue, rng: &mut R) -> Result<ParamValue> {
        let param = self
            .get(name)
            .ok_or_else(|| SearchError::domain(name, "unknown parameter"))?;
        let gene = param
            .domain
            .encode_value(value)
            .ok_or_else(|| SearchError::domain(name, format!("value {value} out of domain")))?;
        let mutated = param.domain.mutate_gene(&gene, self.mutation_scale, rng);
        param
            .domain
            .decode_gene(&mutated)
            .ok_or_else(|| SearchError::decode(name, format!("{mutated:?} not in domain")))
    }

    /// Returns `true` if `config` assigns every parameter an in-domain value
    /// and names no unknown parameters.
    pub fn contains(&self, config: &Configuration) -> bool {
        self.validate(config).is_ok()
    }

    /// Checks `config` against the space, naming the first offending
    /// parameter.
    pub fn validate(&self, config: &Configuration) -> Result<()> {
        for p in &self.params {
            match config.get(&p.name) {
                Some(v) if p.domain.contains(v) => {}
                Some(v) => {
                    return Err(SearchError::domain(&p.name, format!("value {v} out of domain")))
                }
                None => return Err(SearchError::domain(&p.name, "missing from configuration")),
            }
        }
        if let Some((unknown, _)) = config.iter().find(|(name, _)| !self.index.contains_key(*name)) {
            return Err(SearchError::domain(unknown, "unknown parameter"));
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::*;
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::fmt;

    impl Serialize for ParameterSpace {
        fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(self.params.len()))?;
            for p in &self.params {
                map.serialize_entry(&p.name, &p.domain)?;
            }
            map.end()
        }
    }

    struct SpaceVisitor;

    impl<'de> Visitor<'de> for SpaceVisitor {
        type Value = ParameterSpace;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map from parameter name to domain")
        }

        // Entries are added as they arrive, so document order becomes genome order.
        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
            let mut space = ParameterSpace::new();
            while let Some((name, domain)) = map.next_entry::<String, Domain>()? {
                space.add(name, domain).map_err(serde::de::Error::custom)?;
            }
            Ok(space)
        }
    }

    impl<'de> Deserialize<'de> for ParameterSpace {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
            deserializer.deserialize_map(SpaceVisitor)
        }
    }
}
