//! Configuration ⇄ genome mapping.
//!
//! A genome has one [`Gene`] per parameter, in parameter-space order.
//! Categorical slots store the index of the chosen option; numeric slots
//! store the value itself, so decoding is exact.

use super::configuration::Configuration;
use super::domain::Domain;
use super::parameter_space::ParameterSpace;
use super::value::ParamValue;
use crate::error::{Result, SearchError};

/// One encoded parameter slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Gene {
    /// Index into a categorical option list.
    Index(usize),
    Int(i64),
    Float(f64),
}

/// Positional encoding of a configuration.
pub type Genome = Vec<Gene>;

impl Domain {
    /// Encodes an in-domain value. Returns `None` for out-of-domain values.
    pub fn encode_value(&self, value: &ParamValue) -> Option<Gene> {
        if !self.contains(value) {
            return None;
        }
        match (self, value) {
            (Domain::Categorical(options), v) => options.iter().position(|o| o == v).map(Gene::Index),
            (Domain::IntRange { .. }, ParamValue::Int(v)) => Some(Gene::Int(*v)),
            (Domain::FloatRange { .. }, ParamValue::Float(v)) => Some(Gene::Float(*v)),
            _ => None,
        }
    }

    /// Decodes a gene. Returns `None` for wrong kinds or out-of-range slots.
    pub fn decode_gene(&self, gene: &Gene) -> Option<ParamValue> {
        let value = match (self, gene) {
            (Domain::Categorical(options), Gene::Index(i)) => options.get(*i)?.clone(),
            (Domain::IntRange { .. }, Gene::Int(v)) => ParamValue::Int(*v),
            (Domain::FloatRange { .. }, Gene::Float(v)) => ParamValue::Float(*v),
            _ => return None,
        };
        self.contains(&value).then_some(value)
    }
}

impl ParameterSpace {
    /// Encodes a configuration into a genome.
    ///
    /// Fails with [`SearchError::InvalidDomain`] if a parameter is missing,
    /// unknown, or out of its domain.
    pub fn encode(&self, config: &Configuration) -> Result<Genome> {
        self.validate(config)?;
        self.parameters()
            .map(|p| {
                let value = config
                    .get(&p.name)
                    .ok_or_else(|| SearchError::domain(&p.name, "missing from configuration"))?;
                p.domain
                    .encode_value(value)
                    .ok_or_else(|| SearchError::domain(&p.name, format!("value {value} out of domain")))
            })
            .collect()
    }

    /// Decodes a genome back into a configuration.
    ///
    /// Fails with [`SearchError::Decode`] on a slot-count mismatch, a gene
    /// of the wrong kind, or an out-of-range slot.
    pub fn decode(&self, genome: &[Gene]) -> Result<Configuration> {
        if genome.len() != self.len() {
            return Err(SearchError::decode(
                "<genome>",
                format!("expected {} slots, got {}", self.len(), genome.len()),
            ));
        }
        self.parameters()
            .zip(genome)
            .map(|(p, gene)| {
                p.domain
                    .decode_gene(gene)
                    .map(|v| (p.name.clone(), v))
                    .ok_or_else(|| SearchError::decode(&p.name, format!("{gene:?} not in {:?}", p.domain)))
            })
            .collect()
    }
}
