//! Genome-level variation operators.
//!
//! Genomes are positional: slot `i` always encodes parameter `i`. Crossover
//! therefore only exchanges whole slots between parents, and every child is
//! domain-valid whenever both parents are. Mutation delegates to the
//! parameter space, which only produces in-domain genes.
//!
//! # Crossover Operators
//!
//! - [`Crossover::OnePoint`]: swap the tails after a random cut point
//! - [`Crossover::Uniform`]: swap each slot independently with p = 0.5
//!
//! # References
//!
//! - Syswerda (1989), "Uniform Crossover in Genetic Algorithms"
//! - De Jong (2006), *Evolutionary Computation: A Unified Approach*

use crate::space::{Gene, Genome, ParameterSpace};
use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Recombination operator for two parent genomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum Crossover {
    /// Single cut point in `1..len`; children swap tails.
    ///
    /// Genomes with fewer than two slots are returned unchanged.
    #[default]
    OnePoint,

    /// Each slot is swapped between the children with probability 0.5.
    Uniform,
}

impl Crossover {
    /// Produces two children from two parents.
    ///
    /// # Panics
    /// Panics if parents have different lengths.
    pub fn apply<R: Rng>(&self, parent1: &[Gene], parent2: &[Gene], rng: &mut R) -> (Genome, Genome) {
        let n = parent1.len();
        assert_eq!(n, parent2.len(), "parents must have equal length");

        let mut child1 = parent1.to_vec();
        let mut child2 = parent2.to_vec();

        match self {
            Crossover::OnePoint => {
                if n >= 2 {
                    let cut = rng.random_range(1..n);
                    child1[cut..].swap_with_slice(&mut child2[cut..]);
                }
            }
            Crossover::Uniform => {
                for i in 0..n {
                    if rng.random_bool(0.5) {
                        std::mem::swap(&mut child1[i], &mut child2[i]);
                    }
                }
            }
        }

        (child1, child2)
    }
}

/// Mutates each slot of `genome` independently with probability `rate`.
///
/// Returns the number of slots touched.
pub fn mutate_genome<R: Rng>(space: &ParameterSpace, genome: &mut [Gene], rate: f64, rng: &mut R) -> usize {
    let mut touched = 0;
    for (slot, gene) in genome.iter_mut().enumerate() {
        if rng.random_bool(rate) {
            *gene = space.mutate(slot, gene, rng);
            touched += 1;
        }
    }
    touched
}
