//! Population members and per-generation statistics.

use crate::fitness::WORST_FITNESS;
use crate::space::Genome;
use std::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::Serialize;

/// A candidate configuration in encoded form.
///
/// `fitness` is `None` until the individual has been evaluated. `birth`
/// is the generation that produced it (0 for the initial population) and
/// breaks fitness ties in favour of the more established individual.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    pub genome: Genome,
    pub fitness: Option<f64>,
    pub birth: usize,
}

impl Individual {
    /// An unevaluated individual.
    pub fn new(genome: Genome, birth: usize) -> Self {
        Self {
            genome,
            fitness: None,
            birth,
        }
    }

    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }

    /// Fitness for comparisons: unevaluated or `NaN` counts as worst.
    pub fn fitness_or_worst(&self) -> f64 {
        match self.fitness {
            Some(f) if !f.is_nan() => f,
            _ => WORST_FITNESS,
        }
    }

    /// Quality ordering: `Greater` means `self` is better.
    ///
    /// Higher fitness wins; equal fitness prefers the earlier birth.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.fitness_or_worst()
            .total_cmp(&other.fitness_or_worst())
            .then_with(|| other.birth.cmp(&self.birth))
    }
}

/// Returns the best individual, keeping the first on exact ties.
///
/// # Panics
/// Panics if `population` is empty.
pub(crate) fn best_of(population: &[Individual]) -> &Individual {
    population
        .iter()
        .reduce(|best, ind| if ind.compare(best) == Ordering::Greater { ind } else { best })
        .expect("population must not be empty")
}

/// Fitness summary of one generation, recorded after evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct GenerationStats {
    /// 0 for the initial population.
    pub generation: usize,
    pub best: f64,
    pub mean: f64,
    pub worst: f64,
    /// Individuals evaluated in this generation (elites are not re-evaluated).
    pub evaluated: usize,
    /// Population size after replacement.
    pub size: usize,
}

impl GenerationStats {
    pub(crate) fn from_population(generation: usize, population: &[Individual], evaluated: usize) -> Self {
        let fitness = population.iter().map(Individual::fitness_or_worst);
        let (best, worst, sum) = fitness.fold(
            (f64::NEG_INFINITY, f64::INFINITY, 0.0),
            |(best, worst, sum), f| (best.max(f), worst.min(f), sum + f),
        );
        Self {
            generation,
            best,
            mean: sum / population.len().max(1) as f64,
            worst,
            evaluated,
            size: population.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ind(fitness: Option<f64>, birth: usize) -> Individual {
        Individual {
            genome: Vec::new(),
            fitness,
            birth,
        }
    }

    #[test]
    fn test_compare_prefers_higher_fitness() {
        assert_eq!(ind(Some(0.9), 3).compare(&ind(Some(0.1), 0)), Ordering::Greater);
        assert_eq!(ind(Some(0.1), 0).compare(&ind(Some(0.9), 3)), Ordering::Less);
    }

    #[test]
    fn test_compare_ties_prefer_earlier_birth() {
        assert_eq!(ind(Some(0.5), 1).compare(&ind(Some(0.5), 4)), Ordering::Greater);
        assert_eq!(ind(Some(0.5), 2).compare(&ind(Some(0.5), 2)), Ordering::Equal);
    }

    #[test]
    fn test_nan_and_unevaluated_rank_worst() {
        assert_eq!(ind(Some(f64::NAN), 0).fitness_or_worst(), WORST_FITNESS);
        assert_eq!(ind(None, 0).fitness_or_worst(), WORST_FITNESS);
        assert_eq!(ind(Some(-1e9), 5).compare(&ind(Some(f64::NAN), 0)), Ordering::Greater);
    }

    #[test]
    fn test_best_of_keeps_first_on_tie() {
        let pop = vec![ind(Some(0.5), 0), ind(Some(0.7), 2), ind(Some(0.7), 2)];
        let best = best_of(&pop);
        assert!(std::ptr::eq(best, &pop[1]));
    }

    #[test]
    fn test_stats() {
        let pop = vec![ind(Some(1.0), 0), ind(Some(2.0), 0), ind(Some(3.0), 0)];
        let stats = GenerationStats::from_population(4, &pop, 2);
        assert_eq!(stats.generation, 4);
        assert_eq!(stats.best, 3.0);
        assert_eq!(stats.worst, 1.0);
        assert!((stats.mean - 2.0).abs() < 1e-12);
        assert_eq!(stats.evaluated, 2);
        assert_eq!(stats.size, 3);
    }

    #[test]
    fn test_stats_with_sentinel() {
        let pop = vec![ind(Some(WORST_FITNESS), 0), ind(Some(0.5), 0)];
        let stats = GenerationStats::from_population(0, &pop, 2);
        assert_eq!(stats.best, 0.5);
        assert_eq!(stats.worst, WORST_FITNESS);
        assert_eq!(stats.mean, WORST_FITNESS);
    }
}
