//! GA evolutionary loop execution.
//!
//! [`GaRunner`] orchestrates the complete evolutionary process:
//! initialization → evaluation → selection → variation → replacement →
//! evaluation → … until the [`Termination`] controller stops the run.

use super::config::SearchConfig;
use super::operators::mutate_genome;
use super::termination::{StopReason, Termination};
use super::types::{best_of, GenerationStats, Individual};
use crate::error::{Result, SearchError};
use crate::fitness::{FitnessFunction, WORST_FITNESS};
use crate::random::{create_rng, SearchRng};
use crate::space::{Configuration, ParameterSpace};
use log::{debug, info};
use rand::Rng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Result of a search run.
///
/// Created once when the run terminates.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SearchResult {
    /// The best configuration found during the entire run.
    pub best_configuration: Configuration,

    /// Fitness of `best_configuration`.
    pub best_fitness: f64,

    /// Generation in which `best_configuration` was first evaluated.
    pub best_generation: usize,

    /// Generations executed after the initial population.
    pub generations: usize,

    /// Why the run stopped.
    pub stop_reason: StopReason,

    /// Individuals evaluated over the run, initial population included.
    ///
    /// Duplicates within one generation count once per individual but are
    /// scored once.
    pub evaluations: usize,

    /// The seed actually used, for reproducing unseeded runs.
    pub seed: u64,

    /// One entry for the initial population plus one per generation.
    pub history: Vec<GenerationStats>,
}

impl SearchResult {
    /// Best fitness of each recorded generation.
    pub fn best_fitness_history(&self) -> Vec<f64> {
        self.history.iter().map(|s| s.best).collect()
    }
}

/// Executes the evolutionary search loop.
///
/// # Usage
///
/// ```
/// use evogrid::ga::{GaRunner, SearchConfig};
/// use evogrid::space::{Configuration, Domain, ParameterSpace};
///
/// let space = ParameterSpace::from_domains([("x", Domain::int_range(-50, 50))]).unwrap();
/// let fitness = |c: &Configuration| -(c.get("x").and_then(|v| v.as_float()).unwrap_or(0.0) - 7.0).abs();
/// let config = SearchConfig::default().with_max_generations(30).with_seed(42);
///
/// let result = GaRunner::run(&space, &fitness, &config).unwrap();
/// assert!(result.best_fitness > -5.0);
/// ```
pub struct GaRunner;

impl GaRunner {
    /// Runs the search.
    ///
    /// Fails if the configuration is invalid, the space is empty, or a
    /// genome cannot be decoded (an internal invariant violation).
    pub fn run<F: FitnessFunction>(space: &ParameterSpace, fitness: &F, config: &SearchConfig) -> Result<SearchResult> {
        Self::run_with_cancel(space, fitness, config, None)
    }

    /// Runs the search with an optional cancellation token.
    ///
    /// If `cancel` is `Some` and the flag is set to `true`, the search
    /// stops before the next generation and returns the best
    /// configuration found so far.
    pub fn run_with_cancel<F: FitnessFunction>(
        space: &ParameterSpace,
        fitness: &F,
        config: &SearchConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<SearchResult> {
        config.validate()?;
        if space.is_empty() {
            return Err(SearchError::InvalidConfig("parameter space is empty".into()));
        }

        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = create_rng(seed);
        let termination = Termination::new(config);

        match space.grid_size() {
            Some(grid) => info!(
                "evolutionary search over {} parameters ({grid} grid points): population {}, up to {} generations, seed {seed}",
                space.len(),
                config.population_size,
                config.max_generations
            ),
            None => info!(
                "evolutionary search over {} parameters (continuous): population {}, up to {} generations, seed {seed}",
                space.len(),
                config.population_size,
                config.max_generations
            ),
        }

        // 1. Initialize population
        let mut population = (0..config.population_size)
            .map(|_| space.encode(&space.sample(&mut rng)).map(|g| Individual::new(g, 0)))
            .collect::<Result<Vec<_>>>()?;

        // 2. Evaluate initial population
        let mut evaluations = evaluate_population(space, fitness, &mut population, config.parallel)?;
        let initial = GenerationStats::from_population(0, &population, evaluations);
        fitness.on_generation(&initial);
        debug!("generation 0: best {:.6}, mean {:.6}, worst {:.6}", initial.best, initial.mean, initial.worst);

        // 3. Track best
        let mut best = best_of(&population).clone();
        let mut best_generation = 0;
        let mut best_so_far = vec![best.fitness_or_worst()];
        let mut history = vec![initial];
        let mut generation = 0;

        // 4. Evolutionary loop
        let stop_reason = loop {
            if cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                break StopReason::Cancelled;
            }
            if let Some(reason) = termination.check(&best_so_far, generation, evaluations) {
                break reason;
            }
            generation += 1;

            let parents = config
                .selection
                .select_many(&population, config.selection_count(), &mut rng);
            let offspring = vary(
                space,
                &population,
                &parents,
                config,
                generation,
                config.population_size - config.n_elite,
                &mut rng,
            );
            population = replace(population, offspring, config.n_elite, config.population_size);

            let evaluated = evaluate_population(space, fitness, &mut population, config.parallel)?;
            evaluations += evaluated;

            let stats = GenerationStats::from_population(generation, &population, evaluated);
            fitness.on_generation(&stats);
            debug!(
                "generation {generation}: best {:.6}, mean {:.6}, worst {:.6}, evaluated {evaluated}",
                stats.best, stats.mean, stats.worst
            );
            history.push(stats);

            let gen_best = best_of(&population);
            if gen_best.fitness_or_worst() > best.fitness_or_worst() {
                best = gen_best.clone();
                best_generation = generation;
            }
            best_so_far.push(best.fitness_or_worst());
        };

        let best_configuration = space.decode(&best.genome)?;
        info!(
            "search stopped after {generation} generations ({stop_reason}): best fitness {:.6} with {best_configuration}, {evaluations} evaluations in {:.2?}",
            best.fitness_or_worst(),
            termination.elapsed()
        );

        Ok(SearchResult {
            best_configuration,
            best_fitness: best.fitness_or_worst(),
            best_generation,
            generations: generation,
            stop_reason,
            evaluations,
            seed,
            history,
        })
    }
}

/// Evaluates every individual that has no fitness yet.
///
/// All genomes are decoded first and grouped by fingerprint, so a
/// configuration appearing several times in the batch is scored once even
/// when the batch runs on the rayon pool. Returns the number of individuals
/// evaluated.
fn evaluate_population<F: FitnessFunction>(
    space: &ParameterSpace,
    fitness: &F,
    population: &mut [Individual],
    parallel: bool,
) -> Result<usize> {
    let pending = population
        .iter()
        .enumerate()
        .filter(|(_, ind)| !ind.is_evaluated())
        .map(|(i, ind)| space.decode(&ind.genome).map(|c| (i, c)))
        .collect::<Result<Vec<_>>>()?;

    let mut first_seen: HashMap<String, usize> = HashMap::with_capacity(pending.len());
    let mut distinct: Vec<&Configuration> = Vec::with_capacity(pending.len());
    let owner: Vec<usize> = pending
        .iter()
        .map(|(_, c)| {
            *first_seen.entry(c.fingerprint()).or_insert_with(|| {
                distinct.push(c);
                distinct.len() - 1
            })
        })
        .collect();

    #[cfg(feature = "parallel")]
    let scores: Vec<f64> = if parallel {
        distinct.par_iter().map(|c| fitness.evaluate(c)).collect()
    } else {
        distinct.iter().map(|c| fitness.evaluate(c)).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let scores: Vec<f64> = {
        let _ = parallel;
        distinct.iter().map(|c| fitness.evaluate(c)).collect()
    };

    for ((i, _), slot) in pending.iter().zip(owner) {
        let score = scores[slot];
        population[*i].fitness = Some(if score.is_nan() { WORST_FITNESS } else { score });
    }
    Ok(pending.len())
}

/// Produces `count` offspring from the selected parents.
///
/// Parents are paired in draw order, wrapping around when more offspring
/// are needed than one pass yields.
fn vary(
    space: &ParameterSpace,
    population: &[Individual],
    parents: &[usize],
    config: &SearchConfig,
    generation: usize,
    count: usize,
    rng: &mut SearchRng,
) -> Vec<Individual> {
    let mut offspring = Vec::with_capacity(count + 1);
    let mut cursor = 0;
    while offspring.len() < count {
        let p1 = &population[parents[cursor % parents.len()]].genome;
        let p2 = &population[parents[(cursor + 1) % parents.len()]].genome;
        cursor += 2;

        let (c1, c2) = if rng.random_bool(config.crossover_rate) {
            config.crossover.apply(p1, p2, rng)
        } else {
            (p1.clone(), p2.clone())
        };

        for mut child in [c1, c2] {
            if offspring.len() >= count {
                break;
            }
            mutate_genome(space, &mut child, config.mutation_rate, rng);
            offspring.push(Individual::new(child, generation));
        }
    }
    offspring
}

/// Builds the next generation: the `n_elite` best individuals unchanged,
/// then offspring, trimmed to `size`.
fn replace(mut population: Vec<Individual>, offspring: Vec<Individual>, n_elite: usize, size: usize) -> Vec<Individual> {
    population.sort_by(|a, b| b.compare(a));
    population.truncate(n_elite);
    population.extend(offspring);
    population.truncate(size);
    population
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::{Crossover, Selection};
    use crate::space::{Domain, ParamValue};
    use proptest::prelude::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Peak at x = 37, y = "c".
    fn peak_space() -> ParameterSpace {
        ParameterSpace::from_domains([
            ("x", Domain::int_range(0, 100)),
            ("y", Domain::categorical(["a", "b", "c", "d"])),
            ("z", Domain::float_range(0.0, 1.0)),
        ])
        .unwrap()
    }

    fn peak(c: &Configuration) -> f64 {
        let x = c.get("x").and_then(ParamValue::as_int).unwrap_or(0) as f64;
        let y = if c.get("y").and_then(ParamValue::as_str) == Some("c") { 0.0 } else { 10.0 };
        let z = c.get("z").and_then(ParamValue::as_float).unwrap_or(0.0);
        -((x - 37.0).abs() + y + z)
    }

    #[test]
    fn test_finds_peak() {
        let config = SearchConfig::default()
            .with_population_size(30)
            .with_max_generations(60)
            .with_mutation_rate(0.3)
            .with_seed(42)
            .with_parallel(false);

        let result = GaRunner::run(&peak_space(), &peak, &config).unwrap();

        assert!(
            result.best_fitness > -6.0,
            "expected near-optimal fitness, got {} for {}",
            result.best_fitness,
            result.best_configuration
        );
        assert_eq!(result.best_configuration.get("y"), Some(&ParamValue::from("c")));
    }

    #[test]
    fn test_population_size_constant() {
        struct Recorder(Mutex<Vec<(usize, usize)>>);
        impl FitnessFunction for Recorder {
            fn evaluate(&self, c: &Configuration) -> f64 {
                peak(c)
            }
            fn on_generation(&self, stats: &GenerationStats) {
                self.0.lock().unwrap().push((stats.generation, stats.size));
            }
        }

        let config = SearchConfig::default()
            .with_population_size(12)
            .with_elite_count(3)
            .with_selection_count(5)
            .with_max_generations(8)
            .with_seed(1);
        let recorder = Recorder(Mutex::new(Vec::new()));
        let result = GaRunner::run(&peak_space(), &recorder, &config).unwrap();

        assert_eq!(result.history.len(), 9);
        let seen = recorder.0.lock().unwrap();
        assert_eq!(*seen, (0..=8).map(|g| (g, 12)).collect::<Vec<_>>());
        assert!(result.history.iter().all(|s| s.size == 12));
        // Elites are never re-evaluated.
        assert_eq!(result.history[0].evaluated, 12);
        for stats in &result.history[1..] {
            assert_eq!(stats.evaluated, 9);
        }
        assert_eq!(result.evaluations, 12 + 8 * 9);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_duplicates_scored_once_in_parallel() {
        let space = ParameterSpace::from_domains([("k", Domain::categorical(["a", "b", "c"]))]).unwrap();
        let calls: Mutex<HashMap<String, usize>> = Mutex::new(HashMap::new());
        let fitness = |c: &Configuration| {
            *calls.lock().unwrap().entry(c.fingerprint()).or_default() += 1;
            std::thread::sleep(std::time::Duration::from_millis(2));
            1.0
        };
        let config = SearchConfig::default()
            .with_population_size(20)
            .with_max_generations(0)
            .with_seed(5);

        let pool = rayon::ThreadPoolBuilder::new().num_threads(8).build().unwrap();
        let result = pool.install(|| GaRunner::run(&space, &fitness, &config)).unwrap();

        assert_eq!(result.evaluations, 20);
        assert_eq!(result.history[0].evaluated, 20);
        let calls = calls.lock().unwrap();
        assert!(!calls.is_empty() && calls.len() <= 3);
        for (fingerprint, count) in calls.iter() {
            assert_eq!(*count, 1, "{fingerprint} scored {count} times");
        }
    }

    #[test]
    fn test_replace_keeps_size_and_elites() {
        let mk = |f: f64, birth: usize| Individual {
            genome: vec![],
            fitness: Some(f),
            birth,
        };
        let population = vec![mk(0.1, 0), mk(0.9, 0), mk(0.5, 0), mk(0.9, 1)];
        let offspring = vec![Individual::new(vec![], 2); 5];
        let next = replace(population, offspring, 2, 4);
        assert_eq!(next.len(), 4);
        assert_eq!(next[0], mk(0.9, 0));
        assert_eq!(next[1], mk(0.9, 1));
        assert!(next[2..].iter().all(|i| !i.is_evaluated()));
    }

    #[test]
    fn test_elite_preservation() {
        let config = SearchConfig::default()
            .with_population_size(10)
            .with_max_generations(25)
            .with_mutation_rate(0.5)
            .with_seed(42);

        let result = GaRunner::run(&peak_space(), &peak, &config).unwrap();

        for window in result.best_fitness_history().windows(2) {
            assert!(
                window[1] >= window[0],
                "best fitness should be monotonically non-decreasing with elitism: {} < {}",
                window[1],
                window[0]
            );
        }
    }

    #[test]
    fn test_zero_generations_evaluates_initial_only() {
        let calls = Mutex::new(0usize);
        let fitness = |c: &Configuration| {
            *calls.lock().unwrap() += 1;
            peak(c)
        };
        let config = SearchConfig::default()
            .with_population_size(8)
            .with_max_generations(0)
            .with_seed(3);

        let result = GaRunner::run(&peak_space(), &fitness, &config).unwrap();

        assert_eq!(*calls.lock().unwrap(), 8);
        assert_eq!(result.generations, 0);
        assert_eq!(result.history.len(), 1);
        assert_eq!(result.stop_reason, StopReason::MaxGenerations);
        assert_eq!(result.best_fitness, result.history[0].best);
        assert_eq!(result.best_generation, 0);
    }

    #[test]
    fn test_deterministic_with_seed() {
        let config = SearchConfig::default()
            .with_population_size(16)
            .with_max_generations(10)
            .with_seed(2024);

        let a = GaRunner::run(&peak_space(), &peak, &config).unwrap();
        let b = GaRunner::run(&peak_space(), &peak, &config.clone().with_parallel(false)).unwrap();

        assert_eq!(a.best_configuration, b.best_configuration);
        assert_eq!(a.history, b.history);
        assert_eq!(a.seed, 2024);
    }

    #[test]
    fn test_unseeded_run_reports_seed() {
        let config = SearchConfig::default().with_population_size(6).with_max_generations(2);
        let first = GaRunner::run(&peak_space(), &peak, &config).unwrap();
        let replay = GaRunner::run(&peak_space(), &peak, &config.clone().with_seed(first.seed)).unwrap();
        assert_eq!(first.best_configuration, replay.best_configuration);
    }

    #[test]
    fn test_plateau_termination() {
        let flat = |_: &Configuration| 1.0;
        let config = SearchConfig::default()
            .with_population_size(10)
            .with_max_generations(1000)
            .with_patience(3, 0.0)
            .with_seed(42);

        let result = GaRunner::run(&peak_space(), &flat, &config).unwrap();

        assert_eq!(result.stop_reason, StopReason::Plateau);
        assert_eq!(result.generations, 3);
    }

    #[test]
    fn test_evaluation_budget() {
        let config = SearchConfig::default()
            .with_population_size(10)
            .with_max_generations(1000)
            .with_max_evaluations(50)
            .with_seed(42);

        let result = GaRunner::run(&peak_space(), &peak, &config).unwrap();

        assert_eq!(result.stop_reason, StopReason::EvaluationBudget);
        // 10 initial + 9 per generation: stops once 50 is reached.
        assert_eq!(result.evaluations, 55);
    }

    #[test]
    fn test_cancellation() {
        let config = SearchConfig::default()
            .with_population_size(10)
            .with_max_generations(1_000_000)
            .with_seed(42);

        let cancel = Arc::new(AtomicBool::new(false));
        let flag = cancel.clone();
        let fitness = move |c: &Configuration| {
            // Raise the flag from inside the run after a few evaluations.
            if c.get("x") == Some(&ParamValue::Int(37)) || rand::random::<f64>() < 0.05 {
                flag.store(true, Ordering::Relaxed);
            }
            peak(c)
        };

        let result = GaRunner::run_with_cancel(&peak_space(), &fitness, &config, Some(cancel)).unwrap();

        assert_eq!(result.stop_reason, StopReason::Cancelled);
        assert!(result.generations < 1_000_000);
    }

    #[test]
    fn test_all_selection_and_crossover_strategies() {
        for selection in [Selection::Tournament(3), Selection::Roulette, Selection::Rank] {
            for crossover in [Crossover::OnePoint, Crossover::Uniform] {
                let config = SearchConfig::default()
                    .with_population_size(20)
                    .with_max_generations(20)
                    .with_selection(selection)
                    .with_crossover(crossover)
                    .with_seed(42);

                let result = GaRunner::run(&peak_space(), &peak, &config).unwrap();
                assert!(
                    result.best_fitness > -30.0,
                    "{selection:?}/{crossover:?} made no progress: {}",
                    result.best_fitness
                );
            }
        }
    }

    #[test]
    fn test_offspring_carry_birth_generation() {
        let space = peak_space();
        let config = SearchConfig::default().with_population_size(6).with_seed(8);
        let mut rng = create_rng(8);
        let population: Vec<Individual> = (0..6)
            .map(|_| {
                let mut ind = Individual::new(space.encode(&space.sample(&mut rng)).unwrap(), 0);
                ind.fitness = Some(0.0);
                ind
            })
            .collect();
        let offspring = vary(&space, &population, &[0, 1, 2], &config, 4, 5, &mut rng);
        assert_eq!(offspring.len(), 5);
        for child in &offspring {
            assert!(!child.is_evaluated());
            assert!(space.decode(&child.genome).is_ok());
        }
        let births: HashSet<usize> = offspring.iter().map(|c| c.birth).collect();
        assert_eq!(births, HashSet::from([4]));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SearchConfig::default().with_population_size(1);
        assert!(matches!(
            GaRunner::run(&peak_space(), &peak, &config),
            Err(SearchError::InvalidConfig(_))
        ));
        assert!(matches!(
            GaRunner::run(&ParameterSpace::new(), &peak, &SearchConfig::default()),
            Err(SearchError::InvalidConfig(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_population_size_invariant(
            pop in 2usize..16,
            elite_frac in 0.0f64..1.0,
            select in proptest::option::of(1usize..20),
            gens in 0usize..5,
            seed in any::<u64>(),
        ) {
            let n_elite = ((pop as f64 * elite_frac) as usize).min(pop - 1);
            let mut config = SearchConfig::default()
                .with_population_size(pop)
                .with_elite_count(n_elite)
                .with_max_generations(gens)
                .with_parallel(false)
                .with_seed(seed);
            if let Some(n) = select {
                config = config.with_selection_count(n);
            }

            let result = GaRunner::run(&peak_space(), &peak, &config).unwrap();

            prop_assert_eq!(result.history.len(), gens + 1);
            for stats in &result.history {
                prop_assert_eq!(stats.size, pop);
            }
            prop_assert_eq!(result.history[0].evaluated, pop);
            for stats in &result.history[1..] {
                // Only non-elite slots hold fresh offspring.
                prop_assert_eq!(stats.evaluated, pop - n_elite);
            }
            prop_assert!(peak_space().contains(&result.best_configuration));
        }
    }
}
