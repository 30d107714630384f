//! A Population is a collection of genomes.
//! These are grouped into species, which can
//! be evolved using a genome evaluation function
//! or an [`Environment`] as the source of selective
//! pressure.
//!
//! Each generation runs a fixed pipeline: evaluate,
//! speciate, reproduce, mutate, report.
//!
//! [`Environment`]: crate::evaluation::Environment
mod config;
mod errors;
pub mod logging;
mod offspring_factory;
mod species;

pub use config::PopulationConfig;
pub use errors::SeedError;
pub use logging::{EvolutionLogger, GenerationReport, ReportingLevel, SpeciesSummary, Stats};
pub use species::{Species, SpeciesID};

use crate::evaluation::{Environment, EpisodeEvaluator, TrajectoryStep};
use crate::genomics::{GeneticConfig, Genome, History, NodeType};
use crate::networks::Network;
use offspring_factory::{Offspring, OffspringFactory};

use ahash::RandomState;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use std::cmp::Ordering;
use std::collections::HashMap;

/// A population of genomes.
#[derive(Clone, Debug)]
pub struct Population {
    genomes: Vec<Genome>,
    species: Vec<Species>,
    history: History,
    generation: usize,
    best_ever: Option<Genome>,
    generations_since_innovation: usize,
    last_innovation_count: usize,
    population_config: PopulationConfig,
    genetic_config: GeneticConfig,
    rng: StdRng,
}

impl Population {
    /// Creates a new population of freshly generated genomes
    /// using the passed configurations, with a randomly seeded
    /// random number generator.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::GeneticConfig;
    /// use evoneat::populations::{Population, PopulationConfig};
    /// use std::num::NonZeroUsize;
    ///
    /// let population = Population::new(
    ///     PopulationConfig {
    ///         size: NonZeroUsize::new(30).unwrap(),
    ///         ..PopulationConfig::zero()
    ///     },
    ///     GeneticConfig::default(),
    /// );
    /// assert_eq!(population.genomes().count(), 30);
    /// assert_eq!(population.generation(), 0);
    /// ```
    pub fn new(population_config: PopulationConfig, genetic_config: GeneticConfig) -> Population {
        Self::with_rng(population_config, genetic_config, StdRng::from_entropy())
    }

    /// Like [`Population::new`], but with a deterministically
    /// seeded random number generator, making evolution
    /// reproducible for deterministic fitness functions.
    pub fn with_seed(
        population_config: PopulationConfig,
        genetic_config: GeneticConfig,
        seed: u64,
    ) -> Population {
        Self::with_rng(population_config, genetic_config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        population_config: PopulationConfig,
        genetic_config: GeneticConfig,
        mut rng: StdRng,
    ) -> Population {
        let mut history = History::new();
        let genomes = (0..population_config.size.get())
            .map(|_| Genome::new(&genetic_config, &mut history, &mut rng))
            .collect();
        Population {
            genomes,
            species: vec![],
            last_innovation_count: history.innovation_count(),
            history,
            generation: 0,
            best_ever: None,
            generations_since_innovation: 0,
            population_config,
            genetic_config,
            rng,
        }
    }

    /// Creates a new population from seed genomes, whose innovation
    /// numbers were assigned by `history`. If there are fewer seeds
    /// than the configured population size, the remaining space is
    /// filled with freshly generated genomes.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no seeds or too many,
    /// or any seed is invalid or doesn't match the genetic
    /// configuration's node counts.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::{GeneticConfig, Genome, History};
    /// use evoneat::populations::{Population, PopulationConfig};
    /// use rand::{rngs::StdRng, SeedableRng};
    /// use std::num::NonZeroUsize;
    ///
    /// let genetic_config = GeneticConfig::default();
    /// let mut history = History::new();
    /// let mut rng = StdRng::seed_from_u64(0);
    /// let seeds = vec![Genome::new(&genetic_config, &mut history, &mut rng)];
    ///
    /// let population = Population::from_genomes(
    ///     seeds,
    ///     history,
    ///     PopulationConfig {
    ///         size: NonZeroUsize::new(10).unwrap(),
    ///         ..PopulationConfig::zero()
    ///     },
    ///     genetic_config,
    ///     7,
    /// )
    /// .unwrap();
    /// assert_eq!(population.genomes().count(), 10);
    /// ```
    pub fn from_genomes(
        mut seeds: Vec<Genome>,
        mut history: History,
        population_config: PopulationConfig,
        genetic_config: GeneticConfig,
        rng_seed: u64,
    ) -> Result<Population, SeedError> {
        let size = population_config.size.get();
        if seeds.is_empty() {
            return Err(SeedError::EmptySeed);
        }
        if seeds.len() > size {
            return Err(SeedError::TooManyGenomes {
                size,
                seeds: seeds.len(),
            });
        }
        for (index, genome) in seeds.iter().enumerate() {
            genome
                .check_invariants()
                .map_err(|e| SeedError::InvalidGenome(index, e))?;
            if !conforms_to(genome, &genetic_config) {
                return Err(SeedError::NonconformingGenome(index));
            }
        }

        let mut rng = StdRng::seed_from_u64(rng_seed);
        while seeds.len() < size {
            seeds.push(Genome::new(&genetic_config, &mut history, &mut rng));
        }
        Ok(Population {
            genomes: seeds,
            species: vec![],
            last_innovation_count: history.innovation_count(),
            history,
            generation: 0,
            best_ever: None,
            generations_since_innovation: 0,
            population_config,
            genetic_config,
            rng,
        })
    }

    /// Evaluates the fitness of each genome in the
    /// population using the passed evaluator, serially.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::GeneticConfig;
    /// use evoneat::populations::{Population, PopulationConfig};
    ///
    /// let mut population = Population::new(PopulationConfig::zero(), GeneticConfig::zero());
    ///
    /// population.evaluate_fitness(|g| {
    ///     // Compute genome's fitness...
    ///     g.genes().count() as f64
    /// });
    /// ```
    pub fn evaluate_fitness<E>(&mut self, mut evaluator: E)
    where
        E: FnMut(&Genome) -> f64,
    {
        for genome in &mut self.genomes {
            let fitness = evaluator(genome);
            genome.set_fitness(fitness);
        }
    }

    /// Evaluates every genome in parallel, each in its own
    /// environment produced by `make_environment`, running
    /// episodes of at most [`episode_steps`] steps. The
    /// environment's final score is the genome's fitness.
    ///
    /// [`episode_steps`]: PopulationConfig::episode_steps
    pub fn evaluate_in<E, F>(&mut self, make_environment: F)
    where
        E: Environment,
        F: Fn() -> E + Sync,
    {
        let evaluator = EpisodeEvaluator::new(self.population_config.episode_steps);
        let activation = self.genetic_config.activation;
        self.genomes.par_iter_mut().for_each(|genome| {
            let mut network = Network::new(genome, activation);
            let mut environment = make_environment();
            let fitness = evaluator.evaluate(&mut network, &mut environment);
            genome.set_fitness(fitness);
        });
    }

    /// Runs an episode of the current champion in a fresh
    /// environment, recording every step.
    pub fn replay_champion<E, F>(&self, make_environment: F) -> Vec<TrajectoryStep>
    where
        E: Environment,
        F: Fn() -> E,
    {
        let evaluator = EpisodeEvaluator::new(self.population_config.episode_steps);
        let mut network = Network::new(self.champion(), self.genetic_config.activation);
        evaluator.replay(&mut network, &mut make_environment())
    }

    /// Runs a whole generation: parallel evaluation in
    /// environments from `make_environment`, optional
    /// champion replay, and [`evolve`].
    ///
    /// [`evolve`]: Population::evolve
    pub fn run_generation<E, F>(&mut self, make_environment: F) -> GenerationReport
    where
        E: Environment,
        F: Fn() -> E + Sync,
    {
        self.evaluate_in(&make_environment);
        let trajectory = if self.population_config.record_champion_trajectory {
            Some(self.replay_champion(&make_environment))
        } else {
            None
        };
        let mut report = self.evolve();
        report.champion_trajectory = trajectory;
        report
    }

    /// Evolves the evaluated population into the next generation.
    ///
    /// Genomes are speciated by genetic distance to a random
    /// representative of each existing species, and share fitness
    /// within their species. Each species then receives offspring
    /// in proportion to its adjusted fitness. The bottom half of
    /// each species is culled before breeding, and champions of
    /// large species are copied unmutated. Every other offspring
    /// then goes through weight and structural mutation.
    ///
    /// Returns the report of the generation just evaluated.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::GeneticConfig;
    /// use evoneat::populations::{Population, PopulationConfig};
    /// use std::num::NonZeroUsize;
    ///
    /// let mut population = Population::with_seed(
    ///     PopulationConfig {
    ///         size: NonZeroUsize::new(40).unwrap(),
    ///         ..PopulationConfig::default()
    ///     },
    ///     GeneticConfig::default(),
    ///     42,
    /// );
    ///
    /// population.evaluate_fitness(|g| g.genes().map(|gene| gene.weight()).sum::<f64>().abs());
    /// let report = population.evolve();
    ///
    /// assert_eq!(report.generation, 0);
    /// assert_eq!(population.generation(), 1);
    /// assert_eq!(population.genomes().count(), 40);
    /// ```
    pub fn evolve(&mut self) -> GenerationReport {
        self.update_best_ever();
        let total_adjusted_fitness = self.speciate();
        let mut report = self.report();

        for species in &mut self.species {
            species.sort_by_decreasing_fitness();
        }
        let brood = OffspringFactory::new(
            &self.species,
            &self.genetic_config,
            &self.population_config,
            &mut self.rng,
        )
        .generate_offspring(total_adjusted_fitness);
        debug_assert_eq!(brood.offspring.len(), self.population_config.size.get());

        for (summary, (id, offspring)) in report.species.iter_mut().zip(&brood.allotted) {
            debug_assert_eq!(summary.id, *id);
            summary.offspring = *offspring;
        }
        report.leftover_offspring = brood.leftover;

        self.genomes = brood
            .offspring
            .into_iter()
            .map(|Offspring { mut genome, preserved }| {
                if !preserved {
                    genome.mutate_all(&mut self.history, &self.genetic_config, &mut self.rng);
                }
                genome.fitness = 0.0;
                genome.adjusted_fitness = 0.0;
                genome
            })
            .collect();

        let innovation_count = self.history.innovation_count();
        if innovation_count > self.last_innovation_count {
            self.generations_since_innovation = 0;
        } else {
            self.generations_since_innovation += 1;
        }
        self.last_innovation_count = innovation_count;
        report.generations_since_innovation = self.generations_since_innovation;
        report.innovation_count = innovation_count;

        log::info!(
            "generation {}: {} species, best fitness {:.4}, average fitness {:.4}",
            report.generation,
            report.species.len(),
            report.best_fitness,
            report.average_fitness
        );
        self.generation += 1;
        report
    }

    /// Assigns every genome to the first species whose
    /// representative is within the distance threshold,
    /// founding new species as needed. Then computes fitness
    /// sharing, and returns the population's total adjusted
    /// fitness, clamped to 1 if not positive.
    fn speciate(&mut self) -> f64 {
        let generation = self.generation;
        let rng = &mut self.rng;
        let mut representatives: Vec<Option<Genome>> = self
            .species
            .iter()
            .map(|s| s.random_member(rng).cloned())
            .collect();
        for species in &mut self.species {
            species.clear_members();
        }

        let mut founded = 0;
        for genome in &mut self.genomes {
            let candidate: &Genome = genome;
            let compatible = representatives.iter().position(|representative| {
                representative.as_ref().map_or(false, |r| {
                    Genome::genetic_distance(candidate, r, &self.genetic_config)
                        < self.population_config.distance_threshold
                })
            });
            match compatible {
                Some(index) => {
                    genome.set_species(self.species[index].id());
                    self.species[index].add_genome(genome.clone());
                }
                None => {
                    let id = SpeciesID(generation, founded);
                    founded += 1;
                    log::debug!("species {:?} founded", id);
                    genome.set_species(id);
                    self.species.push(Species::new(id, genome.clone(), generation));
                    representatives.push(Some(genome.clone()));
                }
            }
        }

        self.species.retain(|s| {
            if s.is_empty() {
                log::debug!("species {:?} went extinct", s.id());
            }
            !s.is_empty()
        });
        for species in &mut self.species {
            species.update_fitness();
        }

        let sizes: HashMap<SpeciesID, usize, RandomState> =
            self.species.iter().map(|s| (s.id(), s.len())).collect();
        for genome in &mut self.genomes {
            let size = genome.species().and_then(|id| sizes.get(&id)).copied();
            genome.adjusted_fitness = genome.fitness / size.unwrap_or(1) as f64;
        }

        let total: f64 = self.species.iter().map(|s| s.adjusted_fitness_sum()).sum();
        if total > 0.0 {
            total
        } else {
            1.0
        }
    }

    fn update_best_ever(&mut self) {
        let champion = self.champion();
        if self
            .best_ever
            .as_ref()
            .map_or(true, |best| champion.fitness() > best.fitness())
        {
            self.best_ever = Some(champion.clone());
        }
    }

    /// Builds the report of the current, speciated generation.
    fn report(&self) -> GenerationReport {
        let level = self.population_config.reporting_level;
        let fitnesses = self.genomes.iter().map(|g| g.fitness());
        let adjusted = self.genomes.iter().map(|g| g.adjusted_fitness());
        let fitness_stats = Stats::from(fitnesses);
        let adjusted_stats = Stats::from(adjusted);

        let by_adjusted_sum = |s1: &&Species, s2: &&Species| {
            s1.adjusted_fitness_sum()
                .partial_cmp(&s2.adjusted_fitness_sum())
                .unwrap_or(Ordering::Equal)
        };

        GenerationReport {
            generation: self.generation,
            species: self
                .species
                .iter()
                .map(|s| SpeciesSummary {
                    id: s.id(),
                    size: s.len(),
                    best_fitness: s.best_fitness(),
                    best_fitness_ever: s.best_fitness_ever(),
                    adjusted_fitness_sum: s.adjusted_fitness_sum(),
                    generations_since_improvement: s.generations_since_improvement(),
                    offspring: 0,
                    members: match level {
                        ReportingLevel::AllGenomes => s.genomes().cloned().collect(),
                        ReportingLevel::SpeciesChampions => s.champion().cloned().into_iter().collect(),
                        _ => vec![],
                    },
                })
                .collect(),
            best_fitness: fitness_stats.maximum,
            worst_fitness: fitness_stats.minimum,
            average_fitness: fitness_stats.mean,
            best_adjusted_fitness: adjusted_stats.maximum,
            worst_adjusted_fitness: adjusted_stats.minimum,
            fitness_stats,
            strongest_species: self.species.iter().max_by(by_adjusted_sum).map(|s| s.id()),
            weakest_species: self.species.iter().min_by(by_adjusted_sum).map(|s| s.id()),
            leftover_offspring: 0,
            generations_since_innovation: self.generations_since_innovation,
            innovation_count: self.history.innovation_count(),
            population_champion: match level {
                ReportingLevel::NoGenomes => None,
                _ => Some(self.champion().clone()),
            },
            champion_trajectory: None,
        }
    }

    /// Resets the population to an initial randomized state,
    /// with a fresh innovation history.
    pub fn reset(&mut self) {
        let rng = StdRng::from_rng(&mut self.rng).unwrap_or_else(|_| StdRng::from_entropy());
        *self = Self::with_rng(
            self.population_config.clone(),
            self.genetic_config.clone(),
            rng,
        );
    }

    /// Returns the currently best-performing genome.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::GeneticConfig;
    /// use evoneat::populations::{Population, PopulationConfig};
    /// use std::num::NonZeroUsize;
    ///
    /// let mut population = Population::new(
    ///     PopulationConfig {
    ///         size: NonZeroUsize::new(20).unwrap(),
    ///         ..PopulationConfig::zero()
    ///     },
    ///     GeneticConfig::zero(),
    /// );
    ///
    /// let mut fitness = 0.0;
    /// population.evaluate_fitness(move |_| {
    ///     fitness += 10.0;
    ///     fitness
    /// });
    ///
    /// assert_eq!(population.champion().fitness(), 20.0 * 10.0);
    /// ```
    pub fn champion(&self) -> &Genome {
        self.genomes
            .iter()
            .max_by(|g1, g2| {
                g1.fitness()
                    .partial_cmp(&g2.fitness())
                    .unwrap_or(Ordering::Equal)
            })
            .expect("empty population has no champion")
    }

    /// Returns the best genome evaluated so far in the run,
    /// as of the last call to [`evolve`].
    ///
    /// [`evolve`]: Population::evolve
    pub fn best_ever(&self) -> Option<&Genome> {
        self.best_ever.as_ref()
    }

    /// Returns an iterator over all current genomes.
    pub fn genomes(&self) -> impl Iterator<Item = &Genome> {
        self.genomes.iter()
    }

    /// Returns an iterator over the species of the last speciation.
    pub fn species(&self) -> impl Iterator<Item = &Species> {
        self.species.iter()
    }

    /// Returns the current generation number.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns the population's innovation history.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Returns the number of generations since a new
    /// structural innovation was last registered.
    pub fn generations_since_innovation(&self) -> usize {
        self.generations_since_innovation
    }

    pub fn population_config(&self) -> &PopulationConfig {
        &self.population_config
    }

    pub fn genetic_config(&self) -> &GeneticConfig {
        &self.genetic_config
    }
}

/// Checks a genome's sensor and output node counts
/// against a genetic configuration.
fn conforms_to(genome: &Genome, config: &GeneticConfig) -> bool {
    let count = |node_type| {
        genome
            .nodes()
            .filter(|n| n.node_type() == node_type)
            .count()
    };
    count(NodeType::Input) == config.input_count.get()
        && count(NodeType::Bias) == config.bias_count
        && count(NodeType::Output) == config.output_count.get()
}
