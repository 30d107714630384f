//! A generational implementation of NeuroEvolution of Augmenting Topologies,
//! following the 2002 paper: <http://nn.cs.utexas.edu/keyword?stanley:ec02>
//!
//! Genomes are lists of historically marked connection genes over a dense
//! set of nodes. Each generation, genomes are compiled into (possibly
//! recurrent) neural networks, scored in a user-supplied [`Environment`],
//! grouped into species by genetic distance, and bred in proportion to
//! their species' shared fitness.
//!
//! Networks may contain recurrent connections, which read the previous
//! timestep's activations, so agents can carry memory between the steps
//! of an episode.
//!
//! # Example usage: steering outputs towards a set point
//! ```
//! use evoneat::evaluation::Environment;
//! use evoneat::genomics::GeneticConfig;
//! use evoneat::populations::{EvolutionLogger, Population, PopulationConfig};
//! use std::num::NonZeroUsize;
//!
//! /// Rewards outputs that track a slowly moving target.
//! struct Tracker {
//!     tick: usize,
//!     score: f64,
//! }
//!
//! impl Tracker {
//!     fn target(&self) -> f64 {
//!         0.5 + 0.4 * (self.tick as f64 / 8.0).sin()
//!     }
//! }
//!
//! impl Environment for Tracker {
//!     fn reset(&mut self) {
//!         self.tick = 0;
//!         self.score = 0.0;
//!     }
//!
//!     fn observe(&self) -> Vec<f64> {
//!         vec![self.target(), 1.0 - self.target()]
//!     }
//!
//!     fn step(&mut self, actions: &[f64]) -> bool {
//!         let error = (actions[0] - self.target()).abs();
//!         self.score += 1.0 - error;
//!         self.tick += 1;
//!         error < 0.9
//!     }
//!
//!     fn score(&self) -> f64 {
//!         self.score
//!     }
//! }
//!
//! fn main() {
//!     let genetic_config = GeneticConfig {
//!         input_count: NonZeroUsize::new(2).unwrap(),
//!         output_count: NonZeroUsize::new(1).unwrap(),
//!         ..GeneticConfig::default()
//!     };
//!
//!     let population_config = PopulationConfig {
//!         size: NonZeroUsize::new(50).unwrap(),
//!         episode_steps: 50,
//!         ..PopulationConfig::default()
//!     };
//!
//!     let mut population = Population::with_seed(population_config, genetic_config, 2002);
//!     let mut logger = EvolutionLogger::new();
//!     for _ in 0..10 {
//!         let report = population.run_generation(|| Tracker { tick: 0, score: 0.0 });
//!         logger.log(report);
//!     }
//!
//!     let best = logger.best_generation().unwrap();
//!     assert!(best.best_fitness <= 50.0);
//!     println!(
//!         "Best so far: {}",
//!         serde_json::to_string(population.best_ever().unwrap()).unwrap()
//!     );
//! }
//! ```

pub mod evaluation;
pub mod genomics;
pub mod networks;
pub mod populations;

/// Historical marking of a gene, and identifier of a node.
pub type Innovation = usize;

pub use evaluation::{Environment, EpisodeEvaluator};
pub use genomics::{GeneticConfig, Genome, History};
pub use networks::{ActivationType, Network};
pub use populations::{Population, PopulationConfig};
