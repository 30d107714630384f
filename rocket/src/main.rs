mod environment;

use environment::RocketEnvironment;
use evoneat::genomics::GeneticConfig;
use evoneat::populations::{EvolutionLogger, Population, PopulationConfig, ReportingLevel};

use serde::{Deserialize, Serialize};

use std::error::Error;
use std::fs;
use std::num::NonZeroUsize;

/// Seconds of simulated time per tick.
const DELTA_TIME: f64 = 1.0 / 30.0;

/// Run settings, optionally loaded from a RON file
/// given as the first command line argument.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct RunConfig {
    generations: usize,
    seed: Option<u64>,
    genetic: GeneticConfig,
    population: PopulationConfig,
    /// Where the best genome and its replay are written.
    output_prefix: String,
}

impl Default for RunConfig {
    fn default() -> RunConfig {
        RunConfig {
            generations: 100,
            seed: None,
            genetic: GeneticConfig {
                input_count: NonZeroUsize::new(6).unwrap(),
                bias_count: 1,
                output_count: NonZeroUsize::new(2).unwrap(),
                ..GeneticConfig::default()
            },
            population: PopulationConfig {
                reporting_level: ReportingLevel::PopulationChampion,
                ..PopulationConfig::default()
            },
            output_prefix: "rocket".into(),
        }
    }
}

fn load_config() -> Result<RunConfig, Box<dyn Error>> {
    match std::env::args().nth(1) {
        Some(path) => Ok(ron::from_str(&fs::read_to_string(path)?)?),
        None => Ok(RunConfig::default()),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let config = load_config()?;
    let mut population = match config.seed {
        Some(seed) => Population::with_seed(
            config.population.clone(),
            config.genetic.clone(),
            seed,
        ),
        None => Population::new(config.population.clone(), config.genetic.clone()),
    };

    let mut logger = EvolutionLogger::new();
    for _ in 0..config.generations {
        let report = population.run_generation(|| RocketEnvironment::new(DELTA_TIME));
        println!("{}", report);
        logger.log(report);
    }

    if let Some(best) = logger.best_generation() {
        println!(
            "Best generation: {} with fitness {:.4}",
            best.generation, best.best_fitness
        );
        if let Some(champion) = &best.population_champion {
            fs::write(
                format!("{}_champion.ron", config.output_prefix),
                ron::to_string(champion)?,
            )?;
        }
        if let Some(trajectory) = &best.champion_trajectory {
            fs::write(
                format!("{}_trajectory.ron", config.output_prefix),
                ron::to_string(trajectory)?,
            )?;
        }
    }
    Ok(())
}
