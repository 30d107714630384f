use super::logging::ReportingLevel;

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for population generation
/// and evolution.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]. Using
/// values that are not in this bound may result
/// in odd behaviours and/or incorrect programs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Size of the population.
    pub size: NonZeroUsize,
    /// Maximum number of simulation steps per
    /// evaluation episode.
    pub episode_steps: usize,
    /// Genetic distance threshold, beyond which
    /// genomes are considered as belonging to
    /// different species.
    pub distance_threshold: f64,
    /// Number of generations without a fitness increase
    /// before a species is considered _stagnated_.
    pub stagnation_threshold: NonZeroUsize,
    /// Offspring allotment penalty for stagnation.
    /// Stagnated species will receive this percentage
    /// fewer offspring.
    pub stagnation_penalty: f64,
    /// Top % of each species which can participate
    /// in mating. Rounded up.
    pub survival_threshold: f64,
    /// Chance that an offspring will be a mutated
    /// copy of a single parent instead of the result
    /// of crossover.
    pub asexual_reproduction_chance: f64,
    /// Chance that genomes from different species
    /// will be selected to mate.
    pub interspecies_mating_chance: f64,
    /// Species with more members than this have their
    /// champion copied unmutated into the next generation.
    pub champion_preservation_threshold: usize,
    /// Which genomes are cloned into generation reports.
    pub reporting_level: ReportingLevel,
    /// Whether each generation's best genome is replayed
    /// and its trajectory attached to the generation report.
    pub record_champion_trajectory: bool,
}

impl PopulationConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, empty, or in the case of
    /// `NonZeroUsize`s, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to abbreviate configuration
    /// instantiation, or to fill in unused values.
    ///
    /// # Examples
    /// ```
    /// use evoneat::populations::PopulationConfig;
    ///
    /// let cfg1 = PopulationConfig::zero();
    ///
    /// let cfg2 = PopulationConfig {
    ///     // Specify some values here...
    ///     stagnation_penalty: 0.5,
    ///     // Default the rest...
    ///     ..PopulationConfig::zero()
    /// };
    /// ```
    pub const fn zero() -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::MIN,
            episode_steps: 0,
            distance_threshold: 0.0,
            stagnation_threshold: NonZeroUsize::MIN,
            stagnation_penalty: 0.0,
            survival_threshold: 0.0,
            asexual_reproduction_chance: 0.0,
            interspecies_mating_chance: 0.0,
            champion_preservation_threshold: 0,
            reporting_level: ReportingLevel::NoGenomes,
            record_champion_trajectory: false,
        }
    }
}

impl Default for PopulationConfig {
    /// Reference values: 150 genomes, 1000-step episodes,
    /// a compatibility threshold of 3.0, culling of the bottom
    /// half of each species, 25% mutation-only offspring, 0.1%
    /// interspecies mating, and champion preservation in species
    /// of more than 5 members.
    fn default() -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::new(150).unwrap(),
            episode_steps: 1000,
            distance_threshold: 3.0,
            stagnation_threshold: NonZeroUsize::new(15).unwrap(),
            stagnation_penalty: 0.0,
            survival_threshold: 0.5,
            asexual_reproduction_chance: 0.25,
            interspecies_mating_chance: 0.001,
            champion_preservation_threshold: 5,
            reporting_level: ReportingLevel::SpeciesChampions,
            record_champion_trajectory: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_roundtrip() {
        let config = PopulationConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<PopulationConfig>(&json).unwrap(), config);
    }
}
