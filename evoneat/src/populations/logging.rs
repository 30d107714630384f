use super::SpeciesID;
use crate::evaluation::TrajectoryStep;
use crate::genomics::Genome;

use serde::{Deserialize, Serialize};

use std::cmp::Ordering;
use std::fmt;

/// Defines different possible reporting levels for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportingLevel {
    /// Clones every species' full membership.
    AllGenomes,
    /// Clones species and their champions.
    SpeciesChampions,
    /// Clones only the population champion.
    PopulationChampion,
    /// Clones no genomes.
    NoGenomes,
}

/// Per-species data in a generation report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeciesSummary {
    pub id: SpeciesID,
    pub size: usize,
    pub best_fitness: f64,
    pub best_fitness_ever: f64,
    pub adjusted_fitness_sum: f64,
    pub generations_since_improvement: usize,
    /// Offspring allotted to the species for the next generation,
    /// not counting leftover slots.
    pub offspring: usize,
    /// Member genomes, as dictated by the [`ReportingLevel`].
    pub members: Vec<Genome>,
}

/// A snapshot of a population at the end of a generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generation: usize,
    pub species: Vec<SpeciesSummary>,
    pub best_fitness: f64,
    pub worst_fitness: f64,
    pub average_fitness: f64,
    pub best_adjusted_fitness: f64,
    pub worst_adjusted_fitness: f64,
    pub fitness_stats: Stats,
    /// Species with the highest adjusted fitness sum.
    pub strongest_species: Option<SpeciesID>,
    /// Species with the lowest adjusted fitness sum.
    pub weakest_species: Option<SpeciesID>,
    /// Offspring slots left unallotted by rounding,
    /// filled from the strongest species.
    pub leftover_offspring: usize,
    pub generations_since_innovation: usize,
    pub innovation_count: usize,
    pub population_champion: Option<Genome>,
    pub champion_trajectory: Option<Vec<TrajectoryStep>>,
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Report {{\n\
            \tgeneration: {:?}\n\
            \tspecies_count: {:?}\n\
            \tfitness: {:?}\n\
            \tadjusted_fitness: [{:.4}, {:.4}]\n\
            \tgenerations_since_innovation: {:?}\n\
            {}\
            }}",
            self.generation,
            self.species.len(),
            self.fitness_stats,
            self.worst_adjusted_fitness,
            self.best_adjusted_fitness,
            self.generations_since_innovation,
            self.species
                .iter()
                .map(|s| format!(
                    "\t{:?}: {} members, best {:.4}, stagnant {}, offspring {}\n",
                    s.id, s.size, s.best_fitness, s.generations_since_improvement, s.offspring
                ))
                .collect::<Vec<_>>()
                .join("")
        )
    }
}

/// A struct for reporting basic statistical data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub maximum: f64,
    pub minimum: f64,
    pub mean: f64,
    pub median: f64,
}

impl Stats {
    /// Returns statistics about numbers in a sequence.
    /// An empty sequence yields all zeros.
    ///
    /// # Examples
    /// ```
    /// use evoneat::populations::logging::Stats;
    ///
    /// let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied());
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    /// ```
    pub fn from(data: impl Iterator<Item = f64>) -> Stats {
        let mut data: Vec<f64> = data.collect();
        if data.is_empty() {
            return Stats {
                maximum: 0.0,
                minimum: 0.0,
                mean: 0.0,
                median: 0.0,
            };
        }
        let (mut max, mut min, mut sum) = (f64::MIN, f64::MAX, 0.0);
        for d in &data {
            max = d.max(max);
            min = d.min(min);
            sum += d;
        }
        let mean = sum / data.len() as f64;

        data.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        let mid = data.len() / 2;
        let median = if data.len() % 2 == 0 {
            (data[mid - 1] + data[mid]) / 2.0
        } else {
            data[mid]
        };

        Stats {
            maximum: max,
            minimum: min,
            mean,
            median,
        }
    }
}

/// A log of the evolution of a population over time.
#[derive(Clone, Debug, Default)]
pub struct EvolutionLogger {
    reports: Vec<GenerationReport>,
}

impl EvolutionLogger {
    /// Returns an empty logger.
    pub fn new() -> EvolutionLogger {
        EvolutionLogger::default()
    }

    /// Store a generation report.
    pub fn log(&mut self, report: GenerationReport) {
        self.reports.push(report);
    }

    /// Iterate over all logged reports.
    pub fn iter(&self) -> impl Iterator<Item = &GenerationReport> {
        self.reports.iter()
    }

    /// Returns the most recently logged report.
    pub fn last(&self) -> Option<&GenerationReport> {
        self.reports.last()
    }

    /// Returns the best raw fitness of each logged generation.
    pub fn best_fitness_history(&self) -> Vec<(usize, f64)> {
        self.reports
            .iter()
            .map(|r| (r.generation, r.best_fitness))
            .collect()
    }

    /// Returns the report of the generation with the highest
    /// best fitness, if any was logged.
    pub fn best_generation(&self) -> Option<&GenerationReport> {
        self.reports.iter().max_by(|r1, r2| {
            r1.best_fitness
                .partial_cmp(&r2.best_fitness)
                .unwrap_or(Ordering::Equal)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_even_median() {
        let stats = Stats::from([4.0, 1.0, 3.0, 2.0].iter().copied());
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.maximum, 4.0);
        assert_eq!(stats.minimum, 1.0);
    }

    #[test]
    fn stats_empty() {
        let stats = Stats::from(std::iter::empty());
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.median, 0.0);
    }
}
