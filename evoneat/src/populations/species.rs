use crate::genomics::Genome;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use std::cmp::Ordering;

/// Species identifier. Specifies
/// the generation in which the species
/// was born, and the count of other species
/// generated in the _same generation_ before
/// the one identified (i.e, if it was the
/// third species born in generation 5, it
/// will be species [5, 2]).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SpeciesID(pub usize, pub usize);

/// Species are collections of reproductively
/// compatible (within a certain [genetic distance])
/// genomes. Membership is determined by calculating
/// the genetic distance to a _representative_, a
/// randomly chosen member of the species' previous
/// membership.
///
/// Membership is rebuilt from scratch every generation,
/// while the species' record fitness and stagnation
/// counter carry over.
///
/// [genetic distance]: crate::populations::PopulationConfig::distance_threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species {
    id: SpeciesID,
    pub(super) genomes: Vec<Genome>,
    first_seen: usize,
    best_fitness: f64,
    best_fitness_ever: f64,
    generations_since_improvement: usize,
    adjusted_fitness_sum: f64,
}

impl Species {
    /// Creates a new species with the specified ID,
    /// founded by `founder` in generation `first_seen`.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::Genome;
    /// use evoneat::populations::{Species, SpeciesID};
    ///
    /// let species = Species::new(SpeciesID(1, 0), Genome::empty(), 1);
    /// assert_eq!(species.genomes().count(), 1);
    /// assert_eq!(species.first_seen(), 1);
    /// ```
    pub fn new(id: SpeciesID, founder: Genome, first_seen: usize) -> Species {
        Species {
            id,
            genomes: vec![founder],
            first_seen,
            best_fitness: f64::MIN,
            best_fitness_ever: f64::MIN,
            generations_since_improvement: 0,
            adjusted_fitness_sum: 0.0,
        }
    }

    /// Returns the species' ID.
    pub fn id(&self) -> SpeciesID {
        self.id
    }

    /// Adds a genome to the species.
    pub fn add_genome(&mut self, genome: Genome) {
        self.genomes.push(genome);
    }

    /// Draws a member uniformly at random to stand in as
    /// the species' representative.
    pub fn random_member<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Genome> {
        self.genomes.choose(rng)
    }

    /// Removes all members, keeping the species'
    /// identity and historical records.
    pub(super) fn clear_members(&mut self) {
        self.genomes.clear();
    }

    /// Computes each member's adjusted fitness and the
    /// species' fitness aggregates, and updates the
    /// stagnation counter. Called once per generation,
    /// after membership is settled.
    pub(super) fn update_fitness(&mut self) {
        let size = self.genomes.len() as f64;
        for genome in &mut self.genomes {
            genome.adjusted_fitness = genome.fitness / size;
        }
        self.adjusted_fitness_sum = self.genomes.iter().map(|g| g.adjusted_fitness).sum();
        self.best_fitness = self
            .genomes
            .iter()
            .map(|g| g.fitness)
            .fold(f64::MIN, f64::max);

        if self.best_fitness > self.best_fitness_ever {
            self.best_fitness_ever = self.best_fitness;
            self.generations_since_improvement = 0;
        } else {
            self.generations_since_improvement += 1;
        }
    }

    /// Sorts members by descending raw fitness.
    pub(super) fn sort_by_decreasing_fitness(&mut self) {
        self.genomes.sort_by(|g1, g2| {
            g2.fitness
                .partial_cmp(&g1.fitness)
                .unwrap_or(Ordering::Equal)
        });
    }

    /// Returns the number of members surviving culling.
    /// Rounds up, so a non-empty species keeps at least one.
    pub(super) fn count_survivors(&self, survival_threshold: f64) -> usize {
        let survivors = (self.genomes.len() as f64 * survival_threshold).ceil() as usize;
        survivors.clamp(self.genomes.len().min(1), self.genomes.len())
    }

    /// Returns the sum of the members' adjusted fitnesses.
    pub fn adjusted_fitness_sum(&self) -> f64 {
        self.adjusted_fitness_sum
    }

    /// Returns the highest raw fitness among current members.
    pub fn best_fitness(&self) -> f64 {
        self.best_fitness
    }

    /// Returns the highest raw fitness any member
    /// of the species has ever achieved.
    pub fn best_fitness_ever(&self) -> f64 {
        self.best_fitness_ever
    }

    /// Returns the number of generations since the species'
    /// best fitness last improved.
    pub fn generations_since_improvement(&self) -> usize {
        self.generations_since_improvement
    }

    /// Returns the generation in which the species appeared.
    pub fn first_seen(&self) -> usize {
        self.first_seen
    }

    /// Returns whether the species has gone `stagnation_threshold`
    /// or more generations without improvement.
    pub fn is_stagnant(&self, stagnation_threshold: usize) -> bool {
        self.generations_since_improvement >= stagnation_threshold
    }

    /// Returns an iterator over the species' members.
    pub fn genomes(&self) -> impl Iterator<Item = &Genome> {
        self.genomes.iter()
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    /// Returns whether the species has no members.
    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }

    /// Returns the currently best-performing genome.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::Genome;
    /// use evoneat::populations::{Species, SpeciesID};
    ///
    /// let mut g1 = Genome::empty();
    /// let mut g2 = Genome::empty();
    /// let mut g3 = Genome::empty();
    /// g1.set_fitness(5.0);
    /// g2.set_fitness(20.0);
    /// g3.set_fitness(10.0);
    ///
    /// let mut species = Species::new(SpeciesID(1, 0), g1, 0);
    /// species.add_genome(g2.clone());
    /// species.add_genome(g3);
    ///
    /// assert_eq!(species.champion(), Some(&g2));
    /// ```
    pub fn champion(&self) -> Option<&Genome> {
        self.genomes.iter().max_by(|g1, g2| {
            g1.fitness
                .partial_cmp(&g2.fitness)
                .unwrap_or(Ordering::Equal)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn genome_with_fitness(fitness: f64) -> Genome {
        let mut genome = Genome::empty();
        genome.set_fitness(fitness);
        genome
    }

    fn species_with(fitnesses: &[f64]) -> Species {
        let mut species = Species::new(SpeciesID(0, 0), genome_with_fitness(fitnesses[0]), 0);
        for &fitness in &fitnesses[1..] {
            species.add_genome(genome_with_fitness(fitness));
        }
        species
    }

    #[test]
    fn adjusted_fitness_is_shared() {
        let mut species = species_with(&[4.0, 8.0, 12.0, 0.0]);
        species.update_fitness();
        let adjusted: Vec<f64> = species.genomes().map(|g| g.adjusted_fitness()).collect();
        assert_eq!(adjusted, vec![1.0, 2.0, 3.0, 0.0]);
        assert_eq!(species.adjusted_fitness_sum(), 6.0);
        assert_eq!(species.best_fitness(), 12.0);
    }

    #[test]
    fn records_persist_across_membership_rebuilds() {
        let mut species = species_with(&[3.0, 5.0]);
        species.update_fitness();
        assert_eq!(species.best_fitness_ever(), 5.0);
        assert_eq!(species.generations_since_improvement(), 0);

        for generation in 1..=3 {
            species.clear_members();
            species.add_genome(genome_with_fitness(4.0));
            species.update_fitness();
            assert_eq!(species.best_fitness_ever(), 5.0);
            assert_eq!(species.generations_since_improvement(), generation);
        }
        assert!(species.is_stagnant(3));
        assert!(!species.is_stagnant(4));

        species.clear_members();
        species.add_genome(genome_with_fitness(6.0));
        species.update_fitness();
        assert_eq!(species.best_fitness_ever(), 6.0);
        assert_eq!(species.generations_since_improvement(), 0);
    }

    #[test]
    fn survivors_round_up() {
        assert_eq!(species_with(&[1.0]).count_survivors(0.5), 1);
        assert_eq!(species_with(&[1.0, 1.0, 1.0]).count_survivors(0.5), 2);
        assert_eq!(species_with(&[1.0, 1.0, 1.0, 1.0]).count_survivors(0.5), 2);
        assert_eq!(species_with(&[1.0, 1.0]).count_survivors(0.0), 1);
        assert_eq!(species_with(&[1.0, 1.0]).count_survivors(1.0), 2);
    }

    #[test]
    fn sorting_and_champion() {
        let mut species = species_with(&[2.0, 7.0, -1.0, 3.0]);
        assert_eq!(species.champion().map(|g| g.fitness()), Some(7.0));
        species.sort_by_decreasing_fitness();
        let sorted: Vec<f64> = species.genomes().map(|g| g.fitness()).collect();
        assert_eq!(sorted, vec![7.0, 3.0, 2.0, -1.0]);
    }

    #[test]
    fn random_member_of_empty_species() {
        let mut species = species_with(&[1.0]);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(species.random_member(&mut rng).is_some());
        species.clear_members();
        assert!(species.random_member(&mut rng).is_none());
        assert!(species.is_empty());
    }
}
