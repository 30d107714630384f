use super::{PopulationConfig, Species, SpeciesID};
use crate::genomics::{GeneticConfig, Genome};

use rand::Rng;

/// A genome produced for the next generation.
#[derive(Clone, Debug)]
pub(super) struct Offspring {
    pub genome: Genome,
    /// Species champions copied as-is; exempt from mutation.
    pub preserved: bool,
}

/// The output of a reproduction phase.
#[derive(Debug)]
pub(super) struct Brood {
    pub offspring: Vec<Offspring>,
    /// Offspring allotted to each species, in species order.
    pub allotted: Vec<(SpeciesID, usize)>,
    pub leftover: usize,
}

/// Auxiliary type for offspring generation.
/// Handles all the tasks of generating a population's
/// offspring according to the specified configs
/// and allotted offspring.
///
/// Species members must be sorted by decreasing fitness.
pub(super) struct OffspringFactory<'a, R: Rng + ?Sized> {
    species: &'a [Species],
    genetic_config: &'a GeneticConfig,
    population_config: &'a PopulationConfig,
    rng: &'a mut R,
}

impl<'a, R: Rng + ?Sized> OffspringFactory<'a, R> {
    pub(super) fn new(
        species: &'a [Species],
        genetic_config: &'a GeneticConfig,
        population_config: &'a PopulationConfig,
        rng: &'a mut R,
    ) -> OffspringFactory<'a, R> {
        OffspringFactory {
            species,
            genetic_config,
            population_config,
            rng,
        }
    }

    /// Generates a full population's worth of offspring,
    /// given the population's total adjusted fitness.
    pub(super) fn generate_offspring(&mut self, total_adjusted_fitness: f64) -> Brood {
        let population_size = self.population_config.size.get();
        let quotas = self.allot_offspring(total_adjusted_fitness);
        let species = self.species;
        let survivors: Vec<&'a [Genome]> = species
            .iter()
            .map(|s| &s.genomes[..s.count_survivors(self.population_config.survival_threshold)])
            .collect();

        let mut offspring = Vec::with_capacity(population_size);
        for (species_index, &quota) in quotas.iter().enumerate() {
            for slot in 0..quota {
                offspring.push(self.breed(species_index, slot, &survivors));
            }
        }

        let allotted_count = offspring.len();
        let leftover = population_size - allotted_count;
        if let Some(strongest) = self.strongest_species() {
            let parents = survivors[strongest];
            for _ in 0..leftover {
                let parent1 = roulette(parents, self.rng);
                let parent2 = roulette(parents, self.rng);
                offspring.push(Offspring {
                    genome: self.crossover(parent1, parent2),
                    preserved: false,
                });
            }
        }
        debug_assert_eq!(offspring.len(), population_size);

        Brood {
            offspring,
            allotted: self
                .species
                .iter()
                .map(|s| s.id())
                .zip(quotas)
                .collect(),
            leftover,
        }
    }

    /// Computes each species' offspring quota, proportional to
    /// its (stagnation-penalized) adjusted fitness sum. Quotas are
    /// rounded down, and never exceed the remaining slots.
    fn allot_offspring(&self, total_adjusted_fitness: f64) -> Vec<usize> {
        let population_size = self.population_config.size.get();
        let stagnation_threshold = self.population_config.stagnation_threshold.get();
        let mut remaining = population_size;

        self.species
            .iter()
            .map(|s| {
                let mut fitness = s.adjusted_fitness_sum();
                if s.is_stagnant(stagnation_threshold) {
                    fitness *= 1.0 - self.population_config.stagnation_penalty;
                }
                let share = (fitness / total_adjusted_fitness * population_size as f64).floor();
                let quota = if s.is_empty() {
                    0
                } else {
                    (share.max(0.0) as usize).min(remaining)
                };
                remaining -= quota;
                log::debug!("species {:?} allotted {} offspring", s.id(), quota);
                quota
            })
            .collect()
    }

    /// Index of the non-empty species with the
    /// highest adjusted fitness sum.
    fn strongest_species(&self) -> Option<usize> {
        self.species
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.is_empty())
            .fold(None, |best: Option<(usize, f64)>, (i, s)| match best {
                Some((_, fitness)) if fitness >= s.adjusted_fitness_sum() => best,
                _ => Some((i, s.adjusted_fitness_sum())),
            })
            .map(|(i, _)| i)
    }

    /// Produces the offspring for one slot of a species,
    /// applying the first matching rule: champion copy,
    /// asexual clone of a sole survivor, mutation-only
    /// clone, or crossover.
    fn breed(
        &mut self,
        species_index: usize,
        slot: usize,
        survivors: &[&'a [Genome]],
    ) -> Offspring {
        let species = &self.species[species_index];
        let parents = survivors[species_index];

        if slot == 0 && species.len() > self.population_config.champion_preservation_threshold {
            return Offspring {
                genome: parents[0].clone(),
                preserved: true,
            };
        }
        if parents.len() == 1 {
            return Offspring {
                genome: parents[0].clone(),
                preserved: false,
            };
        }
        if self.rng.gen::<f64>() < self.population_config.asexual_reproduction_chance {
            return Offspring {
                genome: roulette(parents, self.rng).clone(),
                preserved: false,
            };
        }

        let parent1 = roulette(parents, self.rng);
        let parent2 = if self.survivors_elsewhere(species_index, survivors)
            && self.rng.gen::<f64>() < self.population_config.interspecies_mating_chance
        {
            let others: Vec<usize> = (0..survivors.len())
                .filter(|&i| i != species_index && !survivors[i].is_empty())
                .collect();
            let other = others[self.rng.gen_range(0..others.len())];
            log::trace!(
                "interspecies mating between {:?} and {:?}",
                species.id(),
                self.species[other].id()
            );
            roulette(survivors[other], self.rng)
        } else {
            roulette(parents, self.rng)
        };
        Offspring {
            genome: self.crossover(parent1, parent2),
            preserved: false,
        }
    }

    fn survivors_elsewhere(&self, species_index: usize, survivors: &[&[Genome]]) -> bool {
        survivors
            .iter()
            .enumerate()
            .any(|(i, s)| i != species_index && !s.is_empty())
    }

    fn crossover(&mut self, parent1: &Genome, parent2: &Genome) -> Genome {
        Genome::crossover(parent1, parent2, self.genetic_config, self.rng)
    }
}

/// Fitness-proportionate selection. Falls back to the
/// first member if the fitness sum is not positive.
///
/// # Panics
///
/// Panics if `members` is empty.
pub(super) fn roulette<'g, R: Rng + ?Sized>(members: &'g [Genome], rng: &mut R) -> &'g Genome {
    let fitness_sum: f64 = members.iter().map(|g| g.fitness()).sum();
    if fitness_sum <= 0.0 || !fitness_sum.is_finite() {
        return &members[0];
    }
    let target = rng.gen_range(0.0..fitness_sum);
    let mut running_sum = 0.0;
    for member in members {
        running_sum += member.fitness();
        if running_sum >= target {
            return member;
        }
    }
    &members[members.len() - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{History, NodeType};
    use crate::Innovation;
    use rand::{rngs::StdRng, SeedableRng};
    use std::num::NonZeroUsize;

    fn genome_with_fitness(fitness: f64) -> Genome {
        let mut genome = Genome::empty();
        genome.add_node(NodeType::Input);
        genome.add_node(NodeType::Output);
        genome.set_fitness(fitness);
        genome
    }

    /// A genome with a second output node, carrying the
    /// given `(innovation, input, output)` genes.
    fn marked_genome(fitness: f64, genes: &[(Innovation, Innovation, Innovation)]) -> Genome {
        let mut genome = genome_with_fitness(fitness);
        genome.add_node(NodeType::Output);
        for &(innovation, input, output) in genes {
            genome.add_gene(innovation, input, output, 1.0, false);
        }
        genome
    }

    fn sorted_species(id: usize, members: Vec<Genome>) -> Species {
        let mut members = members.into_iter();
        let mut species = Species::new(SpeciesID(0, id), members.next().unwrap(), 0);
        for genome in members {
            species.add_genome(genome);
        }
        species.update_fitness();
        species.sort_by_decreasing_fitness();
        species
    }

    /// Builds sorted, fitness-updated species from raw fitness lists.
    fn species_from(fitnesses: &[&[f64]]) -> (Vec<Species>, f64) {
        let all_species: Vec<Species> = fitnesses
            .iter()
            .enumerate()
            .map(|(i, members)| {
                let mut species =
                    Species::new(SpeciesID(0, i), genome_with_fitness(members[0]), 0);
                for &fitness in &members[1..] {
                    species.add_genome(genome_with_fitness(fitness));
                }
                species.update_fitness();
                species.sort_by_decreasing_fitness();
                species
            })
            .collect();
        let total = all_species
            .iter()
            .map(|s| s.adjusted_fitness_sum())
            .sum::<f64>()
            .max(1.0);
        (all_species, total)
    }

    fn config(size: usize) -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::new(size).unwrap(),
            survival_threshold: 0.5,
            asexual_reproduction_chance: 0.25,
            interspecies_mating_chance: 0.001,
            champion_preservation_threshold: 5,
            ..PopulationConfig::zero()
        }
    }

    #[test]
    fn quotas_are_proportional_and_sum_to_size() {
        // Adjusted sums 6, 2 and 1 out of 9, over 10 slots.
        let (species, total) = species_from(&[&[6.0, 6.0], &[2.0], &[1.0, 1.0, 1.0]]);
        let population_config = config(10);
        let genetic_config = GeneticConfig::zero();
        let mut rng = StdRng::seed_from_u64(0);
        let mut factory =
            OffspringFactory::new(&species, &genetic_config, &population_config, &mut rng);

        let brood = factory.generate_offspring(total);
        let quotas: Vec<usize> = brood.allotted.iter().map(|(_, q)| *q).collect();
        assert_eq!(quotas, vec![6, 2, 1]);
        assert_eq!(brood.leftover, 1);
        assert_eq!(brood.offspring.len(), 10);
        assert_eq!(quotas.iter().sum::<usize>() + brood.leftover, 10);
    }

    #[test]
    fn zero_fitness_population_fills_from_leftovers() {
        let (species, total) = species_from(&[&[0.0, 0.0, 0.0], &[0.0, 0.0]]);
        assert_eq!(total, 1.0);
        let population_config = config(7);
        let genetic_config = GeneticConfig::zero();
        let mut rng = StdRng::seed_from_u64(1);
        let brood = OffspringFactory::new(&species, &genetic_config, &population_config, &mut rng)
            .generate_offspring(total);
        assert_eq!(brood.leftover, 7);
        assert_eq!(brood.offspring.len(), 7);
        assert!(brood.offspring.iter().all(|o| !o.preserved));
    }

    #[test]
    fn champions_are_preserved_in_large_species() {
        let (species, total) = species_from(&[&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[1.0; 5]]);
        let population_config = config(20);
        let genetic_config = GeneticConfig::zero();
        let mut rng = StdRng::seed_from_u64(2);
        let brood = OffspringFactory::new(&species, &genetic_config, &population_config, &mut rng)
            .generate_offspring(total);

        let preserved: Vec<&Offspring> = brood.offspring.iter().filter(|o| o.preserved).collect();
        // Only the six-member species qualifies.
        assert_eq!(preserved.len(), 1);
        assert_eq!(preserved[0].genome.fitness(), 6.0);
        assert!(brood.offspring[0].preserved);
    }

    #[test]
    fn sole_survivor_is_cloned() {
        let mut history = History::new();
        let mut parent = genome_with_fitness(3.0);
        parent.add_gene(history.get_or_create(0, 1), 0, 1, 0.5, false);
        let mut species = Species::new(SpeciesID(0, 0), parent.clone(), 0);
        species.update_fitness();

        let population_config = config(4);
        let genetic_config = GeneticConfig::zero();
        let mut rng = StdRng::seed_from_u64(3);
        let brood = OffspringFactory::new(
            std::slice::from_ref(&species),
            &genetic_config,
            &population_config,
            &mut rng,
        )
        .generate_offspring(species.adjusted_fitness_sum().max(1.0));

        assert_eq!(brood.offspring.len(), 4);
        for offspring in &brood.offspring {
            assert!(!offspring.preserved);
            assert_eq!(
                offspring.genome.genes().collect::<Vec<_>>(),
                parent.genes().collect::<Vec<_>>()
            );
        }
    }

    #[test]
    fn culled_members_never_breed() {
        // Survivors are the top two (fitness 10 and 9); the others carry
        // a distinguishing gene that must never be inherited.
        let mut history = History::new();
        let marker = history.get_or_create(0, 1);
        let mut species = Species::new(SpeciesID(0, 0), genome_with_fitness(10.0), 0);
        species.add_genome(genome_with_fitness(9.0));
        for fitness in [1.0, 2.0] {
            let mut genome = genome_with_fitness(fitness);
            genome.add_gene(marker, 0, 1, 1.0, false);
            species.add_genome(genome);
        }
        species.update_fitness();
        species.sort_by_decreasing_fitness();

        let population_config = config(50);
        let genetic_config = GeneticConfig::zero();
        let mut rng = StdRng::seed_from_u64(4);
        let brood = OffspringFactory::new(
            std::slice::from_ref(&species),
            &genetic_config,
            &population_config,
            &mut rng,
        )
        .generate_offspring(species.adjusted_fitness_sum());
        assert!(brood
            .offspring
            .iter()
            .all(|o| o.genome.gene(marker).is_none()));
    }

    #[test]
    fn leftovers_come_from_the_strongest_species() {
        // Adjusted sums 1, 6 and 2 out of 9, over 10 slots: one leftover.
        let mut history = History::new();
        let marker = history.get_or_create(0, 2);
        let species = vec![
            sorted_species(0, vec![genome_with_fitness(1.0); 3]),
            sorted_species(1, vec![marked_genome(6.0, &[(marker, 0, 2)]); 2]),
            sorted_species(2, vec![genome_with_fitness(2.0)]),
        ];
        let population_config = config(10);
        let genetic_config = GeneticConfig::zero();
        let mut rng = StdRng::seed_from_u64(6);
        let brood = OffspringFactory::new(&species, &genetic_config, &population_config, &mut rng)
            .generate_offspring(9.0);

        let quotas: Vec<usize> = brood.allotted.iter().map(|(_, q)| *q).collect();
        assert_eq!(quotas, vec![1, 6, 2]);
        assert_eq!(brood.leftover, 1);
        let leftover = brood.offspring.last().unwrap();
        assert!(!leftover.preserved);
        assert!(leftover.genome.gene(marker).is_some());
    }

    #[test]
    fn mutation_only_offspring_are_single_parent_copies() {
        let mut history = History::new();
        let first = history.get_or_create(0, 1);
        let second = history.get_or_create(0, 2);
        let species = sorted_species(
            0,
            vec![
                marked_genome(1.0, &[(first, 0, 1)]),
                marked_genome(1.0, &[(second, 0, 2)]),
            ],
        );
        let population_config = PopulationConfig {
            survival_threshold: 1.0,
            asexual_reproduction_chance: 1.0,
            ..config(30)
        };
        let genetic_config = GeneticConfig::zero();
        let mut rng = StdRng::seed_from_u64(7);
        let brood = OffspringFactory::new(
            std::slice::from_ref(&species),
            &genetic_config,
            &population_config,
            &mut rng,
        )
        .generate_offspring(species.adjusted_fitness_sum());

        assert_eq!(brood.offspring.len(), 30);
        for offspring in &brood.offspring {
            assert!(!offspring.preserved);
            assert!(species
                .genomes()
                .any(|parent| parent.genes().eq(offspring.genome.genes())));
        }
        // Equal-fitness crossover would have merged both genes.
        assert!(brood
            .offspring
            .iter()
            .all(|o| o.genome.gene(first).is_none() || o.genome.gene(second).is_none()));
    }

    #[test]
    fn interspecies_mating_crosses_species() {
        let mut history = History::new();
        let first = history.get_or_create(0, 1);
        let second = history.get_or_create(0, 2);
        let species = vec![
            sorted_species(0, vec![marked_genome(1.0, &[(first, 0, 1)]); 2]),
            sorted_species(1, vec![marked_genome(1.0, &[(second, 0, 2)]); 2]),
        ];
        let population_config = PopulationConfig {
            survival_threshold: 1.0,
            asexual_reproduction_chance: 0.0,
            interspecies_mating_chance: 1.0,
            ..config(40)
        };
        let genetic_config = GeneticConfig::zero();
        let mut rng = StdRng::seed_from_u64(8);
        let brood = OffspringFactory::new(&species, &genetic_config, &population_config, &mut rng)
            .generate_offspring(2.0);

        assert_eq!(brood.leftover, 0);
        assert_eq!(brood.offspring.len(), 40);
        for offspring in &brood.offspring {
            assert!(offspring.genome.gene(first).is_some());
            assert!(offspring.genome.gene(second).is_some());
        }
    }

    #[test]
    fn roulette_selection() {
        let mut rng = StdRng::seed_from_u64(5);
        let members = vec![genome_with_fitness(0.0), genome_with_fitness(0.0)];
        for _ in 0..10 {
            assert!(std::ptr::eq(roulette(&members, &mut rng), &members[0]));
        }

        let members = vec![
            genome_with_fitness(0.0),
            genome_with_fitness(3.0),
            genome_with_fitness(1.0),
        ];
        let mut counts = [0; 3];
        for _ in 0..4000 {
            let chosen = roulette(&members, &mut rng);
            let index = members.iter().position(|m| std::ptr::eq(m, chosen)).unwrap();
            counts[index] += 1;
        }
        assert!(counts[0] < 40);
        assert!(counts[1] > 2 * counts[2]);
    }
}
