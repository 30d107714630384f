//! Genomes are the focus of evolution in NEAT.
//! They are a collection of genes and nodes that can be instantiated
//! as a phenotype (a neural network). Genomes can be progressively mutated,
//! thus adding complexity and functionality.
//!
//! Genes are kept sorted by innovation number at all times, which
//! lets crossover and genetic distance align two genomes with a
//! single merge-walk over their gene lists.

mod config;
mod errors;
mod genes;
mod history;
mod nodes;

pub use config::GeneticConfig;
pub use errors::{GeneAdditionMutationError, GenomeInvariantError, NodeAdditionMutationError};
pub use genes::Gene;
pub use history::History;
pub use nodes::{Node, NodeType};

use crate::populations::SpeciesID;
use crate::Innovation;

use rand::Rng;
use serde::{Deserialize, Serialize};

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::ops::RangeInclusive;

/// Fitness values closer than this are considered equal
/// when deciding which parent's unmatched genes are inherited.
pub const FITNESS_TOLERANCE: f64 = 1e-6;

/// A mutable collection of genes and nodes.
///
/// Node ids are dense, starting at 0, so a node's id
/// is also its position in the node list. Genes are
/// ordered by ascending innovation number.
///
/// Suports Serde for convenient genome saving and loading.
/// Loaded genomes are checked against every genome invariant.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(try_from = "GenomeParts")]
pub struct Genome {
    nodes: Vec<Node>,
    genes: Vec<Gene>,
    species: Option<SpeciesID>,
    pub(crate) fitness: f64,
    pub(crate) adjusted_fitness: f64,
}

/// Unchecked serialized form of a [`Genome`].
#[derive(Deserialize)]
struct GenomeParts {
    nodes: Vec<Node>,
    genes: Vec<Gene>,
    species: Option<SpeciesID>,
    fitness: f64,
    adjusted_fitness: f64,
}

impl TryFrom<GenomeParts> for Genome {
    type Error = GenomeInvariantError;

    fn try_from(parts: GenomeParts) -> Result<Genome, GenomeInvariantError> {
        let genome = Genome {
            nodes: parts.nodes,
            genes: parts.genes,
            species: parts.species,
            fitness: parts.fitness,
            adjusted_fitness: parts.adjusted_fitness,
        };
        genome.check_invariants()?;
        Ok(genome)
    }
}

impl Genome {
    /// Create a new genome with the specified configuration.
    ///
    /// Input nodes come first, followed by bias nodes and
    /// then output nodes. Every input/bias-output pair is
    /// connected with probability [`initial_expression_chance`],
    /// with innovation numbers obtained from `history`.
    ///
    /// [`initial_expression_chance`]: GeneticConfig::initial_expression_chance
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::{GeneticConfig, Genome, History, NodeType};
    /// use rand::{rngs::StdRng, SeedableRng};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     bias_count: 1,
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     initial_expression_chance: 1.0,
    ///     weight_min: -1.0,
    ///     weight_max: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut history = History::new();
    /// let mut rng = StdRng::seed_from_u64(0);
    ///
    /// let genome = Genome::new(&config, &mut history, &mut rng);
    ///
    /// assert_eq!(genome.nodes().count(), 3 + 1 + 2);
    /// assert_eq!(genome.nodes().filter(|n| n.node_type() == NodeType::Output).count(), 2);
    /// // Every sensor is connected to every output.
    /// assert_eq!(genome.genes().count(), (3 + 1) * 2);
    /// assert!(genome.genes().all(|g| g.weight().abs() <= 1.0));
    /// ```
    pub fn new<R: Rng + ?Sized>(
        config: &GeneticConfig,
        history: &mut History,
        rng: &mut R,
    ) -> Genome {
        let mut genome = Genome::empty();
        let input_count = config.input_count.get();
        let sensor_count = input_count + config.bias_count;

        for _ in 0..input_count {
            genome.add_node(NodeType::Input);
        }
        for _ in 0..config.bias_count {
            genome.add_node(NodeType::Bias);
        }
        for _ in 0..config.output_count.get() {
            genome.add_node(NodeType::Output);
        }

        if config.initial_expression_chance > 0.0 {
            for input in 0..sensor_count {
                for output in sensor_count..sensor_count + config.output_count.get() {
                    if rng.gen::<f64>() < config.initial_expression_chance {
                        let id = history.get_or_create(input, output);
                        let weight = Gene::random_weight(config, rng);
                        genome.add_gene(id, input, output, weight, false);
                    }
                }
            }
        }

        genome
    }

    /// Returns a genome with no nodes or genes.
    pub fn empty() -> Genome {
        Genome {
            nodes: vec![],
            genes: vec![],
            species: None,
            fitness: 0.0,
            adjusted_fitness: 0.0,
        }
    }

    /// Builds a genome from its raw parts, sorting the genes
    /// by innovation number.
    ///
    /// # Errors
    ///
    /// Returns an error if the parts break a genome invariant.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::{Gene, Genome, Node, NodeType};
    ///
    /// let genome = Genome::from_parts(
    ///     vec![Node::new(0, NodeType::Input), Node::new(1, NodeType::Output)],
    ///     vec![Gene::new(0, 0, 1, 0.5, false)],
    /// )
    /// .unwrap();
    /// assert_eq!(genome.genes().count(), 1);
    ///
    /// // Gene 1 ends in a node that doesn't exist.
    /// assert!(Genome::from_parts(
    ///     vec![Node::new(0, NodeType::Input)],
    ///     vec![Gene::new(1, 0, 4, 0.5, false)],
    /// )
    /// .is_err());
    /// ```
    pub fn from_parts(
        nodes: Vec<Node>,
        mut genes: Vec<Gene>,
    ) -> Result<Genome, GenomeInvariantError> {
        genes.sort_by_key(|g| g.innovation());
        let genome = Genome {
            nodes,
            genes,
            species: None,
            fitness: 0.0,
            adjusted_fitness: 0.0,
        };
        genome.check_invariants()?;
        Ok(genome)
    }

    /// Add a new node of the given type to the genome,
    /// with the next dense id. Returns the new node's id.
    pub fn add_node(&mut self, node_type: NodeType) -> Innovation {
        let id = self.nodes.len();
        self.nodes.push(Node::new(id, node_type));
        id
    }

    /// Add a new enabled gene to the genome, keeping genes
    /// sorted by innovation number.
    /// Returns a reference to the new gene.
    ///
    /// # Panics
    ///
    /// This function will panic if a gene with the same
    /// `gene_id` already existed in the genome, if either `input_id`
    /// or `output_id` do not correspond to nodes present in the genome,
    /// or if `output_id` corresponds to an input or bias node.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::{Genome, NodeType};
    ///
    /// let mut genome = Genome::empty();
    /// let input = genome.add_node(NodeType::Input);
    /// let hidden = genome.add_node(NodeType::Hidden);
    /// let output = genome.add_node(NodeType::Output);
    ///
    /// genome.add_gene(7, hidden, output, 1.0, false);
    /// genome.add_gene(2, input, hidden, -0.5, false);
    /// // Self-loop, evaluated with the previous activation.
    /// genome.add_gene(9, hidden, hidden, 0.25, true);
    ///
    /// let ids: Vec<_> = genome.genes().map(|g| g.innovation()).collect();
    /// assert_eq!(ids, vec![2, 7, 9]);
    /// ```
    pub fn add_gene(
        &mut self,
        gene_id: Innovation,
        input_id: Innovation,
        output_id: Innovation,
        weight: f64,
        recurrent: bool,
    ) -> &mut Gene {
        let position = self
            .check_gene_viability(gene_id, input_id, output_id)
            .unwrap_or_else(|e| panic!("{} in {}", e, self));
        self.genes.insert(
            position,
            Gene::new(gene_id, input_id, output_id, weight, recurrent),
        );
        &mut self.genes[position]
    }

    /// Checks whether a gene is a duplicate or is invalid
    /// for the genome. Returns the gene's insertion position.
    ///
    /// # Errors
    ///
    /// Returns an error if the gene is not viable.
    fn check_gene_viability(
        &self,
        gene_id: Innovation,
        input_id: Innovation,
        output_id: Innovation,
    ) -> Result<usize, GenomeInvariantError> {
        use GenomeInvariantError::*;
        let position = match self.genes.binary_search_by_key(&gene_id, |g| g.innovation()) {
            Ok(_) => return Err(DuplicateGeneID(gene_id)),
            Err(position) => position,
        };
        match (self.node(input_id), self.node(output_id)) {
            (Some(_), Some(output)) if output.node_type().is_sensor() => {
                Err(SensorEndpoint(output_id))
            }
            (Some(_), Some(_)) => Ok(position),
            _ => Err(NonexistantEndpoints(input_id, output_id)),
        }
    }

    /// Verifies every structural invariant of the genome:
    /// dense node ids, existing gene endpoints, no gene
    /// ending in a sensor node, and strictly ascending
    /// (hence unique) innovation numbers.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn check_invariants(&self) -> Result<(), GenomeInvariantError> {
        use GenomeInvariantError::*;
        for (index, node) in self.nodes.iter().enumerate() {
            if node.id() != index {
                return Err(MisplacedNode {
                    index,
                    id: node.id(),
                });
            }
        }
        for pair in self.genes.windows(2) {
            match pair[0].innovation().cmp(&pair[1].innovation()) {
                Ordering::Less => {}
                Ordering::Equal => return Err(DuplicateGeneID(pair[1].innovation())),
                Ordering::Greater => {
                    return Err(UnsortedGenes(pair[0].innovation(), pair[1].innovation()))
                }
            }
        }
        for gene in &self.genes {
            match (self.node(gene.input()), self.node(gene.output())) {
                (Some(_), Some(output)) if output.node_type().is_sensor() => {
                    return Err(SensorEndpoint(gene.output()))
                }
                (Some(_), Some(_)) => {}
                _ => return Err(NonexistantEndpoints(gene.input(), gene.output())),
            }
        }
        Ok(())
    }

    /// Returns whether `to` can be reached from `from` by following
    /// enabled, non-recurrent genes. A node always reaches itself.
    ///
    /// This is computed from the current genes on every call.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::{Genome, NodeType};
    ///
    /// let mut genome = Genome::empty();
    /// let input = genome.add_node(NodeType::Input);
    /// let hidden = genome.add_node(NodeType::Hidden);
    /// let output = genome.add_node(NodeType::Output);
    /// genome.add_gene(0, input, hidden, 1.0, false);
    /// genome.add_gene(1, hidden, output, 1.0, false);
    ///
    /// assert!(genome.reaches(input, output));
    /// assert!(!genome.reaches(output, input));
    /// ```
    pub fn reaches(&self, from: Innovation, to: Innovation) -> bool {
        if from == to {
            return true;
        }
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            for gene in self
                .genes
                .iter()
                .filter(|g| g.enabled() && !g.recurrent() && g.input() == current)
            {
                let next = gene.output();
                if next == to {
                    return true;
                }
                if !visited[next] {
                    visited[next] = true;
                    stack.push(next);
                }
            }
        }
        false
    }

    /// Induces a _weight mutation_ on every gene of the genome.
    ///
    /// Each weight is perturbed with probability [`weight_perturb_chance`],
    /// and otherwise replaced by a fresh random value.
    ///
    /// [`weight_perturb_chance`]: GeneticConfig::weight_perturb_chance
    pub fn mutate_weights<R: Rng + ?Sized>(&mut self, config: &GeneticConfig, rng: &mut R) {
        for gene in &mut self.genes {
            if rng.gen::<f64>() < config.weight_perturb_chance {
                gene.perturb_weight(config, rng);
            } else {
                gene.randomize_weight(config, rng);
            }
        }
    }

    /// Induces a _gene mutation_ in the genome.
    /// If successful, returns the newly added gene.
    ///
    /// A random source node is chosen, and the remaining nodes
    /// are scanned (from a random offset) for one that is not
    /// already a direct successor of it. The new gene is marked
    /// recurrent if its destination already reaches its source.
    ///
    /// # Errors
    ///
    /// Returns an error if the genome has fewer than two nodes, or
    /// the chosen source has no unconnected destination left.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::{GeneticConfig, Genome, History, NodeType};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let config = GeneticConfig {
    ///     weight_min: -1.0,
    ///     weight_max: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut genome = Genome::empty();
    /// genome.add_node(NodeType::Input);
    /// genome.add_node(NodeType::Output);
    ///
    /// let mut history = History::new();
    /// let mut rng = StdRng::seed_from_u64(3);
    /// while genome.genes().count() == 0 {
    ///     let _ = genome.mutate_add_gene(&mut history, &config, &mut rng);
    /// }
    ///
    /// let gene = genome.genes().next().unwrap();
    /// assert_eq!(gene.endpoints(), (0, 1));
    /// assert!(!gene.recurrent());
    /// ```
    pub fn mutate_add_gene<R: Rng + ?Sized>(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<&Gene, GeneAdditionMutationError> {
        let node_count = self.nodes.len();
        if node_count <= 1 {
            return Err(GeneAdditionMutationError::TooFewNodes);
        }

        let source = rng.gen_range(0..node_count);
        let successors: HashSet<Innovation> = self
            .genes
            .iter()
            .filter(|g| g.input() == source)
            .map(|g| g.output())
            .collect();
        let offset = rng.gen_range(0..node_count);
        let destination = (0..node_count)
            .map(|i| (offset + i) % node_count)
            .find(|&candidate| {
                candidate != source
                    && !self.nodes[candidate].node_type().is_sensor()
                    && !successors.contains(&candidate)
            })
            .ok_or(GeneAdditionMutationError::NoDestinationFound(source))?;

        let recurrent = self.reaches(destination, source);
        let gene_id = history.get_or_create(source, destination);
        let weight = Gene::random_weight(config, rng);
        log::trace!(
            "gene mutation {} {} {} (recurrent: {})",
            gene_id,
            source,
            destination,
            recurrent
        );
        Ok(self.add_gene(gene_id, source, destination, weight, recurrent))
    }

    /// Induces a _node mutation_ in the genome.
    /// If succesful, returns the triplet (_in gene_, _new node_, _out gene_).
    ///
    /// A random enabled gene is disabled and replaced by a new hidden
    /// node with two genes: _input -> new_ with weight 1.0, and
    /// _new -> output_ with the split gene's weight. Both inherit the
    /// split gene's recurrent flag.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no enabled genes to split.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::{GeneticConfig, Genome, History, NodeType};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let mut genome = Genome::empty();
    /// genome.add_node(NodeType::Input);
    /// genome.add_node(NodeType::Output);
    /// let mut history = History::new();
    /// let split = history.get_or_create(0, 1);
    /// genome.add_gene(split, 0, 1, 0.7, false);
    ///
    /// let (in_gene, new_node, out_gene) = genome
    ///     .mutate_add_node(&mut history, &mut StdRng::seed_from_u64(0))
    ///     .unwrap();
    ///
    /// assert_eq!(genome.genes().count(), 3);
    /// assert!(!genome.gene(split).unwrap().enabled());
    /// assert_eq!(genome.gene(in_gene).unwrap().weight(), 1.0);
    /// assert_eq!(genome.gene(out_gene).unwrap().weight(), 0.7);
    /// assert_eq!(genome.node(new_node).unwrap().node_type(), NodeType::Hidden);
    /// ```
    pub fn mutate_add_node<R: Rng + ?Sized>(
        &mut self,
        history: &mut History,
        rng: &mut R,
    ) -> Result<(Innovation, Innovation, Innovation), NodeAdditionMutationError> {
        let enabled: Vec<usize> = self
            .genes
            .iter()
            .enumerate()
            .filter(|(_, g)| g.enabled())
            .map(|(i, _)| i)
            .collect();
        if enabled.is_empty() {
            return Err(NodeAdditionMutationError::NoEnabledGenes);
        }

        let split = &mut self.genes[enabled[rng.gen_range(0..enabled.len())]];
        split.set_enabled(false);
        let (input, output) = split.endpoints();
        let (weight, recurrent) = (split.weight(), split.recurrent());

        let new_node = self.add_node(NodeType::Hidden);
        let input_gene = history.get_or_create(input, new_node);
        self.add_gene(input_gene, input, new_node, 1.0, recurrent);
        let output_gene = history.get_or_create(new_node, output);
        self.add_gene(output_gene, new_node, output, weight, recurrent);

        log::trace!(
            "node mutation {} -> {} -> {} (genes {}, {})",
            input,
            new_node,
            output,
            input_gene,
            output_gene
        );
        Ok((input_gene, new_node, output_gene))
    }

    /// Performs all mutations on self, each with
    /// its configured probability: weight mutation,
    /// then node addition, then gene addition.
    pub fn mutate_all<R: Rng + ?Sized>(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) {
        if rng.gen::<f64>() < config.weight_mutation_chance {
            self.mutate_weights(config, rng);
        }
        if rng.gen::<f64>() < config.node_addition_mutation_chance {
            if let Err(e) = self.mutate_add_node(history, rng) {
                log::trace!("skipped node mutation: {}", e);
            }
        }
        if rng.gen::<f64>() < config.gene_addition_mutation_chance {
            if let Err(e) = self.mutate_add_gene(history, config, rng) {
                log::trace!("skipped gene mutation: {}", e);
            }
        }
    }

    /// Combines two genomes and returns their _child_ genome.
    ///
    /// Matching genes are inherited from a randomly chosen parent,
    /// and are disabled with probability [`inherited_disable_chance`]
    /// if disabled in either parent. Disjoint and excess genes are
    /// inherited from the fitter parent only, or from both if their
    /// fitnesses are equal. The child's nodes are the union of both
    /// parents' nodes.
    ///
    /// [`inherited_disable_chance`]: GeneticConfig::inherited_disable_chance
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::{GeneticConfig, Genome, History};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let config = GeneticConfig {
    ///     initial_expression_chance: 1.0,
    ///     weight_min: -1.0,
    ///     weight_max: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut history = History::new();
    /// let mut rng = StdRng::seed_from_u64(5);
    /// let parent1 = Genome::new(&config, &mut history, &mut rng);
    /// let parent2 = Genome::new(&config, &mut history, &mut rng);
    ///
    /// let child = Genome::crossover(&parent1, &parent2, &config, &mut rng);
    /// assert!(child
    ///     .genes()
    ///     .all(|g| parent1.gene(g.innovation()).is_some() || parent2.gene(g.innovation()).is_some()));
    /// ```
    pub fn crossover<R: Rng + ?Sized>(
        parent1: &Genome,
        parent2: &Genome,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Genome {
        let equal_fitness = (parent1.fitness - parent2.fitness).abs() < FITNESS_TOLERANCE;
        let keep_first = equal_fitness || parent1.fitness > parent2.fitness;
        let keep_second = equal_fitness || parent2.fitness > parent1.fitness;

        let mut child = Genome::empty();
        child.nodes = Self::merge_nodes(parent1, parent2);

        let (mut i, mut j) = (0, 0);
        let (genes1, genes2) = (&parent1.genes, &parent2.genes);
        while i < genes1.len() || j < genes2.len() {
            match (genes1.get(i), genes2.get(j)) {
                (Some(g1), Some(g2)) if g1.innovation() == g2.innovation() => {
                    let mut gene = if rng.gen::<bool>() {
                        g1.clone()
                    } else {
                        g2.clone()
                    };
                    if !g1.enabled() || !g2.enabled() {
                        gene.set_enabled(rng.gen::<f64>() >= config.inherited_disable_chance);
                    }
                    child.genes.push(gene);
                    i += 1;
                    j += 1;
                }
                (Some(g1), Some(g2)) if g1.innovation() < g2.innovation() => {
                    if keep_first {
                        child.genes.push(g1.clone());
                    }
                    i += 1;
                }
                (Some(_), Some(g2)) => {
                    if keep_second {
                        child.genes.push(g2.clone());
                    }
                    j += 1;
                }
                (Some(g1), None) => {
                    if keep_first {
                        child.genes.push(g1.clone());
                    }
                    i += 1;
                }
                (None, Some(g2)) => {
                    if keep_second {
                        child.genes.push(g2.clone());
                    }
                    j += 1;
                }
                (None, None) => unreachable!(),
            }
        }

        debug_assert_eq!(child.check_invariants(), Ok(()), "in {}", child);
        child
    }

    /// Returns the union of both parents' nodes. Parents
    /// descend from a common ancestor, so shared ids carry
    /// the same node type.
    fn merge_nodes(parent1: &Genome, parent2: &Genome) -> Vec<Node> {
        let node_count = parent1.nodes.len().max(parent2.nodes.len());
        (0..node_count)
            .filter_map(|id| match (parent1.nodes.get(id), parent2.nodes.get(id)) {
                (Some(n1), Some(n2)) => {
                    debug_assert_eq!(n1.node_type(), n2.node_type(), "node {} types differ", id);
                    Some(*n1)
                }
                (Some(n), None) | (None, Some(n)) => Some(*n),
                (None, None) => None,
            })
            .collect()
    }

    /// Calculates the _compatibility distance_ between `first` and `second`,
    /// weighting excess genes, disjoint genes and the average weight
    /// difference of matching genes as specified in `config`.
    ///
    /// A gene present in only one genome is _disjoint_ if its innovation
    /// number lies within the other genome's innovation range, and
    /// _excess_ otherwise. Counts are normalized by the size of the larger
    /// gene list, unless it is smaller than [`small_genome_threshold`].
    ///
    /// [`small_genome_threshold`]: GeneticConfig::small_genome_threshold
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::{GeneticConfig, Genome, NodeType};
    ///
    /// const EXCESS_FACTOR: f64 = 1.0;
    /// const DISJOINT_FACTOR: f64 = 1.0;
    /// const WEIGHT_FACTOR: f64 = 0.4;
    ///
    /// let config = GeneticConfig {
    ///     excess_gene_factor: EXCESS_FACTOR,
    ///     disjoint_gene_factor: DISJOINT_FACTOR,
    ///     common_weight_factor: WEIGHT_FACTOR,
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// let mut genome1 = Genome::empty();
    /// let mut genome2 = Genome::empty();
    /// for genome in [&mut genome1, &mut genome2] {
    ///     genome.add_node(NodeType::Input);
    ///     genome.add_node(NodeType::Input);
    ///     genome.add_node(NodeType::Output);
    ///     genome.add_node(NodeType::Output);
    /// }
    ///
    /// // Common gene, weight difference of 0.5.
    /// genome1.add_gene(0, 0, 2, 1.0, false);
    /// genome2.add_gene(0, 0, 2, 0.5, false);
    /// // Disjoint gene.
    /// genome2.add_gene(1, 1, 2, 1.0, false);
    /// // Common gene, no weight difference.
    /// genome1.add_gene(2, 1, 3, 1.0, false);
    /// genome2.add_gene(2, 1, 3, 1.0, false);
    /// // Excess gene.
    /// genome1.add_gene(3, 0, 3, 1.0, false);
    ///
    /// assert_eq!(
    ///     Genome::genetic_distance(&genome1, &genome2, &config),
    ///     EXCESS_FACTOR * 1.0 / 3.0 + DISJOINT_FACTOR * 1.0 / 3.0 + WEIGHT_FACTOR * 0.5 / 2.0
    /// );
    /// ```
    pub fn genetic_distance(first: &Genome, second: &Genome, config: &GeneticConfig) -> f64 {
        let alignment = GeneAlignment::of(first, second);

        let larger = first.genes.len().max(second.genes.len());
        let normalizer = if larger < config.small_genome_threshold || larger == 0 {
            1.0
        } else {
            larger as f64
        };

        config.excess_gene_factor * alignment.excess as f64 / normalizer
            + config.disjoint_gene_factor * alignment.disjoint as f64 / normalizer
            + config.common_weight_factor * alignment.mean_weight_difference()
    }

    /// Returns an iterator over the genome's genes,
    /// in ascending innovation number order.
    pub fn genes(&self) -> impl Iterator<Item = &Gene> {
        self.genes.iter()
    }

    /// Returns the gene with the given innovation number, if present.
    pub fn gene(&self, innovation: Innovation) -> Option<&Gene> {
        self.genes
            .binary_search_by_key(&innovation, |g| g.innovation())
            .ok()
            .map(|i| &self.genes[i])
    }

    /// Returns a mutable reference to the gene with the
    /// given innovation number, if present.
    pub fn gene_mut(&mut self, innovation: Innovation) -> Option<&mut Gene> {
        match self.genes.binary_search_by_key(&innovation, |g| g.innovation()) {
            Ok(i) => Some(&mut self.genes[i]),
            Err(_) => None,
        }
    }

    /// Returns an iterator over the genome's nodes,
    /// in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Returns the node with the given id, if present.
    pub fn node(&self, id: Innovation) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Sets the genome's raw fitness to the value passed.
    ///
    /// # Panics
    ///
    /// Panics if `fitness` is NaN.
    pub fn set_fitness(&mut self, fitness: f64) {
        assert!(!fitness.is_nan(), "fitness function returned NaN");
        self.fitness = fitness;
    }

    /// Returns the genome's current raw fitness.
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Returns the genome's fitness divided by the size of
    /// its species, as computed during the last speciation.
    pub fn adjusted_fitness(&self) -> f64 {
        self.adjusted_fitness
    }

    /// Returns the species the genome was last assigned to.
    pub fn species(&self) -> Option<SpeciesID> {
        self.species
    }

    pub(crate) fn set_species(&mut self, species: SpeciesID) {
        self.species = Some(species);
    }

    /// Lowest and highest innovation numbers in the genome.
    fn innovation_range(&self) -> Option<RangeInclusive<Innovation>> {
        let first = self.genes.first()?;
        let last = self.genes.last()?;
        Some(first.innovation()..=last.innovation())
    }
}

/// Gene-by-gene comparison of two genomes.
#[derive(Debug, Default, PartialEq)]
struct GeneAlignment {
    matching: usize,
    disjoint: usize,
    excess: usize,
    weight_difference_sum: f64,
}

impl GeneAlignment {
    fn of(first: &Genome, second: &Genome) -> GeneAlignment {
        let (range1, range2) = (first.innovation_range(), second.innovation_range());

        let mut alignment = GeneAlignment::default();
        let (mut unmatched1, mut unmatched2) = (vec![], vec![]);
        let (mut i, mut j) = (0, 0);
        let (genes1, genes2) = (&first.genes, &second.genes);
        while i < genes1.len() && j < genes2.len() {
            let (g1, g2) = (&genes1[i], &genes2[j]);
            match g1.innovation().cmp(&g2.innovation()) {
                Ordering::Equal => {
                    alignment.matching += 1;
                    alignment.weight_difference_sum += (g1.weight() - g2.weight()).abs();
                    i += 1;
                    j += 1;
                }
                Ordering::Less => {
                    unmatched1.push(g1.innovation());
                    i += 1;
                }
                Ordering::Greater => {
                    unmatched2.push(g2.innovation());
                    j += 1;
                }
            }
        }
        unmatched1.extend(genes1[i..].iter().map(|g| g.innovation()));
        unmatched2.extend(genes2[j..].iter().map(|g| g.innovation()));

        for (unmatched, other_range) in [(unmatched1, range2), (unmatched2, range1)] {
            for innovation in unmatched {
                match &other_range {
                    Some(range) if range.contains(&innovation) => alignment.disjoint += 1,
                    _ => alignment.excess += 1,
                }
            }
        }

        alignment
    }

    fn mean_weight_difference(&self) -> f64 {
        if self.matching == 0 {
            0.0
        } else {
            self.weight_difference_sum / self.matching as f64
        }
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Genome")
            .field("Genes", &self.genes)
            .field("Nodes", &self.nodes)
            .field("Fitness", &self.fitness)
            .finish()
    }
}
