use crate::networks::ActivationType;

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for genome generation
/// and inter-genome operations.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Number of inputs in a genome.
    pub input_count: NonZeroUsize,
    /// Number of bias nodes in a genome. Bias
    /// nodes always emit 1.0.
    pub bias_count: usize,
    /// Number of outputs in a genome.
    pub output_count: NonZeroUsize,
    /// Chance that a gene between an input/bias-output node
    /// pair is created during initial genome generation.
    pub initial_expression_chance: f64,
    /// Activation function used by every non-input node
    /// of the genome's network.
    pub activation: ActivationType,
    /// Lower bound of gene weights.
    pub weight_min: f64,
    /// Upper bound of gene weights.
    pub weight_max: f64,
    /// Chance that a genome's weights are mutated
    /// during the mutation phase.
    pub weight_mutation_chance: f64,
    /// Chance that a mutated weight is perturbed
    /// instead of being reset to a new random value.
    pub weight_perturb_chance: f64,
    /// Magnitude of the bound on the uniform weight
    /// perturbation distribution.
    pub weight_perturb_power: f64,
    /// Chance of a node addition mutation.
    pub node_addition_mutation_chance: f64,
    /// Chance of a gene addition mutation.
    pub gene_addition_mutation_chance: f64,
    /// Chance that a matching gene inherited during
    /// crossover is disabled if it was disabled in
    /// either parent.
    pub inherited_disable_chance: f64,
    /// Weight of excess genes in genetic distance (C1).
    pub excess_gene_factor: f64,
    /// Weight of disjoint genes in genetic distance (C2).
    pub disjoint_gene_factor: f64,
    /// Weight of the common gene weight difference
    /// average in genetic distance (C3).
    pub common_weight_factor: f64,
    /// Genomes with fewer genes than this are not
    /// normalized by size when computing genetic distance.
    pub small_genome_threshold: usize,
}

impl GeneticConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, or in the case of
    /// `NonZeroUsize`s, 1.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::GeneticConfig;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(4).unwrap(),
    ///     weight_max: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// assert_eq!(config.bias_count, 0);
    /// ```
    pub const fn zero() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::MIN,
            bias_count: 0,
            output_count: NonZeroUsize::MIN,
            initial_expression_chance: 0.0,
            activation: ActivationType::Sigmoid,
            weight_min: 0.0,
            weight_max: 0.0,
            weight_mutation_chance: 0.0,
            weight_perturb_chance: 0.0,
            weight_perturb_power: 0.0,
            node_addition_mutation_chance: 0.0,
            gene_addition_mutation_chance: 0.0,
            inherited_disable_chance: 0.0,
            excess_gene_factor: 0.0,
            disjoint_gene_factor: 0.0,
            common_weight_factor: 0.0,
            small_genome_threshold: 0,
        }
    }
}

impl Default for GeneticConfig {
    /// Reference values: 6 inputs, 1 bias, 2 outputs,
    /// fully connected initial genomes, tanh activation.
    fn default() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(6).unwrap(),
            bias_count: 1,
            output_count: NonZeroUsize::new(2).unwrap(),
            initial_expression_chance: 1.0,
            activation: ActivationType::Tanh,
            weight_min: -1.0,
            weight_max: 1.0,
            weight_mutation_chance: 0.8,
            weight_perturb_chance: 0.9,
            weight_perturb_power: 0.1,
            node_addition_mutation_chance: 0.03,
            gene_addition_mutation_chance: 0.05,
            inherited_disable_chance: 0.75,
            excess_gene_factor: 1.0,
            disjoint_gene_factor: 1.0,
            common_weight_factor: 0.4,
            small_genome_threshold: 20,
        }
    }
}
