//! A Network is the phenotype of a Genome: a compiled,
//! evaluable form of its enabled genes. Genes are converted
//! into connections, and genome nodes into network nodes.
//!
//! Networks carry temporal state. Recurrent connections read
//! their source node's activation from the previous call to
//! [`Network::feed_forward`], so a network must be [`reset`]
//! before every independent episode.
//!
//! [`reset`]: Network::reset
mod connection;

use crate::genomics::{Genome, NodeType};
use crate::Innovation;
use connection::Connection;

use serde::{Deserialize, Serialize};

use std::collections::HashSet;
use std::fmt;

/// The activation function applied to
/// every hidden and output node of a network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationType {
    /// `tanh(2.5x)`. Output values are remapped
    /// from (-1, 1) into (0, 1).
    Tanh,
    /// `1 / (1 + e^(-4.9x))`.
    Sigmoid,
}

impl ActivationType {
    /// Applies the activation function to a weighted input sum.
    pub fn activate(self, input_sum: f64) -> f64 {
        match self {
            ActivationType::Tanh => (2.5 * input_sum).tanh(),
            ActivationType::Sigmoid => 1.0 / (1.0 + (-4.9 * input_sum).exp()),
        }
    }

    /// Maps an output node's activation into the unit interval.
    fn to_unit_interval(self, activation: f64) -> f64 {
        match self {
            ActivationType::Tanh => (activation + 1.0) / 2.0,
            ActivationType::Sigmoid => activation,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unseen,
    Active,
    Done,
}

/// An arbitrarily-structured neural network
/// with recurrent state.
#[derive(Clone, Debug)]
pub struct Network {
    activation: ActivationType,
    node_types: Box<[NodeType]>,
    evaluation_order: Box<[Innovation]>,
    incoming: Box<[Box<[Connection]>]>,
    values: Box<[f64]>,
    previous_values: Box<[f64]>,
    inputs: Box<[Innovation]>,
    outputs: Box<[Innovation]>,
    timestep: usize,
}

impl Network {
    /// Compiles a new network from the passed genome.
    ///
    /// Only enabled genes are expressed. The evaluation order is a
    /// topological order of the graph of non-recurrent connections.
    /// A non-recurrent gene that nonetheless closes a cycle (which
    /// crossover or gene re-enabling can produce) is evaluated as
    /// recurrent.
    ///
    /// # Examples
    /// ```
    /// use evoneat::{
    ///     genomics::{Genome, NodeType},
    ///     networks::{ActivationType, Network},
    /// };
    ///
    /// let mut genome = Genome::empty();
    /// let input = genome.add_node(NodeType::Input);
    /// let hidden = genome.add_node(NodeType::Hidden);
    /// let output = genome.add_node(NodeType::Output);
    /// genome.add_gene(0, hidden, output, 1.0, false);
    /// genome.add_gene(1, input, hidden, 1.0, false);
    ///
    /// let network = Network::new(&genome, ActivationType::Sigmoid);
    /// assert_eq!(network.evaluation_order(), &[input, hidden, output]);
    /// ```
    pub fn new(genome: &Genome, activation: ActivationType) -> Network {
        let node_types: Box<[NodeType]> = genome.nodes().map(|n| n.node_type()).collect();
        let node_count = node_types.len();

        let mut successors = vec![vec![]; node_count];
        for gene in genome.genes().filter(|g| g.enabled() && !g.recurrent()) {
            successors[gene.input()].push(gene.output());
        }
        let (evaluation_order, cyclic) = Self::topological_order(&successors);

        let mut incoming = vec![vec![]; node_count];
        for gene in genome.genes().filter(|g| g.enabled()) {
            let recurrent = gene.recurrent() || cyclic.contains(&gene.endpoints());
            incoming[gene.output()].push(Connection::new(gene.input(), gene.weight(), recurrent));
        }
        if !cyclic.is_empty() {
            log::warn!(
                "{} non-recurrent connection(s) close a cycle and were compiled as recurrent: {:?}",
                cyclic.len(),
                cyclic
            );
        }

        let ids_of = |node_type: NodeType| {
            (0..node_count)
                .filter(|&id| node_types[id] == node_type)
                .collect::<Box<[_]>>()
        };

        Network {
            activation,
            inputs: ids_of(NodeType::Input),
            outputs: ids_of(NodeType::Output),
            evaluation_order: evaluation_order.into(),
            incoming: incoming.into_iter().map(|v| v.into()).collect(),
            values: vec![0.0; node_count].into(),
            previous_values: vec![0.0; node_count].into(),
            node_types,
            timestep: 0,
        }
    }

    /// Depth-first post-order over the successor lists,
    /// started from every node in id order, then reversed.
    /// Also returns the edges found to close a cycle.
    fn topological_order(
        successors: &[Vec<Innovation>],
    ) -> (Vec<Innovation>, HashSet<(Innovation, Innovation)>) {
        let node_count = successors.len();
        let mut state = vec![Visit::Unseen; node_count];
        let mut order = Vec::with_capacity(node_count);
        let mut cyclic = HashSet::new();

        for root in 0..node_count {
            if state[root] != Visit::Unseen {
                continue;
            }
            state[root] = Visit::Active;
            let mut stack = vec![(root, 0)];
            while let Some(top) = stack.last_mut() {
                let (node, edge) = *top;
                top.1 += 1;
                match successors[node].get(edge) {
                    Some(&next) => match state[next] {
                        Visit::Unseen => {
                            state[next] = Visit::Active;
                            stack.push((next, 0));
                        }
                        Visit::Active => {
                            cyclic.insert((node, next));
                        }
                        Visit::Done => {}
                    },
                    None => {
                        state[node] = Visit::Done;
                        order.push(node);
                        stack.pop();
                    }
                }
            }
        }

        order.reverse();
        (order, cyclic)
    }

    /// Runs one timestep of the network and returns the output
    /// node values, in ascending node id order.
    ///
    /// Input nodes take the corresponding component of `inputs`,
    /// and bias nodes emit 1.0. Every other node sums its weighted
    /// incoming connections and applies the activation function.
    /// Recurrent connections read their source's activation from
    /// the previous call, except for input and bias sources.
    ///
    /// # Panics
    ///
    /// This function panics if the length of `inputs` is
    /// not equal to the number of inputs in the network.
    ///
    /// # Examples
    /// ```
    /// use evoneat::{
    ///     genomics::{Genome, NodeType},
    ///     networks::{ActivationType, Network},
    /// };
    ///
    /// let mut genome = Genome::empty();
    /// genome.add_node(NodeType::Input);
    /// genome.add_node(NodeType::Input);
    /// genome.add_node(NodeType::Output);
    /// genome.add_gene(0, 0, 2, 2.5, false);
    /// genome.add_gene(1, 1, 2, -2.5, false);
    ///
    /// let mut network = Network::new(&genome, ActivationType::Sigmoid);
    /// let outputs = network.feed_forward(&[0.5, 1.0]);
    ///
    /// assert_eq!(outputs, vec![ActivationType::Sigmoid.activate(0.5 * 2.5 + 1.0 * -2.5)]);
    /// ```
    pub fn feed_forward(&mut self, inputs: &[f64]) -> Vec<f64> {
        assert_eq!(
            inputs.len(),
            self.inputs.len(),
            "expected {} network inputs",
            self.inputs.len()
        );

        for (id, node_type) in self.node_types.iter().enumerate() {
            self.values[id] = match node_type {
                NodeType::Bias => 1.0,
                _ => 0.0,
            };
        }
        for (&id, &value) in self.inputs.iter().zip(inputs) {
            self.values[id] = value;
        }

        for &id in self.evaluation_order.iter() {
            if self.node_types[id].is_sensor() {
                continue;
            }
            let input_sum: f64 = self.incoming[id]
                .iter()
                .map(|c| {
                    let source_value =
                        if c.recurrent && !self.node_types[c.source].is_sensor() {
                            self.previous_values[c.source]
                        } else {
                            self.values[c.source]
                        };
                    c.weight * source_value
                })
                .sum();
            self.values[id] = self.activation.activate(input_sum);
        }

        for (id, node_type) in self.node_types.iter().enumerate() {
            if !node_type.is_sensor() {
                self.previous_values[id] = self.values[id];
            }
        }
        self.timestep += 1;

        self.outputs
            .iter()
            .map(|&id| self.activation.to_unit_interval(self.values[id]))
            .collect()
    }

    /// Clears the temporal state of all nodes,
    /// returning the network to its first timestep.
    ///
    /// # Examples
    /// ```
    /// use evoneat::{
    ///     genomics::{Genome, NodeType},
    ///     networks::{ActivationType, Network},
    /// };
    ///
    /// let mut genome = Genome::empty();
    /// genome.add_node(NodeType::Input);
    /// genome.add_node(NodeType::Output);
    /// genome.add_gene(0, 0, 1, 1.0, false);
    /// genome.add_gene(1, 1, 1, 0.5, true);
    ///
    /// let mut network = Network::new(&genome, ActivationType::Sigmoid);
    /// let first = network.feed_forward(&[1.0]);
    /// assert_ne!(network.feed_forward(&[1.0]), first);
    ///
    /// network.reset();
    /// assert_eq!(network.feed_forward(&[1.0]), first);
    /// ```
    pub fn reset(&mut self) {
        for value in self.previous_values.iter_mut() {
            *value = 0.0;
        }
        self.timestep = 0;
    }

    /// Returns the order in which node ids are evaluated.
    pub fn evaluation_order(&self) -> &[Innovation] {
        &self.evaluation_order
    }

    /// Returns the number of input nodes.
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Returns the number of output nodes.
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Returns the number of timesteps run since
    /// creation or the last reset.
    pub fn timestep(&self) -> usize {
        self.timestep
    }

    /// Returns the activation function of the network.
    pub fn activation(&self) -> ActivationType {
        self.activation
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self as &dyn fmt::Debug).fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{GeneticConfig, History};
    use rand::{rngs::StdRng, SeedableRng};
    use std::num::NonZeroUsize;

    const EPSILON: f64 = 1e-9;

    fn sigmoid(x: f64) -> f64 {
        1.0 / (1.0 + (-4.9 * x).exp())
    }

    /// Builds a genome from node types and
    /// `(input, output, weight, recurrent)` genes.
    fn genome(nodes: &[NodeType], genes: &[(Innovation, Innovation, f64, bool)]) -> Genome {
        let mut genome = Genome::empty();
        for &node_type in nodes {
            genome.add_node(node_type);
        }
        for (id, &(input, output, weight, recurrent)) in genes.iter().enumerate() {
            genome.add_gene(id, input, output, weight, recurrent);
        }
        genome
    }

    fn simple_loop(recurrent_weight: f64) -> Genome {
        use NodeType::*;
        genome(
            &[Input, Hidden, Output],
            &[(0, 1, 1.0, false), (1, 2, 1.0, false), (1, 1, recurrent_weight, true)],
        )
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPSILON,
            "{} != {}",
            actual,
            expected
        );
    }

    #[test]
    fn empty_output_is_activation_of_zero() {
        use NodeType::*;
        let mut network = Network::new(&genome(&[Input, Output], &[]), ActivationType::Sigmoid);
        for _ in 0..10 {
            assert_eq!(network.feed_forward(&[3.0]), vec![0.5]);
        }
        let mut network = Network::new(&genome(&[Input, Output], &[]), ActivationType::Tanh);
        assert_eq!(network.feed_forward(&[3.0]), vec![0.5]);
    }

    #[test]
    fn bias_emits_one() {
        use NodeType::*;
        for activation in [ActivationType::Tanh, ActivationType::Sigmoid] {
            let genome = genome(&[Input, Bias, Output], &[(1, 2, 1.0, false)]);
            let mut network = Network::new(&genome, activation);
            let expected = activation.to_unit_interval(activation.activate(1.0));
            assert_close(network.feed_forward(&[123.0])[0], expected);
        }
    }

    #[test]
    fn tanh_outputs_in_unit_interval() {
        use NodeType::*;
        let genome = genome(&[Input, Output, Output], &[(0, 1, 1.0, false), (0, 2, -1.0, false)]);
        let mut network = Network::new(&genome, ActivationType::Tanh);
        for x in -20..=20 {
            let x = x as f64 / 4.0;
            let outputs = network.feed_forward(&[x]);
            assert_close(outputs[0], ((2.5 * x).tanh() + 1.0) / 2.0);
            assert_close(outputs[1], ((-2.5 * x).tanh() + 1.0) / 2.0);
            assert!(outputs.iter().all(|o| (0.0..=1.0).contains(o)));
        }
    }

    #[test]
    fn outputs_ordered_by_id() {
        use NodeType::*;
        // Output 4 is computed before output 1 in evaluation order.
        let genome = genome(
            &[Input, Output, Hidden, Input, Output],
            &[(0, 4, 1.0, false), (4, 2, 1.0, false), (2, 1, 1.0, false), (3, 4, 0.0, false)],
        );
        let mut network = Network::new(&genome, ActivationType::Sigmoid);
        assert_eq!(network.input_count(), 2);
        assert_eq!(network.output_count(), 2);
        let outputs = network.feed_forward(&[1.0, 0.0]);
        let first = sigmoid(1.0);
        assert_close(outputs[1], first);
        assert_close(outputs[0], sigmoid(sigmoid(first)));
    }

    #[test]
    fn disabled_genes_are_ignored() {
        use NodeType::*;
        let mut genome = genome(&[Input, Output], &[(0, 1, 1.0, false)]);
        genome.gene_mut(0).unwrap().set_enabled(false);
        let mut network = Network::new(&genome, ActivationType::Sigmoid);
        assert_eq!(network.feed_forward(&[1.0]), vec![0.5]);
    }

    #[test]
    fn evaluation_order_is_topological() {
        let config = GeneticConfig {
            input_count: NonZeroUsize::new(3).unwrap(),
            bias_count: 1,
            output_count: NonZeroUsize::new(2).unwrap(),
            initial_expression_chance: 1.0,
            weight_min: -1.0,
            weight_max: 1.0,
            weight_mutation_chance: 0.8,
            weight_perturb_chance: 0.9,
            weight_perturb_power: 0.1,
            node_addition_mutation_chance: 0.5,
            gene_addition_mutation_chance: 0.8,
            ..GeneticConfig::zero()
        };
        let mut history = History::new();
        let mut rng = StdRng::seed_from_u64(17);
        let mut genome = Genome::new(&config, &mut history, &mut rng);
        for _ in 0..60 {
            genome.mutate_all(&mut history, &config, &mut rng);
            let network = Network::new(&genome, ActivationType::Tanh);
            let position = |id: Innovation| {
                network
                    .evaluation_order()
                    .iter()
                    .position(|&n| n == id)
                    .unwrap()
            };
            assert_eq!(network.evaluation_order().len(), genome.nodes().count());
            for gene in genome.genes().filter(|g| g.enabled() && !g.recurrent()) {
                assert!(position(gene.input()) < position(gene.output()), "{}", gene);
            }
        }
    }

    #[test]
    fn feed_forward_is_stateless_without_recurrence() {
        use NodeType::*;
        let genome = genome(
            &[Input, Input, Bias, Output, Hidden],
            &[
                (0, 4, 0.7, false),
                (1, 4, -0.3, false),
                (2, 3, 0.2, false),
                (4, 3, 0.9, false),
                (0, 3, -0.4, false),
            ],
        );
        let mut network = Network::new(&genome, ActivationType::Tanh);
        network.reset();
        let expected = network.feed_forward(&[0.3, -0.8]);
        for x in -10..10 {
            network.feed_forward(&[x as f64, -x as f64]);
        }
        network.reset();
        assert_eq!(network.feed_forward(&[0.3, -0.8]), expected);
        assert_eq!(network.feed_forward(&[0.3, -0.8]), expected);
    }

    #[test]
    fn simple_recurrent_loop() {
        let mut network = Network::new(&simple_loop(0.5), ActivationType::Sigmoid);
        let mut hidden = 0.0;
        let mut outputs = vec![];
        // A small input keeps the hidden node out of saturation.
        for _ in 0..3 {
            hidden = sigmoid(0.1 + 0.5 * hidden);
            let output = network.feed_forward(&[0.1])[0];
            assert_close(output, sigmoid(hidden));
            outputs.push(output);
        }
        assert!((outputs[0] - outputs[1]).abs() > 1e-6);
        assert!((outputs[1] - outputs[2]).abs() > 1e-6);
        assert_eq!(network.timestep(), 3);
    }

    #[test]
    fn recurrent_replay_is_reproducible() {
        let mut network = Network::new(&simple_loop(0.8), ActivationType::Sigmoid);
        let run = |network: &mut Network| {
            network.reset();
            (0..5)
                .map(|_| network.feed_forward(&[1.0])[0])
                .collect::<Vec<_>>()
        };
        let first = run(&mut network);
        let second = run(&mut network);
        assert_eq!(first, second);
        assert_ne!(first[0], first[1]);
        assert_eq!(network.timestep(), 5);
    }

    #[test]
    fn recurrent_with_changing_input() {
        let mut network = Network::new(&simple_loop(0.5), ActivationType::Sigmoid);
        let out1 = network.feed_forward(&[1.0])[0];
        let hidden1 = sigmoid(1.0);
        let out2 = network.feed_forward(&[-1.0])[0];
        assert_close(out2, sigmoid(sigmoid(-1.0 + 0.5 * hidden1)));
        let out3 = network.feed_forward(&[1.0])[0];
        assert!((out1 - out3).abs() > 1e-6);
    }

    #[test]
    fn recurrent_between_layers() {
        use NodeType::*;
        let genome = genome(
            &[Input, Hidden, Hidden, Output],
            &[(0, 1, 1.0, false), (1, 2, 1.0, false), (2, 3, 1.0, false), (2, 1, 0.5, true)],
        );
        let mut network = Network::new(&genome, ActivationType::Sigmoid);

        let h1 = sigmoid(1.0);
        let h2 = sigmoid(h1);
        assert_close(network.feed_forward(&[1.0])[0], sigmoid(h2));

        let h1 = sigmoid(1.0 + 0.5 * h2);
        let h2 = sigmoid(h1);
        assert_close(network.feed_forward(&[1.0])[0], sigmoid(h2));
    }

    #[test]
    fn recurrent_into_output() {
        use NodeType::*;
        let genome = genome(&[Input, Output], &[(0, 1, 1.0, false), (1, 1, 0.5, true)]);
        let mut network = Network::new(&genome, ActivationType::Sigmoid);
        let first = network.feed_forward(&[1.0])[0];
        assert_close(first, sigmoid(1.0));
        assert_close(network.feed_forward(&[1.0])[0], sigmoid(1.0 + 0.5 * first));
    }

    #[test]
    fn recurrent_memory_decays() {
        let mut network = Network::new(&simple_loop(0.2), ActivationType::Sigmoid);
        network.feed_forward(&[1.0]);
        // Converges towards the fixed point of `h = sigmoid(0.2h)`.
        let fixed_point = (0..200).fold(0.0, |h, _| sigmoid(0.2 * h));
        let limit = sigmoid(fixed_point);
        let distances: Vec<f64> = (0..5)
            .map(|_| (network.feed_forward(&[0.0])[0] - limit).abs())
            .collect();
        for pair in distances.windows(2) {
            assert!(pair[1] < pair[0], "{:?}", distances);
        }
    }

    #[test]
    fn disabled_or_zero_recurrence_has_no_memory() {
        let mut disabled = simple_loop(0.5);
        disabled.gene_mut(2).unwrap().set_enabled(false);
        for genome in [disabled, simple_loop(0.0)] {
            let mut network = Network::new(&genome, ActivationType::Sigmoid);
            let first = network.feed_forward(&[1.0]);
            assert_eq!(network.feed_forward(&[1.0]), first);
        }
    }

    #[test]
    fn recurrent_sensor_sources_use_current_value() {
        use NodeType::*;
        let genome = genome(&[Input, Bias, Output], &[(0, 2, 1.0, true), (1, 2, 0.5, true)]);
        let mut network = Network::new(&genome, ActivationType::Sigmoid);
        assert_close(network.feed_forward(&[0.3])[0], sigmoid(0.3 + 0.5));
        assert_close(network.feed_forward(&[-0.7])[0], sigmoid(-0.7 + 0.5));
    }

    #[test]
    fn mislabelled_cycle_is_evaluated_as_recurrent() {
        use NodeType::*;
        let genome = genome(
            &[Input, Hidden, Hidden, Output],
            &[(0, 1, 1.0, false), (1, 2, 1.0, false), (2, 1, 0.5, false), (2, 3, 1.0, false)],
        );
        let mut network = Network::new(&genome, ActivationType::Sigmoid);
        assert_eq!(network.evaluation_order().len(), 4);

        let h1 = sigmoid(1.0);
        let h2 = sigmoid(h1);
        assert_close(network.feed_forward(&[1.0])[0], sigmoid(h2));
        let h1 = sigmoid(1.0 + 0.5 * h2);
        let h2 = sigmoid(h1);
        assert_close(network.feed_forward(&[1.0])[0], sigmoid(h2));
    }

    #[test]
    #[should_panic]
    fn wrong_input_count() {
        Network::new(&simple_loop(0.5), ActivationType::Sigmoid).feed_forward(&[1.0, 2.0]);
    }
}
