//! Fitness evaluation drives a [`Network`] against an
//! [`Environment`] for a bounded number of simulation steps,
//! using the environment's accumulated score as fitness.
use crate::networks::Network;

use serde::{Deserialize, Serialize};

/// A simulated task a network can be evaluated in.
///
/// Implementations must be reproducible: after [`reset`],
/// the same sequence of actions must yield the same
/// observations and score.
///
/// [`reset`]: Environment::reset
pub trait Environment {
    /// Returns to a fresh initial state for a new episode.
    fn reset(&mut self);
    /// Returns the current, normalized, agent-relative state.
    /// Its length must match the network's input count.
    fn observe(&self) -> Vec<f64>;
    /// Advances one tick given the network's outputs.
    /// Returns whether the agent is still viable.
    fn step(&mut self, actions: &[f64]) -> bool;
    /// Returns the reward accumulated so far this episode.
    fn score(&self) -> f64;
}

/// A single tick of a recorded episode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryStep {
    pub step: usize,
    pub observation: Vec<f64>,
    pub actions: Vec<f64>,
    pub score: f64,
    pub alive: bool,
}

/// Runs fixed-length episodes of networks in environments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EpisodeEvaluator {
    steps: usize,
}

impl EpisodeEvaluator {
    /// Creates an evaluator running at most `steps` ticks per episode.
    pub fn new(steps: usize) -> EpisodeEvaluator {
        EpisodeEvaluator { steps }
    }

    /// Maximum number of ticks per episode.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Resets `network` and `environment`, then runs an episode
    /// until the step limit is reached or the environment reports
    /// the agent is no longer viable. Returns the final score.
    ///
    /// # Examples
    /// ```
    /// use evoneat::evaluation::{Environment, EpisodeEvaluator};
    /// use evoneat::genomics::{Genome, NodeType};
    /// use evoneat::networks::{ActivationType, Network};
    ///
    /// /// Rewards outputs above one half, for as long as they last.
    /// struct Threshold {
    ///     score: f64,
    /// }
    ///
    /// impl Environment for Threshold {
    ///     fn reset(&mut self) {
    ///         self.score = 0.0;
    ///     }
    ///     fn observe(&self) -> Vec<f64> {
    ///         vec![1.0]
    ///     }
    ///     fn step(&mut self, actions: &[f64]) -> bool {
    ///         if actions[0] > 0.5 {
    ///             self.score += 1.0;
    ///         }
    ///         actions[0] > 0.5
    ///     }
    ///     fn score(&self) -> f64 {
    ///         self.score
    ///     }
    /// }
    ///
    /// let mut genome = Genome::empty();
    /// genome.add_node(NodeType::Input);
    /// genome.add_node(NodeType::Output);
    /// genome.add_gene(0, 0, 1, 1.0, false);
    /// let mut network = Network::new(&genome, ActivationType::Sigmoid);
    ///
    /// let evaluator = EpisodeEvaluator::new(25);
    /// let mut environment = Threshold { score: 0.0 };
    /// assert_eq!(evaluator.evaluate(&mut network, &mut environment), 25.0);
    /// ```
    pub fn evaluate<E: Environment + ?Sized>(
        &self,
        network: &mut Network,
        environment: &mut E,
    ) -> f64 {
        self.run(network, environment, |_| {});
        environment.score()
    }

    /// Runs an episode like [`evaluate`], recording every tick.
    ///
    /// [`evaluate`]: EpisodeEvaluator::evaluate
    pub fn replay<E: Environment + ?Sized>(
        &self,
        network: &mut Network,
        environment: &mut E,
    ) -> Vec<TrajectoryStep> {
        let mut trajectory = Vec::with_capacity(self.steps);
        self.run(network, environment, |step| trajectory.push(step));
        trajectory
    }

    fn run<E, F>(&self, network: &mut Network, environment: &mut E, mut record: F)
    where
        E: Environment + ?Sized,
        F: FnMut(TrajectoryStep),
    {
        network.reset();
        environment.reset();
        for step in 0..self.steps {
            let observation = environment.observe();
            let actions = network.feed_forward(&observation);
            let alive = environment.step(&actions);
            record(TrajectoryStep {
                step,
                observation,
                actions,
                score: environment.score(),
                alive,
            });
            if !alive {
                break;
            }
        }
    }
}
