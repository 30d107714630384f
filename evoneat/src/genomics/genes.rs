use crate::genomics::GeneticConfig;
use crate::Innovation;

use rand::Rng;
use serde::{Deserialize, Serialize};

use std::fmt;

/// Genes are the principal components of genomes.
/// They are created between two nodes, and become
/// network connections in the genome's phenotype.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Gene {
    id: Innovation,
    input: Innovation,
    output: Innovation,
    weight: f64,
    enabled: bool,
    recurrent: bool,
}

impl Gene {
    /// Returns a new _enabled_ gene with the specified parameters.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::Gene;
    ///
    /// let gene = Gene::new(42, 3, 9, 2.0, false);
    /// assert!(gene.enabled());
    /// assert_eq!(gene.endpoints(), (3, 9));
    /// ```
    pub fn new(
        id: Innovation,
        input: Innovation,
        output: Innovation,
        weight: f64,
        recurrent: bool,
    ) -> Gene {
        Gene {
            id,
            input,
            output,
            weight,
            enabled: true,
            recurrent,
        }
    }

    /// Returns a random weight, uniformly distributed
    /// over `[weight_min, weight_max]`.
    pub(crate) fn random_weight<R: Rng + ?Sized>(config: &GeneticConfig, rng: &mut R) -> f64 {
        if config.weight_min < config.weight_max {
            rng.gen_range(config.weight_min..=config.weight_max)
        } else {
            config.weight_min
        }
    }

    /// Replaces the gene's weight with a fresh random
    /// value within the configured bounds.
    pub fn randomize_weight<R: Rng + ?Sized>(&mut self, config: &GeneticConfig, rng: &mut R) {
        self.weight = Self::random_weight(config, rng);
    }

    /// Nudges the gene's weight by a random amount drawn
    /// uniformly from ±[`weight_perturb_power`], then clamps
    /// it into the configured weight bounds.
    ///
    /// [`weight_perturb_power`]: crate::genomics::GeneticConfig::weight_perturb_power
    pub fn perturb_weight<R: Rng + ?Sized>(&mut self, config: &GeneticConfig, rng: &mut R) {
        if config.weight_perturb_power > 0.0 {
            self.weight +=
                rng.gen_range(-config.weight_perturb_power..=config.weight_perturb_power);
        }
        self.weight = self.weight.clamp(config.weight_min, config.weight_max);
    }

    /// Returns the gene's innovation number.
    pub fn innovation(&self) -> Innovation {
        self.id
    }

    /// Returns the gene's input node's id.
    pub fn input(&self) -> Innovation {
        self.input
    }

    /// Returns the gene's output node's id.
    pub fn output(&self) -> Innovation {
        self.output
    }

    /// Returns the gene's input and output node ids.
    pub fn endpoints(&self) -> (Innovation, Innovation) {
        (self.input, self.output)
    }

    /// Returns the gene's weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Sets the gene's weight.
    pub fn set_weight(&mut self, w: f64) {
        self.weight = w;
    }

    /// Returns whether the gene is expressed in the phenotype.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Sets the gene's expression status.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns whether the gene is evaluated with the
    /// previous timestep's activation of its input node.
    pub fn recurrent(&self) -> bool {
        self.recurrent
    }
}

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:?}[{:?}{}{:?}, {:.3}]{}",
            if self.enabled { "" } else { "(" },
            self.id,
            self.input,
            if self.recurrent { "~>" } else { "->" },
            self.output,
            self.weight,
            if self.enabled { "" } else { ")" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn config() -> GeneticConfig {
        GeneticConfig {
            weight_min: -1.0,
            weight_max: 1.0,
            weight_perturb_power: 0.1,
            ..GeneticConfig::zero()
        }
    }

    #[test]
    fn perturb_stays_in_bounds() {
        let config = config();
        let mut rng = StdRng::seed_from_u64(7);
        let mut gene = Gene::new(0, 0, 1, 0.95, false);
        for _ in 0..1000 {
            let before = gene.weight();
            gene.perturb_weight(&config, &mut rng);
            assert!(gene.weight() >= -1.0 && gene.weight() <= 1.0);
            assert!((gene.weight() - before).abs() <= 0.1 + 1e-12);
        }
    }

    #[test]
    fn randomize_stays_in_bounds() {
        let config = config();
        let mut rng = StdRng::seed_from_u64(11);
        let mut gene = Gene::new(0, 0, 1, 0.0, false);
        for _ in 0..1000 {
            gene.randomize_weight(&config, &mut rng);
            assert!(gene.weight() >= -1.0 && gene.weight() <= 1.0);
        }
    }

    #[test]
    fn display_marks_disabled_and_recurrent() {
        let mut gene = Gene::new(4, 2, 2, 0.5, true);
        gene.set_enabled(false);
        assert_eq!(gene.to_string(), "(4[2~>2, 0.500])");
    }
}
