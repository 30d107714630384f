use crate::genomics::GenomeInvariantError;

use std::error::Error;
use std::fmt;

/// An error type indicating that a population
/// could not be built from the given seed genomes.
#[derive(Debug, Clone, PartialEq)]
pub enum SeedError {
    /// No seed genomes were given.
    EmptySeed,
    /// More seed genomes than the configured population size.
    TooManyGenomes { size: usize, seeds: usize },
    /// A seed genome's sensors or outputs don't match
    /// the genetic configuration.
    NonconformingGenome(usize),
    /// A seed genome breaks a structural invariant.
    InvalidGenome(usize, GenomeInvariantError),
}

impl fmt::Display for SeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySeed => write!(f, "attempted to seed population with no genomes"),
            Self::TooManyGenomes { size, seeds } => write!(
                f,
                "{} seed genomes exceed the population size of {}",
                seeds, size
            ),
            Self::NonconformingGenome(index) => write!(
                f,
                "seed genome {} doesn't match the configured input, bias and output counts",
                index
            ),
            Self::InvalidGenome(index, e) => write!(f, "seed genome {}: {}", index, e),
        }
    }
}

impl Error for SeedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidGenome(_, e) => Some(e),
            _ => None,
        }
    }
}
