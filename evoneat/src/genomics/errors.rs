use crate::Innovation;

use std::error::Error;
use std::fmt;

/// An error type indicating that a genome
/// breaks one of the structural invariants the
/// alignment algorithms depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenomeInvariantError {
    /// Two genes share an innovation number.
    DuplicateGeneID(Innovation),
    /// A gene references a node absent from the genome.
    NonexistantEndpoints(Innovation, Innovation),
    /// A gene ends in an input or bias node.
    SensorEndpoint(Innovation),
    /// A node's id does not match its position,
    /// i.e. node ids are not dense from 0.
    MisplacedNode { index: usize, id: Innovation },
    /// Genes are not sorted by innovation number.
    UnsortedGenes(Innovation, Innovation),
}

/// An error type indicating a failure
/// to carry out a gene addition mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneAdditionMutationError {
    /// The genome has fewer than two nodes.
    TooFewNodes,
    /// The chosen source node is already connected
    /// to every viable destination.
    NoDestinationFound(Innovation),
}

/// An error type indicating a failure
/// to carry out a node addition mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeAdditionMutationError {
    /// The genome has no enabled gene to split.
    NoEnabledGenes,
}

impl fmt::Display for GenomeInvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateGeneID(id) => write!(f, "duplicate gene insertion with id {}", id),
            Self::NonexistantEndpoints(input, output) => write!(
                f,
                "gene between nonexistant endpoint(s) {} -> {}",
                input, output
            ),
            Self::SensorEndpoint(id) => {
                write!(f, "gene with input or bias node {} as destination", id)
            }
            Self::MisplacedNode { index, id } => {
                write!(f, "node with id {} found at position {}", id, index)
            }
            Self::UnsortedGenes(previous, next) => write!(
                f,
                "gene {} follows gene {} out of innovation order",
                next, previous
            ),
        }
    }
}

impl fmt::Display for GeneAdditionMutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewNodes => write!(f, "gene mutation on genome with fewer than two nodes"),
            Self::NoDestinationFound(source) => write!(
                f,
                "no unconnected destination found for source node {}",
                source
            ),
        }
    }
}

impl fmt::Display for NodeAdditionMutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEnabledGenes => write!(f, "node mutation on genome without enabled genes"),
        }
    }
}

impl Error for GenomeInvariantError {}
impl Error for GeneAdditionMutationError {}
impl Error for NodeAdditionMutationError {}
