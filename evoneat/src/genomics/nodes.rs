use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::fmt;

/// A NodeType indicates the function of
/// the node's network equivalent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// Input nodes, set from the observation vector.
    Input,
    /// Output nodes, read as the network's actions.
    Output,
    /// Hidden nodes, created by node addition mutations.
    Hidden,
    /// Bias nodes, which always emit 1.0.
    Bias,
}

impl NodeType {
    /// Returns whether the node's value is supplied from
    /// outside the network (inputs and biases). Such nodes
    /// never receive genes and have no temporal state.
    pub fn is_sensor(self) -> bool {
        matches!(self, NodeType::Input | NodeType::Bias)
    }
}

/// Nodes are the structural elements of genomes
/// between which genes are created.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Node {
    id: Innovation,
    node_type: NodeType,
}

impl Node {
    /// Generate a new node with the passed parameters.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::{Node, NodeType};
    ///
    /// let node = Node::new(5, NodeType::Hidden);
    /// assert_eq!(node.id(), 5);
    /// assert_eq!(node.node_type(), NodeType::Hidden);
    /// ```
    pub fn new(id: Innovation, node_type: NodeType) -> Node {
        Node { id, node_type }
    }

    /// Returns the node's id.
    pub fn id(&self) -> Innovation {
        self.id
    }

    /// Returns the node's node type.
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}[{:?}]", self.id, self.node_type)
    }
}
