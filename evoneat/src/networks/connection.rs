use std::fmt;

/// An incoming link into a network node.
#[derive(Clone, Copy, PartialEq)]
pub struct Connection {
    pub source: usize,
    pub weight: f64,
    pub recurrent: bool,
}

impl Connection {
    /// Creates a new Connection from the specified
    /// source node with the given weight.
    pub fn new(source: usize, weight: f64, recurrent: bool) -> Connection {
        Connection {
            source,
            weight,
            recurrent,
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} {:.9}",
            if self.recurrent { "~" } else { "" },
            self.source,
            self.weight
        )
    }
}
