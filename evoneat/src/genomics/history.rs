use crate::Innovation;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::hash_map::{Entry, HashMap};

/// A `History` keeps track of gene innovations in a
/// population, in order to make sure identical mutations
/// are assigned the same innovation numbers.
///
/// The input and output nodes of a gene identify the
/// structural change, and the corresponding innovation
/// number is recorded for the rest of the run. Entries
/// are never removed.
///
/// A single `History` is threaded through every call
/// that may create a gene (genome initialization, gene
/// addition and node addition mutations).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    next_gene_innovation: Innovation,
    gene_innovations: HashMap<(Innovation, Innovation), Innovation, RandomState>,
}

impl History {
    /// Creates a new, empty history.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::History;
    ///
    /// let history = History::new();
    /// assert_eq!(history.innovation_count(), 0);
    /// ```
    pub fn new() -> History {
        History::default()
    }

    /// Returns the innovation number previously assigned to
    /// a gene between `input_id` and `output_id`, or assigns
    /// and returns the next available one.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::History;
    ///
    /// let mut history = History::new();
    ///
    /// assert_eq!(history.get_or_create(0, 3), 0);
    /// assert_eq!(history.get_or_create(1, 3), 1);
    /// // The same structural change maps to the same number.
    /// assert_eq!(history.get_or_create(0, 3), 0);
    /// // Direction matters.
    /// assert_eq!(history.get_or_create(3, 0), 2);
    /// ```
    pub fn get_or_create(&mut self, input_id: Innovation, output_id: Innovation) -> Innovation {
        match self.gene_innovations.entry((input_id, output_id)) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let innovation = self.next_gene_innovation;
                entry.insert(innovation);
                self.next_gene_innovation += 1;
                innovation
            }
        }
    }

    /// Returns the innovation number assigned to a gene between
    /// `input_id` and `output_id`, if any, without registering it.
    pub fn get(&self, input_id: Innovation, output_id: Innovation) -> Option<Innovation> {
        self.gene_innovations.get(&(input_id, output_id)).copied()
    }

    /// Returns the number of innovation numbers handed out so far.
    pub fn innovation_count(&self) -> usize {
        self.next_gene_innovation
    }

    /// Returns an iterator over the complete record of
    /// gene innovations, in the format
    /// `((input node, output node), gene innovation)`.
    /// No ordering is guaranteed.
    pub fn gene_innovation_history(
        &self,
    ) -> impl Iterator<Item = (&(Innovation, Innovation), &Innovation)> {
        self.gene_innovations.iter()
    }
}
