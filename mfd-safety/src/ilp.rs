//! Boundary types for the external MILP layer.
//!
//! The safety engine never solves an ILP; it hands the backend a `Hints`
//! artifact and receives either an objective value or one of the two failure
//! kinds below, which the driver records verbatim.

use crate::graph::{Edge, StDag};
use thiserror::Error;

/// The preprocessing artifact: the fix-set in original 0-based numbering
/// with the super-source and super-sink edges stripped, plus the graph's
/// edge-antichain width. The backend pins the i-th path slot's binary edge
/// variables to 1 along `sequences[i]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hints {
    pub sequences: Vec<Vec<Edge>>,
    pub width: u64,
}

impl Hints {
    /// Translates canonically numbered sequences back to the original
    /// numbering. Sequences left empty by the stripping are dropped.
    pub fn from_canonical(g: &StDag, fix_set: &[Vec<Edge>]) -> Self {
        let (source, sink) = (g.source(), g.sink());
        let sequences: Vec<Vec<Edge>> = fix_set
            .iter()
            .map(|seq| {
                seq.iter()
                    .filter(|&&(u, v)| u != source && v != sink)
                    .map(|&(u, v)| (u - 1, v - 1))
                    .collect::<Vec<Edge>>()
            })
            .filter(|seq: &Vec<Edge>| !seq.is_empty())
            .collect();
        Hints {
            sequences,
            width: g.width(),
        }
    }

    pub fn fixed_var_count(&self) -> usize {
        self.sequences.iter().map(|seq| seq.len()).sum()
    }
}

/// Failure kinds reported by the MILP backend. The safety core never raises
/// these; the driver propagates them into its output unchanged.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SolveError {
    #[error("solver timeout: {context}")]
    Timeout { context: String },
    #[error("model infeasible: {context}")]
    Infeasible { context: String },
}

#[derive(Clone, Copy, Debug)]
pub struct SolveOptions {
    pub epsilon: f64,
    pub timeout_secs: u64,
    pub threads: usize,
    /// Run the objective-improvement loop over the path count instead of a
    /// single feasibility solve.
    pub optimize: bool,
}

/// The seam an external MILP backend implements. `hints` of `None` is the
/// vanilla solve; fixing the hints must never worsen the optimal objective.
pub trait Solver {
    fn robust(
        &self,
        g: &StDag,
        hints: Option<&Hints>,
        options: &SolveOptions,
    ) -> Result<f64, SolveError>;

    fn least_squares(
        &self,
        g: &StDag,
        hints: Option<&Hints>,
        options: &SolveOptions,
    ) -> Result<f64, SolveError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cover::select_fix_set;
    use crate::io;
    use crate::safety::maximal_safe_sequences_via_dominators;

    #[test]
    fn hints_strip_super_edges_and_renumber() {
        let mut graphs = io::parse("#Graph s1\n4\n0 1 5\n1 2 5\n2 3 5\n").unwrap();
        let g = &mut graphs[0];
        let x = g.edge_list().to_vec();
        let seqs = maximal_safe_sequences_via_dominators(g, &x);
        let fix = select_fix_set(g, &seqs).unwrap();
        let hints = Hints::from_canonical(g, &fix);
        assert_eq!(hints.width, 1);
        assert_eq!(hints.sequences, vec![vec![(0, 1), (1, 2), (2, 3)]]);
        assert_eq!(hints.fixed_var_count(), 3);
    }

    #[test]
    fn single_edge_graph_fixes_that_edge() {
        let mut graphs = io::parse("#Graph tiny\n2\n0 1 9\n").unwrap();
        let g = &mut graphs[0];
        let x = g.edge_list().to_vec();
        let seqs = maximal_safe_sequences_via_dominators(g, &x);
        let fix = select_fix_set(g, &seqs).unwrap();
        let hints = Hints::from_canonical(g, &fix);
        assert_eq!(hints.width, 1);
        assert_eq!(hints.sequences, vec![vec![(0, 1)]]);
    }
}
