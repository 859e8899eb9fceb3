//! Fix-set selection: one longest safe sequence per edge of a maximum-weight
//! antichain. The selected sequences are pairwise antichain-disjoint, so each
//! can be pinned to its own path slot downstream.

use crate::antichain::max_edge_antichain;
use crate::error::Result;
use crate::graph::{Edge, StDag};
use std::collections::HashMap;

/// Index of the longest sequence containing each edge; earlier sequences win
/// ties.
fn longest_sequence_per_edge(sequences: &[Vec<Edge>]) -> HashMap<Edge, usize> {
    let mut longest: HashMap<Edge, usize> = HashMap::new();
    for (i, seq) in sequences.iter().enumerate() {
        for &edge in seq {
            match longest.get(&edge) {
                None => {
                    longest.insert(edge, i);
                }
                Some(&j) => {
                    if sequences[j].len() < seq.len() {
                        longest.insert(edge, i);
                    }
                }
            }
        }
    }
    longest
}

/// Picks the fix-set: the antichain is weighted by the length of each edge's
/// longest sequence, and every antichain edge contributes that sequence.
pub fn select_fix_set(g: &StDag, sequences: &[Vec<Edge>]) -> Result<Vec<Vec<Edge>>> {
    let longest = longest_sequence_per_edge(sequences);
    let rho = |e: Edge| longest.get(&e).map_or(0, |&i| sequences[i].len() as u64);
    let (_, antichain) = max_edge_antichain(g, rho)?;
    Ok(antichain
        .into_iter()
        .map(|e| sequences[longest[&e]].clone())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safety::maximal_safe_sequences_via_dominators;

    #[test]
    fn chain_fixes_its_single_sequence() {
        let mut g = StDag::canonical(2, &[(0, 1, 5)], "chain").unwrap();
        let x = g.edge_list().to_vec();
        let seqs = maximal_safe_sequences_via_dominators(&mut g, &x);
        let fix = select_fix_set(&g, &seqs).unwrap();
        assert_eq!(fix, vec![vec![(0, 1), (1, 2), (2, 3)]]);
    }

    #[test]
    fn join_graph_fixes_both_routes() {
        let mut g = StDag::canonical(
            5,
            &[(0, 1, 3), (0, 2, 2), (1, 3, 3), (2, 3, 2), (3, 4, 5)],
            "join",
        )
        .unwrap();
        let x = g.edge_list().to_vec();
        let seqs = maximal_safe_sequences_via_dominators(&mut g, &x);
        let mut fix = select_fix_set(&g, &seqs).unwrap();
        fix.sort();
        assert_eq!(
            fix,
            vec![
                vec![(0, 1), (1, 2), (2, 4), (4, 5), (5, 6)],
                vec![(0, 1), (1, 3), (3, 4), (4, 5), (5, 6)],
            ]
        );
    }

    #[test]
    fn ties_prefer_the_first_sequence() {
        let sequences = vec![
            vec![(1, 2), (2, 3)],
            vec![(2, 3), (3, 4)],
            vec![(2, 3)],
        ];
        let longest = longest_sequence_per_edge(&sequences);
        assert_eq!(longest[&(2, 3)], 0);
        assert_eq!(longest[&(3, 4)], 1);
    }
}
