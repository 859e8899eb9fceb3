//! Safe-sequence assembly: ordered edge sequences that occur, in order, in
//! some path of every optimal flow decomposition.
//!
//! Three assemblers are provided. `safe_sequences_direct` extends every edge
//! independently and emits duplicates; `maximal_safe_sequences` extends one
//! core unitig at a time; `maximal_safe_sequences_via_dominators` reaches the
//! same sequences through the two arc dominator trees. The two maximal
//! variants emit no sequence contained in another, and with X = E every edge
//! of the graph appears in the union of the output.

use crate::bridges::{all_bridges, first_bridge};
use crate::dominators::{ArcDominatorTree, Walk};
use crate::graph::{Direction, Edge, Node, StDag};
use fixedbitset::FixedBitSet;
use log::*;
use std::collections::VecDeque;

/// Ordered bridges from `v` back to the super source, in forward orientation
/// and s-to-v order. Unreachable sources degrade to an empty extension.
fn left_extension(g: &mut StDag, v: Node) -> Vec<Edge> {
    let source = g.source();
    match all_bridges(g.adj_mut(Direction::Reverse), v, source) {
        Ok(bridges) => bridges.into_iter().rev().map(|(x, y)| (y, x)).collect(),
        Err(err) => {
            debug!("left extension skipped: {}", err);
            Vec::new()
        }
    }
}

/// Ordered bridges from `v` to the super sink.
fn right_extension(g: &mut StDag, v: Node) -> Vec<Edge> {
    let sink = g.sink();
    match all_bridges(g.adj_mut(Direction::Forward), v, sink) {
        Ok(bridges) => bridges,
        Err(err) => {
            debug!("right extension skipped: {}", err);
            Vec::new()
        }
    }
}

/// The maximal chain of edges through `e` whose internal vertices all have
/// in-degree = out-degree = 1. Returns the leftmost vertex, the rightmost
/// vertex and the chain itself.
fn unitig_of_arc(g: &StDag, e: Edge) -> (Node, Node, Vec<Edge>) {
    let (mut u, mut v) = e;
    let mut unitig = VecDeque::new();
    unitig.push_back(e);
    while g.has_unique_out_neighbor(v) && g.has_unique_in_neighbor(v) {
        let x = g.out_neighbors(v)[0];
        unitig.push_back((v, x));
        v = x;
    }
    while g.has_unique_in_neighbor(u) && g.has_unique_out_neighbor(u) {
        let x = g.in_neighbors(u)[0];
        unitig.push_front((x, u));
        u = x;
    }
    (u, v, unitig.into_iter().collect())
}

// A unitig is a core when neither endpoint forces a unique continuation:
// such unitigs are strict middles of longer safe sequences and extending
// them would emit contained duplicates.
fn is_core(g: &StDag, u: Node, v: Node) -> bool {
    (g.out_degree(v) < 1 || g.in_degree(v) != 1)
        && (g.in_degree(u) < 1 || g.out_degree(u) != 1)
}

/// Per-edge safe sequences: bridges to the source, the edge, bridges to the
/// sink. Not deduplicated; sequences follow the iteration order of `E`.
pub fn safe_sequences_direct(g: &mut StDag) -> Vec<Vec<Edge>> {
    let mut sequences = Vec::with_capacity(g.num_edges());
    for i in 0..g.num_edges() {
        let (u, v) = g.edge_list()[i];
        let mut seq = left_extension(g, u);
        seq.push((u, v));
        seq.extend(right_extension(g, v));
        sequences.push(seq);
    }
    sequences
}

/// Maximal safe sequences seeded from the edges of `x`: every core unitig
/// met through `x` is extended with its bridge prefixes and suffixes.
pub fn maximal_safe_sequences(g: &mut StDag, x: &[Edge]) -> Vec<Vec<Edge>> {
    let mut processed = FixedBitSet::with_capacity(g.num_edges());
    let mut sequences = Vec::new();
    for &e in x {
        let id = match g.edge_id(e) {
            Some(id) => id,
            None => {
                warn!("({},{}) is not an edge of graph {}", e.0, e.1, g.id());
                continue;
            }
        };
        if processed.contains(id) {
            continue;
        }
        // every arc-unitig is identified by its endpoints, so marking the
        // whole chain visits each unitig once
        let (l, r, unitig) = unitig_of_arc(g, e);
        for &arc in &unitig {
            processed.insert(g.edge_id(arc).expect("unitig walks existing edges"));
        }
        if is_core(g, l, r) {
            let mut seq = left_extension(g, l);
            seq.extend(&unitig);
            seq.extend(right_extension(g, r));
            sequences.push(seq);
        }
    }
    sequences
}

/// The unitig-only heuristic: each maximal arc-unitig of `x`, with no bridge
/// extension and no core filter. Weaker than the maximal sequences; kept as
/// an optional fix-set source.
pub fn safe_paths(g: &StDag, x: &[Edge]) -> Vec<Vec<Edge>> {
    let mut processed = FixedBitSet::with_capacity(g.num_edges());
    let mut sequences = Vec::new();
    for &e in x {
        let id = match g.edge_id(e) {
            Some(id) => id,
            None => continue,
        };
        if processed.contains(id) {
            continue;
        }
        let (_, _, unitig) = unitig_of_arc(g, e);
        for &arc in &unitig {
            processed.insert(g.edge_id(arc).expect("unitig walks existing edges"));
        }
        sequences.push(unitig);
    }
    sequences
}

/// Maximal safe sequences through the arc dominator trees.
///
/// Both trees index edges by their id in this graph's edge list, so the
/// pointwise comparison of the two unitary paths compares the same edge
/// objects even though the trees are rooted in opposite directions.
pub fn maximal_safe_sequences_via_dominators(g: &mut StDag, x: &[Edge]) -> Vec<Vec<Edge>> {
    let m = g.num_edges();
    let (source, sink) = (g.source(), g.sink());
    let mut s_idoms = Vec::with_capacity(m);
    let mut t_idoms = Vec::with_capacity(m);
    for i in 0..m {
        let (u, v) = g.edge_list()[i];
        let s_idom = match first_bridge(g.adj_mut(Direction::Reverse), u, source) {
            Ok(bridge) => bridge.map(|(y, z)| (z, y)),
            Err(err) => {
                debug!("sIdom skipped for ({},{}): {}", u, v, err);
                None
            }
        };
        let t_idom = match first_bridge(g.adj_mut(Direction::Forward), v, sink) {
            Ok(bridge) => bridge,
            Err(err) => {
                debug!("tIdom skipped for ({},{}): {}", u, v, err);
                None
            }
        };
        s_idoms.push(s_idom.and_then(|e| g.edge_id(e)));
        t_idoms.push(t_idom.and_then(|e| g.edge_id(e)));
    }

    let mut in_x = FixedBitSet::with_capacity(m);
    for &e in x {
        match g.edge_id(e) {
            Some(id) => in_x.insert(id),
            None => warn!("({},{}) is not an edge of graph {}", e.0, e.1, g.id()),
        }
    }
    let t_s = ArcDominatorTree::build(&s_idoms, &in_x);
    let t_t = ArcDominatorTree::build(&t_idoms, &in_x);

    // an s-leaf is a core when its forced chains in both trees coincide and
    // the forward chain bottoms out at a t-leaf
    let mut sequences = Vec::new();
    for leaf in t_s.x_leaves() {
        let s_path = t_s.unitary_path(leaf, Walk::Up);
        let t_path = t_t.unitary_path(leaf, Walk::Down);
        if t_path.len() > s_path.len() {
            continue;
        }
        if s_path.iter().zip(&t_path).any(|(a, b)| a != b) {
            continue;
        }
        if !t_t.is_leaf_x(*t_path.last().expect("paths include their seed")) {
            continue;
        }
        let mut ids = t_s.dominators(leaf);
        ids.reverse();
        ids.extend(t_t.dominators(leaf).into_iter().skip(1));
        sequences.push(ids.into_iter().map(|id| g.edge_list()[id]).collect());
    }
    sequences
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::StDag;

    fn chain() -> StDag {
        // S1: a single path through the graph
        StDag::canonical(2, &[(0, 1, 5)], "s1").unwrap()
    }

    fn two_paths() -> StDag {
        // S2: two inner routes joining just before the sink
        StDag::canonical(
            5,
            &[(0, 1, 3), (0, 2, 2), (1, 3, 3), (2, 3, 2), (3, 4, 5)],
            "s2",
        )
        .unwrap()
    }

    fn shared_unitig_diamond() -> StDag {
        // S3: a diamond feeding a shared tail unitig
        StDag::canonical(
            6,
            &[
                (0, 1, 2),
                (0, 2, 3),
                (1, 3, 2),
                (2, 3, 3),
                (3, 4, 5),
                (4, 5, 5),
            ],
            "s3",
        )
        .unwrap()
    }

    fn sorted_seqs(mut seqs: Vec<Vec<Edge>>) -> Vec<Vec<Edge>> {
        seqs.sort();
        seqs
    }

    #[test]
    fn chain_is_one_whole_sequence() {
        let mut g = chain();
        let x = g.edge_list().to_vec();
        let seqs = maximal_safe_sequences(&mut g, &x);
        assert_eq!(seqs, vec![vec![(0, 1), (1, 2), (2, 3)]]);
        let seqs = maximal_safe_sequences_via_dominators(&mut g, &x);
        assert_eq!(seqs, vec![vec![(0, 1), (1, 2), (2, 3)]]);
    }

    #[test]
    fn two_paths_give_two_sequences() {
        let mut g = two_paths();
        let x = g.edge_list().to_vec();
        let expected = sorted_seqs(vec![
            vec![(0, 1), (1, 2), (2, 4), (4, 5), (5, 6)],
            vec![(0, 1), (1, 3), (3, 4), (4, 5), (5, 6)],
        ]);
        assert_eq!(sorted_seqs(maximal_safe_sequences(&mut g, &x)), expected);
        assert_eq!(
            sorted_seqs(maximal_safe_sequences_via_dominators(&mut g, &x)),
            expected
        );
    }

    #[test]
    fn shared_tail_is_not_its_own_sequence() {
        // the tail unitig has two incoming routes and is covered by both
        // emitted sequences instead of standing alone
        let mut g = shared_unitig_diamond();
        let x = g.edge_list().to_vec();
        let expected = sorted_seqs(vec![
            vec![(0, 1), (1, 2), (2, 4), (4, 5), (5, 6), (6, 7)],
            vec![(0, 1), (1, 3), (3, 4), (4, 5), (5, 6), (6, 7)],
        ]);
        assert_eq!(sorted_seqs(maximal_safe_sequences(&mut g, &x)), expected);
        assert_eq!(
            sorted_seqs(maximal_safe_sequences_via_dominators(&mut g, &x)),
            expected
        );
    }

    #[test]
    fn direct_variant_extends_every_edge() {
        let mut g = shared_unitig_diamond();
        let seqs = safe_sequences_direct(&mut g);
        assert_eq!(seqs.len(), g.num_edges());
        // the shared tail edge extends to exactly the forced surroundings
        let id = g.edge_id((5, 6)).unwrap();
        assert_eq!(seqs[id], vec![(0, 1), (4, 5), (5, 6), (6, 7)]);
        // every extension of an edge contains that edge
        for (i, seq) in seqs.iter().enumerate() {
            assert!(seq.contains(&g.edge_list()[i]));
        }
    }

    #[test]
    fn variants_cover_the_same_edges() {
        for g in [chain(), two_paths(), shared_unitig_diamond()] {
            let x = g.edge_list().to_vec();
            let mut a = g.clone();
            let mut b = g.clone();
            let mut covered_a: Vec<Edge> = maximal_safe_sequences(&mut a, &x)
                .into_iter()
                .flatten()
                .collect();
            let mut covered_b: Vec<Edge> =
                maximal_safe_sequences_via_dominators(&mut b, &x)
                    .into_iter()
                    .flatten()
                    .collect();
            covered_a.sort();
            covered_a.dedup();
            covered_b.sort();
            covered_b.dedup();
            assert_eq!(covered_a, covered_b);
            // with X = E the union covers every edge
            let mut all = g.edge_list().to_vec();
            all.sort();
            assert_eq!(covered_a, all);
        }
    }

    #[test]
    fn no_sequence_contains_another() {
        let mut g = shared_unitig_diamond();
        let x = g.edge_list().to_vec();
        let seqs = maximal_safe_sequences(&mut g, &x);
        for (i, a) in seqs.iter().enumerate() {
            for (j, b) in seqs.iter().enumerate() {
                if i != j {
                    assert!(
                        !a.windows(b.len()).any(|w| w == &b[..]),
                        "{:?} contains {:?}",
                        a,
                        b
                    );
                }
            }
        }
    }

    #[test]
    fn repeated_runs_are_identical() {
        let mut g = two_paths();
        let x = g.edge_list().to_vec();
        let first = maximal_safe_sequences_via_dominators(&mut g, &x);
        let second = maximal_safe_sequences_via_dominators(&mut g, &x);
        assert_eq!(first, second);
    }

    #[test]
    fn safe_paths_are_bare_unitigs() {
        let g = shared_unitig_diamond();
        let x = g.edge_list().to_vec();
        let paths = sorted_seqs(safe_paths(&g, &x));
        // the shared tail shows up as its own unitig here
        assert!(paths.contains(&vec![(4, 5), (5, 6), (6, 7)]));
        // unitigs never overlap, so together they partition the edge set
        let total: usize = paths.iter().map(|p| p.len()).sum();
        assert_eq!(total, g.num_edges());
    }

    #[test]
    fn subset_seeding_limits_output() {
        let mut g = two_paths();
        // seed only the upper route; the lower route's core is never visited
        let seqs = maximal_safe_sequences(&mut g, &[(1, 2)]);
        assert_eq!(seqs, vec![vec![(0, 1), (1, 2), (2, 4), (4, 5), (5, 6)]]);
    }
}
