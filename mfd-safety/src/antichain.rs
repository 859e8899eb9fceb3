//! Maximum-weight edge antichains by reduction to minimum-cost flow.
//!
//! Every edge of the stDAG must carry at least its weight in path-flow, every
//! vertex can start or end any number of paths, and starting a path costs
//! one. The minimum cost of that circulation equals the maximum weight of an
//! edge antichain, and the antichain itself falls out of two residual
//! traversals.

use crate::error::{Error, Result};
use crate::graph::{Edge, StDag};
use log::*;
use mcflow::{Arc, ArcRef, Network};

const BIG: i64 = 1 << 32;

/// The edge-antichain cardinality of the graph (unit weights).
pub fn width(g: &StDag) -> Result<u64> {
    let reduction = Reduction::build(g, |_| 1);
    let solution = reduction.solve(g)?;
    Ok(solution.cost() as u64)
}

/// The maximum ρ-weighted edge antichain: its weight and its edges, in the
/// canonical numbering.
pub fn max_edge_antichain<F>(g: &StDag, rho: F) -> Result<(u64, Vec<Edge>)>
where
    F: Fn(Edge) -> u64,
{
    let reduction = Reduction::build(g, rho);
    let solution = reduction.solve(g)?;
    let antichain = reduction.recover(g, &solution);
    debug_assert_eq!(
        solution.cost(),
        antichain
            .iter()
            .map(|&e| reduction.demand_of(g, e))
            .sum::<i64>(),
        "antichain weight must equal the flow cost"
    );
    Ok((solution.cost() as u64, antichain))
}

// The auxiliary network over {s'} ∪ V ∪ {t'}: a big circulation from s' to
// t', a lower bound of ρ(e) on every original edge (expanded into the
// two-auxiliary-vertex gadget), and cost-1 path starts s' -> v.
struct Reduction {
    net: Network,
    // per original edge: the arc carrying its full flow, and its lower bound
    edge_arcs: Vec<ArcRef>,
    demands: Vec<i64>,
    start_arcs: Vec<ArcRef>,
    end_arcs: Vec<ArcRef>,
}

impl Reduction {
    fn build<F>(g: &StDag, rho: F) -> Self
    where
        F: Fn(Edge) -> u64,
    {
        let n = g.num_nodes();
        let mut net = Network::new();
        let s1 = net.add_node(-BIG);
        let vertices = net.add_nodes(vec![0; n]);
        let t1 = net.add_node(BIG);
        net.add_arc(Arc {
            from: s1,
            to: t1,
            capacity: Network::INF,
            cost: 0,
        });

        let mut edge_arcs = Vec::with_capacity(g.num_edges());
        let mut demands = Vec::with_capacity(g.num_edges());
        for &(u, v) in g.edge_list() {
            let lower = rho((u, v)) as i64;
            let z1 = net.add_node(lower);
            let z2 = net.add_node(-lower);
            edge_arcs.push(net.add_arc(Arc {
                from: vertices.get(u),
                to: z1,
                capacity: Network::INF,
                cost: 0,
            }));
            net.add_arc(Arc {
                from: z1,
                to: z2,
                capacity: Network::INF,
                cost: 0,
            });
            net.add_arc(Arc {
                from: z2,
                to: vertices.get(v),
                capacity: Network::INF,
                cost: 0,
            });
            demands.push(lower);
        }

        let mut start_arcs = Vec::with_capacity(n);
        let mut end_arcs = Vec::with_capacity(n);
        for v in 0..n {
            start_arcs.push(net.add_arc(Arc {
                from: s1,
                to: vertices.get(v),
                capacity: Network::INF,
                cost: 1,
            }));
            end_arcs.push(net.add_arc(Arc {
                from: vertices.get(v),
                to: t1,
                capacity: Network::INF,
                cost: 0,
            }));
        }

        Reduction {
            net,
            edge_arcs,
            demands,
            start_arcs,
            end_arcs,
        }
    }

    fn solve(&self, g: &StDag) -> Result<mcflow::Solution> {
        self.net.solve().map_err(|source| {
            error!("antichain flow infeasible on graph {}", g.id());
            Error::Infeasible {
                id: g.id().to_string(),
                source,
            }
        })
    }

    fn demand_of(&self, g: &StDag, e: Edge) -> i64 {
        self.demands[g.edge_id(e).expect("antichain edges come from the graph")]
    }

    // Two passes over the solved network, both rooted at s'. The first marks
    // everything reachable along arcs with slack over their lower bound
    // (taking any arc backward). The second walks the marked region the same
    // way and collects the arcs pinned to a nonzero lower bound that exit it:
    // those form the antichain.
    fn recover(&self, g: &StDag, solution: &mcflow::Solution) -> Vec<Edge> {
        let n = g.num_nodes();
        // vertex 0 is s', vertices 1..=n are the graph, n+1 is t'
        const S1: usize = 0;
        let t1 = n + 1;

        // out[u]: (target, flow, lower, original edge id if any)
        let mut out: Vec<Vec<(usize, i64, i64, Option<usize>)>> = vec![Vec::new(); n + 2];
        let mut incoming: Vec<Vec<usize>> = vec![Vec::new(); n + 2];
        let mut link = |from: usize, to: usize, flow: i64, lower: i64, id: Option<usize>| {
            out[from].push((to, flow, lower, id));
            incoming[to].push(from);
        };
        for (id, &(u, v)) in g.edge_list().iter().enumerate() {
            let flow = solution.flow(self.edge_arcs[id]);
            link(u + 1, v + 1, flow, self.demands[id], Some(id));
        }
        for v in 0..n {
            link(S1, v + 1, solution.flow(self.start_arcs[v]), 0, None);
            link(v + 1, t1, solution.flow(self.end_arcs[v]), 0, None);
        }

        let mut visited = vec![0u8; n + 2];
        let mut stack = vec![S1];
        while let Some(u) = stack.pop() {
            if visited[u] != 0 {
                continue;
            }
            debug_assert_ne!(u, t1, "slack arcs never reach t'");
            visited[u] = 1;
            for &(v, flow, lower, _) in &out[u] {
                if flow > lower {
                    stack.push(v);
                }
            }
            for &v in &incoming[u] {
                stack.push(v);
            }
        }

        let mut antichain = Vec::new();
        let mut stack = vec![S1];
        while let Some(u) = stack.pop() {
            if visited[u] != 1 {
                continue;
            }
            visited[u] = 2;
            for &(v, flow, lower, id) in &out[u] {
                if flow > lower {
                    stack.push(v);
                } else if flow == lower && lower >= 1 && visited[v] == 0 {
                    let (x, y) = g.edge_list()[id.expect("only graph edges carry lower bounds")];
                    antichain.push((x, y));
                }
            }
            for &v in &incoming[u] {
                stack.push(v);
            }
        }
        antichain
    }
}
