//! Minimum-cost flow on directed networks with node demands.
//!
//! A network is a set of nodes, each with an integer demand (negative for
//! supply, positive for consumption), and a set of arcs with capacities and
//! per-unit costs. `solve` finds a flow meeting every demand at minimum total
//! cost, or reports that no such flow exists.

use log::*;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NodeRef(usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ArcRef(usize);

#[derive(Copy, Clone, Debug)]
pub struct NodeRefs {
    first: usize,
    len: usize,
}
impl NodeRefs {
    pub fn get(&self, index: usize) -> NodeRef {
        debug_assert!(
            index < self.len,
            "index {} out of bounds {}",
            index,
            self.len
        );
        NodeRef(self.first + index)
    }
    pub fn iter(&self) -> impl Iterator<Item = NodeRef> {
        (self.first..self.first + self.len).map(NodeRef)
    }
    pub fn len(&self) -> usize {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Arc specification: `capacity` units at most, `cost` per unit.
#[derive(Copy, Clone, Debug)]
pub struct Arc {
    pub from: NodeRef,
    pub to: NodeRef,
    pub capacity: i64,
    pub cost: i64,
}

/// No flow satisfies every node demand.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Infeasible;
impl std::fmt::Display for Infeasible {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "no feasible flow satisfies the node demands")
    }
}
impl std::error::Error for Infeasible {}

#[derive(Clone, Debug, Default)]
pub struct Network {
    demands: Vec<i64>,
    arcs: Vec<Arc>,
}

impl Network {
    /// An effectively unbounded arc capacity, safe against cost overflow.
    pub const INF: i64 = i64::MAX / 4;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, demand: i64) -> NodeRef {
        self.demands.push(demand);
        NodeRef(self.demands.len() - 1)
    }
    pub fn add_nodes(&mut self, demands: Vec<i64>) -> NodeRefs {
        let first = self.demands.len();
        let len = demands.len();
        self.demands.extend(demands);
        NodeRefs { first, len }
    }

    pub fn add_arc(&mut self, spec: Arc) -> ArcRef {
        debug_assert!(spec.capacity >= 0, "negative capacity {}", spec.capacity);
        self.arcs.push(spec);
        ArcRef(self.arcs.len() - 1)
    }

    pub fn num_nodes(&self) -> usize {
        self.demands.len()
    }
    pub fn num_arcs(&self) -> usize {
        self.arcs.len()
    }

    /// Solves by successive shortest augmenting paths with Johnson potentials.
    pub fn solve(&self) -> Result<Solution, Infeasible> {
        Residual::new(self).run()
    }
}

/// A minimum-cost feasible flow.
#[derive(Clone, Debug)]
pub struct Solution {
    cost: i64,
    flow: Vec<i64>,
}
impl Solution {
    pub fn cost(&self) -> i64 {
        self.cost
    }
    pub fn flow(&self, arc: ArcRef) -> i64 {
        self.flow[arc.0]
    }
}

const UNREACHED: i64 = i64::MAX;

// Residual edges are stored in twin pairs; `e ^ 1` is the reverse of `e`.
struct ResEdge {
    to: usize,
    cap: i64,
    cost: i64,
}

struct Residual<'n> {
    network: &'n Network,
    adj: Vec<Vec<usize>>,
    edges: Vec<ResEdge>,
    source: usize,
    target: usize,
    required: i64,
}

impl<'n> Residual<'n> {
    fn new(network: &'n Network) -> Self {
        let n = network.num_nodes();
        let (source, target) = (n, n + 1);
        let mut this = Residual {
            network,
            adj: vec![Vec::new(); n + 2],
            edges: Vec::with_capacity(2 * (network.num_arcs() + n)),
            source,
            target,
            required: 0,
        };
        for arc in &network.arcs {
            this.push_edge(arc.from.0, arc.to.0, arc.capacity, arc.cost);
        }
        // demand < 0 supplies flow, demand > 0 consumes it
        for (v, &demand) in network.demands.iter().enumerate() {
            if demand < 0 {
                this.push_edge(source, v, -demand, 0);
            } else if demand > 0 {
                this.push_edge(v, target, demand, 0);
                this.required += demand;
            }
        }
        this
    }

    fn push_edge(&mut self, from: usize, to: usize, cap: i64, cost: i64) {
        self.adj[from].push(self.edges.len());
        self.edges.push(ResEdge { to, cap, cost });
        self.adj[to].push(self.edges.len());
        self.edges.push(ResEdge {
            to: from,
            cap: 0,
            cost: -cost,
        });
    }

    fn run(mut self) -> Result<Solution, Infeasible> {
        let n = self.adj.len();
        let mut potential = self.initial_potentials();
        let mut pushed = 0;

        while pushed < self.required {
            let (dist, parent) = self.dijkstra(&potential);
            if dist[self.target] == UNREACHED {
                break;
            }
            for v in 0..n {
                if dist[v] != UNREACHED {
                    potential[v] += dist[v];
                }
            }
            pushed += self.augment(&parent);
        }

        if pushed < self.required {
            debug!(
                "infeasible network: pushed {} of {} demanded units",
                pushed, self.required
            );
            return Err(Infeasible);
        }

        let flow: Vec<i64> = (0..self.network.num_arcs())
            .map(|i| self.edges[2 * i + 1].cap)
            .collect();
        let cost = self
            .network
            .arcs
            .iter()
            .zip(flow.iter())
            .map(|(arc, &f)| arc.cost * f)
            .sum();
        Ok(Solution { cost, flow })
    }

    // Bellman-Ford pass so that negative arc costs are tolerated; with
    // non-negative costs this converges after one round.
    fn initial_potentials(&self) -> Vec<i64> {
        let n = self.adj.len();
        let mut potential = vec![0i64; n];
        for _ in 1..n {
            let mut changed = false;
            for v in 0..n {
                for &e in &self.adj[v] {
                    let edge = &self.edges[e];
                    if edge.cap > 0 && potential[v] + edge.cost < potential[edge.to] {
                        potential[edge.to] = potential[v] + edge.cost;
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
        potential
    }

    // Shortest path tree from the super source under reduced costs.
    fn dijkstra(&self, potential: &[i64]) -> (Vec<i64>, Vec<Option<usize>>) {
        let n = self.adj.len();
        let mut dist = vec![UNREACHED; n];
        let mut parent: Vec<Option<usize>> = vec![None; n];
        let mut heap = BinaryHeap::new();
        dist[self.source] = 0;
        heap.push(Reverse((0i64, self.source)));

        while let Some(Reverse((d, v))) = heap.pop() {
            if d > dist[v] {
                continue;
            }
            for &e in &self.adj[v] {
                let edge = &self.edges[e];
                if edge.cap <= 0 {
                    continue;
                }
                let next = d + edge.cost + potential[v] - potential[edge.to];
                debug_assert!(
                    edge.cost + potential[v] - potential[edge.to] >= 0,
                    "negative reduced cost on edge {}",
                    e
                );
                if next < dist[edge.to] {
                    dist[edge.to] = next;
                    parent[edge.to] = Some(e);
                    heap.push(Reverse((next, edge.to)));
                }
            }
        }
        (dist, parent)
    }

    fn augment(&mut self, parent: &[Option<usize>]) -> i64 {
        let mut bottleneck = i64::MAX;
        let mut v = self.target;
        while let Some(e) = parent[v] {
            bottleneck = bottleneck.min(self.edges[e].cap);
            v = self.edges[e ^ 1].to;
        }
        debug_assert!(bottleneck > 0 && bottleneck < i64::MAX);

        let mut v = self.target;
        while let Some(e) = parent[v] {
            self.edges[e].cap -= bottleneck;
            self.edges[e ^ 1].cap += bottleneck;
            v = self.edges[e ^ 1].to;
        }
        bottleneck
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_arc() {
        let mut net = Network::new();
        let a = net.add_node(-3);
        let b = net.add_node(3);
        let arc = net.add_arc(Arc {
            from: a,
            to: b,
            capacity: 5,
            cost: 2,
        });
        let sol = net.solve().unwrap();
        assert_eq!(sol.cost(), 6);
        assert_eq!(sol.flow(arc), 3);
    }

    #[test]
    fn prefers_cheap_route() {
        let mut net = Network::new();
        let nodes = net.add_nodes(vec![-4, 0, 0, 4]);
        let cheap_a = net.add_arc(Arc {
            from: nodes.get(0),
            to: nodes.get(1),
            capacity: 3,
            cost: 1,
        });
        let cheap_b = net.add_arc(Arc {
            from: nodes.get(1),
            to: nodes.get(3),
            capacity: 3,
            cost: 0,
        });
        let pricey = net.add_arc(Arc {
            from: nodes.get(0),
            to: nodes.get(2),
            capacity: Network::INF,
            cost: 5,
        });
        let pricey_tail = net.add_arc(Arc {
            from: nodes.get(2),
            to: nodes.get(3),
            capacity: Network::INF,
            cost: 0,
        });
        let sol = net.solve().unwrap();
        assert_eq!(sol.flow(cheap_a), 3);
        assert_eq!(sol.flow(cheap_b), 3);
        assert_eq!(sol.flow(pricey), 1);
        assert_eq!(sol.flow(pricey_tail), 1);
        assert_eq!(sol.cost(), 3 + 5);
    }

    #[test]
    fn infeasible_when_capacity_short() {
        let mut net = Network::new();
        let a = net.add_node(-2);
        let b = net.add_node(2);
        net.add_arc(Arc {
            from: a,
            to: b,
            capacity: 1,
            cost: 0,
        });
        assert_eq!(net.solve().unwrap_err(), Infeasible);
    }

    #[test]
    fn balanced_zero_demand_is_trivial() {
        let mut net = Network::new();
        let a = net.add_node(0);
        let b = net.add_node(0);
        let arc = net.add_arc(Arc {
            from: a,
            to: b,
            capacity: 10,
            cost: 1,
        });
        let sol = net.solve().unwrap();
        assert_eq!(sol.cost(), 0);
        assert_eq!(sol.flow(arc), 0);
    }

    #[test]
    fn negative_cost_arc() {
        // the potential initialization must absorb the negative cost
        let mut net = Network::new();
        let a = net.add_node(-1);
        let b = net.add_node(0);
        let c = net.add_node(1);
        let rebate = net.add_arc(Arc {
            from: a,
            to: b,
            capacity: 1,
            cost: -4,
        });
        net.add_arc(Arc {
            from: b,
            to: c,
            capacity: 1,
            cost: 1,
        });
        net.add_arc(Arc {
            from: a,
            to: c,
            capacity: 1,
            cost: 0,
        });
        let sol = net.solve().unwrap();
        assert_eq!(sol.flow(rebate), 1);
        assert_eq!(sol.cost(), -3);
    }
}
