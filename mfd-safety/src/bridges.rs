//! Edge-bridge enumeration on a leased adjacency list.
//!
//! `all_bridges` lists, in order, the edges that every s-to-t walk must use;
//! `first_bridge` stops at the first one (the immediate edge dominator).
//! Both work on whichever adjacency list the caller leases — forward or
//! reverse — so one implementation serves both directions. Edges found on the
//! reverse list come back in reverse orientation; callers flip them.
//!
//! The algorithm pops and injects adjacency entries while it runs. All
//! mutation goes through a scoped lease that replays the exact inverse on
//! drop, so every exit path — including `NotReachable` and panics — leaves
//! the adjacency bit-identical to how it was found.

use crate::graph::{Edge, Node};
use std::collections::VecDeque;

#[derive(Debug, PartialEq, Eq)]
pub struct NotReachable {
    pub source: Node,
    pub target: Node,
}

impl std::fmt::Display for NotReachable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "vertex {} is unreachable from {}", self.target, self.source)
    }
}

impl std::error::Error for NotReachable {}

/// Lease over an adjacency list holding an arbitrary discovered s-to-t path
/// with its edges popped and their reversals injected.
struct PathLease<'a> {
    adj: &'a mut [Vec<Node>],
    path: Vec<Node>,
    // (vertex, value) pairs popped during discovery, in pop order
    popped: Vec<(Node, Node)>,
    // vertices that received an injected reverse edge
    reversed: Vec<Node>,
}

impl<'a> PathLease<'a> {
    /// Walks from `s` by repeatedly popping the last out-edge until `t` is
    /// hit, then injects the reversed path edges.
    fn discover(adj: &'a mut [Vec<Node>], s: Node, t: Node) -> Result<Self, NotReachable> {
        let mut lease = PathLease {
            adj,
            path: vec![s],
            popped: Vec::new(),
            reversed: Vec::new(),
        };
        let mut current = s;
        while current != t {
            match lease.adj[current].pop() {
                Some(next) => {
                    lease.popped.push((current, next));
                    lease.path.push(next);
                    current = next;
                }
                // dropping the partial lease restores the popped edges
                None => return Err(NotReachable { source: s, target: t }),
            }
            debug_assert!(
                lease.path.len() <= lease.adj.len(),
                "path revisits a vertex; adjacency is cyclic"
            );
        }
        for i in 1..lease.path.len() {
            let (u, v) = (lease.path[i - 1], lease.path[i]);
            lease.adj[v].push(u);
            lease.reversed.push(v);
        }
        Ok(lease)
    }

    fn adj(&self) -> &[Vec<Node>] {
        self.adj
    }
    fn path(&self) -> &[Node] {
        &self.path
    }
}

impl Drop for PathLease<'_> {
    fn drop(&mut self) {
        // injected reversals sit on top of their lists; remove them first so
        // the re-appended path edges land back in their original slots
        for &v in self.reversed.iter().rev() {
            let injected = self.adj[v].pop();
            debug_assert!(injected.is_some());
        }
        for &(u, v) in self.popped.iter().rev() {
            self.adj[u].push(v);
        }
    }
}

/// All edges lying on every s-to-t walk, ordered from `s` toward `t`.
pub fn all_bridges(
    adj: &mut [Vec<Node>],
    s: Node,
    t: Node,
) -> Result<Vec<Edge>, NotReachable> {
    sweep(adj, s, t, false)
}

/// The bridge nearest to `s`, or `None` when `t` is reachable without one.
pub fn first_bridge(
    adj: &mut [Vec<Node>],
    s: Node,
    t: Node,
) -> Result<Option<Edge>, NotReachable> {
    Ok(sweep(adj, s, t, true)?.pop())
}

// One BFS sweep per bridge: a sweep floods everything reachable without
// crossing an undiscovered bridge, and the first path vertex left unlabeled
// names the next bridge. The injected reverse edges let later sweeps reach
// "behind" their seed vertex.
fn sweep(
    adj: &mut [Vec<Node>],
    s: Node,
    t: Node,
    first_only: bool,
) -> Result<Vec<Edge>, NotReachable> {
    let lease = PathLease::discover(adj, s, t)?;
    let n = lease.adj().len();
    let mut component = vec![0u32; n];
    let mut bridges = Vec::new();
    let mut queue = VecDeque::new();
    let mut sweep_no = 1u32;
    let mut first_node = 0;
    component[s] = 1;
    queue.push_back(s);

    while component[t] == 0 {
        if sweep_no != 1 {
            // first path vertex still unlabeled; in total this scan costs
            // |path| across all sweeps
            while component[lease.path()[first_node]] != 0 {
                first_node += 1;
            }
            let y = lease.path()[first_node - 1];
            let z = lease.path()[first_node];
            bridges.push((y, z));
            if first_only {
                return Ok(bridges);
            }
            component[z] = sweep_no;
            queue.push_back(z);
        }
        while let Some(u) = queue.pop_front() {
            for &v in &lease.adj()[u] {
                if component[v] == 0 {
                    component[v] = sweep_no;
                    queue.push_back(v);
                }
            }
        }
        sweep_no += 1;
    }
    Ok(bridges)
}
