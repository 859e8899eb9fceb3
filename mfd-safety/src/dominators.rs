//! Arc dominator trees restricted to a chosen edge subset.
//!
//! Edges are identified by their index into the graph's edge list. The input
//! is a per-edge immediate-dominator table for one direction (`None` marks
//! the root); the tree keeps, for every edge, the nearest ancestor that lies
//! in the subset X, so dominator chains can be walked within X alone.

use fixedbitset::FixedBitSet;

/// Walk direction for `unitary_path`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Walk {
    Up,
    Down,
}

#[derive(Clone, Debug)]
pub struct ArcDominatorTree {
    parent_x: Vec<Option<usize>>,
    children_x: Vec<Vec<usize>>,
    in_x: FixedBitSet,
}

impl ArcDominatorTree {
    /// Builds the X-restricted forest from an immediate-dominator table.
    ///
    /// `idoms[e]` is the immediate edge dominator of edge `e`, or `None` when
    /// the next dominator is the root. The X-parent of an edge is the nearest
    /// entry of its dominator chain that belongs to `x`; chains are collapsed
    /// with memoisation, so construction is linear in the table size.
    pub fn build(idoms: &[Option<usize>], x: &FixedBitSet) -> Self {
        let m = idoms.len();
        let mut memo: Vec<Option<Option<usize>>> = vec![None; m];
        let mut stack = Vec::new();
        for e in 0..m {
            if memo[e].is_some() {
                continue;
            }
            stack.push(e);
            let link = loop {
                let top = *stack.last().unwrap();
                match idoms[top] {
                    None => break None,
                    Some(d) if x.contains(d) => break Some(d),
                    Some(d) => match memo[d] {
                        Some(link) => break link,
                        None => stack.push(d),
                    },
                }
            };
            for v in stack.drain(..) {
                memo[v] = Some(link);
            }
        }
        let parent_x: Vec<Option<usize>> = memo.into_iter().map(|p| p.unwrap()).collect();

        let mut children_x = vec![Vec::new(); m];
        for e in 0..m {
            if x.contains(e) {
                if let Some(p) = parent_x[e] {
                    children_x[p].push(e);
                }
            }
        }
        ArcDominatorTree {
            parent_x,
            children_x,
            in_x: x.clone(),
        }
    }

    pub fn parent_x(&self, e: usize) -> Option<usize> {
        self.parent_x[e]
    }
    pub fn children_x(&self, e: usize) -> &[usize] {
        &self.children_x[e]
    }
    pub fn is_leaf_x(&self, e: usize) -> bool {
        self.children_x[e].is_empty()
    }

    /// X members that dominate no other X member, in edge order.
    pub fn x_leaves(&self) -> Vec<usize> {
        self.in_x
            .ones()
            .filter(|&e| self.is_leaf_x(e))
            .collect()
    }

    /// The X-dominator chain from `e` up to the root, inclusive of `e` and
    /// exclusive of the root.
    pub fn dominators(&self, e: usize) -> Vec<usize> {
        debug_assert!(self.in_x.contains(e));
        let mut chain = vec![e];
        let mut current = e;
        while let Some(p) = self.parent_x[current] {
            chain.push(p);
            current = p;
        }
        chain
    }

    /// The maximal chain from `e` in which every step is forced: upward,
    /// a parent is entered only while it has exactly one X-child; downward,
    /// the walk continues only while the current edge has exactly one
    /// X-child.
    pub fn unitary_path(&self, e: usize, walk: Walk) -> Vec<usize> {
        let mut path = vec![e];
        let mut current = e;
        match walk {
            Walk::Up => {
                while let Some(p) = self.parent_x[current] {
                    if self.children_x[p].len() != 1 {
                        break;
                    }
                    path.push(p);
                    current = p;
                }
            }
            Walk::Down => {
                while self.children_x[current].len() == 1 {
                    let c = self.children_x[current][0];
                    path.push(c);
                    current = c;
                }
            }
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full(m: usize) -> FixedBitSet {
        let mut x = FixedBitSet::with_capacity(m);
        x.insert_range(..);
        x
    }

    // chain 0 <- 1 <- 2 <- 3 (idom points toward the root)
    fn chain_idoms() -> Vec<Option<usize>> {
        vec![None, Some(0), Some(1), Some(2)]
    }

    #[test]
    fn chain_parents_and_leaves() {
        let t = ArcDominatorTree::build(&chain_idoms(), &full(4));
        assert_eq!(t.parent_x(0), None);
        assert_eq!(t.parent_x(3), Some(2));
        assert_eq!(t.x_leaves(), vec![3]);
        assert_eq!(t.dominators(3), vec![3, 2, 1, 0]);
    }

    #[test]
    fn subset_skips_excluded_ancestors() {
        // with 1 and 2 excluded, 3's X-parent collapses to 0
        let mut x = FixedBitSet::with_capacity(4);
        x.insert(0);
        x.insert(3);
        let t = ArcDominatorTree::build(&chain_idoms(), &x);
        assert_eq!(t.parent_x(3), Some(0));
        assert_eq!(t.parent_x(2), Some(0));
        assert_eq!(t.children_x(0), &[3]);
        assert_eq!(t.dominators(3), vec![3, 0]);
        assert_eq!(t.x_leaves(), vec![3]);
    }

    #[test]
    fn unitary_path_stops_at_branching() {
        // 0 has children 1 and 4; 1 -> 2 -> 3 is unitary
        let idoms = vec![None, Some(0), Some(1), Some(2), Some(0)];
        let t = ArcDominatorTree::build(&idoms, &full(5));
        assert_eq!(t.unitary_path(3, Walk::Up), vec![3, 2, 1]);
        assert_eq!(t.unitary_path(1, Walk::Down), vec![1, 2, 3]);
        // 0 has two X-children, so its downward walk goes nowhere
        assert_eq!(t.unitary_path(0, Walk::Down), vec![0]);
        assert_eq!(t.x_leaves(), vec![3, 4]);
    }

    #[test]
    fn deep_chain_builds_without_recursion() {
        // idoms point toward higher indices so the first edge processed has
        // the whole chain ahead of it, and only the last edge is in X
        let m = 200_000;
        let mut idoms: Vec<Option<usize>> = (0..m - 1).map(|e| Some(e + 1)).collect();
        idoms.push(None);
        let mut x = FixedBitSet::with_capacity(m);
        x.insert(m - 1);
        let t = ArcDominatorTree::build(&idoms, &x);
        assert_eq!(t.parent_x(0), Some(m - 1));
        assert_eq!(t.parent_x(m - 1), None);
        assert_eq!(t.x_leaves(), vec![m - 1]);
    }
}
