//! Random stDAG generation for tests and benchmarks: an upper-triangular
//! Erdős–Rényi DAG, canonicalised, with unit weights.

use crate::antichain;
use crate::error::Result;
use crate::graph::StDag;
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg64;

/// Each ordered pair (i, j) with i < j becomes an edge with probability `p`.
/// The seed is explicit so runs are reproducible.
pub fn er_stdag(n: usize, p: f64, seed: u64) -> Result<StDag> {
    let mut rng = Pcg64::seed_from_u64(seed);
    let mut edges = Vec::new();
    for i in 0..n {
        for j in i + 1..n {
            if rng.gen::<f64>() <= p {
                edges.push((i, j, 1));
            }
        }
    }
    let mut g = StDag::canonical(n, &edges, format!("ER_{}", p))?;
    let width = antichain::width(&g)?;
    g.cache_width(width);
    Ok(g)
}
