//! Safety preprocessing for integer-linear-programming formulations of
//! minimum flow decomposition.
//!
//! Given a weighted stDAG, the engine computes maximal safe sequences —
//! ordered edge sequences that occur, in order, in some path of every
//! optimal flow decomposition — and selects an antichain-disjoint subset of
//! them.
//! The resulting fix-set pre-pins binary path variables in the downstream
//! ILP, shrinking its search space without changing its optimum.

pub mod antichain;
pub mod bridges;
pub mod cover;
pub mod dominators;
pub mod error;
pub mod generate;
pub mod graph;
pub mod ilp;
pub mod io;
pub mod logging;
pub mod safety;

pub use error::{Error, Result};
pub use graph::{Direction, Edge, Node, StDag};
