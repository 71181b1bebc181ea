//! The Optimizer: turns a set of orphaned tasks into a feasible assignment
//! plan by seeding greedily in priority order, then spending a bounded
//! local-search budget trying to improve the objective score without ever
//! leaving the plan infeasible.

pub mod greedy;
pub mod local_search;
pub mod objective;
#[allow(clippy::module_inception)]
pub mod optimizer;

pub use optimizer::{optimize, OptimizationOutcome};
