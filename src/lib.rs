//! Constrained local-search solvers for hardware kernel tiling parameters
//!
//! A general solver moves one integer variable per round through a plugged-in
//! cost model. Specialised solvers handle the innermost tiles and the cache
//! tiles, and size buffer axes before multicore axes. Reference host cases
//! combine them per operator and select the cheapest strategy.

#![forbid(unsafe_code)]

/// Reference host cases built from the solvers, and case selection
pub mod cases;
/// Command line and configuration, plus the types shared with the host
pub mod io;
/// Integer alignment and floating point tolerance helpers
pub mod math;
/// Tiling solvers and their shared building blocks
pub mod solver;

pub use io::error::{Result, SolverError};
