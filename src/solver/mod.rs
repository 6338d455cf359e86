/// Two-phase local-buffer then multicore axis sizing over shared axis handles
pub mod axes_reorder;
/// Generic constrained local search driven by a plugged-in cost model
pub mod general;
/// Fixed-candidate exhaustive search for innermost tiles
pub mod l0_tile;
/// Shrink-then-maximize search for cache tiles
pub mod l2_tile;
/// Cost-model capability trait and its closure-backed implementation
pub mod model;
/// Exponentially smoothed per-variable preference scores
pub mod momentum;
/// Bounded, ordered pool of the best feasible assignments
pub mod pool;
/// Ordered move classifications and descent directions
pub mod ranking;
/// Integer tile variables with bounds and alignment
pub mod variable;
/// Record of assignments already visited by a solve
pub mod visited;
