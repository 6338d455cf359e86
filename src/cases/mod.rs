/// Two-dimensional elementwise operator driven by the axes-reorder solver
pub mod elementwise;
/// Matrix multiplication across the L0, L1, and L2 tiers
pub mod matmul;
/// Case trait and lowest-objective case selection
pub mod selection;
