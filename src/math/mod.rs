//! Numeric helpers shared by every solver

/// Integer alignment, block counting, and power-of-two rounding
pub mod align;
/// Tolerance-based floating point comparison
pub mod float;
