/// Command-line interface for the `tilesolve` binary
pub mod cli;
/// Solver constants and runtime configuration defaults
pub mod configuration;
/// Error types and allocation helpers
pub mod error;
/// Device core count and buffer sizes
pub mod platform;
/// Host-facing tiling record
pub mod record;
