//! Solver constants and runtime configuration defaults

/// Absolute tolerance used for every objective, residual, and cost comparison
pub const EPSILON: f64 = 0.001;

// Defaults for the general solver
/// Number of best solutions retained per solve
pub const DEFAULT_TOP_NUM: usize = 5;
/// Maximum locate/fine-tune rounds per solve
pub const DEFAULT_ITERATIONS: usize = 100;
/// Number of unit steps probed when looking for a feasible-region move
pub const DEFAULT_SEARCH_LENGTH: u64 = 3;
/// Smoothing factor applied to the previous momentum value
pub const DEFAULT_MOMENTUM_FACTOR: f64 = 0.9;

// L0 tile search
/// Candidate tile values tried for every innermost variable, in search order
pub const L0_CANDIDATES: [u64; 7] = [16, 32, 64, 128, 256, 512, 1024];
/// Largest number of variables the innermost tile search accepts
pub const L0_MAX_VARIABLES: usize = 3;

/// Fraction of the platform cores above which core counts are considered equal
pub const CORE_UTILIZATION_THRESHOLD: f64 = 0.6;

// Keeps the block-count backtracking bounded on large extents
/// Maximum number of leaf combinations evaluated by the L2 tile search
pub const DEFAULT_L2_BACKTRACK_LIMIT: usize = 1 << 16;

// Environment overrides for `SolverConfig::from_env`
/// Overrides `SolverConfig::top_num`
pub const ENV_TOP_NUM: &str = "TILESOLVE_TOP_NUM";
/// Overrides `SolverConfig::iterations`
pub const ENV_ITERATIONS: &str = "TILESOLVE_ITERATIONS";
/// Overrides `SolverConfig::search_length`
pub const ENV_SEARCH_LENGTH: &str = "TILESOLVE_SEARCH_LENGTH";
/// Enables `SolverConfig::high_perf` when set to `1`
pub const ENV_HIGH_PERF: &str = "TILESOLVE_HIGH_PERF";

/// Tunables for one general-solver invocation
///
/// Passed by value into every solve so that settings never leak between
/// independent solves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverConfig {
    /// Capacity of the solution pool
    pub top_num: usize,
    /// Maximum number of rounds before the search stops
    pub iterations: usize,
    /// Unit steps probed per direction while fine-tuning
    pub search_length: u64,
    /// Weight given to the previous momentum value (0.0..1.0)
    pub momentum_factor: f64,
    /// Always probe both directions while fine-tuning
    pub high_perf: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            top_num: DEFAULT_TOP_NUM,
            iterations: DEFAULT_ITERATIONS,
            search_length: DEFAULT_SEARCH_LENGTH,
            momentum_factor: DEFAULT_MOMENTUM_FACTOR,
            high_perf: false,
        }
    }
}

impl SolverConfig {
    /// Defaults overlaid with any `TILESOLVE_*` environment overrides
    ///
    /// Unparseable or zero values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(top_num) = read_positive(ENV_TOP_NUM) {
            config.top_num = top_num;
        }
        if let Some(iterations) = read_positive(ENV_ITERATIONS) {
            config.iterations = iterations;
        }
        if let Some(search_length) = read_positive(ENV_SEARCH_LENGTH) {
            config.search_length = search_length as u64;
        }
        if let Ok(flag) = std::env::var(ENV_HIGH_PERF) {
            config.high_perf = flag == "1";
        }

        config
    }

    /// Replace the pool capacity
    #[must_use]
    pub const fn with_top_num(mut self, top_num: usize) -> Self {
        self.top_num = top_num;
        self
    }

    /// Replace the iteration budget
    #[must_use]
    pub const fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Enable or disable two-sided fine-tuning
    #[must_use]
    pub const fn with_high_perf(mut self, high_perf: bool) -> Self {
        self.high_perf = high_perf;
        self
    }
}

fn read_positive(key: &str) -> Option<usize> {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .filter(|&value| value > 0)
}

// Reference platform used when the command line does not override it
/// Number of compute cores
pub const DEFAULT_CORE_NUM: u64 = 24;
/// Bytes of the left-operand L0 buffer
pub const DEFAULT_L0A_SIZE: u64 = 64 * 1024;
/// Bytes of the right-operand L0 buffer
pub const DEFAULT_L0B_SIZE: u64 = 64 * 1024;
/// Bytes of the accumulator L0 buffer
pub const DEFAULT_L0C_SIZE: u64 = 128 * 1024;
/// Bytes of the per-core L1 buffer
pub const DEFAULT_L1_SIZE: u64 = 512 * 1024;
/// Bytes of the per-core unified buffer
pub const DEFAULT_UB_SIZE: u64 = 192 * 1024;
/// Bytes of the shared L2 cache
pub const DEFAULT_L2_SIZE: u64 = 8 * 1024 * 1024;

// Cost-model constants for the reference tiling cases
/// Cube unit alignment of every matmul tile edge
pub const CUBE_ALIGN: u64 = 16;
/// Multiply-accumulates retired per cycle by one core
pub const MACS_PER_CYCLE: f64 = 4096.0;
/// Bytes moved per cycle between global memory and a core
pub const BYTES_PER_CYCLE: f64 = 64.0;
/// Fixed cycles spent issuing one pipelined loop iteration
pub const ITERATION_OVERHEAD: f64 = 64.0;
/// Alignment in bytes of vector unit transfers
pub const BLOCK_BYTES: u64 = 32;
/// Bytes per accumulator element
pub const ACCUMULATOR_BYTES: u64 = 4;
