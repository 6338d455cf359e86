//! Command-line interface for tuning one operator on a given platform

use crate::cases::elementwise::ElementwiseCase;
use crate::cases::matmul::{MatmulCase, MatmulShape};
use crate::cases::selection::{CaseOutcome, TilingCase, select_case};
use crate::io::configuration::{
    DEFAULT_CORE_NUM, DEFAULT_L0A_SIZE, DEFAULT_L0B_SIZE, DEFAULT_L0C_SIZE, DEFAULT_L1_SIZE,
    DEFAULT_L2_SIZE, DEFAULT_UB_SIZE, SolverConfig,
};
use crate::io::error::Result;
use crate::io::platform::PlatformInfo;
use clap::{Args, Parser, Subcommand};
use std::io::Write;

#[derive(Parser, Debug)]
#[command(name = "tilesolve")]
#[command(
    author,
    version,
    about = "Search tiling parameters for matmul and elementwise kernels"
)]
/// Command-line arguments for the tiling search tool
pub struct Cli {
    /// Operator to tune
    #[command(subcommand)]
    pub operator: Operator,

    /// Target device capabilities
    #[command(flatten)]
    pub platform: PlatformArgs,

    /// Maximum general-solver rounds (overrides TILESOLVE_ITERATIONS)
    #[arg(short, long)]
    pub iterations: Option<usize>,

    /// Solutions kept per general solve (overrides TILESOLVE_TOP_NUM)
    #[arg(short, long)]
    pub top_num: Option<usize>,

    /// Probe both directions on every fine-tuning step
    #[arg(long)]
    pub high_perf: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Operators the tool knows how to tile
#[derive(Subcommand, Debug, Clone, Copy)]
pub enum Operator {
    /// `C[m, n] = A[m, k] * B[k, n]`
    Matmul {
        /// Rows of the output
        #[arg(short)]
        m: u64,
        /// Columns of the output
        #[arg(short)]
        n: u64,
        /// Reduction extent
        #[arg(short)]
        k: u64,
        /// Bytes per input element
        #[arg(long, default_value_t = 2)]
        dtype_bytes: u64,
    },
    /// Row-major elementwise operator
    Elementwise {
        /// Outer extent
        #[arg(short, long)]
        rows: u64,
        /// Contiguous extent
        #[arg(short, long)]
        cols: u64,
        /// Bytes per element
        #[arg(long, default_value_t = 2)]
        dtype_bytes: u64,
        /// Input and output tensors staged in the unified buffer
        #[arg(long, default_value_t = 3)]
        buffers: u64,
    },
}

/// Device capabilities, defaulting to the reference platform
#[derive(Args, Debug, Clone, Copy)]
pub struct PlatformArgs {
    /// Number of compute cores
    #[arg(long, default_value_t = DEFAULT_CORE_NUM)]
    pub cores: u64,
    /// Bytes of the left-operand L0 buffer
    #[arg(long, default_value_t = DEFAULT_L0A_SIZE)]
    pub l0a_size: u64,
    /// Bytes of the right-operand L0 buffer
    #[arg(long, default_value_t = DEFAULT_L0B_SIZE)]
    pub l0b_size: u64,
    /// Bytes of the accumulator L0 buffer
    #[arg(long, default_value_t = DEFAULT_L0C_SIZE)]
    pub l0c_size: u64,
    /// Bytes of the per-core L1 buffer
    #[arg(long, default_value_t = DEFAULT_L1_SIZE)]
    pub l1_size: u64,
    /// Bytes of the per-core unified buffer
    #[arg(long, default_value_t = DEFAULT_UB_SIZE)]
    pub ub_size: u64,
    /// Bytes of the shared L2 cache
    #[arg(long, default_value_t = DEFAULT_L2_SIZE)]
    pub l2_size: u64,
}

impl PlatformArgs {
    /// Platform described by the arguments
    pub const fn platform(&self) -> PlatformInfo {
        PlatformInfo {
            core_num: self.cores,
            l0a_size: self.l0a_size,
            l0b_size: self.l0b_size,
            l0c_size: self.l0c_size,
            l1_size: self.l1_size,
            ub_size: self.ub_size,
            l2_size: self.l2_size,
        }
    }
}

impl Cli {
    /// Environment configuration with command-line overrides applied
    pub fn solver_config(&self) -> SolverConfig {
        let mut config = SolverConfig::from_env();
        if let Some(iterations) = self.iterations {
            config = config.with_iterations(iterations);
        }
        if let Some(top_num) = self.top_num {
            config = config.with_top_num(top_num);
        }
        if self.high_perf {
            config = config.with_high_perf(true);
        }
        config
    }

    /// Default log filter when `RUST_LOG` is unset
    pub const fn log_filter(&self) -> &'static str {
        if self.quiet { "warn" } else { "info" }
    }

    /// Tune the operator and write the winning record to `out`
    ///
    /// # Errors
    ///
    /// Returns the selection error if no case can be solved, or `Output` if
    /// writing fails
    pub fn run(&self, out: &mut impl Write) -> Result<CaseOutcome> {
        let platform = self.platform.platform();
        let config = self.solver_config();

        let outcome = match self.operator {
            Operator::Matmul { m, n, k, dtype_bytes } => {
                let shape = MatmulShape {
                    m,
                    n,
                    k,
                    dtype_bytes,
                };
                let streaming = MatmulCase::streaming(shape);
                let full_load = MatmulCase::full_load(shape);
                let cases: [&dyn TilingCase; 2] = [&streaming, &full_load];
                select_case(&cases, &platform, config)?
            }
            Operator::Elementwise {
                rows,
                cols,
                dtype_bytes,
                buffers,
            } => {
                let case = ElementwiseCase {
                    rows,
                    cols,
                    dtype_bytes,
                    buffers,
                };
                select_case(&[&case], &platform, config)?
            }
        };

        writeln!(out, "case = {}", outcome.case)?;
        writeln!(out, "objective = {:.1}", outcome.objective)?;
        write!(out, "{}", outcome.record)?;
        Ok(outcome)
    }
}
