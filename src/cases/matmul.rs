//! Matrix multiplication tiling: L0 base tiles, L1 step tiles, then L2 cache tiles
//!
//! The three tiers are solved in that order, each solve reading the tiles the
//! previous one chose. Two strategies compete for the reduction axis: streaming
//! it through L1 in steps, or loading it into L1 whole.

use crate::cases::selection::{CaseOutcome, TilingCase};
use crate::io::configuration::{
    ACCUMULATOR_BYTES, BYTES_PER_CYCLE, CUBE_ALIGN, ITERATION_OVERHEAD, MACS_PER_CYCLE,
    SolverConfig,
};
use crate::io::error::{Result, invalid_input, unsolvable};
use crate::io::platform::PlatformInfo;
use crate::io::record::TilingRecord;
use crate::math::align::{align_up, ceil_div};
use crate::solver::general::GeneralSolver;
use crate::solver::l0_tile::L0TileSolver;
use crate::solver::l2_tile::{L2CostModel, L2TileSolver};
use crate::solver::model::ConstraintModel;
use crate::solver::variable::TileVariable;
use tracing::debug;

/// Tiling key of the streaming strategy
pub const STREAMING_KEY: u64 = 10;
/// Tiling key of the full-load strategy
pub const FULL_LOAD_KEY: u64 = 11;

/// Alignment the reduction axis would like its base tile to respect
const K_PROMPT_ALIGN: u64 = 256;
/// Alignment the output axes would like their base tiles to respect
const MN_PROMPT_ALIGN: u64 = 16;

/// Operand extents and element size of `C[m, n] = A[m, k] * B[k, n]`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatmulShape {
    /// Rows of `A` and `C`
    pub m: u64,
    /// Columns of `B` and `C`
    pub n: u64,
    /// Reduction extent
    pub k: u64,
    /// Bytes per input element
    pub dtype_bytes: u64,
}

/// How the reduction axis moves through L1
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KStrategy {
    /// Reduction axis is tiled and streamed through L1
    Streaming,
    /// Whole reduction axis is resident in L1
    FullLoad,
}

/// One competing matmul tiling case
#[derive(Clone, Copy, Debug)]
pub struct MatmulCase {
    shape: MatmulShape,
    strategy: KStrategy,
}

impl MatmulCase {
    /// Case streaming the reduction axis
    pub const fn streaming(shape: MatmulShape) -> Self {
        Self {
            shape,
            strategy: KStrategy::Streaming,
        }
    }

    /// Case keeping the reduction axis resident
    pub const fn full_load(shape: MatmulShape) -> Self {
        Self {
            shape,
            strategy: KStrategy::FullLoad,
        }
    }

    /// Strategy of this case
    pub const fn strategy(&self) -> KStrategy {
        self.strategy
    }

    fn validate(&self) -> Result<()> {
        let shape = self.shape;
        for (name, value) in [
            ("m", shape.m),
            ("n", shape.n),
            ("k", shape.k),
            ("dtype_bytes", shape.dtype_bytes),
        ] {
            if value == 0 {
                return Err(invalid_input(name, &value, &"matmul extents must be positive"));
            }
        }
        Ok(())
    }

    /// Innermost tiles fitting the three L0 buffers
    fn base_tiles(&self, platform: &PlatformInfo) -> Result<[u64; 3]> {
        let shape = self.shape;
        let vars = vec![
            TileVariable::new(0, 1, shape.m)
                .with_align(CUBE_ALIGN)
                .with_prompt_align(MN_PROMPT_ALIGN)
                .bind_multicore(),
            TileVariable::new(1, 1, shape.n)
                .with_align(CUBE_ALIGN)
                .with_prompt_align(MN_PROMPT_ALIGN)
                .bind_multicore(),
            TileVariable::new(2, 1, shape.k)
                .with_align(CUBE_ALIGN)
                .with_prompt_align(K_PROMPT_ALIGN)
                .innermost(),
        ];

        let dtype = shape.dtype_bytes;
        let (l0a, l0b, l0c) = (platform.l0a_size, platform.l0b_size, platform.l0c_size);
        // Operand buffers are double buffered
        let fits = move |tiles: &[u64]| match tiles {
            &[m0, n0, k0] => {
                let operand = |rows: u64, cols: u64| {
                    rows.saturating_mul(cols)
                        .saturating_mul(dtype)
                        .saturating_mul(2)
                };
                operand(m0, k0) <= l0a
                    && operand(k0, n0) <= l0b
                    && m0.saturating_mul(n0).saturating_mul(ACCUMULATOR_BYTES) <= l0c
            }
            _ => false,
        };

        let mut solver = L0TileSolver::new(vars, platform.core_num, fits)?;
        solver.run()?;
        match *solver.output() {
            [m0, n0, k0] => Ok([m0, n0, k0]),
            _ => Err(unsolvable("MatmulCase", &"base tile search returned no tiles")),
        }
    }

    /// Cost model over the L1 step tiles `[m1, n1, k1]`
    fn step_model(&self, platform: &PlatformInfo, base: [u64; 3]) -> ConstraintModel {
        let shape = self.shape;
        let [m0, n0, _] = base;
        let cores = platform.core_num;
        let l1 = platform.l1_size;
        let wanted_blocks = cores.min(ceil_div(shape.m, m0).saturating_mul(ceil_div(shape.n, n0)));

        let objective = move |vars: &[u64]| match vars {
            &[m1, n1, k1] => {
                let blocks = ceil_div(shape.m, m1).saturating_mul(ceil_div(shape.n, n1));
                let rounds = ceil_div(blocks, cores) as f64;
                let k_loops = ceil_div(shape.k, k1) as f64;
                let (m1, n1) = (m1 as f64, n1 as f64);
                let k = shape.k as f64;
                let dtype = shape.dtype_bytes as f64;
                let compute = m1 * n1 * align_up(shape.k, CUBE_ALIGN) as f64 / MACS_PER_CYCLE;
                let traffic = ((m1 + n1) * k + m1 * n1) * dtype / BYTES_PER_CYCLE;
                rounds * k_loops.mul_add(ITERATION_OVERHEAD, compute + traffic)
            }
            _ => f64::INFINITY,
        };

        ConstraintModel::new(objective)
            .buffer(&[0, 1, 2], move |vars| match vars {
                &[m1, n1, k1] => {
                    (m1 + n1) as f64 * k1 as f64 * shape.dtype_bytes as f64 * 2.0 - l1 as f64
                }
                _ => f64::INFINITY,
            })
            .leq(&[0, 1], move |vars| match vars {
                &[m1, n1, ..] => {
                    let blocks = ceil_div(shape.m, m1).saturating_mul(ceil_div(shape.n, n1));
                    wanted_blocks as f64 - blocks as f64
                }
                _ => f64::INFINITY,
            })
    }

    /// L1 step tiles as whole multiples of the base tiles, with their cost
    fn step_tiles(
        &self,
        platform: &PlatformInfo,
        config: SolverConfig,
        base: [u64; 3],
    ) -> Result<([u64; 3], f64)> {
        let shape = self.shape;
        let [m0, n0, k0] = base;
        let k_full = align_up(shape.k, k0);
        let k_lower = match self.strategy {
            KStrategy::Streaming => k0,
            KStrategy::FullLoad => k_full,
        };

        let vars = vec![
            TileVariable::new(0, m0, align_up(shape.m, m0)).with_align(m0),
            TileVariable::new(1, n0, align_up(shape.n, n0)).with_align(n0),
            TileVariable::new(2, k_lower, k_full)
                .with_align(k0)
                .update_last(),
        ];

        let model = self.step_model(platform, base);
        let solutions = GeneralSolver::new(&model, vars, config)?.run()?;
        let Some(best) = solutions.best() else {
            return Err(unsolvable("MatmulCase", &"step tile search pooled nothing"));
        };
        debug!(
            values = ?best.values,
            objective = best.objective,
            rounds = solutions.rounds,
            "step tiles chosen"
        );
        match *best.values.as_slice() {
            [m1, n1, k1] => Ok(([m1, n1, k1], best.objective)),
            _ => Err(unsolvable("MatmulCase", &"step tile search returned no tiles")),
        }
    }

    /// L2 cache tiles over the output axes as multiples of the step tiles
    fn l2_tiles(
        &self,
        platform: &PlatformInfo,
        steps: [u64; 3],
    ) -> Result<L2TileSolver<impl L2CostModel>> {
        let shape = self.shape;
        let [m1, n1, _] = steps;
        let cores = platform.core_num;

        let vars = vec![
            TileVariable::new(0, 1, shape.m)
                .with_align(CUBE_ALIGN)
                .with_prompt_align(m1),
            TileVariable::new(1, 1, shape.n)
                .with_align(CUBE_ALIGN)
                .with_prompt_align(n1),
        ];
        let l2_use = move |tiles: &[u64]| match tiles {
            &[tm, tn] => tm
                .saturating_add(tn)
                .saturating_mul(shape.k)
                .saturating_mul(shape.dtype_bytes)
                .saturating_add(tm.saturating_mul(tn).saturating_mul(ACCUMULATOR_BYTES)),
            _ => u64::MAX,
        };
        // Cores sweeping an axis whose block count does not divide the core
        // count read overlapping rows at the same time
        let is_clash = move |tiles: &[u64], idx: usize| {
            let extent = if idx == 0 { shape.m } else { shape.n };
            let blocks = tiles.get(idx).map_or(1, |&tile| ceil_div(extent, tile));
            blocks > 1 && blocks < cores && cores % blocks != 0
        };

        let mut solver = L2TileSolver::new(vars, platform.l2_size, cores, (l2_use, is_clash))?;
        solver.run()?;
        Ok(solver)
    }
}

impl TilingCase for MatmulCase {
    fn name(&self) -> &'static str {
        match self.strategy {
            KStrategy::Streaming => "matmul_streaming",
            KStrategy::FullLoad => "matmul_full_load",
        }
    }

    fn tiling_key(&self) -> u64 {
        match self.strategy {
            KStrategy::Streaming => STREAMING_KEY,
            KStrategy::FullLoad => FULL_LOAD_KEY,
        }
    }

    #[tracing::instrument(skip_all, fields(case = self.name()))]
    fn solve(&self, platform: &PlatformInfo, config: SolverConfig) -> Result<CaseOutcome> {
        self.validate()?;

        let base = self.base_tiles(platform)?;
        let (steps, objective) = self.step_tiles(platform, config, base)?;
        let l2 = self.l2_tiles(platform, steps)?;

        let mut record = TilingRecord::new();
        record.set("m", self.shape.m);
        record.set("n", self.shape.n);
        record.set("k", self.shape.k);
        for (prefix, values) in [("base", base), ("step", steps)] {
            for (axis, value) in ["m", "n", "k"].into_iter().zip(values) {
                record.set(format!("{prefix}_{axis}"), value);
            }
        }
        for (axis, (&tile, &blocks)) in ["m", "n"]
            .into_iter()
            .zip(l2.l2_tile().iter().zip(l2.blocks()))
        {
            record.set(format!("l2_tile_{axis}"), tile);
            record.set(format!("l2_blocks_{axis}"), blocks);
        }
        record.set("used_cores", l2.used_cores());

        Ok(CaseOutcome {
            case: self.name(),
            tiling_key: self.tiling_key(),
            objective,
            record,
        })
    }
}
