//! Row-major elementwise tiling: unified-buffer tiles first, then the per-core split

use crate::cases::selection::{CaseOutcome, TilingCase};
use crate::io::configuration::{BLOCK_BYTES, BYTES_PER_CYCLE, ITERATION_OVERHEAD, SolverConfig};
use crate::io::error::{Result, invalid_input};
use crate::io::platform::PlatformInfo;
use crate::io::record::TilingRecord;
use crate::math::align::{align_up, ceil_div};
use crate::solver::axes_reorder::{
    AxesReorderSolver, AxisConstraint, AxisConstraintKind, AxisHandle, AxisRole, AxisVariable,
    CoreUsage, UpperBound,
};
use tracing::debug;

/// Tiling key of the elementwise case
pub const ELEMENTWISE_KEY: u64 = 20;

/// Two-dimensional elementwise operator over `rows x cols` tensors
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElementwiseCase {
    /// Outer extent
    pub rows: u64,
    /// Contiguous extent
    pub cols: u64,
    /// Bytes per element
    pub dtype_bytes: u64,
    /// Number of input and output tensors staged in the unified buffer
    pub buffers: u64,
}

/// Axis handles of one elementwise solve
struct Axes {
    ub_rows: AxisHandle,
    ub_cols: AxisHandle,
    core_rows: AxisHandle,
    core_cols: AxisHandle,
}

impl ElementwiseCase {
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("rows", self.rows),
            ("cols", self.cols),
            ("dtype_bytes", self.dtype_bytes),
            ("buffers", self.buffers),
        ] {
            if value == 0 {
                return Err(invalid_input(
                    name,
                    &value,
                    &"elementwise extents must be positive",
                ));
            }
        }
        Ok(())
    }

    fn axes(&self) -> Axes {
        let (rows, cols) = (self.rows, self.cols);
        let col_align = (BLOCK_BYTES / self.dtype_bytes).max(1);

        let ub_rows = AxisVariable::new("ub_rows", 1, AxisRole::LocalBuffer, UpperBound::Fixed(rows));
        let ub_cols = AxisVariable::new(
            "ub_cols",
            col_align,
            AxisRole::LocalBuffer,
            UpperBound::Fixed(align_up(cols, col_align)),
        );

        // Each core covers whole unified-buffer tiles
        let row_tile = AxisHandle::clone(&ub_rows);
        let core_rows = AxisVariable::new(
            "core_rows",
            1,
            AxisRole::Multicore,
            UpperBound::Derived(Box::new(move || {
                row_tile.value().map(|tile| align_up(rows, tile))
            })),
        );
        let col_tile = AxisHandle::clone(&ub_cols);
        let core_cols = AxisVariable::new(
            "core_cols",
            col_align,
            AxisRole::Multicore,
            UpperBound::Derived(Box::new(move || {
                col_tile.value().map(|tile| align_up(cols, tile))
            })),
        );

        Axes {
            ub_rows,
            ub_cols,
            core_rows,
            core_cols,
        }
    }

    fn constraints(&self, axes: &Axes, platform: &PlatformInfo) -> Vec<AxisConstraint> {
        let staged = self.dtype_bytes.saturating_mul(self.buffers);
        let ub_size = platform.ub_size;

        let (tile_rows, tile_cols) = (
            AxisHandle::clone(&axes.ub_rows),
            AxisHandle::clone(&axes.ub_cols),
        );
        let ub_fits = AxisConstraint::new(
            AxisConstraintKind::LocalBuffer,
            &[AxisHandle::clone(&axes.ub_rows), AxisHandle::clone(&axes.ub_cols)],
            move || {
                tile_rows
                    .get()
                    .saturating_mul(tile_cols.get())
                    .saturating_mul(staged) as f64
                    - ub_size as f64
            },
        );

        vec![
            ub_fits,
            covers(&axes.ub_rows, &axes.core_rows),
            covers(&axes.ub_cols, &axes.core_cols),
        ]
    }

    /// Cycles one core spends on its share
    fn cost(&self, axes: &Axes) -> f64 {
        let iterations = ceil_div(axes.core_rows.get(), axes.ub_rows.get())
            .saturating_mul(ceil_div(axes.core_cols.get(), axes.ub_cols.get()));
        let bytes = [axes.core_cols.get(), self.dtype_bytes, self.buffers]
            .into_iter()
            .fold(axes.core_rows.get(), u64::saturating_mul);
        (iterations as f64).mul_add(ITERATION_OVERHEAD, bytes as f64 / BYTES_PER_CYCLE)
    }
}

impl TilingCase for ElementwiseCase {
    fn name(&self) -> &'static str {
        "elementwise"
    }

    fn tiling_key(&self) -> u64 {
        ELEMENTWISE_KEY
    }

    #[tracing::instrument(skip_all, fields(rows = self.rows, cols = self.cols))]
    fn solve(&self, platform: &PlatformInfo, _config: SolverConfig) -> Result<CaseOutcome> {
        self.validate()?;

        let axes = self.axes();
        let constraints = self.constraints(&axes, platform);
        let (rows, cols) = (self.rows, self.cols);
        let (core_rows, core_cols) = (
            AxisHandle::clone(&axes.core_rows),
            AxisHandle::clone(&axes.core_cols),
        );
        let core_usage = move || CoreUsage {
            used_cores: ceil_div(rows, core_rows.get())
                .saturating_mul(ceil_div(cols, core_cols.get())),
            load_balanced: rows % core_rows.get() == 0 && cols % core_cols.get() == 0,
        };

        let solver = AxesReorderSolver::new(
            // Contiguous axis claims the unified buffer first
            vec![
                AxisHandle::clone(&axes.ub_cols),
                AxisHandle::clone(&axes.ub_rows),
                AxisHandle::clone(&axes.core_rows),
                AxisHandle::clone(&axes.core_cols),
            ],
            constraints,
            platform.core_num,
            core_usage,
        )?;
        let usage = solver.run()?;

        let objective = self.cost(&axes);
        debug!(objective, used_cores = usage.used_cores, "elementwise tiling chosen");

        let mut record = TilingRecord::new();
        record.set("rows", rows);
        record.set("cols", cols);
        for axis in [&axes.ub_rows, &axes.ub_cols, &axes.core_rows, &axes.core_cols] {
            record.set(axis.name(), axis.get());
        }
        record.set("used_cores", usage.used_cores);
        record.set("load_balanced", u64::from(usage.load_balanced));

        Ok(CaseOutcome {
            case: self.name(),
            tiling_key: self.tiling_key(),
            objective,
            record,
        })
    }
}

/// Per-core share must hold at least one unified-buffer tile
fn covers(tile: &AxisHandle, core: &AxisHandle) -> AxisConstraint {
    let (inner, outer) = (AxisHandle::clone(tile), AxisHandle::clone(core));
    AxisConstraint::new(
        AxisConstraintKind::McMixed,
        &[AxisHandle::clone(tile), AxisHandle::clone(core)],
        move || inner.get() as f64 - outer.get() as f64,
    )
}
