//! Cache-tile search: shrink until the working set fits, then maximize cache use

use crate::io::configuration::DEFAULT_L2_BACKTRACK_LIMIT;
use crate::io::error::{Result, invalid_input, try_clone_slice, unsolvable};
use crate::math::align::{align_up, ceil_div};
use crate::solver::variable::TileVariable;
use tracing::{debug, trace, warn};

/// Cache footprint and read-conflict checks for one tiling case
pub trait L2CostModel {
    /// Bytes of cache occupied by tiles of the given sizes
    ///
    /// Must not decrease when any tile grows.
    fn l2_use(&self, tiles: &[u64]) -> u64;

    /// Whether cores reading axis `idx` at these tile sizes conflict in the cache
    fn is_clash(&self, tiles: &[u64], idx: usize) -> bool;
}

impl<U, C> L2CostModel for (U, C)
where
    U: Fn(&[u64]) -> u64,
    C: Fn(&[u64], usize) -> bool,
{
    fn l2_use(&self, tiles: &[u64]) -> u64 {
        (self.0)(tiles)
    }

    fn is_clash(&self, tiles: &[u64], idx: usize) -> bool {
        (self.1)(tiles, idx)
    }
}

#[derive(Clone, Debug)]
struct L2Choice {
    tiles: Vec<u64>,
    blocks: Vec<u64>,
    l2_use: u64,
    used_cores: u64,
}

/// Starting point of the block-count backtracking
struct Start {
    tiles: Vec<u64>,
    blocks: Vec<u64>,
}

struct SearchState {
    tiles: Vec<u64>,
    best: Option<L2Choice>,
    leaves: usize,
}

/// Shrink-then-maximize search for cache tiles
///
/// Each variable's `upper` is the axis extent, `align` its mandatory
/// alignment, and `prompt_align` the inner base tile every cache tile must
/// hold a whole number of.
pub struct L2TileSolver<M: L2CostModel> {
    vars: Vec<TileVariable>,
    l2_size: u64,
    core_num: u64,
    model: M,
    backtrack_limit: usize,
    l2_tile: Vec<u64>,
    blocks: Vec<u64>,
    used_cores: u64,
    l2_use: u64,
}

impl<M: L2CostModel> L2TileSolver<M> {
    /// Validate the input and prepare a solve
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for no variables, a zero cache size or core
    /// count, or a zero alignment or extent
    pub fn new(vars: Vec<TileVariable>, l2_size: u64, core_num: u64, model: M) -> Result<Self> {
        if vars.is_empty() {
            return Err(invalid_input(
                "variables",
                &0,
                &"at least one variable is required",
            ));
        }
        if l2_size == 0 {
            return Err(invalid_input("l2_size", &0, &"must be positive"));
        }
        if core_num == 0 {
            return Err(invalid_input("core_num", &0, &"must be positive"));
        }
        if let Some(var) = vars.iter().find(|var| var.align == 0 || var.upper == 0) {
            return Err(invalid_input(
                "variables",
                &var.index,
                &"alignment and maximum value must be positive",
            ));
        }

        let len = vars.len();
        Ok(Self {
            vars,
            l2_size,
            core_num,
            model,
            backtrack_limit: DEFAULT_L2_BACKTRACK_LIMIT,
            l2_tile: vec![0; len],
            blocks: vec![0; len],
            used_cores: 0,
            l2_use: 0,
        })
    }

    /// Cap the number of block-count combinations evaluated
    #[must_use]
    pub fn with_backtrack_limit(mut self, limit: usize) -> Self {
        self.backtrack_limit = limit.max(1);
        self
    }

    /// Search for the densest conflict-free cache tiling
    ///
    /// # Errors
    ///
    /// Returns `Unsolvable` when even the smallest tiles overflow the cache or
    /// every combination clashes, and `Allocation` if the search state cannot
    /// be reserved
    #[tracing::instrument(skip_all, fields(variables = self.vars.len(), l2_size = self.l2_size))]
    pub fn run(&mut self) -> Result<()> {
        let steps: Vec<u64> = self.vars.iter().map(tile_step).collect();

        let minimum = self.model.l2_use(&steps);
        if minimum > self.l2_size {
            warn!(minimum, budget = self.l2_size, "smallest tiles overflow the cache");
            return Err(unsolvable(
                "L2TileSolver",
                &format!(
                    "minimum usage {minimum} exceeds the cache size {}",
                    self.l2_size
                ),
            ));
        }

        let fitted = self.shrink_to_fit(&steps);
        let blocks: Vec<u64> = self
            .vars
            .iter()
            .zip(&fitted)
            .map(|(var, &tile)| ceil_div(var.upper, tile).max(1))
            .collect();
        // Same block counts, tightest aligned tiles
        let tiles: Vec<u64> = self
            .vars
            .iter()
            .zip(&steps)
            .zip(&blocks)
            .map(|((var, &step), &count)| align_up(ceil_div(var.upper, count), step))
            .collect();
        debug!(?tiles, ?blocks, "starting point fits the cache");

        let start = Start {
            tiles: try_clone_slice("l2 start tiles", &tiles)?,
            blocks,
        };
        let mut state = SearchState {
            tiles,
            best: None,
            leaves: 0,
        };
        self.search(&steps, &start, 0, &mut state);

        let Some(mut choice) = state.best else {
            warn!(leaves = state.leaves, "every cache tiling clashes");
            return Err(unsolvable(
                "L2TileSolver",
                &"no conflict-free tiling fits the cache",
            ));
        };

        for ((var, tile), blocks) in self
            .vars
            .iter()
            .zip(choice.tiles.iter_mut())
            .zip(choice.blocks.iter_mut())
        {
            if *tile >= var.upper {
                *tile = var.upper;
                *blocks = 1;
            }
        }

        debug!(
            tiles = ?choice.tiles,
            l2_use = choice.l2_use,
            used_cores = choice.used_cores,
            leaves = state.leaves,
            "cache tiles chosen"
        );
        self.l2_tile = choice.tiles;
        self.blocks = choice.blocks;
        self.used_cores = choice.used_cores;
        self.l2_use = choice.l2_use;
        Ok(())
    }

    /// Chosen cache tile per variable, in input order
    pub fn l2_tile(&self) -> &[u64] {
        &self.l2_tile
    }

    /// Number of tiles covering each axis
    pub fn blocks(&self) -> &[u64] {
        &self.blocks
    }

    /// Core count achieved by the chosen tiles
    pub const fn used_cores(&self) -> u64 {
        self.used_cores
    }

    /// Cache usage of the chosen tiles
    pub const fn l2_use(&self) -> u64 {
        self.l2_use
    }

    /// Start every tile at the largest extent and shrink in lockstep until it fits
    fn shrink_to_fit(&self, steps: &[u64]) -> Vec<u64> {
        let widest = self.vars.iter().map(|var| var.upper).max().unwrap_or(0);
        let mut tiles: Vec<u64> = steps.iter().map(|&step| align_up(widest, step)).collect();

        while self.model.l2_use(&tiles) > self.l2_size {
            let mut moved = false;
            for (tile, &step) in tiles.iter_mut().zip(steps) {
                if *tile > step {
                    *tile -= step;
                    moved = true;
                }
            }
            // All tiles at their minimum, which fits
            if !moved {
                break;
            }
        }
        tiles
    }

    fn search(&self, steps: &[u64], start: &Start, depth: usize, state: &mut SearchState) {
        if state.leaves >= self.backtrack_limit {
            return;
        }
        let (Some(var), Some(&step), Some(&start_blocks)) = (
            self.vars.get(depth),
            steps.get(depth),
            start.blocks.get(depth),
        ) else {
            self.evaluate_leaf(state);
            return;
        };

        let mut previous = None;
        for blocks in (1..=start_blocks).rev() {
            let tile = align_up(ceil_div(var.upper, blocks), step);
            if previous == Some(tile) {
                continue;
            }
            previous = Some(tile);

            if let Some(slot) = state.tiles.get_mut(depth) {
                *slot = tile;
            }
            for (slot, &initial) in state.tiles.iter_mut().zip(&start.tiles).skip(depth + 1) {
                *slot = initial;
            }
            // Deeper axes are at their smallest tiles, so larger tiles here overflow too
            if self.model.l2_use(&state.tiles) > self.l2_size {
                break;
            }

            self.search(steps, start, depth + 1, state);
            if state.leaves >= self.backtrack_limit {
                trace!(limit = self.backtrack_limit, "backtrack limit reached");
                return;
            }
        }
    }

    fn evaluate_leaf(&self, state: &mut SearchState) {
        state.leaves += 1;
        let tiles = &state.tiles;

        let l2_use = self.model.l2_use(tiles);
        if l2_use > self.l2_size {
            return;
        }
        if (0..tiles.len()).any(|idx| self.model.is_clash(tiles, idx)) {
            return;
        }

        let blocks: Vec<u64> = self
            .vars
            .iter()
            .zip(tiles)
            .map(|(var, &tile)| ceil_div(var.upper, tile).max(1))
            .collect();
        let used_cores = blocks
            .iter()
            .fold(1_u64, |acc, &count| acc.saturating_mul(count))
            .min(self.core_num);
        trace!(?tiles, l2_use, used_cores, "conflict-free combination");

        let better = state.best.as_ref().is_none_or(|current| {
            l2_use > current.l2_use
                || (l2_use == current.l2_use && used_cores > current.used_cores)
        });
        if better {
            state.best = Some(L2Choice {
                tiles: tiles.clone(),
                blocks,
                l2_use,
                used_cores,
            });
        }
    }
}

/// Smallest legal tile: the base tile rounded up to the alignment
fn tile_step(var: &TileVariable) -> u64 {
    align_up(var.prompt_align.max(var.align), var.align)
}
