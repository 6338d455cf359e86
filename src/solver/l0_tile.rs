//! Exhaustive search over a fixed candidate list for innermost tiles

use crate::io::configuration::{CORE_UTILIZATION_THRESHOLD, L0_CANDIDATES, L0_MAX_VARIABLES};
use crate::io::error::{Result, invalid_input, unsolvable};
use crate::math::align::{align_up, ceil_div, divides_or_multiple, prev_power_of_two};
use crate::solver::variable::TileVariable;
use bitvec::prelude::*;
use std::cmp::Reverse;
use tracing::{debug, trace, warn};

/// Best accepted combination so far
#[derive(Clone, Debug)]
struct L0Choice {
    tiles: Vec<u64>,
    used_cores: u64,
    throughput: u64,
}

/// Ordered backtracking over `L0_CANDIDATES` for up to three innermost tiles
///
/// Each variable's `upper` is its maximum extent, `align` its mandatory
/// alignment, and `prompt_align` the alignment its parent axis would like.
/// The caller's buffer predicate receives tile values in variable order.
pub struct L0TileSolver<F>
where
    F: Fn(&[u64]) -> bool,
{
    vars: Vec<TileVariable>,
    core_num: u64,
    check_buffer_use_valid: F,
    output: Vec<u64>,
    used_cores: u64,
}

impl<F> L0TileSolver<F>
where
    F: Fn(&[u64]) -> bool,
{
    /// Validate the input and prepare a solve
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for no variables, more than three variables, a
    /// zero core count, or a zero alignment or extent
    pub fn new(vars: Vec<TileVariable>, core_num: u64, check_buffer_use_valid: F) -> Result<Self> {
        if vars.is_empty() {
            return Err(invalid_input("variables", &0, &"at least one variable is required"));
        }
        if vars.len() > L0_MAX_VARIABLES {
            return Err(invalid_input(
                "variables",
                &vars.len(),
                &format!("at most {L0_MAX_VARIABLES} innermost variables are supported"),
            ));
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

        Ok(Self {
            output: vec![0; vars.len()],
            vars,
            core_num,
            check_buffer_use_valid,
            used_cores: 0,
        })
    }

    /// Search for the best accepted combination
    ///
    /// # Errors
    ///
    /// Returns `Unsolvable` when no candidate combination passes the buffer
    /// predicate
    #[tracing::instrument(skip_all, fields(variables = self.vars.len(), cores = self.core_num))]
    pub fn run(&mut self) -> Result<()> {
        for var in &mut self.vars {
            var.upper = align_up(var.upper, var.align);
            var.prompt_align = refine_prompt_align(var);
        }

        let mut order: Vec<usize> = (0..self.vars.len()).collect();
        order.sort_by_key(|&i| {
            self.vars.get(i).map(|var| {
                (
                    !var.bind_multicore,
                    !var.is_innermost,
                    Reverse(var.prompt_align),
                )
            })
        });

        let admissible: Vec<BitVec> = self.vars.iter().map(admissible_candidates).collect();

        let mut tiles = vec![0; self.vars.len()];
        let mut best = None;
        self.search(&order, &admissible, 0, &mut tiles, &mut best);

        let Some(choice) = best else {
            warn!("no innermost tile combination fits the buffers");
            return Err(unsolvable(
                "L0TileSolver",
                &"no candidate combination passes the buffer check",
            ));
        };

        debug!(tiles = ?choice.tiles, used_cores = choice.used_cores, "innermost tiles chosen");
        self.used_cores = choice.used_cores;
        self.output = choice.tiles;
        Ok(())
    }

    /// Chosen tile per variable, in input order
    pub fn output(&self) -> &[u64] {
        &self.output
    }

    /// Core count achieved by the chosen tiles
    pub const fn used_cores(&self) -> u64 {
        self.used_cores
    }

    fn search(
        &self,
        order: &[usize],
        admissible: &[BitVec],
        depth: usize,
        tiles: &mut [u64],
        best: &mut Option<L0Choice>,
    ) {
        let Some(&var_index) = order.get(depth) else {
            self.evaluate_leaf(tiles, best);
            return;
        };
        let Some(mask) = admissible.get(var_index) else {
            return;
        };

        for candidate_index in mask.iter_ones() {
            let Some(&candidate) = L0_CANDIDATES.get(candidate_index) else {
                continue;
            };
            if let Some(slot) = tiles.get_mut(var_index) {
                *slot = candidate;
            }
            self.search(order, admissible, depth + 1, tiles, best);
        }
    }

    fn evaluate_leaf(&self, tiles: &[u64], best: &mut Option<L0Choice>) {
        if !(self.check_buffer_use_valid)(tiles) {
            return;
        }

        let blocks: u64 = self
            .vars
            .iter()
            .zip(tiles)
            .map(|(var, &tile)| ceil_div(var.upper, tile).max(1))
            .fold(1_u64, u64::saturating_mul);
        let candidate = L0Choice {
            tiles: tiles.to_vec(),
            used_cores: blocks.min(self.core_num),
            throughput: tiles.iter().copied().fold(1, u64::saturating_mul),
        };
        trace!(tiles = ?candidate.tiles, used_cores = candidate.used_cores, "accepted combination");

        let replace = best
            .as_ref()
            .is_none_or(|current| self.is_better(&candidate, current));
        if replace {
            *best = Some(candidate);
        }
    }

    /// Core counts above the utilization threshold count as equal, leaving the
    /// decision to the tile product
    fn is_better(&self, candidate: &L0Choice, current: &L0Choice) -> bool {
        let threshold = (self.core_num as f64 * CORE_UTILIZATION_THRESHOLD).ceil() as u64;
        let saturated = |choice: &L0Choice| choice.used_cores >= threshold;

        if (saturated(candidate) && saturated(current))
            || candidate.used_cores == current.used_cores
        {
            candidate.throughput > current.throughput
        } else {
            candidate.used_cores > current.used_cores
        }
    }
}

/// Largest power of two within both the extent and the hint, halved once more
/// unless it already equals the mandatory alignment
fn refine_prompt_align(var: &TileVariable) -> u64 {
    let prompt = prev_power_of_two(var.upper.min(var.prompt_align.max(1)));
    if prompt == var.align {
        prompt
    } else {
        (prompt / 2).max(1)
    }
}

/// Candidates below twice the extent that respect both alignments
fn admissible_candidates(var: &TileVariable) -> BitVec {
    let mut mask = bitvec![0; L0_CANDIDATES.len()];
    for (i, &candidate) in L0_CANDIDATES.iter().enumerate() {
        let fits = candidate < var.upper.saturating_mul(2);
        let aligned = candidate % var.align == 0;
        if fits && aligned && divides_or_multiple(candidate, var.prompt_align) {
            mask.set(i, true);
        }
    }
    mask
}
