//! Generic constrained local search over integer tile variables
//!
//! Each round either moves an infeasible point towards the feasible region
//! (locate) or improves a feasible point while staying inside it (fine-tune).
//! A feasible point with no improving move steps out into an unexplored
//! neighbour, and the next locate round jumps across the feasible interval
//! when its near boundary was already searched.
//! Exactly one variable moves per round: every variable proposes a move, the
//! proposals are ranked by class, and smoothed momentum breaks ties between
//! variables sharing the best class.

use crate::io::configuration::SolverConfig;
use crate::io::error::{Result, index_out_of_range, invalid_input, try_buffer, unsolvable};
use crate::math::float::{definitely_less, is_satisfied, is_equal, violation_penalty};
use crate::solver::model::CostModel;
use crate::solver::momentum::Momentum;
use crate::solver::pool::{SolutionPool, VarVal};
use crate::solver::ranking::{FuncInfo, Locality, TunePriority, UpdateDirection};
use crate::solver::variable::TileVariable;
use crate::solver::visited::VisitedSet;
use tracing::{debug, trace, warn};

/// Proposed single-variable move and its classification
#[derive(Clone, Copy, Debug)]
struct Probe<C> {
    class: C,
    value: u64,
    positive: bool,
    /// Improvement over the starting point (higher is better)
    gain: f64,
}

/// Reference measurements of the feasible point being fine-tuned
struct Baseline {
    objective: f64,
    slack: f64,
    buffer: f64,
}

/// Outcome of a general solve
#[derive(Clone, Debug)]
pub struct Solutions {
    /// Pooled feasible assignments from best to worst
    pub entries: Vec<VarVal>,
    /// Rounds executed before the search stopped
    pub rounds: usize,
    /// Distinct vectors the search committed to
    pub explored: usize,
}

impl Solutions {
    /// Number of pooled solutions
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Lowest-objective solution
    pub fn best(&self) -> Option<&VarVal> {
        self.entries.first()
    }
}

/// Heuristic solver over an arbitrary number of integer variables
///
/// Generic over the plugged-in `CostModel`, so one engine serves every tiling
/// case. A solver instance performs exactly one solve.
pub struct GeneralSolver<'m, M: CostModel + ?Sized> {
    model: &'m M,
    config: SolverConfig,
    vars: Vec<TileVariable>,
    values: Vec<u64>,
    leqs: Vec<f64>,
    momentum: Momentum,
    visited: VisitedSet,
    pool: SolutionPool,
    has_feasible: bool,
}

impl<'m, M: CostModel + ?Sized> GeneralSolver<'m, M> {
    /// Prepare a solve over `variables`
    ///
    /// Variable indices are reassigned to their position and bounds are
    /// tightened to aligned values.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty variable list, unusable bounds or
    /// alignment, or an unusable configuration, and `Allocation` if a working
    /// buffer cannot be reserved
    pub fn new(model: &'m M, variables: Vec<TileVariable>, config: SolverConfig) -> Result<Self> {
        if variables.is_empty() {
            return Err(invalid_input(
                "variables",
                &0,
                &"at least one variable is required",
            ));
        }
        if config.iterations == 0 {
            return Err(invalid_input("iterations", &0, &"must be positive"));
        }
        if config.search_length == 0 {
            return Err(invalid_input("search_length", &0, &"must be positive"));
        }
        if !(0.0..1.0).contains(&config.momentum_factor) {
            return Err(invalid_input(
                "momentum_factor",
                &config.momentum_factor,
                &"must lie in [0, 1)",
            ));
        }

        let mut vars = try_buffer("variables", variables.len())?;
        for (index, mut var) in variables.into_iter().enumerate() {
            var.index = index;
            var.normalize()?;
            vars.push(var);
        }

        let mut values = try_buffer("values", vars.len())?;
        values.extend(vars.iter().map(|var| var.value));

        let mut leqs = try_buffer("residuals", model.leq_count())?;
        leqs.resize(model.leq_count(), 0.0);

        Ok(Self {
            model,
            config,
            momentum: Momentum::new(vars.len(), config.momentum_factor)?,
            pool: SolutionPool::new(config.top_num)?,
            visited: VisitedSet::new(),
            vars,
            values,
            leqs,
            has_feasible: false,
        })
    }

    /// Prepare a solve from parallel bound, initial-value, and flag slices
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the slices differ in length, plus every
    /// error `new` reports
    pub fn with_bounds(
        model: &'m M,
        bounds: &[(u64, u64)],
        initial: &[u64],
        update_last: &[bool],
        config: SolverConfig,
    ) -> Result<Self> {
        if initial.len() != bounds.len() {
            return Err(invalid_input(
                "initial",
                &initial.len(),
                &format!("expected {} values", bounds.len()),
            ));
        }
        if update_last.len() != bounds.len() {
            return Err(invalid_input(
                "update_last",
                &update_last.len(),
                &format!("expected {} flags", bounds.len()),
            ));
        }

        let variables = bounds
            .iter()
            .zip(initial)
            .zip(update_last)
            .enumerate()
            .map(|(index, ((&(lower, upper), &value), &last))| {
                let var = TileVariable::new(index, lower, upper).with_value(value);
                if last { var.update_last() } else { var }
            })
            .collect();

        Self::new(model, variables, config)
    }

    /// Run the search to completion
    ///
    /// Stops when the iteration budget is spent, when no variable has an
    /// improving move and no unexplored infeasible neighbour is left to step
    /// into, or when a feasible point comes around a second time.
    ///
    /// # Errors
    ///
    /// Returns `Unsolvable` if no feasible point was found, and
    /// `IndexOutOfRange` if a helper is handed an invalid variable index
    #[tracing::instrument(skip_all, fields(variables = self.vars.len(), leqs = self.leqs.len()))]
    pub fn run(mut self) -> Result<Solutions> {
        let mut rounds = 0;
        let mut last_feasible = None;

        while rounds < self.config.iterations {
            rounds += 1;
            let feasible = self.initialize();

            // Momentum from the other phase measures a different quantity
            if last_feasible.is_some_and(|previous| previous != feasible) {
                self.momentum.clear();
            }
            last_feasible = Some(feasible);

            let progressed = if feasible {
                if self.visited.is_searched(&self.values) {
                    debug!(round = rounds, "feasible point revisited");
                    break;
                }
                self.record_solution();
                self.fine_tune()?
            } else {
                self.locate_region()?
            };

            if !progressed {
                debug!(round = rounds, feasible, "no improving move");
                break;
            }
        }

        // A move committed in the final round has not been evaluated yet
        if self.initialize() && !self.visited.is_searched(&self.values) {
            self.record_solution();
        }

        if self.pool.is_empty() {
            warn!(rounds, "no feasible point found");
            return Err(unsolvable(
                "GeneralSolver",
                &format!("no feasible point found in {rounds} rounds"),
            ));
        }

        debug!(
            rounds,
            solutions = self.pool.len(),
            explored = self.visited.len(),
            "search finished"
        );

        let explored = self.visited.len();
        Ok(Solutions {
            entries: self.pool.into_entries(),
            rounds,
            explored,
        })
    }

    /// Recompute every residual and report whether the current point is feasible
    fn initialize(&mut self) -> bool {
        self.model.update_leqs(&self.values, None, &mut self.leqs);
        self.visited.insert(&self.values);
        self.leqs.iter().all(|residual| is_satisfied(*residual))
    }

    fn record_solution(&mut self) {
        let objective = self.model.objective(&self.values);
        let kept = self.pool.insert(VarVal {
            values: self.values.clone(),
            objective,
            slack: self.model.slack(&self.leqs),
        });
        self.visited.mark_searched(&self.values);
        self.has_feasible = true;
        trace!(objective, kept, "recorded feasible point");
    }

    fn variable(&self, idx: usize) -> Result<&TileVariable> {
        self.vars
            .get(idx)
            .ok_or_else(|| index_out_of_range(idx, self.vars.len()))
    }

    /// Value of variable `idx` after moving `steps` aligned steps, clamped to its bounds
    fn shifted(&self, idx: usize, positive: bool, steps: u64) -> Result<Option<u64>> {
        let var = self.variable(idx)?;
        let steps = steps.min(var.room(positive));
        if steps == 0 {
            return Ok(None);
        }
        let delta = steps * var.align;
        Ok(Some(if positive {
            var.value + delta
        } else {
            var.value - delta
        }))
    }

    fn with_value(&self, idx: usize, value: u64) -> Vec<u64> {
        let mut values = self.values.clone();
        if let Some(slot) = values.get_mut(idx) {
            *slot = value;
        }
        values
    }

    /// Candidate vector and its incrementally updated residuals
    fn probe(&self, idx: usize, value: u64) -> (Vec<u64>, Vec<f64>) {
        let values = self.with_value(idx, value);
        let mut leqs = self.leqs.clone();
        self.model.update_leqs(&values, Some(idx), &mut leqs);
        (values, leqs)
    }

    fn evaluate(&self, info: FuncInfo, values: &[u64]) -> f64 {
        match info {
            FuncInfo::Leq => self.model.leq_cost(values),
            FuncInfo::Buffer => self.model.buffer_cost(values),
            FuncInfo::Slack => self.model.slack(&self.model.residuals(values)),
        }
    }

    /// Finite-difference descent direction of `info` for variable `idx`
    ///
    /// Neither probe steps outside the variable's bounds.
    fn get_descent(&self, idx: usize, info: FuncInfo) -> Result<UpdateDirection> {
        let current = self.evaluate(info, &self.values);
        let mut best = (UpdateDirection::None, 0.0);

        for (direction, positive) in [
            (UpdateDirection::Positive, true),
            (UpdateDirection::Negative, false),
        ] {
            let Some(value) = self.shifted(idx, positive, 1)? else {
                continue;
            };
            let delta = self.evaluate(info, &self.with_value(idx, value)) - current;
            if definitely_less(delta, best.1) {
                best = (direction, delta);
            }
        }

        Ok(best.0)
    }

    fn locality(
        &self,
        idx: usize,
        positive: bool,
        steps: u64,
        base_cost: f64,
    ) -> Result<Probe<Locality>> {
        let Some(value) = self.shifted(idx, positive, steps)? else {
            return Ok(self.rejected(idx, positive));
        };
        let (values, leqs) = self.probe(idx, value);
        let cost = violation_penalty(&leqs);
        let probe = |class| Probe {
            class,
            value,
            positive,
            gain: base_cost - cost,
        };

        if leqs.iter().all(|residual| is_satisfied(*residual)) {
            return Ok(probe(Locality::GlobalValid));
        }
        if self.visited.contains(&values) {
            return Ok(self.rejected(idx, positive));
        }

        let local = self.model.check_local_valid(&leqs, idx);
        let class = if definitely_less(cost, base_cost) {
            if local {
                Locality::LocalValid
            } else {
                Locality::CrossRegion
            }
        } else if is_equal(cost, base_cost) {
            Locality::Invalid
        } else if local {
            Locality::Alternative
        } else {
            Locality::Reject
        };
        Ok(probe(class))
    }

    fn rejected(&self, idx: usize, positive: bool) -> Probe<Locality> {
        Probe {
            class: Locality::Reject,
            value: self.values.get(idx).copied().unwrap_or(0),
            positive,
            gain: 0.0,
        }
    }

    /// Coarse doubling search for a step size, then binary halving onto the boundary
    fn search_locality(&self, idx: usize, positive: bool, base_cost: f64) -> Result<Probe<Locality>> {
        let room = self.variable(idx)?.room(positive);
        let mut best = self.rejected(idx, positive);
        let mut last_outside = 0;
        let mut crossed = None;
        let mut step = 1;

        while step <= room {
            let probe = self.locality(idx, positive, step, base_cost)?;
            let better = probe.class < best.class
                || (probe.class == best.class && definitely_less(best.gain, probe.gain));
            if !better {
                break;
            }
            best = probe;
            if best.class == Locality::GlobalValid {
                crossed = Some(step);
                break;
            }
            last_outside = step;
            if step == room {
                break;
            }
            step = step.saturating_mul(2).min(room);
        }

        let Some(mut inside) = crossed else {
            return Ok(best);
        };

        let mut outside = last_outside;
        while inside - outside > 1 {
            let mid = outside + (inside - outside) / 2;
            let probe = self.locality(idx, positive, mid, base_cost)?;
            if probe.class == Locality::GlobalValid {
                inside = mid;
                best = probe;
            } else {
                outside = mid;
            }
        }

        if self.visited.is_searched(&self.with_value(idx, best.value)) {
            return self.get_peer_loc(idx, positive, inside, room, base_cost);
        }
        Ok(best)
    }

    /// Jump across the feasible interval to its far boundary
    ///
    /// Used when the near boundary was already searched.
    fn get_peer_loc(
        &self,
        idx: usize,
        positive: bool,
        near: u64,
        room: u64,
        base_cost: f64,
    ) -> Result<Probe<Locality>> {
        let mut inside = near;
        let mut outside = None;
        let mut step = near.saturating_mul(2).min(room);

        while step > inside {
            let probe = self.locality(idx, positive, step, base_cost)?;
            if probe.class != Locality::GlobalValid {
                outside = Some(step);
                break;
            }
            inside = step;
            step = step.saturating_mul(2).min(room);
        }

        if let Some(mut outside) = outside {
            while outside - inside > 1 {
                let mid = inside + (outside - inside) / 2;
                if self.locality(idx, positive, mid, base_cost)?.class == Locality::GlobalValid {
                    inside = mid;
                } else {
                    outside = mid;
                }
            }
        }

        let peer = self.locality(idx, positive, inside, base_cost)?;
        if inside == near || self.visited.is_searched(&self.with_value(idx, peer.value)) {
            return Ok(self.rejected(idx, positive));
        }
        trace!(idx, value = peer.value, "jumped to peer boundary");
        Ok(peer)
    }

    /// Move an infeasible point towards the feasible region
    fn locate_region(&mut self) -> Result<bool> {
        let base_cost = violation_penalty(&self.leqs);
        let mut probes: Vec<Option<Probe<Locality>>> = vec![None; self.vars.len()];
        let mut best = Locality::CrossRegion;

        for deferred in [false, true] {
            let resolved = probes
                .iter()
                .flatten()
                .any(|probe| probe.class.is_improving());
            if deferred && resolved && !self.has_feasible {
                break;
            }

            for idx in 0..self.vars.len() {
                if self.variable(idx)?.update_last != deferred {
                    continue;
                }
                let Some(positive) = self.get_descent(idx, FuncInfo::Leq)?.is_positive() else {
                    continue;
                };
                let probe = self.search_locality(idx, positive, base_cost)?;
                trace!(idx, class = ?probe.class, value = probe.value, "locality probe");

                if probe.class < best {
                    best = probe.class;
                    self.momentum.clear();
                }
                if probe.class == best {
                    self.momentum.update(idx, probe.gain);
                }
                if let Some(slot) = probes.get_mut(idx) {
                    *slot = Some(probe);
                }
            }
        }

        self.commit_best(&probes, best, Locality::is_improving)
    }

    /// Improve a feasible point without leaving the feasible region
    fn fine_tune(&mut self) -> Result<bool> {
        let base = Baseline {
            objective: self.model.objective(&self.values),
            slack: self.model.slack(&self.leqs),
            buffer: self.model.buffer_cost(&self.values),
        };
        let mut probes: Vec<Option<Probe<TunePriority>>> = vec![None; self.vars.len()];
        let mut best = TunePriority::Dilated;

        for idx in 0..self.vars.len() {
            let forward = self.search_loc(idx, true, best, &base)?;
            let probe = if forward.class > TunePriority::Normal || self.config.high_perf {
                let backward = self.search_loc(idx, false, best, &base)?;
                if backward.class < forward.class
                    || (backward.class == forward.class && definitely_less(forward.gain, backward.gain))
                {
                    backward
                } else {
                    forward
                }
            } else {
                forward
            };
            let probe = self.refine(idx, probe, &base)?;
            trace!(idx, class = ?probe.class, value = probe.value, "tune probe");

            if probe.class < best {
                best = probe.class;
                self.momentum.clear();
            }
            if probe.class == best {
                self.momentum.update(idx, probe.gain);
            }
            if let Some(slot) = probes.get_mut(idx) {
                *slot = Some(probe);
            }
        }

        if self.commit_best(&probes, best, TunePriority::is_improving)? {
            return Ok(true);
        }
        self.escape()
    }

    /// Step off a feasible point that has no improving move
    ///
    /// Takes the single aligned step with the smallest violation among the
    /// infeasible neighbours not explored yet. The next locate round then
    /// either finds a fresh boundary or gives up on the searched one.
    fn escape(&mut self) -> Result<bool> {
        let mut target: Option<(f64, usize, u64)> = None;

        for idx in 0..self.vars.len() {
            for positive in [true, false] {
                let Some(value) = self.shifted(idx, positive, 1)? else {
                    continue;
                };
                let (values, leqs) = self.probe(idx, value);
                if leqs.iter().all(|residual| is_satisfied(*residual))
                    || self.visited.contains(&values)
                {
                    continue;
                }
                let cost = violation_penalty(&leqs);
                if target.is_none_or(|(lowest, _, _)| definitely_less(cost, lowest)) {
                    target = Some((cost, idx, value));
                }
            }
        }

        let Some((cost, idx, value)) = target else {
            return Ok(false);
        };
        self.assign(idx, value)?;
        self.momentum.clear();
        debug!(variable = idx, value, cost, "left feasible region");
        Ok(true)
    }

    fn assign(&mut self, idx: usize, value: u64) -> Result<()> {
        let len = self.vars.len();
        let var = self
            .vars
            .get_mut(idx)
            .ok_or_else(|| index_out_of_range(idx, len))?;
        var.value = value;
        if let Some(slot) = self.values.get_mut(idx) {
            *slot = value;
        }
        Ok(())
    }

    fn priority(
        &self,
        idx: usize,
        positive: bool,
        steps: u64,
        base: &Baseline,
    ) -> Result<Probe<TunePriority>> {
        let current = self.variable(idx)?.value;
        let refused = Probe {
            class: TunePriority::Refuse,
            value: current,
            positive,
            gain: 0.0,
        };
        let Some(value) = self.shifted(idx, positive, steps)? else {
            return Ok(refused);
        };
        let (values, leqs) = self.probe(idx, value);
        if self.visited.is_searched(&values) {
            return Ok(refused);
        }

        let probe = |class, gain| Probe {
            class,
            value,
            positive,
            gain,
        };
        if !leqs.iter().all(|residual| is_satisfied(*residual)) {
            return Ok(probe(TunePriority::Tabu, 0.0));
        }

        let objective = self.model.objective(&values);
        if definitely_less(objective, base.objective) {
            return Ok(probe(TunePriority::Harmless, base.objective - objective));
        }
        if !is_equal(objective, base.objective) {
            return Ok(probe(TunePriority::Other, 0.0));
        }

        let slack = self.model.slack(&leqs);
        let buffer_grew = definitely_less(base.buffer, self.model.buffer_cost(&values));
        if definitely_less(slack, base.slack) && !buffer_grew {
            Ok(probe(TunePriority::Dilated, base.slack - slack))
        } else {
            Ok(probe(TunePriority::Normal, 0.0))
        }
    }

    /// Probe up to `search_length` unit steps for a move at least as good as `threshold`
    ///
    /// Returns the first such move, otherwise the best class observed.
    fn search_loc(
        &self,
        idx: usize,
        positive: bool,
        threshold: TunePriority,
        base: &Baseline,
    ) -> Result<Probe<TunePriority>> {
        let var = self.variable(idx)?;
        let reach = self.config.search_length.min(var.room(positive));
        let mut seen = Probe {
            class: TunePriority::Refuse,
            value: var.value,
            positive,
            gain: 0.0,
        };

        for step in 1..=reach {
            let probe = self.priority(idx, positive, step, base)?;
            if probe.class.is_improving() && probe.class <= threshold {
                return Ok(probe);
            }
            if probe.class < seen.class {
                seen = probe;
            }
        }
        Ok(seen)
    }

    /// Stretch an improving move as far as it keeps its class
    fn refine(
        &self,
        idx: usize,
        probe: Probe<TunePriority>,
        base: &Baseline,
    ) -> Result<Probe<TunePriority>> {
        match probe.class {
            TunePriority::Harmless => self.extend(idx, probe, base),
            TunePriority::Dilated => {
                let direction = self.get_descent(idx, FuncInfo::Slack)?;
                if direction.is_positive() == Some(probe.positive) {
                    self.extend(idx, probe, base)
                } else {
                    Ok(Probe {
                        class: TunePriority::Normal,
                        gain: 0.0,
                        ..probe
                    })
                }
            }
            _ => Ok(probe),
        }
    }

    /// Doubling followed by halving increments while the move keeps its class
    /// and does not lose ground against the last accepted step
    fn extend(
        &self,
        idx: usize,
        start: Probe<TunePriority>,
        base: &Baseline,
    ) -> Result<Probe<TunePriority>> {
        let var = self.variable(idx)?;
        let room = var.room(start.positive);
        let accepts = |candidate: &Probe<TunePriority>, last: &Probe<TunePriority>| {
            candidate.class == start.class && !definitely_less(candidate.gain, last.gain)
        };

        let mut good = start;
        let mut good_step = start.value.abs_diff(var.value) / var.align;
        let mut bad_step = None;

        while good_step < room {
            let step = good_step.saturating_mul(2).min(room);
            let candidate = self.priority(idx, start.positive, step, base)?;
            if !accepts(&candidate, &good) {
                bad_step = Some(step);
                break;
            }
            good = candidate;
            good_step = step;
        }

        if let Some(mut bad) = bad_step {
            while bad - good_step > 1 {
                let mid = good_step + (bad - good_step) / 2;
                let candidate = self.priority(idx, start.positive, mid, base)?;
                if accepts(&candidate, &good) {
                    good = candidate;
                    good_step = mid;
                } else {
                    bad = mid;
                }
            }
        }

        Ok(good)
    }

    /// Commit the best-momentum proposal among variables sharing the best class
    fn commit_best<C: Copy + PartialEq + std::fmt::Debug>(
        &mut self,
        probes: &[Option<Probe<C>>],
        best: C,
        improving: fn(C) -> bool,
    ) -> Result<bool> {
        if !improving(best) {
            return Ok(false);
        }

        let eligible = probes.iter().enumerate().filter_map(|(idx, &probe)| {
            probe
                .filter(|candidate| {
                    candidate.class == best
                        && self
                            .values
                            .get(idx)
                            .is_some_and(|&value| value != candidate.value)
                })
                .map(|_| idx)
        });
        let Some(choice) = self.momentum.best_choice(eligible) else {
            return Ok(false);
        };
        let Some(probe) = probes.get(choice).copied().flatten() else {
            return Err(index_out_of_range(choice, probes.len()));
        };

        self.assign(choice, probe.value)?;
        self.momentum.retain_only(choice);

        debug!(
            variable = choice,
            value = probe.value,
            class = ?probe.class,
            momentum = self.momentum.get(choice),
            "committed move"
        );
        Ok(true)
    }
}
