//! Two-phase axis sizing: local-buffer axes grow first, multicore axes shrink after
//!
//! Axes are shared, reference-counted nodes. Constraints and derived upper
//! bounds capture the handles they read, so a value written by the solver is
//! immediately visible to every closure that depends on it.

use crate::io::error::{Result, invalid_input, unsolvable};
use crate::math::align::align_down;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Which phase sizes an axis
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AxisRole {
    /// Grown while the local buffers still fit
    LocalBuffer,
    /// Shrunk from its upper bound to spread work across cores
    Multicore,
}

/// Largest value an axis may take
pub enum UpperBound {
    /// Known before the solve starts
    Fixed(u64),
    /// Computed from other axes; `None` while any of them is unresolved
    Derived(Box<dyn Fn() -> Option<u64>>),
}

impl UpperBound {
    /// Current bound, if it can be computed
    pub fn resolve(&self) -> Option<u64> {
        match self {
            Self::Fixed(bound) => Some(*bound),
            Self::Derived(bound) => bound(),
        }
    }
}

impl fmt::Debug for UpperBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(bound) => f.debug_tuple("Fixed").field(bound).finish(),
            Self::Derived(_) => f.write_str("Derived"),
        }
    }
}

/// One tiling axis shared between the solver and the closures that read it
#[derive(Debug)]
pub struct AxisVariable {
    name: String,
    align: u64,
    role: AxisRole,
    upper_bound: UpperBound,
    value: Cell<Option<u64>>,
}

/// Shared handle to an axis
pub type AxisHandle = Rc<AxisVariable>;

impl AxisVariable {
    /// Create an unresolved axis
    pub fn new(
        name: impl Into<String>,
        align: u64,
        role: AxisRole,
        upper_bound: UpperBound,
    ) -> AxisHandle {
        Rc::new(Self {
            name: name.into(),
            align,
            role,
            upper_bound,
            value: Cell::new(None),
        })
    }

    /// Name used in diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Step every value is a multiple of
    pub const fn align(&self) -> u64 {
        self.align
    }

    /// Phase that sizes this axis
    pub const fn role(&self) -> AxisRole {
        self.role
    }

    /// Upper bound descriptor
    pub const fn upper_bound(&self) -> &UpperBound {
        &self.upper_bound
    }

    /// Assigned value, `None` until the owning phase resolves it
    pub fn value(&self) -> Option<u64> {
        self.value.get()
    }

    /// Assigned value, reading an unresolved axis as one aligned step
    pub fn get(&self) -> u64 {
        self.value.get().unwrap_or(self.align)
    }

    fn set(&self, value: u64) {
        self.value.set(Some(value));
    }
}

/// Which axes a constraint mixes, and therefore which phase enforces it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AxisConstraintKind {
    /// Reads only local-buffer axes; must hold throughout
    LocalBuffer,
    /// Mixes both roles; local-buffer growth must not worsen a violation
    LbMixed,
    /// Mixes both roles; must hold for a multicore combination to count
    McMixed,
}

/// Residual over a set of axes, satisfied when `<= 0`
pub struct AxisConstraint {
    kind: AxisConstraintKind,
    related: Vec<AxisHandle>,
    residual: Box<dyn Fn() -> f64>,
}

impl AxisConstraint {
    /// Create a constraint reading `related`
    pub fn new(
        kind: AxisConstraintKind,
        related: &[AxisHandle],
        residual: impl Fn() -> f64 + 'static,
    ) -> Self {
        Self {
            kind,
            related: related.to_vec(),
            residual: Box::new(residual),
        }
    }

    /// Phase the constraint belongs to
    pub const fn kind(&self) -> AxisConstraintKind {
        self.kind
    }

    /// Evaluate against the current axis values
    pub fn residual(&self) -> f64 {
        (self.residual)()
    }

    /// Whether the constraint holds for the current axis values
    pub fn holds(&self) -> bool {
        self.residual() <= 0.0
    }

    /// Whether `axis` is one of the axes the constraint reads
    pub fn touches(&self, axis: &AxisHandle) -> bool {
        self.related.iter().any(|related| Rc::ptr_eq(related, axis))
    }
}

impl fmt::Debug for AxisConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AxisConstraint")
            .field("kind", &self.kind)
            .field(
                "related",
                &self.related.iter().map(|axis| axis.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// Core split achieved by the current multicore axis values
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoreUsage {
    /// Number of cores given work
    pub used_cores: u64,
    /// Every used core receives the same amount of work
    pub load_balanced: bool,
}

impl CoreUsage {
    /// More cores wins; equal core counts prefer a balanced split
    pub const fn is_better_than(&self, other: &Self) -> bool {
        self.used_cores > other.used_cores
            || (self.used_cores == other.used_cores && self.load_balanced && !other.load_balanced)
    }
}

/// Sizes local-buffer axes, then multicore axes, in caller order
pub struct AxesReorderSolver<F>
where
    F: Fn() -> CoreUsage,
{
    axes: Vec<AxisHandle>,
    constraints: Vec<AxisConstraint>,
    core_num: u64,
    core_usage: F,
}

impl<F> AxesReorderSolver<F>
where
    F: Fn() -> CoreUsage,
{
    /// Validate the axes and prepare a solve
    ///
    /// `core_usage` reports the split achieved by the current axis values.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for no axes, a zero core count, or a zero
    /// alignment
    pub fn new(
        axes: Vec<AxisHandle>,
        constraints: Vec<AxisConstraint>,
        core_num: u64,
        core_usage: F,
    ) -> Result<Self> {
        if axes.is_empty() {
            return Err(invalid_input("axes", &0, &"at least one axis is required"));
        }
        if core_num == 0 {
            return Err(invalid_input("core_num", &0, &"must be positive"));
        }
        if let Some(axis) = axes.iter().find(|axis| axis.align == 0) {
            return Err(invalid_input(
                "align",
                &axis.name,
                &"alignment must be positive",
            ));
        }

        Ok(Self {
            axes,
            constraints,
            core_num,
            core_usage,
        })
    }

    /// Resolve every axis, writing the values into the shared handles
    ///
    /// # Errors
    ///
    /// Returns `Unsolvable` if the local buffers overflow at minimum size, an
    /// upper bound cannot be resolved, or no multicore combination satisfies
    /// the core budget and mixed constraints
    #[tracing::instrument(skip_all, fields(axes = self.axes.len(), cores = self.core_num))]
    pub fn run(&self) -> Result<CoreUsage> {
        self.local_buffer_tiling()?;
        self.multicore_tiling()
    }

    fn axes_with(&self, role: AxisRole) -> impl Iterator<Item = &AxisHandle> {
        self.axes.iter().filter(move |axis| axis.role == role)
    }

    fn constraints_of(
        &self,
        kind: AxisConstraintKind,
    ) -> impl Iterator<Item = &AxisConstraint> {
        self.constraints
            .iter()
            .filter(move |constraint| constraint.kind == kind)
    }

    fn resolve_bound(axis: &AxisVariable) -> Result<u64> {
        axis.upper_bound.resolve().ok_or_else(|| {
            warn!(axis = axis.name(), "upper bound depends on an unresolved axis");
            unsolvable(
                "AxesReorderSolver",
                &format!("upper bound of '{}' cannot be resolved", axis.name),
            )
        })
    }

    fn local_buffer_tiling(&self) -> Result<()> {
        for axis in self.axes_with(AxisRole::LocalBuffer) {
            axis.set(axis.align);
        }
        if !self
            .constraints_of(AxisConstraintKind::LocalBuffer)
            .all(AxisConstraint::holds)
        {
            warn!("local buffers overflow at minimum axis sizes");
            return Err(unsolvable(
                "AxesReorderSolver",
                &"local buffer constraints fail at minimum size",
            ));
        }

        for axis in self.axes_with(AxisRole::LocalBuffer) {
            let bound = Self::resolve_bound(axis)?;
            let related: Vec<&AxisConstraint> = self
                .constraints
                .iter()
                .filter(|constraint| {
                    constraint.kind != AxisConstraintKind::McMixed && constraint.touches(axis)
                })
                .collect();

            loop {
                let current = axis.get();
                let Some(next) = current
                    .checked_add(axis.align)
                    .filter(|&next| next <= bound)
                else {
                    break;
                };

                let before: Vec<f64> = related.iter().map(|constraint| constraint.residual()).collect();
                axis.set(next);
                let broken = related.iter().zip(&before).any(|(constraint, &previous)| {
                    let after = constraint.residual();
                    match constraint.kind {
                        AxisConstraintKind::LbMixed => after > previous && after > 0.0,
                        _ => after > 0.0,
                    }
                });
                if broken {
                    axis.set(current);
                    break;
                }
            }
            debug!(axis = axis.name(), value = axis.get(), "local buffer axis sized");
        }
        Ok(())
    }

    fn snapshot(&self) -> Vec<u64> {
        self.axes_with(AxisRole::Multicore).map(|axis| axis.get()).collect()
    }

    fn restore(&self, snapshot: &[u64]) {
        for (axis, &value) in self.axes_with(AxisRole::Multicore).zip(snapshot) {
            axis.set(value);
        }
    }

    /// Whether `usage` fits the budget and the mixed constraints hold
    fn admissible(&self, usage: CoreUsage) -> bool {
        usage.used_cores <= self.core_num
            && self
                .constraints_of(AxisConstraintKind::McMixed)
                .all(AxisConstraint::holds)
    }

    fn multicore_tiling(&self) -> Result<CoreUsage> {
        for axis in self.axes_with(AxisRole::Multicore) {
            let bound = Self::resolve_bound(axis)?;
            axis.set(align_down(bound, axis.align).max(axis.align));
        }

        let start = (self.core_usage)();
        let mut best = self
            .admissible(start)
            .then(|| (start, self.snapshot()));
        if let Some((usage, _)) = &best {
            trace!(used_cores = usage.used_cores, "starting point fits the core budget");
        }

        for axis in self.axes_with(AxisRole::Multicore) {
            let initial = axis.get();
            let mut value = initial;

            while value > axis.align {
                value -= axis.align;
                axis.set(value);

                let usage = (self.core_usage)();
                if usage.used_cores > self.core_num {
                    break;
                }
                if !self.admissible(usage) {
                    continue;
                }
                if best
                    .as_ref()
                    .is_none_or(|(current, _)| usage.is_better_than(current))
                {
                    trace!(axis = axis.name(), value, used_cores = usage.used_cores, "new best split");
                    best = Some((usage, self.snapshot()));
                }
            }

            match &best {
                Some((_, snapshot)) => self.restore(snapshot),
                None => axis.set(initial),
            }
        }

        let Some((usage, snapshot)) = best else {
            warn!("no multicore split satisfies the core budget");
            return Err(unsolvable(
                "AxesReorderSolver",
                &"no combination satisfies the multicore constraints",
            ));
        };
        self.restore(&snapshot);

        debug!(
            used_cores = usage.used_cores,
            load_balanced = usage.load_balanced,
            "multicore axes sized"
        );
        Ok(usage)
    }
}
