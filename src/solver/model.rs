//! Capability contract a tiling case plugs into the general solver

use crate::math::float::{is_satisfied, violation_penalty};
use crate::solver::ranking::ConstraintKind;

/// Cost formulas and constraint residuals for one tiling case
///
/// Every method must be a pure function of its arguments: the solver probes
/// moves speculatively and relies on identical inputs giving identical answers.
/// A residual `<= 0` means the constraint holds.
pub trait CostModel {
    /// Number of residual slots `update_leqs` fills
    fn leq_count(&self) -> usize;

    /// Role of residual `leq`
    fn constraint_kind(&self, _leq: usize) -> ConstraintKind {
        ConstraintKind::Leq
    }

    /// Estimated execution cost of an assignment (lower is better)
    fn objective(&self, vars: &[u64]) -> f64;

    /// Recompute residuals affected by a change to `changed`, or all when `None`
    fn update_leqs(&self, vars: &[u64], changed: Option<usize>, leqs: &mut [f64]);

    /// Whether every constraint touching variable `idx` holds
    fn check_local_valid(&self, leqs: &[f64], idx: usize) -> bool;

    /// Squared violation of the buffer constraints, zero iff all of them hold
    fn buffer_cost(&self, vars: &[u64]) -> f64 {
        let leqs = self.residuals(vars);
        violation_penalty(
            leqs.iter()
                .enumerate()
                .filter(|(i, _)| self.constraint_kind(*i) == ConstraintKind::Buffer)
                .map(|(_, residual)| residual),
        )
    }

    /// Squared violation over every constraint
    fn leq_cost(&self, vars: &[u64]) -> f64 {
        violation_penalty(&self.residuals(vars))
    }

    /// Capacity left in the tightest buffer constraint
    ///
    /// Falls back to the tightest constraint of any kind when the case
    /// declares no buffer constraints, and to zero when it declares none.
    fn slack(&self, leqs: &[f64]) -> f64 {
        let tightest = |wanted: Option<ConstraintKind>| {
            leqs.iter()
                .enumerate()
                .filter(|(i, _)| wanted.is_none_or(|kind| self.constraint_kind(*i) == kind))
                .map(|(_, residual)| -residual)
                .reduce(f64::min)
        };
        tightest(Some(ConstraintKind::Buffer))
            .or_else(|| tightest(None))
            .unwrap_or(0.0)
    }

    /// Full residual vector for an assignment
    fn residuals(&self, vars: &[u64]) -> Vec<f64> {
        let mut leqs = vec![0.0; self.leq_count()];
        self.update_leqs(vars, None, &mut leqs);
        leqs
    }
}

type Residual = Box<dyn Fn(&[u64]) -> f64>;

/// One constraint of a `ConstraintModel`
pub struct Constraint {
    kind: ConstraintKind,
    related: Vec<usize>,
    residual: Residual,
}

impl Constraint {
    /// Role of the constraint
    pub const fn kind(&self) -> ConstraintKind {
        self.kind
    }

    /// Indices of the variables the residual reads
    pub fn related(&self) -> &[usize] {
        &self.related
    }

    /// Evaluate the residual
    pub fn evaluate(&self, vars: &[u64]) -> f64 {
        (self.residual)(vars)
    }
}

/// Closure-backed `CostModel`
///
/// Each constraint lists the variables it reads, which lets `update_leqs`
/// touch only the residuals a single-variable move can change.
pub struct ConstraintModel {
    objective: Residual,
    constraints: Vec<Constraint>,
}

impl ConstraintModel {
    /// Create a model minimizing `objective` with no constraints yet
    pub fn new(objective: impl Fn(&[u64]) -> f64 + 'static) -> Self {
        Self {
            objective: Box::new(objective),
            constraints: Vec::new(),
        }
    }

    /// Add an inequality constraint reading `related` variables
    #[must_use]
    pub fn leq(self, related: &[usize], residual: impl Fn(&[u64]) -> f64 + 'static) -> Self {
        self.constraint(ConstraintKind::Leq, related, residual)
    }

    /// Add a buffer-capacity constraint reading `related` variables
    #[must_use]
    pub fn buffer(self, related: &[usize], residual: impl Fn(&[u64]) -> f64 + 'static) -> Self {
        self.constraint(ConstraintKind::Buffer, related, residual)
    }

    /// Add a constraint of the given kind
    #[must_use]
    pub fn constraint(
        mut self,
        kind: ConstraintKind,
        related: &[usize],
        residual: impl Fn(&[u64]) -> f64 + 'static,
    ) -> Self {
        self.constraints.push(Constraint {
            kind,
            related: related.to_vec(),
            residual: Box::new(residual),
        });
        self
    }

    /// Declared constraints in insertion order
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }
}

impl CostModel for ConstraintModel {
    fn leq_count(&self) -> usize {
        self.constraints.len()
    }

    fn constraint_kind(&self, leq: usize) -> ConstraintKind {
        self.constraints
            .get(leq)
            .map_or(ConstraintKind::Leq, Constraint::kind)
    }

    fn objective(&self, vars: &[u64]) -> f64 {
        (self.objective)(vars)
    }

    fn update_leqs(&self, vars: &[u64], changed: Option<usize>, leqs: &mut [f64]) {
        for (constraint, slot) in self.constraints.iter().zip(leqs.iter_mut()) {
            if changed.is_none_or(|idx| constraint.related.contains(&idx)) {
                *slot = constraint.evaluate(vars);
            }
        }
    }

    fn check_local_valid(&self, leqs: &[f64], idx: usize) -> bool {
        self.constraints
            .iter()
            .zip(leqs)
            .filter(|(constraint, _)| constraint.related.contains(&idx))
            .all(|(_, residual)| is_satisfied(*residual))
    }
}
