//! Competing tiling cases solved independently, lowest objective wins

use crate::io::configuration::SolverConfig;
use crate::io::error::{Result, unsolvable};
use crate::io::platform::PlatformInfo;
use crate::io::record::TilingRecord;
use tracing::{debug, info, warn};

/// Result of solving one tiling case
#[derive(Clone, Debug, PartialEq)]
pub struct CaseOutcome {
    /// Name of the case that produced the record
    pub case: &'static str,
    /// Identifier the host dispatches on
    pub tiling_key: u64,
    /// Estimated execution cost (lower is better)
    pub objective: f64,
    /// Tiling parameters for the host
    pub record: TilingRecord,
}

/// One way of tiling an operator
///
/// Each call to `solve` is a fresh, independent solve.
pub trait TilingCase {
    /// Name used in diagnostics
    fn name(&self) -> &'static str;

    /// Identifier written into the winning record
    fn tiling_key(&self) -> u64;

    /// Solve every tier of this case
    ///
    /// # Errors
    ///
    /// Returns the first error of any underlying solver
    fn solve(&self, platform: &PlatformInfo, config: SolverConfig) -> Result<CaseOutcome>;
}

/// Solve every case and keep the one with the lowest objective
///
/// Ties keep the earlier case. The winning record is tagged with its case's
/// tiling key.
///
/// # Errors
///
/// Returns `InvalidPlatform` before any solve if the platform is unusable, and
/// `Unsolvable` if every case fails
#[tracing::instrument(skip_all, fields(cases = cases.len()))]
pub fn select_case(
    cases: &[&dyn TilingCase],
    platform: &PlatformInfo,
    config: SolverConfig,
) -> Result<CaseOutcome> {
    platform.validate()?;

    let mut best: Option<CaseOutcome> = None;
    for case in cases {
        match case.solve(platform, config) {
            Ok(outcome) => {
                debug!(case = outcome.case, objective = outcome.objective, "case solved");
                if best
                    .as_ref()
                    .is_none_or(|current| outcome.objective < current.objective)
                {
                    best = Some(outcome);
                }
            }
            Err(error) => warn!(case = case.name(), %error, "case failed"),
        }
    }

    let Some(mut winner) = best else {
        return Err(unsolvable("select_case", &"every tiling case failed"));
    };
    winner.record.set_tiling_key(winner.tiling_key);
    info!(
        case = winner.case,
        tiling_key = winner.tiling_key,
        objective = winner.objective,
        "tiling case selected"
    );
    Ok(winner)
}
