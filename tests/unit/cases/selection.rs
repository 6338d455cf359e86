//! Tests for competing case selection

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use tilesolve::cases::selection::{CaseOutcome, TilingCase, select_case};
    use tilesolve::io::configuration::SolverConfig;
    use tilesolve::io::error::unsolvable;
    use tilesolve::io::platform::PlatformInfo;
    use tilesolve::io::record::TilingRecord;
    use tilesolve::{Result, SolverError};

    /// Case reporting a fixed objective, or failing when it has none
    struct FixedCase {
        name: &'static str,
        key: u64,
        objective: Option<f64>,
        calls: Cell<usize>,
    }

    impl FixedCase {
        const fn new(name: &'static str, key: u64, objective: Option<f64>) -> Self {
            Self {
                name,
                key,
                objective,
                calls: Cell::new(0),
            }
        }
    }

    impl TilingCase for FixedCase {
        fn name(&self) -> &'static str {
            self.name
        }

        fn tiling_key(&self) -> u64 {
            self.key
        }

        fn solve(&self, _platform: &PlatformInfo, _config: SolverConfig) -> Result<CaseOutcome> {
            self.calls.set(self.calls.get() + 1);
            let objective = self
                .objective
                .ok_or_else(|| unsolvable("FixedCase", &"configured to fail"))?;
            let mut record = TilingRecord::new();
            record.set("marker", self.key);
            Ok(CaseOutcome {
                case: self.name,
                tiling_key: self.key,
                objective,
                record,
            })
        }
    }

    fn select(cases: &[&dyn TilingCase]) -> Result<CaseOutcome> {
        select_case(cases, &PlatformInfo::default(), SolverConfig::default())
    }

    // Tests the lowest objective wins and its record is tagged
    // Verified by keeping the first solved case
    #[test]
    fn test_lowest_objective_wins() {
        let slow = FixedCase::new("slow", 1, Some(9.0));
        let fast = FixedCase::new("fast", 2, Some(3.0));
        let winner = select(&[&slow, &fast]).expect("both cases solve");

        assert_eq!(winner.case, "fast");
        assert_eq!(winner.record.tiling_key(), Some(2));
        assert_eq!(winner.record.get("marker"), Some(2));
        assert_eq!((slow.calls.get(), fast.calls.get()), (1, 1));
    }

    // Tests equal objectives keep the earlier case
    // Verified by comparing with less-or-equal
    #[test]
    fn test_tie_keeps_earlier() {
        let first = FixedCase::new("first", 1, Some(4.0));
        let second = FixedCase::new("second", 2, Some(4.0));
        let winner = select(&[&first, &second]).expect("both cases solve");
        assert_eq!(winner.tiling_key, 1);
    }

    // Tests failing cases are skipped
    // Verified by propagating the first failure
    #[test]
    fn test_failures_skipped() {
        let broken = FixedCase::new("broken", 1, None);
        let working = FixedCase::new("working", 2, Some(100.0));
        let winner = select(&[&broken, &working]).expect("one case solves");
        assert_eq!(winner.case, "working");
    }

    // Tests selection fails when every case fails
    // Verified by returning an empty record
    #[test]
    fn test_all_fail() {
        let broken = FixedCase::new("broken", 1, None);
        assert!(matches!(
            select(&[&broken]),
            Err(SolverError::Unsolvable { .. })
        ));
        assert!(matches!(select(&[]), Err(SolverError::Unsolvable { .. })));
    }

    // Tests an unusable platform is rejected before any case runs
    // Verified by validating after solving
    #[test]
    fn test_platform_checked_first() {
        let case = FixedCase::new("case", 1, Some(1.0));
        let platform = PlatformInfo {
            ub_size: 0,
            ..PlatformInfo::default()
        };
        let result = select_case(&[&case], &platform, SolverConfig::default());
        assert!(matches!(
            result,
            Err(SolverError::InvalidPlatform { field: "ub_size" })
        ));
        assert_eq!(case.calls.get(), 0);
    }
}
