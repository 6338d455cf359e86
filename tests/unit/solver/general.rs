//! Tests for the general local-search solver

#[cfg(test)]
mod tests {
    use tilesolve::SolverError;
    use tilesolve::io::configuration::SolverConfig;
    use tilesolve::solver::general::GeneralSolver;
    use tilesolve::solver::model::ConstraintModel;
    use tilesolve::solver::variable::TileVariable;

    /// Maximize `x * y` subject to `x + y <= 12`
    fn product_model() -> ConstraintModel {
        ConstraintModel::new(|vars: &[u64]| -(vars.iter().product::<u64>() as f64)).leq(
            &[0, 1],
            |vars: &[u64]| vars.iter().sum::<u64>() as f64 - 12.0,
        )
    }

    // Tests every pooled solution is feasible and the best is a good product
    // Verified by returning the starting point only
    #[test]
    fn test_product_under_sum_limit() {
        let model = product_model();
        let solutions = GeneralSolver::with_bounds(
            &model,
            &[(1, 10), (1, 10)],
            &[1, 1],
            &[false, false],
            SolverConfig::default(),
        )
        .expect("valid input")
        .run()
        .expect("feasible start");

        assert!(solutions.count() >= 1);
        assert!(solutions.count() <= SolverConfig::default().top_num);
        assert!(solutions
            .entries
            .iter()
            .all(|entry| entry.values.iter().sum::<u64>() <= 12));
        let best = solutions.best().expect("pool is not empty");
        assert!(best.values.iter().product::<u64>() >= 20);
        assert!(solutions
            .entries
            .windows(2)
            .all(|pair| pair[0].objective <= pair[1].objective));
    }

    /// Feasible for `4 <= x <= 12` with a flat objective
    fn interval_model() -> ConstraintModel {
        ConstraintModel::new(|_vars: &[u64]| 0.0)
            .leq(&[0], |vars: &[u64]| 4.0 - vars.iter().sum::<u64>() as f64)
            .leq(&[0], |vars: &[u64]| vars.iter().sum::<u64>() as f64 - 12.0)
    }

    // Tests a searched near boundary sends the search to the far boundary
    // Verified by committing the searched boundary again
    #[test]
    fn test_jump_to_far_boundary() {
        let model = interval_model();
        let config = SolverConfig::default();
        let solutions = GeneralSolver::new(&model, vec![TileVariable::new(0, 1, 20)], config)
            .expect("valid input")
            .run()
            .expect("interval reachable");

        let values: Vec<Vec<u64>> = solutions.entries.iter().map(|e| e.values.clone()).collect();
        assert_eq!(values, vec![vec![4], vec![12]]);
        assert!(solutions.rounds < config.iterations);
    }

    // Tests the search stops once every move leads back to a searched point
    // Verified by letting the iteration budget end the run
    #[test]
    fn test_revisit_stops_early() {
        let model = interval_model();
        let config = SolverConfig::default();
        let solutions = GeneralSolver::new(&model, vec![TileVariable::new(0, 1, 20)], config)
            .expect("valid input")
            .run()
            .expect("interval reachable");
        assert_eq!(solutions.rounds, 5);
        assert!(solutions.explored >= 4);

        let short = GeneralSolver::new(
            &model,
            vec![TileVariable::new(0, 1, 20)],
            config.with_iterations(3),
        )
        .expect("valid input")
        .run()
        .expect("interval reachable");
        assert_eq!(short.rounds, 3);
        assert_eq!(short.best().map(|e| e.values.clone()), Some(vec![4]));
        assert_eq!(short.count(), 2);
    }

    // Tests an infeasible start walks onto the boundary and deferred variables wait
    // Verified by moving the deferred variable first
    #[test]
    fn test_locate_then_defer() {
        let model = ConstraintModel::new(|vars: &[u64]| vars.iter().sum::<u64>() as f64)
            .leq(&[0, 1], |vars: &[u64]| 8.0 - vars.iter().sum::<u64>() as f64);
        let vars = vec![
            TileVariable::new(0, 1, 10),
            TileVariable::new(1, 1, 10).update_last(),
        ];
        let solutions = GeneralSolver::new(&model, vars, SolverConfig::default())
            .expect("valid input")
            .run()
            .expect("feasible region reachable");

        let best = solutions.best().expect("pool is not empty");
        assert_eq!(best.values, vec![7, 1]);
        assert!((best.objective - 8.0).abs() < 1e-9);
    }

    // Tests aligned variables only take aligned values
    // Verified by stepping by one
    #[test]
    fn test_alignment_respected() {
        let model = ConstraintModel::new(|vars: &[u64]| -(vars.iter().sum::<u64>() as f64))
            .buffer(&[0, 1], |vars: &[u64]| match vars {
                &[x, y] => (x * y) as f64 - 4096.0,
                _ => f64::INFINITY,
            });
        let vars = vec![
            TileVariable::new(0, 16, 256).with_align(16),
            TileVariable::new(1, 16, 256).with_align(16),
        ];
        let solutions = GeneralSolver::new(&model, vars, SolverConfig::default())
            .expect("valid input")
            .run()
            .expect("feasible start");

        for entry in &solutions.entries {
            assert!(entry.values.iter().all(|v| v % 16 == 0));
            assert!(entry.values.iter().product::<u64>() <= 4096);
        }
    }

    // Tests a region that cannot be reached is unsolvable
    // Verified by pooling infeasible points
    #[test]
    fn test_unreachable_region() {
        let model = ConstraintModel::new(|_vars: &[u64]| 0.0)
            .leq(&[0], |vars: &[u64]| 100.0 - vars.iter().sum::<u64>() as f64);
        let vars = vec![TileVariable::new(0, 1, 10)];
        let result = GeneralSolver::new(&model, vars, SolverConfig::default())
            .expect("valid input")
            .run();
        assert!(matches!(result, Err(SolverError::Unsolvable { .. })));
    }

    // Tests identical inputs give identical pools
    // Verified by iterating a hash map in the search
    #[test]
    fn test_deterministic() {
        let model = product_model();
        let solve = || {
            GeneralSolver::with_bounds(
                &model,
                &[(1, 10), (1, 10)],
                &[1, 1],
                &[false, false],
                SolverConfig::default(),
            )
            .expect("valid input")
            .run()
            .expect("feasible start")
            .entries
        };
        assert_eq!(solve(), solve());
    }

    // Tests malformed input and configuration are rejected
    // Verified by accepting mismatched slices
    #[test]
    fn test_invalid_input() {
        let model = product_model();
        let config = SolverConfig::default();
        assert!(GeneralSolver::new(&model, Vec::new(), config).is_err());
        assert!(GeneralSolver::with_bounds(&model, &[(1, 10)], &[1, 1], &[false], config).is_err());
        assert!(GeneralSolver::with_bounds(&model, &[(1, 10)], &[1], &[], config).is_err());
        assert!(GeneralSolver::with_bounds(&model, &[(5, 1)], &[1], &[false], config).is_err());
        assert!(
            GeneralSolver::with_bounds(&model, &[(1, 10)], &[1], &[false], config.with_iterations(0))
                .is_err()
        );
    }
}
