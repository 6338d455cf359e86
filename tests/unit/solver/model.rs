//! Tests for the closure-backed cost model

#[cfg(test)]
mod tests {
    use tilesolve::solver::model::{ConstraintModel, CostModel};
    use tilesolve::solver::ranking::ConstraintKind;

    /// `x + y <= 10` as a buffer and `x <= 4` as a plain inequality
    fn model() -> ConstraintModel {
        ConstraintModel::new(|vars: &[u64]| vars.iter().sum::<u64>() as f64)
            .buffer(&[0, 1], |vars: &[u64]| match vars {
                &[x, y] => (x + y) as f64 - 10.0,
                _ => f64::INFINITY,
            })
            .leq(&[0], |vars: &[u64]| match vars {
                &[x, ..] => x as f64 - 4.0,
                _ => f64::INFINITY,
            })
    }

    // Tests constraint count and kinds follow declaration order
    // Verified by reporting every constraint as Leq
    #[test]
    fn test_kinds() {
        let model = model();
        assert_eq!(model.leq_count(), 2);
        assert_eq!(model.constraint_kind(0), ConstraintKind::Buffer);
        assert_eq!(model.constraint_kind(1), ConstraintKind::Leq);
        assert_eq!(model.constraints().first().map(|c| c.related().to_vec()), Some(vec![0, 1]));
        assert!((model.objective(&[2, 3]) - 5.0).abs() < 1e-12);
    }

    // Tests a single-variable update only recomputes constraints reading it
    // Verified by recomputing every residual
    #[test]
    fn test_incremental_update() {
        let model = model();
        let mut leqs = vec![-100.0, -100.0];
        model.update_leqs(&[6, 1], Some(1), &mut leqs);
        assert!((leqs[0] + 3.0).abs() < 1e-12);
        assert!((leqs[1] + 100.0).abs() < 1e-12);

        model.update_leqs(&[6, 1], None, &mut leqs);
        assert!((leqs[1] - 2.0).abs() < 1e-12);
    }

    // Tests local validity only inspects constraints touching the variable
    // Verified by checking every constraint
    #[test]
    fn test_local_valid() {
        let model = model();
        let leqs = model.residuals(&[6, 1]);
        assert!(!model.check_local_valid(&leqs, 0));
        assert!(model.check_local_valid(&leqs, 1));
    }

    // Tests buffer cost ignores plain inequalities while leq cost sums both
    // Verified by summing every residual into the buffer cost
    #[test]
    fn test_costs() {
        let model = model();
        assert!(model.buffer_cost(&[6, 1]).abs() < 1e-12);
        assert!((model.leq_cost(&[6, 1]) - 4.0).abs() < 1e-12);
        assert!((model.buffer_cost(&[8, 5]) - 9.0).abs() < 1e-12);
        assert!((model.leq_cost(&[8, 5]) - 25.0).abs() < 1e-12);
    }

    // Tests slack reads the tightest buffer and falls back to any constraint
    // Verified by always reading the first residual
    #[test]
    fn test_slack() {
        let model = model();
        assert!((model.slack(&[-3.0, -1.0]) - 3.0).abs() < 1e-12);

        let plain = ConstraintModel::new(|_vars: &[u64]| 0.0)
            .leq(&[0], |_vars: &[u64]| -5.0)
            .leq(&[0], |_vars: &[u64]| -2.0);
        assert!((plain.slack(&[-5.0, -2.0]) - 2.0).abs() < 1e-12);

        let empty = ConstraintModel::new(|_vars: &[u64]| 0.0);
        assert!(empty.slack(&[]).abs() < 1e-12);
    }
}
