//! Tests for solver constants and runtime configuration

#[cfg(test)]
mod tests {
    use tilesolve::io::configuration::{
        CORE_UTILIZATION_THRESHOLD, DEFAULT_ITERATIONS, DEFAULT_MOMENTUM_FACTOR,
        DEFAULT_SEARCH_LENGTH, DEFAULT_TOP_NUM, EPSILON, L0_CANDIDATES, L0_MAX_VARIABLES,
        SolverConfig,
    };

    // Tests tolerance and general solver defaults
    // Verified by changing constant values
    #[test]
    fn test_general_solver_defaults() {
        assert!((EPSILON - 0.001).abs() < f64::EPSILON);
        assert_eq!(DEFAULT_TOP_NUM, 5);
        assert_eq!(DEFAULT_ITERATIONS, 100);
        assert_eq!(DEFAULT_SEARCH_LENGTH, 3);
        assert!((DEFAULT_MOMENTUM_FACTOR - 0.9).abs() < f64::EPSILON);
    }

    // Tests innermost candidates are ascending powers of two
    // Verified by reordering the candidate list
    #[test]
    fn test_l0_candidates() {
        assert_eq!(L0_CANDIDATES, [16, 32, 64, 128, 256, 512, 1024]);
        assert!(L0_CANDIDATES.windows(2).all(|pair| matches!(pair, [a, b] if b == &(a * 2))));
        assert_eq!(L0_MAX_VARIABLES, 3);
        assert!((CORE_UTILIZATION_THRESHOLD - 0.6).abs() < f64::EPSILON);
    }

    // Tests default config mirrors the constants
    // Verified by swapping two default fields
    #[test]
    fn test_default_config() {
        let config = SolverConfig::default();
        assert_eq!(config.top_num, DEFAULT_TOP_NUM);
        assert_eq!(config.iterations, DEFAULT_ITERATIONS);
        assert_eq!(config.search_length, DEFAULT_SEARCH_LENGTH);
        assert!(!config.high_perf);
    }

    // Tests builders replace only their own field
    // Verified by having a builder reset the others
    #[test]
    fn test_config_builders() {
        let config = SolverConfig::default()
            .with_top_num(8)
            .with_iterations(20)
            .with_high_perf(true);
        assert_eq!(config.top_num, 8);
        assert_eq!(config.iterations, 20);
        assert!(config.high_perf);
        assert_eq!(config.search_length, DEFAULT_SEARCH_LENGTH);
    }
}
