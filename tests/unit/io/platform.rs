//! Tests for platform capability validation

#[cfg(test)]
mod tests {
    use tilesolve::SolverError;
    use tilesolve::io::configuration::{DEFAULT_CORE_NUM, DEFAULT_UB_SIZE};
    use tilesolve::io::platform::PlatformInfo;

    // Tests the reference platform passes validation
    // Verified by zeroing a default
    #[test]
    fn test_default_platform_is_valid() {
        let platform = PlatformInfo::default();
        assert_eq!(platform.core_num, DEFAULT_CORE_NUM);
        assert_eq!(platform.ub_size, DEFAULT_UB_SIZE);
        assert!(platform.validate().is_ok());
    }

    // Tests a zero capability is reported by name
    // Verified by reporting the last zero field
    #[test]
    fn test_zero_field_rejected() {
        let platform = PlatformInfo {
            l1_size: 0,
            l2_size: 0,
            ..PlatformInfo::default()
        };
        assert!(matches!(
            platform.validate(),
            Err(SolverError::InvalidPlatform { field: "l1_size" })
        ));
    }

    // Tests zero cores are rejected
    // Verified by skipping the core count in the field list
    #[test]
    fn test_zero_cores_rejected() {
        let platform = PlatformInfo {
            core_num: 0,
            ..PlatformInfo::default()
        };
        assert!(matches!(
            platform.validate(),
            Err(SolverError::InvalidPlatform { field: "core_num" })
        ));
    }

    // Tests field listing matches the struct
    // Verified by listing a field twice
    #[test]
    fn test_fields_listing() {
        let platform = PlatformInfo::default();
        let fields = platform.fields();
        assert_eq!(fields.len(), 7);
        assert!(fields.contains(&("l0c_size", platform.l0c_size)));
    }
}
