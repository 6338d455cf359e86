//! Tests for move classifications and direction helpers

#[cfg(test)]
mod tests {
    use tilesolve::solver::ranking::{Locality, TunePriority, UpdateDirection};

    // Tests locality classes order best to worst
    // Verified by swapping two variants
    #[test]
    fn test_locality_order() {
        assert!(Locality::GlobalValid < Locality::LocalValid);
        assert!(Locality::LocalValid < Locality::CrossRegion);
        assert!(Locality::CrossRegion < Locality::Invalid);
        assert!(Locality::Invalid < Locality::Alternative);
        assert!(Locality::Alternative < Locality::Reject);
    }

    // Tests only moves towards feasibility count as improving
    // Verified by including Invalid
    #[test]
    fn test_locality_improving() {
        assert!(Locality::CrossRegion.is_improving());
        assert!(!Locality::Invalid.is_improving());
        assert!(!Locality::Reject.is_improving());
    }

    // Tests tune priorities order best to worst
    // Verified by swapping Normal and Dilated
    #[test]
    fn test_tune_priority_order() {
        assert!(TunePriority::Harmless < TunePriority::Dilated);
        assert!(TunePriority::Dilated < TunePriority::Normal);
        assert!(TunePriority::Normal < TunePriority::Other);
        assert!(TunePriority::Other < TunePriority::Tabu);
        assert!(TunePriority::Tabu < TunePriority::Refuse);
        assert!(TunePriority::Dilated.is_improving());
        assert!(!TunePriority::Normal.is_improving());
    }

    // Tests direction conversion to a boolean
    // Verified by mapping None to false
    #[test]
    fn test_direction_is_positive() {
        assert_eq!(UpdateDirection::Positive.is_positive(), Some(true));
        assert_eq!(UpdateDirection::Negative.is_positive(), Some(false));
        assert_eq!(UpdateDirection::None.is_positive(), None);
    }
}
