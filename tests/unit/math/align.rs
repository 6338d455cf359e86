//! Tests for integer alignment, block counting, and power-of-two rounding

#[cfg(test)]
mod tests {
    use tilesolve::math::align::{
        align_down, align_up, ceil_div, divides_or_multiple, prev_power_of_two,
    };

    // Tests rounding up to the next multiple
    // Verified by returning the input unchanged
    #[test]
    fn test_align_up() {
        assert_eq!(align_up(100_u64, 16), 112);
        assert_eq!(align_up(112_u64, 16), 112);
        assert_eq!(align_up(1_u64, 16), 16);
        assert_eq!(align_up(0_u64, 16), 0);
    }

    // Tests zero alignment leaves the value untouched
    // Verified by dividing by the alignment unconditionally
    #[test]
    fn test_align_up_zero_alignment() {
        assert_eq!(align_up(37_u64, 0), 37);
        assert_eq!(align_down(37_u64, 0), 37);
    }

    // Tests rounding up saturates instead of overflowing
    // Verified by using plain addition
    #[test]
    fn test_align_up_saturates() {
        assert_eq!(align_up(u64::MAX - 3, 16), u64::MAX - 15);
        assert_eq!(align_up(250_u8, 16), 240);
    }

    // Tests rounding down to a multiple
    // Verified by rounding to nearest
    #[test]
    fn test_align_down() {
        assert_eq!(align_down(100_u64, 16), 96);
        assert_eq!(align_down(96_u64, 16), 96);
        assert_eq!(align_down(15_u64, 16), 0);
    }

    // Tests block counts cover the whole extent
    // Verified by using truncating division
    #[test]
    fn test_ceil_div() {
        assert_eq!(ceil_div(100_u64, 16), 7);
        assert_eq!(ceil_div(96_u64, 16), 6);
        assert_eq!(ceil_div(0_u64, 16), 0);
        assert_eq!(ceil_div(5_u64, 0), 0);
    }

    // Tests largest power of two not above the value
    // Verified by returning the next power of two
    #[test]
    fn test_prev_power_of_two() {
        assert_eq!(prev_power_of_two(0_u64), 0);
        assert_eq!(prev_power_of_two(1_u64), 1);
        assert_eq!(prev_power_of_two(100_u64), 64);
        assert_eq!(prev_power_of_two(128_u64), 128);
        assert_eq!(prev_power_of_two(u64::MAX), 1 << 63);
    }

    // Tests divisor and multiple relation in both directions
    // Verified by checking only one direction
    #[test]
    fn test_divides_or_multiple() {
        assert!(divides_or_multiple(16_u64, 64));
        assert!(divides_or_multiple(256_u64, 64));
        assert!(divides_or_multiple(64_u64, 64));
        assert!(!divides_or_multiple(48_u64, 64));
        assert!(!divides_or_multiple(0_u64, 64));
        assert!(!divides_or_multiple(16_u64, 0));
    }
}
