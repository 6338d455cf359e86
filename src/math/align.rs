use num_traits::{PrimInt, Unsigned};

/// Round `value` up to the next multiple of `align`
///
/// An alignment of zero leaves the value untouched. Saturates at the type's
/// largest aligned value instead of overflowing.
pub fn align_up<T: PrimInt + Unsigned>(value: T, align: T) -> T {
    if align.is_zero() {
        return value;
    }
    let rem = value % align;
    if rem.is_zero() {
        value
    } else {
        value
            .checked_add(&(align - rem))
            .unwrap_or_else(|| align_down(T::max_value(), align))
    }
}

/// Round `value` down to a multiple of `align`
pub fn align_down<T: PrimInt + Unsigned>(value: T, align: T) -> T {
    if align.is_zero() {
        value
    } else {
        value - value % align
    }
}

/// Number of `divisor`-sized blocks needed to cover `value`
///
/// A zero divisor yields zero blocks.
pub fn ceil_div<T: PrimInt + Unsigned>(value: T, divisor: T) -> T {
    if divisor.is_zero() {
        return T::zero();
    }
    let quotient = value / divisor;
    if (value % divisor).is_zero() {
        quotient
    } else {
        quotient + T::one()
    }
}

/// Largest power of two that does not exceed `value`
///
/// Returns zero for zero.
pub fn prev_power_of_two<T: PrimInt + Unsigned>(value: T) -> T {
    if value.is_zero() {
        return T::zero();
    }
    let bits = T::zero().count_zeros();
    let shift = bits - 1 - value.leading_zeros();
    T::one() << shift as usize
}

/// Whether `a` is a multiple or a divisor of `b`
pub fn divides_or_multiple<T: PrimInt + Unsigned>(a: T, b: T) -> bool {
    if a.is_zero() || b.is_zero() {
        return false;
    }
    (a % b).is_zero() || (b % a).is_zero()
}
