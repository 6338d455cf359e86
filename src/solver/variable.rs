use crate::io::error::{Result, invalid_input};
use crate::math::align::{align_down, align_up};

/// One unknown tile parameter owned by a single solve
///
/// Created from caller-supplied shape and platform limits, mutated only by the
/// solver that owns it, and read back by the caller once the solve returns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileVariable {
    /// Position among sibling variables
    pub index: usize,
    /// Current value
    pub value: u64,
    /// Inclusive lower bound
    pub lower: u64,
    /// Inclusive upper bound (the axis extent for tile searches)
    pub upper: u64,
    /// Value must be a multiple of this
    pub align: u64,
    /// Alignment a parent axis would like this value to respect
    pub prompt_align: u64,
    /// Variable's block count contributes to the multicore split
    pub bind_multicore: bool,
    /// Variable tiles the innermost (contiguous) axis
    pub is_innermost: bool,
    /// Only moved once no other variable can make progress
    pub update_last: bool,
}

impl TileVariable {
    /// Create a variable spanning `[lower, upper]` starting at `lower`
    pub const fn new(index: usize, lower: u64, upper: u64) -> Self {
        Self {
            index,
            value: lower,
            lower,
            upper,
            align: 1,
            prompt_align: 1,
            bind_multicore: false,
            is_innermost: false,
            update_last: false,
        }
    }

    /// Set the starting value
    #[must_use]
    pub const fn with_value(mut self, value: u64) -> Self {
        self.value = value;
        self
    }

    /// Set the mandatory alignment
    #[must_use]
    pub const fn with_align(mut self, align: u64) -> Self {
        self.align = align;
        self
    }

    /// Set the alignment hinted by the parent axis
    #[must_use]
    pub const fn with_prompt_align(mut self, prompt_align: u64) -> Self {
        self.prompt_align = prompt_align;
        self
    }

    /// Mark the variable as split across cores
    #[must_use]
    pub const fn bind_multicore(mut self) -> Self {
        self.bind_multicore = true;
        self
    }

    /// Mark the variable as tiling the innermost axis
    #[must_use]
    pub const fn innermost(mut self) -> Self {
        self.is_innermost = true;
        self
    }

    /// Defer updates until the other variables stall
    #[must_use]
    pub const fn update_last(mut self) -> Self {
        self.update_last = true;
        self
    }

    /// Tighten the bounds to aligned values and snap the current value into them
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the alignment is zero or no aligned value
    /// lies within the bounds
    pub fn normalize(&mut self) -> Result<()> {
        if self.align == 0 {
            return Err(invalid_input("align", &self.index, &"alignment must be positive"));
        }

        let lower = align_up(self.lower.max(self.align), self.align);
        let upper = align_down(self.upper, self.align);
        if lower > upper {
            return Err(invalid_input(
                "bounds",
                &format!("[{}, {}]", self.lower, self.upper),
                &format!("no multiple of {} inside the bounds", self.align),
            ));
        }

        self.lower = lower;
        self.upper = upper;
        self.value = align_down(self.value, self.align).clamp(lower, upper);
        Ok(())
    }

    /// Number of aligned steps between the current value and the bound in `direction`
    pub const fn room(&self, positive: bool) -> u64 {
        if self.align == 0 {
            return 0;
        }
        if positive {
            self.upper.saturating_sub(self.value) / self.align
        } else {
            self.value.saturating_sub(self.lower) / self.align
        }
    }
}
