use crate::io::configuration::{
    DEFAULT_CORE_NUM, DEFAULT_L0A_SIZE, DEFAULT_L0B_SIZE, DEFAULT_L0C_SIZE, DEFAULT_L1_SIZE,
    DEFAULT_L2_SIZE, DEFAULT_UB_SIZE,
};
use crate::io::error::{Result, SolverError};

/// Core count and per-tier buffer sizes of the target device
///
/// Every field must be non-zero before any solver runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlatformInfo {
    /// Number of compute cores
    pub core_num: u64,
    /// Bytes of the left-operand L0 buffer
    pub l0a_size: u64,
    /// Bytes of the right-operand L0 buffer
    pub l0b_size: u64,
    /// Bytes of the accumulator L0 buffer
    pub l0c_size: u64,
    /// Bytes of the per-core L1 buffer
    pub l1_size: u64,
    /// Bytes of the per-core unified buffer
    pub ub_size: u64,
    /// Bytes of the shared L2 cache
    pub l2_size: u64,
}

impl Default for PlatformInfo {
    fn default() -> Self {
        Self {
            core_num: DEFAULT_CORE_NUM,
            l0a_size: DEFAULT_L0A_SIZE,
            l0b_size: DEFAULT_L0B_SIZE,
            l0c_size: DEFAULT_L0C_SIZE,
            l1_size: DEFAULT_L1_SIZE,
            ub_size: DEFAULT_UB_SIZE,
            l2_size: DEFAULT_L2_SIZE,
        }
    }
}

impl PlatformInfo {
    /// Named capabilities in declaration order
    pub const fn fields(&self) -> [(&'static str, u64); 7] {
        [
            ("core_num", self.core_num),
            ("l0a_size", self.l0a_size),
            ("l0b_size", self.l0b_size),
            ("l0c_size", self.l0c_size),
            ("l1_size", self.l1_size),
            ("ub_size", self.ub_size),
            ("l2_size", self.l2_size),
        ]
    }

    /// Check that every capability is usable
    ///
    /// # Errors
    ///
    /// Returns `InvalidPlatform` naming the first zero field
    pub fn validate(&self) -> Result<()> {
        match self.fields().into_iter().find(|(_, value)| *value == 0) {
            Some((field, _)) => {
                tracing::error!(field, "platform capability is zero");
                Err(SolverError::InvalidPlatform { field })
            }
            None => Ok(()),
        }
    }
}
