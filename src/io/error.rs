//! Error types shared by every solver and the host-side tiling cases

use std::collections::TryReserveError;
use std::fmt;

/// Main error type for all solver operations
#[derive(Debug)]
pub enum SolverError {
    /// Solver input is malformed and was rejected before any search began
    InvalidInput {
        /// Name of the offending input
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// A working buffer could not be reserved
    Allocation {
        /// Which buffer was being reserved
        buffer: &'static str,
        /// Number of elements requested
        requested: usize,
        /// Underlying reservation failure
        source: TryReserveError,
    },

    /// Input is well-formed but no feasible assignment exists
    ///
    /// Covers budgets smaller than the minimum usage, clash predicates that
    /// reject every combination, and searches that never reach feasibility.
    Unsolvable {
        /// Solver that gave up
        solver: &'static str,
        /// Description of why the instance has no solution
        reason: String,
    },

    /// Internal helper was handed a variable index that does not exist
    IndexOutOfRange {
        /// The invalid index
        index: usize,
        /// Number of variables available
        len: usize,
    },

    /// Platform query returned a zero or missing capability
    InvalidPlatform {
        /// Name of the platform field that failed the precondition
        field: &'static str,
    },

    /// Writing a tiling record failed
    Output {
        /// Underlying I/O failure
        source: std::io::Error,
    },
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid input '{parameter}' = '{value}': {reason}")
            }
            Self::Allocation {
                buffer,
                requested,
                source,
            } => {
                write!(
                    f,
                    "Failed to reserve {requested} elements for {buffer}: {source}"
                )
            }
            Self::Unsolvable { solver, reason } => {
                write!(f, "{solver} found no solution: {reason}")
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "Variable index {index} is out of bounds (len: {len})")
            }
            Self::InvalidPlatform { field } => {
                write!(f, "Platform capability '{field}' is zero or unavailable")
            }
            Self::Output { source } => {
                write!(f, "Failed to write tiling record: {source}")
            }
        }
    }
}

impl std::error::Error for SolverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Allocation { source, .. } => Some(source),
            Self::Output { source } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SolverError {
    fn from(source: std::io::Error) -> Self {
        Self::Output { source }
    }
}

/// Convenience type alias for solver results
pub type Result<T> = std::result::Result<T, SolverError>;

/// Create an invalid input error
pub fn invalid_input(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> SolverError {
    SolverError::InvalidInput {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create an unsolvable-instance error
pub fn unsolvable(solver: &'static str, reason: &impl ToString) -> SolverError {
    SolverError::Unsolvable {
        solver,
        reason: reason.to_string(),
    }
}

/// Report an index that does not address one of `len` variables
///
/// The violation is logged before it is returned so the surrounding heuristic
/// loop can abort the current operation without losing the diagnostic.
pub fn index_out_of_range(index: usize, len: usize) -> SolverError {
    tracing::error!(index, len, "variable index out of range");
    SolverError::IndexOutOfRange { index, len }
}

/// Build an empty vector with exactly `capacity` slots reserved
///
/// # Errors
///
/// Returns `Allocation` if the reservation fails
pub fn try_buffer<T>(buffer: &'static str, capacity: usize) -> Result<Vec<T>> {
    let mut values = Vec::new();
    values
        .try_reserve_exact(capacity)
        .map_err(|source| SolverError::Allocation {
            buffer,
            requested: capacity,
            source,
        })?;
    Ok(values)
}

/// Copy a slice into a freshly reserved vector
///
/// # Errors
///
/// Returns `Allocation` if the reservation fails
pub fn try_clone_slice<T: Clone>(buffer: &'static str, values: &[T]) -> Result<Vec<T>> {
    let mut copy = try_buffer(buffer, values.len())?;
    copy.extend_from_slice(values);
    Ok(copy)
}
