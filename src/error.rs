//! Error types for the pitch detection and reharmonization core

use thiserror::Error;

/// Errors raised by the per-buffer pipeline
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DspError {
    /// Buffer length is not a power of two
    #[error("Invalid length: {0} samples is not a power of two")]
    NotPowerOfTwo(usize),

    /// Paired buffers disagree in length
    #[error("Invalid length: expected {expected} samples, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Working memory could not be reserved
    #[error("Allocation failure: could not reserve {requested} elements")]
    AllocationFailure { requested: usize },

    /// No peak in the buffer carries a usable confidence
    #[error("No pitch detected in buffer")]
    NoPitchDetected,

    /// Complex division by a value of zero modulus
    #[error("Division by zero")]
    DivisionByZero,

    /// Configuration value outside its valid range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl DspError {
    /// True for either length failure
    pub fn is_invalid_length(&self) -> bool {
        matches!(self, DspError::NotPowerOfTwo(_) | DspError::LengthMismatch { .. })
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, DspError>;
