//! Timing parameter errors

use thiserror::Error;

/// Invalid timing parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimingError {
    /// A parameter was NaN or infinite
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f32 },

    /// A time parameter was negative
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },
}

/// Result type for timing operations
pub type Result<T> = std::result::Result<T, TimingError>;

/// Check that a time parameter is finite and non-negative
pub(crate) fn check_time(field: &'static str, value: f32) -> Result<()> {
    check_finite(field, value)?;
    if value < 0.0 {
        return Err(TimingError::Negative { field, value });
    }
    Ok(())
}

pub(crate) fn check_finite(field: &'static str, value: f32) -> Result<()> {
    if !value.is_finite() {
        return Err(TimingError::NonFinite { field, value });
    }
    Ok(())
}
