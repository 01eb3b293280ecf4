//! Error types for the turret simulation.

use thiserror::Error;

/// Result type alias using [`TurretError`].
pub type Result<T> = std::result::Result<T, TurretError>;

/// Top-level error type for all turret simulation errors.
#[derive(Debug, Error)]
pub enum TurretError {
    /// Turret tier outside the supported range.
    #[error("Invalid turret tier: {0} (tiers start at 1)")]
    InvalidTier(u32),

    /// Accuracy fraction outside `[0, 1]`.
    #[error("Invalid accuracy: {0} (must be within [0, 1])")]
    InvalidAccuracy(String),

    /// Unknown unit reference.
    #[error("Unit not found: {0}")]
    UnitNotFound(u64),

    /// Upgrade slot index out of bounds.
    #[error("Invalid upgrade slot {slot}: unit has {slots} slots")]
    InvalidSlot {
        /// Requested slot index.
        slot: usize,
        /// Number of slots the unit actually has.
        slots: usize,
    },

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Invalid simulation state.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}
