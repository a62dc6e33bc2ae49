//! Error types for the simulation boundary.
//!
//! Per-tick physics never fails; errors only come from user intents,
//! parameter changes and snapshot loading, and are raised before the scene
//! is mutated.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Non-finite value for {what}")]
    NonFinite { what: &'static str },

    #[error("Cannot place ball: no free spot found after {attempts} attempts")]
    CannotPlaceBall { attempts: u32 },

    #[error("No entity at scene index {0}")]
    UnknownEntity(usize),

    #[error("Entity {index} is not a {expected}")]
    WrongEntityKind {
        index: usize,
        expected: &'static str,
    },

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Unsupported snapshot version: {0}")]
    UnsupportedVersion(u32),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

pub type Result<T> = std::result::Result<T, SimError>;

/// Reject NaN and infinities at the boundary
pub(crate) fn ensure_finite(value: f64, what: &'static str) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SimError::NonFinite { what })
    }
}
