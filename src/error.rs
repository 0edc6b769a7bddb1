//! Error types for world construction and persistence.

use core::fmt;

/// Errors that can occur while building or restoring a world.
///
/// Degenerate geometry is not represented here: a zero-length member or a
/// mass that leaves the playfield is removed by policy, not reported.
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// A mass or member kind tag did not name any known material.
    UnknownMaterialKind { tag: String },
    /// Entity parameters are missing or out of range.
    Configuration { reason: String },
    /// A snapshot could not be decoded or references masses it does not contain.
    CorruptSnapshot { reason: String },
    /// Mass must be positive and finite.
    InvalidMass,
    /// A handle does not refer to a live mass.
    MassNotFound,
    /// The remaining budget does not cover a purchase.
    InsufficientBudget { required: f64, available: f64 },
}

impl PhysicsError {
    pub(crate) fn configuration(reason: impl Into<String>) -> Self {
        PhysicsError::Configuration { reason: reason.into() }
    }

    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        PhysicsError::CorruptSnapshot { reason: reason.into() }
    }
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicsError::UnknownMaterialKind { tag } => write!(f, "unknown material kind '{}'", tag),
            PhysicsError::Configuration { reason } => write!(f, "invalid configuration: {}", reason),
            PhysicsError::CorruptSnapshot { reason } => write!(f, "corrupt snapshot: {}", reason),
            PhysicsError::InvalidMass => write!(f, "mass must be positive and finite"),
            PhysicsError::MassNotFound => write!(f, "mass handle does not refer to a live mass"),
            PhysicsError::InsufficientBudget { required, available } => {
                write!(f, "insufficient budget: {} required, {} available", required, available)
            }
        }
    }
}

impl std::error::Error for PhysicsError {}
