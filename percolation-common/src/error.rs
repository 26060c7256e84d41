//! Error types shared by the engine and the visualizer.

use std::fmt;

/// Errors raised by parameter validation, the random source and ensemble bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// A simulation parameter is out of its valid range.
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// Human-readable description of the constraint that was violated.
        reason: String,
    },
    /// The operating system random source could not seed a generator.
    RandomSource(String),
    /// A trajectory length disagrees with the rest of the ensemble.
    ShapeMismatch {
        /// Length every trajectory in the ensemble must have.
        expected: usize,
        /// Length of the rejected trajectory.
        found: usize,
    },
    /// An aggregate was requested before any run was recorded.
    EmptyEnsemble,
}

impl SimError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter { name, reason } => {
                write!(f, "invalid parameter `{name}`: {reason}")
            }
            Self::RandomSource(msg) => write!(f, "random source failure: {msg}"),
            Self::ShapeMismatch { expected, found } => write!(
                f,
                "trajectory length {found} does not match ensemble length {expected}"
            ),
            Self::EmptyEnsemble => write!(f, "ensemble contains no runs"),
        }
    }
}

impl std::error::Error for SimError {}
