//! Error types for hifz-core.
//!
//! The engine operations themselves never fail; these errors only appear at
//! the edges, where keys are parsed or a collaborator is called.

use thiserror::Error;

use crate::model::UnitKey;

/// A unit or word key that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The key has no `:` separator.
    #[error("malformed key '{0}': expected 'surah:ayah' components")]
    MissingSeparator(String),

    /// A component is not a positive integer.
    #[error("malformed key '{key}': '{component}' is not a positive number")]
    InvalidComponent { key: String, component: String },
}

/// Failures reported by the scoring collaborator.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// The collaborator could not be reached or timed out.
    #[error("scoring for {unit} unavailable: {message}")]
    Unavailable { unit: UnitKey, message: String },

    /// The collaborator rejected the recitation (empty transcript, unknown unit).
    #[error("scoring for {unit} rejected: {message}")]
    Rejected { unit: UnitKey, message: String },
}

impl ScoringError {
    /// Unit the failed request was made for.
    pub fn unit(&self) -> UnitKey {
        match self {
            ScoringError::Unavailable { unit, .. } | ScoringError::Rejected { unit, .. } => *unit,
        }
    }

    /// Returns `true` if retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ScoringError::Unavailable { .. })
    }
}
