//! Error types for state values supplied from outside the crate

use thiserror::Error;

/// Errors raised when parsing externally supplied state identifiers
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StateError {
    /// A deposed key was not 8 lowercase hexadecimal digits
    #[error("Invalid deposed key {key:?}: expected 8 lowercase hexadecimal digits")]
    InvalidDeposedKey { key: String },

    /// An instance key was neither empty, `[<int>]` nor `["<string>"]`
    #[error("Invalid instance key {key:?}")]
    InvalidInstanceKey { key: String },
}

impl StateError {
    pub fn invalid_deposed_key(key: impl Into<String>) -> Self {
        Self::InvalidDeposedKey { key: key.into() }
    }

    pub fn invalid_instance_key(key: impl Into<String>) -> Self {
        Self::InvalidInstanceKey { key: key.into() }
    }
}
