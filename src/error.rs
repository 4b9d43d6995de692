//! Error types for the key detector

use std::fmt;

/// Errors that can occur while configuring or driving a key detector
///
/// Once a detector has been constructed, the only failure left is a caller
/// handing `process` a block of the wrong length. "No key detected" is never
/// an error; it is the key index `0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// Unknown estimation method or unusable configuration value
    InvalidConfiguration(String),

    /// Input block does not match the size the detector asked for
    InvalidInput(String),
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyError::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
            KeyError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for KeyError {}
