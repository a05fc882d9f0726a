//! Error types for the Enigma analyzer.
//!
//! All errors are strongly typed using thiserror. Configuration problems are
//! always reported synchronously when settings or search configurations are
//! built, never silently corrected. Degenerate inputs (an empty corpus, an
//! empty ciphertext) are not errors: they produce neutral scores or empty
//! result lists.

use thiserror::Error;

use crate::catalog::{ReflectorId, RotorId};

/// Invalid machine settings or search configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Missing required field: {field}")]
    MissingField {
        field: &'static str,
    },

    #[error("Machine must have 3 or 4 rotors, got {count}")]
    RotorCount {
        count: usize,
    },

    #[error("Rotor {rotor} is used more than once")]
    DuplicateRotor {
        rotor: RotorId,
    },

    #[error("The leftmost rotor of a 4-rotor machine must be Beta or Gamma, got {found}")]
    StaticRotorRequired {
        found: RotorId,
    },

    #[error("Rotor {rotor} cannot be placed in slot {slot}")]
    StaticRotorMisplaced {
        rotor: RotorId,
        slot: usize,
    },

    #[error("Reflector {reflector} cannot be used with {rotor_count} rotors")]
    IncompatibleReflector {
        reflector: ReflectorId,
        rotor_count: usize,
    },

    #[error("Field '{field}' has {actual} entries, expected {expected}")]
    LengthMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("Field '{field}' value {value:?} is outside the alphabet A-Z")]
    OutOfRange {
        field: String,
        value: String,
    },

    #[error("Invalid plugboard: {reason}")]
    InvalidPlugboard {
        reason: String,
    },

    #[error("Unknown rotor '{name}'")]
    UnknownRotor {
        name: String,
    },

    #[error("Unknown reflector '{name}'")]
    UnknownReflector {
        name: String,
    },

    #[error("Machine model {model} does not allow this configuration: {reason}")]
    ModelRestriction {
        model: String,
        reason: String,
    },

    #[error("Rotor pool is empty")]
    EmptyRotorPool,

    #[error("Reflector pool is empty")]
    EmptyReflectorPool,

    #[error("Rotor pool has {available} eligible rotors, {needed} are needed")]
    PoolTooSmall {
        needed: usize,
        available: usize,
    },

    #[error("Invalid search parameter '{field}': {reason}")]
    InvalidSearchParameter {
        field: String,
        reason: String,
    },
}

/// Malformed input handed to the machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Character {ch:?} at index {index} is a letter outside the A-Z alphabet")]
    UnsupportedCharacter {
        ch: char,
        index: usize,
    },
}

/// Failures of the background attack runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Attack queue is full (capacity: {capacity})")]
    QueueFull {
        capacity: usize,
    },

    #[error("Attack worker disconnected")]
    Disconnected,

    #[error("Attack did not finish within {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },
}

/// Top-level error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnigmaError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl EnigmaError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Returns true if this is an input error.
    #[must_use]
    pub const fn is_input(&self) -> bool {
        matches!(self, Self::Input(_))
    }

    /// Returns true if this is an engine error.
    #[must_use]
    pub const fn is_engine(&self) -> bool {
        matches!(self, Self::Engine(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// Returns true if resubmitting the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Configuration(_) | Self::Input(_) | Self::Internal { .. } => false,
            Self::Engine(e) => matches!(e, EngineError::QueueFull { .. } | EngineError::Timeout { .. }),
        }
    }
}

/// Result type alias for analyzer operations.
pub type EnigmaResult<T> = Result<T, EnigmaError>;
