//! Error types for the dramatis core library.

use thiserror::Error;

/// Top-level error type for all dramatis operations.
#[derive(Error, Debug)]
pub enum DramatisError {
    /// A character name was empty or already present in the registry.
    #[error("Character name is required and must be unique: {0:?}")]
    DuplicateName(String),

    /// No character with the given name exists.
    #[error("Character not found: {0:?}")]
    NotFound(String),

    /// Trait weight outside 1..=10, or an empty trait name.
    #[error("Invalid trait {name:?}: weight {weight} (expected a non-empty name and a weight in 1..=10)")]
    InvalidWeight {
        /// Trait name as supplied (after trimming).
        name: String,
        /// Weight as supplied.
        weight: i64,
    },

    /// A relationship was declared without a target name.
    #[error("Relationship target must not be empty")]
    EmptyTarget,

    /// A trait or relationship index does not exist.
    #[error("Index {index} out of range for {collection} (len: {len})")]
    IndexOutOfRange {
        /// Which list was addressed.
        collection: &'static str,
        /// Requested index.
        index: usize,
        /// Current list length.
        len: usize,
    },

    /// A per-character summary was requested for a character with no traits.
    #[error("Character {0:?} has no personality traits")]
    EmptyTraits(String),

    /// Too few characters were supplied for a comparison.
    #[error("Insufficient data: {required} characters required, {supplied} supplied")]
    InsufficientData {
        /// Minimum number of characters required.
        required: usize,
        /// Number actually supplied.
        supplied: usize,
    },

    /// Snapshot load or save failure.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DramatisError {
    /// Whether this error is an input-validation failure the caller should
    /// show to the user for correction.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::DuplicateName(_)
                | Self::NotFound(_)
                | Self::InvalidWeight { .. }
                | Self::EmptyTarget
                | Self::IndexOutOfRange { .. }
        )
    }

    /// Whether this error signals missing data rather than a fault.
    #[must_use]
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::EmptyTraits(_) | Self::InsufficientData { .. })
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, DramatisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_classified() {
        assert!(DramatisError::EmptyTarget.is_validation());
        assert!(DramatisError::DuplicateName("Alice".into()).is_validation());
        assert!(!DramatisError::Persistence("disk full".into()).is_validation());
    }

    #[test]
    fn insufficient_data_is_not_validation() {
        let err = DramatisError::InsufficientData {
            required: 2,
            supplied: 1,
        };
        assert!(err.is_insufficient_data());
        assert!(!err.is_validation());
        assert_eq!(
            err.to_string(),
            "Insufficient data: 2 characters required, 1 supplied"
        );
    }
}
