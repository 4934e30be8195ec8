//! Error types for the oracle crate.

/// Outcome of a compatibility check that did not produce a coercion.
///
/// [`OracleError::Incompatible`] is the expected "these declarations do not
/// match" signal and is absorbed by callers. Every other variant means the
/// input itself is unusable and must be propagated.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// The provided declaration cannot stand in for the expected one.
    #[error("incompatible: {0}")]
    Incompatible(String),

    /// Expanding a type abbreviation did not terminate.
    #[error("cyclic type abbreviation through `{0}`")]
    CyclicAbbreviation(String),

    /// A declaration violates a well-formedness precondition.
    #[error("malformed declaration: {0}")]
    Malformed(String),
}

impl OracleError {
    /// Create an incompatibility signal with a human readable reason.
    pub fn incompatible(reason: impl Into<String>) -> Self {
        Self::Incompatible(reason.into())
    }

    /// Returns `true` for the recoverable "incompatible" signal.
    pub fn is_incompatible(&self) -> bool {
        matches!(self, Self::Incompatible(_))
    }
}

/// Convenience alias for oracle results.
pub type OracleResult<T> = Result<T, OracleError>;
