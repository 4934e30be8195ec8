//! Error types for the engine crate.

use sigdiff_oracle::OracleError;
use sigdiff_types::ItemKind;

/// Errors that abort a diff computation.
///
/// Incompatibility reported by the oracle is not an error: it becomes a
/// `Modified` entry in the diff tree. Only fatal conditions end up here, and
/// no partial tree is returned alongside them.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// The oracle failed for a reason other than incompatibility.
    #[error("compatibility check of {kind} `{name}` failed: {source}")]
    Oracle {
        kind: ItemKind,
        name: String,
        #[source]
        source: OracleError,
    },

    /// Two fields or constructors of one declaration share a name.
    #[error("duplicate {kind} `{name}` in `{owner}`")]
    DuplicateName {
        kind: ItemKind,
        name: String,
        owner: String,
    },
}

impl DiffError {
    pub(crate) fn oracle(kind: ItemKind, name: &str, source: OracleError) -> Self {
        Self::Oracle {
            kind,
            name: name.to_string(),
            source,
        }
    }
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
