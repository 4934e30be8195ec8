use serde::{Deserialize, Serialize};

/// Configuration for the [`StructuralOracle`](crate::StructuralOracle).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Expand type abbreviations through the typing context before comparing.
    /// When `false`, type constructors are compared by path only.
    pub expand_abbreviations: bool,
    /// Maximum number of abbreviation or module type expansions performed by a
    /// single check. Exceeding it is reported as a cyclic abbreviation.
    pub max_expansion_depth: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            expand_abbreviations: true,
            max_expansion_depth: 64,
        }
    }
}

impl OracleConfig {
    /// A configuration that compares type constructors nominally.
    pub fn nominal() -> Self {
        Self {
            expand_abbreviations: false,
            ..Default::default()
        }
    }
}
