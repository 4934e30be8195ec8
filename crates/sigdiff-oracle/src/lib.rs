//! Compatibility oracle for sigdiff.
//!
//! The diff engine never decides on its own whether two declarations are
//! compatible: it asks a [`CompatibilityOracle`]. This crate defines that
//! seam, the [`TypingContext`] every check runs in, and a built-in
//! [`StructuralOracle`] for snapshots that carry full type information.
//!
//! # Key Types
//!
//! - [`CompatibilityOracle`] -- Directional inclusion checks per declaration kind
//! - [`Coercion`] / [`ClassMismatch`] -- Positive and negative check outcomes
//! - [`OracleError`] -- `Incompatible` signal plus fatal input errors
//! - [`TypingContext`] / [`Env`] / [`Direction`] -- Per-diff scopes of both snapshots
//! - [`StructuralOracle`] / [`OracleConfig`] -- Built-in checker and its settings

pub mod config;
pub mod context;
pub mod error;
pub mod structural;
pub mod traits;

pub use config::OracleConfig;
pub use context::{Direction, Env, Frame, Scope, ScopedType, TypingContext};
pub use error::{OracleError, OracleResult};
pub use structural::StructuralOracle;
pub use traits::{ClassMismatch, Coercion, CompatibilityOracle};
