//! Semantic interface diff engine.
//!
//! Given two versions of a module interface, the engine reports which items
//! were added, removed or modified. It pairs declarations by kind and name,
//! asks a [`CompatibilityOracle`](sigdiff_oracle::CompatibilityOracle) in
//! both directions whether a pair is equivalent, and decomposes changed
//! records, variants and nested signatures down to the member that changed.
//!
//! ```ignore
//! use sigdiff_engine::diff_interface;
//! use sigdiff_oracle::StructuralOracle;
//!
//! let oracle = StructuralOracle::default();
//! if let Some(change) = diff_interface(&oracle, "Foo", &before, &after)? {
//!     println!("{:?}", change.stats());
//! }
//! ```
//!
//! # Key Types
//!
//! - [`diff_interface`] / [`diff_library`] -- Entry points
//! - [`Diff`] / [`Modification`] -- Added, removed or modified item
//! - [`ItemDiff`] / [`SignatureModification`] -- Changed items of a signature
//! - [`TypeModification`] / [`ConstructorModification`] / [`TupleComponent`] -- Decomposed type changes
//! - [`DiffStats`] / [`Stats`] -- Change counts of a (sub)tree
//! - [`DiffError`] -- Fatal oracle failures and malformed declarations

mod adapter;
mod class;
pub mod driver;
pub mod error;
pub mod index;
pub mod merge;
mod module;
#[cfg(test)]
mod testing;
pub mod tree;
mod type_decl;
mod value;

pub use driver::{diff_interface, diff_library, LibraryDiff};
pub use error::{DiffError, DiffResult};
pub use index::{NameIndex, SignatureIndex};
pub use tree::{
    ClassDiff, ClassTypeDiff, ConstructorDiff, ConstructorModification, Diff, DiffStats,
    FieldDiff, ItemDiff, Modification, ModuleDiff, ModuleTypeDiff, SignatureModification, Stats,
    TupleComponent, TypeDiff, TypeModification, ValueDiff,
};
