//! Declaration model for sigdiff.
//!
//! These types describe the *input* of an interface diff: ordered signatures
//! of typed declarations as produced by a parser or typechecker. They carry
//! no behaviour beyond construction helpers; comparing them is the job of
//! `sigdiff-oracle` and `sigdiff-engine`.
//!
//! # Key Types
//!
//! - [`Signature`] / [`SigItem`] -- Ordered list of declarations with export status
//! - [`Decl`] -- Value, type, module, module type, class or class type declaration
//! - [`TypeExpr`] -- Type expressions referenced by declarations
//! - [`ModuleTypeExpr`] -- Signatures, named module types, aliases and functors
//! - [`Library`] -- Module name to signature map for whole-library snapshots

pub mod decl;
pub mod location;
pub mod signature;
pub mod type_expr;

pub use decl::{
    ClassDecl, ClassTypeDecl, ConstructorArgs, ConstructorDecl, Decl, FieldDecl, FunctorParam,
    ItemKind, MethodDecl, ModuleDecl, ModuleTypeDecl, ModuleTypeExpr, TypeDecl, TypeKind,
    ValueDecl,
};
pub use location::Location;
pub use signature::{Library, SigItem, Signature, Visibility};
pub use type_expr::{Label, TypeExpr};
