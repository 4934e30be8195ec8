use std::fmt;

use serde::{Deserialize, Serialize};
use sigdiff_types::{
    ClassDecl, ClassTypeDecl, ModuleTypeExpr, Signature, TypeDecl, TypeExpr, ValueDecl,
};

use crate::context::Env;
use crate::error::OracleResult;

/// Whether treating the provided declaration as the expected one needs a
/// runtime adaptation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coercion {
    /// The provided declaration can be used as is.
    Identity,
    /// Compatible, but only through a non-trivial coercion (reordered or
    /// dropped module components, a primitive wrapped as a closure, ...).
    Required,
}

impl Coercion {
    pub fn is_identity(self) -> bool {
        self == Self::Identity
    }

    /// Combine the coercions of two components of the same check.
    pub fn and(self, other: Self) -> Self {
        if self.is_identity() && other.is_identity() {
            Self::Identity
        } else {
            Self::Required
        }
    }
}

/// One reason a class (or class type) is not included in another.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassMismatch {
    ParameterArity { expected: usize, provided: usize },
    /// The provided class is virtual where a concrete one is expected.
    Virtual,
    MissingMethod(String),
    ExtraMethod(String),
    MethodType {
        name: String,
        expected: TypeExpr,
        provided: TypeExpr,
    },
    /// The provided method is private where a public one is expected.
    PrivateMethod(String),
    /// The provided method is virtual where a concrete one is expected.
    VirtualMethod(String),
}

impl fmt::Display for ClassMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParameterArity { expected, provided } => write!(
                f,
                "expected {expected} type parameters, found {provided}"
            ),
            Self::Virtual => f.write_str("class is virtual"),
            Self::MissingMethod(name) => write!(f, "method `{name}` is missing"),
            Self::ExtraMethod(name) => write!(f, "unexpected method `{name}`"),
            Self::MethodType {
                name,
                expected,
                provided,
            } => write!(
                f,
                "method `{name}` has type {provided} but {expected} was expected"
            ),
            Self::PrivateMethod(name) => write!(f, "method `{name}` is private"),
            Self::VirtualMethod(name) => write!(f, "method `{name}` is virtual"),
        }
    }
}

/// External type-compatibility checker.
///
/// Every method answers one directional question: can `provided` be used
/// where `expected` is expected? Paths inside `expected` resolve through
/// `env.expected`, paths inside `provided` through `env.provided`.
///
/// Implementations signal a negative answer either through their return value
/// or through [`OracleError::Incompatible`](crate::OracleError::Incompatible);
/// callers treat both the same way. Any other error is fatal for the whole
/// diff.
pub trait CompatibilityOracle {
    /// Value descriptions (`val` and `external`).
    fn values(
        &self,
        env: Env<'_>,
        expected: &ValueDecl,
        provided: &ValueDecl,
    ) -> OracleResult<Coercion>;

    /// Type declarations, including their representation.
    fn type_declarations(
        &self,
        env: Env<'_>,
        expected: &TypeDecl,
        provided: &TypeDecl,
    ) -> OracleResult<Coercion>;

    /// Structural match of the member types of one record or constructor,
    /// pair by pair, under a single variable scope.
    ///
    /// `params` holds the type parameters of the expected and provided
    /// declarations, which correspond position by position. A variable
    /// renaming established by one pair holds for the pairs after it.
    /// Returns one answer per pair.
    fn type_exprs(
        &self,
        env: Env<'_>,
        params: (&[String], &[String]),
        expected: &[TypeExpr],
        provided: &[TypeExpr],
    ) -> OracleResult<Vec<bool>>;

    /// Class inclusion. An empty list means the classes match.
    fn class_declarations(
        &self,
        env: Env<'_>,
        expected: &ClassDecl,
        provided: &ClassDecl,
    ) -> OracleResult<Vec<ClassMismatch>>;

    /// Class type inclusion. An empty list means the class types match.
    fn class_type_declarations(
        &self,
        env: Env<'_>,
        expected: &ClassTypeDecl,
        provided: &ClassTypeDecl,
    ) -> OracleResult<Vec<ClassMismatch>>;

    /// Whole-signature inclusion.
    fn signatures(
        &self,
        env: Env<'_>,
        expected: &Signature,
        provided: &Signature,
    ) -> OracleResult<Coercion>;

    /// Module type inclusion for arbitrary module type expressions.
    fn module_types(
        &self,
        env: Env<'_>,
        expected: &ModuleTypeExpr,
        provided: &ModuleTypeExpr,
    ) -> OracleResult<Coercion>;
}
