//! Test oracle with scripted answers.

use std::cell::RefCell;
use std::collections::VecDeque;

use sigdiff_oracle::{
    ClassMismatch, Coercion, CompatibilityOracle, Env, OracleResult, StructuralOracle,
};
use sigdiff_types::{
    ClassDecl, ClassTypeDecl, ModuleTypeExpr, Signature, TypeDecl, TypeExpr, ValueDecl,
};

type Script<T = Coercion> = RefCell<VecDeque<OracleResult<T>>>;

/// Answers from queued outcomes, in call order, and falls back to the
/// structural oracle once a queue is drained.
#[derive(Default)]
pub(crate) struct ScriptedOracle {
    inner: StructuralOracle,
    values: Script,
    type_declarations: Script,
    type_exprs: Script<Vec<bool>>,
    signatures: Script,
    module_types: Script,
}

impl ScriptedOracle {
    pub fn with_values(self, outcomes: impl IntoIterator<Item = OracleResult<Coercion>>) -> Self {
        self.values.borrow_mut().extend(outcomes);
        self
    }

    pub fn with_type_declarations(
        self,
        outcomes: impl IntoIterator<Item = OracleResult<Coercion>>,
    ) -> Self {
        self.type_declarations.borrow_mut().extend(outcomes);
        self
    }

    pub fn with_type_exprs(
        self,
        outcomes: impl IntoIterator<Item = OracleResult<Vec<bool>>>,
    ) -> Self {
        self.type_exprs.borrow_mut().extend(outcomes);
        self
    }

    pub fn with_signatures(
        self,
        outcomes: impl IntoIterator<Item = OracleResult<Coercion>>,
    ) -> Self {
        self.signatures.borrow_mut().extend(outcomes);
        self
    }

    pub fn with_module_types(
        self,
        outcomes: impl IntoIterator<Item = OracleResult<Coercion>>,
    ) -> Self {
        self.module_types.borrow_mut().extend(outcomes);
        self
    }
}

fn next<T>(script: &Script<T>) -> Option<OracleResult<T>> {
    script.borrow_mut().pop_front()
}

impl CompatibilityOracle for ScriptedOracle {
    fn values(&self, env: Env<'_>, expected: &ValueDecl, provided: &ValueDecl) -> OracleResult<Coercion> {
        next(&self.values).unwrap_or_else(|| self.inner.values(env, expected, provided))
    }

    fn type_declarations(
        &self,
        env: Env<'_>,
        expected: &TypeDecl,
        provided: &TypeDecl,
    ) -> OracleResult<Coercion> {
        next(&self.type_declarations)
            .unwrap_or_else(|| self.inner.type_declarations(env, expected, provided))
    }

    fn type_exprs(
        &self,
        env: Env<'_>,
        params: (&[String], &[String]),
        expected: &[TypeExpr],
        provided: &[TypeExpr],
    ) -> OracleResult<Vec<bool>> {
        next(&self.type_exprs)
            .unwrap_or_else(|| self.inner.type_exprs(env, params, expected, provided))
    }

    fn class_declarations(
        &self,
        env: Env<'_>,
        expected: &ClassDecl,
        provided: &ClassDecl,
    ) -> OracleResult<Vec<ClassMismatch>> {
        self.inner.class_declarations(env, expected, provided)
    }

    fn class_type_declarations(
        &self,
        env: Env<'_>,
        expected: &ClassTypeDecl,
        provided: &ClassTypeDecl,
    ) -> OracleResult<Vec<ClassMismatch>> {
        self.inner.class_type_declarations(env, expected, provided)
    }

    fn signatures(&self, env: Env<'_>, expected: &Signature, provided: &Signature) -> OracleResult<Coercion> {
        next(&self.signatures).unwrap_or_else(|| self.inner.signatures(env, expected, provided))
    }

    fn module_types(
        &self,
        env: Env<'_>,
        expected: &ModuleTypeExpr,
        provided: &ModuleTypeExpr,
    ) -> OracleResult<Coercion> {
        next(&self.module_types).unwrap_or_else(|| self.inner.module_types(env, expected, provided))
    }
}
