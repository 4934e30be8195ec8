//! Oracle adapter: turns directional oracle answers into "same or changed".

use sigdiff_oracle::{
    context, ClassMismatch, Coercion, CompatibilityOracle, Direction, Env, OracleError,
    OracleResult, TypingContext,
};
use sigdiff_types::{ItemKind, TypeExpr};
use tracing::debug;

use crate::error::{DiffError, DiffResult};

/// Outcome of comparing two declarations that exist on both sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Verdict {
    Unchanged,
    Changed,
}

impl Verdict {
    pub fn is_changed(self) -> bool {
        self == Self::Changed
    }
}

/// Everything an entity differ needs: the oracle, the typing context of the
/// current interface diff, and the module path being compared.
pub(crate) struct Cx<'a> {
    oracle: &'a dyn CompatibilityOracle,
    typing: &'a TypingContext,
    root: &'a str,
    prefix: Vec<String>,
}

impl<'a> Cx<'a> {
    pub fn new(oracle: &'a dyn CompatibilityOracle, typing: &'a TypingContext, root: &'a str) -> Self {
        Self {
            oracle,
            typing,
            root,
            prefix: Vec::new(),
        }
    }

    /// The context for the items of submodule (or module type) `name`.
    pub fn enter(&self, name: &str) -> Self {
        Self {
            oracle: self.oracle,
            typing: self.typing,
            root: self.root,
            prefix: context::enter(&self.prefix, name),
        }
    }

    /// Dotted path of the module being compared, for diagnostics.
    pub fn module_path(&self) -> String {
        std::iter::once(self.root)
            .chain(self.prefix.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Dotted path of item `name` of the module being compared.
    pub fn qualify(&self, name: &str) -> String {
        format!("{}.{}", self.module_path(), name)
    }

    fn env(&self, direction: Direction) -> Env<'_> {
        self.typing.env(direction, &self.prefix)
    }

    /// Ask the oracle in both directions.
    ///
    /// The pair is unchanged only when both directions answer
    /// [`Coercion::Identity`]. Both directions are always evaluated so that a
    /// fatal error in either one surfaces.
    pub fn bidirectional<T, F>(
        &self,
        kind: ItemKind,
        subject: &str,
        reference: &T,
        current: &T,
        check: F,
    ) -> DiffResult<Verdict>
    where
        T: ?Sized,
        F: Fn(&dyn CompatibilityOracle, Env<'_>, &T, &T) -> OracleResult<Coercion>,
    {
        let forward = check(self.oracle, self.env(Direction::Forward), reference, current);
        let backward = check(self.oracle, self.env(Direction::Backward), current, reference);
        let forward = self.absorb(kind, subject, forward)?;
        let backward = self.absorb(kind, subject, backward)?;
        Ok(if forward.is_identity() && backward.is_identity() {
            Verdict::Unchanged
        } else {
            Verdict::Changed
        })
    }

    /// Structural match of the member types of one record or constructor,
    /// reference as expected. Returns one answer per pair.
    ///
    /// `params` are the type parameters of the reference and current
    /// declarations. An incompatibility signal marks every pair as changed.
    pub fn type_exprs<'t, I>(
        &self,
        kind: ItemKind,
        subject: &str,
        params: (&[String], &[String]),
        pairs: I,
    ) -> DiffResult<Vec<bool>>
    where
        I: IntoIterator<Item = (&'t TypeExpr, &'t TypeExpr)>,
    {
        let (reference, current): (Vec<TypeExpr>, Vec<TypeExpr>) = pairs
            .into_iter()
            .map(|(r, c)| (r.clone(), c.clone()))
            .unzip();
        let env = self.env(Direction::Forward);
        match self.oracle.type_exprs(env, params, &reference, &current) {
            Ok(matched) if matched.len() == reference.len() => Ok(matched),
            Ok(matched) => Err(DiffError::oracle(
                kind,
                subject,
                OracleError::Malformed(format!(
                    "{} answer(s) for {} type pair(s)",
                    matched.len(),
                    reference.len()
                )),
            )),
            Err(OracleError::Incompatible(reason)) => {
                debug!(%kind, subject, %reason, "type expressions incompatible");
                Ok(vec![false; reference.len()])
            }
            Err(e) => Err(DiffError::oracle(kind, subject, e)),
        }
    }

    /// Class (or class type) inclusion of the current side in the reference.
    pub fn class_inclusion<T, F>(
        &self,
        kind: ItemKind,
        subject: &str,
        reference: &T,
        current: &T,
        check: F,
    ) -> DiffResult<Verdict>
    where
        F: Fn(&dyn CompatibilityOracle, Env<'_>, &T, &T) -> OracleResult<Vec<ClassMismatch>>,
    {
        match check(self.oracle, self.env(Direction::Forward), reference, current) {
            Ok(mismatches) if mismatches.is_empty() => Ok(Verdict::Unchanged),
            Ok(mismatches) => {
                debug!(
                    %kind,
                    subject,
                    first = %mismatches[0],
                    count = mismatches.len(),
                    "class mismatch"
                );
                Ok(Verdict::Changed)
            }
            Err(OracleError::Incompatible(reason)) => {
                debug!(%kind, subject, %reason, "class incompatible");
                Ok(Verdict::Changed)
            }
            Err(e) => Err(DiffError::oracle(kind, subject, e)),
        }
    }

    /// Map an oracle answer to a coercion, turning the incompatibility signal
    /// into [`Coercion::Required`] and keeping every other error fatal.
    fn absorb(
        &self,
        kind: ItemKind,
        subject: &str,
        outcome: OracleResult<Coercion>,
    ) -> DiffResult<Coercion> {
        match outcome {
            Ok(coercion) => Ok(coercion),
            Err(OracleError::Incompatible(reason)) => {
                debug!(%kind, subject, %reason, "incompatibility absorbed");
                Ok(Coercion::Required)
            }
            Err(e) => Err(DiffError::oracle(kind, subject, e)),
        }
    }
}
