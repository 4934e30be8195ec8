//! Value differ.

use sigdiff_types::{ItemKind, ValueDecl};

use crate::adapter::Cx;
use crate::error::DiffResult;
use crate::merge::compare;
use crate::tree::{Modification, ValueDiff};

/// Compare the value `name` of both snapshots.
///
/// A value that exists on both sides is modified unless the oracle accepts
/// each one in place of the other without a coercion, so turning a `val`
/// into an `external` counts as a change.
pub(crate) fn diff_value(
    cx: &Cx<'_>,
    name: &str,
    reference: Option<&ValueDecl>,
    current: Option<&ValueDecl>,
) -> DiffResult<Option<ValueDiff>> {
    let diff = compare(reference, current, |r, c| {
        let verdict = cx.bidirectional(ItemKind::Value, &cx.qualify(name), r, c, |o, env, e, p| {
            o.values(env, e, p)
        })?;
        Ok(verdict.is_changed().then(|| Modification::of(r, c)))
    })?;
    Ok(diff.map(|diff| ValueDiff {
        name: name.to_string(),
        diff,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiffError;
    use crate::testing::ScriptedOracle;
    use crate::tree::Diff;
    use sigdiff_oracle::{Coercion, OracleError, TypingContext};
    use sigdiff_types::{Signature, TypeExpr};

    fn run(
        oracle: &ScriptedOracle,
        reference: Option<&ValueDecl>,
        current: Option<&ValueDecl>,
    ) -> DiffResult<Option<ValueDiff>> {
        let typing = TypingContext::new(&Signature::empty(), &Signature::empty());
        let cx = Cx::new(oracle, &typing, "M");
        diff_value(&cx, "f", reference, current)
    }

    fn f(ty: TypeExpr) -> ValueDecl {
        ValueDecl::new("f", ty)
    }

    #[test]
    fn identical_value_has_no_entry() {
        let v = f(TypeExpr::arrow(TypeExpr::constr("int"), TypeExpr::constr("int")));
        assert_eq!(run(&ScriptedOracle::default(), Some(&v), Some(&v)).unwrap(), None);
    }

    #[test]
    fn renamed_type_variables_are_unchanged() {
        let r = f(TypeExpr::arrow(TypeExpr::var("a"), TypeExpr::var("a")));
        let c = f(TypeExpr::arrow(TypeExpr::var("b"), TypeExpr::var("b")));
        assert_eq!(run(&ScriptedOracle::default(), Some(&r), Some(&c)).unwrap(), None);
    }

    #[test]
    fn generalized_value_is_modified() {
        // 'a -> 'a is accepted where int -> int is expected, but not conversely.
        let r = f(TypeExpr::arrow(TypeExpr::constr("int"), TypeExpr::constr("int")));
        let c = f(TypeExpr::arrow(TypeExpr::var("a"), TypeExpr::var("a")));
        let diff = run(&ScriptedOracle::default(), Some(&r), Some(&c)).unwrap().unwrap();
        assert_eq!(diff.name, "f");
        assert_eq!(diff.diff, Diff::Modified(Modification::of(&r, &c)));
    }

    #[test]
    fn changed_type_is_modified() {
        let r = f(TypeExpr::constr("int"));
        let c = f(TypeExpr::constr("string"));
        let diff = run(&ScriptedOracle::default(), Some(&r), Some(&c)).unwrap().unwrap();
        assert!(diff.diff.is_modified());
    }

    #[test]
    fn val_to_external_is_modified() {
        let r = f(TypeExpr::constr("int"));
        let c = f(TypeExpr::constr("int")).external("caml_f");
        let diff = run(&ScriptedOracle::default(), Some(&r), Some(&c)).unwrap().unwrap();
        assert!(diff.diff.is_modified());
    }

    #[test]
    fn added_and_removed() {
        let v = f(TypeExpr::constr("int"));
        let oracle = ScriptedOracle::default();
        assert_eq!(
            run(&oracle, None, Some(&v)).unwrap().unwrap().diff,
            Diff::Added(v.clone())
        );
        assert_eq!(
            run(&oracle, Some(&v), None).unwrap().unwrap().diff,
            Diff::Removed(v.clone())
        );
    }

    #[test]
    fn asymmetric_oracle_answer_is_modified() {
        let v = f(TypeExpr::constr("int"));
        let oracle = ScriptedOracle::default()
            .with_values([Ok(Coercion::Identity), Ok(Coercion::Required)]);
        assert!(run(&oracle, Some(&v), Some(&v)).unwrap().is_some());
    }

    #[test]
    fn fatal_oracle_error_carries_path() {
        let v = f(TypeExpr::constr("int"));
        let oracle = ScriptedOracle::default()
            .with_values([Err(OracleError::Malformed("broken".into()))]);
        let err = run(&oracle, Some(&v), Some(&v)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "compatibility check of value `M.f` failed: malformed declaration: broken"
        );
        assert!(matches!(err, DiffError::Oracle { .. }));
    }
}
