//! Signature, module and module type differs.

use sigdiff_types::{ItemKind, ModuleDecl, ModuleTypeDecl, ModuleTypeExpr, Signature};
use tracing::debug;

use crate::adapter::{Cx, Verdict};
use crate::class::{diff_class, diff_class_type};
use crate::error::DiffResult;
use crate::index::SignatureIndex;
use crate::merge::{compare, merge};
use crate::tree::{ItemDiff, ModuleDiff, ModuleTypeDiff, SignatureModification};
use crate::type_decl::diff_type;
use crate::value::diff_value;

/// Compare two signatures of the module `cx` is positioned in.
///
/// Item changes are reported as [`SignatureModification::Supported`]. When no
/// item changed, the signatures as a whole are still checked: a difference
/// that only shows up there (reordered runtime components, say) becomes
/// [`SignatureModification::Unsupported`].
pub(crate) fn diff_signature(
    cx: &Cx<'_>,
    kind: ItemKind,
    reference: &Signature,
    current: &Signature,
) -> DiffResult<Option<SignatureModification>> {
    let items = diff_items(cx, reference, current)?;
    if !items.is_empty() {
        return Ok(Some(SignatureModification::Supported(items)));
    }

    let path = cx.module_path();
    let verdict = cx.bidirectional(kind, &path, reference, current, |o, env, e, p| {
        o.signatures(env, e, p)
    })?;
    Ok(unsupported_if_changed(&path, verdict))
}

fn diff_items(cx: &Cx<'_>, reference: &Signature, current: &Signature) -> DiffResult<Vec<ItemDiff>> {
    let r = SignatureIndex::build(reference);
    let c = SignatureIndex::build(current);

    let mut items = Vec::new();
    items.extend(
        merge(&r.values, &c.values, |n, r, c| diff_value(cx, n, r, c))?
            .into_iter()
            .map(ItemDiff::Value),
    );
    items.extend(
        merge(&r.modules, &c.modules, |n, r, c| diff_module(cx, n, r, c))?
            .into_iter()
            .map(ItemDiff::Module),
    );
    items.extend(
        merge(&r.types, &c.types, |n, r, c| diff_type(cx, n, r, c))?
            .into_iter()
            .map(ItemDiff::Type),
    );
    items.extend(
        merge(&r.module_types, &c.module_types, |n, r, c| {
            diff_module_type(cx, n, r, c)
        })?
        .into_iter()
        .map(ItemDiff::ModuleType),
    );
    items.extend(
        merge(&r.classes, &c.classes, |n, r, c| diff_class(cx, n, r, c))?
            .into_iter()
            .map(ItemDiff::Class),
    );
    items.extend(
        merge(&r.class_types, &c.class_types, |n, r, c| {
            diff_class_type(cx, n, r, c)
        })?
        .into_iter()
        .map(ItemDiff::ClassType),
    );

    items.sort_by(|a, b| a.name().cmp(b.name()).then(a.kind().cmp(&b.kind())));
    Ok(items)
}

pub(crate) fn diff_module(
    cx: &Cx<'_>,
    name: &str,
    reference: Option<&ModuleDecl>,
    current: Option<&ModuleDecl>,
) -> DiffResult<Option<ModuleDiff>> {
    let diff = compare(reference, current, |r, c| {
        diff_module_type_expr(&cx.enter(name), ItemKind::Module, &r.ty, &c.ty)
    })?;
    Ok(diff.map(|diff| ModuleDiff {
        name: name.to_string(),
        diff,
    }))
}

/// Compare two module type declarations.
///
/// Two abstract module types are equal. An abstract one against a concrete
/// one cannot be expressed item by item.
pub(crate) fn diff_module_type(
    cx: &Cx<'_>,
    name: &str,
    reference: Option<&ModuleTypeDecl>,
    current: Option<&ModuleTypeDecl>,
) -> DiffResult<Option<ModuleTypeDiff>> {
    let diff = compare(reference, current, |r, c| {
        match (&r.definition, &c.definition) {
            (None, None) => Ok(None),
            (Some(r), Some(c)) => {
                diff_module_type_expr(&cx.enter(name), ItemKind::ModuleType, r, c)
            }
            (Some(_), None) | (None, Some(_)) => {
                debug!(module_type = %cx.qualify(name), "abstract against concrete module type");
                Ok(Some(SignatureModification::Unsupported))
            }
        }
    })?;
    Ok(diff.map(|diff| ModuleTypeDiff {
        name: name.to_string(),
        diff,
    }))
}

/// Compare two module types; `cx` is already positioned inside the item.
///
/// Only two explicit signatures are compared item by item. Functors, named
/// module types and aliases go through the oracle as a whole.
fn diff_module_type_expr(
    cx: &Cx<'_>,
    kind: ItemKind,
    reference: &ModuleTypeExpr,
    current: &ModuleTypeExpr,
) -> DiffResult<Option<SignatureModification>> {
    if let (ModuleTypeExpr::Signature(r), ModuleTypeExpr::Signature(c)) = (reference, current) {
        return diff_signature(cx, kind, r, c);
    }

    let path = cx.module_path();
    let verdict = cx.bidirectional(kind, &path, reference, current, |o, env, e, p| {
        o.module_types(env, e, p)
    })?;
    Ok(unsupported_if_changed(&path, verdict))
}

fn unsupported_if_changed(path: &str, verdict: Verdict) -> Option<SignatureModification> {
    match verdict {
        Verdict::Unchanged => None,
        Verdict::Changed => {
            debug!(module = path, "change not expressible item by item");
            Some(SignatureModification::Unsupported)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiffError;
    use crate::testing::ScriptedOracle;
    use crate::tree::Diff;
    use sigdiff_oracle::{Coercion, OracleError, TypingContext};
    use sigdiff_types::{
        ClassDecl, ClassTypeDecl, Decl, FunctorParam, MethodDecl, SigItem, TypeDecl, TypeExpr,
        ValueDecl,
    };

    fn int() -> TypeExpr {
        TypeExpr::constr("int")
    }

    fn run_with(
        oracle: &ScriptedOracle,
        reference: &Signature,
        current: &Signature,
    ) -> DiffResult<Option<SignatureModification>> {
        let typing = TypingContext::new(reference, current);
        let cx = Cx::new(oracle, &typing, "Top");
        diff_signature(&cx, ItemKind::Module, reference, current)
    }

    fn run(reference: &Signature, current: &Signature) -> Option<SignatureModification> {
        run_with(&ScriptedOracle::default(), reference, current).unwrap()
    }

    fn supported(modification: Option<SignatureModification>) -> Vec<ItemDiff> {
        let modification = modification.expect("expected a change");
        assert!(modification.is_supported(), "expected item changes");
        modification.items().to_vec()
    }

    fn functor(param: &str, result: Signature) -> ModuleTypeExpr {
        ModuleTypeExpr::functor(
            FunctorParam::new("X", ModuleTypeExpr::Ident(param.into())),
            ModuleTypeExpr::Signature(result),
        )
    }

    #[test]
    fn identical_signatures_have_no_entry() {
        let sig = Signature::exported(vec![
            Decl::from(ValueDecl::new("x", int())),
            Decl::from(TypeDecl::alias("t", int())),
        ]);
        assert_eq!(run(&sig, &sig), None);
    }

    #[test]
    fn only_changed_items_are_reported() {
        let reference = Signature::exported(vec![
            ValueDecl::new("kept", int()),
            ValueDecl::new("changed", int()),
            ValueDecl::new("gone", int()),
        ]);
        let current = Signature::exported(vec![
            ValueDecl::new("kept", int()),
            ValueDecl::new("changed", TypeExpr::constr("string")),
            ValueDecl::new("fresh", int()),
        ]);

        let items = supported(run(&reference, &current));
        let summary: Vec<_> = items
            .iter()
            .map(|i| {
                let ItemDiff::Value(v) = i else {
                    panic!("expected values only");
                };
                (v.name.as_str(), v.diff.is_added(), v.diff.is_removed())
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                ("changed", false, false),
                ("fresh", true, false),
                ("gone", false, true),
            ]
        );
    }

    #[test]
    fn same_name_items_sort_by_kind() {
        let reference = Signature::empty();
        let current = Signature::exported(vec![
            Decl::from(TypeDecl::abstract_("t")),
            Decl::from(ValueDecl::new("t", int())),
            Decl::from(ModuleDecl::signature("t", Signature::empty())),
        ]);
        let kinds: Vec<_> = supported(run(&reference, &current))
            .iter()
            .map(ItemDiff::kind)
            .collect();
        assert_eq!(kinds, vec![ItemKind::Value, ItemKind::Module, ItemKind::Type]);
    }

    #[test]
    fn hidden_items_are_ignored() {
        let reference = Signature::new(vec![SigItem::hidden(ValueDecl::new("internal", int()))]);
        let current = Signature::empty();
        assert_eq!(run(&reference, &current), None);
    }

    #[test]
    fn class_shadows_its_object_type() {
        let class = |ty: &str| ClassDecl::new("c", vec![MethodDecl::new("m", TypeExpr::constr(ty))]);
        let class_type =
            |ty: &str| ClassTypeDecl::new("c", vec![MethodDecl::new("m", TypeExpr::constr(ty))]);
        let reference = Signature::exported(vec![
            Decl::from(class("int")),
            Decl::from(class_type("int")),
            Decl::from(TypeDecl::abstract_("c")),
        ]);
        let current = Signature::exported(vec![
            Decl::from(class("string")),
            Decl::from(class_type("string")),
            Decl::from(TypeDecl::alias("c", int())),
        ]);

        let items = supported(run(&reference, &current));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind(), ItemKind::Class);
        assert_eq!(items[0].name(), "c");
    }

    #[test]
    fn nested_module_changes_are_itemized() {
        let inner = |ty: &str| {
            Signature::exported(vec![
                ValueDecl::new("f", TypeExpr::constr(ty)),
                ValueDecl::new("g", int()),
            ])
        };
        let reference = Signature::exported(vec![ModuleDecl::signature("Sub", inner("int"))]);
        let current = Signature::exported(vec![ModuleDecl::signature("Sub", inner("float"))]);

        let items = supported(run(&reference, &current));
        let ItemDiff::Module(module) = &items[0] else {
            panic!("expected a module entry");
        };
        assert_eq!(module.name, "Sub");
        let Diff::Modified(SignatureModification::Supported(inner_items)) = &module.diff else {
            panic!("expected an itemized module change");
        };
        assert_eq!(inner_items.len(), 1);
        assert_eq!(inner_items[0].name(), "f");
    }

    #[test]
    fn nested_types_resolve_inside_their_module() {
        // Sub.v refers to Sub.t, whose expansion changes from int to string.
        let inner = |ty: &str| {
            Signature::exported(vec![
                Decl::from(TypeDecl::alias("t", TypeExpr::constr(ty))),
                Decl::from(ValueDecl::new("v", TypeExpr::constr("t"))),
            ])
        };
        let reference = Signature::exported(vec![
            Decl::from(TypeDecl::abstract_("t")),
            Decl::from(ModuleDecl::signature("Sub", inner("int"))),
        ]);
        let current = Signature::exported(vec![
            Decl::from(TypeDecl::abstract_("t")),
            Decl::from(ModuleDecl::signature("Sub", inner("string"))),
        ]);

        let items = supported(run(&reference, &current));
        let ItemDiff::Module(module) = &items[0] else {
            panic!("expected a module entry");
        };
        let names: Vec<_> = module
            .diff
            .modification()
            .map(|m| m.items().iter().map(ItemDiff::name).collect())
            .unwrap_or_default();
        assert_eq!(names, vec!["t", "v"]);
    }

    #[test]
    fn reordering_runtime_items_is_unsupported() {
        let reference = Signature::exported(vec![ValueDecl::new("a", int()), ValueDecl::new("b", int())]);
        let current = Signature::exported(vec![ValueDecl::new("b", int()), ValueDecl::new("a", int())]);
        assert_eq!(run(&reference, &current), Some(SignatureModification::Unsupported));
    }

    #[test]
    fn compatible_functors_have_no_entry() {
        let body = Signature::exported(vec![ValueDecl::new("run", int())]);
        let sig = Signature::exported(vec![
            Decl::from(ModuleTypeDecl::abstract_("S")),
            Decl::from(ModuleDecl::new("F", functor("S", body))),
        ]);
        assert_eq!(run(&sig, &sig.clone()), None);
    }

    #[test]
    fn incompatible_functors_are_unsupported() {
        let reference = Signature::exported(vec![
            Decl::from(ModuleTypeDecl::abstract_("S")),
            Decl::from(ModuleDecl::new(
                "F",
                functor("S", Signature::exported(vec![ValueDecl::new("run", int())])),
            )),
        ]);
        let current = Signature::exported(vec![
            Decl::from(ModuleTypeDecl::abstract_("S")),
            Decl::from(ModuleDecl::new(
                "F",
                functor(
                    "S",
                    Signature::exported(vec![ValueDecl::new("run", TypeExpr::constr("string"))]),
                ),
            )),
        ]);

        let items = supported(run(&reference, &current));
        assert_eq!(
            items,
            vec![ItemDiff::Module(ModuleDiff {
                name: "F".into(),
                diff: Diff::Modified(SignatureModification::Unsupported),
            })]
        );
    }

    #[test]
    fn scripted_module_type_answers_decide_fallback() {
        let sig = Signature::exported(vec![
            Decl::from(ModuleTypeDecl::abstract_("S")),
            Decl::from(ModuleDecl::new("F", functor("S", Signature::empty()))),
        ]);

        let oracle = ScriptedOracle::default()
            .with_module_types([Ok(Coercion::Identity), Ok(Coercion::Identity)]);
        assert_eq!(run_with(&oracle, &sig, &sig).unwrap(), None);

        let oracle = ScriptedOracle::default().with_module_types([
            Ok(Coercion::Identity),
            Err(OracleError::incompatible("parameter changed")),
        ]);
        let items = supported(run_with(&oracle, &sig, &sig).unwrap());
        assert_eq!(items[0].name(), "F");

        let oracle = ScriptedOracle::default()
            .with_module_types([Err(OracleError::CyclicAbbreviation("S".into()))]);
        let err = run_with(&oracle, &sig, &sig).unwrap_err();
        assert!(matches!(
            err,
            DiffError::Oracle { kind: ItemKind::Module, ref name, .. } if name == "Top.F"
        ));
    }

    #[test]
    fn module_type_declarations() {
        let concrete = |ty: &str| {
            ModuleTypeDecl::new(
                "S",
                ModuleTypeExpr::Signature(Signature::exported(vec![ValueDecl::new(
                    "x",
                    TypeExpr::constr(ty),
                )])),
            )
        };
        let abstract_ = ModuleTypeDecl::abstract_("S");

        let sig = |d: &ModuleTypeDecl| Signature::exported(vec![d.clone()]);

        assert_eq!(run(&sig(&abstract_), &sig(&abstract_)), None);
        assert_eq!(run(&sig(&concrete("int")), &sig(&concrete("int"))), None);

        let items = supported(run(&sig(&abstract_), &sig(&concrete("int"))));
        assert_eq!(
            items[0],
            ItemDiff::ModuleType(ModuleTypeDiff {
                name: "S".into(),
                diff: Diff::Modified(SignatureModification::Unsupported),
            })
        );

        let items = supported(run(&sig(&concrete("int")), &sig(&concrete("float"))));
        let ItemDiff::ModuleType(module_type) = &items[0] else {
            panic!("expected a module type entry");
        };
        assert_eq!(
            module_type.diff.modification().map(|m| m.items().len()),
            Some(1)
        );
    }

    #[test]
    fn signature_against_functor_is_unsupported() {
        let reference = Signature::exported(vec![
            Decl::from(ModuleTypeDecl::abstract_("S")),
            Decl::from(ModuleDecl::signature("M", Signature::empty())),
        ]);
        let current = Signature::exported(vec![
            Decl::from(ModuleTypeDecl::abstract_("S")),
            Decl::from(ModuleDecl::new("M", functor("S", Signature::empty()))),
        ]);
        let items = supported(run(&reference, &current));
        assert_eq!(
            items[0],
            ItemDiff::Module(ModuleDiff {
                name: "M".into(),
                diff: Diff::Modified(SignatureModification::Unsupported),
            })
        );
    }
}
