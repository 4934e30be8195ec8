//! Type declaration differ.
//!
//! When the oracle reports a change, records and variants on both sides are
//! decomposed field by field and constructor by constructor. Every other
//! change (a different kind, a new manifest, abstract to concrete) is atomic.

use sigdiff_types::{
    ConstructorArgs, ConstructorDecl, FieldDecl, ItemKind, TypeDecl, TypeExpr, TypeKind,
};

use crate::adapter::{Cx, Verdict};
use crate::error::DiffResult;
use crate::index::NameIndex;
use crate::merge::{compare, merge};
use crate::tree::{
    ConstructorDiff, ConstructorModification, Diff, FieldDiff, Modification, TupleComponent,
    TypeDiff, TypeModification,
};

const NO_PARAMS: (&[String], &[String]) = (&[], &[]);

pub(crate) fn diff_type(
    cx: &Cx<'_>,
    name: &str,
    reference: Option<&TypeDecl>,
    current: Option<&TypeDecl>,
) -> DiffResult<Option<TypeDiff>> {
    let diff = compare(reference, current, |r, c| modify_type(cx, name, r, c))?;
    Ok(diff.map(|diff| TypeDiff {
        name: name.to_string(),
        diff,
    }))
}

fn modify_type(
    cx: &Cx<'_>,
    name: &str,
    reference: &TypeDecl,
    current: &TypeDecl,
) -> DiffResult<Option<TypeModification>> {
    let path = cx.qualify(name);
    let verdict = cx.bidirectional(ItemKind::Type, &path, reference, current, |o, env, e, p| {
        o.type_declarations(env, e, p)
    })?;
    if verdict == Verdict::Unchanged {
        return Ok(None);
    }

    // A decomposition with no changed member means the difference lies
    // outside the fields or constructors, and is not reported.
    let params = (reference.params.as_slice(), current.params.as_slice());
    Ok(match (&reference.kind, &current.kind) {
        (TypeKind::Record(r), TypeKind::Record(c)) => {
            let fields = FieldPairs::index(&path, r, c)?;
            let matched = cx.type_exprs(ItemKind::Field, &path, params, fields.shared_types())?;
            let fields = fields.diff(&matched)?;
            (!fields.is_empty()).then_some(TypeModification::Record(fields))
        }
        (TypeKind::Variant(r), TypeKind::Variant(c)) => {
            let constructors = diff_constructors(cx, &path, params, r, c)?;
            (!constructors.is_empty()).then_some(TypeModification::Variant(constructors))
        }
        _ => Some(TypeModification::Atomic(Modification::of(reference, current))),
    })
}

/// The fields of two records, paired by name.
struct FieldPairs<'f> {
    reference: NameIndex<'f, FieldDecl>,
    current: NameIndex<'f, FieldDecl>,
}

impl<'f> FieldPairs<'f> {
    fn index(owner: &str, reference: &'f [FieldDecl], current: &'f [FieldDecl]) -> DiffResult<Self> {
        Ok(Self {
            reference: NameIndex::unique(ItemKind::Field, owner, reference, |f| f.name.as_str())?,
            current: NameIndex::unique(ItemKind::Field, owner, current, |f| f.name.as_str())?,
        })
    }

    /// Types of the fields present on both sides, in name order.
    fn shared_types(&self) -> impl Iterator<Item = (&'f TypeExpr, &'f TypeExpr)> + '_ {
        self.reference.names().filter_map(|name| {
            let (r, c) = (self.reference.get(name)?, self.current.get(name)?);
            Some((&r.ty, &c.ty))
        })
    }

    /// Changed fields, by name. `matched` holds the structural answer for
    /// every shared field, in the order of [`Self::shared_types`].
    ///
    /// A field is modified when its type no longer matches or its mutability
    /// flipped.
    fn diff(&self, matched: &[bool]) -> DiffResult<Vec<FieldDiff>> {
        let mut matched = matched.iter().copied();
        merge(&self.reference, &self.current, |name, r, c| {
            let diff = compare(r, c, |r, c| {
                let same_type = matched.next().unwrap_or(false);
                let same = same_type && r.mutable == c.mutable;
                Ok((!same).then(|| Modification::of(r, c)))
            })?;
            Ok(diff.map(|diff| FieldDiff {
                name: name.to_string(),
                diff,
            }))
        })
    }
}

/// Changed constructors of two variants, by name.
fn diff_constructors(
    cx: &Cx<'_>,
    owner: &str,
    params: (&[String], &[String]),
    reference: &[ConstructorDecl],
    current: &[ConstructorDecl],
) -> DiffResult<Vec<ConstructorDiff>> {
    let r = NameIndex::unique(ItemKind::Constructor, owner, reference, |c| c.name.as_str())?;
    let c = NameIndex::unique(ItemKind::Constructor, owner, current, |c| c.name.as_str())?;
    merge(&r, &c, |name, r, c| {
        let path = format!("{owner}.{name}");
        let diff = compare(r, c, |r, c| modify_constructor(cx, &path, params, r, c))?;
        Ok(diff.map(|diff| ConstructorDiff {
            name: name.to_string(),
            diff,
        }))
    })
}

/// Compare a constructor's arguments, and its result annotation if any.
///
/// The result and every argument are matched in one variable scope. A
/// constructor with a result annotation quantifies its own variables, so
/// the declaration's parameters are bound only for plain constructors.
fn modify_constructor(
    cx: &Cx<'_>,
    path: &str,
    params: (&[String], &[String]),
    reference: &ConstructorDecl,
    current: &ConstructorDecl,
) -> DiffResult<Option<ConstructorModification>> {
    let atomic = || Some(ConstructorModification::Atomic(Modification::of(reference, current)));
    let (results, params) = match (&reference.result, &current.result) {
        (None, None) => (None, params),
        (Some(r), Some(c)) => (Some((r, c)), NO_PARAMS),
        _ => return Ok(atomic()),
    };

    Ok(match (&reference.args, &current.args) {
        (ConstructorArgs::Tuple(r), ConstructorArgs::Tuple(c)) => {
            let pairs = r.iter().zip(c.iter());
            let Some(matched) = match_members(cx, path, params, results, pairs)? else {
                return Ok(atomic());
            };
            let components = tuple_components(r, c, &matched);
            if components.iter().all(TupleComponent::is_unchanged) {
                None
            } else {
                Some(ConstructorModification::TupleArgs(components))
            }
        }
        (ConstructorArgs::Record(r), ConstructorArgs::Record(c)) => {
            let fields = FieldPairs::index(path, r, c)?;
            let Some(matched) = match_members(cx, path, params, results, fields.shared_types())?
            else {
                return Ok(atomic());
            };
            let fields = fields.diff(&matched)?;
            (!fields.is_empty()).then_some(ConstructorModification::RecordArgs(fields))
        }
        _ => atomic(),
    })
}

/// Match a constructor's result annotations ahead of its argument types.
/// Returns the answers for the arguments, or `None` when the results differ.
fn match_members<'t>(
    cx: &Cx<'_>,
    path: &str,
    params: (&[String], &[String]),
    results: Option<(&'t TypeExpr, &'t TypeExpr)>,
    arguments: impl Iterator<Item = (&'t TypeExpr, &'t TypeExpr)>,
) -> DiffResult<Option<Vec<bool>>> {
    let mut matched = cx.type_exprs(
        ItemKind::Constructor,
        path,
        params,
        results.into_iter().chain(arguments),
    )?;
    if results.is_some() {
        if !matched.first().copied().unwrap_or(false) {
            return Ok(None);
        }
        matched.remove(0);
    }
    Ok(Some(matched))
}

/// Positional comparison of tuple arguments. `matched` holds the answer for
/// every shared position.
///
/// Shared positions are unchanged or modified; surplus positions are removed
/// (reference longer) or added (current longer).
fn tuple_components(
    reference: &[TypeExpr],
    current: &[TypeExpr],
    matched: &[bool],
) -> Vec<TupleComponent> {
    let mut components = Vec::with_capacity(reference.len().max(current.len()));
    for ((r, c), same) in reference.iter().zip(current).zip(matched) {
        components.push(if *same {
            TupleComponent::Unchanged(r.clone())
        } else {
            TupleComponent::Changed(Diff::Modified(Modification::of(r, c)))
        });
    }
    let shared = components.len();
    components.extend(
        reference[shared..]
            .iter()
            .map(|r| TupleComponent::Changed(Diff::Removed(r.clone()))),
    );
    components.extend(
        current[shared..]
            .iter()
            .map(|c| TupleComponent::Changed(Diff::Added(c.clone()))),
    );
    components
}
