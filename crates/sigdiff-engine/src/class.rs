//! Class and class type differs.
//!
//! Classes are never decomposed: any mismatch reported by the oracle makes
//! the whole declaration an atomic modification.
//!
//! Only the current class is checked against the reference one. A change
//! that keeps the current class usable where the reference one was expected
//! has no entry: a virtual class or method becoming concrete, or a private
//! method becoming public. A new public method is a change, since the
//! current class then exposes a method the reference one lacks.

use sigdiff_types::{ClassDecl, ClassTypeDecl, ItemKind};

use crate::adapter::Cx;
use crate::error::DiffResult;
use crate::merge::compare;
use crate::tree::{ClassDiff, ClassTypeDiff, Modification};

pub(crate) fn diff_class(
    cx: &Cx<'_>,
    name: &str,
    reference: Option<&ClassDecl>,
    current: Option<&ClassDecl>,
) -> DiffResult<Option<ClassDiff>> {
    let diff = compare(reference, current, |r, c| {
        let verdict = cx.class_inclusion(ItemKind::Class, &cx.qualify(name), r, c, |o, env, e, p| {
            o.class_declarations(env, e, p)
        })?;
        Ok(verdict.is_changed().then(|| Modification::of(r, c)))
    })?;
    Ok(diff.map(|diff| ClassDiff {
        name: name.to_string(),
        diff,
    }))
}

pub(crate) fn diff_class_type(
    cx: &Cx<'_>,
    name: &str,
    reference: Option<&ClassTypeDecl>,
    current: Option<&ClassTypeDecl>,
) -> DiffResult<Option<ClassTypeDiff>> {
    let diff = compare(reference, current, |r, c| {
        let verdict =
            cx.class_inclusion(ItemKind::ClassType, &cx.qualify(name), r, c, |o, env, e, p| {
                o.class_type_declarations(env, e, p)
            })?;
        Ok(verdict.is_changed().then(|| Modification::of(r, c)))
    })?;
    Ok(diff.map(|diff| ClassTypeDiff {
        name: name.to_string(),
        diff,
    }))
}
