//! Name-keyed merge of two indices.

use std::collections::BTreeSet;

use tracing::trace;

use crate::error::DiffResult;
use crate::index::NameIndex;
use crate::tree::Diff;

/// Walk the union of names of both indices in ascending order.
///
/// `diff` receives the declaration of each side, `None` when the name is
/// missing there, and returns the change for that name if any. The first
/// error aborts the merge.
pub fn merge<'a, D, T, F>(
    reference: &NameIndex<'a, D>,
    current: &NameIndex<'a, D>,
    mut diff: F,
) -> DiffResult<Vec<T>>
where
    F: FnMut(&'a str, Option<&'a D>, Option<&'a D>) -> DiffResult<Option<T>>,
{
    let names: BTreeSet<&'a str> = reference.names().chain(current.names()).collect();
    let mut changes = Vec::new();
    for name in names {
        let (before, after) = (reference.get(name), current.get(name));
        trace!(
            name,
            in_reference = before.is_some(),
            in_current = after.is_some(),
            "merging"
        );
        if let Some(change) = diff(name, before, after)? {
            changes.push(change);
        }
    }
    Ok(changes)
}

/// Classify one name: removed, added, or handed to `modified` when present
/// on both sides.
pub fn compare<D, M, F>(
    reference: Option<&D>,
    current: Option<&D>,
    modified: F,
) -> DiffResult<Option<Diff<D, M>>>
where
    D: Clone,
    F: FnOnce(&D, &D) -> DiffResult<Option<M>>,
{
    Ok(match (reference, current) {
        (None, None) => None,
        (Some(reference), None) => Some(Diff::Removed(reference.clone())),
        (None, Some(current)) => Some(Diff::Added(current.clone())),
        (Some(reference), Some(current)) => modified(reference, current)?.map(Diff::Modified),
    })
}
