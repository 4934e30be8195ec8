//! Entry points: compare one interface, or every interface of a library.

use std::collections::BTreeMap;

use sigdiff_oracle::{CompatibilityOracle, TypingContext};
use sigdiff_types::{ItemKind, Library, ModuleDecl, Signature};
use tracing::debug;

use crate::adapter::Cx;
use crate::error::DiffResult;
use crate::index::NameIndex;
use crate::merge::merge;
use crate::module::diff_signature;
use crate::tree::{Diff, ItemDiff, ModuleDiff, SignatureModification, Stats};

/// Per-module changes of a library, keyed by module name. Unchanged modules
/// have no entry.
pub type LibraryDiff = BTreeMap<String, SignatureModification>;

/// Compare two versions of the interface of module `module_name`.
///
/// Returns `None` when the interfaces are equivalent, otherwise a modified
/// [`ModuleDiff`]. A fresh typing context is seeded from both signatures, so
/// no state is shared between calls.
///
/// # Errors
///
/// Fails when the oracle reports anything other than an incompatibility, or
/// when a record or variant declares the same field or constructor twice.
pub fn diff_interface(
    oracle: &dyn CompatibilityOracle,
    module_name: &str,
    reference: &Signature,
    current: &Signature,
) -> DiffResult<Option<ModuleDiff>> {
    debug!(
        module = module_name,
        reference_items = reference.len(),
        current_items = current.len(),
        "diffing interface"
    );
    let typing = TypingContext::new(reference, current);
    let cx = Cx::new(oracle, &typing, module_name);
    let modification = diff_signature(&cx, ItemKind::Module, reference, current)?;

    match &modification {
        Some(m) => {
            let stats = m.stats();
            debug!(
                module = module_name,
                additions = stats.additions,
                removals = stats.removals,
                modifications = stats.modifications,
                "interface changed"
            );
        }
        None => debug!(module = module_name, "interface unchanged"),
    }

    Ok(modification.map(|m| ModuleDiff {
        name: module_name.to_string(),
        diff: Diff::Modified(m),
    }))
}

/// Compare two versions of a library, module by module.
///
/// A module present on one side only is reported as a single added or
/// removed module item. Modules present on both sides are compared with
/// [`diff_interface`], each in its own typing context.
///
/// # Errors
///
/// The first failing module aborts the whole comparison.
pub fn diff_library(
    oracle: &dyn CompatibilityOracle,
    reference: &Library,
    current: &Library,
) -> DiffResult<LibraryDiff> {
    debug!(
        reference_modules = reference.len(),
        current_modules = current.len(),
        "diffing library"
    );
    let r: NameIndex<'_, Signature> = reference.iter().map(|(n, s)| (n.as_str(), s)).collect();
    let c: NameIndex<'_, Signature> = current.iter().map(|(n, s)| (n.as_str(), s)).collect();

    let changes = merge(&r, &c, |name, r, c| {
        let modification = match (r, c) {
            (Some(r), Some(c)) => diff_interface(oracle, name, r, c)?
                .and_then(|module| module.diff.into_modification()),
            (Some(r), None) => Some(whole_module(
                name,
                Diff::Removed(ModuleDecl::signature(name, r.clone())),
            )),
            (None, Some(c)) => Some(whole_module(
                name,
                Diff::Added(ModuleDecl::signature(name, c.clone())),
            )),
            (None, None) => None,
        };
        Ok(modification.map(|m| (name.to_string(), m)))
    })?;

    let diff: LibraryDiff = changes.into_iter().collect();
    debug!(changed_modules = diff.len(), "library diff complete");
    Ok(diff)
}

fn whole_module(name: &str, diff: Diff<ModuleDecl, SignatureModification>) -> SignatureModification {
    SignatureModification::Supported(vec![ItemDiff::Module(ModuleDiff {
        name: name.to_string(),
        diff,
    })])
}
