use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::decl::Decl;

/// Export status of a signature item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Exported,
    Hidden,
}

/// One entry of a signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigItem {
    #[serde(default)]
    pub visibility: Visibility,
    pub decl: Decl,
}

impl SigItem {
    pub fn exported(decl: impl Into<Decl>) -> Self {
        Self {
            visibility: Visibility::Exported,
            decl: decl.into(),
        }
    }

    pub fn hidden(decl: impl Into<Decl>) -> Self {
        Self {
            visibility: Visibility::Hidden,
            decl: decl.into(),
        }
    }

    pub fn is_exported(&self) -> bool {
        self.visibility == Visibility::Exported
    }
}

/// An ordered list of declarations forming a module's public interface.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature {
    pub items: Vec<SigItem>,
}

impl Signature {
    pub fn new(items: Vec<SigItem>) -> Self {
        Self { items }
    }

    /// An empty signature, `sig end`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a signature where every declaration is exported.
    pub fn exported<I, D>(decls: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<Decl>,
    {
        Self {
            items: decls.into_iter().map(SigItem::exported).collect(),
        }
    }

    /// Iterate over the exported declarations in order.
    pub fn exported_decls(&self) -> impl Iterator<Item = &Decl> {
        self.items
            .iter()
            .filter(|item| item.is_exported())
            .map(|item| &item.decl)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl<D: Into<Decl>> FromIterator<D> for Signature {
    fn from_iter<I: IntoIterator<Item = D>>(iter: I) -> Self {
        Self::exported(iter)
    }
}

/// The interfaces of every compilation unit of a library, keyed by module name.
pub type Library = BTreeMap<String, Signature>;
