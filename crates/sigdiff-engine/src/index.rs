//! Name indices: turn ordered declaration lists into name-keyed collections.

use std::collections::BTreeMap;

use sigdiff_types::{
    ClassDecl, ClassTypeDecl, Decl, ItemKind, ModuleDecl, ModuleTypeDecl, Signature, TypeDecl,
    ValueDecl,
};

use crate::error::{DiffError, DiffResult};

/// Declarations of one kind keyed by name, iterated in name order.
#[derive(Debug)]
pub struct NameIndex<'a, D> {
    entries: BTreeMap<&'a str, &'a D>,
}

impl<'a, D> Default for NameIndex<'a, D> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<'a, D> NameIndex<'a, D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a list whose names must be unique, such as the fields of a
    /// record or the constructors of a variant.
    pub fn unique<F>(kind: ItemKind, owner: &str, items: &'a [D], name_of: F) -> DiffResult<Self>
    where
        F: Fn(&'a D) -> &'a str,
    {
        let mut index = Self::new();
        for item in items {
            let name = name_of(item);
            if index.insert(name, item).is_some() {
                return Err(DiffError::DuplicateName {
                    kind,
                    name: name.to_string(),
                    owner: owner.to_string(),
                });
            }
        }
        Ok(index)
    }

    /// Insert a declaration, returning the one it replaces.
    pub fn insert(&mut self, name: &'a str, decl: &'a D) -> Option<&'a D> {
        self.entries.insert(name, decl)
    }

    pub fn remove(&mut self, name: &str) -> Option<&'a D> {
        self.entries.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&'a D> {
        self.entries.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Names in ascending order.
    pub fn names(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Later entries replace earlier ones with the same name.
impl<'a, D> FromIterator<(&'a str, &'a D)> for NameIndex<'a, D> {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a D)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// The exported items of a signature, one index per kind.
#[derive(Debug, Default)]
pub struct SignatureIndex<'a> {
    pub values: NameIndex<'a, ValueDecl>,
    pub modules: NameIndex<'a, ModuleDecl>,
    pub types: NameIndex<'a, TypeDecl>,
    pub module_types: NameIndex<'a, ModuleTypeDecl>,
    pub classes: NameIndex<'a, ClassDecl>,
    pub class_types: NameIndex<'a, ClassTypeDecl>,
}

impl<'a> SignatureIndex<'a> {
    /// Index the exported items of `signature`.
    ///
    /// Hidden items are dropped. A later item shadows an earlier item of the
    /// same kind and name. A class suppresses the type and class type of the
    /// same name, which only describe the class's object type.
    pub fn build(signature: &'a Signature) -> Self {
        let mut index = Self::default();
        for decl in signature.exported_decls() {
            match decl {
                Decl::Value(d) => {
                    index.values.insert(&d.name, d);
                }
                Decl::Module(d) => {
                    index.modules.insert(&d.name, d);
                }
                Decl::Type(d) => {
                    index.types.insert(&d.name, d);
                }
                Decl::ModuleType(d) => {
                    index.module_types.insert(&d.name, d);
                }
                Decl::Class(d) => {
                    index.classes.insert(&d.name, d);
                }
                Decl::ClassType(d) => {
                    index.class_types.insert(&d.name, d);
                }
            }
        }

        let classes: Vec<&'a str> = index.classes.names().collect();
        for name in classes {
            index.types.remove(name);
            index.class_types.remove(name);
        }
        index
    }

    /// Total number of indexed items.
    pub fn len(&self) -> usize {
        self.values.len()
            + self.modules.len()
            + self.types.len()
            + self.module_types.len()
            + self.classes.len()
            + self.class_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigdiff_types::{FieldDecl, MethodDecl, SigItem, TypeExpr};

    fn int() -> TypeExpr {
        TypeExpr::constr("int")
    }

    #[test]
    fn hidden_items_are_dropped() {
        let sig = Signature::new(vec![
            SigItem::exported(ValueDecl::new("visible", int())),
            SigItem::hidden(ValueDecl::new("secret", int())),
        ]);
        let index = SignatureIndex::build(&sig);
        assert_eq!(index.len(), 1);
        assert!(index.values.contains("visible"));
        assert!(!index.values.contains("secret"));
    }

    #[test]
    fn kinds_are_indexed_separately() {
        let sig = Signature::exported(vec![
            Decl::from(ValueDecl::new("t", int())),
            Decl::from(TypeDecl::abstract_("t")),
        ]);
        let index = SignatureIndex::build(&sig);
        assert!(index.values.contains("t"));
        assert!(index.types.contains("t"));
    }

    #[test]
    fn later_items_shadow_earlier_ones() {
        let sig = Signature::exported(vec![
            ValueDecl::new("x", int()),
            ValueDecl::new("x", TypeExpr::constr("string")),
        ]);
        let index = SignatureIndex::build(&sig);
        assert_eq!(index.values.len(), 1);
        assert_eq!(index.values.get("x").unwrap().ty, TypeExpr::constr("string"));
    }

    #[test]
    fn class_shadows_type_and_class_type() {
        let sig = Signature::exported(vec![
            Decl::from(ClassDecl::new("point", vec![MethodDecl::new("x", int())])),
            Decl::from(ClassTypeDecl::new("point", vec![MethodDecl::new("x", int())])),
            Decl::from(TypeDecl::abstract_("point")),
            Decl::from(TypeDecl::abstract_("other")),
        ]);
        let index = SignatureIndex::build(&sig);
        assert!(index.classes.contains("point"));
        assert!(!index.class_types.contains("point"));
        assert!(!index.types.contains("point"));
        assert!(index.types.contains("other"));
    }

    #[test]
    fn names_iterate_in_order() {
        let sig = Signature::exported(vec![
            ValueDecl::new("zeta", int()),
            ValueDecl::new("alpha", int()),
            ValueDecl::new("mid", int()),
        ]);
        let index = SignatureIndex::build(&sig);
        let names: Vec<_> = index.values.names().collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn duplicate_field_is_rejected() {
        let fields = vec![FieldDecl::new("a", int()), FieldDecl::new("a", int())];
        let err = NameIndex::unique(ItemKind::Field, "t", &fields, |f| f.name.as_str()).unwrap_err();
        assert_eq!(err.to_string(), "duplicate field `a` in `t`");
    }
}
