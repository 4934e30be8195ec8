//! Typing context shared by every check of one interface diff.
//!
//! The context is seeded from both snapshots. Each snapshot gets its own
//! [`Scope`] so that a path such as `t` resolves to the reference definition
//! on the reference side and to the current definition on the current side,
//! while identical paths still denote the same nominal type across snapshots.

use std::collections::HashMap;

use sigdiff_types::{Decl, ModuleTypeExpr, Signature, TypeDecl};

/// Which snapshot plays the "expected" role in a directional check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Can the current declaration be used where the reference one is expected?
    Forward,
    /// Can the reference declaration be used where the current one is expected?
    Backward,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

/// A type declaration together with the module path it was declared in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopedType {
    pub prefix: Vec<String>,
    pub decl: TypeDecl,
}

/// Every type and module type declared by one snapshot, keyed by dotted path.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    types: HashMap<String, ScopedType>,
    module_types: HashMap<String, Option<ModuleTypeExpr>>,
}

impl Scope {
    /// Register every declaration of `signature`, descending into nested
    /// module signatures and module type definitions.
    pub fn from_signature(signature: &Signature) -> Self {
        let mut scope = Self::default();
        scope.register(&[], signature);
        scope
    }

    fn register(&mut self, prefix: &[String], signature: &Signature) {
        // Hidden items are registered too: exported declarations may still
        // refer to them.
        for item in &signature.items {
            match &item.decl {
                Decl::Type(decl) => {
                    self.types.insert(
                        join(prefix, &decl.name),
                        ScopedType {
                            prefix: prefix.to_vec(),
                            decl: decl.clone(),
                        },
                    );
                }
                Decl::Module(decl) => {
                    if let ModuleTypeExpr::Signature(inner) = &decl.ty {
                        self.register(&enter(prefix, &decl.name), inner);
                    }
                }
                Decl::ModuleType(decl) => {
                    self.module_types
                        .insert(join(prefix, &decl.name), decl.definition.clone());
                    if let Some(ModuleTypeExpr::Signature(inner)) = &decl.definition {
                        self.register(&enter(prefix, &decl.name), inner);
                    }
                }
                Decl::Value(_) | Decl::Class(_) | Decl::ClassType(_) => {}
            }
        }
    }

    /// Resolve `path` as seen from inside module `prefix`, innermost first.
    ///
    /// Returns the canonical key of the declaration.
    pub fn resolve_type(&self, prefix: &[String], path: &str) -> Option<(&str, &ScopedType)> {
        lookup(&self.types, prefix, path)
    }

    /// Look up a type by canonical key.
    pub fn type_by_key(&self, key: &str) -> Option<&ScopedType> {
        self.types.get(key)
    }

    /// Resolve a module type path. The inner option is `None` for an abstract
    /// module type.
    pub fn resolve_module_type(
        &self,
        prefix: &[String],
        path: &str,
    ) -> Option<(&str, Option<&ModuleTypeExpr>)> {
        lookup(&self.module_types, prefix, path).map(|(key, def)| (key, def.as_ref()))
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn module_type_count(&self) -> usize {
        self.module_types.len()
    }
}

fn lookup<'s, V>(
    table: &'s HashMap<String, V>,
    prefix: &[String],
    path: &str,
) -> Option<(&'s str, &'s V)> {
    (0..=prefix.len()).rev().find_map(|depth| {
        table
            .get_key_value(&join(&prefix[..depth], path))
            .map(|(key, value)| (key.as_str(), value))
    })
}

fn join(prefix: &[String], name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix.join("."), name)
    }
}

/// The module path of an item named `name` declared inside `prefix`.
pub fn enter(prefix: &[String], name: &str) -> Vec<String> {
    let mut inner = prefix.to_vec();
    inner.push(name.to_string());
    inner
}

/// Split a canonical key back into module path segments.
pub fn key_segments(key: &str) -> Vec<String> {
    key.split('.').map(str::to_string).collect()
}

/// One side of a check: the scope its paths resolve in, and the module the
/// declaration lives in.
#[derive(Clone, Copy, Debug)]
pub struct Frame<'a> {
    pub scope: &'a Scope,
    pub prefix: &'a [String],
}

/// The view of the typing context handed to a single oracle call.
#[derive(Clone, Copy, Debug)]
pub struct Env<'a> {
    pub expected: Frame<'a>,
    pub provided: Frame<'a>,
}

impl<'a> Env<'a> {
    /// Exchange the expected and provided sides.
    pub fn swapped(self) -> Self {
        Self {
            expected: self.provided,
            provided: self.expected,
        }
    }
}

/// Registry seeded from both snapshots of one interface diff.
#[derive(Clone, Debug, Default)]
pub struct TypingContext {
    reference: Scope,
    current: Scope,
}

impl TypingContext {
    pub fn new(reference: &Signature, current: &Signature) -> Self {
        Self {
            reference: Scope::from_signature(reference),
            current: Scope::from_signature(current),
        }
    }

    /// Build the view for a check in `direction`, from inside module `prefix`.
    pub fn env<'a>(&'a self, direction: Direction, prefix: &'a [String]) -> Env<'a> {
        let reference = Frame {
            scope: &self.reference,
            prefix,
        };
        let current = Frame {
            scope: &self.current,
            prefix,
        };
        match direction {
            Direction::Forward => Env {
                expected: reference,
                provided: current,
            },
            Direction::Backward => Env {
                expected: current,
                provided: reference,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigdiff_types::{ModuleDecl, ModuleTypeDecl, TypeExpr};

    fn nested() -> Signature {
        Signature::exported(vec![
            Decl::from(TypeDecl::abstract_("t")),
            Decl::from(ModuleDecl::signature(
                "M",
                Signature::exported(vec![TypeDecl::alias("t", TypeExpr::constr("int"))]),
            )),
            Decl::from(ModuleTypeDecl::new(
                "S",
                ModuleTypeExpr::Signature(Signature::exported(vec![TypeDecl::abstract_("u")])),
            )),
            Decl::from(ModuleTypeDecl::abstract_("A")),
        ])
    }

    #[test]
    fn registers_nested_declarations() {
        let scope = Scope::from_signature(&nested());
        assert_eq!(scope.type_count(), 3);
        assert!(scope.type_by_key("t").is_some());
        assert!(scope.type_by_key("M.t").is_some());
        assert!(scope.type_by_key("S.u").is_some());
        assert_eq!(scope.module_type_count(), 2);
    }

    #[test]
    fn innermost_prefix_wins() {
        let scope = Scope::from_signature(&nested());
        let inside_m = vec!["M".to_string()];

        let (key, found) = scope.resolve_type(&inside_m, "t").unwrap();
        assert_eq!(key, "M.t");
        assert_eq!(found.prefix, inside_m);

        let (key, _) = scope.resolve_type(&[], "t").unwrap();
        assert_eq!(key, "t");

        let (key, _) = scope.resolve_type(&[], "M.t").unwrap();
        assert_eq!(key, "M.t");

        assert!(scope.resolve_type(&inside_m, "int").is_none());
    }

    #[test]
    fn abstract_module_types_resolve_without_definition() {
        let scope = Scope::from_signature(&nested());
        let (key, def) = scope.resolve_module_type(&[], "A").unwrap();
        assert_eq!(key, "A");
        assert!(def.is_none());
        assert!(scope.resolve_module_type(&[], "S").unwrap().1.is_some());
    }

    #[test]
    fn directions_select_expected_side() {
        let reference = Signature::exported(vec![TypeDecl::abstract_("old")]);
        let current = Signature::exported(vec![TypeDecl::abstract_("new")]);
        let ctx = TypingContext::new(&reference, &current);

        let forward = ctx.env(Direction::Forward, &[]);
        assert!(forward.expected.scope.type_by_key("old").is_some());
        assert!(forward.provided.scope.type_by_key("new").is_some());

        let backward = ctx.env(Direction::Backward, &[]);
        assert!(backward.expected.scope.type_by_key("new").is_some());

        let swapped = forward.swapped();
        assert!(swapped.expected.scope.type_by_key("new").is_some());
        assert_eq!(Direction::Forward.reversed(), Direction::Backward);
    }
}
