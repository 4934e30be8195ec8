//! The diff tree.
//!
//! A tree only contains entries for declarations that changed: an identical
//! declaration produces no node at all. The one exception is
//! [`TupleComponent`], which is positional and keeps unchanged components so
//! that positions stay meaningful.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};
use sigdiff_types::{
    ClassDecl, ClassTypeDecl, ConstructorDecl, FieldDecl, ItemKind, ModuleDecl, ModuleTypeDecl,
    TypeDecl, TypeExpr, ValueDecl,
};

/// What happened to one item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Diff<Item, Mod> {
    Added(Item),
    Removed(Item),
    Modified(Mod),
}

impl<Item, M> Diff<Item, M> {
    pub fn is_added(&self) -> bool {
        matches!(self, Self::Added(_))
    }

    pub fn is_removed(&self) -> bool {
        matches!(self, Self::Removed(_))
    }

    pub fn is_modified(&self) -> bool {
        matches!(self, Self::Modified(_))
    }

    /// The modification payload, if any.
    pub fn modification(&self) -> Option<&M> {
        match self {
            Self::Modified(m) => Some(m),
            Self::Added(_) | Self::Removed(_) => None,
        }
    }

    pub fn into_modification(self) -> Option<M> {
        match self {
            Self::Modified(m) => Some(m),
            Self::Added(_) | Self::Removed(_) => None,
        }
    }
}

/// Both versions of an item that changed but cannot be decomposed further.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modification<T> {
    pub reference: T,
    pub current: T,
}

impl<T: Clone> Modification<T> {
    pub(crate) fn of(reference: &T, current: &T) -> Self {
        Self {
            reference: reference.clone(),
            current: current.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueDiff {
    pub name: String,
    pub diff: Diff<ValueDecl, Modification<ValueDecl>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDiff {
    pub name: String,
    pub diff: Diff<TypeDecl, TypeModification>,
}

/// How a type declaration changed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeModification {
    /// Changed fields of a record, ordered by name.
    Record(Vec<FieldDiff>),
    /// Changed constructors of a variant, ordered by name.
    Variant(Vec<ConstructorDiff>),
    Atomic(Modification<TypeDecl>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDiff {
    pub name: String,
    pub diff: Diff<FieldDecl, Modification<FieldDecl>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorDiff {
    pub name: String,
    pub diff: Diff<ConstructorDecl, ConstructorModification>,
}

/// How a variant constructor changed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructorModification {
    /// Changed fields of an inline record argument, ordered by name.
    RecordArgs(Vec<FieldDiff>),
    /// Every tuple argument, by position.
    TupleArgs(Vec<TupleComponent>),
    Atomic(Modification<ConstructorDecl>),
}

/// One position of a constructor's tuple arguments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TupleComponent {
    Unchanged(TypeExpr),
    Changed(Diff<TypeExpr, Modification<TypeExpr>>),
}

impl TupleComponent {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDiff {
    pub name: String,
    pub diff: Diff<ClassDecl, Modification<ClassDecl>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassTypeDiff {
    pub name: String,
    pub diff: Diff<ClassTypeDecl, Modification<ClassTypeDecl>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDiff {
    pub name: String,
    pub diff: Diff<ModuleDecl, SignatureModification>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleTypeDiff {
    pub name: String,
    pub diff: Diff<ModuleTypeDecl, SignatureModification>,
}

/// How a module type changed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureModification {
    /// The two sides differ but the difference cannot be expressed item by
    /// item (functors, aliases, coercion-only changes, abstract vs concrete).
    Unsupported,
    /// Changed items, ordered by name then kind.
    Supported(Vec<ItemDiff>),
}

impl SignatureModification {
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Supported(_))
    }

    /// The changed items, empty for [`SignatureModification::Unsupported`].
    pub fn items(&self) -> &[ItemDiff] {
        match self {
            Self::Supported(items) => items,
            Self::Unsupported => &[],
        }
    }
}

/// A changed signature item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemDiff {
    Value(ValueDiff),
    Module(ModuleDiff),
    Type(TypeDiff),
    ModuleType(ModuleTypeDiff),
    Class(ClassDiff),
    ClassType(ClassTypeDiff),
}

impl ItemDiff {
    pub fn name(&self) -> &str {
        match self {
            Self::Value(d) => &d.name,
            Self::Module(d) => &d.name,
            Self::Type(d) => &d.name,
            Self::ModuleType(d) => &d.name,
            Self::Class(d) => &d.name,
            Self::ClassType(d) => &d.name,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Value(_) => ItemKind::Value,
            Self::Module(_) => ItemKind::Module,
            Self::Type(_) => ItemKind::Type,
            Self::ModuleType(_) => ItemKind::ModuleType,
            Self::Class(_) => ItemKind::Class,
            Self::ClassType(_) => ItemKind::ClassType,
        }
    }
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// Leaf change counts of a diff (sub)tree.
///
/// A decomposed modification counts its children, an atomic or unsupported
/// one counts as a single modification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub additions: usize,
    pub removals: usize,
    pub modifications: usize,
}

impl DiffStats {
    pub fn total(&self) -> usize {
        self.additions + self.removals + self.modifications
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    fn addition() -> Self {
        Self {
            additions: 1,
            ..Self::default()
        }
    }

    fn removal() -> Self {
        Self {
            removals: 1,
            ..Self::default()
        }
    }

    fn modification() -> Self {
        Self {
            modifications: 1,
            ..Self::default()
        }
    }
}

impl Add for DiffStats {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            additions: self.additions + other.additions,
            removals: self.removals + other.removals,
            modifications: self.modifications + other.modifications,
        }
    }
}

impl AddAssign for DiffStats {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sum for DiffStats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Anything that can report its leaf change counts.
pub trait Stats {
    fn stats(&self) -> DiffStats;
}

impl<T> Stats for Modification<T> {
    fn stats(&self) -> DiffStats {
        DiffStats::modification()
    }
}

impl<Item, M: Stats> Stats for Diff<Item, M> {
    fn stats(&self) -> DiffStats {
        match self {
            Self::Added(_) => DiffStats::addition(),
            Self::Removed(_) => DiffStats::removal(),
            Self::Modified(m) => m.stats(),
        }
    }
}

impl<T: Stats> Stats for [T] {
    fn stats(&self) -> DiffStats {
        self.iter().map(Stats::stats).sum()
    }
}

impl Stats for TypeModification {
    fn stats(&self) -> DiffStats {
        match self {
            Self::Record(fields) => fields.stats(),
            Self::Variant(constructors) => constructors.stats(),
            Self::Atomic(m) => m.stats(),
        }
    }
}

impl Stats for ConstructorModification {
    fn stats(&self) -> DiffStats {
        match self {
            Self::RecordArgs(fields) => fields.stats(),
            Self::TupleArgs(components) => components.stats(),
            Self::Atomic(m) => m.stats(),
        }
    }
}

impl Stats for TupleComponent {
    fn stats(&self) -> DiffStats {
        match self {
            Self::Unchanged(_) => DiffStats::default(),
            Self::Changed(diff) => diff.stats(),
        }
    }
}

impl Stats for SignatureModification {
    fn stats(&self) -> DiffStats {
        match self {
            Self::Unsupported => DiffStats::modification(),
            Self::Supported(items) => items.stats(),
        }
    }
}

macro_rules! impl_entity_stats {
    ($($entity:ty),* $(,)?) => {
        $(
            impl Stats for $entity {
                fn stats(&self) -> DiffStats {
                    self.diff.stats()
                }
            }
        )*
    };
}

impl_entity_stats!(
    ValueDiff,
    TypeDiff,
    FieldDiff,
    ConstructorDiff,
    ClassDiff,
    ClassTypeDiff,
    ModuleDiff,
    ModuleTypeDiff,
);

impl Stats for ItemDiff {
    fn stats(&self) -> DiffStats {
        match self {
            Self::Value(d) => d.stats(),
            Self::Module(d) => d.stats(),
            Self::Type(d) => d.stats(),
            Self::ModuleType(d) => d.stats(),
            Self::Class(d) => d.stats(),
            Self::ClassType(d) => d.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int() -> TypeExpr {
        TypeExpr::constr("int")
    }

    #[test]
    fn atomic_and_unsupported_count_once() {
        let value = ValueDiff {
            name: "x".into(),
            diff: Diff::Modified(Modification::of(
                &ValueDecl::new("x", int()),
                &ValueDecl::new("x", TypeExpr::constr("bool")),
            )),
        };
        assert_eq!(value.stats(), DiffStats::modification());
        assert_eq!(SignatureModification::Unsupported.stats().modifications, 1);
    }

    #[test]
    fn decomposed_modifications_count_children() {
        let record = TypeModification::Record(vec![
            FieldDiff {
                name: "a".into(),
                diff: Diff::Added(FieldDecl::new("a", int())),
            },
            FieldDiff {
                name: "b".into(),
                diff: Diff::Removed(FieldDecl::new("b", int())),
            },
        ]);
        let tuple = ConstructorModification::TupleArgs(vec![
            TupleComponent::Unchanged(int()),
            TupleComponent::Changed(Diff::Added(int())),
        ]);
        assert_eq!(
            record.stats(),
            DiffStats {
                additions: 1,
                removals: 1,
                modifications: 0
            }
        );
        assert_eq!(tuple.stats().total(), 1);
    }

    #[test]
    fn item_accessors() {
        let item = ItemDiff::Type(TypeDiff {
            name: "t".into(),
            diff: Diff::Removed(TypeDecl::abstract_("t")),
        });
        assert_eq!(item.name(), "t");
        assert_eq!(item.kind(), ItemKind::Type);
        assert!(matches!(&item, ItemDiff::Type(d) if d.diff.is_removed()));

        let sig = SignatureModification::Supported(vec![item]);
        assert_eq!(sig.items().len(), 1);
        assert!(SignatureModification::Unsupported.items().is_empty());
    }

    #[test]
    fn serializes_with_snake_case_tags() {
        let diff: Diff<TypeExpr, Modification<TypeExpr>> = Diff::Added(int());
        let json = serde_json::to_value(&diff).unwrap();
        assert_eq!(json, serde_json::json!({"added": {"constr": {"path": "int", "args": []}}}));

        let json = serde_json::to_value(SignatureModification::Unsupported).unwrap();
        assert_eq!(json, serde_json::json!("unsupported"));
    }
}
