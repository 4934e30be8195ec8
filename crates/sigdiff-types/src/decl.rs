//! Declarations: one typed description per named interface item.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::location::Location;
use crate::signature::Signature;
use crate::type_expr::TypeExpr;

/// The kind of a signature item.
///
/// The declaration order of the variants is the tie-breaker used when two
/// items of different kinds share a name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Value,
    Module,
    Type,
    ModuleType,
    Class,
    ClassType,
    /// A record field. Never a signature item on its own.
    Field,
    /// A variant constructor. Never a signature item on its own.
    Constructor,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Value => "value",
            Self::Module => "module",
            Self::Type => "type",
            Self::ModuleType => "module type",
            Self::Class => "class",
            Self::ClassType => "class type",
            Self::Field => "field",
            Self::Constructor => "constructor",
        };
        f.write_str(s)
    }
}

/// `val name : ty` or `external name : ty = "prim"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueDecl {
    pub name: String,
    pub ty: TypeExpr,
    /// Primitive name for externals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primitive: Option<String>,
    #[serde(default)]
    pub location: Location,
}

impl ValueDecl {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            primitive: None,
            location: Location::default(),
        }
    }

    /// Turn this value into an external bound to `primitive`.
    pub fn external(mut self, primitive: impl Into<String>) -> Self {
        self.primitive = Some(primitive.into());
        self
    }
}

/// A type declaration, `type ('a, 'b) name = ...`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    /// Parameter variable names, without the leading quote.
    #[serde(default)]
    pub params: Vec<String>,
    pub kind: TypeKind,
    /// Right-hand side of an abbreviation or re-export (`type t = M.t = A | B`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<TypeExpr>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub location: Location,
}

impl TypeDecl {
    /// An abstract type without parameters.
    pub fn abstract_(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Abstract)
    }

    /// A type abbreviation, `type name = manifest`.
    pub fn alias(name: impl Into<String>, manifest: TypeExpr) -> Self {
        let mut decl = Self::with_kind(name, TypeKind::Abstract);
        decl.manifest = Some(manifest);
        decl
    }

    pub fn record(name: impl Into<String>, fields: Vec<FieldDecl>) -> Self {
        Self::with_kind(name, TypeKind::Record(fields))
    }

    pub fn variant(name: impl Into<String>, constructors: Vec<ConstructorDecl>) -> Self {
        Self::with_kind(name, TypeKind::Variant(constructors))
    }

    pub fn with_kind(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            kind,
            manifest: None,
            private: false,
            location: Location::default(),
        }
    }

    /// Set the parameter variables.
    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// The representation of a type declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Abstract,
    Record(Vec<FieldDecl>),
    Variant(Vec<ConstructorDecl>),
    /// Extensible variant, `type t = ..`.
    Open,
}

impl TypeKind {
    /// Short name of the representation, for diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Abstract => "abstract",
            Self::Record(_) => "record",
            Self::Variant(_) => "variant",
            Self::Open => "extensible variant",
        }
    }
}

/// A record field, `mutable name : ty`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeExpr,
    #[serde(default)]
    pub mutable: bool,
    #[serde(default)]
    pub location: Location,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            mutable: false,
            location: Location::default(),
        }
    }

    pub fn mutable(mut self) -> Self {
        self.mutable = true;
        self
    }
}

/// Arguments of a variant constructor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructorArgs {
    /// `C of int * string`, or no arguments at all when empty.
    Tuple(Vec<TypeExpr>),
    /// `C of { x : int }`.
    Record(Vec<FieldDecl>),
}

impl Default for ConstructorArgs {
    fn default() -> Self {
        Self::Tuple(Vec::new())
    }
}

/// A variant constructor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorDecl {
    pub name: String,
    #[serde(default)]
    pub args: ConstructorArgs,
    /// Return type annotation of a GADT constructor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<TypeExpr>,
    #[serde(default)]
    pub location: Location,
}

impl ConstructorDecl {
    /// A constant constructor.
    pub fn constant(name: impl Into<String>) -> Self {
        Self::tuple(name, Vec::new())
    }

    pub fn tuple(name: impl Into<String>, args: Vec<TypeExpr>) -> Self {
        Self {
            name: name.into(),
            args: ConstructorArgs::Tuple(args),
            result: None,
            location: Location::default(),
        }
    }

    pub fn record(name: impl Into<String>, fields: Vec<FieldDecl>) -> Self {
        Self {
            name: name.into(),
            args: ConstructorArgs::Record(fields),
            result: None,
            location: Location::default(),
        }
    }
}

/// A method of a class or class type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    pub ty: TypeExpr,
    #[serde(default)]
    pub private: bool,
    #[serde(default, rename = "virtual")]
    pub virtual_: bool,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            private: false,
            virtual_: false,
        }
    }
}

/// `class ['a] name : object ... end`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default, rename = "virtual")]
    pub virtual_: bool,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    #[serde(default)]
    pub location: Location,
}

impl ClassDecl {
    pub fn new(name: impl Into<String>, methods: Vec<MethodDecl>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            virtual_: false,
            methods,
            location: Location::default(),
        }
    }
}

/// `class type ['a] name = object ... end`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassTypeDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default, rename = "virtual")]
    pub virtual_: bool,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    #[serde(default)]
    pub location: Location,
}

impl ClassTypeDecl {
    pub fn new(name: impl Into<String>, methods: Vec<MethodDecl>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            virtual_: false,
            methods,
            location: Location::default(),
        }
    }
}

/// `module name : ty`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDecl {
    pub name: String,
    pub ty: ModuleTypeExpr,
    #[serde(default)]
    pub location: Location,
}

impl ModuleDecl {
    pub fn new(name: impl Into<String>, ty: ModuleTypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            location: Location::default(),
        }
    }

    /// `module name : sig ... end`.
    pub fn signature(name: impl Into<String>, signature: Signature) -> Self {
        Self::new(name, ModuleTypeExpr::Signature(signature))
    }
}

/// `module type name = ty`, or an abstract `module type name`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleTypeDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<ModuleTypeExpr>,
    #[serde(default)]
    pub location: Location,
}

impl ModuleTypeDecl {
    pub fn new(name: impl Into<String>, definition: ModuleTypeExpr) -> Self {
        Self {
            name: name.into(),
            definition: Some(definition),
            location: Location::default(),
        }
    }

    pub fn abstract_(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definition: None,
            location: Location::default(),
        }
    }
}

/// A module type expression.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleTypeExpr {
    /// `sig ... end`.
    Signature(Signature),
    /// A named module type, `S` or `M.S`.
    Ident(String),
    /// A module alias, `(module M)`.
    Alias(String),
    /// `functor (X : A) -> B`; a missing parameter is the generative `()`.
    Functor {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        param: Option<FunctorParam>,
        result: Box<ModuleTypeExpr>,
    },
}

impl ModuleTypeExpr {
    pub fn functor(param: FunctorParam, result: ModuleTypeExpr) -> Self {
        Self::Functor {
            param: Some(param),
            result: Box::new(result),
        }
    }

    /// Short name of the shape, for diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Signature(_) => "signature",
            Self::Ident(_) => "named module type",
            Self::Alias(_) => "module alias",
            Self::Functor { .. } => "functor",
        }
    }

    /// The signature, when this is a plain `sig ... end`.
    pub fn as_signature(&self) -> Option<&Signature> {
        match self {
            Self::Signature(sig) => Some(sig),
            _ => None,
        }
    }
}

/// The parameter of a functor type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctorParam {
    pub name: String,
    pub ty: Box<ModuleTypeExpr>,
}

impl FunctorParam {
    pub fn new(name: impl Into<String>, ty: ModuleTypeExpr) -> Self {
        Self {
            name: name.into(),
            ty: Box::new(ty),
        }
    }
}

/// Any declaration that can appear in a signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decl {
    Value(ValueDecl),
    Module(ModuleDecl),
    Type(TypeDecl),
    ModuleType(ModuleTypeDecl),
    Class(ClassDecl),
    ClassType(ClassTypeDecl),
}

impl Decl {
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

    /// Whether the item occupies a slot in the runtime representation of
    /// the enclosing module.
    pub fn has_runtime_slot(&self) -> bool {
        matches!(self, Self::Value(_) | Self::Module(_) | Self::Class(_))
    }
}

macro_rules! impl_from_decl {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Decl {
                fn from(decl: $ty) -> Self {
                    Self::$variant(decl)
                }
            }
        )*
    };
}

impl_from_decl!(
    Value(ValueDecl),
    Module(ModuleDecl),
    Type(TypeDecl),
    ModuleType(ModuleTypeDecl),
    Class(ClassDecl),
    ClassType(ClassTypeDecl),
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decl_name_and_kind() {
        let decl: Decl = ValueDecl::new("length", TypeExpr::constr("int")).into();
        assert_eq!(decl.name(), "length");
        assert_eq!(decl.kind(), ItemKind::Value);
        assert!(decl.has_runtime_slot());

        let decl: Decl = TypeDecl::abstract_("t").into();
        assert_eq!(decl.kind(), ItemKind::Type);
        assert!(!decl.has_runtime_slot());
    }

    #[test]
    fn item_kind_display() {
        assert_eq!(ItemKind::ModuleType.to_string(), "module type");
        assert_eq!(ItemKind::ClassType.to_string(), "class type");
    }

    #[test]
    fn type_decl_builders() {
        let decl = TypeDecl::alias("t", TypeExpr::var("a")).with_params(["a"]);
        assert_eq!(decl.arity(), 1);
        assert_eq!(decl.kind, TypeKind::Abstract);
        assert_eq!(decl.manifest, Some(TypeExpr::var("a")));
    }

    #[test]
    fn deserialize_with_defaults() {
        let json = r#"{"name": "x", "ty": {"constr": {"path": "int", "args": []}}}"#;
        let field: FieldDecl = serde_json::from_str(json).unwrap();
        assert!(!field.mutable);
        assert_eq!(field.location, Location::default());

        let json = r#"{"name": "None"}"#;
        let ctor: ConstructorDecl = serde_json::from_str(json).unwrap();
        assert_eq!(ctor.args, ConstructorArgs::Tuple(Vec::new()));
    }
}
