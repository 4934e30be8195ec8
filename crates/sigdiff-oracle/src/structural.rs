//! A structural compatibility checker.
//!
//! `StructuralOracle` decides inclusion by comparing declarations shape by
//! shape, expanding type abbreviations and named module types through the
//! [`TypingContext`](crate::TypingContext) scopes. It does not implement a
//! full type system (no variance, no object row types), but it is faithful
//! enough to drive the diff engine on real-world snapshots and in tests.

use std::collections::{BTreeMap, HashMap, HashSet};

use sigdiff_types::{
    ClassDecl, ClassTypeDecl, ConstructorArgs, ConstructorDecl, Decl, FieldDecl, ItemKind,
    MethodDecl, ModuleTypeExpr, Signature, TypeDecl, TypeExpr, TypeKind, ValueDecl,
};
use tracing::trace;

use crate::config::OracleConfig;
use crate::context::{enter, key_segments, Env, Frame, Scope};
use crate::error::{OracleError, OracleResult};
use crate::traits::{ClassMismatch, Coercion, CompatibilityOracle};

/// The built-in [`CompatibilityOracle`].
#[derive(Clone, Debug, Default)]
pub struct StructuralOracle {
    config: OracleConfig,
}

impl StructuralOracle {
    pub fn new(config: OracleConfig) -> Self {
        Self { config }
    }

    fn check_signature(
        &self,
        env: Env<'_>,
        expected: &Signature,
        provided: &Signature,
        depth: usize,
    ) -> OracleResult<Coercion> {
        trace!(
            expected = expected.len(),
            provided = provided.len(),
            "signature inclusion"
        );
        // Later declarations shadow earlier ones with the same kind and name.
        let expected_items = latest_items(expected);
        let provided_items = latest_items(provided);

        let mut coercion = Coercion::Identity;
        for decl in expected.exported_decls() {
            let shadowed = expected_items
                .get(&(decl.kind(), decl.name()))
                .is_some_and(|latest| !std::ptr::eq(*latest, decl));
            if shadowed {
                continue;
            }
            let Some(other) = provided_items.get(&(decl.kind(), decl.name())) else {
                return Err(OracleError::incompatible(format!(
                    "{} `{}` is missing",
                    decl.kind(),
                    decl.name()
                )));
            };
            coercion = coercion.and(self.check_item(env, decl, other, depth)?);
        }

        if runtime_slots(expected) != runtime_slots(provided) {
            coercion = Coercion::Required;
        }
        Ok(coercion)
    }

    fn check_item(
        &self,
        env: Env<'_>,
        expected: &Decl,
        provided: &Decl,
        depth: usize,
    ) -> OracleResult<Coercion> {
        match (expected, provided) {
            (Decl::Value(e), Decl::Value(p)) => self.values(env, e, p),
            (Decl::Type(e), Decl::Type(p)) => self.type_declarations(env, e, p),
            (Decl::Module(e), Decl::Module(p)) => {
                let expected_prefix = enter(env.expected.prefix, &e.name);
                let provided_prefix = enter(env.provided.prefix, &p.name);
                let inner = entered(env, &expected_prefix, &provided_prefix);
                self.check_module_type(inner, &e.ty, &p.ty, depth)
            }
            (Decl::ModuleType(e), Decl::ModuleType(p)) => match (&e.definition, &p.definition) {
                (None, _) => Ok(Coercion::Identity),
                (Some(_), None) => Err(OracleError::incompatible(format!(
                    "module type `{}` is abstract",
                    p.name
                ))),
                (Some(e_def), Some(p_def)) => {
                    let expected_prefix = enter(env.expected.prefix, &e.name);
                    let provided_prefix = enter(env.provided.prefix, &p.name);
                    let inner = entered(env, &expected_prefix, &provided_prefix);
                    // Module type declarations must be equivalent, not just included.
                    self.check_module_type(inner, e_def, p_def, depth)?;
                    self.check_module_type(inner.swapped(), p_def, e_def, depth)?;
                    Ok(Coercion::Identity)
                }
            },
            (Decl::Class(e), Decl::Class(p)) => {
                first_mismatch(&e.name, self.class_declarations(env, e, p)?)
            }
            (Decl::ClassType(e), Decl::ClassType(p)) => {
                first_mismatch(&e.name, self.class_type_declarations(env, e, p)?)
            }
            (e, p) => Err(OracleError::Malformed(format!(
                "cannot compare {} `{}` with {} `{}`",
                e.kind(),
                e.name(),
                p.kind(),
                p.name()
            ))),
        }
    }

    fn check_module_type(
        &self,
        env: Env<'_>,
        expected: &ModuleTypeExpr,
        provided: &ModuleTypeExpr,
        depth: usize,
    ) -> OracleResult<Coercion> {
        if let (ModuleTypeExpr::Ident(a), ModuleTypeExpr::Ident(b)) = (expected, provided) {
            let resolved_a = env.expected.scope.resolve_module_type(env.expected.prefix, a);
            let resolved_b = env.provided.scope.resolve_module_type(env.provided.prefix, b);
            match (resolved_a, resolved_b) {
                (None, None) if a == b => return Ok(Coercion::Identity),
                (Some((key_a, def_a)), Some((key_b, def_b))) if key_a == key_b && def_a == def_b => {
                    return Ok(Coercion::Identity)
                }
                _ => {}
            }
        }

        if let ModuleTypeExpr::Ident(path) = expected {
            let (prefix, definition) = self.expand_module_type(env.expected, path, depth)?;
            let inner = Env {
                expected: Frame {
                    scope: env.expected.scope,
                    prefix: &prefix,
                },
                provided: env.provided,
            };
            return self.check_module_type(inner, definition, provided, depth + 1);
        }
        if let ModuleTypeExpr::Ident(path) = provided {
            let (prefix, definition) = self.expand_module_type(env.provided, path, depth)?;
            let inner = Env {
                expected: env.expected,
                provided: Frame {
                    scope: env.provided.scope,
                    prefix: &prefix,
                },
            };
            return self.check_module_type(inner, expected, definition, depth + 1);
        }

        match (expected, provided) {
            (ModuleTypeExpr::Signature(e), ModuleTypeExpr::Signature(p)) => {
                self.check_signature(env, e, p, depth)
            }
            (ModuleTypeExpr::Alias(a), ModuleTypeExpr::Alias(b)) => {
                if a == b {
                    Ok(Coercion::Identity)
                } else {
                    Err(OracleError::incompatible(format!(
                        "alias of `{b}` where an alias of `{a}` was expected"
                    )))
                }
            }
            (
                ModuleTypeExpr::Functor {
                    param: e_param,
                    result: e_result,
                },
                ModuleTypeExpr::Functor {
                    param: p_param,
                    result: p_result,
                },
            ) => {
                let param = match (e_param, p_param) {
                    (None, None) => Coercion::Identity,
                    // Contravariant: the provided functor must accept every
                    // argument the expected one accepts.
                    (Some(e), Some(p)) => {
                        self.check_module_type(env.swapped(), &p.ty, &e.ty, depth)?
                    }
                    _ => {
                        return Err(OracleError::incompatible(
                            "generative and applicative functors differ",
                        ))
                    }
                };
                let result = self.check_module_type(env, e_result, p_result, depth)?;
                Ok(param.and(result))
            }
            (e, p) => Err(OracleError::incompatible(format!(
                "{} where a {} was expected",
                p.describe(),
                e.describe()
            ))),
        }
    }

    fn expand_module_type<'s>(
        &self,
        frame: Frame<'s>,
        path: &str,
        depth: usize,
    ) -> OracleResult<(Vec<String>, &'s ModuleTypeExpr)> {
        if depth >= self.config.max_expansion_depth {
            return Err(OracleError::CyclicAbbreviation(path.to_string()));
        }
        match frame.scope.resolve_module_type(frame.prefix, path) {
            Some((key, Some(definition))) => Ok((key_segments(key), definition)),
            Some((_, None)) => Err(OracleError::incompatible(format!(
                "module type `{path}` is abstract"
            ))),
            None => Err(OracleError::incompatible(format!(
                "module type `{path}` is unknown"
            ))),
        }
    }

    fn check_class(
        &self,
        env: Env<'_>,
        expected: ClassShape<'_>,
        provided: ClassShape<'_>,
    ) -> OracleResult<Vec<ClassMismatch>> {
        let mut mismatches = Vec::new();
        if expected.params.len() != provided.params.len() {
            mismatches.push(ClassMismatch::ParameterArity {
                expected: expected.params.len(),
                provided: provided.params.len(),
            });
        }
        if provided.virtual_ && !expected.virtual_ {
            mismatches.push(ClassMismatch::Virtual);
        }

        let provided_methods: BTreeMap<&str, &MethodDecl> = provided
            .methods
            .iter()
            .map(|m| (m.name.as_str(), m))
            .collect();
        for method in expected.methods {
            let Some(other) = provided_methods.get(method.name.as_str()) else {
                mismatches.push(ClassMismatch::MissingMethod(method.name.clone()));
                continue;
            };
            let mut matcher = Matcher::new(env, &self.config, Mode::Equivalence);
            matcher.bind_params(expected.params, provided.params);
            if !matcher.unify_decl_types(&method.ty, &other.ty)? {
                mismatches.push(ClassMismatch::MethodType {
                    name: method.name.clone(),
                    expected: method.ty.clone(),
                    provided: other.ty.clone(),
                });
            }
            if other.private && !method.private {
                mismatches.push(ClassMismatch::PrivateMethod(method.name.clone()));
            }
            if other.virtual_ && !method.virtual_ {
                mismatches.push(ClassMismatch::VirtualMethod(method.name.clone()));
            }
        }

        let expected_names: HashSet<&str> =
            expected.methods.iter().map(|m| m.name.as_str()).collect();
        for method in provided.methods {
            if !method.private && !expected_names.contains(method.name.as_str()) {
                mismatches.push(ClassMismatch::ExtraMethod(method.name.clone()));
            }
        }
        Ok(mismatches)
    }
}

impl CompatibilityOracle for StructuralOracle {
    fn values(
        &self,
        env: Env<'_>,
        expected: &ValueDecl,
        provided: &ValueDecl,
    ) -> OracleResult<Coercion> {
        let mut matcher = Matcher::new(env, &self.config, Mode::Instance);
        if !matcher.unify_decl_types(&expected.ty, &provided.ty)? {
            return Err(OracleError::incompatible(format!(
                "value `{}` has type {} but {} was expected",
                provided.name, provided.ty, expected.ty
            )));
        }
        match (&expected.primitive, &provided.primitive) {
            (None, None) => Ok(Coercion::Identity),
            (None, Some(_)) => Ok(Coercion::Required),
            (Some(_), None) => Err(OracleError::incompatible(format!(
                "value `{}` is not an external primitive",
                provided.name
            ))),
            (Some(a), Some(b)) if a == b => Ok(Coercion::Identity),
            (Some(a), Some(b)) => Err(OracleError::incompatible(format!(
                "external `{}` is bound to \"{b}\" where \"{a}\" was expected",
                provided.name
            ))),
        }
    }

    fn type_declarations(
        &self,
        env: Env<'_>,
        expected: &TypeDecl,
        provided: &TypeDecl,
    ) -> OracleResult<Coercion> {
        let name = &expected.name;
        if expected.arity() != provided.arity() {
            return Err(OracleError::incompatible(format!(
                "type `{name}` has {} parameter(s) but {} were expected",
                provided.arity(),
                expected.arity()
            )));
        }

        let mut matcher = Matcher::new(env, &self.config, Mode::Equivalence);
        matcher.bind_params(&expected.params, &provided.params);

        if let Some(manifest) = &expected.manifest {
            let Some(other) = &provided.manifest else {
                return Err(OracleError::incompatible(format!(
                    "type `{name}` is no longer equal to {manifest}"
                )));
            };
            if !matcher.unify_decl_types(manifest, other)? {
                return Err(OracleError::incompatible(format!(
                    "type `{name}` is equal to {other} but {manifest} was expected"
                )));
            }
        }

        let exposes_structure =
            expected.manifest.is_some() || !matches!(expected.kind, TypeKind::Abstract);
        if provided.private && !expected.private && exposes_structure {
            return Err(OracleError::incompatible(format!(
                "type `{name}` is private"
            )));
        }

        match (&expected.kind, &provided.kind) {
            (TypeKind::Abstract, _) | (TypeKind::Open, TypeKind::Open) => {}
            (TypeKind::Record(e), TypeKind::Record(p)) => {
                check_fields(&mut matcher, name, e, p)?;
            }
            (TypeKind::Variant(e), TypeKind::Variant(p)) => {
                check_constructors(&mut matcher, name, e, p)?;
            }
            (e, p) => {
                return Err(OracleError::incompatible(format!(
                    "type `{name}` is {} but {} was expected",
                    p.describe(),
                    e.describe()
                )))
            }
        }
        Ok(Coercion::Identity)
    }

    fn type_exprs(
        &self,
        env: Env<'_>,
        params: (&[String], &[String]),
        expected: &[TypeExpr],
        provided: &[TypeExpr],
    ) -> OracleResult<Vec<bool>> {
        if expected.len() != provided.len() {
            return Err(OracleError::Malformed(format!(
                "{} expected type(s) paired with {} provided",
                expected.len(),
                provided.len()
            )));
        }
        let mut matcher = Matcher::new(env, &self.config, Mode::Equivalence);
        matcher.bind_params(params.0, params.1);
        expected
            .iter()
            .zip(provided)
            .map(|(e, p)| matcher.unify_or_restore(e, p))
            .collect()
    }

    fn class_declarations(
        &self,
        env: Env<'_>,
        expected: &ClassDecl,
        provided: &ClassDecl,
    ) -> OracleResult<Vec<ClassMismatch>> {
        self.check_class(env, expected.into(), provided.into())
    }

    fn class_type_declarations(
        &self,
        env: Env<'_>,
        expected: &ClassTypeDecl,
        provided: &ClassTypeDecl,
    ) -> OracleResult<Vec<ClassMismatch>> {
        self.check_class(env, expected.into(), provided.into())
    }

    fn signatures(
        &self,
        env: Env<'_>,
        expected: &Signature,
        provided: &Signature,
    ) -> OracleResult<Coercion> {
        self.check_signature(env, expected, provided, 0)
    }

    fn module_types(
        &self,
        env: Env<'_>,
        expected: &ModuleTypeExpr,
        provided: &ModuleTypeExpr,
    ) -> OracleResult<Coercion> {
        self.check_module_type(env, expected, provided, 0)
    }
}

/// The parts of a class or class type that take part in inclusion.
#[derive(Clone, Copy)]
struct ClassShape<'d> {
    params: &'d [String],
    virtual_: bool,
    methods: &'d [MethodDecl],
}

impl<'d> From<&'d ClassDecl> for ClassShape<'d> {
    fn from(decl: &'d ClassDecl) -> Self {
        Self {
            params: &decl.params,
            virtual_: decl.virtual_,
            methods: &decl.methods,
        }
    }
}

impl<'d> From<&'d ClassTypeDecl> for ClassShape<'d> {
    fn from(decl: &'d ClassTypeDecl) -> Self {
        Self {
            params: &decl.params,
            virtual_: decl.virtual_,
            methods: &decl.methods,
        }
    }
}

fn first_mismatch(name: &str, mismatches: Vec<ClassMismatch>) -> OracleResult<Coercion> {
    match mismatches.first() {
        None => Ok(Coercion::Identity),
        Some(first) => Err(OracleError::incompatible(format!("class `{name}`: {first}"))),
    }
}

fn entered<'e>(env: Env<'e>, expected_prefix: &'e [String], provided_prefix: &'e [String]) -> Env<'e> {
    Env {
        expected: Frame {
            scope: env.expected.scope,
            prefix: expected_prefix,
        },
        provided: Frame {
            scope: env.provided.scope,
            prefix: provided_prefix,
        },
    }
}

fn latest_items(signature: &Signature) -> HashMap<(ItemKind, &str), &Decl> {
    signature
        .exported_decls()
        .map(|decl| ((decl.kind(), decl.name()), decl))
        .collect()
}

fn runtime_slots(signature: &Signature) -> Vec<(ItemKind, &str)> {
    signature
        .exported_decls()
        .filter(|decl| decl.has_runtime_slot())
        .map(|decl| (decl.kind(), decl.name()))
        .collect()
}

fn check_fields(
    matcher: &mut Matcher<'_>,
    owner: &str,
    expected: &[FieldDecl],
    provided: &[FieldDecl],
) -> OracleResult<()> {
    if expected.len() != provided.len() {
        return Err(OracleError::incompatible(format!(
            "record `{owner}` has {} field(s) but {} were expected",
            provided.len(),
            expected.len()
        )));
    }
    for (e, p) in expected.iter().zip(provided) {
        if e.name != p.name {
            return Err(OracleError::incompatible(format!(
                "record `{owner}` has field `{}` where `{}` was expected",
                p.name, e.name
            )));
        }
        if e.mutable != p.mutable {
            return Err(OracleError::incompatible(format!(
                "field `{}` of `{owner}` changed mutability",
                e.name
            )));
        }
        if !matcher.unify_decl_types(&e.ty, &p.ty)? {
            return Err(OracleError::incompatible(format!(
                "field `{}` of `{owner}` has type {} but {} was expected",
                e.name, p.ty, e.ty
            )));
        }
    }
    Ok(())
}

fn check_constructors(
    matcher: &mut Matcher<'_>,
    owner: &str,
    expected: &[ConstructorDecl],
    provided: &[ConstructorDecl],
) -> OracleResult<()> {
    if expected.len() != provided.len() {
        return Err(OracleError::incompatible(format!(
            "variant `{owner}` has {} constructor(s) but {} were expected",
            provided.len(),
            expected.len()
        )));
    }
    for (e, p) in expected.iter().zip(provided) {
        if e.name != p.name {
            return Err(OracleError::incompatible(format!(
                "variant `{owner}` has constructor `{}` where `{}` was expected",
                p.name, e.name
            )));
        }
        // A constructor with a result annotation quantifies its own variables.
        let mut local = Matcher::new(matcher.env, matcher.config, matcher.mode);
        let matcher = if e.result.is_some() || p.result.is_some() {
            &mut local
        } else {
            &mut *matcher
        };
        let args_match = match (&e.args, &p.args) {
            (ConstructorArgs::Tuple(a), ConstructorArgs::Tuple(b)) => {
                a.len() == b.len() && matcher.unify_all_decl_types(a, b)?
            }
            (ConstructorArgs::Record(a), ConstructorArgs::Record(b)) => {
                check_fields(matcher, &format!("{owner}.{}", e.name), a, b)?;
                true
            }
            _ => false,
        };
        let result_match = match (&e.result, &p.result) {
            (None, None) => true,
            (Some(a), Some(b)) => matcher.unify_decl_types(a, b)?,
            _ => false,
        };
        if !args_match || !result_match {
            return Err(OracleError::incompatible(format!(
                "constructor `{}` of `{owner}` changed",
                e.name
            )));
        }
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Variables of the provided type may be instantiated; expected
    /// variables are rigid.
    Instance,
    /// Variables on both sides must correspond one to one.
    Equivalence,
}

#[derive(Clone, Copy, Debug)]
enum Side {
    Expected,
    Provided,
}

/// Unification state for one check.
struct Matcher<'a> {
    env: Env<'a>,
    config: &'a OracleConfig,
    mode: Mode,
    /// Instance mode: provided variable to expected type.
    bindings: HashMap<String, TypeExpr>,
    /// Equivalence mode: variable renaming in both directions.
    forward: HashMap<String, String>,
    backward: HashMap<String, String>,
    /// Abbreviation expansions on the current unification path.
    depth: usize,
}

impl<'a> Matcher<'a> {
    fn new(env: Env<'a>, config: &'a OracleConfig, mode: Mode) -> Self {
        Self {
            env,
            config,
            mode,
            bindings: HashMap::new(),
            forward: HashMap::new(),
            backward: HashMap::new(),
            depth: 0,
        }
    }

    fn frame(&self, side: Side) -> Frame<'a> {
        match side {
            Side::Expected => self.env.expected,
            Side::Provided => self.env.provided,
        }
    }

    fn bind_params(&mut self, expected: &[String], provided: &[String]) {
        for (e, p) in expected.iter().zip(provided) {
            self.forward.insert(e.clone(), p.clone());
            self.backward.insert(p.clone(), e.clone());
        }
    }

    /// Unify two type expressions written in the expected and provided
    /// declarations respectively.
    fn unify_decl_types(&mut self, expected: &TypeExpr, provided: &TypeExpr) -> OracleResult<bool> {
        let e = self.frame(Side::Expected);
        let p = self.frame(Side::Provided);
        let expected = canonicalize(e.scope, e.prefix, expected);
        let provided = canonicalize(p.scope, p.prefix, provided);
        self.unify(&expected, &provided)
    }

    /// Like [`Self::unify_decl_types`], but a failed match leaves the
    /// variable renaming as it was.
    fn unify_or_restore(&mut self, expected: &TypeExpr, provided: &TypeExpr) -> OracleResult<bool> {
        let forward = self.forward.clone();
        let backward = self.backward.clone();
        let matched = self.unify_decl_types(expected, provided)?;
        if !matched {
            self.forward = forward;
            self.backward = backward;
        }
        Ok(matched)
    }

    fn unify_all_decl_types(
        &mut self,
        expected: &[TypeExpr],
        provided: &[TypeExpr],
    ) -> OracleResult<bool> {
        for (e, p) in expected.iter().zip(provided) {
            if !self.unify_decl_types(e, p)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn unify(&mut self, expected: &TypeExpr, provided: &TypeExpr) -> OracleResult<bool> {
        let (expected, e_steps) = self.normalize(Side::Expected, expected)?;
        let (provided, p_steps) = self.normalize(Side::Provided, provided)?;
        let steps = e_steps + p_steps;
        self.depth += steps;
        if self.depth > self.config.max_expansion_depth {
            return Err(OracleError::CyclicAbbreviation(expected.to_string()));
        }
        let result = self.unify_normalized(&expected, &provided);
        self.depth -= steps;
        result
    }

    fn unify_normalized(&mut self, expected: &TypeExpr, provided: &TypeExpr) -> OracleResult<bool> {
        match (expected, provided) {
            (_, TypeExpr::Var(var)) if self.mode == Mode::Instance => self.bind(var, expected),
            (TypeExpr::Var(a), TypeExpr::Var(b)) => Ok(self.rename(a, b)),
            (
                TypeExpr::Constr { path: pe, args: ae },
                TypeExpr::Constr { path: pp, args: ap },
            ) => {
                if pe != pp || ae.len() != ap.len() {
                    return Ok(false);
                }
                self.unify_all(ae, ap)
            }
            (
                TypeExpr::Arrow {
                    label: le,
                    param: pe,
                    result: re,
                },
                TypeExpr::Arrow {
                    label: lp,
                    param: pp,
                    result: rp,
                },
            ) => Ok(le == lp && self.unify(pe, pp)? && self.unify(re, rp)?),
            (TypeExpr::Tuple(xe), TypeExpr::Tuple(xp)) => {
                if xe.len() != xp.len() {
                    return Ok(false);
                }
                self.unify_all(xe, xp)
            }
            _ => Ok(false),
        }
    }

    fn unify_all(&mut self, expected: &[TypeExpr], provided: &[TypeExpr]) -> OracleResult<bool> {
        for (e, p) in expected.iter().zip(provided) {
            if !self.unify(e, p)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn bind(&mut self, var: &str, expected: &TypeExpr) -> OracleResult<bool> {
        match self.bindings.get(var).cloned() {
            Some(bound) => {
                let bound = self.deep_normalize(Side::Expected, &bound, 0)?;
                let expected = self.deep_normalize(Side::Expected, expected, 0)?;
                Ok(bound == expected)
            }
            None => {
                self.bindings.insert(var.to_string(), expected.clone());
                Ok(true)
            }
        }
    }

    fn rename(&mut self, expected: &str, provided: &str) -> bool {
        match (self.forward.get(expected), self.backward.get(provided)) {
            (Some(p), Some(e)) => p == provided && e == expected,
            (None, None) => {
                self.forward.insert(expected.to_string(), provided.to_string());
                self.backward.insert(provided.to_string(), expected.to_string());
                true
            }
            _ => false,
        }
    }

    /// Expand abbreviations at the head of `ty` until a non-abbreviation is
    /// reached. Returns the expansion count.
    fn normalize(&self, side: Side, ty: &TypeExpr) -> OracleResult<(TypeExpr, usize)> {
        let mut current = ty.clone();
        let mut steps = 0;
        while let Some(next) = self.expand_head(side, &current)? {
            steps += 1;
            if steps > self.config.max_expansion_depth {
                return Err(OracleError::CyclicAbbreviation(ty.to_string()));
            }
            current = next;
        }
        Ok((current, steps))
    }

    fn deep_normalize(&self, side: Side, ty: &TypeExpr, depth: usize) -> OracleResult<TypeExpr> {
        if depth > self.config.max_expansion_depth {
            return Err(OracleError::CyclicAbbreviation(ty.to_string()));
        }
        let (head, steps) = self.normalize(side, ty)?;
        let depth = depth + steps;
        Ok(match head {
            TypeExpr::Var(_) => head,
            TypeExpr::Constr { path, args } => TypeExpr::Constr {
                path,
                args: args
                    .iter()
                    .map(|arg| self.deep_normalize(side, arg, depth))
                    .collect::<OracleResult<_>>()?,
            },
            TypeExpr::Arrow {
                label,
                param,
                result,
            } => TypeExpr::Arrow {
                label,
                param: Box::new(self.deep_normalize(side, &param, depth)?),
                result: Box::new(self.deep_normalize(side, &result, depth)?),
            },
            TypeExpr::Tuple(items) => TypeExpr::Tuple(
                items
                    .iter()
                    .map(|item| self.deep_normalize(side, item, depth))
                    .collect::<OracleResult<_>>()?,
            ),
        })
    }

    /// One abbreviation step. `ty` must be canonical.
    fn expand_head(&self, side: Side, ty: &TypeExpr) -> OracleResult<Option<TypeExpr>> {
        if !self.config.expand_abbreviations {
            return Ok(None);
        }
        let TypeExpr::Constr { path, args } = ty else {
            return Ok(None);
        };
        let frame = self.frame(side);
        let Some(scoped) = frame.scope.type_by_key(path) else {
            return Ok(None);
        };
        let Some(manifest) = &scoped.decl.manifest else {
            return Ok(None);
        };
        if scoped.decl.arity() != args.len() {
            return Err(OracleError::Malformed(format!(
                "type `{path}` expects {} argument(s) but is applied to {}",
                scoped.decl.arity(),
                args.len()
            )));
        }
        let body = canonicalize(frame.scope, &scoped.prefix, manifest);
        let substitution: HashMap<&str, &TypeExpr> = scoped
            .decl
            .params
            .iter()
            .map(String::as_str)
            .zip(args)
            .collect();
        Ok(Some(substitute(&body, &substitution)))
    }
}

/// Rewrite every type constructor path to the canonical key it resolves to.
/// Unresolved paths (builtins, external libraries) are left untouched.
fn canonicalize(scope: &Scope, prefix: &[String], ty: &TypeExpr) -> TypeExpr {
    match ty {
        TypeExpr::Var(_) => ty.clone(),
        TypeExpr::Constr { path, args } => TypeExpr::Constr {
            path: scope
                .resolve_type(prefix, path)
                .map_or_else(|| path.clone(), |(key, _)| key.to_string()),
            args: args
                .iter()
                .map(|arg| canonicalize(scope, prefix, arg))
                .collect(),
        },
        TypeExpr::Arrow {
            label,
            param,
            result,
        } => TypeExpr::Arrow {
            label: label.clone(),
            param: Box::new(canonicalize(scope, prefix, param)),
            result: Box::new(canonicalize(scope, prefix, result)),
        },
        TypeExpr::Tuple(items) => TypeExpr::Tuple(
            items
                .iter()
                .map(|item| canonicalize(scope, prefix, item))
                .collect(),
        ),
    }
}

fn substitute(ty: &TypeExpr, substitution: &HashMap<&str, &TypeExpr>) -> TypeExpr {
    match ty {
        TypeExpr::Var(name) => substitution
            .get(name.as_str())
            .map_or_else(|| ty.clone(), |&replacement| replacement.clone()),
        TypeExpr::Constr { path, args } => TypeExpr::Constr {
            path: path.clone(),
            args: args.iter().map(|arg| substitute(arg, substitution)).collect(),
        },
        TypeExpr::Arrow {
            label,
            param,
            result,
        } => TypeExpr::Arrow {
            label: label.clone(),
            param: Box::new(substitute(param, substitution)),
            result: Box::new(substitute(result, substitution)),
        },
        TypeExpr::Tuple(items) => {
            TypeExpr::Tuple(items.iter().map(|item| substitute(item, substitution)).collect())
        }
    }
}
