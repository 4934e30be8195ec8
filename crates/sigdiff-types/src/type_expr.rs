use std::fmt;

use serde::{Deserialize, Serialize};

/// Label attached to a function parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    /// Positional parameter.
    #[default]
    Nolabel,
    /// `~name:` parameter.
    Labelled(String),
    /// `?name:` parameter.
    Optional(String),
}

/// A type expression as it appears in a declaration.
///
/// Paths are dotted strings (`int`, `M.t`, `Stdlib.List.t`). Type variables
/// are stored without the leading quote.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeExpr {
    /// A type variable, `'a`.
    Var(String),
    /// A type constructor applied to arguments, `(int, string) Hashtbl.t`.
    Constr { path: String, args: Vec<TypeExpr> },
    /// A function type.
    Arrow {
        #[serde(default)]
        label: Label,
        param: Box<TypeExpr>,
        result: Box<TypeExpr>,
    },
    /// A tuple type, `int * string`.
    Tuple(Vec<TypeExpr>),
}

impl TypeExpr {
    /// A type variable.
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    /// A nullary type constructor such as `int`.
    pub fn constr(path: impl Into<String>) -> Self {
        Self::Constr {
            path: path.into(),
            args: Vec::new(),
        }
    }

    /// A type constructor applied to arguments.
    pub fn apply(path: impl Into<String>, args: Vec<TypeExpr>) -> Self {
        Self::Constr {
            path: path.into(),
            args,
        }
    }

    /// An unlabelled function type.
    pub fn arrow(param: TypeExpr, result: TypeExpr) -> Self {
        Self::Arrow {
            label: Label::Nolabel,
            param: Box::new(param),
            result: Box::new(result),
        }
    }

    /// A function type with a labelled or optional parameter.
    pub fn labelled_arrow(label: Label, param: TypeExpr, result: TypeExpr) -> Self {
        Self::Arrow {
            label,
            param: Box::new(param),
            result: Box::new(result),
        }
    }

    /// A tuple type.
    pub fn tuple(items: Vec<TypeExpr>) -> Self {
        Self::Tuple(items)
    }

    /// Collect the distinct type variables, in order of first occurrence.
    pub fn free_vars(&self) -> Vec<&str> {
        let mut vars = Vec::new();
        self.collect_vars(&mut vars);
        vars
    }

    fn collect_vars<'a>(&'a self, vars: &mut Vec<&'a str>) {
        match self {
            Self::Var(name) => {
                if !vars.contains(&name.as_str()) {
                    vars.push(name);
                }
            }
            Self::Constr { args, .. } => args.iter().for_each(|a| a.collect_vars(vars)),
            Self::Arrow { param, result, .. } => {
                param.collect_vars(vars);
                result.collect_vars(vars);
            }
            Self::Tuple(items) => items.iter().for_each(|i| i.collect_vars(vars)),
        }
    }

    fn fmt_prec(&self, f: &mut fmt::Formatter<'_>, prec: u8) -> fmt::Result {
        // 0: arrow position, 1: tuple component, 2: constructor argument
        match self {
            Self::Var(name) => write!(f, "'{name}"),
            Self::Constr { path, args } => {
                match args.as_slice() {
                    [] => {}
                    [arg] => {
                        arg.fmt_prec(f, 2)?;
                        f.write_str(" ")?;
                    }
                    args => {
                        f.write_str("(")?;
                        for (i, arg) in args.iter().enumerate() {
                            if i > 0 {
                                f.write_str(", ")?;
                            }
                            arg.fmt_prec(f, 0)?;
                        }
                        f.write_str(") ")?;
                    }
                }
                f.write_str(path)
            }
            Self::Arrow {
                label,
                param,
                result,
            } => {
                if prec > 0 {
                    f.write_str("(")?;
                }
                match label {
                    Label::Nolabel => {}
                    Label::Labelled(l) => write!(f, "{l}:")?,
                    Label::Optional(l) => write!(f, "?{l}:")?,
                }
                param.fmt_prec(f, 1)?;
                f.write_str(" -> ")?;
                result.fmt_prec(f, 0)?;
                if prec > 0 {
                    f.write_str(")")?;
                }
                Ok(())
            }
            Self::Tuple(items) => {
                if prec > 1 {
                    f.write_str("(")?;
                }
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" * ")?;
                    }
                    item.fmt_prec(f, 2)?;
                }
                if prec > 1 {
                    f.write_str(")")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_prec(f, 0)
    }
}
