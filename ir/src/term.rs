use core::fmt;

use crate::{Binding, Expr, LeafType, Span, Type};

/// Handle to a [`TermDecl`] stored in a [`Program`](crate::Program).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TermId(pub(crate) u32);

impl TermId {
    /// Index of the term in [`Program::terms()`](crate::Program::terms) order.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A global term: a function, a value, or a reference to something external.
#[derive(Clone, Debug, PartialEq)]
pub struct TermDecl {
    /// Source-level name. Overloads of one external may share it.
    pub name: String,
    /// What the term is.
    pub kind: TermKind,
    /// Where the term was declared.
    pub span: Span,
}

/// The kinds of [`TermDecl`].
#[derive(Clone, Debug, PartialEq)]
pub enum TermKind {
    /// A user function.
    Function {
        /// Parameter binders, in scope in `body`.
        params: Vec<Binding>,
        /// Type of `body`.
        result: Type,
        /// The returned value.
        body: Expr,
    },
    /// A user constant.
    Value {
        /// Type of `body`.
        ty: Type,
        /// The value, which may refer to other terms but to no locals.
        body: Expr,
    },
    /// A builtin which is not defined in the shading language itself,
    /// and which each backend implements by hand.
    External(External),
}

/// A reference to a backend-provided builtin.
#[derive(Clone, Debug, PartialEq)]
pub struct External {
    /// The name the backend registers the builtin under, e.g. `"round"`.
    ///
    /// Several terms (overloads) may share one symbol.
    pub symbol: String,
    /// How this particular overload is called or read.
    pub signature: ExternalSignature,
}

/// Whether an external is called or read.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ExternalKind {
    /// Called with arguments.
    Function,
    /// Read like a variable.
    Value,
}

impl fmt::Display for ExternalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Function => "function",
            Self::Value => "value",
        })
    }
}

/// Builtins only ever deal in leaf types.
#[derive(Clone, Debug, PartialEq)]
pub enum ExternalSignature {
    /// A function of `params` returning `result`.
    Function {
        /// One type per argument.
        params: Vec<LeafType>,
        /// Type of the returned value.
        result: LeafType,
    },
    /// A value of this type.
    Value(LeafType),
}

impl ExternalSignature {
    /// Whether the external is called or read.
    #[must_use]
    pub const fn kind(&self) -> ExternalKind {
        match self {
            Self::Function { .. } => ExternalKind::Function,
            Self::Value(_) => ExternalKind::Value,
        }
    }

    /// The type of the value produced by calling or reading the external.
    #[must_use]
    pub const fn result(&self) -> LeafType {
        match *self {
            Self::Function { result, .. } | Self::Value(result) => result,
        }
    }
}
