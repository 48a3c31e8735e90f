use arrayvec::ArrayVec;

use crate::{LeafType, RecordId, Span, TermId, Type};

/// Identifies a local binder: a function parameter, a `let`, or a shader local.
///
/// Binders are unique within the term or shader that declares them;
/// upstream hygienic renaming guarantees this.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct LocalId(pub u32);

/// Declaration of a local binder together with its source name and type.
#[derive(Clone, Debug, PartialEq)]
pub struct Binding {
    /// The binder expressions refer to.
    pub local: LocalId,
    /// Source-level name, used as the base of the generated identifier.
    pub name: String,
    /// Type of the bound value.
    pub ty: Type,
}

impl Binding {
    /// Declares `local`, named `name`, of type `ty`.
    #[must_use]
    pub fn new(local: LocalId, name: impl Into<String>, ty: impl Into<Type>) -> Self {
        Self {
            local,
            name: name.into(),
            ty: ty.into(),
        }
    }

    /// An expression reading this binder.
    #[must_use]
    pub fn to_expr(&self) -> Expr {
        Expr::local(self.local, self.ty)
    }
}

/// A constant scalar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Literal {
    /// May be `true` or `false`.
    Bool(bool),
    /// May be any 32-bit signed integer.
    Int(i32),
    /// May be any 32-bit unsigned integer.
    Uint(u32),
    /// 32-bit float.
    Float(f32),
}

impl Literal {
    /// The type of the literal.
    #[must_use]
    pub const fn ty(self) -> LeafType {
        match self {
            Self::Bool(_) => LeafType::BOOL,
            Self::Int(_) => LeafType::INT,
            Self::Uint(_) => LeafType::UINT,
            Self::Float(_) => LeafType::FLOAT,
        }
    }
}

/// A vector component selected by a swizzle.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Component {
    /// First component.
    X,
    /// Second component.
    Y,
    /// Third component.
    Z,
    /// Fourth component.
    W,
}

impl Component {
    /// The letter used for this component in `xyzw` swizzle notation.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::X => 'x',
            Self::Y => 'y',
            Self::Z => 'z',
            Self::W => 'w',
        }
    }
}

/// A typed expression.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    /// What the expression computes.
    pub kind: ExprKind,
    /// Type of the value, as determined by type checking.
    pub ty: Type,
    /// Where the expression appears in the source.
    pub span: Span,
}

/// The kinds of [`Expr`].
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    /// A constant.
    Literal(Literal),
    /// Reads a local binder.
    Local(LocalId),
    /// Reads a value term, user-defined or external.
    Term(TermId),
    /// Reads the shader input with this index.
    Input(usize),
    /// Reads the shader parameter with this index.
    Parameter(usize),
    /// Applies a function term, user-defined or external.
    Apply {
        /// The function term.
        function: TermId,
        /// One argument per parameter.
        args: Vec<Expr>,
    },
    /// Evaluates `accept` if `condition` holds and `reject` otherwise.
    If {
        /// A `bool` expression.
        condition: Box<Expr>,
        /// Value if the condition holds.
        accept: Box<Expr>,
        /// Value otherwise; of the same type as `accept`.
        reject: Box<Expr>,
    },
    /// Evaluates `body` with `binding` bound to `value`.
    Let {
        /// The binder, in scope in `body` only.
        binding: Binding,
        /// Value of the binder.
        value: Box<Expr>,
        /// The result.
        body: Box<Expr>,
    },
    /// Constructs a record from its fields, in declaration order.
    Record {
        /// The record type to construct.
        record: RecordId,
        /// One value per field.
        fields: Vec<Expr>,
    },
    /// Projects the field with this index out of a record.
    Field {
        /// A record-typed expression.
        base: Box<Expr>,
        /// Index into the record's fields.
        index: u32,
    },
    /// Selects and reorders components of a vector.
    Swizzle {
        /// A vector-typed expression.
        base: Box<Expr>,
        /// Up to four components, possibly repeated.
        components: ArrayVec<Component, 4>,
    },
}

impl Expr {
    /// An expression of kind `kind` and type `ty`, with an empty span.
    #[must_use]
    pub fn new(kind: ExprKind, ty: impl Into<Type>) -> Self {
        Self {
            kind,
            ty: ty.into(),
            span: Span::default(),
        }
    }

    /// Replaces the span of this expression.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// A constant.
    #[must_use]
    pub fn literal(literal: Literal) -> Self {
        Self::new(ExprKind::Literal(literal), literal.ty())
    }

    /// A `float` constant.
    #[must_use]
    pub fn float(value: f32) -> Self {
        Self::literal(Literal::Float(value))
    }

    /// An `int` constant.
    #[must_use]
    pub fn int(value: i32) -> Self {
        Self::literal(Literal::Int(value))
    }

    /// A `uint` constant.
    #[must_use]
    pub fn uint(value: u32) -> Self {
        Self::literal(Literal::Uint(value))
    }

    /// A `bool` constant.
    #[must_use]
    pub fn bool(value: bool) -> Self {
        Self::literal(Literal::Bool(value))
    }

    /// Reads a local binder.
    #[must_use]
    pub fn local(local: LocalId, ty: impl Into<Type>) -> Self {
        Self::new(ExprKind::Local(local), ty)
    }

    /// Reads a value term.
    #[must_use]
    pub fn term(term: TermId, ty: impl Into<Type>) -> Self {
        Self::new(ExprKind::Term(term), ty)
    }

    /// Reads shader input `index`.
    #[must_use]
    pub fn input(index: usize, ty: impl Into<Type>) -> Self {
        Self::new(ExprKind::Input(index), ty)
    }

    /// Reads shader parameter `index`.
    #[must_use]
    pub fn parameter(index: usize, ty: impl Into<Type>) -> Self {
        Self::new(ExprKind::Parameter(index), ty)
    }

    /// Applies a function term to `args`.
    #[must_use]
    pub fn apply(function: TermId, args: Vec<Expr>, ty: impl Into<Type>) -> Self {
        Self::new(ExprKind::Apply { function, args }, ty)
    }

    /// A conditional; its type is the type of `accept`.
    #[must_use]
    pub fn if_(condition: Expr, accept: Expr, reject: Expr) -> Self {
        let ty = accept.ty;
        Self::new(
            ExprKind::If {
                condition: Box::new(condition),
                accept: Box::new(accept),
                reject: Box::new(reject),
            },
            ty,
        )
    }

    /// A `let` binding; its type is the type of `body`.
    #[must_use]
    pub fn let_(binding: Binding, value: Expr, body: Expr) -> Self {
        let ty = body.ty;
        Self::new(
            ExprKind::Let {
                binding,
                value: Box::new(value),
                body: Box::new(body),
            },
            ty,
        )
    }

    /// Constructs a `record` from one value per field.
    #[must_use]
    pub fn record(record: RecordId, fields: Vec<Expr>) -> Self {
        Self::new(ExprKind::Record { record, fields }, record)
    }

    /// Projects field `index` out of `base`.
    #[must_use]
    pub fn field(base: Expr, index: u32, ty: impl Into<Type>) -> Self {
        Self::new(
            ExprKind::Field {
                base: Box::new(base),
                index,
            },
            ty,
        )
    }

    /// A swizzle of `base`.
    ///
    /// # Panics
    ///
    /// Panics if more than four components are given.
    #[must_use]
    pub fn swizzle(base: Expr, components: &[Component], ty: impl Into<Type>) -> Self {
        let components = components
            .iter()
            .copied()
            .collect::<ArrayVec<Component, 4>>();
        Self::new(
            ExprKind::Swizzle {
                base: Box::new(base),
                components,
            },
            ty,
        )
    }

    /// Calls `visit` on each direct subexpression, in evaluation order.
    pub fn for_each_child<'a>(&'a self, mut visit: impl FnMut(&'a Expr)) {
        match self.kind {
            ExprKind::Literal(_)
            | ExprKind::Local(_)
            | ExprKind::Term(_)
            | ExprKind::Input(_)
            | ExprKind::Parameter(_) => {}
            ExprKind::Apply { ref args, .. } => args.iter().for_each(visit),
            ExprKind::Record { ref fields, .. } => fields.iter().for_each(visit),
            ExprKind::If {
                ref condition,
                ref accept,
                ref reject,
            } => {
                visit(condition);
                visit(accept);
                visit(reject);
            }
            ExprKind::Let {
                ref value,
                ref body,
                ..
            } => {
                visit(value);
                visit(body);
            }
            ExprKind::Field { ref base, .. } | ExprKind::Swizzle { ref base, .. } => visit(base),
        }
    }

    /// Calls `visit` on this expression and, recursively, every subexpression (pre-order).
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Expr)) {
        visit(self);
        self.for_each_child(|child| child.walk(&mut *visit));
    }
}
