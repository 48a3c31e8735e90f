/*!
The dialect AST: a version-specific GLSL program, ready to be rendered.

Everything here is already named with final GLSL identifiers, and every construct is one the
target version's grammar allows (conditional expressions have been hoisted into statements,
builtins have been resolved to native operators or calls, parameters have been flattened).
*/

use core::fmt;

use arrayvec::ArrayVec;
use shadeport_ir::{Component, LeafType, Literal, RecordId, Stage, TermId};

use crate::DialectVersion;

/// A GLSL type: a leaf type, or a struct declared by name.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Type {
    /// A builtin type.
    Leaf(LeafType),
    /// A struct declared by the shader, by its GLSL name.
    Struct(String),
}

impl Type {
    /// Returns the leaf type, if this is not a struct.
    #[must_use]
    pub fn as_leaf(&self) -> Option<LeafType> {
        match *self {
            Self::Leaf(leaf) => Some(leaf),
            Self::Struct(_) => None,
        }
    }
}

impl From<LeafType> for Type {
    fn from(value: LeafType) -> Self {
        Self::Leaf(value)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(leaf) => leaf.fmt(f),
            Self::Struct(name) => f.write_str(name),
        }
    }
}

/// Operation that can be applied on two values.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`, which is the linear algebra product for matrices and vectors.
    Multiply,
    /// `/`
    Divide,
    /// `%`, integers only.
    Modulo,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `&&`
    LogicalAnd,
    /// `||`
    LogicalOr,
    /// `^^`
    LogicalXor,
    /// `&`
    And,
    /// `|`
    InclusiveOr,
    /// `^`
    ExclusiveOr,
    /// `<<`
    ShiftLeft,
    /// `>>`
    ShiftRight,
}

/// Operation that can be applied on a single value.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum UnaryOp {
    /// `-`
    Negate,
    /// `!`
    LogicalNot,
    /// `~`
    BitwiseNot,
}

/// What a call expression calls.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Callee {
    /// A builtin function or type constructor of the dialect.
    Native(&'static str),
    /// A function or struct declared in the shader itself, including emulations.
    User(String),
}

impl Callee {
    /// The GLSL identifier called.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Native(name) => *name,
            Self::User(name) => name.as_str(),
        }
    }
}

/// An expression of the dialect.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A constant.
    Literal(Literal),
    /// A variable, parameter, uniform, interface variable, or constant declared by the shader.
    Var(String),
    /// A builtin variable of the dialect, such as `gl_FragCoord`.
    Builtin(&'static str),
    /// A function call or constructor.
    Call {
        /// What is called.
        callee: Callee,
        /// In parameter order.
        args: Vec<Expr>,
    },
    /// `left op right`
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// `op operand`
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
    },
    /// A struct member access.
    Field {
        /// A struct-typed expression.
        base: Box<Expr>,
        /// The GLSL name of the member.
        field: String,
    },
    /// Selects and reorders vector components.
    Swizzle {
        /// A vector-typed expression.
        base: Box<Expr>,
        /// Up to four components, possibly repeated.
        components: ArrayVec<Component, 4>,
    },
    /// Indexing with a constant, as in `m[1]` for a matrix column.
    Index {
        /// A vector or matrix expression.
        base: Box<Expr>,
        /// Component or column index.
        index: u32,
    },
}

impl Expr {
    /// Reads the variable `name`.
    #[must_use]
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    /// `left op right`
    #[must_use]
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// `op operand`
    #[must_use]
    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Self::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// Calls the builtin `function`.
    #[must_use]
    pub fn native(function: &'static str, args: Vec<Expr>) -> Self {
        Self::Call {
            callee: Callee::Native(function),
            args,
        }
    }

    /// `self[index]`
    #[must_use]
    pub fn index(self, index: u32) -> Self {
        Self::Index {
            base: Box::new(self),
            index,
        }
    }

    /// Calls `visit` on this expression and every subexpression (pre-order).
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Expr)) {
        visit(self);
        match self {
            Self::Literal(_) | Self::Var(_) | Self::Builtin(_) => {}
            Self::Call { args, .. } => {
                for arg in args {
                    arg.walk(visit);
                }
            }
            Self::Binary { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            Self::Unary { operand: base, .. }
            | Self::Field { base, .. }
            | Self::Swizzle { base, .. }
            | Self::Index { base, .. } => base.walk(visit),
        }
    }
}

/// A statement of a function body or of `main()`.
#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    /// Declares a local variable, optionally initialized.
    Local {
        /// The GLSL identifier.
        name: String,
        /// Declared type.
        ty: Type,
        /// Initial value, if any.
        init: Option<Expr>,
    },
    /// `target = value;`
    Assign {
        /// A variable in scope.
        target: String,
        /// The assigned value.
        value: Expr,
    },
    /// `if (condition) { accept } else { reject }`, with the `else` omitted if empty.
    If {
        /// A `bool` expression.
        condition: Expr,
        /// Runs if the condition holds.
        accept: Vec<Stmt>,
        /// Runs otherwise.
        reject: Vec<Stmt>,
    },
    /// A nested scope.
    Block(Vec<Stmt>),
    /// Returns from the enclosing function.
    Return(Expr),
}

impl Stmt {
    /// Calls `visit_stmt` on this statement and every nested statement, and `visit_expr` on
    /// every expression they contain.
    pub fn walk<'a>(
        &'a self,
        visit_stmt: &mut impl FnMut(&'a Stmt),
        visit_expr: &mut impl FnMut(&'a Expr),
    ) {
        visit_stmt(self);
        match self {
            Self::Local { init, .. } => {
                if let Some(init) = init {
                    init.walk(visit_expr);
                }
            }
            Self::Assign { value, .. } | Self::Return(value) => value.walk(visit_expr),
            Self::If {
                condition,
                accept,
                reject,
            } => {
                condition.walk(visit_expr);
                for stmt in accept.iter().chain(reject) {
                    stmt.walk(visit_stmt, visit_expr);
                }
            }
            Self::Block(body) => {
                for stmt in body {
                    stmt.walk(visit_stmt, visit_expr);
                }
            }
        }
    }
}

/// Where a declaration came from.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Origin {
    /// A record, declared as a struct.
    Record {
        /// The source declaration.
        id: RecordId,
        /// Source-level name.
        name: String,
    },
    /// A user function or value.
    Term {
        /// The source declaration.
        id: TermId,
        /// Source-level name.
        name: String,
    },
    /// A replacement body for an external which is not native to the target version.
    Emulation {
        /// The registered name of the external.
        symbol: String,
    },
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Record { name, .. } => write!(f, "record {name}"),
            Self::Term { name, .. } => write!(f, "term {name}"),
            Self::Emulation { symbol } => write!(f, "emulation of {symbol}"),
        }
    }
}

/// One member of a struct declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct StructField {
    /// The GLSL identifier.
    pub name: String,
    /// Declared type.
    pub ty: Type,
}

/// One parameter of a function declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    /// The GLSL identifier.
    pub name: String,
    /// Declared type.
    pub ty: Type,
}

/// What a [`Declaration`] declares.
#[derive(Clone, Debug, PartialEq)]
pub enum DeclarationKind {
    /// A struct type.
    Struct {
        /// In declaration order.
        fields: Vec<StructField>,
    },
    /// A function.
    Function {
        /// In declaration order.
        params: Vec<Param>,
        /// Return type.
        result: Type,
        /// Ends with a return on every path.
        body: Vec<Stmt>,
    },
    /// A `const` global.
    Constant {
        /// Declared type.
        ty: Type,
        /// A constant expression.
        value: Expr,
    },
}

/// A global declaration of the shader.
#[derive(Clone, Debug, PartialEq)]
pub struct Declaration {
    /// The GLSL identifier.
    pub name: String,
    /// What the declaration was generated from.
    pub origin: Origin,
    /// What is declared.
    pub kind: DeclarationKind,
}

impl Declaration {
    /// Every identifier this declaration mentions: types, callees and variables.
    ///
    /// Locals and parameters are included; callers interested in references to other
    /// declarations should filter by declared names.
    #[must_use]
    pub fn mentions(&self) -> Vec<&str> {
        let mut names = Vec::new();
        match &self.kind {
            DeclarationKind::Struct { fields } => {
                for field in fields {
                    type_mention(&field.ty, &mut names);
                }
            }
            DeclarationKind::Function {
                params,
                result,
                body,
            } => {
                for param in params {
                    type_mention(&param.ty, &mut names);
                }
                type_mention(result, &mut names);
                let mut locals = Vec::new();
                let mut exprs = Vec::new();
                for stmt in body {
                    stmt.walk(
                        &mut |stmt| {
                            if let Stmt::Local { ty, .. } = stmt {
                                locals.push(ty);
                            }
                        },
                        &mut |expr| exprs.push(expr),
                    );
                }
                for ty in locals {
                    type_mention(ty, &mut names);
                }
                for expr in exprs {
                    expr_mention(expr, &mut names);
                }
            }
            DeclarationKind::Constant { ty, value } => {
                type_mention(ty, &mut names);
                value.walk(&mut |expr| expr_mention(expr, &mut names));
            }
        }
        names
    }
}

fn type_mention<'a>(ty: &'a Type, names: &mut Vec<&'a str>) {
    if let Type::Struct(name) = ty {
        names.push(name);
    }
}

fn expr_mention<'a>(expr: &'a Expr, names: &mut Vec<&'a str>) {
    match expr {
        Expr::Var(name)
        | Expr::Call {
            callee: Callee::User(name),
            ..
        } => names.push(name),
        _ => {}
    }
}

/// How an interface variable is qualified in the target version.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Storage {
    /// Legacy vertex input.
    Attribute,
    /// Legacy vertex output or fragment input.
    Varying,
    /// An `in` variable.
    In {
        /// Qualified `flat`.
        flat: bool,
    },
    /// An `out` variable.
    Out {
        /// Qualified `flat`.
        flat: bool,
        /// Explicit `layout(location = n)`, on fragment outputs only.
        location: Option<u32>,
    },
}

/// A declared shader input or output.
#[derive(Clone, Debug, PartialEq)]
pub struct InterfaceVar {
    /// The GLSL identifier.
    pub name: String,
    /// Declared type.
    pub ty: LeafType,
    /// How the variable is qualified.
    pub storage: Storage,
}

/// A flattened uniform.
#[derive(Clone, Debug, PartialEq)]
pub struct Uniform {
    /// The GLSL identifier.
    pub name: String,
    /// The dotted path through the source parameter, by which the runtime binds the value.
    pub wire_name: String,
    /// Declared type.
    pub ty: LeafType,
}

/// Where an output value is written.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Sink {
    /// A declared `out` or `varying` variable.
    Variable(String),
    /// `gl_Position`.
    Position,
    /// `gl_FragColor`.
    FragColor,
    /// `gl_FragData[n]`.
    FragData(u32),
    /// `gl_FragDepth`.
    FragDepth,
}

/// The final assignment of one shader output.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputWrite {
    /// Where the value goes.
    pub sink: Sink,
    /// Type of the value, which may differ from the declared output type.
    pub ty: LeafType,
    /// The assigned value.
    pub value: Expr,
}

/// Discards the fragment if `condition` holds.
#[derive(Clone, Debug, PartialEq)]
pub struct Discard {
    /// A `bool` expression.
    pub condition: Expr,
}

/// The body of `main()`.
///
/// Discards and output writes are kept apart from the statements and are always
/// rendered after them, in that order.
#[derive(Clone, Debug, PartialEq)]
pub enum MainBody {
    /// The body of a vertex shader.
    Vertex {
        /// Shader locals.
        statements: Vec<Stmt>,
        /// One write per output.
        outputs: Vec<OutputWrite>,
    },
    /// The body of a fragment shader.
    Fragment {
        /// Shader locals.
        statements: Vec<Stmt>,
        /// In source order.
        discards: Vec<Discard>,
        /// One write per output.
        outputs: Vec<OutputWrite>,
    },
}

impl MainBody {
    /// The statements computing the shader locals.
    #[must_use]
    pub fn statements(&self) -> &[Stmt] {
        match self {
            Self::Vertex { statements, .. } | Self::Fragment { statements, .. } => statements,
        }
    }

    /// The conditional discards; always empty for vertex shaders.
    #[must_use]
    pub fn discards(&self) -> &[Discard] {
        match self {
            Self::Vertex { .. } => &[],
            Self::Fragment { discards, .. } => discards,
        }
    }

    /// The output writes.
    #[must_use]
    pub fn outputs(&self) -> &[OutputWrite] {
        match self {
            Self::Vertex { outputs, .. } | Self::Fragment { outputs, .. } => outputs,
        }
    }
}

/// One shader lowered for one dialect version.
#[derive(Clone, Debug, PartialEq)]
pub struct DialectShader {
    /// Source-level name of the shader.
    pub name: String,
    /// Which pipeline stage the shader runs in.
    pub stage: Stage,
    /// The version every construct of the shader is legal in.
    pub version: DialectVersion,
    /// Declared inputs, in source order.
    pub inputs: Vec<InterfaceVar>,
    /// Declared outputs, in source order. Builtin sinks are not declared.
    pub outputs: Vec<InterfaceVar>,
    /// Flattened parameters.
    pub uniforms: Vec<Uniform>,
    /// Declarations in dependency order.
    pub declarations: Vec<Declaration>,
    /// The body of `main()`.
    pub main: MainBody,
}

impl DialectShader {
    /// Index of the declaration named `name`, if there is one.
    #[must_use]
    pub fn declaration_index(&self, name: &str) -> Option<usize> {
        self.declarations.iter().position(|decl| decl.name == name)
    }

    /// Calls `visit` on every expression of the shader, including those in declarations.
    pub fn for_each_expr<'a>(&'a self, mut visit: impl FnMut(&'a Expr)) {
        for decl in &self.declarations {
            match &decl.kind {
                DeclarationKind::Struct { .. } => {}
                DeclarationKind::Function { body, .. } => {
                    for stmt in body {
                        stmt.walk(&mut |_| {}, &mut visit);
                    }
                }
                DeclarationKind::Constant { value, .. } => value.walk(&mut visit),
            }
        }
        for stmt in self.main.statements() {
            stmt.walk(&mut |_| {}, &mut visit);
        }
        for discard in self.main.discards() {
            discard.condition.walk(&mut visit);
        }
        for output in self.main.outputs() {
            output.value.walk(&mut visit);
        }
    }

    /// Calls `visit` on every type the shader declares something with.
    pub fn for_each_type<'a>(&'a self, mut visit: impl FnMut(&'a Type)) {
        for decl in &self.declarations {
            match &decl.kind {
                DeclarationKind::Struct { fields } => {
                    fields.iter().for_each(|field| visit(&field.ty));
                }
                DeclarationKind::Function {
                    params,
                    result,
                    body,
                } => {
                    params.iter().for_each(|param| visit(&param.ty));
                    visit(result);
                    for stmt in body {
                        stmt.walk(
                            &mut |stmt| {
                                if let Stmt::Local { ty, .. } = stmt {
                                    visit(ty);
                                }
                            },
                            &mut |_| {},
                        );
                    }
                }
                DeclarationKind::Constant { ty, .. } => visit(ty),
            }
        }
        for stmt in self.main.statements() {
            stmt.walk(
                &mut |stmt| {
                    if let Stmt::Local { ty, .. } = stmt {
                        visit(ty);
                    }
                },
                &mut |_| {},
            );
        }
    }
}
