//! Lowering of expressions to statements and dialect expressions.
//!
//! Source expressions may contain `if` and `let` anywhere; GLSL only has them as statements.
//! In tail position they become statements that write the [`Target`] directly. Elsewhere
//! they are hoisted into a temporary declared just before the statement that needs it.

use core::mem;

use hashbrown::HashMap;
use shadeport_ir::{self as ir, Binding, ExprKind, LocalId, RecordId, TermId};

use super::{Lowered, Lowerer};
use crate::ffi::NativeForm;
use crate::gast::{Callee, Expr, Stmt};
use crate::{Error, uniform};

/// Statements being built for one function body, and the names of the locals in scope.
#[derive(Debug, Default)]
pub(super) struct Scope {
    locals: HashMap<LocalId, String>,
    stmts: Vec<Stmt>,
}

impl Scope {
    pub fn bind(&mut self, local: LocalId, name: String) {
        self.locals.insert(local, name);
    }

    fn push(&mut self, stmt: Stmt) {
        self.stmts.push(stmt);
    }

    pub fn into_statements(self) -> Vec<Stmt> {
        self.stmts
    }
}

/// Where the value of an expression in tail position goes.
#[derive(Clone, Debug)]
pub(super) enum Target {
    Return,
    Assign(String),
}

impl Target {
    fn write(&self, value: Expr) -> Stmt {
        match self {
            Self::Return => Stmt::Return(value),
            Self::Assign(name) => Stmt::Assign {
                target: name.clone(),
                value,
            },
        }
    }
}

impl Lowerer<'_> {
    /// Lowers `expr` in tail position, writing its value to `target`.
    pub(super) fn lower_into(
        &mut self,
        scope: &mut Scope,
        expr: &ir::Expr,
        target: &Target,
    ) -> Result<(), Error> {
        match &expr.kind {
            ExprKind::If {
                condition,
                accept,
                reject,
            } => {
                let condition = self.lower_value(scope, condition)?;
                let accept = self.branch(scope, accept, target)?;
                let reject = self.branch(scope, reject, target)?;
                scope.push(Stmt::If {
                    condition,
                    accept,
                    reject,
                });
            }
            ExprKind::Let {
                binding,
                value,
                body,
            } => {
                self.lower_let(scope, binding, value)?;
                self.lower_into(scope, body, target)?;
            }
            _ => {
                let value = self.lower_value(scope, expr)?;
                scope.push(target.write(value));
            }
        }
        Ok(())
    }

    /// Lowers `expr` into a separate statement list which shares the locals of `scope`.
    fn branch(
        &mut self,
        scope: &mut Scope,
        expr: &ir::Expr,
        target: &Target,
    ) -> Result<Vec<Stmt>, Error> {
        let outer = mem::take(&mut scope.stmts);
        self.lower_into(scope, expr, target)?;
        Ok(mem::replace(&mut scope.stmts, outer))
    }

    /// Declares a local for `binding` initialized with `value`.
    ///
    /// The binding is only in scope after its value, so a value may not refer to it.
    pub(super) fn lower_let(
        &mut self,
        scope: &mut Scope,
        binding: &Binding,
        value: &ir::Expr,
    ) -> Result<(), Error> {
        let name = self.namer.call(&binding.name);
        let ty = self.ty(binding.ty)?;
        if matches!(value.kind, ExprKind::If { .. } | ExprKind::Let { .. }) {
            scope.push(Stmt::Local {
                name: name.clone(),
                ty,
                init: None,
            });
            self.lower_into(scope, value, &Target::Assign(name.clone()))?;
        } else {
            let init = self.lower_value(scope, value)?;
            scope.push(Stmt::Local {
                name: name.clone(),
                ty,
                init: Some(init),
            });
        }
        scope.bind(binding.local, name);
        Ok(())
    }

    /// Lowers `expr` to a dialect expression, hoisting any statements it needs into `scope`.
    pub(super) fn lower_value(&mut self, scope: &mut Scope, expr: &ir::Expr) -> Result<Expr, Error> {
        Ok(match &expr.kind {
            &ExprKind::Literal(literal) => Expr::Literal(literal),
            ExprKind::Local(local) => match scope.locals.get(local) {
                Some(name) => Expr::var(name.clone()),
                None => return Err(self.malformed(format!("unbound local {}", local.0))),
            },
            &ExprKind::Input(index) => match self.interface.inputs.get(index) {
                Some(input) => Expr::var(input.ident.clone()),
                None => return Err(self.malformed(format!("reference to undeclared input {index}"))),
            },
            &ExprKind::Parameter(index) => self.parameter(index, &mut Vec::new(), expr.ty)?,
            &ExprKind::Term(id) => self.term_value(id)?,
            ExprKind::Apply { function, args } => {
                let mut lowered = Vec::with_capacity(args.len());
                for arg in args {
                    lowered.push(self.lower_value(scope, arg)?);
                }
                self.apply(*function, lowered)?
            }
            ExprKind::Record { record, fields } => {
                self.constructible(*record)?;
                let mut args = Vec::with_capacity(fields.len());
                for field in fields {
                    args.push(self.lower_value(scope, field)?);
                }
                Expr::Call {
                    callee: Callee::User(self.struct_names(*record)?.name.clone()),
                    args,
                }
            }
            ExprKind::Field { base, index } => {
                if let Some((parameter, mut path)) = parameter_path(expr) {
                    return self.parameter(parameter, &mut path, expr.ty);
                }
                let ir::Type::Record(record) = base.ty else {
                    return Err(self.malformed("field access on a value which is not a record"));
                };
                let Some(field) = self
                    .struct_names(record)?
                    .fields
                    .get(*index as usize)
                    .cloned()
                else {
                    return Err(self.malformed(format!("record has no field {index}")));
                };
                Expr::Field {
                    base: Box::new(self.lower_value(scope, base)?),
                    field,
                }
            }
            ExprKind::Swizzle { base, components } => Expr::Swizzle {
                base: Box::new(self.lower_value(scope, base)?),
                components: components.clone(),
            },
            ExprKind::If { .. } | ExprKind::Let { .. } => {
                let temp = self.namer.temporary();
                scope.push(Stmt::Local {
                    name: temp.clone(),
                    ty: self.ty(expr.ty)?,
                    init: None,
                });
                let target = Target::Assign(temp.clone());
                if matches!(expr.kind, ExprKind::Let { .. }) {
                    let block = self.branch(scope, expr, &target)?;
                    scope.push(Stmt::Block(block));
                } else {
                    self.lower_into(scope, expr, &target)?;
                }
                Expr::var(temp)
            }
        })
    }

    /// Rebuilds the part of parameter `index` found at `path` out of its flattened uniforms.
    fn parameter(&self, index: usize, path: &mut Vec<u32>, ty: ir::Type) -> Result<Expr, Error> {
        match ty {
            ir::Type::Leaf(_) => {
                let uniform = self
                    .interface
                    .parameters
                    .get(index)
                    .and_then(|uniforms| uniforms.iter().find(|u| u.leaf.path == *path));
                match uniform {
                    Some(uniform) => Ok(Expr::var(uniform.ident.clone())),
                    None => Err(self.malformed(format!(
                        "no uniform for parameter {index} at path {path:?}"
                    ))),
                }
            }
            ir::Type::Record(record) => {
                self.constructible(record)?;
                let fields = &self.program.record(record).fields;
                let mut args = Vec::with_capacity(fields.len());
                for (field_index, field) in (0u32..).zip(fields) {
                    path.push(field_index);
                    let arg = self.parameter(index, path, field.ty);
                    path.pop();
                    args.push(arg?);
                }
                Ok(Expr::Call {
                    callee: Callee::User(self.struct_names(record)?.name.clone()),
                    args,
                })
            }
        }
    }

    fn constructible(&self, record: RecordId) -> Result<(), Error> {
        if uniform::is_opaque(self.program, record.into()) {
            return Err(self.malformed(format!(
                "record `{}` holds a sampler and cannot be constructed",
                self.program.record(record).name
            )));
        }
        Ok(())
    }

    fn term_value(&self, id: TermId) -> Result<Expr, Error> {
        Ok(match self.lowered(id)? {
            Lowered::Value(name) => Expr::Call {
                callee: Callee::User(name.clone()),
                args: Vec::new(),
            },
            Lowered::EmulatedConstant(name) => Expr::var(name.clone()),
            &Lowered::Native(NativeForm::Variable(name)) => Expr::Builtin(name),
            Lowered::Function(_) | Lowered::EmulatedFunction(_) | Lowered::Native(_) => {
                return Err(self.malformed(format!(
                    "function `{}` used as a value",
                    self.program.term(id).name
                )));
            }
        })
    }

    fn apply(&self, id: TermId, args: Vec<Expr>) -> Result<Expr, Error> {
        let arity = |expected: usize| {
            self.malformed(format!(
                "`{}` takes {expected} arguments, applied to {}",
                self.program.term(id).name,
                args.len()
            ))
        };
        Ok(match self.lowered(id)? {
            Lowered::Function(name) | Lowered::EmulatedFunction(name) => Expr::Call {
                callee: Callee::User(name.clone()),
                args,
            },
            &Lowered::Native(NativeForm::Call(name)) => Expr::native(name, args),
            &Lowered::Native(NativeForm::Binary(op)) => {
                let error = arity(2);
                let [left, right] = <[Expr; 2]>::try_from(args).map_err(|_| error)?;
                Expr::binary(op, left, right)
            }
            &Lowered::Native(NativeForm::Unary(op)) => {
                let error = arity(1);
                let [operand] = <[Expr; 1]>::try_from(args).map_err(|_| error)?;
                Expr::unary(op, operand)
            }
            Lowered::Value(_)
            | Lowered::EmulatedConstant(_)
            | Lowered::Native(NativeForm::Variable(_)) => {
                return Err(self.malformed(format!(
                    "value `{}` applied to arguments",
                    self.program.term(id).name
                )));
            }
        })
    }
}

/// If `expr` is a chain of field accesses on a shader parameter, returns the parameter index
/// and the field path.
fn parameter_path(expr: &ir::Expr) -> Option<(usize, Vec<u32>)> {
    match &expr.kind {
        &ExprKind::Parameter(index) => Some((index, Vec::new())),
        ExprKind::Field { base, index } => {
            let (parameter, mut path) = parameter_path(base)?;
            path.push(*index);
            Some((parameter, path))
        }
        _ => None,
    }
}

