//! Reachability closures: which declarations a shader uses, and in what order to emit them.

use hashbrown::HashMap;

use crate::{Expr, ExprKind, Program, RecordId, ShaderDecl, ShaderLocal, TermId, TermKind, Type};

/// A reference to a global declaration of a [`Program`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DeclRef {
    /// A record type.
    Record(RecordId),
    /// A function, value, or external.
    Term(TermId),
}

impl DeclRef {
    /// The source name of the declaration.
    #[must_use]
    pub fn name(self, program: &Program) -> &str {
        match self {
            DeclRef::Record(id) => &program.record(id).name,
            DeclRef::Term(id) => &program.term(id).name,
        }
    }

    /// The declarations this one refers to directly, in order of first reference.
    #[must_use]
    pub fn dependencies(self, program: &Program) -> Vec<DeclRef> {
        let mut deps = Dependencies::default();
        match self {
            DeclRef::Record(id) => {
                for field in &program.record(id).fields {
                    deps.ty(field.ty);
                }
            }
            DeclRef::Term(id) => match program.term(id).kind {
                TermKind::Function {
                    ref params,
                    result,
                    ref body,
                } => {
                    for param in params {
                        deps.ty(param.ty);
                    }
                    deps.ty(result);
                    deps.expr(body);
                }
                TermKind::Value { ty, ref body } => {
                    deps.ty(ty);
                    deps.expr(body);
                }
                // Externals have leaf-typed signatures.
                TermKind::External(_) => {}
            },
        }
        deps.list
    }
}

/// Accumulates dependencies without duplicates, keeping first-reference order.
#[derive(Default)]
struct Dependencies {
    list: Vec<DeclRef>,
}

impl Dependencies {
    fn push(&mut self, decl: DeclRef) {
        if !self.list.contains(&decl) {
            self.list.push(decl);
        }
    }

    fn ty(&mut self, ty: Type) {
        if let Type::Record(id) = ty {
            self.push(DeclRef::Record(id));
        }
    }

    fn expr(&mut self, expr: &Expr) {
        expr.walk(&mut |e| {
            self.ty(e.ty);
            match e.kind {
                ExprKind::Term(id) | ExprKind::Apply { function: id, .. } => {
                    self.push(DeclRef::Term(id));
                }
                ExprKind::Record { record, .. } => self.push(DeclRef::Record(record)),
                ExprKind::Let { ref binding, .. } => self.ty(binding.ty),
                _ => {}
            }
        });
    }

    fn shader(&mut self, shader: &ShaderDecl) {
        for input in &shader.inputs {
            self.ty(input.ty);
        }
        for output in &shader.outputs {
            self.ty(output.ty);
        }
        for parameter in &shader.parameters {
            self.ty(parameter.ty);
        }
        for local in &shader.locals {
            if let ShaderLocal::Let { binding, .. } = local {
                self.ty(binding.ty);
            }
        }
        for expr in shader.expressions() {
            self.expr(expr);
        }
    }
}

/// Errors found while computing or validating a [`Closure`].
///
/// These indicate a defect in whatever produced the program or the order, and are not
/// expected to be recoverable.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum ClosureError {
    /// A declaration refers to itself, directly or through others.
    #[error("declaration `{name}` depends on itself")]
    Cycle {
        /// The declaration found on the cycle.
        name: String,
    },

    /// A supplied order lists a declaration twice.
    #[error("declaration `{name}` appears more than once in the closure")]
    Duplicate {
        /// The repeated declaration.
        name: String,
    },

    /// A supplied order places a declaration before one it uses.
    #[error("`{dependent}` is ordered before its dependency `{dependency}`")]
    OutOfOrder {
        /// The declaration placed too early.
        dependent: String,
        /// What it uses.
        dependency: String,
    },

    /// A supplied order lacks a declaration which another one in it uses.
    #[error("`{dependent}` depends on `{dependency}`, which is not in the closure")]
    Missing {
        /// The declaration in the order.
        dependent: String,
        /// What it uses.
        dependency: String,
    },
}

/// The declarations transitively used by a shader, in an order where every declaration
/// comes after everything it depends on.
#[derive(Clone, Debug)]
pub struct Closure {
    order: Vec<DeclRef>,
    positions: HashMap<DeclRef, usize>,
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Visiting,
    Done,
}

impl Closure {
    /// Computes the closure of `shader` by depth-first search.
    ///
    /// Declarations are ordered by post-order of the search, visiting roots and dependencies
    /// in the order they are first referenced, so the result is deterministic.
    ///
    /// # Errors
    ///
    /// Returns [`ClosureError::Cycle`] if a declaration depends on itself.
    pub fn for_shader(program: &Program, shader: &ShaderDecl) -> Result<Self, ClosureError> {
        let mut roots = Dependencies::default();
        roots.shader(shader);

        let mut marks = HashMap::new();
        let mut order = Vec::new();
        for root in roots.list {
            visit(program, root, &mut marks, &mut order)?;
        }
        Self::from_order(program, order)
    }

    /// Accepts an order computed elsewhere, after checking that it is a valid linearization:
    /// no duplicates, and every dependency present and placed earlier.
    ///
    /// # Errors
    ///
    /// Returns the first [`ClosureError`] found while checking `order` from the front.
    pub fn from_order(program: &Program, order: Vec<DeclRef>) -> Result<Self, ClosureError> {
        let mut positions = HashMap::with_capacity(order.len());
        for (index, &decl) in order.iter().enumerate() {
            if positions.insert(decl, index).is_some() {
                return Err(ClosureError::Duplicate {
                    name: decl.name(program).to_owned(),
                });
            }
        }

        for (index, &decl) in order.iter().enumerate() {
            for dep in decl.dependencies(program) {
                match positions.get(&dep) {
                    None => {
                        return Err(ClosureError::Missing {
                            dependent: decl.name(program).to_owned(),
                            dependency: dep.name(program).to_owned(),
                        });
                    }
                    Some(&dep_index) if dep_index == index => {
                        return Err(ClosureError::Cycle {
                            name: decl.name(program).to_owned(),
                        });
                    }
                    Some(&dep_index) if dep_index > index => {
                        return Err(ClosureError::OutOfOrder {
                            dependent: decl.name(program).to_owned(),
                            dependency: dep.name(program).to_owned(),
                        });
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(Self { order, positions })
    }

    /// Declarations in emission order.
    #[must_use]
    pub fn order(&self) -> &[DeclRef] {
        &self.order
    }

    /// Position of `decl` in [`Self::order()`], if it is part of the closure.
    #[must_use]
    pub fn position(&self, decl: DeclRef) -> Option<usize> {
        self.positions.get(&decl).copied()
    }

    /// Whether `decl` is part of the closure.
    #[must_use]
    pub fn contains(&self, decl: DeclRef) -> bool {
        self.positions.contains_key(&decl)
    }

    /// The terms of the closure, in emission order.
    pub fn terms(&self) -> impl Iterator<Item = TermId> + '_ {
        self.order.iter().filter_map(|&decl| match decl {
            DeclRef::Term(id) => Some(id),
            DeclRef::Record(_) => None,
        })
    }

    /// The records of the closure, in emission order.
    pub fn records(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.order.iter().filter_map(|&decl| match decl {
            DeclRef::Record(id) => Some(id),
            DeclRef::Term(_) => None,
        })
    }

    /// Number of declarations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the shader uses no declarations at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn visit(
    program: &Program,
    decl: DeclRef,
    marks: &mut HashMap<DeclRef, Mark>,
    order: &mut Vec<DeclRef>,
) -> Result<(), ClosureError> {
    match marks.get(&decl) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            return Err(ClosureError::Cycle {
                name: decl.name(program).to_owned(),
            });
        }
        None => {}
    }
    marks.insert(decl, Mark::Visiting);
    for dep in decl.dependencies(program) {
        visit(program, dep, marks, order)?;
    }
    marks.insert(decl, Mark::Done);
    order.push(decl);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Binding, Field, LeafType, LocalId, OutputTarget, Stage};
    use pretty_assertions::assert_eq;

    /// `helper` uses `Pair` and `scale`; the shader uses `helper`.
    fn program() -> (Program, ShaderDecl, [DeclRef; 3]) {
        let mut program = Program::new();
        let pair = program.add_record(
            "Pair",
            vec![Field::new("a", LeafType::FLOAT), Field::new("b", LeafType::FLOAT)],
        );
        let scale = program.add_external_function(
            "scale",
            "mul",
            vec![LeafType::FLOAT, LeafType::FLOAT],
            LeafType::FLOAT,
        );
        let x = Binding::new(LocalId(0), "x", LeafType::FLOAT);
        let body = Expr::field(
            Expr::record(
                pair,
                vec![
                    Expr::apply(scale, vec![x.to_expr(), Expr::float(2.0)], LeafType::FLOAT),
                    x.to_expr(),
                ],
            ),
            0,
            LeafType::FLOAT,
        );
        let helper = program.add_function("helper", vec![x], LeafType::FLOAT, body);

        let mut shader = ShaderDecl::new("frag", Stage::Fragment);
        let input = shader.add_input("v", LeafType::FLOAT);
        let out = shader.add_output("color", LeafType::FLOAT, OutputTarget::Attachment(0));
        shader.assign(
            out,
            Expr::apply(helper, vec![Expr::input(input, LeafType::FLOAT)], LeafType::FLOAT),
        );
        (
            program,
            shader,
            [
                DeclRef::Record(pair),
                DeclRef::Term(scale),
                DeclRef::Term(helper),
            ],
        )
    }

    #[test]
    fn dependencies_precede_dependents() {
        let (program, shader, [pair, scale, helper]) = program();
        let closure = Closure::for_shader(&program, &shader).unwrap();
        assert_eq!(closure.order(), &[pair, scale, helper]);
    }

    #[test]
    fn rejects_out_of_order() {
        let (program, _, [pair, scale, helper]) = program();
        assert_eq!(
            Closure::from_order(&program, vec![helper, pair, scale]).unwrap_err(),
            ClosureError::OutOfOrder {
                dependent: "helper".into(),
                dependency: "Pair".into(),
            }
        );
    }

    #[test]
    fn rejects_missing_and_duplicate() {
        let (program, _, [pair, scale, helper]) = program();
        assert_eq!(
            Closure::from_order(&program, vec![pair, helper]).unwrap_err(),
            ClosureError::Missing {
                dependent: "helper".into(),
                dependency: "scale".into(),
            }
        );
        assert_eq!(
            Closure::from_order(&program, vec![pair, pair, scale, helper]).unwrap_err(),
            ClosureError::Duplicate {
                name: "Pair".into()
            }
        );
    }

    #[test]
    fn detects_cycle() {
        let mut program = Program::new();
        // A value which refers to itself. Upstream would never produce this.
        let id = TermId(0);
        program.add_value("loop", LeafType::FLOAT, Expr::term(id, LeafType::FLOAT));
        let mut shader = ShaderDecl::new("frag", Stage::Fragment);
        let out = shader.add_output("c", LeafType::FLOAT, OutputTarget::Attachment(0));
        shader.assign(out, Expr::term(id, LeafType::FLOAT));

        assert_eq!(
            Closure::for_shader(&program, &shader).unwrap_err(),
            ClosureError::Cycle {
                name: "loop".into()
            }
        );
    }
}
