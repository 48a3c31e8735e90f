use core::fmt;

use crate::{Binding, Expr, Span, Type};

/// Pipeline stage of a shader.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Stage {
    /// Runs once per vertex and produces the clip-space position.
    Vertex,
    /// Runs once per fragment and produces colors and depth.
    Fragment,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Vertex => "vertex",
            Stage::Fragment => "fragment",
        })
    }
}

/// A vertex or fragment shader: its interface, parameters, locals, and outputs.
#[derive(Clone, Debug, PartialEq)]
pub struct ShaderDecl {
    /// Source-level name, used in messages and generated comments.
    pub name: String,
    /// Which pipeline stage the shader runs in.
    pub stage: Stage,
    /// Vertex attributes or interpolated varyings, in declaration order.
    pub inputs: Vec<InputDecl>,
    /// Varyings, position, attachments, or depth, in declaration order.
    pub outputs: Vec<OutputDecl>,
    /// Uniform-like values bound at draw time. These may be record-typed.
    pub parameters: Vec<ParameterDecl>,
    /// Local bindings and, in fragment shaders, conditional discards, in source order.
    pub locals: Vec<ShaderLocal>,
    /// The final assignments of the shader's outputs.
    pub assignments: Vec<OutputAssignment>,
    /// Where the shader was declared.
    pub span: Span,
}

/// One input of a [`ShaderDecl`].
#[derive(Clone, Debug, PartialEq)]
pub struct InputDecl {
    /// Source-level name.
    pub name: String,
    /// Must be a leaf type which is neither boolean nor a sampler.
    pub ty: Type,
    /// Where the input was declared.
    pub span: Span,
}

/// One output of a [`ShaderDecl`].
#[derive(Clone, Debug, PartialEq)]
pub struct OutputDecl {
    /// Source-level name.
    pub name: String,
    /// Must be a leaf type which is neither boolean nor a sampler.
    pub ty: Type,
    /// Where the value goes.
    pub target: OutputTarget,
    /// Where the output was declared.
    pub span: Span,
}

/// Where a shader output goes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OutputTarget {
    /// A vertex output interpolated into the fragment stage.
    Varying,
    /// The vertex output which is the clip-space position. Exactly one per vertex shader.
    Position,
    /// A fragment output written to the color attachment with this index.
    Attachment(u32),
    /// The fragment depth.
    Depth,
}

/// One parameter of a [`ShaderDecl`], bound at draw time as one or more uniforms.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterDecl {
    /// Source-level name, the root of every flattened uniform name.
    pub name: String,
    /// Any type; records are flattened into their leaves.
    pub ty: Type,
    /// Where the parameter was declared.
    pub span: Span,
}

/// One step of a shader body before its outputs are assigned.
#[derive(Clone, Debug, PartialEq)]
pub enum ShaderLocal {
    /// Binds `binding` to `value` for the rest of the shader.
    Let {
        /// The binder.
        binding: Binding,
        /// Its value.
        value: Expr,
    },
    /// Discards the fragment if `condition` is true. Fragment shaders only.
    Discard {
        /// A `bool` expression.
        condition: Expr,
        /// Where the discard appears.
        span: Span,
    },
}

/// The value an output of a [`ShaderDecl`] is assigned.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputAssignment {
    /// Index into [`ShaderDecl::outputs`].
    pub output: usize,
    /// Of the output's type.
    pub value: Expr,
}

impl ShaderDecl {
    /// Creates a shader with nothing in it.
    #[must_use]
    pub fn new(name: impl Into<String>, stage: Stage) -> Self {
        Self {
            name: name.into(),
            stage,
            inputs: Vec::new(),
            outputs: Vec::new(),
            parameters: Vec::new(),
            locals: Vec::new(),
            assignments: Vec::new(),
            span: Span::default(),
        }
    }

    /// Declares an input and returns its index.
    pub fn add_input(&mut self, name: impl Into<String>, ty: impl Into<Type>) -> usize {
        self.inputs.push(InputDecl {
            name: name.into(),
            ty: ty.into(),
            span: Span::default(),
        });
        self.inputs.len() - 1
    }

    /// Declares an output and returns its index.
    pub fn add_output(
        &mut self,
        name: impl Into<String>,
        ty: impl Into<Type>,
        target: OutputTarget,
    ) -> usize {
        self.outputs.push(OutputDecl {
            name: name.into(),
            ty: ty.into(),
            target,
            span: Span::default(),
        });
        self.outputs.len() - 1
    }

    /// Declares a parameter and returns its index.
    pub fn add_parameter(&mut self, name: impl Into<String>, ty: impl Into<Type>) -> usize {
        self.parameters.push(ParameterDecl {
            name: name.into(),
            ty: ty.into(),
            span: Span::default(),
        });
        self.parameters.len() - 1
    }

    /// Appends a local binding.
    pub fn add_local(&mut self, binding: Binding, value: Expr) {
        self.locals.push(ShaderLocal::Let { binding, value });
    }

    /// Appends a conditional discard.
    pub fn add_discard(&mut self, condition: Expr) {
        let span = condition.span;
        self.locals.push(ShaderLocal::Discard { condition, span });
    }

    /// Assigns `value` to output `output`.
    pub fn assign(&mut self, output: usize, value: Expr) {
        self.assignments.push(OutputAssignment { output, value });
    }

    /// Every expression of the shader body, in evaluation order.
    pub fn expressions(&self) -> impl Iterator<Item = &Expr> {
        self.locals
            .iter()
            .map(|local| match local {
                ShaderLocal::Let { value, .. } => value,
                ShaderLocal::Discard { condition, .. } => condition,
            })
            .chain(self.assignments.iter().map(|a| &a.value))
    }
}
