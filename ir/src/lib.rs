//! Typed, name-resolved shader programs, as consumed by the `shadeport` backend.
//!
//! Everything in this crate is produced by earlier compiler stages (parsing, name resolution,
//! type checking), which are not part of `shadeport`. The backend assumes that:
//!
//! * every variable reference already names a specific local, term, input, or parameter;
//! * every expression carries its type;
//! * a [`Closure`] lists every declaration a shader transitively uses, dependencies first.
//!
//! The constructors here exist so that tests and drivers can assemble such programs directly.

use core::fmt;

mod closure;
mod expr;
mod shader;
mod term;
mod types;

pub use closure::{Closure, ClosureError, DeclRef};
pub use expr::{Binding, Component, Expr, ExprKind, Literal, LocalId};
pub use shader::{
    InputDecl, OutputAssignment, OutputDecl, OutputTarget, ParameterDecl, ShaderDecl,
    ShaderLocal, Stage,
};
pub use term::{External, ExternalKind, ExternalSignature, TermDecl, TermId, TermKind};
pub use types::{Field, LeafType, RecordDecl, RecordId, SamplerKind, ScalarKind, Type, VectorSize};

// -------------------------------------------------------------------------------------------------

/// Byte range in the original source text, carried through to every generated node
/// so that errors can be reported against the shader source.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Span {
    /// Offset of the first byte.
    pub start: u32,
    /// Offset just past the last byte.
    pub end: u32,
}

impl Span {
    /// The span from `start` up to, not including, `end`.
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// The records and terms a set of shaders may refer to.
#[derive(Clone, Debug, Default)]
pub struct Program {
    records: Vec<RecordDecl>,
    terms: Vec<TermDecl>,
}

impl Program {
    /// An empty program.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record declaration.
    ///
    /// # Panics
    ///
    /// Panics if the program already holds `u32::MAX` records.
    pub fn add_record(&mut self, name: impl Into<String>, fields: Vec<Field>) -> RecordId {
        let id = RecordId(u32::try_from(self.records.len()).expect("too many records"));
        self.records.push(RecordDecl {
            name: name.into(),
            fields,
            span: Span::default(),
        });
        id
    }

    /// Adds a term declaration.
    ///
    /// # Panics
    ///
    /// Panics if the program already holds `u32::MAX` terms.
    pub fn add_term(&mut self, decl: TermDecl) -> TermId {
        let id = TermId(u32::try_from(self.terms.len()).expect("too many terms"));
        self.terms.push(decl);
        id
    }

    /// Adds a user function taking `params` and returning `body`.
    pub fn add_function(
        &mut self,
        name: impl Into<String>,
        params: Vec<Binding>,
        result: impl Into<Type>,
        body: Expr,
    ) -> TermId {
        self.add_term(TermDecl {
            name: name.into(),
            kind: TermKind::Function {
                params,
                result: result.into(),
                body,
            },
            span: Span::default(),
        })
    }

    /// Adds a user value, a constant computed by `body`.
    pub fn add_value(&mut self, name: impl Into<String>, ty: impl Into<Type>, body: Expr) -> TermId {
        self.add_term(TermDecl {
            name: name.into(),
            kind: TermKind::Value {
                ty: ty.into(),
                body,
            },
            span: Span::default(),
        })
    }

    /// Adds a term referring to the external function registered as `symbol`.
    pub fn add_external_function(
        &mut self,
        name: impl Into<String>,
        symbol: impl Into<String>,
        params: Vec<LeafType>,
        result: LeafType,
    ) -> TermId {
        self.add_term(TermDecl {
            name: name.into(),
            kind: TermKind::External(External {
                symbol: symbol.into(),
                signature: ExternalSignature::Function { params, result },
            }),
            span: Span::default(),
        })
    }

    /// Adds a term referring to the external value registered as `symbol`.
    pub fn add_external_value(
        &mut self,
        name: impl Into<String>,
        symbol: impl Into<String>,
        ty: LeafType,
    ) -> TermId {
        self.add_term(TermDecl {
            name: name.into(),
            kind: TermKind::External(External {
                symbol: symbol.into(),
                signature: ExternalSignature::Value(ty),
            }),
            span: Span::default(),
        })
    }

    /// The declaration of record `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this program.
    #[must_use]
    pub fn record(&self, id: RecordId) -> &RecordDecl {
        &self.records[id.index()]
    }

    /// The declaration of term `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this program.
    #[must_use]
    pub fn term(&self, id: TermId) -> &TermDecl {
        &self.terms[id.index()]
    }

    /// Every record with its id, in declaration order.
    pub fn records(&self) -> impl Iterator<Item = (RecordId, &RecordDecl)> {
        (0u32..).map(RecordId).zip(&self.records)
    }

    /// Every term with its id, in declaration order.
    pub fn terms(&self) -> impl Iterator<Item = (TermId, &TermDecl)> {
        (0u32..).map(TermId).zip(&self.terms)
    }

    /// The source-level name of a type, for messages.
    #[must_use]
    pub fn type_name(&self, ty: Type) -> String {
        match ty {
            Type::Leaf(leaf) => leaf.to_string(),
            Type::Record(id) => self.record(id).name.clone(),
        }
    }
}
