/*!
The lowering engine: one typed shader, for one dialect version, to a [`DialectShader`].

Lowering proceeds in a fixed order:

1. The interface (inputs, outputs, flattened uniforms) is named first, so that its
   identifiers do not depend on the version.
2. Every declaration of the closure is emitted in closure order. Records become structs,
   functions become functions, values become functions without parameters, and externals
   are resolved through the [`FfiTable`]: native ones emit nothing and are referenced by
   their native form, emulated ones emit a replacement declaration under a fresh name.
3. The shader's locals become statements of `main()`, and its discards and output
   assignments become [`Discard`]s and [`OutputWrite`]s, which are kept out of the
   statement list.
*/

use hashbrown::HashMap;
use shadeport_ir::{
    self as ir, Closure, DeclRef, OutputTarget, Program, RecordId, ShaderDecl, ShaderLocal, Stage,
    TermId, TermKind,
};
use tracing::{debug, trace};

use crate::check::has_explicit_locations;
use crate::ffi::{Decision, EmulatedBody, FfiTable, NativeForm};
use crate::gast::{
    Declaration, DeclarationKind, DialectShader, Discard, InterfaceVar, MainBody, Origin,
    OutputWrite, Param, Sink, Storage, StructField, Type, Uniform,
};
use crate::interface::ShaderInterface;
use crate::namer::Namer;
use crate::{DialectVersion, Error};

mod expr;

use expr::{Scope, Target};

/// How references to an already lowered term are written.
#[derive(Clone, Debug)]
enum Lowered {
    Function(String),
    /// A value, lowered to a function without parameters.
    Value(String),
    Native(NativeForm),
    EmulatedFunction(String),
    EmulatedConstant(String),
}

#[derive(Clone, Debug)]
struct StructNames {
    name: String,
    fields: Vec<String>,
}

/// Lowers `shader` for `version`.
///
/// `closure` must be the closure of `shader` in `program`; declarations are emitted in its
/// order.
///
/// # Errors
///
/// Returns [`Error::Ffi`] if an external cannot be lowered for `version` and the shader's
/// stage, [`Error::MissingDeclaration`] if `closure` lacks something the shader uses, and
/// [`Error::MalformedShader`] if the shader breaks a structural rule.
pub fn lower(
    program: &Program,
    shader: &ShaderDecl,
    closure: &Closure,
    version: DialectVersion,
    ffi: &FfiTable,
) -> Result<DialectShader, Error> {
    let mut namer = Namer::new(ffi);
    let interface = ShaderInterface::assign(program, shader, &mut namer);
    let mut lowerer = Lowerer {
        program,
        shader,
        version,
        ffi,
        namer,
        interface,
        structs: HashMap::new(),
        terms: HashMap::new(),
        declarations: Vec::new(),
    };

    for &decl in closure.order() {
        lowerer.declare(decl)?;
    }
    let main = lowerer.main()?;
    let (inputs, outputs) = lowerer.interface_vars()?;
    let uniforms = lowerer
        .interface
        .uniforms()
        .map(|uniform| Uniform {
            name: uniform.ident.clone(),
            wire_name: uniform.leaf.name.clone(),
            ty: uniform.leaf.ty,
        })
        .collect();

    debug!(
        shader = %shader.name,
        %version,
        declarations = lowerer.declarations.len(),
        "lowered shader"
    );
    Ok(DialectShader {
        name: shader.name.clone(),
        stage: shader.stage,
        version,
        inputs,
        outputs,
        uniforms,
        declarations: lowerer.declarations,
        main,
    })
}

pub(crate) struct Lowerer<'a> {
    program: &'a Program,
    shader: &'a ShaderDecl,
    version: DialectVersion,
    ffi: &'a FfiTable,
    namer: Namer,
    interface: ShaderInterface,
    structs: HashMap<RecordId, StructNames>,
    terms: HashMap<TermId, Lowered>,
    declarations: Vec<Declaration>,
}

impl Lowerer<'_> {
    fn malformed(&self, reason: impl Into<String>) -> Error {
        Error::MalformedShader {
            shader: self.shader.name.clone(),
            reason: reason.into(),
        }
    }

    fn ty(&self, ty: ir::Type) -> Result<Type, Error> {
        match ty {
            ir::Type::Leaf(leaf) => Ok(Type::Leaf(leaf)),
            ir::Type::Record(id) => Ok(Type::Struct(self.struct_names(id)?.name.clone())),
        }
    }

    fn struct_names(&self, id: RecordId) -> Result<&StructNames, Error> {
        self.structs
            .get(&id)
            .ok_or_else(|| Error::MissingDeclaration {
                name: self.program.record(id).name.clone(),
            })
    }

    fn lowered(&self, id: TermId) -> Result<&Lowered, Error> {
        self.terms.get(&id).ok_or_else(|| Error::MissingDeclaration {
            name: self.program.term(id).name.clone(),
        })
    }

    fn declare(&mut self, decl: DeclRef) -> Result<(), Error> {
        match decl {
            DeclRef::Record(id) => self.declare_record(id),
            DeclRef::Term(id) => self.declare_term(id),
        }
    }

    fn declare_record(&mut self, id: RecordId) -> Result<(), Error> {
        let record = self.program.record(id);
        let name = self.namer.call(&record.name);
        let mut field_namer = Namer::for_fields();
        let mut fields = Vec::with_capacity(record.fields.len());
        for field in &record.fields {
            fields.push(StructField {
                name: field_namer.call(&field.name),
                ty: self.ty(field.ty)?,
            });
        }
        self.structs.insert(
            id,
            StructNames {
                name: name.clone(),
                fields: fields.iter().map(|field| field.name.clone()).collect(),
            },
        );
        self.declarations.push(Declaration {
            name,
            origin: Origin::Record {
                id,
                name: record.name.clone(),
            },
            kind: DeclarationKind::Struct { fields },
        });
        Ok(())
    }

    fn declare_term(&mut self, id: TermId) -> Result<(), Error> {
        let term = self.program.term(id);
        let origin = Origin::Term {
            id,
            name: term.name.clone(),
        };
        match &term.kind {
            TermKind::Function {
                params,
                result,
                body,
            } => {
                let name = self.namer.call(&term.name);
                let mut scope = Scope::default();
                let mut lowered_params = Vec::with_capacity(params.len());
                for binding in params {
                    let param = self.namer.call(&binding.name);
                    scope.bind(binding.local, param.clone());
                    lowered_params.push(Param {
                        name: param,
                        ty: self.ty(binding.ty)?,
                    });
                }
                let result = self.ty(*result)?;
                self.lower_into(&mut scope, body, &Target::Return)?;
                self.terms.insert(id, Lowered::Function(name.clone()));
                self.declarations.push(Declaration {
                    name,
                    origin,
                    kind: DeclarationKind::Function {
                        params: lowered_params,
                        result,
                        body: scope.into_statements(),
                    },
                });
            }
            TermKind::Value { ty, body } => {
                let name = self.namer.call(&term.name);
                let mut scope = Scope::default();
                let result = self.ty(*ty)?;
                self.lower_into(&mut scope, body, &Target::Return)?;
                self.terms.insert(id, Lowered::Value(name.clone()));
                self.declarations.push(Declaration {
                    name,
                    origin,
                    kind: DeclarationKind::Function {
                        params: Vec::new(),
                        result,
                        body: scope.into_statements(),
                    },
                });
            }
            TermKind::External(external) => {
                let kind = external.signature.kind();
                let decision =
                    self.ffi
                        .resolve(&external.symbol, kind, self.version, self.shader.stage)?;
                match decision {
                    Decision::Native(form) => {
                        trace!(symbol = %external.symbol, version = %self.version, ?form, "native");
                        self.terms.insert(id, Lowered::Native(form));
                    }
                    Decision::Emulated(emulation) => {
                        trace!(
                            symbol = %external.symbol,
                            version = %self.version,
                            emulation = emulation.name(),
                            "emulated"
                        );
                        let name = self.namer.call(&format!("{}_emulated", term.name));
                        let (lowered, kind) = match emulation.build(&external.signature) {
                            EmulatedBody::Function {
                                params,
                                result,
                                body,
                            } => (
                                Lowered::EmulatedFunction(name.clone()),
                                DeclarationKind::Function {
                                    params: params
                                        .into_iter()
                                        .map(|(name, ty)| Param {
                                            name: name.to_owned(),
                                            ty: ty.into(),
                                        })
                                        .collect(),
                                    result: result.into(),
                                    body,
                                },
                            ),
                            EmulatedBody::Constant { ty, value } => (
                                Lowered::EmulatedConstant(name.clone()),
                                DeclarationKind::Constant {
                                    ty: ty.into(),
                                    value,
                                },
                            ),
                        };
                        self.terms.insert(id, lowered);
                        self.declarations.push(Declaration {
                            name,
                            origin: Origin::Emulation {
                                symbol: external.symbol.clone(),
                            },
                            kind,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn main(&mut self) -> Result<MainBody, Error> {
        let shader = self.shader;
        let mut scope = Scope::default();
        let mut discards = Vec::new();
        for local in &shader.locals {
            match local {
                ShaderLocal::Let { binding, value } => self.lower_let(&mut scope, binding, value)?,
                ShaderLocal::Discard { condition, .. } => {
                    if shader.stage == Stage::Vertex {
                        return Err(self.malformed("vertex shaders cannot discard"));
                    }
                    let condition = self.lower_value(&mut scope, condition)?;
                    discards.push(Discard { condition });
                }
            }
        }

        let mut outputs = Vec::with_capacity(shader.assignments.len());
        for assignment in &shader.assignments {
            let Some(output) = shader.outputs.get(assignment.output) else {
                return Err(self.malformed(format!(
                    "assignment to undeclared output {}",
                    assignment.output
                )));
            };
            let Some(ty) = output.ty.as_leaf() else {
                return Err(self.malformed(format!("output `{}` has a record type", output.name)));
            };
            let value = self.lower_value(&mut scope, &assignment.value)?;
            outputs.push(OutputWrite {
                sink: self.sink(assignment.output)?,
                ty,
                value,
            });
        }

        Ok(match shader.stage {
            Stage::Vertex => {
                let positions = shader
                    .outputs
                    .iter()
                    .filter(|output| output.target == OutputTarget::Position)
                    .count();
                if positions != 1 {
                    return Err(self.malformed(format!(
                        "vertex shaders need exactly one position output, found {positions}"
                    )));
                }
                MainBody::Vertex {
                    statements: scope.into_statements(),
                    outputs,
                }
            }
            Stage::Fragment => MainBody::Fragment {
                statements: scope.into_statements(),
                discards,
                outputs,
            },
        })
    }

    /// Whether the only color output of a fragment shader is attachment 0, which legacy
    /// versions write as `gl_FragColor`.
    fn single_color_output(&self) -> bool {
        let mut attachments = self.shader.outputs.iter().filter_map(|output| match output.target {
            OutputTarget::Attachment(index) => Some(index),
            _ => None,
        });
        attachments.next() == Some(0) && attachments.next().is_none()
    }

    fn sink(&self, index: usize) -> Result<Sink, Error> {
        let output = &self.shader.outputs[index];
        let ident = &self.interface.outputs[index].ident;
        Ok(match (self.shader.stage, output.target) {
            (Stage::Vertex, OutputTarget::Varying) => Sink::Variable(ident.clone()),
            (Stage::Vertex, OutputTarget::Position) => Sink::Position,
            (Stage::Fragment, OutputTarget::Depth) => Sink::FragDepth,
            (Stage::Fragment, OutputTarget::Attachment(n)) if self.version.is_legacy() => {
                if self.single_color_output() {
                    Sink::FragColor
                } else {
                    Sink::FragData(n)
                }
            }
            (Stage::Fragment, OutputTarget::Attachment(_)) => Sink::Variable(ident.clone()),
            (stage, target) => {
                return Err(self.malformed(format!(
                    "output `{}` targets {target:?}, which {stage} shaders do not have",
                    output.name
                )));
            }
        })
    }

    fn interface_vars(&self) -> Result<(Vec<InterfaceVar>, Vec<InterfaceVar>), Error> {
        let legacy = self.version.is_legacy();
        let stage = self.shader.stage;

        let mut inputs = Vec::with_capacity(self.shader.inputs.len());
        for (input, item) in self.shader.inputs.iter().zip(&self.interface.inputs) {
            let Some(ty) = input.ty.as_leaf() else {
                return Err(self.malformed(format!("input `{}` has a record type", input.name)));
            };
            let storage = match (stage, legacy) {
                (Stage::Vertex, true) => Storage::Attribute,
                (Stage::Vertex, false) => Storage::In { flat: false },
                (Stage::Fragment, true) => Storage::Varying,
                (Stage::Fragment, false) => Storage::In {
                    flat: ty.is_integer(),
                },
            };
            inputs.push(InterfaceVar {
                name: item.ident.clone(),
                ty,
                storage,
            });
        }

        let mut outputs = Vec::new();
        for (index, output) in self.shader.outputs.iter().enumerate() {
            let Sink::Variable(name) = self.sink(index)? else {
                continue;
            };
            let Some(ty) = output.ty.as_leaf() else {
                return Err(self.malformed(format!("output `{}` has a record type", output.name)));
            };
            let storage = match (output.target, legacy) {
                (OutputTarget::Varying, true) => Storage::Varying,
                (OutputTarget::Varying, false) => Storage::Out {
                    flat: ty.is_integer(),
                    location: None,
                },
                (OutputTarget::Attachment(n), _) => Storage::Out {
                    flat: false,
                    location: has_explicit_locations(self.version).then_some(n),
                },
                (OutputTarget::Position | OutputTarget::Depth, _) => continue,
            };
            outputs.push(InterfaceVar { name, ty, storage });
        }
        Ok((inputs, outputs))
    }
}
