//! Naming of a shader's externally visible surface.
//!
//! Interface identifiers are assigned before anything else, by a namer that only depends on
//! the FFI table, so they are the same in every version a shader is generated for.

use shadeport_ir::{Program, ShaderDecl, Type};

use crate::ffi::FfiTable;
use crate::namer::Namer;
use crate::uniform::{self, UniformLeaf};

/// A named input or output.
#[derive(Clone, Debug, PartialEq)]
pub struct InterfaceItem {
    /// Name in the source program.
    pub name: String,
    /// GLSL identifier.
    pub ident: String,
    /// Declared type.
    pub ty: Type,
}

/// A flattened uniform with its GLSL identifier.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundUniform {
    /// GLSL identifier.
    pub ident: String,
    /// Name, type, and field path of the uniform.
    pub leaf: UniformLeaf,
}

/// The identifiers of everything a shader exchanges with the pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct ShaderInterface {
    /// Inputs in source order.
    pub inputs: Vec<InterfaceItem>,
    /// Outputs in source order.
    pub outputs: Vec<InterfaceItem>,
    /// Leaf uniforms of each parameter, in parameter order.
    pub parameters: Vec<Vec<BoundUniform>>,
}

impl ShaderInterface {
    /// Computes the interface of `shader` as every generated version names it.
    #[must_use]
    pub fn new(program: &Program, shader: &ShaderDecl, ffi: &FfiTable) -> Self {
        Self::assign(program, shader, &mut Namer::new(ffi))
    }

    pub(crate) fn assign(program: &Program, shader: &ShaderDecl, namer: &mut Namer) -> Self {
        let mut item = |name: &str, ty: Type| InterfaceItem {
            name: name.to_owned(),
            ident: namer.call(name),
            ty,
        };
        let inputs = shader
            .inputs
            .iter()
            .map(|input| item(&input.name, input.ty))
            .collect();
        let outputs = shader
            .outputs
            .iter()
            .map(|output| item(&output.name, output.ty))
            .collect();
        let parameters = shader
            .parameters
            .iter()
            .map(|parameter| {
                uniform::expand(program, &parameter.name, parameter.ty)
                    .into_iter()
                    .map(|leaf| BoundUniform {
                        ident: namer.call(&leaf.name),
                        leaf,
                    })
                    .collect()
            })
            .collect();
        Self {
            inputs,
            outputs,
            parameters,
        }
    }

    /// All flattened uniforms, in parameter order.
    pub fn uniforms(&self) -> impl Iterator<Item = &BoundUniform> {
        self.parameters.iter().flatten()
    }
}
