/*!
Flattening of structured shader parameters into the leaf uniforms GLSL can bind.

The dotted names produced here are part of the contract with the runtime, which binds
uniform values by these names; they must be deterministic.
*/

use shadeport_ir::{LeafType, Program, Type};

/// One leaf of a flattened parameter.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct UniformLeaf {
    /// The parameter name followed by each field name along the path, joined by `.`.
    pub name: String,
    /// Type of the uniform.
    pub ty: LeafType,
    /// Field indices from the parameter root to this leaf. Empty for leaf-typed parameters.
    pub path: Vec<u32>,
}

/// Expands a parameter named `name` of type `ty` into its leaves, depth-first in declared
/// field order.
#[must_use]
pub fn expand(program: &Program, name: &str, ty: Type) -> Vec<UniformLeaf> {
    let mut leaves = Vec::new();
    let mut path = Vec::new();
    expand_into(program, name.to_owned(), ty, &mut path, &mut leaves);
    leaves
}

fn expand_into(
    program: &Program,
    name: String,
    ty: Type,
    path: &mut Vec<u32>,
    leaves: &mut Vec<UniformLeaf>,
) {
    match ty {
        Type::Leaf(leaf) => leaves.push(UniformLeaf {
            name,
            ty: leaf,
            path: path.clone(),
        }),
        Type::Record(id) => {
            for (index, field) in (0u32..).zip(&program.record(id).fields) {
                path.push(index);
                expand_into(
                    program,
                    format!("{name}.{}", field.name),
                    field.ty,
                    path,
                    leaves,
                );
                path.pop();
            }
        }
    }
}

/// Whether a value of type `ty` holds a sampler, directly or in a nested field.
///
/// GLSL has no constructor for such a record, so it can only exist as flattened uniforms.
pub(crate) fn is_opaque(program: &Program, ty: Type) -> bool {
    match ty {
        Type::Leaf(leaf) => matches!(leaf, LeafType::Sampler(_)),
        Type::Record(id) => program
            .record(id)
            .fields
            .iter()
            .any(|field| is_opaque(program, field.ty)),
    }
}
