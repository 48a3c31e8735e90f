/*!
Conversion of dialect AST vocabulary to GLSL spellings.
*/

use shadeport_ir::{LeafType, SamplerKind, ScalarKind, VectorSize};

use crate::config::Precision;
use crate::gast::{BinaryOp, UnaryOp};

/// Types whose values have a fixed GLSL spelling.
pub(crate) trait ToGlsl: Copy {
    fn to_glsl(self) -> &'static str;
}

impl ToGlsl for BinaryOp {
    fn to_glsl(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::LogicalAnd => "&&",
            Self::LogicalOr => "||",
            Self::LogicalXor => "^^",
            Self::And => "&",
            Self::InclusiveOr => "|",
            Self::ExclusiveOr => "^",
            Self::ShiftLeft => "<<",
            Self::ShiftRight => ">>",
        }
    }
}

impl ToGlsl for UnaryOp {
    fn to_glsl(self) -> &'static str {
        match self {
            Self::Negate => "-",
            Self::LogicalNot => "!",
            Self::BitwiseNot => "~",
        }
    }
}

impl ToGlsl for Precision {
    fn to_glsl(self) -> &'static str {
        match self {
            Self::Low => "lowp",
            Self::Medium => "mediump",
            Self::High => "highp",
        }
    }
}

/// The name of the type, which is also the name of its constructor.
pub(crate) const fn constructor_name(ty: LeafType) -> &'static str {
    use ScalarKind as Sk;
    use VectorSize as Vs;
    match ty {
        LeafType::Scalar(Sk::Bool) => "bool",
        LeafType::Scalar(Sk::Int) => "int",
        LeafType::Scalar(Sk::Uint) => "uint",
        LeafType::Scalar(Sk::Float) => "float",
        LeafType::Vector { scalar, size } => match (scalar, size) {
            (Sk::Bool, Vs::Bi) => "bvec2",
            (Sk::Bool, Vs::Tri) => "bvec3",
            (Sk::Bool, Vs::Quad) => "bvec4",
            (Sk::Int, Vs::Bi) => "ivec2",
            (Sk::Int, Vs::Tri) => "ivec3",
            (Sk::Int, Vs::Quad) => "ivec4",
            (Sk::Uint, Vs::Bi) => "uvec2",
            (Sk::Uint, Vs::Tri) => "uvec3",
            (Sk::Uint, Vs::Quad) => "uvec4",
            (Sk::Float, Vs::Bi) => "vec2",
            (Sk::Float, Vs::Tri) => "vec3",
            (Sk::Float, Vs::Quad) => "vec4",
        },
        LeafType::Matrix { columns, rows } => match (columns, rows) {
            (Vs::Bi, Vs::Bi) => "mat2",
            (Vs::Bi, Vs::Tri) => "mat2x3",
            (Vs::Bi, Vs::Quad) => "mat2x4",
            (Vs::Tri, Vs::Bi) => "mat3x2",
            (Vs::Tri, Vs::Tri) => "mat3",
            (Vs::Tri, Vs::Quad) => "mat3x4",
            (Vs::Quad, Vs::Bi) => "mat4x2",
            (Vs::Quad, Vs::Tri) => "mat4x3",
            (Vs::Quad, Vs::Quad) => "mat4",
        },
        LeafType::Sampler(SamplerKind::Sampler2D) => "sampler2D",
        LeafType::Sampler(SamplerKind::SamplerCube) => "samplerCube",
    }
}

/// Identifiers that are keywords, reserved words, or type names in any version of GLSL or
/// GLSL ES, sorted.
pub const RESERVED: &[&str] = &[
    "active",
    "asm",
    "atomic_uint",
    "attribute",
    "bool",
    "break",
    "buffer",
    "bvec2",
    "bvec3",
    "bvec4",
    "case",
    "cast",
    "centroid",
    "class",
    "coherent",
    "common",
    "const",
    "continue",
    "default",
    "discard",
    "dmat2",
    "dmat3",
    "dmat4",
    "do",
    "double",
    "dvec2",
    "dvec3",
    "dvec4",
    "else",
    "enum",
    "extern",
    "external",
    "false",
    "filter",
    "fixed",
    "flat",
    "float",
    "for",
    "fvec2",
    "fvec3",
    "fvec4",
    "goto",
    "half",
    "highp",
    "hvec2",
    "hvec3",
    "hvec4",
    "if",
    "iimage2D",
    "image2D",
    "in",
    "inline",
    "inout",
    "input",
    "int",
    "interface",
    "invariant",
    "isampler2D",
    "isampler3D",
    "isamplerCube",
    "layout",
    "long",
    "lowp",
    "main",
    "mat2",
    "mat2x2",
    "mat2x3",
    "mat2x4",
    "mat3",
    "mat3x2",
    "mat3x3",
    "mat3x4",
    "mat4",
    "mat4x2",
    "mat4x3",
    "mat4x4",
    "mediump",
    "namespace",
    "noinline",
    "noperspective",
    "out",
    "output",
    "packed",
    "partition",
    "patch",
    "precise",
    "precision",
    "public",
    "readonly",
    "resource",
    "restrict",
    "return",
    "sample",
    "sampler1D",
    "sampler2D",
    "sampler2DArray",
    "sampler2DShadow",
    "sampler3D",
    "samplerCube",
    "shared",
    "short",
    "sizeof",
    "smooth",
    "static",
    "struct",
    "subroutine",
    "superp",
    "switch",
    "template",
    "this",
    "true",
    "typedef",
    "uimage2D",
    "uint",
    "uniform",
    "union",
    "unsigned",
    "usampler2D",
    "usampler3D",
    "usamplerCube",
    "using",
    "uvec2",
    "uvec3",
    "uvec4",
    "varying",
    "vec2",
    "vec3",
    "vec4",
    "void",
    "volatile",
    "while",
    "writeonly",
];

/// Builtin functions of every version of GLSL and GLSL ES, sorted.
///
/// Declaring a function with one of these names is an error, so user declarations avoid all
/// of them whether or not the FFI table maps anything to them.
pub const BUILTIN_FUNCTIONS: &[&str] = &[
    "EmitStreamVertex",
    "EmitVertex",
    "EndPrimitive",
    "EndStreamPrimitive",
    "abs",
    "acos",
    "acosh",
    "all",
    "allInvocations",
    "allInvocationsEqual",
    "any",
    "anyInvocation",
    "asin",
    "asinh",
    "atan",
    "atanh",
    "atomicAdd",
    "atomicAnd",
    "atomicCompSwap",
    "atomicCounter",
    "atomicCounterAdd",
    "atomicCounterAnd",
    "atomicCounterCompSwap",
    "atomicCounterDecrement",
    "atomicCounterExchange",
    "atomicCounterIncrement",
    "atomicCounterMax",
    "atomicCounterMin",
    "atomicCounterOr",
    "atomicCounterSubtract",
    "atomicCounterXor",
    "atomicExchange",
    "atomicMax",
    "atomicMin",
    "atomicOr",
    "atomicXor",
    "barrier",
    "bitCount",
    "bitfieldExtract",
    "bitfieldInsert",
    "bitfieldReverse",
    "ceil",
    "clamp",
    "cos",
    "cosh",
    "cross",
    "dFdx",
    "dFdxCoarse",
    "dFdxFine",
    "dFdy",
    "dFdyCoarse",
    "dFdyFine",
    "degrees",
    "determinant",
    "distance",
    "dot",
    "equal",
    "exp",
    "exp2",
    "faceforward",
    "findLSB",
    "findMSB",
    "floatBitsToInt",
    "floatBitsToUint",
    "floor",
    "fma",
    "fract",
    "frexp",
    "ftransform",
    "fwidth",
    "fwidthCoarse",
    "fwidthFine",
    "greaterThan",
    "greaterThanEqual",
    "groupMemoryBarrier",
    "imageAtomicAdd",
    "imageAtomicAnd",
    "imageAtomicCompSwap",
    "imageAtomicExchange",
    "imageAtomicMax",
    "imageAtomicMin",
    "imageAtomicOr",
    "imageAtomicXor",
    "imageLoad",
    "imageSamples",
    "imageSize",
    "imageStore",
    "imulExtended",
    "intBitsToFloat",
    "interpolateAtCentroid",
    "interpolateAtOffset",
    "interpolateAtSample",
    "inverse",
    "inversesqrt",
    "isinf",
    "isnan",
    "ldexp",
    "length",
    "lessThan",
    "lessThanEqual",
    "log",
    "log2",
    "matrixCompMult",
    "max",
    "memoryBarrier",
    "memoryBarrierAtomicCounter",
    "memoryBarrierBuffer",
    "memoryBarrierImage",
    "memoryBarrierShared",
    "min",
    "mix",
    "mod",
    "modf",
    "noise1",
    "noise2",
    "noise3",
    "noise4",
    "normalize",
    "not",
    "notEqual",
    "outerProduct",
    "packDouble2x32",
    "packHalf2x16",
    "packSnorm2x16",
    "packSnorm4x8",
    "packUnorm2x16",
    "packUnorm4x8",
    "pow",
    "radians",
    "reflect",
    "refract",
    "round",
    "roundEven",
    "shadow1D",
    "shadow1DLod",
    "shadow1DProj",
    "shadow1DProjLod",
    "shadow2D",
    "shadow2DLod",
    "shadow2DProj",
    "shadow2DProjLod",
    "sign",
    "sin",
    "sinh",
    "smoothstep",
    "sqrt",
    "step",
    "tan",
    "tanh",
    "texelFetch",
    "texelFetchOffset",
    "texture",
    "texture1D",
    "texture1DLod",
    "texture1DProj",
    "texture1DProjLod",
    "texture2D",
    "texture2DGradEXT",
    "texture2DLod",
    "texture2DLodEXT",
    "texture2DProj",
    "texture2DProjGradEXT",
    "texture2DProjLod",
    "texture2DProjLodEXT",
    "texture3D",
    "texture3DLod",
    "texture3DProj",
    "texture3DProjLod",
    "textureCube",
    "textureCubeGradEXT",
    "textureCubeLod",
    "textureCubeLodEXT",
    "textureGather",
    "textureGatherOffset",
    "textureGatherOffsets",
    "textureGrad",
    "textureGradOffset",
    "textureLod",
    "textureLodOffset",
    "textureOffset",
    "textureProj",
    "textureProjGrad",
    "textureProjGradOffset",
    "textureProjLod",
    "textureProjLodOffset",
    "textureProjOffset",
    "textureQueryLevels",
    "textureQueryLod",
    "textureSamples",
    "textureSize",
    "transpose",
    "trunc",
    "uaddCarry",
    "uintBitsToFloat",
    "umulExtended",
    "unpackDouble2x32",
    "unpackHalf2x16",
    "unpackSnorm2x16",
    "unpackSnorm4x8",
    "unpackUnorm2x16",
    "unpackUnorm4x8",
    "usubBorrow",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_is_sorted() {
        assert!(RESERVED.is_sorted(), "{RESERVED:?}");
    }

    #[test]
    fn builtin_functions_are_sorted() {
        assert!(BUILTIN_FUNCTIONS.is_sorted(), "{BUILTIN_FUNCTIONS:?}");
    }

    #[test]
    fn constructor_names_match_display() {
        for ty in [
            LeafType::VEC3,
            LeafType::MAT4,
            LeafType::Matrix {
                columns: VectorSize::Tri,
                rows: VectorSize::Bi,
            },
            LeafType::Vector {
                scalar: ScalarKind::Uint,
                size: VectorSize::Bi,
            },
        ] {
            assert_eq!(constructor_name(ty), ty.to_string());
        }
    }
}
