//! The GLSL registration list.

use once_cell::sync::Lazy;

use super::emulate;
use super::{Emulation, FfiTable, NativeForm, Rule, Stages};
use crate::gast::{BinaryOp, UnaryOp};
use crate::{EsVersion, EsVersions, FullVersion, FullVersions, VersionsSupported};

/// Definitions of every external the GLSL backend supports.
pub static GLSL: Lazy<FfiTable> = Lazy::new(register);

const ALL: VersionsSupported = VersionsSupported::ALL;

/// Versions from `es` and `full` onward.
fn since(es: EsVersion, full: FullVersion) -> VersionsSupported {
    VersionsSupported::new(FullVersions::at_least(full), EsVersions::at_least(es))
}

/// Versions before `es` and `full`.
fn before(es: EsVersion, full: FullVersion) -> VersionsSupported {
    let since = since(es, full);
    VersionsSupported::new(
        FullVersions::all().difference(since.full),
        EsVersions::all().difference(since.embedded),
    )
}

/// GLSL ES 3.00 and GLSL 1.30, where integers, `in`/`out`, and `texture()` arrived.
fn modern() -> VersionsSupported {
    since(EsVersion::V300, FullVersion::V130)
}

fn legacy() -> VersionsSupported {
    before(EsVersion::V300, FullVersion::V130)
}

fn call(name: &'static str) -> NativeForm {
    NativeForm::Call(name)
}

/// Native from `es`/`full` onward, emulated before.
fn native_since(
    es: EsVersion,
    full: FullVersion,
    name: &'static str,
    emulation: Emulation,
) -> [Rule; 2] {
    [
        Rule::native(since(es, full), call(name)),
        Rule::emulated(ALL, emulation),
    ]
}

const OPERATORS: &[(&str, BinaryOp)] = &[
    ("add", BinaryOp::Add),
    ("sub", BinaryOp::Subtract),
    ("mul", BinaryOp::Multiply),
    ("div", BinaryOp::Divide),
    ("lt", BinaryOp::Less),
    ("le", BinaryOp::LessEqual),
    ("gt", BinaryOp::Greater),
    ("ge", BinaryOp::GreaterEqual),
    ("eq", BinaryOp::Equal),
    ("ne", BinaryOp::NotEqual),
    ("and", BinaryOp::LogicalAnd),
    ("or", BinaryOp::LogicalOr),
    ("xor", BinaryOp::LogicalXor),
];

const BIT_OPERATORS: &[(&str, BinaryOp)] = &[
    ("bit_and", BinaryOp::And),
    ("bit_or", BinaryOp::InclusiveOr),
    ("bit_xor", BinaryOp::ExclusiveOr),
    ("shl", BinaryOp::ShiftLeft),
    ("shr", BinaryOp::ShiftRight),
];

/// Builtin functions that exist under the same name in every version.
const MATH: &[&str] = &[
    "sin", "cos", "tan", "asin", "acos", "atan", "pow", "exp", "log", "exp2", "log2", "sqrt",
    "inversesqrt", "abs", "sign", "floor", "ceil", "fract", "mod", "min", "max", "clamp", "mix",
    "step", "smoothstep", "length", "distance", "dot", "cross", "normalize", "reflect", "refract",
    "faceforward", "matrixCompMult", "any", "all",
];

/// Constructors available in every version.
const CONSTRUCTORS: &[&str] = &[
    "float", "int", "bool", "vec2", "vec3", "vec4", "ivec2", "ivec3", "ivec4", "bvec2", "bvec3",
    "bvec4", "mat2", "mat3", "mat4",
];

const UNSIGNED_CONSTRUCTORS: &[&str] = &["uint", "uvec2", "uvec3", "uvec4"];

const NON_SQUARE_CONSTRUCTORS: &[&str] =
    &["mat2x3", "mat2x4", "mat3x2", "mat3x4", "mat4x2", "mat4x3"];

/// Component-wise comparisons, which are spelled in camel case.
const COMPARISONS: &[(&str, &str)] = &[
    ("less_than", "lessThan"),
    ("less_than_equal", "lessThanEqual"),
    ("greater_than", "greaterThan"),
    ("greater_than_equal", "greaterThanEqual"),
    ("equal", "equal"),
    ("not_equal", "notEqual"),
];

fn register() -> FfiTable {
    let mut table = FfiTable::builder();

    for &(symbol, op) in OPERATORS {
        table.function(symbol, [Rule::native(ALL, NativeForm::Binary(op))]);
    }
    for &(symbol, op) in BIT_OPERATORS {
        table.function(symbol, [Rule::native(modern(), NativeForm::Binary(op))]);
    }
    table
        .function("not", [Rule::native(ALL, NativeForm::Unary(UnaryOp::LogicalNot))])
        .function("neg", [Rule::native(ALL, NativeForm::Unary(UnaryOp::Negate))])
        .function(
            "bit_not",
            [Rule::native(modern(), NativeForm::Unary(UnaryOp::BitwiseNot))],
        )
        .function(
            "rem",
            [
                Rule::native(modern(), NativeForm::Binary(BinaryOp::Modulo)),
                Rule::emulated(ALL, emulate::REM),
            ],
        );

    for &name in MATH {
        table.function(name, [Rule::native(ALL, call(name))]);
    }
    for &(symbol, name) in COMPARISONS {
        table.function(symbol, [Rule::native(ALL, call(name))]);
    }

    let v300 = EsVersion::V300;
    table
        .function("round", native_since(v300, FullVersion::V130, "round", emulate::ROUND))
        .function("trunc", native_since(v300, FullVersion::V130, "trunc", emulate::TRUNC))
        .function("sinh", native_since(v300, FullVersion::V130, "sinh", emulate::SINH))
        .function("cosh", native_since(v300, FullVersion::V130, "cosh", emulate::COSH))
        .function("tanh", native_since(v300, FullVersion::V130, "tanh", emulate::TANH))
        .function("isnan", native_since(v300, FullVersion::V130, "isnan", emulate::ISNAN))
        .function(
            "transpose",
            native_since(v300, FullVersion::V120, "transpose", emulate::TRANSPOSE),
        )
        .function(
            "determinant",
            native_since(v300, FullVersion::V150, "determinant", emulate::DETERMINANT),
        )
        .function(
            "inverse",
            native_since(v300, FullVersion::V140, "inverse", emulate::INVERSE),
        );

    for &name in CONSTRUCTORS {
        table.function(name, [Rule::native(ALL, call(name))]);
    }
    for &name in UNSIGNED_CONSTRUCTORS {
        table.function(name, [Rule::native(modern(), call(name))]);
    }
    for &name in NON_SQUARE_CONSTRUCTORS {
        table.function(
            name,
            [Rule::native(since(v300, FullVersion::V120), call(name))],
        );
    }

    // Texture lookups changed names when `texture()` became overloaded.
    table
        .function(
            "texture_2d",
            [
                Rule::native(legacy(), call("texture2D")),
                Rule::native(modern(), call("texture")),
            ],
        )
        .function(
            "texture_cube",
            [
                Rule::native(legacy(), call("textureCube")),
                Rule::native(modern(), call("texture")),
            ],
        )
        .function(
            "texture_2d_lod",
            [
                Rule::native(legacy(), call("texture2DLod")).only(Stages::VERTEX),
                Rule::native(modern(), call("textureLod")),
            ],
        )
        .function(
            "texture_2d_bias",
            [
                Rule::native(legacy(), call("texture2D")).only(Stages::FRAGMENT),
                Rule::native(modern(), call("texture")).only(Stages::FRAGMENT),
            ],
        )
        .function("texel_fetch_2d", [Rule::native(modern(), call("texelFetch"))])
        .function("texture_size_2d", [Rule::native(modern(), call("textureSize"))])
        .function("texture_grad_2d", [Rule::native(modern(), call("textureGrad"))]);

    // Derivatives are fragment-only, and an extension in GLSL ES 1.00.
    let derivatives = VersionsSupported::new(FullVersions::all(), EsVersions::at_least(v300));
    for (symbol, name) in [("dfdx", "dFdx"), ("dfdy", "dFdy"), ("fwidth", "fwidth")] {
        table.function(
            symbol,
            [Rule::native(derivatives, call(name)).only(Stages::FRAGMENT)],
        );
    }

    table
        .value(
            "frag_coord",
            [Rule::native(ALL, NativeForm::Variable("gl_FragCoord")).only(Stages::FRAGMENT)],
        )
        .value(
            "front_facing",
            [Rule::native(ALL, NativeForm::Variable("gl_FrontFacing")).only(Stages::FRAGMENT)],
        )
        .value(
            "point_coord",
            [Rule::native(
                VersionsSupported::new(
                    FullVersions::at_least(FullVersion::V120),
                    EsVersions::all(),
                ),
                NativeForm::Variable("gl_PointCoord"),
            )
            .only(Stages::FRAGMENT)],
        )
        .value(
            "vertex_id",
            [Rule::native(modern(), NativeForm::Variable("gl_VertexID")).only(Stages::VERTEX)],
        )
        .value(
            "instance_id",
            [Rule::native(
                since(v300, FullVersion::V140),
                NativeForm::Variable("gl_InstanceID"),
            )
            .only(Stages::VERTEX)],
        )
        .value("pi", [Rule::emulated(ALL, emulate::PI)]);

    table.build()
}

#[cfg(test)]
mod tests {
    use shadeport_ir::{ExternalKind, Stage};

    use super::*;
    use crate::DialectVersion;
    use crate::ffi::{Decision, FfiError};

    fn resolve(symbol: &str, version: DialectVersion) -> Result<Decision, FfiError> {
        GLSL.resolve(symbol, ExternalKind::Function, version, Stage::Fragment)
    }

    #[test]
    fn round_is_emulated_on_old_versions_only() {
        for version in VersionsSupported::ALL.versions() {
            let native = matches!(
                resolve("round", version).unwrap(),
                Decision::Native(NativeForm::Call("round"))
            );
            assert_eq!(native, modern().contains(version), "{version}");
        }
    }

    #[test]
    fn texture_lookups_are_renamed() {
        let es100 = DialectVersion::Embedded(EsVersion::V100);
        let gl330 = DialectVersion::Full(FullVersion::V330);
        assert!(matches!(
            resolve("texture_2d", es100).unwrap(),
            Decision::Native(NativeForm::Call("texture2D"))
        ));
        assert!(matches!(
            resolve("texture_2d", gl330).unwrap(),
            Decision::Native(NativeForm::Call("texture"))
        ));
        assert_eq!(
            GLSL.availability("texture_2d_lod", ExternalKind::Function, Stage::Fragment)
                .unwrap(),
            modern()
        );
    }

    #[test]
    fn names_reserved_include_builtin_variables() {
        let names = GLSL.native_names();
        assert!(names.contains(&"gl_FragCoord"));
        assert!(names.contains(&"texture2D"));
        assert!(names.contains(&"inversesqrt"));
        assert!(!names.contains(&"round_emulated"));
    }
}
