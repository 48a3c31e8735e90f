//! Tests of version support computation, requests, and agreement with lowering.

use exhaust::Exhaust as _;
use pretty_assertions::assert_eq;

use shadeport_back::ffi::{NativeForm, Rule};
use shadeport_back::ir::{
    Binding, Closure, Expr, Field, LeafType, LocalId, OutputTarget, Program, ScalarKind,
    ShaderDecl, Stage, VectorSize,
};
use shadeport_back::{
    Error, EsVersion, EsVersions, FamilyRequest, FfiTable, FullVersion, FullVersions, GLSL,
    VersionCheckError, VersionChecker, VersionRequest, VersionsSupported, lower,
};

mod common;
use common::{ES100, ES300, GL330, SAMPLER_2D, fragment_calling, textured};

/// A fragment shader writing input `c` to attachment 0, customized by `f`.
fn fragment(f: impl FnOnce(&mut Program, &mut ShaderDecl)) -> (Program, ShaderDecl) {
    let mut program = Program::new();
    let mut shader = ShaderDecl::new("custom", Stage::Fragment);
    let c = shader.add_input("c", LeafType::VEC4);
    let color = shader.add_output("color", LeafType::VEC4, OutputTarget::Attachment(0));
    shader.assign(color, Expr::input(c, LeafType::VEC4));
    f(&mut program, &mut shader);
    (program, shader)
}

fn integer_input() -> (Program, ShaderDecl) {
    fragment(|_, shader| {
        shader.add_input(
            "id",
            LeafType::Vector {
                scalar: ScalarKind::Int,
                size: VectorSize::Quad,
            },
        );
    })
}

fn depth_output() -> (Program, ShaderDecl) {
    fragment(|_, shader| {
        let depth = shader.add_output("depth", LeafType::FLOAT, OutputTarget::Depth);
        shader.assign(depth, Expr::float(0.5));
    })
}

/// How a fragment shader gets at the tint of a `Material { tex: sampler2D, tint: vec4 }`.
#[derive(Clone, Copy, Debug)]
enum MaterialUse {
    /// Reads the `tint` field of the parameter.
    Field,
    /// Passes the whole parameter to `tint_of`.
    WholeParameter,
    /// Builds a new material and passes it to `tint_of`.
    Constructed,
}

fn sampled_material(usage: MaterialUse) -> (Program, ShaderDecl) {
    fragment(|program, shader| {
        let material = program.add_record(
            "Material",
            vec![Field::new("tex", SAMPLER_2D), Field::new("tint", LeafType::VEC4)],
        );
        let m = Binding::new(LocalId(0), "material", material);
        let tint_of = program.add_function(
            "tint_of",
            vec![m.clone()],
            LeafType::VEC4,
            Expr::field(m.to_expr(), 1, LeafType::VEC4),
        );
        let image = shader.add_parameter("image", SAMPLER_2D);
        let param = shader.add_parameter("material", material);
        let whole = || Expr::parameter(param, material);
        shader.assignments[0].value = match usage {
            MaterialUse::Field => Expr::field(whole(), 1, LeafType::VEC4),
            MaterialUse::WholeParameter => Expr::apply(tint_of, vec![whole()], LeafType::VEC4),
            MaterialUse::Constructed => Expr::apply(
                tint_of,
                vec![Expr::record(
                    material,
                    vec![
                        Expr::parameter(image, SAMPLER_2D),
                        Expr::input(0, LeafType::VEC4),
                    ],
                )],
                LeafType::VEC4,
            ),
        };
    })
}

fn maximal(program: &Program, shader: &ShaderDecl, ffi: &FfiTable) -> VersionsSupported {
    let closure = Closure::for_shader(program, shader).unwrap();
    VersionChecker::new(program, ffi)
        .maximal(shader, &closure)
        .unwrap()
}

fn check(
    program: &Program,
    shader: &ShaderDecl,
    ffi: &FfiTable,
    request: VersionRequest,
) -> Result<VersionsSupported, Error> {
    let closure = Closure::for_shader(program, shader).unwrap();
    VersionChecker::new(program, ffi).check(shader, &closure, &request)
}

/// Full versions 1.10, 1.20, and 3.30 onward.
fn non_monotonic() -> VersionsSupported {
    VersionsSupported::new(
        FullVersions::V110 | FullVersions::V120 | FullVersions::at_least(FullVersion::V330),
        EsVersions::empty(),
    )
}

fn non_monotonic_table() -> FfiTable {
    let mut table = FfiTable::builder();
    table.function(
        "legacy_feature",
        [Rule::native(non_monotonic(), NativeForm::Call("legacyFeature"))],
    );
    table.build()
}

fn non_monotonic_shader() -> (Program, ShaderDecl) {
    fragment(|program, shader| {
        let feature = program.add_external_function(
            "legacy_feature",
            "legacy_feature",
            vec![LeafType::VEC4],
            LeafType::VEC4,
        );
        let value = shader.assignments[0].value.clone();
        shader.assignments[0].value = Expr::apply(feature, vec![value], LeafType::VEC4);
    })
}

#[test]
fn sample_supports_everything() {
    let sample = textured();
    for stage in [Stage::Vertex, Stage::Fragment] {
        assert_eq!(
            maximal(&sample.program, sample.shader(stage), &GLSL),
            VersionsSupported::ALL,
            "{stage}"
        );
    }
}

#[test]
fn integer_inputs_need_modern_versions() {
    let (program, shader) = integer_input();
    assert_eq!(
        maximal(&program, &shader, &GLSL),
        VersionsSupported::new(
            FullVersions::at_least(FullVersion::V130),
            EsVersions::at_least(EsVersion::V300),
        )
    );
}

#[test]
fn exact_request_reports_the_construct() {
    let (program, shader) = depth_output();
    let request = VersionRequest {
        full: FamilyRequest::Skip,
        embedded: FamilyRequest::Exactly(EsVersions::V100 | EsVersions::V300),
    };
    let error = check(&program, &shader, &GLSL, request).unwrap_err();
    let Error::VersionCheck(VersionCheckError::Unsupported {
        version, construct, ..
    }) = &error
    else {
        panic!("unexpected error {error:?}");
    };
    assert_eq!(*version, ES100);
    assert_eq!(construct, "output `depth`");

    let request = VersionRequest {
        full: FamilyRequest::Skip,
        embedded: FamilyRequest::Exactly(EsVersions::V300),
    };
    assert_eq!(
        check(&program, &shader, &GLSL, request).unwrap(),
        VersionsSupported::new(FullVersions::empty(), EsVersions::V300)
    );
}

#[test]
fn any_of_every_subset() {
    let (program, shader) = integer_input();
    let supported = maximal(&program, &shader, &GLSL);
    for subset in <[bool; 4]>::exhaust() {
        let set: EsVersions = EsVersion::ALL
            .iter()
            .zip(subset)
            .filter(|&(_, included)| included)
            .map(|(&version, _)| version)
            .collect();
        let request = VersionRequest {
            full: FamilyRequest::Skip,
            embedded: FamilyRequest::AnyOf(set),
        };
        let expected = VersionsSupported::new(FullVersions::empty(), set).intersection(supported);
        match check(&program, &shader, &GLSL, request) {
            Ok(result) => assert_eq!(result, expected, "{set:?}"),
            Err(Error::VersionCheck(VersionCheckError::NoSupportedVersion { .. })) => {
                assert!(expected.is_empty(), "{set:?}");
            }
            Err(error) => panic!("unexpected error {error:?}"),
        }
    }
}

#[test]
fn maximal_request_by_family() {
    let (program, shader) = depth_output();
    let request =
        VersionRequest::exactly_or_maximal(FullVersions::empty(), EsVersions::empty());
    assert_eq!(
        check(&program, &shader, &GLSL, request).unwrap(),
        VersionsSupported::new(FullVersions::all(), EsVersions::at_least(EsVersion::V300))
    );
}

#[test]
fn non_monotonic_support_is_exact() {
    let (program, shader) = non_monotonic_shader();
    let table = non_monotonic_table();
    assert_eq!(maximal(&program, &shader, &table), non_monotonic());

    let request = VersionRequest {
        full: FamilyRequest::Exactly(FullVersions::V120 | FullVersions::V130),
        embedded: FamilyRequest::Skip,
    };
    let error = check(&program, &shader, &table, request).unwrap_err();
    assert!(
        matches!(
            error,
            Error::VersionCheck(VersionCheckError::Unsupported {
                version: shadeport_back::DialectVersion::Full(FullVersion::V130),
                ..
            })
        ),
        "{error:?}"
    );

    let request = VersionRequest {
        full: FamilyRequest::AnyOf(FullVersions::all()),
        embedded: FamilyRequest::Skip,
    };
    assert_eq!(
        check(&program, &shader, &table, request).unwrap(),
        non_monotonic()
    );

    let request = VersionRequest::maximal();
    assert!(matches!(
        check(&program, &shader, &table, request).unwrap_err(),
        Error::VersionCheck(VersionCheckError::NoSupportedVersion { .. })
    ));
}

/// Shaders covering each kind of checked construct.
fn assorted() -> Vec<(Program, ShaderDecl)> {
    let sample = textured();
    vec![
        (sample.program.clone(), sample.vertex),
        (sample.program, sample.fragment),
        integer_input(),
        depth_output(),
        fragment_calling("round"),
        fragment_calling("trunc"),
        fragment(|_, shader| {
            shader.add_input("flag", LeafType::BOOL);
        }),
        fragment(|_, shader| {
            shader.add_parameter("count", LeafType::UINT);
        }),
        fragment(|_, shader| {
            shader.add_parameter(
                "basis",
                LeafType::Matrix {
                    columns: VectorSize::Bi,
                    rows: VectorSize::Tri,
                },
            );
        }),
        fragment(|_, shader| {
            let second = shader.add_output("second", LeafType::VEC4, OutputTarget::Attachment(1));
            shader.assign(second, Expr::input(0, LeafType::VEC4));
        }),
        fragment(|_, shader| {
            shader.outputs[0].ty = LeafType::FLOAT.into();
            shader.assignments[0].value = Expr::float(1.0);
        }),
        sampled_material(MaterialUse::Field),
        sampled_material(MaterialUse::WholeParameter),
        sampled_material(MaterialUse::Constructed),
    ]
}

fn lowers_legally(
    program: &Program,
    shader: &ShaderDecl,
    ffi: &FfiTable,
    version: shadeport_back::DialectVersion,
) -> bool {
    let closure = Closure::for_shader(program, shader).unwrap();
    match lower(program, shader, &closure, version, ffi) {
        Ok(lowered) => VersionChecker::new(program, ffi)
            .check_lowered(&lowered)
            .is_ok(),
        Err(Error::Ffi(_) | Error::MalformedShader { .. }) => false,
        Err(error) => panic!("unexpected error {error:?}"),
    }
}

#[test]
fn checker_agrees_with_lowering() {
    let table = non_monotonic_table();
    let mut cases: Vec<(Program, ShaderDecl, &FfiTable)> = assorted()
        .into_iter()
        .map(|(program, shader)| (program, shader, &*GLSL))
        .collect();
    let (program, shader) = non_monotonic_shader();
    cases.push((program, shader, &table));

    for (program, shader, ffi) in &cases {
        let supported = maximal(program, shader, ffi);
        for version in VersionsSupported::ALL.versions() {
            assert_eq!(
                supported.contains(version),
                lowers_legally(program, shader, ffi, version),
                "shader {} at {version}",
                shader.name
            );
        }
    }
}

#[test]
fn modern_outputs_in_es300() {
    let (program, shader) = integer_input();
    assert!(lowers_legally(&program, &shader, &GLSL, ES300));
    assert!(!lowers_legally(&program, &shader, &GLSL, ES100));
}

#[test]
fn records_holding_samplers_are_never_constructed() {
    let (program, shader) = sampled_material(MaterialUse::Field);
    assert_eq!(maximal(&program, &shader, &GLSL), VersionsSupported::ALL);

    for usage in [MaterialUse::WholeParameter, MaterialUse::Constructed] {
        let (program, shader) = sampled_material(usage);
        assert_eq!(
            maximal(&program, &shader, &GLSL),
            VersionsSupported::NONE,
            "{usage:?}"
        );
        let request = VersionRequest {
            full: FamilyRequest::Exactly(FullVersion::V330.set()),
            embedded: FamilyRequest::Skip,
        };
        let Err(Error::VersionCheck(VersionCheckError::Unsupported {
            construct, reason, ..
        })) = check(&program, &shader, &GLSL, request)
        else {
            panic!("{usage:?} was accepted");
        };
        assert_eq!(construct, "construction of record `Material`");
        assert_eq!(reason, "records holding samplers cannot be constructed");

        let closure = Closure::for_shader(&program, &shader).unwrap();
        let error = lower(&program, &shader, &closure, GL330, &GLSL).unwrap_err();
        assert!(
            matches!(error, Error::MalformedShader { .. }),
            "{usage:?}: {error:?}"
        );
    }
}
