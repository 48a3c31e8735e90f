//! Tests that lowered declarations are emitted in dependency order.

use shadeport_back::gast::{DeclarationKind, DialectShader, Origin};
use shadeport_back::ir::{
    Binding, Closure, Expr, Field, LeafType, LocalId, OutputTarget, Program, ShaderDecl, Stage,
};
use shadeport_back::{GLSL, VersionsSupported, lower};

/// `shade` uses `Pair` and the external `round`; `scale` uses `inverse` and `determinant`.
fn layered() -> (Program, ShaderDecl) {
    let mut program = Program::new();
    let pair = program.add_record(
        "Pair",
        vec![
            Field::new("lo", LeafType::FLOAT),
            Field::new("hi", LeafType::FLOAT),
        ],
    );
    let inverse = program.add_external_function(
        "inverse",
        "inverse",
        vec![LeafType::MAT2],
        LeafType::MAT2,
    );
    let mat2 = program.add_external_function(
        "mat2",
        "mat2",
        vec![LeafType::FLOAT; 4],
        LeafType::MAT2,
    );
    let determinant = program.add_external_function(
        "determinant",
        "determinant",
        vec![LeafType::MAT2],
        LeafType::FLOAT,
    );
    let round = program.add_external_function(
        "round",
        "round",
        vec![LeafType::FLOAT],
        LeafType::FLOAT,
    );
    let scale = program.add_value(
        "scale",
        LeafType::FLOAT,
        Expr::apply(
            determinant,
            vec![Expr::apply(
                inverse,
                vec![Expr::apply(
                    mat2,
                    vec![
                        Expr::float(2.0),
                        Expr::float(0.0),
                        Expr::float(0.0),
                        Expr::float(2.0),
                    ],
                    LeafType::MAT2,
                )],
                LeafType::MAT2,
            )],
            LeafType::FLOAT,
        ),
    );
    let p = Binding::new(LocalId(0), "p", pair);
    let shade = program.add_function(
        "shade",
        vec![p.clone()],
        LeafType::FLOAT,
        Expr::apply(
            round,
            vec![Expr::field(p.to_expr(), 1, LeafType::FLOAT)],
            LeafType::FLOAT,
        ),
    );

    let mut shader = ShaderDecl::new("layered", Stage::Fragment);
    let v = shader.add_input("v", LeafType::FLOAT);
    let depth = shader.add_output("depth", LeafType::FLOAT, OutputTarget::Depth);
    shader.assign(
        depth,
        Expr::apply(
            shade,
            vec![Expr::record(
                pair,
                vec![
                    Expr::term(scale, LeafType::FLOAT),
                    Expr::input(v, LeafType::FLOAT),
                ],
            )],
            LeafType::FLOAT,
        ),
    );
    (program, shader)
}

/// Every declaration only mentions declarations before it.
fn assert_topological(shader: &DialectShader) {
    for (index, decl) in shader.declarations.iter().enumerate() {
        for name in decl.mentions() {
            if let Some(dependency) = shader.declaration_index(name) {
                assert!(
                    dependency < index,
                    "{} mentions {name}, declared at {dependency}, at {}",
                    decl.name,
                    shader.version
                );
            }
        }
    }
}

#[test]
fn declarations_precede_uses_in_every_version() {
    let (program, shader) = layered();
    let closure = Closure::for_shader(&program, &shader).unwrap();
    for version in VersionsSupported::ALL.versions() {
        let lowered = lower(&program, &shader, &closure, version, &GLSL).unwrap();
        assert_topological(&lowered);
    }
}

#[test]
fn emulations_take_the_place_of_their_external() {
    let (program, shader) = layered();
    let closure = Closure::for_shader(&program, &shader).unwrap();
    let lowered = lower(
        &program,
        &shader,
        &closure,
        shadeport_back::DialectVersion::Full(shadeport_back::FullVersion::V110),
        &GLSL,
    )
    .unwrap();
    let origins: Vec<String> = lowered
        .declarations
        .iter()
        .map(|decl| decl.origin.to_string())
        .collect();
    assert_eq!(
        origins,
        [
            "record Pair",
            "emulation of round",
            "term shade",
            "emulation of determinant",
            "emulation of inverse",
            "term scale",
        ]
    );

    // `scale` is a value, lowered to a function without parameters.
    let scale = &lowered.declarations[5];
    assert!(matches!(
        &scale.kind,
        DeclarationKind::Function { params, .. } if params.is_empty()
    ));
    assert!(matches!(scale.origin, Origin::Term { .. }));
}
