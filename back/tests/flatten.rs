//! Tests of uniform flattening and of how lowering uses the flattened uniforms.

use pretty_assertions::assert_eq;

use shadeport_back::ir::{
    Binding, Closure, Expr, Field, LeafType, LocalId, OutputTarget, Program, RecordId,
    ShaderDecl, Stage,
};
use shadeport_back::uniform::{UniformLeaf, expand};
use shadeport_back::{Config, GLSL, ShaderInterface, lower, write_string};

mod common;
use common::{ES100, GL330};

fn xyz(program: &mut Program) -> RecordId {
    program.add_record(
        "Xyz",
        vec![
            Field::new("x", LeafType::FLOAT),
            Field::new("y", LeafType::FLOAT),
            Field::new("z", LeafType::FLOAT),
        ],
    )
}

fn names(leaves: &[UniformLeaf]) -> Vec<&str> {
    leaves.iter().map(|leaf| leaf.name.as_str()).collect()
}

#[test]
fn leaf_parameter_keeps_its_name() {
    let program = Program::new();
    assert_eq!(
        expand(&program, "time", LeafType::FLOAT.into()),
        vec![UniformLeaf {
            name: "time".into(),
            ty: LeafType::FLOAT,
            path: vec![],
        }]
    );
}

#[test]
fn record_parameter() {
    let mut program = Program::new();
    let xyz = xyz(&mut program);
    let leaves = expand(&program, "xyz", xyz.into());
    assert_eq!(names(&leaves), ["xyz.x", "xyz.y", "xyz.z"]);
    assert_eq!(
        leaves.iter().map(|leaf| leaf.path.clone()).collect::<Vec<_>>(),
        [vec![0], vec![1], vec![2]]
    );
}

#[test]
fn nested_record_parameter() {
    let mut program = Program::new();
    let xyz = xyz(&mut program);
    let outer = program.add_record(
        "Outer",
        vec![Field::new("a", xyz), Field::new("b", xyz), Field::new("c", xyz)],
    );
    let leaves = expand(&program, "p", outer.into());
    assert_eq!(leaves.len(), 9);
    assert_eq!(
        names(&leaves),
        [
            "p.a.x", "p.a.y", "p.a.z", "p.b.x", "p.b.y", "p.b.z", "p.c.x", "p.c.y", "p.c.z"
        ]
    );
    assert_eq!(leaves[5].path, [1, 2]);
}

/// A fragment shader which passes a whole record parameter to a function.
fn light_shader() -> (Program, ShaderDecl) {
    let mut program = Program::new();
    let light = program.add_record(
        "Light",
        vec![
            Field::new("color", LeafType::VEC3),
            Field::new("intensity", LeafType::FLOAT),
        ],
    );
    let extend = program.add_external_function(
        "extend",
        "vec4",
        vec![LeafType::VEC3, LeafType::FLOAT],
        LeafType::VEC4,
    );
    let param = Binding::new(LocalId(0), "light", light);
    let body = Expr::apply(
        extend,
        vec![
            Expr::field(param.to_expr(), 0, LeafType::VEC3),
            Expr::field(param.to_expr(), 1, LeafType::FLOAT),
        ],
        LeafType::VEC4,
    );
    let shade = program.add_function("shade", vec![param], LeafType::VEC4, body);

    let mut shader = ShaderDecl::new("lit", Stage::Fragment);
    let color = shader.add_output("color", LeafType::VEC4, OutputTarget::Attachment(0));
    let light_param = shader.add_parameter("light", light);
    shader.assign(
        color,
        Expr::apply(
            shade,
            vec![Expr::parameter(light_param, light)],
            LeafType::VEC4,
        ),
    );
    (program, shader)
}

#[test]
fn record_reference_is_rebuilt_from_leaves() {
    let (program, shader) = light_shader();
    let closure = Closure::for_shader(&program, &shader).unwrap();
    let lowered = lower(&program, &shader, &closure, GL330, &GLSL).unwrap();
    assert_eq!(
        write_string(&lowered, Config::new()).unwrap(),
        indoc::indoc! {
            "
            uniform vec3 light_color;
            uniform float light_intensity;
            layout(location = 0) out vec4 color;

            struct Light {
                vec3 color;
                float intensity;
            };

            vec4 shade(Light light) {
                return vec4(light.color, light.intensity);
            }

            void main() {
                color = shade(Light(light_color, light_intensity));
            }
            "
        }
    );
}

#[test]
fn uniform_names_do_not_depend_on_version() {
    let (program, shader) = light_shader();
    let closure = Closure::for_shader(&program, &shader).unwrap();
    let uniforms = |version| {
        lower(&program, &shader, &closure, version, &GLSL)
            .unwrap()
            .uniforms
    };
    assert_eq!(uniforms(ES100), uniforms(GL330));

    let interface = ShaderInterface::new(&program, &shader, &GLSL);
    assert_eq!(
        interface
            .uniforms()
            .map(|u| (u.ident.as_str(), u.leaf.name.as_str()))
            .collect::<Vec<_>>(),
        [
            ("light_color", "light.color"),
            ("light_intensity", "light.intensity")
        ]
    );
}
