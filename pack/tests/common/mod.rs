//! Programs shared by the packaging tests.

#![allow(dead_code)]

use shadeport_ir::{Expr, Field, LeafType, OutputTarget, Program, SamplerKind, ShaderDecl, Stage};

pub const SAMPLER_2D: LeafType = LeafType::Sampler(SamplerKind::Sampler2D);

/// A program with one vertex and one fragment shader.
pub struct Sample {
    pub name: &'static str,
    pub program: Program,
    pub vertex: ShaderDecl,
    pub fragment: ShaderDecl,
}

impl Sample {
    pub fn source(&self) -> shadeport_pack::ProgramSource<'_> {
        shadeport_pack::ProgramSource {
            name: self.name,
            program: &self.program,
            vertex: &self.vertex,
            fragment: &self.fragment,
        }
    }
}

/// A vertex shader which passes `position` through and forwards `uv`.
fn passthrough(program: &mut Program) -> ShaderDecl {
    let mut vertex = ShaderDecl::new("passthrough", Stage::Vertex);
    let position = vertex.add_input("position", LeafType::VEC4);
    let uv_in = vertex.add_input("uv_in", LeafType::VEC2);
    let clip = vertex.add_output("clip", LeafType::VEC4, OutputTarget::Position);
    let uv = vertex.add_output("uv", LeafType::VEC2, OutputTarget::Varying);
    let scale = vertex.add_parameter("scale", LeafType::FLOAT);
    let times = program.add_external_function(
        "times",
        "mul",
        vec![LeafType::FLOAT, LeafType::VEC4],
        LeafType::VEC4,
    );
    vertex.assign(
        clip,
        Expr::apply(
            times,
            vec![
                Expr::parameter(scale, LeafType::FLOAT),
                Expr::input(position, LeafType::VEC4),
            ],
            LeafType::VEC4,
        ),
    );
    vertex.assign(uv, Expr::input(uv_in, LeafType::VEC2));
    vertex
}

/// A textured quad tinted by a record parameter, with a fragment discard.
pub fn textured() -> Sample {
    let mut program = Program::new();
    let vertex = passthrough(&mut program);

    let material = program.add_record(
        "Material",
        vec![
            Field::new("tint", LeafType::VEC4),
            Field::new("strength", LeafType::FLOAT),
        ],
    );
    let sample = program.add_external_function(
        "sample",
        "texture_2d",
        vec![SAMPLER_2D, LeafType::VEC2],
        LeafType::VEC4,
    );
    let modulate = program.add_external_function(
        "modulate",
        "mul",
        vec![LeafType::VEC4, LeafType::VEC4],
        LeafType::VEC4,
    );
    let less = program.add_external_function(
        "less",
        "lt",
        vec![LeafType::FLOAT, LeafType::FLOAT],
        LeafType::BOOL,
    );
    let mut fragment = ShaderDecl::new("tinted", Stage::Fragment);
    let uv = fragment.add_input("uv", LeafType::VEC2);
    let color = fragment.add_output("color", LeafType::VEC4, OutputTarget::Attachment(0));
    let image = fragment.add_parameter("image", SAMPLER_2D);
    let material_param = fragment.add_parameter("material", material);
    let field = |index, ty| Expr::field(Expr::parameter(material_param, material), index, ty);
    fragment.add_discard(Expr::apply(
        less,
        vec![field(1, LeafType::FLOAT), Expr::float(0.5)],
        LeafType::BOOL,
    ));
    fragment.assign(
        color,
        Expr::apply(
            modulate,
            vec![
                Expr::apply(
                    sample,
                    vec![
                        Expr::parameter(image, SAMPLER_2D),
                        Expr::input(uv, LeafType::VEC2),
                    ],
                    LeafType::VEC4,
                ),
                field(0, LeafType::VEC4),
            ],
            LeafType::VEC4,
        ),
    );

    Sample {
        name: "textured",
        program,
        vertex,
        fragment,
    }
}

/// Like [`textured()`], but the fragment shader rounds its color, which needs an emulation
/// before GLSL ES 3.00 and GLSL 1.30.
pub fn rounded() -> Sample {
    let mut program = Program::new();
    let vertex = passthrough(&mut program);

    let round = program.add_external_function(
        "round",
        "round",
        vec![LeafType::FLOAT],
        LeafType::FLOAT,
    );
    let color4 = program.add_external_function(
        "color4",
        "vec4",
        vec![LeafType::FLOAT; 4],
        LeafType::VEC4,
    );
    let mut fragment = ShaderDecl::new("rounded", Stage::Fragment);
    let uv = fragment.add_input("uv", LeafType::VEC2);
    let color = fragment.add_output("color", LeafType::VEC4, OutputTarget::Attachment(0));
    let u = Expr::swizzle(
        Expr::input(uv, LeafType::VEC2),
        &[shadeport_ir::Component::X],
        LeafType::FLOAT,
    );
    fragment.assign(
        color,
        Expr::apply(
            color4,
            vec![
                Expr::apply(round, vec![u], LeafType::FLOAT),
                Expr::float(0.0),
                Expr::float(0.0),
                Expr::float(1.0),
            ],
            LeafType::VEC4,
        ),
    );

    Sample {
        name: "rounded",
        program,
        vertex,
        fragment,
    }
}
