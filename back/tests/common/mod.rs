//! Shader programs shared by the backend tests.

#![allow(dead_code)]

use shadeport_back::ir::{
    Closure, Expr, Field, LeafType, OutputTarget, Program, SamplerKind, ShaderDecl, Stage,
};
use shadeport_back::{DialectVersion, EsVersion, FullVersion};

pub const SAMPLER_2D: LeafType = LeafType::Sampler(SamplerKind::Sampler2D);

pub const ES100: DialectVersion = DialectVersion::Embedded(EsVersion::V100);
pub const ES300: DialectVersion = DialectVersion::Embedded(EsVersion::V300);
pub const GL330: DialectVersion = DialectVersion::Full(FullVersion::V330);

/// A program with one vertex and one fragment shader.
pub struct Sample {
    pub program: Program,
    pub vertex: ShaderDecl,
    pub fragment: ShaderDecl,
}

impl Sample {
    pub fn closure(&self, stage: Stage) -> Closure {
        Closure::for_shader(&self.program, self.shader(stage)).unwrap()
    }

    pub fn shader(&self, stage: Stage) -> &ShaderDecl {
        match stage {
            Stage::Vertex => &self.vertex,
            Stage::Fragment => &self.fragment,
        }
    }
}

/// A textured, tinted quad with a fragment discard.
pub fn textured() -> Sample {
    let mut program = Program::new();

    let transform_point = program.add_external_function(
        "transform_point",
        "mul",
        vec![LeafType::MAT4, LeafType::VEC4],
        LeafType::VEC4,
    );
    let extend = program.add_external_function(
        "extend",
        "vec4",
        vec![LeafType::VEC3, LeafType::FLOAT],
        LeafType::VEC4,
    );
    let mut vertex = ShaderDecl::new("quad", Stage::Vertex);
    let position = vertex.add_input("position", LeafType::VEC3);
    let uv_in = vertex.add_input("uv_in", LeafType::VEC2);
    let clip = vertex.add_output("clip", LeafType::VEC4, OutputTarget::Position);
    let uv = vertex.add_output("uv", LeafType::VEC2, OutputTarget::Varying);
    let transform = vertex.add_parameter("transform", LeafType::MAT4);
    vertex.assign(
        clip,
        Expr::apply(
            transform_point,
            vec![
                Expr::parameter(transform, LeafType::MAT4),
                Expr::apply(
                    extend,
                    vec![
                        Expr::input(position, LeafType::VEC3),
                        Expr::float(1.0),
                    ],
                    LeafType::VEC4,
                ),
            ],
            LeafType::VEC4,
        ),
    );
    vertex.assign(uv, Expr::input(uv_in, LeafType::VEC2));

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
        program,
        vertex,
        fragment,
    }
}

/// A fragment shader which writes `vec4(f(v), 0.0, 0.0, 1.0)` for the external `symbol`.
pub fn fragment_calling(symbol: &str) -> (Program, ShaderDecl) {
    let mut program = Program::new();
    let f = program.add_external_function(
        symbol,
        symbol,
        vec![LeafType::FLOAT],
        LeafType::FLOAT,
    );
    let color4 = program.add_external_function(
        "color4",
        "vec4",
        vec![LeafType::FLOAT; 4],
        LeafType::VEC4,
    );
    let mut shader = ShaderDecl::new(format!("calls_{symbol}"), Stage::Fragment);
    let v = shader.add_input("v", LeafType::FLOAT);
    let color = shader.add_output("color", LeafType::VEC4, OutputTarget::Attachment(0));
    shader.assign(
        color,
        Expr::apply(
            color4,
            vec![
                Expr::apply(f, vec![Expr::input(v, LeafType::FLOAT)], LeafType::FLOAT),
                Expr::float(0.0),
                Expr::float(0.0),
                Expr::float(1.0),
            ],
            LeafType::VEC4,
        ),
    );
    (program, shader)
}
