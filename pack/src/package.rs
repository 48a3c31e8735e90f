//! Compiles the vertex and fragment shader of a program for every supported version and
//! packages the compacted results.

use rayon::prelude::*;
use shadeport_back::{
    self as back, BoundUniform, DialectVersion, FfiTable, InterfaceItem, ShaderInterface,
    VersionChecker, VersionRequest, VersionsSupported,
};
use shadeport_ir::{Closure, Program, ShaderDecl, Stage};
use tracing::{info, instrument};

use crate::compact::{CompactedSources, Compactor};
use crate::options::{CompileFlags, CompileOptions};
use crate::Error;

// -------------------------------------------------------------------------------------------------

/// A program to compile: its declarations and the two shaders to generate.
#[derive(Clone, Copy, Debug)]
pub struct ProgramSource<'a> {
    /// Name of the program, for the package and for messages.
    pub name: &'a str,
    /// Declarations both shaders may use.
    pub program: &'a Program,
    /// Must be a [`Stage::Vertex`] shader.
    pub vertex: &'a ShaderDecl,
    /// Must be a [`Stage::Fragment`] shader.
    pub fragment: &'a ShaderDecl,
}

/// The externally visible surface of a shader. It is the same in every version.
#[derive(Clone, Debug, PartialEq)]
pub struct ShaderMetadata {
    /// Source-level name of the shader.
    pub name: String,
    /// Which pipeline stage the shader runs in.
    pub stage: Stage,
    /// Inputs with their GLSL identifiers, in source order.
    pub inputs: Vec<InterfaceItem>,
    /// Outputs with their GLSL identifiers, in source order.
    pub outputs: Vec<InterfaceItem>,
    /// Flattened parameters, with the dotted names the runtime binds values by.
    pub uniforms: Vec<BoundUniform>,
}

impl ShaderMetadata {
    /// The metadata of `shader`, named as by every version generated with `ffi`.
    #[must_use]
    pub fn new(program: &Program, shader: &ShaderDecl, ffi: &FfiTable) -> Self {
        let interface = ShaderInterface::new(program, shader, ffi);
        let uniforms = interface.uniforms().cloned().collect();
        Self {
            name: shader.name.clone(),
            stage: shader.stage,
            inputs: interface.inputs,
            outputs: interface.outputs,
            uniforms,
        }
    }
}

/// One shader of a packaged program.
#[derive(Clone, Debug, PartialEq)]
pub struct CompactedShader {
    /// Version-independent interface.
    pub metadata: ShaderMetadata,
    /// The generated text of every packaged version.
    pub sources: CompactedSources,
}

/// Both shaders of a program, compiled for the same set of versions.
#[derive(Clone, Debug, PartialEq)]
pub struct CompactedProgram {
    /// Name of the program.
    pub name: String,
    /// Every version both shaders were generated for.
    pub versions: VersionsSupported,
    /// The vertex shader.
    pub vertex: CompactedShader,
    /// The fragment shader.
    pub fragment: CompactedShader,
}

// -------------------------------------------------------------------------------------------------

struct Prepared<'a> {
    decl: &'a ShaderDecl,
    closure: Closure,
}

impl<'a> Prepared<'a> {
    fn new(program: &Program, decl: &'a ShaderDecl) -> Result<Self, Error> {
        Ok(Self {
            decl,
            closure: Closure::for_shader(program, decl)?,
        })
    }
}

/// Compiles `source` for every version `request` resolves to that both of its shaders
/// support.
///
/// Version support is decided for both shaders before anything is lowered. Then every
/// (shader, version) pair is lowered and rendered independently, and each shader's texts are
/// compacted once all of them are done.
///
/// # Errors
///
/// Returns [`Error::NoCommonVersion`] if the shaders' supported versions do not overlap, and
/// otherwise the first checking, lowering, or compaction error in (shader, version) order.
#[instrument(skip_all, name = "compile_program", fields(program = source.name))]
pub fn compile_program(
    source: &ProgramSource<'_>,
    request: &VersionRequest,
    options: &CompileOptions<'_>,
) -> Result<CompactedProgram, Error> {
    let program = source.program;
    let ffi = options.table();
    let shaders = [
        Prepared::new(program, source.vertex)?,
        Prepared::new(program, source.fragment)?,
    ];

    let checker = VersionChecker::new(program, ffi);
    let vertex_versions = checker.check(shaders[0].decl, &shaders[0].closure, request)?;
    let fragment_versions = checker.check(shaders[1].decl, &shaders[1].closure, request)?;
    let versions = vertex_versions.intersection(fragment_versions);
    if versions.is_empty() {
        return Err(Error::NoCommonVersion {
            program: source.name.to_owned(),
            vertex: vertex_versions,
            fragment: fragment_versions,
        });
    }

    let cells: Vec<(usize, DialectVersion)> = (0..shaders.len())
        .flat_map(|shader| versions.versions().map(move |version| (shader, version)))
        .collect();
    let render = |&(shader, version): &(usize, DialectVersion)| -> Result<String, Error> {
        let Prepared { decl, closure } = &shaders[shader];
        let lowered = back::lower(program, decl, closure, version, ffi)?;
        if options.has(CompileFlags::VERIFY_LOWERED) {
            checker.check_lowered(&lowered).map_err(back::Error::from)?;
        }
        Ok(back::write_string(&lowered, options.config)?)
    };
    let results: Vec<Result<String, Error>> = if options.has(CompileFlags::PARALLEL) {
        cells.par_iter().map(&render).collect()
    } else {
        cells.iter().map(&render).collect()
    };
    let texts = results.into_iter().collect::<Result<Vec<String>, Error>>()?;

    let mut compacted = texts.chunks(versions.len()).map(|texts| {
        Compactor::new().compact(
            versions
                .versions()
                .zip(texts)
                .map(|(version, text)| (version, text.as_bytes())),
        )
    });
    let (Some(vertex), Some(fragment)) = (compacted.next(), compacted.next()) else {
        unreachable!("rendered {} texts for {} versions", texts.len(), versions.len());
    };
    let vertex = CompactedShader {
        metadata: ShaderMetadata::new(program, source.vertex, ffi),
        sources: vertex?,
    };
    let fragment = CompactedShader {
        metadata: ShaderMetadata::new(program, source.fragment, ffi),
        sources: fragment?,
    };

    info!(
        %versions,
        vertex = vertex.sources.unique(),
        fragment = fragment.sources.unique(),
        "packaged program"
    );
    Ok(CompactedProgram {
        name: source.name.to_owned(),
        versions,
        vertex,
        fragment,
    })
}

/// Compiles several programs with the same request and options.
///
/// # Errors
///
/// Fails with the error of the first failing program in `sources` order.
#[instrument(skip_all, name = "compile_programs", fields(count = sources.len()))]
pub fn compile_programs(
    sources: &[ProgramSource<'_>],
    request: &VersionRequest,
    options: &CompileOptions<'_>,
) -> Result<Vec<CompactedProgram>, Error> {
    let compile = |source: &ProgramSource<'_>| compile_program(source, request, options);
    let results: Vec<Result<CompactedProgram, Error>> = if options.has(CompileFlags::PARALLEL) {
        sources.par_iter().map(compile).collect()
    } else {
        sources.iter().map(compile).collect()
    };
    results.into_iter().collect()
}
