//! Packaging of shader programs: compiles both shaders of a program for many GLSL versions
//! and stores each shader's distinct texts once.
//!
//! [`compile_program()`] is the entry point. [`Compactor`] can also be used on its own for
//! texts produced elsewhere.

use std::io;

use shadeport_back::VersionsSupported;
use shadeport_ir::ClosureError;

mod compact;
mod options;
mod package;

pub use compact::{CompactedSources, Compactor, ContentHash, normalize};
pub use options::CompileOptions;
pub use package::{
    CompactedProgram, CompactedShader, ProgramSource, ShaderMetadata, compile_program,
    compile_programs,
};

/// Errors returned while packaging programs.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Checking, lowering, or rendering a shader failed.
    #[error(transparent)]
    Back(#[from] shadeport_back::Error),

    /// The declarations used by a shader could not be ordered.
    #[error(transparent)]
    Closure(#[from] ClosureError),

    /// A rendered text could not be read during compaction.
    #[error("failed to read shader source")]
    Io(#[from] io::Error),

    /// Each shader supports some requested versions, but not the same ones.
    #[error(
        "shaders of program `{program}` have no version in common \
        (vertex: {vertex}, fragment: {fragment})"
    )]
    NoCommonVersion {
        /// Name of the program.
        program: String,
        /// What the vertex shader supports of the request.
        vertex: VersionsSupported,
        /// What the fragment shader supports of the request.
        fragment: VersionsSupported,
    },
}
