//! Backend which lowers typed shader programs to many versions of GLSL and GLSL ES.
//!
//! The pipeline for one shader is:
//!
//! 1. [`VersionChecker`] decides which [`DialectVersion`]s the shader can be generated for.
//! 2. [`lower()`] produces a [`DialectShader`](gast::DialectShader) for one version, resolving
//!    externals through an [`FfiTable`] such as [`GLSL`].
//! 3. [`Writer`] (or [`write_string()`]) renders it as text.
//!
//! Every step is a pure function of its inputs, so different shaders and versions can be
//! processed in parallel.

use core::fmt;

// -------------------------------------------------------------------------------------------------

mod check;
mod config;
mod conv;
pub mod ffi;
pub mod gast;
mod interface;
mod namer;
mod transform;
pub mod uniform;
mod util;
mod version;
mod writer;

pub use check::{Construct, FamilyRequest, VersionCheckError, VersionChecker, VersionRequest};
pub use config::{Config, Precision};
pub use conv::{BUILTIN_FUNCTIONS, RESERVED};
pub use ffi::{FfiError, FfiTable, GLSL};
pub use interface::{BoundUniform, InterfaceItem, ShaderInterface};
pub use transform::lower;
pub use version::{
    DialectVersion, EsVersion, EsVersions, Family, FullVersion, FullVersions, VersionsSupported,
};
pub use writer::Writer;

/// The version of the program representation we are compatible with.
pub use shadeport_ir as ir;

// -------------------------------------------------------------------------------------------------

/// Errors returned by the GLSL backend.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An external could not be resolved for the requested version and stage.
    #[error(transparent)]
    Ffi(#[from] FfiError),

    /// The shader cannot be generated for a requested version.
    #[error(transparent)]
    VersionCheck(#[from] VersionCheckError),

    /// A declaration was referenced that the closure did not provide, or provided too late.
    #[error("`{name}` is used before it is declared")]
    MissingDeclaration {
        /// Source name of the declaration.
        name: String,
    },

    /// The shader breaks a structural rule that earlier stages are expected to enforce,
    /// such as a vertex shader without a position output.
    #[error("shader `{shader}` is malformed: {reason}")]
    MalformedShader {
        /// Name of the shader being lowered.
        shader: String,
        /// Which rule it breaks.
        reason: String,
    },

    /// The provided [`fmt::Write`] implementation returned an error.
    #[error("formatting cancelled")]
    Fmt(#[from] fmt::Error),
}

/// Converts `shader` to a string of GLSL code.
///
/// # Errors
///
/// Currently never fails, since writing to a [`String`] cannot fail; the [`Result`] is kept
/// for symmetry with [`Writer::write()`].
pub fn write_string(shader: &gast::DialectShader, config: Config) -> Result<String, Error> {
    let mut w = Writer::new(String::new(), config);
    w.write(shader)?;
    let output = w.finish();
    Ok(output)
}
