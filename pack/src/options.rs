use shadeport_back::{Config, FfiTable, GLSL};

/// Configuration/builder for options for compiling programs.
#[derive(Clone, Copy, Debug)]
pub struct CompileOptions<'a> {
    pub(crate) config: Config,
    ffi: Option<&'a FfiTable>,
    flags: CompileFlags,
}

impl Default for CompileOptions<'_> {
    #[must_use]
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> CompileOptions<'a> {
    /// Creates a [`CompileOptions`] with default options.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            config: Config::new(),
            ffi: None,
            flags: CompileFlags::PARALLEL,
        }
    }

    /// Sets the options for rendering each version of each shader.
    #[must_use]
    pub const fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Sets the table externals are resolved through.
    ///
    /// The default is [`GLSL`].
    #[must_use]
    pub const fn ffi(mut self, ffi: &'a FfiTable) -> Self {
        self.ffi = Some(ffi);
        self
    }

    /// Sets whether every lowered shader is checked again against the rules of its version
    /// before it is rendered.
    ///
    /// The default is `false`.
    #[must_use]
    pub fn verify_lowered(mut self, value: bool) -> Self {
        self.flags.set(CompileFlags::VERIFY_LOWERED, value);
        self
    }

    /// Sets whether shaders and versions are compiled on the `rayon` thread pool.
    ///
    /// The default is `true`. The output does not depend on this setting.
    #[must_use]
    pub fn parallel(mut self, value: bool) -> Self {
        self.flags.set(CompileFlags::PARALLEL, value);
        self
    }

    pub(crate) fn table(&self) -> &'a FfiTable {
        match self.ffi {
            Some(ffi) => ffi,
            None => &GLSL,
        }
    }

    pub(crate) fn has(&self, flag: CompileFlags) -> bool {
        self.flags.contains(flag)
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub(crate) struct CompileFlags: u32 {
        /// Run the post-lowering version check on every lowered shader.
        const VERIFY_LOWERED = 0x1;

        /// Fan out across the `rayon` thread pool.
        const PARALLEL = 0x2;
    }
}
