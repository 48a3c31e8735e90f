/// Configuration/builder for options for GLSL text generation.
///
/// These options only affect the rendered text, never which versions a shader is legal for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Config {
    pub(crate) flags: WriterFlags,
    pub(crate) default_precision: Precision,
}

impl Default for Config {
    #[must_use]
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Creates a [`Config`] with default options.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            flags: WriterFlags::empty(),
            default_precision: Precision::High,
        }
    }

    /// Sets whether the output starts with a `#version` directive.
    ///
    /// The default is `false`, since the runtime which loads compacted shaders prepends
    /// the directive itself, and omitting it lets identical bodies of different versions
    /// share storage.
    #[must_use]
    pub fn version_directive(mut self, value: bool) -> Self {
        self.flags.set(WriterFlags::VERSION_DIRECTIVE, value);
        self
    }

    /// Sets whether each declaration is preceded by a comment naming where it came from.
    ///
    /// The default is `false`.
    #[must_use]
    pub fn source_comments(mut self, value: bool) -> Self {
        self.flags.set(WriterFlags::SOURCE_COMMENTS, value);
        self
    }

    /// Sets the default float precision declared by GLSL ES shaders.
    ///
    /// The default is [`Precision::High`].
    #[must_use]
    pub const fn default_precision(mut self, value: Precision) -> Self {
        self.default_precision = value;
        self
    }

    pub(crate) fn has(&self, flag: WriterFlags) -> bool {
        self.flags.contains(flag)
    }
}

/// GLSL ES precision qualifiers.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Precision {
    /// `lowp`
    Low,
    /// `mediump`
    Medium,
    /// `highp`
    High,
}

bitflags::bitflags! {
    /// Options for what GLSL text is generated.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub(crate) struct WriterFlags: u32 {
        /// Start with a `#version` directive.
        const VERSION_DIRECTIVE = 0x1;

        /// Precede declarations with comments naming their origin.
        const SOURCE_COMMENTS = 0x2;
    }
}
