use hashbrown::HashSet;

use crate::conv::{BUILTIN_FUNCTIONS, RESERVED};
use crate::ffi::FfiTable;
use crate::util::Temp;

/// Assigns unique GLSL identifiers within one generated shader.
///
/// Source names are sanitized so that they never start with `_` or `gl_` and never contain
/// `__`; synthesized temporaries are the only identifiers starting with `_`.
#[derive(Clone, Debug)]
pub(crate) struct Namer {
    used: HashSet<String>,
    temporaries: u32,
}

impl Namer {
    /// A namer which avoids GLSL reserved words, every GLSL builtin function, and every
    /// native builtin name of `ffi`.
    pub fn new(ffi: &FfiTable) -> Self {
        let used = RESERVED
            .iter()
            .chain(BUILTIN_FUNCTIONS)
            .chain(ffi.native_names())
            .map(|&name| name.to_owned())
            .collect();
        Self {
            used,
            temporaries: 0,
        }
    }

    /// A namer for struct fields, which only need to avoid reserved words.
    pub fn for_fields() -> Self {
        Self {
            used: RESERVED.iter().map(|&name| name.to_owned()).collect(),
            temporaries: 0,
        }
    }

    /// Returns a fresh identifier based on `label`.
    pub fn call(&mut self, label: &str) -> String {
        let base = sanitize(label);
        let mut name = base.clone();
        let mut suffix = 1u32;
        while self.used.contains(&name) {
            name = format!("{base}_{suffix}");
            suffix += 1;
        }
        self.used.insert(name.clone());
        name
    }

    /// Returns the next synthesized temporary.
    pub fn temporary(&mut self) -> String {
        let name = Temp(self.temporaries).to_string();
        self.temporaries += 1;
        name
    }
}

/// Turns an arbitrary source name into something usable as a GLSL identifier.
fn sanitize(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for c in label.chars() {
        let c = if c.is_ascii_alphanumeric() { c } else { '_' };
        if c == '_' && (out.is_empty() || out.ends_with('_')) {
            continue;
        }
        out.push(c);
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("unnamed");
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) || out.starts_with("gl_") {
        out.insert(0, 'v');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::GLSL;

    #[test]
    fn sanitizes() {
        assert_eq!(sanitize("xyz.t0.x"), "xyz_t0_x");
        assert_eq!(sanitize("__private"), "private");
        assert_eq!(sanitize("a__b_"), "a_b");
        assert_eq!(sanitize("3d"), "v3d");
        assert_eq!(sanitize("gl_Thing"), "vgl_Thing");
        assert_eq!(sanitize("λ"), "unnamed");
    }

    #[test]
    fn avoids_reserved_and_builtin_names() {
        let mut namer = Namer::new(&GLSL);
        assert_eq!(namer.call("input"), "input_1");
        assert_eq!(namer.call("texture2D"), "texture2D_1");
        assert_eq!(namer.call("radians"), "radians_1");
        assert_eq!(namer.call("packUnorm2x16"), "packUnorm2x16_1");
        assert_eq!(namer.call("color"), "color");
        assert_eq!(namer.call("color"), "color_1");
        assert_eq!(namer.call("color_1"), "color_1_1");
    }

    #[test]
    fn temporaries_are_numbered() {
        let mut namer = Namer::new(&GLSL);
        assert_eq!(namer.temporary(), "_t0");
        assert_eq!(namer.temporary(), "_t1");
    }
}
