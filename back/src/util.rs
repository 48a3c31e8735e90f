use core::fmt;

/// Name of the synthesized temporary with index `n`.
///
/// Sanitized source names never start with an underscore, so these cannot collide with them.
pub(crate) struct Temp(pub u32);

impl fmt::Display for Temp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_t{}", self.0)
    }
}

/// Indentation level of a rendered statement.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Level(pub usize);

impl Level {
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.0 {
            f.write_str(INDENT)?;
        }
        Ok(())
    }
}

pub(crate) const INDENT: &str = "    ";
