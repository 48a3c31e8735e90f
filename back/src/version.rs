/*!
Target dialect versions and sets of them.

There are two families of GLSL: the embedded family (GLSL ES) and the full family (desktop
GLSL). Each is totally ordered by version number, but the two are never compared with each
other, so [`DialectVersion`] is only [`PartialOrd`].
*/

use core::cmp::Ordering;
use core::fmt;

/// Defines a version enum for one family together with its bit set type.
macro_rules! version_family {
    (
        $(#[$enum_meta:meta])*
        enum $Enum:ident;
        $(#[$set_meta:meta])*
        set $Set:ident: $Bits:ty;
        $( $Variant:ident = $number:literal, )*
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
        pub enum $Enum {
            $(
                #[doc = concat!("Version number ", stringify!($number), ".")]
                $Variant,
            )*
        }

        impl $Enum {
            /// Every version of the family, in ascending order.
            pub const ALL: &'static [Self] = &[$( Self::$Variant, )*];

            /// The version number as written in a `#version` directive.
            #[must_use]
            pub const fn number(self) -> u16 {
                match self {
                    $( Self::$Variant => $number, )*
                }
            }

            /// Looks up a version by its `#version` number.
            #[must_use]
            pub const fn from_number(number: u16) -> Option<Self> {
                match number {
                    $( $number => Some(Self::$Variant), )*
                    _ => None,
                }
            }

            /// The set containing only this version.
            #[must_use]
            pub const fn set(self) -> $Set {
                $Set::from_bits_retain(1 << self as u32)
            }
        }

        bitflags::bitflags! {
            $(#[$set_meta])*
            #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
            pub struct $Set: $Bits {
                $(
                    #[doc = concat!("Version number ", stringify!($number), ".")]
                    const $Variant = 1 << ($Enum::$Variant as u32);
                )*
            }
        }

        impl $Set {
            /// The versions for which `predicate` returns true.
            ///
            /// The predicate is evaluated once for every version of the family.
            #[must_use]
            pub fn from_predicate(mut predicate: impl FnMut($Enum) -> bool) -> Self {
                $Enum::ALL
                    .iter()
                    .copied()
                    .filter(|&version| predicate(version))
                    .collect()
            }

            /// Every version greater than or equal to `min`.
            #[must_use]
            pub fn at_least(min: $Enum) -> Self {
                Self::from_predicate(|version| version >= min)
            }

            /// Every version less than or equal to `max`.
            #[must_use]
            pub fn at_most(max: $Enum) -> Self {
                Self::from_predicate(|version| version <= max)
            }

            /// Whether `version` is in the set.
            #[must_use]
            pub fn contains_version(self, version: $Enum) -> bool {
                self.contains(version.set())
            }

            /// The versions in the set, in ascending order.
            pub fn versions(self) -> impl Iterator<Item = $Enum> {
                $Enum::ALL
                    .iter()
                    .copied()
                    .filter(move |version| self.contains(version.set()))
            }
        }

        impl FromIterator<$Enum> for $Set {
            fn from_iter<I: IntoIterator<Item = $Enum>>(iter: I) -> Self {
                iter.into_iter()
                    .fold(Self::empty(), |set, version| set | version.set())
            }
        }
    };
}

version_family! {
    /// A version of the embedded family, GLSL ES.
    enum EsVersion;
    /// A set of [`EsVersion`]s.
    set EsVersions: u8;
    V100 = 100,
    V300 = 300,
    V310 = 310,
    V320 = 320,
}

version_family! {
    /// A version of the full (desktop) family of GLSL.
    enum FullVersion;
    /// A set of [`FullVersion`]s.
    set FullVersions: u16;
    V110 = 110,
    V120 = 120,
    V130 = 130,
    V140 = 140,
    V150 = 150,
    V330 = 330,
    V400 = 400,
    V410 = 410,
    V420 = 420,
    V430 = 430,
    V440 = 440,
    V450 = 450,
    V460 = 460,
}

/// One of the two families of GLSL.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Family {
    /// GLSL ES.
    Embedded,
    /// Desktop GLSL.
    Full,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Family::Embedded => "GLSL ES",
            Family::Full => "GLSL",
        })
    }
}

/// A specific shading language version that code can be generated for.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DialectVersion {
    /// A version of GLSL ES.
    Embedded(EsVersion),
    /// A version of desktop GLSL.
    Full(FullVersion),
}

impl DialectVersion {
    /// The family the version belongs to.
    #[must_use]
    pub const fn family(self) -> Family {
        match self {
            Self::Embedded(_) => Family::Embedded,
            Self::Full(_) => Family::Full,
        }
    }

    /// The version number as written in a `#version` directive.
    #[must_use]
    pub const fn number(self) -> u16 {
        match self {
            Self::Embedded(v) => v.number(),
            Self::Full(v) => v.number(),
        }
    }

    /// Whether this is GLSL ES 1.00, or desktop GLSL 1.10 or 1.20: the versions
    /// which use `attribute`/`varying` and the `gl_FragColor` family of outputs.
    #[must_use]
    pub const fn is_legacy(self) -> bool {
        matches!(
            self,
            Self::Embedded(EsVersion::V100) | Self::Full(FullVersion::V110 | FullVersion::V120)
        )
    }

    /// The `#version` line for this version, without a trailing newline.
    #[must_use]
    pub fn directive(self) -> String {
        match self {
            Self::Embedded(EsVersion::V100) => "#version 100".to_owned(),
            Self::Embedded(v) => format!("#version {} es", v.number()),
            Self::Full(v) => format!("#version {}", v.number()),
        }
    }
}

impl PartialOrd for DialectVersion {
    /// Versions of different families are incomparable.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Embedded(a), Self::Embedded(b)) => Some(a.cmp(b)),
            (Self::Full(a), Self::Full(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for DialectVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.family(), self.number())
    }
}

impl From<EsVersion> for DialectVersion {
    fn from(value: EsVersion) -> Self {
        Self::Embedded(value)
    }
}

impl From<FullVersion> for DialectVersion {
    fn from(value: FullVersion) -> Self {
        Self::Full(value)
    }
}

// -------------------------------------------------------------------------------------------------

/// A pair of version sets, one per family: for example, all versions a shader is legal under.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct VersionsSupported {
    /// Desktop GLSL versions.
    pub full: FullVersions,
    /// GLSL ES versions.
    pub embedded: EsVersions,
}

impl VersionsSupported {
    /// Every known version of both families.
    pub const ALL: Self = Self {
        full: FullVersions::all(),
        embedded: EsVersions::all(),
    };

    /// No version at all.
    pub const NONE: Self = Self {
        full: FullVersions::empty(),
        embedded: EsVersions::empty(),
    };

    /// The pair of `full` and `embedded`.
    #[must_use]
    pub const fn new(full: FullVersions, embedded: EsVersions) -> Self {
        Self { full, embedded }
    }

    /// The versions of both families for which `predicate` returns true.
    ///
    /// The predicate is evaluated independently for every known version; no assumption is
    /// made that legality is monotonic in the version number.
    #[must_use]
    pub fn from_predicate(mut predicate: impl FnMut(DialectVersion) -> bool) -> Self {
        Self {
            full: FullVersions::from_predicate(|v| predicate(DialectVersion::Full(v))),
            embedded: EsVersions::from_predicate(|v| predicate(DialectVersion::Embedded(v))),
        }
    }

    /// Whether `version` is in the set.
    #[must_use]
    pub fn contains(self, version: DialectVersion) -> bool {
        match version {
            DialectVersion::Embedded(v) => self.embedded.contains_version(v),
            DialectVersion::Full(v) => self.full.contains_version(v),
        }
    }

    /// Adds `version` to the set.
    pub fn insert(&mut self, version: DialectVersion) {
        match version {
            DialectVersion::Embedded(v) => self.embedded.insert(v.set()),
            DialectVersion::Full(v) => self.full.insert(v.set()),
        }
    }

    /// The versions in both sets.
    #[must_use]
    pub fn intersection(self, other: Self) -> Self {
        Self {
            full: self.full & other.full,
            embedded: self.embedded & other.embedded,
        }
    }

    /// The versions in either set.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            full: self.full | other.full,
            embedded: self.embedded | other.embedded,
        }
    }

    /// Whether the set holds no version of either family.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.full.is_empty() && self.embedded.is_empty()
    }

    /// Number of versions in both families together.
    #[must_use]
    pub fn len(self) -> usize {
        (self.full.bits().count_ones() + self.embedded.bits().count_ones()) as usize
    }

    /// The versions in the set: the full family ascending, then the embedded family ascending.
    pub fn versions(self) -> impl Iterator<Item = DialectVersion> {
        self.full
            .versions()
            .map(DialectVersion::Full)
            .chain(self.embedded.versions().map(DialectVersion::Embedded))
    }
}

impl FromIterator<DialectVersion> for VersionsSupported {
    fn from_iter<I: IntoIterator<Item = DialectVersion>>(iter: I) -> Self {
        let mut set = Self::NONE;
        for version in iter {
            set.insert(version);
        }
        set
    }
}

impl fmt::Display for VersionsSupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("no versions");
        }
        for (index, version) in self.versions().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{version}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn families_are_incomparable() {
        let es = DialectVersion::Embedded(EsVersion::V300);
        let full = DialectVersion::Full(FullVersion::V110);
        assert_eq!(es.partial_cmp(&full), None);
        assert!(DialectVersion::Full(FullVersion::V130) > full);
    }

    #[test]
    fn ranges() {
        assert_eq!(
            FullVersions::at_most(FullVersion::V130),
            FullVersions::V110 | FullVersions::V120 | FullVersions::V130
        );
        assert_eq!(
            EsVersions::at_least(EsVersion::V310).versions().collect::<Vec<_>>(),
            vec![EsVersion::V310, EsVersion::V320]
        );
    }

    #[test]
    fn numbers_round_trip() {
        for &version in FullVersion::ALL {
            assert_eq!(FullVersion::from_number(version.number()), Some(version));
        }
        assert_eq!(EsVersion::from_number(200), None);
    }

    #[test]
    fn directives() {
        assert_eq!(DialectVersion::Embedded(EsVersion::V100).directive(), "#version 100");
        assert_eq!(
            DialectVersion::Embedded(EsVersion::V300).directive(),
            "#version 300 es"
        );
        assert_eq!(DialectVersion::Full(FullVersion::V330).directive(), "#version 330");
    }

    #[test]
    fn display_set() {
        let set = VersionsSupported::new(
            FullVersions::V110 | FullVersions::V460,
            EsVersions::V300,
        );
        assert_eq!(set.to_string(), "GLSL 110, GLSL 460, GLSL ES 300");
        assert_eq!(set.len(), 3);
        assert_eq!(VersionsSupported::NONE.to_string(), "no versions");
    }
}
