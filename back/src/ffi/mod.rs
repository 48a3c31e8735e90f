/*!
Resolution of external (builtin) terms to native dialect constructs or emulation bodies.

An [`FfiTable`] says, for every external symbol a backend supports, which versions and stages
it is available in and how: natively, as an operator, call, or builtin variable of the dialect,
or emulated by a replacement declaration synthesized into the shader.
*/

use hashbrown::HashMap;
use shadeport_ir::{ExternalKind, ExternalSignature, LeafType, Stage};

use crate::gast::{BinaryOp, Expr, Stmt, UnaryOp};
use crate::{DialectVersion, VersionsSupported};

pub(crate) mod emulate;
mod glsl;

pub use glsl::GLSL;

bitflags::bitflags! {
    /// A set of pipeline stages.
    #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
    pub struct Stages: u8 {
        /// The vertex stage.
        const VERTEX = 0x1;
        /// The fragment stage.
        const FRAGMENT = 0x2;
    }
}

impl Stages {
    /// The set holding only `stage`.
    #[must_use]
    pub const fn of(stage: Stage) -> Self {
        match stage {
            Stage::Vertex => Self::VERTEX,
            Stage::Fragment => Self::FRAGMENT,
        }
    }
}

const fn stage_index(stage: Stage) -> usize {
    match stage {
        Stage::Vertex => 0,
        Stage::Fragment => 1,
    }
}

/// How a natively supported external is spelled in the dialect.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NativeForm {
    /// A builtin function or constructor call.
    Call(&'static str),
    /// A binary operator applied to the two arguments.
    Binary(BinaryOp),
    /// A unary operator applied to the argument.
    Unary(UnaryOp),
    /// A builtin variable. Only valid for external values.
    Variable(&'static str),
}

/// A replacement body produced for the concrete signature of an external.
#[derive(Clone, Debug, PartialEq)]
pub enum EmulatedBody {
    /// A function declared in place of a builtin function.
    Function {
        /// Parameter names and types; `body` refers to the parameters by these names.
        params: Vec<(&'static str, LeafType)>,
        /// Return type.
        result: LeafType,
        /// Ends with a return.
        body: Vec<Stmt>,
    },
    /// A global constant declared in place of a builtin value.
    Constant {
        /// Type of the constant.
        ty: LeafType,
        /// Its initializer, a constant expression.
        value: Expr,
    },
}

/// Builds the replacement for an external that is not native to a version.
///
/// The builder receives the signature of the term being emulated, so one emulation serves
/// every overload of a symbol.
#[derive(Clone, Copy)]
pub struct Emulation {
    name: &'static str,
    build: fn(&ExternalSignature) -> EmulatedBody,
}

impl Emulation {
    /// An emulation described as `name`, built by `build`.
    #[must_use]
    pub const fn new(name: &'static str, build: fn(&ExternalSignature) -> EmulatedBody) -> Self {
        Self { name, build }
    }

    /// Short description of the emulation, for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The replacement for an external of type `signature`.
    #[must_use]
    pub fn build(&self, signature: &ExternalSignature) -> EmulatedBody {
        (self.build)(signature)
    }
}

impl core::fmt::Debug for Emulation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Emulation").field(&self.name).finish()
    }
}

/// The outcome of resolving an external for one version and stage.
#[derive(Clone, Copy, Debug)]
pub enum Decision {
    /// Use the dialect's own construct.
    Native(NativeForm),
    /// Declare a replacement in the shader and use that.
    Emulated(Emulation),
}

/// One clause of an [`ExternalDef`].
#[derive(Clone, Debug)]
pub struct Rule {
    /// Versions the rule applies to.
    pub versions: VersionsSupported,
    /// Stages the rule applies to.
    pub stages: Stages,
    /// How to lower the external where the rule applies.
    pub decision: Decision,
}

impl Rule {
    /// A native rule covering both stages.
    #[must_use]
    pub const fn native(versions: VersionsSupported, form: NativeForm) -> Self {
        Self {
            versions,
            stages: Stages::all(),
            decision: Decision::Native(form),
        }
    }

    /// An emulated rule covering both stages.
    #[must_use]
    pub const fn emulated(versions: VersionsSupported, emulation: Emulation) -> Self {
        Self {
            versions,
            stages: Stages::all(),
            decision: Decision::Emulated(emulation),
        }
    }

    /// Restricts the rule to the given stages.
    #[must_use]
    pub const fn only(mut self, stages: Stages) -> Self {
        self.stages = stages;
        self
    }

    fn covers(&self, version: DialectVersion, stage: Stage) -> bool {
        self.stages.contains(Stages::of(stage)) && self.versions.contains(version)
    }
}

/// Everything a backend knows about one external symbol. The first matching rule wins.
#[derive(Clone, Debug, Default)]
pub struct ExternalDef {
    /// In priority order.
    pub rules: Vec<Rule>,
}

/// Why an external cannot be lowered.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum FfiError {
    /// The backend has no definition for the external at all.
    #[error("external {kind} `{symbol}` is not supported by this backend")]
    UnknownExternal {
        /// The registered name looked up.
        symbol: String,
        /// Whether a function or a value was looked up.
        kind: ExternalKind,
    },

    /// The external is defined, but not for this version and stage.
    #[error("external `{symbol}` is not available in {stage} shaders for {version}")]
    Unavailable {
        /// The registered name looked up.
        symbol: String,
        /// The version being generated.
        version: DialectVersion,
        /// The stage of the shader using the external.
        stage: Stage,
    },
}

/// Table of external definitions for one backend.
///
/// Lookups are pure; a table can be shared freely between threads.
#[derive(Clone, Debug, Default)]
pub struct FfiTable {
    functions: HashMap<String, ExternalDef>,
    values: HashMap<String, ExternalDef>,
    /// Availability of each native form, indexed by stage.
    natives: HashMap<NativeForm, [VersionsSupported; 2]>,
    native_names: Vec<&'static str>,
}

impl FfiTable {
    /// Starts building a table from nothing.
    #[must_use]
    pub fn builder() -> FfiTableBuilder {
        FfiTableBuilder::default()
    }

    fn definitions(&self, kind: ExternalKind) -> &HashMap<String, ExternalDef> {
        match kind {
            ExternalKind::Function => &self.functions,
            ExternalKind::Value => &self.values,
        }
    }

    /// The definition of `symbol`, if there is one.
    #[must_use]
    pub fn get(&self, symbol: &str, kind: ExternalKind) -> Option<&ExternalDef> {
        self.definitions(kind).get(symbol)
    }

    fn require(&self, symbol: &str, kind: ExternalKind) -> Result<&ExternalDef, FfiError> {
        self.get(symbol, kind)
            .ok_or_else(|| FfiError::UnknownExternal {
                symbol: symbol.to_owned(),
                kind,
            })
    }

    /// Decides how to lower `symbol` for `version` and `stage`.
    ///
    /// # Errors
    ///
    /// Returns [`FfiError::UnknownExternal`] if nothing is registered for `symbol` and `kind`,
    /// and [`FfiError::Unavailable`] if no rule covers `version` and `stage`.
    pub fn resolve(
        &self,
        symbol: &str,
        kind: ExternalKind,
        version: DialectVersion,
        stage: Stage,
    ) -> Result<Decision, FfiError> {
        self.require(symbol, kind)?
            .rules
            .iter()
            .find(|rule| rule.covers(version, stage))
            .map(|rule| rule.decision)
            .ok_or_else(|| FfiError::Unavailable {
                symbol: symbol.to_owned(),
                version,
                stage,
            })
    }

    /// Every version in which `symbol` can be lowered for `stage`, natively or not.
    ///
    /// # Errors
    ///
    /// Returns [`FfiError::UnknownExternal`] if nothing is registered for `symbol` and `kind`.
    pub fn availability(
        &self,
        symbol: &str,
        kind: ExternalKind,
        stage: Stage,
    ) -> Result<VersionsSupported, FfiError> {
        Ok(self
            .require(symbol, kind)?
            .rules
            .iter()
            .filter(|rule| rule.stages.contains(Stages::of(stage)))
            .fold(VersionsSupported::NONE, |acc, rule| acc.union(rule.versions)))
    }

    /// Every version in which some rule lowers to `form` for `stage`.
    ///
    /// This is the set of versions where it is legal for generated code to contain `form`.
    #[must_use]
    pub fn native_availability(&self, form: NativeForm, stage: Stage) -> VersionsSupported {
        self.natives
            .get(&form)
            .map_or(VersionsSupported::NONE, |by_stage| {
                by_stage[stage_index(stage)]
            })
    }

    /// Every identifier used by a native call or variable, sorted.
    #[must_use]
    pub fn native_names(&self) -> &[&'static str] {
        &self.native_names
    }
}

/// Assembles an [`FfiTable`].
#[derive(Debug, Default)]
pub struct FfiTableBuilder {
    table: FfiTable,
}

impl FfiTableBuilder {
    /// Defines an external function, replacing any previous definition of `symbol`.
    ///
    /// # Panics
    ///
    /// Panics if a rule uses [`NativeForm::Variable`], which only values may use.
    pub fn function(
        &mut self,
        symbol: impl Into<String>,
        rules: impl IntoIterator<Item = Rule>,
    ) -> &mut Self {
        let rules: Vec<Rule> = rules.into_iter().collect();
        assert!(
            !rules.iter().any(|rule| matches!(
                rule.decision,
                Decision::Native(NativeForm::Variable(_))
            )),
            "external functions cannot be native variables"
        );
        self.table
            .functions
            .insert(symbol.into(), ExternalDef { rules });
        self
    }

    /// Defines an external value, replacing any previous definition of `symbol`.
    ///
    /// # Panics
    ///
    /// Panics if a native rule uses anything other than [`NativeForm::Variable`].
    pub fn value(
        &mut self,
        symbol: impl Into<String>,
        rules: impl IntoIterator<Item = Rule>,
    ) -> &mut Self {
        let rules: Vec<Rule> = rules.into_iter().collect();
        assert!(
            rules.iter().all(|rule| matches!(
                rule.decision,
                Decision::Native(NativeForm::Variable(_)) | Decision::Emulated(_)
            )),
            "external values must be native variables or emulated"
        );
        self.table.values.insert(symbol.into(), ExternalDef { rules });
        self
    }

    /// Finishes the table and builds its reverse index of native forms.
    #[must_use]
    pub fn build(self) -> FfiTable {
        let mut table = self.table;
        let mut natives: HashMap<NativeForm, [VersionsSupported; 2]> = HashMap::new();
        for def in table.functions.values().chain(table.values.values()) {
            for rule in &def.rules {
                let Decision::Native(form) = rule.decision else {
                    continue;
                };
                let entry = natives
                    .entry(form)
                    .or_insert([VersionsSupported::NONE; 2]);
                for stage in [Stage::Vertex, Stage::Fragment] {
                    if rule.stages.contains(Stages::of(stage)) {
                        let slot = &mut entry[stage_index(stage)];
                        *slot = slot.union(rule.versions);
                    }
                }
            }
        }

        let mut native_names: Vec<&'static str> = natives
            .keys()
            .filter_map(|form| match *form {
                NativeForm::Call(name) | NativeForm::Variable(name) => Some(name),
                NativeForm::Binary(_) | NativeForm::Unary(_) => None,
            })
            .collect();
        native_names.sort_unstable();
        native_names.dedup();

        table.natives = natives;
        table.native_names = native_names;
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EsVersion, EsVersions, FullVersion, FullVersions};

    fn table() -> FfiTable {
        let mut builder = FfiTable::builder();
        builder
            .function(
                "twice",
                [
                    Rule::native(
                        VersionsSupported::new(FullVersions::V460, EsVersions::empty()),
                        NativeForm::Call("twice"),
                    ),
                    Rule::emulated(VersionsSupported::ALL, emulate::ROUND),
                ],
            )
            .value(
                "coord",
                [Rule::native(VersionsSupported::ALL, NativeForm::Variable("gl_FragCoord"))
                    .only(Stages::FRAGMENT)],
            );
        builder.build()
    }

    #[test]
    fn first_matching_rule_wins() {
        let table = table();
        let at = |version| {
            table
                .resolve("twice", ExternalKind::Function, version, Stage::Vertex)
                .unwrap()
        };
        assert!(matches!(
            at(DialectVersion::Full(FullVersion::V460)),
            Decision::Native(NativeForm::Call("twice"))
        ));
        assert!(matches!(
            at(DialectVersion::Full(FullVersion::V450)),
            Decision::Emulated(_)
        ));
    }

    #[test]
    fn unknown_and_unavailable() {
        let table = table();
        let es300 = DialectVersion::Embedded(EsVersion::V300);
        assert_eq!(
            table
                .resolve("twice", ExternalKind::Value, es300, Stage::Vertex)
                .unwrap_err(),
            FfiError::UnknownExternal {
                symbol: "twice".into(),
                kind: ExternalKind::Value,
            }
        );
        assert_eq!(
            table
                .resolve("coord", ExternalKind::Value, es300, Stage::Vertex)
                .unwrap_err(),
            FfiError::Unavailable {
                symbol: "coord".into(),
                version: es300,
                stage: Stage::Vertex,
            }
        );
        assert_eq!(
            table
                .availability("coord", ExternalKind::Value, Stage::Vertex)
                .unwrap(),
            VersionsSupported::NONE
        );
    }

    #[test]
    fn reverse_index() {
        let table = table();
        assert_eq!(
            table.native_availability(NativeForm::Variable("gl_FragCoord"), Stage::Fragment),
            VersionsSupported::ALL
        );
        assert_eq!(
            table.native_availability(NativeForm::Variable("gl_FragCoord"), Stage::Vertex),
            VersionsSupported::NONE
        );
        assert_eq!(table.native_names(), &["gl_FragCoord", "twice"]);
    }
}
