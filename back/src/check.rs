/*!
Deciding which dialect versions a shader can be generated for.

Every construct a version might not support is collected with the set of versions it is legal
in. Each set is computed by asking about every version separately, so support does not have to
grow with the version number: a construct legal in 1.10, 1.20 and 3.30 but not in 1.30 is
reported exactly.

The same rules can be checked against a lowered [`DialectShader`], which is how the checker and
the lowering engine are kept in agreement.
*/

use shadeport_ir::{
    self as ir, Closure, DeclRef, ExprKind, LeafType, Literal, OutputTarget, Program, ShaderDecl,
    ShaderLocal, Span, Stage, TermKind,
};
use tracing::debug;

use crate::ffi::{FfiTable, NativeForm};
use crate::gast::{self, Callee, DialectShader, Sink, Storage};
use crate::{
    DialectVersion, Error, EsVersion, EsVersions, Family, FullVersion, FullVersions,
    VersionsSupported, uniform,
};

/// Something in a shader that only some versions support.
#[derive(Clone, Debug, PartialEq)]
pub struct Construct {
    /// What the construct is, for messages: "input `color`".
    pub description: String,
    /// Where the construct appears.
    pub span: Span,
    /// Every version the construct is legal in.
    pub versions: VersionsSupported,
    /// Why some version rejects it. Empty if every version accepts it.
    pub reason: &'static str,
}

/// Why a shader cannot be generated for what was requested.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum VersionCheckError {
    /// A version which had to be generated does not allow a construct of the shader.
    #[error("shader `{shader}` cannot be generated for {version}: {construct}: {reason}")]
    Unsupported {
        /// Name of the shader.
        shader: String,
        /// The rejected version.
        version: DialectVersion,
        /// Description of the first construct it rejects.
        construct: String,
        /// Why the version rejects it.
        reason: &'static str,
    },

    /// A family was requested but none of its candidate versions is supported.
    #[error("shader `{shader}` supports no requested {family} version")]
    NoSupportedVersion {
        /// Name of the shader.
        shader: String,
        /// The family left empty.
        family: Family,
    },
}

/// Which versions of one family to generate.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FamilyRequest<S> {
    /// These versions, all of which must be supported.
    Exactly(S),
    /// Those of these versions which are supported, of which there must be at least one.
    AnyOf(S),
    /// Every supported version, of which there must be at least one.
    Maximal,
    /// None.
    Skip,
}

/// Which versions to generate, per family.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct VersionRequest {
    /// Request for desktop GLSL.
    pub full: FamilyRequest<FullVersions>,
    /// Request for GLSL ES.
    pub embedded: FamilyRequest<EsVersions>,
}

impl VersionRequest {
    /// Every supported version of both families.
    #[must_use]
    pub const fn maximal() -> Self {
        Self {
            full: FamilyRequest::Maximal,
            embedded: FamilyRequest::Maximal,
        }
    }

    /// Requests exactly the given versions, or every supported version of a family whose set
    /// is empty.
    #[must_use]
    pub fn exactly_or_maximal(full: FullVersions, embedded: EsVersions) -> Self {
        Self {
            full: if full.is_empty() {
                FamilyRequest::Maximal
            } else {
                FamilyRequest::Exactly(full)
            },
            embedded: if embedded.is_empty() {
                FamilyRequest::Maximal
            } else {
                FamilyRequest::Exactly(embedded)
            },
        }
    }
}

impl Default for VersionRequest {
    fn default() -> Self {
        Self::maximal()
    }
}

/// Computes version support for the shaders of one program.
#[derive(Clone, Copy, Debug)]
pub struct VersionChecker<'a> {
    program: &'a Program,
    ffi: &'a FfiTable,
}

impl<'a> VersionChecker<'a> {
    /// A checker for shaders of `program`, with externals resolved by `ffi`.
    #[must_use]
    pub const fn new(program: &'a Program, ffi: &'a FfiTable) -> Self {
        Self { program, ffi }
    }

    /// Every checked construct of `shader`, in source order: interface first, then types and
    /// externals in closure order, then records holding samplers which would have to be built
    /// as values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Ffi`] if an external of the closure is not registered in the FFI table.
    pub fn constructs(
        &self,
        shader: &ShaderDecl,
        closure: &Closure,
    ) -> Result<Vec<Construct>, Error> {
        let mut constructs = Vec::new();
        self.interface_constructs(shader, &mut constructs);

        let mut types = TypeUses::default();
        let mut opaque = Vec::new();
        for parameter in &shader.parameters {
            for leaf in uniform::expand(self.program, &parameter.name, parameter.ty) {
                types.leaf(leaf.ty, parameter.span);
            }
        }
        for expr in shader.expressions() {
            types.expr(expr);
            self.opaque_values(expr, &mut opaque);
        }
        for &decl in closure.order() {
            match decl {
                DeclRef::Record(id) => {
                    let record = self.program.record(id);
                    for field in &record.fields {
                        types.ty(field.ty, record.span);
                    }
                }
                DeclRef::Term(id) => {
                    let term = self.program.term(id);
                    match &term.kind {
                        TermKind::Function {
                            params,
                            result,
                            body,
                        } => {
                            for param in params {
                                types.ty(param.ty, term.span);
                            }
                            types.ty(*result, term.span);
                            types.expr(body);
                            self.opaque_values(body, &mut opaque);
                        }
                        TermKind::Value { ty, body } => {
                            types.ty(*ty, term.span);
                            types.expr(body);
                            self.opaque_values(body, &mut opaque);
                        }
                        TermKind::External(external) => {
                            if let ir::ExternalSignature::Function { params, .. } =
                                &external.signature
                            {
                                for &param in params {
                                    types.leaf(param, term.span);
                                }
                            }
                            types.leaf(external.signature.result(), term.span);

                            let versions = self.ffi.availability(
                                &external.symbol,
                                external.signature.kind(),
                                shader.stage,
                            )?;
                            constructs.push(Construct {
                                description: format!("external `{}`", external.symbol),
                                span: term.span,
                                versions,
                                reason: if versions == VersionsSupported::ALL {
                                    ""
                                } else {
                                    "the external is not available for this version and stage"
                                },
                            });
                        }
                    }
                }
            }
        }

        for (ty, span) in types.list {
            constructs.push(construct(format!("type {ty}"), span, |v| leaf_type(ty, v)));
        }
        constructs.extend(opaque);
        Ok(constructs)
    }

    /// Collects every place in `expr` where a record holding a sampler is needed as a whole
    /// value: record expressions, and parameters (or parameter fields) of such a record type.
    fn opaque_values(&self, expr: &ir::Expr, found: &mut Vec<Construct>) {
        let whole = match (&expr.kind, expr.ty) {
            (ExprKind::Record { .. }, ir::Type::Record(id)) => Some(id),
            (ExprKind::Parameter(_) | ExprKind::Field { .. }, ir::Type::Record(id))
                if is_parameter_path(expr) =>
            {
                Some(id)
            }
            _ => None,
        };
        if let Some(id) = whole {
            if uniform::is_opaque(self.program, id.into()) {
                found.push(never(
                    format!("construction of record `{}`", self.program.record(id).name),
                    expr.span,
                    "records holding samplers cannot be constructed",
                ));
            }
        }
        // Field accesses on a parameter read single uniforms, so only their result matters.
        if !is_parameter_path(expr) {
            expr.for_each_child(|child| self.opaque_values(child, found));
        }
    }

    fn interface_constructs(&self, shader: &ShaderDecl, constructs: &mut Vec<Construct>) {
        let stage = shader.stage;
        for input in &shader.inputs {
            let description = format!("input `{}`", input.name);
            constructs.push(match input.ty.as_leaf() {
                Some(ty) => construct(description, input.span, |v| {
                    interface_type(ty).or_else(|| integer_interface(ty, v))
                }),
                None => never(description, input.span, "inputs cannot be records"),
            });
        }

        let mut positions = 0;
        for output in &shader.outputs {
            let description = format!("output `{}`", output.name);
            let Some(ty) = output.ty.as_leaf() else {
                constructs.push(never(description, output.span, "outputs cannot be records"));
                continue;
            };
            constructs.push(match (stage, output.target) {
                (Stage::Vertex, OutputTarget::Varying) => construct(description, output.span, |v| {
                    interface_type(ty).or_else(|| integer_interface(ty, v))
                }),
                (Stage::Vertex, OutputTarget::Position) => {
                    positions += 1;
                    construct(description, output.span, |_| position(ty))
                }
                (Stage::Fragment, OutputTarget::Attachment(index)) => {
                    construct(description, output.span, |v| {
                        interface_type(ty).or_else(|| attachment(index, ty, v))
                    })
                }
                (Stage::Fragment, OutputTarget::Depth) => {
                    construct(description, output.span, |v| depth(ty, v))
                }
                (Stage::Vertex, _) => never(
                    description,
                    output.span,
                    "vertex shaders only output varyings and a position",
                ),
                (Stage::Fragment, _) => never(
                    description,
                    output.span,
                    "fragment shaders only output attachments and depth",
                ),
            });
        }
        if stage == Stage::Vertex && positions != 1 {
            constructs.push(never(
                "position output".to_owned(),
                shader.span,
                "vertex shaders need exactly one position output",
            ));
        }

        if stage == Stage::Vertex {
            for local in &shader.locals {
                if let ShaderLocal::Discard { span, .. } = local {
                    constructs.push(never(
                        "discard".to_owned(),
                        *span,
                        "vertex shaders cannot discard",
                    ));
                }
            }
        }
    }

    /// Every version in which every construct of `shader` is legal.
    ///
    /// # Errors
    ///
    /// As for [`Self::constructs()`].
    pub fn maximal(
        &self,
        shader: &ShaderDecl,
        closure: &Closure,
    ) -> Result<VersionsSupported, Error> {
        Ok(intersect(&self.constructs(shader, closure)?))
    }

    /// Resolves `request` against what `shader` supports.
    ///
    /// # Errors
    ///
    /// Returns [`VersionCheckError::Unsupported`] naming the first illegal construct of the
    /// first rejected version of an `Exactly` request, and
    /// [`VersionCheckError::NoSupportedVersion`] if an `AnyOf` or `Maximal` request for a
    /// family resolves to nothing. Errors of [`Self::constructs()`] are passed on.
    pub fn check(
        &self,
        shader: &ShaderDecl,
        closure: &Closure,
        request: &VersionRequest,
    ) -> Result<VersionsSupported, Error> {
        let constructs = self.constructs(shader, closure)?;
        let maximal = intersect(&constructs);

        let full = resolve(
            shader,
            &constructs,
            maximal,
            request.full.map(|set| VersionsSupported::new(set, EsVersions::empty())),
            Family::Full,
        )?;
        let embedded = resolve(
            shader,
            &constructs,
            maximal,
            request
                .embedded
                .map(|set| VersionsSupported::new(FullVersions::empty(), set)),
            Family::Embedded,
        )?;
        let supported = full.union(embedded);
        debug!(shader = %shader.name, %maximal, %supported, "checked shader");
        Ok(supported)
    }

    /// Checks a lowered shader against the rules of its own version.
    ///
    /// # Errors
    ///
    /// Returns [`VersionCheckError::Unsupported`] for the first construct of `shader` which
    /// its version does not allow.
    pub fn check_lowered(&self, shader: &DialectShader) -> Result<(), VersionCheckError> {
        let version = shader.version;
        let fail = |construct: String, reason: &'static str| VersionCheckError::Unsupported {
            shader: shader.name.clone(),
            version,
            construct,
            reason,
        };
        let legacy = version.is_legacy();

        for (var, is_input) in shader
            .inputs
            .iter()
            .map(|var| (var, true))
            .chain(shader.outputs.iter().map(|var| (var, false)))
        {
            let description = || {
                format!(
                    "{} `{}`",
                    if is_input { "input" } else { "output" },
                    var.name
                )
            };
            let interpolated = match shader.stage {
                Stage::Vertex => !is_input,
                Stage::Fragment => is_input,
            };
            let reason = interface_type(var.ty)
                .or_else(|| leaf_type(var.ty, version))
                .or_else(|| match var.storage {
                    Storage::Attribute | Storage::Varying if !legacy => {
                        Some("`attribute` and `varying` were removed in GLSL ES 3.00 and GLSL 1.30")
                    }
                    Storage::Attribute | Storage::Varying => integer_interface(var.ty, version),
                    Storage::In { .. } | Storage::Out { .. } if legacy => {
                        Some("`in` and `out` variables need GLSL ES 3.00 or GLSL 1.30")
                    }
                    Storage::Out {
                        location: Some(_), ..
                    } if !has_explicit_locations(version) => {
                        Some("output locations need GLSL ES 3.00 or GLSL 3.30")
                    }
                    Storage::In { flat } | Storage::Out { flat, .. }
                        if interpolated && var.ty.is_integer() && !flat =>
                    {
                        Some("integer varyings must be flat")
                    }
                    _ => None,
                });
            if let Some(reason) = reason {
                return Err(fail(description(), reason));
            }
        }

        for uniform in &shader.uniforms {
            if let Some(reason) = leaf_type(uniform.ty, version) {
                return Err(fail(format!("uniform `{}`", uniform.wire_name), reason));
            }
        }

        for output in shader.main.outputs() {
            let reason = match output.sink {
                Sink::Variable(_) => None,
                Sink::Position => position(output.ty),
                Sink::FragColor => {
                    legacy_sink(version).or_else(|| attachment(0, output.ty, version))
                }
                Sink::FragData(index) => {
                    legacy_sink(version).or_else(|| attachment(index, output.ty, version))
                }
                Sink::FragDepth => depth(output.ty, version),
            };
            if let Some(reason) = reason {
                return Err(fail(format!("write to {:?}", output.sink), reason));
            }
        }

        let mut failure = None;
        shader.for_each_type(|ty| {
            if let gast::Type::Leaf(leaf) = *ty {
                if failure.is_none() {
                    failure = leaf_type(leaf, version).map(|reason| (format!("type {leaf}"), reason));
                }
            }
        });
        shader.for_each_expr(|expr| {
            if failure.is_some() {
                return;
            }
            let form = match *expr {
                gast::Expr::Literal(Literal::Uint(_)) => {
                    failure = leaf_type(LeafType::UINT, version)
                        .map(|reason| ("unsigned literal".to_owned(), reason));
                    return;
                }
                gast::Expr::Call {
                    callee: Callee::Native(name),
                    ..
                } => NativeForm::Call(name),
                gast::Expr::Builtin(name) => NativeForm::Variable(name),
                gast::Expr::Binary { op, .. } => NativeForm::Binary(op),
                gast::Expr::Unary { op, .. } => NativeForm::Unary(op),
                _ => return,
            };
            if !self.ffi.native_availability(form, shader.stage).contains(version) {
                failure = Some((
                    format!("{form:?}"),
                    "the builtin is not available for this version and stage",
                ));
            }
        });
        match failure {
            Some((construct, reason)) => Err(fail(construct, reason)),
            None => Ok(()),
        }
    }
}

impl<S> FamilyRequest<S> {
    fn map<T>(self, f: impl FnOnce(S) -> T) -> FamilyRequest<T> {
        match self {
            Self::Exactly(set) => FamilyRequest::Exactly(f(set)),
            Self::AnyOf(set) => FamilyRequest::AnyOf(f(set)),
            Self::Maximal => FamilyRequest::Maximal,
            Self::Skip => FamilyRequest::Skip,
        }
    }
}

fn resolve(
    shader: &ShaderDecl,
    constructs: &[Construct],
    maximal: VersionsSupported,
    request: FamilyRequest<VersionsSupported>,
    family: Family,
) -> Result<VersionsSupported, VersionCheckError> {
    let nonempty = |set: VersionsSupported| {
        if set.is_empty() {
            Err(VersionCheckError::NoSupportedVersion {
                shader: shader.name.clone(),
                family,
            })
        } else {
            Ok(set)
        }
    };
    match request {
        FamilyRequest::Exactly(set) => {
            for version in set.versions() {
                if let Some(construct) = constructs.iter().find(|c| !c.versions.contains(version)) {
                    return Err(VersionCheckError::Unsupported {
                        shader: shader.name.clone(),
                        version,
                        construct: construct.description.clone(),
                        reason: construct.reason,
                    });
                }
            }
            Ok(set)
        }
        FamilyRequest::AnyOf(set) => nonempty(set.intersection(maximal)),
        FamilyRequest::Maximal => nonempty(maximal.intersection(family_versions(family))),
        FamilyRequest::Skip => Ok(VersionsSupported::NONE),
    }
}

fn family_versions(family: Family) -> VersionsSupported {
    match family {
        Family::Full => VersionsSupported::new(FullVersions::all(), EsVersions::empty()),
        Family::Embedded => VersionsSupported::new(FullVersions::empty(), EsVersions::all()),
    }
}

fn intersect(constructs: &[Construct]) -> VersionsSupported {
    constructs
        .iter()
        .fold(VersionsSupported::ALL, |acc, c| acc.intersection(c.versions))
}

/// Builds a construct by asking `rule` about every version; `rule` returns why a version
/// rejects it.
fn construct(
    description: String,
    span: Span,
    rule: impl Fn(DialectVersion) -> Option<&'static str>,
) -> Construct {
    let mut reason = "";
    let versions = VersionsSupported::from_predicate(|version| match rule(version) {
        Some(why) => {
            if reason.is_empty() {
                reason = why;
            }
            false
        }
        None => true,
    });
    Construct {
        description,
        span,
        versions,
        reason,
    }
}

fn never(description: String, span: Span, reason: &'static str) -> Construct {
    Construct {
        description,
        span,
        versions: VersionsSupported::NONE,
        reason,
    }
}

/// Leaf types used anywhere, without duplicates, in first-use order.
#[derive(Default)]
struct TypeUses {
    list: Vec<(LeafType, Span)>,
}

impl TypeUses {
    fn leaf(&mut self, ty: LeafType, span: Span) {
        if !self.list.iter().any(|&(seen, _)| seen == ty) {
            self.list.push((ty, span));
        }
    }

    fn ty(&mut self, ty: ir::Type, span: Span) {
        if let ir::Type::Leaf(leaf) = ty {
            self.leaf(leaf, span);
        }
    }

    fn expr(&mut self, expr: &ir::Expr) {
        expr.walk(&mut |e| {
            self.ty(e.ty, e.span);
            if let ExprKind::Let { binding, .. } = &e.kind {
                self.ty(binding.ty, e.span);
            }
        });
    }
}

/// Whether `expr` is a shader parameter or a chain of field accesses on one.
fn is_parameter_path(expr: &ir::Expr) -> bool {
    match &expr.kind {
        ExprKind::Parameter(_) => true,
        ExprKind::Field { base, .. } => is_parameter_path(base),
        _ => false,
    }
}

// Rules shared by both modes. Each returns why `version` rejects the construct.

fn since(es: EsVersion, full: FullVersion, version: DialectVersion) -> bool {
    match version {
        DialectVersion::Embedded(v) => v >= es,
        DialectVersion::Full(v) => v >= full,
    }
}

/// Whether `layout(location = n)` is available on outputs.
pub(crate) fn has_explicit_locations(version: DialectVersion) -> bool {
    since(EsVersion::V300, FullVersion::V330, version)
}

fn leaf_type(ty: LeafType, version: DialectVersion) -> Option<&'static str> {
    if ty.is_unsigned() && !since(EsVersion::V300, FullVersion::V130, version) {
        Some("unsigned integers need GLSL ES 3.00 or GLSL 1.30")
    } else if ty.is_non_square_matrix() && !since(EsVersion::V300, FullVersion::V120, version) {
        Some("non-square matrices need GLSL ES 3.00 or GLSL 1.20")
    } else {
        None
    }
}

fn interface_type(ty: LeafType) -> Option<&'static str> {
    match ty {
        _ if ty.is_boolean() => Some("inputs and outputs cannot be booleans"),
        LeafType::Sampler(_) => Some("inputs and outputs cannot be samplers"),
        _ => None,
    }
}

fn integer_interface(ty: LeafType, version: DialectVersion) -> Option<&'static str> {
    (ty.is_integer() && version.is_legacy())
        .then_some("integer inputs and varyings need GLSL ES 3.00 or GLSL 1.30")
}

fn attachment(index: u32, ty: LeafType, version: DialectVersion) -> Option<&'static str> {
    if index != 0 && version == DialectVersion::Embedded(EsVersion::V100) {
        Some("GLSL ES 1.00 only has color attachment 0")
    } else if version.is_legacy() && ty != LeafType::VEC4 {
        Some("color outputs must be vec4 before GLSL ES 3.00 and GLSL 1.30")
    } else {
        None
    }
}

fn depth(ty: LeafType, version: DialectVersion) -> Option<&'static str> {
    if ty != LeafType::FLOAT {
        Some("depth outputs must be float")
    } else if version == DialectVersion::Embedded(EsVersion::V100) {
        Some("GLSL ES 1.00 has no depth output")
    } else {
        None
    }
}

fn position(ty: LeafType) -> Option<&'static str> {
    (ty != LeafType::VEC4).then_some("the position output must be vec4")
}

fn legacy_sink(version: DialectVersion) -> Option<&'static str> {
    (!version.is_legacy())
        .then_some("`gl_FragColor` and `gl_FragData` were removed in GLSL ES 3.00 and GLSL 1.30")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::GLSL;
    use shadeport_ir::{Expr, Field};

    fn fragment_with_output(ty: LeafType, target: OutputTarget) -> (Program, ShaderDecl) {
        let program = Program::new();
        let mut shader = ShaderDecl::new("frag", Stage::Fragment);
        let out = shader.add_output("color", ty, target);
        let value = match ty {
            LeafType::FLOAT => Expr::float(1.0),
            _ => Expr::input(0, ty),
        };
        if ty != LeafType::FLOAT {
            shader.add_input("color_in", ty);
        }
        shader.assign(out, value);
        (program, shader)
    }

    fn maximal(program: &Program, shader: &ShaderDecl) -> VersionsSupported {
        let closure = Closure::for_shader(program, shader).unwrap();
        VersionChecker::new(program, &GLSL)
            .maximal(shader, &closure)
            .unwrap()
    }

    #[test]
    fn depth_output_is_not_in_es100() {
        let (program, shader) = fragment_with_output(LeafType::FLOAT, OutputTarget::Depth);
        let supported = maximal(&program, &shader);
        assert!(!supported.contains(EsVersion::V100.into()));
        assert!(supported.contains(EsVersion::V300.into()));
        assert!(supported.contains(FullVersion::V110.into()));
    }

    #[test]
    fn second_attachment_is_not_in_es100() {
        let (program, shader) = fragment_with_output(LeafType::VEC4, OutputTarget::Attachment(1));
        let supported = maximal(&program, &shader);
        assert!(!supported.contains(EsVersion::V100.into()));
        assert!(supported.contains(FullVersion::V110.into()));
    }

    #[test]
    fn record_fields_contribute_types() {
        let mut program = Program::new();
        let record = program.add_record(
            "Pair",
            vec![Field::new("a", LeafType::UINT), Field::new("b", LeafType::FLOAT)],
        );
        let mut shader = ShaderDecl::new("frag", Stage::Fragment);
        let out = shader.add_output("color", LeafType::VEC4, OutputTarget::Attachment(0));
        shader.add_parameter("pair", record);
        shader.assign(out, Expr::input(0, LeafType::VEC4));
        shader.add_input("color_in", LeafType::VEC4);

        let supported = maximal(&program, &shader);
        assert!(supported.contains(EsVersion::V300.into()));
        assert!(!supported.contains(FullVersion::V120.into()));
        assert!(supported.contains(FullVersion::V130.into()));
    }

    #[test]
    fn exactly_or_maximal_maps_empty_to_maximal() {
        let request =
            VersionRequest::exactly_or_maximal(FullVersions::empty(), EsVersion::V300.set());
        assert_eq!(request.full, FamilyRequest::Maximal);
        assert_eq!(request.embedded, FamilyRequest::Exactly(EsVersion::V300.set()));
    }
}
