use core::fmt::Write;

use shadeport_ir::Literal;

use crate::config::WriterFlags;
use crate::conv::ToGlsl;
use crate::gast::{
    Declaration, DeclarationKind, DialectShader, Expr, InterfaceVar, MainBody, Sink,
    Stmt, Storage,
};
use crate::util::Level;
use crate::{Config, DialectVersion, Error};

// -------------------------------------------------------------------------------------------------

/// Shorthand result used internally by the backend
type BackendResult = Result<(), Error>;

/// Renders [`DialectShader`]s as GLSL source text.
///
/// Writes GLSL code to a [`Write`] implementation of type `W`. Rendering is a pure function of
/// the shader and the [`Config`]; all version decisions were made during lowering.
#[derive(Debug)]
pub struct Writer<W> {
    out: W,
    config: Config,
}

impl<W: Write> Writer<W> {
    /// Creates a new [`Writer`] for writing code to `out`.
    #[must_use]
    pub fn new(out: W, config: Config) -> Self {
        Writer { out, config }
    }

    /// Writes `shader` as GLSL.
    ///
    /// # Errors
    ///
    /// Returns an error if the contained [`Write`] implementation returns an error.
    pub fn write(&mut self, shader: &DialectShader) -> BackendResult {
        let mut header = false;
        if self.config.has(WriterFlags::VERSION_DIRECTIVE) {
            writeln!(self.out, "{}", shader.version.directive())?;
            header = true;
        }
        if self.config.has(WriterFlags::SOURCE_COMMENTS) {
            writeln!(
                self.out,
                "// {} shader `{}` for {}",
                shader.stage, shader.name, shader.version
            )?;
            header = true;
        }
        if let DialectVersion::Embedded(_) = shader.version {
            writeln!(
                self.out,
                "precision {} float;",
                self.config.default_precision.to_glsl()
            )?;
            header = true;
        }

        for uniform in &shader.uniforms {
            writeln!(self.out, "uniform {} {};", uniform.ty, uniform.name)?;
            header = true;
        }
        for var in shader.inputs.iter().chain(&shader.outputs) {
            self.write_interface_var(var)?;
            header = true;
        }
        if header {
            writeln!(self.out)?;
        }

        for decl in &shader.declarations {
            self.write_declaration(decl)?;
            writeln!(self.out)?;
        }

        self.write_main(&shader.main)
    }

    /// Returns the output the shaders were written to.
    #[must_use]
    pub fn finish(self) -> W {
        self.out
    }

    fn write_interface_var(&mut self, var: &InterfaceVar) -> BackendResult {
        match var.storage {
            Storage::Attribute => write!(self.out, "attribute ")?,
            Storage::Varying => write!(self.out, "varying ")?,
            Storage::In { flat } => {
                if flat {
                    write!(self.out, "flat ")?;
                }
                write!(self.out, "in ")?;
            }
            Storage::Out { flat, location } => {
                if let Some(location) = location {
                    write!(self.out, "layout(location = {location}) ")?;
                }
                if flat {
                    write!(self.out, "flat ")?;
                }
                write!(self.out, "out ")?;
            }
        }
        writeln!(self.out, "{} {};", var.ty, var.name)?;
        Ok(())
    }

    /// # Notes
    /// Ends in a newline
    fn write_declaration(&mut self, decl: &Declaration) -> BackendResult {
        if self.config.has(WriterFlags::SOURCE_COMMENTS) {
            writeln!(self.out, "// {}", decl.origin)?;
        }
        match &decl.kind {
            DeclarationKind::Struct { fields } => {
                writeln!(self.out, "struct {} {{", decl.name)?;
                for field in fields {
                    writeln!(self.out, "{}{} {};", Level(1), field.ty, field.name)?;
                }
                writeln!(self.out, "}};")?;
            }
            DeclarationKind::Function {
                params,
                result,
                body,
            } => {
                write!(self.out, "{result} {}(", decl.name)?;
                for (index, param) in params.iter().enumerate() {
                    if index > 0 {
                        write!(self.out, ", ")?;
                    }
                    write!(self.out, "{} {}", param.ty, param.name)?;
                }
                writeln!(self.out, ") {{")?;
                self.write_block(body, Level(1))?;
                writeln!(self.out, "}}")?;
            }
            DeclarationKind::Constant { ty, value } => {
                write!(self.out, "const {ty} {} = ", decl.name)?;
                self.write_expr(value)?;
                writeln!(self.out, ";")?;
            }
        }
        Ok(())
    }

    fn write_main(&mut self, main: &MainBody) -> BackendResult {
        writeln!(self.out, "void main() {{")?;
        let level = Level(1);
        self.write_block(main.statements(), level)?;
        for discard in main.discards() {
            write!(self.out, "{level}if (")?;
            self.write_expr(&discard.condition)?;
            writeln!(self.out, ") {{")?;
            writeln!(self.out, "{}discard;", level.next())?;
            writeln!(self.out, "{level}}}")?;
        }
        for output in main.outputs() {
            write!(self.out, "{level}")?;
            match output.sink {
                Sink::Variable(ref name) => write!(self.out, "{name}")?,
                Sink::Position => write!(self.out, "gl_Position")?,
                Sink::FragColor => write!(self.out, "gl_FragColor")?,
                Sink::FragData(index) => write!(self.out, "gl_FragData[{index}]")?,
                Sink::FragDepth => write!(self.out, "gl_FragDepth")?,
            }
            write!(self.out, " = ")?;
            self.write_expr(&output.value)?;
            writeln!(self.out, ";")?;
        }
        writeln!(self.out, "}}")?;
        Ok(())
    }

    fn write_block(&mut self, stmts: &[Stmt], level: Level) -> BackendResult {
        for stmt in stmts {
            self.write_stmt(stmt, level)?;
        }
        Ok(())
    }

    /// # Notes
    /// Ends in a newline
    fn write_stmt(&mut self, stmt: &Stmt, level: Level) -> BackendResult {
        match stmt {
            Stmt::Local { name, ty, init } => {
                write!(self.out, "{level}{ty} {name}")?;
                if let Some(init) = init {
                    write!(self.out, " = ")?;
                    self.write_expr(init)?;
                }
                writeln!(self.out, ";")?;
            }
            Stmt::Assign { target, value } => {
                write!(self.out, "{level}{target} = ")?;
                self.write_expr(value)?;
                writeln!(self.out, ";")?;
            }
            Stmt::If {
                condition,
                accept,
                reject,
            } => {
                write!(self.out, "{level}if (")?;
                self.write_expr(condition)?;
                writeln!(self.out, ") {{")?;
                self.write_block(accept, level.next())?;
                if !reject.is_empty() {
                    writeln!(self.out, "{level}}} else {{")?;
                    self.write_block(reject, level.next())?;
                }
                writeln!(self.out, "{level}}}")?;
            }
            Stmt::Block(body) => {
                writeln!(self.out, "{level}{{")?;
                self.write_block(body, level.next())?;
                writeln!(self.out, "{level}}}")?;
            }
            Stmt::Return(value) => {
                write!(self.out, "{level}return ")?;
                self.write_expr(value)?;
                writeln!(self.out, ";")?;
            }
        }
        Ok(())
    }

    /// Operators are always parenthesized, so precedence never needs to be considered.
    fn write_expr(&mut self, expr: &Expr) -> BackendResult {
        match expr {
            Expr::Literal(literal) => self.write_literal(*literal)?,
            Expr::Var(name) => write!(self.out, "{name}")?,
            Expr::Builtin(name) => write!(self.out, "{name}")?,
            Expr::Call { callee, args } => {
                write!(self.out, "{}(", callee.name())?;
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        write!(self.out, ", ")?;
                    }
                    self.write_expr(arg)?;
                }
                write!(self.out, ")")?;
            }
            Expr::Binary { op, left, right } => {
                write!(self.out, "(")?;
                self.write_expr(left)?;
                write!(self.out, " {} ", op.to_glsl())?;
                self.write_expr(right)?;
                write!(self.out, ")")?;
            }
            Expr::Unary { op, operand } => {
                write!(self.out, "({}", op.to_glsl())?;
                self.write_expr(operand)?;
                write!(self.out, ")")?;
            }
            Expr::Field { base, field } => {
                self.write_expr(base)?;
                write!(self.out, ".{field}")?;
            }
            Expr::Swizzle { base, components } => {
                self.write_expr(base)?;
                write!(self.out, ".")?;
                for component in components {
                    self.out.write_char(component.letter())?;
                }
            }
            Expr::Index { base, index } => {
                self.write_expr(base)?;
                write!(self.out, "[{index}]")?;
            }
        }
        Ok(())
    }

    fn write_literal(&mut self, literal: Literal) -> BackendResult {
        match literal {
            Literal::Bool(value) => write!(self.out, "{value}")?,
            // The magnitude of `i32::MIN` is not a valid `int` literal.
            Literal::Int(i32::MIN) => write!(self.out, "({} - 1)", i32::MIN + 1)?,
            Literal::Int(value) => write!(self.out, "{value}")?,
            Literal::Uint(value) => write!(self.out, "{value}u")?,
            // `Debug` always includes a decimal point or exponent.
            Literal::Float(value) => write!(self.out, "{value:?}")?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(literal: Literal) -> String {
        let mut writer = Writer::new(String::new(), Config::new());
        writer.write_literal(literal).unwrap();
        writer.out
    }

    #[test]
    fn integer_literals() {
        assert_eq!(literal(Literal::Int(7)), "7");
        assert_eq!(literal(Literal::Int(-7)), "-7");
        assert_eq!(literal(Literal::Int(i32::MAX)), "2147483647");
        assert_eq!(literal(Literal::Int(i32::MIN)), "(-2147483647 - 1)");
        assert_eq!(literal(Literal::Uint(u32::MAX)), "4294967295u");
    }
}
