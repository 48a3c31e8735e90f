//! Replacement bodies for builtins missing from older dialect versions.
//!
//! Every body here may only use operators and builtins that are native in every version,
//! since emulations are emitted exactly where the real builtin is unavailable.

use shadeport_ir::{ExternalSignature, LeafType, Literal};

use super::{EmulatedBody, Emulation};
use crate::conv::constructor_name;
use crate::gast::{BinaryOp, Expr, Stmt, UnaryOp};

pub(crate) const REM: Emulation = Emulation::new("truncated remainder", rem);
pub(crate) const ROUND: Emulation = Emulation::new("round half up", round);
pub(crate) const TRUNC: Emulation = Emulation::new("truncate toward zero", trunc);
pub(crate) const SINH: Emulation = Emulation::new("exponential sinh", sinh);
pub(crate) const COSH: Emulation = Emulation::new("exponential cosh", cosh);
pub(crate) const TANH: Emulation = Emulation::new("exponential tanh", tanh);
pub(crate) const ISNAN: Emulation = Emulation::new("self-inequality", isnan);
pub(crate) const TRANSPOSE: Emulation = Emulation::new("component shuffle", transpose);
pub(crate) const DETERMINANT: Emulation = Emulation::new("Laplace expansion", determinant);
pub(crate) const INVERSE: Emulation = Emulation::new("adjugate over determinant", inverse);
pub(crate) const PI: Emulation = Emulation::new("pi constant", pi);

fn param_type(signature: &ExternalSignature, index: usize) -> LeafType {
    match signature {
        ExternalSignature::Function { params, result } => {
            params.get(index).copied().unwrap_or(*result)
        }
        ExternalSignature::Value(ty) => *ty,
    }
}

fn float(value: f32) -> Expr {
    Expr::Literal(Literal::Float(value))
}

/// A one-parameter function of `x` returning `body`.
fn unary(signature: &ExternalSignature, body: Vec<Stmt>) -> EmulatedBody {
    EmulatedBody::Function {
        params: vec![("x", param_type(signature, 0))],
        result: signature.result(),
        body,
    }
}

fn rem(signature: &ExternalSignature) -> EmulatedBody {
    let a = || Expr::var("a");
    let b = || Expr::var("b");
    EmulatedBody::Function {
        params: vec![("a", param_type(signature, 0)), ("b", param_type(signature, 1))],
        result: signature.result(),
        body: vec![Stmt::Return(Expr::binary(
            BinaryOp::Subtract,
            a(),
            Expr::binary(
                BinaryOp::Multiply,
                b(),
                Expr::binary(BinaryOp::Divide, a(), b()),
            ),
        ))],
    }
}

fn round(signature: &ExternalSignature) -> EmulatedBody {
    let body = Expr::native(
        "floor",
        vec![Expr::binary(BinaryOp::Add, Expr::var("x"), float(0.5))],
    );
    unary(signature, vec![Stmt::Return(body)])
}

fn trunc(signature: &ExternalSignature) -> EmulatedBody {
    let body = Expr::binary(
        BinaryOp::Multiply,
        Expr::native("sign", vec![Expr::var("x")]),
        Expr::native("floor", vec![Expr::native("abs", vec![Expr::var("x")])]),
    );
    unary(signature, vec![Stmt::Return(body)])
}

/// `(exp(x) ± exp(-x)) * 0.5`
fn exp_pair(op: BinaryOp) -> Expr {
    Expr::binary(
        BinaryOp::Multiply,
        Expr::binary(
            op,
            Expr::native("exp", vec![Expr::var("x")]),
            Expr::native("exp", vec![Expr::unary(UnaryOp::Negate, Expr::var("x"))]),
        ),
        float(0.5),
    )
}

fn sinh(signature: &ExternalSignature) -> EmulatedBody {
    unary(signature, vec![Stmt::Return(exp_pair(BinaryOp::Subtract))])
}

fn cosh(signature: &ExternalSignature) -> EmulatedBody {
    unary(signature, vec![Stmt::Return(exp_pair(BinaryOp::Add))])
}

/// `tanh` saturates to ±1 long before 10, and `exp(2x)` overflows past about 44.
const TANH_LIMIT: f32 = 10.0;

fn tanh(signature: &ExternalSignature) -> EmulatedBody {
    let e = || Expr::var("e");
    let clamped = Expr::native(
        "clamp",
        vec![Expr::var("x"), float(-TANH_LIMIT), float(TANH_LIMIT)],
    );
    unary(
        signature,
        vec![
            Stmt::Local {
                name: "e".into(),
                ty: param_type(signature, 0).into(),
                init: Some(Expr::native(
                    "exp",
                    vec![Expr::binary(BinaryOp::Multiply, float(2.0), clamped)],
                )),
            },
            Stmt::Return(Expr::binary(
                BinaryOp::Divide,
                Expr::binary(BinaryOp::Subtract, e(), float(1.0)),
                Expr::binary(BinaryOp::Add, e(), float(1.0)),
            )),
        ],
    )
}

fn isnan(signature: &ExternalSignature) -> EmulatedBody {
    let body = match param_type(signature, 0) {
        LeafType::Vector { .. } => Expr::native("notEqual", vec![Expr::var("x"), Expr::var("x")]),
        _ => Expr::binary(BinaryOp::NotEqual, Expr::var("x"), Expr::var("x")),
    };
    unary(signature, vec![Stmt::Return(body)])
}

/// Columns and rows of a matrix type; anything else is treated as a 1×1 matrix.
fn shape(ty: LeafType) -> (u32, u32) {
    match ty {
        LeafType::Matrix { columns, rows } => (columns as u32, rows as u32),
        _ => (1, 1),
    }
}

fn element(column: u32, row: u32) -> Expr {
    Expr::var("m").index(column).index(row)
}

/// Determinant of the submatrix of `m` made of `columns` and `rows`, by cofactor expansion
/// along the first column.
fn minor(columns: &[u32], rows: &[u32]) -> Expr {
    match (columns, rows) {
        ([], _) | (_, []) => float(1.0),
        ([column], [row, ..]) => element(*column, *row),
        ([first, rest @ ..], _) => {
            let mut sum = None;
            for (k, &row) in rows.iter().enumerate() {
                let remaining: Vec<u32> = rows.iter().copied().filter(|&r| r != row).collect();
                let term = Expr::binary(
                    BinaryOp::Multiply,
                    element(*first, row),
                    minor(rest, &remaining),
                );
                sum = Some(match sum {
                    None => term,
                    Some(acc) if k % 2 == 0 => Expr::binary(BinaryOp::Add, acc, term),
                    Some(acc) => Expr::binary(BinaryOp::Subtract, acc, term),
                });
            }
            sum.unwrap_or_else(|| float(1.0))
        }
    }
}

fn matrix_function(signature: &ExternalSignature, body: Vec<Stmt>) -> EmulatedBody {
    EmulatedBody::Function {
        params: vec![("m", param_type(signature, 0))],
        result: signature.result(),
        body,
    }
}

fn transpose(signature: &ExternalSignature) -> EmulatedBody {
    let (columns, rows) = shape(param_type(signature, 0));
    // Column `j` of the result is row `j` of the input.
    let args = (0..rows)
        .flat_map(|j| (0..columns).map(move |i| element(i, j)))
        .collect();
    let body = Expr::native(constructor_name(signature.result()), args);
    matrix_function(signature, vec![Stmt::Return(body)])
}

fn determinant(signature: &ExternalSignature) -> EmulatedBody {
    let (n, _) = shape(param_type(signature, 0));
    let all: Vec<u32> = (0..n).collect();
    matrix_function(signature, vec![Stmt::Return(minor(&all, &all))])
}

fn inverse(signature: &ExternalSignature) -> EmulatedBody {
    let ty = param_type(signature, 0);
    let (n, _) = shape(ty);
    let all: Vec<u32> = (0..n).collect();
    let without = |skip: u32| -> Vec<u32> { all.iter().copied().filter(|&i| i != skip).collect() };

    // inverse[c][r] = (-1)^(r + c) * minor(without column r, without row c) / det
    let mut args = Vec::new();
    for c in 0..n {
        for r in 0..n {
            let cofactor = minor(&without(r), &without(c));
            let cofactor = if (r + c) % 2 == 1 {
                Expr::unary(UnaryOp::Negate, cofactor)
            } else {
                cofactor
            };
            args.push(Expr::binary(BinaryOp::Divide, cofactor, Expr::var("d")));
        }
    }
    matrix_function(
        signature,
        vec![
            Stmt::Local {
                name: "d".into(),
                ty: LeafType::FLOAT.into(),
                init: Some(minor(&all, &all)),
            },
            Stmt::Return(Expr::native(constructor_name(ty), args)),
        ],
    )
}

fn pi(_: &ExternalSignature) -> EmulatedBody {
    EmulatedBody::Constant {
        ty: LeafType::FLOAT,
        value: float(core::f32::consts::PI),
    }
}
