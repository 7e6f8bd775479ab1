use tracing::debug;

use crate::{
    ast::{
        ast::{BinaryOp, Node, NodeKind, UnaryOp},
        types::LiteralKind,
    },
    errors::errors::ErrorImpl,
    EMIT,
};

use super::{
    backend::{Backend, Predicate, Repr, ScalarOp, UnaryScalarOp},
    compiler::Compiler,
    stmt::gen_statement,
};

/// Lowers an expression and returns its value.
///
/// `None` means no value was produced. The reason has already been
/// reported, or the node is a statement or a call to a void function.
pub fn gen_expression<B: Backend>(compiler: &mut Compiler<B>, node: &Node) -> Option<B::Value> {
    let line = node.line;

    match &node.kind {
        NodeKind::Literal { kind, value } => gen_literal(compiler, *kind, value, line),
        NodeKind::Identifier { name, resolved } => {
            let Some(binding) = compiler.binding(name) else {
                compiler.report(
                    ErrorImpl::UndefinedVariable {
                        variable: name.clone(),
                    },
                    line,
                );
                return None;
            };

            if resolved.is_none() {
                compiler.report(
                    ErrorImpl::UnresolvedType {
                        variable: name.clone(),
                    },
                    line,
                );
                return None;
            }

            EMIT!(compiler, compiler.backend.load(binding.slot, binding.repr, name), line)
        }
        NodeKind::Binary { op, left, right } => {
            let lhs = gen_expression(compiler, left)?;
            let rhs = gen_expression(compiler, right)?;
            gen_binary(compiler, *op, lhs, rhs, line)
        }
        NodeKind::Unary { op, operand } => {
            let operand = gen_expression(compiler, operand)?;
            let is_float = compiler.backend.repr_of(operand).is_float();

            let (op, name) = match (op, is_float) {
                (UnaryOp::Not, _) => (UnaryScalarOp::Not, "nottmp"),
                (UnaryOp::Minus, false) => (UnaryScalarOp::Neg, "negtmp"),
                (UnaryOp::Minus, true) => (UnaryScalarOp::FNeg, "fnegtmp"),
            };
            EMIT!(compiler, compiler.backend.unary(op, operand, name), line)
        }
        NodeKind::BuiltinCall { name, args } => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(gen_expression(compiler, arg)?);
            }

            if !compiler.backend.has_function(name) {
                compiler.report(
                    ErrorImpl::UnknownBuiltin {
                        function: name.clone(),
                    },
                    line,
                );
                return None;
            }

            let result_name = format!("{}_call", name);
            EMIT!(compiler, compiler.backend.call(name, &values, &result_name), line)?
        }
        _ => {
            gen_statement(compiler, node);
            None
        }
    }
}

fn gen_literal<B: Backend>(
    compiler: &mut Compiler<B>,
    kind: LiteralKind,
    value: &str,
    line: u32,
) -> Option<B::Value> {
    match kind {
        LiteralKind::Int => match value.parse::<i32>() {
            Ok(int) => EMIT!(compiler, compiler.backend.const_int(Repr::I32, int as i64), line),
            Err(_) => invalid_literal(compiler, kind, value, line),
        },
        LiteralKind::Float => match value.parse::<f32>() {
            Ok(float) => EMIT!(compiler, compiler.backend.const_float(Repr::F32, float as f64), line),
            Err(_) => invalid_literal(compiler, kind, value, line),
        },
        LiteralKind::Bool => match value {
            "true" => EMIT!(compiler, compiler.backend.const_int(Repr::I1, 1), line),
            "false" => EMIT!(compiler, compiler.backend.const_int(Repr::I1, 0), line),
            _ => invalid_literal(compiler, kind, value, line),
        },
        LiteralKind::Char => {
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) if ch.is_ascii() => {
                    EMIT!(compiler, compiler.backend.const_int(Repr::I8, ch as i64), line)
                }
                _ => invalid_literal(compiler, kind, value, line),
            }
        }
        LiteralKind::String => EMIT!(compiler, compiler.backend.const_string(value, "str"), line),
    }
}

fn invalid_literal<B: Backend>(
    compiler: &mut Compiler<B>,
    kind: LiteralKind,
    value: &str,
    line: u32,
) -> Option<B::Value> {
    compiler.report(
        ErrorImpl::InvalidLiteral {
            kind: kind.primitive().to_string(),
            value: value.to_string(),
        },
        line,
    );
    None
}

fn gen_binary<B: Backend>(
    compiler: &mut Compiler<B>,
    op: BinaryOp,
    lhs: B::Value,
    rhs: B::Value,
    line: u32,
) -> Option<B::Value> {
    let is_float = compiler.backend.repr_of(lhs).is_float();

    let scalar_op = match (op, is_float) {
        (BinaryOp::Add, false) => Some((ScalarOp::Add, "addtmp")),
        (BinaryOp::Sub, false) => Some((ScalarOp::Sub, "subtmp")),
        (BinaryOp::Mul, false) => Some((ScalarOp::Mul, "multmp")),
        (BinaryOp::Div, false) => Some((ScalarOp::SDiv, "divtmp")),
        (BinaryOp::Add, true) => Some((ScalarOp::FAdd, "faddtmp")),
        (BinaryOp::Sub, true) => Some((ScalarOp::FSub, "fsubtmp")),
        (BinaryOp::Mul, true) => Some((ScalarOp::FMul, "fmultmp")),
        (BinaryOp::Div, true) => Some((ScalarOp::FDiv, "fdivtmp")),
        (BinaryOp::And, _) => Some((ScalarOp::And, "andtmp")),
        (BinaryOp::Or, _) => Some((ScalarOp::Or, "ortmp")),
        _ => None,
    };

    if let Some((scalar_op, name)) = scalar_op {
        return EMIT!(compiler, compiler.backend.binary(scalar_op, lhs, rhs, name), line);
    }

    let predicate = match (op, is_float) {
        (BinaryOp::Eq, false) => Predicate::Eq,
        (BinaryOp::Neq, false) => Predicate::Ne,
        (BinaryOp::Lt, false) => Predicate::Slt,
        (BinaryOp::Gt, false) => Predicate::Sgt,
        (BinaryOp::Leq, false) => Predicate::Sle,
        (BinaryOp::Geq, false) => Predicate::Sge,
        (BinaryOp::Eq, true) => Predicate::Oeq,
        (BinaryOp::Neq, true) => Predicate::One,
        (BinaryOp::Lt, true) => Predicate::Olt,
        (BinaryOp::Gt, true) => Predicate::Ogt,
        (BinaryOp::Leq, true) => Predicate::Ole,
        (BinaryOp::Geq, true) => Predicate::Oge,
        (op, _) => unreachable!("{:?} is not a comparison", op),
    };

    debug!(line, predicate = predicate.mnemonic(), "lowering comparison");
    EMIT!(compiler, compiler.backend.compare(predicate, lhs, rhs, "cmptmp"), line)
}

/// Turns `value` into an `i1` by comparing it against zero.
pub fn gen_condition<B: Backend>(
    compiler: &mut Compiler<B>,
    construct: &str,
    value: B::Value,
    line: u32,
) -> Option<B::Value> {
    let repr = compiler.backend.repr_of(value);

    let (predicate, zero) = match repr {
        Repr::I1 | Repr::I8 | Repr::I32 => (
            Predicate::Ne,
            EMIT!(compiler, compiler.backend.const_int(repr, 0), line)?,
        ),
        Repr::F32 | Repr::F64 => (
            Predicate::One,
            EMIT!(compiler, compiler.backend.const_float(repr, 0.0), line)?,
        ),
        Repr::Ptr | Repr::ByteArray(_) => {
            compiler.report(
                ErrorImpl::NonBooleanCondition {
                    construct: construct.to_string(),
                    received: repr.to_string(),
                },
                line,
            );
            return None;
        }
    };

    EMIT!(compiler, compiler.backend.compare(predicate, value, zero, "cond"), line)
}
