//! Binary expression resolution: fold, then standard semantics, then
//! operator overloads. Each stage either settles the node or hands it to
//! the next; only after all three fail is the operator reported invalid.

use javelin_core::ast::{BinaryOp, Expr};
use javelin_core::diagnostics::Diagnostic;

use crate::fold::{FoldOutcome, fold_binary};
use crate::overload::{binary_method_name, is_overload_candidate, resolve_binary_overload};
use crate::conversion::{OperationShape, resolve_operation};

use super::{ExprContext, ExprInfo, ExprShape, Resolver, literal_type};

pub(super) fn resolve_binary(
    resolver: &mut Resolver<'_>,
    expr: &Expr<'_>,
    op: BinaryOp,
    lhs: &Expr<'_>,
    rhs: &Expr<'_>,
) -> ExprInfo {
    let left = resolver.resolve_expr(lhs, ExprContext::Plain);
    let right = resolver.resolve_expr(rhs, ExprContext::Plain);
    let (Some(left_ty), Some(right_ty)) = (left.ty, right.ty) else {
        // the failing operand already reported
        return ExprInfo::error();
    };

    if let (Some(lc), Some(rc)) = (&left.constant, &right.constant) {
        match fold_binary(op, lc, rc) {
            FoldOutcome::Value(value) => {
                return ExprInfo {
                    ty: Some(literal_type(&value)),
                    constant: Some(value),
                    shape: ExprShape::Folded,
                };
            }
            FoldOutcome::DivisionByZero => {
                // keeps its runtime shape; throws ArithmeticException then
                resolver.reporter.report(Diagnostic::DivisionByZeroConstant {
                    span: expr.span,
                });
            }
            FoldOutcome::NotConstant => {}
        }
    }

    if let Some(shape) = resolve_operation(op, left_ty, right_ty, resolver.registry) {
        if let OperationShape::StringConcat {
            left_char_array,
            right_char_array,
        } = shape
            && (left_char_array || right_char_array)
        {
            resolver.reporter.report(Diagnostic::StringConcatCharArray {
                span: if left_char_array { lhs.span } else { rhs.span },
            });
        }
        return ExprInfo {
            ty: Some(shape.result_type()),
            constant: None,
            shape: ExprShape::Binary(shape),
        };
    }

    if let Some(target) = resolve_binary_overload(
        op,
        left_ty,
        right_ty,
        resolver.registry,
        &mut resolver.reporter,
        expr.span,
    ) {
        return ExprInfo {
            ty: Some(target.return_type),
            constant: None,
            shape: ExprShape::Overload(target),
        };
    }

    // Overload resolution reports its own faults when a side was eligible;
    // it stays silent when overloading never applied, and that case is a
    // plain invalid operator.
    let overload_applied = binary_method_name(op).is_some()
        && (is_overload_candidate(left_ty, resolver.registry)
            || is_overload_candidate(right_ty, resolver.registry));
    if !overload_applied {
        resolver.reporter.report(Diagnostic::InvalidOperator {
            operator: op.symbol().to_string(),
            left: resolver.registry.type_name(left_ty),
            right: resolver.registry.type_name(right_ty),
            span: expr.span,
        });
    }
    ExprInfo::error()
}
