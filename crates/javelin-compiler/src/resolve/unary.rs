//! Unary expression resolution. Same ladder as binary: fold, standard
//! semantics, overload, invalid.

use javelin_core::ast::{Expr, UnaryOp};
use javelin_core::diagnostics::Diagnostic;

use crate::conversion::resolve_unary_operation;
use crate::fold::{FoldOutcome, fold_unary};
use crate::overload::{is_overload_candidate, resolve_unary_overload, unary_method_name};

use super::{ExprContext, ExprInfo, ExprShape, Resolver, literal_type};

pub(super) fn resolve_unary(
    resolver: &mut Resolver<'_>,
    expr: &Expr<'_>,
    op: UnaryOp,
    operand: &Expr<'_>,
) -> ExprInfo {
    // ++/-- both read and write their operand.
    let ctx = if op.is_inc_dec() {
        ExprContext::CompoundAssignment
    } else {
        ExprContext::Plain
    };
    let inner = resolver.resolve_expr(operand, ctx);
    let Some(operand_ty) = inner.ty else {
        return ExprInfo::error();
    };

    // ++/-- through a user indexer hits the same get/put re-entry gap as
    // compound assignment.
    if op.is_inc_dec() && matches!(inner.shape, ExprShape::IndexerMethods { .. }) {
        resolver.reporter.report(Diagnostic::Internal {
            message: "increment of an overloaded indexer element".to_string(),
            span: expr.span,
        });
        return ExprInfo::error();
    }

    if let Some(value) = &inner.constant
        && let FoldOutcome::Value(folded) = fold_unary(op, value)
    {
        return ExprInfo {
            ty: Some(literal_type(&folded)),
            constant: Some(folded),
            shape: ExprShape::Folded,
        };
    }

    if let Some(shape) = resolve_unary_operation(op, operand_ty, resolver.registry) {
        return ExprInfo {
            ty: Some(shape.result),
            constant: None,
            shape: ExprShape::Unary(shape),
        };
    }

    if let Some(target) = resolve_unary_overload(
        op,
        operand_ty,
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

    let overload_applied =
        unary_method_name(op).is_some() && is_overload_candidate(operand_ty, resolver.registry);
    if !overload_applied {
        resolver.reporter.report(Diagnostic::InvalidOperator {
            operator: op.symbol().to_string(),
            left: resolver.registry.type_name(operand_ty),
            right: resolver.registry.type_name(operand_ty),
            span: expr.span,
        });
    }
    ExprInfo::error()
}
