//! `receiver[index]` resolution: real arrays index directly; other
//! reference types may supply `get`/`put` indexer methods. Which method is
//! required depends on the read/write context the reference occurs in.

use javelin_core::ast::Expr;
use javelin_core::binding::PrimitiveId;
use javelin_core::diagnostics::Diagnostic;
use javelin_core::hash::TypeHash;
use javelin_core::registry::BindingRegistry;

use crate::overload::param_accepts;

use super::{ExprContext, ExprInfo, ExprShape, Resolver};

/// An index expression must compute as `int`: `byte`, `short`, `char` or
/// `int`, bare or boxed. `long` is never an index.
fn is_int_compatible(ty: TypeHash, registry: &BindingRegistry) -> bool {
    let id = registry
        .get_type(ty)
        .and_then(|t| t.primitive_id())
        .or_else(|| registry.unboxed(ty));
    matches!(
        id,
        Some(PrimitiveId::Byte | PrimitiveId::Short | PrimitiveId::Char | PrimitiveId::Int)
    )
}

pub(super) fn resolve_array_ref(
    resolver: &mut Resolver<'_>,
    expr: &Expr<'_>,
    array: &Expr<'_>,
    index: &Expr<'_>,
    ctx: ExprContext,
) -> ExprInfo {
    let array_info = resolver.resolve_expr(array, ExprContext::Plain);
    let index_info = resolver.resolve_expr(index, ExprContext::Plain);
    let (Some(array_ty), Some(index_ty)) = (array_info.ty, index_info.ty) else {
        return ExprInfo::error();
    };

    if let Some(elem) = resolver
        .registry
        .get_type(array_ty)
        .and_then(|t| t.array_elem())
    {
        if !is_int_compatible(index_ty, resolver.registry) {
            resolver.reporter.report(Diagnostic::InvalidIndexType {
                found: resolver.registry.type_name(index_ty),
                span: index.span,
            });
            return ExprInfo::error();
        }
        return ExprInfo {
            ty: Some(elem),
            constant: None,
            shape: ExprShape::ArrayIndex { elem },
        };
    }

    // Indexer dispatch: get(index) for reads, put(index, value) for writes.
    let get = resolver
        .registry
        .methods_named(array_ty, "get")
        .into_iter()
        .find(|m| {
            m.params.len() == 1
                && !m.is_static
                && param_accepts(m.params[0], index_ty, resolver.registry)
        })
        .map(|m| (m.hash, m.return_type));
    let put = resolver
        .registry
        .methods_named(array_ty, "put")
        .into_iter()
        .find(|m| {
            m.params.len() == 2
                && !m.is_static
                && param_accepts(m.params[0], index_ty, resolver.registry)
        })
        .map(|m| (m.hash, m.params[1]));

    let (needs_get, needs_put) = match ctx {
        ExprContext::Plain => (true, false),
        ExprContext::Assignment => (false, true),
        ExprContext::CompoundAssignment => (true, true),
    };
    if (needs_get && get.is_none()) || (needs_put && put.is_none()) {
        resolver.reporter.report(Diagnostic::InvalidOperator {
            operator: "[]".to_string(),
            left: resolver.registry.type_name(array_ty),
            right: resolver.registry.type_name(index_ty),
            span: expr.span,
        });
        return ExprInfo::error();
    }

    // A read yields the getter's return type; a pure write yields the
    // stored value's type.
    let ty = match (get, put) {
        (Some((_, ret)), _) if needs_get => ret,
        (_, Some((_, value_ty))) => value_ty,
        _ => unreachable!("requirement check above guarantees a method"),
    };
    ExprInfo {
        ty: Some(ty),
        constant: None,
        shape: ExprShape::IndexerMethods {
            get: get.map(|(hash, _)| hash),
            put: put.map(|(hash, _)| hash),
        },
    }
}
