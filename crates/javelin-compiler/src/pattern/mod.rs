//! Pattern resolution for `switch` case labels.
//!
//! A pattern resolves to the type it tests for plus a [`Coverage`] tree
//! describing what it matches unconditionally. Guarded patterns keep their
//! tested type (domination still applies to them) but cover nothing, with
//! one exception: a guard that folds to constant `true` is no guard at all.

pub mod domination;
pub mod exhaustive;

use javelin_core::ast::{Pattern, PatternKind};
use javelin_core::constant::Constant;
use javelin_core::diagnostics::Diagnostic;
use javelin_core::hash::{TypeHash, well_known};
use javelin_core::registry::BindingRegistry;

use crate::resolve::{ExprContext, Resolver};

/// What a pattern matches without running a guard.
#[derive(Debug, Clone, PartialEq)]
pub enum Coverage {
    /// An unguarded type pattern: every value of the type matches.
    Type(TypeHash),
    /// A record pattern: matches when every component pattern matches.
    Record(TypeHash, Vec<Coverage>),
    /// A guarded pattern: matches nothing unconditionally.
    Partial,
}

/// A resolved case pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPattern {
    /// The type the runtime test checks against.
    pub ty: TypeHash,
    pub coverage: Coverage,
}

impl ResolvedPattern {
    pub fn is_guarded(&self) -> bool {
        matches!(self.coverage, Coverage::Partial)
    }
}

/// Resolve one case pattern against the switch selector type.
///
/// Reports and returns `None` on a type incompatible with the selector, a
/// record pattern with the wrong component count, or a non-boolean guard.
pub fn resolve_pattern(
    resolver: &mut Resolver<'_>,
    pattern: &Pattern<'_>,
    selector: TypeHash,
) -> Option<ResolvedPattern> {
    match &pattern.kind {
        PatternKind::Type { ty, .. } => {
            // `var` infers the selector type and always matches.
            let ty = ty.unwrap_or(selector);
            check_compatible(resolver, ty, selector, pattern)?;
            Some(ResolvedPattern {
                ty,
                coverage: Coverage::Type(ty),
            })
        }
        PatternKind::Record { ty, components } => {
            check_compatible(resolver, *ty, selector, pattern)?;
            let declared = match resolver.registry.record_components(*ty) {
                Some(declared) => declared.to_vec(),
                None => {
                    resolver.reporter.report(Diagnostic::RecordComponentMismatch {
                        record: resolver.registry.type_name(*ty),
                        expected: 0,
                        found: components.len(),
                        span: pattern.span,
                    });
                    return None;
                }
            };
            if declared.len() != components.len() {
                resolver.reporter.report(Diagnostic::RecordComponentMismatch {
                    record: resolver.registry.type_name(*ty),
                    expected: declared.len(),
                    found: components.len(),
                    span: pattern.span,
                });
                return None;
            }
            let mut nested = Vec::with_capacity(components.len());
            for (component, declared) in components.iter().zip(&declared) {
                nested.push(resolve_pattern(resolver, component, declared.ty)?.coverage);
            }
            Some(ResolvedPattern {
                ty: *ty,
                coverage: Coverage::Record(*ty, nested),
            })
        }
        PatternKind::Guarded { inner, guard } => {
            let resolved = resolve_pattern(resolver, inner, selector)?;
            let guard_info = resolver.resolve_expr(guard, ExprContext::Plain);
            match guard_info.ty {
                Some(ty) if ty == well_known::BOOLEAN => {}
                Some(ty) => {
                    let found = resolver.registry.type_name(ty);
                    resolver.reporter.report(Diagnostic::NonBooleanGuard {
                        found,
                        span: guard.span,
                    });
                    return None;
                }
                None => return None,
            }
            // `when true` is vacuous; the pattern stays unconditional.
            if guard_info.constant == Some(Constant::Bool(true)) {
                return Some(resolved);
            }
            Some(ResolvedPattern {
                ty: resolved.ty,
                coverage: Coverage::Partial,
            })
        }
    }
}

fn check_compatible(
    resolver: &mut Resolver<'_>,
    ty: TypeHash,
    selector: TypeHash,
    pattern: &Pattern<'_>,
) -> Option<()> {
    let registry: &BindingRegistry = resolver.registry;
    // cast-convertible in either direction
    if registry.is_subtype_of(ty, selector) || registry.is_subtype_of(selector, ty) {
        return Some(());
    }
    resolver.reporter.report(Diagnostic::CaseTypeIncompatible {
        case_ty: registry.type_name(ty),
        selector: registry.type_name(selector),
        span: pattern.span,
    });
    None
}

/// Whether a coverage tree matches every value of `ty`.
pub(crate) fn covers_type(coverage: &Coverage, ty: TypeHash, registry: &BindingRegistry) -> bool {
    match coverage {
        Coverage::Type(covered) => registry.is_subtype_of(ty, *covered),
        Coverage::Record(record_ty, components) => {
            if ty != *record_ty {
                return false;
            }
            match registry.record_components(*record_ty) {
                Some(declared) => declared
                    .iter()
                    .zip(components)
                    .all(|(d, c)| covers_type(c, d.ty, registry)),
                None => false,
            }
        }
        Coverage::Partial => false,
    }
}
