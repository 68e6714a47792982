//! Exhaustiveness over enums, sealed hierarchies and records.
//!
//! A selector is exhausted when a `default` (or total pattern) is present,
//! when every enum constant is named, or when every permitted subtype of a
//! sealed hierarchy is covered, recursing through nested sealed types and
//! record components.

use javelin_core::diagnostics::{Diagnostic, ProblemReporter};
use javelin_core::hash::TypeHash;
use javelin_core::registry::BindingRegistry;
use javelin_core::span::Span;

use super::{Coverage, ResolvedPattern, covers_type};

/// Check that a switch without `default` exhausts its selector.
///
/// `constants` are the enum constant names appearing as case labels.
/// Missing enum constants are reported one by one; any other gap reports a
/// single `NonExhaustiveSwitch`.
pub fn check_exhaustiveness(
    selector: TypeHash,
    patterns: &[ResolvedPattern],
    constants: &[String],
    span: Span,
    registry: &BindingRegistry,
    reporter: &mut ProblemReporter,
) {
    let coverages: Vec<&Coverage> = patterns.iter().map(|p| &p.coverage).collect();

    if let Some(declared) = registry.enum_constants(selector) {
        if coverages
            .iter()
            .any(|c| covers_type(c, selector, registry))
        {
            return;
        }
        for constant in declared {
            if !constants.contains(constant) {
                reporter.report(Diagnostic::MissingEnumConstant {
                    constant: constant.clone(),
                    span,
                });
            }
        }
        return;
    }

    if type_exhausted(selector, &coverages, registry, 0) {
        return;
    }
    reporter.report(Diagnostic::NonExhaustiveSwitch {
        selector: registry.type_name(selector),
        span,
    });
}

const MAX_SEALED_DEPTH: usize = 32;

/// Whether the coverage set exhausts `ty`, unfolding sealed permits.
fn type_exhausted(
    ty: TypeHash,
    coverages: &[&Coverage],
    registry: &BindingRegistry,
    depth: usize,
) -> bool {
    if coverages.iter().any(|c| covers_type(c, ty, registry)) {
        return true;
    }
    if record_exhausted(ty, coverages, registry, depth) {
        return true;
    }
    if depth >= MAX_SEALED_DEPTH {
        return false;
    }
    let permits = registry.permitted_subtypes(ty);
    !permits.is_empty()
        && permits
            .iter()
            .all(|permit| type_exhausted(*permit, coverages, registry, depth + 1))
}

/// Whether record patterns for `ty` jointly exhaust it: some record pattern
/// exists whose every component either covers its component type outright
/// or exhausts it through sealed unfolding.
fn record_exhausted(
    ty: TypeHash,
    coverages: &[&Coverage],
    registry: &BindingRegistry,
    depth: usize,
) -> bool {
    let Some(declared) = registry.record_components(ty) else {
        return false;
    };
    coverages.iter().any(|coverage| {
        let Coverage::Record(record_ty, components) = coverage else {
            return false;
        };
        *record_ty == ty
            && declared.iter().zip(components).all(|(d, c)| {
                type_exhausted(d.ty, &[c], registry, depth + 1)
            })
    })
}
