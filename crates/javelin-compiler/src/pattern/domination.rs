//! Label domination: an earlier unguarded type pattern that matches every
//! value of a later label's type makes that later label dead code.

use javelin_core::diagnostics::Diagnostic;
use javelin_core::hash::TypeHash;
use javelin_core::registry::BindingRegistry;
use javelin_core::span::Span;

use super::{Coverage, ResolvedPattern};

/// Whether `earlier` dominates a later label testing for `later_ty`.
///
/// Only unguarded type patterns dominate; record patterns and guarded
/// patterns admit values that fail their component tests or guard.
pub fn dominates(
    earlier: &ResolvedPattern,
    later_ty: TypeHash,
    registry: &BindingRegistry,
) -> bool {
    matches!(earlier.coverage, Coverage::Type(ty) if registry.is_subtype_of(later_ty, ty))
}

/// Check each pattern label against every earlier one, in source order.
pub fn check_order(
    labels: &[(ResolvedPattern, Span)],
    registry: &BindingRegistry,
    reporter: &mut javelin_core::diagnostics::ProblemReporter,
) {
    for (i, (later, span)) in labels.iter().enumerate() {
        if labels[..i]
            .iter()
            .any(|(earlier, _)| dominates(earlier, later.ty, registry))
        {
            reporter.report(Diagnostic::DominatedCaseLabel { span: *span });
        }
    }
}

/// Whether a total pattern makes a trailing `default` unreachable.
pub fn default_is_unreachable(
    labels: &[(ResolvedPattern, Span)],
    selector: TypeHash,
    registry: &BindingRegistry,
) -> bool {
    labels
        .iter()
        .any(|(pattern, _)| dominates(pattern, selector, registry))
}
