//! Operator overload resolution.
//!
//! Runs strictly after standard semantics fail: a user class can give an
//! operator meaning, never take one away. A binary operator maps to a
//! method name looked up on the left operand's class; the right operand's
//! class is consulted through the mirrored name with the `AsRHS` suffix.
//! Exactly one side may supply the method.
//!
//! The statement keywords `_IF`, `_ELSE` and `_SWITCH` go through the same
//! naming table so a rename stays a one-table edit.

use javelin_core::ast::{BinaryOp, UnaryOp};
use javelin_core::binding::MethodBinding;
use javelin_core::diagnostics::{Diagnostic, ProblemReporter};
use javelin_core::hash::{TypeHash, well_known};
use javelin_core::registry::BindingRegistry;
use javelin_core::span::Span;

/// Suffix for the right-operand mirror of a binary operator method.
pub const RHS_SUFFIX: &str = "AsRHS";

/// Condition dispatch method for overloaded `if`.
pub const IF_METHOD: &str = "_IF";
/// Else-arm counterpart of [`IF_METHOD`].
pub const ELSE_METHOD: &str = "_ELSE";
/// Selector dispatch method for overloaded legacy `switch`.
pub const SWITCH_METHOD: &str = "_SWITCH";

/// Which operand's class declares the chosen method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverloadSide {
    Left,
    Right,
}

/// A resolved overload target.
#[derive(Debug, Clone, PartialEq)]
pub struct OverloadTarget {
    /// Hash of the chosen method.
    pub method: TypeHash,
    /// Class declaring it.
    pub owner: TypeHash,
    pub side: OverloadSide,
    pub return_type: TypeHash,
    /// Private targets need a synthetic accessor; flow analysis registers it.
    pub is_private: bool,
}

/// Method name for an overloadable binary operator. Short-circuit logical
/// operators are never overloadable.
pub fn binary_method_name(op: BinaryOp) -> Option<&'static str> {
    let name = match op {
        BinaryOp::Add => "add",
        BinaryOp::Sub => "sub",
        BinaryOp::Mul => "mul",
        BinaryOp::Div => "div",
        BinaryOp::Rem => "mod",
        BinaryOp::Shl => "shl",
        BinaryOp::Shr => "shr",
        BinaryOp::Ushr => "ushr",
        BinaryOp::Lt => "lt",
        BinaryOp::Le => "le",
        BinaryOp::Gt => "gt",
        BinaryOp::Ge => "ge",
        BinaryOp::Eq => "eq",
        BinaryOp::Ne => "neq",
        BinaryOp::BitAnd => "and",
        BinaryOp::BitOr => "or",
        BinaryOp::BitXor => "xor",
        BinaryOp::And | BinaryOp::Or => return None,
    };
    Some(name)
}

/// Method name for an overloadable unary operator.
pub fn unary_method_name(op: UnaryOp) -> Option<&'static str> {
    match op {
        UnaryOp::Neg => Some("neg"),
        UnaryOp::Not => Some("not"),
        UnaryOp::BitNot => Some("inv"),
        _ => None,
    }
}

/// The equality pair: `eq` requires `neq` on the same class and vice versa.
fn equality_counterpart(name: &str) -> Option<&'static str> {
    match name {
        "eq" => Some("neq"),
        "neq" => Some("eq"),
        _ => None,
    }
}

/// Whether a type's class may declare operator methods: any reference type
/// that is not a wrapper, `String`, or an array.
pub fn is_overload_candidate(ty: TypeHash, registry: &BindingRegistry) -> bool {
    if ty == well_known::STRING || ty == well_known::NULL || registry.unboxed(ty).is_some() {
        return false;
    }
    registry
        .get_type(ty)
        .is_some_and(|binding| !binding.is_primitive() && !binding.is_array())
}

/// Whether `arg` is acceptable for a parameter declared as `param`.
pub(crate) fn param_accepts(param: TypeHash, arg: TypeHash, registry: &BindingRegistry) -> bool {
    if param == arg || registry.is_subtype_of(arg, param) {
        return true;
    }
    // Widening between primitives.
    if let (Some(p), Some(a)) = (
        registry.get_type(param).and_then(|t| t.primitive_id()),
        registry.get_type(arg).and_then(|t| t.primitive_id()),
    ) {
        use crate::conversion::promotion::promotion_rank;
        return match (promotion_rank(a), promotion_rank(p)) {
            (Some(ar), Some(pr)) => ar <= pr,
            _ => false,
        };
    }
    false
}

/// Look for a single-parameter instance method `name` on `owner` accepting
/// `arg`. Static matches are a hard error, never silently skipped.
fn find_candidate<'r>(
    owner: TypeHash,
    name: &str,
    arg: TypeHash,
    registry: &'r BindingRegistry,
    reporter: &mut ProblemReporter,
    span: Span,
) -> Option<&'r MethodBinding> {
    for method in registry.methods_named(owner, name) {
        if method.params.len() != 1 || !param_accepts(method.params[0], arg, registry) {
            continue;
        }
        if method.is_static {
            reporter.report(Diagnostic::StaticOperatorMethod {
                method: name.to_string(),
                owner: registry.type_name(owner),
                span,
            });
            return None;
        }
        return Some(method);
    }
    None
}

/// Resolve a binary operator overload.
///
/// Returns `None` both when overloading does not apply (no side is a
/// candidate class) and on a reported fault; the caller distinguishes by
/// checking [`is_overload_candidate`] before deciding to report
/// `InvalidOperator` itself.
pub fn resolve_binary_overload(
    op: BinaryOp,
    left: TypeHash,
    right: TypeHash,
    registry: &BindingRegistry,
    reporter: &mut ProblemReporter,
    span: Span,
) -> Option<OverloadTarget> {
    let name = binary_method_name(op)?;
    let left_eligible = is_overload_candidate(left, registry);
    let right_eligible = is_overload_candidate(right, registry);
    if !left_eligible && !right_eligible {
        return None;
    }

    let left_hit = left_eligible
        .then(|| find_candidate(left, name, right, registry, reporter, span))
        .flatten()
        .map(|m| (m.hash, m.owner, m.return_type, m.is_private()));
    let mirrored = format!("{name}{RHS_SUFFIX}");
    let right_hit = right_eligible
        .then(|| find_candidate(right, &mirrored, left, registry, reporter, span))
        .flatten()
        .map(|m| (m.hash, m.owner, m.return_type, m.is_private()));

    let (method, owner, return_type, is_private, side) = match (left_hit, right_hit) {
        (Some(_), Some(_)) => {
            reporter.report(Diagnostic::AmbiguousOperatorOverload {
                operator: op.symbol().to_string(),
                left: registry.type_name(left),
                right: registry.type_name(right),
                span,
            });
            return None;
        }
        (Some((m, o, r, p)), None) => (m, o, r, p, OverloadSide::Left),
        (None, Some((m, o, r, p))) => (m, o, r, p, OverloadSide::Right),
        (None, None) => {
            reporter.report(Diagnostic::MissingOperatorMethod {
                operator: op.symbol().to_string(),
                method: name.to_string(),
                span,
            });
            return None;
        }
    };

    // eq and neq must come in pairs on the declaring class.
    if let Some(counterpart) = equality_counterpart(name) {
        let paired = match side {
            OverloadSide::Left => registry.lookup_method(owner, counterpart, &[right]).is_some(),
            OverloadSide::Right => registry
                .lookup_method(owner, &format!("{counterpart}{RHS_SUFFIX}"), &[left])
                .is_some(),
        };
        if !paired {
            reporter.report(Diagnostic::MissingOperatorCounterpart {
                found: name.to_string(),
                missing: counterpart.to_string(),
                owner: registry.type_name(owner),
                span,
            });
            return None;
        }
    }

    Some(OverloadTarget {
        method,
        owner,
        side,
        return_type,
        is_private,
    })
}

/// Resolve a unary operator overload. Single side, no mirror.
pub fn resolve_unary_overload(
    op: UnaryOp,
    operand: TypeHash,
    registry: &BindingRegistry,
    reporter: &mut ProblemReporter,
    span: Span,
) -> Option<OverloadTarget> {
    let name = unary_method_name(op)?;
    if !is_overload_candidate(operand, registry) {
        return None;
    }
    let mut hit = None;
    for method in registry.methods_named(operand, name) {
        if !method.params.is_empty() {
            continue;
        }
        if method.is_static {
            reporter.report(Diagnostic::StaticOperatorMethod {
                method: name.to_string(),
                owner: registry.type_name(operand),
                span,
            });
            return None;
        }
        hit = Some(method);
        break;
    }
    match hit {
        Some(method) => Some(OverloadTarget {
            method: method.hash,
            owner: method.owner,
            side: OverloadSide::Left,
            return_type: method.return_type,
            is_private: method.is_private(),
        }),
        None => {
            reporter.report(Diagnostic::MissingOperatorMethod {
                operator: op.symbol().to_string(),
                method: name.to_string(),
                span,
            });
            None
        }
    }
}

/// Find the `_IF` dispatch method on a condition type: non-static, no
/// parameters, boolean-returning.
pub fn resolve_if_overload(
    condition: TypeHash,
    registry: &BindingRegistry,
) -> Option<OverloadTarget> {
    if !is_overload_candidate(condition, registry) {
        return None;
    }
    let method = registry
        .methods_named(condition, IF_METHOD)
        .into_iter()
        .find(|m| m.params.is_empty() && !m.is_static && m.return_type == well_known::BOOLEAN)?;
    Some(OverloadTarget {
        method: method.hash,
        owner: method.owner,
        side: OverloadSide::Left,
        return_type: method.return_type,
        is_private: method.is_private(),
    })
}

/// Find the `_ELSE` counterpart on the same class as a resolved `_IF`.
pub fn resolve_else_overload(
    if_target: &OverloadTarget,
    registry: &BindingRegistry,
) -> Option<OverloadTarget> {
    let method = registry
        .methods_named(if_target.owner, ELSE_METHOD)
        .into_iter()
        .find(|m| m.params.is_empty() && !m.is_static && m.return_type == well_known::BOOLEAN)?;
    Some(OverloadTarget {
        method: method.hash,
        owner: method.owner,
        side: OverloadSide::Left,
        return_type: method.return_type,
        is_private: method.is_private(),
    })
}

/// Find the `_SWITCH(caseValue) -> boolean` dispatch method on a selector
/// type, for one case label type.
pub fn resolve_switch_overload(
    selector: TypeHash,
    case_ty: TypeHash,
    registry: &BindingRegistry,
) -> Option<OverloadTarget> {
    if !is_overload_candidate(selector, registry) {
        return None;
    }
    let method = registry
        .methods_named(selector, SWITCH_METHOD)
        .into_iter()
        .find(|m| {
            m.params.len() == 1
                && !m.is_static
                && m.return_type == well_known::BOOLEAN
                && param_accepts(m.params[0], case_ty, registry)
        })?;
    Some(OverloadTarget {
        method: method.hash,
        owner: method.owner,
        side: OverloadSide::Left,
        return_type: method.return_type,
        is_private: method.is_private(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use javelin_core::binding::{TypeBinding, Visibility};

    fn setup() -> (BindingRegistry, ProblemReporter) {
        (BindingRegistry::with_jdk_defaults(), ProblemReporter::new())
    }

    fn span() -> Span {
        Span::new(1, 1, 1)
    }

    #[test]
    fn left_side_overload_wins_alone() {
        let (mut registry, mut reporter) = setup();
        let vec2 = registry.register_type(TypeBinding::class("Vec2"));
        registry.register_method(MethodBinding::instance(vec2, "add", &[vec2], vec2));

        let target =
            resolve_binary_overload(BinaryOp::Add, vec2, vec2, &mut registry, &mut reporter, span())
                .unwrap();
        assert_eq!(target.side, OverloadSide::Left);
        assert_eq!(target.owner, vec2);
        assert!(!reporter.has_errors());
    }

    #[test]
    fn right_side_mirror_is_found() {
        let (mut registry, mut reporter) = setup();
        let scale = registry.register_type(TypeBinding::class("Scale"));
        let vec2 = registry.register_type(TypeBinding::class("Vec2"));
        registry.register_method(MethodBinding::instance(vec2, "mulAsRHS", &[scale], vec2));

        let target = resolve_binary_overload(
            BinaryOp::Mul,
            scale,
            vec2,
            &mut registry,
            &mut reporter,
            span(),
        )
        .unwrap();
        assert_eq!(target.side, OverloadSide::Right);
        assert!(!reporter.has_errors());
    }

    #[test]
    fn both_sides_is_ambiguous() {
        let (mut registry, mut reporter) = setup();
        let a = registry.register_type(TypeBinding::class("A"));
        let b = registry.register_type(TypeBinding::class("B"));
        registry.register_method(MethodBinding::instance(a, "add", &[b], a));
        registry.register_method(MethodBinding::instance(b, "addAsRHS", &[a], b));

        let target =
            resolve_binary_overload(BinaryOp::Add, a, b, &mut registry, &mut reporter, span());
        assert!(target.is_none());
        assert!(matches!(
            reporter.iter().next(),
            Some(Diagnostic::AmbiguousOperatorOverload { .. })
        ));
    }

    #[test]
    fn missing_method_is_reported() {
        let (mut registry, mut reporter) = setup();
        let a = registry.register_type(TypeBinding::class("A"));
        let target =
            resolve_binary_overload(BinaryOp::Sub, a, a, &mut registry, &mut reporter, span());
        assert!(target.is_none());
        assert!(matches!(
            reporter.iter().next(),
            Some(Diagnostic::MissingOperatorMethod { .. })
        ));
    }

    #[test]
    fn static_method_is_a_hard_error() {
        let (mut registry, mut reporter) = setup();
        let a = registry.register_type(TypeBinding::class("A"));
        registry.register_method(MethodBinding::instance(a, "add", &[a], a).static_method());

        let target =
            resolve_binary_overload(BinaryOp::Add, a, a, &mut registry, &mut reporter, span());
        assert!(target.is_none());
        assert!(matches!(
            reporter.iter().next(),
            Some(Diagnostic::StaticOperatorMethod { .. })
        ));
    }

    #[test]
    fn eq_requires_neq_counterpart() {
        let (mut registry, mut reporter) = setup();
        let a = registry.register_type(TypeBinding::class("A"));
        registry.register_method(MethodBinding::instance(a, "eq", &[a], well_known::BOOLEAN));

        let target =
            resolve_binary_overload(BinaryOp::Eq, a, a, &mut registry, &mut reporter, span());
        assert!(target.is_none());
        assert!(matches!(
            reporter.iter().next(),
            Some(Diagnostic::MissingOperatorCounterpart { .. })
        ));

        registry.register_method(MethodBinding::instance(a, "neq", &[a], well_known::BOOLEAN));
        let mut reporter = ProblemReporter::new();
        let target =
            resolve_binary_overload(BinaryOp::Eq, a, a, &mut registry, &mut reporter, span());
        assert!(target.is_some());
        assert!(!reporter.has_errors());
    }

    #[test]
    fn logical_operators_never_overload() {
        let (mut registry, mut reporter) = setup();
        let a = registry.register_type(TypeBinding::class("A"));
        registry.register_method(MethodBinding::instance(a, "and", &[a], a));
        let target =
            resolve_binary_overload(BinaryOp::And, a, a, &mut registry, &mut reporter, span());
        assert!(target.is_none());
        assert!(reporter.is_empty());
    }

    #[test]
    fn primitives_are_not_candidates() {
        let (mut registry, mut reporter) = setup();
        let target = resolve_binary_overload(
            BinaryOp::Add,
            well_known::INT,
            well_known::BOOLEAN,
            &mut registry,
            &mut reporter,
            span(),
        );
        assert!(target.is_none());
        assert!(reporter.is_empty());
    }

    #[test]
    fn private_target_is_flagged() {
        let (mut registry, mut reporter) = setup();
        let a = registry.register_type(TypeBinding::class("A"));
        registry.register_method(
            MethodBinding::instance(a, "neg", &[], a).with_visibility(Visibility::Private),
        );
        let target =
            resolve_unary_overload(UnaryOp::Neg, a, &registry, &mut reporter, span()).unwrap();
        assert!(target.is_private);
    }

    #[test]
    fn if_overload_requires_boolean_return() {
        let (mut registry, _) = setup();
        let cond = registry.register_type(TypeBinding::class("Flag"));
        registry.register_method(MethodBinding::instance(cond, IF_METHOD, &[], cond));
        assert!(resolve_if_overload(cond, &registry).is_none());

        registry.register_method(MethodBinding::instance(
            cond,
            IF_METHOD,
            &[],
            well_known::BOOLEAN,
        ));
        assert!(resolve_if_overload(cond, &registry).is_some());
    }

    #[test]
    fn switch_overload_matches_case_type() {
        let (mut registry, _) = setup();
        let sel = registry.register_type(TypeBinding::class("Mode"));
        registry.register_method(MethodBinding::instance(
            sel,
            SWITCH_METHOD,
            &[well_known::STRING],
            well_known::BOOLEAN,
        ));
        assert!(resolve_switch_overload(sel, well_known::STRING, &registry).is_some());
        assert!(resolve_switch_overload(sel, well_known::INT, &registry).is_none());
    }
}
