//! Switch resolution: label checking, dispatch strategy selection, and the
//! switch-expression result type.
//!
//! [`resolve_switch`] runs every structural check (duplicate labels,
//! fallthrough into patterns, domination, exhaustiveness) and produces a
//! [`SwitchPlan`] the code generator lowers through [`dispatch`]. Checks
//! report and degrade; the plan is always produced so later labels keep
//! getting checked.

pub mod dispatch;

use javelin_core::ast::{CaseLabel, Expr, ExprKind, Stmt, SwitchKind, SwitchNode};
use javelin_core::binding::PrimitiveId;
use javelin_core::constant::Constant;
use javelin_core::diagnostics::Diagnostic;
use javelin_core::hash::{TypeHash, well_known};
use javelin_core::span::Span;

use crate::overload::{OverloadTarget, is_overload_candidate, resolve_switch_overload};
use crate::pattern::domination;
use crate::pattern::exhaustive::check_exhaustiveness;
use crate::pattern::{ResolvedPattern, resolve_pattern};
use crate::resolve::{ExprContext, ExprInfo, Resolver};

/// How the selector reaches its case bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchStrategy {
    /// Dense int keys: `tableswitch`.
    IntTable { low: i32, high: i32 },
    /// Sparse int keys: `lookupswitch`.
    IntLookup,
    /// Enum selector: `lookupswitch` over ordinals.
    EnumOrdinal,
    /// String selector: `hashCode` dispatch plus `equals` confirmation.
    StringHash,
    /// Pattern labels: `invokedynamic` type-switch with a restart index.
    TypeSwitch,
    /// Selector class answers through its `_SWITCH` method per label.
    Overload,
}

/// One constant case label, attached to its arm.
#[derive(Debug, Clone)]
pub struct ConstantCase {
    pub arm: usize,
    /// Normalized key (sub-int constants widen to `Int`).
    pub value: Constant,
    pub span: Span,
    /// `_SWITCH` target for the overloaded strategy.
    pub overload: Option<OverloadTarget>,
}

/// One pattern case label, attached to its arm.
#[derive(Debug, Clone)]
pub struct PatternCase {
    pub arm: usize,
    pub pattern: ResolvedPattern,
    pub span: Span,
}

/// Everything code generation needs to lower one switch.
#[derive(Debug, Clone)]
pub struct SwitchPlan {
    pub strategy: SwitchStrategy,
    pub constants: Vec<ConstantCase>,
    pub patterns: Vec<PatternCase>,
    pub default_arm: Option<usize>,
    pub null_arm: Option<usize>,
    pub selector: Option<TypeHash>,
    /// Result type when the switch is an expression.
    pub result: Option<TypeHash>,
}

/// Selector categories with distinct label rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SelectorKind {
    Int,
    Str,
    Enum,
    Reference,
    Overloaded,
    Invalid,
}

fn classify_selector(ty: TypeHash, resolver: &Resolver<'_>) -> SelectorKind {
    let registry = resolver.registry;
    if ty == well_known::STRING {
        return SelectorKind::Str;
    }
    let primitive = registry
        .get_type(ty)
        .and_then(|t| t.primitive_id())
        .or_else(|| registry.unboxed(ty));
    if let Some(id) = primitive {
        return match id {
            PrimitiveId::Byte | PrimitiveId::Short | PrimitiveId::Char | PrimitiveId::Int => {
                SelectorKind::Int
            }
            _ => SelectorKind::Invalid,
        };
    }
    if registry.enum_constants(ty).is_some() {
        return SelectorKind::Enum;
    }
    if is_overload_candidate(ty, registry)
        && !registry.methods_named(ty, crate::overload::SWITCH_METHOD).is_empty()
    {
        return SelectorKind::Overloaded;
    }
    if registry.get_type(ty).is_some_and(|t| !t.is_primitive()) {
        return SelectorKind::Reference;
    }
    SelectorKind::Invalid
}

/// Resolve a switch used as an expression; called from the expression
/// resolver for [`javelin_core::ast::ExprKind::Switch`] nodes.
pub fn resolve_switch_expr(resolver: &mut Resolver<'_>, node: &SwitchNode<'_>) -> ExprInfo {
    let plan = resolve_switch(resolver, node);
    match plan.result {
        Some(ty) => ExprInfo::of_type(ty),
        None => ExprInfo::error(),
    }
}

/// Resolve a switch construct and choose its dispatch strategy.
pub fn resolve_switch(resolver: &mut Resolver<'_>, node: &SwitchNode<'_>) -> SwitchPlan {
    let selector_info = resolver.resolve_expr(node.selector, ExprContext::Plain);
    let selector = selector_info.ty;
    let kind = match selector {
        Some(ty) => classify_selector(ty, resolver),
        None => SelectorKind::Invalid,
    };

    let mut constants: Vec<ConstantCase> = Vec::new();
    let mut patterns: Vec<PatternCase> = Vec::new();
    let mut default_arm = None;
    let mut null_arm = None;

    for (arm_index, arm) in node.arms.iter().enumerate() {
        for label in arm.labels {
            match label {
                CaseLabel::Default(span) => {
                    if default_arm.is_some() {
                        resolver
                            .reporter
                            .report(Diagnostic::DuplicateDefaultCase { span: *span });
                    } else {
                        default_arm = Some(arm_index);
                    }
                }
                CaseLabel::Null(span) => {
                    if null_arm.is_some() {
                        resolver
                            .reporter
                            .report(Diagnostic::DuplicateNullCase { span: *span });
                    } else {
                        null_arm = Some(arm_index);
                    }
                }
                CaseLabel::Constant(expr) => {
                    if let Some(case) =
                        resolve_constant_label(resolver, expr, arm_index, selector, kind)
                    {
                        if constants.iter().any(|c| c.value == case.value) {
                            resolver
                                .reporter
                                .report(Diagnostic::ConstantCaseDuplicated { span: case.span });
                        } else {
                            constants.push(case);
                        }
                    }
                }
                CaseLabel::Pattern(pattern) => {
                    if let Some(ty) = selector
                        && let Some(resolved) = resolve_pattern(resolver, pattern, ty)
                    {
                        patterns.push(PatternCase {
                            arm: arm_index,
                            pattern: resolved,
                            span: pattern.span,
                        });
                    }
                }
            }
        }
    }

    check_fallthrough(resolver, node);

    let ordered: Vec<(ResolvedPattern, Span)> = patterns
        .iter()
        .map(|p| (p.pattern.clone(), p.span))
        .collect();
    domination::check_order(&ordered, resolver.registry, &mut resolver.reporter);
    if let Some(arm) = default_arm
        && let Some(ty) = selector
        && domination::default_is_unreachable(&ordered, ty, resolver.registry)
    {
        resolver.reporter.report(Diagnostic::UnreachableDefault {
            span: node.arms[arm].span,
        });
    }

    let needs_exhaustiveness = node.kind == SwitchKind::Expression || !patterns.is_empty();
    if needs_exhaustiveness
        && default_arm.is_none()
        && let Some(ty) = selector
    {
        let named: Vec<String> = constants
            .iter()
            .filter_map(|c| match &c.value {
                Constant::Str(name) => Some(name.clone()),
                _ => None,
            })
            .collect();
        let resolved: Vec<ResolvedPattern> = patterns.iter().map(|p| p.pattern.clone()).collect();
        check_exhaustiveness(
            ty,
            &resolved,
            &named,
            node.span,
            resolver.registry,
            &mut resolver.reporter,
        );
    }

    let result = if node.kind == SwitchKind::Expression {
        resolve_arm_bodies(resolver, node)
    } else {
        for arm in node.arms {
            for stmt in arm.body {
                resolve_body_stmt(resolver, stmt);
            }
        }
        None
    };

    let strategy = if !patterns.is_empty() {
        SwitchStrategy::TypeSwitch
    } else {
        match kind {
            SelectorKind::Int => int_strategy(&constants),
            SelectorKind::Str => SwitchStrategy::StringHash,
            SelectorKind::Enum => SwitchStrategy::EnumOrdinal,
            SelectorKind::Overloaded => SwitchStrategy::Overload,
            SelectorKind::Reference | SelectorKind::Invalid => SwitchStrategy::TypeSwitch,
        }
    };

    let plan = SwitchPlan {
        strategy,
        constants,
        patterns,
        default_arm,
        null_arm,
        selector,
        result,
    };
    resolver.record_switch_plan(node.id, plan.clone());
    plan
}

fn resolve_constant_label(
    resolver: &mut Resolver<'_>,
    expr: &Expr<'_>,
    arm: usize,
    selector: Option<TypeHash>,
    kind: SelectorKind,
) -> Option<ConstantCase> {
    let info = resolver.resolve_expr(expr, ExprContext::Plain);
    let label_ty = info.ty?;
    let Some(value) = info.constant else {
        resolver
            .reporter
            .report(Diagnostic::NonConstantCaseLabel { span: expr.span });
        return None;
    };

    let selector = selector?;
    let incompatible = |resolver: &mut Resolver<'_>| {
        resolver.reporter.report(Diagnostic::CaseTypeIncompatible {
            case_ty: resolver.registry.type_name(label_ty),
            selector: resolver.registry.type_name(selector),
            span: expr.span,
        });
        None
    };

    match kind {
        SelectorKind::Int => match value.as_int() {
            Some(key) => Some(ConstantCase {
                arm,
                value: Constant::Int(key),
                span: expr.span,
                overload: None,
            }),
            None => incompatible(resolver),
        },
        SelectorKind::Str | SelectorKind::Enum => match value {
            Constant::Str(_) => {
                // enum labels arrive as the constant's name
                if kind == SelectorKind::Enum
                    && let Constant::Str(name) = &value
                    && let Some(declared) = resolver.registry.enum_constants(selector)
                    && !declared.contains(name)
                {
                    return incompatible(resolver);
                }
                Some(ConstantCase {
                    arm,
                    value,
                    span: expr.span,
                    overload: None,
                })
            }
            _ => incompatible(resolver),
        },
        SelectorKind::Overloaded => {
            match resolve_switch_overload(selector, label_ty, resolver.registry) {
                Some(target) => Some(ConstantCase {
                    arm,
                    value,
                    span: expr.span,
                    overload: Some(target),
                }),
                None => {
                    resolver.reporter.report(Diagnostic::MissingOperatorMethod {
                        operator: "switch".to_string(),
                        method: crate::overload::SWITCH_METHOD.to_string(),
                        span: expr.span,
                    });
                    None
                }
            }
        }
        SelectorKind::Reference | SelectorKind::Invalid => incompatible(resolver),
    }
}

/// Dense keys take a `tableswitch`; sparse ones a `lookupswitch`.
fn int_strategy(constants: &[ConstantCase]) -> SwitchStrategy {
    let keys: Vec<i32> = constants
        .iter()
        .filter_map(|c| c.value.as_int())
        .collect();
    let (Some(&low), Some(&high)) = (keys.iter().min(), keys.iter().max()) else {
        return SwitchStrategy::IntLookup;
    };
    let range = (high as i64) - (low as i64) + 1;
    if range <= 2 * keys.len() as i64 + 8 {
        SwitchStrategy::IntTable { low, high }
    } else {
        SwitchStrategy::IntLookup
    }
}

/// Colon-group arms may fall through, but never into an arm that binds a
/// pattern.
fn check_fallthrough(resolver: &mut Resolver<'_>, node: &SwitchNode<'_>) {
    for (i, arm) in node.arms.iter().enumerate() {
        if i == 0 || arm.is_arrow {
            continue;
        }
        let has_pattern = arm
            .labels
            .iter()
            .any(|l| matches!(l, CaseLabel::Pattern(_)));
        if !has_pattern {
            continue;
        }
        let previous = &node.arms[i - 1];
        if !previous.is_arrow && !body_exits(previous.body) {
            resolver
                .reporter
                .report(Diagnostic::IllegalFallthroughToPattern { span: arm.span });
        }
    }
}

/// Whether a case body always leaves the switch (ends in break, return or
/// yield).
fn body_exits(body: &[Stmt<'_>]) -> bool {
    matches!(
        body.last(),
        Some(Stmt::Break { .. } | Stmt::Return { .. } | Stmt::Yield { .. })
    )
}

/// Resolve all arm bodies of an expression switch and compute its type:
/// the type of the first yielded value. Every later arm must yield that
/// type (or a subtype); the join never widens or boxes.
fn resolve_arm_bodies(resolver: &mut Resolver<'_>, node: &SwitchNode<'_>) -> Option<TypeHash> {
    let mut result = None;
    for arm in node.arms {
        for stmt in arm.body {
            resolve_body_stmt(resolver, stmt);
        }
        let yielded = arm_value(arm.body, arm.is_arrow);
        if let Some(value) = yielded
            && let Some(ty) = resolver.type_of(value.id)
        {
            match result {
                None => result = Some(ty),
                Some(expected) => {
                    if !resolver.registry.is_subtype_of(ty, expected) {
                        resolver.reporter.report(Diagnostic::MismatchedSwitchArmType {
                            expected: resolver.registry.type_name(expected),
                            found: resolver.registry.type_name(ty),
                            span: value.span,
                        });
                    }
                }
            }
        }
    }
    result
}

/// The value an expression-switch arm produces, if syntactically evident:
/// an explicit `yield`, or the lone expression of an arrow arm.
pub fn arm_value<'ast>(body: &'ast [Stmt<'ast>], is_arrow: bool) -> Option<&'ast Expr<'ast>> {
    match body.last() {
        Some(Stmt::Yield { value, .. }) => Some(value),
        Some(Stmt::Expr(expr)) if is_arrow => Some(expr),
        _ => None,
    }
}

/// Resolve every expression nested in a statement.
fn resolve_body_stmt(resolver: &mut Resolver<'_>, stmt: &Stmt<'_>) {
    match stmt {
        Stmt::Expr(expr) => {
            resolver.resolve_expr(expr, ExprContext::Plain);
        }
        Stmt::Block(stmts) => {
            for s in *stmts {
                resolve_body_stmt(resolver, s);
            }
        }
        Stmt::If {
            cond,
            then_branch,
            else_branch,
            ..
        } => {
            resolver.resolve_expr(cond, ExprContext::Plain);
            resolve_body_stmt(resolver, then_branch);
            if let Some(else_branch) = else_branch {
                resolve_body_stmt(resolver, else_branch);
            }
        }
        Stmt::Switch(node) => {
            resolve_switch(resolver, node);
        }
        Stmt::LocalDecl { init, .. } => {
            if let Some(init) = init {
                resolver.resolve_expr(init, ExprContext::Plain);
            }
        }
        Stmt::Break { .. } => {}
        Stmt::Return { value, .. } => {
            if let Some(value) = value {
                resolver.resolve_expr(value, ExprContext::Plain);
            }
        }
        Stmt::Yield { value, .. } => {
            resolver.resolve_expr(value, ExprContext::Plain);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use javelin_core::ast::{PatternBinding, PatternKind, SwitchArm};
    use javelin_core::binding::{MethodBinding, TypeBinding};
    use javelin_core::registry::BindingRegistry;

    fn lit(arena: &Bump, id: u32, value: Constant) -> &Expr<'_> {
        arena.alloc(Expr::new(id, Span::point(1, 1), ExprKind::Literal(value)))
    }

    fn local<'a>(arena: &'a Bump, id: u32, ty: TypeHash) -> &'a Expr<'a> {
        arena.alloc(Expr::new(
            id,
            Span::point(1, 1),
            ExprKind::Local {
                local: 0,
                name: "v",
                ty,
            },
        ))
    }

    fn arrow_arm<'a>(arena: &'a Bump, labels: Vec<CaseLabel<'a>>, body_expr: &'a Expr<'a>) -> SwitchArm<'a> {
        SwitchArm {
            labels: arena.alloc_slice_fill_iter(labels),
            body: arena.alloc_slice_fill_iter([Stmt::Expr(body_expr)]),
            is_arrow: true,
            span: Span::point(2, 1),
        }
    }

    fn statement_switch<'a>(
        arena: &'a Bump,
        id: u32,
        selector: &'a Expr<'a>,
        arms: Vec<SwitchArm<'a>>,
    ) -> &'a SwitchNode<'a> {
        arena.alloc(SwitchNode {
            id,
            span: Span::point(1, 1),
            kind: SwitchKind::Statement,
            selector,
            arms: arena.alloc_slice_fill_iter(arms),
        })
    }

    #[test]
    fn dense_int_labels_pick_tableswitch() {
        let arena = Bump::new();
        let registry = BindingRegistry::with_jdk_defaults();
        let mut resolver = Resolver::new(&registry);

        let selector = local(&arena, 0, well_known::INT);
        let arms = (0..4)
            .map(|i| {
                let label = lit(&arena, 10 + i, Constant::Int(i as i32));
                let body = lit(&arena, 20 + i, Constant::Int(0));
                arrow_arm(&arena, vec![CaseLabel::Constant(label)], body)
            })
            .collect();
        let node = statement_switch(&arena, 1, selector, arms);

        let plan = resolve_switch(&mut resolver, node);
        assert_eq!(plan.strategy, SwitchStrategy::IntTable { low: 0, high: 3 });
        assert_eq!(plan.constants.len(), 4);
        assert!(resolver.reporter.is_empty());
    }

    #[test]
    fn sparse_int_labels_pick_lookupswitch() {
        let arena = Bump::new();
        let registry = BindingRegistry::with_jdk_defaults();
        let mut resolver = Resolver::new(&registry);

        let selector = local(&arena, 0, well_known::INT);
        let arms = [1, 1000, 1_000_000]
            .iter()
            .enumerate()
            .map(|(i, &k)| {
                let label = lit(&arena, 10 + i as u32, Constant::Int(k));
                let body = lit(&arena, 20 + i as u32, Constant::Int(0));
                arrow_arm(&arena, vec![CaseLabel::Constant(label)], body)
            })
            .collect();
        let node = statement_switch(&arena, 1, selector, arms);

        let plan = resolve_switch(&mut resolver, node);
        assert_eq!(plan.strategy, SwitchStrategy::IntLookup);
    }

    #[test]
    fn duplicate_constant_label_is_reported_once() {
        let arena = Bump::new();
        let registry = BindingRegistry::with_jdk_defaults();
        let mut resolver = Resolver::new(&registry);

        let selector = local(&arena, 0, well_known::INT);
        let a = lit(&arena, 1, Constant::Int(7));
        let b = lit(&arena, 2, Constant::Int(7));
        let body_a = lit(&arena, 3, Constant::Int(0));
        let body_b = lit(&arena, 4, Constant::Int(0));
        let arms = vec![
            arrow_arm(&arena, vec![CaseLabel::Constant(a)], body_a),
            arrow_arm(&arena, vec![CaseLabel::Constant(b)], body_b),
        ];
        let node = statement_switch(&arena, 5, selector, arms);

        resolve_switch(&mut resolver, node);
        assert!(matches!(
            resolver.reporter.iter().next(),
            Some(Diagnostic::ConstantCaseDuplicated { .. })
        ));
    }

    #[test]
    fn char_label_widens_to_the_int_key() {
        let arena = Bump::new();
        let registry = BindingRegistry::with_jdk_defaults();
        let mut resolver = Resolver::new(&registry);

        let selector = local(&arena, 0, well_known::CHAR);
        let label = lit(&arena, 1, Constant::Char('A'));
        let body = lit(&arena, 2, Constant::Int(0));
        let node = statement_switch(
            &arena,
            3,
            selector,
            vec![arrow_arm(&arena, vec![CaseLabel::Constant(label)], body)],
        );

        let plan = resolve_switch(&mut resolver, node);
        assert_eq!(plan.constants[0].value, Constant::Int(65));
    }

    #[test]
    fn string_label_on_int_selector_is_incompatible() {
        let arena = Bump::new();
        let registry = BindingRegistry::with_jdk_defaults();
        let mut resolver = Resolver::new(&registry);

        let selector = local(&arena, 0, well_known::INT);
        let label = lit(&arena, 1, Constant::Str("nope".to_string()));
        let body = lit(&arena, 2, Constant::Int(0));
        let node = statement_switch(
            &arena,
            3,
            selector,
            vec![arrow_arm(&arena, vec![CaseLabel::Constant(label)], body)],
        );

        resolve_switch(&mut resolver, node);
        assert!(matches!(
            resolver.reporter.iter().next(),
            Some(Diagnostic::CaseTypeIncompatible { .. })
        ));
    }

    #[test]
    fn non_constant_label_is_reported() {
        let arena = Bump::new();
        let registry = BindingRegistry::with_jdk_defaults();
        let mut resolver = Resolver::new(&registry);

        let selector = local(&arena, 0, well_known::INT);
        let label = local(&arena, 1, well_known::INT);
        let body = lit(&arena, 2, Constant::Int(0));
        let node = statement_switch(
            &arena,
            3,
            selector,
            vec![arrow_arm(&arena, vec![CaseLabel::Constant(label)], body)],
        );

        resolve_switch(&mut resolver, node);
        assert!(matches!(
            resolver.reporter.iter().next(),
            Some(Diagnostic::NonConstantCaseLabel { .. })
        ));
    }

    #[test]
    fn enum_switch_missing_constant_is_reported() {
        let arena = Bump::new();
        let mut registry = BindingRegistry::with_jdk_defaults();
        let color =
            registry.register_type(TypeBinding::enumeration("Color", &["RED", "GREEN", "BLUE"]));
        let mut resolver = Resolver::new(&registry);

        let selector = local(&arena, 0, color);
        let red = lit(&arena, 1, Constant::Str("RED".to_string()));
        let green = lit(&arena, 2, Constant::Str("GREEN".to_string()));
        let body_a = lit(&arena, 3, Constant::Int(0));
        let body_b = lit(&arena, 4, Constant::Int(0));
        let node = arena.alloc(SwitchNode {
            id: 5,
            span: Span::point(1, 1),
            kind: SwitchKind::Expression,
            selector,
            arms: arena.alloc_slice_fill_iter([
                arrow_arm(&arena, vec![CaseLabel::Constant(red)], body_a),
                arrow_arm(&arena, vec![CaseLabel::Constant(green)], body_b),
            ]),
        });

        let plan = resolve_switch(&mut resolver, node);
        assert_eq!(plan.strategy, SwitchStrategy::EnumOrdinal);
        assert!(matches!(
            resolver.reporter.iter().next(),
            Some(Diagnostic::MissingEnumConstant { constant, .. }) if constant == "BLUE"
        ));
    }

    #[test]
    fn pattern_switch_selects_type_dispatch() {
        let arena = Bump::new();
        let mut registry = BindingRegistry::with_jdk_defaults();
        let circle = registry.register_type(TypeBinding::class("Circle"));
        let shape = registry.register_type(TypeBinding::interface("Shape").sealed(&[circle]));
        let mut resolver = Resolver::new(&registry);

        let selector = local(&arena, 0, shape);
        let pattern = arena.alloc(javelin_core::ast::Pattern {
            id: 1,
            span: Span::point(2, 6),
            index: 0,
            kind: PatternKind::Type {
                ty: Some(circle),
                binding: Some(PatternBinding { local: 1, name: "c" }),
            },
        });
        let body = lit(&arena, 2, Constant::Int(0));
        let node = statement_switch(
            &arena,
            3,
            selector,
            vec![arrow_arm(&arena, vec![CaseLabel::Pattern(pattern)], body)],
        );

        let plan = resolve_switch(&mut resolver, node);
        assert_eq!(plan.strategy, SwitchStrategy::TypeSwitch);
        assert!(resolver.reporter.is_empty());
    }

    #[test]
    fn fallthrough_into_a_pattern_arm_is_illegal() {
        let arena = Bump::new();
        let mut registry = BindingRegistry::with_jdk_defaults();
        let circle = registry.register_type(TypeBinding::class("Circle"));
        let shape = registry.register_type(TypeBinding::interface("Shape").sealed(&[circle]));
        let mut resolver = Resolver::new(&registry);

        let selector = local(&arena, 0, shape);
        let pattern = arena.alloc(javelin_core::ast::Pattern {
            id: 1,
            span: Span::point(3, 6),
            index: 0,
            kind: PatternKind::Type {
                ty: Some(circle),
                binding: None,
            },
        });
        let first_body = lit(&arena, 2, Constant::Int(0));
        // colon arm without a trailing break, then a pattern arm
        let first = SwitchArm {
            labels: arena.alloc_slice_fill_iter([CaseLabel::Null(Span::point(2, 1))]),
            body: arena.alloc_slice_fill_iter([Stmt::Expr(first_body)]),
            is_arrow: false,
            span: Span::point(2, 1),
        };
        let second = SwitchArm {
            labels: arena.alloc_slice_fill_iter([CaseLabel::Pattern(pattern)]),
            body: &[],
            is_arrow: false,
            span: Span::point(3, 1),
        };
        let node = statement_switch(&arena, 4, selector, vec![first, second]);

        resolve_switch(&mut resolver, node);
        assert!(resolver.reporter.iter().any(|d| matches!(
            d,
            Diagnostic::IllegalFallthroughToPattern { .. }
        )));
    }

    #[test]
    fn dominated_pattern_and_unreachable_default() {
        let arena = Bump::new();
        let registry = BindingRegistry::with_jdk_defaults();
        let mut resolver = Resolver::new(&registry);

        let selector = local(&arena, 0, well_known::OBJECT);
        let object_pattern = arena.alloc(javelin_core::ast::Pattern {
            id: 1,
            span: Span::point(2, 6),
            index: 0,
            kind: PatternKind::Type {
                ty: Some(well_known::OBJECT),
                binding: None,
            },
        });
        let string_pattern = arena.alloc(javelin_core::ast::Pattern {
            id: 2,
            span: Span::point(3, 6),
            index: 1,
            kind: PatternKind::Type {
                ty: Some(well_known::STRING),
                binding: None,
            },
        });
        let b1 = lit(&arena, 3, Constant::Int(0));
        let b2 = lit(&arena, 4, Constant::Int(0));
        let b3 = lit(&arena, 5, Constant::Int(0));
        let node = statement_switch(
            &arena,
            6,
            selector,
            vec![
                arrow_arm(&arena, vec![CaseLabel::Pattern(object_pattern)], b1),
                arrow_arm(&arena, vec![CaseLabel::Pattern(string_pattern)], b2),
                arrow_arm(&arena, vec![CaseLabel::Default(Span::point(4, 1))], b3),
            ],
        );

        resolve_switch(&mut resolver, node);
        let kinds: Vec<_> = resolver.reporter.iter().collect();
        assert!(kinds
            .iter()
            .any(|d| matches!(d, Diagnostic::DominatedCaseLabel { .. })));
        assert!(kinds
            .iter()
            .any(|d| matches!(d, Diagnostic::UnreachableDefault { .. })));
    }

    #[test]
    fn switch_expression_takes_the_yielded_type() {
        let arena = Bump::new();
        let registry = BindingRegistry::with_jdk_defaults();
        let mut resolver = Resolver::new(&registry);

        let selector = local(&arena, 0, well_known::INT);
        let label = lit(&arena, 1, Constant::Int(1));
        let one = lit(&arena, 2, Constant::Str("one".to_string()));
        let other = lit(&arena, 3, Constant::Str("other".to_string()));
        let node = arena.alloc(SwitchNode {
            id: 4,
            span: Span::point(1, 1),
            kind: SwitchKind::Expression,
            selector,
            arms: arena.alloc_slice_fill_iter([
                arrow_arm(&arena, vec![CaseLabel::Constant(label)], one),
                arrow_arm(&arena, vec![CaseLabel::Default(Span::point(3, 1))], other),
            ]),
        });

        let plan = resolve_switch(&mut resolver, node);
        assert_eq!(plan.result, Some(well_known::STRING));
        assert!(resolver.reporter.is_empty());
    }

    #[test]
    fn switch_expression_arms_must_agree_on_a_type() {
        let arena = Bump::new();
        let registry = BindingRegistry::with_jdk_defaults();
        let mut resolver = Resolver::new(&registry);

        let selector = local(&arena, 0, well_known::INT);
        let label = lit(&arena, 1, Constant::Int(1));
        let one = lit(&arena, 2, Constant::Str("one".to_string()));
        let other = lit(&arena, 3, Constant::Int(0));
        let node = arena.alloc(SwitchNode {
            id: 4,
            span: Span::point(1, 1),
            kind: SwitchKind::Expression,
            selector,
            arms: arena.alloc_slice_fill_iter([
                arrow_arm(&arena, vec![CaseLabel::Constant(label)], one),
                arrow_arm(&arena, vec![CaseLabel::Default(Span::point(3, 1))], other),
            ]),
        });

        let plan = resolve_switch(&mut resolver, node);
        // the first arm picks the type; the int arm cannot join it
        assert_eq!(plan.result, Some(well_known::STRING));
        assert!(resolver.reporter.iter().any(|d| matches!(
            d,
            Diagnostic::MismatchedSwitchArmType { expected, found, .. }
                if expected == "java.lang.String" && found == "int"
        )));
    }

    #[test]
    fn legacy_overloaded_selector_uses_switch_methods() {
        let arena = Bump::new();
        let mut registry = BindingRegistry::with_jdk_defaults();
        let mode = registry.register_type(TypeBinding::class("Mode"));
        registry.register_method(MethodBinding::instance(
            mode,
            crate::overload::SWITCH_METHOD,
            &[well_known::INT],
            well_known::BOOLEAN,
        ));
        let mut resolver = Resolver::new(&registry);

        let selector = local(&arena, 0, mode);
        let label = lit(&arena, 1, Constant::Int(1));
        let body = lit(&arena, 2, Constant::Int(0));
        let node = statement_switch(
            &arena,
            3,
            selector,
            vec![arrow_arm(&arena, vec![CaseLabel::Constant(label)], body)],
        );

        let plan = resolve_switch(&mut resolver, node);
        assert_eq!(plan.strategy, SwitchStrategy::Overload);
        assert!(plan.constants[0].overload.is_some());
        assert!(resolver.reporter.is_empty());
    }
}
