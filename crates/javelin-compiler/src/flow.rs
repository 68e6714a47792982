//! Definite-assignment and abrupt-exit analysis.
//!
//! Runs over resolved trees, after [`crate::resolve::Resolver`] has been
//! dismantled with [`crate::resolve::Resolver::into_parts`], because this
//! pass is the one place the registry mutates post-setup: private operator
//! methods reached from another class get their synthetic accessor
//! registered here.
//!
//! Assignment state is a bitset over [`LocalId`]. Conditionally executed
//! code (the right side of `&&`/`||`, branch arms) analyzes against a
//! snapshot, and only assignments common to every path survive the merge.

use rustc_hash::FxHashMap;

use javelin_core::ast::{BinaryOp, CaseLabel, Expr, ExprKind, LocalId, NodeId, Pattern,
    PatternKind, Stmt, SwitchKind, SwitchNode, UnaryOp};
use javelin_core::diagnostics::{Diagnostic, ProblemReporter};
use javelin_core::registry::BindingRegistry;
use javelin_core::span::Span;

use crate::conversion::OperationShape;
use crate::resolve::{ExprInfo, ExprShape};

/// Ways an expression can complete abruptly at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    /// Integral division or remainder by a value not known non-zero.
    ArithmeticException,
    /// Unboxing a wrapper that may be null.
    NullPointerUnboxing,
    /// Indexing an array with an unchecked index.
    IndexOutOfBounds,
    /// Dispatching a method on a possibly-null receiver.
    NullDereference,
}

/// A recorded potential abrupt exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbruptExit {
    pub kind: ExitKind,
    pub span: Span,
}

/// Definite-assignment bitset, one bit per [`LocalId`].
#[derive(Debug, Clone, Default, PartialEq)]
struct AssignSet {
    words: Vec<u64>,
}

impl AssignSet {
    fn set(&mut self, local: LocalId) {
        let word = (local / 64) as usize;
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1 << (local % 64);
    }

    fn contains(&self, local: LocalId) -> bool {
        let word = (local / 64) as usize;
        self.words
            .get(word)
            .is_some_and(|w| w & (1 << (local % 64)) != 0)
    }

    /// Keep only assignments present in both sets.
    fn intersect(&mut self, other: &AssignSet) {
        for (i, word) in self.words.iter_mut().enumerate() {
            *word &= other.words.get(i).copied().unwrap_or(0);
        }
    }
}

/// The flow analysis pass for one method body.
pub struct FlowContext<'r> {
    registry: &'r mut BindingRegistry,
    pub reporter: ProblemReporter,
    table: FxHashMap<NodeId, ExprInfo>,
    assigned: AssignSet,
    exits: Vec<AbruptExit>,
}

impl<'r> FlowContext<'r> {
    pub fn new(
        registry: &'r mut BindingRegistry,
        table: FxHashMap<NodeId, ExprInfo>,
        reporter: ProblemReporter,
    ) -> Self {
        Self {
            registry,
            reporter,
            table,
            assigned: AssignSet::default(),
            exits: Vec::new(),
        }
    }

    /// Mark a local definitely assigned (parameters, pattern bindings).
    pub fn mark_assigned(&mut self, local: LocalId) {
        self.assigned.set(local);
    }

    pub fn is_assigned(&self, local: LocalId) -> bool {
        self.assigned.contains(local)
    }

    /// Potential abrupt exits recorded so far, in evaluation order.
    pub fn exits(&self) -> &[AbruptExit] {
        &self.exits
    }

    /// Dismantle the pass, handing the side table and the diagnostics
    /// collected so far on to code generation.
    pub fn into_parts(self) -> (FxHashMap<NodeId, ExprInfo>, ProblemReporter) {
        (self.table, self.reporter)
    }

    fn info(&self, id: NodeId) -> Option<ExprInfo> {
        self.table.get(&id).cloned()
    }

    fn record_exit(&mut self, kind: ExitKind, span: Span) {
        self.exits.push(AbruptExit { kind, span });
    }

    /// Register the synthetic accessor a private operator method needs when
    /// called from outside its class.
    fn materialize_accessor(&mut self, shape: &ExprShape) {
        if let ExprShape::Overload(target) = shape
            && target.is_private
        {
            self.registry.ensure_accessor_for(target.method);
        }
    }

    pub fn analyze_stmt(&mut self, stmt: &Stmt<'_>) {
        match stmt {
            Stmt::Expr(expr) => self.analyze_expr(expr),
            Stmt::Block(stmts) => {
                for s in *stmts {
                    self.analyze_stmt(s);
                }
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                self.analyze_expr(cond);
                let before = self.assigned.clone();
                self.analyze_stmt(then_branch);
                let after_then = std::mem::replace(&mut self.assigned, before);
                match else_branch {
                    Some(else_branch) => {
                        self.analyze_stmt(else_branch);
                        // definitely assigned only if both arms assign
                        self.assigned.intersect(&after_then);
                    }
                    None => {}
                }
            }
            Stmt::Switch(node) => self.analyze_switch(node),
            Stmt::LocalDecl { local, init, .. } => {
                if let Some(init) = init {
                    self.analyze_expr(init);
                    self.assigned.set(*local);
                }
            }
            Stmt::Break { .. } => {}
            Stmt::Return { value, .. } => {
                if let Some(value) = value {
                    self.analyze_expr(value);
                }
            }
            Stmt::Yield { value, .. } => self.analyze_expr(value),
        }
    }

    fn analyze_switch(&mut self, node: &SwitchNode<'_>) {
        self.analyze_expr(node.selector);
        // Each arm analyzes from the pre-switch state; arms that bind
        // pattern variables see them as assigned.
        let before = self.assigned.clone();
        let mut common: Option<AssignSet> = None;
        for arm in node.arms {
            self.assigned = before.clone();
            for label in arm.labels {
                match label {
                    CaseLabel::Constant(expr) => self.analyze_expr(expr),
                    CaseLabel::Pattern(pattern) => self.analyze_pattern(pattern),
                    CaseLabel::Null(_) | CaseLabel::Default(_) => {}
                }
            }
            for stmt in arm.body {
                self.analyze_stmt(stmt);
            }
            let after = std::mem::replace(&mut self.assigned, before.clone());
            match common.as_mut() {
                Some(common) => common.intersect(&after),
                None => common = Some(after),
            }
        }
        self.assigned = before;
        // When some arm is guaranteed to run, assignments common to every
        // arm survive the switch. A `default` label guarantees it, as does
        // expression position, where resolution requires exhaustiveness.
        let guaranteed = node.kind == SwitchKind::Expression
            || node.arms.iter().any(|arm| {
                arm.labels
                    .iter()
                    .any(|label| matches!(label, CaseLabel::Default(_)))
            });
        if guaranteed && let Some(common) = common {
            self.assigned = common;
        }
    }

    fn analyze_pattern(&mut self, pattern: &Pattern<'_>) {
        match &pattern.kind {
            PatternKind::Type { binding, .. } => {
                if let Some(binding) = binding {
                    self.assigned.set(binding.local);
                }
            }
            PatternKind::Record { components, .. } => {
                for component in *components {
                    self.analyze_pattern(component);
                }
            }
            PatternKind::Guarded { inner, guard } => {
                self.analyze_pattern(inner);
                // guard runs with the pattern's bindings in scope
                self.analyze_expr(guard);
            }
        }
    }

    pub fn analyze_expr(&mut self, expr: &Expr<'_>) {
        let info = self.info(expr.id);
        match &expr.kind {
            ExprKind::Literal(_) | ExprKind::Null => {}
            ExprKind::Local { local, name, .. } => {
                if !self.assigned.contains(*local) {
                    self.reporter.report(Diagnostic::UninitializedLocal {
                        name: (*name).to_string(),
                        span: expr.span,
                    });
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                self.analyze_binary(expr, *op, lhs, rhs, info.as_ref());
            }
            ExprKind::Unary { op, operand } => {
                self.analyze_unary(*op, operand, info.as_ref());
            }
            ExprKind::Assign { target, value, .. } => {
                // target subexpressions, then the value, then the store
                self.analyze_assign_target_reads(target);
                self.analyze_expr(value);
                if let ExprKind::Local { local, .. } = target.kind {
                    self.assigned.set(local);
                }
            }
            ExprKind::ArrayRef { array, index } => {
                self.analyze_expr(array);
                self.analyze_expr(index);
                if let Some(ExprInfo {
                    shape: ExprShape::ArrayIndex { .. },
                    ..
                }) = info
                {
                    self.record_exit(ExitKind::NullDereference, array.span);
                    self.record_exit(ExitKind::IndexOutOfBounds, index.span);
                } else {
                    self.record_exit(ExitKind::NullDereference, array.span);
                }
            }
            ExprKind::Call { receiver, args, .. } => {
                self.analyze_expr(receiver);
                self.record_exit(ExitKind::NullDereference, receiver.span);
                for arg in *args {
                    self.analyze_expr(arg);
                }
            }
            ExprKind::Cast { operand, .. } => self.analyze_expr(operand),
            ExprKind::Switch(node) => self.analyze_switch(node),
        }
    }

    fn analyze_binary(
        &mut self,
        expr: &Expr<'_>,
        op: BinaryOp,
        lhs: &Expr<'_>,
        rhs: &Expr<'_>,
        info: Option<&ExprInfo>,
    ) {
        // A folded node never evaluates its operands at runtime.
        if matches!(info.map(|i| &i.shape), Some(ExprShape::Folded)) {
            return;
        }

        self.analyze_expr(lhs);
        if op.is_logical() {
            // The right side runs conditionally; its assignments don't
            // count afterwards.
            let before = self.assigned.clone();
            self.analyze_expr(rhs);
            self.assigned = before;
            return;
        }
        self.analyze_expr(rhs);

        let Some(info) = info else { return };
        match &info.shape {
            ExprShape::Binary(OperationShape::Primitive {
                kind, left, right, ..
            }) => {
                if left.unbox {
                    self.record_exit(ExitKind::NullPointerUnboxing, lhs.span);
                }
                if right.unbox {
                    self.record_exit(ExitKind::NullPointerUnboxing, rhs.span);
                }
                if matches!(op, BinaryOp::Div | BinaryOp::Rem)
                    && kind.is_integral()
                    && !self
                        .info(rhs.id)
                        .and_then(|i| i.constant)
                        .is_some_and(|c| !c.is_integral_zero())
                {
                    self.record_exit(ExitKind::ArithmeticException, expr.span);
                }
            }
            shape @ ExprShape::Overload(_) => {
                self.record_exit(ExitKind::NullDereference, expr.span);
                self.materialize_accessor(shape);
            }
            _ => {}
        }
    }

    fn analyze_unary(&mut self, _op: UnaryOp, operand: &Expr<'_>, info: Option<&ExprInfo>) {
        if matches!(info.map(|i| &i.shape), Some(ExprShape::Folded)) {
            return;
        }
        self.analyze_expr(operand);
        let Some(info) = info else { return };
        match &info.shape {
            ExprShape::Unary(shape) => {
                if shape.operand.unbox {
                    self.record_exit(ExitKind::NullPointerUnboxing, operand.span);
                }
            }
            shape @ ExprShape::Overload(_) => {
                self.record_exit(ExitKind::NullDereference, operand.span);
                self.materialize_accessor(shape);
            }
            _ => {}
        }
    }

    /// Reads performed by an assignment target before the store: an
    /// indexed target evaluates its receiver and index.
    fn analyze_assign_target_reads(&mut self, target: &Expr<'_>) {
        if let ExprKind::ArrayRef { array, index } = &target.kind {
            self.analyze_expr(array);
            self.analyze_expr(index);
            self.record_exit(ExitKind::NullDereference, array.span);
            if matches!(
                self.info(target.id).map(|i| i.shape),
                Some(ExprShape::ArrayIndex { .. })
            ) {
                self.record_exit(ExitKind::IndexOutOfBounds, index.span);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use javelin_core::binding::{MethodBinding, TypeBinding, Visibility};
    use javelin_core::constant::Constant;
    use javelin_core::hash::{TypeHash, well_known};
    use javelin_core::span::Span;

    use crate::resolve::{ExprContext, Resolver};

    fn local<'a>(arena: &'a Bump, id: NodeId, local: LocalId, ty: TypeHash) -> &'a Expr<'a> {
        arena.alloc(Expr::new(
            id,
            Span::point(1, 1),
            ExprKind::Local {
                local,
                name: "v",
                ty,
            },
        ))
    }

    fn resolved<'a>(
        registry: &mut BindingRegistry,
        exprs: &[&Expr<'a>],
    ) -> (FxHashMap<NodeId, ExprInfo>, ProblemReporter) {
        let mut resolver = Resolver::new(registry);
        for expr in exprs {
            resolver.resolve_expr(expr, ExprContext::Plain);
        }
        resolver.into_parts()
    }

    #[test]
    fn read_before_assignment_is_reported() {
        let arena = Bump::new();
        let mut registry = BindingRegistry::with_jdk_defaults();
        let read = local(&arena, 0, 3, well_known::INT);
        let (table, reporter) = resolved(&mut registry, &[read]);

        let mut flow = FlowContext::new(&mut registry, table, reporter);
        flow.analyze_expr(read);
        assert!(matches!(
            flow.reporter.iter().next(),
            Some(Diagnostic::UninitializedLocal { .. })
        ));
    }

    #[test]
    fn short_circuit_rhs_assignment_does_not_count() {
        let arena = Bump::new();
        let mut registry = BindingRegistry::with_jdk_defaults();

        // a && (b = true) ... read of b afterwards is still uninitialized
        let a = local(&arena, 0, 0, well_known::BOOLEAN);
        let b_target = local(&arena, 1, 1, well_known::BOOLEAN);
        let truth = arena.alloc(Expr::new(
            2,
            Span::point(1, 8),
            ExprKind::Literal(Constant::Bool(true)),
        ));
        let assign = arena.alloc(Expr::new(
            3,
            Span::new(1, 6, 8),
            ExprKind::Assign {
                op: None,
                target: b_target,
                value: truth,
            },
        ));
        let and = arena.alloc(Expr::new(
            4,
            Span::new(1, 1, 12),
            ExprKind::Binary {
                op: BinaryOp::And,
                lhs: a,
                rhs: assign,
            },
        ));
        let read_b = local(&arena, 5, 1, well_known::BOOLEAN);
        let (table, reporter) = resolved(&mut registry, &[and, read_b]);

        let mut flow = FlowContext::new(&mut registry, table, reporter);
        flow.mark_assigned(0);
        flow.analyze_expr(and);
        let before = flow.reporter.len();
        flow.analyze_expr(read_b);
        assert_eq!(flow.reporter.len(), before + 1);
    }

    #[test]
    fn both_if_arms_assigning_counts() {
        let arena = Bump::new();
        let mut registry = BindingRegistry::with_jdk_defaults();

        let cond = local(&arena, 0, 0, well_known::BOOLEAN);
        fn store<'a>(arena: &'a Bump, base: NodeId, value: i32) -> &'a Stmt<'a> {
            let target = arena.alloc(Expr::new(
                base,
                Span::point(2, 1),
                ExprKind::Local {
                    local: 1,
                    name: "x",
                    ty: well_known::INT,
                },
            ));
            let value = arena.alloc(Expr::new(
                base + 1,
                Span::point(2, 5),
                ExprKind::Literal(Constant::Int(value)),
            ));
            let assign = arena.alloc(Expr::new(
                base + 2,
                Span::new(2, 1, 5),
                ExprKind::Assign {
                    op: None,
                    target,
                    value,
                },
            ));
            arena.alloc(Stmt::Expr(assign))
        }
        let then_branch = store(&arena, 1, 1);
        let else_branch = store(&arena, 4, 2);
        let read_x = local(&arena, 7, 1, well_known::INT);
        let (table, reporter) = resolved(&mut registry, &[cond, read_x]);

        let mut flow = FlowContext::new(&mut registry, table, reporter);
        flow.mark_assigned(0);
        flow.analyze_stmt(&Stmt::If {
            span: Span::point(1, 1),
            cond,
            then_branch,
            else_branch: Some(else_branch),
        });
        assert!(flow.is_assigned(1));
        flow.analyze_expr(read_x);
        assert!(flow.reporter.is_empty());
    }

    fn assign_arm<'a>(
        arena: &'a Bump,
        base: NodeId,
        labels: Vec<CaseLabel<'a>>,
        value: i32,
    ) -> javelin_core::ast::SwitchArm<'a> {
        let target = arena.alloc(Expr::new(
            base,
            Span::point(2, 1),
            ExprKind::Local {
                local: 1,
                name: "x",
                ty: well_known::INT,
            },
        ));
        let value = arena.alloc(Expr::new(
            base + 1,
            Span::point(2, 5),
            ExprKind::Literal(Constant::Int(value)),
        ));
        let assign = arena.alloc(Expr::new(
            base + 2,
            Span::new(2, 1, 5),
            ExprKind::Assign {
                op: None,
                target,
                value,
            },
        ));
        javelin_core::ast::SwitchArm {
            labels: arena.alloc_slice_fill_iter(labels),
            body: arena.alloc_slice_fill_iter([Stmt::Expr(assign)]),
            is_arrow: true,
            span: Span::point(2, 1),
        }
    }

    #[test]
    fn switch_with_default_assigning_in_every_arm_counts() {
        let arena = Bump::new();
        let mut registry = BindingRegistry::with_jdk_defaults();

        let selector = local(&arena, 0, 0, well_known::INT);
        let zero_label = arena.alloc(Expr::new(
            1,
            Span::point(2, 1),
            ExprKind::Literal(Constant::Int(0)),
        ));
        let node = SwitchNode {
            id: 8,
            span: Span::point(1, 1),
            kind: SwitchKind::Statement,
            selector,
            arms: arena.alloc_slice_fill_iter([
                assign_arm(&arena, 2, vec![CaseLabel::Constant(zero_label)], 1),
                assign_arm(&arena, 5, vec![CaseLabel::Default(Span::point(3, 1))], 2),
            ]),
        };
        let read_x = local(&arena, 9, 1, well_known::INT);
        let (table, reporter) = resolved(&mut registry, &[selector, read_x]);

        let mut flow = FlowContext::new(&mut registry, table, reporter);
        flow.mark_assigned(0);
        flow.analyze_switch(&node);
        assert!(flow.is_assigned(1));
        flow.analyze_expr(read_x);
        assert!(flow.reporter.is_empty());
    }

    #[test]
    fn switch_without_default_leaves_the_local_unassigned() {
        let arena = Bump::new();
        let mut registry = BindingRegistry::with_jdk_defaults();

        let selector = local(&arena, 0, 0, well_known::INT);
        let zero_label = arena.alloc(Expr::new(
            1,
            Span::point(2, 1),
            ExprKind::Literal(Constant::Int(0)),
        ));
        let one_label = arena.alloc(Expr::new(
            2,
            Span::point(3, 1),
            ExprKind::Literal(Constant::Int(1)),
        ));
        let node = SwitchNode {
            id: 9,
            span: Span::point(1, 1),
            kind: SwitchKind::Statement,
            selector,
            arms: arena.alloc_slice_fill_iter([
                assign_arm(&arena, 3, vec![CaseLabel::Constant(zero_label)], 1),
                assign_arm(&arena, 6, vec![CaseLabel::Constant(one_label)], 2),
            ]),
        };
        let (table, reporter) = resolved(&mut registry, &[selector]);

        let mut flow = FlowContext::new(&mut registry, table, reporter);
        flow.mark_assigned(0);
        flow.analyze_switch(&node);
        // the selector may match neither label
        assert!(!flow.is_assigned(1));
    }

    #[test]
    fn integral_division_records_a_potential_exit() {
        let arena = Bump::new();
        let mut registry = BindingRegistry::with_jdk_defaults();
        let lhs = local(&arena, 0, 0, well_known::INT);
        let rhs = local(&arena, 1, 1, well_known::INT);
        let div = arena.alloc(Expr::new(
            2,
            Span::new(1, 1, 5),
            ExprKind::Binary {
                op: BinaryOp::Div,
                lhs,
                rhs,
            },
        ));
        let (table, reporter) = resolved(&mut registry, &[div]);

        let mut flow = FlowContext::new(&mut registry, table, reporter);
        flow.mark_assigned(0);
        flow.mark_assigned(1);
        flow.analyze_expr(div);
        assert!(flow
            .exits()
            .iter()
            .any(|e| e.kind == ExitKind::ArithmeticException));
    }

    #[test]
    fn nonzero_constant_divisor_records_no_exit() {
        let arena = Bump::new();
        let mut registry = BindingRegistry::with_jdk_defaults();
        let lhs = local(&arena, 0, 0, well_known::INT);
        let rhs = arena.alloc(Expr::new(
            1,
            Span::point(1, 5),
            ExprKind::Literal(Constant::Int(4)),
        ));
        let div = arena.alloc(Expr::new(
            2,
            Span::new(1, 1, 5),
            ExprKind::Binary {
                op: BinaryOp::Div,
                lhs,
                rhs,
            },
        ));
        let (table, reporter) = resolved(&mut registry, &[div]);

        let mut flow = FlowContext::new(&mut registry, table, reporter);
        flow.mark_assigned(0);
        flow.analyze_expr(div);
        assert!(flow.exits().is_empty());
    }

    #[test]
    fn private_overload_target_gets_an_accessor() {
        let arena = Bump::new();
        let mut registry = BindingRegistry::with_jdk_defaults();
        let vec2 = registry.register_type(TypeBinding::class("Vec2"));
        registry.register_method(
            MethodBinding::instance(vec2, "add", &[vec2], vec2)
                .with_visibility(Visibility::Private),
        );

        let lhs = local(&arena, 0, 0, vec2);
        let rhs = local(&arena, 1, 1, vec2);
        let add = arena.alloc(Expr::new(
            2,
            Span::new(1, 1, 5),
            ExprKind::Binary {
                op: BinaryOp::Add,
                lhs,
                rhs,
            },
        ));
        let (table, reporter) = resolved(&mut registry, &[add]);
        assert_eq!(registry.accessor_count(), 0);

        let mut flow = FlowContext::new(&mut registry, table, reporter);
        flow.mark_assigned(0);
        flow.mark_assigned(1);
        flow.analyze_expr(add);
        drop(flow);
        assert_eq!(registry.accessor_count(), 1);
    }
}
