//! Statement compilation.
//!
//! [`StmtCompiler`] drives code generation for statement trees, including
//! the full switch lowering: selector dispatch per [`SwitchStrategy`], arm
//! placement, pattern bindings with guard retries, and the value join of
//! switch expressions. Expressions inside statements go through
//! [`ExprGenerator`]; switches need the [`SwitchPlan`] recorded during
//! resolution, supplied to the generator via its `plans` table.

mod if_stmt;
mod legacy_switch;

use javelin_core::ast::{
    CaseLabel, Pattern, PatternKind, Stmt, SwitchKind, SwitchNode,
};
use javelin_core::constant::Constant;
use javelin_core::hash::{TypeHash, well_known};

use crate::codegen::expr::ExprGenerator;
use crate::codegen::{JumpLabel, OpCode, ValueKind};
use crate::switch::dispatch::{
    SwitchSites, TypeSwitchDispatch, emit_lookup_switch, emit_string_dispatch, emit_table_switch,
    emit_type_switch,
};
use crate::switch::{SwitchPlan, SwitchStrategy, arm_value};

/// Compiles statements through a borrowed expression generator.
pub struct StmtCompiler<'g, 'a, 'pool> {
    pub generator: &'g mut ExprGenerator<'a, 'pool>,
    /// Per enclosing switch expression: jumps of produced values to the
    /// join point.
    value_joins: Vec<Vec<JumpLabel>>,
}

impl<'g, 'a, 'pool> StmtCompiler<'g, 'a, 'pool> {
    pub fn new(generator: &'g mut ExprGenerator<'a, 'pool>) -> Self {
        Self {
            generator,
            value_joins: Vec::new(),
        }
    }

    pub fn compile_all(&mut self, stmts: &[Stmt<'_>]) {
        for stmt in stmts {
            self.compile(stmt);
        }
    }

    pub fn compile(&mut self, stmt: &Stmt<'_>) {
        self.generator.emitter.set_line(stmt.span().line);
        match stmt {
            Stmt::Expr(expr) => self.generator.generate(expr, false),
            Stmt::Block(stmts) => self.compile_all(stmts),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => if_stmt::compile_if(self, cond, then_branch, *else_branch),
            Stmt::Switch(node) => self.compile_switch(node),
            Stmt::LocalDecl {
                local, ty, init, ..
            } => {
                if let Some(init) = init {
                    self.generator.generate(init, true);
                    let kind = self.generator.kind_of(Some(*ty));
                    self.generator.emitter.emit_store_local(*local, kind);
                }
            }
            Stmt::Break { .. } => {
                self.generator.emitter.emit_break();
            }
            Stmt::Return { value, .. } => self.compile_return(*value),
            Stmt::Yield { value, .. } => {
                self.generator.generate(value, true);
                let jump = self.generator.emitter.emit_jump(OpCode::Goto);
                match self.value_joins.last_mut() {
                    Some(joins) => joins.push(jump),
                    // yield outside a switch expression was already
                    // diagnosed; keep the chunk well-formed
                    None => self.generator.emitter.patch_jump(jump),
                }
            }
        }
    }

    fn compile_return(&mut self, value: Option<&javelin_core::ast::Expr<'_>>) {
        let Some(value) = value else {
            self.generator.emitter.emit(OpCode::Return);
            return;
        };
        self.generator.generate(value, true);
        let op = match self.generator.result_kind(value) {
            ValueKind::Int => OpCode::IReturn,
            ValueKind::Long => OpCode::LReturn,
            ValueKind::Float => OpCode::FReturn,
            ValueKind::Double => OpCode::DReturn,
            ValueKind::Reference => OpCode::AReturn,
        };
        self.generator.emitter.emit(op);
    }

    // ======================================================================
    // Switch lowering
    // ======================================================================

    fn compile_switch(&mut self, node: &SwitchNode<'_>) {
        let Some(plan) = self
            .generator
            .plans
            .and_then(|plans| plans.get(&node.id))
            .cloned()
        else {
            return;
        };

        self.generator.emitter.enter_switch();
        let (shape, mut null_jump) = self.emit_dispatch(node, &plan);
        self.value_joins.push(Vec::new());

        for (index, arm) in node.arms.iter().enumerate() {
            self.generator.emitter.set_depth(0);
            self.patch_arm_entries(&shape, &plan, index);
            if plan.null_arm == Some(index)
                && let Some(jump) = null_jump.take()
            {
                self.generator.emitter.patch_jump(jump);
            }
            if let DispatchShape::Patterns(dispatch) = &shape {
                self.enter_pattern_arm(dispatch, arm.labels);
            }

            let produces = node.kind == SwitchKind::Expression
                && arm.is_arrow
                && arm_value(arm.body, true).is_some();
            for (position, stmt) in arm.body.iter().enumerate() {
                let last = position + 1 == arm.body.len();
                if last && produces && let Stmt::Expr(expr) = stmt {
                    // arrow arm value: produce it and jump to the join
                    self.generator.generate(expr, true);
                    let jump = self.generator.emitter.emit_jump(OpCode::Goto);
                    if let Some(joins) = self.value_joins.last_mut() {
                        joins.push(jump);
                    }
                } else {
                    self.compile(stmt);
                }
            }

            // arrow arms never fall through
            if arm.is_arrow && node.kind == SwitchKind::Statement && !body_exits(arm.body) {
                let jump = self.generator.emitter.emit_jump(OpCode::Goto);
                if let Some(joins) = self.value_joins.last_mut() {
                    joins.push(jump);
                }
            }
        }

        // an absent default falls out past the last arm
        match &shape {
            DispatchShape::Table(sites) => {
                if plan.default_arm.is_none() {
                    sites.patch_default_to_here(self.generator.emitter);
                }
                sites.patch_holes_to_default(self.generator.emitter);
            }
            DispatchShape::Patterns(dispatch) => {
                if plan.default_arm.is_none() {
                    dispatch.sites.patch_default_to_here(self.generator.emitter);
                }
                dispatch.sites.patch_holes_to_default(self.generator.emitter);
            }
            DispatchShape::Chain { default, .. } => {
                if plan.default_arm.is_none() {
                    self.generator.emitter.patch_jump(*default);
                }
            }
        }
        if let Some(jump) = null_jump {
            self.generator.emitter.patch_jump(jump);
        }

        let joins = self.value_joins.pop().unwrap_or_default();
        for jump in joins {
            self.generator.emitter.patch_jump(jump);
        }
        self.generator.emitter.exit_switch();

        let depth = match (node.kind, plan.result) {
            (SwitchKind::Expression, Some(ty)) => self.generator.kind_of(Some(ty)).slots(),
            _ => 0,
        };
        self.generator.emitter.set_depth(depth);
    }

    fn emit_dispatch(
        &mut self,
        node: &SwitchNode<'_>,
        plan: &SwitchPlan,
    ) -> (DispatchShape, Option<JumpLabel>) {
        match plan.strategy {
            SwitchStrategy::IntTable { low, high } => {
                self.generator.generate(node.selector, true);
                self.generator.emit_unbox(node.selector);
                let sites = emit_table_switch(self.generator.emitter, low, high);
                (DispatchShape::Table(sites), None)
            }
            SwitchStrategy::IntLookup => {
                self.generator.generate(node.selector, true);
                self.generator.emit_unbox(node.selector);
                let keys: Vec<i32> = plan
                    .constants
                    .iter()
                    .filter_map(|c| c.value.as_int())
                    .collect();
                let sites = emit_lookup_switch(self.generator.emitter, &keys);
                (DispatchShape::Table(sites), None)
            }
            SwitchStrategy::EnumOrdinal => {
                self.generator.generate(node.selector, true);
                if let Some(ty) = plan.selector {
                    self.generator
                        .emitter
                        .emit_invoke_virtual(TypeHash::for_method(ty, "ordinal", &[]), 0, 1);
                }
                let keys: Vec<i32> = plan
                    .constants
                    .iter()
                    .filter_map(|c| self.ordinal_key(plan, &c.value))
                    .collect();
                let sites = emit_lookup_switch(self.generator.emitter, &keys);
                (DispatchShape::Table(sites), None)
            }
            SwitchStrategy::StringHash => {
                self.generator.generate(node.selector, true);
                let slot = self.generator.emitter.alloc_temp(ValueKind::Reference);
                self.generator.emitter.emit_store_local(slot, ValueKind::Reference);
                let null_jump = plan.null_arm.map(|_| {
                    self.generator.emitter.emit_load_local(slot, ValueKind::Reference);
                    self.generator.emitter.emit_jump(OpCode::IfNull)
                });
                let strings: Vec<&str> = plan
                    .constants
                    .iter()
                    .filter_map(|c| match &c.value {
                        Constant::Str(s) => Some(s.as_str()),
                        _ => None,
                    })
                    .collect();
                let dispatch = emit_string_dispatch(
                    self.generator.emitter,
                    slot,
                    TypeHash::for_method(well_known::STRING, "hashCode", &[]),
                    TypeHash::for_method(well_known::STRING, "equals", &[well_known::OBJECT]),
                    &strings,
                );
                (DispatchShape::Table(dispatch.sites), null_jump)
            }
            SwitchStrategy::TypeSwitch => {
                self.generator.generate(node.selector, true);
                let slot = self.generator.emitter.alloc_temp(ValueKind::Reference);
                self.generator.emitter.emit_store_local(slot, ValueKind::Reference);
                let null_jump = plan.null_arm.map(|_| {
                    self.generator.emitter.emit_load_local(slot, ValueKind::Reference);
                    self.generator.emitter.emit_jump(OpCode::IfNull)
                });
                let restart = self.generator.emitter.alloc_temp(ValueKind::Int);
                let labels = plan.patterns.len() + plan.constants.len();
                let dispatch = emit_type_switch(
                    self.generator.emitter,
                    type_switch_bootstrap(),
                    slot,
                    restart,
                    labels,
                );
                (DispatchShape::Patterns(dispatch), null_jump)
            }
            SwitchStrategy::Overload => {
                let chain = legacy_switch::compile_chain(self.generator, node.selector, plan);
                (chain, None)
            }
        }
    }

    /// Patch every dispatch entry that targets arm `index` to the current
    /// position.
    fn patch_arm_entries(&mut self, shape: &DispatchShape, plan: &SwitchPlan, index: usize) {
        match shape {
            DispatchShape::Table(sites) => {
                for (position, case) in plan.constants.iter().enumerate() {
                    if case.arm != index {
                        continue;
                    }
                    let key = match plan.strategy {
                        SwitchStrategy::StringHash => Some(position as i32),
                        SwitchStrategy::EnumOrdinal => self.ordinal_key(plan, &case.value),
                        _ => case.value.as_int(),
                    };
                    if let Some(key) = key
                        && let Some(site) = sites.site_for(key)
                    {
                        sites.patch_to_here(self.generator.emitter, site);
                    }
                }
                if plan.default_arm == Some(index) {
                    sites.patch_default_to_here(self.generator.emitter);
                }
            }
            DispatchShape::Patterns(dispatch) => {
                for (position, case) in plan.patterns.iter().enumerate() {
                    if case.arm == index
                        && let Some(site) = dispatch.sites.site_for(position as i32)
                    {
                        dispatch.sites.patch_to_here(self.generator.emitter, site);
                    }
                }
                let base = plan.patterns.len();
                for (position, case) in plan.constants.iter().enumerate() {
                    if case.arm == index
                        && let Some(site) = dispatch.sites.site_for((base + position) as i32)
                    {
                        dispatch.sites.patch_to_here(self.generator.emitter, site);
                    }
                }
                if plan.default_arm == Some(index) {
                    dispatch.sites.patch_default_to_here(self.generator.emitter);
                }
            }
            DispatchShape::Chain { arms, default } => {
                for (arm, jump) in arms {
                    if *arm == index {
                        self.generator.emitter.patch_jump(*jump);
                    }
                }
                if plan.default_arm == Some(index) {
                    self.generator.emitter.patch_jump(*default);
                }
            }
        }
    }

    fn ordinal_key(&self, plan: &SwitchPlan, value: &Constant) -> Option<i32> {
        let Constant::Str(name) = value else {
            return None;
        };
        let declared = self.generator.registry.enum_constants(plan.selector?)?;
        declared
            .iter()
            .position(|c| c == name)
            .map(|p| p as i32)
    }

    /// Bind pattern locals and run the guard at a pattern arm entry.
    fn enter_pattern_arm(&mut self, dispatch: &TypeSwitchDispatch, labels: &[CaseLabel<'_>]) {
        for label in labels {
            let CaseLabel::Pattern(pattern) = label else {
                continue;
            };
            self.bind_pattern(dispatch.selector_slot, pattern);
            if let PatternKind::Guarded { guard, .. } = &pattern.kind {
                // a constant-true guard compiled away during resolution
                let vacuous = self
                    .generator
                    .table
                    .get(&guard.id)
                    .and_then(|i| i.constant.as_ref())
                    .is_some_and(Constant::is_true);
                if vacuous {
                    continue;
                }
                let mut pass = Vec::new();
                self.generator.branch_if_true(guard, &mut pass);
                crate::switch::dispatch::emit_guard_retry(self.generator.emitter, dispatch);
                for jump in pass {
                    self.generator.emitter.patch_jump(jump);
                }
            }
        }
    }

    fn bind_pattern(&mut self, selector_slot: u32, pattern: &Pattern<'_>) {
        match &pattern.kind {
            PatternKind::Type { ty, binding } => {
                if let Some(binding) = binding {
                    self.generator
                        .emitter
                        .emit_load_local(selector_slot, ValueKind::Reference);
                    if let Some(ty) = ty {
                        self.generator.emitter.emit_checkcast(*ty);
                    }
                    self.generator
                        .emitter
                        .emit_store_local(binding.local, ValueKind::Reference);
                }
            }
            PatternKind::Record { ty, components } => {
                let typed = self.generator.emitter.alloc_temp(ValueKind::Reference);
                self.generator
                    .emitter
                    .emit_load_local(selector_slot, ValueKind::Reference);
                self.generator.emitter.emit_checkcast(*ty);
                self.generator.emitter.emit_store_local(typed, ValueKind::Reference);
                self.bind_record_components(typed, *ty, components);
            }
            PatternKind::Guarded { inner, .. } => self.bind_pattern(selector_slot, inner),
        }
    }

    /// Extract record components through their accessors, recursing into
    /// nested record patterns.
    fn bind_record_components(
        &mut self,
        record_slot: u32,
        record_ty: TypeHash,
        components: &[Pattern<'_>],
    ) {
        let registry = self.generator.registry;
        let Some(declared) = registry.record_components(record_ty) else {
            return;
        };
        for (component, pattern) in declared.iter().zip(components) {
            let accessor = TypeHash::for_method(record_ty, &component.name, &[]);
            let kind = self.generator.kind_of(Some(component.ty));
            match &pattern.kind {
                PatternKind::Type {
                    binding: Some(binding),
                    ty,
                } => {
                    self.generator
                        .emitter
                        .emit_load_local(record_slot, ValueKind::Reference);
                    self.generator.emitter.emit_invoke_virtual(accessor, 0, kind.slots());
                    if let Some(ty) = ty
                        && *ty != component.ty
                        && kind == ValueKind::Reference
                    {
                        self.generator.emitter.emit_checkcast(*ty);
                    }
                    self.generator.emitter.emit_store_local(binding.local, kind);
                }
                PatternKind::Type { binding: None, .. } => {}
                PatternKind::Record {
                    ty: nested_ty,
                    components: nested,
                } => {
                    let slot = self.generator.emitter.alloc_temp(ValueKind::Reference);
                    self.generator
                        .emitter
                        .emit_load_local(record_slot, ValueKind::Reference);
                    self.generator.emitter.emit_invoke_virtual(accessor, 0, 1);
                    self.generator.emitter.emit_checkcast(*nested_ty);
                    self.generator.emitter.emit_store_local(slot, ValueKind::Reference);
                    self.bind_record_components(slot, *nested_ty, nested);
                }
                // guards nest only at the top level of a case label
                PatternKind::Guarded { .. } => {}
            }
        }
    }
}

/// Lower a switch expression from inside the expression generator. The
/// produced value is on the stack when this returns.
pub fn generate_switch_expression(generator: &mut ExprGenerator<'_, '_>, node: &SwitchNode<'_>) {
    StmtCompiler::new(generator).compile_switch(node);
}

/// How the emitted dispatch reaches its arms.
enum DispatchShape {
    /// `tableswitch`/`lookupswitch` sites, including the second stage of
    /// string dispatch.
    Table(SwitchSites),
    /// Pattern dispatch with a restart loop.
    Patterns(TypeSwitchDispatch),
    /// Legacy `_SWITCH` probe chain: per-case branches plus the fall-back.
    Chain {
        arms: Vec<(usize, JumpLabel)>,
        default: JumpLabel,
    },
}

fn body_exits(body: &[Stmt<'_>]) -> bool {
    matches!(
        body.last(),
        Some(Stmt::Break { .. } | Stmt::Return { .. } | Stmt::Yield { .. })
    )
}

/// Bootstrap for `invokedynamic` pattern dispatch.
fn type_switch_bootstrap() -> TypeHash {
    TypeHash::from_name("java.lang.runtime.SwitchBootstraps.typeSwitch")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use javelin_core::ast::{BinaryOp, Expr, ExprKind, NodeId, PatternBinding, SwitchArm};
    use javelin_core::binding::{MethodBinding, RecordComponent, TypeBinding};
    use javelin_core::constant::ConstantPool;
    use javelin_core::registry::BindingRegistry;
    use javelin_core::span::Span;
    use rustc_hash::FxHashMap;

    use crate::codegen::CodeEmitter;
    use crate::resolve::{ExprInfo, Resolver};

    struct Fixture {
        registry: BindingRegistry,
        table: FxHashMap<NodeId, ExprInfo>,
        plans: FxHashMap<NodeId, SwitchPlan>,
    }

    fn resolve_stmts(registry: BindingRegistry, stmts: &[Stmt<'_>]) -> Fixture {
        let mut resolver = Resolver::new(&registry);
        for stmt in stmts {
            resolver.resolve_stmt(stmt);
        }
        let plans = resolver.take_switch_plans();
        let (table, reporter) = resolver.into_parts();
        assert!(!reporter.has_errors(), "fixture must resolve cleanly");
        Fixture {
            registry,
            table,
            plans,
        }
    }

    fn compile(fixture: &Fixture, stmts: &[Stmt<'_>], first_temp: u32) -> crate::codegen::CodeChunk {
        let mut pool = ConstantPool::new();
        let mut emitter = CodeEmitter::new(&mut pool, first_temp);
        let mut generator = ExprGenerator::new(&mut emitter, &fixture.table, &fixture.registry)
            .with_plans(&fixture.plans);
        StmtCompiler::new(&mut generator).compile_all(stmts);
        emitter.finish()
    }

    fn lit(arena: &Bump, id: NodeId, value: Constant) -> &Expr<'_> {
        arena.alloc(Expr::new(id, Span::point(1, 1), ExprKind::Literal(value)))
    }

    fn local<'b>(arena: &'b Bump, id: NodeId, slot: u32, ty: TypeHash) -> &'b Expr<'b> {
        arena.alloc(Expr::new(
            id,
            Span::point(1, 1),
            ExprKind::Local {
                local: slot,
                name: "v",
                ty,
            },
        ))
    }

    fn arrow_arm<'b>(
        arena: &'b Bump,
        labels: Vec<CaseLabel<'b>>,
        body_expr: &'b Expr<'b>,
    ) -> SwitchArm<'b> {
        SwitchArm {
            labels: arena.alloc_slice_fill_iter(labels),
            body: arena.alloc_slice_fill_iter([Stmt::Expr(body_expr)]),
            is_arrow: true,
            span: Span::point(2, 1),
        }
    }

    #[test]
    fn if_else_joins_after_both_branches() {
        let arena = Bump::new();
        let cond = arena.alloc(Expr::new(
            2,
            Span::new(1, 1, 5),
            ExprKind::Binary {
                op: BinaryOp::Lt,
                lhs: local(&arena, 0, 0, well_known::INT),
                rhs: local(&arena, 1, 1, well_known::INT),
            },
        ));
        let then_stmt = arena.alloc(Stmt::Expr(arena.alloc(Expr::new(
            5,
            Span::point(2, 1),
            ExprKind::Assign {
                op: None,
                target: local(&arena, 3, 2, well_known::INT),
                value: lit(&arena, 4, Constant::Int(1)),
            },
        ))));
        let else_stmt = arena.alloc(Stmt::Expr(arena.alloc(Expr::new(
            8,
            Span::point(3, 1),
            ExprKind::Assign {
                op: None,
                target: local(&arena, 6, 2, well_known::INT),
                value: lit(&arena, 7, Constant::Int(2)),
            },
        ))));
        let stmts = [Stmt::If {
            span: Span::point(1, 1),
            cond,
            then_branch: then_stmt,
            else_branch: Some(else_stmt),
        }];
        let fixture = resolve_stmts(BindingRegistry::with_jdk_defaults(), &stmts);
        let chunk = compile(&fixture, &stmts, 3);
        chunk.assert_opcodes(&[
            OpCode::ILoad,
            OpCode::ILoad,
            OpCode::IfICmpGe,
            OpCode::IConst1,
            OpCode::IStore,
            OpCode::Goto,
            OpCode::Bipush,
            OpCode::IStore,
        ]);
    }

    #[test]
    fn dense_int_switch_lowers_to_a_patched_table() {
        let arena = Bump::new();
        let selector = local(&arena, 0, 0, well_known::INT);
        let arms: Vec<SwitchArm<'_>> = (0..3)
            .map(|i| {
                let label = lit(&arena, 10 + i, Constant::Int(i as i32));
                let body = arena.alloc(Expr::new(
                    20 + i,
                    Span::point(2, 1),
                    ExprKind::Assign {
                        op: None,
                        target: local(&arena, 30 + i, 1, well_known::INT),
                        value: lit(&arena, 40 + i, Constant::Int(i as i32 * 10)),
                    },
                ));
                arrow_arm(&arena, vec![CaseLabel::Constant(label)], body)
            })
            .collect();
        let node = arena.alloc(SwitchNode {
            id: 1,
            span: Span::point(1, 1),
            kind: SwitchKind::Statement,
            selector,
            arms: arena.alloc_slice_fill_iter(arms),
        });
        let stmts = [Stmt::Switch(node)];
        let fixture = resolve_stmts(BindingRegistry::with_jdk_defaults(), &stmts);
        let chunk = compile(&fixture, &stmts, 2);

        chunk.assert_contains_opcodes(&[OpCode::ILoad, OpCode::TableSwitch]);
        // tableswitch at 3 (iload is 3 bytes): low/high cover 0..=2
        assert_eq!(chunk.read_u32(3 + 5), Some(0));
        assert_eq!(chunk.read_u32(3 + 9), Some(2));
        // every case slot is patched
        for slot in 0..3 {
            let site = 3 + 13 + slot * 4;
            assert_ne!(chunk.read_u32(site), Some(0xFFFF_FFFF));
        }
    }

    #[test]
    fn switch_expression_joins_arm_values() {
        let arena = Bump::new();
        let selector = local(&arena, 0, 0, well_known::INT);
        let one_label = lit(&arena, 1, Constant::Int(1));
        let one_value = lit(&arena, 2, Constant::Int(10));
        let other_value = lit(&arena, 3, Constant::Int(0));
        let node = arena.alloc(SwitchNode {
            id: 4,
            span: Span::point(1, 1),
            kind: SwitchKind::Expression,
            selector,
            arms: arena.alloc_slice_fill_iter([
                arrow_arm(&arena, vec![CaseLabel::Constant(one_label)], one_value),
                arrow_arm(
                    &arena,
                    vec![CaseLabel::Default(Span::point(3, 1))],
                    other_value,
                ),
            ]),
        });
        let result = arena.alloc(Expr::new(5, Span::point(1, 1), ExprKind::Switch(node)));
        let stmts = [Stmt::Return {
            value: Some(result),
            span: Span::point(1, 1),
        }];
        let fixture = resolve_stmts(BindingRegistry::with_jdk_defaults(), &stmts);
        let chunk = compile(&fixture, &stmts, 1);
        // both arms produce a value and meet at one ireturn
        chunk.assert_contains_opcodes(&[
            OpCode::ILoad,
            OpCode::TableSwitch,
            OpCode::Bipush,
            OpCode::Goto,
            OpCode::IConst0,
            OpCode::IReturn,
        ]);
        let returns = chunk
            .opcodes()
            .iter()
            .filter(|op| **op == OpCode::IReturn)
            .count();
        assert_eq!(returns, 1);
    }

    #[test]
    fn switch_expression_below_an_operand_spills_the_stack() {
        let arena = Bump::new();
        let selector = local(&arena, 0, 1, well_known::INT);
        let zero_label = lit(&arena, 1, Constant::Int(0));
        let zero_value = lit(&arena, 2, Constant::Int(7));
        let other_value = lit(&arena, 3, Constant::Int(9));
        let node = arena.alloc(SwitchNode {
            id: 4,
            span: Span::point(1, 8),
            kind: SwitchKind::Expression,
            selector,
            arms: arena.alloc_slice_fill_iter([
                arrow_arm(&arena, vec![CaseLabel::Constant(zero_label)], zero_value),
                arrow_arm(
                    &arena,
                    vec![CaseLabel::Default(Span::point(3, 1))],
                    other_value,
                ),
            ]),
        });
        let switch = arena.alloc(Expr::new(5, Span::new(1, 12, 30), ExprKind::Switch(node)));
        let sum = arena.alloc(Expr::new(
            7,
            Span::new(1, 8, 40),
            ExprKind::Binary {
                op: BinaryOp::Add,
                lhs: local(&arena, 6, 0, well_known::INT),
                rhs: switch,
            },
        ));
        let stmts = [Stmt::Return {
            value: Some(sum),
            span: Span::point(1, 1),
        }];
        let fixture = resolve_stmts(BindingRegistry::with_jdk_defaults(), &stmts);
        let chunk = compile(&fixture, &stmts, 2);
        chunk.assert_opcodes(&[
            OpCode::ILoad,  // left operand
            OpCode::IStore, // spilled across the dispatch
            OpCode::ILoad,  // selector
            OpCode::TableSwitch,
            OpCode::Bipush,
            OpCode::Goto,
            OpCode::Bipush,
            OpCode::Goto,
            OpCode::IStore, // switch value parked
            OpCode::ILoad,  // left operand restored
            OpCode::ILoad,  // switch value back on top
            OpCode::IAdd,
            OpCode::IReturn,
        ]);
    }

    #[test]
    fn string_switch_uses_two_stage_dispatch() {
        let arena = Bump::new();
        let selector = local(&arena, 0, 0, well_known::STRING);
        let a = lit(&arena, 1, Constant::Str("alpha".to_string()));
        let b = lit(&arena, 2, Constant::Str("beta".to_string()));
        let body_a = lit(&arena, 3, Constant::Int(0));
        let body_b = lit(&arena, 4, Constant::Int(0));
        let node = arena.alloc(SwitchNode {
            id: 5,
            span: Span::point(1, 1),
            kind: SwitchKind::Statement,
            selector,
            arms: arena.alloc_slice_fill_iter([
                arrow_arm(&arena, vec![CaseLabel::Constant(a)], body_a),
                arrow_arm(&arena, vec![CaseLabel::Constant(b)], body_b),
            ]),
        });
        let stmts = [Stmt::Switch(node)];
        let fixture = resolve_stmts(BindingRegistry::with_jdk_defaults(), &stmts);
        let chunk = compile(&fixture, &stmts, 1);
        chunk.assert_contains_opcodes(&[
            OpCode::ALoad,
            OpCode::AStore,
            // stage one: hashCode lookup
            OpCode::ALoad,
            OpCode::InvokeVirtual,
            OpCode::LookupSwitch,
            // equals confirmation
            OpCode::ALoad,
            OpCode::Ldc,
            OpCode::InvokeVirtual,
            OpCode::IfEq,
            // stage two
            OpCode::TableSwitch,
        ]);
    }

    #[test]
    fn guarded_pattern_retries_dispatch() {
        let arena = Bump::new();
        let mut registry = BindingRegistry::with_jdk_defaults();
        let circle = registry.register_type(TypeBinding::class("Circle"));
        let shape = registry.register_type(TypeBinding::interface("Shape").sealed(&[circle]));
        registry.register_method(MethodBinding::instance(
            circle,
            "big",
            &[],
            well_known::BOOLEAN,
        ));

        let selector = local(&arena, 0, 0, shape);
        let binding_local = 1;
        let receiver = local(&arena, 1, binding_local, circle);
        let guard = arena.alloc(Expr::new(
            2,
            Span::point(2, 20),
            ExprKind::Call {
                receiver,
                method: "big",
                args: &[],
            },
        ));
        let inner = arena.alloc(Pattern {
            id: 3,
            span: Span::point(2, 6),
            index: 0,
            kind: PatternKind::Type {
                ty: Some(circle),
                binding: Some(PatternBinding {
                    local: binding_local,
                    name: "c",
                }),
            },
        });
        let guarded = arena.alloc(Pattern {
            id: 4,
            span: Span::point(2, 6),
            index: 0,
            kind: PatternKind::Guarded { inner, guard },
        });
        let body_a = lit(&arena, 5, Constant::Int(0));
        let body_b = lit(&arena, 6, Constant::Int(0));
        let node = arena.alloc(SwitchNode {
            id: 7,
            span: Span::point(1, 1),
            kind: SwitchKind::Statement,
            selector,
            arms: arena.alloc_slice_fill_iter([
                arrow_arm(&arena, vec![CaseLabel::Pattern(guarded)], body_a),
                arrow_arm(&arena, vec![CaseLabel::Default(Span::point(3, 1))], body_b),
            ]),
        });
        let stmts = [Stmt::Switch(node)];
        let fixture = resolve_stmts(registry, &stmts);
        let chunk = compile(&fixture, &stmts, 2);
        chunk.assert_contains_opcodes(&[
            // selector stored, dispatch entered
            OpCode::AStore,
            OpCode::IConst0,
            OpCode::IStore,
            OpCode::ALoad,
            OpCode::ILoad,
            OpCode::InvokeDynamic,
            OpCode::TableSwitch,
            // binding, guard, retry on failure
            OpCode::ALoad,
            OpCode::CheckCast,
            OpCode::AStore,
            OpCode::ALoad,
            OpCode::InvokeVirtual,
            OpCode::IfNe,
            OpCode::IInc,
            OpCode::GotoBack,
        ]);
    }

    #[test]
    fn nested_record_pattern_extracts_components() {
        let arena = Bump::new();
        let mut registry = BindingRegistry::with_jdk_defaults();
        let point = registry.register_type(TypeBinding::record(
            "Point",
            vec![
                RecordComponent {
                    name: "x".to_string(),
                    ty: well_known::INT,
                },
                RecordComponent {
                    name: "y".to_string(),
                    ty: well_known::INT,
                },
            ],
        ));
        let circle = registry.register_type(TypeBinding::record(
            "Circle",
            vec![
                RecordComponent {
                    name: "center".to_string(),
                    ty: point,
                },
                RecordComponent {
                    name: "r".to_string(),
                    ty: well_known::INT,
                },
            ],
        ));

        // Circle(Point(var x, var y), var r)
        let var = |id: NodeId, index: u32, slot: u32, name: &'static str| Pattern {
            id,
            span: Span::point(2, 10),
            index,
            kind: PatternKind::Type {
                ty: None,
                binding: Some(PatternBinding { local: slot, name }),
            },
        };
        let point_components = arena.alloc_slice_fill_iter([var(1, 0, 1, "x"), var(2, 1, 2, "y")]);
        let circle_components = arena.alloc_slice_fill_iter([
            Pattern {
                id: 3,
                span: Span::point(2, 8),
                index: 0,
                kind: PatternKind::Record {
                    ty: point,
                    components: point_components,
                },
            },
            var(4, 1, 3, "r"),
        ]);
        let circle_pattern = arena.alloc(Pattern {
            id: 5,
            span: Span::point(2, 6),
            index: 0,
            kind: PatternKind::Record {
                ty: circle,
                components: circle_components,
            },
        });

        let selector = local(&arena, 0, 0, circle);
        let body = lit(&arena, 6, Constant::Int(0));
        let node = arena.alloc(SwitchNode {
            id: 7,
            span: Span::point(1, 1),
            kind: SwitchKind::Statement,
            selector,
            arms: arena.alloc_slice_fill_iter([arrow_arm(
                &arena,
                vec![CaseLabel::Pattern(circle_pattern)],
                body,
            )]),
        });
        let stmts = [Stmt::Switch(node)];
        let fixture = resolve_stmts(registry, &stmts);
        let chunk = compile(&fixture, &stmts, 4);
        chunk.assert_contains_opcodes(&[
            OpCode::InvokeDynamic,
            OpCode::TableSwitch,
            // checkcast Circle, extract center as a nested record
            OpCode::ALoad,
            OpCode::CheckCast,
            OpCode::AStore,
            OpCode::ALoad,
            OpCode::InvokeVirtual,
            OpCode::CheckCast,
            OpCode::AStore,
            // x and y through Point accessors
            OpCode::ALoad,
            OpCode::InvokeVirtual,
            OpCode::IStore,
            OpCode::ALoad,
            OpCode::InvokeVirtual,
            OpCode::IStore,
            // r through the Circle accessor
            OpCode::ALoad,
            OpCode::InvokeVirtual,
            OpCode::IStore,
        ]);
    }

    #[test]
    fn colon_arm_break_leaves_the_switch() {
        let arena = Bump::new();
        let selector = local(&arena, 0, 0, well_known::INT);
        let label = lit(&arena, 1, Constant::Int(0));
        let body_expr = arena.alloc(Expr::new(
            2,
            Span::point(2, 1),
            ExprKind::Assign {
                op: None,
                target: local(&arena, 3, 1, well_known::INT),
                value: lit(&arena, 4, Constant::Int(1)),
            },
        ));
        let arm = SwitchArm {
            labels: arena.alloc_slice_fill_iter([CaseLabel::Constant(label)]),
            body: arena.alloc_slice_fill_iter([
                Stmt::Expr(body_expr),
                Stmt::Break {
                    span: Span::point(3, 1),
                },
            ]),
            is_arrow: false,
            span: Span::point(2, 1),
        };
        let node = arena.alloc(SwitchNode {
            id: 5,
            span: Span::point(1, 1),
            kind: SwitchKind::Statement,
            selector,
            arms: arena.alloc_slice_fill_iter([arm]),
        });
        let stmts = [Stmt::Switch(node)];
        let fixture = resolve_stmts(BindingRegistry::with_jdk_defaults(), &stmts);
        let chunk = compile(&fixture, &stmts, 2);
        chunk.assert_contains_opcodes(&[
            OpCode::ILoad,
            OpCode::TableSwitch,
            OpCode::IConst1,
            OpCode::IStore,
            OpCode::Goto,
        ]);
    }
}
