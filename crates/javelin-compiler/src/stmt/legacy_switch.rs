//! Legacy overloaded switch dispatch.
//!
//! A selector class with `_SWITCH` methods answers its own case matching:
//! each case probes the selector with its constant in declaration order,
//! and the first method returning true wins. No table instruction is
//! involved; the chain degrades to the fall-back when every probe misses.

use javelin_core::ast::Expr;

use crate::codegen::expr::ExprGenerator;
use crate::codegen::{OpCode, ValueKind};
use crate::switch::SwitchPlan;

use super::DispatchShape;

pub(super) fn compile_chain(
    generator: &mut ExprGenerator<'_, '_>,
    selector: &Expr<'_>,
    plan: &SwitchPlan,
) -> DispatchShape {
    generator.generate(selector, true);
    let slot = generator.emitter.alloc_temp(ValueKind::Reference);
    generator.emitter.emit_store_local(slot, ValueKind::Reference);

    let mut arms = Vec::with_capacity(plan.constants.len());
    for case in &plan.constants {
        let Some(target) = &case.overload else {
            continue;
        };
        generator.emitter.emit_load_local(slot, ValueKind::Reference);
        generator.emitter.emit_constant(&case.value);
        let arg_slots = constant_slots(&case.value);
        generator.invoke_overload(target, arg_slots);
        let hit = generator.emitter.emit_jump(OpCode::IfNe);
        arms.push((case.arm, hit));
    }
    let default = generator.emitter.emit_jump(OpCode::Goto);
    DispatchShape::Chain { arms, default }
}

/// Probe argument width; long and double constants occupy two slots.
fn constant_slots(value: &javelin_core::constant::Constant) -> i32 {
    match value.primitive_id() {
        Some(id) => ValueKind::of_primitive(id).slots(),
        None => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use javelin_core::ast::{
        CaseLabel, ExprKind, NodeId, Stmt, SwitchArm, SwitchKind, SwitchNode,
    };
    use javelin_core::binding::{MethodBinding, TypeBinding};
    use javelin_core::constant::{Constant, ConstantPool};
    use javelin_core::hash::{TypeHash, well_known};
    use javelin_core::registry::BindingRegistry;
    use javelin_core::span::Span;

    use crate::codegen::CodeEmitter;
    use crate::overload::SWITCH_METHOD;
    use crate::resolve::Resolver;
    use crate::stmt::StmtCompiler;
    use crate::switch::resolve_switch;

    fn lit(arena: &Bump, id: NodeId, value: Constant) -> &Expr<'_> {
        arena.alloc(Expr::new(id, Span::point(1, 1), ExprKind::Literal(value)))
    }

    fn local<'b>(arena: &'b Bump, id: NodeId, ty: TypeHash) -> &'b Expr<'b> {
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

    #[test]
    fn probe_chain_asks_the_selector_per_case() {
        let arena = Bump::new();
        let mut registry = BindingRegistry::with_jdk_defaults();
        let mode = registry.register_type(TypeBinding::class("Mode"));
        registry.register_method(MethodBinding::instance(
            mode,
            SWITCH_METHOD,
            &[well_known::INT],
            well_known::BOOLEAN,
        ));

        let selector = local(&arena, 0, mode);
        let one = lit(&arena, 1, Constant::Int(1));
        let two = lit(&arena, 2, Constant::Int(2));
        let body_a = lit(&arena, 3, Constant::Int(0));
        let body_b = lit(&arena, 4, Constant::Int(0));
        let arm = |label, body| SwitchArm {
            labels: arena.alloc_slice_fill_iter([CaseLabel::Constant(label)]),
            body: arena.alloc_slice_fill_iter([Stmt::Expr(body)]),
            is_arrow: true,
            span: Span::point(2, 1),
        };
        let node = arena.alloc(SwitchNode {
            id: 5,
            span: Span::point(1, 1),
            kind: SwitchKind::Statement,
            selector,
            arms: arena.alloc_slice_fill_iter([arm(one, body_a), arm(two, body_b)]),
        });

        let mut resolver = Resolver::new(&registry);
        resolve_switch(&mut resolver, node);
        let plans = resolver.take_switch_plans();
        let (table, reporter) = resolver.into_parts();
        assert!(!reporter.has_errors());

        let mut pool = ConstantPool::new();
        let mut emitter = CodeEmitter::new(&mut pool, 1);
        let mut generator = crate::codegen::expr::ExprGenerator::new(&mut emitter, &table, &registry)
            .with_plans(&plans);
        let stmt = Stmt::Switch(node);
        StmtCompiler::new(&mut generator).compile(&stmt);

        emitter.finish().assert_contains_opcodes(&[
            OpCode::ALoad,
            OpCode::AStore,
            // probe case 1
            OpCode::ALoad,
            OpCode::IConst1,
            OpCode::InvokeVirtual,
            OpCode::IfNe,
            // probe case 2
            OpCode::ALoad,
            OpCode::Bipush,
            OpCode::InvokeVirtual,
            OpCode::IfNe,
            // no probe matched
            OpCode::Goto,
        ]);
    }
}
