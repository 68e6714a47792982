//! `if` lowering.
//!
//! Boolean conditions compile to the branch shape with no materialized
//! value. A condition whose class declares `_IF` dispatches through it
//! instead: the receiver is evaluated once, `_IF` gates the then branch,
//! and when an else branch exists the same receiver's `_ELSE` gates it.
//! A class without `_ELSE` runs the else branch whenever `_IF` answered
//! false.

use javelin_core::ast::{Expr, Stmt};
use javelin_core::binding::PrimitiveId;
use javelin_core::hash::well_known;

use crate::codegen::{OpCode, ValueKind};
use crate::overload::{OverloadTarget, resolve_else_overload, resolve_if_overload};

use super::StmtCompiler;

pub(super) fn compile_if(
    compiler: &mut StmtCompiler<'_, '_, '_>,
    cond: &Expr<'_>,
    then_branch: &Stmt<'_>,
    else_branch: Option<&Stmt<'_>>,
) {
    let cond_ty = compiler.generator.table.get(&cond.id).and_then(|i| i.ty);
    let target = cond_ty.and_then(|ty| {
        let boolean = ty == well_known::BOOLEAN
            || compiler.generator.registry.unboxed(ty) == Some(PrimitiveId::Boolean);
        if boolean {
            None
        } else {
            resolve_if_overload(ty, compiler.generator.registry)
        }
    });
    match target {
        Some(target) => compile_overloaded(compiler, &target, cond, then_branch, else_branch),
        None => compile_standard(compiler, cond, then_branch, else_branch),
    }
}

fn compile_standard(
    compiler: &mut StmtCompiler<'_, '_, '_>,
    cond: &Expr<'_>,
    then_branch: &Stmt<'_>,
    else_branch: Option<&Stmt<'_>>,
) {
    let mut false_jumps = Vec::new();
    compiler.generator.branch_if_false(cond, &mut false_jumps);
    compiler.compile(then_branch);
    match else_branch {
        Some(else_branch) => {
            let end = compiler.generator.emitter.emit_jump(OpCode::Goto);
            for jump in false_jumps {
                compiler.generator.emitter.patch_jump(jump);
            }
            compiler.compile(else_branch);
            compiler.generator.emitter.patch_jump(end);
        }
        None => {
            for jump in false_jumps {
                compiler.generator.emitter.patch_jump(jump);
            }
        }
    }
}

fn compile_overloaded(
    compiler: &mut StmtCompiler<'_, '_, '_>,
    target: &OverloadTarget,
    cond: &Expr<'_>,
    then_branch: &Stmt<'_>,
    else_branch: Option<&Stmt<'_>>,
) {
    compiler.generator.generate(cond, true);

    let Some(else_branch) = else_branch else {
        compiler.generator.invoke_overload(target, 0);
        let skip = compiler.generator.emitter.emit_jump(OpCode::IfEq);
        compiler.compile(then_branch);
        compiler.generator.emitter.patch_jump(skip);
        return;
    };

    // _ELSE re-asks the same receiver, so it survives in a temp
    let slot = compiler.generator.emitter.alloc_temp(ValueKind::Reference);
    compiler.generator.emitter.emit(OpCode::Dup);
    compiler
        .generator
        .emitter
        .emit_store_local(slot, ValueKind::Reference);
    compiler.generator.invoke_overload(target, 0);
    let to_else = compiler.generator.emitter.emit_jump(OpCode::IfEq);
    compiler.compile(then_branch);
    let end = compiler.generator.emitter.emit_jump(OpCode::Goto);
    compiler.generator.emitter.patch_jump(to_else);

    match resolve_else_overload(target, compiler.generator.registry) {
        Some(else_target) => {
            compiler
                .generator
                .emitter
                .emit_load_local(slot, ValueKind::Reference);
            compiler.generator.invoke_overload(&else_target, 0);
            let skip = compiler.generator.emitter.emit_jump(OpCode::IfEq);
            compiler.compile(else_branch);
            compiler.generator.emitter.patch_jump(skip);
        }
        None => compiler.compile(else_branch),
    }
    compiler.generator.emitter.patch_jump(end);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use javelin_core::ast::{ExprKind, NodeId};
    use javelin_core::binding::{MethodBinding, TypeBinding};
    use javelin_core::constant::{Constant, ConstantPool};
    use javelin_core::hash::TypeHash;
    use javelin_core::registry::BindingRegistry;
    use javelin_core::span::Span;

    use crate::codegen::CodeEmitter;
    use crate::codegen::expr::ExprGenerator;
    use crate::overload::{ELSE_METHOD, IF_METHOD};
    use crate::resolve::{ExprContext, Resolver};

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

    fn assign_stmt<'b>(arena: &'b Bump, id: NodeId, slot: u32, value: i32) -> &'b Stmt<'b> {
        arena.alloc(Stmt::Expr(arena.alloc(Expr::new(
            id,
            Span::point(2, 1),
            ExprKind::Assign {
                op: None,
                target: local(arena, id + 1, slot, well_known::INT),
                value: arena.alloc(Expr::new(
                    id + 2,
                    Span::point(2, 5),
                    ExprKind::Literal(Constant::Int(value)),
                )),
            },
        ))))
    }

    #[test]
    fn overloaded_condition_gates_both_branches() {
        let arena = Bump::new();
        let mut registry = BindingRegistry::with_jdk_defaults();
        let cond_class = registry.register_type(TypeBinding::class("Toggle"));
        registry.register_method(MethodBinding::instance(
            cond_class,
            IF_METHOD,
            &[],
            well_known::BOOLEAN,
        ));
        registry.register_method(MethodBinding::instance(
            cond_class,
            ELSE_METHOD,
            &[],
            well_known::BOOLEAN,
        ));

        let cond = local(&arena, 0, 0, cond_class);
        let then_branch = assign_stmt(&arena, 10, 1, 1);
        let else_branch = assign_stmt(&arena, 20, 1, 2);

        let mut resolver = Resolver::new(&registry);
        resolver.resolve_expr(cond, ExprContext::Plain);
        let Stmt::Expr(t) = then_branch else { unreachable!() };
        let Stmt::Expr(e) = else_branch else { unreachable!() };
        resolver.resolve_expr(t, ExprContext::Plain);
        resolver.resolve_expr(e, ExprContext::Plain);
        let (table, reporter) = resolver.into_parts();
        assert!(!reporter.has_errors());

        let mut pool = ConstantPool::new();
        let mut emitter = CodeEmitter::new(&mut pool, 2);
        let mut generator = ExprGenerator::new(&mut emitter, &table, &registry);
        let mut compiler = StmtCompiler::new(&mut generator);
        compile_if(&mut compiler, cond, then_branch, Some(else_branch));

        emitter.finish().assert_opcodes(&[
            OpCode::ALoad,
            OpCode::Dup,
            OpCode::AStore,
            OpCode::InvokeVirtual, // _IF
            OpCode::IfEq,
            OpCode::IConst1,
            OpCode::IStore,
            OpCode::Goto,
            OpCode::ALoad,
            OpCode::InvokeVirtual, // _ELSE
            OpCode::IfEq,
            OpCode::Bipush,
            OpCode::IStore,
        ]);
    }

    #[test]
    fn overloaded_condition_without_else_skips_the_temp() {
        let arena = Bump::new();
        let mut registry = BindingRegistry::with_jdk_defaults();
        let cond_class = registry.register_type(TypeBinding::class("Toggle"));
        registry.register_method(MethodBinding::instance(
            cond_class,
            IF_METHOD,
            &[],
            well_known::BOOLEAN,
        ));

        let cond = local(&arena, 0, 0, cond_class);
        let then_branch = assign_stmt(&arena, 10, 1, 1);

        let mut resolver = Resolver::new(&registry);
        resolver.resolve_expr(cond, ExprContext::Plain);
        let Stmt::Expr(t) = then_branch else { unreachable!() };
        resolver.resolve_expr(t, ExprContext::Plain);
        let (table, reporter) = resolver.into_parts();
        assert!(!reporter.has_errors());

        let mut pool = ConstantPool::new();
        let mut emitter = CodeEmitter::new(&mut pool, 2);
        let mut generator = ExprGenerator::new(&mut emitter, &table, &registry);
        let mut compiler = StmtCompiler::new(&mut generator);
        compile_if(&mut compiler, cond, then_branch, None);

        emitter.finish().assert_opcodes(&[
            OpCode::ALoad,
            OpCode::InvokeVirtual,
            OpCode::IfEq,
            OpCode::IConst1,
            OpCode::IStore,
        ]);
    }
}
