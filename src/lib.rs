//! Javelin compiles method bodies of an operator-overloading Java dialect
//! down to JVM bytecode.
//!
//! The crate is a thin facade over its two members: [`javelin_core`] holds
//! the AST, type hashes, bindings, and diagnostics; [`javelin_compiler`]
//! holds the passes. [`compile_body`] wires the passes into the standard
//! pipeline: resolve, flow-analyze, then generate.

pub use javelin_compiler as compiler;
pub use javelin_core as core;

use thiserror::Error;

use javelin_compiler::codegen::expr::ExprGenerator;
use javelin_compiler::codegen::{CodeChunk, CodeEmitter};
use javelin_compiler::flow::{AbruptExit, FlowContext};
use javelin_compiler::resolve::Resolver;
use javelin_compiler::stmt::StmtCompiler;
use javelin_core::ast::{LocalId, Stmt};
use javelin_core::constant::ConstantPool;
use javelin_core::diagnostics::Diagnostic;
use javelin_core::registry::BindingRegistry;

/// One-stop imports for driving the pipeline by hand.
pub mod prelude {
    pub use javelin_compiler::codegen::expr::ExprGenerator;
    pub use javelin_compiler::codegen::{CodeChunk, CodeEmitter, OpCode};
    pub use javelin_compiler::flow::{AbruptExit, ExitKind, FlowContext};
    pub use javelin_compiler::resolve::{ExprContext, ExprInfo, ExprShape, Resolver};
    pub use javelin_compiler::stmt::StmtCompiler;
    pub use javelin_compiler::switch::{SwitchPlan, SwitchStrategy};
    pub use javelin_core::ast::*;
    pub use javelin_core::binding::{MethodBinding, PrimitiveId, TypeBinding, Visibility};
    pub use javelin_core::constant::{Constant, ConstantPool};
    pub use javelin_core::diagnostics::{Diagnostic, ProblemReporter};
    pub use javelin_core::hash::{TypeHash, well_known};
    pub use javelin_core::registry::BindingRegistry;
    pub use javelin_core::span::Span;

    pub use crate::{CompileRejected, CompiledBody, compile_body};
}

/// Output of a successful [`compile_body`] run.
#[derive(Debug)]
pub struct CompiledBody {
    pub code: CodeChunk,
    pub pool: ConstantPool,
    /// Non-fatal diagnostics the body compiled in spite of.
    pub diagnostics: Vec<Diagnostic>,
    /// Potential abrupt exits, in evaluation order.
    pub exits: Vec<AbruptExit>,
}

/// The body had at least one error-severity diagnostic; no code was
/// generated.
#[derive(Debug, Error)]
#[error("method body rejected with {} diagnostic(s)", .problems.len())]
pub struct CompileRejected {
    pub problems: Vec<Diagnostic>,
}

/// Compile one method body.
///
/// `params` are the locals definitely assigned on entry; `first_temp_slot`
/// is the first local slot past the declared ones, free for spill temps.
/// The registry is mutable because flow analysis registers synthetic
/// accessors for private operator methods reached from other classes.
pub fn compile_body(
    registry: &mut BindingRegistry,
    body: &[Stmt<'_>],
    params: &[LocalId],
    first_temp_slot: u32,
) -> Result<CompiledBody, CompileRejected> {
    let mut resolver = Resolver::new(registry);
    for stmt in body {
        resolver.resolve_stmt(stmt);
    }
    let plans = resolver.take_switch_plans();
    let (table, reporter) = resolver.into_parts();

    let mut flow = FlowContext::new(registry, table, reporter);
    for &param in params {
        flow.mark_assigned(param);
    }
    for stmt in body {
        flow.analyze_stmt(stmt);
    }
    let exits = flow.exits().to_vec();
    let (table, reporter) = flow.into_parts();

    if reporter.has_errors() {
        return Err(CompileRejected {
            problems: reporter.into_vec(),
        });
    }

    let mut pool = ConstantPool::new();
    let mut emitter = CodeEmitter::new(&mut pool, first_temp_slot);
    let mut generator = ExprGenerator::new(&mut emitter, &table, registry).with_plans(&plans);
    StmtCompiler::new(&mut generator).compile_all(body);
    let code = emitter.finish();

    Ok(CompiledBody {
        code,
        pool,
        diagnostics: reporter.into_vec(),
        exits,
    })
}
