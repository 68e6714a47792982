//! Compilation passes of the Javelin engine.
//!
//! The passes run strictly in sequence over an immutable AST:
//! resolution (typing, constant folding, operator and overload selection),
//! flow analysis (definite assignment, abrupt exits, synthetic accessors),
//! then code generation. Each pass consumes the previous pass's output
//! through side tables; nothing mutates the tree.

pub mod codegen;
pub mod conversion;
pub mod flow;
pub mod fold;
pub mod overload;
pub mod pattern;
pub mod resolve;
pub mod stmt;
pub mod switch;

pub use codegen::expr::ExprGenerator;
pub use codegen::{CodeChunk, CodeEmitter, OpCode};
pub use flow::{AbruptExit, ExitKind, FlowContext};
pub use fold::{FoldOutcome, fold_binary, fold_unary};
pub use resolve::{ExprContext, ExprInfo, ExprShape, Resolver};
pub use stmt::StmtCompiler;
pub use switch::{SwitchPlan, SwitchStrategy};
