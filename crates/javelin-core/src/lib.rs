//! Core data model for the Javelin compiler engine.
//!
//! This crate holds everything the compilation passes share: source spans,
//! deterministic hash identities, compile-time constants and the module
//! constant pool, diagnostics, the arena AST, and the binding registry the
//! resolver queries for types and methods.

pub mod ast;
pub mod binding;
pub mod constant;
pub mod diagnostics;
pub mod hash;
pub mod registry;
pub mod span;

pub use ast::{
    BinaryOp, CaseLabel, Expr, ExprKind, LocalId, NodeFlags, NodeId, Pattern, PatternBinding,
    PatternKind, Stmt, SwitchArm, SwitchKind, SwitchNode, UnaryOp,
};
pub use binding::{
    AccessorHandle, MethodBinding, PrimitiveId, RecordComponent, TypeBinding, TypeKind, Visibility,
};
pub use constant::{Constant, ConstantPool, PoolEntry};
pub use diagnostics::{Diagnostic, ProblemReporter, Severity};
pub use hash::{TypeHash, well_known};
pub use registry::BindingRegistry;
pub use span::Span;
