//! Expression resolution.
//!
//! [`Resolver`] walks expressions bottom-up and records an [`ExprInfo`] per
//! node in a side table keyed by [`NodeId`]: the resolved type, the folded
//! constant value if any, and the lowering shape code generation will use.
//! Nodes resolve exactly once; a second visit returns the cached result and
//! reports nothing, so diagnostics are never duplicated.
//!
//! Expected faults are reported and degrade the node to no type; sibling
//! expressions keep resolving.

mod array_ref;
mod binary;
mod unary;

use rustc_hash::FxHashMap;

use javelin_core::ast::{Expr, ExprKind, NodeId, Stmt};
use javelin_core::constant::Constant;
use javelin_core::diagnostics::{Diagnostic, ProblemReporter};
use javelin_core::hash::{TypeHash, well_known};
use javelin_core::registry::BindingRegistry;

use crate::conversion::{OperandConversion, OperationShape, UnaryShape};
use crate::overload::OverloadTarget;

/// Where an expression occurs. Threaded explicitly; resolution never
/// probes by trial and error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExprContext {
    #[default]
    Plain,
    /// Target of a simple assignment.
    Assignment,
    /// Target of a compound assignment (`+=` family, `++`/`--`).
    CompoundAssignment,
}

/// Chosen lowering for a resolved expression.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ExprShape {
    /// Leaf or structural node with no special lowering.
    #[default]
    Plain,
    /// The whole node folded to a constant; emit the value directly.
    Folded,
    /// Standard binary operation.
    Binary(OperationShape),
    /// Standard unary operation.
    Unary(UnaryShape),
    /// Operator method dispatch.
    Overload(OverloadTarget),
    /// `array[index]` over a real array type.
    ArrayIndex { elem: TypeHash },
    /// `receiver[index]` dispatched through user `get`/`put` methods.
    IndexerMethods {
        get: Option<TypeHash>,
        put: Option<TypeHash>,
    },
    /// Simple assignment; the conversion the stored value needs.
    Assign { value: OperandConversion },
    /// Compound assignment: target and value run through the operation,
    /// and the result converts back to the target's type.
    CompoundAssign(OperationShape),
    /// Resolved instance call.
    Call { method: TypeHash },
    /// Resolution failed; already reported.
    Error,
}

/// Per-node resolution result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExprInfo {
    /// Resolved type; `None` after a reported fault.
    pub ty: Option<TypeHash>,
    /// Compile-time constant value, when the node folds.
    pub constant: Option<Constant>,
    pub shape: ExprShape,
}

impl ExprInfo {
    pub fn of_type(ty: TypeHash) -> Self {
        Self {
            ty: Some(ty),
            constant: None,
            shape: ExprShape::Plain,
        }
    }

    pub fn error() -> Self {
        Self {
            ty: None,
            constant: None,
            shape: ExprShape::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.shape, ExprShape::Error)
    }
}

/// The resolution pass over one compilation unit.
pub struct Resolver<'r> {
    pub registry: &'r BindingRegistry,
    pub reporter: ProblemReporter,
    table: FxHashMap<NodeId, ExprInfo>,
    /// Lowering plans for resolved switches, keyed by switch node id.
    switch_plans: FxHashMap<NodeId, crate::switch::SwitchPlan>,
}

impl<'r> Resolver<'r> {
    pub fn new(registry: &'r BindingRegistry) -> Self {
        Self {
            registry,
            reporter: ProblemReporter::new(),
            table: FxHashMap::default(),
            switch_plans: FxHashMap::default(),
        }
    }

    /// Look up an already-resolved node.
    pub fn info(&self, id: NodeId) -> Option<&ExprInfo> {
        self.table.get(&id)
    }

    /// Resolved type of a node, if resolution succeeded.
    pub fn type_of(&self, id: NodeId) -> Option<TypeHash> {
        self.table.get(&id).and_then(|info| info.ty)
    }

    /// Constant value of a node, if it folded.
    pub fn constant_of(&self, id: NodeId) -> Option<&Constant> {
        self.table.get(&id).and_then(|info| info.constant.as_ref())
    }

    /// Dismantle the resolver into its side table and collected
    /// diagnostics, releasing the registry borrow for later passes.
    pub fn into_parts(self) -> (FxHashMap<NodeId, ExprInfo>, ProblemReporter) {
        (self.table, self.reporter)
    }

    /// Take the switch lowering plans for the code generation pass.
    pub fn take_switch_plans(&mut self) -> FxHashMap<NodeId, crate::switch::SwitchPlan> {
        std::mem::take(&mut self.switch_plans)
    }

    pub(crate) fn record_switch_plan(&mut self, id: NodeId, plan: crate::switch::SwitchPlan) {
        self.switch_plans.insert(id, plan);
    }

    pub(crate) fn record(&mut self, id: NodeId, info: ExprInfo) -> ExprInfo {
        self.table.insert(id, info.clone());
        info
    }

    /// Resolve an expression. Idempotent per node id.
    pub fn resolve_expr(&mut self, expr: &Expr<'_>, ctx: ExprContext) -> ExprInfo {
        if let Some(cached) = self.table.get(&expr.id) {
            return cached.clone();
        }
        let info = self.resolve_uncached(expr, ctx);
        self.record(expr.id, info)
    }

    /// Resolve every expression reachable from a statement.
    pub fn resolve_stmt(&mut self, stmt: &Stmt<'_>) {
        match stmt {
            Stmt::Expr(expr) => {
                self.resolve_expr(expr, ExprContext::Plain);
            }
            Stmt::Block(stmts) => {
                for s in *stmts {
                    self.resolve_stmt(s);
                }
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                self.resolve_expr(cond, ExprContext::Plain);
                self.resolve_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            Stmt::Switch(node) => {
                crate::switch::resolve_switch(self, node);
            }
            Stmt::LocalDecl { init, .. } => {
                if let Some(init) = init {
                    self.resolve_expr(init, ExprContext::Plain);
                }
            }
            Stmt::Break { .. } => {}
            Stmt::Return { value, .. } => {
                if let Some(value) = value {
                    self.resolve_expr(value, ExprContext::Plain);
                }
            }
            Stmt::Yield { value, .. } => {
                self.resolve_expr(value, ExprContext::Plain);
            }
        }
    }

    fn resolve_uncached(&mut self, expr: &Expr<'_>, ctx: ExprContext) -> ExprInfo {
        match &expr.kind {
            ExprKind::Literal(value) => ExprInfo {
                ty: Some(literal_type(value)),
                constant: Some(value.clone()),
                shape: ExprShape::Plain,
            },
            ExprKind::Null => ExprInfo::of_type(well_known::NULL),
            ExprKind::Local { ty, .. } => ExprInfo::of_type(*ty),
            ExprKind::Binary { op, lhs, rhs } => binary::resolve_binary(self, expr, *op, lhs, rhs),
            ExprKind::Unary { op, operand } => unary::resolve_unary(self, expr, *op, operand),
            ExprKind::ArrayRef { array, index } => {
                array_ref::resolve_array_ref(self, expr, array, index, ctx)
            }
            ExprKind::Assign { op, target, value } => self.resolve_assign(expr, *op, target, value),
            ExprKind::Call {
                receiver,
                method,
                args,
            } => self.resolve_call(expr, receiver, method, args),
            ExprKind::Cast { ty, operand } => {
                self.resolve_expr(operand, ExprContext::Plain);
                ExprInfo::of_type(*ty)
            }
            ExprKind::Switch(node) => crate::switch::resolve_switch_expr(self, node),
        }
    }

    fn resolve_assign(
        &mut self,
        expr: &Expr<'_>,
        op: Option<javelin_core::ast::BinaryOp>,
        target: &Expr<'_>,
        value: &Expr<'_>,
    ) -> ExprInfo {
        let target_ctx = if op.is_some() {
            ExprContext::CompoundAssignment
        } else {
            ExprContext::Assignment
        };
        let target_info = self.resolve_expr(target, target_ctx);
        let value_info = self.resolve_expr(value, ExprContext::Plain);
        if target_info.is_error() || value_info.is_error() {
            return ExprInfo::error();
        }
        let (Some(target_ty), Some(value_ty)) = (target_info.ty, value_info.ty) else {
            return ExprInfo::error();
        };

        // Compound assignment through an indexed target re-reads the
        // element with the value live across the read and the write; that
        // emission path is a known gap and must never mis-compile silently.
        if op.is_some()
            && matches!(
                target_info.shape,
                ExprShape::IndexerMethods { .. } | ExprShape::ArrayIndex { .. }
            )
        {
            self.reporter.report(Diagnostic::Internal {
                message: "compound assignment to an indexed target".to_string(),
                span: expr.span,
            });
            return ExprInfo::error();
        }

        // The assignment's value is the target's type.
        match op {
            Some(op) => {
                let operation =
                    crate::conversion::resolve_operation(op, target_ty, value_ty, self.registry);
                match operation {
                    // `+=` concatenation only stores back into a String
                    Some(shape @ OperationShape::StringConcat { .. })
                        if target_ty == well_known::STRING =>
                    {
                        if let OperationShape::StringConcat {
                            right_char_array: true,
                            ..
                        } = shape
                        {
                            self.reporter
                                .report(Diagnostic::StringConcatCharArray { span: value.span });
                        }
                        ExprInfo {
                            ty: Some(target_ty),
                            constant: None,
                            shape: ExprShape::CompoundAssign(shape),
                        }
                    }
                    Some(shape @ OperationShape::Primitive { .. })
                        if self
                            .registry
                            .get_type(target_ty)
                            .and_then(|t| t.primitive_id())
                            .is_some() =>
                    {
                        ExprInfo {
                            ty: Some(target_ty),
                            constant: None,
                            shape: ExprShape::CompoundAssign(shape),
                        }
                    }
                    // storing back into a wrapper needs a boxing step the
                    // emitter does not produce
                    Some(OperationShape::Primitive { .. }) => {
                        self.reporter.report(Diagnostic::Internal {
                            message: "compound assignment to a boxed target".to_string(),
                            span: expr.span,
                        });
                        ExprInfo::error()
                    }
                    _ => {
                        self.reporter.report(Diagnostic::InvalidOperator {
                            operator: op.symbol().to_string(),
                            left: self.registry.type_name(target_ty),
                            right: self.registry.type_name(value_ty),
                            span: expr.span,
                        });
                        ExprInfo::error()
                    }
                }
            }
            None => match crate::conversion::assignment_conversion(
                target_ty,
                value_ty,
                self.registry,
            ) {
                Some(conversion) => ExprInfo {
                    ty: Some(target_ty),
                    constant: None,
                    shape: ExprShape::Assign { value: conversion },
                },
                None => {
                    self.reporter.report(Diagnostic::IncompatibleAssignment {
                        target: self.registry.type_name(target_ty),
                        value: self.registry.type_name(value_ty),
                        span: expr.span,
                    });
                    ExprInfo::error()
                }
            },
        }
    }

    fn resolve_call(
        &mut self,
        expr: &Expr<'_>,
        receiver: &Expr<'_>,
        method: &str,
        args: &[&Expr<'_>],
    ) -> ExprInfo {
        let recv_info = self.resolve_expr(receiver, ExprContext::Plain);
        let arg_types: Vec<Option<TypeHash>> = args
            .iter()
            .map(|arg| self.resolve_expr(arg, ExprContext::Plain).ty)
            .collect();
        let Some(recv_ty) = recv_info.ty else {
            return ExprInfo::error();
        };
        // Name/overload binding beyond arity-and-type match is out of scope.
        let candidate = self
            .registry
            .methods_named(recv_ty, method)
            .into_iter()
            .find(|m| {
                m.params.len() == args.len()
                    && m.params
                        .iter()
                        .zip(&arg_types)
                        .all(|(p, a)| a.map(|a| self.registry.is_subtype_of(a, *p) || a == *p)
                            .unwrap_or(false))
            })
            .map(|m| (m.hash, m.return_type));
        match candidate {
            Some((hash, ret)) => ExprInfo {
                ty: Some(ret),
                constant: None,
                shape: ExprShape::Call { method: hash },
            },
            None => {
                self.reporter.report(Diagnostic::MethodNotFound {
                    receiver: self.registry.type_name(recv_ty),
                    method: method.to_string(),
                    span: expr.span,
                });
                ExprInfo::error()
            }
        }
    }
}

/// Type of a literal constant.
fn literal_type(value: &Constant) -> TypeHash {
    match value.primitive_id() {
        Some(id) => id.type_hash(),
        None => well_known::STRING,
    }
}
