//! Expression code generation.
//!
//! [`ExprGenerator`] walks resolved expressions and writes instructions
//! through a [`CodeEmitter`]. Operands always evaluate in declared order,
//! including when a right-side operator method makes the right operand the
//! receiver. A caller that does not need the value still gets the side
//! effects: impure expressions evaluate and the result pops.
//!
//! Boolean results have two shapes: conditions turn into branches with no
//! materialized value, and value positions join the branch shape into an
//! eager `0`/`1`.

use rustc_hash::FxHashMap;

use javelin_core::ast::{BinaryOp, Expr, ExprKind, NodeId, UnaryOp};
use javelin_core::binding::PrimitiveId;
use javelin_core::constant::Constant;
use javelin_core::hash::{TypeHash, well_known};
use javelin_core::registry::BindingRegistry;

use crate::conversion::{OperandConversion, OperationShape};
use crate::overload::{OverloadSide, OverloadTarget};
use crate::resolve::{ExprInfo, ExprShape};

use super::{CodeEmitter, JumpLabel, OpCode, ValueKind};

/// Generates code for resolved expressions.
pub struct ExprGenerator<'a, 'pool> {
    pub emitter: &'a mut CodeEmitter<'pool>,
    pub table: &'a FxHashMap<NodeId, ExprInfo>,
    pub registry: &'a BindingRegistry,
    /// Switch lowering plans, when the unit contains switches.
    pub plans: Option<&'a FxHashMap<NodeId, crate::switch::SwitchPlan>>,
    /// Kinds of operands currently held on the stack by enclosing
    /// expressions, top-last. A nested switch spills these to locals.
    live: Vec<ValueKind>,
}

impl<'a, 'pool> ExprGenerator<'a, 'pool> {
    pub fn new(
        emitter: &'a mut CodeEmitter<'pool>,
        table: &'a FxHashMap<NodeId, ExprInfo>,
        registry: &'a BindingRegistry,
    ) -> Self {
        Self {
            emitter,
            table,
            registry,
            plans: None,
            live: Vec::new(),
        }
    }

    pub fn with_plans(mut self, plans: &'a FxHashMap<NodeId, crate::switch::SwitchPlan>) -> Self {
        self.plans = Some(plans);
        self
    }

    fn info(&self, id: NodeId) -> Option<&ExprInfo> {
        self.table.get(&id)
    }

    /// Computation category of a resolved type.
    pub fn kind_of(&self, ty: Option<TypeHash>) -> ValueKind {
        let Some(ty) = ty else {
            return ValueKind::Reference;
        };
        match self.registry.get_type(ty).and_then(|t| t.primitive_id()) {
            Some(id) => ValueKind::of_primitive(id),
            None => ValueKind::Reference,
        }
    }

    /// Category of an expression's result.
    pub fn result_kind(&self, expr: &Expr<'_>) -> ValueKind {
        self.kind_of(self.info(expr.id).and_then(|i| i.ty))
    }

    /// Generate an expression. When `value_required` is false the result is
    /// discarded, and a side-effect-free expression emits nothing at all.
    pub fn generate(&mut self, expr: &Expr<'_>, value_required: bool) {
        if !value_required {
            if self.is_pure(expr) {
                return;
            }
            // stores and increments have discard-aware forms of their own
            match &expr.kind {
                ExprKind::Assign { op, target, value } => {
                    self.generate_assign(expr, *op, target, value, false);
                    return;
                }
                ExprKind::Unary { op, operand } if op.is_inc_dec() => {
                    if let Some(ExprShape::Unary(shape)) =
                        self.info(expr.id).map(|i| i.shape.clone())
                    {
                        self.generate_inc_dec(*op, operand, &shape, false);
                        return;
                    }
                }
                _ => {}
            }
            self.generate_value(expr);
            self.pop_result(expr);
            return;
        }
        self.generate_value(expr);
    }

    fn pop_result(&mut self, expr: &Expr<'_>) {
        let ty = self.info(expr.id).and_then(|i| i.ty);
        if ty == Some(well_known::VOID) || ty.is_none() {
            return;
        }
        match self.result_kind(expr).slots() {
            2 => self.emitter.emit(OpCode::Pop2),
            _ => self.emitter.emit(OpCode::Pop),
        }
    }

    /// Whether evaluation can be skipped entirely when unused.
    fn is_pure(&self, expr: &Expr<'_>) -> bool {
        if self
            .info(expr.id)
            .is_some_and(|i| matches!(i.shape, ExprShape::Folded))
        {
            return true;
        }
        match &expr.kind {
            ExprKind::Literal(_) | ExprKind::Null | ExprKind::Local { .. } => true,
            ExprKind::Unary { op, operand } => !op.is_inc_dec() && self.is_pure(operand),
            ExprKind::Binary { op, lhs, rhs } => {
                let shape_ok = matches!(
                    self.info(expr.id).map(|i| &i.shape),
                    Some(ExprShape::Binary(OperationShape::Primitive { .. }))
                        | Some(ExprShape::Binary(OperationShape::ReferenceCompare))
                );
                // integral / and % can throw even when the value is unused
                let throws = matches!(op, BinaryOp::Div | BinaryOp::Rem)
                    && self.result_kind(expr) != ValueKind::Float
                    && self.result_kind(expr) != ValueKind::Double;
                shape_ok && !throws && self.is_pure(lhs) && self.is_pure(rhs)
            }
            _ => false,
        }
    }

    fn generate_value(&mut self, expr: &Expr<'_>) {
        // A folded node emits its constant, whatever its form.
        let folded = self.info(expr.id).and_then(|info| {
            matches!(info.shape, ExprShape::Folded)
                .then(|| info.constant.clone())
                .flatten()
        });
        if let Some(constant) = folded {
            self.emitter.emit_constant(&constant);
            return;
        }

        match &expr.kind {
            ExprKind::Literal(value) => self.emitter.emit_constant(value),
            ExprKind::Null => self.emitter.emit_null(),
            ExprKind::Local { local, .. } => {
                let kind = self.result_kind(expr);
                self.emitter.emit_load_local(*local, kind);
            }
            ExprKind::Binary { op, lhs, rhs } => self.generate_binary(expr, *op, lhs, rhs),
            ExprKind::Unary { op, operand } => self.generate_unary(expr, *op, operand),
            ExprKind::Assign { op, target, value } => {
                self.generate_assign(expr, *op, target, value, true)
            }
            ExprKind::ArrayRef { array, index } => self.generate_array_read(expr, array, index),
            ExprKind::Call {
                receiver, args, ..
            } => self.generate_call(expr, receiver, args),
            ExprKind::Cast { ty, operand } => self.generate_cast(*ty, operand),
            ExprKind::Switch(node) => self.generate_switch_value(expr, node),
        }
    }

    /// A switch expression below other operands: spill the enclosing
    /// stack to locals first, since pattern dispatch may loop back over
    /// its own dispatch and the arms reset the depth bookkeeping.
    fn generate_switch_value(&mut self, expr: &Expr<'_>, node: &javelin_core::ast::SwitchNode<'_>) {
        let live = std::mem::take(&mut self.live);
        let spills = self.emitter.spill_stack(&live);
        crate::stmt::generate_switch_expression(self, node);
        if !spills.is_empty() {
            let kind = self.result_kind(expr);
            let result = self.emitter.alloc_temp(kind);
            self.emitter.emit_store_local(result, kind);
            self.emitter.restore_stack(&spills);
            self.emitter.emit_load_local(result, kind);
        }
        self.live = live;
    }

    // ======================================================================
    // Binary operations
    // ======================================================================

    fn generate_binary(&mut self, expr: &Expr<'_>, op: BinaryOp, lhs: &Expr<'_>, rhs: &Expr<'_>) {
        let shape = self.info(expr.id).map(|i| i.shape.clone());
        match shape {
            Some(ExprShape::Binary(OperationShape::Primitive {
                kind, left, right, ..
            })) => {
                if op.is_logical() || op.is_comparison() {
                    self.generate_eager_boolean(expr);
                    return;
                }
                // a constant-zero `&` side reduces to the other side's
                // effects plus the zero
                if op == BinaryOp::BitAnd && kind == PrimitiveId::Int {
                    let effect_side = if self.is_int_zero(lhs) {
                        Some(rhs)
                    } else if self.is_int_zero(rhs) {
                        Some(lhs)
                    } else {
                        None
                    };
                    if let Some(side) = effect_side {
                        self.generate(side, false);
                        self.emitter.emit(OpCode::IConst0);
                        return;
                    }
                }
                self.generate_value(lhs);
                self.apply_conversion(lhs, left);
                self.live.push(ValueKind::of_primitive(kind));
                self.generate_value(rhs);
                self.live.pop();
                self.apply_conversion(rhs, right);
                self.emitter.emit(arith_opcode(op, ValueKind::of_primitive(kind)));
            }
            Some(ExprShape::Binary(OperationShape::StringConcat { .. })) => {
                self.generate_value(lhs);
                self.live.push(self.result_kind(lhs));
                self.generate_value(rhs);
                self.live.pop();
                self.emitter.emit_invoke_dynamic(concat_bootstrap(), 2, 1);
            }
            Some(ExprShape::Binary(OperationShape::ReferenceCompare)) => {
                self.generate_eager_boolean(expr);
            }
            Some(ExprShape::Overload(target)) => {
                self.generate_overload_binary(&target, lhs, rhs);
            }
            _ => {}
        }
    }

    /// Operator method dispatch, preserving declared evaluation order even
    /// when the right operand is the receiver.
    fn generate_overload_binary(&mut self, target: &OverloadTarget, lhs: &Expr<'_>, rhs: &Expr<'_>) {
        self.generate_value(lhs);
        self.live.push(ValueKind::Reference);
        self.generate_value(rhs);
        self.live.pop();
        if target.side == OverloadSide::Right {
            // both operands are single-slot references
            self.emitter.emit(OpCode::Swap);
        }
        self.invoke_overload(target, 1);
    }

    pub(crate) fn invoke_overload(&mut self, target: &OverloadTarget, arg_slots: i32) {
        let ret_slots = self.kind_of(Some(target.return_type)).slots();
        let ret_slots = if target.return_type == well_known::VOID {
            0
        } else {
            ret_slots
        };
        if target.is_private {
            // private targets route through their synthetic accessor,
            // which takes the receiver as a leading argument
            self.emitter.emit_invoke_static(
                TypeHash::for_accessor(target.method),
                arg_slots + 1,
                ret_slots,
            );
        } else {
            self.emitter
                .emit_invoke_virtual(target.method, arg_slots, ret_slots);
        }
    }

    fn apply_conversion(&mut self, operand: &Expr<'_>, conv: OperandConversion) {
        if conv.unbox {
            self.emit_unbox(operand);
        }
        if let Some(op) = conv.widen {
            self.emitter.emit(op);
        }
    }

    pub(crate) fn emit_unbox(&mut self, operand: &Expr<'_>) {
        let Some(ty) = self.info(operand.id).and_then(|i| i.ty) else {
            return;
        };
        let Some(id) = self.registry.unboxed(ty) else {
            return;
        };
        let ret = ValueKind::of_primitive(id).slots();
        self.emitter
            .emit_invoke_virtual(unbox_method(id), 0, ret);
    }

    // ======================================================================
    // Boolean shapes
    // ======================================================================

    /// Materialize a boolean expression as an eager `0`/`1`.
    pub fn generate_eager_boolean(&mut self, expr: &Expr<'_>) {
        let mut false_jumps = Vec::new();
        self.branch_if_false(expr, &mut false_jumps);
        let base = self.emitter.depth();
        self.emitter.emit(OpCode::IConst1);
        let end = self.emitter.emit_jump(OpCode::Goto);
        for label in false_jumps {
            self.emitter.patch_jump(label);
        }
        self.emitter.set_depth(base);
        self.emitter.emit(OpCode::IConst0);
        self.emitter.patch_jump(end);
    }

    /// Emit branches taken when the condition is false; fall through when
    /// it is true. All returned labels need patching to the false target.
    pub fn branch_if_false(&mut self, expr: &Expr<'_>, out: &mut Vec<JumpLabel>) {
        self.branch(expr, false, out);
    }

    /// Emit branches taken when the condition is true.
    pub fn branch_if_true(&mut self, expr: &Expr<'_>, out: &mut Vec<JumpLabel>) {
        self.branch(expr, true, out);
    }

    fn branch(&mut self, expr: &Expr<'_>, jump_on_true: bool, out: &mut Vec<JumpLabel>) {
        // Folded conditions branch unconditionally or not at all.
        if let Some(constant) = self.info(expr.id).and_then(|i| i.constant.clone()) {
            if constant.is_true() == jump_on_true {
                out.push(self.emitter.emit_jump(OpCode::Goto));
            }
            return;
        }

        match &expr.kind {
            ExprKind::Unary {
                op: UnaryOp::Not,
                operand,
            } if matches!(
                self.info(expr.id).map(|i| &i.shape),
                Some(ExprShape::Unary(_))
            ) =>
            {
                self.branch(operand, !jump_on_true, out);
            }
            ExprKind::Binary {
                op: BinaryOp::And,
                lhs,
                rhs,
            } => {
                if jump_on_true {
                    let mut lhs_false = Vec::new();
                    self.branch(lhs, false, &mut lhs_false);
                    self.branch(rhs, true, out);
                    for label in lhs_false {
                        self.emitter.patch_jump(label);
                    }
                } else {
                    self.branch(lhs, false, out);
                    self.branch(rhs, false, out);
                }
            }
            ExprKind::Binary {
                op: BinaryOp::Or,
                lhs,
                rhs,
            } => {
                if jump_on_true {
                    self.branch(lhs, true, out);
                    self.branch(rhs, true, out);
                } else {
                    let mut lhs_true = Vec::new();
                    self.branch(lhs, true, &mut lhs_true);
                    self.branch(rhs, false, out);
                    for label in lhs_true {
                        self.emitter.patch_jump(label);
                    }
                }
            }
            ExprKind::Binary { op, lhs, rhs } if op.is_comparison() => {
                self.branch_comparison(expr, *op, lhs, rhs, jump_on_true, out);
            }
            _ => {
                // any other boolean-valued expression materializes first
                self.generate_value(expr);
                let op = if jump_on_true {
                    OpCode::IfNe
                } else {
                    OpCode::IfEq
                };
                out.push(self.emitter.emit_jump(op));
            }
        }
    }

    fn branch_comparison(
        &mut self,
        expr: &Expr<'_>,
        op: BinaryOp,
        lhs: &Expr<'_>,
        rhs: &Expr<'_>,
        jump_on_true: bool,
        out: &mut Vec<JumpLabel>,
    ) {
        let shape = self.info(expr.id).map(|i| i.shape.clone());
        let branch_op = if jump_on_true { op } else { negate(op) };
        match shape {
            Some(ExprShape::Binary(OperationShape::ReferenceCompare)) => {
                // null-literal comparisons use the one-operand null branches
                if matches!(rhs.kind, ExprKind::Null) {
                    self.generate_value(lhs);
                    out.push(self.emitter.emit_jump(null_branch(branch_op)));
                } else if matches!(lhs.kind, ExprKind::Null) {
                    self.generate_value(rhs);
                    out.push(self.emitter.emit_jump(null_branch(branch_op)));
                } else {
                    self.generate_value(lhs);
                    self.live.push(ValueKind::Reference);
                    self.generate_value(rhs);
                    self.live.pop();
                    let jump = match branch_op {
                        BinaryOp::Eq => OpCode::IfACmpEq,
                        _ => OpCode::IfACmpNe,
                    };
                    out.push(self.emitter.emit_jump(jump));
                }
            }
            Some(ExprShape::Binary(OperationShape::Primitive {
                kind, left, right, ..
            })) => {
                let value_kind = ValueKind::of_primitive(kind);
                if value_kind == ValueKind::Int {
                    // comparison against constant zero drops one operand
                    if self.is_int_zero(rhs) {
                        self.generate_value(lhs);
                        self.apply_conversion(lhs, left);
                        out.push(self.emitter.emit_jump(zero_branch(branch_op)));
                        return;
                    }
                    if self.is_int_zero(lhs) {
                        self.generate_value(rhs);
                        self.apply_conversion(rhs, right);
                        out.push(self.emitter.emit_jump(zero_branch(mirror(branch_op))));
                        return;
                    }
                    self.generate_value(lhs);
                    self.apply_conversion(lhs, left);
                    self.live.push(value_kind);
                    self.generate_value(rhs);
                    self.live.pop();
                    self.apply_conversion(rhs, right);
                    out.push(self.emitter.emit_jump(int_compare_branch(branch_op)));
                    return;
                }
                self.generate_value(lhs);
                self.apply_conversion(lhs, left);
                self.live.push(value_kind);
                self.generate_value(rhs);
                self.live.pop();
                self.apply_conversion(rhs, right);
                self.emitter.emit(compare_instruction(op, value_kind));
                out.push(self.emitter.emit_jump(zero_branch(branch_op)));
            }
            Some(ExprShape::Overload(target)) => {
                self.generate_overload_binary(&target, lhs, rhs);
                let jump = if jump_on_true {
                    OpCode::IfNe
                } else {
                    OpCode::IfEq
                };
                out.push(self.emitter.emit_jump(jump));
            }
            _ => {}
        }
    }

    fn is_int_zero(&self, expr: &Expr<'_>) -> bool {
        self.info(expr.id)
            .and_then(|i| i.constant.as_ref())
            .and_then(Constant::as_int)
            == Some(0)
    }

    // ======================================================================
    // Unary operations
    // ======================================================================

    fn generate_unary(&mut self, expr: &Expr<'_>, op: UnaryOp, operand: &Expr<'_>) {
        let shape = self.info(expr.id).map(|i| i.shape.clone());
        match shape {
            Some(ExprShape::Unary(unary)) => match op {
                UnaryOp::Plus => {
                    self.generate_value(operand);
                    self.apply_conversion(operand, unary.operand);
                }
                UnaryOp::Neg => {
                    self.generate_value(operand);
                    self.apply_conversion(operand, unary.operand);
                    self.emitter.emit(match ValueKind::of_primitive(unary.kind) {
                        ValueKind::Int => OpCode::INeg,
                        ValueKind::Long => OpCode::LNeg,
                        ValueKind::Float => OpCode::FNeg,
                        ValueKind::Double => OpCode::DNeg,
                        ValueKind::Reference => unreachable!("negation is numeric"),
                    });
                }
                UnaryOp::Not => self.generate_eager_boolean(expr),
                UnaryOp::BitNot => {
                    self.generate_value(operand);
                    self.apply_conversion(operand, unary.operand);
                    match ValueKind::of_primitive(unary.kind) {
                        ValueKind::Long => {
                            self.emitter.emit_long(-1);
                            self.emitter.emit(OpCode::LXor);
                        }
                        _ => {
                            self.emitter.emit(OpCode::IConstM1);
                            self.emitter.emit(OpCode::IXor);
                        }
                    }
                }
                UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => {
                    self.generate_inc_dec(op, operand, &unary, true);
                }
            },
            Some(ExprShape::Overload(target)) => {
                self.generate_value(operand);
                self.invoke_overload(&target, 0);
            }
            _ => {}
        }
    }

    /// `++`/`--` on a local. Int locals use `iinc`; other kinds reload,
    /// adjust and store.
    fn generate_inc_dec(
        &mut self,
        op: UnaryOp,
        operand: &Expr<'_>,
        shape: &crate::conversion::UnaryShape,
        value_required: bool,
    ) {
        let ExprKind::Local { local, .. } = operand.kind else {
            return;
        };
        let delta: i16 = match op {
            UnaryOp::PreInc | UnaryOp::PostInc => 1,
            _ => -1,
        };
        let post = matches!(op, UnaryOp::PostInc | UnaryOp::PostDec);
        let kind = ValueKind::of_primitive(shape.kind);

        if kind == ValueKind::Int && shape.kind == PrimitiveId::Int {
            if value_required && post {
                self.emitter.emit_load_local(local, kind);
            }
            self.emitter.emit_iinc(local, delta);
            if value_required && !post {
                self.emitter.emit_load_local(local, kind);
            }
            return;
        }

        self.emitter.emit_load_local(local, kind);
        if value_required && post {
            self.emitter
                .emit(if kind.slots() == 2 { OpCode::Dup2 } else { OpCode::Dup });
        }
        match kind {
            ValueKind::Int => {
                self.emitter.emit_int(delta as i32);
                self.emitter.emit(OpCode::IAdd);
            }
            ValueKind::Long => {
                self.emitter.emit_long(delta as i64);
                self.emitter.emit(OpCode::LAdd);
            }
            ValueKind::Float => {
                self.emitter.emit_float(delta as f32);
                self.emitter.emit(OpCode::FAdd);
            }
            ValueKind::Double => {
                self.emitter.emit_double(delta as f64);
                self.emitter.emit(OpCode::DAdd);
            }
            ValueKind::Reference => return,
        }
        // sub-int locals narrow back to their declared type
        if let Some(narrow) = narrowing_op(shape.kind) {
            self.emitter.emit(narrow);
        }
        if value_required && !post {
            self.emitter
                .emit(if kind.slots() == 2 { OpCode::Dup2 } else { OpCode::Dup });
        }
        self.emitter.emit_store_local(local, kind);
    }

    // ======================================================================
    // Assignment, indexing, calls, casts
    // ======================================================================

    fn generate_assign(
        &mut self,
        expr: &Expr<'_>,
        op: Option<BinaryOp>,
        target: &Expr<'_>,
        value: &Expr<'_>,
        value_required: bool,
    ) {
        let assign_shape = self.info(expr.id).map(|i| i.shape.clone());
        match &target.kind {
            ExprKind::Local { local, .. } => {
                let kind = self.result_kind(target);
                match (op, assign_shape) {
                    (None, shape) => {
                        self.generate_value(value);
                        if let Some(ExprShape::Assign { value: conv }) = shape {
                            self.apply_conversion(value, conv);
                        }
                    }
                    (
                        Some(op),
                        Some(ExprShape::CompoundAssign(OperationShape::Primitive {
                            kind: op_kind,
                            left,
                            right,
                            ..
                        })),
                    ) => {
                        self.emitter.emit_load_local(*local, kind);
                        self.apply_conversion(target, left);
                        let op_value_kind = ValueKind::of_primitive(op_kind);
                        self.live.push(op_value_kind);
                        self.generate_value(value);
                        self.live.pop();
                        self.apply_conversion(value, right);
                        self.emitter.emit(arith_opcode(op, op_value_kind));
                        // the result casts implicitly back to the target's
                        // declared type before the store
                        if let Some(target_prim) = self
                            .info(target.id)
                            .and_then(|i| i.ty)
                            .and_then(|ty| self.registry.get_type(ty))
                            .and_then(|t| t.primitive_id())
                        {
                            for cast in primitive_cast_ops(op_kind, target_prim) {
                                self.emitter.emit(cast);
                            }
                        }
                    }
                    (
                        Some(_),
                        Some(ExprShape::CompoundAssign(OperationShape::StringConcat { .. })),
                    ) => {
                        self.emitter.emit_load_local(*local, kind);
                        self.live.push(ValueKind::Reference);
                        self.generate_value(value);
                        self.live.pop();
                        self.emitter.emit_invoke_dynamic(concat_bootstrap(), 2, 1);
                    }
                    _ => return,
                }
                if value_required {
                    self.emitter
                        .emit(if kind.slots() == 2 { OpCode::Dup2 } else { OpCode::Dup });
                }
                self.emitter.emit_store_local(*local, kind);
            }
            ExprKind::ArrayRef { array, index } => {
                let conversion = match assign_shape {
                    Some(ExprShape::Assign { value }) => value,
                    _ => OperandConversion::default(),
                };
                self.generate_indexed_store(target, array, index, value, conversion, value_required);
            }
            _ => {}
        }
    }

    fn generate_indexed_store(
        &mut self,
        target: &Expr<'_>,
        array: &Expr<'_>,
        index: &Expr<'_>,
        value: &Expr<'_>,
        conversion: OperandConversion,
        value_required: bool,
    ) {
        let shape = self.info(target.id).map(|i| i.shape.clone());
        match shape {
            Some(ExprShape::ArrayIndex { elem }) => {
                let elem_kind = self.kind_of(Some(elem));
                self.generate_value(array);
                self.live.push(ValueKind::Reference);
                self.generate_value(index);
                self.live.push(ValueKind::Int);
                self.generate_value(value);
                self.live.truncate(self.live.len() - 2);
                self.apply_conversion(value, conversion);
                let temp = if value_required {
                    let t = self.emitter.alloc_temp(elem_kind);
                    self.emitter.emit_store_local(t, elem_kind);
                    self.emitter.emit_load_local(t, elem_kind);
                    Some(t)
                } else {
                    None
                };
                self.emitter.emit(array_store_op(elem, elem_kind));
                if let Some(t) = temp {
                    self.emitter.emit_load_local(t, elem_kind);
                }
            }
            Some(ExprShape::IndexerMethods { put: Some(put), .. }) => {
                self.generate_value(array);
                self.live.push(ValueKind::Reference);
                self.generate_value(index);
                self.live.push(self.result_kind(index));
                self.generate_value(value);
                self.live.truncate(self.live.len() - 2);
                self.apply_conversion(value, conversion);
                let value_kind = if conversion == OperandConversion::default() {
                    self.result_kind(value)
                } else {
                    self.result_kind(target)
                };
                let temp = if value_required {
                    let t = self.emitter.alloc_temp(value_kind);
                    self.emitter.emit_store_local(t, value_kind);
                    self.emitter.emit_load_local(t, value_kind);
                    Some(t)
                } else {
                    None
                };
                let index_slots = self.result_kind(index).slots();
                let ret = self
                    .registry
                    .get_method(put)
                    .map(|m| {
                        if m.return_type == well_known::VOID {
                            0
                        } else {
                            self.kind_of(Some(m.return_type)).slots()
                        }
                    })
                    .unwrap_or(0);
                self.emitter
                    .emit_invoke_virtual(put, index_slots + value_kind.slots(), ret);
                if ret > 0 {
                    self.emitter
                        .emit(if ret == 2 { OpCode::Pop2 } else { OpCode::Pop });
                }
                if let Some(t) = temp {
                    self.emitter.emit_load_local(t, value_kind);
                }
            }
            _ => {}
        }
    }

    fn generate_array_read(&mut self, expr: &Expr<'_>, array: &Expr<'_>, index: &Expr<'_>) {
        let shape = self.info(expr.id).map(|i| i.shape.clone());
        match shape {
            Some(ExprShape::ArrayIndex { elem }) => {
                self.generate_value(array);
                self.live.push(ValueKind::Reference);
                self.generate_value(index);
                self.live.pop();
                self.emitter
                    .emit(array_load_op(elem, self.kind_of(Some(elem))));
            }
            Some(ExprShape::IndexerMethods { get: Some(get), .. }) => {
                self.generate_value(array);
                self.live.push(ValueKind::Reference);
                self.generate_value(index);
                self.live.pop();
                let index_slots = self.result_kind(index).slots();
                let ret = self
                    .registry
                    .get_method(get)
                    .map(|m| self.kind_of(Some(m.return_type)).slots())
                    .unwrap_or(1);
                self.emitter.emit_invoke_virtual(get, index_slots, ret);
            }
            _ => {}
        }
    }

    fn generate_call(&mut self, expr: &Expr<'_>, receiver: &Expr<'_>, args: &[&Expr<'_>]) {
        let Some(ExprShape::Call { method }) = self.info(expr.id).map(|i| i.shape.clone()) else {
            return;
        };
        self.generate_value(receiver);
        self.live.push(ValueKind::Reference);
        let mut arg_slots = 0;
        for arg in args {
            self.generate_value(arg);
            let kind = self.result_kind(arg);
            arg_slots += kind.slots();
            self.live.push(kind);
        }
        self.live.truncate(self.live.len() - args.len() - 1);
        let ret = self
            .registry
            .get_method(method)
            .map(|m| {
                if m.return_type == well_known::VOID {
                    0
                } else {
                    self.kind_of(Some(m.return_type)).slots()
                }
            })
            .unwrap_or(0);
        self.emitter.emit_invoke_virtual(method, arg_slots, ret);
    }

    fn generate_cast(&mut self, ty: TypeHash, operand: &Expr<'_>) {
        self.generate_value(operand);
        let target = self.registry.get_type(ty).and_then(|t| t.primitive_id());
        let source = self
            .info(operand.id)
            .and_then(|i| i.ty)
            .and_then(|ty| self.registry.get_type(ty))
            .and_then(|t| t.primitive_id());
        match (source, target) {
            (Some(from), Some(to)) => {
                for op in primitive_cast_ops(from, to) {
                    self.emitter.emit(op);
                }
            }
            _ => self.emitter.emit_checkcast(ty),
        }
    }
}

// ==========================================================================
// Instruction tables
// ==========================================================================

/// `String.valueOf`-free concatenation bootstrap.
fn concat_bootstrap() -> TypeHash {
    TypeHash::for_method(
        well_known::STRING,
        "makeConcat",
        &[well_known::OBJECT, well_known::OBJECT],
    )
}

/// Unboxing conversion method for a wrapper.
fn unbox_method(id: PrimitiveId) -> TypeHash {
    let (owner, name) = match id {
        PrimitiveId::Boolean => (well_known::BOXED_BOOLEAN, "booleanValue"),
        PrimitiveId::Byte => (well_known::BOXED_BYTE, "byteValue"),
        PrimitiveId::Char => (well_known::BOXED_CHAR, "charValue"),
        PrimitiveId::Short => (well_known::BOXED_SHORT, "shortValue"),
        PrimitiveId::Int => (well_known::BOXED_INT, "intValue"),
        PrimitiveId::Long => (well_known::BOXED_LONG, "longValue"),
        PrimitiveId::Float => (well_known::BOXED_FLOAT, "floatValue"),
        PrimitiveId::Double => (well_known::BOXED_DOUBLE, "doubleValue"),
    };
    TypeHash::for_method(owner, name, &[])
}

/// Narrowing instruction bringing an int back to a sub-int local type.
fn narrowing_op(id: PrimitiveId) -> Option<OpCode> {
    match id {
        PrimitiveId::Byte => Some(OpCode::I2B),
        PrimitiveId::Short => Some(OpCode::I2S),
        PrimitiveId::Char => Some(OpCode::I2C),
        _ => None,
    }
}

/// Arithmetic/bitwise/shift instruction for an operator in a category.
fn arith_opcode(op: BinaryOp, kind: ValueKind) -> OpCode {
    use OpCode::*;
    match (op, kind) {
        (BinaryOp::Add, ValueKind::Int) => IAdd,
        (BinaryOp::Sub, ValueKind::Int) => ISub,
        (BinaryOp::Mul, ValueKind::Int) => IMul,
        (BinaryOp::Div, ValueKind::Int) => IDiv,
        (BinaryOp::Rem, ValueKind::Int) => IRem,
        (BinaryOp::Shl, ValueKind::Int) => IShl,
        (BinaryOp::Shr, ValueKind::Int) => IShr,
        (BinaryOp::Ushr, ValueKind::Int) => IUshr,
        (BinaryOp::BitAnd, ValueKind::Int) => IAnd,
        (BinaryOp::BitOr, ValueKind::Int) => IOr,
        (BinaryOp::BitXor, ValueKind::Int) => IXor,
        (BinaryOp::Add, ValueKind::Long) => LAdd,
        (BinaryOp::Sub, ValueKind::Long) => LSub,
        (BinaryOp::Mul, ValueKind::Long) => LMul,
        (BinaryOp::Div, ValueKind::Long) => LDiv,
        (BinaryOp::Rem, ValueKind::Long) => LRem,
        (BinaryOp::Shl, ValueKind::Long) => LShl,
        (BinaryOp::Shr, ValueKind::Long) => LShr,
        (BinaryOp::Ushr, ValueKind::Long) => LUshr,
        (BinaryOp::BitAnd, ValueKind::Long) => LAnd,
        (BinaryOp::BitOr, ValueKind::Long) => LOr,
        (BinaryOp::BitXor, ValueKind::Long) => LXor,
        (BinaryOp::Add, ValueKind::Float) => FAdd,
        (BinaryOp::Sub, ValueKind::Float) => FSub,
        (BinaryOp::Mul, ValueKind::Float) => FMul,
        (BinaryOp::Div, ValueKind::Float) => FDiv,
        (BinaryOp::Rem, ValueKind::Float) => FRem,
        (BinaryOp::Add, ValueKind::Double) => DAdd,
        (BinaryOp::Sub, ValueKind::Double) => DSub,
        (BinaryOp::Mul, ValueKind::Double) => DMul,
        (BinaryOp::Div, ValueKind::Double) => DDiv,
        (BinaryOp::Rem, ValueKind::Double) => DRem,
        _ => unreachable!("no instruction for {op:?} in {kind:?}"),
    }
}

/// Negate a comparison operator.
fn negate(op: BinaryOp) -> BinaryOp {
    match op {
        BinaryOp::Lt => BinaryOp::Ge,
        BinaryOp::Le => BinaryOp::Gt,
        BinaryOp::Gt => BinaryOp::Le,
        BinaryOp::Ge => BinaryOp::Lt,
        BinaryOp::Eq => BinaryOp::Ne,
        BinaryOp::Ne => BinaryOp::Eq,
        other => other,
    }
}

/// Mirror a comparison across its operands (`0 < x` becomes `x > 0`).
fn mirror(op: BinaryOp) -> BinaryOp {
    match op {
        BinaryOp::Lt => BinaryOp::Gt,
        BinaryOp::Le => BinaryOp::Ge,
        BinaryOp::Gt => BinaryOp::Lt,
        BinaryOp::Ge => BinaryOp::Le,
        other => other,
    }
}

/// Two-operand int comparison branch.
fn int_compare_branch(op: BinaryOp) -> OpCode {
    match op {
        BinaryOp::Lt => OpCode::IfICmpLt,
        BinaryOp::Le => OpCode::IfICmpLe,
        BinaryOp::Gt => OpCode::IfICmpGt,
        BinaryOp::Ge => OpCode::IfICmpGe,
        BinaryOp::Eq => OpCode::IfICmpEq,
        _ => OpCode::IfICmpNe,
    }
}

/// One-operand comparison-with-zero branch.
fn zero_branch(op: BinaryOp) -> OpCode {
    match op {
        BinaryOp::Lt => OpCode::IfLt,
        BinaryOp::Le => OpCode::IfLe,
        BinaryOp::Gt => OpCode::IfGt,
        BinaryOp::Ge => OpCode::IfGe,
        BinaryOp::Eq => OpCode::IfEq,
        _ => OpCode::IfNe,
    }
}

/// One-operand null-check branch.
fn null_branch(op: BinaryOp) -> OpCode {
    match op {
        BinaryOp::Eq => OpCode::IfNull,
        _ => OpCode::IfNonNull,
    }
}

/// Comparison instruction for long/float/double operands.
///
/// Floating comparisons pick the NaN direction that fails the original
/// relation: `<`/`<=` use the `+1`-on-NaN form, `>`/`>=` the `-1` form.
fn compare_instruction(op: BinaryOp, kind: ValueKind) -> OpCode {
    match kind {
        ValueKind::Long => OpCode::LCmp,
        ValueKind::Float => match op {
            BinaryOp::Lt | BinaryOp::Le => OpCode::FCmpG,
            _ => OpCode::FCmpL,
        },
        ValueKind::Double => match op {
            BinaryOp::Lt | BinaryOp::Le => OpCode::DCmpG,
            _ => OpCode::DCmpL,
        },
        _ => unreachable!("int comparisons branch directly"),
    }
}

fn array_load_op(elem: TypeHash, kind: ValueKind) -> OpCode {
    match elem {
        well_known::BYTE | well_known::BOOLEAN => OpCode::BALoad,
        well_known::CHAR => OpCode::CALoad,
        well_known::SHORT => OpCode::SALoad,
        _ => match kind {
            ValueKind::Int => OpCode::IALoad,
            ValueKind::Long => OpCode::LALoad,
            ValueKind::Float => OpCode::FALoad,
            ValueKind::Double => OpCode::DALoad,
            ValueKind::Reference => OpCode::AALoad,
        },
    }
}

fn array_store_op(elem: TypeHash, kind: ValueKind) -> OpCode {
    match elem {
        well_known::BYTE | well_known::BOOLEAN => OpCode::BAStore,
        well_known::CHAR => OpCode::CAStore,
        well_known::SHORT => OpCode::SAStore,
        _ => match kind {
            ValueKind::Int => OpCode::IAStore,
            ValueKind::Long => OpCode::LAStore,
            ValueKind::Float => OpCode::FAStore,
            ValueKind::Double => OpCode::DAStore,
            ValueKind::Reference => OpCode::AAStore,
        },
    }
}

/// Instruction sequence for a primitive cast, possibly two steps
/// (`long -> byte` is `l2i` then `i2b`).
fn primitive_cast_ops(from: PrimitiveId, to: PrimitiveId) -> Vec<OpCode> {
    use PrimitiveId::*;
    if from == to {
        return Vec::new();
    }
    let mut ops = Vec::new();
    let int_stage = match from {
        Long => {
            ops.push(match to {
                Float => OpCode::L2F,
                Double => OpCode::L2D,
                _ => OpCode::L2I,
            });
            matches!(to, Byte | Short | Char | Int)
        }
        Float => {
            ops.push(match to {
                Long => OpCode::F2L,
                Double => OpCode::F2D,
                _ => OpCode::F2I,
            });
            matches!(to, Byte | Short | Char | Int)
        }
        Double => {
            ops.push(match to {
                Long => OpCode::D2L,
                Float => OpCode::D2F,
                _ => OpCode::D2I,
            });
            matches!(to, Byte | Short | Char | Int)
        }
        Boolean => false,
        // sub-int and int sources already compute as int
        _ => {
            match to {
                Long => ops.push(OpCode::I2L),
                Float => ops.push(OpCode::I2F),
                Double => ops.push(OpCode::I2D),
                _ => {}
            }
            matches!(to, Byte | Short | Char)
        }
    };
    if int_stage
        && let Some(narrow) = narrowing_op(to)
    {
        ops.push(narrow);
    }
    ops
}
