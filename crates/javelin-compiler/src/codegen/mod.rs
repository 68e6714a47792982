//! Code generation.
//!
//! [`CodeEmitter`] is the high-level emission API: it owns the chunk for one
//! member, shares the module-level [`ConstantPool`], manages forward jumps
//! and switch break contexts, and knows how to spill the live operand stack
//! to temporaries around pattern dispatch.

mod chunk;
pub mod expr;
mod jumps;
mod opcode;

pub use chunk::CodeChunk;
pub use opcode::OpCode;

use javelin_core::binding::PrimitiveId;
use javelin_core::constant::{Constant, ConstantPool, PoolEntry};
use javelin_core::hash::TypeHash;

use jumps::JumpManager;

/// Stack/local categories of generated values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Long,
    Float,
    Double,
    Reference,
}

impl ValueKind {
    /// Category a primitive computes in (sub-int types compute as int).
    pub fn of_primitive(id: PrimitiveId) -> Self {
        match id {
            PrimitiveId::Long => ValueKind::Long,
            PrimitiveId::Float => ValueKind::Float,
            PrimitiveId::Double => ValueKind::Double,
            _ => ValueKind::Int,
        }
    }

    /// Stack slots occupied by a value of this kind.
    pub fn slots(&self) -> i32 {
        match self {
            ValueKind::Long | ValueKind::Double => 2,
            _ => 1,
        }
    }

    fn load_op(&self) -> OpCode {
        match self {
            ValueKind::Int => OpCode::ILoad,
            ValueKind::Long => OpCode::LLoad,
            ValueKind::Float => OpCode::FLoad,
            ValueKind::Double => OpCode::DLoad,
            ValueKind::Reference => OpCode::ALoad,
        }
    }

    fn store_op(&self) -> OpCode {
        match self {
            ValueKind::Int => OpCode::IStore,
            ValueKind::Long => OpCode::LStore,
            ValueKind::Float => OpCode::FStore,
            ValueKind::Double => OpCode::DStore,
            ValueKind::Reference => OpCode::AStore,
        }
    }
}

/// A label for a forward jump that needs patching.
#[derive(Debug, Clone, Copy)]
pub struct JumpLabel(pub(crate) usize);

impl JumpLabel {
    pub fn offset(&self) -> usize {
        self.0
    }
}

/// A spilled stack value: which temp slot it went to and its kind.
#[derive(Debug, Clone, Copy)]
pub struct SpillSlot {
    slot: u32,
    kind: ValueKind,
}

/// Emits instructions for a single member.
///
/// The constant pool is shared across all emitters of a module so equal
/// constants dedup to one entry.
pub struct CodeEmitter<'pool> {
    chunk: CodeChunk,
    pool: &'pool mut ConstantPool,
    jumps: JumpManager,
    current_line: u32,
    /// First local slot free for emitter temporaries.
    next_temp: u32,
}

impl<'pool> CodeEmitter<'pool> {
    /// Create an emitter. `first_temp_slot` is the first local slot past
    /// the member's declared locals, free for spill temporaries.
    pub fn new(pool: &'pool mut ConstantPool, first_temp_slot: u32) -> Self {
        Self {
            chunk: CodeChunk::new(),
            pool,
            jumps: JumpManager::new(),
            current_line: 1,
            next_temp: first_temp_slot,
        }
    }

    /// Set the source line for subsequent instructions.
    pub fn set_line(&mut self, line: u32) {
        self.current_line = line;
    }

    pub fn current_line(&self) -> u32 {
        self.current_line
    }

    // ==========================================================================
    // Basic emission
    // ==========================================================================

    /// Emit an opcode with no operands.
    pub fn emit(&mut self, op: OpCode) {
        self.chunk.write_op(op, self.current_line);
    }

    /// Emit an opcode with a u16 operand.
    pub fn emit_u16(&mut self, op: OpCode, value: u16) {
        self.chunk.write_op(op, self.current_line);
        self.chunk.write_u16(value, self.current_line);
    }

    /// Write a raw u32 operand (switch tables).
    pub fn write_u32(&mut self, value: u32) {
        self.chunk.write_u32(value, self.current_line);
    }

    // ==========================================================================
    // Constants
    // ==========================================================================

    /// Push an int, choosing the narrowest encoding.
    pub fn emit_int(&mut self, value: i32) {
        match value {
            -1 => self.emit(OpCode::IConstM1),
            0 => self.emit(OpCode::IConst0),
            1 => self.emit(OpCode::IConst1),
            v if (i8::MIN as i32..=i8::MAX as i32).contains(&v) => {
                self.emit(OpCode::Bipush);
                self.chunk.write_byte(v as i8 as u8, self.current_line);
            }
            v if (i16::MIN as i32..=i16::MAX as i32).contains(&v) => {
                self.emit(OpCode::Sipush);
                self.chunk.write_u16(v as i16 as u16, self.current_line);
            }
            v => {
                let index = self.pool.add(PoolEntry::Int(v));
                self.emit_u16(OpCode::Ldc, index);
            }
        }
    }

    pub fn emit_long(&mut self, value: i64) {
        match value {
            0 => self.emit(OpCode::LConst0),
            1 => self.emit(OpCode::LConst1),
            v => {
                let index = self.pool.add(PoolEntry::Long(v));
                self.emit_u16(OpCode::Ldc2, index);
            }
        }
    }

    pub fn emit_float(&mut self, value: f32) {
        if value == 0.0 && value.is_sign_positive() {
            self.emit(OpCode::FConst0);
        } else {
            let index = self.pool.add(PoolEntry::Float(value));
            self.emit_u16(OpCode::Ldc, index);
        }
    }

    pub fn emit_double(&mut self, value: f64) {
        if value == 0.0 && value.is_sign_positive() {
            self.emit(OpCode::DConst0);
        } else {
            let index = self.pool.add(PoolEntry::Double(value));
            self.emit_u16(OpCode::Ldc2, index);
        }
    }

    pub fn emit_string(&mut self, value: &str) {
        let index = self.pool.add(PoolEntry::Str(value.to_string()));
        self.emit_u16(OpCode::Ldc, index);
    }

    pub fn emit_bool(&mut self, value: bool) {
        self.emit(if value { OpCode::IConst1 } else { OpCode::IConst0 });
    }

    pub fn emit_null(&mut self) {
        self.emit(OpCode::AConstNull);
    }

    /// Push a folded constant value.
    pub fn emit_constant(&mut self, value: &Constant) {
        match value {
            Constant::Bool(v) => self.emit_bool(*v),
            Constant::Byte(v) => self.emit_int(*v as i32),
            Constant::Char(v) => self.emit_int(*v as i32),
            Constant::Short(v) => self.emit_int(*v as i32),
            Constant::Int(v) => self.emit_int(*v),
            Constant::Long(v) => self.emit_long(*v),
            Constant::Float(v) => self.emit_float(*v),
            Constant::Double(v) => self.emit_double(*v),
            Constant::Str(s) => self.emit_string(s),
        }
    }

    // ==========================================================================
    // Locals
    // ==========================================================================

    pub fn emit_load_local(&mut self, slot: u32, kind: ValueKind) {
        self.emit_u16(kind.load_op(), slot as u16);
    }

    pub fn emit_store_local(&mut self, slot: u32, kind: ValueKind) {
        self.emit_u16(kind.store_op(), slot as u16);
    }

    /// Increment an int local in place.
    pub fn emit_iinc(&mut self, slot: u32, delta: i16) {
        self.emit(OpCode::IInc);
        self.chunk.write_u16(slot as u16, self.current_line);
        self.chunk.write_u16(delta as u16, self.current_line);
    }

    /// Reserve a fresh temporary local slot for a value of `kind`.
    pub fn alloc_temp(&mut self, kind: ValueKind) -> u32 {
        let slot = self.next_temp;
        self.next_temp += kind.slots() as u32;
        slot
    }

    // ==========================================================================
    // Calls
    // ==========================================================================

    /// Call an instance method. `arg_slots` counts argument slots excluding
    /// the receiver; `ret_slots` is the return value width (0 for void).
    pub fn emit_invoke_virtual(&mut self, method: TypeHash, arg_slots: i32, ret_slots: i32) {
        let index = self.pool.add(PoolEntry::MethodRef(method));
        self.emit_u16(OpCode::InvokeVirtual, index);
        self.chunk.adjust_depth(ret_slots - arg_slots - 1);
    }

    /// Call a static method.
    pub fn emit_invoke_static(&mut self, method: TypeHash, arg_slots: i32, ret_slots: i32) {
        let index = self.pool.add(PoolEntry::MethodRef(method));
        self.emit_u16(OpCode::InvokeStatic, index);
        self.chunk.adjust_depth(ret_slots - arg_slots);
    }

    /// Bootstrap-dispatched callsite (pattern switch dispatch).
    pub fn emit_invoke_dynamic(&mut self, bootstrap: TypeHash, arg_slots: i32, ret_slots: i32) {
        let index = self.pool.add(PoolEntry::Dynamic(bootstrap));
        self.emit_u16(OpCode::InvokeDynamic, index);
        self.chunk.adjust_depth(ret_slots - arg_slots);
    }

    // ==========================================================================
    // Types
    // ==========================================================================

    pub fn emit_checkcast(&mut self, ty: TypeHash) {
        let index = self.pool.add(PoolEntry::Class(ty));
        self.emit_u16(OpCode::CheckCast, index);
    }

    pub fn emit_instanceof(&mut self, ty: TypeHash) {
        let index = self.pool.add(PoolEntry::Class(ty));
        self.emit_u16(OpCode::InstanceOf, index);
    }

    // ==========================================================================
    // Jumps
    // ==========================================================================

    /// Emit a forward branch; patch with [`CodeEmitter::patch_jump`].
    pub fn emit_jump(&mut self, op: OpCode) -> JumpLabel {
        JumpLabel(self.chunk.emit_jump(op, self.current_line))
    }

    pub fn patch_jump(&mut self, label: JumpLabel) {
        self.chunk.patch_jump(label.0);
    }

    /// Emit a backward branch to an already-emitted offset.
    pub fn emit_back_jump(&mut self, target: usize) {
        self.chunk.emit_back_jump(target, self.current_line);
    }

    pub fn current_offset(&self) -> usize {
        self.chunk.current_offset()
    }

    /// Patch a 32-bit switch table slot in place.
    pub fn patch_u32(&mut self, at: usize, value: u32) {
        self.chunk.patch_u32(at, value);
    }

    /// Reset the simulated stack depth at a join point.
    pub fn set_depth(&mut self, depth: i32) {
        self.chunk.set_depth(depth);
    }

    /// Current simulated stack depth.
    pub fn depth(&self) -> i32 {
        self.chunk.depth()
    }

    // ==========================================================================
    // Switch contexts
    // ==========================================================================

    pub fn enter_switch(&mut self) {
        self.jumps.enter_switch();
    }

    /// Exit the switch, patching all pending breaks to land here.
    pub fn exit_switch(&mut self) {
        for label in self.jumps.exit_switch() {
            self.patch_jump(label);
        }
    }

    pub fn in_switch(&self) -> bool {
        self.jumps.in_switch()
    }

    /// Emit a `break`. Returns false when not inside a switch; the resolver
    /// diagnoses that case before codegen runs.
    pub fn emit_break(&mut self) -> bool {
        if !self.jumps.in_switch() {
            return false;
        }
        let label = self.emit_jump(OpCode::Goto);
        self.jumps.add_break(label)
    }

    // ==========================================================================
    // Stack spill for pattern dispatch
    // ==========================================================================

    /// Store the live operand stack (given top-last) to fresh temporaries.
    ///
    /// Pattern dispatch re-enters its own code via a back jump, so any
    /// values below the selector must survive in locals across the jump.
    pub fn spill_stack(&mut self, live: &[ValueKind]) -> Vec<SpillSlot> {
        let mut spills = Vec::with_capacity(live.len());
        // Top of stack stores first.
        for &kind in live.iter().rev() {
            let slot = self.alloc_temp(kind);
            self.emit_store_local(slot, kind);
            spills.push(SpillSlot { slot, kind });
        }
        spills
    }

    /// Reload spilled values in original stack order.
    pub fn restore_stack(&mut self, spills: &[SpillSlot]) {
        for spill in spills.iter().rev() {
            self.emit_load_local(spill.slot, spill.kind);
        }
    }

    // ==========================================================================
    // Finalization
    // ==========================================================================

    /// Finish and return the chunk.
    pub fn finish(self) -> CodeChunk {
        self.chunk
    }

    pub fn chunk(&self) -> &CodeChunk {
        &self.chunk
    }

    pub fn code_size(&self) -> usize {
        self.chunk.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_int_encodings() {
        let mut pool = ConstantPool::new();
        let mut emitter = CodeEmitter::new(&mut pool, 0);
        emitter.emit_int(0);
        emitter.emit_int(100);
        emitter.emit_int(1000);
        emitter.emit_int(100_000);
        let chunk = emitter.finish();
        chunk.assert_opcodes(&[
            OpCode::IConst0,
            OpCode::Bipush,
            OpCode::Sipush,
            OpCode::Ldc,
        ]);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn string_constants_dedup() {
        let mut pool = ConstantPool::new();
        let mut emitter = CodeEmitter::new(&mut pool, 0);
        emitter.emit_string("hello");
        emitter.emit_string("hello");
        emitter.finish();
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn invoke_adjusts_depth_by_signature() {
        let mut pool = ConstantPool::new();
        let mut emitter = CodeEmitter::new(&mut pool, 0);
        // receiver + one int arg, int return
        emitter.emit_null();
        emitter.emit_int(5);
        emitter.emit_invoke_virtual(TypeHash::from_name("m"), 1, 1);
        assert_eq!(emitter.chunk().depth(), 1);
        assert_eq!(emitter.chunk().max_stack(), 2);
    }

    #[test]
    fn jump_patching() {
        let mut pool = ConstantPool::new();
        let mut emitter = CodeEmitter::new(&mut pool, 0);
        emitter.emit_bool(true);
        let label = emitter.emit_jump(OpCode::IfEq);
        emitter.emit_int(1);
        emitter.patch_jump(label);
        emitter.emit_int(0);
        let chunk = emitter.finish();
        // IfEq at 1, operand at 2..4, IConst1 at 4
        assert_eq!(chunk.read_u16(2), Some(1));
    }

    #[test]
    fn break_patches_on_switch_exit() {
        let mut pool = ConstantPool::new();
        let mut emitter = CodeEmitter::new(&mut pool, 0);
        emitter.enter_switch();
        assert!(emitter.emit_break());
        emitter.emit_int(1);
        emitter.emit(OpCode::Pop);
        emitter.exit_switch();
        let chunk = emitter.finish();
        // goto operand patched to skip iconst_1 + pop
        assert_eq!(chunk.read_u16(1), Some(2));
    }

    #[test]
    fn break_outside_switch_is_rejected() {
        let mut pool = ConstantPool::new();
        let mut emitter = CodeEmitter::new(&mut pool, 0);
        assert!(!emitter.emit_break());
    }

    #[test]
    fn spill_and_restore_round_trip() {
        let mut pool = ConstantPool::new();
        let mut emitter = CodeEmitter::new(&mut pool, 4);
        emitter.emit_int(1);
        emitter.emit_long(2);
        let spills = emitter.spill_stack(&[ValueKind::Int, ValueKind::Long]);
        assert_eq!(emitter.chunk().depth(), 0);
        emitter.restore_stack(&spills);
        assert_eq!(emitter.chunk().depth(), 3);
        let chunk = emitter.finish();
        chunk.assert_opcodes(&[
            OpCode::IConst1,
            OpCode::Ldc2,
            // top (long) spills first
            OpCode::LStore,
            OpCode::IStore,
            OpCode::ILoad,
            OpCode::LLoad,
        ]);
    }

    #[test]
    fn temp_slots_respect_width() {
        let mut pool = ConstantPool::new();
        let mut emitter = CodeEmitter::new(&mut pool, 10);
        let a = emitter.alloc_temp(ValueKind::Double);
        let b = emitter.alloc_temp(ValueKind::Int);
        assert_eq!(a, 10);
        assert_eq!(b, 12);
    }
}
