//! Code chunk for a compiled member.
//!
//! A [`CodeChunk`] holds the instruction bytes for one method body plus a
//! parallel line table, and simulates operand stack depth as instructions
//! are written so `max_stack` is known when the chunk is sealed. Constants
//! live in the module-level pool, not per chunk.

use super::OpCode;

/// Compiled code for a single member.
#[derive(Debug, Clone, Default)]
pub struct CodeChunk {
    /// Instruction bytes.
    code: Vec<u8>,
    /// Line numbers, parallel to `code`.
    lines: Vec<u32>,
    /// Current simulated operand stack depth in slots.
    depth: i32,
    /// High-water mark of the simulated depth.
    max_stack: i32,
}

impl CodeChunk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write an opcode. Instructions with a statically known stack effect
    /// update the depth simulation; invokes go through
    /// [`CodeChunk::adjust_depth`] from the emitter.
    pub fn write_op(&mut self, op: OpCode, line: u32) {
        self.code.push(op as u8);
        self.lines.push(line);
        if let Some(effect) = op.stack_effect() {
            self.adjust_depth(effect);
        }
    }

    /// Apply a stack depth delta the opcode table cannot know (calls).
    pub fn adjust_depth(&mut self, delta: i32) {
        self.depth += delta;
        if self.depth > self.max_stack {
            self.max_stack = self.depth;
        }
    }

    /// Reset the simulated depth to a known value at a join point.
    pub fn set_depth(&mut self, depth: i32) {
        self.depth = depth;
    }

    /// Current simulated stack depth in slots.
    pub fn depth(&self) -> i32 {
        self.depth
    }

    /// Deepest the operand stack gets in this chunk.
    pub fn max_stack(&self) -> i32 {
        self.max_stack
    }

    /// Write a byte operand.
    pub fn write_byte(&mut self, byte: u8, line: u32) {
        self.code.push(byte);
        self.lines.push(line);
    }

    /// Write a 16-bit operand (big-endian).
    pub fn write_u16(&mut self, value: u16, line: u32) {
        self.code.push((value >> 8) as u8);
        self.lines.push(line);
        self.code.push(value as u8);
        self.lines.push(line);
    }

    /// Write a 32-bit operand (big-endian).
    pub fn write_u32(&mut self, value: u32, line: u32) {
        for shift in [24, 16, 8, 0] {
            self.code.push((value >> shift) as u8);
            self.lines.push(line);
        }
    }

    /// Current code offset (for jump patching).
    pub fn current_offset(&self) -> usize {
        self.code.len()
    }

    /// Emit a forward branch and return the operand offset to patch later.
    pub fn emit_jump(&mut self, op: OpCode, line: u32) -> usize {
        self.write_op(op, line);
        let offset = self.code.len();
        self.write_u16(0xFFFF, line);
        offset
    }

    /// Patch a forward branch to land at the current position.
    ///
    /// # Panics
    ///
    /// Panics if the jump distance exceeds `u16::MAX`.
    pub fn patch_jump(&mut self, offset: usize) {
        let distance = self.code.len() - offset - 2;
        assert!(
            distance <= u16::MAX as usize,
            "jump distance {} exceeds u16::MAX",
            distance
        );
        self.code[offset] = (distance >> 8) as u8;
        self.code[offset + 1] = distance as u8;
    }

    /// Patch a u32 slot (switch table entry) to the given code offset.
    pub fn patch_u32(&mut self, at: usize, value: u32) {
        self.code[at] = (value >> 24) as u8;
        self.code[at + 1] = (value >> 16) as u8;
        self.code[at + 2] = (value >> 8) as u8;
        self.code[at + 3] = value as u8;
    }

    /// Emit a backward branch to `target`.
    pub fn emit_back_jump(&mut self, target: usize, line: u32) {
        self.write_op(OpCode::GotoBack, line);
        let distance = self.code.len() - target + 2;
        assert!(
            distance <= u16::MAX as usize,
            "back jump distance {} exceeds u16::MAX",
            distance
        );
        self.write_u16(distance as u16, line);
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn lines(&self) -> &[u32] {
        &self.lines
    }

    pub fn line_at(&self, offset: usize) -> Option<u32> {
        self.lines.get(offset).copied()
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn read_byte(&self, offset: usize) -> Option<u8> {
        self.code.get(offset).copied()
    }

    /// Read a u16 at the given offset (big-endian).
    pub fn read_u16(&self, offset: usize) -> Option<u16> {
        if offset + 1 < self.code.len() {
            Some(((self.code[offset] as u16) << 8) | (self.code[offset + 1] as u16))
        } else {
            None
        }
    }

    /// Read a u32 at the given offset (big-endian).
    pub fn read_u32(&self, offset: usize) -> Option<u32> {
        if offset + 3 < self.code.len() {
            Some(
                ((self.code[offset] as u32) << 24)
                    | ((self.code[offset + 1] as u32) << 16)
                    | ((self.code[offset + 2] as u32) << 8)
                    | (self.code[offset + 3] as u32),
            )
        } else {
            None
        }
    }

    /// Read an opcode at the given offset.
    pub fn read_op(&self, offset: usize) -> Option<OpCode> {
        self.code.get(offset).and_then(|&b| OpCode::from_u8(b))
    }

    /// Total instruction width at `offset`, including variable switch
    /// tables.
    fn instruction_width(&self, offset: usize, op: OpCode) -> usize {
        let fixed = 1 + op.operand_size();
        match op {
            OpCode::TableSwitch => {
                let low = self.read_u32(offset + 5).unwrap_or(0);
                let high = self.read_u32(offset + 9).unwrap_or(0);
                let cases = high.wrapping_sub(low).wrapping_add(1) as usize;
                fixed + cases * 4
            }
            OpCode::LookupSwitch => {
                let pairs = self.read_u32(offset + 5).unwrap_or(0) as usize;
                fixed + pairs * 8
            }
            _ => fixed,
        }
    }

    /// Extract all opcodes, skipping operands (switch tables included).
    ///
    /// Useful for asserting instruction sequences without caring about
    /// operand values or exact offsets.
    pub fn opcodes(&self) -> Vec<OpCode> {
        let mut ops = Vec::new();
        let mut offset = 0;

        while offset < self.code.len() {
            if let Some(op) = self.read_op(offset) {
                ops.push(op);
                offset += self.instruction_width(offset, op);
            } else {
                offset += 1;
            }
        }

        ops
    }

    /// Assert the chunk contains exactly this opcode sequence.
    #[track_caller]
    pub fn assert_opcodes(&self, expected: &[OpCode]) {
        let actual = self.opcodes();
        assert_eq!(
            actual,
            expected,
            "Bytecode mismatch.\nExpected: {:?}\nActual:   {:?}",
            expected.iter().map(|op| op.name()).collect::<Vec<_>>(),
            actual.iter().map(|op| op.name()).collect::<Vec<_>>(),
        );
    }

    /// Assert these opcodes appear in order, not necessarily contiguously.
    #[track_caller]
    pub fn assert_contains_opcodes(&self, expected: &[OpCode]) {
        let actual = self.opcodes();
        let mut expected_iter = expected.iter().peekable();

        for op in &actual {
            if expected_iter.peek() == Some(&op) {
                expected_iter.next();
            }
        }

        if expected_iter.peek().is_some() {
            let remaining: Vec<_> = expected_iter.map(|op| op.name()).collect();
            panic!(
                "Missing opcodes in sequence.\nExpected to find: {:?}\nActual bytecode:  {:?}",
                remaining,
                actual.iter().map(|op| op.name()).collect::<Vec<_>>(),
            );
        }
    }
}
