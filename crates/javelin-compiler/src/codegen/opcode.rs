//! Instruction set for generated code.
//!
//! A JVM-flavored stack machine: typed arithmetic, explicit widening
//! conversions, compare-and-branch pairs, two switch dispatch instructions,
//! and pool-indexed invokes. Each opcode is one byte; operands follow
//! inline, big-endian.

/// Operation codes.
///
/// Most instructions pop operands from the stack and push a result.
/// `long` and `double` values occupy two stack slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    // =========================================================================
    // Constants
    // =========================================================================
    Nop = 0,
    /// Push null reference.
    AConstNull,
    /// Push int -1.
    IConstM1,
    /// Push int 0.
    IConst0,
    /// Push int 1.
    IConst1,
    /// Push long 0.
    LConst0,
    /// Push long 1.
    LConst1,
    /// Push float 0.0.
    FConst0,
    /// Push double 0.0.
    DConst0,
    /// Push sign-extended byte.
    /// Operand: i8 value
    Bipush,
    /// Push sign-extended short.
    /// Operand: i16 value (big-endian)
    Sipush,
    /// Push single-slot constant from pool.
    /// Operand: u16 pool index
    Ldc,
    /// Push two-slot constant (long/double) from pool.
    /// Operand: u16 pool index
    Ldc2,

    // =========================================================================
    // Locals
    // =========================================================================
    /// Load int from local. Operand: u16 slot
    ILoad,
    /// Load long from local. Operand: u16 slot
    LLoad,
    /// Load float from local. Operand: u16 slot
    FLoad,
    /// Load double from local. Operand: u16 slot
    DLoad,
    /// Load reference from local. Operand: u16 slot
    ALoad,
    /// Store int to local. Operand: u16 slot
    IStore,
    /// Store long to local. Operand: u16 slot
    LStore,
    /// Store float to local. Operand: u16 slot
    FStore,
    /// Store double to local. Operand: u16 slot
    DStore,
    /// Store reference to local. Operand: u16 slot
    AStore,
    /// Increment int local by a constant.
    /// Operands: u16 slot, i16 delta
    IInc,

    // =========================================================================
    // Stack
    // =========================================================================
    Pop,
    /// Pop two slots (or one two-slot value).
    Pop2,
    Dup,
    /// Duplicate top and insert beneath the value below it.
    DupX1,
    /// Duplicate top two-slot value.
    Dup2,
    Swap,

    // =========================================================================
    // Arithmetic
    // =========================================================================
    IAdd,
    ISub,
    IMul,
    IDiv,
    IRem,
    INeg,
    LAdd,
    LSub,
    LMul,
    LDiv,
    LRem,
    LNeg,
    FAdd,
    FSub,
    FMul,
    FDiv,
    FRem,
    FNeg,
    DAdd,
    DSub,
    DMul,
    DDiv,
    DRem,
    DNeg,

    // =========================================================================
    // Bitwise / shifts
    // =========================================================================
    IAnd,
    IOr,
    IXor,
    IShl,
    IShr,
    IUshr,
    LAnd,
    LOr,
    LXor,
    LShl,
    LShr,
    LUshr,

    // =========================================================================
    // Conversions
    // =========================================================================
    I2L,
    I2F,
    I2D,
    L2I,
    L2F,
    L2D,
    F2I,
    F2L,
    F2D,
    D2I,
    D2L,
    D2F,
    I2B,
    I2C,
    I2S,

    // =========================================================================
    // Long/float comparison (push -1/0/1)
    // =========================================================================
    LCmp,
    /// Float compare, -1 on NaN.
    FCmpL,
    /// Float compare, +1 on NaN.
    FCmpG,
    DCmpL,
    DCmpG,

    // =========================================================================
    // Branches (operand: u16 forward distance, patched)
    // =========================================================================
    IfEq,
    IfNe,
    IfLt,
    IfGe,
    IfGt,
    IfLe,
    IfICmpEq,
    IfICmpNe,
    IfICmpLt,
    IfICmpGe,
    IfICmpGt,
    IfICmpLe,
    IfACmpEq,
    IfACmpNe,
    IfNull,
    IfNonNull,
    Goto,
    /// Backward jump. Operand: u16 backward distance
    GotoBack,

    // =========================================================================
    // Switch dispatch
    // =========================================================================
    /// Dense int dispatch.
    /// Operands: u32 default offset, u32 low, u32 high,
    /// then (high - low + 1) u32 case offsets.
    TableSwitch,
    /// Sparse int dispatch.
    /// Operands: u32 default offset, u32 pair count,
    /// then pairs of (u32 match value, u32 case offset).
    LookupSwitch,

    // =========================================================================
    // Calls
    // =========================================================================
    /// Call instance method. Operand: u16 pool index of method ref
    InvokeVirtual,
    /// Call static method. Operand: u16 pool index of method ref
    InvokeStatic,
    /// Bootstrap-dispatched callsite. Operand: u16 pool index
    InvokeDynamic,

    // =========================================================================
    // References and arrays
    // =========================================================================
    /// Operand: u16 pool index of class ref
    CheckCast,
    /// Operand: u16 pool index of class ref
    InstanceOf,
    ArrayLength,
    IALoad,
    LALoad,
    FALoad,
    DALoad,
    AALoad,
    BALoad,
    CALoad,
    SALoad,
    IAStore,
    LAStore,
    FAStore,
    DAStore,
    AAStore,
    BAStore,
    CAStore,
    SAStore,

    // =========================================================================
    // Returns
    // =========================================================================
    Return,
    IReturn,
    LReturn,
    FReturn,
    DReturn,
    AReturn,
}

impl OpCode {
    /// Convert a byte back to an opcode.
    pub fn from_u8(value: u8) -> Option<Self> {
        if value <= OpCode::AReturn as u8 {
            // SAFETY: OpCode is repr(u8), contiguous from 0, and the value
            // is bounds-checked against the last variant.
            Some(unsafe { std::mem::transmute::<u8, OpCode>(value) })
        } else {
            None
        }
    }

    /// Size of the fixed inline operands in bytes, excluding the opcode
    /// byte. Switch instructions carry additional variable-length tables
    /// after the fixed part; see [`OpCode::TableSwitch`].
    pub fn operand_size(&self) -> usize {
        match self {
            OpCode::Bipush => 1,
            OpCode::Sipush
            | OpCode::Ldc
            | OpCode::Ldc2
            | OpCode::ILoad
            | OpCode::LLoad
            | OpCode::FLoad
            | OpCode::DLoad
            | OpCode::ALoad
            | OpCode::IStore
            | OpCode::LStore
            | OpCode::FStore
            | OpCode::DStore
            | OpCode::AStore
            | OpCode::IfEq
            | OpCode::IfNe
            | OpCode::IfLt
            | OpCode::IfGe
            | OpCode::IfGt
            | OpCode::IfLe
            | OpCode::IfICmpEq
            | OpCode::IfICmpNe
            | OpCode::IfICmpLt
            | OpCode::IfICmpGe
            | OpCode::IfICmpGt
            | OpCode::IfICmpLe
            | OpCode::IfACmpEq
            | OpCode::IfACmpNe
            | OpCode::IfNull
            | OpCode::IfNonNull
            | OpCode::Goto
            | OpCode::GotoBack
            | OpCode::InvokeVirtual
            | OpCode::InvokeStatic
            | OpCode::InvokeDynamic
            | OpCode::CheckCast
            | OpCode::InstanceOf => 2,
            OpCode::IInc => 4,
            // default + pair count; pairs follow
            OpCode::LookupSwitch => 8,
            // default + low + high; offsets follow
            OpCode::TableSwitch => 12,
            _ => 0,
        }
    }

    /// Net change in operand stack slots, where statically known.
    ///
    /// Invokes depend on the callee signature and are handled by the
    /// emitter; they return `None` here.
    pub fn stack_effect(&self) -> Option<i32> {
        let effect = match self {
            OpCode::Nop | OpCode::GotoBack | OpCode::Goto | OpCode::Return => 0,
            OpCode::AConstNull
            | OpCode::IConstM1
            | OpCode::IConst0
            | OpCode::IConst1
            | OpCode::FConst0
            | OpCode::Bipush
            | OpCode::Sipush
            | OpCode::Ldc
            | OpCode::ILoad
            | OpCode::FLoad
            | OpCode::ALoad
            | OpCode::Dup
            | OpCode::DupX1 => 1,
            OpCode::LConst0 | OpCode::LConst1 | OpCode::DConst0 | OpCode::Ldc2 => 2,
            OpCode::LLoad | OpCode::DLoad | OpCode::Dup2 => 2,
            OpCode::IStore | OpCode::FStore | OpCode::AStore | OpCode::Pop => -1,
            OpCode::LStore | OpCode::DStore | OpCode::Pop2 => -2,
            OpCode::IInc | OpCode::Swap => 0,
            OpCode::IAdd
            | OpCode::ISub
            | OpCode::IMul
            | OpCode::IDiv
            | OpCode::IRem
            | OpCode::FAdd
            | OpCode::FSub
            | OpCode::FMul
            | OpCode::FDiv
            | OpCode::FRem
            | OpCode::IAnd
            | OpCode::IOr
            | OpCode::IXor
            | OpCode::IShl
            | OpCode::IShr
            | OpCode::IUshr => -1,
            OpCode::LAdd
            | OpCode::LSub
            | OpCode::LMul
            | OpCode::LDiv
            | OpCode::LRem
            | OpCode::LAnd
            | OpCode::LOr
            | OpCode::LXor
            | OpCode::DAdd
            | OpCode::DSub
            | OpCode::DMul
            | OpCode::DDiv
            | OpCode::DRem => -2,
            // long shift count is a one-slot int
            OpCode::LShl | OpCode::LShr | OpCode::LUshr => -1,
            OpCode::INeg | OpCode::LNeg | OpCode::FNeg | OpCode::DNeg => 0,
            OpCode::I2L | OpCode::I2D | OpCode::F2L | OpCode::F2D => 1,
            OpCode::I2F | OpCode::F2I | OpCode::I2B | OpCode::I2C | OpCode::I2S => 0,
            OpCode::L2D | OpCode::D2L => 0,
            OpCode::L2I | OpCode::L2F | OpCode::D2I | OpCode::D2F => -1,
            OpCode::LCmp => -3,
            OpCode::FCmpL | OpCode::FCmpG => -1,
            OpCode::DCmpL | OpCode::DCmpG => -3,
            OpCode::IfEq
            | OpCode::IfNe
            | OpCode::IfLt
            | OpCode::IfGe
            | OpCode::IfGt
            | OpCode::IfLe
            | OpCode::IfNull
            | OpCode::IfNonNull => -1,
            OpCode::IfICmpEq
            | OpCode::IfICmpNe
            | OpCode::IfICmpLt
            | OpCode::IfICmpGe
            | OpCode::IfICmpGt
            | OpCode::IfICmpLe
            | OpCode::IfACmpEq
            | OpCode::IfACmpNe => -2,
            OpCode::TableSwitch | OpCode::LookupSwitch => -1,
            OpCode::InvokeVirtual | OpCode::InvokeStatic | OpCode::InvokeDynamic => return None,
            OpCode::CheckCast | OpCode::InstanceOf | OpCode::ArrayLength => 0,
            OpCode::IALoad
            | OpCode::FALoad
            | OpCode::AALoad
            | OpCode::BALoad
            | OpCode::CALoad
            | OpCode::SALoad => -1,
            OpCode::LALoad | OpCode::DALoad => 0,
            OpCode::IAStore
            | OpCode::FAStore
            | OpCode::AAStore
            | OpCode::BAStore
            | OpCode::CAStore
            | OpCode::SAStore => -3,
            OpCode::LAStore | OpCode::DAStore => -4,
            OpCode::IReturn | OpCode::FReturn | OpCode::AReturn => -1,
            OpCode::LReturn | OpCode::DReturn => -2,
        };
        Some(effect)
    }

    /// Human-readable name for assertions and disassembly.
    pub fn name(&self) -> &'static str {
        match self {
            OpCode::Nop => "nop",
            OpCode::AConstNull => "aconst_null",
            OpCode::IConstM1 => "iconst_m1",
            OpCode::IConst0 => "iconst_0",
            OpCode::IConst1 => "iconst_1",
            OpCode::LConst0 => "lconst_0",
            OpCode::LConst1 => "lconst_1",
            OpCode::FConst0 => "fconst_0",
            OpCode::DConst0 => "dconst_0",
            OpCode::Bipush => "bipush",
            OpCode::Sipush => "sipush",
            OpCode::Ldc => "ldc",
            OpCode::Ldc2 => "ldc2_w",
            OpCode::ILoad => "iload",
            OpCode::LLoad => "lload",
            OpCode::FLoad => "fload",
            OpCode::DLoad => "dload",
            OpCode::ALoad => "aload",
            OpCode::IStore => "istore",
            OpCode::LStore => "lstore",
            OpCode::FStore => "fstore",
            OpCode::DStore => "dstore",
            OpCode::AStore => "astore",
            OpCode::IInc => "iinc",
            OpCode::Pop => "pop",
            OpCode::Pop2 => "pop2",
            OpCode::Dup => "dup",
            OpCode::DupX1 => "dup_x1",
            OpCode::Dup2 => "dup2",
            OpCode::Swap => "swap",
            OpCode::IAdd => "iadd",
            OpCode::ISub => "isub",
            OpCode::IMul => "imul",
            OpCode::IDiv => "idiv",
            OpCode::IRem => "irem",
            OpCode::INeg => "ineg",
            OpCode::LAdd => "ladd",
            OpCode::LSub => "lsub",
            OpCode::LMul => "lmul",
            OpCode::LDiv => "ldiv",
            OpCode::LRem => "lrem",
            OpCode::LNeg => "lneg",
            OpCode::FAdd => "fadd",
            OpCode::FSub => "fsub",
            OpCode::FMul => "fmul",
            OpCode::FDiv => "fdiv",
            OpCode::FRem => "frem",
            OpCode::FNeg => "fneg",
            OpCode::DAdd => "dadd",
            OpCode::DSub => "dsub",
            OpCode::DMul => "dmul",
            OpCode::DDiv => "ddiv",
            OpCode::DRem => "drem",
            OpCode::DNeg => "dneg",
            OpCode::IAnd => "iand",
            OpCode::IOr => "ior",
            OpCode::IXor => "ixor",
            OpCode::IShl => "ishl",
            OpCode::IShr => "ishr",
            OpCode::IUshr => "iushr",
            OpCode::LAnd => "land",
            OpCode::LOr => "lor",
            OpCode::LXor => "lxor",
            OpCode::LShl => "lshl",
            OpCode::LShr => "lshr",
            OpCode::LUshr => "lushr",
            OpCode::I2L => "i2l",
            OpCode::I2F => "i2f",
            OpCode::I2D => "i2d",
            OpCode::L2I => "l2i",
            OpCode::L2F => "l2f",
            OpCode::L2D => "l2d",
            OpCode::F2I => "f2i",
            OpCode::F2L => "f2l",
            OpCode::F2D => "f2d",
            OpCode::D2I => "d2i",
            OpCode::D2L => "d2l",
            OpCode::D2F => "d2f",
            OpCode::I2B => "i2b",
            OpCode::I2C => "i2c",
            OpCode::I2S => "i2s",
            OpCode::LCmp => "lcmp",
            OpCode::FCmpL => "fcmpl",
            OpCode::FCmpG => "fcmpg",
            OpCode::DCmpL => "dcmpl",
            OpCode::DCmpG => "dcmpg",
            OpCode::IfEq => "ifeq",
            OpCode::IfNe => "ifne",
            OpCode::IfLt => "iflt",
            OpCode::IfGe => "ifge",
            OpCode::IfGt => "ifgt",
            OpCode::IfLe => "ifle",
            OpCode::IfICmpEq => "if_icmpeq",
            OpCode::IfICmpNe => "if_icmpne",
            OpCode::IfICmpLt => "if_icmplt",
            OpCode::IfICmpGe => "if_icmpge",
            OpCode::IfICmpGt => "if_icmpgt",
            OpCode::IfICmpLe => "if_icmple",
            OpCode::IfACmpEq => "if_acmpeq",
            OpCode::IfACmpNe => "if_acmpne",
            OpCode::IfNull => "ifnull",
            OpCode::IfNonNull => "ifnonnull",
            OpCode::Goto => "goto",
            OpCode::GotoBack => "goto_back",
            OpCode::TableSwitch => "tableswitch",
            OpCode::LookupSwitch => "lookupswitch",
            OpCode::InvokeVirtual => "invokevirtual",
            OpCode::InvokeStatic => "invokestatic",
            OpCode::InvokeDynamic => "invokedynamic",
            OpCode::CheckCast => "checkcast",
            OpCode::InstanceOf => "instanceof",
            OpCode::ArrayLength => "arraylength",
            OpCode::IALoad => "iaload",
            OpCode::LALoad => "laload",
            OpCode::FALoad => "faload",
            OpCode::DALoad => "daload",
            OpCode::AALoad => "aaload",
            OpCode::BALoad => "baload",
            OpCode::CALoad => "caload",
            OpCode::SALoad => "saload",
            OpCode::IAStore => "iastore",
            OpCode::LAStore => "lastore",
            OpCode::FAStore => "fastore",
            OpCode::DAStore => "dastore",
            OpCode::AAStore => "aastore",
            OpCode::BAStore => "bastore",
            OpCode::CAStore => "castore",
            OpCode::SAStore => "sastore",
            OpCode::Return => "return",
            OpCode::IReturn => "ireturn",
            OpCode::LReturn => "lreturn",
            OpCode::FReturn => "freturn",
            OpCode::DReturn => "dreturn",
            OpCode::AReturn => "areturn",
        }
    }
}
