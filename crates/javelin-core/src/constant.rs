//! Compile-time constant values.
//!
//! [`Constant`] represents the value of a Java constant expression. The
//! folding engine lives in the compiler crate; this module defines the
//! value domain, the widening accessors the fold tables rely on, and the
//! deduplicating module [`ConstantPool`].
//!
//! "Not a constant" is represented as `Option<Constant>::None` throughout
//! the engine, never as a sentinel variant.

use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;

use crate::binding::PrimitiveId;
use crate::hash::TypeHash;

/// A compile-time constant value.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Bool(bool),
    Byte(i8),
    Char(char),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
}

impl Constant {
    /// The primitive id of this constant, or `None` for strings.
    pub fn primitive_id(&self) -> Option<PrimitiveId> {
        match self {
            Constant::Bool(_) => Some(PrimitiveId::Boolean),
            Constant::Byte(_) => Some(PrimitiveId::Byte),
            Constant::Char(_) => Some(PrimitiveId::Char),
            Constant::Short(_) => Some(PrimitiveId::Short),
            Constant::Int(_) => Some(PrimitiveId::Int),
            Constant::Long(_) => Some(PrimitiveId::Long),
            Constant::Float(_) => Some(PrimitiveId::Float),
            Constant::Double(_) => Some(PrimitiveId::Double),
            Constant::Str(_) => None,
        }
    }

    /// Widen to `int` (Java unary numeric promotion). `None` for
    /// non-integral constants wider than `int`.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Constant::Byte(v) => Some(*v as i32),
            Constant::Char(v) => Some(*v as i32),
            Constant::Short(v) => Some(*v as i32),
            Constant::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Widen to `long`.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Constant::Long(v) => Some(*v),
            _ => self.as_int().map(i64::from),
        }
    }

    /// Widen to `float`.
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Constant::Float(v) => Some(*v),
            Constant::Long(v) => Some(*v as f32),
            _ => self.as_int().map(|v| v as f32),
        }
    }

    /// Widen to `double`.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Constant::Double(v) => Some(*v),
            Constant::Float(v) => Some(f64::from(*v)),
            Constant::Long(v) => Some(*v as f64),
            _ => self.as_int().map(f64::from),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Constant::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Constant::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Render the constant the way `String` concatenation would.
    pub fn to_concat_string(&self) -> String {
        match self {
            Constant::Bool(v) => v.to_string(),
            Constant::Byte(v) => v.to_string(),
            Constant::Char(v) => v.to_string(),
            Constant::Short(v) => v.to_string(),
            Constant::Int(v) => v.to_string(),
            Constant::Long(v) => v.to_string(),
            Constant::Float(v) => format_float(f64::from(*v)),
            Constant::Double(v) => format_float(*v),
            Constant::Str(s) => s.clone(),
        }
    }

    /// Whether this constant is the boolean `true`.
    pub fn is_true(&self) -> bool {
        matches!(self, Constant::Bool(true))
    }

    /// Whether this constant is an integral zero.
    pub fn is_integral_zero(&self) -> bool {
        matches!(self.as_long(), Some(0))
    }
}

/// Java renders whole floats with a trailing `.0`.
fn format_float(v: f64) -> String {
    if v.fract() == 0.0 && v.is_finite() {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}

/// An entry in the module constant pool.
#[derive(Debug, Clone, PartialEq)]
pub enum PoolEntry {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    /// A class reference, by type hash.
    Class(TypeHash),
    /// A method reference, by method hash.
    MethodRef(TypeHash),
    /// An invokedynamic callsite, by bootstrap method hash.
    Dynamic(TypeHash),
}

/// Dedup key for pool entries. Floats are wrapped so NaN and signed zero
/// dedup by bit pattern rather than by `==`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PoolKey {
    Int(i32),
    Long(i64),
    Float(OrderedFloat<f32>),
    Double(OrderedFloat<f64>),
    Str(String),
    Class(TypeHash),
    MethodRef(TypeHash),
    Dynamic(TypeHash),
}

impl PoolKey {
    fn of(entry: &PoolEntry) -> Self {
        match entry {
            PoolEntry::Int(v) => PoolKey::Int(*v),
            PoolEntry::Long(v) => PoolKey::Long(*v),
            PoolEntry::Float(v) => PoolKey::Float(OrderedFloat(*v)),
            PoolEntry::Double(v) => PoolKey::Double(OrderedFloat(*v)),
            PoolEntry::Str(s) => PoolKey::Str(s.clone()),
            PoolEntry::Class(h) => PoolKey::Class(*h),
            PoolEntry::MethodRef(h) => PoolKey::MethodRef(*h),
            PoolEntry::Dynamic(h) => PoolKey::Dynamic(*h),
        }
    }
}

/// Deduplicating constant pool shared by all emitters of a module.
#[derive(Debug, Default)]
pub struct ConstantPool {
    entries: Vec<PoolEntry>,
    index: FxHashMap<PoolKey, u16>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern an entry, returning its pool index. Re-adding an equal entry
    /// returns the original index.
    pub fn add(&mut self, entry: PoolEntry) -> u16 {
        let key = PoolKey::of(&entry);
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.entries.len() as u16;
        self.entries.push(entry);
        self.index.insert(key, idx);
        idx
    }

    pub fn get(&self, idx: u16) -> Option<&PoolEntry> {
        self.entries.get(idx as usize)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
