//! Deterministic hash-based identity for type and method bindings.
//!
//! [`TypeHash`] is a 64-bit hash computed from qualified names and, for
//! methods, the parameter signature. Hashes are deterministic, so forward
//! references can be computed before registration and the same name always
//! yields the same identity regardless of registration order.
//!
//! Uses XXHash64 with domain-mixing constants so a type named `add` and a
//! method named `add` never collide.

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-mixing constants for hash computation.
mod domain {
    /// Marker for type hashes.
    pub const TYPE: u64 = 0x7a61_6d62_6f6e_6901;
    /// Marker for method hashes.
    pub const METHOD: u64 = 0x7a61_6d62_6f6e_6902;
    /// Marker for synthetic accessor hashes.
    pub const ACCESSOR: u64 = 0x7a61_6d62_6f6e_6903;
    /// Positional multiplier for parameter mixing.
    pub const PARAM_STEP: u64 = 0x9e37_79b9_7f4a_7c15;
}

/// A deterministic 64-bit hash identifying a type, method, or accessor.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a type hash from a qualified type name.
    pub fn from_name(name: &str) -> Self {
        TypeHash(xxh64(name.as_bytes(), domain::TYPE))
    }

    /// Create a method hash from owner type, selector name, and parameter types.
    ///
    /// Parameter position matters: `m(int, long)` and `m(long, int)` hash
    /// differently.
    pub fn for_method(owner: TypeHash, name: &str, params: &[TypeHash]) -> Self {
        let mut h = xxh64(name.as_bytes(), domain::METHOD) ^ owner.0.rotate_left(17);
        for (i, p) in params.iter().enumerate() {
            h ^= p.0.wrapping_mul(domain::PARAM_STEP.wrapping_add(i as u64));
            h = h.rotate_left(13);
        }
        TypeHash(h)
    }

    /// Create the hash of the synthetic accessor bridging a private method.
    pub fn for_accessor(method: TypeHash) -> Self {
        TypeHash(method.0.rotate_left(31) ^ domain::ACCESSOR)
    }

    /// Whether this is the empty hash.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Reserved identities for primitives and JDK types the engine hard-codes.
///
/// These live below the practical output range of XXHash64 so they can be
/// `const` (hashes of real names are computed at registry construction).
pub mod well_known {
    use super::TypeHash;

    /// `boolean`
    pub const BOOLEAN: TypeHash = TypeHash(0x01);
    /// `byte`
    pub const BYTE: TypeHash = TypeHash(0x02);
    /// `char`
    pub const CHAR: TypeHash = TypeHash(0x03);
    /// `short`
    pub const SHORT: TypeHash = TypeHash(0x04);
    /// `int`
    pub const INT: TypeHash = TypeHash(0x05);
    /// `long`
    pub const LONG: TypeHash = TypeHash(0x06);
    /// `float`
    pub const FLOAT: TypeHash = TypeHash(0x07);
    /// `double`
    pub const DOUBLE: TypeHash = TypeHash(0x08);
    /// `void`
    pub const VOID: TypeHash = TypeHash(0x09);

    /// `java.lang.Object`
    pub const OBJECT: TypeHash = TypeHash(0x10);
    /// `java.lang.String`
    pub const STRING: TypeHash = TypeHash(0x11);
    /// The null type (type of the `null` literal).
    pub const NULL: TypeHash = TypeHash(0x12);

    /// `java.lang.Boolean`
    pub const BOXED_BOOLEAN: TypeHash = TypeHash(0x21);
    /// `java.lang.Byte`
    pub const BOXED_BYTE: TypeHash = TypeHash(0x22);
    /// `java.lang.Character`
    pub const BOXED_CHAR: TypeHash = TypeHash(0x23);
    /// `java.lang.Short`
    pub const BOXED_SHORT: TypeHash = TypeHash(0x24);
    /// `java.lang.Integer`
    pub const BOXED_INT: TypeHash = TypeHash(0x25);
    /// `java.lang.Long`
    pub const BOXED_LONG: TypeHash = TypeHash(0x26);
    /// `java.lang.Float`
    pub const BOXED_FLOAT: TypeHash = TypeHash(0x27);
    /// `java.lang.Double`
    pub const BOXED_DOUBLE: TypeHash = TypeHash(0x28);

    /// `char[]`, special-cased by string concatenation diagnostics.
    pub const CHAR_ARRAY: TypeHash = TypeHash(0x31);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_same_hash() {
        assert_eq!(
            TypeHash::from_name("java.lang.String"),
            TypeHash::from_name("java.lang.String")
        );
    }

    #[test]
    fn different_names_differ() {
        assert_ne!(TypeHash::from_name("int"), TypeHash::from_name("long"));
    }

    #[test]
    fn method_signature_matters() {
        let owner = TypeHash::from_name("Vec2");
        let int = TypeHash::from_name("int");
        let long = TypeHash::from_name("long");
        let a = TypeHash::for_method(owner, "add", &[int]);
        let b = TypeHash::for_method(owner, "add", &[long]);
        assert_ne!(a, b);
    }

    #[test]
    fn parameter_order_matters() {
        let owner = TypeHash::from_name("Vec2");
        let int = TypeHash::from_name("int");
        let long = TypeHash::from_name("long");
        let a = TypeHash::for_method(owner, "add", &[int, long]);
        let b = TypeHash::for_method(owner, "add", &[long, int]);
        assert_ne!(a, b);
    }

    #[test]
    fn type_and_method_domains_disjoint() {
        let t = TypeHash::from_name("add");
        let m = TypeHash::for_method(TypeHash::EMPTY, "add", &[]);
        assert_ne!(t, m);
    }

    #[test]
    fn accessor_differs_from_method() {
        let m = TypeHash::for_method(TypeHash::from_name("Box"), "get", &[]);
        assert_ne!(TypeHash::for_accessor(m), m);
    }
}
