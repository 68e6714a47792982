//! Resolved program entities: types and methods.
//!
//! A *binding* is a resolved reference to a declared entity, as opposed to
//! its unresolved syntactic name. The resolution and code-generation passes
//! only ever see bindings; name lookup happens in the [`crate::registry`].

use crate::hash::{TypeHash, well_known};

/// The eight Java primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveId {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveId {
    /// Source-level name of the primitive.
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveId::Boolean => "boolean",
            PrimitiveId::Byte => "byte",
            PrimitiveId::Char => "char",
            PrimitiveId::Short => "short",
            PrimitiveId::Int => "int",
            PrimitiveId::Long => "long",
            PrimitiveId::Float => "float",
            PrimitiveId::Double => "double",
        }
    }

    /// The reserved type hash for this primitive.
    pub fn type_hash(&self) -> TypeHash {
        match self {
            PrimitiveId::Boolean => well_known::BOOLEAN,
            PrimitiveId::Byte => well_known::BYTE,
            PrimitiveId::Char => well_known::CHAR,
            PrimitiveId::Short => well_known::SHORT,
            PrimitiveId::Int => well_known::INT,
            PrimitiveId::Long => well_known::LONG,
            PrimitiveId::Float => well_known::FLOAT,
            PrimitiveId::Double => well_known::DOUBLE,
        }
    }

    /// The boxed wrapper class hash.
    pub fn boxed(&self) -> TypeHash {
        match self {
            PrimitiveId::Boolean => well_known::BOXED_BOOLEAN,
            PrimitiveId::Byte => well_known::BOXED_BYTE,
            PrimitiveId::Char => well_known::BOXED_CHAR,
            PrimitiveId::Short => well_known::BOXED_SHORT,
            PrimitiveId::Int => well_known::BOXED_INT,
            PrimitiveId::Long => well_known::BOXED_LONG,
            PrimitiveId::Float => well_known::BOXED_FLOAT,
            PrimitiveId::Double => well_known::BOXED_DOUBLE,
        }
    }

    /// Whether the primitive participates in numeric operations.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, PrimitiveId::Boolean)
    }

    /// Whether the primitive is an integral type (`char` included).
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            PrimitiveId::Byte
                | PrimitiveId::Char
                | PrimitiveId::Short
                | PrimitiveId::Int
                | PrimitiveId::Long
        )
    }

    /// Number of JVM operand-stack/local slots a value occupies.
    pub fn slot_width(&self) -> u32 {
        match self {
            PrimitiveId::Long | PrimitiveId::Double => 2,
            _ => 1,
        }
    }
}

/// Member visibility. `Private` targets require synthetic accessors when
/// invoked from generated dispatch code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Protected,
    PackagePrivate,
    Private,
}

/// A record class component (name plus declared type).
#[derive(Debug, Clone, PartialEq)]
pub struct RecordComponent {
    pub name: String,
    pub ty: TypeHash,
}

/// Classification of a type binding.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Primitive(PrimitiveId),
    Class,
    Interface,
    Enum { constants: Vec<String> },
    Record { components: Vec<RecordComponent> },
    Array { elem: TypeHash },
    /// The type of the `null` literal.
    Null,
}

/// A resolved type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeBinding {
    pub hash: TypeHash,
    pub name: String,
    pub kind: TypeKind,
    pub superclass: Option<TypeHash>,
    pub interfaces: Vec<TypeHash>,
    /// Permitted direct subtypes when the type is sealed (empty = not sealed).
    pub permits: Vec<TypeHash>,
    pub is_abstract: bool,
}

impl TypeBinding {
    /// A concrete class with `Object` as superclass.
    pub fn class(name: &str) -> Self {
        Self {
            hash: TypeHash::from_name(name),
            name: name.to_string(),
            kind: TypeKind::Class,
            superclass: Some(well_known::OBJECT),
            interfaces: Vec::new(),
            permits: Vec::new(),
            is_abstract: false,
        }
    }

    /// An interface type.
    pub fn interface(name: &str) -> Self {
        Self {
            hash: TypeHash::from_name(name),
            name: name.to_string(),
            kind: TypeKind::Interface,
            superclass: None,
            interfaces: Vec::new(),
            permits: Vec::new(),
            is_abstract: true,
        }
    }

    /// An enum type with the given constants, in declaration order.
    pub fn enumeration(name: &str, constants: &[&str]) -> Self {
        Self {
            hash: TypeHash::from_name(name),
            name: name.to_string(),
            kind: TypeKind::Enum {
                constants: constants.iter().map(|c| c.to_string()).collect(),
            },
            superclass: Some(well_known::OBJECT),
            interfaces: Vec::new(),
            permits: Vec::new(),
            is_abstract: false,
        }
    }

    /// A record class with the given components.
    pub fn record(name: &str, components: Vec<RecordComponent>) -> Self {
        Self {
            hash: TypeHash::from_name(name),
            name: name.to_string(),
            kind: TypeKind::Record { components },
            superclass: Some(well_known::OBJECT),
            interfaces: Vec::new(),
            permits: Vec::new(),
            is_abstract: false,
        }
    }

    /// Mark the type sealed with the given permitted direct subtypes.
    pub fn sealed(mut self, permits: &[TypeHash]) -> Self {
        self.permits = permits.to_vec();
        self
    }

    /// Mark the type abstract.
    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Add an implemented interface.
    pub fn implements(mut self, iface: TypeHash) -> Self {
        self.interfaces.push(iface);
        self
    }

    /// Set the superclass.
    pub fn extends(mut self, superclass: TypeHash) -> Self {
        self.superclass = Some(superclass);
        self
    }

    /// The primitive id, if this is a primitive type.
    pub fn primitive_id(&self) -> Option<PrimitiveId> {
        match self.kind {
            TypeKind::Primitive(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, TypeKind::Primitive(_))
    }

    pub fn is_sealed(&self) -> bool {
        !self.permits.is_empty()
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, TypeKind::Enum { .. })
    }

    pub fn is_record(&self) -> bool {
        matches!(self.kind, TypeKind::Record { .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, TypeKind::Array { .. })
    }

    /// Element type for array bindings.
    pub fn array_elem(&self) -> Option<TypeHash> {
        match self.kind {
            TypeKind::Array { elem } => Some(elem),
            _ => None,
        }
    }
}

/// A resolved method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodBinding {
    pub hash: TypeHash,
    pub owner: TypeHash,
    pub name: String,
    pub params: Vec<TypeHash>,
    pub return_type: TypeHash,
    pub is_static: bool,
    pub visibility: Visibility,
}

impl MethodBinding {
    /// A public instance method.
    pub fn instance(owner: TypeHash, name: &str, params: &[TypeHash], ret: TypeHash) -> Self {
        Self {
            hash: TypeHash::for_method(owner, name, params),
            owner,
            name: name.to_string(),
            params: params.to_vec(),
            return_type: ret,
            is_static: false,
            visibility: Visibility::Public,
        }
    }

    /// Mark the method static.
    pub fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Set the visibility.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }
}

/// Handle to a synthetic accessor bridging a private method.
///
/// Registration is append-only and idempotent; requesting an accessor for
/// the same target twice yields the same handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessorHandle {
    /// Hash of the synthetic bridge method.
    pub hash: TypeHash,
    /// The private method being bridged.
    pub target: TypeHash,
}
