//! The binding registry: the engine's view of declared types and methods.
//!
//! The registry answers the questions resolution asks (subtyping, boxing,
//! sealed permits, enum constants, record components, method lookup) without
//! owning name/scope binding. Everything is keyed by [`TypeHash`].
//!
//! The only mutation after setup is [`BindingRegistry::ensure_accessor_for`],
//! which is append-only and idempotent.

use rustc_hash::FxHashMap;

use crate::binding::{
    AccessorHandle, MethodBinding, PrimitiveId, RecordComponent, TypeBinding, TypeKind,
};
use crate::hash::{TypeHash, well_known};

/// All eight primitives, in promotion-table order.
pub const PRIMITIVES: [PrimitiveId; 8] = [
    PrimitiveId::Boolean,
    PrimitiveId::Byte,
    PrimitiveId::Char,
    PrimitiveId::Short,
    PrimitiveId::Int,
    PrimitiveId::Long,
    PrimitiveId::Float,
    PrimitiveId::Double,
];

/// Registry of resolved types and methods.
#[derive(Debug, Default)]
pub struct BindingRegistry {
    types: FxHashMap<TypeHash, TypeBinding>,
    methods: FxHashMap<TypeHash, MethodBinding>,
    /// Instance methods grouped by (owner, name) for overload candidate scans.
    by_owner_name: FxHashMap<(TypeHash, String), Vec<TypeHash>>,
    accessors: FxHashMap<TypeHash, AccessorHandle>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-seeded with primitives, boxed wrappers, `Object`,
    /// `String`, `char[]`, and the null type.
    pub fn with_jdk_defaults() -> Self {
        let mut registry = Self::new();

        for id in PRIMITIVES {
            registry.insert_type(TypeBinding {
                hash: id.type_hash(),
                name: id.name().to_string(),
                kind: TypeKind::Primitive(id),
                superclass: None,
                interfaces: Vec::new(),
                permits: Vec::new(),
                is_abstract: false,
            });
        }

        registry.insert_type(TypeBinding {
            hash: well_known::OBJECT,
            name: "java.lang.Object".to_string(),
            kind: TypeKind::Class,
            superclass: None,
            interfaces: Vec::new(),
            permits: Vec::new(),
            is_abstract: false,
        });
        registry.insert_type(TypeBinding {
            hash: well_known::STRING,
            name: "java.lang.String".to_string(),
            kind: TypeKind::Class,
            superclass: Some(well_known::OBJECT),
            interfaces: Vec::new(),
            permits: Vec::new(),
            is_abstract: false,
        });
        registry.insert_type(TypeBinding {
            hash: well_known::NULL,
            name: "<null>".to_string(),
            kind: TypeKind::Null,
            superclass: None,
            interfaces: Vec::new(),
            permits: Vec::new(),
            is_abstract: false,
        });
        registry.insert_type(TypeBinding {
            hash: well_known::CHAR_ARRAY,
            name: "char[]".to_string(),
            kind: TypeKind::Array {
                elem: well_known::CHAR,
            },
            superclass: Some(well_known::OBJECT),
            interfaces: Vec::new(),
            permits: Vec::new(),
            is_abstract: false,
        });

        for id in PRIMITIVES {
            let boxed_name = match id {
                PrimitiveId::Boolean => "java.lang.Boolean",
                PrimitiveId::Byte => "java.lang.Byte",
                PrimitiveId::Char => "java.lang.Character",
                PrimitiveId::Short => "java.lang.Short",
                PrimitiveId::Int => "java.lang.Integer",
                PrimitiveId::Long => "java.lang.Long",
                PrimitiveId::Float => "java.lang.Float",
                PrimitiveId::Double => "java.lang.Double",
            };
            registry.insert_type(TypeBinding {
                hash: id.boxed(),
                name: boxed_name.to_string(),
                kind: TypeKind::Class,
                superclass: Some(well_known::OBJECT),
                interfaces: Vec::new(),
                permits: Vec::new(),
                is_abstract: false,
            });
        }

        registry
    }

    fn insert_type(&mut self, binding: TypeBinding) {
        self.types.insert(binding.hash, binding);
    }

    /// Register a user type. Returns its hash.
    ///
    /// A `permits` clause requires each permitted type to be a subtype of
    /// the sealed type, so sealing records the missing edges on their
    /// behalf.
    pub fn register_type(&mut self, binding: TypeBinding) -> TypeHash {
        let hash = binding.hash;
        let permits = binding.permits.clone();
        self.insert_type(binding);
        for sub in permits {
            if !self.is_subtype_of(sub, hash)
                && let Some(sub_binding) = self.types.get_mut(&sub)
            {
                sub_binding.interfaces.push(hash);
            }
        }
        hash
    }

    /// Register a method. Returns its hash.
    pub fn register_method(&mut self, binding: MethodBinding) -> TypeHash {
        let hash = binding.hash;
        self.by_owner_name
            .entry((binding.owner, binding.name.clone()))
            .or_default()
            .push(hash);
        self.methods.insert(hash, binding);
        hash
    }

    /// Register an array type over the given element type.
    pub fn register_array_of(&mut self, elem: TypeHash) -> TypeHash {
        if elem == well_known::CHAR {
            return well_known::CHAR_ARRAY;
        }
        let name = format!("{}[]", self.type_name(elem));
        let hash = TypeHash::from_name(&name);
        if !self.types.contains_key(&hash) {
            self.insert_type(TypeBinding {
                hash,
                name,
                kind: TypeKind::Array { elem },
                superclass: Some(well_known::OBJECT),
                interfaces: Vec::new(),
                permits: Vec::new(),
                is_abstract: false,
            });
        }
        hash
    }

    pub fn get_type(&self, hash: TypeHash) -> Option<&TypeBinding> {
        self.types.get(&hash)
    }

    pub fn get_method(&self, hash: TypeHash) -> Option<&MethodBinding> {
        self.methods.get(&hash)
    }

    /// Display name for diagnostics; hashes with no binding print as hex.
    pub fn type_name(&self, hash: TypeHash) -> String {
        match self.types.get(&hash) {
            Some(t) => t.name.clone(),
            None => hash.to_string(),
        }
    }

    /// All methods named `name` declared on `owner` or inherited from its
    /// superclass chain, nearest declaration first.
    pub fn methods_named(&self, owner: TypeHash, name: &str) -> Vec<&MethodBinding> {
        let mut found = Vec::new();
        let mut current = Some(owner);
        while let Some(ty) = current {
            if let Some(hashes) = self.by_owner_name.get(&(ty, name.to_string())) {
                for h in hashes {
                    if let Some(m) = self.methods.get(h) {
                        found.push(m);
                    }
                }
            }
            current = self.types.get(&ty).and_then(|t| t.superclass);
        }
        found
    }

    /// Exact-signature method lookup on `owner` and its superclass chain.
    pub fn lookup_method(
        &self,
        owner: TypeHash,
        name: &str,
        params: &[TypeHash],
    ) -> Option<&MethodBinding> {
        self.methods_named(owner, name)
            .into_iter()
            .find(|m| m.params == params)
    }

    /// Whether `sub` is a subtype of `sup` (reflexive; walks superclasses
    /// and interfaces; the null type is a subtype of every reference type).
    pub fn is_subtype_of(&self, sub: TypeHash, sup: TypeHash) -> bool {
        if sub == sup {
            return true;
        }
        let Some(binding) = self.types.get(&sub) else {
            return false;
        };
        if matches!(binding.kind, TypeKind::Null) {
            return self
                .types
                .get(&sup)
                .is_some_and(|t| !t.is_primitive() && !matches!(t.kind, TypeKind::Null));
        }
        if binding.is_primitive() {
            return false;
        }
        if let Some(superclass) = binding.superclass
            && self.is_subtype_of(superclass, sup)
        {
            return true;
        }
        binding
            .interfaces
            .iter()
            .any(|&iface| self.is_subtype_of(iface, sup))
    }

    /// Boxed wrapper for a primitive type, if `hash` is a primitive.
    pub fn boxed(&self, hash: TypeHash) -> Option<TypeHash> {
        self.types
            .get(&hash)
            .and_then(|t| t.primitive_id())
            .map(|id| id.boxed())
    }

    /// Primitive unboxed from a wrapper type, if `hash` is a wrapper.
    pub fn unboxed(&self, hash: TypeHash) -> Option<PrimitiveId> {
        PRIMITIVES.into_iter().find(|id| id.boxed() == hash)
    }

    /// Permitted direct subtypes of a sealed type (empty when not sealed).
    pub fn permitted_subtypes(&self, hash: TypeHash) -> &[TypeHash] {
        self.types
            .get(&hash)
            .map(|t| t.permits.as_slice())
            .unwrap_or(&[])
    }

    /// Enum constants in declaration order, if `hash` is an enum.
    pub fn enum_constants(&self, hash: TypeHash) -> Option<&[String]> {
        match self.types.get(&hash).map(|t| &t.kind) {
            Some(TypeKind::Enum { constants }) => Some(constants),
            _ => None,
        }
    }

    /// Record components in declaration order, if `hash` is a record.
    pub fn record_components(&self, hash: TypeHash) -> Option<&[RecordComponent]> {
        match self.types.get(&hash).map(|t| &t.kind) {
            Some(TypeKind::Record { components }) => Some(components),
            _ => None,
        }
    }

    /// Ensure a synthetic accessor exists for a private method target.
    ///
    /// Idempotent: a second request for the same target returns the handle
    /// registered by the first.
    pub fn ensure_accessor_for(&mut self, method: TypeHash) -> AccessorHandle {
        *self
            .accessors
            .entry(method)
            .or_insert_with(|| AccessorHandle {
                hash: TypeHash::for_accessor(method),
                target: method,
            })
    }

    /// Accessors registered so far, in no particular order.
    pub fn accessor_count(&self) -> usize {
        self.accessors.len()
    }
}
