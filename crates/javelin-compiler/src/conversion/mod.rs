//! Standard operator semantics: conversions and promotion.
//!
//! [`resolve_operation`] decides whether a binary operator has built-in
//! meaning for its operand types and, if so, what shape the operation
//! takes: which computation category it runs in, what each side needs
//! (unboxing, widening) to get there, and the result type. Returning
//! `None` means "no standard semantics"; the caller then tries operator
//! overload resolution. Standard semantics always win over overloads.

pub mod promotion;

use javelin_core::ast::{BinaryOp, UnaryOp};
use javelin_core::binding::PrimitiveId;
use javelin_core::hash::{TypeHash, well_known};
use javelin_core::registry::BindingRegistry;

use crate::codegen::OpCode;
use promotion::{conversion_opcode, promote_pair, promotion_rank, unary_promote};

/// What one operand needs before the operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OperandConversion {
    /// Unbox a wrapper to its primitive first.
    pub unbox: bool,
    /// Widening instruction after unboxing, when categories differ.
    pub widen: Option<OpCode>,
}

/// The resolved shape of a standard binary operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationShape {
    /// Both sides computed in a primitive category.
    Primitive {
        kind: PrimitiveId,
        left: OperandConversion,
        right: OperandConversion,
        result: TypeHash,
    },
    /// String `+`: the non-string side converts to Object.
    StringConcat {
        /// A `char[]` operand, which concatenates as an opaque reference.
        left_char_array: bool,
        right_char_array: bool,
    },
    /// `==` / `!=` over two references.
    ReferenceCompare,
}

impl OperationShape {
    pub fn result_type(&self) -> TypeHash {
        match self {
            OperationShape::Primitive { result, .. } => *result,
            OperationShape::StringConcat { .. } => well_known::STRING,
            OperationShape::ReferenceCompare => well_known::BOOLEAN,
        }
    }
}

/// The resolved shape of a standard unary operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnaryShape {
    pub kind: PrimitiveId,
    pub operand: OperandConversion,
    pub result: TypeHash,
}

/// Primitive view of a type: the primitive itself, or the primitive a
/// wrapper unboxes to.
fn primitive_view(ty: TypeHash, registry: &BindingRegistry) -> Option<(PrimitiveId, bool)> {
    if let Some(binding) = registry.get_type(ty)
        && let Some(id) = binding.primitive_id()
    {
        return Some((id, false));
    }
    registry.unboxed(ty).map(|id| (id, true))
}

fn is_reference(ty: TypeHash, registry: &BindingRegistry) -> bool {
    registry
        .get_type(ty)
        .is_some_and(|binding| !binding.is_primitive())
}

fn is_char_array(ty: TypeHash) -> bool {
    ty == well_known::CHAR_ARRAY
}

/// Resolve the standard semantics of `left op right`, if any.
pub fn resolve_operation(
    op: BinaryOp,
    left: TypeHash,
    right: TypeHash,
    registry: &BindingRegistry,
) -> Option<OperationShape> {
    // String + anything (and anything + String) is concatenation.
    if op == BinaryOp::Add && (left == well_known::STRING || right == well_known::STRING) {
        return Some(OperationShape::StringConcat {
            left_char_array: is_char_array(left),
            right_char_array: is_char_array(right),
        });
    }

    let left_prim = primitive_view(left, registry);
    let right_prim = primitive_view(right, registry);

    if op.is_logical() {
        // && and || need boolean on both sides; unboxing applies.
        return match (left_prim, right_prim) {
            (Some((PrimitiveId::Boolean, lu)), Some((PrimitiveId::Boolean, ru))) => {
                Some(OperationShape::Primitive {
                    kind: PrimitiveId::Boolean,
                    left: OperandConversion {
                        unbox: lu,
                        widen: None,
                    },
                    right: OperandConversion {
                        unbox: ru,
                        widen: None,
                    },
                    result: well_known::BOOLEAN,
                })
            }
            _ => None,
        };
    }

    if op.is_equality() {
        // Unboxed comparison when at least one side is a bare primitive;
        // two references compare by identity.
        match (left_prim, right_prim) {
            (Some((l, lu)), Some((r, ru))) if !lu || !ru => {
                if l == PrimitiveId::Boolean || r == PrimitiveId::Boolean {
                    return (l == r).then_some(OperationShape::Primitive {
                        kind: PrimitiveId::Boolean,
                        left: OperandConversion {
                            unbox: lu,
                            widen: None,
                        },
                        right: OperandConversion {
                            unbox: ru,
                            widen: None,
                        },
                        result: well_known::BOOLEAN,
                    });
                }
                return numeric_shape(op, l, lu, r, ru);
            }
            _ => {}
        }
        if (is_reference(left, registry) || left == well_known::NULL)
            && (is_reference(right, registry) || right == well_known::NULL)
        {
            return Some(OperationShape::ReferenceCompare);
        }
        return None;
    }

    if op.is_shift() {
        // Each operand promotes independently; count computes as int.
        let (l, lu) = left_prim?;
        let (r, ru) = right_prim?;
        if !l.is_integral() || !r.is_integral() {
            return None;
        }
        let kind = unary_promote(l)?;
        return Some(OperationShape::Primitive {
            kind,
            left: OperandConversion {
                unbox: lu,
                widen: None,
            },
            right: OperandConversion {
                unbox: ru,
                // long count narrows to int at the operator
                widen: (r == PrimitiveId::Long).then_some(OpCode::L2I),
            },
            result: kind.type_hash(),
        });
    }

    if op.is_bitwise() {
        let (l, lu) = left_prim?;
        let (r, ru) = right_prim?;
        if l == PrimitiveId::Boolean && r == PrimitiveId::Boolean {
            return Some(OperationShape::Primitive {
                kind: PrimitiveId::Boolean,
                left: OperandConversion {
                    unbox: lu,
                    widen: None,
                },
                right: OperandConversion {
                    unbox: ru,
                    widen: None,
                },
                result: well_known::BOOLEAN,
            });
        }
        if !l.is_integral() || !r.is_integral() {
            return None;
        }
        return numeric_shape(op, l, lu, r, ru);
    }

    // Arithmetic and ordered comparison.
    let (l, lu) = left_prim?;
    let (r, ru) = right_prim?;
    if !l.is_numeric() || !r.is_numeric() {
        return None;
    }
    numeric_shape(op, l, lu, r, ru)
}

fn numeric_shape(
    op: BinaryOp,
    left: PrimitiveId,
    left_unbox: bool,
    right: PrimitiveId,
    right_unbox: bool,
) -> Option<OperationShape> {
    let kind = promote_pair(left, right)?;
    let result = if op.is_comparison() {
        well_known::BOOLEAN
    } else {
        kind.type_hash()
    };
    Some(OperationShape::Primitive {
        kind,
        left: OperandConversion {
            unbox: left_unbox,
            widen: conversion_opcode(left, kind),
        },
        right: OperandConversion {
            unbox: right_unbox,
            widen: conversion_opcode(right, kind),
        },
        result,
    })
}

/// Conversion a value needs to be assigned to a target type, if the
/// assignment is allowed at all: identity, widening primitive conversion
/// (possibly after unboxing), or a widening reference conversion.
///
/// Narrowing and boxing conversions return `None`; the caller reports.
pub fn assignment_conversion(
    target: TypeHash,
    value: TypeHash,
    registry: &BindingRegistry,
) -> Option<OperandConversion> {
    if target == value {
        return Some(OperandConversion::default());
    }
    if let Some(binding) = registry.get_type(target)
        && let Some(to) = binding.primitive_id()
    {
        let (from, unbox) = primitive_view(value, registry)?;
        if from == to {
            return Some(OperandConversion { unbox, widen: None });
        }
        let allowed = match (from, to) {
            (PrimitiveId::Boolean, _) | (_, PrimitiveId::Boolean) => false,
            // nothing widens to char, and char widens to int and up
            (_, PrimitiveId::Char) => false,
            (PrimitiveId::Char, to) => promotion_rank(to)? > promotion_rank(PrimitiveId::Char)?,
            (from, to) => promotion_rank(from)? < promotion_rank(to)?,
        };
        return allowed.then(|| OperandConversion {
            unbox,
            widen: conversion_opcode(from, to),
        });
    }
    if is_reference(target, registry)
        && (value == well_known::NULL || registry.is_subtype_of(value, target))
    {
        return Some(OperandConversion::default());
    }
    None
}

/// Resolve the standard semantics of a unary operator, if any.
pub fn resolve_unary_operation(
    op: UnaryOp,
    operand: TypeHash,
    registry: &BindingRegistry,
) -> Option<UnaryShape> {
    let (id, unbox) = primitive_view(operand, registry)?;
    match op {
        UnaryOp::Not => (id == PrimitiveId::Boolean).then_some(UnaryShape {
            kind: PrimitiveId::Boolean,
            operand: OperandConversion { unbox, widen: None },
            result: well_known::BOOLEAN,
        }),
        UnaryOp::BitNot => {
            if !id.is_integral() {
                return None;
            }
            let kind = unary_promote(id)?;
            Some(UnaryShape {
                kind,
                operand: OperandConversion { unbox, widen: None },
                result: kind.type_hash(),
            })
        }
        UnaryOp::Neg | UnaryOp::Plus => {
            if !id.is_numeric() {
                return None;
            }
            let kind = unary_promote(id)?;
            Some(UnaryShape {
                kind,
                operand: OperandConversion { unbox, widen: None },
                result: kind.type_hash(),
            })
        }
        // ++/-- keep the variable's own type; no promotion.
        UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => {
            if !id.is_numeric() {
                return None;
            }
            Some(UnaryShape {
                kind: id,
                operand: OperandConversion { unbox, widen: None },
                result: operand,
            })
        }
    }
}
