//! Binary numeric promotion tables.
//!
//! Java promotes both operands of a numeric operator to the wider of the
//! two, with everything below `int` promoted to `int` first. On the stack
//! machine the sub-int types already compute as int, so only promotions
//! across computation categories need an explicit conversion instruction.

use javelin_core::binding::PrimitiveId;

use crate::codegen::OpCode;

/// Rank in the promotion lattice. `boolean` does not participate.
pub fn promotion_rank(id: PrimitiveId) -> Option<u8> {
    match id {
        PrimitiveId::Boolean => None,
        PrimitiveId::Byte => Some(1),
        PrimitiveId::Short => Some(2),
        PrimitiveId::Char => Some(2),
        PrimitiveId::Int => Some(3),
        PrimitiveId::Long => Some(4),
        PrimitiveId::Float => Some(5),
        PrimitiveId::Double => Some(6),
    }
}

/// Unary numeric promotion: sub-int types go to `int`.
pub fn unary_promote(id: PrimitiveId) -> Option<PrimitiveId> {
    match id {
        PrimitiveId::Boolean => None,
        PrimitiveId::Byte | PrimitiveId::Short | PrimitiveId::Char => Some(PrimitiveId::Int),
        other => Some(other),
    }
}

/// Binary numeric promotion: both operands go to the wider kind.
pub fn promote_pair(left: PrimitiveId, right: PrimitiveId) -> Option<PrimitiveId> {
    let left_rank = promotion_rank(left)?;
    let right_rank = promotion_rank(right)?;
    let wider = if left_rank >= right_rank { left } else { right };
    unary_promote(wider)
}

/// Conversion instruction from one computation category to another.
///
/// Returns `None` when no instruction is needed (same category, or a
/// sub-int type that already computes as int).
pub fn conversion_opcode(from: PrimitiveId, to: PrimitiveId) -> Option<OpCode> {
    use PrimitiveId::*;
    let from = unary_promote(from)?;
    let to = unary_promote(to)?;
    match (from, to) {
        (Int, Long) => Some(OpCode::I2L),
        (Int, Float) => Some(OpCode::I2F),
        (Int, Double) => Some(OpCode::I2D),
        (Long, Float) => Some(OpCode::L2F),
        (Long, Double) => Some(OpCode::L2D),
        (Float, Double) => Some(OpCode::F2D),
        _ => None,
    }
}
