//! Constant folding with Java evaluation semantics.
//!
//! Folding is pure: it takes operand values and produces an outcome, with
//! no access to the registry or the reporter. Integer arithmetic wraps,
//! floating point follows IEEE 754, shifts mask their count, and `String`
//! `+` concatenates. Constant division by integral zero never panics; it
//! produces [`FoldOutcome::DivisionByZero`] and the caller decides what to
//! report.

use javelin_core::ast::{BinaryOp, UnaryOp};
use javelin_core::constant::Constant;

/// Result of a folding attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum FoldOutcome {
    /// Both operands were constant and the operation folded.
    Value(Constant),
    /// The operation does not fold (non-constant shape or unsupported mix).
    NotConstant,
    /// Integral `/` or `%` with a constant zero divisor. The expression is
    /// not a constant; the divide is kept for its runtime exception.
    DivisionByZero,
}

/// Widest numeric kind of a promoted pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum NumKind {
    Int,
    Long,
    Float,
    Double,
}

fn num_kind(c: &Constant) -> Option<NumKind> {
    match c {
        Constant::Byte(_) | Constant::Char(_) | Constant::Short(_) | Constant::Int(_) => {
            Some(NumKind::Int)
        }
        Constant::Long(_) => Some(NumKind::Long),
        Constant::Float(_) => Some(NumKind::Float),
        Constant::Double(_) => Some(NumKind::Double),
        Constant::Bool(_) | Constant::Str(_) => None,
    }
}

/// Binary numeric promotion over two constants.
fn promoted_kind(lhs: &Constant, rhs: &Constant) -> Option<NumKind> {
    Some(num_kind(lhs)?.max(num_kind(rhs)?))
}

/// Fold a binary operation over two constant operands.
pub fn fold_binary(op: BinaryOp, lhs: &Constant, rhs: &Constant) -> FoldOutcome {
    // String + anything concatenates; no other operator folds over strings
    // except the == / != identity comparisons, which never fold (identity
    // is a runtime property).
    if op == BinaryOp::Add
        && (matches!(lhs, Constant::Str(_)) || matches!(rhs, Constant::Str(_)))
    {
        return FoldOutcome::Value(Constant::Str(format!(
            "{}{}",
            lhs.to_concat_string(),
            rhs.to_concat_string()
        )));
    }
    if matches!(lhs, Constant::Str(_)) || matches!(rhs, Constant::Str(_)) {
        return FoldOutcome::NotConstant;
    }

    if op.is_logical() {
        return match (lhs.as_bool(), rhs.as_bool()) {
            (Some(a), Some(b)) => {
                let v = if op == BinaryOp::And { a && b } else { a || b };
                FoldOutcome::Value(Constant::Bool(v))
            }
            _ => FoldOutcome::NotConstant,
        };
    }

    // Boolean & | ^ == != fold without numeric promotion.
    if let (Some(a), Some(b)) = (lhs.as_bool(), rhs.as_bool()) {
        let v = match op {
            BinaryOp::BitAnd => a & b,
            BinaryOp::BitOr => a | b,
            BinaryOp::BitXor => a ^ b,
            BinaryOp::Eq => a == b,
            BinaryOp::Ne => a != b,
            _ => return FoldOutcome::NotConstant,
        };
        return FoldOutcome::Value(Constant::Bool(v));
    }

    if op.is_shift() {
        return fold_shift(op, lhs, rhs);
    }

    let Some(kind) = promoted_kind(lhs, rhs) else {
        return FoldOutcome::NotConstant;
    };

    match kind {
        NumKind::Int => {
            // Operands are known int-compatible here.
            let (Some(a), Some(b)) = (lhs.as_int(), rhs.as_int()) else {
                return FoldOutcome::NotConstant;
            };
            fold_int(op, a, b)
        }
        NumKind::Long => {
            let (Some(a), Some(b)) = (lhs.as_long(), rhs.as_long()) else {
                return FoldOutcome::NotConstant;
            };
            fold_long(op, a, b)
        }
        NumKind::Float => {
            let (Some(a), Some(b)) = (lhs.as_float(), rhs.as_float()) else {
                return FoldOutcome::NotConstant;
            };
            fold_float(op, a, b)
        }
        NumKind::Double => {
            let (Some(a), Some(b)) = (lhs.as_double(), rhs.as_double()) else {
                return FoldOutcome::NotConstant;
            };
            fold_double(op, a, b)
        }
    }
}

fn fold_int(op: BinaryOp, a: i32, b: i32) -> FoldOutcome {
    let v = match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::Div => {
            if b == 0 {
                return FoldOutcome::DivisionByZero;
            }
            a.wrapping_div(b)
        }
        BinaryOp::Rem => {
            if b == 0 {
                return FoldOutcome::DivisionByZero;
            }
            a.wrapping_rem(b)
        }
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitOr => a | b,
        BinaryOp::BitXor => a ^ b,
        BinaryOp::Lt => return FoldOutcome::Value(Constant::Bool(a < b)),
        BinaryOp::Le => return FoldOutcome::Value(Constant::Bool(a <= b)),
        BinaryOp::Gt => return FoldOutcome::Value(Constant::Bool(a > b)),
        BinaryOp::Ge => return FoldOutcome::Value(Constant::Bool(a >= b)),
        BinaryOp::Eq => return FoldOutcome::Value(Constant::Bool(a == b)),
        BinaryOp::Ne => return FoldOutcome::Value(Constant::Bool(a != b)),
        _ => return FoldOutcome::NotConstant,
    };
    FoldOutcome::Value(Constant::Int(v))
}

fn fold_long(op: BinaryOp, a: i64, b: i64) -> FoldOutcome {
    let v = match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::Div => {
            if b == 0 {
                return FoldOutcome::DivisionByZero;
            }
            a.wrapping_div(b)
        }
        BinaryOp::Rem => {
            if b == 0 {
                return FoldOutcome::DivisionByZero;
            }
            a.wrapping_rem(b)
        }
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitOr => a | b,
        BinaryOp::BitXor => a ^ b,
        BinaryOp::Lt => return FoldOutcome::Value(Constant::Bool(a < b)),
        BinaryOp::Le => return FoldOutcome::Value(Constant::Bool(a <= b)),
        BinaryOp::Gt => return FoldOutcome::Value(Constant::Bool(a > b)),
        BinaryOp::Ge => return FoldOutcome::Value(Constant::Bool(a >= b)),
        BinaryOp::Eq => return FoldOutcome::Value(Constant::Bool(a == b)),
        BinaryOp::Ne => return FoldOutcome::Value(Constant::Bool(a != b)),
        _ => return FoldOutcome::NotConstant,
    };
    FoldOutcome::Value(Constant::Long(v))
}

fn fold_float(op: BinaryOp, a: f32, b: f32) -> FoldOutcome {
    let v = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        // IEEE division by zero yields infinity/NaN, never an exception.
        BinaryOp::Div => a / b,
        BinaryOp::Rem => a % b,
        BinaryOp::Lt => return FoldOutcome::Value(Constant::Bool(a < b)),
        BinaryOp::Le => return FoldOutcome::Value(Constant::Bool(a <= b)),
        BinaryOp::Gt => return FoldOutcome::Value(Constant::Bool(a > b)),
        BinaryOp::Ge => return FoldOutcome::Value(Constant::Bool(a >= b)),
        BinaryOp::Eq => return FoldOutcome::Value(Constant::Bool(a == b)),
        BinaryOp::Ne => return FoldOutcome::Value(Constant::Bool(a != b)),
        _ => return FoldOutcome::NotConstant,
    };
    FoldOutcome::Value(Constant::Float(v))
}

fn fold_double(op: BinaryOp, a: f64, b: f64) -> FoldOutcome {
    let v = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Rem => a % b,
        BinaryOp::Lt => return FoldOutcome::Value(Constant::Bool(a < b)),
        BinaryOp::Le => return FoldOutcome::Value(Constant::Bool(a <= b)),
        BinaryOp::Gt => return FoldOutcome::Value(Constant::Bool(a > b)),
        BinaryOp::Ge => return FoldOutcome::Value(Constant::Bool(a >= b)),
        BinaryOp::Eq => return FoldOutcome::Value(Constant::Bool(a == b)),
        BinaryOp::Ne => return FoldOutcome::Value(Constant::Bool(a != b)),
        _ => return FoldOutcome::NotConstant,
    };
    FoldOutcome::Value(Constant::Double(v))
}

/// Shifts promote each operand independently; the count is always taken as
/// `int` and masked to the width of the left operand (`& 31` / `& 63`).
fn fold_shift(op: BinaryOp, lhs: &Constant, rhs: &Constant) -> FoldOutcome {
    let Some(count) = rhs.as_long() else {
        return FoldOutcome::NotConstant;
    };
    match num_kind(lhs) {
        Some(NumKind::Int) => {
            // lhs kind checked above
            let Some(a) = lhs.as_int() else {
                return FoldOutcome::NotConstant;
            };
            let s = (count as u32) & 31;
            let v = match op {
                BinaryOp::Shl => a.wrapping_shl(s),
                BinaryOp::Shr => a.wrapping_shr(s),
                BinaryOp::Ushr => ((a as u32).wrapping_shr(s)) as i32,
                _ => return FoldOutcome::NotConstant,
            };
            FoldOutcome::Value(Constant::Int(v))
        }
        Some(NumKind::Long) => {
            let Some(a) = lhs.as_long() else {
                return FoldOutcome::NotConstant;
            };
            let s = (count as u32) & 63;
            let v = match op {
                BinaryOp::Shl => a.wrapping_shl(s),
                BinaryOp::Shr => a.wrapping_shr(s),
                BinaryOp::Ushr => ((a as u64).wrapping_shr(s)) as i64,
                _ => return FoldOutcome::NotConstant,
            };
            FoldOutcome::Value(Constant::Long(v))
        }
        _ => FoldOutcome::NotConstant,
    }
}

/// Fold a unary operation over a constant operand.
pub fn fold_unary(op: UnaryOp, value: &Constant) -> FoldOutcome {
    match op {
        UnaryOp::Plus => match num_kind(value) {
            // Unary + still promotes byte/short/char to int.
            Some(NumKind::Int) => match value.as_int() {
                Some(v) => FoldOutcome::Value(Constant::Int(v)),
                None => FoldOutcome::NotConstant,
            },
            Some(_) => FoldOutcome::Value(value.clone()),
            None => FoldOutcome::NotConstant,
        },
        UnaryOp::Neg => match value {
            Constant::Double(v) => FoldOutcome::Value(Constant::Double(-v)),
            Constant::Float(v) => FoldOutcome::Value(Constant::Float(-v)),
            Constant::Long(v) => FoldOutcome::Value(Constant::Long(v.wrapping_neg())),
            _ => match value.as_int() {
                Some(v) => FoldOutcome::Value(Constant::Int(v.wrapping_neg())),
                None => FoldOutcome::NotConstant,
            },
        },
        UnaryOp::Not => match value.as_bool() {
            Some(v) => FoldOutcome::Value(Constant::Bool(!v)),
            None => FoldOutcome::NotConstant,
        },
        UnaryOp::BitNot => match value {
            Constant::Long(v) => FoldOutcome::Value(Constant::Long(!v)),
            _ => match value.as_int() {
                Some(v) => FoldOutcome::Value(Constant::Int(!v)),
                None => FoldOutcome::NotConstant,
            },
        },
        // ++ / -- mutate a variable; never constant.
        UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => {
            FoldOutcome::NotConstant
        }
    }
}
