//! Arena-allocated abstract syntax tree.
//!
//! Nodes are immutable once built: resolution never writes back into the
//! tree. Every node carries a [`NodeId`] and the resolver keeps its results
//! in a side table keyed by id, so the same tree can be resolved and then
//! walked by later passes without interior mutability.
//!
//! Lifetimes follow arena allocation (`&'ast`); tests build trees out of a
//! `bumpalo::Bump`.

use bitflags::bitflags;

use crate::constant::Constant;
use crate::hash::TypeHash;
use crate::span::Span;

/// Identity of an AST node within one compilation unit.
pub type NodeId = u32;

/// Identity of a local variable slot.
pub type LocalId = u32;

bitflags! {
    /// Orthogonal per-node properties, kept apart from the operator itself.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u8 {
        /// The node was written in parentheses.
        const PARENTHESIZED = 1 << 0;
        /// The node was synthesized by the compiler, not written in source.
        const SYNTHETIC = 1 << 1;
    }
}

/// Binary operators. One operator, one variant; no packed encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    Ushr,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitOr,
    BitXor,
    /// `&&`
    And,
    /// `||`
    Or,
}

impl BinaryOp {
    /// Source-level spelling, for diagnostics.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Ushr => ">>>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// `+ - * / %`
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem
        )
    }

    /// `<< >> >>>` — promoted per operand, not pairwise.
    pub fn is_shift(&self) -> bool {
        matches!(self, BinaryOp::Shl | BinaryOp::Shr | BinaryOp::Ushr)
    }

    /// `< <= > >= == !=`
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge
                | BinaryOp::Eq
                | BinaryOp::Ne
        )
    }

    /// `== !=` — the pair with counterpart requirements under overloading.
    pub fn is_equality(&self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::Ne)
    }

    /// `& | ^`
    pub fn is_bitwise(&self) -> bool {
        matches!(self, BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor)
    }

    /// `&& ||` — short-circuiting, never overloadable.
    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

/// Unary operators, prefix and postfix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Plus,
    /// Logical `!`.
    Not,
    /// Bitwise `~`.
    BitNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::PreInc | UnaryOp::PostInc => "++",
            UnaryOp::PreDec | UnaryOp::PostDec => "--",
        }
    }

    /// Whether the operator mutates its operand.
    pub fn is_inc_dec(&self) -> bool {
        matches!(
            self,
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec
        )
    }
}

/// An expression node.
#[derive(Debug)]
pub struct Expr<'ast> {
    pub id: NodeId,
    pub span: Span,
    pub flags: NodeFlags,
    pub kind: ExprKind<'ast>,
}

impl<'ast> Expr<'ast> {
    pub fn new(id: NodeId, span: Span, kind: ExprKind<'ast>) -> Self {
        Self {
            id,
            span,
            flags: NodeFlags::empty(),
            kind,
        }
    }

    pub fn with_flags(mut self, flags: NodeFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Expression forms.
#[derive(Debug)]
pub enum ExprKind<'ast> {
    /// A literal with its compile-time value.
    Literal(Constant),
    /// The `null` literal.
    Null,
    /// A resolved local variable reference.
    Local {
        local: LocalId,
        name: &'ast str,
        ty: TypeHash,
    },
    Binary {
        op: BinaryOp,
        lhs: &'ast Expr<'ast>,
        rhs: &'ast Expr<'ast>,
    },
    Unary {
        op: UnaryOp,
        operand: &'ast Expr<'ast>,
    },
    /// Simple or compound assignment (`op` is the compound operator).
    Assign {
        op: Option<BinaryOp>,
        target: &'ast Expr<'ast>,
        value: &'ast Expr<'ast>,
    },
    /// `array[index]` in read or write position.
    ArrayRef {
        array: &'ast Expr<'ast>,
        index: &'ast Expr<'ast>,
    },
    /// An instance method call with a resolved receiver type.
    Call {
        receiver: &'ast Expr<'ast>,
        method: &'ast str,
        args: &'ast [&'ast Expr<'ast>],
    },
    Cast {
        ty: TypeHash,
        operand: &'ast Expr<'ast>,
    },
    /// `switch` used as an expression.
    Switch(&'ast SwitchNode<'ast>),
}

/// A statement node.
#[derive(Debug)]
pub enum Stmt<'ast> {
    Expr(&'ast Expr<'ast>),
    Block(&'ast [Stmt<'ast>]),
    If {
        span: Span,
        cond: &'ast Expr<'ast>,
        then_branch: &'ast Stmt<'ast>,
        else_branch: Option<&'ast Stmt<'ast>>,
    },
    Switch(&'ast SwitchNode<'ast>),
    LocalDecl {
        local: LocalId,
        name: &'ast str,
        ty: TypeHash,
        init: Option<&'ast Expr<'ast>>,
        span: Span,
    },
    Break {
        span: Span,
    },
    Return {
        value: Option<&'ast Expr<'ast>>,
        span: Span,
    },
    /// `yield` inside a switch expression arm.
    Yield {
        value: &'ast Expr<'ast>,
        span: Span,
    },
}

impl Stmt<'_> {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Expr(e) => e.span,
            Stmt::Block(stmts) => stmts.first().map(|s| s.span()).unwrap_or_default(),
            Stmt::If { span, .. }
            | Stmt::LocalDecl { span, .. }
            | Stmt::Break { span }
            | Stmt::Return { span, .. }
            | Stmt::Yield { span, .. } => *span,
            Stmt::Switch(node) => node.span,
        }
    }
}

/// Whether a switch produces a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchKind {
    Statement,
    Expression,
}

/// A `switch` construct, shared between statement and expression forms.
#[derive(Debug)]
pub struct SwitchNode<'ast> {
    pub id: NodeId,
    pub span: Span,
    pub kind: SwitchKind,
    pub selector: &'ast Expr<'ast>,
    pub arms: &'ast [SwitchArm<'ast>],
}

/// One `case`/`default` group: its labels and the statements it runs.
#[derive(Debug)]
pub struct SwitchArm<'ast> {
    pub labels: &'ast [CaseLabel<'ast>],
    pub body: &'ast [Stmt<'ast>],
    /// Arrow arms (`->`) never fall through; colon groups may.
    pub is_arrow: bool,
    pub span: Span,
}

/// A single case label.
#[derive(Debug)]
pub enum CaseLabel<'ast> {
    /// `case <constant-expression>:`
    Constant(&'ast Expr<'ast>),
    /// `case <pattern>:`
    Pattern(&'ast Pattern<'ast>),
    /// `case null:`
    Null(Span),
    /// `default:`
    Default(Span),
}

impl CaseLabel<'_> {
    pub fn span(&self) -> Span {
        match self {
            CaseLabel::Constant(e) => e.span,
            CaseLabel::Pattern(p) => p.span,
            CaseLabel::Null(span) | CaseLabel::Default(span) => *span,
        }
    }
}

/// A pattern. Carries its position among sibling labels or record
/// components; the enclosing construct is threaded through resolution calls
/// rather than stored as a back-pointer.
#[derive(Debug)]
pub struct Pattern<'ast> {
    pub id: NodeId,
    pub span: Span,
    /// Position among sibling case labels (or record components).
    pub index: u32,
    pub kind: PatternKind<'ast>,
}

/// Pattern forms.
#[derive(Debug)]
pub enum PatternKind<'ast> {
    /// `Circle c` or `var x` (a type pattern; `var` infers from context).
    Type {
        ty: Option<TypeHash>,
        binding: Option<PatternBinding<'ast>>,
    },
    /// `Circle(Point(var x, var y), var r)`.
    Record {
        ty: TypeHash,
        components: &'ast [Pattern<'ast>],
    },
    /// `Circle c when c.radius() > 0`.
    Guarded {
        inner: &'ast Pattern<'ast>,
        guard: &'ast Expr<'ast>,
    },
}

/// A local introduced by a pattern binding.
#[derive(Debug, Clone, Copy)]
pub struct PatternBinding<'ast> {
    pub local: LocalId,
    pub name: &'ast str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_classification() {
        assert!(BinaryOp::Add.is_arithmetic());
        assert!(BinaryOp::Eq.is_equality());
        assert!(BinaryOp::Eq.is_comparison());
        assert!(BinaryOp::Shl.is_shift());
        assert!(BinaryOp::And.is_logical());
        assert!(!BinaryOp::And.is_bitwise());
    }

    #[test]
    fn flags_are_orthogonal() {
        let flags = NodeFlags::PARENTHESIZED | NodeFlags::SYNTHETIC;
        assert!(flags.contains(NodeFlags::PARENTHESIZED));
        assert!(NodeFlags::empty().is_empty());
    }

    #[test]
    fn arena_tree_construction() {
        let arena = bumpalo::Bump::new();
        let one = arena.alloc(Expr::new(
            0,
            Span::point(1, 1),
            ExprKind::Literal(Constant::Int(1)),
        ));
        let two = arena.alloc(Expr::new(
            1,
            Span::point(1, 5),
            ExprKind::Literal(Constant::Int(2)),
        ));
        let sum = Expr::new(
            2,
            Span::new(1, 1, 5),
            ExprKind::Binary {
                op: BinaryOp::Add,
                lhs: one,
                rhs: two,
            },
        );
        match sum.kind {
            ExprKind::Binary { op, lhs, .. } => {
                assert_eq!(op, BinaryOp::Add);
                assert!(matches!(lhs.kind, ExprKind::Literal(Constant::Int(1))));
            }
            _ => panic!("expected binary"),
        }
    }
}
