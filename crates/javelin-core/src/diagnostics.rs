//! Named, parameterized diagnostics and the reporter sink.
//!
//! Expected semantic errors are never thrown: the resolver reports a
//! [`Diagnostic`] and degrades (the node resolves to no type), so siblings
//! keep resolving and one bad expression cannot abort the unit. Only
//! [`Diagnostic::Internal`] marks a genuine engine gap; it aborts the
//! enclosing member.

use thiserror::Error;

use crate::span::Span;

/// A single compiler diagnostic.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Diagnostic {
    /// No built-in semantics and no overload match for the operator.
    #[error("at {span}: operator '{operator}' undefined for '{left}' and '{right}'")]
    InvalidOperator {
        operator: String,
        left: String,
        right: String,
        span: Span,
    },

    /// Overload methods discoverable on both operand types.
    #[error("at {span}: operator '{operator}' is ambiguous: both '{left}' and '{right}' declare a matching method")]
    AmbiguousOperatorOverload {
        operator: String,
        left: String,
        right: String,
        span: Span,
    },

    /// Neither operand type declares the overload method.
    #[error("at {span}: no method '{method}' found for operator '{operator}'")]
    MissingOperatorMethod {
        operator: String,
        method: String,
        span: Span,
    },

    /// `eq` without `neq` (or vice versa) on the same class.
    #[error("at {span}: '{found}' requires the paired '{missing}' method on '{owner}'")]
    MissingOperatorCounterpart {
        found: String,
        missing: String,
        owner: String,
        span: Span,
    },

    /// A static method matched an instance operator lookup.
    #[error("at {span}: operator method '{method}' on '{owner}' must not be static")]
    StaticOperatorMethod {
        method: String,
        owner: String,
        span: Span,
    },

    /// No method on the receiver type matches the call's name and
    /// argument types.
    #[error("at {span}: no method '{method}' on '{receiver}' matches the arguments")]
    MethodNotFound {
        receiver: String,
        method: String,
        span: Span,
    },

    /// The assigned value's type cannot convert to the target's type.
    #[error("at {span}: incompatible types: '{value}' cannot be converted to '{target}'")]
    IncompatibleAssignment {
        target: String,
        value: String,
        span: Span,
    },

    /// `char[]` operand of String `+` is almost always a bug.
    #[error("at {span}: 'char[]' in String concatenation does not print its contents")]
    StringConcatCharArray { span: Span },

    /// Constant integer division/remainder by zero.
    #[error("at {span}: division by zero in constant expression")]
    DivisionByZeroConstant { span: Span },

    /// Array index is not int-compatible.
    #[error("at {span}: array index must be 'int'-compatible, found '{found}'")]
    InvalidIndexType { found: String, span: Span },

    /// Read of a local that is not definitely assigned.
    #[error("at {span}: variable '{name}' may not have been initialized")]
    UninitializedLocal { name: String, span: Span },

    /// Two `default` labels in one switch.
    #[error("at {span}: duplicate 'default' label")]
    DuplicateDefaultCase { span: Span },

    /// Two `null` labels in one switch.
    #[error("at {span}: duplicate 'null' label")]
    DuplicateNullCase { span: Span },

    /// The same constant appears on two case labels.
    #[error("at {span}: duplicate case label")]
    ConstantCaseDuplicated { span: Span },

    /// A pattern label can never match because an earlier one covers it.
    #[error("at {span}: this case label is dominated by a preceding case label")]
    DominatedCaseLabel { span: Span },

    /// `default` after an unconditional total pattern.
    #[error("at {span}: 'default' is unreachable; a preceding pattern matches every value")]
    UnreachableDefault { span: Span },

    /// An enum switch without default is missing a constant.
    #[error("at {span}: switch does not cover enum constant '{constant}'")]
    MissingEnumConstant { constant: String, span: Span },

    /// An expression switch arm yields a type the other arms do not.
    #[error("at {span}: switch arm yields '{found}', expected '{expected}'")]
    MismatchedSwitchArmType {
        expected: String,
        found: String,
        span: Span,
    },

    /// A pattern/sealed switch does not cover the selector type.
    #[error("at {span}: switch does not cover all possible values of '{selector}'")]
    NonExhaustiveSwitch { selector: String, span: Span },

    /// Statement group falls through into a pattern label.
    #[error("at {span}: illegal fall-through to a case label with a pattern")]
    IllegalFallthroughToPattern { span: Span },

    /// Case label type can never match the selector.
    #[error("at {span}: case type '{case_ty}' is incompatible with selector type '{selector}'")]
    CaseTypeIncompatible {
        case_ty: String,
        selector: String,
        span: Span,
    },

    /// A record pattern's component count does not match the record.
    #[error("at {span}: record pattern for '{record}' expects {expected} components, found {found}")]
    RecordComponentMismatch {
        record: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    /// A case label expression is not a compile-time constant.
    #[error("at {span}: case label must be a compile-time constant")]
    NonConstantCaseLabel { span: Span },

    /// A guard expression is not boolean.
    #[error("at {span}: pattern guard must be of type 'boolean', found '{found}'")]
    NonBooleanGuard { found: String, span: Span },

    /// An engine gap was reached; fatal for the enclosing member only.
    #[error("internal error at {span}: {message}")]
    Internal { message: String, span: Span },
}

impl Diagnostic {
    /// Where the diagnostic points.
    pub fn span(&self) -> Span {
        match self {
            Diagnostic::InvalidOperator { span, .. }
            | Diagnostic::AmbiguousOperatorOverload { span, .. }
            | Diagnostic::MissingOperatorMethod { span, .. }
            | Diagnostic::MissingOperatorCounterpart { span, .. }
            | Diagnostic::StaticOperatorMethod { span, .. }
            | Diagnostic::MethodNotFound { span, .. }
            | Diagnostic::IncompatibleAssignment { span, .. }
            | Diagnostic::StringConcatCharArray { span }
            | Diagnostic::DivisionByZeroConstant { span }
            | Diagnostic::InvalidIndexType { span, .. }
            | Diagnostic::UninitializedLocal { span, .. }
            | Diagnostic::DuplicateDefaultCase { span }
            | Diagnostic::DuplicateNullCase { span }
            | Diagnostic::ConstantCaseDuplicated { span }
            | Diagnostic::DominatedCaseLabel { span }
            | Diagnostic::UnreachableDefault { span }
            | Diagnostic::MissingEnumConstant { span, .. }
            | Diagnostic::MismatchedSwitchArmType { span, .. }
            | Diagnostic::NonExhaustiveSwitch { span, .. }
            | Diagnostic::IllegalFallthroughToPattern { span }
            | Diagnostic::CaseTypeIncompatible { span, .. }
            | Diagnostic::RecordComponentMismatch { span, .. }
            | Diagnostic::NonConstantCaseLabel { span }
            | Diagnostic::NonBooleanGuard { span, .. }
            | Diagnostic::Internal { span, .. } => *span,
        }
    }

    /// Severity of the diagnostic.
    pub fn severity(&self) -> Severity {
        match self {
            // Advisory: compilation proceeds with the standard lowering.
            Diagnostic::StringConcatCharArray { .. }
            | Diagnostic::DivisionByZeroConstant { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Whether this diagnostic aborts the enclosing member.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Diagnostic::Internal { .. })
    }
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// Collects diagnostics for a compilation unit.
///
/// The reporter never deduplicates; resolve-once semantics in the resolver
/// guarantee each fault is reported exactly once.
#[derive(Debug, Default)]
pub struct ProblemReporter {
    diagnostics: Vec<Diagnostic>,
}

impl ProblemReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Number of error-severity diagnostics.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() == Severity::Error)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
