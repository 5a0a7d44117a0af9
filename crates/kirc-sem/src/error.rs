use kirc_util::Span;
use thiserror::Error;

/// Every lowering error is fatal to the current compile (spec.md §7): there
/// is no recovery, only a diagnostic identifying which contract broke.
#[derive(Debug, Error)]
pub enum SemaError {
    #[error("use of undeclared identifier '{name}'")]
    UndeclaredIdent { name: String, span: Span },

    #[error("redefinition of '{name}' in the same scope")]
    Redefinition { name: String, span: Span },

    #[error("cannot assign to const '{name}'")]
    AssignToConst { name: String, span: Span },

    #[error("initializer for const or global '{name}' is not a compile-time constant")]
    NonConstInitializer { name: String, span: Span },

    #[error("expression is not a compile-time constant")]
    NotConstant { span: Span },

    #[error("'break' outside any loop")]
    BreakOutsideLoop { span: Span },

    #[error("'continue' outside any loop")]
    ContinueOutsideLoop { span: Span },

    #[error("call to undeclared function '{name}'")]
    UndeclaredFunction { name: String, span: Span },

    #[error("'{name}' is not a function")]
    NotAFunction { name: String, span: Span },

    #[error("function '{name}' expects {expected} argument(s), got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("value of void-returning call to '{name}' used as a value")]
    VoidValueUsed { name: String, span: Span },

    #[error("internal error: unbalanced scope stack (popped past the root)")]
    UnbalancedScopePop,
}

pub type SemaResult<T> = Result<T, SemaError>;
