//! Shared leaf error types for utilities owned by this crate.
//!
//! Each downstream crate defines its own error enum for its own phase
//! (parsing, semantic lowering, codegen); this module only covers the
//! utilities `kirc-util` itself owns.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("'{0}' is already declared in this scope")]
    AlreadyDeclared(String),

    #[error("popped a scope frame that was never pushed")]
    UnbalancedPop,
}

#[derive(Debug, Error)]
pub enum DiagnosticError {
    #[error("failed to format diagnostic: {0}")]
    FormatFailed(String),
}

pub type ScopeResult<T> = std::result::Result<T, ScopeError>;
pub type DiagnosticResult<T> = std::result::Result<T, DiagnosticError>;
