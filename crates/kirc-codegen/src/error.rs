use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("register arbiter exhausted (internal invariant violated)")]
    RegistersExhausted,

    #[error("internal error: value '{0}' referenced before it was assigned a location")]
    UnresolvedValue(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type CodegenResult<T> = Result<T, CodegenError>;
