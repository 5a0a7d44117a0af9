use kirc_sem::SemaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LowerError {
    #[error(transparent)]
    Sema(#[from] SemaError),

    #[error("internal error: register/value counter overflow in function '{func}'")]
    CounterOverflow { func: String },

    #[error("internal error: {0}")]
    InternalInvariant(String),
}

pub type LowerResult<T> = Result<T, LowerError>;
