//! kirc-sem - scoped symbol table, binding kinds, and runtime-library
//! declarations (components A and H of the pipeline).

pub mod binding;
pub mod error;
pub mod runtime;
pub mod scope;

pub use binding::Binding;
pub use error::{SemaError, SemaResult};
pub use runtime::{declare_runtime, RuntimeFn, RUNTIME_FUNCTIONS};
pub use scope::{RibKind, ScopeTree};
