//! kirc-util - shared foundation types for the kirc workspace.
//!
//! Interning, source spans, a typed index vector, and diagnostics. Every
//! other crate in the workspace depends on this one and nothing else.

pub mod diagnostic;
pub mod error;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use diagnostic::{Diagnostic, Handler, Level};
pub use index_vec::{Idx, IndexVec};
pub use span::{SourceMap, Span};
pub use symbol::Symbol;
