//! Lowers a [`kirc_front`] AST into KIR (spec.md §2, components B-E): a
//! typed SSA intermediate representation with explicit `alloc`/`load`/
//! `store` and a textual printable form. The RISC-V backend (`kirc-codegen`)
//! consumes the [`Program`] this crate produces directly; nothing here
//! ever round-trips through [`print`]'s text (spec.md §1 treats parsing
//! that text back into typed nodes as an external, contract-only
//! dependency this pipeline has no need of).

pub mod builder;
pub mod error;
pub mod kir;
pub mod lower;
pub mod print;

pub use error::{LowerError, LowerResult};
pub use kir::*;
pub use lower::lower_comp_unit;

/// Lowers a parsed compilation unit to a KIR [`Program`] (spec.md §4).
pub fn lower(unit: &kirc_front::CompUnit) -> LowerResult<Program> {
    lower_comp_unit(unit)
}
