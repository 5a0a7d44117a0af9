//! Lowers a [`kirc_kir::Program`] to RISC-V (RV32) assembly text (spec.md
//! §4.6, §6.3). Grounded on `faxc-gen/src/asm.rs`'s generator shape and on
//! `original_source/src/riscv.cpp`'s per-value dispatch.

pub mod abi;
pub mod asm;
pub mod error;
pub mod frame;
pub mod loc;
pub mod regalloc;
pub mod select;

pub use error::{CodegenError, CodegenResult};

/// Strips the KIR `@`/`%` sigil so a name is usable as a plain assembly
/// label — KIR gives every function and global a `@name`, but `.globl`/`call`
/// target bare symbols.
pub(crate) fn strip_at(name: &str) -> &str {
    name.strip_prefix('@').unwrap_or(name)
}

/// Generates the complete assembly listing for `program` (spec.md §4.6).
pub fn generate(program: &kirc_kir::Program) -> CodegenResult<String> {
    asm::generate_program(program)
}
