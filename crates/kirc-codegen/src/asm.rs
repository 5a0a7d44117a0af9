//! Assembly emission (spec.md §4.6 instruction selection + prologue/
//! epilogue, §6.3 output contract). Grounded on `faxc-gen/src/asm.rs`'s
//! `AsmGenerator` shape (`output: String`, incremental `write!`) and on
//! `original_source/src/riscv.cpp`'s per-KIR-kind `Visit` dispatch for the
//! concrete opcode choices spec.md §4.6 also gives directly.

use std::fmt::Write as _;

use kirc_kir::{Function, GlobalInit, GlobalVar, Program};

use crate::error::CodegenResult;
use crate::frame::StackFrame;
use crate::select::{self, FnCtx};
use crate::strip_at;

pub fn generate_program(program: &Program) -> CodegenResult<String> {
    let mut out = String::new();

    if !program.globals.is_empty() {
        writeln!(out, "  .data").unwrap();
        for global in program.globals.iter() {
            emit_global(&mut out, global);
        }
    }

    writeln!(out, "  .text").unwrap();
    for function in program.functions.iter() {
        emit_function(&mut out, function)?;
    }

    Ok(out)
}

fn emit_global(out: &mut String, global: &GlobalVar) {
    let label = strip_at(global.name.as_str());
    writeln!(out, "  .globl {label}").unwrap();
    writeln!(out, "{label}:").unwrap();
    let value = match global.init {
        GlobalInit::Const(v) => v,
        GlobalInit::Zero => 0,
    };
    writeln!(out, "  .word {value}").unwrap();
}

fn emit_function(out: &mut String, function: &Function) -> CodegenResult<()> {
    let label = strip_at(function.name.as_str()).to_string();
    let (frame, locations) = StackFrame::compute(function);

    writeln!(out, "  .globl {label}").unwrap();
    writeln!(out, "{label}:").unwrap();

    let mut ctx = FnCtx::new(function, label, frame, locations);
    select::emit_prologue(&mut ctx);
    for block_id in function.block_order() {
        writeln!(ctx.out, "{}:", ctx.block_label(block_id)).unwrap();
        for &value_id in &function.blocks[block_id].instrs {
            select::emit_value(&mut ctx, value_id)?;
            ctx.regs.free_all();
        }
    }

    out.push_str(&ctx.out);
    debug_assert!(ctx.regs.is_empty());
    Ok(())
}
