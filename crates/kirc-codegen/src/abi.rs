//! RV32 integer calling convention (spec.md §4.6's instruction table and
//! prologue/epilogue rules). Grounded on faxc-lir/src/calling_convention.rs's
//! `SystemVAbi` shape (arg-register table, stack-arg offset formula),
//! re-specialised from SysV's 6 integer arg registers to RV32's 8.

use crate::regalloc::Reg;

pub struct Abi;

impl Abi {
    pub const ARG_REGS: [Reg; 8] = [
        Reg::A0,
        Reg::A1,
        Reg::A2,
        Reg::A3,
        Reg::A4,
        Reg::A5,
        Reg::A6,
        Reg::A7,
    ];

    pub const RET_REG: Reg = Reg::A0;

    pub fn arg_register(index: usize) -> Option<Reg> {
        Self::ARG_REGS.get(index).copied()
    }

    pub fn is_stack_arg(index: usize) -> bool {
        index >= Self::ARG_REGS.len()
    }

    /// Offset, in bytes from the callee's `sp`, of the outgoing-arg slot for
    /// the `index`-th argument (`index >= 8`) — spec.md §4.6's frame layout
    /// places these at the bottom of the frame.
    pub fn stack_arg_offset(index: usize) -> u32 {
        debug_assert!(Self::is_stack_arg(index));
        ((index - Self::ARG_REGS.len()) * 4) as u32
    }
}
