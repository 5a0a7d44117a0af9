//! Scratch-register arbiter (spec.md §4.7): a bitmap over the 15
//! caller-saved scratch registers. Grounded on original_source/src/
//! riscv.h's `RegManager`/`REG_NUM`, reshaped from a raw index array into
//! a typed `Reg` enum plus a `u16` bitmap. Registers are freed in one shot
//! after each KIR instruction is fully emitted (`free_all`), never
//! individually — spec.md §4.7's "free-on-flush" discipline.

use crate::error::{CodegenError, CodegenResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
    Zero,
    T0,
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
    A7,
    Ra,
    Sp,
}

impl Reg {
    pub fn name(self) -> &'static str {
        match self {
            Reg::Zero => "x0",
            Reg::T0 => "t0",
            Reg::T1 => "t1",
            Reg::T2 => "t2",
            Reg::T3 => "t3",
            Reg::T4 => "t4",
            Reg::T5 => "t5",
            Reg::T6 => "t6",
            Reg::A0 => "a0",
            Reg::A1 => "a1",
            Reg::A2 => "a2",
            Reg::A3 => "a3",
            Reg::A4 => "a4",
            Reg::A5 => "a5",
            Reg::A6 => "a6",
            Reg::A7 => "a7",
            Reg::Ra => "ra",
            Reg::Sp => "sp",
        }
    }
}

pub const SCRATCH: [Reg; 15] = [
    Reg::T0,
    Reg::T1,
    Reg::T2,
    Reg::T3,
    Reg::T4,
    Reg::T5,
    Reg::T6,
    Reg::A0,
    Reg::A1,
    Reg::A2,
    Reg::A3,
    Reg::A4,
    Reg::A5,
    Reg::A6,
    Reg::A7,
];

/// Tracks which of the 15 scratch registers are currently live, within one
/// KIR instruction's emission. `x0` is not tracked — it is never allocated,
/// only ever read as a hardwired zero (spec.md §4.6's `Operand::Const(0)`
/// row).
#[derive(Default)]
pub struct RegisterArbiter {
    used: u16,
}

impl RegisterArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self) -> CodegenResult<Reg> {
        for (index, reg) in SCRATCH.iter().enumerate() {
            if self.used & (1 << index) == 0 {
                self.used |= 1 << index;
                return Ok(*reg);
            }
        }
        Err(CodegenError::RegistersExhausted)
    }

    /// Reserves a specific scratch register (used when argument values must
    /// land in a fixed ABI register, spec.md §4.6's call convention) so the
    /// arbiter's live-set stays accurate for the rest of the instruction.
    pub fn alloc_specific(&mut self, reg: Reg) -> CodegenResult<Reg> {
        let index = SCRATCH
            .iter()
            .position(|r| *r == reg)
            .ok_or_else(|| CodegenError::Internal(format!("{} is not a scratch register", reg.name())))?;
        if self.used & (1 << index) != 0 {
            return Err(CodegenError::RegistersExhausted);
        }
        self.used |= 1 << index;
        Ok(reg)
    }

    pub fn free_all(&mut self) {
        self.used = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.used == 0
    }
}
