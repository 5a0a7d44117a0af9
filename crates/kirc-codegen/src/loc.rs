//! Value-location map (spec.md §4.6): resolves a KIR value to the stack
//! offset or ABI register it lives at. Grounded on original_source's
//! `is_visited` cache of `ON_REG`/`ON_STACK`, simplified because this
//! backend always stores every materialised result to its slot immediately
//! (spec.md §4.6) — a value's location, once assigned, never changes, so
//! the whole map can be built in one upfront pass instead of lazily.

use kirc_kir::{Function, Ty, ValueId};
use rustc_hash::FxHashMap;

use crate::abi::Abi;
use crate::regalloc::Reg;

#[derive(Debug, Clone, Copy)]
pub enum ValueLoc {
    /// An i32-producing instruction's result, at this byte offset from `sp`.
    Stack(u32),
    /// One of the first 8 function parameters, resident in an ABI register
    /// at function entry (before its prologue `store` spills it).
    ArgReg(Reg),
    /// The 9th+ function parameter, passed by the caller in its own
    /// outgoing-arg area at this offset above the callee's frame.
    ArgStack(u32),
}

pub struct ValueLocations {
    locs: FxHashMap<ValueId, ValueLoc>,
}

impl ValueLocations {
    /// Scans `function`'s blocks in emission order, assigning each i32-typed
    /// instruction result the next sequential slot in the local-value area
    /// (spec.md §4.6 "S = 4 × number of instructions whose result type is
    /// i32"). `outgoing_args` is `A`, so local offsets start right above it.
    /// Returns the map and the total size of the local-value area (`S`).
    pub fn assign(function: &Function, outgoing_args: u32) -> (Self, u32) {
        let mut locs = FxHashMap::default();
        for (index, param) in function.params.iter().enumerate() {
            let loc = if index < Abi::ARG_REGS.len() {
                ValueLoc::ArgReg(Abi::ARG_REGS[index])
            } else {
                ValueLoc::ArgStack(Abi::stack_arg_offset(index))
            };
            locs.insert(*param, loc);
        }

        let mut next_slot = 0u32;
        for block_id in function.block_order() {
            for &value_id in &function.blocks[block_id].instrs {
                if function.values[value_id].ty == Ty::I32 {
                    locs.insert(value_id, ValueLoc::Stack(outgoing_args + next_slot));
                    next_slot += 4;
                }
            }
        }

        (Self { locs }, next_slot)
    }

    pub fn get(&self, value: ValueId) -> Option<ValueLoc> {
        self.locs.get(&value).copied()
    }
}
