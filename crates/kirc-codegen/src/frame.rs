//! Stack-frame layout (spec.md §4.6 "Frame layout"). Grounded on
//! faxc-lir/src/stack_frame.rs's `StackFrame` (offsets computed up front
//! from a scan, 16-byte rounding), re-specialised from x86-64's 8-byte
//! slots and push-based prologue to RV32's 4-byte slots and an explicit
//! `addi sp, sp, -F` (or materialised-immediate) prologue.

use kirc_kir::{Function, ValueKind};

use crate::loc::ValueLocations;

pub struct StackFrame {
    /// `A`: bytes reserved for this function's own outgoing call arguments
    /// beyond the 8 that fit in registers.
    pub outgoing_args: u32,
    /// `S`: bytes for this function's i32-producing instruction results.
    pub locals: u32,
    /// Whether this function makes any call, and so must save `ra`.
    pub saves_ra: bool,
    /// `F`, rounded up to 16 bytes (the RV32 stack-alignment requirement).
    pub frame_size: u32,
}

impl StackFrame {
    /// `addi` only encodes a 12-bit signed immediate; frame sizes at or
    /// beyond this must be materialised into a scratch register first.
    pub const MAX_ADDI_IMMEDIATE: i64 = 2048;

    pub fn compute(function: &Function) -> (Self, ValueLocations) {
        let max_arity = max_call_arity(function);
        let outgoing_args = (4 * max_arity.saturating_sub(8)) as u32;
        let saves_ra = has_any_call(function);
        let (locations, locals) = ValueLocations::assign(function, outgoing_args);
        let ra_area = if saves_ra { 4 } else { 0 };
        let frame_size = round_up_16(outgoing_args + locals + ra_area);
        (
            Self {
                outgoing_args,
                locals,
                saves_ra,
                frame_size,
            },
            locations,
        )
    }

    pub fn ra_offset(&self) -> Option<u32> {
        self.saves_ra.then(|| self.frame_size - 4)
    }

    pub fn needs_materialised_adjustment(&self) -> bool {
        i64::from(self.frame_size) >= Self::MAX_ADDI_IMMEDIATE
    }
}

fn round_up_16(n: u32) -> u32 {
    (n + 15) & !15
}

fn has_any_call(function: &Function) -> bool {
    function
        .values
        .iter()
        .any(|value| matches!(value.kind, ValueKind::Call { .. }))
}

fn max_call_arity(function: &Function) -> usize {
    function
        .values
        .iter()
        .filter_map(|value| match &value.kind {
            ValueKind::Call { args, .. } => Some(args.len()),
            _ => None,
        })
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kirc_kir::{Operand, Ptr, Ty};
    use kirc_util::Symbol;

    use crate::error::CodegenResult;

    fn leaf_function() -> Function {
        let mut builder = kirc_kir::builder::FunctionBuilder::new(Symbol::intern("@leaf"), Ty::I32);
        let entry = builder.new_block("entry");
        builder.set_entry(entry);
        let slot = builder.emit_alloc(Symbol::intern("@x"));
        builder.emit_unit(ValueKind::Store {
            value: Operand::Const(1),
            ptr: Ptr::Local(slot),
        });
        let loaded = builder.emit(ValueKind::Load { ptr: Ptr::Local(slot) });
        builder.emit_terminator(ValueKind::Return {
            value: Some(Operand::Value(loaded)),
        });
        builder.finish()
    }

    #[test]
    fn leaf_function_needs_no_outgoing_args_and_no_ra_save() {
        let function = leaf_function();
        let (frame, _) = StackFrame::compute(&function);
        assert_eq!(frame.outgoing_args, 0);
        assert!(!frame.saves_ra);
        assert_eq!(frame.ra_offset(), None);
        assert_eq!(frame.frame_size % 16, 0);
    }

    #[test]
    fn calling_with_nine_args_reserves_one_outgoing_slot() -> CodegenResult<()> {
        let mut builder = kirc_kir::builder::FunctionBuilder::new(Symbol::intern("@caller"), Ty::Unit);
        let entry = builder.new_block("entry");
        builder.set_entry(entry);
        let args = vec![Operand::Const(0); 9];
        builder.emit(ValueKind::Call {
            callee: Symbol::intern("@f"),
            args,
        });
        builder.emit_terminator(ValueKind::Return { value: None });
        let function = builder.finish();

        let (frame, _) = StackFrame::compute(&function);
        assert_eq!(frame.outgoing_args, 4);
        assert!(frame.saves_ra);
        assert!(frame.ra_offset().is_some());
        Ok(())
    }

    #[test]
    fn large_frame_needs_materialised_adjustment() {
        let frame = StackFrame {
            outgoing_args: 0,
            locals: 4096,
            saves_ra: false,
            frame_size: 4096,
        };
        assert!(frame.needs_materialised_adjustment());
    }
}
