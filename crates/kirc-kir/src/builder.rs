//! Append-only KIR builder (spec.md §2 component E): the only way values
//! and blocks enter a `Function`. Mirrors the teacher's `Builder` shape
//! (current-block cursor, monotonic counters) generalised from place
//! assignment to fresh-value emission.

use crate::kir::*;
use kirc_util::{Idx, Symbol};

pub struct FunctionBuilder {
    function: Function,
    current_block: BlockId,
    /// Fresh `%N` counter; reset to zero at function entry (spec.md §4.3, §5).
    value_counter: u32,
}

impl FunctionBuilder {
    pub fn new(name: Symbol, ret_ty: Ty) -> Self {
        let function = Function {
            name,
            ret_ty,
            params: Vec::new(),
            values: kirc_util::IndexVec::new(),
            blocks: kirc_util::IndexVec::new(),
            entry: BlockId::from_usize(0),
        };
        Self {
            function,
            current_block: BlockId::from_usize(0),
            value_counter: 0,
        }
    }

    /// Materialises the function's Nth formal parameter as a value named
    /// `name`, so the prologue lowering (component D) can `store` it into
    /// the param's local slot. `N` is this function's current parameter
    /// count, matching argument position in the RISC-V calling convention.
    pub fn add_param(&mut self, name: Symbol) -> ValueId {
        let index = self.function.params.len();
        let id = self.function.values.push(ValueData {
            kind: ValueKind::FuncArg(index),
            ty: Ty::I32,
            name: Some(name),
        });
        self.function.params.push(id);
        id
    }

    pub fn ret_ty(&self) -> Ty {
        self.function.ret_ty
    }

    /// Creates a new, empty block labelled `%{label}` without switching to
    /// it. The entry block must be created first so it keeps index 0.
    pub fn new_block(&mut self, label: &str) -> BlockId {
        self.function.blocks.push(BasicBlock {
            name: Symbol::intern(&format!("%{label}")),
            instrs: Vec::new(),
        })
    }

    pub fn set_entry(&mut self, block: BlockId) {
        self.function.entry = block;
        self.current_block = block;
    }

    pub fn current_block(&self) -> BlockId {
        self.current_block
    }

    pub fn set_current_block(&mut self, block: BlockId) {
        self.current_block = block;
    }

    pub fn is_terminated(&self) -> bool {
        self.function.blocks[self.current_block].is_terminated(&self.function.values)
    }

    fn push(&mut self, kind: ValueKind, ty: Ty, name: Option<Symbol>) -> ValueId {
        let id = self.function.values.push(ValueData { kind, ty, name });
        self.function.blocks[self.current_block].instrs.push(id);
        id
    }

    /// Emits an instruction that produces a usable `i32` result, naming it
    /// with the next fresh counter value.
    pub fn emit(&mut self, kind: ValueKind) -> ValueId {
        debug_assert!(!self.is_terminated(), "emission after a block terminator");
        let name = Symbol::intern(&format!("%{}", self.value_counter));
        self.value_counter += 1;
        self.push(kind, Ty::I32, Some(name))
    }

    /// Emits a local `alloc`, bound to its scope-suffixed source name
    /// rather than a fresh counter value (spec.md §4.1).
    pub fn emit_alloc(&mut self, kir_name: Symbol) -> ValueId {
        debug_assert!(!self.is_terminated(), "emission after a block terminator");
        self.push(ValueKind::Alloc, Ty::I32, Some(kir_name))
    }

    /// Emits a unit-typed instruction with no usable result (`store`, a
    /// `void` `call`).
    pub fn emit_unit(&mut self, kind: ValueKind) -> ValueId {
        debug_assert!(!self.is_terminated(), "emission after a block terminator");
        self.push(kind, Ty::Unit, None)
    }

    /// Emits the block's terminator (`branch`, `jump`, or `return`).
    pub fn emit_terminator(&mut self, kind: ValueKind) {
        debug_assert!(kind.is_terminator());
        debug_assert!(!self.is_terminated(), "double terminator in one block");
        self.push(kind, Ty::Unit, None);
    }

    pub fn value_ty(&self, id: ValueId) -> Ty {
        self.function.values[id].ty
    }

    pub fn finish(self) -> Function {
        self.function
    }
}

/// Assembles declarations, globals, and functions into a `Program`.
#[derive(Default)]
pub struct ProgramBuilder {
    program: Program,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_decl(&mut self, decl: FuncDecl) {
        self.program.decls.push(decl);
    }

    pub fn push_global(&mut self, global: GlobalVar) -> GlobalId {
        self.program.globals.push(global)
    }

    pub fn push_function(&mut self, function: Function) -> FuncId {
        self.program.functions.push(function)
    }

    pub fn finish(self) -> Program {
        self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_counter_resets_per_function_builder() {
        let mut fb = FunctionBuilder::new(Symbol::intern("f"), Ty::I32);
        let entry = fb.new_block("entry");
        fb.set_entry(entry);
        let a = fb.emit(ValueKind::Binary {
            op: BinOp::Add,
            lhs: Operand::Const(1),
            rhs: Operand::Const(2),
        });
        let b = fb.emit(ValueKind::Binary {
            op: BinOp::Add,
            lhs: Operand::Const(3),
            rhs: Operand::Const(4),
        });
        assert_ne!(a, b);

        let mut fb2 = FunctionBuilder::new(Symbol::intern("g"), Ty::I32);
        let entry2 = fb2.new_block("entry");
        fb2.set_entry(entry2);
        let first = fb2.emit(ValueKind::Binary {
            op: BinOp::Add,
            lhs: Operand::Const(1),
            rhs: Operand::Const(2),
        });
        assert_eq!(fb2.function.values[first].name, fb.function.values[a].name);
    }

    #[test]
    fn block_is_terminated_after_return() {
        let mut fb = FunctionBuilder::new(Symbol::intern("f"), Ty::I32);
        let entry = fb.new_block("entry");
        fb.set_entry(entry);
        assert!(!fb.is_terminated());
        fb.emit_terminator(ValueKind::Return { value: None });
        assert!(fb.is_terminated());
    }
}
