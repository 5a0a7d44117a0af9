//! Per-function lowering state (spec.md §9 "Process-wide counters"): the
//! source's file-scope mutables (`symbol_cnt`, `label_cnt`, `while_stack`,
//! `current_func`) collapsed into one context threaded through every
//! traversal and reset at function entry.

use crate::builder::FunctionBuilder;
use crate::error::{LowerError, LowerResult};
use crate::kir::{BlockId, Operand, Ptr, Ty, ValueId, ValueKind};
use kirc_sem::ScopeTree;
use kirc_util::Symbol;
use rustc_hash::FxHashMap;

/// One `while`'s entry/exit labels, for `break`/`continue` to target.
#[derive(Clone, Copy)]
pub struct LoopLabels {
    pub entry: BlockId,
    pub exit: BlockId,
}

pub struct LoweringCtx {
    pub scopes: ScopeTree,
    pub builder: FunctionBuilder,
    /// Label counter, global to the function, not reset per block
    /// (spec.md §4.4, §5).
    label_counter: u32,
    loop_stack: Vec<LoopLabels>,
    /// Maps a local binding's KIR name to the `alloc` that backs it, so an
    /// l-value lookup can recover its `Ptr` without re-walking the scope
    /// tree's `Binding`. Reset at function entry along with everything
    /// else in this context (spec.md §5). Names absent here are assumed to
    /// be module-level globals (`Ptr::Global`) — safe because every name
    /// reaching this map was already resolved through `ScopeTree::lookup`.
    locals: FxHashMap<Symbol, ValueId>,
}

impl LoweringCtx {
    pub fn new(scopes: ScopeTree, builder: FunctionBuilder) -> Self {
        Self {
            scopes,
            builder,
            label_counter: 0,
            loop_stack: Vec::new(),
            locals: FxHashMap::default(),
        }
    }

    /// Records that `kir_name` is backed by the local `alloc` at `value`.
    pub fn record_local(&mut self, kir_name: Symbol, value: ValueId) {
        self.locals.insert(kir_name, value);
    }

    /// Resolves a binding's KIR name to the pointer a `load`/`store` should
    /// target: a local `alloc` if one was recorded in this function, a
    /// global label otherwise.
    pub fn name_to_value(&self, kir_name: Symbol) -> Option<Ptr> {
        match self.locals.get(&kir_name) {
            Some(id) => Some(Ptr::Local(*id)),
            None => Some(Ptr::Global(kir_name)),
        }
    }

    pub fn alloc_label(&mut self) -> u32 {
        let id = self.label_counter;
        self.label_counter += 1;
        id
    }

    pub fn push_loop(&mut self, labels: LoopLabels) {
        self.loop_stack.push(labels);
    }

    pub fn pop_loop(&mut self) {
        self.loop_stack.pop();
    }

    pub fn innermost_loop(&self) -> Option<LoopLabels> {
        self.loop_stack.last().copied()
    }

    pub fn loop_stack_is_empty(&self) -> bool {
        self.loop_stack.is_empty()
    }

    pub fn is_terminated(&self) -> bool {
        self.builder.is_terminated()
    }

    /// Jumps to `target` unless the current block already has a
    /// terminator — the dead-code-at-emission-time rule of spec.md §4.4.
    pub fn jump_unless_terminated(&mut self, target: BlockId) {
        if !self.is_terminated() {
            self.builder.emit_terminator(ValueKind::Jump { target });
        }
    }

    /// Synthesises the function's defaulted return if control fell off
    /// the end without one (spec.md §4.4: `ret 0` for `int`, `ret` for
    /// `void`).
    pub fn finish_function(&mut self, ret_ty: Ty) -> LowerResult<()> {
        if !self.is_terminated() {
            let value = match ret_ty {
                Ty::I32 => Some(Operand::Const(0)),
                Ty::Unit => None,
            };
            self.builder.emit_terminator(ValueKind::Return { value });
        }
        if !self.loop_stack_is_empty() {
            return Err(LowerError::InternalInvariant(
                "loop stack non-empty at function exit".to_string(),
            ));
        }
        Ok(())
    }

    /// Reclaims the scope tree (to resume the enclosing program-level walk)
    /// and the builder (to extract the finished `Function`).
    pub fn finish(self) -> (ScopeTree, FunctionBuilder) {
        (self.scopes, self.builder)
    }
}
