//! Scoped symbol table (spec.md §4.1): a stack of scope frames ("ribs"),
//! each a name -> binding map plus a child counter and a path-derived
//! suffix used to mint globally-unique KIR names for shadowed locals.

use crate::binding::Binding;
use crate::error::{SemaError, SemaResult};
use kirc_util::{Idx, IndexVec, Span, Symbol};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RibId(u32);

impl Idx for RibId {
    fn from_usize(idx: usize) -> Self {
        RibId(idx as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy)]
pub enum RibKind {
    CompUnit,
    Function,
    Block,
    Loop,
}

#[derive(Debug)]
struct Rib {
    bindings: FxHashMap<Symbol, Binding>,
    parent: Option<RibId>,
    kind: RibKind,
    path_suffix: String,
    next_child: u32,
}

/// The symbol-table stack for a single function lowering (spec.md §5:
/// pushed/popped around the compilation unit, each function body, and each
/// block; the stack must be empty at function exit).
pub struct ScopeTree {
    ribs: IndexVec<RibId, Rib>,
    current: RibId,
}

impl ScopeTree {
    pub fn new() -> Self {
        let mut ribs = IndexVec::new();
        let root = ribs.push(Rib {
            bindings: FxHashMap::default(),
            parent: None,
            kind: RibKind::CompUnit,
            path_suffix: String::new(),
            next_child: 0,
        });
        Self { ribs, current: root }
    }

    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut rib = self.current;
        while let Some(parent) = self.ribs[rib].parent {
            depth += 1;
            rib = parent;
        }
        depth
    }

    pub fn push_scope(&mut self, kind: RibKind) -> RibId {
        let child_id = {
            let parent = &mut self.ribs[self.current];
            let id = parent.next_child;
            parent.next_child += 1;
            id
        };
        let path_suffix = format!("{}_{}", self.ribs[self.current].path_suffix, child_id);
        let new_rib = self.ribs.push(Rib {
            bindings: FxHashMap::default(),
            parent: Some(self.current),
            kind,
            path_suffix,
            next_child: 0,
        });
        self.current = new_rib;
        new_rib
    }

    pub fn pop_scope(&mut self) -> SemaResult<()> {
        match self.ribs[self.current].parent {
            Some(parent) => {
                self.current = parent;
                Ok(())
            }
            None => Err(SemaError::UnbalancedScopePop),
        }
    }

    pub fn in_loop(&self) -> bool {
        let mut rib = self.current;
        loop {
            if matches!(self.ribs[rib].kind, RibKind::Loop) {
                return true;
            }
            match self.ribs[rib].parent {
                Some(parent) => rib = parent,
                None => return false,
            }
        }
    }

    pub fn insert_const(&mut self, name: Symbol, value: i32, span: Span) -> SemaResult<()> {
        self.insert(name, Binding::Const(value), span)
    }

    pub fn insert_function(
        &mut self,
        name: Symbol,
        ret_ty: kirc_front::Type,
        arity: usize,
        span: Span,
    ) -> SemaResult<()> {
        self.insert(name, Binding::Function { ret_ty, arity }, span)
    }

    /// Binds `name` to a fresh local slot whose KIR name is
    /// `kir_base_name` suffixed with this scope's path, guaranteeing
    /// uniqueness across shadowed scopes within the same function.
    pub fn insert_local_var(
        &mut self,
        name: Symbol,
        kir_base_name: &str,
        span: Span,
    ) -> SemaResult<Symbol> {
        let suffix = &self.ribs[self.current].path_suffix;
        let kir_name = Symbol::intern(&format!("{kir_base_name}{suffix}"));
        self.insert(name, Binding::LocalVar { kir_name }, span)?;
        Ok(kir_name)
    }

    pub fn insert_global_var(
        &mut self,
        name: Symbol,
        kir_name: Symbol,
        span: Span,
    ) -> SemaResult<()> {
        self.insert(name, Binding::GlobalVar { kir_name }, span)
    }

    fn insert(&mut self, name: Symbol, binding: Binding, span: Span) -> SemaResult<()> {
        let rib = &mut self.ribs[self.current];
        if rib.bindings.contains_key(&name) {
            return Err(SemaError::Redefinition {
                name: name.as_str().to_string(),
                span,
            });
        }
        rib.bindings.insert(name, binding);
        Ok(())
    }

    /// Walks from the innermost scope outward, returning the first hit.
    pub fn lookup(&self, name: Symbol) -> Option<&Binding> {
        let mut rib_id = self.current;
        loop {
            let rib = &self.ribs[rib_id];
            if let Some(binding) = rib.bindings.get(&name) {
                return Some(binding);
            }
            match rib.parent {
                Some(parent) => rib_id = parent,
                None => return None,
            }
        }
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kirc_front::Type;

    #[test]
    fn lookup_finds_innermost_binding() {
        let mut scopes = ScopeTree::new();
        let x = Symbol::intern("x");
        scopes.insert_const(x, 1, Span::DUMMY).unwrap();
        scopes.push_scope(RibKind::Block);
        scopes.insert_const(x, 2, Span::DUMMY).unwrap();
        match scopes.lookup(x) {
            Some(Binding::Const(2)) => {}
            other => panic!("expected innermost binding, got {other:?}"),
        }
        scopes.pop_scope().unwrap();
        match scopes.lookup(x) {
            Some(Binding::Const(1)) => {}
            other => panic!("expected outer binding after pop, got {other:?}"),
        }
    }

    #[test]
    fn redefinition_in_same_scope_is_rejected() {
        let mut scopes = ScopeTree::new();
        let x = Symbol::intern("x");
        scopes.insert_const(x, 1, Span::DUMMY).unwrap();
        assert!(matches!(
            scopes.insert_const(x, 2, Span::DUMMY),
            Err(SemaError::Redefinition { .. })
        ));
    }

    #[test]
    fn shadowed_locals_get_distinct_kir_names() {
        let mut scopes = ScopeTree::new();
        let x = Symbol::intern("x");
        scopes.push_scope(RibKind::Function);
        let outer = scopes.insert_local_var(x, "x", Span::DUMMY).unwrap();
        scopes.push_scope(RibKind::Block);
        let inner = scopes.insert_local_var(x, "x", Span::DUMMY).unwrap();
        assert_ne!(outer, inner);
        scopes.pop_scope().unwrap();
        scopes.pop_scope().unwrap();
    }

    #[test]
    fn pop_past_root_is_an_internal_error() {
        let mut scopes = ScopeTree::new();
        assert!(matches!(
            scopes.pop_scope(),
            Err(SemaError::UnbalancedScopePop)
        ));
    }

    #[test]
    fn loop_detection_sees_through_nested_blocks() {
        let mut scopes = ScopeTree::new();
        assert!(!scopes.in_loop());
        scopes.push_scope(RibKind::Loop);
        scopes.push_scope(RibKind::Block);
        assert!(scopes.in_loop());
        let _ = Type::Int;
    }
}
