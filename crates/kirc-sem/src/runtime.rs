//! Runtime-library declarations (spec.md §4.5, component H): on program
//! entry the lowering injects signatures for the standard I/O intrinsics so
//! calls to them type-check. The backend never emits their bodies, only
//! `call` instructions referencing them as external symbols (spec.md §6.3).

use crate::error::SemaResult;
use crate::scope::ScopeTree;
use kirc_front::Type;
use kirc_util::{Span, Symbol};

pub struct RuntimeFn {
    pub name: &'static str,
    pub ret_ty: Type,
    pub arity: usize,
}

/// Signatures match the source language's standard library; array
/// parameters are counted for arity but carry no element type since this
/// implementation has no array type (spec.md §1 Non-goals).
pub const RUNTIME_FUNCTIONS: &[RuntimeFn] = &[
    RuntimeFn { name: "getint", ret_ty: Type::Int, arity: 0 },
    RuntimeFn { name: "getch", ret_ty: Type::Int, arity: 0 },
    RuntimeFn { name: "getarray", ret_ty: Type::Int, arity: 1 },
    RuntimeFn { name: "putint", ret_ty: Type::Void, arity: 1 },
    RuntimeFn { name: "putch", ret_ty: Type::Void, arity: 1 },
    RuntimeFn { name: "putarray", ret_ty: Type::Void, arity: 2 },
    RuntimeFn { name: "starttime", ret_ty: Type::Void, arity: 0 },
    RuntimeFn { name: "stoptime", ret_ty: Type::Void, arity: 0 },
];

pub fn declare_runtime(scopes: &mut ScopeTree) -> SemaResult<()> {
    for rt in RUNTIME_FUNCTIONS {
        scopes.insert_function(
            Symbol::intern(rt.name),
            rt.ret_ty,
            rt.arity,
            Span::DUMMY,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_functions_are_visible_after_declaration() {
        let mut scopes = ScopeTree::new();
        declare_runtime(&mut scopes).unwrap();
        let binding = scopes.lookup(Symbol::intern("putint"));
        assert!(matches!(
            binding,
            Some(crate::binding::Binding::Function {
                ret_ty: Type::Void,
                arity: 1
            })
        ));
    }
}
