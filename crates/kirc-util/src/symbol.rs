//! String interning.
//!
//! `Symbol` is a small `Copy` handle to an interned string. Unlike the
//! concurrent, leak-forever interner this is modeled on, `kirc` never
//! shares an interner across threads (the whole pipeline is single-pass and
//! single-threaded), so the table is a plain `RefCell`-guarded `IndexSet`.

use indexmap::IndexSet;
use std::cell::RefCell;
use std::fmt;

thread_local! {
    static INTERNER: RefCell<IndexSet<&'static str>> = RefCell::new(IndexSet::new());
}

/// A compact handle to an interned string.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(u32);

impl Symbol {
    pub fn intern(s: &str) -> Self {
        INTERNER.with(|interner| {
            let mut interner = interner.borrow_mut();
            if let Some(idx) = interner.get_index_of(s) {
                return Symbol(idx as u32);
            }
            // Leaked once per distinct string for the life of the process;
            // acceptable because the compiler runs for a single, finite
            // compilation.
            let leaked: &'static str = Box::leak(s.to_string().into_boxed_str());
            let (idx, _) = interner.insert_full(leaked);
            Symbol(idx as u32)
        })
    }

    pub fn as_str(self) -> &'static str {
        INTERNER.with(|interner| {
            interner
                .borrow()
                .get_index(self.0 as usize)
                .copied()
                .expect("Symbol index out of range of its interner")
        })
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_dedupes() {
        let a = Symbol::intern("hello");
        let b = Symbol::intern("hello");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_strings_are_distinct() {
        let a = Symbol::intern("foo");
        let b = Symbol::intern("bar");
        assert_ne!(a, b);
        assert_eq!(a.as_str(), "foo");
        assert_eq!(b.as_str(), "bar");
    }
}
