//! kirc-front - lexer, parser, and AST for the source language.
//!
//! Component B of the pipeline (the AST node variants) is the only part of
//! this crate the core specification designs in any detail; the lexer and
//! the grammar-driven parser that produce the AST are external
//! collaborators whose only contract the rest of the workspace relies on is
//! "valid source text in, a `CompUnit` out" (spec.md §6.1).

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::*;
pub use error::ParseError;
pub use parser::Parser;

/// Lex and parse a complete source file.
pub fn parse(source: &str) -> Result<CompUnit, ParseError> {
    let tokens = lexer::lex(source)?;
    Parser::new(tokens).parse_comp_unit()
}
