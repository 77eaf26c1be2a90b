//! Finch source code parser
//!
//! This module transforms Finch source text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`cursor`]: Forward-only token cursor with lookahead
//! - [`parse`]: Parsing (tokens → AST), with the grammar split across
//!   `expressions`, `statements` and `declarations`
//! - [`ast`]: AST node definitions
//! - [`dump`]: Indented text outline of a tree
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent with one method per precedence level.
//! No external parser generator dependencies.

pub mod ast;
pub mod cursor;
mod declarations;
pub mod dump;
mod expressions;
pub mod lexer;
pub mod parse;
mod statements;

pub use parse::{ParseError, Parser};

/// Tokenize and parse a whole compilation unit.
pub fn parse_module(filename: &str, source: &str) -> Result<ast::Module, ParseError> {
    Parser::new(filename, source)?.parse_module()
}
