//! # Introduction
//!
//! Finch is the front end of a compiler for a small statically typed,
//! C-like language. It turns one source file into a validated tree, or into
//! diagnostics explaining why it could not.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Lexer → Tokens → Parser → Module → Validator → Analysis
//! ```
//!
//! 1. [`parser`]: tokenises the source and builds the [`parser::ast::Module`].
//! 2. [`semantics`]: symbol tables and scope, type-name and mutability checks.
//! 3. [`diagnostic`]: converts stage errors into `file:line:col` diagnostics
//!    and emits them.
//! 4. [`frontend`]: runs the stages in order ([`frontend::check`]).
//! 5. [`config`]: command-line options shared by the stages.
//!
//! ## Language summary
//!
//! Top level: `func` and `type ... struct|enum` definitions.
//! Statements: blocks, `if/else`, `var`, `loop`, `while`, `break`,
//! `continue`, `return`, assignments and expression statements.
//! Expressions: 13 precedence levels from assignment down to primaries,
//! with `?:`, prefix `++ -- & * - ! ~` and postfix index, call and member.

pub mod config;
pub mod diagnostic;
pub mod frontend;
pub mod parser;
pub mod semantics;
