//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including the error type, helper methods, and the module entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses recursive descent with one method per grammar level:
//! - This module: Parser struct, helper methods, and coordination
//! - `declarations`: functions, parameters, variables, typenames, user types
//! - `statements`: blocks, `if` chains, loops, jumps
//! - `expressions`: the thirteen precedence levels, root to leaves
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared parser state.
//!
//! The first error aborts the parse; there is no resynchronisation.
//! Recursive productions go through [`Parser::nested`], so input nested
//! deeper than [`MAX_NESTING`] is a syntax error rather than a stack overflow.

use crate::parser::ast::*;
use crate::parser::cursor::Cursor;
use crate::parser::lexer::{LexError, Token, TokenKind};
use thiserror::Error;
use tracing::debug;

/// Parser error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

impl ParseError {
    pub fn new(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            message: err.to_string(),
            location: err.location(),
        }
    }
}

/// Maximum depth of nested expressions, blocks and `else if` chains.
pub const MAX_NESTING: usize = 100;

/// Recursive descent parser for Finch
pub struct Parser<'a> {
    pub(crate) cursor: Cursor<'a>,
    pub(crate) declarations: DeclarationArena,
    /// Recursive productions currently open
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Tokenize `source` and set up a parser over the result.
    pub fn new(filename: &'a str, source: &'a str) -> Result<Self, ParseError> {
        let tokens = crate::parser::lexer::tokenize(filename, source)?;
        Ok(Self::from_tokens(tokens))
    }

    pub fn from_tokens(tokens: Vec<Token<'a>>) -> Self {
        Self {
            cursor: Cursor::new(tokens),
            declarations: DeclarationArena::new(),
            depth: 0,
        }
    }

    /// Parse the whole unit: function and type definitions until end of file
    pub fn parse_module(&mut self) -> Result<Module, ParseError> {
        let mut module = Module::new();

        while !self.cursor.is_at_end() {
            match self.cursor.kind() {
                TokenKind::Func => module.functions.push(self.parse_function()?),
                TokenKind::Type => module.types.push(self.parse_type_definition()?),
                _ => return Err(self.error_expected("'func' or 'type' at top level")),
            }
        }

        module.declarations = std::mem::take(&mut self.declarations);
        debug!(
            functions = module.functions.len(),
            types = module.types.len(),
            declarations = module.declarations.len(),
            "parsed module"
        );
        Ok(module)
    }

    // ===== Helper methods =====

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.cursor.current().location
    }

    pub(crate) fn previous_location(&self) -> SourceLocation {
        self.cursor.previous().location
    }

    /// `expected <what> but got <current token>`
    pub(crate) fn error_expected(&self, what: &str) -> ParseError {
        ParseError::new(
            format!("expected {} but got {}", what, self.cursor.current()),
            self.current_location(),
        )
    }

    pub(crate) fn expect_token(&mut self, kind: TokenKind, what: &str) -> Result<Token<'a>, ParseError> {
        if self.cursor.check(kind) {
            Ok(self.cursor.advance())
        } else {
            Err(self.error_expected(what))
        }
    }

    pub(crate) fn expect_semicolon(&mut self, ctx: &str) -> Result<Token<'a>, ParseError> {
        self.expect_token(TokenKind::Semicolon, &format!("';' {ctx}"))
    }

    /// Run a recursive production one nesting level deeper.
    pub(crate) fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::new(
                format!("nesting exceeds the limit of {} levels", MAX_NESTING),
                self.current_location(),
            ));
        }

        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    pub(crate) fn expect_identifier(&mut self, what: &str) -> Result<Identifier, ParseError> {
        let token = self.expect_token(TokenKind::Identifier, what)?;
        Ok(Identifier::new(token.text, token.location))
    }
}
