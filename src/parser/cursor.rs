//! Forward-only cursor over a token vector.
//!
//! The cursor owns the tokens for the duration of a parse. Lookahead is
//! unbounded but the position only ever moves forward, and it never moves
//! past the trailing [`TokenKind::EndOfFile`] token.

use super::ast::SourceLocation;
use super::lexer::{Token, TokenKind};

pub struct Cursor<'a> {
    tokens: Vec<Token<'a>>,
    position: usize,
}

impl<'a> Cursor<'a> {
    /// Wrap a token vector, appending an end-of-file token if the vector
    /// does not already end with one.
    pub fn new(mut tokens: Vec<Token<'a>>) -> Self {
        let needs_eof = tokens.last().map_or(true, |t| t.kind != TokenKind::EndOfFile);
        if needs_eof {
            let eof = match tokens.last() {
                Some(last) => Token {
                    kind: TokenKind::EndOfFile,
                    file: last.file,
                    text: "",
                    location: SourceLocation {
                        pos: last.location.end(),
                        len: 0,
                        line: last.location.line,
                        column: last.location.column + last.location.len,
                    },
                },
                None => Token {
                    kind: TokenKind::EndOfFile,
                    file: "",
                    text: "",
                    location: SourceLocation::new(0, 0, 1, 1),
                },
            };
            tokens.push(eof);
        }
        Self {
            tokens,
            position: 0,
        }
    }

    /// The token under the cursor
    pub fn current(&self) -> &Token<'a> {
        self.peek(0)
    }

    pub fn kind(&self) -> TokenKind {
        self.current().kind
    }

    /// Look `n` tokens past the current one; clamps to end of file.
    pub fn peek(&self, n: usize) -> &Token<'a> {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.position + n).min(last)]
    }

    /// The most recently consumed token, or the current one at the start.
    pub fn previous(&self) -> &Token<'a> {
        &self.tokens[self.position.saturating_sub(1)]
    }

    /// Consume and return the current token.
    pub fn advance(&mut self) -> Token<'a> {
        let token = *self.current();
        if token.kind != TokenKind::EndOfFile {
            self.position += 1;
        }
        token
    }

    pub fn check(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    /// Consume the current token if it is of `kind`.
    pub fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.check(TokenKind::EndOfFile)
    }

    pub fn position(&self) -> usize {
        self.position
    }
}
