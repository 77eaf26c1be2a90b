//! Statement parsing implementation
//!
//! # Supported Statements
//!
//! - Blocks: `{ ... }`
//! - Variable declarations: `var [mut] name [: type] = value;`
//! - Conditionals: `if cond { } else if cond { } else { }` (no parentheses)
//! - Loops: `loop { }`, `while cond { }`
//! - Jumps: `break;`, `continue;`, `return [value];`
//! - Assignments and expression statements: `expression;`
//!
//! All parsing methods are implemented as methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};
use tracing::trace;

impl<'a> Parser<'a> {
    /// Parse a braced block of statements
    pub(crate) fn parse_block(&mut self) -> Result<Block, ParseError> {
        let open = self.expect_token(TokenKind::LBrace, "'{' to open block")?;
        let mut statements = Vec::new();

        while !self.cursor.check(TokenKind::RBrace) {
            if self.cursor.is_at_end() {
                return Err(self.error_expected(&format!(
                    "'}}' to close block opened at line {}, column {}",
                    open.location.line, open.location.column
                )));
            }
            statements.push(self.nested(Self::parse_statement)?);
        }

        let close = self.cursor.advance();
        Ok(Block {
            statements,
            location: open.location.to(close.location),
        })
    }

    /// Parse a single statement
    pub fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        trace!(token = %self.cursor.current(), "statement");

        match self.cursor.kind() {
            TokenKind::LBrace => Ok(Statement::Block(self.parse_block()?)),
            TokenKind::If => Ok(Statement::If(self.parse_if()?)),
            TokenKind::Var => self.parse_declaration_statement(),
            TokenKind::Loop => {
                let start = self.cursor.advance().location;
                let body = self.parse_block()?;
                Ok(Statement::Loop {
                    kind: LoopKind::Infinite,
                    location: start.to(body.location),
                    body,
                })
            }
            TokenKind::While => {
                let start = self.cursor.advance().location;
                let condition = self.parse_expression()?;
                let body = self.parse_block()?;
                Ok(Statement::Loop {
                    kind: LoopKind::While(condition),
                    location: start.to(body.location),
                    body,
                })
            }
            TokenKind::Break | TokenKind::Continue | TokenKind::Return => self.parse_jump(),
            _ => self.parse_expression_statement(),
        }
    }

    /// Parse `if cond block [else (if ... | block)]`
    fn parse_if(&mut self) -> Result<If, ParseError> {
        let start = self.expect_token(TokenKind::If, "'if'")?.location;
        let condition = self.parse_expression()?;
        let then_block = self.parse_block()?;

        let else_branch = if self.cursor.eat(TokenKind::Else) {
            if self.cursor.check(TokenKind::If) {
                Some(ElseBranch::If(Box::new(self.nested(Self::parse_if)?)))
            } else if self.cursor.check(TokenKind::LBrace) {
                Some(ElseBranch::Block(self.parse_block()?))
            } else {
                return Err(self.error_expected("'if' or '{' after 'else'"));
            }
        } else {
            None
        };

        Ok(If {
            condition,
            then_block,
            else_branch,
            location: start.to(self.previous_location()),
        })
    }

    /// Parse `var [mut] name [: type] = value;`
    fn parse_declaration_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.current_location();
        let declaration = self.parse_variable_declaration()?;
        self.expect_token(TokenKind::Eq, "'=' and an initial value in variable declaration")?;
        let value = self.parse_expression()?;
        let end = self.expect_semicolon("after variable declaration")?;

        Ok(Statement::Declaration {
            declaration,
            value,
            location: start.to(end.location),
        })
    }

    /// Parse `break;`, `continue;` or `return [value];`
    fn parse_jump(&mut self) -> Result<Statement, ParseError> {
        let keyword = self.cursor.advance();

        let kind = match keyword.kind {
            TokenKind::Break => JumpKind::Break,
            TokenKind::Continue => JumpKind::Continue,
            _ if self.cursor.check(TokenKind::Semicolon) => JumpKind::Return(None),
            _ => JumpKind::Return(Some(self.parse_expression()?)),
        };

        let end = self.expect_semicolon(&format!("after '{}' statement", kind.keyword()))?;
        Ok(Statement::Jump {
            kind,
            location: keyword.location.to(end.location),
        })
    }

    /// Parse `expression;`, classifying assignments by their root node
    fn parse_expression_statement(&mut self) -> Result<Statement, ParseError> {
        let expression = self.parse_expression()?;
        let end = self.expect_semicolon("after expression")?;

        match expression {
            Expression::Assignment(assignment) => Ok(Statement::Assignment(*assignment)),
            expression => Ok(Statement::Expression {
                location: expression.location().to(end.location),
                expression,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement(source: &str) -> Statement {
        let mut parser = Parser::new("test.fn", source).unwrap();
        parser.parse_statement().unwrap()
    }

    fn statement_err(source: &str) -> ParseError {
        Parser::new("test.fn", source).unwrap().parse_statement().unwrap_err()
    }

    #[test]
    fn test_assignment_statement() {
        let Statement::Assignment(assignment) = statement("total += 2;") else {
            panic!("Expected assignment statement");
        };
        assert_eq!(assignment.op, AssignOp::AddAssign);
    }

    #[test]
    fn test_expression_statement() {
        assert!(matches!(statement("print(x);"), Statement::Expression { .. }));
    }

    #[test]
    fn test_variable_declaration() {
        let mut parser = Parser::new("test.fn", "var mut count: u32 = 0;").unwrap();
        let Statement::Declaration { declaration, value, .. } = parser.parse_statement().unwrap() else {
            panic!("Expected declaration");
        };
        let decl = &parser.declarations[declaration];
        assert_eq!(decl.name.name, "count");
        assert!(decl.is_mutable);
        assert_eq!(decl.typename.as_ref().unwrap().name.name, "u32");
        assert_eq!(decl.kind, DeclarationKind::Variable);
        assert!(matches!(value, Expression::Constant(_)));
    }

    #[test]
    fn test_declaration_requires_initializer() {
        let err = statement_err("var x: i32;");
        assert_eq!(
            err.message,
            "expected '=' and an initial value in variable declaration but got ';'"
        );
    }

    #[test]
    fn test_if_else_chain() {
        let Statement::If(first) = statement("if a { } else if b { x = 1; } else { }") else {
            panic!("Expected if statement");
        };
        let Some(ElseBranch::If(second)) = &first.else_branch else {
            panic!("Expected else-if");
        };
        assert_eq!(second.then_block.statements.len(), 1);
        assert!(matches!(second.else_branch, Some(ElseBranch::Block(_))));
    }

    #[test]
    fn test_else_needs_block_or_if() {
        let err = statement_err("if a { } else x = 1;");
        assert_eq!(err.message, "expected 'if' or '{' after 'else' but got identifier 'x'");
    }

    #[test]
    fn test_loops() {
        assert!(matches!(
            statement("loop { break; }"),
            Statement::Loop {
                kind: LoopKind::Infinite,
                ..
            }
        ));
        let Statement::Loop {
            kind: LoopKind::While(condition),
            body,
            ..
        } = statement("while i < 10 { i += 1; continue; }")
        else {
            panic!("Expected while loop");
        };
        assert!(matches!(condition, Expression::Relational(_)));
        assert_eq!(body.statements.len(), 2);
    }

    #[test]
    fn test_return_forms() {
        assert!(matches!(
            statement("return;"),
            Statement::Jump {
                kind: JumpKind::Return(None),
                ..
            }
        ));
        assert!(matches!(
            statement("return a * b;"),
            Statement::Jump {
                kind: JumpKind::Return(Some(Expression::Multiplicative(_))),
                ..
            }
        ));
    }

    #[test]
    fn test_unclosed_block() {
        let err = statement_err("{ var x = 1;");
        assert_eq!(
            err.message,
            "expected '}' to close block opened at line 1, column 1 but got end of file"
        );
        assert_eq!(err.location.column, 13);
    }

    #[test]
    fn test_missing_semicolon() {
        let err = statement_err("x = 1 }");
        assert_eq!(err.message, "expected ';' after expression but got '}'");
    }
}
