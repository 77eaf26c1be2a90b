//! Expression parsing implementation
//!
//! One method per precedence level, root to leaves:
//!
//! | level          | operators                                   |
//! |----------------|---------------------------------------------|
//! | assignment     | `= += -= *= /= %= <<= >>= &= \|= ^=` (right) |
//! | conditional    | `? :` (right)                               |
//! | boolean or     | `\|\|`                                      |
//! | boolean and    | `&&`                                        |
//! | bitwise or     | `\|`                                        |
//! | bitwise xor    | `^`                                         |
//! | bitwise and    | `&`                                         |
//! | equality       | `== !=`                                     |
//! | relational     | `< <= > >=`                                 |
//! | shift          | `<< >>`                                     |
//! | additive       | `+ -`                                       |
//! | multiplicative | `* / %`                                     |
//! | prefix         | `++ -- & * - ! ~`                           |
//! | postfix        | `[index]`, `(args)`, `.member`              |
//! | primary        | literals, names, `( expression )`           |
//!
//! Binary levels collect a left-associative [`Chain`]. A level that matched
//! no operator hands back its operand unchanged, so `x` parses to a bare
//! `Symbol` rather than thirteen nested wrappers.
//!
//! All parsing methods are implemented as methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::{unescape, unescape_str, Token, TokenKind};
use crate::parser::parse::{ParseError, Parser};
use tracing::trace;

type Level<'a> = fn(&mut Parser<'a>) -> Result<Expression, ParseError>;

impl<'a> Parser<'a> {
    /// Parse expression (top-level entry point)
    pub fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.nested(Self::parse_assignment)
    }

    /// Parse assignment or conditional (right-associative)
    fn parse_assignment(&mut self) -> Result<Expression, ParseError> {
        let lhs = self.parse_conditional()?;

        let Some(op) = assign_op(self.cursor.kind()) else {
            return Ok(lhs);
        };

        if !lhs.is_lvalue() {
            return Err(ParseError::new(
                format!(
                    "invalid left-hand side of assignment: expected a variable, index or member expression before '{}'",
                    op.symbol()
                ),
                lhs.location(),
            ));
        }

        let location = self.cursor.advance().location;
        let rhs = self.parse_expression()?;
        trace!(op = op.symbol(), "assignment");

        Ok(Expression::Assignment(Box::new(Assignment {
            lhs,
            op,
            rhs,
            location,
        })))
    }

    /// Parse conditional: condition ? true_case : false_case
    fn parse_conditional(&mut self) -> Result<Expression, ParseError> {
        let condition = self.parse_boolean_or()?;

        if !self.cursor.eat(TokenKind::Question) {
            return Ok(condition);
        }

        let true_case = self.parse_expression()?;
        self.expect_token(TokenKind::Colon, "':' in conditional expression")?;
        let false_case = self.nested(Self::parse_conditional)?;

        Ok(Expression::Conditional(Box::new(Conditional {
            condition,
            true_case,
            false_case,
        })))
    }

    /// Shared loop of every binary level: `operand (op operand)*`
    fn parse_chain(
        &mut self,
        operand: Level<'a>,
        operator: fn(TokenKind) -> Option<BinOp>,
        wrap: fn(Chain) -> Expression,
    ) -> Result<Expression, ParseError> {
        let lhs = operand(self)?;

        let mut rhs = Vec::new();
        while let Some(op) = operator(self.cursor.kind()) {
            self.cursor.advance();
            rhs.push((op, operand(self)?));
        }

        if rhs.is_empty() {
            return Ok(lhs);
        }

        Ok(wrap(Chain {
            lhs: Box::new(lhs),
            rhs,
        }))
    }

    /// Parse boolean OR (||)
    fn parse_boolean_or(&mut self) -> Result<Expression, ParseError> {
        self.parse_chain(
            Self::parse_boolean_and,
            |kind| (kind == TokenKind::OrOr).then_some(BinOp::Or),
            Expression::BooleanOr,
        )
    }

    /// Parse boolean AND (&&)
    fn parse_boolean_and(&mut self) -> Result<Expression, ParseError> {
        self.parse_chain(
            Self::parse_bitwise_or,
            |kind| (kind == TokenKind::AndAnd).then_some(BinOp::And),
            Expression::BooleanAnd,
        )
    }

    /// Parse bitwise OR (|)
    fn parse_bitwise_or(&mut self) -> Result<Expression, ParseError> {
        self.parse_chain(
            Self::parse_bitwise_xor,
            |kind| (kind == TokenKind::Pipe).then_some(BinOp::BitOr),
            Expression::BitwiseOr,
        )
    }

    /// Parse bitwise XOR (^)
    fn parse_bitwise_xor(&mut self) -> Result<Expression, ParseError> {
        self.parse_chain(
            Self::parse_bitwise_and,
            |kind| (kind == TokenKind::Caret).then_some(BinOp::BitXor),
            Expression::BitwiseXor,
        )
    }

    /// Parse bitwise AND (&)
    fn parse_bitwise_and(&mut self) -> Result<Expression, ParseError> {
        self.parse_chain(
            Self::parse_equality,
            |kind| (kind == TokenKind::Amp).then_some(BinOp::BitAnd),
            Expression::BitwiseAnd,
        )
    }

    /// Parse equality (== !=)
    fn parse_equality(&mut self) -> Result<Expression, ParseError> {
        self.parse_chain(
            Self::parse_relational,
            |kind| match kind {
                TokenKind::EqEq => Some(BinOp::Eq),
                TokenKind::NotEq => Some(BinOp::Ne),
                _ => None,
            },
            Expression::Equality,
        )
    }

    /// Parse relational (< <= > >=)
    fn parse_relational(&mut self) -> Result<Expression, ParseError> {
        self.parse_chain(
            Self::parse_shift,
            |kind| match kind {
                TokenKind::Lt => Some(BinOp::Lt),
                TokenKind::Le => Some(BinOp::Le),
                TokenKind::Gt => Some(BinOp::Gt),
                TokenKind::Ge => Some(BinOp::Ge),
                _ => None,
            },
            Expression::Relational,
        )
    }

    /// Parse shift (<< >>)
    fn parse_shift(&mut self) -> Result<Expression, ParseError> {
        self.parse_chain(
            Self::parse_additive,
            |kind| match kind {
                TokenKind::LtLt => Some(BinOp::Shl),
                TokenKind::GtGt => Some(BinOp::Shr),
                _ => None,
            },
            Expression::Shift,
        )
    }

    /// Parse additive (+ -)
    fn parse_additive(&mut self) -> Result<Expression, ParseError> {
        self.parse_chain(
            Self::parse_multiplicative,
            |kind| match kind {
                TokenKind::Plus => Some(BinOp::Add),
                TokenKind::Minus => Some(BinOp::Sub),
                _ => None,
            },
            Expression::Additive,
        )
    }

    /// Parse multiplicative (* / %)
    fn parse_multiplicative(&mut self) -> Result<Expression, ParseError> {
        self.parse_chain(
            Self::parse_prefix,
            |kind| match kind {
                TokenKind::Star => Some(BinOp::Mul),
                TokenKind::Slash => Some(BinOp::Div),
                TokenKind::Percent => Some(BinOp::Mod),
                _ => None,
            },
            Expression::Multiplicative,
        )
    }

    /// Parse prefix operators; they nest, so `--*p` is two prefixes
    fn parse_prefix(&mut self) -> Result<Expression, ParseError> {
        let op = match self.cursor.kind() {
            TokenKind::PlusPlus => PrefixOp::Increment,
            TokenKind::MinusMinus => PrefixOp::Decrement,
            TokenKind::Amp => PrefixOp::Reference,
            TokenKind::Star => PrefixOp::Dereference,
            TokenKind::Minus => PrefixOp::Negate,
            TokenKind::Bang => PrefixOp::BooleanNot,
            TokenKind::Tilde => PrefixOp::BitwiseNot,
            _ => return self.parse_postfix(),
        };

        let location = self.cursor.advance().location;
        let operand = self.nested(Self::parse_prefix)?;
        Ok(Expression::Prefix(Box::new(Prefix {
            op,
            operand,
            location,
        })))
    }

    /// Parse postfix: indexing, calls and member access, left to right
    fn parse_postfix(&mut self) -> Result<Expression, ParseError> {
        let mut expression = self.parse_primary()?;

        loop {
            let start = self.current_location();
            let op = if self.cursor.eat(TokenKind::LBracket) {
                let index = self.parse_expression()?;
                self.expect_token(TokenKind::RBracket, "']' after index expression")?;
                PostfixOp::Index(index)
            } else if self.cursor.eat(TokenKind::LParen) {
                PostfixOp::Call(self.parse_arguments()?)
            } else if self.cursor.eat(TokenKind::Dot) {
                PostfixOp::Member(self.expect_identifier("member name after '.'")?)
            } else {
                break;
            };

            expression = Expression::Postfix(Box::new(Postfix {
                expression,
                op,
                location: start.to(self.previous_location()),
            }));
        }

        Ok(expression)
    }

    /// Comma-separated call arguments; the opening '(' is already consumed
    fn parse_arguments(&mut self) -> Result<Vec<Expression>, ParseError> {
        let mut args = Vec::new();

        if !self.cursor.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.cursor.eat(TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect_token(TokenKind::RParen, "')' after function arguments")?;
        Ok(args)
    }

    /// Parse primary expression (literals, names, parenthesised expressions)
    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        let token = *self.cursor.current();

        match token.kind {
            TokenKind::Identifier => {
                self.cursor.advance();
                Ok(Expression::Symbol(Identifier::new(token.text, token.location)))
            }
            TokenKind::LParen => {
                self.cursor.advance();
                let expression = self.parse_expression()?;
                let close = self.expect_token(TokenKind::RParen, "')' to close parenthesised expression")?;
                Ok(Expression::Primary(Box::new(Primary {
                    expression,
                    location: token.location.to(close.location),
                })))
            }
            kind if kind.is_literal() || matches!(kind, TokenKind::True | TokenKind::False) => {
                self.cursor.advance();
                Ok(Expression::Constant(Constant {
                    value: literal_value(&token)?,
                    location: token.location,
                }))
            }
            _ => Err(self.error_expected("expression")),
        }
    }
}

/// Map a token to the assignment operator it spells, if any
fn assign_op(kind: TokenKind) -> Option<AssignOp> {
    let op = match kind {
        TokenKind::Eq => AssignOp::Assign,
        TokenKind::PlusEq => AssignOp::AddAssign,
        TokenKind::MinusEq => AssignOp::SubAssign,
        TokenKind::StarEq => AssignOp::MulAssign,
        TokenKind::SlashEq => AssignOp::DivAssign,
        TokenKind::PercentEq => AssignOp::ModAssign,
        TokenKind::LtLtEq => AssignOp::ShlAssign,
        TokenKind::GtGtEq => AssignOp::ShrAssign,
        TokenKind::AmpEq => AssignOp::BitAndAssign,
        TokenKind::PipeEq => AssignOp::BitOrAssign,
        TokenKind::CaretEq => AssignOp::BitXorAssign,
        _ => return None,
    };
    Some(op)
}

/// Decode the value of a literal token
fn literal_value(token: &Token<'_>) -> Result<ConstantValue, ParseError> {
    let too_large = || ParseError::new(format!("integer literal '{}' is too large", token.text), token.location);
    let malformed = || ParseError::new(format!("malformed {}", token), token.location);

    let radix_value = |radix: u32| {
        let digits: String = token.text[2..].chars().filter(|c| *c != '_').collect();
        u64::from_str_radix(&digits, radix).map_err(|_| too_large())
    };

    let value = match token.kind {
        TokenKind::Integer => ConstantValue::Integer(token.text.parse().map_err(|_| too_large())?),
        TokenKind::HexInteger => ConstantValue::UnsignedInteger(radix_value(16)?),
        TokenKind::BinaryInteger => ConstantValue::UnsignedInteger(radix_value(2)?),
        TokenKind::OctalInteger => ConstantValue::UnsignedInteger(radix_value(8)?),
        TokenKind::Float => ConstantValue::Float(token.text.parse().map_err(|_| malformed())?),
        TokenKind::Char => {
            let body = &token.text[1..token.text.len() - 1];
            let mut chars = body.chars();
            let value = match chars.next() {
                Some('\\') => chars.next().and_then(unescape),
                other => other,
            };
            ConstantValue::Char(value.ok_or_else(malformed)?)
        }
        TokenKind::String => {
            let body = &token.text[1..token.text.len() - 1];
            ConstantValue::String(unescape_str(body).ok_or_else(malformed)?)
        }
        TokenKind::True => ConstantValue::Bool(true),
        TokenKind::False => ConstantValue::Bool(false),
        _ => return Err(malformed()),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(source: &str) -> Expression {
        let mut parser = Parser::new("test.fn", source).unwrap();
        let expression = parser.parse_expression().unwrap();
        assert!(parser.cursor.is_at_end(), "trailing input in {source:?}");
        expression
    }

    fn expr_err(source: &str) -> ParseError {
        Parser::new("test.fn", source).unwrap().parse_expression().unwrap_err()
    }

    fn symbol_name(expression: &Expression) -> &str {
        match expression {
            Expression::Symbol(id) => &id.name,
            other => panic!("Expected symbol, got {other:?}"),
        }
    }

    #[test]
    fn test_single_operand_passes_through() {
        assert!(matches!(expr("x"), Expression::Symbol(_)));
        assert!(matches!(
            expr("42"),
            Expression::Constant(Constant {
                value: ConstantValue::Integer(42),
                ..
            })
        ));
    }

    #[test]
    fn test_left_associative_chain() {
        let Expression::Additive(chain) = expr("a - b - c") else {
            panic!("Expected additive chain");
        };
        assert_eq!(symbol_name(&chain.lhs), "a");
        assert_eq!(chain.rhs.len(), 2);
        assert_eq!(chain.rhs[0].0, BinOp::Sub);
        assert_eq!(symbol_name(&chain.rhs[0].1), "b");
        assert_eq!(chain.rhs[1].0, BinOp::Sub);
        assert_eq!(symbol_name(&chain.rhs[1].1), "c");
    }

    #[test]
    fn test_precedence() {
        let Expression::Additive(chain) = expr("1 + 2 * 3") else {
            panic!("Expected additive chain");
        };
        assert!(matches!(*chain.lhs, Expression::Constant(_)));
        assert_eq!(chain.rhs.len(), 1);
        assert_eq!(chain.rhs[0].0, BinOp::Add);
        let Expression::Multiplicative(inner) = &chain.rhs[0].1 else {
            panic!("Expected multiplicative chain");
        };
        assert_eq!(inner.rhs.len(), 1);
        assert_eq!(inner.rhs[0].0, BinOp::Mul);
    }

    #[test]
    fn test_level_ordering() {
        // || binds loosest, then && ... down to relational over shift
        let Expression::BooleanOr(or) = expr("a && b || c") else {
            panic!("Expected boolean or");
        };
        assert!(matches!(*or.lhs, Expression::BooleanAnd(_)));

        let Expression::BitwiseOr(bor) = expr("a | b ^ c & d") else {
            panic!("Expected bitwise or");
        };
        let Expression::BitwiseXor(xor) = &bor.rhs[0].1 else {
            panic!("Expected bitwise xor");
        };
        assert!(matches!(xor.rhs[0].1, Expression::BitwiseAnd(_)));

        let Expression::Equality(eq) = expr("a < b == c << 1") else {
            panic!("Expected equality");
        };
        assert!(matches!(*eq.lhs, Expression::Relational(_)));
        assert!(matches!(eq.rhs[0].1, Expression::Shift(_)));
    }

    #[test]
    fn test_conditional() {
        let Expression::Conditional(c) = expr("a ? b : c ? d : e") else {
            panic!("Expected conditional");
        };
        assert_eq!(symbol_name(&c.condition), "a");
        assert_eq!(symbol_name(&c.true_case), "b");
        assert!(matches!(c.false_case, Expression::Conditional(_)));
    }

    #[test]
    fn test_conditional_requires_both_branches() {
        let err = expr_err("a ? b");
        assert_eq!(err.message, "expected ':' in conditional expression but got end of file");
    }

    #[test]
    fn test_assignment_targets() {
        for source in ["x = 4", "arr[0] = 4", "obj.field = 4", "(x) = 4", "x <<= 1"] {
            assert!(matches!(expr(source), Expression::Assignment(_)), "{source}");
        }
    }

    #[test]
    fn test_assignment_is_right_associative() {
        let Expression::Assignment(outer) = expr("a = b += 1") else {
            panic!("Expected assignment");
        };
        assert_eq!(outer.op, AssignOp::Assign);
        let Expression::Assignment(inner) = &outer.rhs else {
            panic!("Expected nested assignment");
        };
        assert_eq!(inner.op, AssignOp::AddAssign);
    }

    #[test]
    fn test_invalid_assignment_target() {
        for source in ["3 = 4", "a + b = 4", "f() = 1", "-x = 2"] {
            let err = expr_err(source);
            assert!(
                err.message.starts_with("invalid left-hand side of assignment"),
                "{source}: {}",
                err.message
            );
            assert_eq!(err.location.column, 1);
        }
    }

    #[test]
    fn test_prefix_nesting() {
        let Expression::Prefix(outer) = expr("--*p") else {
            panic!("Expected prefix");
        };
        assert_eq!(outer.op, PrefixOp::Decrement);
        let Expression::Prefix(inner) = &outer.operand else {
            panic!("Expected nested prefix");
        };
        assert_eq!(inner.op, PrefixOp::Dereference);
    }

    #[test]
    fn test_postfix_chain() {
        let Expression::Postfix(call) = expr("a.b[1](x, y)") else {
            panic!("Expected postfix");
        };
        let PostfixOp::Call(args) = &call.op else {
            panic!("Expected call");
        };
        assert_eq!(args.len(), 2);
        let Expression::Postfix(index) = &call.expression else {
            panic!("Expected index");
        };
        assert!(matches!(index.op, PostfixOp::Index(_)));
        let Expression::Postfix(member) = &index.expression else {
            panic!("Expected member access");
        };
        assert!(matches!(&member.op, PostfixOp::Member(m) if m.name == "b"));
        assert_eq!(call.location.column, 7);
    }

    #[test]
    fn test_literals() {
        let value = |source: &str| match expr(source) {
            Expression::Constant(c) => c.value,
            other => panic!("Expected constant, got {other:?}"),
        };
        assert_eq!(value("0x1F"), ConstantValue::UnsignedInteger(31));
        assert_eq!(value("0b1010"), ConstantValue::UnsignedInteger(10));
        assert_eq!(value("0o17"), ConstantValue::UnsignedInteger(15));
        assert_eq!(value("2.5"), ConstantValue::Float(2.5));
        assert_eq!(value(r"'\n'"), ConstantValue::Char('\n'));
        assert_eq!(value(r#""a\tb""#), ConstantValue::String("a\tb".to_string()));
        assert_eq!(value("true"), ConstantValue::Bool(true));
    }

    #[test]
    fn test_integer_overflow() {
        let err = expr_err("18446744073709551616");
        assert_eq!(err.message, "integer literal '18446744073709551616' is too large");
    }

    #[test]
    fn test_parenthesised_location() {
        let e = expr("(a + b)");
        assert!(matches!(e, Expression::Primary(_)));
        assert_eq!(e.location().len, 7);
    }

    #[test]
    fn test_error_token_reported() {
        let err = expr_err("a + @");
        assert_eq!(err.message, "expected expression but got invalid token '@'");
        assert_eq!(err.location.column, 5);
    }
}
