//! Declaration parsing implementation
//!
//! Handles everything that introduces a name:
//! - Functions: `func name(params) [: type] { ... }` or `=> expression`
//! - Parameters: `[mut] name: type`
//! - Variables: `var [mut] name [: type]` (the initializer belongs to the statement)
//! - Typenames: `*mut *T` style pointer prefixes over a base name
//! - User types: `type Name struct { ... }` and `type Name enum { ... }`
//!
//! Parameters and variables are allocated in the parser's declaration arena
//! and referred to by [`DeclId`] from the tree.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};
use tracing::debug;

impl<'a> Parser<'a> {
    /// Parse a function definition
    pub(crate) fn parse_function(&mut self) -> Result<Function, ParseError> {
        let start = self.expect_token(TokenKind::Func, "'func'")?.location;
        let name = self.expect_identifier("function name after 'func'")?;
        let parameters = self.parse_parameters()?;

        let return_type = if self.cursor.eat(TokenKind::Colon) {
            Some(self.parse_typename()?)
        } else {
            None
        };

        let body = match self.cursor.kind() {
            TokenKind::LBrace => FunctionBody::Block(self.parse_block()?),
            TokenKind::FatArrow => {
                self.cursor.advance();
                let expression = self.parse_expression()?;
                self.cursor.eat(TokenKind::Semicolon);
                FunctionBody::Inline(expression)
            }
            _ => return Err(self.error_expected("function body starting with '{' or '=>'")),
        };

        debug!(function = %name, parameters = parameters.len(), "parsed function");
        Ok(Function {
            name,
            parameters,
            return_type,
            body,
            location: start.to(self.previous_location()),
        })
    }

    /// Parse `( [param (, param)*] )`
    fn parse_parameters(&mut self) -> Result<Vec<DeclId>, ParseError> {
        self.expect_token(TokenKind::LParen, "'(' after function name")?;
        let mut parameters = Vec::new();

        if !self.cursor.check(TokenKind::RParen) {
            loop {
                parameters.push(self.parse_parameter()?);
                if !self.cursor.eat(TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect_token(TokenKind::RParen, "')' after function parameters")?;
        Ok(parameters)
    }

    /// Parse `[mut] name : type`
    pub(crate) fn parse_parameter(&mut self) -> Result<DeclId, ParseError> {
        let is_mutable = self.cursor.eat(TokenKind::Mut);
        let name = self.expect_identifier("parameter name")?;

        if !self.cursor.eat(TokenKind::Colon) {
            return Err(ParseError::new(
                format!("parameters may not be declared without a type: expected ':' after '{}'", name),
                self.current_location(),
            ));
        }

        let typename = self.parse_typename()?;
        Ok(self
            .declarations
            .alloc(DeclarationKind::Parameter, name, Some(typename), is_mutable))
    }

    /// Parse `var [mut] name [: type]`
    pub(crate) fn parse_variable_declaration(&mut self) -> Result<DeclId, ParseError> {
        self.expect_token(TokenKind::Var, "'var'")?;
        let is_mutable = self.cursor.eat(TokenKind::Mut);
        let name = self.expect_identifier("variable name after 'var'")?;

        let typename = if self.cursor.eat(TokenKind::Colon) {
            Some(self.parse_typename()?)
        } else {
            None
        };

        Ok(self
            .declarations
            .alloc(DeclarationKind::Variable, name, typename, is_mutable))
    }

    /// Parse a typename: zero or more `*` / `*mut` prefixes, then a name
    pub fn parse_typename(&mut self) -> Result<Typename, ParseError> {
        let start = self.current_location();
        let mut pointers = Vec::new();

        while self.cursor.eat(TokenKind::Star) {
            pointers.push(self.cursor.eat(TokenKind::Mut));
        }

        let name = self.expect_identifier("type name")?;
        Ok(Typename {
            location: start.to(name.location),
            name,
            pointers,
        })
    }

    /// Parse `type Name (struct | enum) { members }`
    pub(crate) fn parse_type_definition(&mut self) -> Result<TypeDefinition, ParseError> {
        let start = self.expect_token(TokenKind::Type, "'type'")?.location;
        let name = self.expect_identifier("type name after 'type'")?;

        let kind = if self.cursor.eat(TokenKind::Struct) {
            TypeDefinitionKind::Struct
        } else if self.cursor.eat(TokenKind::Enum) {
            TypeDefinitionKind::Enum
        } else {
            return Err(self.error_expected("'struct' or 'enum' after type name"));
        };

        self.expect_token(TokenKind::LBrace, &format!("'{{' to open {} body", kind.keyword()))?;
        let mut members = Vec::new();

        while !self.cursor.check(TokenKind::RBrace) {
            members.push(self.parse_member()?);
            if !self.cursor.eat(TokenKind::Comma) {
                break;
            }
        }

        let close = self.expect_token(TokenKind::RBrace, &format!("'}}' to close {} body", kind.keyword()))?;

        debug!(type_name = %name, members = members.len(), "parsed type definition");
        Ok(TypeDefinition {
            name,
            kind,
            members,
            location: start.to(close.location),
        })
    }

    /// Parse `[public | private] name : type`
    fn parse_member(&mut self) -> Result<Member, ParseError> {
        let visibility = if self.cursor.eat(TokenKind::Public) {
            Visibility::Public
        } else {
            self.cursor.eat(TokenKind::Private);
            Visibility::Private
        };

        let name = self.expect_identifier("member name")?;
        self.expect_token(TokenKind::Colon, &format!("':' and a type after member '{}'", name))?;
        let typename = self.parse_typename()?;

        Ok(Member {
            visibility,
            name,
            typename,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser(source: &str) -> Parser<'_> {
        Parser::new("test.fn", source).unwrap()
    }

    #[test]
    fn test_typename_pointers() {
        let typename = parser("*mut **mut Node").parse_typename().unwrap();
        assert_eq!(typename.name.name, "Node");
        assert_eq!(typename.pointers, vec![true, false, true]);
        assert_eq!(typename.to_string(), "*mut **mut Node");
        assert_eq!(typename.location.len, 15);
    }

    #[test]
    fn test_parameter_requires_type() {
        let err = parser("func f(x) { }").parse_function().unwrap_err();
        assert!(err.message.starts_with("parameters may not be declared without a type"));
        assert_eq!(err.location.column, 9);
    }

    #[test]
    fn test_mutable_parameter() {
        let mut p = parser("func f(mut a: i32, b: *char) { }");
        let function = p.parse_function().unwrap();
        assert_eq!(function.parameters.len(), 2);
        let a = &p.declarations[function.parameters[0]];
        let b = &p.declarations[function.parameters[1]];
        assert!(a.is_mutable);
        assert!(!b.is_mutable);
        assert_eq!(b.typename.as_ref().unwrap().pointers, vec![false]);
    }

    #[test]
    fn test_inline_function() {
        let function = parser("func double(x: i32): i32 => x * 2").parse_function().unwrap();
        assert!(matches!(
            function.body,
            FunctionBody::Inline(Expression::Multiplicative(_))
        ));
    }

    #[test]
    fn test_missing_body() {
        let err = parser("func f() ;").parse_function().unwrap_err();
        assert_eq!(
            err.message,
            "expected function body starting with '{' or '=>' but got ';'"
        );
    }

    #[test]
    fn test_struct_members() {
        let definition = parser("type Point struct { public x: f64, private y: f64, z: f64, }")
            .parse_type_definition()
            .unwrap();
        assert_eq!(definition.kind, TypeDefinitionKind::Struct);
        let visibility: Vec<_> = definition.members.iter().map(|m| m.visibility).collect();
        assert_eq!(
            visibility,
            vec![Visibility::Public, Visibility::Private, Visibility::Private]
        );
    }

    #[test]
    fn test_enum_definition() {
        let definition = parser("type Shape enum { circle: Circle, square: Square }")
            .parse_type_definition()
            .unwrap();
        assert_eq!(definition.kind, TypeDefinitionKind::Enum);
        assert_eq!(definition.members.len(), 2);
    }

    #[test]
    fn test_members_need_separators() {
        let err = parser("type P struct { x: i32 y: i32 }")
            .parse_type_definition()
            .unwrap_err();
        assert_eq!(err.message, "expected '}' to close struct body but got identifier 'y'");
    }
}
