//! Indented outline of a parsed module, one node per line.
//!
//! Children sit two spaces deeper than their parent. Binary operators are
//! printed on their own line at the parent's depth, between the operand
//! dumps, so `a + b` reads
//!
//! ```text
//!   a
//! +
//!   b
//! ```
//!
//! A chain without right-hand operands prints exactly like its operand.

use crate::parser::ast::*;
use std::fmt::Write;

/// Render the whole module: type definitions first, then functions.
pub fn dump_module(module: &Module) -> String {
    let mut dumper = TreeDumper::new(module);
    for definition in &module.types {
        dumper.type_definition(definition, 0);
    }
    for function in &module.functions {
        dumper.function(function, 0);
    }
    dumper.out
}

/// Render one expression starting at depth zero.
pub fn dump_expression(expression: &Expression) -> String {
    let module = Module::new();
    let mut dumper = TreeDumper::new(&module);
    dumper.expression(expression, 0);
    dumper.out
}

struct TreeDumper<'m> {
    module: &'m Module,
    out: String,
}

impl<'m> TreeDumper<'m> {
    fn new(module: &'m Module) -> Self {
        Self {
            module,
            out: String::new(),
        }
    }

    fn line(&mut self, depth: usize, text: impl std::fmt::Display) {
        // Writing into a String cannot fail
        let _ = writeln!(self.out, "{:width$}{}", "", text, width = depth * 2);
    }

    fn type_definition(&mut self, definition: &TypeDefinition, depth: usize) {
        self.line(depth, format_args!("type {} {}", definition.name, definition.kind.keyword()));
        for member in &definition.members {
            let visibility = match member.visibility {
                Visibility::Public => "public",
                Visibility::Private => "private",
            };
            self.line(
                depth + 1,
                format_args!("{} {}: {}", visibility, member.name, member.typename),
            );
        }
    }

    fn function(&mut self, function: &Function, depth: usize) {
        self.line(depth, format_args!("func {}", function.name));
        self.line(depth + 1, "(");
        for &parameter in &function.parameters {
            self.declaration(parameter, depth + 2);
        }
        self.line(depth + 1, ")");
        if let Some(return_type) = &function.return_type {
            self.line(depth + 1, format_args!(": {}", return_type));
        }
        match &function.body {
            FunctionBody::Block(block) => self.block(block, depth + 1),
            FunctionBody::Inline(expression) => {
                self.line(depth + 1, "=>");
                self.expression(expression, depth + 2);
            }
        }
    }

    /// Header line of a parameter or variable: `[var] [mut] name[: type]`
    fn declaration(&mut self, id: DeclId, depth: usize) {
        let Some(declaration) = self.module.declarations.get(id) else {
            self.line(depth, format_args!("<declaration {}>", id.index()));
            return;
        };
        let mut text = String::new();
        if declaration.kind == DeclarationKind::Variable {
            text.push_str("var ");
        }
        if declaration.is_mutable {
            text.push_str("mut ");
        }
        text.push_str(&declaration.name.name);
        if let Some(typename) = &declaration.typename {
            let _ = write!(text, ": {}", typename);
        }
        self.line(depth, text);
    }

    fn block(&mut self, block: &Block, depth: usize) {
        self.line(depth, "{");
        for statement in &block.statements {
            self.statement(statement, depth + 1);
        }
        self.line(depth, "}");
    }

    fn statement(&mut self, statement: &Statement, depth: usize) {
        match statement {
            Statement::Block(block) => self.block(block, depth),
            Statement::If(iff) => self.if_statement(iff, depth),
            Statement::Declaration {
                declaration, value, ..
            } => {
                self.declaration(*declaration, depth);
                self.line(depth + 1, "=");
                self.expression(value, depth + 2);
            }
            Statement::Assignment(assignment) => self.assignment(assignment, depth),
            Statement::Expression { expression, .. } => self.expression(expression, depth),
            Statement::Loop { kind, body, .. } => {
                match kind {
                    LoopKind::Infinite => self.line(depth, "loop"),
                    LoopKind::While(condition) => {
                        self.line(depth, "while");
                        self.expression(condition, depth + 1);
                    }
                }
                self.block(body, depth + 1);
            }
            Statement::Jump { kind, .. } => {
                self.line(depth, kind.keyword());
                if let JumpKind::Return(Some(value)) = kind {
                    self.expression(value, depth + 1);
                }
            }
        }
    }

    fn if_statement(&mut self, iff: &If, depth: usize) {
        self.line(depth, "if");
        self.expression(&iff.condition, depth + 1);
        self.block(&iff.then_block, depth + 1);
        match &iff.else_branch {
            Some(ElseBranch::Block(block)) => {
                self.line(depth, "else");
                self.block(block, depth + 1);
            }
            Some(ElseBranch::If(nested)) => {
                self.line(depth, "else");
                self.if_statement(nested, depth);
            }
            None => {}
        }
    }

    fn assignment(&mut self, assignment: &Assignment, depth: usize) {
        self.expression(&assignment.lhs, depth + 1);
        self.line(depth, assignment.op.symbol());
        self.expression(&assignment.rhs, depth + 1);
    }

    fn chain(&mut self, chain: &Chain, depth: usize) {
        if chain.rhs.is_empty() {
            self.expression(&chain.lhs, depth);
            return;
        }
        self.expression(&chain.lhs, depth + 1);
        for (op, operand) in &chain.rhs {
            self.line(depth, op.symbol());
            self.expression(operand, depth + 1);
        }
    }

    fn expression(&mut self, expression: &Expression, depth: usize) {
        match expression {
            Expression::BooleanOr(chain)
            | Expression::BooleanAnd(chain)
            | Expression::BitwiseOr(chain)
            | Expression::BitwiseXor(chain)
            | Expression::BitwiseAnd(chain)
            | Expression::Equality(chain)
            | Expression::Relational(chain)
            | Expression::Shift(chain)
            | Expression::Additive(chain)
            | Expression::Multiplicative(chain) => self.chain(chain, depth),
            Expression::Assignment(assignment) => self.assignment(assignment, depth),
            Expression::Conditional(conditional) => {
                self.expression(&conditional.condition, depth + 1);
                self.line(depth, "?");
                self.expression(&conditional.true_case, depth + 1);
                self.line(depth, ":");
                self.expression(&conditional.false_case, depth + 1);
            }
            Expression::Prefix(prefix) => {
                self.line(depth, prefix.op.symbol());
                self.expression(&prefix.operand, depth + 1);
            }
            Expression::Postfix(postfix) => {
                self.expression(&postfix.expression, depth + 1);
                match &postfix.op {
                    PostfixOp::Index(index) => {
                        self.line(depth, "[");
                        self.expression(index, depth + 1);
                        self.line(depth, "]");
                    }
                    PostfixOp::Call(args) => {
                        self.line(depth, "(");
                        for arg in args {
                            self.expression(arg, depth + 1);
                        }
                        self.line(depth, ")");
                    }
                    PostfixOp::Member(member) => self.line(depth, format_args!(".{}", member)),
                }
            }
            Expression::Primary(primary) => {
                self.line(depth, "(");
                self.expression(&primary.expression, depth + 1);
                self.line(depth, ")");
            }
            Expression::Constant(constant) => self.line(depth, &constant.value),
            Expression::Symbol(identifier) => self.line(depth, identifier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse::Parser;
    use pretty_assertions::assert_eq;

    fn dump(source: &str) -> String {
        let module = Parser::new("test.fn", source).unwrap().parse_module().unwrap();
        dump_module(&module)
    }

    fn symbol(name: &str) -> Expression {
        Expression::Symbol(Identifier::new(name, SourceLocation::default()))
    }

    #[test]
    fn test_operators_at_parent_depth() {
        let mut parser = Parser::new("test.fn", "a - b * c").unwrap();
        let expression = parser.parse_expression().unwrap();
        assert_eq!(
            dump_expression(&expression),
            "  a\n-\n    b\n  *\n    c\n"
        );
    }

    #[test]
    fn test_empty_chain_is_transparent() {
        let wrapped = Expression::Equality(Chain::new(Expression::Additive(Chain::new(symbol("x")))));
        assert_eq!(dump_expression(&wrapped), dump_expression(&symbol("x")));
        assert_eq!(dump_expression(&wrapped), "x\n");
    }

    #[test]
    fn test_function_dump() {
        assert_eq!(
            dump("func add(a: i32, mut b: *i32): i32 => a + b"),
            "\
func add
  (
    a: i32
    mut b: *i32
  )
  : i32
  =>
      a
    +
      b
"
        );
    }

    #[test]
    fn test_statement_dump() {
        assert_eq!(
            dump("func f() { var mut x = 1; while x < 3 { x += 1; } if x { return; } else { break; } }"),
            "\
func f
  (
  )
  {
    var mut x
      =
        1
    while
        x
      <
        3
      {
          x
        +=
          1
      }
    if
      x
      {
        return
      }
    else
      {
        break
      }
  }
"
        );
    }

    #[test]
    fn test_type_dump() {
        assert_eq!(
            dump("type List struct { public head: *mut Node, len: u64 }"),
            "\
type List struct
  public head: *mut Node
  private len: u64
"
        );
    }
}
