// AST (Abstract Syntax Tree) definitions for Finch source

use std::fmt;
use std::ops::Index;

/// Source location information for error reporting
///
/// `pos` and `len` are byte offsets into the source buffer; `line` and
/// `column` are 1-based and describe where `pos` sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceLocation {
    pub pos: usize,
    pub len: usize,
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(pos: usize, len: usize, line: usize, column: usize) -> Self {
        Self {
            pos,
            len,
            line,
            column,
        }
    }

    /// Location covering `self` through the end of `end`.
    ///
    /// The line and column of the result are those of `self`.
    pub fn to(self, end: SourceLocation) -> SourceLocation {
        let end_pos = (end.pos + end.len).max(self.pos + self.len);
        SourceLocation {
            pos: self.pos,
            len: end_pos - self.pos,
            line: self.line,
            column: self.column,
        }
    }

    /// Byte offset one past the last covered byte.
    pub fn end(&self) -> usize {
        self.pos + self.len
    }
}

/// A name as written in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub name: String,
    pub location: SourceLocation,
}

impl Identifier {
    pub fn new(name: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            name: name.into(),
            location,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // Bit shifts
    Shl,
    Shr,
    // Comparison
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    // Bitwise
    BitAnd,
    BitXor,
    BitOr,
    // Logical
    And,
    Or,
}

impl BinOp {
    /// The operator as written in source.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::BitAnd => "&",
            BinOp::BitXor => "^",
            BinOp::BitOr => "|",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Assignment operators, plain and compound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    ShlAssign,
    ShrAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
}

impl AssignOp {
    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
            AssignOp::ModAssign => "%=",
            AssignOp::ShlAssign => "<<=",
            AssignOp::ShrAssign => ">>=",
            AssignOp::BitAndAssign => "&=",
            AssignOp::BitOrAssign => "|=",
            AssignOp::BitXorAssign => "^=",
        }
    }
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Prefix (unary) operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefixOp {
    Increment,   // ++x
    Decrement,   // --x
    Reference,   // &x
    Dereference, // *x
    Negate,      // -x
    BooleanNot,  // !x
    BitwiseNot,  // ~x
}

impl PrefixOp {
    pub fn symbol(self) -> &'static str {
        match self {
            PrefixOp::Increment => "++",
            PrefixOp::Decrement => "--",
            PrefixOp::Reference => "&",
            PrefixOp::Dereference => "*",
            PrefixOp::Negate => "-",
            PrefixOp::BooleanNot => "!",
            PrefixOp::BitwiseNot => "~",
        }
    }
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    /// Decimal integer literal
    Integer(u64),
    /// Hexadecimal, binary or octal integer literal
    UnsignedInteger(u64),
    Float(f64),
    Char(char),
    String(String),
    Bool(bool),
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Integer(n) | ConstantValue::UnsignedInteger(n) => write!(f, "{n}"),
            ConstantValue::Float(x) => write!(f, "{x:?}"),
            ConstantValue::Char(c) => write!(f, "'{}'", c.escape_default()),
            ConstantValue::String(s) => write!(f, "\"{}\"", s.escape_default()),
            ConstantValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub value: ConstantValue,
    pub location: SourceLocation,
}

/// A left-associative operator chain: `lhs (op rhs)*`
///
/// Right-hand entries are kept in source order. A chain without
/// right-hand entries stands for `lhs` itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub lhs: Box<Expression>,
    pub rhs: Vec<(BinOp, Expression)>,
}

impl Chain {
    pub fn new(lhs: Expression) -> Self {
        Self {
            lhs: Box::new(lhs),
            rhs: Vec::new(),
        }
    }

    pub fn location(&self) -> SourceLocation {
        match self.rhs.last() {
            Some((_, last)) => self.lhs.location().to(last.location()),
            None => self.lhs.location(),
        }
    }
}

/// `condition ? true_case : false_case`
#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    pub condition: Expression,
    pub true_case: Expression,
    pub false_case: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prefix {
    pub op: PrefixOp,
    pub operand: Expression,
    /// Location of the operator token
    pub location: SourceLocation,
}

/// The operation applied by a postfix expression
#[derive(Debug, Clone, PartialEq)]
pub enum PostfixOp {
    Index(Expression),
    Call(Vec<Expression>),
    Member(Identifier),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Postfix {
    pub expression: Expression,
    pub op: PostfixOp,
    /// Location of the suffix, from its opening token to its last token
    pub location: SourceLocation,
}

/// Parenthesised expression
#[derive(Debug, Clone, PartialEq)]
pub struct Primary {
    pub expression: Expression,
    /// Location including both parentheses
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub lhs: Expression,
    pub op: AssignOp,
    pub rhs: Expression,
    /// Location of the operator token
    pub location: SourceLocation,
}

/// Expressions, one variant per precedence level
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Assignment(Box<Assignment>),
    Conditional(Box<Conditional>),
    BooleanOr(Chain),
    BooleanAnd(Chain),
    BitwiseOr(Chain),
    BitwiseXor(Chain),
    BitwiseAnd(Chain),
    Equality(Chain),
    Relational(Chain),
    Shift(Chain),
    Additive(Chain),
    Multiplicative(Chain),
    Prefix(Box<Prefix>),
    Postfix(Box<Postfix>),
    Primary(Box<Primary>),
    Constant(Constant),
    Symbol(Identifier),
}

impl Expression {
    /// Get the source location spanned by this expression
    pub fn location(&self) -> SourceLocation {
        match self {
            Expression::Assignment(a) => a.lhs.location().to(a.rhs.location()),
            Expression::Conditional(c) => c.condition.location().to(c.false_case.location()),
            Expression::BooleanOr(chain)
            | Expression::BooleanAnd(chain)
            | Expression::BitwiseOr(chain)
            | Expression::BitwiseXor(chain)
            | Expression::BitwiseAnd(chain)
            | Expression::Equality(chain)
            | Expression::Relational(chain)
            | Expression::Shift(chain)
            | Expression::Additive(chain)
            | Expression::Multiplicative(chain) => chain.location(),
            Expression::Prefix(p) => p.location.to(p.operand.location()),
            Expression::Postfix(p) => p.expression.location().to(p.location),
            Expression::Primary(p) => p.location,
            Expression::Constant(c) => c.location,
            Expression::Symbol(id) => id.location,
        }
    }

    /// The chain stored by a binary-level variant, if this is one.
    pub fn as_chain(&self) -> Option<&Chain> {
        match self {
            Expression::BooleanOr(chain)
            | Expression::BooleanAnd(chain)
            | Expression::BitwiseOr(chain)
            | Expression::BitwiseXor(chain)
            | Expression::BitwiseAnd(chain)
            | Expression::Equality(chain)
            | Expression::Relational(chain)
            | Expression::Shift(chain)
            | Expression::Additive(chain)
            | Expression::Multiplicative(chain) => Some(chain),
            _ => None,
        }
    }

    /// Strips parentheses and empty chains.
    pub fn skip_transparent(&self) -> &Expression {
        match self {
            Expression::Primary(p) => p.expression.skip_transparent(),
            _ => match self.as_chain() {
                Some(chain) if chain.rhs.is_empty() => chain.lhs.skip_transparent(),
                _ => self,
            },
        }
    }

    /// Whether this expression may appear on the left of an assignment:
    /// a symbol, an index or member access, or one of those in parentheses.
    pub fn is_lvalue(&self) -> bool {
        match self.skip_transparent() {
            Expression::Symbol(_) => true,
            Expression::Postfix(p) => matches!(p.op, PostfixOp::Index(_) | PostfixOp::Member(_)),
            _ => false,
        }
    }
}

/// Stable handle to a [`Declaration`] stored in a [`DeclarationArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(u32);

impl DeclId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a function of a [`Module`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(pub usize);

/// Handle to a user type definition of a [`Module`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub usize);

/// Type reference as written: `*mut *T` is `T` with pointers `[true, false]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Typename {
    pub name: Identifier,
    /// One flag per `*`, outermost first; `true` for `*mut`
    pub pointers: Vec<bool>,
    pub location: SourceLocation,
}

impl fmt::Display for Typename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for is_mutable in &self.pointers {
            f.write_str(if *is_mutable { "*mut " } else { "*" })?;
        }
        f.write_str(&self.name.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Parameter,
    Variable,
}

/// A named binding introduced by a parameter list or a `var` statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub id: DeclId,
    pub kind: DeclarationKind,
    pub name: Identifier,
    /// Always present for parameters; variables may leave it to inference
    pub typename: Option<Typename>,
    pub is_mutable: bool,
}

/// Owner of every declaration in a module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationArena {
    declarations: Vec<Declaration>,
}

impl DeclarationArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(
        &mut self,
        kind: DeclarationKind,
        name: Identifier,
        typename: Option<Typename>,
        is_mutable: bool,
    ) -> DeclId {
        let id = DeclId(self.declarations.len() as u32);
        self.declarations.push(Declaration {
            id,
            kind,
            name,
            typename,
            is_mutable,
        });
        id
    }

    pub fn get(&self, id: DeclId) -> Option<&Declaration> {
        self.declarations.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }
}

impl Index<DeclId> for DeclarationArena {
    type Output = Declaration;

    fn index(&self, id: DeclId) -> &Declaration {
        &self.declarations[id.index()]
    }
}

/// `{ statements }`
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub location: SourceLocation,
}

/// `if condition { ... } [else ...]`
#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub condition: Expression,
    pub then_block: Block,
    pub else_branch: Option<ElseBranch>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElseBranch {
    Block(Block),
    If(Box<If>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoopKind {
    /// `loop { ... }`
    Infinite,
    /// `while condition { ... }`
    While(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub enum JumpKind {
    Break,
    Continue,
    Return(Option<Expression>),
}

impl JumpKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            JumpKind::Break => "break",
            JumpKind::Continue => "continue",
            JumpKind::Return(_) => "return",
        }
    }
}

/// Statements
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Block(Block),
    If(If),
    Declaration {
        declaration: DeclId,
        value: Expression,
        location: SourceLocation,
    },
    Assignment(Assignment),
    Expression {
        expression: Expression,
        location: SourceLocation,
    },
    Loop {
        kind: LoopKind,
        body: Block,
        location: SourceLocation,
    },
    Jump {
        kind: JumpKind,
        location: SourceLocation,
    },
}

impl Statement {
    /// Get the source location of this statement
    pub fn location(&self) -> SourceLocation {
        match self {
            Statement::Block(block) => block.location,
            Statement::If(iff) => iff.location,
            Statement::Declaration { location, .. } => *location,
            Statement::Assignment(a) => a.lhs.location().to(a.rhs.location()),
            Statement::Expression { location, .. } => *location,
            Statement::Loop { location, .. } => *location,
            Statement::Jump { location, .. } => *location,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    Block(Block),
    /// `=> expression`
    Inline(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Identifier,
    pub parameters: Vec<DeclId>,
    pub return_type: Option<Typename>,
    pub body: FunctionBody,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

/// Struct field or enum variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub visibility: Visibility,
    pub name: Identifier,
    pub typename: Typename,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDefinitionKind {
    Struct,
    Enum,
}

impl TypeDefinitionKind {
    pub fn keyword(self) -> &'static str {
        match self {
            TypeDefinitionKind::Struct => "struct",
            TypeDefinitionKind::Enum => "enum",
        }
    }
}

/// `type Name struct { ... }` or `type Name enum { ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDefinition {
    pub name: Identifier,
    pub kind: TypeDefinitionKind,
    pub members: Vec<Member>,
    pub location: SourceLocation,
}

/// A parsed compilation unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module {
    pub functions: Vec<Function>,
    pub types: Vec<TypeDefinition>,
    pub declarations: DeclarationArena,
}

impl Module {
    pub fn new() -> Self {
        Module::default()
    }

    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.0]
    }

    pub fn type_definition(&self, id: TypeId) -> &TypeDefinition {
        &self.types[id.0]
    }

    pub fn declaration(&self, id: DeclId) -> &Declaration {
        &self.declarations[id]
    }

    pub fn function_ids(&self) -> impl Iterator<Item = FunctionId> {
        (0..self.functions.len()).map(FunctionId)
    }

    pub fn type_ids(&self) -> impl Iterator<Item = TypeId> {
        (0..self.types.len()).map(TypeId)
    }
}
