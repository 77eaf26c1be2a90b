//! Symbol tables used during validation
//!
//! - [`ModuleContext`]: primitives, user types and functions of one module
//! - [`FunctionContext`]: parameters plus a stack of [`BlockContext`] scopes
//!   for the function being validated
//!
//! Contexts never own declarations. They map names to [`DeclId`]s into the
//! module's declaration arena, so a context can always be dropped without
//! touching the tree.

use crate::parser::ast::{ConstantValue, DeclId, FunctionId, Module, TypeId};
use rustc_hash::FxHashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    UnsignedInteger,
    SignedInteger,
    Float,
    Bool,
    Char,
}

/// A built-in type. Literal types such as `{integer}` have size zero: they
/// are what an unannotated literal is until something pins it down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Primitive {
    pub name: &'static str,
    pub kind: PrimitiveKind,
    pub size: usize,
}

impl Primitive {
    pub fn is_literal(&self) -> bool {
        self.size == 0
    }
}

const fn primitive(name: &'static str, kind: PrimitiveKind, size: usize) -> Primitive {
    Primitive { name, kind, size }
}

pub const UNSIGNED_INTEGER_LITERAL: &str = "{unsigned integer}";
pub const INTEGER_LITERAL: &str = "{integer}";
pub const FLOAT_LITERAL: &str = "{float}";

/// Every primitive type, in declaration order
pub static PRIMITIVES: [Primitive; 15] = [
    primitive(UNSIGNED_INTEGER_LITERAL, PrimitiveKind::UnsignedInteger, 0),
    primitive("u8", PrimitiveKind::UnsignedInteger, 1),
    primitive("u16", PrimitiveKind::UnsignedInteger, 2),
    primitive("u32", PrimitiveKind::UnsignedInteger, 4),
    primitive("u64", PrimitiveKind::UnsignedInteger, 8),
    primitive(INTEGER_LITERAL, PrimitiveKind::SignedInteger, 0),
    primitive("i8", PrimitiveKind::SignedInteger, 1),
    primitive("i16", PrimitiveKind::SignedInteger, 2),
    primitive("i32", PrimitiveKind::SignedInteger, 4),
    primitive("i64", PrimitiveKind::SignedInteger, 8),
    primitive(FLOAT_LITERAL, PrimitiveKind::Float, 0),
    primitive("f32", PrimitiveKind::Float, 4),
    primitive("f64", PrimitiveKind::Float, 8),
    primitive("bool", PrimitiveKind::Bool, 1),
    primitive("char", PrimitiveKind::Char, 4),
];

/// What a typename's base name resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Primitive(&'static Primitive),
    User(TypeId),
}

/// A resolved typename: base type plus pointer mutability flags, outermost first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    pub base: TypeRef,
    pub pointers: Vec<bool>,
}

impl ResolvedType {
    pub fn value(base: TypeRef) -> Self {
        Self {
            base,
            pointers: Vec::new(),
        }
    }

    pub fn is_pointer(&self) -> bool {
        !self.pointers.is_empty()
    }

    /// Render against `module` so user types show their names
    pub fn display<'a>(&'a self, module: &'a Module) -> impl fmt::Display + 'a {
        DisplayResolved { ty: self, module }
    }
}

struct DisplayResolved<'a> {
    ty: &'a ResolvedType,
    module: &'a Module,
}

impl fmt::Display for DisplayResolved<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for is_mutable in &self.ty.pointers {
            f.write_str(if *is_mutable { "*mut " } else { "*" })?;
        }
        match self.ty.base {
            TypeRef::Primitive(primitive) => f.write_str(primitive.name),
            TypeRef::User(id) => match self.module.types.get(id.0) {
                Some(definition) => f.write_str(&definition.name.name),
                None => write!(f, "<type {}>", id.0),
            },
        }
    }
}

/// Module-wide tables
#[derive(Debug, Clone)]
pub struct ModuleContext {
    primitives: FxHashMap<&'static str, &'static Primitive>,
    types: FxHashMap<String, TypeId>,
    functions: FxHashMap<String, FunctionId>,
}

impl Default for ModuleContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleContext {
    pub fn new() -> Self {
        let primitives = PRIMITIVES.iter().map(|p| (p.name, p)).collect();
        Self {
            primitives,
            types: FxHashMap::default(),
            functions: FxHashMap::default(),
        }
    }

    pub fn primitive(&self, name: &str) -> Option<&'static Primitive> {
        self.primitives.get(name).copied()
    }

    pub fn user_type(&self, name: &str) -> Option<TypeId> {
        self.types.get(name).copied()
    }

    pub fn function(&self, name: &str) -> Option<FunctionId> {
        self.functions.get(name).copied()
    }

    /// Primitives first, then user types
    pub fn lookup_type(&self, name: &str) -> Option<TypeRef> {
        self.primitive(name)
            .map(TypeRef::Primitive)
            .or_else(|| self.user_type(name).map(TypeRef::User))
    }

    /// Register a user type; returns the previous holder of the name if any.
    pub fn insert_type(&mut self, name: &str, id: TypeId) -> Result<(), TypeId> {
        match self.types.get(name) {
            Some(previous) => Err(*previous),
            None => {
                self.types.insert(name.to_string(), id);
                Ok(())
            }
        }
    }

    /// Register a function; returns the previous holder of the name if any.
    pub fn insert_function(&mut self, name: &str, id: FunctionId) -> Result<(), FunctionId> {
        match self.functions.get(name) {
            Some(previous) => Err(*previous),
            None => {
                self.functions.insert(name.to_string(), id);
                Ok(())
            }
        }
    }

    /// The literal type of a constant, if it has one. Strings do not.
    pub fn literal_type(&self, value: &ConstantValue) -> Option<TypeRef> {
        let name = match value {
            ConstantValue::Integer(_) => INTEGER_LITERAL,
            ConstantValue::UnsignedInteger(_) => UNSIGNED_INTEGER_LITERAL,
            ConstantValue::Float(_) => FLOAT_LITERAL,
            ConstantValue::Char(_) => "char",
            ConstantValue::Bool(_) => "bool",
            ConstantValue::String(_) => return None,
        };
        self.primitive(name).map(TypeRef::Primitive)
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }
}

/// Variables declared directly in one block
#[derive(Debug, Clone, Default)]
pub struct BlockContext {
    variables: FxHashMap<String, DeclId>,
}

impl BlockContext {
    pub fn get_variable(&self, name: &str) -> Option<DeclId> {
        self.variables.get(name).copied()
    }

    pub fn insert_variable(&mut self, name: &str, id: DeclId) {
        self.variables.insert(name.to_string(), id);
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// Scope state for the function currently being validated
///
/// The first pushed block is the function body; blocks nested inside it
/// follow on the stack.
#[derive(Debug, Clone)]
pub struct FunctionContext {
    name: String,
    parameters: FxHashMap<String, DeclId>,
    blocks: Vec<BlockContext>,
    loop_depth: usize,
}

impl FunctionContext {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parameters: FxHashMap::default(),
            blocks: Vec::new(),
            loop_depth: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_parameter(&self, name: &str) -> Option<DeclId> {
        self.parameters.get(name).copied()
    }

    pub fn insert_parameter(&mut self, name: &str, id: DeclId) {
        self.parameters.insert(name.to_string(), id);
    }

    /// Enter a new block
    pub fn push_block(&mut self) {
        self.blocks.push(BlockContext::default());
    }

    /// Exit the current block, forgetting its variables
    pub fn pop_block(&mut self) {
        self.blocks.pop();
    }

    pub fn depth(&self) -> usize {
        self.blocks.len()
    }

    /// True while the innermost open block is the function body itself
    pub fn is_body_scope(&self) -> bool {
        self.blocks.len() == 1
    }

    pub fn body(&self) -> Option<&BlockContext> {
        self.blocks.first()
    }

    pub fn current_block(&self) -> Option<&BlockContext> {
        self.blocks.last()
    }

    /// The innermost block, opening one if none is open yet
    pub fn current_block_mut(&mut self) -> &mut BlockContext {
        if self.blocks.is_empty() {
            self.push_block();
        }
        let last = self.blocks.len() - 1;
        &mut self.blocks[last]
    }

    /// Blocks enclosing the current one, innermost first
    pub fn enclosing_blocks(&self) -> impl Iterator<Item = &BlockContext> {
        self.blocks.iter().rev().skip(1)
    }

    /// Resolve a name: current block, enclosing blocks, then parameters
    pub fn resolve(&self, name: &str) -> Option<DeclId> {
        self.blocks
            .iter()
            .rev()
            .find_map(|block| block.get_variable(name))
            .or_else(|| self.get_parameter(name))
    }

    pub fn enter_loop(&mut self) {
        self.loop_depth += 1;
    }

    pub fn exit_loop(&mut self) {
        self.loop_depth = self.loop_depth.saturating_sub(1);
    }

    pub fn in_loop(&self) -> bool {
        self.loop_depth > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{DeclarationArena, DeclarationKind, Identifier, SourceLocation};

    fn ids(count: usize) -> Vec<DeclId> {
        let mut arena = DeclarationArena::new();
        (0..count)
            .map(|i| {
                arena.alloc(
                    DeclarationKind::Variable,
                    Identifier::new(format!("v{i}"), SourceLocation::default()),
                    None,
                    false,
                )
            })
            .collect()
    }

    #[test]
    fn test_primitive_table() {
        let context = ModuleContext::new();
        assert_eq!(PRIMITIVES.len(), 15);
        for primitive in &PRIMITIVES {
            assert_eq!(context.primitive(primitive.name), Some(primitive));
        }
        let literals: Vec<_> = PRIMITIVES.iter().filter(|p| p.is_literal()).map(|p| p.name).collect();
        assert_eq!(literals, vec!["{unsigned integer}", "{integer}", "{float}"]);
        assert_eq!(context.primitive("i32").map(|p| p.size), Some(4));
        assert!(context.primitive("int").is_none());
    }

    #[test]
    fn test_literal_types() {
        let context = ModuleContext::new();
        let name = |value| match context.literal_type(&value) {
            Some(TypeRef::Primitive(p)) => Some(p.name),
            _ => None,
        };
        assert_eq!(name(ConstantValue::Integer(1)), Some("{integer}"));
        assert_eq!(name(ConstantValue::UnsignedInteger(1)), Some("{unsigned integer}"));
        assert_eq!(name(ConstantValue::Float(1.0)), Some("{float}"));
        assert_eq!(name(ConstantValue::Char('a')), Some("char"));
        assert_eq!(name(ConstantValue::Bool(true)), Some("bool"));
        assert_eq!(name(ConstantValue::String("s".into())), None);
    }

    #[test]
    fn test_registration_reports_previous() {
        let mut context = ModuleContext::new();
        assert_eq!(context.insert_type("Point", TypeId(0)), Ok(()));
        assert_eq!(context.insert_type("Point", TypeId(3)), Err(TypeId(0)));
        assert_eq!(context.lookup_type("Point"), Some(TypeRef::User(TypeId(0))));
        assert_eq!(context.insert_function("main", FunctionId(1)), Ok(()));
        assert_eq!(context.insert_function("main", FunctionId(2)), Err(FunctionId(1)));
        assert_eq!(context.function("main"), Some(FunctionId(1)));
    }

    #[test]
    fn test_block_stack_resolution() {
        let ids = ids(3);
        let mut function = FunctionContext::new("f");
        function.insert_parameter("x", ids[0]);

        function.push_block();
        assert!(function.is_body_scope());
        function.current_block_mut().insert_variable("y", ids[1]);

        function.push_block();
        assert!(!function.is_body_scope());
        function.current_block_mut().insert_variable("x", ids[2]);

        // Innermost wins, then enclosing blocks, then parameters
        assert_eq!(function.resolve("x"), Some(ids[2]));
        assert_eq!(function.resolve("y"), Some(ids[1]));
        assert_eq!(function.enclosing_blocks().count(), 1);

        function.pop_block();
        assert_eq!(function.resolve("x"), Some(ids[0]));
        assert_eq!(function.resolve("z"), None);
    }

    #[test]
    fn test_loop_depth() {
        let mut function = FunctionContext::new("f");
        assert!(!function.in_loop());
        function.enter_loop();
        function.enter_loop();
        function.exit_loop();
        assert!(function.in_loop());
        function.exit_loop();
        function.exit_loop();
        assert!(!function.in_loop());
    }
}
