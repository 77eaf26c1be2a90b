//! Scope and type-name validation
//!
//! Walks a parsed [`Module`], checking every declaration against the
//! [`ModuleContext`] and the per-function [`FunctionContext`], and records
//! what it learned in an [`Analysis`].
//!
//! # Validation order
//!
//! 1. Register every type definition, then validate each one's members.
//! 2. Register every function, then validate each function: parameters,
//!    return type, then the body with a block pushed per `{ }`.
//!
//! The first error inside a type or function stops that item; the remaining
//! items are still validated so one run reports one error per broken item.

use super::context::{FunctionContext, ModuleContext, ResolvedType, TypeRef};
use super::errors::SemanticError;
use crate::config::{Config, ShadowingPolicy};
use crate::parser::ast::*;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

/// What a symbol occurrence refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Declaration(DeclId),
    Function(FunctionId),
}

/// Results of a successful validation
#[derive(Debug, Clone)]
pub struct Analysis {
    context: ModuleContext,
    declaration_types: Vec<Option<ResolvedType>>,
    /// Keyed by the byte offset of the symbol occurrence
    bindings: FxHashMap<usize, Binding>,
}

impl Analysis {
    /// The module tables the validator built
    pub fn context(&self) -> &ModuleContext {
        &self.context
    }

    /// Declared or inferred type of a parameter or variable
    pub fn declaration_type(&self, id: DeclId) -> Option<&ResolvedType> {
        self.declaration_types.get(id.index()).and_then(Option::as_ref)
    }

    /// What the symbol occurrence `symbol` resolved to
    pub fn binding(&self, symbol: &Identifier) -> Option<Binding> {
        self.bindings.get(&symbol.location.pos).copied()
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }
}

/// Validate a whole module, collecting one error per failing item.
pub fn validate_module(module: &Module, config: &Config) -> Result<Analysis, Vec<SemanticError>> {
    let mut errors = Vec::new();
    let result = Validator::new(module, config).run(&mut |err| errors.push(err));
    result.map_err(|_| errors)
}

/// Validate a whole module, handing each error to `report` as soon as the
/// failing item is finished. On failure returns the number of errors.
pub fn validate_module_with(
    module: &Module,
    config: &Config,
    mut report: impl FnMut(SemanticError),
) -> Result<Analysis, usize> {
    Validator::new(module, config).run(&mut report)
}

/// Check a parameter's name against the parameters seen so far and add it.
pub fn validate_parameter(
    declarations: &DeclarationArena,
    decl: DeclId,
    function: &mut FunctionContext,
) -> Result<(), SemanticError> {
    let declaration = &declarations[decl];
    let name = declaration.name.name.as_str();

    if let Some(previous) = function.get_parameter(name) {
        return Err(SemanticError::DuplicateParameter {
            name: name.to_string(),
            function: function.name().to_string(),
            location: declaration.name.location,
            previous: declarations[previous].name.location,
        });
    }

    function.insert_parameter(name, decl);
    Ok(())
}

/// Check a variable's name against the scopes `policy` says it may not
/// shadow, then add it to the innermost block.
pub fn validate_variable(
    declarations: &DeclarationArena,
    decl: DeclId,
    function: &mut FunctionContext,
    policy: ShadowingPolicy,
) -> Result<(), SemanticError> {
    let declaration = &declarations[decl];
    let name = declaration.name.name.as_str();
    let location = declaration.name.location;

    if function.is_body_scope() || policy == ShadowingPolicy::Strict {
        if let Some(parameter) = function.get_parameter(name) {
            return Err(SemanticError::ShadowsParameter {
                name: name.to_string(),
                function: function.name().to_string(),
                location,
                previous: declarations[parameter].name.location,
            });
        }
    }

    if function.is_body_scope() {
        if let Some(existing) = function.body().and_then(|body| body.get_variable(name)) {
            return Err(SemanticError::DuplicateBodyVariable {
                name: name.to_string(),
                function: function.name().to_string(),
                location,
                previous: declarations[existing].name.location,
            });
        }
    }

    if let Some(existing) = function.current_block().and_then(|block| block.get_variable(name)) {
        return Err(SemanticError::DuplicateVariable {
            name: name.to_string(),
            location,
            previous: declarations[existing].name.location,
        });
    }

    if policy == ShadowingPolicy::Strict {
        if let Some(outer) = function.enclosing_blocks().find_map(|block| block.get_variable(name)) {
            return Err(SemanticError::ShadowsVariable {
                name: name.to_string(),
                location,
                previous: declarations[outer].name.location,
            });
        }
    }

    function.current_block_mut().insert_variable(name, decl);
    Ok(())
}

/// Resolve a typename's base name to a primitive or user type.
pub fn validate_typename(typename: &Typename, module: &ModuleContext) -> Result<ResolvedType, SemanticError> {
    match module.lookup_type(&typename.name.name) {
        Some(base) => Ok(ResolvedType {
            base,
            pointers: typename.pointers.clone(),
        }),
        None => Err(SemanticError::UnknownType {
            name: typename.name.name.clone(),
            location: typename.name.location,
        }),
    }
}

/// Validate the members of a struct or enum.
///
/// `containing_types` is scratch space for the containment walk: it holds the
/// chain of types entered by value from `id`, and is left as it was found.
pub fn validate_struct(
    module: &Module,
    id: TypeId,
    context: &ModuleContext,
    containing_types: &mut Vec<TypeId>,
) -> Result<(), SemanticError> {
    let definition = module.type_definition(id);
    let mut seen: FxHashMap<&str, SourceLocation> = FxHashMap::default();

    for member in &definition.members {
        if let Some(previous) = seen.get(member.name.name.as_str()) {
            return Err(SemanticError::DuplicateMember {
                type_name: definition.name.name.clone(),
                member: member.name.name.clone(),
                location: member.name.location,
                previous: *previous,
            });
        }
        seen.insert(&member.name.name, member.name.location);

        let resolved = validate_typename(&member.typename, context)?;
        let TypeRef::User(inner) = resolved.base else {
            continue;
        };
        if resolved.is_pointer() {
            continue;
        }

        containing_types.push(id);
        let recursive = contains_by_value(module, context, id, inner, containing_types);
        containing_types.pop();

        if recursive {
            return Err(SemanticError::RecursiveType {
                type_name: definition.name.name.clone(),
                member: member.name.name.clone(),
                location: member.typename.location,
                definition: definition.name.location,
            });
        }
    }

    Ok(())
}

/// Whether `current`, entered by value, leads back to `root` by value.
///
/// Cycles that do not pass through `root` are cut off here; they are
/// reported when their own types are validated.
fn contains_by_value(
    module: &Module,
    context: &ModuleContext,
    root: TypeId,
    current: TypeId,
    containing_types: &mut Vec<TypeId>,
) -> bool {
    if current == root {
        return true;
    }
    if containing_types.contains(&current) {
        return false;
    }

    containing_types.push(current);
    let found = module.type_definition(current).members.iter().any(|member| {
        value_member_type(&member.typename, context)
            .is_some_and(|inner| contains_by_value(module, context, root, inner, containing_types))
    });
    containing_types.pop();
    found
}

/// The user type a member stores inline, if any
fn value_member_type(typename: &Typename, context: &ModuleContext) -> Option<TypeId> {
    if !typename.pointers.is_empty() {
        return None;
    }
    match context.lookup_type(&typename.name.name) {
        Some(TypeRef::User(id)) => Some(id),
        _ => None,
    }
}

/// Module walker that owns the tables built along the way
pub struct Validator<'m> {
    module: &'m Module,
    policy: ShadowingPolicy,
    context: ModuleContext,
    declaration_types: Vec<Option<ResolvedType>>,
    bindings: FxHashMap<usize, Binding>,
}

impl<'m> Validator<'m> {
    pub fn new(module: &'m Module, config: &Config) -> Self {
        Self {
            module,
            policy: config.shadowing,
            context: ModuleContext::new(),
            declaration_types: vec![None; module.declarations.len()],
            bindings: FxHashMap::default(),
        }
    }

    pub fn run(mut self, report: &mut dyn FnMut(SemanticError)) -> Result<Analysis, usize> {
        let mut errors = 0;
        let mut fail = |err: SemanticError| {
            errors += 1;
            report(err);
        };

        for id in self.register_types(&mut fail) {
            if let Err(err) = validate_struct(self.module, id, &self.context, &mut Vec::new()) {
                fail(err);
            }
        }

        for id in self.register_functions(&mut fail) {
            if let Err(err) = self.validate_function(id) {
                fail(err);
            }
        }

        debug!(
            types = self.context.type_count(),
            functions = self.context.function_count(),
            errors,
            "validated module"
        );

        if errors > 0 {
            return Err(errors);
        }

        Ok(Analysis {
            context: self.context,
            declaration_types: self.declaration_types,
            bindings: self.bindings,
        })
    }

    /// Enter every type name into the module table before any member is
    /// checked, so types may refer to ones defined later.
    fn register_types(&mut self, fail: &mut dyn FnMut(SemanticError)) -> Vec<TypeId> {
        let module = self.module;
        let mut registered = Vec::new();

        for id in module.type_ids() {
            let name = &module.type_definition(id).name;
            if self.context.primitive(&name.name).is_some() {
                fail(SemanticError::PrimitiveRedefinition {
                    name: name.name.clone(),
                    location: name.location,
                });
                continue;
            }
            match self.context.insert_type(&name.name, id) {
                Ok(()) => registered.push(id),
                Err(previous) => fail(SemanticError::DuplicateType {
                    name: name.name.clone(),
                    location: name.location,
                    previous: module.type_definition(previous).name.location,
                }),
            }
        }

        registered
    }

    fn register_functions(&mut self, fail: &mut dyn FnMut(SemanticError)) -> Vec<FunctionId> {
        let module = self.module;
        let mut registered = Vec::new();

        for id in module.function_ids() {
            let name = &module.function(id).name;
            match self.context.insert_function(&name.name, id) {
                Ok(()) => registered.push(id),
                Err(previous) => fail(SemanticError::DuplicateFunction {
                    name: name.name.clone(),
                    location: name.location,
                    previous: module.function(previous).name.location,
                }),
            }
        }

        registered
    }

    fn validate_function(&mut self, id: FunctionId) -> Result<(), SemanticError> {
        let module = self.module;
        let function = module.function(id);
        let mut scope = FunctionContext::new(&function.name.name);
        debug!(function = %function.name, "validating function");

        for &parameter in &function.parameters {
            validate_parameter(&module.declarations, parameter, &mut scope)?;
            let declaration = &module.declarations[parameter];
            let resolved = match &declaration.typename {
                Some(typename) => validate_typename(typename, &self.context)?,
                None => {
                    return Err(SemanticError::CannotInferType {
                        name: declaration.name.name.clone(),
                        location: declaration.name.location,
                    })
                }
            };
            self.declaration_types[parameter.index()] = Some(resolved);
        }

        if let Some(return_type) = &function.return_type {
            validate_typename(return_type, &self.context)?;
        }

        match &function.body {
            FunctionBody::Block(block) => self.validate_block(block, &mut scope),
            FunctionBody::Inline(expression) => self.validate_expression(expression, &scope),
        }
    }

    fn validate_block(&mut self, block: &Block, scope: &mut FunctionContext) -> Result<(), SemanticError> {
        scope.push_block();
        let result = block
            .statements
            .iter()
            .try_for_each(|statement| self.validate_statement(statement, scope));
        scope.pop_block();
        result
    }

    fn validate_statement(&mut self, statement: &Statement, scope: &mut FunctionContext) -> Result<(), SemanticError> {
        match statement {
            Statement::Block(block) => self.validate_block(block, scope),
            Statement::If(iff) => self.validate_if(iff, scope),
            Statement::Declaration {
                declaration, value, ..
            } => self.validate_declaration(*declaration, value, scope),
            Statement::Assignment(assignment) => self.validate_assignment(assignment, scope),
            Statement::Expression { expression, .. } => self.validate_expression(expression, scope),
            Statement::Loop { kind, body, .. } => {
                if let LoopKind::While(condition) = kind {
                    self.validate_expression(condition, scope)?;
                }
                scope.enter_loop();
                let result = self.validate_block(body, scope);
                scope.exit_loop();
                result
            }
            Statement::Jump { kind, location } => match kind {
                JumpKind::Return(Some(value)) => self.validate_expression(value, scope),
                JumpKind::Return(None) => Ok(()),
                JumpKind::Break | JumpKind::Continue if scope.in_loop() => Ok(()),
                JumpKind::Break | JumpKind::Continue => Err(SemanticError::JumpOutsideLoop {
                    keyword: kind.keyword(),
                    location: *location,
                }),
            },
        }
    }

    fn validate_if(&mut self, iff: &If, scope: &mut FunctionContext) -> Result<(), SemanticError> {
        self.validate_expression(&iff.condition, scope)?;
        self.validate_block(&iff.then_block, scope)?;
        match &iff.else_branch {
            Some(ElseBranch::Block(block)) => self.validate_block(block, scope),
            Some(ElseBranch::If(nested)) => self.validate_if(nested, scope),
            None => Ok(()),
        }
    }

    /// The initializer is checked before the name is bound, so `var x = x;`
    /// refers to an outer `x`.
    fn validate_declaration(
        &mut self,
        decl: DeclId,
        value: &Expression,
        scope: &mut FunctionContext,
    ) -> Result<(), SemanticError> {
        let module = self.module;
        self.validate_expression(value, scope)?;

        let declaration = &module.declarations[decl];
        let resolved = match &declaration.typename {
            Some(typename) => validate_typename(typename, &self.context)?,
            None => self
                .literal_type(value)
                .ok_or_else(|| SemanticError::CannotInferType {
                    name: declaration.name.name.clone(),
                    location: declaration.name.location,
                })?,
        };

        validate_variable(&module.declarations, decl, scope, self.policy)?;
        trace!(variable = %declaration.name, depth = scope.depth(), "declared");
        self.declaration_types[decl.index()] = Some(resolved);
        Ok(())
    }

    /// Type of a literal initializer, looking through parentheses and negation
    fn literal_type(&self, value: &Expression) -> Option<ResolvedType> {
        match value.skip_transparent() {
            Expression::Constant(constant) => self.context.literal_type(&constant.value).map(ResolvedType::value),
            Expression::Prefix(prefix) if prefix.op == PrefixOp::Negate => self.literal_type(&prefix.operand),
            _ => None,
        }
    }

    fn validate_assignment(&mut self, assignment: &Assignment, scope: &FunctionContext) -> Result<(), SemanticError> {
        self.validate_expression(&assignment.lhs, scope)?;
        self.validate_expression(&assignment.rhs, scope)?;
        self.check_mutable(&assignment.lhs)
    }

    /// A symbol that is written to must name a `mut` declaration, never a function
    fn check_mutable(&self, target: &Expression) -> Result<(), SemanticError> {
        let Expression::Symbol(symbol) = target.skip_transparent() else {
            return Ok(());
        };

        match self.bindings.get(&symbol.location.pos) {
            Some(Binding::Declaration(id)) => {
                let declaration = &self.module.declarations[*id];
                if declaration.is_mutable {
                    return Ok(());
                }
                Err(SemanticError::ImmutableAssignment {
                    name: symbol.name.clone(),
                    location: symbol.location,
                    declaration: declaration.name.location,
                })
            }
            Some(Binding::Function(id)) => Err(SemanticError::AssignToFunction {
                name: symbol.name.clone(),
                location: symbol.location,
                definition: self.module.function(*id).name.location,
            }),
            None => Ok(()),
        }
    }

    fn validate_chain(&mut self, chain: &Chain, scope: &FunctionContext) -> Result<(), SemanticError> {
        self.validate_expression(&chain.lhs, scope)?;
        chain
            .rhs
            .iter()
            .try_for_each(|(_, operand)| self.validate_expression(operand, scope))
    }

    fn validate_expression(&mut self, expression: &Expression, scope: &FunctionContext) -> Result<(), SemanticError> {
        match expression {
            Expression::Assignment(assignment) => self.validate_assignment(assignment, scope),
            Expression::Conditional(conditional) => {
                self.validate_expression(&conditional.condition, scope)?;
                self.validate_expression(&conditional.true_case, scope)?;
                self.validate_expression(&conditional.false_case, scope)
            }
            Expression::BooleanOr(chain)
            | Expression::BooleanAnd(chain)
            | Expression::BitwiseOr(chain)
            | Expression::BitwiseXor(chain)
            | Expression::BitwiseAnd(chain)
            | Expression::Equality(chain)
            | Expression::Relational(chain)
            | Expression::Shift(chain)
            | Expression::Additive(chain)
            | Expression::Multiplicative(chain) => self.validate_chain(chain, scope),
            Expression::Prefix(prefix) => {
                self.validate_expression(&prefix.operand, scope)?;
                match prefix.op {
                    PrefixOp::Increment | PrefixOp::Decrement => self.check_mutable(&prefix.operand),
                    _ => Ok(()),
                }
            }
            Expression::Postfix(postfix) => {
                self.validate_expression(&postfix.expression, scope)?;
                match &postfix.op {
                    PostfixOp::Index(index) => self.validate_expression(index, scope),
                    PostfixOp::Call(args) => args.iter().try_for_each(|arg| self.validate_expression(arg, scope)),
                    // Member names depend on the operand's type, which is not tracked here
                    PostfixOp::Member(_) => Ok(()),
                }
            }
            Expression::Primary(primary) => self.validate_expression(&primary.expression, scope),
            Expression::Constant(_) => Ok(()),
            Expression::Symbol(symbol) => self.resolve_symbol(symbol, scope),
        }
    }

    /// Resolve through the block stack and parameters, then module functions
    fn resolve_symbol(&mut self, symbol: &Identifier, scope: &FunctionContext) -> Result<(), SemanticError> {
        let binding = match scope.resolve(&symbol.name) {
            Some(decl) => Binding::Declaration(decl),
            None => match self.context.function(&symbol.name) {
                Some(function) => Binding::Function(function),
                None => {
                    return Err(SemanticError::UndeclaredSymbol {
                        name: symbol.name.clone(),
                        location: symbol.location,
                    })
                }
            },
        };

        trace!(symbol = %symbol, ?binding, "resolved");
        self.bindings.insert(symbol.location.pos, binding);
        Ok(())
    }
}
