//! Semantic error types for the validator
//!
//! This module defines [`SemanticError`], which represents every way a
//! well-formed tree can still be rejected: name collisions, unresolvable
//! names and types, recursive types and misplaced jumps.
//!
//! Errors that conflict with an earlier declaration carry its location so the
//! diagnostic can point at both sites (see [`SemanticError::note`]).

use crate::parser::ast::SourceLocation;
use thiserror::Error;

/// A secondary message attached to an error, pointing at a related site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub message: &'static str,
    pub location: SourceLocation,
}

/// Semantic errors found while validating a module
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    /// Two parameters of one function share a name
    #[error("parameter '{name}' is previously declared in function '{function}'")]
    DuplicateParameter {
        name: String,
        function: String,
        location: SourceLocation,
        previous: SourceLocation,
    },

    /// A variable reuses the name of a parameter
    #[error("'{name}' is previously declared as a parameter in function '{function}'")]
    ShadowsParameter {
        name: String,
        function: String,
        location: SourceLocation,
        previous: SourceLocation,
    },

    /// Two variables in the function's body block share a name
    #[error("'{name}' is previously declared as a variable in function '{function}'")]
    DuplicateBodyVariable {
        name: String,
        function: String,
        location: SourceLocation,
        previous: SourceLocation,
    },

    /// Two variables in one nested block share a name
    #[error("'{name}' is previously declared as a variable in same scope")]
    DuplicateVariable {
        name: String,
        location: SourceLocation,
        previous: SourceLocation,
    },

    /// A variable reuses the name of one in an enclosing block (strict shadowing only)
    #[error("'{name}' is previously declared as a variable in an enclosing scope")]
    ShadowsVariable {
        name: String,
        location: SourceLocation,
        previous: SourceLocation,
    },

    /// Typename that is neither a primitive nor a user type
    #[error("'{name}' is not an imported or locally defined type")]
    UnknownType { name: String, location: SourceLocation },

    #[error("type '{name}' is already defined")]
    DuplicateType {
        name: String,
        location: SourceLocation,
        previous: SourceLocation,
    },

    #[error("type '{name}' has the same name as a primitive type")]
    PrimitiveRedefinition { name: String, location: SourceLocation },

    #[error("member '{member}' is previously declared in type '{type_name}'")]
    DuplicateMember {
        type_name: String,
        member: String,
        location: SourceLocation,
        previous: SourceLocation,
    },

    /// A type contains itself by value, directly or through other types
    #[error("type '{type_name}' contains itself through member '{member}' and would have infinite size")]
    RecursiveType {
        type_name: String,
        member: String,
        location: SourceLocation,
        definition: SourceLocation,
    },

    #[error("function '{name}' is already defined")]
    DuplicateFunction {
        name: String,
        location: SourceLocation,
        previous: SourceLocation,
    },

    /// Symbol that is not a variable, parameter or function in scope
    #[error("'{name}' is not declared in this scope")]
    UndeclaredSymbol { name: String, location: SourceLocation },

    #[error("cannot assign to '{name}' because it is not declared 'mut'")]
    ImmutableAssignment {
        name: String,
        location: SourceLocation,
        declaration: SourceLocation,
    },

    /// Assignment, `++` or `--` whose target names a function
    #[error("cannot assign to '{name}' because it is a function")]
    AssignToFunction {
        name: String,
        location: SourceLocation,
        definition: SourceLocation,
    },

    /// Unannotated variable whose initializer is not a typed literal
    #[error("type of '{name}' cannot be inferred; add a type annotation")]
    CannotInferType { name: String, location: SourceLocation },

    #[error("'{keyword}' outside of a loop")]
    JumpOutsideLoop {
        keyword: &'static str,
        location: SourceLocation,
    },
}

impl SemanticError {
    /// Primary location of the error
    pub fn location(&self) -> SourceLocation {
        match self {
            SemanticError::DuplicateParameter { location, .. }
            | SemanticError::ShadowsParameter { location, .. }
            | SemanticError::DuplicateBodyVariable { location, .. }
            | SemanticError::DuplicateVariable { location, .. }
            | SemanticError::ShadowsVariable { location, .. }
            | SemanticError::UnknownType { location, .. }
            | SemanticError::DuplicateType { location, .. }
            | SemanticError::PrimitiveRedefinition { location, .. }
            | SemanticError::DuplicateMember { location, .. }
            | SemanticError::RecursiveType { location, .. }
            | SemanticError::DuplicateFunction { location, .. }
            | SemanticError::UndeclaredSymbol { location, .. }
            | SemanticError::ImmutableAssignment { location, .. }
            | SemanticError::AssignToFunction { location, .. }
            | SemanticError::CannotInferType { location, .. }
            | SemanticError::JumpOutsideLoop { location, .. } => *location,
        }
    }

    /// Related site worth showing alongside the error, if any
    pub fn note(&self) -> Option<Note> {
        let (message, location) = match self {
            SemanticError::DuplicateParameter { previous, .. }
            | SemanticError::ShadowsParameter { previous, .. }
            | SemanticError::DuplicateBodyVariable { previous, .. }
            | SemanticError::DuplicateVariable { previous, .. }
            | SemanticError::ShadowsVariable { previous, .. }
            | SemanticError::DuplicateMember { previous, .. } => ("previous declaration is here", *previous),
            SemanticError::DuplicateType { previous, .. }
            | SemanticError::DuplicateFunction { previous, .. } => ("previous definition is here", *previous),
            SemanticError::RecursiveType { definition, .. } => ("type is defined here", *definition),
            SemanticError::ImmutableAssignment { declaration, .. } => ("declared here without 'mut'", *declaration),
            SemanticError::AssignToFunction { definition, .. } => ("function is defined here", *definition),
            _ => return None,
        };
        Some(Note { message, location })
    }
}
