//! Semantic validation of parsed modules
//!
//! - [`context`]: symbol tables (primitives, user types, functions, scopes)
//! - [`validator`]: the module walker and the individual `validate_*` checks
//! - [`errors`]: [`SemanticError`] and its notes

pub mod context;
pub mod errors;
pub mod validator;

pub use errors::SemanticError;
pub use validator::{validate_module, validate_module_with, Analysis, Binding};
