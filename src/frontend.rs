//! Pipeline from source text to a validated module
//!
//! [`check`] runs the stages in order and stops at the first stage that
//! fails: lexing, parsing, then validation. The validator reports every
//! error it finds, the earlier stages report only their first.
//! [`check_and_emit`] hands each semantic error to the emitter as soon as
//! the validator produces it instead of waiting for the whole module.

use crate::config::Config;
use crate::diagnostic::{Emitter, IntoDiagnostics};
use crate::parser::ast::Module;
use crate::parser::lexer::{tokenize, LexError};
use crate::parser::{ParseError, Parser};
use crate::semantics::{validate_module, validate_module_with, Analysis, SemanticError};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("lexical error: {0}")]
    Lex(#[from] LexError),
    #[error("syntax error: {0}")]
    Parse(#[from] ParseError),
    #[error("{} semantic error(s)", .0.len())]
    Semantic(Vec<SemanticError>),
}

impl IntoDiagnostics for CompileError {
    fn to_diagnostics(&self, filename: &str) -> Vec<crate::diagnostic::Diagnostic> {
        match self {
            CompileError::Lex(err) => err.to_diagnostics(filename),
            CompileError::Parse(err) => err.to_diagnostics(filename),
            CompileError::Semantic(errors) => errors.iter().flat_map(|err| err.to_diagnostics(filename)).collect(),
        }
    }
}

/// A module that passed every stage, with what the validator learned about it
#[derive(Debug)]
pub struct Checked {
    pub module: Module,
    pub analysis: Analysis,
}

fn parse(filename: &str, source: &str) -> Result<Module, CompileError> {
    let tokens = tokenize(filename, source)?;
    debug!(file = filename, tokens = tokens.len(), "lexed");
    Ok(Parser::from_tokens(tokens).parse_module()?)
}

fn log_valid(filename: &str, module: &Module) {
    info!(
        file = filename,
        functions = module.functions.len(),
        types = module.types.len(),
        "module is valid"
    );
}

/// Lex, parse and validate `source`.
pub fn check(filename: &str, source: &str, config: &Config) -> Result<Checked, CompileError> {
    let module = parse(filename, source)?;
    let analysis = validate_module(&module, config).map_err(CompileError::Semantic)?;

    log_valid(filename, &module);
    Ok(Checked { module, analysis })
}

/// Like [`check`], but failures go to `emitter` instead of being returned.
pub fn check_and_emit(filename: &str, source: &str, config: &Config, emitter: &mut dyn Emitter) -> Option<Checked> {
    let module = match parse(filename, source) {
        Ok(module) => module,
        Err(err) => {
            emitter.emit_all(&err.to_diagnostics(filename));
            return None;
        }
    };

    let result = validate_module_with(&module, config, |err| emitter.emit_all(&err.to_diagnostics(filename)));
    match result {
        Ok(analysis) => {
            log_valid(filename, &module);
            Some(Checked { module, analysis })
        }
        Err(count) => {
            debug!(file = filename, errors = count, "validation failed");
            None
        }
    }
}
