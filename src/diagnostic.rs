//! Diagnostics and their emission
//!
//! Stage errors ([`LexError`], [`ParseError`], [`SemanticError`]) are turned
//! into [`Diagnostic`]s only at the boundary, through [`IntoDiagnostics`].
//! An [`Emitter`] receives them one by one: [`TerminalEmitter`] prints them,
//! a `Vec<Diagnostic>` keeps them.

use crate::config::ColorChoice;
use crate::parser::ast::SourceLocation;
use crate::parser::lexer::LexError;
use crate::parser::ParseError;
use crate::semantics::SemanticError;
use crossterm::style::Stylize;
use std::fmt;
use std::io::{self, Write};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Note => f.write_str("note"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub filename: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, filename: &str, location: SourceLocation, message: impl Into<String>) -> Self {
        Self {
            severity,
            filename: filename.to_string(),
            line: location.line,
            column: location.column,
            message: message.into(),
        }
    }

    pub fn error(filename: &str, location: SourceLocation, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, filename, location, message)
    }

    pub fn note(filename: &str, location: SourceLocation, message: impl Into<String>) -> Self {
        Self::new(Severity::Note, filename, location, message)
    }
}

/// `file:line:col: severity: message`
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}: {}",
            self.filename, self.line, self.column, self.severity, self.message
        )
    }
}

/// Conversion of a stage error into the diagnostics that describe it
pub trait IntoDiagnostics {
    fn to_diagnostics(&self, filename: &str) -> Vec<Diagnostic>;
}

impl IntoDiagnostics for LexError {
    fn to_diagnostics(&self, filename: &str) -> Vec<Diagnostic> {
        vec![Diagnostic::error(filename, self.location(), self.to_string())]
    }
}

impl IntoDiagnostics for ParseError {
    fn to_diagnostics(&self, filename: &str) -> Vec<Diagnostic> {
        vec![Diagnostic::error(filename, self.location, self.message.clone())]
    }
}

impl IntoDiagnostics for SemanticError {
    fn to_diagnostics(&self, filename: &str) -> Vec<Diagnostic> {
        let mut diagnostics = vec![Diagnostic::error(filename, self.location(), self.to_string())];
        if let Some(note) = self.note() {
            diagnostics.push(Diagnostic::note(filename, note.location, note.message));
        }
        diagnostics
    }
}

/// Sink for diagnostics
pub trait Emitter {
    fn emit(&mut self, diagnostic: &Diagnostic);

    fn emit_all(&mut self, diagnostics: &[Diagnostic]) {
        for diagnostic in diagnostics {
            self.emit(diagnostic);
        }
    }
}

impl Emitter for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        self.push(diagnostic.clone());
    }
}

/// Human-readable output with optional colour
pub struct TerminalEmitter<W: Write> {
    writer: W,
    colors: bool,
}

impl<W: Write> TerminalEmitter<W> {
    pub fn new(writer: W, colors: bool) -> Self {
        Self { writer, colors }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_diagnostic(&mut self, diagnostic: &Diagnostic) -> io::Result<()> {
        let position = format!("{}:{}:{}:", diagnostic.filename, diagnostic.line, diagnostic.column);
        let severity = format!("{}:", diagnostic.severity);

        if self.colors {
            let severity = match diagnostic.severity {
                Severity::Error => severity.red().bold(),
                Severity::Note => severity.cyan().bold(),
            };
            writeln!(self.writer, "{} {} {}", position.bold(), severity, diagnostic.message)
        } else {
            writeln!(self.writer, "{} {} {}", position, severity, diagnostic.message)
        }
    }
}

impl TerminalEmitter<io::Stderr> {
    /// Emitter for stderr, coloured according to `color`
    pub fn stderr(color: ColorChoice) -> Self {
        Self::new(io::stderr(), color.should_color())
    }
}

impl<W: Write> Emitter for TerminalEmitter<W> {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        if let Err(err) = self.write_diagnostic(diagnostic) {
            warn!(%err, "failed to write diagnostic");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn location(line: usize, column: usize) -> SourceLocation {
        SourceLocation::new(0, 1, line, column)
    }

    #[test]
    fn test_semantic_error_with_note() {
        let err = SemanticError::DuplicateParameter {
            name: "x".into(),
            function: "f".into(),
            location: location(1, 16),
            previous: location(1, 8),
        };
        let diagnostics = err.to_diagnostics("main.fn");

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(
            diagnostics[0].to_string(),
            "main.fn:1:16: error: parameter 'x' is previously declared in function 'f'"
        );
        assert_eq!(diagnostics[1].to_string(), "main.fn:1:8: note: previous declaration is here");
    }

    #[test]
    fn test_plain_terminal_output() {
        let mut emitter = TerminalEmitter::new(Vec::new(), false);
        let err = ParseError::new("expected ';' after expression but got '}'", location(3, 9));
        emitter.emit_all(&err.to_diagnostics("a.fn"));

        let output = String::from_utf8(emitter.into_inner()).unwrap();
        assert_eq!(output, "a.fn:3:9: error: expected ';' after expression but got '}'\n");
    }

    #[test]
    fn test_colored_output_keeps_text() {
        let mut emitter = TerminalEmitter::new(Vec::new(), true);
        emitter.emit(&Diagnostic::error("a.fn", location(1, 1), "boom"));

        let output = String::from_utf8(emitter.into_inner()).unwrap();
        assert!(output.contains("\x1b["));
        assert!(output.contains("error:"));
        assert!(output.ends_with("boom\n"));
    }

    #[test]
    fn test_collecting_emitter() {
        let mut collected: Vec<Diagnostic> = Vec::new();
        let err = LexError::UnterminatedComment { location: location(2, 5) };
        collected.emit_all(&err.to_diagnostics("a.fn"));

        assert_eq!(
            collected,
            vec![Diagnostic::error("a.fn", location(2, 5), "unterminated block comment")]
        );
    }
}
