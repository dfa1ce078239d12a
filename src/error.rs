// ABOUTME: Error types and the diagnostic accumulator shared by every pipeline stage

use crate::token::{Token, TokenKind};
use thiserror::Error;

/// A runtime failure carrying the token it should be attributed to.
///
/// Runtime errors propagate up through expression and statement evaluation
/// until the top-level interpret loop records them in the [`Reporter`].
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl RuntimeError {
    pub fn new(token: &Token, message: impl Into<String>) -> Self {
        RuntimeError {
            token: token.clone(),
            message: message.into(),
        }
    }
}

/// Thrown by the parser's `consume` on a token mismatch; caught at the
/// declaration level, which logs and synchronizes.
#[derive(Error, Debug, Clone)]
#[error("[line {line}] {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

/// One queued diagnostic record.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub line: usize,
    pub location: String,
    pub message: String,
}

/// Accumulates scan/parse/resolve and runtime diagnostics.
///
/// Nothing is printed while a pipeline stage runs; the driver checks the
/// flags between stages and calls [`Reporter::report`] to flush.
#[derive(Debug, Default)]
pub struct Reporter {
    pub had_error: bool,
    pub had_runtime_error: bool,
    diagnostics: Vec<Diagnostic>,
}

impl Reporter {
    pub fn new() -> Self {
        Reporter::default()
    }

    /// Record a compile-time diagnostic with an explicit line and location.
    pub fn error(&mut self, line: usize, location: impl Into<String>, message: impl Into<String>) {
        self.had_error = true;
        self.diagnostics.push(Diagnostic {
            line,
            location: location.into(),
            message: message.into(),
        });
    }

    /// Record a compile-time diagnostic attributed to a token.
    pub fn error_at(&mut self, token: &Token, message: impl Into<String>) {
        let location = if token.kind == TokenKind::Eof {
            " at end".to_string()
        } else {
            format!(" at '{}'", token.lexeme)
        };
        self.error(token.line, location, message);
    }

    /// Record a runtime error caught by the interpret loop.
    pub fn runtime_error(&mut self, error: &RuntimeError) {
        self.had_runtime_error = true;
        self.diagnostics.push(Diagnostic {
            line: error.token.line,
            location: format!(" at '{}'", error.token.lexeme),
            message: error.message.clone(),
        });
    }

    /// Flush every queued diagnostic to standard error.
    pub fn report(&mut self) {
        for diag in self.diagnostics.drain(..) {
            eprintln!(
                "[line {}] Error{}: {}",
                diag.line, diag.location, diag.message
            );
        }
    }

    /// Number of diagnostics currently queued.
    pub fn pending(&self) -> usize {
        self.diagnostics.len()
    }

    /// Reset the compile-error flag and queue between REPL lines.
    pub fn reset(&mut self) {
        self.had_error = false;
        self.diagnostics.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Literal;

    #[test]
    fn test_error_sets_flag() {
        let mut reporter = Reporter::new();
        assert!(!reporter.had_error);

        reporter.error(4, "", "Unexpected character '~'.");
        assert!(reporter.had_error);
        assert!(!reporter.had_runtime_error);
    }

    #[test]
    fn test_error_at_eof_location() {
        let mut reporter = Reporter::new();
        let eof = Token::new(TokenKind::Eof, "", Literal::None, 9);
        reporter.error_at(&eof, "Syntax Error. Expect expression.");

        assert_eq!(reporter.pending(), 1);
        assert!(reporter.had_error);
    }

    #[test]
    fn test_runtime_error_sets_flag() {
        let mut reporter = Reporter::new();
        let token = Token::new(TokenKind::Plus, "+", Literal::None, 2);
        let error = RuntimeError::new(&token, "Runtime Error. Operands must be a number.");
        reporter.runtime_error(&error);

        assert!(reporter.had_runtime_error);
        assert!(!reporter.had_error);
    }

    #[test]
    fn test_reset_clears_compile_flag() {
        let mut reporter = Reporter::new();
        reporter.error(1, "", "Unterminated string.");
        reporter.reset();
        assert!(!reporter.had_error);
        assert_eq!(reporter.pending(), 0);
    }
}
