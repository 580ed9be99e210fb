use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::scanner::token::Span;

// ============= Compile-time errors (with miette diagnostics) =============

#[derive(Error, Debug, Diagnostic)]
pub enum CompileError {
    #[error("lex error: {message}")]
    #[diagnostic(code(bellaciao::lex))]
    Lex {
        message: String,
        #[label("here")]
        span: SourceSpan,
        #[source_code]
        src: miette::NamedSource<String>,
    },

    #[error("parse error: {message}")]
    #[diagnostic(code(bellaciao::parse))]
    Parse {
        message: String,
        #[label("here")]
        span: SourceSpan,
        #[source_code]
        src: miette::NamedSource<String>,
    },
}

impl CompileError {
    pub fn lex(message: impl Into<String>, offset: usize, len: usize) -> Self {
        Self::Lex {
            message: message.into(),
            span: SourceSpan::new(offset.into(), len),
            src: miette::NamedSource::new("input", String::new()),
        }
    }

    pub fn parse(message: impl Into<String>, offset: usize, len: usize) -> Self {
        Self::Parse {
            message: message.into(),
            span: SourceSpan::new(offset.into(), len),
            src: miette::NamedSource::new("input", String::new()),
        }
    }

    /// Attach source code for fancy miette diagnostics
    pub fn with_source_code(self, name: impl Into<String>, source: impl Into<String>) -> Self {
        let name_str = name.into();
        let source_str = source.into();
        match self {
            Self::Lex { message, span, .. } => Self::Lex {
                message,
                span,
                src: miette::NamedSource::new(name_str, source_str),
            },
            Self::Parse { message, span, .. } => Self::Parse {
                message,
                span,
                src: miette::NamedSource::new(name_str, source_str),
            },
        }
    }
}

// ============= Runtime errors (simple, no miette) =============

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("name error: undefined variable '{name}'")]
    UndefinedVariable { name: String, span: Span },

    #[error("name error: block '{name}' not found")]
    UndefinedBlock { name: String, span: Span },

    #[error("division error: division by zero")]
    DivisionByZero { span: Span },

    #[error("type error: {message}")]
    Type { message: String, span: Span },
}

impl RuntimeError {
    pub fn span(&self) -> Span {
        match self {
            Self::UndefinedVariable { span, .. } => *span,
            Self::UndefinedBlock { span, .. } => *span,
            Self::DivisionByZero { span } => *span,
            Self::Type { span, .. } => *span,
        }
    }

    /// Format error with line number (requires source code)
    pub fn display_with_line(&self, source: &str) -> String {
        let line = offset_to_line(source, self.span().offset);
        format!("line {line}: {self}")
    }
}

// ============= Top-level error for the run() entry point =============

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Calculate line number from byte offset in source
fn offset_to_line(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .chars()
        .filter(|&c| c == '\n')
        .count()
        + 1
}

// ============= Tests =============

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_error_implements_diagnostic() {
        let err = CompileError::lex("test", 0, 1);
        let diag: &dyn Diagnostic = &err;
        assert!(diag.code().is_some());
    }

    #[test]
    fn compile_error_with_source() {
        let err =
            CompileError::parse("expected ';'", 5, 1).with_source_code("test.heist", "x = 1\n");
        assert!(matches!(err, CompileError::Parse { .. }));
    }

    #[test]
    fn lex_error_display() {
        let err = CompileError::lex("unexpected character '@'", 4, 1);
        assert_eq!(err.to_string(), "lex error: unexpected character '@'");
    }

    #[test]
    fn parse_error_display() {
        let err = CompileError::parse("expected ';' after statement, found 'y'", 6, 1);
        assert_eq!(
            err.to_string(),
            "parse error: expected ';' after statement, found 'y'"
        );
    }

    #[test]
    fn runtime_error_name_prefix() {
        let err = RuntimeError::UndefinedVariable {
            name: "tokyo".to_string(),
            span: Span { offset: 10, len: 5 },
        };
        assert_eq!(err.to_string(), "name error: undefined variable 'tokyo'");
    }

    #[test]
    fn runtime_error_block_not_found() {
        let err = RuntimeError::UndefinedBlock {
            name: "vault".to_string(),
            span: Span { offset: 0, len: 7 },
        };
        assert_eq!(err.to_string(), "name error: block 'vault' not found");
    }

    #[test]
    fn runtime_error_division() {
        let err = RuntimeError::DivisionByZero {
            span: Span { offset: 4, len: 5 },
        };
        assert_eq!(err.to_string(), "division error: division by zero");
    }

    #[test]
    fn runtime_error_type() {
        let err = RuntimeError::Type {
            message: "cannot add int and string".to_string(),
            span: Span { offset: 4, len: 7 },
        };
        assert_eq!(err.to_string(), "type error: cannot add int and string");
    }

    #[test]
    fn offset_to_line_basic() {
        let source = "line 1\nline 2\nline 3";
        assert_eq!(offset_to_line(source, 0), 1); // Start of line 1
        assert_eq!(offset_to_line(source, 7), 2); // Start of line 2
        assert_eq!(offset_to_line(source, 14), 3); // Start of line 3
    }

    #[test]
    fn runtime_error_display_with_line() {
        let source = "x = 1;\ny = x + z;\n";
        let err = RuntimeError::UndefinedVariable {
            name: "z".to_string(),
            span: Span { offset: 15, len: 1 }, // 'z' is on line 2
        };
        assert_eq!(
            err.display_with_line(source),
            "line 2: name error: undefined variable 'z'"
        );
    }

    #[test]
    fn offset_to_line_at_newline() {
        let source = "line1\nline2\n";
        assert_eq!(offset_to_line(source, 5), 1); // At the '\n'
        assert_eq!(offset_to_line(source, 6), 2); // After the '\n'
    }

    #[test]
    fn offset_to_line_past_end() {
        let source = "short";
        assert_eq!(offset_to_line(source, 100), 1); // Past end, still line 1
    }

    #[test]
    fn error_wraps_both_stages() {
        let compile: Error = CompileError::lex("bad", 0, 1).into();
        assert!(matches!(compile, Error::Compile(_)));

        let runtime: Error = RuntimeError::DivisionByZero {
            span: Span { offset: 0, len: 1 },
        }
        .into();
        assert!(matches!(runtime, Error::Runtime(_)));
    }
}
