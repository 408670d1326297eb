//! Compiler diagnostic types.
//!
//! Every failure surfaced by the tokenizer, parser/codegen, or symbol table
//! is a [`CompileError`] carrying enough context to render the single
//! diagnostic line the driver prints to stderr: `<file>:<line>: <kind>:
//! <message>`.

use std::fmt;
use std::path::{Path, PathBuf};

/// Category of compile failure, matching the taxonomy in the language spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lexical,
    Syntax,
    Name,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Lexical => "lexical error",
            ErrorKind::Syntax => "syntax error",
            ErrorKind::Name => "name error",
            ErrorKind::Io => "I/O error",
        };
        write!(f, "{}", s)
    }
}

/// A single compile diagnostic.
///
/// `line` is 1-indexed for display and `None` only for errors that have no
/// meaningful source position (e.g. failing to open the input file).
#[derive(Debug, Clone)]
pub struct CompileError {
    pub file: PathBuf,
    pub line: Option<usize>,
    pub kind: ErrorKind,
    pub message: String,
}

impl CompileError {
    pub fn new(file: impl Into<PathBuf>, line: usize, kind: ErrorKind, message: impl Into<String>) -> Self {
        CompileError {
            file: file.into(),
            line: Some(line),
            kind,
            message: message.into(),
        }
    }

    pub fn io(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        CompileError {
            file: file.into(),
            line: None,
            kind: ErrorKind::Io,
            message: message.into(),
        }
    }

    /// Re-home this error on a different file, preserving line/kind/message.
    ///
    /// Used when a sub-component (tokenizer, parser) is built without
    /// knowledge of the path it's compiling.
    pub fn with_file(mut self, file: &Path) -> Self {
        self.file = file.to_path_buf();
        self
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(
                f,
                "{}:{}: {}: {}",
                self.file.display(),
                line,
                self.kind,
                self.message
            ),
            None => write!(f, "{}: {}: {}", self.file.display(), self.kind, self.message),
        }
    }
}

impl std::error::Error for CompileError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_line() {
        let e = CompileError::new("Foo.jack", 12, ErrorKind::Syntax, "expected ';'");
        assert_eq!(e.to_string(), "Foo.jack:12: syntax error: expected ';'");
    }

    #[test]
    fn display_without_line() {
        let e = CompileError::io("Foo.jack", "permission denied");
        assert_eq!(e.to_string(), "Foo.jack: I/O error: permission denied");
    }

    #[test]
    fn all_kinds_render_distinct_labels() {
        let kinds = [
            (ErrorKind::Lexical, "lexical error"),
            (ErrorKind::Syntax, "syntax error"),
            (ErrorKind::Name, "name error"),
            (ErrorKind::Io, "I/O error"),
        ];
        for (kind, label) in kinds {
            assert_eq!(kind.to_string(), label);
        }
    }
}
