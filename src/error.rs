use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failures that stop the driver before or after a check run.
#[derive(Debug, Error)]
pub enum CompilerError {
    #[error("File does not exist: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("IOError: {0}")]
    Io(#[from] std::io::Error),
    #[error("ConfigError: {0}")]
    Config(String),
    #[error("JsonError: {0}")]
    Json(#[from] serde_json::Error),
}

/// A finding about the Lua input. `line` is `None` when it was detected at end of input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub(crate) line: Option<usize>,
    pub(crate) message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}: {}.", line, self.message),
            None => write!(f, "EOF: {}.", self.message),
        }
    }
}

/// Append-only log of diagnostics for one parse run, kept in detection order.
#[derive(Debug, Default)]
pub struct ErrorStore {
    diagnostics: Vec<Diagnostic>,
}

impl ErrorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, line: Option<usize>, message: impl Into<String>) {
        let message = message.into();
        tracing::trace!(?line, %message, "diagnostic");
        self.diagnostics.push(Diagnostic { line, message });
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_line_and_eof() {
        let mut store = ErrorStore::new();
        store.report(Some(3), "String not closed");
        store.report(None, "Scope not closed");

        let rendered: Vec<String> = store.diagnostics().iter().map(|d| d.to_string()).collect();
        assert_eq!(rendered, vec!["3: String not closed.", "EOF: Scope not closed."]);
        assert_eq!(store.error_count(), 2);
    }

    #[test]
    fn test_keeps_detection_order() {
        let mut store = ErrorStore::new();
        store.report(Some(9), "second line nine");
        store.report(Some(1), "then line one");

        let lines: Vec<Option<usize>> = store.diagnostics().iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![Some(9), Some(1)]);
    }
}
