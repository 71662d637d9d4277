// Parser error types
// Error kind and source location for operation tree documents

use std::fmt;

/// Parse error with an optional source location
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Line number (1-indexed, 0 if unknown)
    pub line: usize,
    /// Column number (1-indexed, 0 if unknown)
    pub column: usize,
    /// The kind of error
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Malformed JSON/YAML, or a node that is neither a matrix nor an operator
    Syntax,
    /// Operator symbol or name that is not recognized
    UnknownOperator,
    /// Wrong number of operands for an operator
    Arity,
    /// IO error (file not found, etc.)
    Io,
}

pub type ParseResult<T> = Result<T, ParseError>;

impl ParseError {
    pub fn new(message: impl Into<String>, kind: ParseErrorKind) -> Self {
        Self {
            message: message.into(),
            line: 0,
            column: 0,
            kind,
        }
    }

    pub fn syntax(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::new(message, ParseErrorKind::Syntax).at(line, column)
    }

    pub fn unknown_operator(operator: &str) -> Self {
        Self::new(
            format!(
                "unknown operator '{}' (expected one of +, *, -, T or add, multiply, negate, transpose)",
                operator
            ),
            ParseErrorKind::UnknownOperator,
        )
    }

    pub fn arity(message: impl Into<String>) -> Self {
        Self::new(message, ParseErrorKind::Arity)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(message, ParseErrorKind::Io)
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = line;
        self.column = column;
        self
    }

    /// Create from serde_json error
    pub fn from_json_error(err: &serde_json::Error) -> Self {
        match err.classify() {
            serde_json::error::Category::Io => Self::io(err.to_string()),
            _ => Self::syntax(strip_json_location(err), err.line(), err.column()),
        }
    }

    /// Create from serde_yaml error
    pub fn from_yaml_error(err: &serde_yaml::Error) -> Self {
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((0, 0));
        Self::syntax(err.to_string(), line, column)
    }
}

/// serde_json appends " at line L column C"; the location is kept separately
fn strip_json_location(err: &serde_json::Error) -> String {
    let message = err.to_string();
    match message.rfind(" at line ") {
        Some(index) => message[..index].to_string(),
        None => message,
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error: {}", self.message)?;
        if self.line > 0 {
            write!(f, "\n  --> line {}:{}", self.line, self.column)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::syntax("expected value", 3, 7);
        assert_eq!(err.to_string(), "error: expected value\n  --> line 3:7");

        let err = ParseError::arity("negate takes exactly one operand");
        assert_eq!(err.to_string(), "error: negate takes exactly one operand");
        assert_eq!(err.kind, ParseErrorKind::Arity);
    }

    #[test]
    fn test_from_json_error_keeps_location() {
        let json_err = serde_json::from_str::<serde_json::Value>("[[1, 2],\n [3, ]").unwrap_err();
        let err = ParseError::from_json_error(&json_err);

        assert_eq!(err.kind, ParseErrorKind::Syntax);
        assert_eq!(err.line, 2);
        assert!(!err.message.contains(" at line "));
    }

    #[test]
    fn test_unknown_operator_message() {
        let err = ParseError::unknown_operator("/");
        assert_eq!(err.kind, ParseErrorKind::UnknownOperator);
        assert!(err.message.contains("'/'"));
    }
}
