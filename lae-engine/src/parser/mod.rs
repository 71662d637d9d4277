// Parser module for operation tree documents
// Reads JSON or YAML into an operation tree

pub mod document;
pub mod error;

pub use document::{InputFormat, TreeParser};
pub use error::{ParseError, ParseErrorKind, ParseResult};
