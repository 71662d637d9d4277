// Tree Document Parser
// Builds an operation tree from a JSON or YAML document

use crate::parser::error::{ParseError, ParseResult};
use crate::tree::{Matrix, OperationNode, OperatorKind};

use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Source document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFormat {
    #[default]
    Json,
    Yaml,
}

impl InputFormat {
    /// YAML for `.yaml`/`.yml` files, JSON otherwise
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => InputFormat::Yaml,
            _ => InputFormat::Json,
        }
    }
}

/// A node as written in the document
#[derive(Debug, Deserialize)]
#[serde(untagged, expecting = "a matrix (array of number arrays) or an operator object")]
enum RawNode {
    Matrix(Vec<Vec<f64>>),
    Operator {
        operator: String,
        operands: Vec<RawNode>,
    },
}

pub struct TreeParser;

impl TreeParser {
    /// Parse a tree from document text
    pub fn parse(content: &str, format: InputFormat) -> ParseResult<OperationNode> {
        let raw: RawNode = match format {
            InputFormat::Json => {
                serde_json::from_str(content).map_err(|e| ParseError::from_json_error(&e))?
            }
            InputFormat::Yaml => {
                serde_yaml::from_str(content).map_err(|e| ParseError::from_yaml_error(&e))?
            }
        };
        build(raw, "root")
    }

    /// Parse a tree from file, choosing the format by extension
    pub fn parse_file<P: AsRef<Path>>(path: P) -> ParseResult<OperationNode> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ParseError::io(format!("failed to read {}: {}", path.display(), e))
        })?;

        Self::parse(&content, InputFormat::from_path(path))
    }
}

fn build(raw: RawNode, at: &str) -> ParseResult<OperationNode> {
    match raw {
        RawNode::Matrix(rows) => Ok(OperationNode::Leaf(Matrix::from_rows(rows))),
        RawNode::Operator { operator, operands } => {
            let kind = OperatorKind::parse(&operator)
                .ok_or_else(|| ParseError::unknown_operator(&operator))?;

            if !kind.accepts(operands.len()) {
                let expected = if kind.is_unary() {
                    "exactly one operand"
                } else {
                    "at least two operands"
                };
                return Err(ParseError::arity(format!(
                    "{} at {} takes {}, got {}",
                    kind,
                    at,
                    expected,
                    operands.len()
                )));
            }

            let children = operands
                .into_iter()
                .enumerate()
                .map(|(i, operand)| build(operand, &format!("{}.operands[{}]", at, i)))
                .collect::<ParseResult<Vec<_>>>()?;

            Ok(OperationNode::operator(kind, children))
        }
    }
}
