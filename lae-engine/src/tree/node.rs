// Operation Tree
// Leaf/operator nodes plus the ready-node search and associative flattening used during resolution

use crate::error::{EngineError, EngineResult};
use crate::tree::matrix::Matrix;

use std::fmt;

/// Operator carried by an operator node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Add,
    Multiply,
    Negate,
    Transpose,
}

impl OperatorKind {
    /// Parse a symbol (`+`, `*`, `-`, `T`) or a case-insensitive long name
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "+" => return Some(OperatorKind::Add),
            "*" => return Some(OperatorKind::Multiply),
            "-" => return Some(OperatorKind::Negate),
            "T" => return Some(OperatorKind::Transpose),
            _ => {}
        }

        match text.to_ascii_lowercase().as_str() {
            "add" => Some(OperatorKind::Add),
            "multiply" => Some(OperatorKind::Multiply),
            "negate" => Some(OperatorKind::Negate),
            "transpose" => Some(OperatorKind::Transpose),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            OperatorKind::Add => "+",
            OperatorKind::Multiply => "*",
            OperatorKind::Negate => "-",
            OperatorKind::Transpose => "T",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OperatorKind::Add => "add",
            OperatorKind::Multiply => "multiply",
            OperatorKind::Negate => "negate",
            OperatorKind::Transpose => "transpose",
        }
    }

    pub fn is_unary(self) -> bool {
        matches!(self, OperatorKind::Negate | OperatorKind::Transpose)
    }

    /// Whether operand grouping can change without changing the value
    pub fn is_associative(self) -> bool {
        matches!(self, OperatorKind::Add | OperatorKind::Multiply)
    }

    /// Fewest operands a node of this kind may have
    pub fn min_arity(self) -> usize {
        if self.is_unary() {
            1
        } else {
            2
        }
    }

    /// Whether `count` operands is a legal arity for this kind
    pub fn accepts(self, count: usize) -> bool {
        if self.is_unary() {
            count == 1
        } else {
            count >= 2
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Node of an operation tree.
///
/// Children are owned, so a subtree can never be shared between two
/// parents. [`resolve`](Self::resolve) is the only mutation that changes a
/// node's variant.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationNode {
    /// Concrete matrix value
    Leaf(Matrix),
    /// Operator applied to ordered operands
    Operator {
        kind: OperatorKind,
        children: Vec<OperationNode>,
    },
}

impl OperationNode {
    pub fn leaf(matrix: impl Into<Matrix>) -> Self {
        OperationNode::Leaf(matrix.into())
    }

    pub fn operator(kind: OperatorKind, children: Vec<OperationNode>) -> Self {
        OperationNode::Operator { kind, children }
    }

    pub fn add(children: Vec<OperationNode>) -> Self {
        Self::operator(OperatorKind::Add, children)
    }

    pub fn multiply(children: Vec<OperationNode>) -> Self {
        Self::operator(OperatorKind::Multiply, children)
    }

    pub fn negate(child: OperationNode) -> Self {
        Self::operator(OperatorKind::Negate, vec![child])
    }

    pub fn transpose(child: OperationNode) -> Self {
        Self::operator(OperatorKind::Transpose, vec![child])
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, OperationNode::Leaf(_))
    }

    /// Matrix of a leaf; `None` for an operator
    pub fn matrix(&self) -> Option<&Matrix> {
        match self {
            OperationNode::Leaf(matrix) => Some(matrix),
            OperationNode::Operator { .. } => None,
        }
    }

    pub fn into_matrix(self) -> Option<Matrix> {
        match self {
            OperationNode::Leaf(matrix) => Some(matrix),
            OperationNode::Operator { .. } => None,
        }
    }

    /// Operator kind; `None` for a leaf
    pub fn kind(&self) -> Option<OperatorKind> {
        match self {
            OperationNode::Leaf(_) => None,
            OperationNode::Operator { kind, .. } => Some(*kind),
        }
    }

    /// Operands of an operator; empty for a leaf
    pub fn children(&self) -> &[OperationNode] {
        match self {
            OperationNode::Leaf(_) => &[],
            OperationNode::Operator { children, .. } => children,
        }
    }

    /// Replace this node with a leaf holding `matrix`
    pub fn resolve(&mut self, matrix: Matrix) {
        *self = OperationNode::Leaf(matrix);
    }

    /// An operator with at least one operand, all of them leaves
    pub fn is_resolvable(&self) -> bool {
        match self {
            OperationNode::Leaf(_) => false,
            OperationNode::Operator { children, .. } => {
                !children.is_empty() && children.iter().all(OperationNode::is_leaf)
            }
        }
    }

    /// First resolvable node in pre-order, or `None` if the tree cannot
    /// make progress (it is a leaf, or every operator is stuck).
    pub fn find_resolvable(&mut self) -> Option<&mut OperationNode> {
        if self.is_resolvable() {
            return Some(self);
        }
        match self {
            OperationNode::Leaf(_) => None,
            OperationNode::Operator { children, .. } => {
                children.iter_mut().find_map(OperationNode::find_resolvable)
            }
        }
    }

    /// Restructure an associative operator with more than two operands into
    /// a binary step: `op(c0, .., cn)` becomes `op(op(c0, .., cn-1), cn)`.
    ///
    /// The nested node is flattened again when it is next found. Operand
    /// order is kept, so non-commutative operators keep their value.
    /// Returns whether the node changed.
    pub fn associative_flatten(&mut self) -> bool {
        let OperationNode::Operator { kind, children } = self else {
            return false;
        };
        if !kind.is_associative() || children.len() <= kind.min_arity() {
            return false;
        }

        let Some(last) = children.pop() else {
            return false;
        };
        let head = std::mem::take(children);
        *children = vec![OperationNode::operator(*kind, head), last];
        true
    }

    /// Check this node's operand count against its operator kind
    pub fn check_arity(&self) -> EngineResult<()> {
        match self {
            OperationNode::Leaf(_) => Ok(()),
            OperationNode::Operator { kind, children } => {
                if kind.accepts(children.len()) {
                    Ok(())
                } else if kind.is_unary() {
                    Err(EngineError::tree(format!(
                        "{} takes exactly one operand, got {}",
                        kind,
                        children.len()
                    )))
                } else {
                    Err(EngineError::tree(format!(
                        "{} needs at least two operands, got {}",
                        kind,
                        children.len()
                    )))
                }
            }
        }
    }

    /// Number of operator nodes in the tree
    pub fn count_operators(&self) -> usize {
        match self {
            OperationNode::Leaf(_) => 0,
            OperationNode::Operator { children, .. } => {
                1 + children
                    .iter()
                    .map(OperationNode::count_operators)
                    .sum::<usize>()
            }
        }
    }

    /// Height of the tree; a leaf has depth 1
    pub fn depth(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(OperationNode::depth)
            .max()
            .unwrap_or(0)
    }
}

impl From<Matrix> for OperationNode {
    fn from(matrix: Matrix) -> Self {
        OperationNode::Leaf(matrix)
    }
}
