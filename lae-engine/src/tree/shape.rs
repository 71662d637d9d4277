// Shape Inference
// Computes the result shape of an operation tree without executing it

use crate::error::{EngineError, EngineResult};
use crate::tree::node::{OperationNode, OperatorKind};

/// `(rows, columns)` of a matrix value
pub type Shape = (usize, usize);

impl OperationNode {
    /// Shape the tree resolves to, or the error resolving it would raise.
    ///
    /// A matrix without rows has no observable column count, so any shape
    /// with zero rows is reported as `(0, 0)`.
    pub fn infer_shape(&self) -> EngineResult<Shape> {
        match self {
            OperationNode::Leaf(matrix) => matrix.shape().map(normalize),
            OperationNode::Operator { kind, children } => {
                self.check_arity()?;
                let shapes = children
                    .iter()
                    .map(OperationNode::infer_shape)
                    .collect::<EngineResult<Vec<Shape>>>()?;
                combine(*kind, &shapes)
            }
        }
    }
}

fn combine(kind: OperatorKind, shapes: &[Shape]) -> EngineResult<Shape> {
    let Some((&first, rest)) = shapes.split_first() else {
        return Err(EngineError::tree(format!("{} has no operands", kind)));
    };

    match kind {
        OperatorKind::Negate => Ok(first),
        OperatorKind::Transpose => Ok(normalize((first.1, first.0))),
        OperatorKind::Add => {
            for &shape in rest {
                if shape.0 != first.0 {
                    return Err(EngineError::shape(
                        "add operands must have the same row count",
                        first.0,
                        shape.0,
                    ));
                }
                if shape.1 != first.1 {
                    return Err(EngineError::shape(
                        "add operands must have the same column count",
                        first.1,
                        shape.1,
                    ));
                }
            }
            Ok(first)
        }
        OperatorKind::Multiply => rest.iter().try_fold(first, |acc, &shape| {
            if acc.1 != shape.0 {
                return Err(EngineError::shape(
                    "left column count must equal right row count",
                    acc.1,
                    shape.0,
                ));
            }
            Ok(normalize((acc.0, shape.1)))
        }),
    }
}

fn normalize(shape: Shape) -> Shape {
    if shape.0 == 0 {
        (0, 0)
    } else {
        shape
    }
}
