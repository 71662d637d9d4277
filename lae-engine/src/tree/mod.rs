// Operation Tree Module
// Matrix values, operator nodes and the algorithms that drive resolution

pub mod matrix;
pub mod node;
pub mod shape;

pub use matrix::Matrix;
pub use node::{OperationNode, OperatorKind};
pub use shape::Shape;
