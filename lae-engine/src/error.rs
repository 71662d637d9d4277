// Engine Error Types
// Single error taxonomy shared by storage, scheduling, tree resolution and orchestration

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Broad category of an [`EngineError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Ragged input, shape or orientation mismatch between operands
    Validation,
    /// Out-of-range vector or matrix access
    Index,
    /// A scheduler invariant was violated (e.g. double delivery to a worker)
    ConcurrencyMisuse,
    /// The operation tree cannot make progress
    TreeResolution,
    /// A blocking call was cut short by shutdown or a dead worker
    Interrupted,
    /// A submitted task panicked
    Task,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("shape error: {message} (left {left}, right {right})")]
    Shape {
        message: String,
        left: usize,
        right: usize,
    },

    #[error("orientation error: {0}")]
    Orientation(String),

    #[error("index {index} out of bounds for length {len}")]
    Index { index: usize, len: usize },

    #[error("concurrency misuse: {0}")]
    ConcurrencyMisuse(String),

    #[error("tree resolution error: {0}")]
    TreeResolution(String),

    #[error("interrupted: {0}")]
    Interrupted(String),

    #[error("task panicked: {0}")]
    TaskPanicked(String),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn shape(message: impl Into<String>, left: usize, right: usize) -> Self {
        Self::Shape {
            message: message.into(),
            left,
            right,
        }
    }

    pub fn orientation(message: impl Into<String>) -> Self {
        Self::Orientation(message.into())
    }

    pub fn misuse(message: impl Into<String>) -> Self {
        Self::ConcurrencyMisuse(message.into())
    }

    pub fn tree(message: impl Into<String>) -> Self {
        Self::TreeResolution(message.into())
    }

    pub fn interrupted(message: impl Into<String>) -> Self {
        Self::Interrupted(message.into())
    }

    /// Category this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::Shape { .. } | Self::Orientation(_) => {
                ErrorKind::Validation
            }
            Self::Index { .. } => ErrorKind::Index,
            Self::ConcurrencyMisuse(_) => ErrorKind::ConcurrencyMisuse,
            Self::TreeResolution(_) => ErrorKind::TreeResolution,
            Self::Interrupted(_) => ErrorKind::Interrupted,
            Self::TaskPanicked(_) => ErrorKind::Task,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}
