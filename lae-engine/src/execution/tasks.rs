// Row Tasks
// Per-row units of work for each operator, carrying exactly the vector handles they may touch

use crate::error::{EngineError, EngineResult};
use crate::memory::{LockedMatrix, LockedVector, VectorSet, VectorSetReadGuard};
use crate::tree::OperatorKind;

use std::sync::{Arc, OnceLock};

/// Destination rows of a transpose, each written exactly once.
///
/// The buffer is private to one resolution step. It is installed into the
/// left matrix only after every task of the step has finished.
#[derive(Debug)]
pub struct TransposeBuffer {
    slots: Vec<OnceLock<Vec<f64>>>,
}

impl TransposeBuffer {
    pub fn new(rows: usize) -> Self {
        Self {
            slots: (0..rows).map(|_| OnceLock::new()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Store destination row `index`
    pub fn fill(&self, index: usize, values: Vec<f64>) -> EngineResult<()> {
        let slot = self.slots.get(index).ok_or(EngineError::Index {
            index,
            len: self.slots.len(),
        })?;
        slot.set(values).map_err(|_| {
            EngineError::misuse(format!("transpose row {} was written twice", index))
        })
    }

    /// Copy out every row; fails if any slot is still empty
    pub fn rows(&self) -> EngineResult<Vec<Vec<f64>>> {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.get().cloned().ok_or_else(|| {
                    EngineError::misuse(format!("transpose row {} was never written", index))
                })
            })
            .collect()
    }
}

/// One row-granular unit of work
#[derive(Debug)]
pub enum RowTask {
    /// `target += source`
    Add {
        row: usize,
        target: Arc<LockedVector>,
        source: Arc<LockedVector>,
    },
    /// `target = target × right`
    Multiply {
        row: usize,
        target: Arc<LockedVector>,
        right: VectorSet,
    },
    /// `target = -target`
    Negate {
        row: usize,
        target: Arc<LockedVector>,
    },
    /// Gather element `column` of every source row into `output[column]`
    Transpose {
        column: usize,
        source: VectorSet,
        output: Arc<TransposeBuffer>,
    },
}

impl RowTask {
    /// Row (or destination row) index this task produces
    pub fn index(&self) -> usize {
        match self {
            RowTask::Add { row, .. } | RowTask::Multiply { row, .. } | RowTask::Negate { row, .. } => {
                *row
            }
            RowTask::Transpose { column, .. } => *column,
        }
    }

    pub fn run(self) -> EngineResult<()> {
        match self {
            RowTask::Add { target, source, .. } => {
                // left before right; no task touches two rows of one matrix
                let mut target = target.write();
                let source = source.read();
                target.add(&source)
            }
            RowTask::Multiply { target, right, .. } => {
                let mut target = target.write();
                let right = VectorSetReadGuard::acquire(&right);
                target.vec_mat_mul(right.as_slice())
            }
            RowTask::Negate { target, .. } => {
                target.write().negate();
                Ok(())
            }
            RowTask::Transpose {
                column,
                source,
                output,
            } => {
                let mut gathered = Vec::with_capacity(source.len());
                for vector in source.iter() {
                    gathered.push(vector.get(column)?);
                }
                output.fill(column, gathered)
            }
        }
    }
}

/// Tasks for one resolution step plus any output that must be installed
/// after they have all finished
#[derive(Debug)]
pub struct TaskBatch {
    pub kind: OperatorKind,
    pub tasks: Vec<RowTask>,
    pub transpose_output: Option<Arc<TransposeBuffer>>,
}

impl TaskBatch {
    /// Build the batch for `kind` over the loaded scratch buffers.
    ///
    /// `inner` is the row count of the right operand of a multiply, which
    /// column-major storage cannot recover when that operand has no
    /// columns. Preconditions are checked before any task exists.
    pub fn build(
        kind: OperatorKind,
        left: &LockedMatrix,
        right: &LockedMatrix,
        inner: usize,
    ) -> EngineResult<Self> {
        match kind {
            OperatorKind::Add => Self::add(left, right),
            OperatorKind::Multiply => Self::multiply(left, right, inner),
            OperatorKind::Negate => Ok(Self::negate(left)),
            OperatorKind::Transpose => Ok(Self::transpose(left)),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Elementwise sum, one task per row
    pub fn add(left: &LockedMatrix, right: &LockedMatrix) -> EngineResult<Self> {
        if left.length() != right.length() {
            return Err(EngineError::shape(
                "add operands must have the same row count",
                left.length(),
                right.length(),
            ));
        }
        if left.orientation() != right.orientation() {
            return Err(EngineError::orientation(
                "add operands must share one orientation",
            ));
        }
        if left.vector_length() != right.vector_length() {
            return Err(EngineError::shape(
                "add operands must have the same column count",
                left.vector_length(),
                right.vector_length(),
            ));
        }

        let tasks = left
            .vectors()
            .iter()
            .zip(right.vectors().iter())
            .enumerate()
            .map(|(row, (target, source))| RowTask::Add {
                row,
                target: Arc::clone(target),
                source: Arc::clone(source),
            })
            .collect();

        Ok(Self {
            kind: OperatorKind::Add,
            tasks,
            transpose_output: None,
        })
    }

    /// Row-times-matrix product, one task per left row. `right` must hold
    /// the right operand's columns.
    pub fn multiply(left: &LockedMatrix, right: &LockedMatrix, inner: usize) -> EngineResult<Self> {
        if left.vector_length() != inner {
            return Err(EngineError::shape(
                "left column count must equal right row count",
                left.vector_length(),
                inner,
            ));
        }
        if !right.is_empty() && right.vector_length() != inner {
            return Err(EngineError::shape(
                "right operand columns must have one entry per row",
                right.vector_length(),
                inner,
            ));
        }

        let columns = right.vectors();
        let tasks = left
            .vectors()
            .iter()
            .enumerate()
            .map(|(row, target)| RowTask::Multiply {
                row,
                target: Arc::clone(target),
                right: Arc::clone(&columns),
            })
            .collect();

        Ok(Self {
            kind: OperatorKind::Multiply,
            tasks,
            transpose_output: None,
        })
    }

    /// Elementwise sign flip, one task per row
    pub fn negate(left: &LockedMatrix) -> Self {
        let tasks = left
            .vectors()
            .iter()
            .enumerate()
            .map(|(row, target)| RowTask::Negate {
                row,
                target: Arc::clone(target),
            })
            .collect();

        Self {
            kind: OperatorKind::Negate,
            tasks,
            transpose_output: None,
        }
    }

    /// One task per destination row, writing into a private buffer
    pub fn transpose(left: &LockedMatrix) -> Self {
        let source = left.vectors();
        let columns = left.vector_length();
        let output = Arc::new(TransposeBuffer::new(columns));

        let tasks = (0..columns)
            .map(|column| RowTask::Transpose {
                column,
                source: Arc::clone(&source),
                output: Arc::clone(&output),
            })
            .collect();

        Self {
            kind: OperatorKind::Transpose,
            tasks,
            transpose_output: Some(output),
        }
    }
}
