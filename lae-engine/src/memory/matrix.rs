// Locked Matrix
// Ordered sequence of independently locked vectors sharing one orientation

use crate::error::{EngineError, EngineResult};
use crate::memory::vector::{LockedVector, Orientation, VectorReadGuard};

use parking_lot::RwLock;
use std::sync::Arc;

/// Shared vector sequence of a [`LockedMatrix`]
pub type VectorSet = Arc<[Arc<LockedVector>]>;

/// Matrix storage with one lock per vector and no whole-matrix lock.
///
/// Reloading swaps the entire vector sequence. The swap is not covered by
/// any vector lock, so callers must only reload while no task holds a lock
/// on the current vectors.
#[derive(Debug)]
pub struct LockedMatrix {
    vectors: RwLock<VectorSet>,
}

impl Default for LockedMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl LockedMatrix {
    /// Create an empty matrix
    pub fn new() -> Self {
        Self {
            vectors: RwLock::new(Arc::from(Vec::new())),
        }
    }

    /// Create a row-oriented matrix from rows
    pub fn from_rows(rows: &[Vec<f64>]) -> EngineResult<Self> {
        let matrix = Self::new();
        matrix.load_row_major(rows)?;
        Ok(matrix)
    }

    /// Replace the contents with `rows`, one row vector per input row
    pub fn load_row_major(&self, rows: &[Vec<f64>]) -> EngineResult<()> {
        validate_rectangular(rows)?;

        let vectors: Vec<Arc<LockedVector>> = rows
            .iter()
            .map(|row| Arc::new(LockedVector::new(row.clone(), Orientation::Row)))
            .collect();
        self.install(vectors);
        Ok(())
    }

    /// Replace the contents with the columns of `rows`, one column vector each
    pub fn load_column_major(&self, rows: &[Vec<f64>]) -> EngineResult<()> {
        let width = validate_rectangular(rows)?;

        let vectors: Vec<Arc<LockedVector>> = (0..width)
            .map(|j| {
                let column = rows.iter().map(|row| row[j]).collect();
                Arc::new(LockedVector::new(column, Orientation::Column))
            })
            .collect();
        self.install(vectors);
        Ok(())
    }

    fn install(&self, vectors: Vec<Arc<LockedVector>>) {
        *self.vectors.write() = Arc::from(vectors);
    }

    /// Snapshot of the contents in row-major form.
    ///
    /// Each vector is read-locked only while it is copied, so the snapshot
    /// is consistent per vector but not across the whole matrix.
    pub fn read_row_major(&self) -> Vec<Vec<f64>> {
        let vectors = self.vectors();
        let mut orientation = Orientation::Row;
        let mut copied = Vec::with_capacity(vectors.len());

        for vector in vectors.iter() {
            let guard = vector.read();
            orientation = guard.orientation();
            copied.push(guard.values().to_vec());
        }

        match orientation {
            Orientation::Row => copied,
            Orientation::Column => transpose_rows(&copied),
        }
    }

    /// Handle to the vector at `index`
    pub fn get(&self, index: usize) -> EngineResult<Arc<LockedVector>> {
        let vectors = self.vectors.read();
        vectors.get(index).cloned().ok_or(EngineError::Index {
            index,
            len: vectors.len(),
        })
    }

    /// Current vector sequence. Handles stay valid across a reload.
    pub fn vectors(&self) -> VectorSet {
        Arc::clone(&self.vectors.read())
    }

    /// Number of vectors
    pub fn length(&self) -> usize {
        self.vectors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    /// Length of each vector (0 for an empty matrix)
    pub fn vector_length(&self) -> usize {
        self.vectors
            .read()
            .first()
            .map(|v| v.length())
            .unwrap_or(0)
    }

    /// Orientation of vector 0; an empty matrix is row-oriented
    pub fn orientation(&self) -> Orientation {
        self.vectors
            .read()
            .first()
            .map(|v| v.orientation())
            .unwrap_or_default()
    }
}

/// Read locks on every vector of a set, acquired in ascending index order
/// and released in descending order when dropped.
pub struct VectorSetReadGuard<'a> {
    guards: Vec<VectorReadGuard<'a>>,
}

impl<'a> VectorSetReadGuard<'a> {
    pub fn acquire(vectors: &'a [Arc<LockedVector>]) -> Self {
        let mut guards = Vec::with_capacity(vectors.len());
        for vector in vectors {
            guards.push(vector.read());
        }
        Self { guards }
    }

    pub fn as_slice(&self) -> &[VectorReadGuard<'a>] {
        &self.guards
    }
}

impl Drop for VectorSetReadGuard<'_> {
    fn drop(&mut self) {
        while let Some(guard) = self.guards.pop() {
            drop(guard);
        }
    }
}

/// Check that all rows have the same length and return that length
pub fn validate_rectangular(rows: &[Vec<f64>]) -> EngineResult<usize> {
    let width = rows.first().map(Vec::len).unwrap_or(0);
    for (i, pair) in rows.windows(2).enumerate() {
        if pair[1].len() != pair[0].len() {
            return Err(EngineError::validation(format!(
                "rows {} and {} must have the same length ({} != {})",
                i + 1,
                i,
                pair[1].len(),
                pair[0].len()
            )));
        }
    }
    Ok(width)
}

fn transpose_rows(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let width = rows.first().map(Vec::len).unwrap_or(0);
    (0..width)
        .map(|j| rows.iter().map(|row| row[j]).collect())
        .collect()
}
