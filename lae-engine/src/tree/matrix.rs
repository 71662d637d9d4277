// Matrix Value
// Immutable row-major matrix handed between the parser, the tree and the result sink

use crate::error::EngineResult;
use crate::memory::validate_rectangular;

use serde::{Deserialize, Serialize};

/// Row-major matrix value.
///
/// Rows are not checked for equal length on construction. Raggedness is a
/// validation error raised when the matrix is loaded into shared memory.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Matrix {
    rows: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<f64>> {
        self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Length of the first row; 0 for a matrix without rows
    pub fn column_count(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    /// `(rows, columns)` after checking the matrix is rectangular
    pub fn shape(&self) -> EngineResult<(usize, usize)> {
        let columns = validate_rectangular(&self.rows)?;
        Ok((self.rows.len(), columns))
    }
}

impl From<Vec<Vec<f64>>> for Matrix {
    fn from(rows: Vec<Vec<f64>>) -> Self {
        Self::from_rows(rows)
    }
}
