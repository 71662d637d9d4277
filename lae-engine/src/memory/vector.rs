// Locked Vector
// One row or column of a shared matrix, guarded by its own reader/writer lock

use crate::error::{EngineError, EngineResult};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// Whether a vector holds a row or a column of its owning matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Row,
    Column,
}

impl Orientation {
    pub fn flipped(self) -> Self {
        match self {
            Orientation::Row => Orientation::Column,
            Orientation::Column => Orientation::Row,
        }
    }
}

/// Values and orientation of a vector.
///
/// Arithmetic lives here rather than on [`LockedVector`]: callers take the
/// lock they need, then operate on the guarded data. That lets a task hold
/// several locks across one composite critical section.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorData {
    values: Vec<f64>,
    orientation: Orientation,
}

impl VectorData {
    pub fn new(values: Vec<f64>, orientation: Orientation) -> Self {
        Self {
            values,
            orientation,
        }
    }

    pub fn get(&self, index: usize) -> EngineResult<f64> {
        self.values.get(index).copied().ok_or(EngineError::Index {
            index,
            len: self.values.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Flip the orientation tag. The data is not reordered.
    pub fn transpose(&mut self) {
        self.orientation = self.orientation.flipped();
    }

    pub fn negate(&mut self) {
        for value in &mut self.values {
            *value = -*value;
        }
    }

    /// Elementwise `self += other`
    pub fn add(&mut self, other: &VectorData) -> EngineResult<()> {
        if self.len() != other.len() {
            return Err(EngineError::shape(
                "vectors must have the same length to add",
                self.len(),
                other.len(),
            ));
        }

        for (value, rhs) in self.values.iter_mut().zip(&other.values) {
            *value += rhs;
        }
        Ok(())
    }

    /// Row vector times column vector
    pub fn dot(&self, other: &VectorData) -> EngineResult<f64> {
        if self.orientation != Orientation::Row || other.orientation != Orientation::Column {
            return Err(EngineError::orientation(
                "dot product requires a row vector on the left and a column vector on the right",
            ));
        }
        if self.len() != other.len() {
            return Err(EngineError::shape(
                "vectors must have the same length for a dot product",
                self.len(),
                other.len(),
            ));
        }

        Ok(self
            .values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| a * b)
            .sum())
    }

    /// Replace this row vector with `self × matrix`.
    ///
    /// `matrix` is the full vector sequence of a matrix, already read-locked
    /// by the caller. Row-oriented input is treated as the matrix's rows;
    /// column-oriented input as its columns. An empty sequence has no
    /// columns, so the product is the empty row.
    pub fn vec_mat_mul<G>(&mut self, matrix: &[G]) -> EngineResult<()>
    where
        G: Deref<Target = VectorData>,
    {
        if self.orientation != Orientation::Row {
            return Err(EngineError::orientation(
                "vector-matrix product requires a row vector",
            ));
        }

        let matrix_orientation = match matrix.first() {
            Some(first) => first.orientation(),
            None => {
                self.values.clear();
                return Ok(());
            }
        };

        let result = match matrix_orientation {
            Orientation::Row => {
                if self.len() != matrix.len() {
                    return Err(EngineError::shape(
                        "vector length must match matrix row count",
                        self.len(),
                        matrix.len(),
                    ));
                }
                let width = matrix.first().map(|row| row.len()).unwrap_or(0);
                let mut result = vec![0.0; width];
                for (i, row) in matrix.iter().enumerate() {
                    if row.len() != width {
                        return Err(EngineError::shape(
                            "matrix rows must have equal length",
                            width,
                            row.len(),
                        ));
                    }
                    let scale = self.values[i];
                    for (out, value) in result.iter_mut().zip(row.values()) {
                        *out += scale * value;
                    }
                }
                result
            }
            Orientation::Column => matrix
                .iter()
                .map(|column| self.dot(column))
                .collect::<EngineResult<Vec<f64>>>()?,
        };

        self.values = result;
        self.orientation = Orientation::Row;
        Ok(())
    }
}

pub type VectorReadGuard<'a> = RwLockReadGuard<'a, VectorData>;
pub type VectorWriteGuard<'a> = RwLockWriteGuard<'a, VectorData>;

/// A vector with an independent reader/writer lock
#[derive(Debug)]
pub struct LockedVector {
    data: RwLock<VectorData>,
}

impl LockedVector {
    pub fn new(values: Vec<f64>, orientation: Orientation) -> Self {
        Self {
            data: RwLock::new(VectorData::new(values, orientation)),
        }
    }

    /// Acquire the read lock; released when the guard drops
    pub fn read(&self) -> VectorReadGuard<'_> {
        self.data.read()
    }

    /// Acquire the write lock; released when the guard drops
    pub fn write(&self) -> VectorWriteGuard<'_> {
        self.data.write()
    }

    /// Write lock if it is free right now
    pub fn try_write(&self) -> Option<VectorWriteGuard<'_>> {
        self.data.try_write()
    }

    /// Read-locked element access
    pub fn get(&self, index: usize) -> EngineResult<f64> {
        self.read().get(index)
    }

    pub fn length(&self) -> usize {
        self.read().len()
    }

    pub fn orientation(&self) -> Orientation {
        self.read().orientation()
    }

    /// Copy of the current values, taken under the read lock
    pub fn snapshot(&self) -> Vec<f64> {
        self.read().values().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::thread;

    fn row(values: &[f64]) -> VectorData {
        VectorData::new(values.to_vec(), Orientation::Row)
    }

    fn column(values: &[f64]) -> VectorData {
        VectorData::new(values.to_vec(), Orientation::Column)
    }

    #[test]
    fn test_get_in_and_out_of_bounds() {
        let vector = LockedVector::new(vec![1.0, 2.0], Orientation::Row);
        assert_eq!(vector.get(1), Ok(2.0));
        assert_eq!(
            vector.get(2),
            Err(EngineError::Index { index: 2, len: 2 })
        );
        assert_eq!(vector.length(), 2);
    }

    #[test]
    fn test_transpose_flips_tag_only() {
        let vector = LockedVector::new(vec![1.0, 2.0, 3.0], Orientation::Row);
        vector.write().transpose();
        assert_eq!(vector.orientation(), Orientation::Column);
        assert_eq!(vector.snapshot(), vec![1.0, 2.0, 3.0]);

        vector.write().transpose();
        assert_eq!(vector.orientation(), Orientation::Row);
    }

    #[test]
    fn test_negate_in_place() {
        let mut data = row(&[3.0, -1.0, 0.0]);
        data.negate();
        assert_eq!(data.values(), &[-3.0, 1.0, -0.0]);
    }

    #[test]
    fn test_add_and_length_mismatch() {
        let mut data = row(&[1.0, 2.0]);
        data.add(&row(&[10.0, 20.0])).unwrap();
        assert_eq!(data.values(), &[11.0, 22.0]);

        let err = data.add(&row(&[1.0])).unwrap_err();
        assert!(matches!(err, EngineError::Shape { left: 2, right: 1, .. }));
        assert_eq!(data.values(), &[11.0, 22.0]);
    }

    #[test]
    fn test_dot_requires_row_times_column() {
        let left = row(&[1.0, 2.0, 3.0]);
        let right = column(&[4.0, 5.0, 6.0]);
        assert_eq!(left.dot(&right), Ok(32.0));

        let err = left.dot(&row(&[4.0, 5.0, 6.0])).unwrap_err();
        assert!(matches!(err, EngineError::Orientation(_)));

        let err = right.dot(&right).unwrap_err();
        assert!(matches!(err, EngineError::Orientation(_)));
    }

    #[test]
    fn test_vec_mat_mul_row_oriented_matrix() {
        // [1 2] × [[5 6] [7 8]] = [19 22]
        let mut data = row(&[1.0, 2.0]);
        let matrix = [row(&[5.0, 6.0]), row(&[7.0, 8.0])];
        let refs: Vec<&VectorData> = matrix.iter().collect();

        data.vec_mat_mul(&refs).unwrap();
        assert_eq!(data.values(), &[19.0, 22.0]);
        assert_eq!(data.orientation(), Orientation::Row);
    }

    #[test]
    fn test_vec_mat_mul_column_oriented_matrix() {
        // Columns of [[7 8] [9 10] [11 12]]
        let mut data = row(&[1.0, 2.0, 3.0]);
        let columns = [column(&[7.0, 9.0, 11.0]), column(&[8.0, 10.0, 12.0])];
        let refs: Vec<&VectorData> = columns.iter().collect();

        data.vec_mat_mul(&refs).unwrap();
        assert_eq!(data.values(), &[58.0, 64.0]);
    }

    #[test]
    fn test_vec_mat_mul_rejects_column_vector_and_bad_shape() {
        let mut data = column(&[1.0, 2.0]);
        let matrix = [row(&[1.0]), row(&[2.0])];
        let refs: Vec<&VectorData> = matrix.iter().collect();
        assert!(matches!(
            data.vec_mat_mul(&refs),
            Err(EngineError::Orientation(_))
        ));

        let mut data = row(&[1.0, 2.0, 3.0]);
        assert!(matches!(
            data.vec_mat_mul(&refs),
            Err(EngineError::Shape { .. })
        ));
        assert_eq!(data.values(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_vec_mat_mul_with_no_columns() {
        let mut data = row(&[1.0, 2.0]);
        let empty: Vec<&VectorData> = Vec::new();

        data.vec_mat_mul(&empty).unwrap();
        assert!(data.is_empty());
        assert_eq!(data.orientation(), Orientation::Row);
    }

    #[test]
    fn test_vec_mat_mul_with_guards() {
        let left = LockedVector::new(vec![1.0, 1.0], Orientation::Row);
        let a = LockedVector::new(vec![2.0, 3.0], Orientation::Row);
        let b = LockedVector::new(vec![4.0, 5.0], Orientation::Row);

        let mut target = left.write();
        let guards = vec![a.read(), b.read()];
        target.vec_mat_mul(&guards).unwrap();
        drop(guards);
        drop(target);

        assert_eq!(left.snapshot(), vec![6.0, 8.0]);
    }

    #[test]
    fn test_concurrent_writers_serialize() {
        let target = Arc::new(LockedVector::new(vec![0.0; 4], Orientation::Row));
        let ones = Arc::new(LockedVector::new(vec![1.0; 4], Orientation::Row));

        thread::scope(|scope| {
            for _ in 0..8 {
                let target = Arc::clone(&target);
                let ones = Arc::clone(&ones);
                scope.spawn(move || {
                    for _ in 0..100 {
                        let mut guard = target.write();
                        let rhs = ones.read();
                        guard.add(&rhs).unwrap();
                    }
                });
            }
        });

        assert_eq!(target.snapshot(), vec![800.0; 4]);
    }
}
