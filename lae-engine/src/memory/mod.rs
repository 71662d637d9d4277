// Shared Matrix Memory
// Per-vector locked storage used as scratch buffers by the engine

pub mod matrix;
pub mod vector;

pub use matrix::{validate_rectangular, LockedMatrix, VectorSet, VectorSetReadGuard};
pub use vector::{
    LockedVector, Orientation, VectorData, VectorReadGuard, VectorWriteGuard,
};
