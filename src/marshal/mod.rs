//! Columnar data marshaling across the Python/native boundary
//!
//! This module converts between pyarrow objects and the engine's in-memory
//! Arrow representation:
//! - Record batches and schemas: `batch`
//! - Scalars with target-type coercion: `scalar`
//!
//! Marshaling never mutates source data, and conversions that construct
//! Python objects run with the GIL held. Shape or type errors are raised at
//! the boundary instead of being deferred into query execution.

pub mod batch;
pub mod scalar;

pub use batch::{
    array_from_pyarrow, array_to_pyarrow, batch_from_pyarrow, batches_to_pyarrow,
    partitions_from_pyarrow, schema_to_pyarrow,
};
pub use scalar::{py_to_scalar, py_to_scalar_untyped};
