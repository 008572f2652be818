//! Shared helpers for integration tests
//!
//! Tests that marshal data need a Python interpreter with pyarrow
//! importable; they skip themselves when it is not. Pure plan-construction
//! paths are covered by unit tests next to the code.
#![allow(dead_code)]

use std::sync::Arc;

use arrow::pyarrow::{FromPyArrow, ToPyArrow};
use datafusion::arrow::array::{ArrayRef, Int64Array};
use datafusion::arrow::datatypes::{DataType, Field, Schema};
use datafusion::arrow::record_batch::RecordBatch;
use pyo3::prelude::*;
use pyo3::types::{PyList, PyModule};

use jisr::{PySessionConfig, PySessionContext};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Skip guard for tests that need pyarrow on the Python side.
pub fn pyarrow_ready(py: Python<'_>) -> bool {
    PyModule::import(py, "pyarrow").is_ok()
}

/// Two-column Int64 batch with columns `a` and `b`.
pub fn int_batch(a: &[i64], b: &[i64]) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("a", DataType::Int64, false),
        Field::new("b", DataType::Int64, false),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(a.to_vec())) as ArrayRef,
            Arc::new(Int64Array::from(b.to_vec())) as ArrayRef,
        ],
    )
    .unwrap()
}

/// Convert engine batches into the nested pyarrow partition list the
/// context APIs take.
pub fn py_partitions<'py>(
    py: Python<'py>,
    partitions: &[Vec<RecordBatch>],
) -> Bound<'py, PyList> {
    let converted: Vec<Bound<'py, PyList>> = partitions
        .iter()
        .map(|batches| {
            let objects: Vec<PyObject> = batches
                .iter()
                .map(|batch| batch.to_pyarrow(py).unwrap())
                .collect();
            PyList::new(py, objects).unwrap()
        })
        .collect();
    PyList::new(py, converted).unwrap()
}

/// Context pinned to one partition, so batch counts stay deterministic.
pub fn single_partition_context() -> PySessionContext {
    let config = PySessionConfig::new().with_target_partitions(1);
    PySessionContext::new(Some(config))
}

/// Convert collected pyarrow batches back into engine batches.
pub fn batches_from_py(py: Python<'_>, collected: &[PyObject]) -> Vec<RecordBatch> {
    collected
        .iter()
        .map(|batch| RecordBatch::from_pyarrow_bound(batch.bind(py)).unwrap())
        .collect()
}

/// Sum an Int64 column across collected batches.
pub fn sum_int64_column(batches: &[RecordBatch], column: usize) -> i64 {
    batches
        .iter()
        .map(|batch| {
            let array = batch
                .column(column)
                .as_any()
                .downcast_ref::<Int64Array>()
                .unwrap();
            array.iter().flatten().sum::<i64>()
        })
        .sum()
}
