//! Aggregate UDF adapter tests
//!
//! The engine decides partitioning; the adapter only has to keep the
//! update/merge/evaluate cycle faithful. Partitioned and unpartitioned
//! runs of the same accumulator must agree.

mod common;

use arrow::pyarrow::PyArrowType;
use common::*;
use datafusion::arrow::array::Int64Array;
use datafusion::arrow::record_batch::RecordBatch;
use jisr::functions::{col, udaf};
use jisr::{PyAggregateUDF, PySessionConfig, PySessionContext};
use pyo3::ffi::c_str;
use pyo3::prelude::*;
use pyo3::types::PyModule;

const UDAF_HELPERS: &std::ffi::CStr = c_str!(
    r#"
import pyarrow.compute as pc

class SumAccumulator:
    def __init__(self):
        self.total = 0

    def update(self, values):
        partial = pc.sum(values).as_py()
        if partial is not None:
            self.total += partial

    def merge(self, states):
        partial = pc.sum(states).as_py()
        if partial is not None:
            self.total += partial

    def state(self):
        return [self.total]

    def evaluate(self):
        return self.total


class BrokenStateAccumulator(SumAccumulator):
    def state(self):
        return [self.total, 0]
"#
);

fn helpers<'py>(py: Python<'py>) -> Bound<'py, PyModule> {
    PyModule::from_code(
        py,
        UDAF_HELPERS,
        c_str!("udaf_helpers.py"),
        c_str!("udaf_helpers"),
    )
    .unwrap()
}

fn sum_udaf(py: Python<'_>, class_name: &str, udf_name: &str) -> PyAggregateUDF {
    let helpers = helpers(py);
    udaf(
        py,
        helpers.getattr(class_name).unwrap().unbind(),
        PyArrowType(datafusion::arrow::datatypes::DataType::Int64),
        vec![PyArrowType(datafusion::arrow::datatypes::DataType::Int64)],
        vec![PyArrowType(datafusion::arrow::datatypes::DataType::Int64)],
        "stable",
        Some(udf_name.to_string()),
    )
    .unwrap()
}

fn total_with_partitions(
    py: Python<'_>,
    partitions: &[Vec<RecordBatch>],
    target_partitions: usize,
) -> i64 {
    let config = PySessionConfig::new().with_target_partitions(target_partitions);
    let ctx = PySessionContext::new(Some(config));
    let py_parts = py_partitions(py, partitions);
    let df = ctx.create_dataframe(py, &py_parts, None).unwrap();

    let acc = sum_udaf(py, "SumAccumulator", "py_sum");
    let aggregated = df
        .aggregate(vec![], vec![acc.__call__(vec![col("a")]).alias("total")])
        .unwrap();
    let batches = batches_from_py(py, &aggregated.collect(py).unwrap());
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].num_rows(), 1);
    batches[0]
        .column(0)
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap()
        .value(0)
}

#[test]
fn test_merge_matches_unpartitioned_result() {
    init_logging();
    Python::with_gil(|py| {
        if !pyarrow_ready(py) {
            return;
        }
        let b1 = int_batch(&[1, 2, 3], &[0, 0, 0]);
        let b2 = int_batch(&[4, 5], &[0, 0]);
        let b3 = int_batch(&[6, 7, 8, 9], &[0, 0, 0, 0]);

        // Parallel partitions force the state/merge path; a single
        // partition aggregates with update/evaluate alone.
        let partitioned = total_with_partitions(
            py,
            &[vec![b1.clone()], vec![b2.clone()], vec![b3.clone()]],
            3,
        );
        let unpartitioned = total_with_partitions(py, &[vec![b1, b2, b3]], 1);

        assert_eq!(partitioned, 45);
        assert_eq!(partitioned, unpartitioned);
    });
}

#[test]
fn test_grouped_aggregation() {
    Python::with_gil(|py| {
        if !pyarrow_ready(py) {
            return;
        }
        let ctx = single_partition_context();
        let partitions = py_partitions(py, &[vec![int_batch(&[1, 2, 3, 4], &[1, 1, 2, 2])]]);
        let df = ctx.create_dataframe(py, &partitions, None).unwrap();

        let acc = sum_udaf(py, "SumAccumulator", "py_sum_grouped");
        let aggregated = df
            .aggregate(
                vec![col("b")],
                vec![acc.__call__(vec![col("a")]).alias("total")],
            )
            .unwrap();
        let sorted = aggregated.sort(vec![col("b").sort(true, false)]).unwrap();
        let batches = batches_from_py(py, &sorted.collect(py).unwrap());

        let totals: Vec<i64> = batches
            .iter()
            .flat_map(|batch| {
                batch
                    .column(1)
                    .as_any()
                    .downcast_ref::<Int64Array>()
                    .unwrap()
                    .iter()
                    .flatten()
                    .collect::<Vec<_>>()
            })
            .collect();
        assert_eq!(totals, vec![3, 7]);
    });
}

#[test]
fn test_state_arity_mismatch_is_an_error() {
    Python::with_gil(|py| {
        if !pyarrow_ready(py) {
            return;
        }
        // Two partitions so the engine has to serialize partial states.
        let config = PySessionConfig::new().with_target_partitions(2);
        let ctx = PySessionContext::new(Some(config));
        let partitions = py_partitions(
            py,
            &[vec![int_batch(&[1], &[0])], vec![int_batch(&[2], &[0])]],
        );
        let df = ctx.create_dataframe(py, &partitions, None).unwrap();

        let acc = sum_udaf(py, "BrokenStateAccumulator", "py_sum_broken");
        let aggregated = df
            .aggregate(vec![], vec![acc.__call__(vec![col("a")])])
            .unwrap();

        let err = aggregated.collect(py).unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.contains("state"), "got: {rendered}");
    });
}
