//! Record batch, array, and schema conversions
//!
//! All conversions go through the pyarrow interchange implemented by the
//! `arrow` crate, so buffers are shared where the format allows it and
//! copied where it does not. The engine side always ends up owning plain
//! `RecordBatch`/`ArrayRef` values whose lifetime is independent of the
//! Python objects they came from.

use arrow::pyarrow::{FromPyArrow, ToPyArrow};
use datafusion::arrow::array::{make_array, ArrayData, ArrayRef};
use datafusion::arrow::datatypes::{Schema, SchemaRef};
use datafusion::arrow::record_batch::RecordBatch;
use pyo3::prelude::*;
use pyo3::types::PyList;

use crate::errors::JisrError;

/// Convert a pyarrow record batch into an engine record batch.
pub fn batch_from_pyarrow(batch: &Bound<'_, PyAny>) -> Result<RecordBatch, JisrError> {
    Ok(RecordBatch::from_pyarrow_bound(batch)?)
}

/// Convert collected engine batches into pyarrow record batches.
///
/// Runs after native computation has completed; the caller holds the GIL
/// for the duration because Python objects are constructed here.
pub fn batches_to_pyarrow(
    py: Python<'_>,
    batches: &[RecordBatch],
) -> Result<Vec<PyObject>, JisrError> {
    batches.iter().map(|batch| Ok(batch.to_pyarrow(py)?)).collect()
}

/// Convert a list of partitions (each a sequence of pyarrow record batches)
/// into engine partitions, validating that every batch shares one schema.
pub fn partitions_from_pyarrow(
    partitions: &Bound<'_, PyList>,
) -> Result<(SchemaRef, Vec<Vec<RecordBatch>>), JisrError> {
    let mut schema: Option<SchemaRef> = None;
    let mut converted: Vec<Vec<RecordBatch>> = Vec::with_capacity(partitions.len());

    for partition in partitions.iter() {
        let mut batches = Vec::new();
        for item in partition.try_iter()? {
            let batch = batch_from_pyarrow(&item?)?;
            match &schema {
                None => schema = Some(batch.schema()),
                Some(expected) if **expected != *batch.schema() => {
                    return Err(JisrError::invalid_argument(
                        "all record batches must share the same schema",
                    ));
                }
                Some(_) => {}
            }
            batches.push(batch);
        }
        converted.push(batches);
    }

    let schema = schema.ok_or_else(|| {
        JisrError::invalid_argument("at least one record batch is required")
    })?;
    Ok((schema, converted))
}

/// Convert an engine array into a pyarrow array.
pub fn array_to_pyarrow(py: Python<'_>, array: &ArrayRef) -> Result<PyObject, JisrError> {
    Ok(array.to_data().to_pyarrow(py)?)
}

/// Convert a pyarrow array into an engine array, preserving its declared type.
pub fn array_from_pyarrow(value: &Bound<'_, PyAny>) -> Result<ArrayRef, JisrError> {
    let data = ArrayData::from_pyarrow_bound(value)?;
    Ok(make_array(data))
}

/// Convert an engine schema into a pyarrow schema.
pub fn schema_to_pyarrow(py: Python<'_>, schema: &Schema) -> Result<PyObject, JisrError> {
    Ok(schema.to_pyarrow(py)?)
}
