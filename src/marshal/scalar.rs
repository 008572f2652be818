//! Scalar conversions between Python values and engine scalars
//!
//! Aggregate accumulator state and evaluation results cross the boundary as
//! single values. The engine side is always a `ScalarValue` with a concrete
//! type; the Python side may hand back a plain Python value or a pyarrow
//! scalar, so conversion goes through `pyarrow.scalar` for coercion and a
//! cast for pyarrow scalars whose type does not already match.

use arrow::pyarrow::{FromPyArrow, ToPyArrow};
use datafusion::arrow::datatypes::DataType;
use datafusion::scalar::ScalarValue;
use pyo3::prelude::*;
use pyo3::types::PyModule;

use crate::errors::JisrError;

/// Convert a Python value into a `ScalarValue` of the given target type.
///
/// Values the target type cannot represent fail immediately with a type
/// mismatch naming both sides.
pub fn py_to_scalar(
    value: &Bound<'_, PyAny>,
    data_type: &DataType,
) -> Result<ScalarValue, JisrError> {
    let py = value.py();
    if value.is_none() {
        // Typed null, so downstream kernels keep the declared type.
        return Ok(ScalarValue::try_from(data_type)?);
    }

    let scalar = if is_pyarrow_scalar(value)? {
        ScalarValue::from_pyarrow_bound(value)?
    } else {
        let pyarrow = PyModule::import(py, "pyarrow")?;
        let target = data_type.to_pyarrow(py)?;
        let wrapped = match pyarrow.call_method1("scalar", (value, target)) {
            Ok(wrapped) => wrapped,
            Err(_) => {
                let actual = value.get_type().name()?.to_string();
                return Err(JisrError::type_mismatch(data_type.to_string(), actual));
            }
        };
        ScalarValue::from_pyarrow_bound(&wrapped)?
    };

    if scalar.data_type() == *data_type {
        Ok(scalar)
    } else {
        scalar.cast_to(data_type).map_err(|_| {
            JisrError::type_mismatch(data_type.to_string(), scalar.data_type().to_string())
        })
    }
}

/// Convert a Python value into a `ScalarValue`, letting pyarrow infer the type.
///
/// Used for literals, where the caller declared no target type.
pub fn py_to_scalar_untyped(value: &Bound<'_, PyAny>) -> Result<ScalarValue, JisrError> {
    let py = value.py();
    if value.is_none() {
        return Ok(ScalarValue::Null);
    }
    if is_pyarrow_scalar(value)? {
        return Ok(ScalarValue::from_pyarrow_bound(value)?);
    }
    let pyarrow = PyModule::import(py, "pyarrow")?;
    let wrapped = pyarrow.call_method1("scalar", (value,)).map_err(|_| {
        let type_name = value
            .get_type()
            .name()
            .map(|name| name.to_string())
            .unwrap_or_else(|_| "<unknown>".to_string());
        JisrError::invalid_argument(format!(
            "cannot build a literal from Python type '{type_name}'"
        ))
    })?;
    Ok(ScalarValue::from_pyarrow_bound(&wrapped)?)
}

fn is_pyarrow_scalar(value: &Bound<'_, PyAny>) -> Result<bool, JisrError> {
    let pyarrow = PyModule::import(value.py(), "pyarrow")?;
    let scalar_type = pyarrow.getattr("Scalar")?;
    Ok(value.is_instance(&scalar_type)?)
}
