//! Function-registration namespace exposed to Python as `jisr.functions`
//!
//! Provides column references, literals, the `udf`/`udaf` factories, and
//! the engine's built-in aggregates.

use arrow::pyarrow::PyArrowType;
use datafusion::arrow::datatypes::DataType;
use datafusion::functions_aggregate::expr_fn;
use datafusion::prelude::{col as df_col, lit as df_lit};
use pyo3::prelude::*;
use pyo3::types::PyModule;

use crate::errors::JisrError;
use crate::expr::PyExpr;
use crate::marshal;
use crate::udf::aggregate::PyAggregateUDF;
use crate::udf::scalar::PyScalarUDF;

/// Reference a column by name.
#[pyfunction]
pub fn col(name: &str) -> PyExpr {
    df_col(name).into()
}

/// Build a literal expression from a Python value.
#[pyfunction]
pub fn lit(value: &Bound<'_, PyAny>) -> PyResult<PyExpr> {
    let scalar = marshal::py_to_scalar_untyped(value)?;
    Ok(df_lit(scalar).into())
}

/// Wrap a Python callable as a scalar UDF.
///
/// `func` receives one pyarrow array per argument and must return a pyarrow
/// array of the declared output type with one row per input row.
#[pyfunction]
#[pyo3(signature = (func, input_types, output_type, volatility="volatile", name=None))]
pub fn udf(
    py: Python<'_>,
    func: PyObject,
    input_types: Vec<PyArrowType<DataType>>,
    output_type: PyArrowType<DataType>,
    volatility: &str,
    name: Option<String>,
) -> PyResult<PyScalarUDF> {
    let name = resolve_name(py, name, &func)?;
    let input_types = input_types.into_iter().map(|t| t.0).collect();
    log::debug!("Creating scalar UDF '{name}'");
    Ok(PyScalarUDF::from_parts(
        name,
        func,
        input_types,
        output_type.0,
        volatility,
    )?)
}

/// Wrap a Python accumulator class as an aggregate UDF.
///
/// `accum` is called with no arguments to create one accumulator per group
/// or partition; instances must expose `update`, `merge`, `state`, and
/// `evaluate`.
#[pyfunction]
#[pyo3(signature = (accum, output_type, state_type, input_types, volatility="volatile", name=None))]
pub fn udaf(
    py: Python<'_>,
    accum: PyObject,
    output_type: PyArrowType<DataType>,
    state_type: Vec<PyArrowType<DataType>>,
    input_types: Vec<PyArrowType<DataType>>,
    volatility: &str,
    name: Option<String>,
) -> PyResult<PyAggregateUDF> {
    let name = resolve_name(py, name, &accum)?;
    let input_types = input_types.into_iter().map(|t| t.0).collect();
    let state_type = state_type.into_iter().map(|t| t.0).collect();
    log::debug!("Creating aggregate UDF '{name}'");
    Ok(PyAggregateUDF::from_parts(
        name,
        accum,
        input_types,
        state_type,
        output_type.0,
        volatility,
    )?)
}

#[pyfunction]
pub fn sum(expr: PyExpr) -> PyExpr {
    expr_fn::sum(expr.expr).into()
}

#[pyfunction]
pub fn count(expr: PyExpr) -> PyExpr {
    expr_fn::count(expr.expr).into()
}

#[pyfunction]
pub fn min(expr: PyExpr) -> PyExpr {
    expr_fn::min(expr.expr).into()
}

#[pyfunction]
pub fn max(expr: PyExpr) -> PyExpr {
    expr_fn::max(expr.expr).into()
}

#[pyfunction]
pub fn avg(expr: PyExpr) -> PyExpr {
    expr_fn::avg(expr.expr).into()
}

/// Default a UDF name from the callable when the caller gave none.
fn resolve_name(
    py: Python<'_>,
    name: Option<String>,
    callable: &PyObject,
) -> Result<String, JisrError> {
    match name {
        Some(name) => Ok(name),
        None => callable
            .bind(py)
            .getattr("__qualname__")
            .and_then(|attr| attr.extract::<String>())
            .map_err(|_| {
                JisrError::invalid_argument(
                    "name is required when the callable has no __qualname__",
                )
            }),
    }
}

/// Register the `functions` submodule on the top-level module.
pub(crate) fn register(parent: &Bound<'_, PyModule>) -> PyResult<()> {
    let module = PyModule::new(parent.py(), "functions")?;
    module.add_function(wrap_pyfunction!(col, &module)?)?;
    module.add_function(wrap_pyfunction!(lit, &module)?)?;
    module.add_function(wrap_pyfunction!(udf, &module)?)?;
    module.add_function(wrap_pyfunction!(udaf, &module)?)?;
    module.add_function(wrap_pyfunction!(sum, &module)?)?;
    module.add_function(wrap_pyfunction!(count, &module)?)?;
    module.add_function(wrap_pyfunction!(min, &module)?)?;
    module.add_function(wrap_pyfunction!(max, &module)?)?;
    module.add_function(wrap_pyfunction!(avg, &module)?)?;
    parent.add_submodule(&module)?;
    Ok(())
}
