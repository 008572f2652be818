//! Scalar UDF adapter
//!
//! Wraps a Python callable of signature (array-like, ...) -> array-like so
//! the engine can invoke it during expression evaluation. The engine calls
//! the adapter once per input batch. Each invocation:
//!
//! 1. normalizes the incoming columnar values to arrays,
//! 2. acquires the GIL and marshals the arrays to pyarrow,
//! 3. invokes the Python callable,
//! 4. marshals the returned array back to a native array,
//! 5. enforces the declared output type and the input row count.
//!
//! A Python exception aborts the invocation with an execution error that
//! carries the original Python message.

use std::any::Any;

use arrow::pyarrow::PyArrowType;
use datafusion::arrow::array::ArrayRef;
use datafusion::arrow::datatypes::DataType;
use datafusion::error::{DataFusionError, Result as DataFusionResult};
use datafusion::logical_expr::{
    ColumnarValue, ScalarFunctionArgs, ScalarUDF, ScalarUDFImpl, Signature, Volatility,
};
use pyo3::prelude::*;
use pyo3::types::PyTuple;

use crate::errors::JisrError;
use crate::expr::PyExpr;
use crate::marshal;
use crate::udf::volatility_from_str;

/// Engine-side implementation backed by a Python callable
#[derive(Debug)]
struct PythonScalarFn {
    name: String,
    func: PyObject,
    signature: Signature,
    output_type: DataType,
}

impl PythonScalarFn {
    fn new(
        name: String,
        func: PyObject,
        input_types: Vec<DataType>,
        output_type: DataType,
        volatility: Volatility,
    ) -> Self {
        Self {
            name,
            func,
            signature: Signature::exact(input_types, volatility),
            output_type,
        }
    }

    /// Run the Python callable over one batch of argument arrays.
    fn call_python(&self, arrays: &[ArrayRef]) -> Result<ArrayRef, JisrError> {
        Python::with_gil(|py| {
            let py_args = arrays
                .iter()
                .map(|array| marshal::array_to_pyarrow(py, array))
                .collect::<Result<Vec<_>, JisrError>>()?;
            let py_args = PyTuple::new(py, py_args).map_err(JisrError::from)?;
            let result = self.func.bind(py).call1(py_args)?;
            marshal::array_from_pyarrow(&result)
        })
    }
}

impl ScalarUDFImpl for PythonScalarFn {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn return_type(&self, _arg_types: &[DataType]) -> DataFusionResult<DataType> {
        Ok(self.output_type.clone())
    }

    fn invoke_with_args(&self, args: ScalarFunctionArgs) -> DataFusionResult<ColumnarValue> {
        let number_rows = args.number_rows;
        let arrays = ColumnarValue::values_to_arrays(&args.args)?;

        let result = self.call_python(&arrays).map_err(|err| {
            DataFusionError::Execution(format!("Scalar UDF '{}' failed: {err}", self.name))
        })?;

        // The declared output type is part of the plan's schema; an array of
        // any other type must not leak into execution.
        if result.data_type() != &self.output_type {
            return Err(DataFusionError::Execution(format!(
                "Scalar UDF '{}' returned an array of type {} but declared {}",
                self.name,
                result.data_type(),
                self.output_type
            )));
        }
        if result.len() != number_rows {
            return Err(DataFusionError::Execution(format!(
                "Scalar UDF '{}' returned {} rows for a batch of {number_rows}",
                self.name,
                result.len()
            )));
        }
        Ok(ColumnarValue::Array(result))
    }
}

/// Python handle for a registered scalar UDF
#[pyclass(name = "ScalarUDF", module = "jisr")]
#[derive(Debug, Clone)]
pub struct PyScalarUDF {
    pub(crate) function: ScalarUDF,
}

impl PyScalarUDF {
    /// Build the engine UDF from already-parsed parts.
    pub(crate) fn from_parts(
        name: String,
        func: PyObject,
        input_types: Vec<DataType>,
        output_type: DataType,
        volatility: &str,
    ) -> Result<Self, JisrError> {
        let volatility = volatility_from_str(volatility)?;
        let function = ScalarUDF::new_from_impl(PythonScalarFn::new(
            name,
            func,
            input_types,
            output_type,
            volatility,
        ));
        Ok(Self { function })
    }
}

#[pymethods]
impl PyScalarUDF {
    #[new]
    #[pyo3(signature = (name, func, input_types, output_type, volatility="volatile"))]
    pub fn new(
        name: &str,
        func: PyObject,
        input_types: Vec<PyArrowType<DataType>>,
        output_type: PyArrowType<DataType>,
        volatility: &str,
    ) -> PyResult<Self> {
        let input_types = input_types.into_iter().map(|t| t.0).collect();
        Ok(Self::from_parts(
            name.to_string(),
            func,
            input_types,
            output_type.0,
            volatility,
        )?)
    }

    /// Apply the UDF to argument expressions, producing a new expression.
    #[pyo3(signature = (*args))]
    pub fn __call__(&self, args: Vec<PyExpr>) -> PyExpr {
        let args = args.into_iter().map(|arg| arg.expr).collect();
        self.function.call(args).into()
    }

    #[getter]
    pub fn name(&self) -> String {
        self.function.name().to_string()
    }

    pub fn __repr__(&self) -> String {
        format!("ScalarUDF({})", self.function.name())
    }
}
